/// Behavioral settings of an editable collection.
///
/// Policy is runtime state: it is never serialized and survives save adoption
/// and graph cloning unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionPolicy {
    /// Allow `add_new` to request fresh children from the data portal.
    pub allow_new: bool,

    /// Initial state of change notifications for a new collection.
    pub raise_change_events: bool,

    /// Verify every element's parent link before handing the graph to the portal.
    pub validate_parent_links_on_save: bool,
}

impl Default for CollectionPolicy {
    fn default() -> Self {
        Self {
            allow_new: true,
            raise_change_events: true,
            validate_parent_links_on_save: true,
        }
    }
}

impl CollectionPolicy {
    /// Create the default policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable `add_new`
    pub fn allow_new(mut self, allow: bool) -> Self {
        self.allow_new = allow;
        self
    }

    /// Set the initial notification state
    pub fn raise_change_events(mut self, raise: bool) -> Self {
        self.raise_change_events = raise;
        self
    }

    /// Enable or disable parent link verification before save
    pub fn validate_parent_links_on_save(mut self, validate: bool) -> Self {
        self.validate_parent_links_on_save = validate;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_allows_new_and_raises_events() {
        let policy = CollectionPolicy::default();
        assert!(policy.allow_new);
        assert!(policy.raise_change_events);
        assert!(policy.validate_parent_links_on_save);
    }

    #[test]
    fn builder_overrides_individual_settings() {
        let policy = CollectionPolicy::new()
            .allow_new(false)
            .raise_change_events(false);

        assert!(!policy.allow_new);
        assert!(!policy.raise_change_events);
        assert!(policy.validate_parent_links_on_save);
    }
}
