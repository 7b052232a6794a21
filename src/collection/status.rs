impl<C: EditableChild> TrackStatus for EditableCollection<C> {
    fn is_new(&self) -> bool {
        false
    }

    fn is_deleted(&self) -> bool {
        false
    }

    fn is_self_dirty(&self) -> bool {
        self.is_dirty()
    }

    /// Any persisted child pending deletion, or any dirty active child.
    fn is_dirty(&self) -> bool {
        self.deleted_items().iter().any(|child| !child.is_new())
            || self.items.iter().any(|child| child.is_dirty())
    }

    fn is_self_valid(&self) -> bool {
        self.is_valid()
    }

    /// Every active child is valid; deleted children do not count.
    fn is_valid(&self) -> bool {
        self.items.iter().all(|child| child.is_valid())
    }

    fn is_self_busy(&self) -> bool {
        false
    }

    fn is_busy(&self) -> bool {
        self.deleted_items().iter().any(|child| child.is_busy())
            || self.items.iter().any(|child| child.is_busy())
    }

    fn is_child(&self) -> bool {
        self.is_child
    }
}

impl<C: EditableChild> EditableCollection<C> {
    /// Dirty, valid, idle, and the caller may edit the collection.
    pub fn is_savable(&self) -> bool {
        self.is_dirty()
            && self.is_valid()
            && !self.is_busy()
            && self.has_permission(AuthorizationAction::EditObject)
    }

    /// Broken rules of every invalid active child, prefixed by its identity.
    pub fn broken_rules(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|child| !child.is_valid())
            .flat_map(|child| {
                let identity = child.identity();
                let rules = child.broken_rules();
                if rules.is_empty() {
                    vec![format!("child {}: invalid", identity)]
                } else {
                    rules
                        .into_iter()
                        .map(|rule| format!("child {}: {}", identity, rule))
                        .collect()
                }
            })
            .collect()
    }
}
