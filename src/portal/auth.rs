use crate::core::AuthorizationAction;
use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock};

/// Authorization query consumed by editable collections.
pub trait Authorizer: Send + Sync {
    /// Checks whether `action` is allowed against the object named `target`.
    fn has_permission(&self, action: AuthorizationAction, target: &str) -> bool;
}

/// Authorizer that grants every action.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn has_permission(&self, _action: AuthorizationAction, _target: &str) -> bool {
        true
    }
}

/// Per-target permission grants
///
/// Targets without an entry fall back to the default grant set.
pub struct PermissionTable {
    grants: RwLock<HashMap<String, HashSet<AuthorizationAction>>>,
    defaults: HashSet<AuthorizationAction>,
}

impl Default for PermissionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionTable {
    /// Creates a table that denies everything not granted explicitly
    pub fn new() -> Self {
        Self::with_defaults(Vec::new())
    }

    /// Creates a table with a default grant set for unknown targets
    pub fn with_defaults(defaults: impl IntoIterator<Item = AuthorizationAction>) -> Self {
        Self {
            grants: RwLock::new(HashMap::new()),
            defaults: defaults.into_iter().collect(),
        }
    }

    /// Grants an action on a target; returns `false` if it was already granted
    pub fn grant(&self, target: impl Into<String>, action: AuthorizationAction) -> bool {
        let mut grants = self.grants.write().unwrap_or_else(PoisonError::into_inner);
        grants.entry(target.into()).or_default().insert(action)
    }

    /// Revokes an action on a target
    pub fn revoke(&self, target: &str, action: AuthorizationAction) -> bool {
        let mut grants = self.grants.write().unwrap_or_else(PoisonError::into_inner);
        grants
            .get_mut(target)
            .is_some_and(|actions| actions.remove(&action))
    }

    /// Lists the actions granted on a target
    pub fn actions(&self, target: &str) -> Vec<AuthorizationAction> {
        let grants = self.grants.read().unwrap_or_else(PoisonError::into_inner);
        grants
            .get(target)
            .map(|actions| actions.iter().copied().collect())
            .unwrap_or_default()
    }
}

impl Authorizer for PermissionTable {
    fn has_permission(&self, action: AuthorizationAction, target: &str) -> bool {
        let grants = self.grants.read().unwrap_or_else(PoisonError::into_inner);
        match grants.get(target) {
            Some(actions) => actions.contains(&action),
            None => self.defaults.contains(&action),
        }
    }
}
