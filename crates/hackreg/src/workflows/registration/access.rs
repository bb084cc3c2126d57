use std::collections::{BTreeMap, BTreeSet};

use super::domain::{Permission, StaffId, StaffUser};

/// Capability check injected into workflow operations.
pub trait Authorizer: Send + Sync {
    fn has_permission(&self, actor: &StaffUser, permission: Permission) -> bool;
}

/// Resolves the staff id handed over by the authentication layer.
pub trait StaffDirectory: Send + Sync {
    fn resolve(&self, id: &StaffId) -> Option<StaffUser>;
}

/// Static grant table keyed by staff id.
#[derive(Debug, Clone, Default)]
pub struct PermissionTable {
    staff: BTreeMap<StaffId, StaffEntry>,
}

#[derive(Debug, Clone)]
struct StaffEntry {
    user: StaffUser,
    permissions: BTreeSet<Permission>,
}

impl PermissionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant<I>(mut self, user: StaffUser, permissions: I) -> Self
    where
        I: IntoIterator<Item = Permission>,
    {
        let entry = self
            .staff
            .entry(user.id.clone())
            .or_insert_with(|| StaffEntry {
                user,
                permissions: BTreeSet::new(),
            });
        entry.permissions.extend(permissions);
        self
    }

    pub fn staff(&self, id: &StaffId) -> Option<&StaffUser> {
        self.staff.get(id).map(|entry| &entry.user)
    }

    pub fn permissions(&self, id: &StaffId) -> Vec<Permission> {
        self.staff
            .get(id)
            .map(|entry| entry.permissions.iter().copied().collect())
            .unwrap_or_default()
    }
}

impl Authorizer for PermissionTable {
    fn has_permission(&self, actor: &StaffUser, permission: Permission) -> bool {
        self.staff
            .get(&actor.id)
            .is_some_and(|entry| entry.permissions.contains(&permission))
    }
}

impl StaffDirectory for PermissionTable {
    fn resolve(&self, id: &StaffId) -> Option<StaffUser> {
        self.staff(id).cloned()
    }
}
