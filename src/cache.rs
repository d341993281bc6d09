use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::types::TenantId;

/// read-side views the engine must keep honest after every write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    ObligationList,
    DashboardSummary,
}

/// explicit cache of rendered read views, keyed by tenant and view
///
/// Created at process start and injected into the components that need it.
/// Entries hold serialized response bodies and carry no persistence
/// guarantee across restarts. Writers invalidate a tenant's entries
/// synchronously before returning so stale aggregates are never served.
#[derive(Debug, Default)]
pub struct ViewCache {
    entries: Mutex<HashMap<(TenantId, ViewKind), String>>,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn get(&self, tenant: TenantId, view: ViewKind) -> Option<String> {
        self.entries
            .lock()
            .expect("view cache lock poisoned")
            .get(&(tenant, view))
            .cloned()
    }

    pub fn put(&self, tenant: TenantId, view: ViewKind, body: String) {
        self.entries
            .lock()
            .expect("view cache lock poisoned")
            .insert((tenant, view), body);
    }

    /// drop every cached view for the tenant
    pub fn invalidate(&self, tenant: TenantId) {
        self.entries
            .lock()
            .expect("view cache lock poisoned")
            .retain(|(t, _), _| *t != tenant);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("view cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_put_get_invalidate() {
        let cache = ViewCache::new();
        let tenant = Uuid::new_v4();
        let other = Uuid::new_v4();

        cache.put(tenant, ViewKind::ObligationList, "[]".to_string());
        cache.put(tenant, ViewKind::DashboardSummary, "{}".to_string());
        cache.put(other, ViewKind::ObligationList, "[1]".to_string());

        assert_eq!(
            cache.get(tenant, ViewKind::ObligationList).as_deref(),
            Some("[]")
        );

        cache.invalidate(tenant);
        assert!(cache.get(tenant, ViewKind::ObligationList).is_none());
        assert!(cache.get(tenant, ViewKind::DashboardSummary).is_none());
        // other tenants keep their entries
        assert_eq!(
            cache.get(other, ViewKind::ObligationList).as_deref(),
            Some("[1]")
        );
    }
}
