use hourglass_rs::SafeTimeProvider;
use std::sync::Arc;
use tracing::{info, warn};

use crate::cache::ViewCache;
use crate::errors::Result;
use crate::events::Event;
use crate::store::SharedStore;
use crate::types::TenantId;

/// outcome of one sweep pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepOutcome {
    /// installments newly flagged overdue
    pub flagged: usize,
}

/// periodic batch pass that flags past-due installments
///
/// Runs on a timer, independent of any single request. Strictly additive
/// and corrective: it only sets the presentation overdue flag on
/// pending/partial installments whose due date has passed, never touching
/// paid or cancelled records, and re-running it on the same day changes
/// nothing.
pub struct OverdueSweeper {
    store: SharedStore,
    views: Arc<ViewCache>,
}

impl OverdueSweeper {
    pub fn new(store: SharedStore, views: Arc<ViewCache>) -> Self {
        Self { store, views }
    }

    /// sweep every tenant, or just one when scoped
    ///
    /// A failure for one tenant is logged and does not abort the sweep for
    /// the rest; the outcome counts the records actually updated.
    pub fn sweep(&self, time: &SafeTimeProvider, tenant: Option<TenantId>) -> SweepOutcome {
        let now = time.now();
        let today = now.date_naive();

        let tenants: Vec<TenantId> = {
            let store = self.store.lock().expect("ledger store lock poisoned");
            match tenant {
                Some(t) => vec![t],
                None => store.tenants().into_iter().collect(),
            }
        };

        let mut flagged = 0;
        for tenant in tenants {
            match self.sweep_tenant(tenant, today, now) {
                Ok(count) => {
                    flagged += count;
                    if count > 0 {
                        self.views.invalidate(tenant);
                    }
                }
                Err(err) => {
                    warn!(tenant = %tenant, error = %err, "sweep failed for tenant, continuing");
                }
            }
        }

        {
            let mut store = self.store.lock().expect("ledger store lock poisoned");
            store.emit(Event::SweepCompleted {
                flagged,
                timestamp: now,
            });
        }

        info!(flagged, %today, "overdue sweep completed");
        SweepOutcome { flagged }
    }

    fn sweep_tenant(
        &self,
        tenant: TenantId,
        today: chrono::NaiveDate,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<usize> {
        let mut store = self.store.lock().expect("ledger store lock poisoned");
        Ok(store.flag_overdue(tenant, today, now))
    }
}
