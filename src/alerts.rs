use chrono::{Duration, NaiveDate};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::config::{AlertSettings, MAX_ALERT_LIMIT, MIN_ALERT_LIMIT};
use crate::decimal::Money;
use crate::errors::{EngineError, Result};
use crate::store::SharedStore;
use crate::types::{
    CounterpartyId, InstallmentId, ObligationId, ObligationKind, SettlementStatus, Tag, TagId,
    TenantId,
};

/// one installment nearing or past its due date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertItem {
    /// stable composite id for client-side dismissal
    pub id: String,
    pub kind: ObligationKind,
    pub obligation_id: ObligationId,
    pub installment_id: InstallmentId,
    pub counterparty_id: CounterpartyId,
    pub sequence: u32,
    pub count: u32,
    pub amount: Money,
    pub settled: Money,
    pub due_date: NaiveDate,
    /// negative once the due date has passed
    pub days_until_due: i64,
    pub overdue: bool,
    /// deduplicated union of installment and obligation tags
    pub tags: Vec<Tag>,
}

/// ranked, size-bounded feed with the settings echoed back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertFeed {
    pub data: Vec<AlertItem>,
    /// pre-truncation item count
    pub total: usize,
    pub settings: AlertSettings,
}

/// read-side aggregator over persisted installment state
///
/// Independent of the engine's write path; eventually consistent with
/// in-flight writes.
pub struct DueAlertFeed {
    store: SharedStore,
}

impl DueAlertFeed {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// collect pending/partial installments due within the lead window
    ///
    /// Overdue items come first (oldest due date leading), then upcoming
    /// ones in ascending due order. Truncation to `limit` happens after
    /// sorting and the reported total is the pre-truncation count.
    pub fn alerts(
        &self,
        tenant: TenantId,
        settings: &AlertSettings,
        limit: usize,
        time: &SafeTimeProvider,
    ) -> Result<AlertFeed> {
        if !(MIN_ALERT_LIMIT..=MAX_ALERT_LIMIT).contains(&limit) {
            return Err(EngineError::InvalidArgument {
                message: format!(
                    "alert limit must be between {} and {}, got {}",
                    MIN_ALERT_LIMIT, MAX_ALERT_LIMIT, limit
                ),
            });
        }

        let today = time.now().date_naive();
        let horizon = today + Duration::days(settings.lead_days as i64);

        let store = self.store.lock().expect("ledger store lock poisoned");

        let mut items = Vec::new();
        for installment in store.installments_for_tenant(tenant) {
            if !matches!(
                installment.status,
                SettlementStatus::Pending | SettlementStatus::Partial
            ) {
                continue;
            }

            let overdue = installment.due_date < today;
            let upcoming = installment.due_date >= today && installment.due_date <= horizon;
            if !upcoming && !(overdue && settings.include_overdue) {
                continue;
            }

            let obligation = store.obligation(tenant, installment.obligation_id)?;

            let tag_ids: BTreeSet<TagId> = installment
                .tags
                .iter()
                .chain(obligation.tags.iter())
                .copied()
                .collect();
            let tags: Vec<Tag> = tag_ids
                .iter()
                .filter_map(|id| store.tag(*id).cloned())
                .collect();

            items.push(AlertItem {
                id: format!(
                    "{}:{}:{}",
                    obligation.kind, installment.id, installment.due_date
                ),
                kind: obligation.kind,
                obligation_id: obligation.id,
                installment_id: installment.id,
                counterparty_id: obligation.counterparty_id,
                sequence: installment.sequence,
                count: installment.count,
                amount: installment.amount,
                settled: installment.settled,
                due_date: installment.due_date,
                days_until_due: (installment.due_date - today).num_days(),
                overdue,
                tags,
            });
        }

        items.sort_by(|a, b| {
            b.overdue
                .cmp(&a.overdue)
                .then(a.due_date.cmp(&b.due_date))
                .then_with(|| a.id.cmp(&b.id))
        });

        let total = items.len();
        items.truncate(limit);

        Ok(AlertFeed {
            data: items,
            total,
            settings: *settings,
        })
    }
}
