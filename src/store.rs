use chrono::{DateTime, NaiveDate, Utc};
use hourglass_rs::SafeTimeProvider;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{EngineError, Result};
use crate::events::{Event, EventStore};
use crate::records::{Allocation, Installment, Obligation, Payment};
use crate::schedule::build_schedule;
use crate::status::{derive_status, is_overdue};
use crate::types::{
    AllocationId, CategoryId, CounterpartyId, InstallmentId, ObligationId, ObligationKind,
    PaymentId, PaymentMethod, SettlementStatus, Tag, TagId, TenantId,
};

/// store handle shared between the engine, the sweeper, and read paths
///
/// One lock scope is one transaction: callers validate everything first and
/// mutate only after all checks pass, so a failed call never leaves partial
/// state and concurrent writers against the same installment are serialized.
pub type SharedStore = Arc<Mutex<LedgerStore>>;

/// parameters for materializing a new obligation with its schedule
#[derive(Debug, Clone)]
pub struct NewObligation {
    pub kind: ObligationKind,
    pub counterparty_id: CounterpartyId,
    pub category_id: Option<CategoryId>,
    pub principal: Money,
    pub first_due_date: NaiveDate,
    pub installment_count: u32,
    pub method: PaymentMethod,
    pub tags: BTreeSet<TagId>,
    pub note: Option<String>,
}

/// requested change to a single pending installment
#[derive(Debug, Clone, Copy, Default)]
pub struct InstallmentEdit {
    pub amount: Option<Money>,
    pub due_date: Option<NaiveDate>,
}

/// in-memory transactional store for the engine's records
#[derive(Debug, Default)]
pub struct LedgerStore {
    obligations: HashMap<ObligationId, Obligation>,
    installments: HashMap<InstallmentId, Installment>,
    payments: HashMap<PaymentId, Payment>,
    allocations: HashMap<AllocationId, Allocation>,
    tags: HashMap<TagId, Tag>,
    events: EventStore,
}

impl LedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// wrap a fresh store in the shared handle
    pub fn shared() -> SharedStore {
        Arc::new(Mutex::new(Self::new()))
    }

    // ---- tags ----

    pub fn register_tag(&mut self, tag: Tag) -> TagId {
        let id = tag.id;
        self.tags.insert(id, tag);
        id
    }

    pub fn tag(&self, id: TagId) -> Option<&Tag> {
        self.tags.get(&id)
    }

    // ---- tenant-checked lookups ----
    //
    // a record owned by another tenant is reported identically to a missing
    // id, so cross-tenant probes learn nothing

    pub fn obligation(&self, tenant: TenantId, id: ObligationId) -> Result<&Obligation> {
        self.obligations
            .get(&id)
            .filter(|o| o.tenant == tenant)
            .ok_or(EngineError::NotFound {
                entity: "obligation",
                id,
            })
    }

    pub fn installment(&self, tenant: TenantId, id: InstallmentId) -> Result<&Installment> {
        self.installments
            .get(&id)
            .filter(|i| i.tenant == tenant)
            .ok_or(EngineError::NotFound {
                entity: "installment",
                id,
            })
    }

    pub fn payment(&self, tenant: TenantId, id: PaymentId) -> Result<&Payment> {
        self.payments
            .get(&id)
            .filter(|p| p.tenant == tenant)
            .ok_or(EngineError::NotFound {
                entity: "payment",
                id,
            })
    }

    /// installments of one obligation in sequence order
    pub fn installments_of(&self, obligation_id: ObligationId) -> Vec<&Installment> {
        let mut rows: Vec<&Installment> = self
            .installments
            .values()
            .filter(|i| i.obligation_id == obligation_id)
            .collect();
        rows.sort_by_key(|i| i.sequence);
        rows
    }

    pub fn allocations_of(&self, payment_id: PaymentId) -> Vec<&Allocation> {
        self.allocations
            .values()
            .filter(|a| a.payment_id == payment_id)
            .collect()
    }

    pub fn allocations_for_installment(&self, installment_id: InstallmentId) -> Vec<&Allocation> {
        self.allocations
            .values()
            .filter(|a| a.installment_id == installment_id)
            .collect()
    }

    pub fn installments_for_tenant(&self, tenant: TenantId) -> Vec<&Installment> {
        self.installments
            .values()
            .filter(|i| i.tenant == tenant)
            .collect()
    }

    /// every tenant with at least one obligation, in stable order
    pub fn tenants(&self) -> BTreeSet<TenantId> {
        self.obligations.values().map(|o| o.tenant).collect()
    }

    // ---- obligation lifecycle ----

    /// create an obligation and materialize its installment schedule
    pub fn create_obligation(
        &mut self,
        tenant: TenantId,
        new: NewObligation,
        time: &SafeTimeProvider,
    ) -> Result<ObligationId> {
        let rows = build_schedule(new.principal, new.first_due_date, new.installment_count)?;
        let now = time.now();
        let today = now.date_naive();

        let obligation_id = Uuid::new_v4();
        let count = rows.len() as u32;

        for row in rows {
            let status = derive_status(row.amount, Money::ZERO, false);
            let installment = Installment {
                id: Uuid::new_v4(),
                obligation_id,
                tenant,
                sequence: row.sequence,
                count,
                amount: row.amount,
                settled: Money::ZERO,
                due_date: row.due_date,
                status,
                overdue: is_overdue(status, row.due_date, today),
                cancelled: false,
                tags: new.tags.clone(),
            };
            self.installments.insert(installment.id, installment);
        }

        let status = derive_status(new.principal, Money::ZERO, false);
        let obligation = Obligation {
            id: obligation_id,
            tenant,
            kind: new.kind,
            counterparty_id: new.counterparty_id,
            category_id: new.category_id,
            amount: new.principal,
            settled: Money::ZERO,
            status,
            first_due_date: new.first_due_date,
            method: new.method,
            overdue: is_overdue(status, new.first_due_date, today),
            cancelled: false,
            tags: new.tags,
            note: new.note,
            created_at: now,
        };
        let kind = obligation.kind;
        self.obligations.insert(obligation_id, obligation);

        self.events.emit(Event::ObligationScheduled {
            obligation_id,
            tenant,
            kind,
            principal: new.principal,
            installment_count: count,
            timestamp: now,
        });

        Ok(obligation_id)
    }

    /// mark an obligation cancelled; paid installments keep their status
    pub fn cancel_obligation(
        &mut self,
        tenant: TenantId,
        id: ObligationId,
        time: &SafeTimeProvider,
    ) -> Result<()> {
        let obligation = self.obligation(tenant, id)?;
        if obligation.cancelled {
            return Err(EngineError::InvalidState {
                current: "CANCELLED".to_string(),
                expected: "an active obligation".to_string(),
            });
        }

        let child_ids: Vec<InstallmentId> = self
            .installments_of(id)
            .iter()
            .map(|i| i.id)
            .collect();

        for child_id in child_ids {
            if let Some(inst) = self.installments.get_mut(&child_id) {
                if inst.status != SettlementStatus::Paid {
                    inst.cancelled = true;
                    inst.status = derive_status(inst.amount, inst.settled, true);
                    inst.overdue = false;
                }
            }
        }

        let now = time.now();
        if let Some(ob) = self.obligations.get_mut(&id) {
            ob.cancelled = true;
            ob.status = derive_status(ob.amount, ob.settled, true);
            ob.overdue = false;
        }

        self.events.emit(Event::ObligationCancelled {
            obligation_id: id,
            tenant,
            timestamp: now,
        });

        Ok(())
    }

    /// amend the amount or due date of one pending installment
    ///
    /// Permitted only while the whole schedule is untouched: no installment
    /// of the obligation may carry any settled amount and the target itself
    /// must still be pending. An amount change re-syncs the parent's
    /// principal to the new installment sum.
    pub fn edit_installment(
        &mut self,
        tenant: TenantId,
        id: InstallmentId,
        edit: InstallmentEdit,
        time: &SafeTimeProvider,
    ) -> Result<()> {
        let installment = self.installment(tenant, id)?;
        let obligation_id = installment.obligation_id;
        let target_status = installment.status;

        let obligation = self.obligation(tenant, obligation_id)?;
        if obligation.status.is_terminal() {
            return Err(EngineError::InvalidState {
                current: obligation.status.to_string(),
                expected: "an unsettled obligation".to_string(),
            });
        }
        if self
            .installments_of(obligation_id)
            .iter()
            .any(|i| i.settled.is_positive())
        {
            return Err(EngineError::InvalidState {
                current: "schedule with settlements".to_string(),
                expected: "no installment settled".to_string(),
            });
        }
        if target_status != SettlementStatus::Pending {
            return Err(EngineError::InvalidState {
                current: target_status.to_string(),
                expected: "PENDING".to_string(),
            });
        }
        if let Some(amount) = edit.amount {
            if !amount.is_positive() {
                return Err(EngineError::InvalidArgument {
                    message: format!("installment amount must be positive, got {}", amount),
                });
            }
        }

        let now = time.now();
        let today = now.date_naive();

        if let Some(inst) = self.installments.get_mut(&id) {
            if let Some(amount) = edit.amount {
                inst.amount = amount;
            }
            if let Some(due_date) = edit.due_date {
                inst.due_date = due_date;
                inst.overdue = is_overdue(inst.status, due_date, today);
            }
        }

        // keep the parent's principal and first due date in sync
        let (amount_sum, first_due) = {
            let children = self.installments_of(obligation_id);
            let sum: Money = children.iter().map(|i| i.amount).sum();
            let first = children.first().map(|i| i.due_date);
            (sum, first)
        };
        if let Some(ob) = self.obligations.get_mut(&obligation_id) {
            ob.amount = amount_sum;
            if let Some(first) = first_due {
                ob.first_due_date = first;
            }
        }

        self.events.emit(Event::ScheduleAmended {
            installment_id: id,
            obligation_id,
            new_amount: edit.amount,
            new_due_date: edit.due_date,
            timestamp: now,
        });

        Ok(())
    }

    /// replace a payment's note; financial fields are immutable
    pub fn update_payment_note(
        &mut self,
        tenant: TenantId,
        id: PaymentId,
        note: Option<String>,
    ) -> Result<()> {
        self.payment(tenant, id)?;
        if let Some(payment) = self.payments.get_mut(&id) {
            payment.note = note;
        }
        Ok(())
    }

    // ---- settlement primitives used inside engine transactions ----

    pub(crate) fn insert_payment(&mut self, payment: Payment) {
        self.payments.insert(payment.id, payment);
    }

    pub(crate) fn insert_allocation(&mut self, allocation: Allocation) {
        self.allocations.insert(allocation.id, allocation);
    }

    /// remove a payment with its allocations, returning the removed links
    pub(crate) fn remove_payment(&mut self, payment_id: PaymentId) -> Vec<Allocation> {
        let ids: Vec<AllocationId> = self
            .allocations
            .values()
            .filter(|a| a.payment_id == payment_id)
            .map(|a| a.id)
            .collect();
        let removed = ids
            .into_iter()
            .filter_map(|id| self.allocations.remove(&id))
            .collect();
        self.payments.remove(&payment_id);
        removed
    }

    /// apply a settled-amount delta to an installment and re-derive its
    /// status and overdue flag, then refresh the parent aggregate
    pub(crate) fn apply_settlement(
        &mut self,
        installment_id: InstallmentId,
        delta: Money,
        now: DateTime<Utc>,
    ) {
        let today = now.date_naive();
        let obligation_id = {
            let Some(inst) = self.installments.get_mut(&installment_id) else {
                return;
            };
            let old_status = inst.status;
            inst.settled = (inst.settled + delta).max(Money::ZERO);
            inst.status = derive_status(inst.amount, inst.settled, inst.cancelled);
            inst.overdue = is_overdue(inst.status, inst.due_date, today);

            self.events.emit(Event::InstallmentSettled {
                installment_id,
                obligation_id: inst.obligation_id,
                amount_applied: delta,
                settled: inst.settled,
                status: inst.status,
            });
            if inst.status != old_status {
                self.events.emit(Event::StatusChanged {
                    installment_id,
                    old_status,
                    new_status: inst.status,
                    timestamp: now,
                });
            }
            inst.obligation_id
        };
        self.recompute_obligation(obligation_id);
    }

    /// recompute an obligation's cached aggregates from its installments
    pub(crate) fn recompute_obligation(&mut self, obligation_id: ObligationId) {
        let (settled_sum, any_overdue) = {
            let children = self.installments_of(obligation_id);
            let sum: Money = children.iter().map(|i| i.settled).sum();
            let overdue = children.iter().any(|i| i.overdue);
            (sum, overdue)
        };
        if let Some(ob) = self.obligations.get_mut(&obligation_id) {
            ob.settled = settled_sum;
            ob.status = derive_status(ob.amount, ob.settled, ob.cancelled);
            ob.overdue = any_overdue;
        }
    }

    /// flag past-due pending/partial installments for one tenant
    ///
    /// Idempotent for a given `today`: already-flagged records are skipped,
    /// and terminal statuses are never touched.
    pub(crate) fn flag_overdue(
        &mut self,
        tenant: TenantId,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> usize {
        let due_ids: Vec<(InstallmentId, ObligationId, NaiveDate)> = self
            .installments
            .values()
            .filter(|i| {
                i.tenant == tenant
                    && !i.overdue
                    && is_overdue(i.status, i.due_date, today)
            })
            .map(|i| (i.id, i.obligation_id, i.due_date))
            .collect();

        let mut touched_obligations = BTreeSet::new();
        for (id, obligation_id, due_date) in &due_ids {
            if let Some(inst) = self.installments.get_mut(id) {
                inst.overdue = true;
            }
            touched_obligations.insert(*obligation_id);
            self.events.emit(Event::InstallmentOverdue {
                installment_id: *id,
                obligation_id: *obligation_id,
                due_date: *due_date,
                timestamp: now,
            });
        }
        for obligation_id in touched_obligations {
            self.recompute_obligation(obligation_id);
        }

        due_ids.len()
    }

    // ---- events ----

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    pub(crate) fn emit(&mut self, event: Event) {
        self.events.emit(event);
    }
}
