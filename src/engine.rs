use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::cache::ViewCache;
use crate::decimal::Money;
use crate::errors::{EngineError, Result};
use crate::events::Event;
use crate::records::{Allocation, Payment};
use crate::store::SharedStore;
use crate::types::{InstallmentId, ObligationId, PaymentId, PaymentMethod, TenantId};

/// parameters of one settlement event
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub amount: Money,
    pub date: NaiveDate,
    pub method: PaymentMethod,
    pub note: Option<String>,
}

/// how much of the payment lands on which installment
#[derive(Debug, Clone, Copy)]
pub struct AllocationTarget {
    pub installment_id: InstallmentId,
    pub amount: Money,
}

/// quick-settle addressing
#[derive(Debug, Clone, Copy)]
pub enum SettleTarget {
    /// resolves only when the obligation has exactly one installment
    Obligation(ObligationId),
    /// allocates against the installment directly
    Installment(InstallmentId),
}

/// created payment with its allocation links
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub allocations: Vec<Allocation>,
}

/// payment allocation and reversal over the shared store
///
/// Each operation validates everything before touching a record and runs
/// inside one store lock scope, so a failure leaves no partial rows and a
/// concurrent second allocation against the same installment is serialized.
#[derive(Clone)]
pub struct AllocationEngine {
    store: SharedStore,
    views: Arc<ViewCache>,
}

impl AllocationEngine {
    pub fn new(store: SharedStore, views: Arc<ViewCache>) -> Self {
        Self { store, views }
    }

    /// record a payment and allocate it across the targeted installments
    pub fn create(
        &self,
        tenant: TenantId,
        payment: NewPayment,
        targets: &[AllocationTarget],
        time: &SafeTimeProvider,
    ) -> Result<PaymentReceipt> {
        let receipt = {
            let mut store = self.store.lock().expect("ledger store lock poisoned");

            if targets.is_empty() {
                return Err(EngineError::InvalidArgument {
                    message: "a payment needs at least one allocation target".to_string(),
                });
            }
            let mut seen = HashSet::new();
            for target in targets {
                if !seen.insert(target.installment_id) {
                    return Err(EngineError::InvalidArgument {
                        message: format!(
                            "installment {} targeted more than once",
                            target.installment_id
                        ),
                    });
                }
                if !target.amount.is_positive() {
                    return Err(EngineError::InvalidArgument {
                        message: format!(
                            "allocation amount must be positive, got {}",
                            target.amount
                        ),
                    });
                }
            }
            if !payment.amount.is_positive() {
                return Err(EngineError::InvalidArgument {
                    message: format!("payment amount must be positive, got {}", payment.amount),
                });
            }

            let allocated: Money = targets.iter().map(|t| t.amount).sum();
            if allocated != payment.amount {
                return Err(EngineError::AmountMismatch {
                    payment: payment.amount,
                    allocated,
                });
            }

            for target in targets {
                let installment = store.installment(tenant, target.installment_id)?;
                if !installment.accepts_allocation() {
                    return Err(EngineError::InvalidState {
                        current: installment.status.to_string(),
                        expected: "PENDING or PARTIAL".to_string(),
                    });
                }
                if target.amount > installment.remaining() {
                    return Err(EngineError::OverAllocation {
                        installment_id: target.installment_id,
                        remaining: installment.remaining(),
                        requested: target.amount,
                    });
                }
            }

            // all checks passed, apply the transaction
            let now = time.now();
            let record = Payment {
                id: Uuid::new_v4(),
                tenant,
                amount: payment.amount,
                date: payment.date,
                method: payment.method,
                note: payment.note,
                created_at: now,
            };
            let payment_id = record.id;
            store.insert_payment(record.clone());

            let mut allocations = Vec::with_capacity(targets.len());
            for target in targets {
                let allocation =
                    Allocation::new(payment_id, target.installment_id, target.amount);
                store.insert_allocation(allocation.clone());
                store.apply_settlement(target.installment_id, target.amount, now);
                allocations.push(allocation);
            }

            store.emit(Event::PaymentRecorded {
                payment_id,
                tenant,
                amount: record.amount,
                target_count: targets.len(),
                timestamp: now,
            });

            PaymentReceipt {
                payment: record,
                allocations,
            }
        };

        // stale aggregates must never be served after a write
        self.views.invalidate(tenant);

        info!(
            payment = %receipt.payment.id,
            amount = %receipt.payment.amount,
            targets = receipt.allocations.len(),
            "payment recorded"
        );
        Ok(receipt)
    }

    /// settle an obligation or installment with a single payment
    ///
    /// An obligation target with more than one installment is ambiguous and
    /// rejected; callers must pick the installment themselves rather than
    /// have an allocation order guessed for them.
    pub fn quick_settle(
        &self,
        tenant: TenantId,
        target: SettleTarget,
        amount: Money,
        date: NaiveDate,
        method: PaymentMethod,
        note: Option<String>,
        time: &SafeTimeProvider,
    ) -> Result<PaymentReceipt> {
        let installment_id = {
            let store = self.store.lock().expect("ledger store lock poisoned");
            match target {
                SettleTarget::Installment(id) => store.installment(tenant, id)?.id,
                SettleTarget::Obligation(id) => {
                    let obligation = store.obligation(tenant, id)?;
                    let children = store.installments_of(obligation.id);
                    match children.as_slice() {
                        [only] => only.id,
                        _ => {
                            return Err(EngineError::InvalidState {
                                current: format!("{} installments", children.len()),
                                expected: "exactly one installment, or a direct installment target"
                                    .to_string(),
                            })
                        }
                    }
                }
            }
        };

        self.create(
            tenant,
            NewPayment {
                amount,
                date,
                method,
                note,
            },
            &[AllocationTarget {
                installment_id,
                amount,
            }],
            time,
        )
    }

    /// delete a payment and roll back its allocations
    pub fn reverse(
        &self,
        tenant: TenantId,
        payment_id: PaymentId,
        time: &SafeTimeProvider,
    ) -> Result<()> {
        let amount = {
            let mut store = self.store.lock().expect("ledger store lock poisoned");
            let payment = store.payment(tenant, payment_id)?;
            let amount = payment.amount;

            let now = time.now();
            let removed = store.remove_payment(payment_id);
            for allocation in &removed {
                store.apply_settlement(
                    allocation.installment_id,
                    Money::ZERO - allocation.amount,
                    now,
                );
            }

            store.emit(Event::PaymentReversed {
                payment_id,
                tenant,
                amount,
                timestamp: now,
            });
            amount
        };

        self.views.invalidate(tenant);

        info!(payment = %payment_id, amount = %amount, "payment reversed");
        Ok(())
    }
}
