use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::{
    AllocationId, CategoryId, CounterpartyId, InstallmentId, ObligationId, ObligationKind,
    PaymentId, PaymentMethod, SettlementStatus, TagId, TenantId,
};

/// a payable or receivable owed between the tenant and a counterparty
///
/// Aggregate fields (`settled`, `status`, `overdue`) are caches of pure
/// derivations over the obligation's installments and are recomputed at the
/// end of every mutating transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obligation {
    pub id: ObligationId,
    pub tenant: TenantId,
    pub kind: ObligationKind,
    pub counterparty_id: CounterpartyId,
    pub category_id: Option<CategoryId>,
    pub amount: Money,
    pub settled: Money,
    pub status: SettlementStatus,
    pub first_due_date: NaiveDate,
    pub method: PaymentMethod,
    pub overdue: bool,
    pub cancelled: bool,
    pub tags: BTreeSet<TagId>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Obligation {
    /// unsettled remainder across the whole obligation
    pub fn remaining(&self) -> Money {
        (self.amount - self.settled).max(Money::ZERO)
    }
}

/// one scheduled portion of an obligation's principal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Installment {
    pub id: InstallmentId,
    pub obligation_id: ObligationId,
    pub tenant: TenantId,
    pub sequence: u32,
    pub count: u32,
    pub amount: Money,
    pub settled: Money,
    pub due_date: NaiveDate,
    pub status: SettlementStatus,
    pub overdue: bool,
    pub cancelled: bool,
    pub tags: BTreeSet<TagId>,
}

impl Installment {
    /// unsettled remainder available for allocation
    pub fn remaining(&self) -> Money {
        (self.amount - self.settled).max(Money::ZERO)
    }

    /// overdue installments stay eligible; only terminal statuses refuse
    pub fn accepts_allocation(&self) -> bool {
        !self.status.is_terminal()
    }
}

/// one settlement event
///
/// Amount and allocations never change after creation; reversal deletes the
/// record outright. Only the note may be edited afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub tenant: TenantId,
    pub amount: Money,
    pub date: NaiveDate,
    pub method: PaymentMethod,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// links one payment to one installment with the amount applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: AllocationId,
    pub payment_id: PaymentId,
    pub installment_id: InstallmentId,
    pub amount: Money,
}

impl Allocation {
    pub fn new(payment_id: PaymentId, installment_id: InstallmentId, amount: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            payment_id,
            installment_id,
            amount,
        }
    }
}
