use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// owning organization for every persisted record
pub type TenantId = Uuid;

/// unique identifier for an obligation
pub type ObligationId = Uuid;

/// unique identifier for an installment
pub type InstallmentId = Uuid;

/// unique identifier for a payment
pub type PaymentId = Uuid;

/// unique identifier for an allocation
pub type AllocationId = Uuid;

/// unique identifier for a tag
pub type TagId = Uuid;

/// vendor or customer reference, depending on the obligation kind
pub type CounterpartyId = Uuid;

/// optional grouping category
pub type CategoryId = Uuid;

/// obligation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObligationKind {
    /// amount the business owes a vendor
    Payable,
    /// amount a customer owes the business
    Receivable,
}

impl fmt::Display for ObligationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObligationKind::Payable => write!(f, "PAYABLE"),
            ObligationKind::Receivable => write!(f, "RECEIVABLE"),
        }
    }
}

/// settlement status shared by obligations and installments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementStatus {
    /// nothing settled yet
    Pending,
    /// partially settled
    Partial,
    /// fully settled, terminal
    Paid,
    /// manually cancelled, terminal
    Cancelled,
}

impl SettlementStatus {
    /// terminal statuses accept no further allocations
    pub fn is_terminal(&self) -> bool {
        matches!(self, SettlementStatus::Paid | SettlementStatus::Cancelled)
    }
}

impl fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettlementStatus::Pending => write!(f, "PENDING"),
            SettlementStatus::Partial => write!(f, "PARTIAL"),
            SettlementStatus::Paid => write!(f, "PAID"),
            SettlementStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// settlement instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    CreditCard,
    DebitCard,
    Check,
    Other,
}

/// referential label, many-to-many with obligations and installments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub color: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            color: color.into(),
        }
    }
}
