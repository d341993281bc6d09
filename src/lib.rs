pub mod alerts;
pub mod cache;
pub mod config;
pub mod decimal;
pub mod engine;
pub mod errors;
pub mod events;
pub mod idempotency;
pub mod records;
pub mod schedule;
pub mod split;
pub mod status;
pub mod store;
pub mod sweeper;
pub mod types;

// re-export key types
pub use alerts::{AlertFeed, AlertItem, DueAlertFeed};
pub use cache::{ViewCache, ViewKind};
pub use config::{AlertSettings, EngineConfig};
pub use decimal::Money;
pub use engine::{
    AllocationEngine, AllocationTarget, NewPayment, PaymentReceipt, SettleTarget,
};
pub use errors::{EngineError, Result};
pub use events::{Event, EventStore};
pub use idempotency::{HttpMethod, IdempotencyGuard, RequestContext, Response};
pub use records::{Allocation, Installment, Obligation, Payment};
pub use schedule::{build_schedule, ScheduledInstallment};
pub use split::split_amount;
pub use status::{derive_status, is_overdue};
pub use store::{InstallmentEdit, LedgerStore, NewObligation, SharedStore};
pub use sweeper::{OverdueSweeper, SweepOutcome};
pub use types::{
    ObligationKind, PaymentMethod, SettlementStatus, Tag, TenantId,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
