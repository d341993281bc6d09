use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{
    InstallmentId, ObligationId, ObligationKind, PaymentId, SettlementStatus, TenantId,
};

/// all events emitted by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // lifecycle events
    ObligationScheduled {
        obligation_id: ObligationId,
        tenant: TenantId,
        kind: ObligationKind,
        principal: Money,
        installment_count: u32,
        timestamp: DateTime<Utc>,
    },
    ObligationCancelled {
        obligation_id: ObligationId,
        tenant: TenantId,
        timestamp: DateTime<Utc>,
    },
    ScheduleAmended {
        installment_id: InstallmentId,
        obligation_id: ObligationId,
        new_amount: Option<Money>,
        new_due_date: Option<NaiveDate>,
        timestamp: DateTime<Utc>,
    },

    // settlement events
    PaymentRecorded {
        payment_id: PaymentId,
        tenant: TenantId,
        amount: Money,
        target_count: usize,
        timestamp: DateTime<Utc>,
    },
    PaymentReversed {
        payment_id: PaymentId,
        tenant: TenantId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
    InstallmentSettled {
        installment_id: InstallmentId,
        obligation_id: ObligationId,
        amount_applied: Money,
        settled: Money,
        status: SettlementStatus,
    },

    // status events
    StatusChanged {
        installment_id: InstallmentId,
        old_status: SettlementStatus,
        new_status: SettlementStatus,
        timestamp: DateTime<Utc>,
    },
    InstallmentOverdue {
        installment_id: InstallmentId,
        obligation_id: ObligationId,
        due_date: NaiveDate,
        timestamp: DateTime<Utc>,
    },
    SweepCompleted {
        flagged: usize,
        timestamp: DateTime<Utc>,
    },
}

/// event buffer for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
