use chrono::NaiveDate;

use crate::decimal::Money;
use crate::types::SettlementStatus;

/// derive the base settlement status from amounts and the manual-cancel flag
///
/// Priority order: cancellation wins over everything, full settlement over
/// partial, and an untouched record stays pending. Callers store the result
/// purely as a cache of this function's output and must re-derive it at the
/// end of every mutating transaction.
pub fn derive_status(amount: Money, settled: Money, cancelled: bool) -> SettlementStatus {
    if cancelled {
        return SettlementStatus::Cancelled;
    }
    if settled >= amount {
        return SettlementStatus::Paid;
    }
    if settled.is_zero() {
        return SettlementStatus::Pending;
    }
    SettlementStatus::Partial
}

/// overdue is a presentation attribute layered over the base status
///
/// Keeping it separate from the status means a clock tick past the due date
/// never erases partial-payment history.
pub fn is_overdue(status: SettlementStatus, due_date: NaiveDate, today: NaiveDate) -> bool {
    !status.is_terminal() && due_date < today
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_cancel_wins_over_everything() {
        let amount = Money::from_major(100);
        assert_eq!(
            derive_status(amount, Money::ZERO, true),
            SettlementStatus::Cancelled
        );
        // even a fully settled record reports cancelled when the flag is set
        assert_eq!(
            derive_status(amount, amount, true),
            SettlementStatus::Cancelled
        );
    }

    #[test]
    fn test_settlement_progression() {
        let amount = Money::from_major(100);
        assert_eq!(
            derive_status(amount, Money::ZERO, false),
            SettlementStatus::Pending
        );
        assert_eq!(
            derive_status(amount, Money::from_major(50), false),
            SettlementStatus::Partial
        );
        assert_eq!(
            derive_status(amount, Money::from_major(100), false),
            SettlementStatus::Paid
        );
        assert_eq!(
            derive_status(amount, Money::from_major(150), false),
            SettlementStatus::Paid
        );
    }

    #[test]
    fn test_derivation_is_pure() {
        let amount = Money::from_cents(12345);
        let settled = Money::from_cents(45);
        let first = derive_status(amount, settled, false);
        for _ in 0..10 {
            assert_eq!(derive_status(amount, settled, false), first);
        }
    }

    #[test]
    fn test_overdue_predicate() {
        let due = date(2024, 3, 15);
        assert!(is_overdue(SettlementStatus::Pending, due, date(2024, 3, 16)));
        assert!(is_overdue(SettlementStatus::Partial, due, date(2024, 4, 1)));
        // due today is not overdue
        assert!(!is_overdue(SettlementStatus::Pending, due, due));
        assert!(!is_overdue(SettlementStatus::Pending, due, date(2024, 3, 1)));
    }

    #[test]
    fn test_terminal_statuses_never_overdue() {
        let due = date(2024, 1, 1);
        let today = date(2025, 1, 1);
        assert!(!is_overdue(SettlementStatus::Paid, due, today));
        assert!(!is_overdue(SettlementStatus::Cancelled, due, today));
    }
}
