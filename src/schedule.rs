use chrono::{Months, NaiveDate};

use crate::config::MAX_INSTALLMENT_COUNT;
use crate::decimal::Money;
use crate::errors::{EngineError, Result};
use crate::split::split_amount;

/// one materialized row of a schedule before it becomes a stored installment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledInstallment {
    pub sequence: u32,
    pub amount: Money,
    pub due_date: NaiveDate,
}

/// materialize a principal into monthly installments
///
/// Due dates step one calendar month per installment from `first_due_date`.
/// The day of month is preserved when the target month has it and clamped to
/// the month's last day otherwise (Jan 31 -> Feb 29 -> Mar 31). Amounts come
/// from the splitter, so they sum exactly to the principal.
pub fn build_schedule(
    principal: Money,
    first_due_date: NaiveDate,
    count: u32,
) -> Result<Vec<ScheduledInstallment>> {
    if count < 1 || count > MAX_INSTALLMENT_COUNT {
        return Err(EngineError::InvalidArgument {
            message: format!(
                "installment count must be between 1 and {}, got {}",
                MAX_INSTALLMENT_COUNT, count
            ),
        });
    }

    let amounts = split_amount(principal, count)?;

    let mut rows = Vec::with_capacity(count as usize);
    for (i, amount) in amounts.into_iter().enumerate() {
        // stepping from the first due date each time keeps the intended
        // day of month alive across short months
        let due_date = first_due_date
            .checked_add_months(Months::new(i as u32))
            .ok_or_else(|| EngineError::InvalidArgument {
                message: format!("due date overflow at installment {}", i + 1),
            })?;

        rows.push(ScheduledInstallment {
            sequence: (i + 1) as u32,
            amount,
            due_date,
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_monthly_stepping() {
        let rows = build_schedule(Money::from_major(300), date(2024, 4, 15), 3).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].due_date, date(2024, 4, 15));
        assert_eq!(rows[1].due_date, date(2024, 5, 15));
        assert_eq!(rows[2].due_date, date(2024, 6, 15));
        assert_eq!(rows[0].sequence, 1);
        assert_eq!(rows[2].sequence, 3);
    }

    #[test]
    fn test_short_month_clamps_then_recovers() {
        // a January 31 start clamps to the end of February but returns to
        // the 31st in March
        let rows = build_schedule(Money::from_major(300), date(2024, 1, 31), 4).unwrap();
        assert_eq!(rows[0].due_date, date(2024, 1, 31));
        assert_eq!(rows[1].due_date, date(2024, 2, 29)); // leap year
        assert_eq!(rows[2].due_date, date(2024, 3, 31));
        assert_eq!(rows[3].due_date, date(2024, 4, 30));
    }

    #[test]
    fn test_non_leap_february() {
        let rows = build_schedule(Money::from_major(200), date(2025, 1, 30), 2).unwrap();
        assert_eq!(rows[1].due_date, date(2025, 2, 28));
    }

    #[test]
    fn test_amounts_sum_to_principal() {
        let principal = Money::from_cents(100000);
        let rows = build_schedule(principal, date(2024, 1, 1), 7).unwrap();
        let sum: Money = rows.iter().map(|r| r.amount).sum();
        assert_eq!(sum, principal);
    }

    #[test]
    fn test_count_bounds() {
        let principal = Money::from_major(100);
        let first = date(2024, 1, 1);
        assert!(build_schedule(principal, first, 0).is_err());
        assert!(build_schedule(principal, first, 121).is_err());
        assert!(build_schedule(principal, first, 120).is_ok());
        assert!(build_schedule(principal, first, 1).is_ok());
    }
}
