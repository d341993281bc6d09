use rust_decimal::{Decimal, RoundingStrategy};

use crate::decimal::Money;
use crate::errors::{EngineError, Result};

/// divide a principal into `count` parts that sum exactly to the principal
///
/// Every part gets the floored per-part amount; the last part absorbs the
/// rounding remainder, matching the usual accounting convention. The result
/// always sums back to `total` exactly under 2-decimal fixed-point
/// arithmetic.
pub fn split_amount(total: Money, count: u32) -> Result<Vec<Money>> {
    if !total.is_positive() {
        return Err(EngineError::InvalidArgument {
            message: format!("split total must be positive, got {}", total),
        });
    }
    if count < 1 {
        return Err(EngineError::InvalidArgument {
            message: "split count must be at least 1".to_string(),
        });
    }

    if count == 1 {
        return Ok(vec![total]);
    }

    let base_raw = total.as_decimal() / Decimal::from(count);
    let base = Money::from_decimal(base_raw.round_dp_with_strategy(2, RoundingStrategy::ToZero));
    let remainder = total - base * Decimal::from(count - 1) - base;

    let mut parts = vec![base; count as usize];
    if let Some(last) = parts.last_mut() {
        *last = base + remainder;
    }

    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hundred_across_three() {
        let parts = split_amount(Money::from_major(100), 3).unwrap();
        assert_eq!(
            parts,
            vec![
                Money::from_cents(3333),
                Money::from_cents(3333),
                Money::from_cents(3334),
            ]
        );
    }

    #[test]
    fn test_single_part_is_total() {
        let total = Money::from_cents(12345);
        assert_eq!(split_amount(total, 1).unwrap(), vec![total]);
    }

    #[test]
    fn test_exact_sum_and_equal_prefix() {
        let cases = [
            (Money::from_major(100), 3),
            (Money::from_cents(1), 1),
            (Money::from_cents(99999), 7),
            (Money::from_cents(100001), 12),
            (Money::from_major(1), 120),
            (Money::from_cents(1234567), 11),
        ];
        for (total, count) in cases {
            let parts = split_amount(total, count).unwrap();
            assert_eq!(parts.len(), count as usize);
            let sum: Money = parts.iter().copied().sum();
            assert_eq!(sum, total, "split of {} across {} must sum back", total, count);
            for part in &parts[..parts.len() - 1] {
                assert_eq!(*part, parts[0], "all parts but the last are equal");
            }
        }
    }

    #[test]
    fn test_last_absorbs_remainder() {
        let parts = split_amount(Money::from_cents(1000), 3).unwrap();
        assert_eq!(parts[0], Money::from_cents(333));
        assert_eq!(parts[2], Money::from_cents(334));
    }

    #[test]
    fn test_rejects_non_positive_total() {
        assert!(split_amount(Money::ZERO, 2).is_err());
        assert!(split_amount(Money::from_major(-5), 2).is_err());
    }

    #[test]
    fn test_rejects_zero_count() {
        let err = split_amount(Money::from_major(10), 0).unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument { .. }));
    }
}
