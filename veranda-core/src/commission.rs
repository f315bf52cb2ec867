use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

/// Result of splitting a booking total between platform and tenant.
/// `platform_fee_cents + tenant_revenue_cents` always equals the input total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommissionSplit {
    pub platform_fee_cents: i64,
    pub tenant_revenue_cents: i64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommissionError {
    #[error("booking total must not be negative, got {0}")]
    NegativeTotal(i64),

    #[error("commission percent must be between 0 and 100, got {0}")]
    PercentOutOfRange(Decimal),

    #[error("commission computation overflowed")]
    Overflow,
}

/// Splits a booking total into platform fee and tenant revenue.
///
/// The fee is `ceil(total × percent / 100)`: when the exact share lands on a
/// fraction of a cent, the extra cent goes to the platform. Inputs outside
/// the contract are rejected, never clamped. Pure and deterministic, so it is
/// safe to call anywhere, including inside a storage transaction.
pub fn split_total(total_cents: i64, commission_percent: Decimal) -> Result<CommissionSplit, CommissionError> {
    if total_cents < 0 {
        return Err(CommissionError::NegativeTotal(total_cents));
    }
    if commission_percent < Decimal::ZERO || commission_percent > Decimal::ONE_HUNDRED {
        return Err(CommissionError::PercentOutOfRange(commission_percent));
    }

    let fee = (Decimal::from(total_cents) * commission_percent / Decimal::ONE_HUNDRED).ceil();
    let platform_fee_cents = fee.to_i64().ok_or(CommissionError::Overflow)?;

    Ok(CommissionSplit {
        platform_fee_cents,
        tenant_revenue_cents: total_cents - platform_fee_cents,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn pct(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn ten_percent_of_a_round_total() {
        let split = split_total(150_000, pct("10")).unwrap();
        assert_eq!(split.platform_fee_cents, 15_000);
        assert_eq!(split.tenant_revenue_cents, 135_000);
    }

    #[test]
    fn fractional_fee_rounds_toward_platform() {
        // 1% of 101 cents is 1.01 cents; the platform gets the whole 2nd cent.
        let split = split_total(101, pct("1")).unwrap();
        assert_eq!(split.platform_fee_cents, 2);
        assert_eq!(split.tenant_revenue_cents, 99);

        // 12.5% of 999 cents is 124.875 cents.
        let split = split_total(999, pct("12.5")).unwrap();
        assert_eq!(split.platform_fee_cents, 125);
        assert_eq!(split.tenant_revenue_cents, 874);
    }

    #[test]
    fn tiny_rates_still_cost_at_least_one_cent() {
        let split = split_total(1, pct("0.01")).unwrap();
        assert_eq!(split.platform_fee_cents, 1);
        assert_eq!(split.tenant_revenue_cents, 0);
    }

    #[test]
    fn zero_and_hundred_percent_bounds() {
        let split = split_total(150_000, pct("0")).unwrap();
        assert_eq!(split.platform_fee_cents, 0);
        assert_eq!(split.tenant_revenue_cents, 150_000);

        let split = split_total(150_000, pct("100")).unwrap();
        assert_eq!(split.platform_fee_cents, 150_000);
        assert_eq!(split.tenant_revenue_cents, 0);

        let split = split_total(0, pct("37.5")).unwrap();
        assert_eq!(split.platform_fee_cents, 0);
        assert_eq!(split.tenant_revenue_cents, 0);
    }

    #[test]
    fn split_always_partitions_the_total() {
        let totals = [0i64, 1, 99, 101, 999, 150_000, 999_999_999];
        let percents = ["0", "0.01", "1", "2.5", "9.99", "10", "12.5", "33.33", "99.99", "100"];
        for &total in &totals {
            for p in percents {
                let split = split_total(total, pct(p)).unwrap();
                assert_eq!(
                    split.platform_fee_cents + split.tenant_revenue_cents,
                    total,
                    "total {total} at {p}%"
                );
                assert!(split.platform_fee_cents >= 0);
                assert!(split.tenant_revenue_cents >= 0);
            }
        }
    }

    #[test]
    fn same_inputs_same_split() {
        let a = split_total(982_451, pct("7.25")).unwrap();
        let b = split_total(982_451, pct("7.25")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_inputs_are_rejected_not_clamped() {
        assert_eq!(split_total(-1, pct("10")), Err(CommissionError::NegativeTotal(-1)));
        assert!(matches!(
            split_total(1000, pct("-0.01")),
            Err(CommissionError::PercentOutOfRange(_))
        ));
        assert!(matches!(
            split_total(1000, pct("100.01")),
            Err(CommissionError::PercentOutOfRange(_))
        ));
    }
}
