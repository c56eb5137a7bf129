//! Decimal money helpers.
//!
//! Amounts are `rust_decimal::Decimal` everywhere. Nothing here rounds:
//! a total is the exact sum of its line totals.

use rust_decimal::Decimal;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },
    #[error("amount overflowed")]
    Overflow,
}

/// Reject zero and negative amounts.
///
/// # Errors
///
/// Returns `MoneyError::NotPositive` naming `field` when `amount <= 0`.
pub fn require_positive(field: &'static str, amount: Decimal) -> Result<Decimal, MoneyError> {
    if amount > Decimal::ZERO {
        Ok(amount)
    } else {
        Err(MoneyError::NotPositive { field })
    }
}

/// `quantity × price`, checked.
///
/// # Errors
///
/// Returns `MoneyError::Overflow` if the product does not fit in a `Decimal`.
pub fn line_total(quantity: i32, price: Decimal) -> Result<Decimal, MoneyError> {
    Decimal::from(quantity)
        .checked_mul(price)
        .ok_or(MoneyError::Overflow)
}

/// Sum of `quantity × price` over all lines.
///
/// # Errors
///
/// Returns `MoneyError::Overflow` if any product or the running sum overflows.
pub fn order_total<I>(lines: I) -> Result<Decimal, MoneyError>
where
    I: IntoIterator<Item = (i32, Decimal)>,
{
    lines.into_iter().try_fold(Decimal::ZERO, |acc, (qty, price)| {
        acc.checked_add(line_total(qty, price)?)
            .ok_or(MoneyError::Overflow)
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_require_positive() {
        assert_eq!(require_positive("price", dec("0.01")), Ok(dec("0.01")));
        assert_eq!(
            require_positive("price", Decimal::ZERO),
            Err(MoneyError::NotPositive { field: "price" })
        );
        assert!(require_positive("amount", dec("-5")).is_err());
    }

    #[test]
    fn test_order_total_is_exact() {
        let total = order_total([(2, dec("10.0")), (3, dec("0.10"))]).unwrap();
        assert_eq!(total, dec("20.30"));
    }

    #[test]
    fn test_order_total_empty_is_zero() {
        assert_eq!(order_total([]).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_line_total_overflow() {
        assert_eq!(line_total(i32::MAX, Decimal::MAX), Err(MoneyError::Overflow));
    }
}
