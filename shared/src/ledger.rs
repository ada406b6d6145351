//! Stock arithmetic for the inventory ledger
//!
//! These rules are the pure half of every stock mutation: the backend applies
//! them inside a database transaction, with the row lock held.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// A sale or edit asked for more units than are on hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[error("insufficient stock: requested {requested}, available {available}")]
pub struct InsufficientStock {
    pub available: i32,
    pub requested: i32,
}

/// A line total too large to represent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("total for {quantity} units at {unit_price} is out of range")]
pub struct AmountOutOfRange {
    pub unit_price: Decimal,
    pub quantity: i32,
}

/// Total for `quantity` units at `unit_price`
pub fn line_total(unit_price: Decimal, quantity: i32) -> Result<Decimal, AmountOutOfRange> {
    unit_price
        .checked_mul(Decimal::from(quantity))
        .ok_or(AmountOutOfRange {
            unit_price,
            quantity,
        })
}

/// Remaining stock after selling `requested` units
pub fn deduct(available: i32, requested: i32) -> Result<i32, InsufficientStock> {
    if requested > available {
        return Err(InsufficientStock {
            available,
            requested,
        });
    }
    Ok(available - requested)
}

/// Stock after a reversed sale hands `quantity` units back
pub fn restore(available: i32, quantity: i32) -> i32 {
    available.saturating_add(quantity)
}

/// Adjustment needed to move a sale from `old_quantity` to `new_quantity`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleEdit {
    /// Units taken from stock; negative when the edit returns units
    pub delta: i32,
    /// Stock on hand once the edit is applied
    pub remaining: i32,
}

/// Plan an edit of a sale's quantity against the current stock level.
///
/// Only the increase is checked against availability; shrinking a sale
/// always succeeds and puts the difference back.
pub fn plan_edit(
    old_quantity: i32,
    new_quantity: i32,
    available: i32,
) -> Result<SaleEdit, InsufficientStock> {
    let delta = new_quantity - old_quantity;
    if delta > 0 {
        let remaining = deduct(available, delta)?;
        Ok(SaleEdit { delta, remaining })
    } else {
        Ok(SaleEdit {
            delta,
            remaining: restore(available, -delta),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        assert_eq!(line_total(Decimal::from(70), 5), Ok(Decimal::from(350)));
        assert_eq!(line_total(Decimal::new(1250, 2), 3), Ok(Decimal::new(3750, 2)));
    }

    #[test]
    fn test_line_total_overflow_is_an_error() {
        let err = line_total(Decimal::MAX, 10).unwrap_err();
        assert_eq!(err.quantity, 10);
        assert_eq!(err.unit_price, Decimal::MAX);
    }

    #[test]
    fn test_deduct_exact_stock() {
        assert_eq!(deduct(15, 15), Ok(0));
    }

    #[test]
    fn test_deduct_insufficient() {
        assert_eq!(
            deduct(15, 20),
            Err(InsufficientStock {
                available: 15,
                requested: 20
            })
        );
    }

    #[test]
    fn test_plan_edit_increase() {
        let edit = plan_edit(5, 8, 10).unwrap();
        assert_eq!(edit, SaleEdit { delta: 3, remaining: 7 });
    }

    #[test]
    fn test_plan_edit_increase_beyond_stock() {
        let err = plan_edit(5, 20, 10).unwrap_err();
        assert_eq!(err.available, 10);
        assert_eq!(err.requested, 15);
    }

    #[test]
    fn test_plan_edit_decrease_returns_units() {
        let edit = plan_edit(5, 2, 0).unwrap();
        assert_eq!(edit, SaleEdit { delta: -3, remaining: 3 });
    }

    #[test]
    fn test_plan_edit_unchanged() {
        assert_eq!(plan_edit(4, 4, 0).unwrap().delta, 0);
    }
}
