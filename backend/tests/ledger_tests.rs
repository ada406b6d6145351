//! Inventory ledger tests
//!
//! Property-based and unit tests for the stock arithmetic behind every
//! sale, reversal, edit and receipt:
//! - Selling never drives stock negative
//! - A failed sale leaves stock untouched
//! - Reversal restores the pre-sale level
//! - Edits move only the difference

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{deduct, line_total, plan_edit, restore, InsufficientStock};
use std::str::FromStr;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Stock levels seen on a pharmacy shelf
fn stock_strategy() -> impl Strategy<Value = i32> {
    0..10_000i32
}

/// Positive sale quantities
fn quantity_strategy() -> impl Strategy<Value = i32> {
    1..500i32
}

/// Prices with at most two decimal places
fn price_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Quantity 20 at selling price 70: sell 5, fail 20, reverse the first
    #[test]
    fn test_sale_scenario() {
        let stock = 20;
        let price = dec("70");

        let after_first = deduct(stock, 5).unwrap();
        assert_eq!(after_first, 15);
        assert_eq!(line_total(price, 5), Ok(dec("350")));

        let err = deduct(after_first, 20).unwrap_err();
        assert_eq!(
            err,
            InsufficientStock {
                available: 15,
                requested: 20
            }
        );

        assert_eq!(restore(after_first, 5), 20);
    }

    /// Receiving 10 at 40 onto 5 in stock
    #[test]
    fn test_receive_stock_scenario() {
        assert_eq!(restore(5, 10), 15);
        assert_eq!(line_total(dec("40"), 10), Ok(dec("400")));
    }

    #[test]
    fn test_selling_whole_stock_leaves_zero() {
        assert_eq!(deduct(7, 7), Ok(0));
    }

    #[test]
    fn test_edit_up_beyond_stock_fails() {
        // Sale of 5 with 3 left: raising to 9 needs 4 more
        let err = plan_edit(5, 9, 3).unwrap_err();
        assert_eq!(err.available, 3);
        assert_eq!(err.requested, 4);
    }

    #[test]
    fn test_edit_down_returns_stock() {
        let edit = plan_edit(5, 2, 3).unwrap();
        assert_eq!(edit.delta, -3);
        assert_eq!(edit.remaining, 6);
    }

    #[test]
    fn test_edit_without_quantity_change() {
        let edit = plan_edit(4, 4, 0).unwrap();
        assert_eq!(edit.delta, 0);
        assert_eq!(edit.remaining, 0);
    }

    #[test]
    fn test_line_total_keeps_cents() {
        assert_eq!(line_total(dec("12.50"), 3), Ok(dec("37.50")));
    }

    /// The largest representable price times ten units cannot be totalled
    #[test]
    fn test_line_total_overflow_reports_inputs() {
        let price = dec("79228162514264337593543950335");
        let err = line_total(price, 10).unwrap_err();
        assert_eq!(err.unit_price, price);
        assert_eq!(err.quantity, 10);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A sale succeeds exactly when it fits, and never leaves negative stock
    #[test]
    fn prop_deduct_never_negative(
        stock in stock_strategy(),
        quantity in quantity_strategy(),
    ) {
        match deduct(stock, quantity) {
            Ok(remaining) => {
                prop_assert!(quantity <= stock);
                prop_assert!(remaining >= 0);
                prop_assert_eq!(remaining, stock - quantity);
            }
            Err(err) => {
                prop_assert!(quantity > stock);
                prop_assert_eq!(err.available, stock);
                prop_assert_eq!(err.requested, quantity);
            }
        }
    }

    /// Repeating an unsatisfiable sale reports the same availability every time
    #[test]
    fn prop_failed_sale_is_idempotent(
        stock in 0..100i32,
        extra in 1..100i32,
        attempts in 1..10usize,
    ) {
        let requested = stock + extra;
        for _ in 0..attempts {
            let err = deduct(stock, requested).unwrap_err();
            prop_assert_eq!(err.available, stock);
        }
    }

    /// Selling then reversing restores the starting level
    #[test]
    fn prop_reversal_restores_stock(
        stock in stock_strategy(),
        quantity in quantity_strategy(),
    ) {
        prop_assume!(quantity <= stock);
        let remaining = deduct(stock, quantity).unwrap();
        prop_assert_eq!(restore(remaining, quantity), stock);
    }

    /// Sequential single-unit sales against K units: exactly K succeed
    #[test]
    fn prop_sequential_sales_exhaust_exactly(
        stock in 0..50i32,
        attempts in 0..100usize,
    ) {
        let mut level = stock;
        let mut successes = 0;
        for _ in 0..attempts {
            if let Ok(next) = deduct(level, 1) {
                level = next;
                successes += 1;
            }
        }
        let expected = (stock as usize).min(attempts);
        prop_assert_eq!(successes, expected);
        prop_assert_eq!(level, stock - expected as i32);
    }

    /// Editing a sale is the same as reversing it and selling the new quantity
    #[test]
    fn prop_edit_matches_reverse_then_sell(
        stock in stock_strategy(),
        old_quantity in quantity_strategy(),
        new_quantity in quantity_strategy(),
    ) {
        let after_reverse = restore(stock, old_quantity);
        let resold = deduct(after_reverse, new_quantity);

        match plan_edit(old_quantity, new_quantity, stock) {
            Ok(edit) => {
                prop_assert_eq!(edit.delta, new_quantity - old_quantity);
                prop_assert_eq!(Ok(edit.remaining), resold);
            }
            Err(_) => prop_assert!(resold.is_err()),
        }
    }

    /// Line totals scale with quantity
    #[test]
    fn prop_line_total_is_price_times_quantity(
        price in price_strategy(),
        quantity in quantity_strategy(),
    ) {
        let total = line_total(price, quantity).unwrap();
        prop_assert_eq!(total, price * Decimal::from(quantity));
        prop_assert!(total >= Decimal::ZERO);
        prop_assert!(total.scale() <= 2);
    }
}
