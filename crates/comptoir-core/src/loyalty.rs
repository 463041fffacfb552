//! # Loyalty Conversion Math
//!
//! Pure conversions between sale amounts and loyalty points, plus the
//! redemption capping rule.
//!
//! ## The Capping Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Customer asks to redeem P points.                                      │
//! │                                                                         │
//! │  value(P) <= sale total  →  discount = value(P), redeem P               │
//! │                                                                         │
//! │  value(P) >  sale total  →  discount = sale total (capped)              │
//! │                             redeem value_to_points(discount), NOT P     │
//! │                                                                         │
//! │  Result: the ledger never records more points consumed than the         │
//! │  monetary benefit actually applied, and                                 │
//! │      Σ(value of points redeemed) == Σ(discount applied)                 │
//! │  holds as an invariant.                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All arithmetic widens to i128 before dividing and rounds explicitly,
//! so no intermediate result can overflow or drift.

use serde::{Deserialize, Serialize};

use crate::money::{Money, Rounding};
use crate::points::Points;

/// Conversion rates extracted from a tenant's loyalty program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyRates {
    /// Points granted per `amount_for_points` spent.
    pub points_per_amount: Points,
    /// Spend bracket that earns `points_per_amount`.
    pub amount_for_points: Money,
    /// Monetary value of one whole point.
    pub amount_per_point: Money,
    pub is_active: bool,
}

/// Integer division with an explicit rounding mode.
///
/// Inputs are non-negative in every caller (negative inputs short-circuit
/// to zero earlier); ties round away from zero for HalfUp and to the even
/// neighbor for HalfEven.
fn div_round(numerator: i128, denominator: i128, rounding: Rounding) -> i64 {
    debug_assert!(denominator > 0);
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    let doubled = remainder * 2;

    let rounded = match rounding {
        Rounding::HalfUp => {
            if doubled >= denominator {
                quotient + 1
            } else {
                quotient
            }
        }
        Rounding::HalfEven => {
            if doubled > denominator || (doubled == denominator && quotient % 2 != 0) {
                quotient + 1
            } else {
                quotient
            }
        }
    };
    rounded as i64
}

/// Points earned for a sale amount: `(amount / amount_for_points) ×
/// points_per_amount`, rounded to 2 decimal places.
///
/// Returns zero when the program is inactive, the amount is not positive,
/// or the rates are degenerate. Never returns a negative quantity.
///
/// ## Example
/// Program: 1 point per 100 FCFA. A 1000 FCFA sale earns 10.00 points.
pub fn points_earned(amount: Money, rates: &LoyaltyRates, rounding: Rounding) -> Points {
    if !rates.is_active
        || !amount.is_positive()
        || !rates.amount_for_points.is_positive()
        || !rates.points_per_amount.is_positive()
    {
        return Points::zero();
    }

    let centi = div_round(
        amount.minor() as i128 * rates.points_per_amount.centi() as i128,
        rates.amount_for_points.minor() as i128,
        rounding,
    );
    Points::from_centi(centi)
}

/// Monetary value of a point quantity: `points × amount_per_point`,
/// rounded to the currency's smallest unit.
///
/// Returns zero when the program is inactive or the quantity is not
/// positive. Never returns a negative amount.
pub fn points_value(points: Points, rates: &LoyaltyRates, rounding: Rounding) -> Money {
    if !rates.is_active || !points.is_positive() || !rates.amount_per_point.is_positive() {
        return Money::zero();
    }

    let minor = div_round(
        points.centi() as i128 * rates.amount_per_point.minor() as i128,
        100,
        rounding,
    );
    Money::from_minor(minor)
}

/// Inverse conversion: how many points correspond to a monetary amount.
///
/// Used when a capped discount must be rescaled back into the point
/// quantity actually consumed.
pub fn value_to_points(amount: Money, rates: &LoyaltyRates, rounding: Rounding) -> Points {
    if !rates.is_active || !amount.is_positive() || !rates.amount_per_point.is_positive() {
        return Points::zero();
    }

    let centi = div_round(
        amount.minor() as i128 * 100,
        rates.amount_per_point.minor() as i128,
        rounding,
    );
    Points::from_centi(centi)
}

/// Applies the capping rule to a redemption request.
///
/// Given the requested points and the sale's current total, returns
/// `(actual_points, actual_discount)` where the discount never exceeds
/// the total and, when capping occurred, the points are rescaled so the
/// ledger records only what funded the discount actually applied.
pub fn cap_redemption(
    requested: Points,
    sale_total: Money,
    rates: &LoyaltyRates,
    rounding: Rounding,
) -> (Points, Money) {
    let value = points_value(requested, rates, rounding);
    if value <= sale_total {
        return (requested, value);
    }

    let discount = sale_total;
    let actual_points = value_to_points(discount, rates, rounding);
    (actual_points, discount)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// 1 point per 100 FCFA spent; each point worth 100 FCFA.
    fn fcfa_rates() -> LoyaltyRates {
        LoyaltyRates {
            points_per_amount: Points::from_whole(1),
            amount_for_points: Money::from_minor(100),
            amount_per_point: Money::from_minor(100),
            is_active: true,
        }
    }

    #[test]
    fn test_points_earned_basic() {
        // 1000 FCFA at 1 point / 100 FCFA = 10.00 points
        let earned = points_earned(Money::from_minor(1000), &fcfa_rates(), Rounding::HalfUp);
        assert_eq!(earned, Points::from_whole(10));
    }

    #[test]
    fn test_points_earned_fractional() {
        // 250 FCFA earns 2.50 points
        let earned = points_earned(Money::from_minor(250), &fcfa_rates(), Rounding::HalfUp);
        assert_eq!(earned.centi(), 250);
    }

    #[test]
    fn test_points_earned_rounding_modes() {
        // 10.125 points: HalfUp -> 10.13, HalfEven -> 10.12
        let rates = LoyaltyRates {
            points_per_amount: Points::from_whole(1),
            amount_for_points: Money::from_minor(800),
            amount_per_point: Money::from_minor(100),
            is_active: true,
        };
        let amount = Money::from_minor(8100);
        assert_eq!(
            points_earned(amount, &rates, Rounding::HalfUp).centi(),
            1013
        );
        assert_eq!(
            points_earned(amount, &rates, Rounding::HalfEven).centi(),
            1012
        );
    }

    #[test]
    fn test_calculators_never_negative() {
        let rates = fcfa_rates();
        assert_eq!(
            points_earned(Money::from_minor(-500), &rates, Rounding::HalfUp),
            Points::zero()
        );
        assert_eq!(
            points_value(Points::from_centi(-100), &rates, Rounding::HalfUp),
            Money::zero()
        );
        assert_eq!(
            value_to_points(Money::from_minor(-100), &rates, Rounding::HalfUp),
            Points::zero()
        );
    }

    #[test]
    fn test_inactive_program_returns_zero() {
        let rates = LoyaltyRates {
            is_active: false,
            ..fcfa_rates()
        };
        assert_eq!(
            points_earned(Money::from_minor(1000), &rates, Rounding::HalfUp),
            Points::zero()
        );
        assert_eq!(
            points_value(Points::from_whole(10), &rates, Rounding::HalfUp),
            Money::zero()
        );
    }

    #[test]
    fn test_points_value() {
        // 10 points at 100 FCFA/point = 1000 FCFA
        let value = points_value(Points::from_whole(10), &fcfa_rates(), Rounding::HalfUp);
        assert_eq!(value, Money::from_minor(1000));
    }

    #[test]
    fn test_cap_not_triggered() {
        // 10 points worth 1000 against a 1500 total: no capping
        let (points, discount) = cap_redemption(
            Points::from_whole(10),
            Money::from_minor(1500),
            &fcfa_rates(),
            Rounding::HalfUp,
        );
        assert_eq!(points, Points::from_whole(10));
        assert_eq!(discount, Money::from_minor(1000));
    }

    #[test]
    fn test_cap_rescales_points() {
        // 10 points worth 1000 against a 500 total: discount capped at 500,
        // actual points consumed rescaled to 5
        let rates = fcfa_rates();
        let (points, discount) = cap_redemption(
            Points::from_whole(10),
            Money::from_minor(500),
            &rates,
            Rounding::HalfUp,
        );
        assert_eq!(discount, Money::from_minor(500));
        assert_eq!(points, Points::from_whole(5));

        // Capping law: value of the recorded points equals the discount
        assert_eq!(points_value(points, &rates, Rounding::HalfUp), discount);
    }

    #[test]
    fn test_cap_exact_fit() {
        let (points, discount) = cap_redemption(
            Points::from_whole(5),
            Money::from_minor(500),
            &fcfa_rates(),
            Rounding::HalfUp,
        );
        assert_eq!(points, Points::from_whole(5));
        assert_eq!(discount, Money::from_minor(500));
    }
}
