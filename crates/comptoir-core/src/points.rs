//! # Loyalty Points
//!
//! Fixed-point loyalty point quantities with two implied decimals.
//!
//! Points follow the same integer discipline as [`crate::money::Money`]:
//! a `Points` value is an i64 count of *centipoints* (hundredths of a
//! point), so `10.50` points is stored as `1050`. Ledger entries carry
//! signed values (positive = earned, negative = redeemed); a customer's
//! balance never goes below zero.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// A loyalty point quantity in centipoints (2 implied decimals).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Points(i64);

impl Points {
    /// Creates a Points value from centipoints.
    ///
    /// ## Example
    /// ```rust
    /// use comptoir_core::points::Points;
    ///
    /// let p = Points::from_centi(1050); // 10.50 points
    /// assert_eq!(p.centi(), 1050);
    /// ```
    #[inline]
    pub const fn from_centi(centi: i64) -> Self {
        Points(centi)
    }

    /// Creates a Points value from whole points.
    #[inline]
    pub const fn from_whole(points: i64) -> Self {
        Points(points * 100)
    }

    /// Returns the value in centipoints.
    #[inline]
    pub const fn centi(&self) -> i64 {
        self.0
    }

    /// Returns zero points.
    #[inline]
    pub const fn zero() -> Self {
        Points(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the smaller of two quantities.
    #[inline]
    pub fn min(self, other: Self) -> Self {
        Points(self.0.min(other.0))
    }
}

/// Display renders the decimal form, e.g. `10.50`.
impl fmt::Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Default for Points {
    fn default() -> Self {
        Points::zero()
    }
}

impl Add for Points {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Points(self.0 + other.0)
    }
}

impl AddAssign for Points {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Points {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Points(self.0 - other.0)
    }
}

impl SubAssign for Points {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Points {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Points(-self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        assert_eq!(Points::from_whole(10).centi(), 1000);
        assert_eq!(Points::from_centi(1050).centi(), 1050);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Points::from_centi(1050)), "10.50");
        assert_eq!(format!("{}", Points::from_centi(5)), "0.05");
        assert_eq!(format!("{}", Points::from_centi(-500)), "-5.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Points::from_whole(10);
        let b = Points::from_whole(4);
        assert_eq!((a - b).centi(), 600);
        assert_eq!((a + b).centi(), 1400);
        assert_eq!((-b).centi(), -400);
        assert_eq!(a.min(b), b);
    }
}
