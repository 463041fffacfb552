//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely, plus the
//! `CurrencyProfile` describing how a tenant's currency rounds and displays.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Minor Units                                      │
//! │    Every amount is an i64 count of the currency's smallest unit.        │
//! │    FCFA has no minor unit, so 1000 == 1000 FCFA.                        │
//! │    EUR has cents, so 1000 == 10.00 EUR.                                 │
//! │                                                                         │
//! │  The CurrencyProfile says how many decimal places the currency has      │
//! │  and which rounding mode applies when a computed fraction must be       │
//! │  snapped back to a representable amount.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use comptoir_core::money::{CurrencyProfile, Money};
//!
//! // Create from minor units (the only constructor)
//! let price = Money::from_minor(1500);
//!
//! // Arithmetic operations
//! let doubled = price * 2;
//! let total = price + Money::from_minor(500);
//!
//! // Display depends on the currency profile
//! let xof = CurrencyProfile::xof();
//! assert_eq!(xof.format(total), "2000 XOF");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: credit balances go positive (customer owes) and ledger
///   amounts go negative (payments, redemptions)
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **No float constructors**: amounts enter the system as minor units
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use comptoir_core::money::Money;
    ///
    /// let price = Money::from_minor(1500); // 1500 FCFA (or 15.00 EUR)
    /// assert_eq!(price.minor(), 1500);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Returns the smaller of two amounts.
    ///
    /// Used by the redemption capping rule: the discount applied is
    /// `min(points value, sale total)`.
    #[inline]
    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    /// Clamps a value at zero from below.
    ///
    /// A sale total after a capped loyalty discount can mathematically reach
    /// zero but must never go negative.
    #[inline]
    pub const fn clamp_non_negative(self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            self
        }
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use comptoir_core::money::Money;
    ///
    /// let unit_price = Money::from_minor(250);
    /// let line_total = unit_price.multiply_quantity(3);
    /// assert_eq!(line_total.minor(), 750);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows the raw minor-unit count.
///
/// ## Note
/// This is for debugging and log fields. Use [`CurrencyProfile::format`]
/// when a currency-aware rendering is needed.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Currency Profile
// =============================================================================

/// How fractional intermediate results snap back to representable amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    /// Round half away from zero (retail convention).
    HalfUp,
    /// Round half to even (banker's rounding).
    HalfEven,
}

/// Explicit currency behavior, passed into the ledgers as configuration.
///
/// Zero-decimal currencies (FCFA) and two-decimal currencies (EUR, USD)
/// differ in what "round to the smallest unit" means. That difference is
/// modeled here and never inferred from a currency-code string at call time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyProfile {
    /// ISO 4217 code, display-only.
    pub code: String,
    /// Number of decimal places in the major unit (0 for FCFA, 2 for EUR).
    pub decimal_places: u8,
    /// Rounding mode applied by conversion math.
    pub rounding: Rounding,
}

impl CurrencyProfile {
    /// West African CFA franc: no minor unit.
    pub fn xof() -> Self {
        CurrencyProfile {
            code: "XOF".to_string(),
            decimal_places: 0,
            rounding: Rounding::HalfUp,
        }
    }

    /// A standard two-decimal currency (EUR, USD, ...).
    pub fn two_decimal(code: impl Into<String>) -> Self {
        CurrencyProfile {
            code: code.into(),
            decimal_places: 2,
            rounding: Rounding::HalfUp,
        }
    }

    /// Minor units per major unit (1 for FCFA, 100 for EUR).
    pub fn minor_per_major(&self) -> i64 {
        10i64.pow(self.decimal_places as u32)
    }

    /// Renders an amount with the currency's decimal places and code.
    ///
    /// ## Example
    /// ```rust
    /// use comptoir_core::money::{CurrencyProfile, Money};
    ///
    /// assert_eq!(CurrencyProfile::xof().format(Money::from_minor(500)), "500 XOF");
    /// assert_eq!(
    ///     CurrencyProfile::two_decimal("EUR").format(Money::from_minor(-550)),
    ///     "-5.50 EUR"
    /// );
    /// ```
    pub fn format(&self, amount: Money) -> String {
        let scale = self.minor_per_major();
        if scale == 1 {
            return format!("{} {}", amount.minor(), self.code);
        }
        let sign = if amount.is_negative() { "-" } else { "" };
        let abs = amount.minor().abs();
        format!(
            "{}{}.{:0width$} {}",
            sign,
            abs / scale,
            abs % scale,
            self.code,
            width = self.decimal_places as usize
        )
    }
}

impl Default for CurrencyProfile {
    fn default() -> Self {
        CurrencyProfile::xof()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
