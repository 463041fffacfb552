//! # Domain Types
//!
//! Core domain types for the Comptoir ledger subsystem.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Aggregates (mutable balances, owned by the ledgers)                   │
//! │  ┌─────────────────┐   ┌─────────────────────────────┐                 │
//! │  │    Product      │   │         Customer            │                 │
//! │  │  quantity (±)   │   │  credit_balance, points     │                 │
//! │  └─────────────────┘   └─────────────────────────────┘                 │
//! │                                                                         │
//! │  Ledger entries (append-only, immutable once created)                  │
//! │  ┌──────────────────┐ ┌───────────────────┐ ┌────────────────────┐     │
//! │  │ StockTransaction │ │ CreditTransaction │ │ LoyaltyTransaction │     │
//! │  │ signed by type   │ │ balance_after     │ │ balance_after      │     │
//! │  └──────────────────┘ └───────────────────┘ └────────────────────┘     │
//! │                                                                         │
//! │  Sale aggregate (written once during its creation transaction)         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │      Sale       │   │    SaleItem     │  (price snapshots)          │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists: the CUG (store-level product code)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::loyalty::LoyaltyRates;
use crate::money::{CurrencyProfile, Money};
use crate::points::Points;

// =============================================================================
// Stock Ledger Types
// =============================================================================

/// The type of a stock ledger entry.
///
/// The entry type alone carries the sign: quantities on entries are
/// unsigned magnitudes, and the signed delta applied to `Product.quantity`
/// is derived here. This keeps the stock-sum invariant a plain fold with
/// no per-entry special cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum StockEntryType {
    /// Goods received (reception, restock, customer return).
    In,
    /// Goods leaving (sale, manual removal).
    Out,
    /// Upward inventory correction.
    Adjustment,
    /// Shrinkage, breakage, theft.
    Loss,
    /// A removal that drove the quantity below zero (oversold).
    Backorder,
}

impl StockEntryType {
    /// Whether this entry type adds stock.
    #[inline]
    pub const fn is_inbound(&self) -> bool {
        matches!(self, StockEntryType::In | StockEntryType::Adjustment)
    }

    /// Converts an unsigned magnitude into the signed delta this entry
    /// type applies to `Product.quantity`.
    #[inline]
    pub const fn signed_delta(&self, magnitude: i64) -> i64 {
        if self.is_inbound() {
            magnitude
        } else {
            -magnitude
        }
    }
}

/// Business context of a stock movement, passed explicitly by the caller.
///
/// The context never comes from sniffing free-text notes after the fact;
/// it is an input to every stock operation and only *generates* the
/// normalized note prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum StockContext {
    Reception,
    Inventory,
    Manual,
    Sale,
    Return,
    Correction,
    Loss,
}

impl StockContext {
    /// The normalized French note label for this context.
    pub const fn label(&self) -> &'static str {
        match self {
            StockContext::Reception => "Réception marchandise",
            StockContext::Inventory => "Écart inventaire",
            StockContext::Manual => "Ajustement manuel",
            StockContext::Sale => "Vente",
            StockContext::Return => "Retour client",
            StockContext::Correction => "Correction de stock",
            StockContext::Loss => "Perte",
        }
    }

    /// Prefixes free-text notes with the context label.
    ///
    /// Notes that already start with the expected label (case-insensitive)
    /// are left untouched so repeated tagging can never double-prefix.
    ///
    /// ## Example
    /// ```rust
    /// use comptoir_core::types::StockContext;
    ///
    /// let ctx = StockContext::Reception;
    /// assert_eq!(ctx.tag_notes(None), "Réception marchandise");
    /// assert_eq!(
    ///     ctx.tag_notes(Some("lot 42")),
    ///     "Réception marchandise — lot 42"
    /// );
    /// assert_eq!(
    ///     ctx.tag_notes(Some("réception marchandise — lot 42")),
    ///     "réception marchandise — lot 42"
    /// );
    /// ```
    pub fn tag_notes(&self, notes: Option<&str>) -> String {
        let label = self.label();
        match notes.map(str::trim).filter(|n| !n.is_empty()) {
            None => label.to_string(),
            Some(text) => {
                if text.to_lowercase().starts_with(&label.to_lowercase()) {
                    text.to_string()
                } else {
                    format!("{} — {}", label, text)
                }
            }
        }
    }
}

/// Derived stock level classification, reported back to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    /// Above the alert threshold.
    Ok,
    /// At or below the alert threshold but still positive.
    Low,
    /// Exactly zero.
    OutOfStock,
    /// Negative quantity: oversold, awaiting replenishment.
    Backorder,
}

impl StockStatus {
    /// Classifies a quantity against a product's alert threshold.
    pub const fn from_quantity(quantity: i64, alert_threshold: i64) -> Self {
        if quantity < 0 {
            StockStatus::Backorder
        } else if quantity == 0 {
            StockStatus::OutOfStock
        } else if quantity <= alert_threshold {
            StockStatus::Low
        } else {
            StockStatus::Ok
        }
    }
}

/// A product whose quantity is mutated only through the stock ledger.
///
/// Catalog management (creation, pricing, naming) is an external
/// collaborator; the ledger subsystem owns `quantity` alone. Negative
/// quantity is a supported state (backorder), not corruption.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: String,
    pub tenant_id: String,
    /// Store-level product code (CUG), distinct from barcode/EAN.
    pub cug: String,
    pub name: String,
    /// Signed stock level. Negative = backorder.
    pub quantity: i64,
    /// Stock level at or below which the product is flagged low.
    pub alert_threshold: i64,
    pub purchase_price_minor: i64,
    pub selling_price_minor: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn purchase_price(&self) -> Money {
        Money::from_minor(self.purchase_price_minor)
    }

    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_minor(self.selling_price_minor)
    }

    /// Current stock classification.
    #[inline]
    pub fn stock_status(&self) -> StockStatus {
        StockStatus::from_quantity(self.quantity, self.alert_threshold)
    }
}

/// An append-only stock ledger entry.
///
/// Immutable once created. Summing `signed_delta()` over a product's
/// entries from the first one reconstructs `Product.quantity` exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockTransaction {
    pub id: String,
    pub tenant_id: String,
    pub product_id: String,
    pub entry_type: StockEntryType,
    /// Unsigned magnitude; the sign comes from `entry_type`.
    pub quantity: i64,
    /// Price snapshot at entry time, not the live product price.
    pub unit_price_minor: i64,
    pub context: StockContext,
    pub notes: String,
    pub sale_id: Option<String>,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl StockTransaction {
    /// The signed quantity this entry applied to the product.
    #[inline]
    pub fn signed_delta(&self) -> i64 {
        self.entry_type.signed_delta(self.quantity)
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_minor(self.unit_price_minor)
    }
}

// =============================================================================
// Customer & Credit Ledger Types
// =============================================================================

/// A customer whose credit balance and loyalty points are mutated only
/// through the credit and loyalty ledgers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub is_active: bool,
    /// Signed money; positive = customer owes the store.
    pub credit_balance_minor: i64,
    /// Advisory ceiling on the credit balance (see DESIGN.md).
    pub credit_limit_minor: i64,
    /// Non-negative centipoints.
    pub loyalty_points_centi: i64,
    pub is_loyalty_member: bool,
    pub loyalty_joined_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    #[inline]
    pub fn credit_balance(&self) -> Money {
        Money::from_minor(self.credit_balance_minor)
    }

    #[inline]
    pub fn credit_limit(&self) -> Money {
        Money::from_minor(self.credit_limit_minor)
    }

    #[inline]
    pub fn loyalty_points(&self) -> Points {
        Points::from_centi(self.loyalty_points_centi)
    }

    /// Whether the balance sits above the configured limit.
    #[inline]
    pub fn over_credit_limit(&self) -> bool {
        self.credit_limit_minor > 0 && self.credit_balance_minor > self.credit_limit_minor
    }
}

/// The type of a credit ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum CreditEntryType {
    /// A sale charged to the customer's account (amount positive).
    SaleCredit,
    /// A repayment by the customer (amount negative).
    Payment,
    /// Manual correction, either sign.
    Adjustment,
}

/// An append-only credit ledger entry with a running-balance snapshot.
///
/// Invariant: ordered by commit time, `balance_after` of entry *n* equals
/// `balance_after` of entry *n-1* plus this entry's signed `amount_minor`
/// (the first entry's `balance_after` equals its amount).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CreditTransaction {
    pub id: String,
    pub tenant_id: String,
    pub customer_id: String,
    pub sale_id: Option<String>,
    pub entry_type: CreditEntryType,
    /// Signed amount in minor units.
    pub amount_minor: i64,
    /// Snapshot of `Customer.credit_balance` immediately after this entry.
    pub balance_after_minor: i64,
    pub notes: Option<String>,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl CreditTransaction {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_minor(self.amount_minor)
    }

    #[inline]
    pub fn balance_after(&self) -> Money {
        Money::from_minor(self.balance_after_minor)
    }
}

// =============================================================================
// Loyalty Types
// =============================================================================

/// Per-tenant loyalty configuration: the conversion rates between sale
/// amounts and points. One row per tenant, created lazily with
/// currency-aware defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LoyaltyProgram {
    pub id: String,
    pub tenant_id: String,
    /// Points granted per `amount_for_points` spent, in centipoints.
    pub points_per_amount_centi: i64,
    /// Spend bracket that earns `points_per_amount`, in minor units.
    pub amount_for_points_minor: i64,
    /// Monetary value of one whole point, in minor units.
    pub amount_per_point_minor: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LoyaltyProgram {
    /// Default program for a tenant, scaled to the currency.
    ///
    /// For FCFA: 1 point per 100 FCFA spent, each point worth 100 FCFA.
    /// For two-decimal currencies the same ratios scale by the minor unit.
    pub fn with_defaults(
        tenant_id: impl Into<String>,
        profile: &CurrencyProfile,
        id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let scale = profile.minor_per_major();
        LoyaltyProgram {
            id: id.into(),
            tenant_id: tenant_id.into(),
            points_per_amount_centi: 100,
            amount_for_points_minor: 100 * scale,
            amount_per_point_minor: 100 * scale,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// The pure conversion rates used by the loyalty math.
    #[inline]
    pub fn rates(&self) -> LoyaltyRates {
        LoyaltyRates {
            points_per_amount: Points::from_centi(self.points_per_amount_centi),
            amount_for_points: Money::from_minor(self.amount_for_points_minor),
            amount_per_point: Money::from_minor(self.amount_per_point_minor),
            is_active: self.is_active,
        }
    }
}

/// The type of a loyalty ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum LoyaltyEntryType {
    /// Points granted (positive).
    Earned,
    /// Points consumed (negative).
    Redeemed,
}

/// An append-only loyalty ledger entry with a running-balance snapshot.
///
/// Same running-balance invariant as [`CreditTransaction`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LoyaltyTransaction {
    pub id: String,
    pub tenant_id: String,
    pub customer_id: String,
    pub sale_id: Option<String>,
    pub entry_type: LoyaltyEntryType,
    /// Signed centipoints: positive for earned, negative for redeemed.
    pub points_centi: i64,
    /// Snapshot of `Customer.loyalty_points` immediately after this entry.
    pub balance_after_centi: i64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LoyaltyTransaction {
    #[inline]
    pub fn points(&self) -> Points {
        Points::from_centi(self.points_centi)
    }

    #[inline]
    pub fn balance_after(&self) -> Points {
        Points::from_centi(self.balance_after_centi)
    }
}

// =============================================================================
// Sale Types
// =============================================================================

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash, change computed from the amount given.
    Cash,
    /// Sarali mobile money, with an optional free-text reference.
    Sarali,
    /// Charged to the customer's store credit account.
    Credit,
    Card,
    Mobile,
    Transfer,
}

/// Settlement state of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    /// Credit sales stay pending until the customer pays down the balance.
    Pending,
}

/// A sale, created once and immutable after its creation transaction.
///
/// Ledger entries reference the sale by id but never rewrite it; the
/// final totals are computed and persisted inside the same orchestration
/// transaction that wrote the ledger entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub tenant_id: String,
    pub customer_id: Option<String>,
    /// Σ(quantity × unit_price) over the items.
    pub subtotal_minor: i64,
    /// Manual discount applied before loyalty.
    pub discount_minor: i64,
    /// Discount funded by redeemed loyalty points (capped at the total).
    pub loyalty_discount_minor: i64,
    /// Post-discount amount owed.
    pub total_minor: i64,
    pub loyalty_points_earned_centi: i64,
    pub loyalty_points_used_centi: i64,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub amount_paid_minor: i64,
    pub amount_given_minor: Option<i64>,
    pub change_minor: Option<i64>,
    pub payment_reference: Option<String>,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_minor(self.subtotal_minor)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_minor(self.total_minor)
    }

    #[inline]
    pub fn loyalty_discount(&self) -> Money {
        Money::from_minor(self.loyalty_discount_minor)
    }
}

/// A line item in a sale.
/// Uses the snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// CUG at time of sale (frozen).
    pub cug_snapshot: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    pub quantity: i64,
    /// Unit selling price at time of sale (frozen).
    pub unit_price_minor: i64,
    /// Unit purchase price at time of sale (frozen), for margin reporting.
    pub purchase_price_minor: i64,
    /// unit_price × quantity.
    pub line_total_minor: i64,
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_minor(self.unit_price_minor)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_minor(self.line_total_minor)
    }

    /// Gross margin on this line: (selling − purchase) × quantity.
    #[inline]
    pub fn margin(&self) -> Money {
        Money::from_minor(self.line_total_minor - self.purchase_price_minor * self.quantity)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_delta() {
        assert_eq!(StockEntryType::In.signed_delta(5), 5);
        assert_eq!(StockEntryType::Adjustment.signed_delta(3), 3);
        assert_eq!(StockEntryType::Out.signed_delta(5), -5);
        assert_eq!(StockEntryType::Loss.signed_delta(2), -2);
        assert_eq!(StockEntryType::Backorder.signed_delta(4), -4);
    }

    #[test]
    fn test_tag_notes_plain() {
        let ctx = StockContext::Reception;
        assert_eq!(ctx.tag_notes(None), "Réception marchandise");
        assert_eq!(ctx.tag_notes(Some("  ")), "Réception marchandise");
        assert_eq!(
            ctx.tag_notes(Some("lot 42")),
            "Réception marchandise — lot 42"
        );
    }

    #[test]
    fn test_tag_notes_never_double_prefixes() {
        let ctx = StockContext::Inventory;
        let already = "Écart inventaire — comptage du soir";
        assert_eq!(ctx.tag_notes(Some(already)), already);

        // Case-insensitive comparison
        let lower = "écart inventaire — comptage du soir";
        assert_eq!(ctx.tag_notes(Some(lower)), lower);
    }

    #[test]
    fn test_stock_status() {
        assert_eq!(StockStatus::from_quantity(-2, 5), StockStatus::Backorder);
        assert_eq!(StockStatus::from_quantity(0, 5), StockStatus::OutOfStock);
        assert_eq!(StockStatus::from_quantity(3, 5), StockStatus::Low);
        assert_eq!(StockStatus::from_quantity(5, 5), StockStatus::Low);
        assert_eq!(StockStatus::from_quantity(6, 5), StockStatus::Ok);
    }

    #[test]
    fn test_program_defaults_scale_with_currency() {
        let now = Utc::now();
        let xof = LoyaltyProgram::with_defaults("t1", &CurrencyProfile::xof(), "p1", now);
        assert_eq!(xof.points_per_amount_centi, 100);
        assert_eq!(xof.amount_for_points_minor, 100);
        assert_eq!(xof.amount_per_point_minor, 100);

        let eur =
            LoyaltyProgram::with_defaults("t1", &CurrencyProfile::two_decimal("EUR"), "p2", now);
        assert_eq!(eur.amount_for_points_minor, 10_000);
        assert_eq!(eur.amount_per_point_minor, 10_000);
    }

    #[test]
    fn test_over_credit_limit() {
        let now = Utc::now();
        let mut customer = Customer {
            id: "c1".to_string(),
            tenant_id: "t1".to_string(),
            name: "Awa".to_string(),
            is_active: true,
            credit_balance_minor: 40_000,
            credit_limit_minor: 50_000,
            loyalty_points_centi: 0,
            is_loyalty_member: false,
            loyalty_joined_at: None,
            created_at: now,
            updated_at: now,
        };
        assert!(!customer.over_credit_limit());

        customer.credit_balance_minor = 60_000;
        assert!(customer.over_credit_limit());

        // A zero limit means "no limit configured"
        customer.credit_limit_minor = 0;
        assert!(!customer.over_credit_limit());
    }

    #[test]
    fn test_sale_item_margin() {
        let item = SaleItem {
            id: "i1".to_string(),
            sale_id: "s1".to_string(),
            product_id: "p1".to_string(),
            cug_snapshot: "CUG-001".to_string(),
            name_snapshot: "Savon".to_string(),
            quantity: 3,
            unit_price_minor: 500,
            purchase_price_minor: 300,
            line_total_minor: 1500,
            created_at: Utc::now(),
        };
        assert_eq!(item.margin().minor(), 600);
    }
}
