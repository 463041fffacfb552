//! # comptoir-core: Pure Business Logic for Comptoir
//!
//! This crate is the **heart** of the Comptoir ledger backend. It contains
//! all business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Comptoir Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Callers (API boundary, seed binary)                │   │
//! │  │   AddStock, RemoveStock, AdjustStock, CreateSale, Calculate...  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ comptoir-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌─────────────────┐   │   │
//! │  │   │  money   │ │  points  │ │ loyalty  │ │    payment      │   │   │
//! │  │   │  Money   │ │  Points  │ │ capping  │ │  PaymentPlan    │   │   │
//! │  │   │ Currency │ │          │ │ math     │ │  dispatch       │   │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └─────────────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 comptoir-db (Database Layer)                    │   │
//! │  │     SQLite ledgers, migrations, sale orchestration              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Customer, ledger entries, Sale)
//! - [`money`] - Money type with integer arithmetic + CurrencyProfile
//! - [`points`] - Fixed-point loyalty point quantities
//! - [`loyalty`] - Earn/redeem conversion math and the capping rule
//! - [`payment`] - PaymentPlan dispatch for sale settlement
//! - [`error`] - Domain error taxonomy
//! - [`validation`] - Input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: every function is deterministic - same input = same output
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Arithmetic**: money in minor units (i64), points in centipoints (i64)
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod loyalty;
pub mod money;
pub mod payment;
pub mod points;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use comptoir_core::Money` instead of
// `use comptoir_core::money::Money`

pub use error::{BusinessRuleViolation, LedgerError, LedgerResult, ValidationError};
pub use loyalty::LoyaltyRates;
pub use money::{CurrencyProfile, Money, Rounding};
pub use payment::{PaymentOutcome, PaymentPlan};
pub use points::Points;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default tenant ID for single-site deployments (multi-tenant schema,
/// single-tenant runtime). Replaced by dynamic tenant resolution when a
/// site provisioning layer exists in front of this crate.
pub const DEFAULT_TENANT_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Maximum magnitude of a single stock movement or sale line.
///
/// Prevents accidental over-entry (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum line items in a single sale.
pub const MAX_SALE_ITEMS: usize = 100;

/// Maximum length of free-text notes on a ledger entry.
pub const MAX_NOTE_LENGTH: usize = 500;
