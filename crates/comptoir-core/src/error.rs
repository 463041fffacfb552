//! # Error Types
//!
//! Domain-specific error types for comptoir-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  comptoir-core errors (this file)                                      │
//! │  ├── LedgerError           - What ledger operations return             │
//! │  ├── ValidationError       - Malformed input, rejected pre-mutation    │
//! │  └── BusinessRuleViolation - Rule failures that abort the operation    │
//! │                                                                         │
//! │  comptoir-db errors (separate crate)                                   │
//! │  └── DbError               - Database operation failures               │
//! │                                                                         │
//! │  Flow: ValidationError / BusinessRuleViolation → LedgerError → caller  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (customer id, balances, etc.)
//! 3. Errors are enum variants, never String
//! 4. A failed operation leaves zero ledger rows behind — errors are
//!    raised before mutation or roll the whole transaction back

use thiserror::Error;

// =============================================================================
// Ledger Error
// =============================================================================

/// Top-level error returned by ledger operations and the sale pipeline.
///
/// The four public categories map to distinct caller behavior:
/// validation and business-rule failures are terminal for the request,
/// not-found is a 404-equivalent, and concurrency conflicts are retryable
/// from the top of the operation (never resumable mid-pipeline).
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Malformed input. Always surfaced before any mutation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Referenced product/customer/sale does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A business rule rejected the operation; the enclosing transaction
    /// rolls back entirely.
    #[error("business rule violation: {0}")]
    BusinessRule(#[from] BusinessRuleViolation),

    /// Lock or serialization conflict. Recoverable by retrying the whole
    /// operation.
    #[error("concurrency conflict: {0}")]
    Concurrency(String),

    /// Storage or infrastructure failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Creates a NotFound error for a given entity type and id.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        LedgerError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

// =============================================================================
// Business Rule Violations
// =============================================================================

/// Rule failures that abort a sale or ledger operation.
///
/// These are 4xx-equivalents with a human-readable reason. The orchestrator
/// never swallows them and continues; the single tolerated degradation is
/// the loyalty *earning* step, which silently skips non-members (an
/// expected path, not an error).
#[derive(Debug, Error)]
pub enum BusinessRuleViolation {
    /// Credit sales require an active customer account.
    #[error("customer {customer_id} is inactive")]
    InactiveCustomer { customer_id: String },

    /// A credit sale needs a customer attached to the sale.
    #[error("credit sales require a customer")]
    CreditSaleWithoutCustomer,

    /// Redemption attempted for a customer outside the loyalty program.
    #[error("customer {customer_id} is not a loyalty member")]
    NotLoyaltyMember { customer_id: String },

    /// The tenant's loyalty program is switched off.
    #[error("loyalty program is inactive")]
    ProgramInactive,

    /// Redemption exceeds the customer's current point balance.
    #[error("insufficient points: requested {requested}, available {available}")]
    InsufficientPoints {
        requested: String,
        available: String,
    },

    /// Credit limit enforcement, when configured as a hard constraint.
    #[error("credit limit exceeded: balance {balance} over limit {limit}")]
    CreditLimitExceeded { balance: String, limit: String },
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input does not meet requirements and are used
/// for early validation before any ledger logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Exactly one of two mutually exclusive inputs must be provided
    /// (e.g., the point calculator takes an amount or a point count).
    #[error("exactly one of {first} or {second} must be provided")]
    ExactlyOneOf { first: String, second: String },
}

/// Convenience type alias for Results with LedgerError.
pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Unit Tests
// =============================================================================
