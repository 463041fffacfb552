//! # Validation Module
//!
//! Input validation utilities for the ledger subsystem.
//!
//! Validation always runs before any mutation: a request that fails here
//! leaves zero ledger rows and zero balance changes behind.
//!
//! ## Usage
//! ```rust
//! use comptoir_core::validation::{validate_quantity, validate_target_quantity};
//!
//! // Relative stock movements need a positive magnitude
//! validate_quantity(5).unwrap();
//!
//! // Absolute corrections may target zero but never below
//! validate_target_quantity(0).unwrap();
//! assert!(validate_target_quantity(-1).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::points::Points;
use crate::{MAX_ITEM_QUANTITY, MAX_NOTE_LENGTH, MAX_SALE_ITEMS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a stock movement magnitude.
///
/// ## Rules
/// - Must be positive (> 0) — direction comes from the entry type
/// - Must not exceed MAX_ITEM_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates an absolute stock correction target.
///
/// Unlike relative movements, a target of zero is fine; negative targets
/// are rejected (backorders arise from removals, never from corrections).
pub fn validate_target_quantity(target: i64) -> ValidationResult<()> {
    if target < 0 {
        return Err(ValidationError::OutOfRange {
            field: "target_quantity".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a monetary amount that must be strictly positive
/// (credit sale amounts, payments).
pub fn validate_positive_amount(amount: Money, field: &str) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a point quantity that must be strictly positive.
pub fn validate_positive_points(points: Points, field: &str) -> ValidationResult<()> {
    if !points.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Collection & String Validators
// =============================================================================

/// Validates the item list of a sale request.
pub fn validate_sale_items(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if count > MAX_SALE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_SALE_ITEMS as i64,
        });
    }

    Ok(())
}

/// Validates free-text notes attached to a ledger entry.
pub fn validate_notes(notes: Option<&str>) -> ValidationResult<()> {
    if let Some(notes) = notes {
        if notes.len() > MAX_NOTE_LENGTH {
            return Err(ValidationError::TooLong {
                field: "notes".to_string(),
                max: MAX_NOTE_LENGTH,
            });
        }
    }

    Ok(())
}

/// Validates a UUID string format.
pub fn validate_uuid(id: &str, field: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-5).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_target_quantity() {
        assert!(validate_target_quantity(0).is_ok());
        assert!(validate_target_quantity(50).is_ok());
        assert!(validate_target_quantity(-1).is_err());
    }

    #[test]
    fn test_validate_positive_amount() {
        assert!(validate_positive_amount(Money::from_minor(100), "amount").is_ok());
        assert!(validate_positive_amount(Money::zero(), "amount").is_err());
        assert!(validate_positive_amount(Money::from_minor(-100), "amount").is_err());
    }

    #[test]
    fn test_validate_sale_items() {
        assert!(validate_sale_items(1).is_ok());
        assert!(validate_sale_items(0).is_err());
        assert!(validate_sale_items(MAX_SALE_ITEMS + 1).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000", "id").is_ok());
        assert!(validate_uuid("", "id").is_err());
        assert!(validate_uuid("not-a-uuid", "id").is_err());
    }

    #[test]
    fn test_validate_notes() {
        assert!(validate_notes(None).is_ok());
        assert!(validate_notes(Some("lot 42")).is_ok());
        assert!(validate_notes(Some(&"x".repeat(MAX_NOTE_LENGTH + 1))).is_err());
    }
}
