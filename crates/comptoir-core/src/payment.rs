//! # Payment Plans
//!
//! Tagged payment handling for sale creation.
//!
//! Instead of a monolithic per-method branch inside the sale pipeline,
//! each payment method maps to a `PaymentPlan` variant with one small
//! handler. The orchestrator builds the plan up front (which also front-
//! loads the method-specific validation) and then dispatches on it once.
//!
//! ```text
//! PaymentMethod + request fields ──► PaymentPlan::for_request()
//!                                          │
//!                                          ▼
//!                                  plan.apply(total) ──► PaymentOutcome
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{BusinessRuleViolation, LedgerError, ValidationError};
use crate::money::Money;
use crate::types::{PaymentMethod, PaymentStatus};

/// How a sale is settled, resolved from the request before any mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PaymentPlan {
    /// Physical cash; change is computed when the amount given is known.
    Cash { given: Option<Money> },
    /// Charged to the customer's store credit; settles later.
    Credit { customer_id: String },
    /// Settled through an external channel carrying a free-text reference
    /// (Sarali mobile money).
    Reference {
        method: PaymentMethod,
        reference: Option<String>,
    },
    /// Card / mobile / transfer: treated as paid in full, no extra data.
    Generic { method: PaymentMethod },
}

/// The result of applying a payment plan to a sale total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOutcome {
    pub status: PaymentStatus,
    pub amount_paid: Money,
    pub change: Option<Money>,
    pub reference: Option<String>,
}

impl PaymentPlan {
    /// Builds the plan for a sale request.
    ///
    /// Credit sales without a customer are rejected here, before any
    /// ledger mutation happens.
    pub fn for_request(
        method: PaymentMethod,
        customer_id: Option<&str>,
        amount_given: Option<Money>,
        reference: Option<String>,
    ) -> Result<PaymentPlan, LedgerError> {
        let plan = match method {
            PaymentMethod::Cash => PaymentPlan::Cash {
                given: amount_given,
            },
            PaymentMethod::Credit => {
                let customer_id = customer_id
                    .ok_or(BusinessRuleViolation::CreditSaleWithoutCustomer)?
                    .to_string();
                PaymentPlan::Credit { customer_id }
            }
            PaymentMethod::Sarali => PaymentPlan::Reference {
                method,
                reference,
            },
            PaymentMethod::Card | PaymentMethod::Mobile | PaymentMethod::Transfer => {
                PaymentPlan::Generic { method }
            }
        };
        Ok(plan)
    }

    /// The payment method this plan settles with.
    pub fn method(&self) -> PaymentMethod {
        match self {
            PaymentPlan::Cash { .. } => PaymentMethod::Cash,
            PaymentPlan::Credit { .. } => PaymentMethod::Credit,
            PaymentPlan::Reference { method, .. } | PaymentPlan::Generic { method } => *method,
        }
    }

    /// Applies the plan to a sale total, producing the settlement outcome.
    ///
    /// Cash with an explicit amount given must cover the total; credit
    /// yields a pending sale with nothing paid yet (the credit ledger
    /// entry is the orchestrator's job); everything else pays in full.
    pub fn apply(&self, total: Money) -> Result<PaymentOutcome, LedgerError> {
        let outcome = match self {
            PaymentPlan::Cash { given } => {
                let change = match given {
                    Some(given) => {
                        if *given < total {
                            return Err(ValidationError::OutOfRange {
                                field: "amount_given".to_string(),
                                min: total.minor(),
                                max: i64::MAX,
                            }
                            .into());
                        }
                        Some(*given - total)
                    }
                    None => None,
                };
                PaymentOutcome {
                    status: PaymentStatus::Paid,
                    amount_paid: total,
                    change,
                    reference: None,
                }
            }
            PaymentPlan::Credit { .. } => PaymentOutcome {
                status: PaymentStatus::Pending,
                amount_paid: Money::zero(),
                change: None,
                reference: None,
            },
            PaymentPlan::Reference { reference, .. } => PaymentOutcome {
                status: PaymentStatus::Paid,
                amount_paid: total,
                change: None,
                reference: reference.clone(),
            },
            PaymentPlan::Generic { .. } => PaymentOutcome {
                status: PaymentStatus::Paid,
                amount_paid: total,
                change: None,
                reference: None,
            },
        };
        Ok(outcome)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cash_with_change() {
        let plan =
            PaymentPlan::for_request(PaymentMethod::Cash, None, Some(Money::from_minor(2000)), None)
                .unwrap();
        let outcome = plan.apply(Money::from_minor(1500)).unwrap();
        assert_eq!(outcome.status, PaymentStatus::Paid);
        assert_eq!(outcome.amount_paid, Money::from_minor(1500));
        assert_eq!(outcome.change, Some(Money::from_minor(500)));
    }

    #[test]
    fn test_cash_underpayment_rejected() {
        let plan = PaymentPlan::Cash {
            given: Some(Money::from_minor(1000)),
        };
        let err = plan.apply(Money::from_minor(1500)).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn test_cash_without_given() {
        let plan = PaymentPlan::Cash { given: None };
        let outcome = plan.apply(Money::from_minor(800)).unwrap();
        assert_eq!(outcome.amount_paid, Money::from_minor(800));
        assert_eq!(outcome.change, None);
    }

    #[test]
    fn test_credit_requires_customer() {
        let err = PaymentPlan::for_request(PaymentMethod::Credit, None, None, None).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::BusinessRule(BusinessRuleViolation::CreditSaleWithoutCustomer)
        ));
    }

    #[test]
    fn test_credit_is_pending_with_nothing_paid() {
        let plan =
            PaymentPlan::for_request(PaymentMethod::Credit, Some("c1"), None, None).unwrap();
        let outcome = plan.apply(Money::from_minor(4000)).unwrap();
        assert_eq!(outcome.status, PaymentStatus::Pending);
        assert_eq!(outcome.amount_paid, Money::zero());
    }

    #[test]
    fn test_sarali_carries_reference() {
        let plan = PaymentPlan::for_request(
            PaymentMethod::Sarali,
            None,
            None,
            Some("SR-2024-117".to_string()),
        )
        .unwrap();
        assert_eq!(plan.method(), PaymentMethod::Sarali);
        let outcome = plan.apply(Money::from_minor(900)).unwrap();
        assert_eq!(outcome.status, PaymentStatus::Paid);
        assert_eq!(outcome.reference.as_deref(), Some("SR-2024-117"));
    }

    #[test]
    fn test_generic_methods_pay_in_full() {
        for method in [
            PaymentMethod::Card,
            PaymentMethod::Mobile,
            PaymentMethod::Transfer,
        ] {
            let plan = PaymentPlan::for_request(method, None, None, None).unwrap();
            let outcome = plan.apply(Money::from_minor(1200)).unwrap();
            assert_eq!(outcome.status, PaymentStatus::Paid);
            assert_eq!(outcome.amount_paid, Money::from_minor(1200));
        }
    }
}
