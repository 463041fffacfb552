//! # Credit Ledger
//!
//! Store-credit accounting per customer: signed running balance plus an
//! append-only entry trail.
//!
//! ## Running Balance Invariant
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  entries ordered by commit time:                                        │
//! │                                                                         │
//! │    balance_after[0] == amount[0]                                        │
//! │    balance_after[n] == balance_after[n-1] + amount[n]                   │
//! │                                                                         │
//! │  Positive balance = customer owes the store.                            │
//! │  sale_credit amounts are positive, payments negative, adjustments       │
//! │  either sign.                                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The balance update is one atomic `UPDATE ... RETURNING`, and the entry
//! snapshot is taken from its return value inside the same transaction,
//! so interleaved writers cannot produce a broken chain.
//!
//! ## Credit Limit
//! The limit is advisory: a sale that pushes the balance over it is
//! recorded and logged at WARN, not rejected. Hard enforcement is a
//! policy decision left to the surface in front of this crate.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::customer::CustomerRepository;
use comptoir_core::validation::{validate_notes, validate_positive_amount};
use comptoir_core::{
    BusinessRuleViolation, CreditEntryType, CreditTransaction, CurrencyProfile, LedgerResult,
    Money,
};

/// Service owning all store-credit movements for a tenant.
#[derive(Debug, Clone)]
pub struct CreditLedger {
    pool: SqlitePool,
    tenant_id: String,
    currency: CurrencyProfile,
}

impl CreditLedger {
    pub fn new(pool: SqlitePool, tenant_id: String, currency: CurrencyProfile) -> Self {
        CreditLedger {
            pool,
            tenant_id,
            currency,
        }
    }

    /// Records a repayment by the customer (negative ledger amount).
    ///
    /// Overpayment is allowed and leaves the balance negative: the store
    /// then owes the customer.
    pub async fn record_payment(
        &self,
        customer_id: &str,
        amount: Money,
        notes: Option<String>,
        user_id: &str,
    ) -> LedgerResult<CreditTransaction> {
        validate_positive_amount(amount, "amount")?;
        validate_notes(notes.as_deref())?;

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let entry = Self::append(
            &mut tx,
            &self.tenant_id,
            &self.currency,
            customer_id,
            None,
            CreditEntryType::Payment,
            -amount,
            notes,
            user_id,
        )
        .await?;
        tx.commit().await.map_err(DbError::from)?;

        info!(
            customer_id = %customer_id,
            amount = %amount,
            balance_after = %entry.balance_after_minor,
            "Credit payment recorded"
        );
        Ok(entry)
    }

    /// Records a manual correction, either sign.
    pub async fn record_adjustment(
        &self,
        customer_id: &str,
        amount: Money,
        notes: Option<String>,
        user_id: &str,
    ) -> LedgerResult<CreditTransaction> {
        if amount.is_zero() {
            return Err(comptoir_core::ValidationError::MustBePositive {
                field: "amount".to_string(),
            }
            .into());
        }
        validate_notes(notes.as_deref())?;

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let entry = Self::append(
            &mut tx,
            &self.tenant_id,
            &self.currency,
            customer_id,
            None,
            CreditEntryType::Adjustment,
            amount,
            notes,
            user_id,
        )
        .await?;
        tx.commit().await.map_err(DbError::from)?;

        Ok(entry)
    }

    /// Full credit history of a customer, oldest first.
    pub async fn history(&self, customer_id: &str) -> LedgerResult<Vec<CreditTransaction>> {
        let entries = sqlx::query_as::<_, CreditTransaction>(
            r#"
            SELECT * FROM credit_transactions
            WHERE customer_id = ?1 AND tenant_id = ?2
            ORDER BY created_at, id
            "#,
        )
        .bind(customer_id)
        .bind(&self.tenant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(entries)
    }

    /// Current balance of a customer.
    pub async fn balance(&self, customer_id: &str) -> LedgerResult<Money> {
        let customer = CustomerRepository::new(self.pool.clone(), self.tenant_id.clone())
            .get(customer_id)
            .await?;
        Ok(customer.credit_balance())
    }

    /// Charges a sale to a customer's account, inside the sale pipeline's
    /// shared transaction.
    ///
    /// The customer must exist and be active; the resulting balance may
    /// exceed the configured limit (advisory, logged at WARN).
    pub(crate) async fn apply_sale_credit(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        currency: &CurrencyProfile,
        customer_id: &str,
        sale_id: &str,
        amount: Money,
        user_id: &str,
    ) -> LedgerResult<CreditTransaction> {
        validate_positive_amount(amount, "amount")?;

        let entry = Self::append(
            conn,
            tenant_id,
            currency,
            customer_id,
            Some(sale_id),
            CreditEntryType::SaleCredit,
            amount,
            None,
            user_id,
        )
        .await?;

        Ok(entry)
    }

    /// The single append path: checks the customer, applies the atomic
    /// balance delta, writes the entry with the returned snapshot.
    #[allow(clippy::too_many_arguments)]
    async fn append(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        currency: &CurrencyProfile,
        customer_id: &str,
        sale_id: Option<&str>,
        entry_type: CreditEntryType,
        amount: Money,
        notes: Option<String>,
        user_id: &str,
    ) -> LedgerResult<CreditTransaction> {
        let customer = CustomerRepository::fetch(conn, tenant_id, customer_id).await?;
        if !customer.is_active {
            return Err(BusinessRuleViolation::InactiveCustomer {
                customer_id: customer_id.to_string(),
            }
            .into());
        }

        let now = Utc::now();
        let balance_after =
            CustomerRepository::apply_credit_delta(conn, tenant_id, customer_id, amount.minor(), now)
                .await?;

        if customer.credit_limit_minor > 0 && balance_after > customer.credit_limit_minor {
            warn!(
                customer_id = %customer_id,
                balance = %currency.format(Money::from_minor(balance_after)),
                limit = %currency.format(customer.credit_limit()),
                "Customer credit balance exceeds configured limit"
            );
        }

        let entry = CreditTransaction {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            customer_id: customer_id.to_string(),
            sale_id: sale_id.map(str::to_string),
            entry_type,
            amount_minor: amount.minor(),
            balance_after_minor: balance_after,
            notes,
            user_id: user_id.to_string(),
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO credit_transactions (
                id, tenant_id, customer_id, sale_id, entry_type,
                amount_minor, balance_after_minor, notes, user_id, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.tenant_id)
        .bind(&entry.customer_id)
        .bind(&entry.sale_id)
        .bind(entry.entry_type)
        .bind(entry.amount_minor)
        .bind(entry.balance_after_minor)
        .bind(&entry.notes)
        .bind(&entry.user_id)
        .bind(entry.created_at)
        .execute(&mut *conn)
        .await
        .map_err(DbError::from)?;

        Ok(entry)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{deactivate_customer, seed_customer, test_db, TEST_USER};
    use comptoir_core::LedgerError;

    #[tokio::test]
    async fn test_running_balance_chain() {
        let db = test_db().await;
        let customer = seed_customer(&db, "Awa", false).await;
        let ledger = db.credit_ledger();

        ledger
            .record_adjustment(&customer.id, Money::from_minor(4000), None, TEST_USER)
            .await
            .unwrap();
        ledger
            .record_payment(&customer.id, Money::from_minor(1500), None, TEST_USER)
            .await
            .unwrap();
        ledger
            .record_adjustment(
                &customer.id,
                Money::from_minor(2000),
                Some("erreur de caisse".to_string()),
                TEST_USER,
            )
            .await
            .unwrap();

        let history = ledger.history(&customer.id).await.unwrap();
        assert_eq!(history.len(), 3);

        // balance_after[0] == amount[0]; each later snapshot chains
        assert_eq!(history[0].balance_after_minor, history[0].amount_minor);
        for pair in history.windows(2) {
            assert_eq!(
                pair[1].balance_after_minor,
                pair[0].balance_after_minor + pair[1].amount_minor
            );
        }

        // The aggregate agrees with the last snapshot
        let balance = ledger.balance(&customer.id).await.unwrap();
        assert_eq!(balance.minor(), history.last().unwrap().balance_after_minor);
        assert_eq!(balance, Money::from_minor(4500));
    }

    #[tokio::test]
    async fn test_payment_amount_is_negative_in_ledger() {
        let db = test_db().await;
        let customer = seed_customer(&db, "Moussa", false).await;
        let ledger = db.credit_ledger();

        ledger
            .record_adjustment(&customer.id, Money::from_minor(1000), None, TEST_USER)
            .await
            .unwrap();
        let payment = ledger
            .record_payment(&customer.id, Money::from_minor(600), None, TEST_USER)
            .await
            .unwrap();

        assert_eq!(payment.entry_type, CreditEntryType::Payment);
        assert_eq!(payment.amount_minor, -600);
        assert_eq!(payment.balance_after_minor, 400);
    }

    #[tokio::test]
    async fn test_overpayment_leaves_negative_balance() {
        let db = test_db().await;
        let customer = seed_customer(&db, "Fatou", false).await;
        let ledger = db.credit_ledger();

        ledger
            .record_payment(&customer.id, Money::from_minor(300), None, TEST_USER)
            .await
            .unwrap();

        let balance = ledger.balance(&customer.id).await.unwrap();
        assert_eq!(balance, Money::from_minor(-300));
    }

    #[tokio::test]
    async fn test_inactive_customer_rejected() {
        let db = test_db().await;
        let customer = seed_customer(&db, "Inactif", false).await;
        deactivate_customer(&db, &customer.id).await;

        let err = db
            .credit_ledger()
            .record_payment(&customer.id, Money::from_minor(100), None, TEST_USER)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::BusinessRule(BusinessRuleViolation::InactiveCustomer { .. })
        ));

        // Nothing recorded
        assert!(db
            .credit_ledger()
            .history(&customer.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_zero_and_negative_payments_rejected() {
        let db = test_db().await;
        let customer = seed_customer(&db, "Zero", false).await;
        let ledger = db.credit_ledger();

        assert!(ledger
            .record_payment(&customer.id, Money::zero(), None, TEST_USER)
            .await
            .is_err());
        assert!(ledger
            .record_payment(&customer.id, Money::from_minor(-10), None, TEST_USER)
            .await
            .is_err());
        assert!(ledger
            .record_adjustment(&customer.id, Money::zero(), None, TEST_USER)
            .await
            .is_err());
    }
}
