//! # Loyalty Ledger
//!
//! Points earning and redemption against the per-tenant program.
//!
//! ## Asymmetric Failure Handling
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  EARN   (customer benefit, best effort)                                 │
//! │    not a member        → skip, Ok(None), logged at DEBUG               │
//! │    program inactive    → skip, Ok(None)                                │
//! │    rounds to zero      → skip, Ok(None)                                │
//! │                                                                         │
//! │  REDEEM (customer spends an asset, strict)                              │
//! │    not a member        → Err(NotLoyaltyMember)                         │
//! │    program inactive    → Err(ProgramInactive)                          │
//! │    requested > balance → Err(InsufficientPoints)                       │
//! │                                                                         │
//! │  Redemption is additionally CAPPED: the discount never exceeds the     │
//! │  sale total, and when capping fires the points consumed are rescaled   │
//! │  so  value(points redeemed) == discount applied  always holds.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::customer::CustomerRepository;
use crate::repository::program::LoyaltyProgramRepository;
use comptoir_core::loyalty::{cap_redemption, points_earned, points_value, value_to_points};
use comptoir_core::validation::{validate_notes, validate_positive_points};
use comptoir_core::{
    BusinessRuleViolation, CurrencyProfile, Customer, LedgerResult, LoyaltyEntryType,
    LoyaltyProgram, LoyaltyTransaction, Money, Points, ValidationError,
};

// =============================================================================
// Results
// =============================================================================

/// Answer to the "what is this worth?" question, without mutating anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PointsCalculation {
    /// Points a sale amount would earn.
    Earning { amount: Money, points: Points },
    /// Monetary value a point quantity would redeem for.
    Redemption { points: Points, value: Money },
}

/// The outcome of a successful redemption.
#[derive(Debug, Clone)]
pub struct Redemption {
    pub transaction: LoyaltyTransaction,
    /// Points actually consumed (rescaled when the cap fired).
    pub points_redeemed: Points,
    /// Discount applied to the sale, never above its total.
    pub discount: Money,
    /// True when the requested value exceeded the sale total.
    pub capped: bool,
}

// =============================================================================
// Loyalty Ledger
// =============================================================================

/// Service owning all loyalty point movements for a tenant.
#[derive(Debug, Clone)]
pub struct LoyaltyLedger {
    pool: SqlitePool,
    tenant_id: String,
    currency: CurrencyProfile,
}

impl LoyaltyLedger {
    pub fn new(pool: SqlitePool, tenant_id: String, currency: CurrencyProfile) -> Self {
        LoyaltyLedger {
            pool,
            tenant_id,
            currency,
        }
    }

    /// Converts between amounts and points using the tenant's program,
    /// creating it with defaults on first use.
    ///
    /// Exactly one of `amount` or `points` must be provided. An invalid
    /// pair is rejected before the database is touched, so a failed
    /// calculation never creates the program row.
    pub async fn calculate(
        &self,
        amount: Option<Money>,
        points: Option<Points>,
    ) -> LedgerResult<PointsCalculation> {
        match (amount, points) {
            (Some(amount), None) => {
                let program = self.program().await?;
                Ok(PointsCalculation::Earning {
                    amount,
                    points: points_earned(amount, &program.rates(), self.currency.rounding),
                })
            }
            (None, Some(points)) => {
                let program = self.program().await?;
                Ok(PointsCalculation::Redemption {
                    points,
                    value: points_value(points, &program.rates(), self.currency.rounding),
                })
            }
            _ => Err(ValidationError::ExactlyOneOf {
                first: "amount".to_string(),
                second: "points".to_string(),
            }
            .into()),
        }
    }

    /// Grants points for a sale amount, in a standalone transaction.
    ///
    /// Returns `Ok(None)` when nothing was granted (non-member, inactive
    /// program, or the amount rounds to zero points).
    pub async fn earn(
        &self,
        customer_id: &str,
        sale_id: Option<&str>,
        amount: Money,
        notes: Option<String>,
    ) -> LedgerResult<Option<LoyaltyTransaction>> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let entry = Self::earn_in_tx(
            &mut tx,
            &self.tenant_id,
            &self.currency,
            customer_id,
            sale_id,
            amount,
            notes,
        )
        .await?;
        tx.commit().await.map_err(DbError::from)?;
        Ok(entry)
    }

    /// Redeems points against a sale total, in a standalone transaction.
    pub async fn redeem(
        &self,
        customer_id: &str,
        sale_id: Option<&str>,
        requested: Points,
        sale_total: Money,
        notes: Option<String>,
    ) -> LedgerResult<Option<Redemption>> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let redemption = Self::redeem_in_tx(
            &mut tx,
            &self.tenant_id,
            &self.currency,
            customer_id,
            sale_id,
            requested,
            sale_total,
            notes,
        )
        .await?;
        tx.commit().await.map_err(DbError::from)?;
        Ok(redemption)
    }

    /// Full loyalty history of a customer, oldest first.
    pub async fn history(&self, customer_id: &str) -> LedgerResult<Vec<LoyaltyTransaction>> {
        let entries = sqlx::query_as::<_, LoyaltyTransaction>(
            r#"
            SELECT * FROM loyalty_transactions
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

    /// Earning path inside a caller-owned transaction.
    ///
    /// The single tolerated degradation of the sale pipeline: skipping is
    /// an expected path, never an error, so a cash sale to a walk-in
    /// customer flows through untouched.
    pub(crate) async fn earn_in_tx(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        currency: &CurrencyProfile,
        customer_id: &str,
        sale_id: Option<&str>,
        amount: Money,
        notes: Option<String>,
    ) -> LedgerResult<Option<LoyaltyTransaction>> {
        validate_notes(notes.as_deref())?;

        let customer = CustomerRepository::fetch(conn, tenant_id, customer_id).await?;
        if !customer.is_loyalty_member {
            debug!(customer_id = %customer_id, "Not a loyalty member, earning skipped");
            return Ok(None);
        }

        let program = LoyaltyProgramRepository::get_or_create(conn, tenant_id, currency).await?;
        let points = points_earned(amount, &program.rates(), currency.rounding);
        if !points.is_positive() {
            debug!(
                customer_id = %customer_id,
                amount = %amount,
                "No points earned (inactive program or amount below bracket)"
            );
            return Ok(None);
        }

        let entry = Self::append(
            conn,
            tenant_id,
            customer_id,
            sale_id,
            LoyaltyEntryType::Earned,
            points,
            notes,
        )
        .await?;

        info!(
            customer_id = %customer_id,
            points = %points,
            balance_after = entry.balance_after_centi,
            "Loyalty points earned"
        );
        Ok(Some(entry))
    }

    /// Redemption path inside a caller-owned transaction.
    ///
    /// Strict: member and active-program checks are hard errors, and the
    /// requested quantity must be covered by the current balance before
    /// any capping applies.
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn redeem_in_tx(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        currency: &CurrencyProfile,
        customer_id: &str,
        sale_id: Option<&str>,
        requested: Points,
        sale_total: Money,
        notes: Option<String>,
    ) -> LedgerResult<Option<Redemption>> {
        validate_positive_points(requested, "points")?;
        validate_notes(notes.as_deref())?;

        let customer = CustomerRepository::fetch(conn, tenant_id, customer_id).await?;
        if !customer.is_loyalty_member {
            return Err(BusinessRuleViolation::NotLoyaltyMember {
                customer_id: customer_id.to_string(),
            }
            .into());
        }

        let program = LoyaltyProgramRepository::get_or_create(conn, tenant_id, currency).await?;
        if !program.is_active {
            return Err(BusinessRuleViolation::ProgramInactive.into());
        }

        if requested > customer.loyalty_points() {
            return Err(BusinessRuleViolation::InsufficientPoints {
                requested: requested.to_string(),
                available: customer.loyalty_points().to_string(),
            }
            .into());
        }

        let rates = program.rates();
        let (actual_points, discount) =
            cap_redemption(requested, sale_total, &rates, currency.rounding);
        if !actual_points.is_positive() || !discount.is_positive() {
            debug!(
                customer_id = %customer_id,
                requested = %requested,
                "Redemption produced no discount, nothing recorded"
            );
            return Ok(None);
        }

        let entry = Self::append(
            conn,
            tenant_id,
            customer_id,
            sale_id,
            LoyaltyEntryType::Redeemed,
            -actual_points,
            notes,
        )
        .await?;

        let capped = actual_points != requested;
        info!(
            customer_id = %customer_id,
            points = %actual_points,
            discount = %currency.format(discount),
            capped,
            "Loyalty points redeemed"
        );

        Ok(Some(Redemption {
            transaction: entry,
            points_redeemed: actual_points,
            discount,
            capped,
        }))
    }

    /// The single append path: atomic balance delta + entry insert.
    async fn append(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        customer_id: &str,
        sale_id: Option<&str>,
        entry_type: LoyaltyEntryType,
        points: Points,
        notes: Option<String>,
    ) -> LedgerResult<LoyaltyTransaction> {
        let now = Utc::now();
        let balance_after = CustomerRepository::apply_points_delta(
            conn,
            tenant_id,
            customer_id,
            points.centi(),
            now,
        )
        .await?;

        let entry = LoyaltyTransaction {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            customer_id: customer_id.to_string(),
            sale_id: sale_id.map(str::to_string),
            entry_type,
            points_centi: points.centi(),
            balance_after_centi: balance_after,
            notes,
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO loyalty_transactions (
                id, tenant_id, customer_id, sale_id, entry_type,
                points_centi, balance_after_centi, notes, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.tenant_id)
        .bind(&entry.customer_id)
        .bind(&entry.sale_id)
        .bind(entry.entry_type)
        .bind(entry.points_centi)
        .bind(entry.balance_after_centi)
        .bind(&entry.notes)
        .bind(entry.created_at)
        .execute(&mut *conn)
        .await
        .map_err(DbError::from)?;

        Ok(entry)
    }

    /// The tenant's program as currently persisted (creating defaults if
    /// needed), for display surfaces.
    pub async fn program(&self) -> LedgerResult<LoyaltyProgram> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let program =
            LoyaltyProgramRepository::get_or_create(&mut tx, &self.tenant_id, &self.currency)
                .await?;
        tx.commit().await.map_err(DbError::from)?;
        Ok(program)
    }

    /// The monetary value the customer's full balance could redeem,
    /// ignoring any sale total cap.
    pub async fn balance_value(&self, customer: &Customer) -> LedgerResult<Money> {
        let program = self.program().await?;
        Ok(points_value(
            customer.loyalty_points(),
            &program.rates(),
            self.currency.rounding,
        ))
    }

    /// How many points a discount amount corresponds to, at the tenant's
    /// current rates.
    pub async fn points_for_value(&self, amount: Money) -> LedgerResult<Points> {
        let program = self.program().await?;
        Ok(value_to_points(
            amount,
            &program.rates(),
            self.currency.rounding,
        ))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{grant_points, seed_customer, test_db, TEST_USER};
    use comptoir_core::LedgerError;

    // Tests assume the XOF default program: 1 point per 100 spent, each
    // point worth 100.

    #[tokio::test]
    async fn test_program_created_lazily_with_defaults() {
        let db = test_db().await;
        assert!(db.programs().get().await.unwrap().is_none());

        let program = db.loyalty_ledger().program().await.unwrap();
        assert_eq!(program.points_per_amount_centi, 100);
        assert_eq!(program.amount_for_points_minor, 100);
        assert_eq!(program.amount_per_point_minor, 100);
        assert!(program.is_active);

        assert!(db.programs().get().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_calculate_requires_exactly_one_input() {
        let db = test_db().await;
        let ledger = db.loyalty_ledger();

        let err = ledger.calculate(None, None).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        let err = ledger
            .calculate(Some(Money::from_minor(100)), Some(Points::from_whole(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        // A rejected calculation leaves no trace: the lazy program row is
        // only created once a valid request goes through.
        assert!(db.programs().get().await.unwrap().is_none());

        match ledger
            .calculate(Some(Money::from_minor(1000)), None)
            .await
            .unwrap()
        {
            PointsCalculation::Earning { points, .. } => {
                assert_eq!(points, Points::from_whole(10));
            }
            other => panic!("unexpected calculation: {:?}", other),
        }

        match ledger
            .calculate(None, Some(Points::from_whole(4)))
            .await
            .unwrap()
        {
            PointsCalculation::Redemption { value, .. } => {
                assert_eq!(value, Money::from_minor(400));
            }
            other => panic!("unexpected calculation: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_earn_skips_non_member() {
        let db = test_db().await;
        let customer = seed_customer(&db, "Passant", false).await;
        let ledger = db.loyalty_ledger();

        let entry = ledger
            .earn(&customer.id, None, Money::from_minor(5000), None)
            .await
            .unwrap();
        assert!(entry.is_none());
        assert!(ledger.history(&customer.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_earn_for_member() {
        let db = test_db().await;
        let customer = seed_customer(&db, "Awa", true).await;
        let ledger = db.loyalty_ledger();

        let entry = ledger
            .earn(&customer.id, None, Money::from_minor(1000), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.entry_type, LoyaltyEntryType::Earned);
        assert_eq!(entry.points_centi, 1000); // 10.00 points
        assert_eq!(entry.balance_after_centi, 1000);

        let fresh = db.customers().get(&customer.id).await.unwrap();
        assert_eq!(fresh.loyalty_points_centi, 1000);
    }

    #[tokio::test]
    async fn test_notes_recorded_on_entries() {
        let db = test_db().await;
        let customer = seed_customer(&db, "Awa", true).await;
        let ledger = db.loyalty_ledger();

        ledger
            .earn(
                &customer.id,
                None,
                Money::from_minor(1000),
                Some("achat anniversaire".to_string()),
            )
            .await
            .unwrap()
            .unwrap();
        ledger
            .redeem(
                &customer.id,
                None,
                Points::from_whole(3),
                Money::from_minor(5000),
                Some("remise fidélité".to_string()),
            )
            .await
            .unwrap()
            .unwrap();

        let history = ledger.history(&customer.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].notes.as_deref(), Some("achat anniversaire"));
        assert_eq!(history[1].notes.as_deref(), Some("remise fidélité"));
    }

    #[tokio::test]
    async fn test_redeem_insufficient_points() {
        let db = test_db().await;
        let customer = seed_customer(&db, "Awa", true).await;
        grant_points(&db, &customer.id, 450).await; // 4.50 points

        let err = db
            .loyalty_ledger()
            .redeem(
                &customer.id,
                None,
                Points::from_whole(10),
                Money::from_minor(5000),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::BusinessRule(BusinessRuleViolation::InsufficientPoints { .. })
        ));

        // Balance untouched
        let fresh = db.customers().get(&customer.id).await.unwrap();
        assert_eq!(fresh.loyalty_points_centi, 450);
    }

    #[tokio::test]
    async fn test_redeem_non_member_rejected() {
        let db = test_db().await;
        let customer = seed_customer(&db, "Passant", false).await;

        let err = db
            .loyalty_ledger()
            .redeem(
                &customer.id,
                None,
                Points::from_whole(1),
                Money::from_minor(1000),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::BusinessRule(BusinessRuleViolation::NotLoyaltyMember { .. })
        ));
    }

    #[tokio::test]
    async fn test_redeem_uncapped() {
        let db = test_db().await;
        let customer = seed_customer(&db, "Awa", true).await;
        grant_points(&db, &customer.id, 1000).await; // 10.00 points

        let redemption = db
            .loyalty_ledger()
            .redeem(
                &customer.id,
                None,
                Points::from_whole(4),
                Money::from_minor(1500),
                None,
            )
            .await
            .unwrap()
            .unwrap();

        assert!(!redemption.capped);
        assert_eq!(redemption.points_redeemed, Points::from_whole(4));
        assert_eq!(redemption.discount, Money::from_minor(400));
        assert_eq!(redemption.transaction.points_centi, -400);
        assert_eq!(redemption.transaction.balance_after_centi, 600);
    }

    #[tokio::test]
    async fn test_redeem_capped_rescales_points() {
        // 10.00 points are worth 1000 but the sale total is 500: the
        // discount caps at 500 and only 5.00 points are consumed.
        let db = test_db().await;
        let customer = seed_customer(&db, "Awa", true).await;
        grant_points(&db, &customer.id, 1000).await;

        let redemption = db
            .loyalty_ledger()
            .redeem(
                &customer.id,
                None,
                Points::from_whole(10),
                Money::from_minor(500),
                None,
            )
            .await
            .unwrap()
            .unwrap();

        assert!(redemption.capped);
        assert_eq!(redemption.discount, Money::from_minor(500));
        assert_eq!(redemption.points_redeemed, Points::from_whole(5));

        let fresh = db.customers().get(&customer.id).await.unwrap();
        assert_eq!(fresh.loyalty_points_centi, 500); // 5.00 remain
    }

    #[tokio::test]
    async fn test_redeem_when_program_inactive() {
        let db = test_db().await;
        let customer = seed_customer(&db, "Awa", true).await;
        grant_points(&db, &customer.id, 1000).await;

        let mut program = db.loyalty_ledger().program().await.unwrap();
        program.is_active = false;
        db.programs().update(&program).await.unwrap();

        let err = db
            .loyalty_ledger()
            .redeem(
                &customer.id,
                None,
                Points::from_whole(1),
                Money::from_minor(1000),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::BusinessRule(BusinessRuleViolation::ProgramInactive)
        ));

        // Earning degrades silently instead
        let earned = db
            .loyalty_ledger()
            .earn(&customer.id, None, Money::from_minor(1000), None)
            .await
            .unwrap();
        assert!(earned.is_none());
    }

    #[tokio::test]
    async fn test_history_chains_balances() {
        let db = test_db().await;
        let customer = seed_customer(&db, "Awa", true).await;
        let ledger = db.loyalty_ledger();

        ledger
            .earn(&customer.id, None, Money::from_minor(1000), None)
            .await
            .unwrap();
        ledger
            .earn(&customer.id, None, Money::from_minor(250), None)
            .await
            .unwrap();
        ledger
            .redeem(
                &customer.id,
                None,
                Points::from_whole(3),
                Money::from_minor(10_000),
                None,
            )
            .await
            .unwrap();

        let history = ledger.history(&customer.id).await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].balance_after_centi, history[0].points_centi);
        for pair in history.windows(2) {
            assert_eq!(
                pair[1].balance_after_centi,
                pair[0].balance_after_centi + pair[1].points_centi
            );
        }

        let fresh = db.customers().get(&customer.id).await.unwrap();
        assert_eq!(
            fresh.loyalty_points_centi,
            history.last().unwrap().balance_after_centi
        );
        assert_eq!(fresh.loyalty_points_centi, 950); // 10.00 + 2.50 - 3.00
    }
}
