//! # Stock Ledger
//!
//! Append-only inventory movements with full history.
//!
//! ## The Negative Stock Decision
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  A removal is NEVER rejected for insufficient stock.                    │
//! │                                                                         │
//! │  remove 5 from quantity 3:                                              │
//! │      quantity 3 ──► -2                                                  │
//! │      ledger entry: backorder, magnitude 5                               │
//! │      caller told: has_backorder = true, backorder_quantity = 2          │
//! │                                                                         │
//! │  Physical reality wins: the goods left the store whatever the          │
//! │  database said. Negative quantity is a first-class state meaning       │
//! │  "oversold, awaiting replenishment", surfaced as a warning, not an     │
//! │  error.                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariant
//! Folding `signed_delta()` over a product's entries in order reconstructs
//! `products.quantity` exactly. Every movement writes the aggregate update
//! and the ledger entry in the same transaction, so the invariant cannot
//! be observed broken.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::DbResult;
use crate::repository::product::ProductRepository;
use comptoir_core::validation::{validate_notes, validate_quantity, validate_target_quantity};
use comptoir_core::{
    LedgerResult, Money, Product, StockContext, StockEntryType, StockStatus, StockTransaction,
};

// =============================================================================
// Requests & Results
// =============================================================================

/// A relative stock movement request.
#[derive(Debug, Clone)]
pub struct StockMovementRequest {
    pub product_id: String,
    /// Unsigned magnitude, strictly positive.
    pub quantity: i64,
    /// Business context, supplied by the caller (never sniffed from notes).
    pub context: StockContext,
    pub notes: Option<String>,
    /// Explicit entry type override (e.g. `Loss` on a removal). When
    /// `None`, `add_stock` records `In` and `remove_stock` records `Out`,
    /// upgraded to `Backorder` if the removal drove the quantity negative.
    pub entry_type: Option<StockEntryType>,
    /// Price snapshot; defaults to the product's purchase price for
    /// inbound movements and selling price for outbound ones.
    pub unit_price: Option<Money>,
    pub user_id: String,
}

impl StockMovementRequest {
    pub fn new(
        product_id: impl Into<String>,
        quantity: i64,
        context: StockContext,
        user_id: impl Into<String>,
    ) -> Self {
        StockMovementRequest {
            product_id: product_id.into(),
            quantity,
            context,
            notes: None,
            entry_type: None,
            unit_price: None,
            user_id: user_id.into(),
        }
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn entry_type(mut self, entry_type: StockEntryType) -> Self {
        self.entry_type = Some(entry_type);
        self
    }

    pub fn unit_price(mut self, price: Money) -> Self {
        self.unit_price = Some(price);
        self
    }
}

/// An absolute stock correction request: "the shelf holds N".
#[derive(Debug, Clone)]
pub struct StockAdjustmentRequest {
    pub product_id: String,
    /// The counted quantity. Zero is fine; negative is rejected.
    pub target_quantity: i64,
    pub context: StockContext,
    pub notes: Option<String>,
    pub user_id: String,
}

/// The outcome of a stock movement, reported back to the caller.
#[derive(Debug, Clone)]
pub struct StockResult {
    pub transaction: StockTransaction,
    pub old_quantity: i64,
    pub new_quantity: i64,
    pub status: StockStatus,
    /// True when the movement left the quantity negative.
    pub has_backorder: bool,
    /// How many units are owed (0 when not backordered).
    pub backorder_quantity: i64,
}

/// One history row together with the quantity window it moved.
#[derive(Debug, Clone)]
pub struct StockHistoryEntry {
    pub transaction: StockTransaction,
    pub stock_before: i64,
    pub stock_after: i64,
}

/// Internal fully-resolved movement, applied inside a transaction.
#[derive(Debug)]
pub(crate) struct StockMovement<'a> {
    pub tenant_id: &'a str,
    pub product_id: &'a str,
    pub requested_type: Option<StockEntryType>,
    pub fallback: StockEntryType,
    pub magnitude: i64,
    pub context: StockContext,
    pub notes: Option<&'a str>,
    pub unit_price: Option<Money>,
    pub sale_id: Option<&'a str>,
    pub user_id: &'a str,
}

// =============================================================================
// Stock Ledger
// =============================================================================

/// Service owning all inventory movements for a tenant.
#[derive(Debug, Clone)]
pub struct StockLedger {
    pool: SqlitePool,
    tenant_id: String,
}

impl StockLedger {
    pub fn new(pool: SqlitePool, tenant_id: String) -> Self {
        StockLedger { pool, tenant_id }
    }

    /// Records an inbound movement (reception, restock, return).
    ///
    /// Defaults to an `In` entry; an explicit `Adjustment` override is
    /// accepted for inbound corrections.
    pub async fn add_stock(&self, request: StockMovementRequest) -> LedgerResult<StockResult> {
        let mut tx = self.pool.begin().await.map_err(crate::error::DbError::from)?;

        let movement = StockMovement {
            tenant_id: &self.tenant_id,
            product_id: &request.product_id,
            requested_type: request.entry_type,
            fallback: StockEntryType::In,
            magnitude: request.quantity,
            context: request.context,
            notes: request.notes.as_deref(),
            unit_price: request.unit_price,
            sale_id: None,
            user_id: &request.user_id,
        };
        let result = Self::apply(&mut tx, &movement).await?;

        tx.commit().await.map_err(crate::error::DbError::from)?;
        Ok(result)
    }

    /// Records an outbound movement (sale, manual removal, loss).
    ///
    /// Never rejected for insufficient stock: a removal that drives the
    /// quantity negative is recorded as a `Backorder` entry and surfaced
    /// as a warning on the result.
    pub async fn remove_stock(&self, request: StockMovementRequest) -> LedgerResult<StockResult> {
        let mut tx = self.pool.begin().await.map_err(crate::error::DbError::from)?;

        let movement = StockMovement {
            tenant_id: &self.tenant_id,
            product_id: &request.product_id,
            requested_type: request.entry_type,
            fallback: StockEntryType::Out,
            magnitude: request.quantity,
            context: request.context,
            notes: request.notes.as_deref(),
            unit_price: request.unit_price,
            sale_id: None,
            user_id: &request.user_id,
        };
        let result = Self::apply(&mut tx, &movement).await?;

        tx.commit().await.map_err(crate::error::DbError::from)?;
        Ok(result)
    }

    /// Corrects the quantity to an absolute counted value.
    ///
    /// The delta against the current quantity becomes the ledger entry:
    /// upward corrections record `Adjustment`, downward ones record `Out`.
    /// A target equal to the current quantity writes nothing and returns
    /// `None`.
    pub async fn adjust_stock(
        &self,
        request: StockAdjustmentRequest,
    ) -> LedgerResult<Option<StockResult>> {
        validate_target_quantity(request.target_quantity)?;
        validate_notes(request.notes.as_deref())?;

        let mut tx = self.pool.begin().await.map_err(crate::error::DbError::from)?;

        let product =
            ProductRepository::fetch(&mut tx, &self.tenant_id, &request.product_id).await?;
        let delta = request.target_quantity - product.quantity;

        if delta == 0 {
            debug!(
                product_id = %request.product_id,
                quantity = product.quantity,
                "Adjustment target equals current quantity, nothing recorded"
            );
            return Ok(None);
        }

        let entry_type = if delta > 0 {
            StockEntryType::Adjustment
        } else {
            StockEntryType::Out
        };

        let movement = StockMovement {
            tenant_id: &self.tenant_id,
            product_id: &request.product_id,
            requested_type: Some(entry_type),
            fallback: entry_type,
            magnitude: delta.abs(),
            context: request.context,
            notes: request.notes.as_deref(),
            unit_price: None,
            sale_id: None,
            user_id: &request.user_id,
        };
        let result = Self::apply(&mut tx, &movement).await?;

        tx.commit().await.map_err(crate::error::DbError::from)?;
        Ok(Some(result))
    }

    /// Movement history of a product, newest first.
    ///
    /// Each entry carries the quantity window it moved the product across,
    /// reconstructed by walking backward from the current quantity (the
    /// newest entry's `stock_after` is the current quantity; each older
    /// entry's `stock_after` is the next one's `stock_before`). Reading
    /// the history never mutates anything.
    pub async fn history(
        &self,
        product_id: &str,
        limit: Option<i64>,
    ) -> LedgerResult<Vec<StockHistoryEntry>> {
        // Quantity and entries must come from one snapshot or the
        // reconstruction drifts under concurrent writes.
        let mut tx = self.pool.begin().await.map_err(crate::error::DbError::from)?;
        let product = ProductRepository::fetch(&mut tx, &self.tenant_id, product_id).await?;
        let entries = sqlx::query_as::<_, StockTransaction>(
            r#"
            SELECT * FROM stock_transactions
            WHERE product_id = ?1 AND tenant_id = ?2
            ORDER BY created_at DESC, id DESC
            LIMIT ?3
            "#,
        )
        .bind(product_id)
        .bind(&self.tenant_id)
        .bind(limit.unwrap_or(-1))
        .fetch_all(&mut *tx)
        .await
        .map_err(crate::error::DbError::from)?;
        tx.commit().await.map_err(crate::error::DbError::from)?;

        let mut running = product.quantity;
        let history = entries
            .into_iter()
            .map(|transaction| {
                let stock_after = running;
                let stock_before = stock_after - transaction.signed_delta();
                running = stock_before;
                StockHistoryEntry {
                    transaction,
                    stock_before,
                    stock_after,
                }
            })
            .collect();

        Ok(history)
    }

    /// Applies a movement inside a caller-owned transaction.
    ///
    /// This is the single write path for stock: the sale pipeline calls it
    /// per line item with its shared transaction, and the `&self` methods
    /// above wrap it in their own.
    pub(crate) async fn apply(
        conn: &mut SqliteConnection,
        movement: &StockMovement<'_>,
    ) -> LedgerResult<StockResult> {
        validate_quantity(movement.magnitude)?;
        validate_notes(movement.notes)?;

        let product = ProductRepository::fetch(conn, movement.tenant_id, movement.product_id).await?;

        let provisional = movement.requested_type.unwrap_or(movement.fallback);
        let delta = provisional.signed_delta(movement.magnitude);

        let now = Utc::now();
        let new_quantity = ProductRepository::apply_quantity_delta(
            conn,
            movement.tenant_id,
            movement.product_id,
            delta,
            now,
        )
        .await?;
        let old_quantity = new_quantity - delta;

        // Only inferred types get upgraded: an explicit Out/Loss stays as
        // the caller recorded it.
        let entry_type = if movement.requested_type.is_none() && delta < 0 && new_quantity < 0 {
            StockEntryType::Backorder
        } else {
            provisional
        };

        let unit_price = movement.unit_price.unwrap_or_else(|| {
            if entry_type.is_inbound() {
                product.purchase_price()
            } else {
                product.selling_price()
            }
        });

        let transaction = StockTransaction {
            id: Uuid::new_v4().to_string(),
            tenant_id: movement.tenant_id.to_string(),
            product_id: movement.product_id.to_string(),
            entry_type,
            quantity: movement.magnitude,
            unit_price_minor: unit_price.minor(),
            context: movement.context,
            notes: movement.context.tag_notes(movement.notes),
            sale_id: movement.sale_id.map(str::to_string),
            user_id: movement.user_id.to_string(),
            created_at: now,
        };
        Self::insert_entry(conn, &transaction).await?;

        let status = StockStatus::from_quantity(new_quantity, product.alert_threshold);
        let has_backorder = new_quantity < 0;
        let backorder_quantity = if has_backorder { -new_quantity } else { 0 };

        if has_backorder {
            warn!(
                product_id = %movement.product_id,
                new_quantity,
                backorder_quantity,
                "Stock went negative (backorder)"
            );
        } else {
            info!(
                product_id = %movement.product_id,
                entry_type = ?entry_type,
                delta,
                new_quantity,
                "Stock movement recorded"
            );
        }

        Ok(StockResult {
            transaction,
            old_quantity,
            new_quantity,
            status,
            has_backorder,
            backorder_quantity,
        })
    }

    async fn insert_entry(
        conn: &mut SqliteConnection,
        entry: &StockTransaction,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_transactions (
                id, tenant_id, product_id, entry_type, quantity,
                unit_price_minor, context, notes, sale_id, user_id, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.tenant_id)
        .bind(&entry.product_id)
        .bind(entry.entry_type)
        .bind(entry.quantity)
        .bind(entry.unit_price_minor)
        .bind(entry.context)
        .bind(&entry.notes)
        .bind(&entry.sale_id)
        .bind(&entry.user_id)
        .bind(entry.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Reconstructs a quantity by folding a full history, for audit checks.
    pub fn replay(entries: &[StockHistoryEntry]) -> i64 {
        entries.iter().map(|e| e.transaction.signed_delta()).sum()
    }

    /// Convenience read of the owning product.
    pub async fn product(&self, product_id: &str) -> LedgerResult<Product> {
        let product = ProductRepository::new(self.pool.clone(), self.tenant_id.clone())
            .get(product_id)
            .await?;
        Ok(product)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{seed_product, test_db, TEST_USER};
    use comptoir_core::LedgerError;

    #[tokio::test]
    async fn test_add_and_remove_update_quantity() {
        let db = test_db().await;
        let product = seed_product(&db, "1001", 0, 500).await;
        let ledger = db.stock_ledger();

        let added = ledger
            .add_stock(
                StockMovementRequest::new(&product.id, 20, StockContext::Reception, TEST_USER)
                    .notes("lot 42"),
            )
            .await
            .unwrap();
        assert_eq!(added.old_quantity, 0);
        assert_eq!(added.new_quantity, 20);
        assert_eq!(added.transaction.entry_type, StockEntryType::In);
        assert_eq!(added.transaction.notes, "Réception marchandise — lot 42");
        assert!(!added.has_backorder);

        let removed = ledger
            .remove_stock(StockMovementRequest::new(
                &product.id,
                4,
                StockContext::Manual,
                TEST_USER,
            ))
            .await
            .unwrap();
        assert_eq!(removed.new_quantity, 16);
        assert_eq!(removed.transaction.entry_type, StockEntryType::Out);
    }

    #[tokio::test]
    async fn test_removal_below_zero_records_backorder() {
        // Removing 5 from a quantity of 3 goes through: -2, flagged.
        let db = test_db().await;
        let product = seed_product(&db, "1002", 3, 500).await;
        let ledger = db.stock_ledger();

        let result = ledger
            .remove_stock(StockMovementRequest::new(
                &product.id,
                5,
                StockContext::Sale,
                TEST_USER,
            ))
            .await
            .unwrap();

        assert_eq!(result.old_quantity, 3);
        assert_eq!(result.new_quantity, -2);
        assert_eq!(result.transaction.entry_type, StockEntryType::Backorder);
        assert!(result.has_backorder);
        assert_eq!(result.backorder_quantity, 2);
        assert_eq!(result.status, StockStatus::Backorder);
    }

    #[tokio::test]
    async fn test_explicit_loss_is_not_upgraded() {
        let db = test_db().await;
        let product = seed_product(&db, "1003", 2, 500).await;
        let ledger = db.stock_ledger();

        let result = ledger
            .remove_stock(
                StockMovementRequest::new(&product.id, 5, StockContext::Loss, TEST_USER)
                    .entry_type(StockEntryType::Loss),
            )
            .await
            .unwrap();

        assert_eq!(result.new_quantity, -3);
        assert_eq!(result.transaction.entry_type, StockEntryType::Loss);
        assert!(result.has_backorder);
    }

    #[tokio::test]
    async fn test_history_reconstructs_quantity() {
        let db = test_db().await;
        let product = seed_product(&db, "1004", 0, 500).await;
        let ledger = db.stock_ledger();

        ledger
            .add_stock(StockMovementRequest::new(
                &product.id,
                10,
                StockContext::Reception,
                TEST_USER,
            ))
            .await
            .unwrap();
        ledger
            .remove_stock(StockMovementRequest::new(
                &product.id,
                3,
                StockContext::Sale,
                TEST_USER,
            ))
            .await
            .unwrap();
        ledger
            .remove_stock(
                StockMovementRequest::new(&product.id, 1, StockContext::Loss, TEST_USER)
                    .entry_type(StockEntryType::Loss),
            )
            .await
            .unwrap();

        let history = ledger.history(&product.id, None).await.unwrap();
        assert_eq!(history.len(), 3);

        // Newest first, walking backward from the current quantity
        assert_eq!(history[0].transaction.entry_type, StockEntryType::Loss);
        assert_eq!(history[0].stock_after, 6);
        assert_eq!(history[0].stock_before, 7);
        assert_eq!(history[2].stock_before, 0);
        for pair in history.windows(2) {
            assert_eq!(pair[1].stock_after, pair[0].stock_before);
        }

        let current = ledger.product(&product.id).await.unwrap().quantity;
        assert_eq!(StockLedger::replay(&history), current);
        assert_eq!(current, 6);

        // Reading history is idempotent
        let again = ledger.history(&product.id, None).await.unwrap();
        assert_eq!(again.len(), 3);
        for (a, b) in history.iter().zip(&again) {
            assert_eq!(a.transaction.id, b.transaction.id);
            assert_eq!(a.stock_before, b.stock_before);
            assert_eq!(a.stock_after, b.stock_after);
        }

        // A limited read returns the newest slice only
        let latest = ledger.history(&product.id, Some(2)).await.unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].transaction.id, history[0].transaction.id);
        assert_eq!(latest[0].stock_after, 6);
    }

    #[tokio::test]
    async fn test_adjust_stock_directions() {
        let db = test_db().await;
        let product = seed_product(&db, "1005", 10, 500).await;
        let ledger = db.stock_ledger();

        // Upward correction
        let up = ledger
            .adjust_stock(StockAdjustmentRequest {
                product_id: product.id.clone(),
                target_quantity: 15,
                context: StockContext::Inventory,
                notes: Some("comptage du soir".to_string()),
                user_id: TEST_USER.to_string(),
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(up.new_quantity, 15);
        assert_eq!(up.transaction.entry_type, StockEntryType::Adjustment);
        assert_eq!(up.transaction.quantity, 5);

        // Downward correction
        let down = ledger
            .adjust_stock(StockAdjustmentRequest {
                product_id: product.id.clone(),
                target_quantity: 12,
                context: StockContext::Correction,
                notes: None,
                user_id: TEST_USER.to_string(),
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(down.new_quantity, 12);
        assert_eq!(down.transaction.entry_type, StockEntryType::Out);
        assert_eq!(down.transaction.quantity, 3);

        // Same target writes nothing
        let noop = ledger
            .adjust_stock(StockAdjustmentRequest {
                product_id: product.id.clone(),
                target_quantity: 12,
                context: StockContext::Inventory,
                notes: None,
                user_id: TEST_USER.to_string(),
            })
            .await
            .unwrap();
        assert!(noop.is_none());
        assert_eq!(ledger.history(&product.id, None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_adjust_to_negative_target_rejected() {
        let db = test_db().await;
        let product = seed_product(&db, "1006", 10, 500).await;

        let err = db
            .stock_ledger()
            .adjust_stock(StockAdjustmentRequest {
                product_id: product.id.clone(),
                target_quantity: -1,
                context: StockContext::Inventory,
                notes: None,
                user_id: TEST_USER.to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[tokio::test]
    async fn test_zero_quantity_movement_rejected() {
        let db = test_db().await;
        let product = seed_product(&db, "1007", 10, 500).await;

        let err = db
            .stock_ledger()
            .add_stock(StockMovementRequest::new(
                &product.id,
                0,
                StockContext::Reception,
                TEST_USER,
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        // Nothing was written
        assert!(db
            .stock_ledger()
            .history(&product.id, None)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let db = test_db().await;
        let err = db
            .stock_ledger()
            .add_stock(StockMovementRequest::new(
                "no-such-id",
                5,
                StockContext::Reception,
                TEST_USER,
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { .. }));
    }
}
