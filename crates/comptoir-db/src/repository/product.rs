//! # Product Repository
//!
//! Database operations for products.
//!
//! The ledger subsystem owns `products.quantity` exclusively: it is
//! mutated only by the stock ledger, inside a transaction, as a single
//! atomic UPDATE. Everything here is catalog plumbing around that rule.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use comptoir_core::{Money, Product};

/// Parameters for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub cug: String,
    pub name: String,
    pub quantity: i64,
    pub alert_threshold: i64,
    pub purchase_price: Money,
    pub selling_price: Money,
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let product = repo.get(&product_id).await?;
/// let low = repo.list_low_stock().await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl ProductRepository {
    /// Creates a new ProductRepository scoped to a tenant.
    pub fn new(pool: SqlitePool, tenant_id: String) -> Self {
        ProductRepository { pool, tenant_id }
    }

    /// Creates a product.
    pub async fn create(&self, new: NewProduct) -> DbResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            tenant_id: self.tenant_id.clone(),
            cug: new.cug,
            name: new.name,
            quantity: new.quantity,
            alert_threshold: new.alert_threshold,
            purchase_price_minor: new.purchase_price.minor(),
            selling_price_minor: new.selling_price.minor(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO products (
                id, tenant_id, cug, name, quantity, alert_threshold,
                purchase_price_minor, selling_price_minor, is_active,
                created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&product.id)
        .bind(&product.tenant_id)
        .bind(&product.cug)
        .bind(&product.name)
        .bind(product.quantity)
        .bind(product.alert_threshold)
        .bind(product.purchase_price_minor)
        .bind(product.selling_price_minor)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        debug!(product_id = %product.id, cug = %product.cug, "Product created");
        Ok(product)
    }

    /// Gets a product by ID.
    pub async fn get(&self, product_id: &str) -> DbResult<Product> {
        sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE id = ?1 AND tenant_id = ?2",
        )
        .bind(product_id)
        .bind(&self.tenant_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("product", product_id))
    }

    /// Gets a product by its store-level code (CUG).
    pub async fn get_by_cug(&self, cug: &str) -> DbResult<Product> {
        sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE cug = ?1 AND tenant_id = ?2",
        )
        .bind(cug)
        .bind(&self.tenant_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("product", cug))
    }

    /// Lists active products.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE tenant_id = ?1 AND is_active = 1
            ORDER BY name
            LIMIT ?2
            "#,
        )
        .bind(&self.tenant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Lists products at or below their alert threshold, including
    /// backordered (negative-quantity) products first.
    pub async fn list_low_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE tenant_id = ?1 AND is_active = 1 AND quantity <= alert_threshold
            ORDER BY quantity ASC
            "#,
        )
        .bind(&self.tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Fetches a product inside a caller-owned transaction.
    ///
    /// Used by the stock ledger and the sale pipeline so the read and the
    /// subsequent balance update land in the same transaction.
    pub async fn fetch(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        product_id: &str,
    ) -> DbResult<Product> {
        sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE id = ?1 AND tenant_id = ?2",
        )
        .bind(product_id)
        .bind(tenant_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| DbError::not_found("product", product_id))
    }

    /// Applies a signed delta to a product's quantity atomically and
    /// returns the new quantity.
    ///
    /// A single UPDATE with an arithmetic expression: there is no
    /// read-modify-write window, so concurrent movements can interleave
    /// in any order without losing updates.
    pub async fn apply_quantity_delta(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        product_id: &str,
        delta: i64,
        now: DateTime<Utc>,
    ) -> DbResult<i64> {
        let new_quantity: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET quantity = quantity + ?1, updated_at = ?2
            WHERE id = ?3 AND tenant_id = ?4
            RETURNING quantity
            "#,
        )
        .bind(delta)
        .bind(now)
        .bind(product_id)
        .bind(tenant_id)
        .fetch_optional(&mut *conn)
        .await?;

        new_quantity.ok_or_else(|| DbError::not_found("product", product_id))
    }
}
