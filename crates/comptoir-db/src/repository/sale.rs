//! # Sale Repository
//!
//! Database operations for sales and sale items.
//!
//! A sale row is written twice, both times inside its creation
//! transaction: first as a shell (so ledger entries can reference its id
//! through foreign keys), then with the final computed totals. After the
//! transaction commits the row is immutable.

use sqlx::{SqliteConnection, SqlitePool};

use crate::error::{DbError, DbResult};
use comptoir_core::{Sale, SaleItem};

/// Repository for sale reads.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl SaleRepository {
    /// Creates a new SaleRepository scoped to a tenant.
    pub fn new(pool: SqlitePool, tenant_id: String) -> Self {
        SaleRepository { pool, tenant_id }
    }

    /// Gets a sale by ID.
    pub async fn get(&self, sale_id: &str) -> DbResult<Sale> {
        sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = ?1 AND tenant_id = ?2")
            .bind(sale_id)
            .bind(&self.tenant_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("sale", sale_id))
    }

    /// Gets the line items of a sale.
    pub async fn items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            "SELECT * FROM sale_items WHERE sale_id = ?1 ORDER BY created_at, id",
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists the most recent sales.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT * FROM sales
            WHERE tenant_id = ?1
            ORDER BY created_at DESC, id DESC
            LIMIT ?2
            "#,
        )
        .bind(&self.tenant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Inserts a sale row inside a caller-owned transaction.
    ///
    /// Called twice per sale by the orchestrator: the shell insert uses
    /// zeroed totals; `update_totals` overwrites them before commit.
    pub async fn insert(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sales (
                id, tenant_id, customer_id, subtotal_minor, discount_minor,
                loyalty_discount_minor, total_minor, loyalty_points_earned_centi,
                loyalty_points_used_centi, payment_method, payment_status,
                amount_paid_minor, amount_given_minor, change_minor,
                payment_reference, user_id, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.tenant_id)
        .bind(&sale.customer_id)
        .bind(sale.subtotal_minor)
        .bind(sale.discount_minor)
        .bind(sale.loyalty_discount_minor)
        .bind(sale.total_minor)
        .bind(sale.loyalty_points_earned_centi)
        .bind(sale.loyalty_points_used_centi)
        .bind(sale.payment_method)
        .bind(sale.payment_status)
        .bind(sale.amount_paid_minor)
        .bind(sale.amount_given_minor)
        .bind(sale.change_minor)
        .bind(&sale.payment_reference)
        .bind(&sale.user_id)
        .bind(sale.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts a sale line item inside a caller-owned transaction.
    pub async fn insert_item(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sale_items (
                id, sale_id, product_id, cug_snapshot, name_snapshot,
                quantity, unit_price_minor, purchase_price_minor,
                line_total_minor, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(&item.product_id)
        .bind(&item.cug_snapshot)
        .bind(&item.name_snapshot)
        .bind(item.quantity)
        .bind(item.unit_price_minor)
        .bind(item.purchase_price_minor)
        .bind(item.line_total_minor)
        .bind(item.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Writes the final totals and settlement fields of a sale inside its
    /// creation transaction.
    pub async fn update_totals(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE sales
            SET subtotal_minor = ?1,
                discount_minor = ?2,
                loyalty_discount_minor = ?3,
                total_minor = ?4,
                loyalty_points_earned_centi = ?5,
                loyalty_points_used_centi = ?6,
                payment_status = ?7,
                amount_paid_minor = ?8,
                amount_given_minor = ?9,
                change_minor = ?10,
                payment_reference = ?11
            WHERE id = ?12
            "#,
        )
        .bind(sale.subtotal_minor)
        .bind(sale.discount_minor)
        .bind(sale.loyalty_discount_minor)
        .bind(sale.total_minor)
        .bind(sale.loyalty_points_earned_centi)
        .bind(sale.loyalty_points_used_centi)
        .bind(sale.payment_status)
        .bind(sale.amount_paid_minor)
        .bind(sale.amount_given_minor)
        .bind(sale.change_minor)
        .bind(&sale.payment_reference)
        .bind(&sale.id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
