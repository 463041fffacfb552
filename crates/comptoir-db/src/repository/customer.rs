//! # Customer Repository
//!
//! Database operations for customers.
//!
//! `credit_balance_minor` and `loyalty_points_centi` are mutated only by
//! the credit and loyalty ledgers, as single atomic UPDATEs inside the
//! ledger transaction. The repository never touches either column outside
//! of the associated transaction-scoped functions.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use comptoir_core::{Customer, Money};

/// Parameters for creating a customer.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    /// Advisory credit ceiling; zero means no limit configured.
    pub credit_limit: Money,
    pub is_loyalty_member: bool,
}

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository scoped to a tenant.
    pub fn new(pool: SqlitePool, tenant_id: String) -> Self {
        CustomerRepository { pool, tenant_id }
    }

    /// Creates a customer.
    pub async fn create(&self, new: NewCustomer) -> DbResult<Customer> {
        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            tenant_id: self.tenant_id.clone(),
            name: new.name,
            is_active: true,
            credit_balance_minor: 0,
            credit_limit_minor: new.credit_limit.minor(),
            loyalty_points_centi: 0,
            is_loyalty_member: new.is_loyalty_member,
            loyalty_joined_at: if new.is_loyalty_member { Some(now) } else { None },
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, tenant_id, name, is_active, credit_balance_minor,
                credit_limit_minor, loyalty_points_centi, is_loyalty_member,
                loyalty_joined_at, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.tenant_id)
        .bind(&customer.name)
        .bind(customer.is_active)
        .bind(customer.credit_balance_minor)
        .bind(customer.credit_limit_minor)
        .bind(customer.loyalty_points_centi)
        .bind(customer.is_loyalty_member)
        .bind(customer.loyalty_joined_at)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        debug!(customer_id = %customer.id, "Customer created");
        Ok(customer)
    }

    /// Gets a customer by ID.
    pub async fn get(&self, customer_id: &str) -> DbResult<Customer> {
        sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE id = ?1 AND tenant_id = ?2",
        )
        .bind(customer_id)
        .bind(&self.tenant_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("customer", customer_id))
    }

    /// Enrolls a customer in the loyalty program.
    pub async fn enroll_loyalty(&self, customer_id: &str) -> DbResult<Customer> {
        let now = Utc::now();
        sqlx::query(
            r#"
            UPDATE customers
            SET is_loyalty_member = 1,
                loyalty_joined_at = COALESCE(loyalty_joined_at, ?1),
                updated_at = ?1
            WHERE id = ?2 AND tenant_id = ?3
            "#,
        )
        .bind(now)
        .bind(customer_id)
        .bind(&self.tenant_id)
        .execute(&self.pool)
        .await?;

        self.get(customer_id).await
    }

    /// Fetches a customer inside a caller-owned transaction.
    pub async fn fetch(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        customer_id: &str,
    ) -> DbResult<Customer> {
        sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE id = ?1 AND tenant_id = ?2",
        )
        .bind(customer_id)
        .bind(tenant_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| DbError::not_found("customer", customer_id))
    }

    /// Applies a signed delta to a customer's credit balance atomically
    /// and returns the new balance in minor units.
    pub async fn apply_credit_delta(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        customer_id: &str,
        delta_minor: i64,
        now: DateTime<Utc>,
    ) -> DbResult<i64> {
        let new_balance: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE customers
            SET credit_balance_minor = credit_balance_minor + ?1, updated_at = ?2
            WHERE id = ?3 AND tenant_id = ?4
            RETURNING credit_balance_minor
            "#,
        )
        .bind(delta_minor)
        .bind(now)
        .bind(customer_id)
        .bind(tenant_id)
        .fetch_optional(&mut *conn)
        .await?;

        new_balance.ok_or_else(|| DbError::not_found("customer", customer_id))
    }

    /// Applies a signed delta to a customer's loyalty point balance
    /// atomically and returns the new balance in centipoints.
    ///
    /// The `CHECK (loyalty_points_centi >= 0)` constraint backstops the
    /// ledger's own insufficient-points guard; a violating delta fails
    /// the statement and rolls the enclosing transaction back.
    pub async fn apply_points_delta(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        customer_id: &str,
        delta_centi: i64,
        now: DateTime<Utc>,
    ) -> DbResult<i64> {
        let new_balance: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE customers
            SET loyalty_points_centi = loyalty_points_centi + ?1, updated_at = ?2
            WHERE id = ?3 AND tenant_id = ?4
            RETURNING loyalty_points_centi
            "#,
        )
        .bind(delta_centi)
        .bind(now)
        .bind(customer_id)
        .bind(tenant_id)
        .fetch_optional(&mut *conn)
        .await?;

        new_balance.ok_or_else(|| DbError::not_found("customer", customer_id))
    }
}
