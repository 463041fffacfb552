//! # Loyalty Program Repository
//!
//! Database operations for per-tenant loyalty programs.
//!
//! A tenant has at most one program row (enforced by a UNIQUE constraint
//! on `tenant_id`). The row is created lazily the first time the loyalty
//! ledger needs it, with defaults scaled to the tenant's currency.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use comptoir_core::{CurrencyProfile, LoyaltyProgram};

/// Repository for loyalty program operations.
#[derive(Debug, Clone)]
pub struct LoyaltyProgramRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl LoyaltyProgramRepository {
    /// Creates a new LoyaltyProgramRepository scoped to a tenant.
    pub fn new(pool: SqlitePool, tenant_id: String) -> Self {
        LoyaltyProgramRepository { pool, tenant_id }
    }

    /// Gets the tenant's program, if one has been created.
    pub async fn get(&self) -> DbResult<Option<LoyaltyProgram>> {
        let program = sqlx::query_as::<_, LoyaltyProgram>(
            "SELECT * FROM loyalty_programs WHERE tenant_id = ?1",
        )
        .bind(&self.tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(program)
    }

    /// Updates the tenant's conversion rates and active flag.
    pub async fn update(&self, program: &LoyaltyProgram) -> DbResult<()> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE loyalty_programs
            SET points_per_amount_centi = ?1,
                amount_for_points_minor = ?2,
                amount_per_point_minor = ?3,
                is_active = ?4,
                updated_at = ?5
            WHERE tenant_id = ?6
            "#,
        )
        .bind(program.points_per_amount_centi)
        .bind(program.amount_for_points_minor)
        .bind(program.amount_per_point_minor)
        .bind(program.is_active)
        .bind(now)
        .bind(&self.tenant_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("loyalty_program", &self.tenant_id));
        }
        Ok(())
    }

    /// Fetches the tenant's program inside a caller-owned transaction,
    /// creating it with currency-scaled defaults if missing.
    pub async fn get_or_create(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        currency: &CurrencyProfile,
    ) -> DbResult<LoyaltyProgram> {
        let existing = sqlx::query_as::<_, LoyaltyProgram>(
            "SELECT * FROM loyalty_programs WHERE tenant_id = ?1",
        )
        .bind(tenant_id)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(program) = existing {
            return Ok(program);
        }

        let program = LoyaltyProgram::with_defaults(
            tenant_id,
            currency,
            Uuid::new_v4().to_string(),
            Utc::now(),
        );

        sqlx::query(
            r#"
            INSERT INTO loyalty_programs (
                id, tenant_id, points_per_amount_centi, amount_for_points_minor,
                amount_per_point_minor, is_active, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&program.id)
        .bind(&program.tenant_id)
        .bind(program.points_per_amount_centi)
        .bind(program.amount_for_points_minor)
        .bind(program.amount_per_point_minor)
        .bind(program.is_active)
        .bind(program.created_at)
        .bind(program.updated_at)
        .execute(&mut *conn)
        .await?;

        info!(tenant_id = %tenant_id, "Loyalty program created with defaults");
        Ok(program)
    }
}
