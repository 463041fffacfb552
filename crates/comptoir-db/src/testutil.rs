//! Shared helpers for the in-memory database tests.

use comptoir_core::{Customer, Money, Product};

use crate::pool::{Database, DbConfig};
use crate::repository::customer::NewCustomer;
use crate::repository::product::NewProduct;

pub(crate) const TEST_USER: &str = "00000000-0000-0000-0000-0000000000ff";

pub(crate) async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

pub(crate) async fn seed_product(
    db: &Database,
    cug: &str,
    quantity: i64,
    selling_minor: i64,
) -> Product {
    db.products()
        .create(NewProduct {
            cug: cug.to_string(),
            name: format!("Produit {}", cug),
            quantity,
            alert_threshold: 5,
            purchase_price: Money::from_minor(selling_minor / 2),
            selling_price: Money::from_minor(selling_minor),
        })
        .await
        .unwrap()
}

pub(crate) async fn seed_customer(db: &Database, name: &str, loyalty_member: bool) -> Customer {
    db.customers()
        .create(NewCustomer {
            name: name.to_string(),
            credit_limit: Money::from_minor(50_000),
            is_loyalty_member: loyalty_member,
        })
        .await
        .unwrap()
}

pub(crate) async fn deactivate_customer(db: &Database, customer_id: &str) {
    sqlx::query("UPDATE customers SET is_active = 0 WHERE id = ?1")
        .bind(customer_id)
        .execute(db.pool())
        .await
        .unwrap();
}

pub(crate) async fn grant_points(db: &Database, customer_id: &str, centi: i64) {
    sqlx::query("UPDATE customers SET loyalty_points_centi = ?1 WHERE id = ?2")
        .bind(centi)
        .bind(customer_id)
        .execute(db.pool())
        .await
        .unwrap();
}

pub(crate) async fn count_rows(db: &Database, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(db.pool())
        .await
        .unwrap()
}
