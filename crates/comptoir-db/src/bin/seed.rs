//! Seeds a demo database with a small catalog, two customers, and a few
//! sales, so the ledgers have realistic data to poke at.
//!
//! ```text
//! cargo run --bin seed -- [path]       (default: ./comptoir.db)
//! ```

use std::error::Error;

use tracing::info;

use comptoir_core::{Money, PaymentMethod, Points, StockContext};
use comptoir_db::{
    CreateSaleRequest, Database, DbConfig, NewCustomer, NewProduct, StockMovementRequest,
};

const SEED_USER: &str = "00000000-0000-0000-0000-0000000000aa";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "comptoir.db".to_string());
    info!(path = %path, "Seeding demo database");

    let db = Database::new(DbConfig::new(&path)).await?;

    // Catalog
    let products = db.products();
    let savon = products
        .create(NewProduct {
            cug: "1001".to_string(),
            name: "Savon de Marseille".to_string(),
            quantity: 0,
            alert_threshold: 10,
            purchase_price: Money::from_minor(300),
            selling_price: Money::from_minor(500),
        })
        .await?;
    let riz = products
        .create(NewProduct {
            cug: "1002".to_string(),
            name: "Riz parfumé 5kg".to_string(),
            quantity: 0,
            alert_threshold: 5,
            purchase_price: Money::from_minor(3200),
            selling_price: Money::from_minor(4000),
        })
        .await?;
    let huile = products
        .create(NewProduct {
            cug: "1003".to_string(),
            name: "Huile végétale 1L".to_string(),
            quantity: 0,
            alert_threshold: 8,
            purchase_price: Money::from_minor(900),
            selling_price: Money::from_minor(1200),
        })
        .await?;

    // Initial receptions
    let stock = db.stock_ledger();
    for (product, qty) in [(&savon, 50), (&riz, 20), (&huile, 30)] {
        stock
            .add_stock(
                StockMovementRequest::new(&product.id, qty, StockContext::Reception, SEED_USER)
                    .notes("stock initial"),
            )
            .await?;
    }

    // Customers
    let customers = db.customers();
    let awa = customers
        .create(NewCustomer {
            name: "Awa Diallo".to_string(),
            credit_limit: Money::from_minor(50_000),
            is_loyalty_member: true,
        })
        .await?;
    let moussa = customers
        .create(NewCustomer {
            name: "Moussa Traoré".to_string(),
            credit_limit: Money::zero(),
            is_loyalty_member: false,
        })
        .await?;

    // A cash sale earning points
    let checkout = db.checkout();
    let receipt = checkout
        .create_sale(
            CreateSaleRequest::new(PaymentMethod::Cash, SEED_USER)
                .item(&savon.id, 2)
                .item(&huile.id, 1)
                .customer(&awa.id)
                .amount_given(Money::from_minor(2500)),
        )
        .await?;
    info!(
        sale_id = %receipt.sale.id,
        total = receipt.sale.total_minor,
        earned = %receipt.points_earned,
        "Cash sale seeded"
    );

    // A credit sale for the walk-in-turned-regular
    let receipt = checkout
        .create_sale(
            CreateSaleRequest::new(PaymentMethod::Credit, SEED_USER)
                .item(&riz.id, 1)
                .customer(&moussa.id),
        )
        .await?;
    info!(
        sale_id = %receipt.sale.id,
        total = receipt.sale.total_minor,
        "Credit sale seeded"
    );

    // A small redemption once some points have accrued
    let receipt = checkout
        .create_sale(
            CreateSaleRequest::new(PaymentMethod::Cash, SEED_USER)
                .item(&savon.id, 1)
                .customer(&awa.id)
                .redeem_points(Points::from_whole(3))
                .amount_given(Money::from_minor(500)),
        )
        .await?;
    info!(
        sale_id = %receipt.sale.id,
        total = receipt.sale.total_minor,
        loyalty_discount = receipt.sale.loyalty_discount_minor,
        "Redemption sale seeded"
    );

    db.close().await;
    info!("Seed complete");
    Ok(())
}
