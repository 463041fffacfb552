//! # comptoir-db: Database Layer & Ledger Services
//!
//! SQLite persistence and the transactional ledger services for the
//! Comptoir retail backend.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         comptoir-db                                     │
//! │                                                                         │
//! │  ┌───────────────────────────────────────────────────────────────┐     │
//! │  │                    Database (pool.rs)                         │     │
//! │  │         DbConfig ──► SqlitePool ──► migrations                │     │
//! │  └──────────────────────────┬────────────────────────────────────┘     │
//! │                             │                                           │
//! │        ┌────────────────────┼──────────────────────┐                    │
//! │        ▼                    ▼                      ▼                    │
//! │  ┌───────────┐      ┌──────────────┐      ┌──────────────────┐         │
//! │  │ repository│      │    ledger    │      │    checkout      │         │
//! │  │ products  │      │ StockLedger  │      │  SaleProcessor   │         │
//! │  │ customers │◄─────│ CreditLedger │◄─────│  one transaction │         │
//! │  │ sales     │      │ LoyaltyLedger│      │  per sale        │         │
//! │  │ programs  │      └──────────────┘      └──────────────────┘         │
//! │  └───────────┘                                                          │
//! │                                                                         │
//! │  Pure math and domain types live in comptoir-core; this crate owns      │
//! │  every SQL statement and every transaction boundary.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Transaction Discipline
//!
//! 1. Every mutation runs inside one SQLite transaction
//! 2. Aggregate balances change via single atomic `UPDATE ... RETURNING`
//!    statements - no read-modify-write window
//! 3. Ledger tables are append-only; the entry and its balance mutation
//!    commit together or not at all
//! 4. A locked database surfaces as a retryable concurrency error; the
//!    caller retries the whole operation, never resumes mid-pipeline

pub mod checkout;
pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;

#[cfg(test)]
pub(crate) mod testutil;

pub use checkout::{CreateSaleRequest, SaleItemRequest, SaleProcessor, SaleReceipt};
pub use error::{DbError, DbResult};
pub use ledger::credit::CreditLedger;
pub use ledger::loyalty::{LoyaltyLedger, PointsCalculation, Redemption};
pub use ledger::stock::{
    StockAdjustmentRequest, StockHistoryEntry, StockLedger, StockMovementRequest, StockResult,
};
pub use pool::{Database, DbConfig};
pub use repository::customer::{CustomerRepository, NewCustomer};
pub use repository::product::{NewProduct, ProductRepository};
pub use repository::program::LoyaltyProgramRepository;
pub use repository::sale::SaleRepository;
