//! # Ledger Services
//!
//! The three transactional ledgers at the heart of the backend.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Ledger Services                                  │
//! │                                                                         │
//! │  ┌──────────────┐  ┌───────────────┐  ┌────────────────┐               │
//! │  │ StockLedger  │  │ CreditLedger  │  │ LoyaltyLedger  │               │
//! │  │ quantity ±   │  │ balance ±     │  │ points earn/   │               │
//! │  │ backorders   │  │ running snap  │  │ redeem + cap   │               │
//! │  └──────┬───────┘  └───────┬───────┘  └───────┬────────┘               │
//! │         │                  │                  │                         │
//! │         └──────────────────┼──────────────────┘                         │
//! │                            ▼                                            │
//! │        One SQLite transaction per operation:                            │
//! │        atomic UPDATE on the aggregate + append-only entry,              │
//! │        both committed together or neither                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each service has two faces: `&self` methods that own a transaction end
//! to end, and associated functions taking `&mut SqliteConnection` that
//! compose into the sale pipeline's single shared transaction.

pub mod credit;
pub mod loyalty;
pub mod stock;

pub use credit::CreditLedger;
pub use loyalty::LoyaltyLedger;
pub use stock::{StockHistoryEntry, StockLedger};
