//! # Repository Module
//!
//! Data access layer for the ledger backend.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Repository Pattern                                 │
//! │                                                                         │
//! │  Ledger services / callers                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Repository (this module) ← SQL lives here, nowhere else               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite                                                                 │
//! │                                                                         │
//! │  Two shapes of method:                                                  │
//! │  • `&self` methods run on the pool (reads, standalone writes)          │
//! │  • associated fns taking `&mut SqliteConnection` run inside a          │
//! │    caller-owned transaction (ledger mutations, sale orchestration)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod customer;
pub mod product;
pub mod program;
pub mod sale;

pub use customer::CustomerRepository;
pub use product::ProductRepository;
pub use program::LoyaltyProgramRepository;
pub use sale::SaleRepository;
