//! # dayclose-db: Database Layer for Dayclose
//!
//! This crate provides database access for the Dayclose system.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Dayclose Data Flow                               │
//! │                                                                         │
//! │  Operation (create_submission, submit_batch, ...)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    dayclose-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (submission,  │    │  (embedded)  │  │   │
//! │  │   │               │    │  expense,     │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│  external     │    │ 001_init.sql │  │   │
//! │  │   │ WAL mode      │    │  sales, ...)  │    │ 002_seed.sql │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (./data/dayclose.db)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dayclose_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/dayclose.db")).await?;
//! let pending = db.submissions().list_pending_for_manager("m1").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::DbError;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::expense::ExpenseRepository;
pub use repository::external_sales::ExternalSalesRepository;
pub use repository::outlet::OutletRepository;
pub use repository::submission::SubmissionRepository;
