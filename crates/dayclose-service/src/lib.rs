//! # dayclose-service: Operation Boundary for Dayclose
//!
//! This crate turns the core rules and the database layer into the
//! operations the outside world calls.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │            Routing / HTML / sessions (external collaborators)           │
//! └─────────────────────────────┬───────────────────────────────────────────┘
//! ┌─────────────────────────────▼───────────────────────────────────────────┐
//! │                 ★ dayclose-service (THIS CRATE) ★                       │
//! │                                                                         │
//! │  ClosingService                                                         │
//! │  ├── create_submission / update_submission / resubmit_submission        │
//! │  ├── check_duplicate (advisory, read-only)                              │
//! │  ├── submit_batch                                                       │
//! │  ├── approve_expenses / reject_expenses                                 │
//! │  ├── save_external_sales                                                │
//! │  └── reconcile_stream (read-only)                                       │
//! │                                                                         │
//! │  Collaborator seams: SecurityTokens (one-time tokens),                  │
//! │                      ReceiptStore (file uploads)                        │
//! └─────────────────────────────┬───────────────────────────────────────────┘
//! ┌─────────────────────────────▼───────────────────────────────────────────┐
//! │              dayclose-core (rules)  +  dayclose-db (storage)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every mutating operation follows the same shape: consume a one-time
//! token, validate before any transaction opens, check preconditions, run
//! one transaction, return a structured response. Failures never leave a
//! partial mutation behind.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ops;
pub mod token;
pub mod uploads;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{ApiError, ErrorCode};
pub use token::{MemoryTokens, SecurityTokens};
pub use uploads::{MemoryReceiptStore, ReceiptStore, UploadError};

use std::sync::Arc;

use dayclose_db::Database;

// =============================================================================
// Closing Service
// =============================================================================

/// The operation boundary of Dayclose.
///
/// Holds the database handle and the two external collaborator seams.
/// Cloning is cheap; all state is shared.
#[derive(Clone)]
pub struct ClosingService {
    db: Database,
    tokens: Arc<dyn SecurityTokens>,
    receipts: Arc<dyn ReceiptStore>,
}

impl ClosingService {
    /// Creates a service over an opened database and collaborators.
    pub fn new(
        db: Database,
        tokens: Arc<dyn SecurityTokens>,
        receipts: Arc<dyn ReceiptStore>,
    ) -> Self {
        ClosingService {
            db,
            tokens,
            receipts,
        }
    }

    /// Issues a fresh one-time token for the next mutating call.
    pub fn issue_token(&self) -> String {
        self.tokens.issue()
    }

    /// Access to the underlying database (reporting, diagnostics).
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Burns a one-time token or rejects the request.
    pub(crate) fn consume_token(&self, token: &str) -> Result<(), ApiError> {
        if self.tokens.consume(token) {
            Ok(())
        } else {
            Err(ApiError::token_rejected())
        }
    }

    pub(crate) fn receipts(&self) -> &dyn ReceiptStore {
        self.receipts.as_ref()
    }
}

// =============================================================================
// Test Support
// =============================================================================

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use chrono::Utc;
    use dayclose_core::Outlet;
    use dayclose_db::DbConfig;

    /// Service over an in-memory database with three seeded outlets:
    /// o1 ("Jalan Ipoh", login A100) and o2 ("Sentul Utara", login A101)
    /// for manager m1, o3 ("Puchong Jaya", no login) for manager m2.
    pub async fn service_with_outlets() -> ClosingService {
        service_with_receipts(Arc::new(MemoryReceiptStore::new())).await
    }

    /// Same seeding, custom receipt store (upload-failure tests).
    pub async fn service_with_receipts(receipts: Arc<dyn ReceiptStore>) -> ClosingService {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let outlets = [
            ("o1", "m1", "Jalan Ipoh", Some("A100")),
            ("o2", "m1", "Sentul Utara", Some("A101")),
            ("o3", "m2", "Puchong Jaya", None),
        ];
        for (id, manager, name, login) in outlets {
            db.outlets()
                .insert(&Outlet {
                    id: id.to_string(),
                    manager_id: manager.to_string(),
                    name: name.to_string(),
                    login_id: login.map(str::to_string),
                    is_active: true,
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }

        ClosingService::new(db, Arc::new(MemoryTokens::default()), receipts)
    }
}
