//! # External Sales Snapshot Repository
//!
//! Transactional delete-and-reinsert storage for external-sales snapshots.
//!
//! ## Snapshot Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  A scope (one submission, or one manager's batch) owns ONE snapshot.    │
//! │                                                                         │
//! │  save(scope, rows):                                                     │
//! │    1. validate the scope reference exists                               │
//! │    2. BEGIN                                                             │
//! │    3. DELETE every stored row for the scope                             │
//! │    4. INSERT every new row, original paste index preserved              │
//! │    5. COMMIT                                                            │
//! │                                                                         │
//! │  Any insert failure rolls back the deletions too: the scope is never    │
//! │  left with a partially replaced set.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use dayclose_core::{ExternalSalesRow, NormalizedRow, SnapshotScope};

/// Repository for external-sales snapshot operations.
#[derive(Debug, Clone)]
pub struct ExternalSalesRepository {
    pool: SqlitePool,
}

const ROW_COLUMNS: &str = "id, scope_kind, scope_ref, row_index, \
    login_id, outlet_name, level, ticket_count, total_deposit, total_withdraw, \
    company_sales, company_profit, company_payout, saved_by, created_at";

impl ExternalSalesRepository {
    /// Creates a new ExternalSalesRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExternalSalesRepository { pool }
    }

    /// Replaces a scope's snapshot with the given normalized rows.
    ///
    /// Returns the number of rows persisted. The previous snapshot is gone
    /// only if every new row lands; otherwise the transaction rolls back
    /// and the old snapshot remains intact.
    pub async fn replace_snapshot(
        &self,
        scope: &SnapshotScope,
        rows: &[NormalizedRow],
        saved_by: &str,
    ) -> DbResult<usize> {
        self.validate_scope(scope).await?;

        let now = Utc::now();
        let kind = scope.kind();
        let scope_ref = scope.reference();

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM external_sales_rows WHERE scope_kind = ?1 AND scope_ref = ?2")
            .bind(kind)
            .bind(scope_ref)
            .execute(&mut *tx)
            .await?;

        for row in rows {
            sqlx::query(
                "INSERT INTO external_sales_rows ( \
                    id, scope_kind, scope_ref, row_index, \
                    login_id, outlet_name, level, ticket_count, \
                    total_deposit, total_withdraw, \
                    company_sales, company_profit, company_payout, \
                    saved_by, created_at \
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(kind)
            .bind(scope_ref)
            .bind(row.row_index as i64)
            .bind(&row.login_id)
            .bind(&row.outlet_name)
            .bind(&row.level)
            .bind(&row.ticket_count)
            .bind(&row.total_deposit)
            .bind(&row.total_withdraw)
            .bind(&row.company_sales)
            .bind(&row.company_profit)
            .bind(&row.company_payout)
            .bind(saved_by)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(
            scope = ?scope,
            rows = rows.len(),
            "External sales snapshot replaced"
        );
        Ok(rows.len())
    }

    /// Reads a scope's snapshot in original paste order.
    pub async fn list_for_scope(&self, scope: &SnapshotScope) -> DbResult<Vec<ExternalSalesRow>> {
        let rows = sqlx::query_as::<_, ExternalSalesRow>(&format!(
            "SELECT {ROW_COLUMNS} FROM external_sales_rows \
             WHERE scope_kind = ?1 AND scope_ref = ?2 ORDER BY row_index"
        ))
        .bind(scope.kind())
        .bind(scope.reference())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Rejects snapshots against scope references that do not exist.
    async fn validate_scope(&self, scope: &SnapshotScope) -> DbResult<()> {
        let exists: i64 = match scope {
            SnapshotScope::Submission(id) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM submissions WHERE id = ?1")
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await?
            }
            SnapshotScope::Manager(id) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM outlets WHERE manager_id = ?1")
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await?
            }
        };

        if exists == 0 {
            return Err(DbError::not_found("Snapshot scope", scope.reference()));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
