//! # Outlet Repository
//!
//! Read access to outlet configuration data, plus inserts for seeding.
//! Outlets are never created or edited by the closing flows themselves.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use dayclose_core::Outlet;

/// Repository for outlet lookups.
#[derive(Debug, Clone)]
pub struct OutletRepository {
    pool: SqlitePool,
}

const OUTLET_COLUMNS: &str = "id, manager_id, name, login_id, is_active, created_at";

impl OutletRepository {
    /// Creates a new OutletRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OutletRepository { pool }
    }

    /// Gets an outlet by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Outlet>> {
        let outlet = sqlx::query_as::<_, Outlet>(&format!(
            "SELECT {OUTLET_COLUMNS} FROM outlets WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(outlet)
    }

    /// Gets an outlet only if it is active and belongs to the manager.
    ///
    /// This is the ownership check behind submission creation: a manager
    /// can only file reports for their own live outlets.
    pub async fn get_active_for_manager(
        &self,
        outlet_id: &str,
        manager_id: &str,
    ) -> DbResult<Option<Outlet>> {
        let outlet = sqlx::query_as::<_, Outlet>(&format!(
            "SELECT {OUTLET_COLUMNS} FROM outlets \
             WHERE id = ?1 AND manager_id = ?2 AND is_active = 1"
        ))
        .bind(outlet_id)
        .bind(manager_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(outlet)
    }

    /// Lists a manager's outlets, active first, then by name.
    pub async fn list_for_manager(&self, manager_id: &str) -> DbResult<Vec<Outlet>> {
        let outlets = sqlx::query_as::<_, Outlet>(&format!(
            "SELECT {OUTLET_COLUMNS} FROM outlets \
             WHERE manager_id = ?1 ORDER BY is_active DESC, name"
        ))
        .bind(manager_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(outlets)
    }

    /// Whether the manager has at least one outlet.
    ///
    /// Used to validate the manager-batch snapshot scope.
    pub async fn manager_exists(&self, manager_id: &str) -> DbResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM outlets WHERE manager_id = ?1")
                .bind(manager_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count > 0)
    }

    /// Inserts an outlet (seeding and tests).
    pub async fn insert(&self, outlet: &Outlet) -> DbResult<()> {
        debug!(id = %outlet.id, name = %outlet.name, "Inserting outlet");

        sqlx::query(
            "INSERT INTO outlets (id, manager_id, name, login_id, is_active, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&outlet.id)
        .bind(&outlet.manager_id)
        .bind(&outlet.name)
        .bind(&outlet.login_id)
        .bind(outlet.is_active)
        .bind(outlet.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;

    fn outlet(id: &str, manager: &str, name: &str, active: bool) -> Outlet {
        Outlet {
            id: id.to_string(),
            manager_id: manager.to_string(),
            name: name.to_string(),
            login_id: Some(format!("L-{id}")),
            is_active: active,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_ownership_lookup() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.outlets();

        repo.insert(&outlet("o1", "m1", "Jalan Ipoh", true)).await.unwrap();
        repo.insert(&outlet("o2", "m2", "Puchong", true)).await.unwrap();
        repo.insert(&outlet("o3", "m1", "Closed Branch", false)).await.unwrap();

        // Own active outlet resolves
        assert!(repo.get_active_for_manager("o1", "m1").await.unwrap().is_some());
        // Someone else's outlet does not
        assert!(repo.get_active_for_manager("o2", "m1").await.unwrap().is_none());
        // Inactive outlet does not
        assert!(repo.get_active_for_manager("o3", "m1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_manager_exists() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.outlets();

        assert!(!repo.manager_exists("m1").await.unwrap());
        repo.insert(&outlet("o1", "m1", "Jalan Ipoh", true)).await.unwrap();
        assert!(repo.manager_exists("m1").await.unwrap());
    }
}
