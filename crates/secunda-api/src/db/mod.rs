//! # Directory Storage
//!
//! Two interchangeable backends behind the [`Repository`] trait:
//!
//! - **Postgres** via SQLx. One [`Repository`] is one database transaction.
//!   Migrations under `migrations/` are embedded and applied on connect.
//! - **Memory**, used when `DATABASE_URL` is unset and in tests. It enforces
//!   the same referential rules as the SQL schema. Its transactions run one
//!   at a time.
//!
//! A repository is obtained with [`Database::begin`]. Writes become visible
//! only after [`Repository::commit`]; dropping an uncommitted repository
//! discards its writes.
//!
//! ## Referential rules
//!
//! | Relation | On delete of the parent row |
//! |---|---|
//! | activity -> parent activity | cascade |
//! | organization -> building | restrict (`ConstraintViolation`) |
//! | organization_activity -> either side | cascade |

pub mod activities;
pub mod buildings;
pub mod memory;
pub mod organizations;
pub mod postgres;

use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

use secunda_core::{
    Activity, ActivityGraph, ActivityId, BoundingBox, Building, BuildingId, DirectoryError,
    LocatedOrganization, NewActivity, NewBuilding, NewOrganization, Organization,
    OrganizationFilter, OrganizationId, Page,
};

pub use memory::MemoryDatabase;
pub use postgres::PgRepository;

/// Transaction-scoped access to the directory tables.
///
/// Listing methods return rows ordered by primary key ascending.
#[async_trait]
pub trait Repository: ActivityGraph + Send {
    // -- Buildings --

    async fn insert_building(&mut self, new: &NewBuilding) -> Result<Building, DirectoryError>;
    async fn get_building(&mut self, id: BuildingId) -> Result<Option<Building>, DirectoryError>;
    async fn list_buildings(&mut self, page: Page) -> Result<Vec<Building>, DirectoryError>;
    async fn update_building(&mut self, building: &Building) -> Result<(), DirectoryError>;
    /// Returns `false` when no such building exists. Fails with
    /// `ConstraintViolation` while organizations still reference it.
    async fn delete_building(&mut self, id: BuildingId) -> Result<bool, DirectoryError>;

    // -- Activities --

    async fn insert_activity(&mut self, new: &NewActivity) -> Result<Activity, DirectoryError>;
    async fn get_activity(&mut self, id: ActivityId) -> Result<Option<Activity>, DirectoryError>;
    async fn list_activities(&mut self, page: Page) -> Result<Vec<Activity>, DirectoryError>;
    async fn update_activity(&mut self, activity: &Activity) -> Result<(), DirectoryError>;
    /// Deletes the activity, its descendants, and their organization links.
    async fn delete_activity(&mut self, id: ActivityId) -> Result<bool, DirectoryError>;
    /// Ids of activities whose name equals `name`, ignoring case.
    async fn activity_ids_named(&mut self, name: &str) -> Result<Vec<ActivityId>, DirectoryError>;

    // -- Organizations --

    /// Inserts the organization row only; `new.activity_ids` is ignored.
    async fn insert_organization(
        &mut self,
        new: &NewOrganization,
    ) -> Result<Organization, DirectoryError>;
    async fn get_organization(
        &mut self,
        id: OrganizationId,
    ) -> Result<Option<Organization>, DirectoryError>;
    async fn update_organization(&mut self, org: &Organization) -> Result<(), DirectoryError>;
    async fn delete_organization(&mut self, id: OrganizationId) -> Result<bool, DirectoryError>;
    async fn organization_activity_ids(
        &mut self,
        id: OrganizationId,
    ) -> Result<Vec<ActivityId>, DirectoryError>;
    /// Replace the organization's association set with `activity_ids`.
    async fn set_organization_activities(
        &mut self,
        id: OrganizationId,
        activity_ids: &BTreeSet<ActivityId>,
    ) -> Result<(), DirectoryError>;
    async fn filter_organizations(
        &mut self,
        filter: &OrganizationFilter,
        page: Page,
    ) -> Result<Vec<Organization>, DirectoryError>;
    /// Distinct organizations linked to any of `activity_ids`.
    async fn organizations_with_activities(
        &mut self,
        activity_ids: &BTreeSet<ActivityId>,
        page: Page,
    ) -> Result<Vec<Organization>, DirectoryError>;
    /// Organizations whose building lies inside `bbox`, bounds included.
    /// `None` returns every match.
    async fn organizations_in_box(
        &mut self,
        bbox: &BoundingBox,
        page: Option<Page>,
    ) -> Result<Vec<LocatedOrganization>, DirectoryError>;

    /// Make this repository's writes visible. Further calls fail.
    async fn commit(&mut self) -> Result<(), DirectoryError>;
}

/// Handle to the configured backend. Cheap to clone.
#[derive(Clone, Debug)]
pub enum Database {
    Postgres(PgPool),
    Memory(MemoryDatabase),
}

impl Database {
    /// Fresh, empty in-memory store.
    pub fn in_memory() -> Self {
        Self::Memory(MemoryDatabase::default())
    }

    /// Open a repository scoped to a new transaction.
    pub async fn begin(&self) -> Result<Box<dyn Repository>, DirectoryError> {
        match self {
            Self::Postgres(pool) => {
                let tx = pool.begin().await.map_err(store_error)?;
                Ok(Box::new(PgRepository::new(tx)))
            }
            Self::Memory(memory) => Ok(Box::new(memory.begin().await)),
        }
    }

    /// Readiness check: the store can serve a trivial query.
    pub async fn ping(&self) -> Result<(), DirectoryError> {
        match self {
            Self::Postgres(pool) => {
                sqlx::query("SELECT 1")
                    .execute(pool)
                    .await
                    .map_err(store_error)?;
                Ok(())
            }
            Self::Memory(_) => Ok(()),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory(_) => "memory",
        }
    }
}

/// Connect to the configured store.
///
/// Without a URL the in-memory store is used. With one, the pool is opened
/// and embedded migrations are applied; either failure is returned.
pub async fn connect(url: Option<&str>, max_connections: u32) -> Result<Database, sqlx::Error> {
    let Some(url) = url else {
        tracing::warn!(
            "DATABASE_URL not set; using the in-memory store. Data will not survive restarts."
        );
        return Ok(Database::in_memory());
    };

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(max_connections.min(2))
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(url)
        .await?;
    tracing::info!(max_connections, "connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("database migrations applied");

    Ok(Database::Postgres(pool))
}

/// Map a SQLx failure onto the domain error.
///
/// Foreign-key violations are caller-correctable and become
/// `ConstraintViolation`; everything else is logged and hidden behind
/// `Unexpected`.
pub fn store_error(err: sqlx::Error) -> DirectoryError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_foreign_key_violation() {
            return DirectoryError::ConstraintViolation(db_err.message().to_string());
        }
    }
    tracing::error!(error = %err, "store operation failed");
    DirectoryError::Unexpected(err.to_string())
}
