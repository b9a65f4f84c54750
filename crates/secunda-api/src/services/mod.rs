//! # Directory Services
//!
//! One small stateless service per entity. Each public method is one unit
//! of work:
//!
//! 1. validate the request fields,
//! 2. open a repository (one transaction) with [`Database::begin`],
//! 3. run reads, referential checks and writes,
//! 4. commit, or return the error and let the dropped repository roll back.
//!
//! Read-only methods never commit.
//!
//! [`Database::begin`]: crate::db::Database::begin

pub mod activities;
pub mod buildings;
pub mod organizations;

pub use activities::ActivityService;
pub use buildings::BuildingService;
pub use organizations::OrganizationService;
