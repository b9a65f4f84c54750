//! # API Route Modules
//!
//! Route modules for the directory API, all mounted under `/api/v1`:
//!
//! - `activities`: activity tree CRUD with nesting validation.
//! - `buildings`: building CRUD; delete is refused while organizations
//!   are located in the building.
//! - `organizations`: organization CRUD plus the four queries: filter,
//!   search by activity subtree, radius and box.

pub mod activities;
pub mod buildings;
pub mod organizations;

use axum::Router;
use serde::Deserialize;
use utoipa::IntoParams;

use secunda_core::filter::DEFAULT_PAGE_LIMIT;
use secunda_core::Page;

use crate::error::AppError;
use crate::state::AppState;

/// Pagination parameters shared by every list endpoint.
#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Number of items to skip (default: 0).
    pub offset: Option<u64>,
    /// Maximum number of items to return (default: 50, max: 1000).
    pub limit: Option<u32>,
}

impl PaginationParams {
    pub fn page(&self) -> Result<Page, AppError> {
        Ok(Page::new(
            self.offset.unwrap_or(0),
            self.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
        )?)
    }
}

/// All authenticated `/api/v1` routes, with paths relative to the prefix.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(activities::router())
        .merge(buildings::router())
        .merge(organizations::router())
}
