//! # Buildings API
//!
//! ## Endpoints
//!
//! - `POST /api/v1/buildings`: create building
//! - `GET /api/v1/buildings`: list buildings
//! - `GET /api/v1/buildings/:id`: get building
//! - `PUT /api/v1/buildings/:id`: update building
//! - `DELETE /api/v1/buildings/:id`: delete building (409 while occupied)

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use secunda_core::{Building, BuildingId, BuildingPatch, NewBuilding};

use super::PaginationParams;
use crate::error::AppError;
use crate::extractors::{extract_json, extract_query};
use crate::state::AppState;

/// Request to create a building.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBuildingRequest {
    /// Street address, 1 to 255 characters.
    pub address: String,
    /// Decimal degrees in [-90, 90].
    pub latitude: f64,
    /// Decimal degrees in [-180, 180].
    pub longitude: f64,
}

/// Request to update a building. Omitted fields are left unchanged.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBuildingRequest {
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BuildingResponse {
    pub id: i64,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Building> for BuildingResponse {
    fn from(b: Building) -> Self {
        Self {
            id: b.id.get(),
            address: b.address,
            latitude: b.latitude,
            longitude: b.longitude,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/buildings", get(list_buildings).post(create_building))
        .route(
            "/buildings/:id",
            get(get_building)
                .put(update_building)
                .delete(delete_building),
        )
}

/// POST /api/v1/buildings: Create a building.
#[utoipa::path(
    post,
    path = "/api/v1/buildings",
    request_body = CreateBuildingRequest,
    responses(
        (status = 201, description = "Building created", body = BuildingResponse),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "buildings"
)]
pub(crate) async fn create_building(
    State(state): State<AppState>,
    body: Result<Json<CreateBuildingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BuildingResponse>), AppError> {
    let req = extract_json(body)?;
    let building = state
        .buildings
        .create(NewBuilding {
            address: req.address,
            latitude: req.latitude,
            longitude: req.longitude,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(building.into())))
}

/// GET /api/v1/buildings: List buildings by id.
#[utoipa::path(
    get,
    path = "/api/v1/buildings",
    params(PaginationParams),
    responses(
        (status = 200, description = "Page of buildings", body = Vec<BuildingResponse>),
    ),
    tag = "buildings"
)]
pub(crate) async fn list_buildings(
    State(state): State<AppState>,
    pagination: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Json<Vec<BuildingResponse>>, AppError> {
    let page = extract_query(pagination)?.page()?;
    let buildings = state.buildings.list(page).await?;
    Ok(Json(buildings.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/buildings/:id: Get one building.
#[utoipa::path(
    get,
    path = "/api/v1/buildings/{id}",
    params(("id" = i64, Path, description = "Building ID")),
    responses(
        (status = 200, description = "Building found", body = BuildingResponse),
        (status = 404, description = "Building not found", body = crate::error::ErrorBody),
    ),
    tag = "buildings"
)]
pub(crate) async fn get_building(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<BuildingResponse>, AppError> {
    let building = state.buildings.get(BuildingId(id)).await?;
    Ok(Json(building.into()))
}

/// PUT /api/v1/buildings/:id: Update a building.
#[utoipa::path(
    put,
    path = "/api/v1/buildings/{id}",
    params(("id" = i64, Path, description = "Building ID")),
    request_body = UpdateBuildingRequest,
    responses(
        (status = 200, description = "Building updated", body = BuildingResponse),
        (status = 404, description = "Building not found", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "buildings"
)]
pub(crate) async fn update_building(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Result<Json<UpdateBuildingRequest>, JsonRejection>,
) -> Result<Json<BuildingResponse>, AppError> {
    let req = extract_json(body)?;
    let building = state
        .buildings
        .update(
            BuildingId(id),
            BuildingPatch {
                address: req.address,
                latitude: req.latitude,
                longitude: req.longitude,
            },
        )
        .await?;
    Ok(Json(building.into()))
}

/// DELETE /api/v1/buildings/:id: Delete an unoccupied building.
#[utoipa::path(
    delete,
    path = "/api/v1/buildings/{id}",
    params(("id" = i64, Path, description = "Building ID")),
    responses(
        (status = 204, description = "Building deleted"),
        (status = 404, description = "Building not found", body = crate::error::ErrorBody),
        (status = 409, description = "Organizations are still located in the building", body = crate::error::ErrorBody),
    ),
    tag = "buildings"
)]
pub(crate) async fn delete_building(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.buildings.delete(BuildingId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
