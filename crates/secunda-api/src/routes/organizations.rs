//! # Organizations API
//!
//! Organization CRUD plus the four lookups. Every lookup returns
//! organizations ordered by id and is paginated with `offset`/`limit`.
//!
//! ## Endpoints
//!
//! - `POST /api/v1/organizations`: create organization
//! - `GET /api/v1/organizations/:id`: get organization with activity ids
//! - `PUT /api/v1/organizations/:id`: update organization
//! - `DELETE /api/v1/organizations/:id`: delete organization
//! - `GET /api/v1/organizations/search`: by activity name, subtree included
//! - `POST /api/v1/organizations/filter`: by optional predicates
//! - `GET /api/v1/organizations/nearby/radius`: within a great-circle radius
//! - `GET /api/v1/organizations/nearby/square`: inside a lat/lon rectangle

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use secunda_core::{
    ActivityId, BoundingBox, BuildingId, NewOrganization, Organization, OrganizationDetails,
    OrganizationFilter, OrganizationId, OrganizationPatch,
};

use super::PaginationParams;
use crate::error::AppError;
use crate::extractors::{extract_json, extract_query};
use crate::state::AppState;

// ── Request/Response DTOs ───────────────────────────────────────────

/// Request to create an organization.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrganizationRequest {
    /// Display name, 1 to 255 characters.
    pub name: String,
    /// Building the organization is located in. Must exist.
    pub building_id: i64,
    #[serde(default)]
    pub phones: Vec<String>,
    /// Activities to tag the organization with. Duplicates are ignored.
    #[serde(default)]
    pub activity_ids: Vec<i64>,
}

/// Request to update an organization. Omitted fields are left unchanged.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrganizationRequest {
    pub name: Option<String>,
    pub building_id: Option<i64>,
    pub phones: Option<Vec<String>>,
    /// Replaces the whole activity set when present.
    pub activity_ids: Option<Vec<i64>>,
}

/// Optional organization predicates. Omitted predicates match everything.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct FilterOrganizationsRequest {
    pub organization_id: Option<i64>,
    /// Case-insensitive substring of the organization name.
    pub organization_name: Option<String>,
    pub building_id: Option<i64>,
    /// Case-insensitive substring of any tagged activity's name.
    pub activity_name: Option<String>,
}

impl From<FilterOrganizationsRequest> for OrganizationFilter {
    fn from(req: FilterOrganizationsRequest) -> Self {
        Self {
            organization_id: req.organization_id.map(OrganizationId),
            organization_name: req.organization_name,
            building_id: req.building_id.map(BuildingId),
            activity_name: req.activity_name,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Activity name, matched exactly but case-insensitively. Organizations
    /// tagged with any descendant activity are included.
    pub activity_name: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RadiusParams {
    pub center_lat: f64,
    pub center_lon: f64,
    /// Radius in meters.
    pub radius: f64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BoxParams {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

/// An organization as returned by list and lookup endpoints.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrganizationResponse {
    pub id: i64,
    pub name: String,
    pub building_id: i64,
    pub phones: Vec<String>,
}

impl From<Organization> for OrganizationResponse {
    fn from(o: Organization) -> Self {
        Self {
            id: o.id.get(),
            name: o.name,
            building_id: o.building_id.get(),
            phones: o.phones,
        }
    }
}

/// A single organization together with its activity ids.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrganizationDetailResponse {
    pub id: i64,
    pub name: String,
    pub building_id: i64,
    pub phones: Vec<String>,
    pub activity_ids: Vec<i64>,
}

impl From<OrganizationDetails> for OrganizationDetailResponse {
    fn from(d: OrganizationDetails) -> Self {
        let OrganizationDetails {
            organization,
            activity_ids,
        } = d;
        Self {
            id: organization.id.get(),
            name: organization.name,
            building_id: organization.building_id.get(),
            phones: organization.phones,
            activity_ids: activity_ids.into_iter().map(ActivityId::get).collect(),
        }
    }
}

fn into_responses(organizations: Vec<Organization>) -> Json<Vec<OrganizationResponse>> {
    Json(organizations.into_iter().map(Into::into).collect())
}

// ── Router ──────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/organizations", post(create_organization))
        .route("/organizations/search", get(search_organizations))
        .route("/organizations/filter", post(filter_organizations))
        .route("/organizations/nearby/radius", get(nearby_radius))
        .route("/organizations/nearby/square", get(nearby_square))
        .route(
            "/organizations/:id",
            get(get_organization)
                .put(update_organization)
                .delete(delete_organization),
        )
}

// ── CRUD ────────────────────────────────────────────────────────────

/// POST /api/v1/organizations: Create an organization.
#[utoipa::path(
    post,
    path = "/api/v1/organizations",
    request_body = CreateOrganizationRequest,
    responses(
        (status = 201, description = "Organization created", body = OrganizationDetailResponse),
        (status = 404, description = "Building or activity not found", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "organizations"
)]
pub(crate) async fn create_organization(
    State(state): State<AppState>,
    body: Result<Json<CreateOrganizationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrganizationDetailResponse>), AppError> {
    let req = extract_json(body)?;
    let details = state
        .organizations
        .create(NewOrganization {
            name: req.name,
            building_id: BuildingId(req.building_id),
            phones: req.phones,
            activity_ids: req.activity_ids.into_iter().map(ActivityId).collect(),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(details.into())))
}

/// GET /api/v1/organizations/:id: Get one organization.
#[utoipa::path(
    get,
    path = "/api/v1/organizations/{id}",
    params(("id" = i64, Path, description = "Organization ID")),
    responses(
        (status = 200, description = "Organization found", body = OrganizationDetailResponse),
        (status = 404, description = "Organization not found", body = crate::error::ErrorBody),
    ),
    tag = "organizations"
)]
pub(crate) async fn get_organization(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<OrganizationDetailResponse>, AppError> {
    let details = state.organizations.get(OrganizationId(id)).await?;
    Ok(Json(details.into()))
}

/// PUT /api/v1/organizations/:id: Update an organization.
#[utoipa::path(
    put,
    path = "/api/v1/organizations/{id}",
    params(("id" = i64, Path, description = "Organization ID")),
    request_body = UpdateOrganizationRequest,
    responses(
        (status = 200, description = "Organization updated", body = OrganizationDetailResponse),
        (status = 404, description = "Organization, building or activity not found", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "organizations"
)]
pub(crate) async fn update_organization(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Result<Json<UpdateOrganizationRequest>, JsonRejection>,
) -> Result<Json<OrganizationDetailResponse>, AppError> {
    let req = extract_json(body)?;
    let details = state
        .organizations
        .update(
            OrganizationId(id),
            OrganizationPatch {
                name: req.name,
                building_id: req.building_id.map(BuildingId),
                phones: req.phones,
                activity_ids: req
                    .activity_ids
                    .map(|ids| ids.into_iter().map(ActivityId).collect()),
            },
        )
        .await?;
    Ok(Json(details.into()))
}

/// DELETE /api/v1/organizations/:id: Delete an organization.
#[utoipa::path(
    delete,
    path = "/api/v1/organizations/{id}",
    params(("id" = i64, Path, description = "Organization ID")),
    responses(
        (status = 204, description = "Organization deleted"),
        (status = 404, description = "Organization not found", body = crate::error::ErrorBody),
    ),
    tag = "organizations"
)]
pub(crate) async fn delete_organization(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.organizations.delete(OrganizationId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Lookups ─────────────────────────────────────────────────────────

/// GET /api/v1/organizations/search: Organizations tagged with the named
/// activity or any of its descendants.
#[utoipa::path(
    get,
    path = "/api/v1/organizations/search",
    params(SearchParams, PaginationParams),
    responses(
        (status = 200, description = "Matching organizations", body = Vec<OrganizationResponse>),
        (status = 400, description = "Missing or malformed query", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "organizations"
)]
pub(crate) async fn search_organizations(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
    pagination: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Json<Vec<OrganizationResponse>>, AppError> {
    let params = extract_query(params)?;
    let page = extract_query(pagination)?.page()?;
    let organizations = state
        .organizations
        .search_by_activity_name(&params.activity_name, page)
        .await?;
    Ok(into_responses(organizations))
}

/// POST /api/v1/organizations/filter: Organizations matching every given
/// predicate. An empty body lists all organizations.
#[utoipa::path(
    post,
    path = "/api/v1/organizations/filter",
    params(PaginationParams),
    request_body = FilterOrganizationsRequest,
    responses(
        (status = 200, description = "Matching organizations", body = Vec<OrganizationResponse>),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "organizations"
)]
pub(crate) async fn filter_organizations(
    State(state): State<AppState>,
    pagination: Result<Query<PaginationParams>, QueryRejection>,
    body: Result<Json<FilterOrganizationsRequest>, JsonRejection>,
) -> Result<Json<Vec<OrganizationResponse>>, AppError> {
    let page = extract_query(pagination)?.page()?;
    let filter = OrganizationFilter::from(extract_json(body)?);
    let organizations = state.organizations.filter(&filter, page).await?;
    Ok(into_responses(organizations))
}

/// GET /api/v1/organizations/nearby/radius: Organizations within `radius`
/// meters of the center.
#[utoipa::path(
    get,
    path = "/api/v1/organizations/nearby/radius",
    params(RadiusParams, PaginationParams),
    responses(
        (status = 200, description = "Organizations within the radius", body = Vec<OrganizationResponse>),
        (status = 400, description = "Missing or malformed query", body = crate::error::ErrorBody),
        (status = 422, description = "Coordinates or radius out of range", body = crate::error::ErrorBody),
    ),
    tag = "organizations"
)]
pub(crate) async fn nearby_radius(
    State(state): State<AppState>,
    params: Result<Query<RadiusParams>, QueryRejection>,
    pagination: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Json<Vec<OrganizationResponse>>, AppError> {
    let params = extract_query(params)?;
    let page = extract_query(pagination)?.page()?;
    let organizations = state
        .organizations
        .nearby_radius(params.center_lat, params.center_lon, params.radius, page)
        .await?;
    Ok(into_responses(organizations))
}

/// GET /api/v1/organizations/nearby/square: Organizations inside the
/// rectangle, bounds included.
#[utoipa::path(
    get,
    path = "/api/v1/organizations/nearby/square",
    params(BoxParams, PaginationParams),
    responses(
        (status = 200, description = "Organizations inside the rectangle", body = Vec<OrganizationResponse>),
        (status = 400, description = "Missing or malformed query", body = crate::error::ErrorBody),
        (status = 422, description = "Bounds not ordered", body = crate::error::ErrorBody),
    ),
    tag = "organizations"
)]
pub(crate) async fn nearby_square(
    State(state): State<AppState>,
    params: Result<Query<BoxParams>, QueryRejection>,
    pagination: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Json<Vec<OrganizationResponse>>, AppError> {
    let params = extract_query(params)?;
    let page = extract_query(pagination)?.page()?;
    let bbox = BoundingBox::new(
        params.lat_min,
        params.lat_max,
        params.lon_min,
        params.lon_max,
    )?;
    let organizations = state.organizations.nearby_box(bbox, page).await?;
    Ok(into_responses(organizations))
}
