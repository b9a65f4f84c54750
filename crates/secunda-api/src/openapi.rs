//! # OpenAPI Document Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI document,
//! served unauthenticated at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI document for the directory API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Secunda Directory API",
        version = "0.1.0",
        description = "Organizations, the buildings they are located in, and the activity tree they are classified by."
    ),
    paths(
        // Activities
        crate::routes::activities::create_activity,
        crate::routes::activities::list_activities,
        crate::routes::activities::get_activity,
        crate::routes::activities::update_activity,
        crate::routes::activities::delete_activity,
        // Buildings
        crate::routes::buildings::create_building,
        crate::routes::buildings::list_buildings,
        crate::routes::buildings::get_building,
        crate::routes::buildings::update_building,
        crate::routes::buildings::delete_building,
        // Organizations
        crate::routes::organizations::create_organization,
        crate::routes::organizations::get_organization,
        crate::routes::organizations::update_organization,
        crate::routes::organizations::delete_organization,
        crate::routes::organizations::search_organizations,
        crate::routes::organizations::filter_organizations,
        crate::routes::organizations::nearby_radius,
        crate::routes::organizations::nearby_square,
    ),
    components(schemas(
        // Error types
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        // Activity DTOs
        crate::routes::activities::CreateActivityRequest,
        crate::routes::activities::UpdateActivityRequest,
        crate::routes::activities::ActivityResponse,
        // Building DTOs
        crate::routes::buildings::CreateBuildingRequest,
        crate::routes::buildings::UpdateBuildingRequest,
        crate::routes::buildings::BuildingResponse,
        // Organization DTOs
        crate::routes::organizations::CreateOrganizationRequest,
        crate::routes::organizations::UpdateOrganizationRequest,
        crate::routes::organizations::FilterOrganizationsRequest,
        crate::routes::organizations::OrganizationResponse,
        crate::routes::organizations::OrganizationDetailResponse,
    )),
    tags(
        (name = "activities", description = "Activity tree, at most three levels deep"),
        (name = "buildings", description = "Buildings and their coordinates"),
        (name = "organizations", description = "Organizations and directory lookups"),
    )
)]
pub struct ApiDoc;

/// Serves the OpenAPI JSON document at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI document.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
