//! # Activity Tree API
//!
//! The activity taxonomy is at most three levels deep. Creating a node
//! under a depth-3 parent, or moving a subtree so that any node would end
//! up deeper than that, is rejected with 400.
//!
//! ## Endpoints
//!
//! - `POST /api/v1/activities`: create activity
//! - `GET /api/v1/activities`: list activities
//! - `GET /api/v1/activities/:id`: get activity
//! - `PUT /api/v1/activities/:id`: rename / reparent activity
//! - `DELETE /api/v1/activities/:id`: delete activity and its subtree

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use secunda_core::{Activity, ActivityId, ActivityPatch, NewActivity};

use super::PaginationParams;
use crate::error::AppError;
use crate::extractors::{extract_json, extract_query};
use crate::state::AppState;

// ── Request/Response DTOs ───────────────────────────────────────────

/// Request to create an activity.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateActivityRequest {
    /// Display name, 1 to 128 characters.
    pub name: String,
    /// Parent activity. Omit to create a root.
    pub parent_id: Option<i64>,
}

/// Request to update an activity. Omitted fields are left unchanged.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateActivityRequest {
    pub name: Option<String>,
    /// New parent. A root cannot be turned back into a child of nothing.
    pub parent_id: Option<i64>,
}

/// An activity node.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActivityResponse {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
}

impl From<Activity> for ActivityResponse {
    fn from(a: Activity) -> Self {
        Self {
            id: a.id.get(),
            name: a.name,
            parent_id: a.parent_id.map(ActivityId::get),
        }
    }
}

// ── Router ──────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/activities", get(list_activities).post(create_activity))
        .route(
            "/activities/:id",
            get(get_activity)
                .put(update_activity)
                .delete(delete_activity),
        )
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /api/v1/activities: Create an activity.
#[utoipa::path(
    post,
    path = "/api/v1/activities",
    request_body = CreateActivityRequest,
    responses(
        (status = 201, description = "Activity created", body = ActivityResponse),
        (status = 400, description = "Nesting depth exceeded", body = crate::error::ErrorBody),
        (status = 404, description = "Parent not found", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "activities"
)]
pub(crate) async fn create_activity(
    State(state): State<AppState>,
    body: Result<Json<CreateActivityRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ActivityResponse>), AppError> {
    let req = extract_json(body)?;
    let activity = state
        .activities
        .create(NewActivity {
            name: req.name,
            parent_id: req.parent_id.map(ActivityId),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(activity.into())))
}

/// GET /api/v1/activities: List activities by id.
#[utoipa::path(
    get,
    path = "/api/v1/activities",
    params(PaginationParams),
    responses(
        (status = 200, description = "Page of activities", body = Vec<ActivityResponse>),
    ),
    tag = "activities"
)]
pub(crate) async fn list_activities(
    State(state): State<AppState>,
    pagination: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Json<Vec<ActivityResponse>>, AppError> {
    let page = extract_query(pagination)?.page()?;
    let activities = state.activities.list(page).await?;
    Ok(Json(activities.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/activities/:id: Get one activity.
#[utoipa::path(
    get,
    path = "/api/v1/activities/{id}",
    params(("id" = i64, Path, description = "Activity ID")),
    responses(
        (status = 200, description = "Activity found", body = ActivityResponse),
        (status = 404, description = "Activity not found", body = crate::error::ErrorBody),
    ),
    tag = "activities"
)]
pub(crate) async fn get_activity(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ActivityResponse>, AppError> {
    let activity = state.activities.get(ActivityId(id)).await?;
    Ok(Json(activity.into()))
}

/// PUT /api/v1/activities/:id: Rename and/or reparent an activity.
#[utoipa::path(
    put,
    path = "/api/v1/activities/{id}",
    params(("id" = i64, Path, description = "Activity ID")),
    request_body = UpdateActivityRequest,
    responses(
        (status = 200, description = "Activity updated", body = ActivityResponse),
        (status = 400, description = "Self-parent or nesting depth exceeded", body = crate::error::ErrorBody),
        (status = 404, description = "Activity or parent not found", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "activities"
)]
pub(crate) async fn update_activity(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Result<Json<UpdateActivityRequest>, JsonRejection>,
) -> Result<Json<ActivityResponse>, AppError> {
    let req = extract_json(body)?;
    let activity = state
        .activities
        .update(
            ActivityId(id),
            ActivityPatch {
                name: req.name,
                parent_id: req.parent_id.map(ActivityId),
            },
        )
        .await?;
    Ok(Json(activity.into()))
}

/// DELETE /api/v1/activities/:id: Delete an activity, its descendants,
/// and their organization links.
#[utoipa::path(
    delete,
    path = "/api/v1/activities/{id}",
    params(("id" = i64, Path, description = "Activity ID")),
    responses(
        (status = 204, description = "Activity deleted"),
        (status = 404, description = "Activity not found", body = crate::error::ErrorBody),
    ),
    tag = "activities"
)]
pub(crate) async fn delete_activity(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.activities.delete(ActivityId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
