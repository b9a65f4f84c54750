//! # Integration Tests for secunda-api
//!
//! Drives the full router over the in-memory store: the activity tree
//! bound, the organization lookups, referential rules, authentication,
//! and the unauthenticated health checks.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use secunda_api::db::Database;
use secunda_api::state::{AppConfig, AppState};

/// Helper: build the test app with auth disabled.
fn test_app() -> axum::Router {
    secunda_api::app(AppState::new())
}

/// Helper: build the test app with auth enabled.
fn test_app_with_auth(key: &str) -> axum::Router {
    let config = AppConfig {
        api_key: Some(key.to_string()),
        ..AppConfig::default()
    };
    secunda_api::app(AppState::with_config(config, Database::in_memory()))
}

/// Helper: read response body as string.
async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Helper: read response body as JSON.
async fn body_json(response: axum::http::Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create(app: &axum::Router, uri: &str, body: Value) -> i64 {
    let (status, created) = send(app, "POST", uri, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "POST {uri}: {created}");
    created["id"].as_i64().unwrap()
}

fn names(list: &Value) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|o| o["name"].as_str().unwrap().to_string())
        .collect()
}

// -- Health Checks & OpenAPI --------------------------------------------------

#[tokio::test]
async fn test_liveness_check() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/health/liveness")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_check() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/health/readiness")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

#[tokio::test]
async fn test_health_and_openapi_skip_auth() {
    let app = test_app_with_auth("secret");
    for uri in ["/health/liveness", "/health/readiness", "/openapi.json"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let doc = body_json(response).await;
    assert!(doc["paths"]["/api/v1/organizations/search"].is_object());
    assert!(doc["paths"]["/api/v1/organizations/nearby/radius"].is_object());
}

// -- Authentication -----------------------------------------------------------

#[tokio::test]
async fn test_api_requires_key_when_configured() {
    let app = test_app_with_auth("secret");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/buildings")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let err = body_json(response).await;
    assert_eq!(err["error"]["code"], "UNAUTHORIZED");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/buildings")
                .header("Authorization", "Bearer secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// -- Activity tree ------------------------------------------------------------

#[tokio::test]
async fn test_fourth_level_activity_is_rejected() {
    let app = test_app();
    let l1 = create(&app, "/api/v1/activities", json!({"name": "L1"})).await;
    let l2 = create(&app, "/api/v1/activities", json!({"name": "L2", "parent_id": l1})).await;
    let l3 = create(&app, "/api/v1/activities", json!({"name": "L3", "parent_id": l2})).await;

    let (status, err) = send(
        &app,
        "POST",
        "/api/v1/activities",
        Some(json!({"name": "L4", "parent_id": l3})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"]["code"], "BAD_REQUEST");
    assert!(err["error"]["message"]
        .as_str()
        .unwrap()
        .contains(&l3.to_string()));
}

#[tokio::test]
async fn test_activity_cannot_parent_itself() {
    let app = test_app();
    let root = create(&app, "/api/v1/activities", json!({"name": "Root"})).await;
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/v1/activities/{root}"),
        Some(json!({"parent_id": root})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_parent_is_not_found() {
    let app = test_app();
    let (status, err) = send(
        &app,
        "POST",
        "/api/v1/activities",
        Some(json!({"name": "Orphan", "parent_id": 999})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_deleting_activity_removes_subtree_and_links() {
    let app = test_app();
    let building = create(
        &app,
        "/api/v1/buildings",
        json!({"address": "ул. Ленина 1", "latitude": 55.7558, "longitude": 37.6176}),
    )
    .await;
    let food = create(&app, "/api/v1/activities", json!({"name": "Еда"})).await;
    let meat = create(
        &app,
        "/api/v1/activities",
        json!({"name": "Мясная продукция", "parent_id": food}),
    )
    .await;
    let shop = create(
        &app,
        "/api/v1/organizations",
        json!({"name": "Мясной рай", "building_id": building, "activity_ids": [meat]}),
    )
    .await;

    let (status, _) = send(&app, "DELETE", &format!("/api/v1/activities/{food}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &format!("/api/v1/activities/{meat}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, org) = send(&app, "GET", &format!("/api/v1/organizations/{shop}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(org["activity_ids"], json!([]));
}

// -- Buildings ----------------------------------------------------------------

#[tokio::test]
async fn test_occupied_building_cannot_be_deleted() {
    let app = test_app();
    let building = create(
        &app,
        "/api/v1/buildings",
        json!({"address": "ул. Тверская 10", "latitude": 55.7570, "longitude": 37.6150}),
    )
    .await;
    let org = create(
        &app,
        "/api/v1/organizations",
        json!({"name": "Молочка+", "building_id": building}),
    )
    .await;

    let (status, err) = send(&app, "DELETE", &format!("/api/v1/buildings/{building}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"]["code"], "CONFLICT");

    let (status, _) = send(&app, "DELETE", &format!("/api/v1/organizations/{org}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "DELETE", &format!("/api/v1/buildings/{building}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_out_of_range_latitude_is_a_validation_error() {
    let app = test_app();
    let (status, err) = send(
        &app,
        "POST",
        "/api/v1/buildings",
        Some(json!({"address": "Nowhere", "latitude": 91.0, "longitude": 0.0})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/buildings")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let err = body_json(response).await;
    assert_eq!(err["error"]["code"], "BAD_REQUEST");
}

// -- Organization lookups -----------------------------------------------------

/// Two buildings about 200 m apart, a two-level food tree, two shops.
async fn food_fixture(app: &axum::Router) -> (i64, i64) {
    let center = create(
        app,
        "/api/v1/buildings",
        json!({"address": "г. Москва, ул. Ленина 1", "latitude": 55.7558, "longitude": 37.6176}),
    )
    .await;
    let near = create(
        app,
        "/api/v1/buildings",
        json!({"address": "г. Москва, ул. Тверская 10", "latitude": 55.7570, "longitude": 37.6150}),
    )
    .await;
    let food = create(app, "/api/v1/activities", json!({"name": "Еда"})).await;
    let meat = create(
        app,
        "/api/v1/activities",
        json!({"name": "Мясная продукция", "parent_id": food}),
    )
    .await;
    let cars = create(app, "/api/v1/activities", json!({"name": "Автомобили"})).await;

    create(
        app,
        "/api/v1/organizations",
        json!({
            "name": "Мясной рай",
            "building_id": center,
            "phones": ["3-333-333"],
            "activity_ids": [meat],
        }),
    )
    .await;
    create(
        app,
        "/api/v1/organizations",
        json!({"name": "АвтоГруз", "building_id": near, "activity_ids": [cars]}),
    )
    .await;
    (center, near)
}

#[tokio::test]
async fn test_search_by_activity_includes_descendants() {
    let app = test_app();
    food_fixture(&app).await;

    let (status, found) = send(
        &app,
        "GET",
        "/api/v1/organizations/search?activity_name=%D0%B5%D0%B4%D0%B0",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&found), vec!["Мясной рай"]);
    assert_eq!(found[0]["phones"], json!(["3-333-333"]));
}

#[tokio::test]
async fn test_search_for_unknown_activity_is_empty() {
    let app = test_app();
    food_fixture(&app).await;
    let (status, found) = send(
        &app,
        "GET",
        "/api/v1/organizations/search?activity_name=nothing",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found, json!([]));
}

#[tokio::test]
async fn test_search_without_activity_name_is_bad_request() {
    let app = test_app();
    let (status, _) = send(&app, "GET", "/api/v1/organizations/search", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_pages_matches_by_id() {
    let app = test_app();
    let building = create(
        &app,
        "/api/v1/buildings",
        json!({"address": "г. Москва, ул. Ленина 1", "latitude": 55.7558, "longitude": 37.6176}),
    )
    .await;
    let food = create(&app, "/api/v1/activities", json!({"name": "Еда"})).await;
    let meat = create(
        &app,
        "/api/v1/activities",
        json!({"name": "Мясная продукция", "parent_id": food}),
    )
    .await;
    let milk = create(
        &app,
        "/api/v1/activities",
        json!({"name": "Молочная продукция", "parent_id": food}),
    )
    .await;
    for (name, activity) in [("Мясной рай", meat), ("Молочный двор", milk)] {
        create(
            &app,
            "/api/v1/organizations",
            json!({"name": name, "building_id": building, "activity_ids": [activity]}),
        )
        .await;
    }

    let search = "/api/v1/organizations/search?activity_name=%D0%B5%D0%B4%D0%B0";
    let (status, first) = send(&app, "GET", &format!("{search}&limit=1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&first), vec!["Мясной рай"]);

    let (status, second) = send(&app, "GET", &format!("{search}&offset=1&limit=1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&second), vec!["Молочный двор"]);
}

#[tokio::test]
async fn test_radius_search_is_monotone() {
    let app = test_app();
    food_fixture(&app).await;

    let (status, wide) = send(
        &app,
        "GET",
        "/api/v1/organizations/nearby/radius?center_lat=55.7558&center_lon=37.6176&radius=300",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&wide), vec!["Мясной рай", "АвтоГруз"]);

    let (_, narrow) = send(
        &app,
        "GET",
        "/api/v1/organizations/nearby/radius?center_lat=55.7558&center_lon=37.6176&radius=50",
        None,
    )
    .await;
    assert_eq!(names(&narrow), vec!["Мясной рай"]);
}

#[tokio::test]
async fn test_radius_search_pages_by_id() {
    let app = test_app();
    food_fixture(&app).await;

    let (status, paged) = send(
        &app,
        "GET",
        "/api/v1/organizations/nearby/radius?center_lat=55.7558&center_lon=37.6176&radius=300&offset=1&limit=1",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&paged), vec!["АвтоГруз"]);
}

#[tokio::test]
async fn test_negative_radius_is_a_validation_error() {
    let app = test_app();
    let (status, _) = send(
        &app,
        "GET",
        "/api/v1/organizations/nearby/radius?center_lat=55.7558&center_lon=37.6176&radius=-1",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_box_search_includes_bounds() {
    let app = test_app();
    food_fixture(&app).await;

    let (status, found) = send(
        &app,
        "GET",
        "/api/v1/organizations/nearby/square?lat_min=55.7558&lat_max=55.7558&lon_min=37.6176&lon_max=37.6176",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&found), vec!["Мясной рай"]);

    let (status, _) = send(
        &app,
        "GET",
        "/api/v1/organizations/nearby/square?lat_min=56&lat_max=55&lon_min=37&lon_max=38",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_box_search_pages_by_id() {
    let app = test_app();
    food_fixture(&app).await;

    let square = "/api/v1/organizations/nearby/square?lat_min=55.75&lat_max=55.76&lon_min=37.61&lon_max=37.62";
    let (status, all) = send(&app, "GET", square, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&all), vec!["Мясной рай", "АвтоГруз"]);

    let (status, paged) = send(&app, "GET", &format!("{square}&offset=1&limit=1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&paged), vec!["АвтоГруз"]);
}

#[tokio::test]
async fn test_empty_filter_lists_every_organization() {
    let app = test_app();
    food_fixture(&app).await;

    let (status, all) = send(&app, "POST", "/api/v1/organizations/filter", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&all), vec!["Мясной рай", "АвтоГруз"]);

    let (_, paged) = send(
        &app,
        "POST",
        "/api/v1/organizations/filter?offset=1&limit=1",
        Some(json!({})),
    )
    .await;
    assert_eq!(names(&paged), vec!["АвтоГруз"]);
}

#[tokio::test]
async fn test_filter_combines_predicates() {
    let app = test_app();
    let (center, _) = food_fixture(&app).await;

    let (_, by_activity) = send(
        &app,
        "POST",
        "/api/v1/organizations/filter",
        Some(json!({"activity_name": "мясн"})),
    )
    .await;
    assert_eq!(names(&by_activity), vec!["Мясной рай"]);

    let (_, none) = send(
        &app,
        "POST",
        "/api/v1/organizations/filter",
        Some(json!({"building_id": center, "organization_name": "авто"})),
    )
    .await;
    assert_eq!(none, json!([]));
}

#[tokio::test]
async fn test_oversized_limit_is_a_validation_error() {
    let app = test_app();
    let (status, _) = send(&app, "GET", "/api/v1/buildings?limit=5000", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

// -- Organization CRUD --------------------------------------------------------

#[tokio::test]
async fn test_organization_with_unknown_building_is_not_found() {
    let app = test_app();
    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/organizations",
        Some(json!({"name": "Ghost", "building_id": 42})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_organization_update_replaces_activity_set() {
    let app = test_app();
    let building = create(
        &app,
        "/api/v1/buildings",
        json!({"address": "пр-т Мира 50", "latitude": 55.789, "longitude": 37.632}),
    )
    .await;
    let trucks = create(&app, "/api/v1/activities", json!({"name": "Грузовые"})).await;
    let cars = create(&app, "/api/v1/activities", json!({"name": "Легковые"})).await;
    let org = create(
        &app,
        "/api/v1/organizations",
        json!({"name": "АвтоГруз", "building_id": building, "activity_ids": [trucks, trucks]}),
    )
    .await;

    let (_, details) = send(&app, "GET", &format!("/api/v1/organizations/{org}"), None).await;
    assert_eq!(details["activity_ids"], json!([trucks]));

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/api/v1/organizations/{org}"),
        Some(json!({"activity_ids": [cars], "phones": ["+7-495-000-00-01"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["activity_ids"], json!([cars]));
    assert_eq!(updated["phones"], json!(["+7-495-000-00-01"]));
    assert_eq!(updated["name"], "АвтоГруз");
}
