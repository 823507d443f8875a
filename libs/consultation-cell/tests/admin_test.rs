use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use consultation_cell::consultation_routes;
use shared_config::AppConfig;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig};

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn admin_request(config: &AppConfig, method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", JwtTestUtils::admin_bearer(config));

    match body {
        Some(payload) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn mount_appointment(server: &MockServer, id: &str, type_id: &str, status: &str) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(id, type_id, "2030-06-03T10:00:00", status)
        ])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_confirm_once_then_conflict() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(server.uri()).to_arc();
    let appointment_id = Uuid::new_v4().to_string();
    let type_id = Uuid::new_v4().to_string();

    mount_appointment(&server, &appointment_id, &type_id, "scheduled").await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/consultation_types"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::consultation_type_response(&type_id, "Tarot", 80.0, true)
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "eq.scheduled"))
        .and(body_partial_json(json!({ "status": "confirmed" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(&appointment_id, &type_id, "2030-06-03T10:00:00", "confirmed")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let app = consultation_routes(Arc::clone(&config));
    let uri = format!("/admin/appointments/{}/confirm", appointment_id);

    let response = app.clone().oneshot(admin_request(&config, "POST", &uri, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], json!("confirmed"));

    // The store now reports the confirmed row.
    server.reset().await;
    mount_appointment(&server, &appointment_id, &type_id, "confirmed").await;

    let response = app.oneshot(admin_request(&config, "POST", &uri, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_terminal_status_cannot_be_left() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(server.uri()).to_arc();
    let appointment_id = Uuid::new_v4().to_string();
    mount_appointment(&server, &appointment_id, &Uuid::new_v4().to_string(), "completed").await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let response = consultation_routes(Arc::clone(&config))
        .oneshot(admin_request(
            &config,
            "PUT",
            &format!("/appointments/{}/status", appointment_id),
            Some(json!({ "status": "confirmed" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_status_update_lost_race_is_conflict() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(server.uri()).to_arc();
    let appointment_id = Uuid::new_v4().to_string();
    mount_appointment(&server, &appointment_id, &Uuid::new_v4().to_string(), "confirmed").await;

    // Someone else moved the row first: the conditional PATCH matches nothing.
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "eq.confirmed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let response = consultation_routes(Arc::clone(&config))
        .oneshot(admin_request(
            &config,
            "PUT",
            &format!("/appointments/{}/status", appointment_id),
            Some(json!({ "status": "completed", "admin_note": "done" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unknown_appointment_is_not_found() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(server.uri()).to_arc();
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let response = consultation_routes(Arc::clone(&config))
        .oneshot(admin_request(&config, "GET", &format!("/admin/appointments/{}", Uuid::new_v4()), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_agenda_requires_admin() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(server.uri()).to_arc();
    let app = consultation_routes(Arc::clone(&config));

    let missing = app
        .clone()
        .oneshot(Request::builder().uri("/agenda/2030-06-03").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let client = app
        .oneshot(
            Request::builder()
                .uri("/agenda/2030-06-03")
                .header("Authorization", JwtTestUtils::client_bearer(&config))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(client.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_agenda_lists_every_status_in_time_order() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(server.uri()).to_arc();
    let type_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("order", "scheduled_at.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(&Uuid::new_v4().to_string(), &type_id, "2030-06-03T09:00:00", "canceled"),
            MockSupabaseResponses::appointment_response(&Uuid::new_v4().to_string(), &type_id, "2030-06-03T10:00:00", "confirmed"),
        ])))
        .mount(&server)
        .await;

    let response = consultation_routes(Arc::clone(&config))
        .oneshot(admin_request(&config, "GET", "/agenda/2030-06-03", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let statuses: Vec<&str> = body.as_array().unwrap().iter().map(|a| a["status"].as_str().unwrap()).collect();
    assert_eq!(statuses, vec!["canceled", "confirmed"]);
}

#[tokio::test]
async fn test_public_catalog_lists_active_types() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/consultation_types"))
        .and(query_param("active", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::consultation_type_response(&Uuid::new_v4().to_string(), "Tarot", 80.0, true)
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let response = consultation_routes(TestConfig::with_supabase_url(server.uri()).to_arc())
        .oneshot(Request::builder().uri("/consultation-types").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await[0]["name"], json!("Tarot"));
}

#[tokio::test]
async fn test_create_consultation_type_validates_price() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(server.uri()).to_arc();

    let response = consultation_routes(Arc::clone(&config))
        .oneshot(admin_request(
            &config,
            "POST",
            "/admin/consultation-types",
            Some(json!({ "name": "Tarot", "price": 0.0, "duration_minutes": 60 })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_referenced_type_is_conflict() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(server.uri()).to_arc();
    let type_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("consultation_type_id", format!("eq.{}", type_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": Uuid::new_v4() }])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/consultation_types"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let response = consultation_routes(Arc::clone(&config))
        .oneshot(admin_request(&config, "DELETE", &format!("/admin/consultation-types/{}", type_id), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_seed_fills_empty_tables() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(server.uri()).to_arc();

    Mock::given(method("GET"))
        .and(path("/rest/v1/consultation_types"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/availability_templates"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/consultation_types"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::consultation_type_response(&Uuid::new_v4().to_string(), "Tarot", 80.0, true)
        ])))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/availability_templates"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::template_response(0, "09:00:00", "18:00:00", 60)
        ])))
        .expect(5)
        .mount(&server)
        .await;

    let response = consultation_routes(Arc::clone(&config))
        .oneshot(admin_request(&config, "POST", "/admin/consultation-types/seed", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["consultation_types_created"], json!(3));
    assert_eq!(body["templates_created"], json!(5));
}

#[tokio::test]
async fn test_template_with_inverted_window_rejected() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(server.uri()).to_arc();

    let response = consultation_routes(Arc::clone(&config))
        .oneshot(admin_request(
            &config,
            "POST",
            "/admin/availability-templates",
            Some(json!({
                "day_of_week": 0,
                "start_time": "12:00:00",
                "end_time": "09:00:00",
                "interval_minutes": 60
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_template_with_seconds_rejected() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(server.uri()).to_arc();

    let response = consultation_routes(Arc::clone(&config))
        .oneshot(admin_request(
            &config,
            "POST",
            "/admin/availability-templates",
            Some(json!({
                "day_of_week": 0,
                "start_time": "09:00:30",
                "end_time": "12:00:00",
                "interval_minutes": 60
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(server.received_requests().await.unwrap().is_empty());
}
