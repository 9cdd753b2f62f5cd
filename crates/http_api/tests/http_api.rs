use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use board_core::{Appointment, DayLabel, DayWindow, JobTags, TechnicianAssignment};
use chrono::Duration;
use fieldservice::{AppointmentBatch, FieldServiceApi, Result, ShiftBatch};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::util::ServiceExt;

use app_api::AppContext;
use board_app::{AppState, BoardConfig};
use http_api::{BOARD_TOKEN_HEADER, HttpState};

const TEST_TOKEN: &str = "testtoken";

const CONFIG: &str = r#"
[api]
tenant = "12345"
client_id = "cid"
client_secret = "top-secret"

[board]
timezone = "UTC"

[categories.L1_No_Op]
tag_id = 74799391
target = 3
"#;

/// One tagged appointment an hour into today's window.
struct OneAppointment;

#[async_trait]
impl FieldServiceApi for OneAppointment {
    async fn fetch_appointments(&self, window: &DayWindow) -> Result<AppointmentBatch> {
        let appointments = if window.label == DayLabel::Today {
            vec![Appointment {
                id: 1,
                job_id: 10,
                scheduled_start: window.start + Duration::hours(1),
                status: None,
                assigned_technician_id: None,
            }]
        } else {
            Vec::new()
        };
        Ok(AppointmentBatch {
            appointments,
            issues: Vec::new(),
        })
    }

    async fn fetch_jobs(&self, job_ids: &[i64]) -> Result<Vec<JobTags>> {
        Ok(job_ids
            .iter()
            .map(|id| JobTags {
                job_id: *id,
                tag_ids: BTreeSet::from([74799391]),
            })
            .collect())
    }

    async fn fetch_assignments(&self, _ids: &[i64]) -> Result<Vec<TechnicianAssignment>> {
        Ok(Vec::new())
    }

    async fn fetch_shifts(&self, _window: &DayWindow) -> Result<ShiftBatch> {
        Ok(ShiftBatch::default())
    }
}

fn build_app() -> axum::Router {
    let config = BoardConfig::from_toml_str(CONFIG).expect("config");
    let app_state = AppState::with_api(config, Arc::new(OneAppointment)).expect("state");
    let context = AppContext {
        app_state,
        config_path: None,
    };
    http_api::router(HttpState::new(context, TEST_TOKEN.to_string()))
}

fn api_request(uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&body).expect("json body")
}

#[tokio::test]
async fn api_rejects_missing_token() {
    let response = build_app()
        .oneshot(
            api_request("/api/dashboard")
                .body(Body::from("{}"))
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let payload = json_body(response).await;
    assert_eq!(payload["code"], "token_invalid");
}

#[tokio::test]
async fn api_rejects_foreign_origin() {
    let response = build_app()
        .oneshot(
            api_request("/api/dashboard")
                .header(header::ORIGIN, "https://evil.example")
                .header(BOARD_TOKEN_HEADER, TEST_TOKEN)
                .body(Body::from("{}"))
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let payload = json_body(response).await;
    assert_eq!(payload["code"], "invalid_origin");
}

#[tokio::test]
async fn dashboard_returns_three_day_cards() {
    let response = build_app()
        .oneshot(
            api_request("/api/dashboard")
                .header(header::ORIGIN, "http://127.0.0.1:3845")
                .header(BOARD_TOKEN_HEADER, TEST_TOKEN)
                .body(Body::from("{}"))
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = json_body(response).await;
    assert_eq!(payload["timezone"], "UTC");
    let days = payload["days"].as_array().expect("days");
    assert_eq!(days.len(), 3);
    assert_eq!(days[0]["label"], "today");
    assert_eq!(days[0]["title"], "Today");
    let metric = &days[0]["metrics"][0];
    assert_eq!(metric["category"], "L1_No_Op");
    assert_eq!(metric["target"], 3);
    assert!(payload.get("warning").is_none());
}

#[tokio::test]
async fn refresh_runs_a_pass() {
    let response = build_app()
        .oneshot(
            api_request("/api/refresh")
                .header(BOARD_TOKEN_HEADER, TEST_TOKEN)
                .body(Body::from("{}"))
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = json_body(response).await;
    let observed: u64 = payload["days"]
        .as_array()
        .expect("days")
        .iter()
        .map(|day| day["metrics"][0]["observed"].as_u64().expect("observed"))
        .sum();
    assert_eq!(observed, 1);
}

#[tokio::test]
async fn day_rejects_unknown_label() {
    let response = build_app()
        .oneshot(
            api_request("/api/day")
                .header(BOARD_TOKEN_HEADER, TEST_TOKEN)
                .body(Body::from(r#"{"label":"yesterday"}"#))
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = json_body(response).await;
    assert_eq!(payload["code"], "invalid_input");
}

#[tokio::test]
async fn settings_get_omits_secrets() {
    let response = build_app()
        .oneshot(
            api_request("/api/settings_get")
                .header(BOARD_TOKEN_HEADER, TEST_TOKEN)
                .body(Body::from("{}"))
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = json_body(response).await;
    assert_eq!(payload["tenant"], "12345");
    assert_eq!(payload["categories"][0]["tag_id"], 74799391);
    assert!(!payload.to_string().contains("top-secret"));
}

#[tokio::test]
async fn unknown_routes_are_json_404() {
    let response = build_app()
        .oneshot(
            Request::builder()
                .uri("/index.html")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = json_body(response).await;
    assert_eq!(payload["code"], "not_found");
}
