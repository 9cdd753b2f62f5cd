use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};

use app_api::{DayRequest, EmptyRequest};

use crate::{errors::HttpError, state::HttpState};

pub async fn dashboard(
    State(state): State<HttpState>,
    Json(_): Json<EmptyRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = app_api::dashboard(&state.context).await?;
    Ok(Json(response))
}

pub async fn refresh(
    State(state): State<HttpState>,
    Json(_): Json<EmptyRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = app_api::refresh(&state.context).await?;
    if let Some(warning) = response.warning.as_deref() {
        tracing::warn!(warning, "manual refresh produced a degraded board");
    }
    Ok(Json(response))
}

pub async fn day(
    State(state): State<HttpState>,
    Json(req): Json<DayRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = app_api::day(&state.context, req).await?;
    Ok(Json(response))
}

pub async fn settings_get(
    State(state): State<HttpState>,
    Json(_): Json<EmptyRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = app_api::settings_get(&state.context)?;
    Ok(Json(response))
}

pub async fn health() -> impl IntoResponse {
    Json(app_api::ok())
}

pub async fn not_found() -> HttpError {
    HttpError::new(
        StatusCode::NOT_FOUND,
        "not found",
        Some("not_found".to_string()),
    )
}
