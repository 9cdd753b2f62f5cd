use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header::ORIGIN},
    middleware::Next,
    response::Response,
};

use crate::{errors::HttpError, state::HttpState};

pub const BOARD_TOKEN_HEADER: &str = "x-board-token";

/// Rejects browser requests from non-loopback origins and any request
/// without the run's access token.
pub async fn require_access_token(
    State(state): State<HttpState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, HttpError> {
    if let Some(origin) = req.headers().get(ORIGIN) {
        let origin = origin.to_str().map_err(|_| {
            HttpError::new(
                StatusCode::BAD_REQUEST,
                "invalid Origin header",
                Some("invalid_origin".to_string()),
            )
        })?;
        if !is_loopback_origin(origin) {
            tracing::warn!(origin, "rejected request from foreign origin");
            return Err(HttpError::new(
                StatusCode::FORBIDDEN,
                "invalid origin",
                Some("invalid_origin".to_string()),
            ));
        }
    }

    let token = req
        .headers()
        .get(BOARD_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());
    if token != Some(state.access_token.as_str()) {
        return Err(HttpError::new(
            StatusCode::UNAUTHORIZED,
            "missing or invalid board token",
            Some("token_invalid".to_string()),
        ));
    }

    Ok(next.run(req).await)
}

pub(crate) fn is_loopback_origin(origin: &str) -> bool {
    let Some((scheme, rest)) = origin.split_once("://") else {
        return false;
    };
    if scheme != "http" && scheme != "https" {
        return false;
    }
    ["127.0.0.1:", "localhost:", "[::1]:"]
        .iter()
        .any(|host| rest.starts_with(host))
}
