//! # Authentication
//!
//! Operator bearer authentication plus the viewer headers that scope a
//! request to one inbox: `X-Viewer-Id` keys the exclusion set and
//! `X-Viewer-Role` selects the category whitelist.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use serde_json::json;
use subtle::ConstantTimeEq;
use utoipa::IntoParams;

use crate::aggregator::Viewer;
use crate::config::AppConfig;
use crate::error::{ApiError, unauthorized, validation_error};
use crate::permissions::ViewerRole;
use crate::server::AppState;

pub const VIEWER_ID_HEADER: &str = "X-Viewer-Id";
pub const VIEWER_ROLE_HEADER: &str = "X-Viewer-Role";

const MAX_VIEWER_ID_LEN: usize = 128;

/// Authenticated viewer, placed in request extensions by [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct CurrentViewer(pub Viewer);

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.config)
    }
}

/// Validates the operator bearer token and resolves the viewer headers.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let headers = request.headers();

    let token = extract_bearer_token(headers)?;
    validate_token(&config, token)?;

    let viewer = extract_viewer(headers)?;
    tracing::debug!(viewer = %viewer.id, role = %viewer.role, "authenticated operator request");

    request.extensions_mut().insert(CurrentViewer(viewer));

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| unauthorized(Some("Missing Authorization header")))?
        .to_str()
        .map_err(|_| unauthorized(Some("Invalid Authorization header")))?;

    header
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized(Some("Authorization header must use Bearer scheme")))
}

fn validate_token(config: &AppConfig, token: &str) -> Result<(), ApiError> {
    let is_valid = config
        .operator_tokens
        .iter()
        .any(|configured| ConstantTimeEq::ct_eq(token.as_bytes(), configured.as_bytes()).into());

    if is_valid {
        Ok(())
    } else {
        Err(unauthorized(Some("Invalid bearer token")))
    }
}

fn required_header<'h>(headers: &'h HeaderMap, name: &'static str) -> Result<&'h str, ApiError> {
    let value = headers
        .get(name)
        .ok_or_else(|| {
            validation_error(
                "Missing required header",
                json!({ name: "Required header is missing" }),
            )
        })?
        .to_str()
        .map_err(|_| {
            validation_error(
                "Invalid header",
                json!({ name: "Header must be valid UTF-8" }),
            )
        })?
        .trim();

    if value.is_empty() {
        return Err(validation_error(
            "Invalid header",
            json!({ name: "Header must not be empty" }),
        ));
    }
    Ok(value)
}

fn extract_viewer(headers: &HeaderMap) -> Result<Viewer, ApiError> {
    let id = required_header(headers, VIEWER_ID_HEADER)?;
    if id.len() > MAX_VIEWER_ID_LEN {
        return Err(validation_error(
            "Invalid viewer id",
            json!({ VIEWER_ID_HEADER: format!("Must be at most {} bytes", MAX_VIEWER_ID_LEN) }),
        ));
    }

    let raw_role = required_header(headers, VIEWER_ROLE_HEADER)?;
    let role = ViewerRole::parse(raw_role).ok_or_else(|| {
        validation_error(
            "Invalid viewer role",
            json!({
                VIEWER_ROLE_HEADER: format!(
                    "Unknown role '{}'; expected super_admin, admin, staff or support",
                    raw_role
                )
            }),
        )
    })?;

    Ok(Viewer::new(id, role))
}

/// OpenAPI header parameters identifying the viewer.
#[derive(Debug, IntoParams)]
#[into_params(parameter_in = Header)]
pub struct ViewerHeaders {
    /// Stable viewer identifier; scopes the set of hidden notifications
    #[param(rename = "X-Viewer-Id")]
    pub viewer_id: String,
    /// One of `super_admin`, `admin`, `staff`, `support`
    #[param(rename = "X-Viewer-Role")]
    pub viewer_role: String,
}

impl<S> FromRequestParts<S> for CurrentViewer
where
    S: Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentViewer>()
            .cloned()
            .ok_or_else(|| unauthorized(Some("Operator authentication required")))
    }
}
