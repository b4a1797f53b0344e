//! # Notification Inbox Handlers
//!
//! Every call rebuilds the viewer's feed; mutating calls then apply their
//! operation to that feed and return what is left.

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::aggregator::{CategoryGroup, FeedSummary, NotificationFeed, SourceFailure};
use crate::auth::CurrentViewer;
use crate::error::ApiError;
use crate::models::NormalizedNotification;
use crate::server::AppState;

/// Feed plus its presentation grouping
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    /// Newest first
    pub notifications: Vec<NormalizedNotification>,
    pub summary: FeedSummary,
    /// Sources that could not be fetched during this load
    pub failed_sources: Vec<SourceFailure>,
    /// Notifications grouped by category, empty categories omitted
    pub groups: Vec<CategoryGroup>,
}

impl From<NotificationFeed> for FeedResponse {
    fn from(feed: NotificationFeed) -> Self {
        let groups = feed.groups();
        Self {
            notifications: feed.notifications,
            summary: feed.summary,
            failed_sources: feed.failed_sources,
            groups,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkAllReadResponse {
    /// Number of support notifications marked read
    #[schema(example = 3)]
    pub updated: usize,
    pub feed: FeedResponse,
}

/// Load the viewer's notification feed
#[utoipa::path(
    get,
    path = "/notifications",
    security(("bearer_auth" = [])),
    params(crate::auth::ViewerHeaders),
    responses(
        (status = 200, description = "Feed loaded; failed sources are listed, not fatal", body = FeedResponse),
        (status = 400, description = "Missing or invalid viewer headers", body = ApiError, example = json!({
            "code": "VALIDATION_FAILED",
            "message": "Invalid viewer role",
            "details": { "X-Viewer-Role": "Unknown role 'guest'; expected super_admin, admin, staff or support" },
            "trace_id": "corr-12345678"
        })),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 503, description = "Exclusion store unavailable", body = ApiError, example = json!({
            "code": "NOTIFICATIONS_UNAVAILABLE",
            "message": "Failed to load notifications",
            "retry_after": 5,
            "trace_id": "corr-55555555"
        }))
    ),
    tag = "notifications"
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
) -> Result<Json<FeedResponse>, ApiError> {
    let feed = state.aggregator.load(&viewer).await?;
    Ok(Json(feed.into()))
}

/// Mark one notification read and hide it from this viewer
#[utoipa::path(
    post,
    path = "/notifications/{id}/read",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Notification id"),
        crate::auth::ViewerHeaders
    ),
    responses(
        (status = 200, description = "Notification marked read; remaining feed returned", body = FeedResponse),
        (status = 404, description = "Notification not in the viewer's feed", body = ApiError),
        (status = 502, description = "Persisting the read flag failed; nothing was hidden", body = ApiError, example = json!({
            "code": "MUTATION_FAILED",
            "message": "failed to mark notification as read",
            "trace_id": "corr-44444444"
        })),
        (status = 503, description = "Exclusion store unavailable", body = ApiError)
    ),
    tag = "notifications"
)]
pub async fn mark_read(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Path(id): Path<String>,
) -> Result<Json<FeedResponse>, ApiError> {
    let mut feed = state.aggregator.load(&viewer).await?;
    state.aggregator.mark_read(&viewer, &mut feed, &id).await?;
    Ok(Json(feed.into()))
}

/// Mark every unread support notification read
#[utoipa::path(
    post,
    path = "/notifications/read-all",
    security(("bearer_auth" = [])),
    params(crate::auth::ViewerHeaders),
    responses(
        (status = 200, description = "All unread support notifications marked read", body = MarkAllReadResponse),
        (status = 502, description = "At least one update failed; successful ones are hidden", body = ApiError, example = json!({
            "code": "MUTATION_FAILED",
            "message": "failed to mark 1 of 3 notifications as read",
            "trace_id": "corr-44444444"
        })),
        (status = 503, description = "Exclusion store unavailable", body = ApiError)
    ),
    tag = "notifications"
)]
pub async fn mark_all_read(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
) -> Result<Json<MarkAllReadResponse>, ApiError> {
    let mut feed = state.aggregator.load(&viewer).await?;
    let updated = state.aggregator.mark_all_read(&viewer, &mut feed).await?;
    Ok(Json(MarkAllReadResponse {
        updated,
        feed: feed.into(),
    }))
}

/// Delete a notification (support rows) or hide it for this viewer (all others)
#[utoipa::path(
    delete,
    path = "/notifications/{id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Notification id"),
        crate::auth::ViewerHeaders
    ),
    responses(
        (status = 200, description = "Notification removed; remaining feed returned", body = FeedResponse),
        (status = 404, description = "Notification not in the viewer's feed", body = ApiError),
        (status = 502, description = "Deleting the support row failed; nothing was hidden", body = ApiError),
        (status = 503, description = "Exclusion store unavailable", body = ApiError)
    ),
    tag = "notifications"
)]
pub async fn delete_notification(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Path(id): Path<String>,
) -> Result<Json<FeedResponse>, ApiError> {
    let mut feed = state.aggregator.load(&viewer).await?;
    state.aggregator.delete(&viewer, &mut feed, &id).await?;
    Ok(Json(feed.into()))
}
