//! # Server Configuration
//!
//! Router assembly, shared state and the OpenAPI document.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::trace::TraceLayer;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::aggregator::NotificationAggregator;
use crate::auth::auth_middleware;
use crate::config::{AppConfig, VisibilityBackend};
use crate::handlers::{self, notifications};
use crate::query::SeaOrmQueryClient;
use crate::telemetry::trace_context_middleware;
use crate::visibility::{DatabaseVisibilityStore, InMemoryVisibilityStore, VisibilityStore};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub aggregator: Arc<NotificationAggregator>,
}

impl AppState {
    /// Wire the aggregator to `db`, picking the configured visibility backend.
    pub fn new(config: Arc<AppConfig>, db: DatabaseConnection) -> Self {
        let visibility: Arc<dyn VisibilityStore> = match config.aggregator.visibility_backend {
            VisibilityBackend::Database => Arc::new(DatabaseVisibilityStore::new(db.clone())),
            VisibilityBackend::Memory => Arc::new(InMemoryVisibilityStore::new()),
        };
        let client = Arc::new(SeaOrmQueryClient::new(db.clone()));
        let aggregator = NotificationAggregator::from_config(client, visibility, &config);

        Self {
            config,
            db,
            aggregator: Arc::new(aggregator),
        }
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .route("/notifications/{id}/read", post(notifications::mark_read))
        .route("/notifications/{id}", delete(notifications::delete_notification))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state.config),
            auth_middleware,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .merge(protected)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_context_middleware))
}

/// Serve `state` on the configured address until Ctrl-C.
pub async fn run_server(state: AppState) -> anyhow::Result<()> {
    let addr = state
        .config
        .bind_addr()
        .context("invalid server address")?;
    let profile = state.config.profile.clone();
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(%addr, %profile, "notifications API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
    tracing::info!("shutdown signal received");
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::notifications::list_notifications,
        crate::handlers::notifications::mark_read,
        crate::handlers::notifications::mark_all_read,
        crate::handlers::notifications::delete_notification,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::handlers::HealthResponse,
            crate::handlers::notifications::FeedResponse,
            crate::handlers::notifications::MarkAllReadResponse,
            crate::models::NormalizedNotification,
            crate::models::Category,
            crate::models::Priority,
            crate::models::SourceKind,
            crate::aggregator::FeedSummary,
            crate::aggregator::CategoryCounts,
            crate::aggregator::CategoryGroup,
            crate::aggregator::SourceFailure,
            crate::error::ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "FleetOps Notifications API",
        description = "Aggregated operations inbox for the fleet admin dashboard",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
