//! # Notification Aggregator
//!
//! Builds the operations inbox on every load by fanning in the source
//! catalog, normalizing, deduplicating, hiding what the viewer already
//! dismissed and filtering by role. Read and delete write back to
//! `support_notifications` where they can and otherwise only extend the
//! viewer's exclusion set.

pub mod catalog;
pub mod dedup;
pub mod fanin;
pub mod feed;
pub mod normalize;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use metrics::counter;
use serde_json::json;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::models::NormalizedNotification;
use crate::permissions::{ViewerRole, filter_for_role};
use crate::query::{Patch, QueryClient, QueryError, tables};
use crate::visibility::{self, DEFAULT_NAMESPACE, VisibilityError, VisibilityStore};

pub use catalog::{DEFAULT_ROW_LIMIT, SourceSpec, default_catalog};
pub use dedup::{Fingerprint, dedup_by_fingerprint, dedup_by_identity};
pub use fanin::{FanInOutcome, fetch_sources};
pub use feed::{CategoryCounts, CategoryGroup, FeedSummary, NotificationFeed, SourceFailure};
pub use normalize::PriorityPolicy;

#[derive(Debug, Error)]
pub enum AggregatorError {
    #[error("notification '{id}' is not in the current feed")]
    NotFound { id: String },
    #[error("{message}")]
    Mutation { message: String },
    #[error("notification visibility store failed: {0}")]
    Visibility(#[from] VisibilityError),
}

/// Who is looking at the inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    /// Stable id scoping the exclusion set
    pub id: String,
    pub role: ViewerRole,
}

impl Viewer {
    pub fn new(id: impl Into<String>, role: ViewerRole) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }
}

pub struct NotificationAggregator {
    client: Arc<dyn QueryClient>,
    visibility: Arc<dyn VisibilityStore>,
    catalog: Vec<SourceSpec>,
    policy: PriorityPolicy,
    namespace: String,
}

impl NotificationAggregator {
    /// Aggregator over the default catalog and priority policy.
    pub fn new(client: Arc<dyn QueryClient>, visibility: Arc<dyn VisibilityStore>) -> Self {
        Self {
            client,
            visibility,
            catalog: default_catalog(DEFAULT_ROW_LIMIT),
            policy: PriorityPolicy::default(),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    pub fn from_config(
        client: Arc<dyn QueryClient>,
        visibility: Arc<dyn VisibilityStore>,
        config: &AppConfig,
    ) -> Self {
        Self::new(client, visibility)
            .with_catalog(default_catalog(config.aggregator.source_row_limit))
            .with_policy(PriorityPolicy::from_config(&config.priority))
            .with_namespace(config.aggregator.visibility_namespace.clone())
    }

    pub fn with_catalog(mut self, catalog: Vec<SourceSpec>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_policy(mut self, policy: PriorityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn catalog(&self) -> &[SourceSpec] {
        &self.catalog
    }

    fn viewer_key(&self, viewer: &Viewer) -> String {
        visibility::viewer_key(&self.namespace, &viewer.id)
    }

    /// Build the viewer's feed.
    ///
    /// Source failures are tolerated and listed in `failed_sources`; only a
    /// failure to read the exclusion set fails the load.
    pub async fn load(&self, viewer: &Viewer) -> Result<NotificationFeed, AggregatorError> {
        let key = self.viewer_key(viewer);
        let reference_time = Utc::now();

        let (outcome, excluded) = tokio::join!(
            fetch_sources(
                self.client.as_ref(),
                &self.catalog,
                &self.policy,
                reference_time
            ),
            self.visibility.excluded_ids(&key),
        );

        let excluded = excluded.map_err(|err| {
            error!(viewer = %viewer.id, error = %err, "failed to read exclusion set");
            AggregatorError::Visibility(err)
        })?;

        let fetched = outcome.notifications.len();
        let unique = dedup_by_fingerprint(dedup_by_identity(outcome.notifications));
        let visible: Vec<_> = unique
            .into_iter()
            .filter(|n| !excluded.contains(&n.id))
            .collect();
        let permitted = filter_for_role(viewer.role, visible);
        let feed = NotificationFeed::assemble(permitted, outcome.failed);

        info!(
            viewer = %viewer.id,
            role = %viewer.role,
            fetched,
            surfaced = feed.summary.total,
            unread = feed.summary.unread,
            failed_sources = feed.failed_sources.len(),
            "loaded notification feed"
        );

        Ok(feed)
    }

    /// Mark one notification read and hide it.
    ///
    /// Support notifications are persisted first; if that write fails nothing
    /// is hidden.
    pub async fn mark_read(
        &self,
        viewer: &Viewer,
        feed: &mut NotificationFeed,
        notification_id: &str,
    ) -> Result<(), AggregatorError> {
        let target = Self::target(feed, notification_id)?;

        if target.source_kind.is_persistable() {
            self.client
                .update(tables::SUPPORT_NOTIFICATIONS, &read_patch(), &target.id)
                .await
                .map_err(|err| mutation_failed("mark notification as read", &target.id, err))?;
        }

        self.hide(viewer, feed, vec![target.id]).await
    }

    /// Mark every unread support notification read, one update each.
    ///
    /// Notifications whose update succeeded are hidden even when others fail;
    /// the caller only learns whether all of them succeeded.
    pub async fn mark_all_read(
        &self,
        viewer: &Viewer,
        feed: &mut NotificationFeed,
    ) -> Result<usize, AggregatorError> {
        let targets: Vec<String> = feed
            .notifications
            .iter()
            .filter(|n| !n.is_read && n.source_kind.is_persistable())
            .map(|n| n.id.clone())
            .collect();

        if targets.is_empty() {
            return Ok(0);
        }

        let patch = read_patch();
        let updates = targets.iter().map(|id| {
            let patch = &patch;
            async move {
                let result = self
                    .client
                    .update(tables::SUPPORT_NOTIFICATIONS, patch, id)
                    .await;
                (id, result)
            }
        });

        let mut succeeded = Vec::new();
        let mut failed = 0usize;
        for (id, result) in join_all(updates).await {
            match result {
                Ok(()) => succeeded.push(id.clone()),
                Err(err) => {
                    failed += 1;
                    warn!(notification_id = %id, error = %err, "failed to mark notification as read");
                }
            }
        }

        let updated = succeeded.len();
        if !succeeded.is_empty() {
            self.hide(viewer, feed, succeeded).await?;
        }

        if failed > 0 {
            counter!("notification_mutation_failures_total", "operation" => "mark_all_read")
                .increment(failed as u64);
            return Err(AggregatorError::Mutation {
                message: format!(
                    "failed to mark {} of {} notifications as read",
                    failed,
                    targets.len()
                ),
            });
        }

        Ok(updated)
    }

    /// Delete one notification: the row itself for support notifications,
    /// otherwise only the viewer's view of it.
    pub async fn delete(
        &self,
        viewer: &Viewer,
        feed: &mut NotificationFeed,
        notification_id: &str,
    ) -> Result<(), AggregatorError> {
        let target = Self::target(feed, notification_id)?;

        if target.source_kind.is_persistable() {
            self.client
                .delete(tables::SUPPORT_NOTIFICATIONS, &target.id)
                .await
                .map_err(|err| mutation_failed("delete notification", &target.id, err))?;
        }

        self.hide(viewer, feed, vec![target.id]).await
    }

    fn target(
        feed: &NotificationFeed,
        notification_id: &str,
    ) -> Result<NormalizedNotification, AggregatorError> {
        feed.find(notification_id)
            .cloned()
            .ok_or_else(|| AggregatorError::NotFound {
                id: notification_id.to_string(),
            })
    }

    /// Record `ids` in the exclusion set, then drop them from `feed`.
    async fn hide(
        &self,
        viewer: &Viewer,
        feed: &mut NotificationFeed,
        ids: Vec<String>,
    ) -> Result<(), AggregatorError> {
        self.visibility
            .exclude(&self.viewer_key(viewer), &ids)
            .await
            .map_err(|err| {
                error!(viewer = %viewer.id, error = %err, "failed to record exclusions");
                AggregatorError::Visibility(err)
            })?;

        feed.remove_ids(&ids.into_iter().collect::<HashSet<_>>());
        Ok(())
    }
}

fn read_patch() -> Patch {
    let mut patch = Patch::new();
    patch.insert("is_read".to_string(), json!(true));
    patch.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));
    patch
}

fn mutation_failed(action: &'static str, id: &str, err: QueryError) -> AggregatorError {
    warn!(notification_id = %id, error = %err, "failed to {}", action);
    counter!("notification_mutation_failures_total", "operation" => action).increment(1);
    AggregatorError::Mutation {
        message: format!("failed to {}", action),
    }
}
