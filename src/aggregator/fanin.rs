//! Fan-in over the source catalog.
//!
//! Every source is queried concurrently and the batch is awaited as a whole.
//! A failed source contributes no rows and is reported back instead of
//! aborting the load.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use metrics::counter;
use tracing::{debug, warn};

use crate::models::NormalizedNotification;
use crate::query::QueryClient;

use super::catalog::SourceSpec;
use super::feed::SourceFailure;
use super::normalize::{PriorityPolicy, RowContext};

/// Normalized rows in catalog order, plus the sources that failed.
#[derive(Debug, Default)]
pub struct FanInOutcome {
    pub notifications: Vec<NormalizedNotification>,
    pub failed: Vec<SourceFailure>,
}

pub async fn fetch_sources(
    client: &dyn QueryClient,
    catalog: &[SourceSpec],
    policy: &PriorityPolicy,
    reference_time: DateTime<Utc>,
) -> FanInOutcome {
    let fetches = catalog
        .iter()
        .map(|spec| async move { (spec, client.select(&spec.query).await) });

    let mut outcome = FanInOutcome::default();
    for (spec, result) in join_all(fetches).await {
        match result {
            Ok(rows) => {
                debug!(source = spec.name, rows = rows.len(), "fetched notification source");
                let ctx = RowContext {
                    kind: spec.kind,
                    category: spec.category,
                    policy,
                    reference_time,
                };
                outcome
                    .notifications
                    .extend(rows.iter().map(|row| (spec.normalizer)(row, &ctx)));
            }
            Err(err) => {
                warn!(
                    source = spec.name,
                    table = spec.query.table,
                    error = %err,
                    "notification source failed; continuing without it"
                );
                counter!("notification_source_failures_total", "source" => spec.name)
                    .increment(1);
                outcome.failed.push(SourceFailure {
                    source: spec.name.to_string(),
                    kind: spec.kind,
                    error: err.to_string(),
                });
            }
        }
    }

    outcome
}
