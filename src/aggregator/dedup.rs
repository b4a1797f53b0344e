//! Deduplication passes. Both keep the first occurrence in fetch order.

use std::collections::HashSet;

use chrono::{DateTime, Timelike, Utc};

use crate::models::{Category, NormalizedNotification};

/// `(category, title, message, createdAt truncated to the second)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    category: Category,
    title: String,
    message: String,
    created_at: DateTime<Utc>,
}

impl Fingerprint {
    pub fn of(notification: &NormalizedNotification) -> Self {
        let created_at = notification
            .created_at
            .with_nanosecond(0)
            .unwrap_or(notification.created_at);
        Self {
            category: notification.category,
            title: notification.title.clone(),
            message: notification.message.clone(),
            created_at,
        }
    }
}

/// Drop rows whose `"{sourceKind}:{id}"` identity was already emitted, e.g. a
/// log line fetched by both the payment and transaction sources.
pub fn dedup_by_identity(notifications: Vec<NormalizedNotification>) -> Vec<NormalizedNotification> {
    let mut seen = HashSet::new();
    notifications
        .into_iter()
        .filter(|n| seen.insert(n.identity()))
        .collect()
}

/// Drop rows whose [`Fingerprint`] was already seen.
pub fn dedup_by_fingerprint(
    notifications: Vec<NormalizedNotification>,
) -> Vec<NormalizedNotification> {
    let mut seen = HashSet::new();
    notifications
        .into_iter()
        .filter(|n| seen.insert(Fingerprint::of(n)))
        .collect()
}
