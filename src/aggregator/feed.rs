//! Feed assembly: ordering, grouping and counts.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Category, NormalizedNotification, SourceKind, notification::ALL_CATEGORIES};

/// A source whose fetch failed during a load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SourceFailure {
    /// Catalog name of the source
    #[schema(example = "security")]
    pub source: String,
    pub kind: SourceKind,
    pub error: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CategoryCounts {
    pub total: usize,
    pub unread: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedSummary {
    pub total: usize,
    pub unread: usize,
    /// Counts per category; categories with no notifications are omitted
    #[schema(value_type = Object)]
    pub by_category: BTreeMap<Category, CategoryCounts>,
}

impl FeedSummary {
    pub fn count(notifications: &[NormalizedNotification]) -> Self {
        let mut summary = FeedSummary::default();
        for n in notifications {
            let entry = summary.by_category.entry(n.category).or_default();
            entry.total += 1;
            summary.total += 1;
            if !n.is_read {
                entry.unread += 1;
                summary.unread += 1;
            }
        }
        summary
    }
}

/// Notifications of one category, in feed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoryGroup {
    pub category: Category,
    pub notifications: Vec<NormalizedNotification>,
}

/// Result of one load, kept current by the read and delete operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFeed {
    /// Newest first
    pub notifications: Vec<NormalizedNotification>,
    pub summary: FeedSummary,
    pub failed_sources: Vec<SourceFailure>,
}

impl NotificationFeed {
    /// Sort newest first (stable, so fetch order breaks ties) and count.
    pub fn assemble(
        mut notifications: Vec<NormalizedNotification>,
        failed_sources: Vec<SourceFailure>,
    ) -> Self {
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let summary = FeedSummary::count(&notifications);
        Self {
            notifications,
            summary,
            failed_sources,
        }
    }

    pub fn find(&self, id: &str) -> Option<&NormalizedNotification> {
        self.notifications.iter().find(|n| n.id == id)
    }

    /// Remove every notification whose id is in `ids` and recount.
    pub fn remove_ids(&mut self, ids: &HashSet<String>) {
        self.notifications.retain(|n| !ids.contains(&n.id));
        self.summary = FeedSummary::count(&self.notifications);
    }

    /// Group by category in registry order, skipping empty categories.
    pub fn groups(&self) -> Vec<CategoryGroup> {
        ALL_CATEGORIES
            .iter()
            .filter_map(|category| {
                let notifications: Vec<_> = self
                    .notifications
                    .iter()
                    .filter(|n| n.category == *category)
                    .cloned()
                    .collect();
                (!notifications.is_empty()).then(|| CategoryGroup {
                    category: *category,
                    notifications,
                })
            })
            .collect()
    }
}
