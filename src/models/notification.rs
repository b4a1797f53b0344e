//! # Normalized Notification Model
//!
//! The common shape every source row is projected into, plus the enums that
//! classify it. Notifications are synthesized on every load and are never
//! stored in this shape.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

/// Origin family a notification was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Support,
    System,
    Security,
    User,
    Admin,
}

impl SourceKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            SourceKind::Support => "support",
            SourceKind::System => "system",
            SourceKind::Security => "security",
            SourceKind::User => "user",
            SourceKind::Admin => "admin",
        }
    }

    /// Whether read/delete state for this kind is persisted in the datastore.
    pub const fn is_persistable(self) -> bool {
        matches!(self, SourceKind::Support)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Business-domain tag used for grouping and role filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Partners,
    Drivers,
    Fleet,
    Documents,
    Payments,
    Bookings,
    Claims,
    Support,
    System,
    Security,
}

/// Complete registry of categories, in presentation order.
pub const ALL_CATEGORIES: &[Category] = &[
    Category::Partners,
    Category::Drivers,
    Category::Fleet,
    Category::Documents,
    Category::Payments,
    Category::Bookings,
    Category::Claims,
    Category::Support,
    Category::System,
    Category::Security,
];

impl Category {
    pub const fn as_str(self) -> &'static str {
        match self {
            Category::Partners => "partners",
            Category::Drivers => "drivers",
            Category::Fleet => "fleet",
            Category::Documents => "documents",
            Category::Payments => "payments",
            Category::Bookings => "bookings",
            Category::Claims => "claims",
            Category::Support => "support",
            Category::System => "system",
            Category::Security => "security",
        }
    }

    /// Parse a category label, accepting singular forms used by older rows.
    pub fn parse(value: &str) -> Option<Category> {
        let normalized = value.trim().to_lowercase();
        ALL_CATEGORIES
            .iter()
            .copied()
            .find(|c| c.as_str() == normalized || c.as_str().trim_end_matches('s') == normalized)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification priority, ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub const fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }

    pub fn parse(value: &str) -> Option<Priority> {
        match value.trim().to_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            "critical" => Some(Priority::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source row projected into the common inbox shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedNotification {
    /// Primary key of the origin row
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: String,
    pub source_kind: SourceKind,
    pub category: Category,
    pub title: String,
    pub message: String,
    pub priority: Priority,
    /// Only support notifications can be read without being hidden
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Origin row, unmodified
    #[schema(value_type = Object)]
    pub origin_payload: JsonValue,
}

impl NormalizedNotification {
    /// Identity scoped to the source kind, used to drop rows fetched twice.
    pub fn identity(&self) -> String {
        format!("{}:{}", self.source_kind, self.id)
    }
}
