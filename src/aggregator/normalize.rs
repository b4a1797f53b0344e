//! Row normalization.
//!
//! Each source has a normalizer that projects its loosely typed row into a
//! [`NormalizedNotification`]. Normalizers never fail: missing or malformed
//! fields fall back to fixed literals, the policy's default priority, or the
//! load's reference time.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};

use crate::config::PriorityConfig;
use crate::models::{Category, NormalizedNotification, Priority, SourceKind};

/// Fallback for absent free-text fields.
pub const UNKNOWN: &str = "Unknown";

/// Maps origin severity and level strings onto [`Priority`].
#[derive(Debug, Clone, PartialEq)]
pub struct PriorityPolicy {
    levels: BTreeMap<String, Priority>,
    severities: BTreeMap<String, Priority>,
    default: Priority,
}

const PARTNER_ESCALATIONS: &[&str] = &["reject", "suspend", "block"];

impl Default for PriorityPolicy {
    fn default() -> Self {
        let levels = [
            ("fatal", Priority::Critical),
            ("critical", Priority::Critical),
            ("error", Priority::Critical),
            ("warn", Priority::High),
            ("warning", Priority::High),
            ("notice", Priority::Low),
            ("info", Priority::Low),
            ("debug", Priority::Low),
            ("trace", Priority::Low),
        ];
        let severities = [
            ("critical", Priority::Critical),
            ("high", Priority::High),
            ("medium", Priority::Medium),
            ("moderate", Priority::Medium),
            ("low", Priority::Low),
            ("info", Priority::Low),
        ];

        Self {
            levels: levels
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            severities: severities
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            default: Priority::Medium,
        }
    }
}

impl PriorityPolicy {
    /// Built-in table with configured overrides applied on top.
    pub fn from_config(config: &PriorityConfig) -> Self {
        let mut policy = Self::default();
        policy.levels.extend(
            config
                .level_overrides
                .iter()
                .map(|(k, v)| (k.to_lowercase(), *v)),
        );
        policy.severities.extend(
            config
                .severity_overrides
                .iter()
                .map(|(k, v)| (k.to_lowercase(), *v)),
        );
        if let Some(default) = config.default {
            policy.default = default;
        }
        policy
    }

    pub fn default_priority(&self) -> Priority {
        self.default
    }

    /// Priority for a log `level` column.
    pub fn for_level(&self, level: Option<&str>) -> Priority {
        lookup(&self.levels, level).unwrap_or(self.default)
    }

    /// Priority for an alert `severity` column.
    pub fn for_severity(&self, severity: Option<&str>) -> Priority {
        lookup(&self.severities, severity).unwrap_or(self.default)
    }

    /// Priority for a support row's own `priority` label.
    pub fn for_support(&self, label: Option<&str>) -> Priority {
        match label.map(|l| l.trim().to_lowercase()) {
            Some(l) if l == "urgent" => Priority::Critical,
            Some(l) => Priority::parse(&l).unwrap_or(self.default),
            None => self.default,
        }
    }

    pub fn for_user_action(&self) -> Priority {
        Priority::Low
    }

    pub fn for_partner_action(&self, action: Option<&str>) -> Priority {
        let action = action.unwrap_or_default().to_lowercase();
        if PARTNER_ESCALATIONS.iter().any(|word| action.contains(word)) {
            Priority::High
        } else {
            Priority::Medium
        }
    }
}

fn lookup(table: &BTreeMap<String, Priority>, key: Option<&str>) -> Option<Priority> {
    key.map(|k| k.trim().to_lowercase())
        .and_then(|k| table.get(&k).copied())
}

/// Per-source inputs shared by every row of one fetch.
#[derive(Debug, Clone, Copy)]
pub struct RowContext<'a> {
    pub kind: SourceKind,
    pub category: Category,
    pub policy: &'a PriorityPolicy,
    pub reference_time: DateTime<Utc>,
}

/// Source-specific projection of one row.
pub type Normalizer = fn(&JsonValue, &RowContext<'_>) -> NormalizedNotification;

fn text<'r>(row: &'r JsonValue, field: &str) -> Option<&'r str> {
    row.get(field)
        .and_then(JsonValue::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// The row's own id, or `"{kind}-missing-{digest}"` derived from the row
/// content so id-less rows stay distinct and stable across loads.
fn id_of(row: &JsonValue, kind: SourceKind) -> String {
    match row.get("id") {
        Some(JsonValue::String(id)) if !id.is_empty() => id.clone(),
        Some(JsonValue::Number(id)) => id.to_string(),
        _ => {
            let digest = Sha256::digest(row.to_string().as_bytes());
            format!("{}-missing-{}", kind, &hex::encode(digest)[..16])
        }
    }
}

/// Parse RFC 3339, or a naive `YYYY-MM-DD HH:MM:SS[.f]` taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

fn timestamp(row: &JsonValue, field: &str) -> Option<DateTime<Utc>> {
    text(row, field).and_then(parse_timestamp)
}

/// `created_at`, falling back to the reference time; `updated_at`, falling
/// back to `created_at`.
fn timestamps(row: &JsonValue, ctx: &RowContext<'_>) -> (DateTime<Utc>, DateTime<Utc>) {
    let created_at = timestamp(row, "created_at").unwrap_or(ctx.reference_time);
    let updated_at = timestamp(row, "updated_at").unwrap_or(created_at);
    (created_at, updated_at)
}

fn humanize(value: &str) -> String {
    let spaced = value.replace(['_', '-'], " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

struct Draft {
    category: Category,
    title: String,
    message: String,
    priority: Priority,
    is_read: bool,
}

fn finish(row: &JsonValue, ctx: &RowContext<'_>, draft: Draft) -> NormalizedNotification {
    let (created_at, updated_at) = timestamps(row, ctx);
    NormalizedNotification {
        id: id_of(row, ctx.kind),
        source_kind: ctx.kind,
        category: draft.category,
        title: draft.title,
        message: draft.message,
        priority: draft.priority,
        is_read: draft.is_read,
        created_at,
        updated_at,
        origin_payload: row.clone(),
    }
}

/// `support_notifications`: the only kind with persisted read state.
pub fn support_notification(row: &JsonValue, ctx: &RowContext<'_>) -> NormalizedNotification {
    let draft = Draft {
        category: text(row, "category")
            .and_then(Category::parse)
            .unwrap_or(ctx.category),
        title: text(row, "title").unwrap_or(UNKNOWN).to_string(),
        message: text(row, "message").unwrap_or(UNKNOWN).to_string(),
        priority: ctx.policy.for_support(text(row, "priority")),
        is_read: row
            .get("is_read")
            .and_then(JsonValue::as_bool)
            .unwrap_or(false),
    };
    finish(row, ctx, draft)
}

/// `system_logs`, for both the generic and the message-tagged sources.
pub fn system_log(row: &JsonValue, ctx: &RowContext<'_>) -> NormalizedNotification {
    let level = text(row, "level");
    let title = match (level, text(row, "source")) {
        (Some(level), Some(source)) => format!("{} from {}", humanize(level), source),
        (None, Some(source)) => format!("Log from {}", source),
        (Some(level), None) => format!("{} log", humanize(level)),
        (None, None) => "System log".to_string(),
    };
    let draft = Draft {
        category: ctx.category,
        title,
        message: text(row, "message").unwrap_or(UNKNOWN).to_string(),
        priority: ctx.policy.for_level(level),
        is_read: false,
    };
    finish(row, ctx, draft)
}

/// `security_alerts`.
pub fn security_alert(row: &JsonValue, ctx: &RowContext<'_>) -> NormalizedNotification {
    let title = text(row, "title")
        .map(str::to_string)
        .or_else(|| text(row, "alert_type").map(humanize))
        .unwrap_or_else(|| "Security alert".to_string());
    let draft = Draft {
        category: ctx.category,
        title,
        message: text(row, "description").unwrap_or(UNKNOWN).to_string(),
        priority: ctx.policy.for_severity(text(row, "severity")),
        is_read: false,
    };
    finish(row, ctx, draft)
}

/// Category for a user action, from the entity it touched.
fn entity_category(entity_type: Option<&str>) -> Category {
    let entity = entity_type.unwrap_or_default().to_lowercase();
    match entity.trim_end_matches('s') {
        "driver" => Category::Drivers,
        "partner" => Category::Partners,
        "vehicle" => Category::Fleet,
        "booking" => Category::Bookings,
        "payment" => Category::Payments,
        "claim" => Category::Claims,
        "document" => Category::Documents,
        _ => Category::Drivers,
    }
}

/// `user_action_logs`.
pub fn user_action(row: &JsonValue, ctx: &RowContext<'_>) -> NormalizedNotification {
    let action = text(row, "action");
    let entity_type = text(row, "entity_type");
    let message = text(row, "details").map(str::to_string).unwrap_or_else(|| {
        match (action, entity_type, text(row, "entity_id")) {
            (Some(action), Some(entity), Some(id)) => format!("{} on {} {}", action, entity, id),
            (Some(action), Some(entity), None) => format!("{} on {}", action, entity),
            _ => UNKNOWN.to_string(),
        }
    });
    let draft = Draft {
        category: entity_category(entity_type),
        title: action
            .map(humanize)
            .unwrap_or_else(|| "User action".to_string()),
        message,
        priority: ctx.policy.for_user_action(),
        is_read: false,
    };
    finish(row, ctx, draft)
}

/// `partner_actions`.
pub fn partner_action(row: &JsonValue, ctx: &RowContext<'_>) -> NormalizedNotification {
    let action = text(row, "action");
    let message = text(row, "notes")
        .map(str::to_string)
        .or_else(|| text(row, "performed_by").map(|who| format!("Performed by {}", who)))
        .unwrap_or_else(|| UNKNOWN.to_string());
    let draft = Draft {
        category: ctx.category,
        title: action
            .map(|a| format!("Partner {}", a.replace('_', " ")))
            .unwrap_or_else(|| "Partner action".to_string()),
        message,
        priority: ctx.policy.for_partner_action(action),
        is_read: false,
    };
    finish(row, ctx, draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn ctx(kind: SourceKind, category: Category, policy: &PriorityPolicy) -> RowContext<'_> {
        RowContext {
            kind,
            category,
            policy,
            reference_time: Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn default_policy_table() {
        let policy = PriorityPolicy::default();
        assert_eq!(policy.for_level(Some("ERROR")), Priority::Critical);
        assert_eq!(policy.for_level(Some("warning")), Priority::High);
        assert_eq!(policy.for_level(Some("info")), Priority::Low);
        assert_eq!(policy.for_level(Some("verbose")), Priority::Medium);
        assert_eq!(policy.for_level(None), Priority::Medium);
        assert_eq!(policy.for_severity(Some("critical")), Priority::Critical);
        assert_eq!(policy.for_severity(Some("moderate")), Priority::Medium);
        assert_eq!(policy.for_support(Some("urgent")), Priority::Critical);
        assert_eq!(policy.for_support(Some("HIGH")), Priority::High);
        assert_eq!(policy.for_support(None), Priority::Medium);
        assert_eq!(policy.for_partner_action(Some("reject_application")), Priority::High);
        assert_eq!(policy.for_partner_action(Some("approve")), Priority::Medium);
    }

    #[test]
    fn config_overrides_take_precedence() {
        let mut config = PriorityConfig::default();
        config
            .level_overrides
            .insert("Warning".to_string(), Priority::Medium);
        config
            .severity_overrides
            .insert("low".to_string(), Priority::Medium);
        config.default = Some(Priority::Low);

        let policy = PriorityPolicy::from_config(&config);
        assert_eq!(policy.for_level(Some("warning")), Priority::Medium);
        assert_eq!(policy.for_level(Some("error")), Priority::Critical);
        assert_eq!(policy.for_severity(Some("low")), Priority::Medium);
        assert_eq!(policy.for_level(Some("unknown")), Priority::Low);
        assert_eq!(policy.default_priority(), Priority::Low);
    }

    #[test]
    fn support_row_keeps_read_state_and_category() {
        let policy = PriorityPolicy::default();
        let row = json!({
            "id": "s-1",
            "title": "Refund request",
            "message": "Customer asked for a refund",
            "category": "payment",
            "priority": "high",
            "is_read": true,
            "created_at": "2025-01-09T08:30:00+02:00",
            "updated_at": null
        });

        let n = support_notification(&row, &ctx(SourceKind::Support, Category::Support, &policy));
        assert_eq!(n.id, "s-1");
        assert_eq!(n.category, Category::Payments);
        assert_eq!(n.priority, Priority::High);
        assert!(n.is_read);
        assert_eq!(n.created_at, Utc.with_ymd_and_hms(2025, 1, 9, 6, 30, 0).unwrap());
        assert_eq!(n.updated_at, n.created_at);
        assert_eq!(n.origin_payload, row);
    }

    #[test]
    fn malformed_rows_use_fallbacks() {
        let policy = PriorityPolicy::default();
        let context = ctx(SourceKind::Security, Category::Security, &policy);
        let row = json!({ "id": 7, "severity": null, "created_at": "not a date" });

        let n = security_alert(&row, &context);
        assert_eq!(n.id, "7");
        assert_eq!(n.title, "Security alert");
        assert_eq!(n.message, UNKNOWN);
        assert_eq!(n.priority, Priority::Medium);
        assert_eq!(n.created_at, context.reference_time);
        assert!(!n.is_read);
    }

    #[test]
    fn id_less_rows_get_distinct_stable_ids() {
        let policy = PriorityPolicy::default();
        let context = ctx(SourceKind::Security, Category::Security, &policy);
        let first = json!({ "title": "A", "created_at": "2025-01-10T10:00:00+00:00" });
        let second = json!({ "id": null, "title": "B", "created_at": "2025-01-10T10:00:00+00:00" });

        let a = security_alert(&first, &context);
        let b = security_alert(&second, &context);
        assert!(a.id.starts_with("security-missing-"));
        assert_eq!(a.id.len(), "security-missing-".len() + 16);
        assert_ne!(a.id, b.id);
        assert_eq!(security_alert(&first, &context).id, a.id);

        let as_log = system_log(&first, &ctx(SourceKind::System, Category::System, &policy));
        assert_ne!(as_log.id, a.id);
    }

    #[test]
    fn system_log_title_and_priority() {
        let policy = PriorityPolicy::default();
        let row = json!({
            "id": "l-1",
            "level": "error",
            "source": "billing-worker",
            "message": "Payment capture failed",
            "created_at": "2025-01-10 09:15:00"
        });

        let n = system_log(&row, &ctx(SourceKind::System, Category::Payments, &policy));
        assert_eq!(n.title, "Error from billing-worker");
        assert_eq!(n.category, Category::Payments);
        assert_eq!(n.priority, Priority::Critical);
        assert_eq!(n.created_at, Utc.with_ymd_and_hms(2025, 1, 10, 9, 15, 0).unwrap());
    }

    #[test]
    fn user_action_category_follows_entity() {
        let policy = PriorityPolicy::default();
        let context = ctx(SourceKind::User, Category::Drivers, &policy);

        let row = json!({ "id": "u-1", "action": "vehicle_inspected", "entity_type": "Vehicle", "entity_id": "V-9" });
        let n = user_action(&row, &context);
        assert_eq!(n.category, Category::Fleet);
        assert_eq!(n.title, "Vehicle inspected");
        assert_eq!(n.message, "vehicle_inspected on Vehicle V-9");
        assert_eq!(n.priority, Priority::Low);

        let unknown = user_action(&json!({ "id": "u-2", "entity_type": "coupon" }), &context);
        assert_eq!(unknown.category, Category::Drivers);
        assert_eq!(unknown.message, UNKNOWN);
    }

    #[test]
    fn partner_action_escalates_blocking_actions() {
        let policy = PriorityPolicy::default();
        let context = ctx(SourceKind::Admin, Category::Partners, &policy);
        let row = json!({ "id": "p-1", "action": "suspend_partner", "performed_by": "ops@fleet" });

        let n = partner_action(&row, &context);
        assert_eq!(n.title, "Partner suspend partner");
        assert_eq!(n.message, "Performed by ops@fleet");
        assert_eq!(n.priority, Priority::High);
        assert_eq!(n.source_kind, SourceKind::Admin);
    }
}
