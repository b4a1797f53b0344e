//! Source catalog.
//!
//! Fetch order is catalog order, and catalog order decides which copy wins
//! in both dedup passes. Tagged `system_logs` sources sit ahead of the
//! generic one so a log line keeps its business category.

use crate::models::{Category, SourceKind};
use crate::query::{Filter, SourceQuery, tables};

use super::normalize::{self, Normalizer};

/// Default per-source row cap.
pub const DEFAULT_ROW_LIMIT: u64 = 50;

/// One fetch definition: what to query and how to project its rows.
#[derive(Debug, Clone)]
pub struct SourceSpec {
    pub name: &'static str,
    pub kind: SourceKind,
    /// Category used when the row itself does not decide one.
    pub category: Category,
    pub query: SourceQuery,
    pub normalizer: Normalizer,
}

impl SourceSpec {
    fn new(
        name: &'static str,
        kind: SourceKind,
        category: Category,
        query: SourceQuery,
        normalizer: Normalizer,
    ) -> Self {
        Self {
            name,
            kind,
            category,
            query,
            normalizer,
        }
    }
}

fn message_contains(needles: &'static [&'static str]) -> Filter {
    Filter::ContainsAny {
        column: "message",
        needles,
    }
}

/// The full catalog, each query capped at `row_limit` rows.
pub fn default_catalog(row_limit: u64) -> Vec<SourceSpec> {
    let query = |table: &'static str| SourceQuery::new(table).limit(row_limit);
    let tagged = |name: &'static str, category: Category, needles: &'static [&'static str]| {
        SourceSpec::new(
            name,
            SourceKind::System,
            category,
            query(tables::SYSTEM_LOGS).filter(message_contains(needles)),
            normalize::system_log,
        )
    };

    vec![
        SourceSpec::new(
            "support",
            SourceKind::Support,
            Category::Support,
            query(tables::SUPPORT_NOTIFICATIONS),
            normalize::support_notification,
        ),
        SourceSpec::new(
            "security",
            SourceKind::Security,
            Category::Security,
            query(tables::SECURITY_ALERTS),
            normalize::security_alert,
        ),
        SourceSpec::new(
            "user_actions",
            SourceKind::User,
            Category::Drivers,
            query(tables::USER_ACTION_LOGS),
            normalize::user_action,
        ),
        SourceSpec::new(
            "partner_actions",
            SourceKind::Admin,
            Category::Partners,
            query(tables::PARTNER_ACTIONS),
            normalize::partner_action,
        ),
        tagged("fleet", Category::Fleet, &["vehicle", "fleet"]),
        tagged("documents", Category::Documents, &["document"]),
        tagged("payments", Category::Payments, &["payment"]),
        tagged("transactions", Category::Payments, &["transaction"]),
        tagged("bookings", Category::Bookings, &["booking"]),
        tagged("claims", Category::Claims, &["claim"]),
        SourceSpec::new(
            "system",
            SourceKind::System,
            Category::System,
            query(tables::SYSTEM_LOGS),
            normalize::system_log,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalog_names_are_unique_and_ordered() {
        let catalog = default_catalog(DEFAULT_ROW_LIMIT);
        let names: Vec<_> = catalog.iter().map(|s| s.name).collect();
        assert_eq!(names.len(), names.iter().collect::<HashSet<_>>().len());
        assert_eq!(names.first(), Some(&"support"));
        assert_eq!(names.last(), Some(&"system"));
    }

    #[test]
    fn row_limit_applies_to_every_query() {
        for spec in default_catalog(7) {
            assert_eq!(spec.query.limit, 7, "{}", spec.name);
            assert_eq!(spec.query.order_by_desc, "created_at");
        }
    }

    #[test]
    fn tagged_sources_precede_generic_system_logs() {
        let catalog = default_catalog(DEFAULT_ROW_LIMIT);
        let generic = catalog.iter().position(|s| s.name == "system").unwrap();
        for (i, spec) in catalog.iter().enumerate() {
            if spec.query.table == tables::SYSTEM_LOGS && i != generic {
                assert!(i < generic, "{} must be fetched before system", spec.name);
                assert_eq!(spec.query.filters.len(), 1);
            }
        }
    }
}
