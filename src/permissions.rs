//! Role-based category whitelist.
//!
//! One declarative table maps each viewer role to the categories it may see.
//! `support` is always allowed on top of the table.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Category, NormalizedNotification, notification::ALL_CATEGORIES};

/// Role a viewer holds in the operations dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ViewerRole {
    SuperAdmin,
    Admin,
    Staff,
    Support,
}

impl ViewerRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            ViewerRole::SuperAdmin => "super_admin",
            ViewerRole::Admin => "admin",
            ViewerRole::Staff => "staff",
            ViewerRole::Support => "support",
        }
    }

    pub fn parse(value: &str) -> Option<ViewerRole> {
        match value.trim().to_lowercase().replace('-', "_").as_str() {
            "super_admin" | "superadmin" => Some(ViewerRole::SuperAdmin),
            "admin" => Some(ViewerRole::Admin),
            "staff" => Some(ViewerRole::Staff),
            "support" => Some(ViewerRole::Support),
            _ => None,
        }
    }
}

impl fmt::Display for ViewerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category that every role can see.
pub const ALWAYS_ALLOWED: Category = Category::Support;

/// Role → whitelisted categories.
pub const ROLE_WHITELIST: &[(ViewerRole, &[Category])] = &[
    (ViewerRole::SuperAdmin, ALL_CATEGORIES),
    (ViewerRole::Admin, ALL_CATEGORIES),
    (
        ViewerRole::Staff,
        &[
            Category::Partners,
            Category::Drivers,
            Category::Fleet,
            Category::Documents,
            Category::Bookings,
        ],
    ),
    (
        ViewerRole::Support,
        &[Category::Bookings, Category::Claims, Category::Payments],
    ),
];

/// Categories whitelisted for `role`, excluding the always-allowed one.
pub fn whitelist(role: ViewerRole) -> &'static [Category] {
    ROLE_WHITELIST
        .iter()
        .find(|(r, _)| *r == role)
        .map(|(_, categories)| *categories)
        .unwrap_or(&[])
}

pub fn is_allowed(role: ViewerRole, category: Category) -> bool {
    category == ALWAYS_ALLOWED || whitelist(role).contains(&category)
}

/// Keep only the notifications `role` may see, preserving order.
pub fn filter_for_role(
    role: ViewerRole,
    notifications: Vec<NormalizedNotification>,
) -> Vec<NormalizedNotification> {
    notifications
        .into_iter()
        .filter(|n| is_allowed(role, n.category))
        .collect()
}
