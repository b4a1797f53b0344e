//! # Data Models
//!
//! SeaORM entities for the notification source tables and the exclusion
//! table, plus the normalized notification shape the aggregator produces.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod notification;
pub mod notification_exclusion;
pub mod partner_action;
pub mod security_alert;
pub mod support_notification;
pub mod system_log;
pub mod user_action_log;

pub use notification::{Category, NormalizedNotification, Priority, SourceKind};
pub use notification_exclusion::Entity as NotificationExclusion;
pub use partner_action::Entity as PartnerAction;
pub use security_alert::Entity as SecurityAlert;
pub use support_notification::Entity as SupportNotification;
pub use system_log::Entity as SystemLog;
pub use user_action_log::Entity as UserActionLog;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "fleetops-notifications".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
