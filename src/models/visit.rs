use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A persisted visit. One row per save request; rows are never updated
/// or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Visit {
    pub id: i64,
    pub initiator: String,
    pub service_tag: Option<String>,
    pub panel_clid: Option<String>,
    pub ip: String,
    pub city: Option<String>,
    pub user_agent_full: String,
    pub user_agent_short: String,
    pub os: String,
    pub os_version: String,
    pub browser: String,
    pub browser_version: String,
    pub device: String,
    pub device_brand: String,
    pub device_model: String,
    pub is_mobile: bool,
    pub fingerprint: String,
    /// Unix milliseconds, assigned by the store at insert time.
    pub created_at: i64,
}

/// A fully assembled visit payload, ready for persistence. The store
/// assigns `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewVisit {
    pub initiator: String,
    pub service_tag: Option<String>,
    pub panel_clid: Option<String>,
    pub ip: String,
    pub city: Option<String>,
    pub user_agent_full: String,
    pub user_agent_short: String,
    pub os: String,
    pub os_version: String,
    pub browser: String,
    pub browser_version: String,
    pub device: String,
    pub device_brand: String,
    pub device_model: String,
    pub is_mobile: bool,
    pub fingerprint: String,
}

/// Inbound visitor attributes, shared by the save and search endpoints.
///
/// `referrer` is accepted as an alias for `city` to cover both observed
/// client schemas.
#[derive(Debug, Clone, Deserialize)]
pub struct VisitorAttributes {
    pub user_agent: String,
    pub user_ip: String,
    #[serde(default, alias = "referrer")]
    pub city: Option<String>,
    #[serde(default)]
    pub panel_clid: Option<String>,
    #[serde(default)]
    pub initiator: Option<String>,
    #[serde(default)]
    pub service_tag: Option<String>,
}
