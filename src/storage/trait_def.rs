use crate::models::{NewVisit, Visit};
use anyhow::Result;
use async_trait::async_trait;

/// The lookup predicates the resolution cascade may ask of the store.
/// These four shapes plus "all records" are the entire query surface of
/// the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitFilter {
    PanelClid(String),
    Fingerprint(String),
    Ip(String),
    CityAndShortUa {
        city: String,
        user_agent_short: String,
    },
}

/// Persistence boundary for visit records. Visits are append-only: there
/// are no update or delete operations.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create tables and indexes). Idempotent.
    async fn init(&self) -> Result<()>;

    /// Persist a visit. The store assigns `id` and `created_at` and
    /// returns the stored row.
    async fn insert_visit(&self, visit: &NewVisit) -> Result<Visit>;

    /// The most recent visit matching the predicate, if any. Rows sharing
    /// an identical `created_at` tie arbitrarily.
    async fn find_most_recent(&self, filter: &VisitFilter) -> Result<Option<Visit>>;

    /// All visits, newest first. No pagination.
    async fn list_visits(&self) -> Result<Vec<Visit>>;
}
