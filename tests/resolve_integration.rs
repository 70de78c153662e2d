//! Integration tests for the resolution cascade
//!
//! These tests drive the cascade against real SQLite storage and verify
//! strategy order, short-circuiting, skip conditions and recency.

use axum::http::HeaderMap;
use spoor::identity::{self, resolve};
use spoor::models::VisitorAttributes;
use spoor::storage::{SqliteStorage, Storage};
use std::net::IpAddr;
use std::sync::Arc;

const CHROME_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const SAFARI_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 16_6 like Mac OS X) \
    AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.6 Mobile/15E148 Safari/604.1";

/// Helper to create SQLite test storage
async fn create_test_storage() -> Arc<dyn Storage> {
    let storage = SqliteStorage::new("sqlite::memory:", 5).await.unwrap();
    storage.init().await.unwrap();
    Arc::new(storage)
}

fn attrs(user_agent: &str, ip: &str) -> VisitorAttributes {
    VisitorAttributes {
        user_agent: user_agent.to_string(),
        user_ip: ip.to_string(),
        city: None,
        panel_clid: None,
        initiator: None,
        service_tag: None,
    }
}

fn remote() -> IpAddr {
    "127.0.0.1".parse().unwrap()
}

/// Persist a visit built through the real assembly path.
async fn save(storage: &dyn Storage, attrs: &VisitorAttributes) -> spoor::models::Visit {
    let visit = identity::build_visit(attrs, &HeaderMap::new(), remote());
    storage.insert_visit(&visit).await.unwrap()
}

#[tokio::test]
async fn test_panel_clid_short_circuits_fingerprint() {
    let storage = create_test_storage().await;

    // Older record carrying the correlation ID
    let mut by_clid = attrs(SAFARI_UA, "10.0.0.1");
    by_clid.panel_clid = Some("clid-1".to_string());
    let clid_record = save(storage.as_ref(), &by_clid).await;

    tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;

    // Newer record that matches the fingerprint of the search attributes
    let by_fingerprint = attrs(CHROME_UA, "10.0.0.2");
    let fingerprint_record = save(storage.as_ref(), &by_fingerprint).await;

    // Search matches both strategies; the correlation ID must win even
    // though the fingerprint record is more recent
    let mut search = attrs(CHROME_UA, "10.0.0.2");
    search.panel_clid = Some("clid-1".to_string());

    let found = resolve(storage.as_ref(), &search).await.unwrap();
    assert_eq!(found.id, clid_record.id);
    assert_ne!(found.id, fingerprint_record.id);
}

#[tokio::test]
async fn test_fingerprint_beats_ip() {
    let storage = create_test_storage().await;

    // Record matching the search fingerprint
    let chrome = attrs(CHROME_UA, "10.0.0.3");
    let chrome_record = save(storage.as_ref(), &chrome).await;

    tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;

    // Newer record from a different device on the same IP
    let safari = attrs(SAFARI_UA, "10.0.0.3");
    let safari_record = save(storage.as_ref(), &safari).await;

    let found = resolve(storage.as_ref(), &attrs(CHROME_UA, "10.0.0.3"))
        .await
        .unwrap();
    assert_eq!(found.id, chrome_record.id);
    assert_ne!(found.id, safari_record.id);
}

#[tokio::test]
async fn test_ip_fallback_when_fingerprint_misses() {
    let storage = create_test_storage().await;

    let stored = save(storage.as_ref(), &attrs(SAFARI_UA, "10.0.0.4")).await;

    // Different device on the same IP: fingerprint misses, IP matches
    let found = resolve(storage.as_ref(), &attrs(CHROME_UA, "10.0.0.4"))
        .await
        .unwrap();
    assert_eq!(found.id, stored.id);
}

#[tokio::test]
async fn test_city_fallback_when_ip_misses() {
    let storage = create_test_storage().await;

    let mut saved_attrs = attrs(CHROME_UA, "10.0.0.5");
    saved_attrs.city = Some("Berlin".to_string());
    let stored = save(storage.as_ref(), &saved_attrs).await;

    // Same device and city, different network
    let mut search = attrs(CHROME_UA, "172.16.0.9");
    search.city = Some("Berlin".to_string());

    let found = resolve(storage.as_ref(), &search).await.unwrap();
    assert_eq!(found.id, stored.id);
}

#[tokio::test]
async fn test_exhaustion_returns_none() {
    let storage = create_test_storage().await;

    // Unrelated record
    save(storage.as_ref(), &attrs(SAFARI_UA, "10.0.0.6")).await;

    let mut search = attrs(CHROME_UA, "192.0.2.77");
    search.panel_clid = Some("clid-unknown".to_string());
    search.city = Some("Nowhere".to_string());

    assert!(resolve(storage.as_ref(), &search).await.is_none());
}

#[tokio::test]
async fn test_empty_store_returns_none() {
    let storage = create_test_storage().await;
    assert!(resolve(storage.as_ref(), &attrs(CHROME_UA, "10.0.0.7"))
        .await
        .is_none());
}

#[tokio::test]
async fn test_recency_wins_within_a_strategy() {
    let storage = create_test_storage().await;

    let older = save(storage.as_ref(), &attrs(CHROME_UA, "10.0.0.8")).await;
    tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
    let newer = save(storage.as_ref(), &attrs(CHROME_UA, "10.0.0.8")).await;

    let found = resolve(storage.as_ref(), &attrs(CHROME_UA, "10.0.0.8"))
        .await
        .unwrap();
    assert_eq!(found.id, newer.id);
    assert_ne!(found.id, older.id);
}

#[tokio::test]
async fn test_unparseable_user_agent_skips_to_ip() {
    let storage = create_test_storage().await;

    let stored = save(storage.as_ref(), &attrs(CHROME_UA, "10.0.0.9")).await;

    // No search key can be generated; the IP strategy still matches
    let found = resolve(storage.as_ref(), &attrs("", "10.0.0.9"))
        .await
        .unwrap();
    assert_eq!(found.id, stored.id);
}
