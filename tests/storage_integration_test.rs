//! Integration tests for the storage backends
//!
//! Tests can be filtered by database backend using the DATABASE_BACKEND environment variable:
//! - `DATABASE_BACKEND=sqlite cargo test` - Run only SQLite tests
//! - `DATABASE_BACKEND=postgres cargo test` - Run only PostgreSQL tests (needs DATABASE_URL)
//! - By default, both backends are tested

use shorturl::models::ClickEvent;
use shorturl::storage::{PostgresStorage, SqliteStorage, Storage, StorageError};
use std::sync::Arc;

/// Get the database backend to test from environment variable
fn should_test_backend(backend: &str) -> bool {
    match std::env::var("DATABASE_BACKEND") {
        Ok(val) => val.to_lowercase() == backend.to_lowercase(),
        Err(_) => true, // Test all backends if not specified
    }
}

/// Helper to create SQLite test storage
async fn create_sqlite_storage() -> Arc<dyn Storage> {
    let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
    storage.init().await.unwrap();
    Arc::new(storage)
}

/// Helper to create PostgreSQL test storage
async fn create_postgres_storage() -> Option<Arc<dyn Storage>> {
    let db_url = std::env::var("DATABASE_URL").ok()?;
    let storage = PostgresStorage::new(&db_url, 5).await.ok()?;
    storage.init().await.ok()?;
    Some(Arc::new(storage))
}

/// Codes must not collide across runs against a persistent PostgreSQL database
fn unique(prefix: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}{}", &suffix[..8])
}

fn click(url_id: &str, clicked_at: i64, referrer: &str, location: &str) -> ClickEvent {
    ClickEvent {
        id: uuid::Uuid::new_v4().to_string(),
        url_id: url_id.to_string(),
        clicked_at,
        ip_address: "203.0.113.9".to_string(),
        user_agent: "curl/8.4.0".to_string(),
        referrer: referrer.to_string(),
        device_type: "其他電腦".to_string(),
        location: location.to_string(),
    }
}

async fn check_link_lifecycle(storage: Arc<dyn Storage>) {
    let code = unique("life");
    let id = uuid::Uuid::new_v4().to_string();

    assert!(!storage.exists(&code).await.unwrap());
    assert!(storage.get_link(&code).await.unwrap().is_none());

    let created = storage
        .create_link(&id, &code, "https://example.com", 1_700_000_000)
        .await
        .unwrap();
    assert_eq!(created.short_code, code);

    assert!(storage.exists(&code).await.unwrap());
    let fetched = storage.get_link(&code).await.unwrap().unwrap();
    assert_eq!(fetched.id, id);
    assert_eq!(fetched.original_url, "https://example.com");
    assert_eq!(fetched.created_at, 1_700_000_000);

    let duplicate = storage
        .create_link(
            &uuid::Uuid::new_v4().to_string(),
            &code,
            "https://other.example",
            1_700_000_001,
        )
        .await;
    assert!(matches!(duplicate, Err(StorageError::Conflict)));

    // The original row is untouched
    let fetched = storage.get_link(&code).await.unwrap().unwrap();
    assert_eq!(fetched.original_url, "https://example.com");
}

async fn check_concurrent_create_same_code(storage: Arc<dyn Storage>) {
    let code = unique("race");
    let mut handles = vec![];

    for i in 0..10 {
        let storage = Arc::clone(&storage);
        let code = code.clone();
        handles.push(tokio::spawn(async move {
            storage
                .create_link(
                    &uuid::Uuid::new_v4().to_string(),
                    &code,
                    &format!("https://example.com/{i}"),
                    1_700_000_000,
                )
                .await
        }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(StorageError::Conflict) => {}
            Err(StorageError::Other(e)) => panic!("unexpected storage error: {e}"),
        }
    }
    assert_eq!(created, 1);
}

async fn check_click_queries(storage: Arc<dyn Storage>) {
    let code = unique("clk");
    let link = storage
        .create_link(
            &uuid::Uuid::new_v4().to_string(),
            &code,
            "https://example.com",
            1_700_000_000,
        )
        .await
        .unwrap();

    // 2024-01-01 14:00 UTC+8
    let base = 1_704_088_800;
    for (offset, referrer, location) in [
        (0, "", "本地"),
        (1200, "https://xsong.us/home", "未知"),
        (3600, "https://t.co/x", "中国, 广东, 深圳"),
        (3700, "https://t.co/x", "中国, 广东, 深圳"),
        (7300, "https://t.co/x", ""),
    ] {
        storage
            .insert_click(&click(&link.id, base + offset, referrer, location))
            .await
            .unwrap();
    }

    assert_eq!(storage.count_clicks(&link.id).await.unwrap(), 5);

    let referrers = storage
        .top_referrers(&link.id, "xsong.us", "直接訪問", 10)
        .await
        .unwrap();
    assert_eq!(
        referrers,
        vec![
            ("https://t.co/x".to_string(), 3),
            ("直接訪問".to_string(), 2)
        ]
    );

    let buckets = storage
        .hourly_buckets(&link.id, 8 * 3600, 48)
        .await
        .unwrap();
    assert_eq!(buckets, vec![(base + 7200, 1), (base + 3600, 2), (base, 2)]);

    let limited = storage.hourly_buckets(&link.id, 8 * 3600, 2).await.unwrap();
    assert_eq!(limited, vec![(base + 7200, 1), (base + 3600, 2)]);

    let locations = storage.top_locations(&link.id, "未知", 20).await.unwrap();
    assert_eq!(
        locations,
        vec![
            ("中国, 广东, 深圳".to_string(), 2),
            ("本地".to_string(), 1)
        ]
    );

    let recent = storage.recent_clicks(&link.id, 2).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].clicked_at, base + 7300);
    assert_eq!(recent[1].clicked_at, base + 3700);

    assert_eq!(
        storage.device_type_counts(&link.id).await.unwrap(),
        vec![("其他電腦".to_string(), 5)]
    );
    assert!(storage
        .blank_device_user_agents(&link.id)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(storage.user_agents(&link.id).await.unwrap().len(), 5);
    assert_eq!(
        storage.top_ips(&link.id, 20).await.unwrap(),
        vec![("203.0.113.9".to_string(), 5)]
    );
    assert_eq!(
        storage.top_user_agents(&link.id, 10).await.unwrap(),
        vec![("curl/8.4.0".to_string(), 5)]
    );
}

async fn check_blank_device_rows(storage: Arc<dyn Storage>) {
    let code = unique("blank");
    let link = storage
        .create_link(
            &uuid::Uuid::new_v4().to_string(),
            &code,
            "https://example.com",
            1_700_000_000,
        )
        .await
        .unwrap();

    let mut legacy = click(&link.id, 1_700_000_100, "", "");
    legacy.device_type = String::new();
    legacy.user_agent = "Mozilla/5.0 (iPad; CPU OS 15_0 like Mac OS X)".to_string();
    storage.insert_click(&legacy).await.unwrap();
    storage
        .insert_click(&click(&link.id, 1_700_000_200, "", ""))
        .await
        .unwrap();

    let mut counts = storage.device_type_counts(&link.id).await.unwrap();
    counts.sort();
    assert_eq!(
        counts,
        vec![(String::new(), 1), ("其他電腦".to_string(), 1)]
    );
    assert_eq!(
        storage.blank_device_user_agents(&link.id).await.unwrap(),
        vec!["Mozilla/5.0 (iPad; CPU OS 15_0 like Mac OS X)".to_string()]
    );
}

#[tokio::test]
async fn test_link_lifecycle_sqlite() {
    if !should_test_backend("sqlite") {
        return;
    }
    check_link_lifecycle(create_sqlite_storage().await).await;
}

#[tokio::test]
async fn test_link_lifecycle_postgres() {
    if !should_test_backend("postgres") {
        return;
    }
    let Some(storage) = create_postgres_storage().await else {
        return;
    };
    check_link_lifecycle(storage).await;
}

#[tokio::test]
async fn test_concurrent_create_same_code_sqlite() {
    if !should_test_backend("sqlite") {
        return;
    }
    check_concurrent_create_same_code(create_sqlite_storage().await).await;
}

#[tokio::test]
async fn test_concurrent_create_same_code_postgres() {
    if !should_test_backend("postgres") {
        return;
    }
    let Some(storage) = create_postgres_storage().await else {
        return;
    };
    check_concurrent_create_same_code(storage).await;
}

#[tokio::test]
async fn test_click_queries_sqlite() {
    if !should_test_backend("sqlite") {
        return;
    }
    check_click_queries(create_sqlite_storage().await).await;
}

#[tokio::test]
async fn test_click_queries_postgres() {
    if !should_test_backend("postgres") {
        return;
    }
    let Some(storage) = create_postgres_storage().await else {
        return;
    };
    check_click_queries(storage).await;
}

#[tokio::test]
async fn test_blank_device_rows_sqlite() {
    if !should_test_backend("sqlite") {
        return;
    }
    check_blank_device_rows(create_sqlite_storage().await).await;
}

#[tokio::test]
async fn test_blank_device_rows_postgres() {
    if !should_test_backend("postgres") {
        return;
    }
    let Some(storage) = create_postgres_storage().await else {
        return;
    };
    check_blank_device_rows(storage).await;
}
