//! Snapshot persistence through the data directory.

use std::fs;

use tempfile::tempdir;

use blog_core::config::BlogConfig;
use blog_core::fixtures::Fixtures;
use blog_core::persistence::{PersistenceManager, SNAPSHOT_FILE};
use blog_core::table::{NewPost, PostQuery};
use blog_core::{BlogError, Database};

fn manager(dir: &std::path::Path) -> PersistenceManager {
    let config = BlogConfig {
        data_dir: Some(dir.to_path_buf()),
        persistence_retry_delay_ms: 0,
        ..Default::default()
    };
    PersistenceManager::from_config(&config).unwrap()
}

#[test]
fn missing_snapshot_loads_as_none() {
    let dir = tempdir().unwrap();
    assert!(manager(dir.path()).load_database().unwrap().is_none());
}

#[test]
fn snapshot_round_trip_preserves_store() {
    let dir = tempdir().unwrap();
    let persistence = manager(dir.path());

    let db = Database::seeded(&Fixtures::builtin().unwrap()).unwrap();
    db.create_post(NewPost::titled("Persisted")).unwrap();
    db.remove_category_from_post(1, 1).unwrap();
    persistence.save_snapshot(&db).unwrap();

    assert!(dir.path().join(SNAPSHOT_FILE).exists());
    assert!(!dir.path().join(format!("{}.tmp", SNAPSHOT_FILE)).exists());

    let loaded = persistence.load_database().unwrap().unwrap();
    assert_eq!(
        loaded.list_posts(&PostQuery::default()).unwrap(),
        db.list_posts(&PostQuery::default()).unwrap()
    );
    assert_eq!(loaded.list_categories().unwrap(), db.list_categories().unwrap());
    assert_eq!(loaded.get_post(1).unwrap().categories.len(), 1);
}

#[test]
fn corrupted_snapshot_is_detected() {
    let dir = tempdir().unwrap();
    let persistence = manager(dir.path());
    let db = Database::seeded(&Fixtures::builtin().unwrap()).unwrap();
    persistence.save_snapshot(&db).unwrap();

    let path = dir.path().join(SNAPSHOT_FILE);
    let contents = fs::read_to_string(&path).unwrap();
    fs::write(&path, contents.replace("Sourdough basics", "Sourdough advanced")).unwrap();

    let err = persistence.load_database().unwrap_err();
    assert!(matches!(err, BlogError::DataCorruption(_)));
}

#[test]
fn truncated_snapshot_is_detected() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(SNAPSHOT_FILE), b"{\"version\": 1, \"chec").unwrap();
    let err = manager(dir.path()).load_snapshot().unwrap_err();
    assert!(matches!(err, BlogError::DataCorruption(_)));
}
