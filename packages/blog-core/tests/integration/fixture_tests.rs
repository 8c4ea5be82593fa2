//! Fixture documents read from disk.

use std::fs;

use tempfile::tempdir;

use blog_core::fixtures::Fixtures;
use blog_core::table::PostQuery;
use blog_core::{BlogError, Database};

#[test]
fn fixtures_load_from_file() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("fixtures.json");
    fs::write(
        &path,
        r#"{
            "categories": [{"id": 10, "name": "News"}],
            "posts": [
                {"id": 5, "title": "Breaking", "pinned": true, "categories": [10]},
                {"id": 6, "title": "Later"}
            ]
        }"#,
    )?;

    let db = Database::seeded(&Fixtures::load(&path)?)?;
    let pinned = db.list_posts(&PostQuery {
        pinned: Some(true),
        ..Default::default()
    })?;
    assert_eq!(pinned.len(), 1);
    assert_eq!(pinned[0].post.id, 5);
    assert_eq!(pinned[0].categories[0].name, "News");

    // New rows continue after the highest fixture id.
    let created = db.create_post(blog_core::table::NewPost::titled("Fresh"))?;
    assert_eq!(created.post.id, 7);
    Ok(())
}

#[test]
fn missing_fixture_file_is_reported() {
    let dir = tempdir().unwrap();
    let err = Fixtures::load(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, BlogError::InvalidFixture(_)));
}

#[test]
fn malformed_fixture_leaves_store_untouched() {
    let db = Database::seeded(&Fixtures::builtin().unwrap()).unwrap();
    let bad =
        Fixtures::from_json(r#"{"posts": [{"id": 1, "title": "a"}, {"id": 1, "title": "b"}]}"#)
            .unwrap();
    assert!(db.seed(&bad).is_err());
    assert_eq!(db.post_count().unwrap(), 3);
}
