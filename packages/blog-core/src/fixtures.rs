//! Fixture documents used to seed the store with known state.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::error::BlogError;
use crate::persistence::Snapshot;
use crate::slug::{is_valid_slug, slugify, unique_slug};
use crate::table::{Category, Post, PostCategory};

const BUILTIN_FIXTURES: &str = include_str!("../fixtures/blog.json");

/// A category row in a fixture document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryFixture {
    pub id: u64,
    pub name: String,
}

/// A post row in a fixture document, with the ids of its categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostFixture {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub lead: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub cover_photo: Option<String>,
    #[serde(default)]
    pub author_id: Option<u64>,
    #[serde(default)]
    pub pinned: bool,
    /// Derived from the title when omitted
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub categories: Vec<u64>,
}

/// Fixture document: categories first, then posts referencing them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fixtures {
    #[serde(default)]
    pub categories: Vec<CategoryFixture>,
    #[serde(default)]
    pub posts: Vec<PostFixture>,
}

impl Fixtures {
    /// The fixture set bundled with the crate.
    pub fn builtin() -> Result<Self, BlogError> {
        Self::from_json(BUILTIN_FIXTURES)
    }

    pub fn from_json(json: &str) -> Result<Self, BlogError> {
        serde_json::from_str(json).map_err(|e| BlogError::InvalidFixture(e.to_string()))
    }

    /// Reads a fixture document from disk.
    pub fn load(path: &Path) -> Result<Self, BlogError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            BlogError::InvalidFixture(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&contents)
    }

    /// Validates the document and converts it to a snapshot. Every row gets
    /// the current time as its creation and update timestamp.
    pub fn to_snapshot(&self) -> Result<Snapshot, BlogError> {
        let now = Utc::now();

        let mut category_ids = BTreeSet::new();
        let mut categories = Vec::with_capacity(self.categories.len());
        for fixture in &self.categories {
            check_id("category", fixture.id)?;
            if !category_ids.insert(fixture.id) {
                return Err(BlogError::InvalidFixture(format!(
                    "duplicate category id {}",
                    fixture.id
                )));
            }
            let name = fixture.name.trim();
            if name.is_empty() {
                return Err(BlogError::InvalidFixture(format!(
                    "category {} has an empty name",
                    fixture.id
                )));
            }
            categories.push(Category {
                id: fixture.id,
                name: name.to_string(),
                created_at: now,
                updated_at: now,
            });
        }

        // Explicit slugs are reserved before any are derived.
        let mut slugs = BTreeSet::new();
        for fixture in &self.posts {
            if let Some(slug) = &fixture.slug {
                if !is_valid_slug(slug) {
                    return Err(BlogError::InvalidFixture(format!(
                        "post {} has an invalid slug '{}'",
                        fixture.id, slug
                    )));
                }
                if !slugs.insert(slug.clone()) {
                    return Err(BlogError::InvalidFixture(format!(
                        "duplicate slug '{}'",
                        slug
                    )));
                }
            }
        }

        let mut post_ids = BTreeSet::new();
        let mut posts = Vec::with_capacity(self.posts.len());
        let mut links = Vec::new();
        for fixture in &self.posts {
            check_id("post", fixture.id)?;
            if !post_ids.insert(fixture.id) {
                return Err(BlogError::InvalidFixture(format!(
                    "duplicate post id {}",
                    fixture.id
                )));
            }
            let title = fixture.title.trim();
            if title.is_empty() {
                return Err(BlogError::InvalidFixture(format!(
                    "post {} has an empty title",
                    fixture.id
                )));
            }
            for category_id in &fixture.categories {
                if !category_ids.contains(category_id) {
                    return Err(BlogError::InvalidFixture(format!(
                        "post {} references unknown category {}",
                        fixture.id, category_id
                    )));
                }
                links.push(PostCategory::new(fixture.id, *category_id));
            }

            let slug = match &fixture.slug {
                Some(slug) => slug.clone(),
                None => {
                    let slug = unique_slug(&slugify(title), |s| slugs.contains(s));
                    slugs.insert(slug.clone());
                    slug
                }
            };

            posts.push(Post {
                id: fixture.id,
                title: title.to_string(),
                lead: fixture.lead.clone(),
                content: fixture.content.clone(),
                cover_photo: fixture.cover_photo.clone(),
                author_id: fixture.author_id,
                pinned: fixture.pinned,
                slug,
                created_at: now,
                updated_at: now,
            });
        }
        links.sort();
        links.dedup();

        Ok(Snapshot {
            posts,
            categories,
            links,
            next_post_id: 0,
            next_category_id: 0,
        })
    }
}

/// Ids must be non-zero and leave room for the next assigned id.
fn check_id(table: &str, id: u64) -> Result<(), BlogError> {
    if id == 0 || id == u64::MAX {
        return Err(BlogError::InvalidFixture(format!(
            "{} id {} is out of range",
            table, id
        )));
    }
    Ok(())
}

impl Database {
    /// Replaces the store's contents with `fixtures`.
    pub fn seed(&self, fixtures: &Fixtures) -> Result<(), BlogError> {
        let snapshot = fixtures.to_snapshot()?;
        tracing::info!(
            "Seeding {} categories and {} posts from fixtures",
            snapshot.categories.len(),
            snapshot.posts.len()
        );
        self.restore(snapshot)
    }

    /// Builds a database seeded with `fixtures`.
    pub fn seeded(fixtures: &Fixtures) -> Result<Self, BlogError> {
        let db = Database::new();
        db.seed(fixtures)?;
        Ok(db)
    }
}
