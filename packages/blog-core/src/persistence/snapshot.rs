//! Snapshot structs for persistence.

use std::collections::{BTreeMap, BTreeSet};

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use crate::error::BlogError;
use crate::table::{Category, Post, PostCategory};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Full image of the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub posts: Vec<Post>,
    pub categories: Vec<Category>,
    pub links: Vec<PostCategory>,
    /// Next post id to hand out (0 = derive from the highest stored id)
    #[serde(default)]
    pub next_post_id: u64,
    /// Next category id to hand out (0 = derive from the highest stored id)
    #[serde(default)]
    pub next_category_id: u64,
}

/// Validated tables ready to be swapped into a `Database`.
pub(crate) struct Tables {
    pub posts: BTreeMap<u64, Post>,
    pub categories: BTreeMap<u64, Category>,
    pub links: BTreeSet<PostCategory>,
    pub next_post_id: u64,
    pub next_category_id: u64,
}

impl Snapshot {
    /// Checks referential integrity and builds the table maps.
    pub(crate) fn into_tables(self) -> Result<Tables, BlogError> {
        let mut posts = BTreeMap::new();
        let mut slugs = BTreeSet::new();
        for post in self.posts {
            if !slugs.insert(post.slug.clone()) {
                return Err(BlogError::DataCorruption(format!(
                    "duplicate slug '{}'",
                    post.slug
                )));
            }
            let id = post.id;
            if posts.insert(id, post).is_some() {
                return Err(BlogError::DataCorruption(format!("duplicate post id {}", id)));
            }
        }

        let mut categories = BTreeMap::new();
        for category in self.categories {
            let id = category.id;
            if categories.insert(id, category).is_some() {
                return Err(BlogError::DataCorruption(format!(
                    "duplicate category id {}",
                    id
                )));
            }
        }

        let mut links = BTreeSet::new();
        for link in self.links {
            if !posts.contains_key(&link.post_id) || !categories.contains_key(&link.category_id) {
                return Err(BlogError::DataCorruption(format!(
                    "link ({}, {}) references a missing row",
                    link.post_id, link.category_id
                )));
            }
            links.insert(link);
        }

        let next_post_id = next_id(posts.keys().next_back(), self.next_post_id, "post")?;
        let next_category_id = next_id(
            categories.keys().next_back(),
            self.next_category_id,
            "category",
        )?;

        Ok(Tables {
            posts,
            categories,
            links,
            next_post_id,
            next_category_id,
        })
    }
}

/// One past the highest stored id, or the stored counter if that is larger.
fn next_id(highest: Option<&u64>, stored: u64, table: &str) -> Result<u64, BlogError> {
    let derived = match highest {
        Some(id) => id.checked_add(1).ok_or_else(|| {
            BlogError::DataCorruption(format!("{} id {} leaves no ids to assign", table, id))
        })?,
        None => 1,
    };
    Ok(derived.max(stored))
}

/// On-disk envelope: the snapshot plus its format version and checksum.
#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotFile {
    pub version: u32,
    /// CRC32 of the canonical JSON encoding of `data`
    pub checksum: u32,
    pub data: serde_json::Value,
}

impl SnapshotFile {
    /// Wraps a snapshot, computing its checksum.
    pub fn seal(snapshot: &Snapshot) -> Result<Self, BlogError> {
        let data = serde_json::to_value(snapshot)?;
        let checksum = checksum(&data)?;
        Ok(Self {
            version: SNAPSHOT_VERSION,
            checksum,
            data,
        })
    }

    /// Verifies version and checksum and decodes the snapshot.
    pub fn open(self) -> Result<Snapshot, BlogError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(BlogError::DataCorruption(format!(
                "unsupported snapshot version {}",
                self.version
            )));
        }
        let actual = checksum(&self.data)?;
        if actual != self.checksum {
            return Err(BlogError::DataCorruption(format!(
                "snapshot checksum mismatch: expected {:08x}, got {:08x}",
                self.checksum, actual
            )));
        }
        serde_json::from_value(self.data)
            .map_err(|e| BlogError::DataCorruption(format!("invalid snapshot data: {}", e)))
    }
}

/// CRC32 over the compact JSON encoding of `data`. Object keys are
/// serialized in sorted order, so the encoding is stable across a round trip.
pub fn checksum(data: &serde_json::Value) -> Result<u32, BlogError> {
    let bytes = serde_json::to_vec(data)?;
    let mut hasher = Hasher::new();
    hasher.update(&bytes);
    Ok(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn category(id: u64) -> Category {
        let now = Utc::now();
        Category {
            id,
            name: format!("Category {}", id),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn sealed_snapshot_opens() {
        let snapshot = Snapshot {
            categories: vec![category(1), category(4)],
            ..Default::default()
        };
        let file = SnapshotFile::seal(&snapshot).unwrap();
        assert_eq!(file.open().unwrap(), snapshot);
    }

    #[test]
    fn tampered_snapshot_is_rejected() {
        let snapshot = Snapshot {
            categories: vec![category(1)],
            ..Default::default()
        };
        let mut file = SnapshotFile::seal(&snapshot).unwrap();
        file.data["categories"][0]["name"] = serde_json::json!("tampered");
        assert!(matches!(file.open(), Err(BlogError::DataCorruption(_))));
    }

    #[test]
    fn dangling_link_is_rejected() {
        let snapshot = Snapshot {
            categories: vec![category(1)],
            links: vec![PostCategory::new(5, 1)],
            ..Default::default()
        };
        assert!(matches!(
            snapshot.into_tables(),
            Err(BlogError::DataCorruption(_))
        ));
    }

    #[test]
    fn next_ids_follow_highest_row() {
        let snapshot = Snapshot {
            categories: vec![category(1), category(7)],
            next_category_id: 3,
            ..Default::default()
        };
        let tables = snapshot.into_tables().unwrap();
        assert_eq!(tables.next_category_id, 8);
        assert_eq!(tables.next_post_id, 1);
    }

    #[test]
    fn highest_possible_id_is_rejected() {
        let snapshot = Snapshot {
            categories: vec![category(u64::MAX)],
            ..Default::default()
        };
        assert!(matches!(
            snapshot.into_tables(),
            Err(BlogError::DataCorruption(_))
        ));
    }
}
