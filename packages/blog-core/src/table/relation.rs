//! Link row of the post/category many-to-many relation.

use serde::{Deserialize, Serialize};

/// One post/category link. Ordered by post id, then category id, so a
/// post's links form a contiguous range in an ordered set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCategory {
    pub post_id: u64,
    pub category_id: u64,
}

impl PostCategory {
    pub fn new(post_id: u64, category_id: u64) -> Self {
        Self {
            post_id,
            category_id,
        }
    }

    /// Inclusive bounds covering every link of `post_id`.
    pub fn post_range(post_id: u64) -> std::ops::RangeInclusive<PostCategory> {
        PostCategory::new(post_id, 0)..=PostCategory::new(post_id, u64::MAX)
    }
}
