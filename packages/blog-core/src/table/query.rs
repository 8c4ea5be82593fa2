//! Filtering and pagination for post listings.

use super::post::Post;

/// Filters for listing posts. All set filters must match; `offset` is
/// applied before `limit`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostQuery {
    /// Maximum number of posts to return
    pub limit: Option<usize>,
    /// Number of matching posts to skip
    pub offset: Option<usize>,
    /// Only pinned (or only unpinned) posts
    pub pinned: Option<bool>,
    /// Only posts linked to this category
    pub category_id: Option<u64>,
    /// Only posts by this author
    pub author_id: Option<u64>,
}

impl PostQuery {
    /// Returns true when `post` (with its linked category ids) passes every
    /// filter. Pagination is not considered here.
    pub fn matches(&self, post: &Post, category_ids: &[u64]) -> bool {
        if let Some(pinned) = self.pinned {
            if post.pinned != pinned {
                return false;
            }
        }
        if let Some(author_id) = self.author_id {
            if post.author_id != Some(author_id) {
                return false;
            }
        }
        if let Some(category_id) = self.category_id {
            if !category_ids.contains(&category_id) {
                return false;
            }
        }
        true
    }

    /// Applies offset and limit to an iterator of matching items.
    pub fn paginate<I, T>(&self, items: I) -> Vec<T>
    where
        I: Iterator<Item = T>,
    {
        let skipped = items.skip(self.offset.unwrap_or(0));
        match self.limit {
            Some(limit) => skipped.take(limit).collect(),
            None => skipped.collect(),
        }
    }
}
