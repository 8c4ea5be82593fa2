//! Database container managing the post, category, and link tables.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use crate::error::{BlogError, ResourceKind};
use crate::persistence::Snapshot;
use crate::slug::{slugify, unique_slug};
use crate::table::{
    Category, CategoryPatch, NewCategory, NewPost, Post, PostCategory, PostPatch, PostQuery,
    PostView,
};

type PostTable = BTreeMap<u64, Post>;
type CategoryTable = BTreeMap<u64, Category>;
type LinkTable = BTreeSet<PostCategory>;

/// In-memory blog store.
///
/// Locks are always taken in the order posts, categories, links.
#[derive(Debug)]
pub struct Database {
    posts: RwLock<PostTable>,
    categories: RwLock<CategoryTable>,
    /// Post/category many-to-many relation
    links: RwLock<LinkTable>,
    next_post_id: AtomicU64,
    next_category_id: AtomicU64,
}

impl Database {
    /// Creates a new empty database.
    pub fn new() -> Self {
        Self {
            posts: RwLock::new(BTreeMap::new()),
            categories: RwLock::new(BTreeMap::new()),
            links: RwLock::new(BTreeSet::new()),
            next_post_id: AtomicU64::new(1),
            next_category_id: AtomicU64::new(1),
        }
    }

    /// Builds a database from a snapshot.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, BlogError> {
        let db = Self::new();
        db.restore(snapshot)?;
        Ok(db)
    }

    // ---- posts ----

    /// Lists posts ordered by id, filtered and paginated by `query`.
    pub fn list_posts(&self, query: &PostQuery) -> Result<Vec<PostView>, BlogError> {
        let posts = self.read_posts()?;
        let categories = self.read_categories()?;
        let links = self.read_links()?;
        Ok(collect_posts(&posts, &categories, &links, query))
    }

    /// Returns a single post with its categories.
    pub fn get_post(&self, id: u64) -> Result<PostView, BlogError> {
        let posts = self.read_posts()?;
        let categories = self.read_categories()?;
        let links = self.read_links()?;
        let post = posts.get(&id).ok_or_else(|| BlogError::post_not_found(id))?;
        Ok(build_view(post, &categories, &links))
    }

    /// Creates a post, assigning its id, slug, and timestamps.
    pub fn create_post(&self, new_post: NewPost) -> Result<PostView, BlogError> {
        let new_post = new_post.normalize()?;
        let mut posts = self.write_posts()?;

        let slug = unique_slug(&slugify(&new_post.title), |candidate| {
            posts.values().any(|p| p.slug == candidate)
        });
        let id = allocate_id(&self.next_post_id, ResourceKind::Post)?;
        let now = Utc::now();
        let post = Post {
            id,
            title: new_post.title,
            lead: new_post.lead,
            content: new_post.content,
            cover_photo: new_post.cover_photo,
            author_id: new_post.author_id,
            pinned: new_post.pinned,
            slug,
            created_at: now,
            updated_at: now,
        };
        posts.insert(id, post.clone());
        tracing::debug!("Created post {} with slug '{}'", id, post.slug);

        Ok(PostView {
            post,
            categories: Vec::new(),
        })
    }

    /// Applies a partial update to a post. The slug is kept.
    pub fn update_post(&self, id: u64, patch: &PostPatch) -> Result<PostView, BlogError> {
        let updated = {
            let mut posts = self.write_posts()?;
            let post = posts
                .get_mut(&id)
                .ok_or_else(|| BlogError::post_not_found(id))?;
            patch.apply(post)?;
            if !patch.is_empty() {
                post.updated_at = Utc::now();
            }
            post.clone()
        };
        let categories = self.read_categories()?;
        let links = self.read_links()?;
        Ok(build_view(&updated, &categories, &links))
    }

    /// Deletes a post and its category links.
    pub fn delete_post(&self, id: u64) -> Result<(), BlogError> {
        let mut posts = self.write_posts()?;
        posts
            .remove(&id)
            .ok_or_else(|| BlogError::post_not_found(id))?;
        let mut links = self.write_links()?;
        links.retain(|link| link.post_id != id);
        Ok(())
    }

    /// Links a category to a post. The post is checked before the category.
    ///
    /// # Returns
    /// `Ok(false)` if the link already existed.
    pub fn add_category_to_post(&self, post_id: u64, category_id: u64) -> Result<bool, BlogError> {
        let posts = self.read_posts()?;
        let categories = self.read_categories()?;
        ensure_link_targets(&posts, &categories, post_id, category_id)?;
        let mut links = self.write_links()?;
        Ok(links.insert(PostCategory::new(post_id, category_id)))
    }

    /// Unlinks a category from a post. The post is checked before the category.
    ///
    /// # Returns
    /// `Ok(false)` if there was no such link.
    pub fn remove_category_from_post(
        &self,
        post_id: u64,
        category_id: u64,
    ) -> Result<bool, BlogError> {
        let posts = self.read_posts()?;
        let categories = self.read_categories()?;
        ensure_link_targets(&posts, &categories, post_id, category_id)?;
        let mut links = self.write_links()?;
        Ok(links.remove(&PostCategory::new(post_id, category_id)))
    }

    // ---- categories ----

    /// Lists all categories ordered by id.
    pub fn list_categories(&self) -> Result<Vec<Category>, BlogError> {
        Ok(self.read_categories()?.values().cloned().collect())
    }

    pub fn get_category(&self, id: u64) -> Result<Category, BlogError> {
        self.read_categories()?
            .get(&id)
            .cloned()
            .ok_or_else(|| BlogError::category_not_found(id))
    }

    pub fn create_category(&self, new_category: NewCategory) -> Result<Category, BlogError> {
        let new_category = new_category.normalize()?;
        let mut categories = self.write_categories()?;
        let id = allocate_id(&self.next_category_id, ResourceKind::Category)?;
        let now = Utc::now();
        let category = Category {
            id,
            name: new_category.name,
            created_at: now,
            updated_at: now,
        };
        categories.insert(id, category.clone());
        tracing::debug!("Created category {} '{}'", id, category.name);
        Ok(category)
    }

    pub fn update_category(&self, id: u64, patch: &CategoryPatch) -> Result<Category, BlogError> {
        let mut categories = self.write_categories()?;
        let category = categories
            .get_mut(&id)
            .ok_or_else(|| BlogError::category_not_found(id))?;
        patch.apply(category)?;
        if patch.name.is_some() {
            category.updated_at = Utc::now();
        }
        Ok(category.clone())
    }

    /// Deletes a category and unlinks it from every post.
    pub fn delete_category(&self, id: u64) -> Result<(), BlogError> {
        let mut categories = self.write_categories()?;
        categories
            .remove(&id)
            .ok_or_else(|| BlogError::category_not_found(id))?;
        let mut links = self.write_links()?;
        links.retain(|link| link.category_id != id);
        Ok(())
    }

    /// Lists the posts linked to a category.
    pub fn list_posts_in_category(&self, category_id: u64) -> Result<Vec<PostView>, BlogError> {
        let posts = self.read_posts()?;
        let categories = self.read_categories()?;
        let links = self.read_links()?;
        if !categories.contains_key(&category_id) {
            return Err(BlogError::category_not_found(category_id));
        }
        let query = PostQuery {
            category_id: Some(category_id),
            ..Default::default()
        };
        Ok(collect_posts(&posts, &categories, &links, &query))
    }

    // ---- bookkeeping ----

    pub fn post_count(&self) -> Result<usize, BlogError> {
        Ok(self.read_posts()?.len())
    }

    pub fn category_count(&self) -> Result<usize, BlogError> {
        Ok(self.read_categories()?.len())
    }

    pub fn link_count(&self) -> Result<usize, BlogError> {
        Ok(self.read_links()?.len())
    }

    /// Copies every table into a snapshot.
    pub fn snapshot(&self) -> Result<Snapshot, BlogError> {
        let posts = self.read_posts()?;
        let categories = self.read_categories()?;
        let links = self.read_links()?;
        Ok(Snapshot {
            posts: posts.values().cloned().collect(),
            categories: categories.values().cloned().collect(),
            links: links.iter().copied().collect(),
            next_post_id: self.next_post_id.load(Ordering::SeqCst),
            next_category_id: self.next_category_id.load(Ordering::SeqCst),
        })
    }

    /// Replaces every table with the snapshot's contents.
    ///
    /// The snapshot is validated first; on error the store is unchanged.
    pub fn restore(&self, snapshot: Snapshot) -> Result<(), BlogError> {
        let tables = snapshot.into_tables()?;
        let mut posts = self.write_posts()?;
        let mut categories = self.write_categories()?;
        let mut links = self.write_links()?;

        *posts = tables.posts;
        *categories = tables.categories;
        *links = tables.links;
        self.next_post_id.store(tables.next_post_id, Ordering::SeqCst);
        self.next_category_id.store(tables.next_category_id, Ordering::SeqCst);

        tracing::info!(
            "Restored {} posts, {} categories, {} links",
            posts.len(),
            categories.len(),
            links.len()
        );
        Ok(())
    }

    fn read_posts(&self) -> Result<RwLockReadGuard<'_, PostTable>, BlogError> {
        self.posts.read().map_err(|_| BlogError::LockPoisoned)
    }

    fn write_posts(&self) -> Result<RwLockWriteGuard<'_, PostTable>, BlogError> {
        self.posts.write().map_err(|_| BlogError::LockPoisoned)
    }

    fn read_categories(&self) -> Result<RwLockReadGuard<'_, CategoryTable>, BlogError> {
        self.categories.read().map_err(|_| BlogError::LockPoisoned)
    }

    fn write_categories(&self) -> Result<RwLockWriteGuard<'_, CategoryTable>, BlogError> {
        self.categories.write().map_err(|_| BlogError::LockPoisoned)
    }

    fn read_links(&self) -> Result<RwLockReadGuard<'_, LinkTable>, BlogError> {
        self.links.read().map_err(|_| BlogError::LockPoisoned)
    }

    fn write_links(&self) -> Result<RwLockWriteGuard<'_, LinkTable>, BlogError> {
        self.links.write().map_err(|_| BlogError::LockPoisoned)
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

/// Hands out the counter's current value and advances it.
fn allocate_id(counter: &AtomicU64, resource: ResourceKind) -> Result<u64, BlogError> {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |id| id.checked_add(1))
        .map_err(|_| BlogError::IdExhausted { resource })
}

fn ensure_link_targets(
    posts: &PostTable,
    categories: &CategoryTable,
    post_id: u64,
    category_id: u64,
) -> Result<(), BlogError> {
    if !posts.contains_key(&post_id) {
        return Err(BlogError::post_not_found(post_id));
    }
    if !categories.contains_key(&category_id) {
        return Err(BlogError::category_not_found(category_id));
    }
    Ok(())
}

fn linked_category_ids(links: &LinkTable, post_id: u64) -> Vec<u64> {
    links
        .range(PostCategory::post_range(post_id))
        .map(|link| link.category_id)
        .collect()
}

fn build_view(post: &Post, categories: &CategoryTable, links: &LinkTable) -> PostView {
    let categories = links
        .range(PostCategory::post_range(post.id))
        .filter_map(|link| categories.get(&link.category_id))
        .map(Category::to_ref)
        .collect();
    PostView {
        post: post.clone(),
        categories,
    }
}

fn collect_posts(
    posts: &PostTable,
    categories: &CategoryTable,
    links: &LinkTable,
    query: &PostQuery,
) -> Vec<PostView> {
    let matching = posts
        .values()
        .filter(|post| query.matches(post, &linked_category_ids(links, post.id)));
    query
        .paginate(matching)
        .into_iter()
        .map(|post| build_view(post, categories, links))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Database {
        let db = Database::new();
        db.create_category(NewCategory::named("Rust")).unwrap();
        db.create_category(NewCategory::named("Travel")).unwrap();
        db.create_post(NewPost::titled("Hello World")).unwrap();
        db.create_post(NewPost::titled("Second")).unwrap();
        db.add_category_to_post(1, 1).unwrap();
        db.add_category_to_post(1, 2).unwrap();
        db
    }

    #[test]
    fn created_post_gets_id_and_slug() {
        let db = Database::new();
        let view = db.create_post(NewPost::titled("New post")).unwrap();
        assert_eq!(view.post.id, 1);
        assert_eq!(view.post.slug, "new-post");
        assert!(view.categories.is_empty());
    }

    #[test]
    fn duplicate_titles_get_distinct_slugs() {
        let db = Database::new();
        let a = db.create_post(NewPost::titled("Same")).unwrap();
        let b = db.create_post(NewPost::titled("Same")).unwrap();
        assert_eq!(a.post.slug, "same");
        assert_eq!(b.post.slug, "same-2");
    }

    #[test]
    fn view_lists_categories_in_id_order() {
        let db = seeded();
        let view = db.get_post(1).unwrap();
        let names: Vec<_> = view.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Rust", "Travel"]);
    }

    #[test]
    fn link_lookup_checks_post_before_category() {
        let db = seeded();
        assert_eq!(
            db.add_category_to_post(99, 99),
            Err(BlogError::post_not_found(99))
        );
        assert_eq!(
            db.add_category_to_post(1, 99),
            Err(BlogError::category_not_found(99))
        );
    }

    #[test]
    fn adding_existing_link_is_a_no_op() {
        let db = seeded();
        assert_eq!(db.add_category_to_post(1, 1), Ok(false));
        assert_eq!(db.link_count().unwrap(), 2);
    }

    #[test]
    fn removing_link_drops_exactly_one_category() {
        let db = seeded();
        assert_eq!(db.remove_category_from_post(1, 1), Ok(true));
        assert_eq!(db.get_post(1).unwrap().categories.len(), 1);
        assert_eq!(db.remove_category_from_post(1, 1), Ok(false));
    }

    #[test]
    fn deleting_post_removes_its_links() {
        let db = seeded();
        db.delete_post(1).unwrap();
        assert_eq!(db.link_count().unwrap(), 0);
        assert_eq!(db.get_post(1), Err(BlogError::post_not_found(1)));
    }

    #[test]
    fn deleting_category_unlinks_posts() {
        let db = seeded();
        db.delete_category(2).unwrap();
        let view = db.get_post(1).unwrap();
        assert_eq!(view.categories.len(), 1);
        assert_eq!(view.categories[0].id, 1);
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let db = seeded();
        db.delete_post(2).unwrap();
        let view = db.create_post(NewPost::titled("Third")).unwrap();
        assert_eq!(view.post.id, 3);
    }

    #[test]
    fn update_keeps_slug() {
        let db = seeded();
        let patch = PostPatch {
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        let view = db.update_post(1, &patch).unwrap();
        assert_eq!(view.post.title, "Renamed");
        assert_eq!(view.post.slug, "hello-world");
    }

    #[test]
    fn posts_in_category_requires_existing_category() {
        let db = seeded();
        assert_eq!(db.list_posts_in_category(2).unwrap().len(), 1);
        assert_eq!(
            db.list_posts_in_category(42),
            Err(BlogError::category_not_found(42))
        );
    }

    #[test]
    fn snapshot_restores_into_fresh_database() {
        let db = seeded();
        db.delete_post(2).unwrap();
        let restored = Database::from_snapshot(db.snapshot().unwrap()).unwrap();
        let query = PostQuery::default();
        assert_eq!(restored.list_posts(&query), db.list_posts(&query));
        let view = restored.create_post(NewPost::titled("After restore")).unwrap();
        assert_eq!(view.post.id, 3);
    }

    #[test]
    fn exhausted_id_counter_rejects_create() {
        let db = Database::from_snapshot(Snapshot {
            next_post_id: u64::MAX,
            next_category_id: u64::MAX,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            db.create_post(NewPost::titled("Late")).map(|v| v.post.id),
            Err(BlogError::IdExhausted {
                resource: ResourceKind::Post
            })
        );
        assert_eq!(
            db.create_category(NewCategory::named("Late")).map(|c| c.id),
            Err(BlogError::IdExhausted {
                resource: ResourceKind::Category
            })
        );
        assert_eq!(db.post_count().unwrap(), 0);
        assert_eq!(db.category_count().unwrap(), 0);
    }
}
