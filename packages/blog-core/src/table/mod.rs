//! Row types for the post, category, and post/category link tables.

mod category;
mod post;
mod query;
mod relation;
pub(crate) mod validation;

pub use category::{Category, CategoryPatch, CategoryRef, NewCategory};
pub use post::{NewPost, Post, PostPatch, PostView};
pub use query::PostQuery;
pub use relation::PostCategory;
