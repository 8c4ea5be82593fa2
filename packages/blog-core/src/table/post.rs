//! Post rows and their create/update payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::category::CategoryRef;
use super::validation::{double_option, require_non_empty};
use crate::error::BlogError;

/// Stored post row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Server-assigned id
    pub id: u64,
    pub title: String,
    pub lead: Option<String>,
    pub content: Option<String>,
    /// Cover image URL
    pub cover_photo: Option<String>,
    pub author_id: Option<u64>,
    pub pinned: bool,
    /// Derived from the title at creation, unique across posts
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Post together with its resolved categories, as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    /// Linked categories ordered by id
    pub categories: Vec<CategoryRef>,
}

/// Payload for creating a post.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    #[serde(default)]
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
}

impl NewPost {
    /// Convenience constructor with only a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Validates the payload and returns it with a trimmed title.
    pub fn normalize(mut self) -> Result<Self, BlogError> {
        self.title = require_non_empty("title", &self.title)?;
        if let Some(url) = &self.cover_photo {
            validate_cover_photo(url)?;
        }
        Ok(self)
    }
}

/// Partial update for a post. Absent keys are left untouched; unknown keys
/// are ignored. Nullable columns accept an explicit `null` to clear them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub lead: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub content: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub cover_photo: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub author_id: Option<Option<u64>>,
    #[serde(default)]
    pub pinned: Option<bool>,
}

impl PostPatch {
    /// Returns true when the patch would not change any column.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.lead.is_none()
            && self.content.is_none()
            && self.cover_photo.is_none()
            && self.author_id.is_none()
            && self.pinned.is_none()
    }

    /// Applies the patch to `post`. Validation happens before any column is
    /// written, so a rejected patch leaves the post unchanged.
    pub fn apply(&self, post: &mut Post) -> Result<(), BlogError> {
        let title = self
            .title
            .as_deref()
            .map(|t| require_non_empty("title", t))
            .transpose()?;
        if let Some(Some(url)) = &self.cover_photo {
            validate_cover_photo(url)?;
        }

        if let Some(title) = title {
            post.title = title;
        }
        if let Some(lead) = &self.lead {
            post.lead = lead.clone();
        }
        if let Some(content) = &self.content {
            post.content = content.clone();
        }
        if let Some(cover_photo) = &self.cover_photo {
            post.cover_photo = cover_photo.clone();
        }
        if let Some(author_id) = self.author_id {
            post.author_id = author_id;
        }
        if let Some(pinned) = self.pinned {
            post.pinned = pinned;
        }
        Ok(())
    }
}

fn validate_cover_photo(url: &str) -> Result<(), BlogError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(BlogError::Validation(format!(
            "coverPhoto must be an http(s) URL, got '{}'",
            url
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_post() -> Post {
        let now = Utc::now();
        Post {
            id: 1,
            title: "First".to_string(),
            lead: Some("lead".to_string()),
            content: Some("body".to_string()),
            cover_photo: None,
            author_id: Some(4),
            pinned: false,
            slug: "first".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn new_post_deserializes_camel_case() {
        let json = r#"{
            "title": "New post",
            "lead": "New post that you have to read",
            "content": "Great new post",
            "coverPhoto": "http://imgur.com",
            "authorId": null,
            "pinned": false
        }"#;
        let new_post: NewPost = serde_json::from_str(json).unwrap();
        assert_eq!(new_post.cover_photo.as_deref(), Some("http://imgur.com"));
        assert_eq!(new_post.author_id, None);
        assert!(new_post.normalize().is_ok());
    }

    #[test]
    fn new_post_without_title_fails_validation() {
        let new_post: NewPost = serde_json::from_str(r#"{"content": "x"}"#).unwrap();
        assert!(matches!(
            new_post.normalize(),
            Err(BlogError::Validation(_))
        ));
    }

    #[test]
    fn patch_ignores_unknown_keys() {
        let patch: PostPatch = serde_json::from_str(r#"{"name": "changed"}"#).unwrap();
        assert!(patch.is_empty());

        let expected = sample_post();
        let mut post = expected.clone();
        patch.apply(&mut post).unwrap();
        assert_eq!(post, expected);
    }

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let patch: PostPatch =
            serde_json::from_str(r#"{"lead": null, "pinned": true}"#).unwrap();
        let mut post = sample_post();
        patch.apply(&mut post).unwrap();
        assert_eq!(post.lead, None);
        assert_eq!(post.content.as_deref(), Some("body"));
        assert_eq!(post.author_id, Some(4));
        assert!(post.pinned);
    }

    #[test]
    fn rejected_patch_leaves_post_untouched() {
        let patch: PostPatch =
            serde_json::from_str(r#"{"title": " ", "pinned": true}"#).unwrap();
        let mut post = sample_post();
        assert!(patch.apply(&mut post).is_err());
        assert!(!post.pinned);
    }

    #[test]
    fn view_flattens_post_columns() {
        let view = PostView {
            post: sample_post(),
            categories: vec![CategoryRef {
                id: 2,
                name: "Travel".to_string(),
            }],
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["slug"], "first");
        assert_eq!(json["authorId"], 4);
        assert_eq!(json["categories"][0]["name"], "Travel");
    }
}
