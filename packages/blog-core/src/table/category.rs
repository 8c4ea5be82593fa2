//! Category rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::require_non_empty;
use crate::error::BlogError;

/// Stored category row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: u64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Short reference embedded in post bodies.
    pub fn to_ref(&self) -> CategoryRef {
        CategoryRef {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// Category reference embedded in a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: u64,
    pub name: String,
}

/// Payload for creating a category.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCategory {
    #[serde(default)]
    pub name: String,
}

impl NewCategory {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Validates the payload and returns it with a trimmed name.
    pub fn normalize(mut self) -> Result<Self, BlogError> {
        self.name = require_non_empty("name", &self.name)?;
        Ok(self)
    }
}

/// Partial update for a category.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryPatch {
    #[serde(default)]
    pub name: Option<String>,
}

impl CategoryPatch {
    pub fn apply(&self, category: &mut Category) -> Result<(), BlogError> {
        if let Some(name) = &self.name {
            category.name = require_non_empty("name", name)?;
        }
        Ok(())
    }
}
