//! Product categories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use executive_core::CategoryId;

use super::{ValidationError, require_text};

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryPayload {
    #[serde(default)]
    pub name: String,
}

impl CreateCategoryPayload {
    /// # Errors
    ///
    /// Returns `ValidationError` if the name is blank.
    pub fn into_category(self, now: DateTime<Utc>) -> Result<Category, ValidationError> {
        Ok(Category {
            id: CategoryId::generate(),
            name: require_text("name", &self.name)?,
            created_at: now,
        })
    }
}
