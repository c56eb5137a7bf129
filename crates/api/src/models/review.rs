//! Product reviews.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use executive_core::{ProductId, Rating, ReviewId, UserId};

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub rating: Rating,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /products/{id}/reviews` and `PUT /reviews/{id}`.
///
/// `Rating` rejects values outside 1..=5 during deserialization.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReviewPayload {
    pub rating: Rating,
    #[serde(default)]
    pub comment: String,
}

impl ReviewPayload {
    #[must_use]
    pub fn into_review(self, product_id: ProductId, user_id: UserId, now: DateTime<Utc>) -> Review {
        Review {
            id: ReviewId::generate(),
            product_id,
            user_id,
            rating: self.rating,
            comment: self.comment,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn apply_to(self, existing: Review, now: DateTime<Utc>) -> Review {
        Review {
            rating: self.rating,
            comment: self.comment,
            updated_at: now,
            ..existing
        }
    }
}
