//! Shipping addresses.
//!
//! A user may have many rows; the most recently created one is current.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use executive_core::{AddressId, UserId};

use super::{ValidationError, require_text};

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub line1: String,
    pub line2: String,
    pub city: String,
    pub country: String,
    pub zip_code: String,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /address` and `PUT /address/{id}`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddressPayload {
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub line2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub zip_code: String,
}

impl AddressPayload {
    /// # Errors
    ///
    /// Returns `ValidationError` if city, country or zip code is blank.
    pub fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            city: require_text("city", &self.city)?,
            country: require_text("country", &self.country)?,
            zip_code: require_text("zip_code", &self.zip_code)?,
            line1: self.line1.trim().to_owned(),
            line2: self.line2.trim().to_owned(),
        })
    }

    #[must_use]
    pub fn into_address(self, user_id: UserId, now: DateTime<Utc>) -> Address {
        Address {
            id: AddressId::generate(),
            user_id,
            line1: self.line1,
            line2: self.line2,
            city: self.city,
            country: self.country,
            zip_code: self.zip_code,
            created_at: now,
        }
    }

    #[must_use]
    pub fn apply_to(self, existing: Address) -> Address {
        Address {
            line1: self.line1,
            line2: self.line2,
            city: self.city,
            country: self.country,
            zip_code: self.zip_code,
            ..existing
        }
    }
}
