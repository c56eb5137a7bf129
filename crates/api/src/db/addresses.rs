//! Address queries.

use async_trait::async_trait;

use executive_core::{AddressId, UserId};

use super::{AddressStore, PgStore, RepositoryError, map_write_error};
use crate::models::Address;

const ADDRESS_COLUMNS: &str = "id, user_id, line1, line2, city, country, zip_code, created_at";

#[async_trait]
impl AddressStore for PgStore {
    async fn create_address(&self, address: &Address) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO addresses (id, user_id, line1, line2, city, country, zip_code, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(address.id)
        .bind(address.user_id)
        .bind(&address.line1)
        .bind(&address.line2)
        .bind(&address.city)
        .bind(&address.country)
        .bind(&address.zip_code)
        .bind(address.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;
        Ok(())
    }

    async fn current_address(&self, user_id: UserId) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, Address>(&format!(
            r"
            SELECT {ADDRESS_COLUMNS}
            FROM addresses
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn address_by_id(&self, id: AddressId) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_address(&self, address: &Address) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE addresses
            SET line1 = $3, line2 = $4, city = $5, country = $6, zip_code = $7
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(address.id)
        .bind(address.user_id)
        .bind(&address.line1)
        .bind(&address.line2)
        .bind(&address.city)
        .bind(&address.country)
        .bind(&address.zip_code)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
