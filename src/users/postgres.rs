//! Postgres-backed user directory.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;
use uuid::Uuid;

use super::{Principal, UserDirectory, UserLookupError};

pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_roles(&self, user_id: Uuid) -> Result<Vec<String>, UserLookupError> {
        sqlx::query_scalar(
            "SELECT r.name
             FROM user_roles r
             JOIN account_user_roles ur ON ur.role_id = r.id
             WHERE ur.user_id = $1
             ORDER BY r.name",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| UserLookupError::Unavailable(err.to_string()))
    }

    async fn principal_from_row(
        &self,
        row: Option<sqlx::postgres::PgRow>,
    ) -> Result<Option<Principal>, UserLookupError> {
        let Some(row) = row else {
            return Ok(None);
        };

        let id: Uuid = row.get("id");
        let roles = self.load_roles(id).await?;

        Ok(Some(Principal {
            id,
            email: row.get("email"),
            password_hash: row.get("password"),
            enabled: row.get("enabled"),
            roles,
        }))
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn load_by_id(&self, id: Uuid) -> Result<Option<Principal>, UserLookupError> {
        let row = sqlx::query(
            "SELECT id, email, password, enabled FROM account_users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| UserLookupError::Unavailable(err.to_string()))?;

        self.principal_from_row(row).await
    }

    async fn load_by_email(&self, email: &str) -> Result<Option<Principal>, UserLookupError> {
        let row = sqlx::query(
            "SELECT id, email, password, enabled FROM account_users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| UserLookupError::Unavailable(err.to_string()))?;

        self.principal_from_row(row).await
    }
}
