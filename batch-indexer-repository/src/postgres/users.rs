//! User pages: `users` rows joined with their profile.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use tracing::{debug, instrument};

use super::limit;
use crate::errors::SourceError;
use crate::interfaces::RecordSource;
use batch_indexer_shared::{EntityKind, UserProfile, UserRecord};

const USER_PAGE_SQL: &str = r#"
    SELECT u.id, u.email, u.username, u.status, u.created_at, u.updated_at, u.deleted_at,
           p.user_id AS profile_user_id, p.full_name, p.phone_number, p.address, p.city,
           p.country, p.postal_code, p.birth_date, p.gender, p.profile_image_url, p.bio
    FROM users u
    LEFT JOIN user_profiles p ON p.user_id = u.id
    WHERE u.deleted_at IS NULL
      AND ($1::BIGINT IS NULL OR u.id > $1)
    ORDER BY u.id
    LIMIT $2
"#;

/// Reads live users in primary key order, each with its optional profile.
#[derive(Clone)]
pub struct UserSource {
    pool: PgPool,
}

impl UserSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_user(row: &PgRow) -> Result<UserRecord, SourceError> {
        let profile_user_id: Option<i64> = row.try_get("profile_user_id")?;
        let profile = match profile_user_id {
            Some(_) => Some(UserProfile {
                full_name: row.try_get("full_name")?,
                phone_number: row.try_get("phone_number")?,
                address: row.try_get("address")?,
                city: row.try_get("city")?,
                country: row.try_get("country")?,
                postal_code: row.try_get("postal_code")?,
                birth_date: row.try_get("birth_date")?,
                gender: row.try_get("gender")?,
                profile_image_url: row.try_get("profile_image_url")?,
                bio: row.try_get("bio")?,
            }),
            None => None,
        };

        Ok(UserRecord {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            username: row.try_get("username")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            deleted_at: row.try_get("deleted_at")?,
            profile,
        })
    }
}

#[async_trait]
impl RecordSource for UserSource {
    type Record = UserRecord;

    fn entity_kind(&self) -> EntityKind {
        EntityKind::User
    }

    #[instrument(skip(self))]
    async fn fetch_page(
        &self,
        after_key: Option<i64>,
        page_size: usize,
    ) -> Result<Vec<UserRecord>, SourceError> {
        let users = sqlx::query(USER_PAGE_SQL)
            .bind(after_key)
            .bind(limit(page_size))
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(Self::row_to_user)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = users.len(), "Fetched user page");
        Ok(users)
    }
}
