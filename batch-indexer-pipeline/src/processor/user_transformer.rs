//! User record to user document.

use chrono::{DateTime, Utc};

use super::Transformer;
use crate::errors::TransformError;
use batch_indexer_shared::{SearchTextBuilder, UserDocument, UserProfile, UserRecord};

/// Builds `users_search` documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserTransformer;

impl Transformer for UserTransformer {
    type Record = UserRecord;
    type Document = UserDocument;

    fn transform(
        &self,
        record: &UserRecord,
        indexed_at: DateTime<Utc>,
    ) -> Result<UserDocument, TransformError> {
        let id = record.id.ok_or(TransformError::MissingId)?;
        let empty = UserProfile::default();
        let profile = record.profile.as_ref().unwrap_or(&empty);

        let search_text = SearchTextBuilder::new()
            .field(Some(&record.username))
            .field(profile.full_name.as_deref())
            .field(Some(&record.email))
            .field(profile.bio.as_deref())
            .field(profile.city.as_deref())
            .field(profile.country.as_deref())
            .build();

        Ok(UserDocument {
            id: id.to_string(),
            email: record.email.clone(),
            username: record.username.clone(),
            status: record.status.clone(),
            full_name: profile.full_name.clone(),
            phone_number: profile.phone_number.clone(),
            address: profile.address.clone(),
            city: profile.city.clone(),
            country: profile.country.clone(),
            postal_code: profile.postal_code.clone(),
            birth_date: profile.birth_date,
            gender: profile.gender.clone(),
            profile_image_url: profile.profile_image_url.clone(),
            bio: profile.bio.clone(),
            search_text,
            search_count: None,
            purchase_count: None,
            last_activity_at: None,
            preferred_categories: None,
            created_at: record.created_at,
            updated_at: record.updated_at,
            deleted_at: record.deleted_at,
            indexed_at,
        })
    }
}
