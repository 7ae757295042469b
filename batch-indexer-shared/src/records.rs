//! Source record aggregates.
//!
//! A record is the fully populated aggregate of one relational row: the row's
//! scalar columns plus its pre-fetched associations. The pipeline never loads
//! associations lazily, so everything the transformers need lives here.

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

/// Image type marking the thumbnail of a product.
pub const THUMBNAIL_IMAGE_TYPE: &str = "THUMBNAIL";

/// Common view over the record aggregates read from the relational store.
pub trait SourceRecord: Send + Sync {
    /// Primary key used for keyset pagination and as the document id.
    ///
    /// Persisted rows always carry one; `None` only occurs for aggregates that
    /// were never stored.
    fn source_key(&self) -> Option<i64>;

    /// Whether the row is soft deleted.
    fn is_soft_deleted(&self) -> bool;
}

/// A row of the `products` table with its detail and images.
#[derive(Debug, Clone)]
pub struct ProductRecord {
    pub id: Option<i64>,
    pub name: String,
    pub category: String,
    pub brand: Option<String>,
    pub sku: Option<String>,
    pub price: BigDecimal,
    pub discount_price: Option<BigDecimal>,
    pub stock: i32,
    pub status: String,
    pub rating: Option<BigDecimal>,
    pub review_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    /// Row of `product_details`, if the product has one.
    pub detail: Option<ProductDetail>,
    /// Rows of `product_images`, ordered by display order.
    pub images: Vec<ProductImage>,
}

impl ProductRecord {
    /// Create a product with the required columns and defaults for the rest.
    pub fn new(
        id: i64,
        name: impl Into<String>,
        category: impl Into<String>,
        price: BigDecimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
            category: category.into(),
            brand: None,
            sku: None,
            price,
            discount_price: None,
            stock: 0,
            status: "AVAILABLE".to_string(),
            rating: None,
            review_count: 0,
            created_at: timestamp,
            updated_at: timestamp,
            deleted_at: None,
            detail: None,
            images: Vec::new(),
        }
    }

    /// Attach a detail row.
    pub fn with_detail(mut self, detail: ProductDetail) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Attach image rows.
    pub fn with_images(mut self, images: Vec<ProductImage>) -> Self {
        self.images = images;
        self
    }
}

impl SourceRecord for ProductRecord {
    fn source_key(&self) -> Option<i64> {
        self.id
    }

    fn is_soft_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// A row of the `product_details` table.
#[derive(Debug, Clone, Default)]
pub struct ProductDetail {
    pub description: Option<String>,
    pub long_description: Option<String>,
    /// Free-form JSON object of specification name to value.
    pub specifications: Option<Value>,
    pub features: Option<Vec<String>>,
    pub dimensions: Option<String>,
    pub weight: Option<BigDecimal>,
    pub manufacturer: Option<String>,
    pub origin_country: Option<String>,
    pub warranty_period: Option<i32>,
    pub tags: Option<Vec<String>>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    /// Comma-separated keywords as stored.
    pub meta_keywords: Option<String>,
}

/// A row of the `product_images` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductImage {
    pub image_url: String,
    pub image_type: String,
    pub display_order: i32,
    pub alt_text: Option<String>,
}

impl ProductImage {
    /// Create a regular product image.
    pub fn new(image_url: impl Into<String>, display_order: i32) -> Self {
        Self {
            image_url: image_url.into(),
            image_type: "PRODUCT".to_string(),
            display_order,
            alt_text: None,
        }
    }

    /// Create an image tagged as the product thumbnail.
    pub fn thumbnail(image_url: impl Into<String>, display_order: i32) -> Self {
        Self {
            image_type: THUMBNAIL_IMAGE_TYPE.to_string(),
            ..Self::new(image_url, display_order)
        }
    }

    pub fn is_thumbnail(&self) -> bool {
        self.image_type == THUMBNAIL_IMAGE_TYPE
    }
}

/// A row of the `users` table with its profile.
///
/// The password column is never read by the indexer.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Option<i64>,
    pub email: String,
    pub username: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    /// Row of `user_profiles`, if the user has one.
    pub profile: Option<UserProfile>,
}

impl UserRecord {
    /// Create a user with the required columns and defaults for the rest.
    pub fn new(
        id: i64,
        email: impl Into<String>,
        username: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Some(id),
            email: email.into(),
            username: username.into(),
            status: "ACTIVE".to_string(),
            created_at: timestamp,
            updated_at: timestamp,
            deleted_at: None,
            profile: None,
        }
    }

    /// Attach a profile row.
    pub fn with_profile(mut self, profile: UserProfile) -> Self {
        self.profile = Some(profile);
        self
    }
}

impl SourceRecord for UserRecord {
    fn source_key(&self) -> Option<i64> {
        self.id
    }

    fn is_soft_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// A row of the `user_profiles` table.
#[derive(Debug, Clone, Default)]
pub struct UserProfile {
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub profile_image_url: Option<String>,
    pub bio: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_product_defaults() {
        let now = Utc::now();
        let product = ProductRecord::new(
            7,
            "Desk Lamp",
            "Lighting",
            BigDecimal::from_str("39.90").unwrap(),
            now,
        );

        assert_eq!(product.source_key(), Some(7));
        assert_eq!(product.status, "AVAILABLE");
        assert!(!product.is_soft_deleted());
        assert!(product.detail.is_none());
        assert!(product.images.is_empty());
    }

    #[test]
    fn test_soft_deleted_user() {
        let now = Utc::now();
        let mut user = UserRecord::new(3, "a@example.com", "alice", now);
        assert!(!user.is_soft_deleted());

        user.deleted_at = Some(now);
        assert!(user.is_soft_deleted());
    }

    #[test]
    fn test_thumbnail_image() {
        assert!(ProductImage::thumbnail("b.png", 1).is_thumbnail());
        assert!(!ProductImage::new("a.png", 2).is_thumbnail());
    }
}
