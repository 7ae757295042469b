//! Search index documents.
//!
//! Documents are the denormalized, search-ready form of the source records.
//! Field names are serialized in camelCase to match the externally managed
//! index mappings.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A document that can be written to the search index.
pub trait IndexDocument: Serialize + Send + Sync {
    /// The document id. Never empty for a produced document.
    fn document_id(&self) -> &str;
}

/// Document stored in the `products_search` index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDocument {
    pub id: String,

    pub name: String,
    pub category: String,
    pub brand: Option<String>,
    pub sku: Option<String>,
    pub price: f64,
    pub discount_price: Option<f64>,
    pub stock: i32,
    pub status: String,
    pub rating: Option<f64>,
    pub review_count: i32,

    pub description: Option<String>,
    pub long_description: Option<String>,
    pub specifications: Option<Value>,
    pub features: Option<Vec<String>>,
    pub dimensions: Option<String>,
    pub weight: Option<f64>,
    pub manufacturer: Option<String>,
    pub origin_country: Option<String>,
    pub warranty_period: Option<i32>,
    pub tags: Option<Vec<String>>,

    /// Concatenation of name, descriptions, tags and features.
    pub search_text: String,

    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<Vec<String>>,

    /// Image URLs by ascending display order.
    pub image_urls: Vec<String>,
    pub thumbnail_url: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// When the pipeline produced this document.
    pub indexed_at: DateTime<Utc>,
}

impl IndexDocument for ProductDocument {
    fn document_id(&self) -> &str {
        &self.id
    }
}

/// Document stored in the `users_search` index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    pub id: String,

    pub email: String,
    pub username: String,
    pub status: String,

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

    /// Concatenation of username, full name, email, bio, city and country.
    pub search_text: String,

    // Activity fields are mapped in the index but not sourced yet; always null.
    pub search_count: Option<i64>,
    pub purchase_count: Option<i64>,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub preferred_categories: Option<Vec<String>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub indexed_at: DateTime<Utc>,
}

impl IndexDocument for UserDocument {
    fn document_id(&self) -> &str {
        &self.id
    }
}
