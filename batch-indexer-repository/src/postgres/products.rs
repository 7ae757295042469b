//! Product pages: `products` rows with their detail and images.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::types::Json;
use sqlx::Row;
use std::collections::HashMap;
use tracing::{debug, instrument};

use super::limit;
use crate::errors::SourceError;
use crate::interfaces::RecordSource;
use batch_indexer_shared::{EntityKind, ProductDetail, ProductImage, ProductRecord};

const PRODUCT_PAGE_SQL: &str = r#"
    SELECT id, name, category, brand, sku, price, discount_price, stock, status,
           rating, review_count, created_at, updated_at, deleted_at
    FROM products
    WHERE deleted_at IS NULL
      AND ($1::BIGINT IS NULL OR id > $1)
    ORDER BY id
    LIMIT $2
"#;

const PRODUCT_DETAILS_SQL: &str = r#"
    SELECT product_id, description, long_description, specifications, features,
           dimensions, weight, manufacturer, origin_country, warranty_period, tags,
           meta_title, meta_description, meta_keywords
    FROM product_details
    WHERE product_id = ANY($1)
"#;

const PRODUCT_IMAGES_SQL: &str = r#"
    SELECT product_id, image_url, image_type, display_order, alt_text
    FROM product_images
    WHERE product_id = ANY($1)
    ORDER BY product_id, display_order, id
"#;

/// Reads live products in primary key order.
///
/// A page is assembled from three queries: the product rows, then the details
/// and images belonging to exactly those rows.
#[derive(Clone)]
pub struct ProductSource {
    pool: PgPool,
}

impl ProductSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_product(row: &PgRow) -> Result<ProductRecord, SourceError> {
        Ok(ProductRecord {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            category: row.try_get("category")?,
            brand: row.try_get("brand")?,
            sku: row.try_get("sku")?,
            price: row.try_get("price")?,
            discount_price: row.try_get("discount_price")?,
            stock: row.try_get("stock")?,
            status: row.try_get("status")?,
            rating: row.try_get("rating")?,
            review_count: row.try_get("review_count")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            deleted_at: row.try_get("deleted_at")?,
            detail: None,
            images: Vec::new(),
        })
    }

    fn row_to_detail(row: &PgRow) -> Result<(i64, ProductDetail), SourceError> {
        let features: Option<Json<Vec<String>>> = row.try_get("features")?;
        let tags: Option<Json<Vec<String>>> = row.try_get("tags")?;

        let detail = ProductDetail {
            description: row.try_get("description")?,
            long_description: row.try_get("long_description")?,
            specifications: row.try_get("specifications")?,
            features: features.map(|f| f.0),
            dimensions: row.try_get("dimensions")?,
            weight: row.try_get("weight")?,
            manufacturer: row.try_get("manufacturer")?,
            origin_country: row.try_get("origin_country")?,
            warranty_period: row.try_get("warranty_period")?,
            tags: tags.map(|t| t.0),
            meta_title: row.try_get("meta_title")?,
            meta_description: row.try_get("meta_description")?,
            meta_keywords: row.try_get("meta_keywords")?,
        };

        Ok((row.try_get("product_id")?, detail))
    }

    fn row_to_image(row: &PgRow) -> Result<(i64, ProductImage), SourceError> {
        let image = ProductImage {
            image_url: row.try_get("image_url")?,
            image_type: row.try_get("image_type")?,
            display_order: row.try_get("display_order")?,
            alt_text: row.try_get("alt_text")?,
        };

        Ok((row.try_get("product_id")?, image))
    }
}

#[async_trait]
impl RecordSource for ProductSource {
    type Record = ProductRecord;

    fn entity_kind(&self) -> EntityKind {
        EntityKind::Product
    }

    #[instrument(skip(self))]
    async fn fetch_page(
        &self,
        after_key: Option<i64>,
        page_size: usize,
    ) -> Result<Vec<ProductRecord>, SourceError> {
        let rows = sqlx::query(PRODUCT_PAGE_SQL)
            .bind(after_key)
            .bind(limit(page_size))
            .fetch_all(&self.pool)
            .await?;

        let mut products = rows
            .iter()
            .map(Self::row_to_product)
            .collect::<Result<Vec<_>, _>>()?;

        if products.is_empty() {
            return Ok(products);
        }

        let ids: Vec<i64> = products.iter().filter_map(|p| p.id).collect();

        let mut details: HashMap<i64, ProductDetail> = sqlx::query(PRODUCT_DETAILS_SQL)
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(Self::row_to_detail)
            .collect::<Result<_, _>>()?;

        let mut images: HashMap<i64, Vec<ProductImage>> = HashMap::new();
        for row in sqlx::query(PRODUCT_IMAGES_SQL)
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?
            .iter()
        {
            let (product_id, image) = Self::row_to_image(row)?;
            images.entry(product_id).or_default().push(image);
        }

        for product in &mut products {
            if let Some(id) = product.id {
                product.detail = details.remove(&id);
                product.images = images.remove(&id).unwrap_or_default();
            }
        }

        debug!(count = products.len(), "Fetched product page");
        Ok(products)
    }
}
