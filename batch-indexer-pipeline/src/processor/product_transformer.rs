//! Product record to product document.

use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{DateTime, Utc};

use super::Transformer;
use crate::errors::TransformError;
use batch_indexer_shared::{
    parse_meta_keywords, ProductDetail, ProductDocument, ProductImage, ProductRecord,
    SearchTextBuilder,
};

/// Builds `products_search` documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductTransformer;

impl Transformer for ProductTransformer {
    type Record = ProductRecord;
    type Document = ProductDocument;

    fn transform(
        &self,
        record: &ProductRecord,
        indexed_at: DateTime<Utc>,
    ) -> Result<ProductDocument, TransformError> {
        let id = record.id.ok_or(TransformError::MissingId)?;
        let empty = ProductDetail::default();
        let detail = record.detail.as_ref().unwrap_or(&empty);

        let search_text = SearchTextBuilder::new()
            .field(Some(&record.name))
            .field(detail.description.as_deref())
            .field(detail.long_description.as_deref())
            .list(detail.tags.as_deref())
            .list(detail.features.as_deref())
            .build();

        let images = images_by_display_order(&record.images);
        let thumbnail_url = images
            .iter()
            .find(|image| image.is_thumbnail())
            .or_else(|| images.first())
            .map(|image| image.image_url.clone());

        Ok(ProductDocument {
            id: id.to_string(),
            name: record.name.clone(),
            category: record.category.clone(),
            brand: record.brand.clone(),
            sku: record.sku.clone(),
            price: to_float("price", &record.price)?,
            discount_price: to_float_opt("discountPrice", record.discount_price.as_ref())?,
            stock: record.stock,
            status: record.status.clone(),
            rating: to_float_opt("rating", record.rating.as_ref())?,
            review_count: record.review_count,
            description: detail.description.clone(),
            long_description: detail.long_description.clone(),
            specifications: detail.specifications.clone(),
            features: detail.features.clone(),
            dimensions: detail.dimensions.clone(),
            weight: to_float_opt("weight", detail.weight.as_ref())?,
            manufacturer: detail.manufacturer.clone(),
            origin_country: detail.origin_country.clone(),
            warranty_period: detail.warranty_period,
            tags: detail.tags.clone(),
            search_text,
            meta_title: detail.meta_title.clone(),
            meta_description: detail.meta_description.clone(),
            meta_keywords: detail.meta_keywords.as_deref().map(parse_meta_keywords),
            image_urls: images.iter().map(|image| image.image_url.clone()).collect(),
            thumbnail_url,
            created_at: record.created_at,
            updated_at: record.updated_at,
            indexed_at,
        })
    }
}

// Stable, so images sharing a display order keep their source order.
fn images_by_display_order(images: &[ProductImage]) -> Vec<&ProductImage> {
    let mut sorted: Vec<&ProductImage> = images.iter().collect();
    sorted.sort_by_key(|image| image.display_order);
    sorted
}

fn to_float(field: &'static str, value: &BigDecimal) -> Result<f64, TransformError> {
    value
        .to_f64()
        .filter(|f| f.is_finite())
        .ok_or_else(|| TransformError::numeric(field, value))
}

fn to_float_opt(
    field: &'static str,
    value: Option<&BigDecimal>,
) -> Result<Option<f64>, TransformError> {
    value.map(|v| to_float(field, v)).transpose()
}
