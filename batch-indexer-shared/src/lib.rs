//! # Batch Indexer Shared
//!
//! Types shared by every crate of the batch indexer: the relational source
//! aggregates read by the pipeline, the denormalized documents written to the
//! search index, and the text helpers used to derive search fields.

pub mod documents;
pub mod entity;
pub mod records;
pub mod text;

pub use documents::{IndexDocument, ProductDocument, UserDocument};
pub use entity::{EntityKind, PRODUCTS_INDEX, USERS_INDEX};
pub use records::{
    ProductDetail, ProductImage, ProductRecord, SourceRecord, UserProfile, UserRecord,
    THUMBNAIL_IMAGE_TYPE,
};
pub use text::{parse_meta_keywords, SearchTextBuilder};
