//! Entity kinds handled by the indexer.

use std::fmt;

/// Index receiving product documents.
pub const PRODUCTS_INDEX: &str = "products_search";

/// Index receiving user documents.
pub const USERS_INDEX: &str = "users_search";

/// The kinds of relational entities that are synchronized into the search index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Product,
    User,
}

impl EntityKind {
    /// Every supported kind, in the order they are listed to operators.
    pub const ALL: [EntityKind; 2] = [EntityKind::Product, EntityKind::User];

    /// Short lowercase name used on the command line and in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Product => "product",
            EntityKind::User => "user",
        }
    }

    /// Look up a kind by its short name, as accepted on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Name of the search index holding documents of this kind.
    ///
    /// The index and its mappings are created outside of the indexer.
    pub fn index_name(&self) -> &'static str {
        match self {
            EntityKind::Product => PRODUCTS_INDEX,
            EntityKind::User => USERS_INDEX,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
