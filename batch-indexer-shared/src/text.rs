//! Helpers deriving search fields from source text.

/// Builds a search text by appending fields in a fixed order.
///
/// Absent fields are omitted, list fields are flattened into space-separated
/// tokens, and the surviving pieces are joined with a single space. Blank
/// strings and empty lists contribute nothing, so the result never contains
/// doubled or trailing separators.
///
/// Note that a present but blank value is dropped too, not only a null one:
/// `Some("  ")` adds nothing where a plain null filter would add a space.
///
/// ```
/// use batch_indexer_shared::SearchTextBuilder;
///
/// let tags = vec!["tag1".to_string(), "tag2".to_string()];
/// let text = SearchTextBuilder::new()
///     .field(Some("Test Product"))
///     .field(None)
///     .list(Some(&tags))
///     .build();
///
/// assert_eq!(text, "Test Product tag1 tag2");
/// ```
#[derive(Debug, Default)]
pub struct SearchTextBuilder {
    pieces: Vec<String>,
}

impl SearchTextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a scalar field.
    pub fn field(mut self, value: Option<&str>) -> Self {
        if let Some(value) = value {
            if !value.trim().is_empty() {
                self.pieces.push(value.to_string());
            }
        }
        self
    }

    /// Append a list field as space-joined tokens.
    pub fn list(mut self, values: Option<&[String]>) -> Self {
        if let Some(values) = values {
            let joined = values
                .iter()
                .filter(|v| !v.trim().is_empty())
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" ");
            if !joined.is_empty() {
                self.pieces.push(joined);
            }
        }
        self
    }

    pub fn build(self) -> String {
        self.pieces.join(" ")
    }
}

/// Split a comma-separated keyword string into trimmed, non-empty tokens.
pub fn parse_meta_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
