use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound on the derived `full_text` of a document, in characters.
pub const MAX_FULL_TEXT_CHARS: usize = 2000;

// =============================================================================
// Source records
// =============================================================================

/// A bill record as delivered by the document source.
///
/// Field names follow the upstream JSON (`introducedDate`, `latestAction`).
/// Everything except `id` and `title` is optional.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDocument {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub sponsor: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub introduced_date: Option<String>,
    #[serde(default)]
    pub latest_action: Option<String>,
}

/// Opaque payload returned alongside each result. The index never reads it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sponsor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// The unit of indexing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub id: String,
    pub title: String,
    pub summary: String,
    /// Title, summary, sponsor and tags joined by spaces, truncated to
    /// [`MAX_FULL_TEXT_CHARS`].
    pub full_text: String,
    pub metadata: BillMetadata,
}

impl DocumentRecord {
    /// Derive an indexable record from a raw source document.
    ///
    /// The derivation is a pure function of the raw fields, so identical
    /// source data always yields an identical `full_text`.
    pub fn from_raw(raw: RawDocument) -> Self {
        let summary = raw.summary.unwrap_or_default();
        let full_text = build_full_text(&raw.title, &summary, raw.sponsor.as_deref(), &raw.tags);

        Self {
            id: raw.id,
            title: raw.title,
            summary,
            full_text,
            metadata: BillMetadata {
                sponsor: raw.sponsor,
                date: raw.introduced_date,
                status: raw.latest_action,
                tags: raw.tags,
            },
        }
    }
}

impl From<RawDocument> for DocumentRecord {
    fn from(raw: RawDocument) -> Self {
        Self::from_raw(raw)
    }
}

/// Join the embedding-relevant fields and bound the result length.
pub fn build_full_text(title: &str, summary: &str, sponsor: Option<&str>, tags: &[String]) -> String {
    let parts = [title, summary, sponsor.unwrap_or("")]
        .into_iter()
        .chain(tags.iter().map(String::as_str))
        .map(str::trim)
        .filter(|p| !p.is_empty());

    let mut joined = String::new();
    for part in parts {
        if !joined.is_empty() {
            joined.push(' ');
        }
        joined.push_str(part);
    }

    truncate_chars(&joined, MAX_FULL_TEXT_CHARS)
}

/// Truncate to at most `max` characters without splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

// =============================================================================
// Index entries and results
// =============================================================================

/// A document paired with its embedding vector.
#[derive(Clone, Debug, PartialEq)]
pub struct BillEmbedding {
    pub document: DocumentRecord,
    pub embedding: Vec<f32>,
}

/// One ranked search hit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedResult {
    pub id: String,
    pub title: String,
    pub summary: String,
    /// Cosine similarity to the query, in `[-1, 1]`.
    pub similarity: f64,
    pub metadata: BillMetadata,
}

/// Response of the caller-facing search entry point.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<RankedResult>,
    pub total_results: usize,
    pub search_time_millis: u64,
}

impl SearchResponse {
    pub fn empty(search_time_millis: u64) -> Self {
        Self {
            results: Vec::new(),
            total_results: 0,
            search_time_millis,
        }
    }
}

// =============================================================================
// Introspection
// =============================================================================

/// Snapshot of the vector index contents.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub count: usize,
    pub is_built: bool,
    /// Vector length of the current build, if any.
    pub dimensions: Option<usize>,
}

/// Freshness of the managed index.
///
/// `Uninitialized` and `Stale` both trigger a rebuild before serving; they
/// are kept apart for observability only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexState {
    Uninitialized,
    Fresh,
    Stale,
}

/// Index stats plus lifecycle state, as reported by the index manager.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerStats {
    #[serde(flatten)]
    pub index: IndexStats,
    pub last_update: Option<DateTime<Utc>>,
    pub is_initialized: bool,
    pub state: IndexState,
}
