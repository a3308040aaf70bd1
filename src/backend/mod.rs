// Storage backend module
// Defines the capability contract the inspector relies on, so the real
// engine can be swapped for a scripted one in tests

pub mod lancedb;

pub use self::lancedb::LanceBackend;

use crate::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Which optional record fields a retrieval should fetch.
///
/// Identifiers and documents are always fetched; the original interface only
/// let callers toggle metadata and embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncludeFields {
    pub metadatas: bool,
    pub embeddings: bool,
}

impl Default for IncludeFields {
    #[inline]
    fn default() -> Self {
        Self {
            metadatas: true,
            embeddings: false,
        }
    }
}

/// One retrieval batch, as parallel sequences.
///
/// Index i across every sequence refers to the same record. Optional fields
/// are `None` when they were not requested or the collection does not carry
/// them; `distances` is only present on query results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionRecords {
    pub ids: Vec<String>,
    pub documents: Vec<Option<String>>,
    pub metadatas: Option<Vec<Option<Value>>>,
    pub embeddings: Option<Vec<Option<Vec<f32>>>>,
    pub distances: Option<Vec<f32>>,
}

impl CollectionRecords {
    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Convert the batch into the normalizer's field snapshot, in canonical
    /// display order. Absent optional fields are omitted entirely.
    #[inline]
    pub fn into_fields(self) -> Vec<(String, Value)> {
        let mut fields = vec![
            ("ids".to_string(), to_value(self.ids)),
            ("documents".to_string(), to_value(self.documents)),
        ];
        if let Some(metadatas) = self.metadatas {
            let cells = metadatas
                .into_iter()
                .map(|metadata| metadata.unwrap_or(Value::Null))
                .collect();
            fields.push(("metadatas".to_string(), Value::Array(cells)));
        }
        if let Some(embeddings) = self.embeddings {
            fields.push(("embeddings".to_string(), to_value(embeddings)));
        }
        if let Some(distances) = self.distances {
            fields.push(("distances".to_string(), to_value(distances)));
        }
        fields
    }
}

fn to_value<T: serde::Serialize>(sequence: T) -> Value {
    // Serializing vectors of strings/floats cannot fail; non-finite floats
    // degrade to null cells rather than poisoning the whole batch.
    serde_json::to_value(sequence).unwrap_or(Value::Null)
}

/// Capability set exposed by the storage + retrieval engine.
///
/// Implementations own the similarity ordering contract: `query` returns
/// matches most-similar-first exactly as the engine produced them, and may
/// assume `k` was already clamped to the collection size by the caller.
#[async_trait]
pub trait VectorBackend: Send + Sync {
    /// Ordered names of the collections currently present. Empty if none.
    async fn collection_names(&self) -> Result<Vec<String>>;

    /// Number of records currently stored in the named collection.
    async fn count_records(&self, collection: &str) -> Result<usize>;

    /// Retrieve every record of the named collection.
    async fn get_records(
        &self,
        collection: &str,
        include: IncludeFields,
    ) -> Result<CollectionRecords>;

    /// Retrieve the `k` records most similar to the free-text probe.
    async fn query(
        &self,
        collection: &str,
        text: &str,
        k: usize,
        include: IncludeFields,
    ) -> Result<CollectionRecords>;
}
