// Inspection adapter module
// Ties the backend contract and the tabular normalizer together


use crate::backend::{CollectionRecords, IncludeFields, LanceBackend, VectorBackend};
use crate::config::Config;
use crate::embeddings::OllamaClient;
use crate::table::{self, DataTable};
use crate::{PeekError, Result};
use std::path::Path;
use tracing::debug;

/// Default number of matches a similarity query returns
pub const DEFAULT_QUERY_RESULTS: usize = 3;

/// Read-only inspector over one open persistence directory.
///
/// Generic over the backend contract so the whole retrieve-then-normalize
/// flow can run against a scripted backend in tests.
pub struct Peeker<B> {
    backend: B,
}

impl Peeker<LanceBackend> {
    /// Open a persistence directory with the production backend, embedding
    /// probe text through the configured Ollama service.
    #[inline]
    pub async fn open(path: &Path, config: &Config) -> Result<Self> {
        let embedder = OllamaClient::new(config.ollama.clone())
            .map_err(|e| PeekError::Config(e.to_string()))?;
        let backend = LanceBackend::connect(path, Box::new(embedder)).await?;
        Ok(Self::new(backend))
    }
}

impl<B: VectorBackend> Peeker<B> {
    #[inline]
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Names of the collections in the open directory.
    #[inline]
    pub async fn collections(&self) -> Result<Vec<String>> {
        self.backend.collection_names().await
    }

    /// Every record of the named collection, un-normalized.
    #[inline]
    pub async fn collection_records(
        &self,
        collection: &str,
        include: IncludeFields,
    ) -> Result<CollectionRecords> {
        self.backend.get_records(collection, include).await
    }

    /// Every record of the named collection as a flat table.
    #[inline]
    pub async fn collection_table(
        &self,
        collection: &str,
        include: IncludeFields,
    ) -> Result<DataTable> {
        let records = self.collection_records(collection, include).await?;
        Ok(table::to_table(&records.into_fields()))
    }

    /// The `k` records most similar to `text`, un-normalized.
    ///
    /// `k` is clamped to the collection's current size so the engine never
    /// sees an oversized request; an empty collection is a zero-result
    /// condition, not an error. Result order is the backend's.
    #[inline]
    pub async fn query_records(
        &self,
        text: &str,
        collection: &str,
        k: usize,
        include: IncludeFields,
    ) -> Result<CollectionRecords> {
        let size = self.backend.count_records(collection).await?;
        if size == 0 {
            debug!("Collection {} is empty, skipping query", collection);
            return Ok(empty_result(include));
        }

        let clamped = k.min(size);
        if clamped < k {
            debug!(
                "Clamped query limit from {} to collection size {}",
                k, size
            );
        }
        self.backend.query(collection, text, clamped, include).await
    }

    /// The `k` records most similar to `text` as a flat table.
    #[inline]
    pub async fn query_table(
        &self,
        text: &str,
        collection: &str,
        k: usize,
        include: IncludeFields,
    ) -> Result<DataTable> {
        let records = self.query_records(text, collection, k, include).await?;
        Ok(table::to_table(&records.into_fields()))
    }
}

/// Zero matches, shaped like a real query result so the structurally implied
/// columns still appear in the normalized table.
fn empty_result(include: IncludeFields) -> CollectionRecords {
    CollectionRecords {
        metadatas: include.metadatas.then(Vec::new),
        embeddings: include.embeddings.then(Vec::new),
        distances: Some(Vec::new()),
        ..CollectionRecords::default()
    }
}
