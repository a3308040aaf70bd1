
use super::{CollectionRecords, IncludeFields, VectorBackend};
use crate::embeddings::Embedder;
use crate::{PeekError, Result};
use arrow::array::{Array, FixedSizeListArray, Float32Array, StringArray};
use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::{
    Connection, Table,
    query::{ExecutableQuery, QueryBase, Select},
};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

/// Identifier column expected in every collection
pub const ID_COLUMN: &str = "id";
/// Document text column
pub const DOCUMENT_COLUMN: &str = "document";
/// JSON-encoded metadata column
pub const METADATA_COLUMN: &str = "metadata";
/// Embedding vector column
pub const VECTOR_COLUMN: &str = "vector";

const DISTANCE_COLUMN: &str = "_distance";

/// Read-only view over a LanceDB persistence directory.
///
/// Tables are collections. Free-text probes are turned into vectors by the
/// injected [`Embedder`] before being handed to the engine's vector search;
/// the engine owns the similarity ordering.
pub struct LanceBackend {
    connection: Connection,
    embedder: Box<dyn Embedder>,
}

impl LanceBackend {
    /// Open a persistence directory.
    ///
    /// The path must name an existing, readable directory; this tool never
    /// creates one, which is what separates inspecting a database from
    /// accidentally initializing an empty one at a mistyped path.
    #[inline]
    pub async fn connect(path: &Path, embedder: Box<dyn Embedder>) -> Result<Self> {
        let resolved = path.canonicalize().map_err(|e| {
            PeekError::Connection(format!(
                "Cannot open persistence directory {}: {}",
                path.display(),
                e
            ))
        })?;

        if !resolved.is_dir() {
            return Err(PeekError::Connection(format!(
                "Persistence path {} is not a directory",
                path.display()
            )));
        }

        let uri = format!("file://{}", resolved.display());
        let connection = lancedb::connect(&uri).execute().await.map_err(|e| {
            PeekError::Connection(format!(
                "Failed to open persistence directory {}: {}",
                path.display(),
                e
            ))
        })?;

        debug!("Opened persistence directory at {}", resolved.display());
        Ok(Self {
            connection,
            embedder,
        })
    }

    async fn open_table(&self, collection: &str) -> Result<Table> {
        match self.connection.open_table(collection).execute().await {
            Ok(table) => Ok(table),
            Err(lancedb::Error::TableNotFound { .. }) => {
                Err(PeekError::CollectionNotFound(collection.to_string()))
            }
            Err(e) => Err(backend_err(e)),
        }
    }
}

#[async_trait]
impl VectorBackend for LanceBackend {
    async fn collection_names(&self) -> Result<Vec<String>> {
        self.connection
            .table_names()
            .execute()
            .await
            .map_err(backend_err)
    }

    async fn count_records(&self, collection: &str) -> Result<usize> {
        let table = self.open_table(collection).await?;
        table.count_rows(None).await.map_err(backend_err)
    }

    async fn get_records(
        &self,
        collection: &str,
        include: IncludeFields,
    ) -> Result<CollectionRecords> {
        let table = self.open_table(collection).await?;
        let schema = table.schema().await.map_err(backend_err)?;
        let plan = FieldPlan::build(collection, &schema, include)?;

        let stream = table
            .query()
            .select(Select::columns(&plan.columns))
            .execute()
            .await
            .map_err(backend_err)?;

        let records = collect_records(stream, &plan).await?;
        debug!(
            "Retrieved {} records from collection {}",
            records.len(),
            collection
        );
        Ok(records)
    }

    async fn query(
        &self,
        collection: &str,
        text: &str,
        k: usize,
        include: IncludeFields,
    ) -> Result<CollectionRecords> {
        let table = self.open_table(collection).await?;

        let vector = self
            .embedder
            .embed(text)
            .map_err(|e| PeekError::Embedding(format!("Failed to embed query text: {}", e)))?;
        debug!("Embedded probe text into {} dimensions", vector.len());

        let schema = table.schema().await.map_err(backend_err)?;
        let plan = FieldPlan::build(collection, &schema, include)?;

        let stream = table
            .vector_search(vector.as_slice())
            .map_err(backend_err)?
            .column(VECTOR_COLUMN)
            .select(Select::columns(&plan.columns))
            .limit(k)
            .execute()
            .await
            .map_err(backend_err)?;

        let records = collect_records(stream, &plan).await?;
        debug!(
            "Query over collection {} returned {} matches",
            collection,
            records.len()
        );
        Ok(records)
    }
}

/// Columns to fetch for one retrieval, intersected with the table's schema.
struct FieldPlan {
    columns: Vec<String>,
    metadata: bool,
    embeddings: bool,
}

impl FieldPlan {
    fn build(collection: &str, schema: &Schema, include: IncludeFields) -> Result<Self> {
        if !has_column(schema, ID_COLUMN) {
            return Err(PeekError::Backend(format!(
                "Collection '{}' has no '{}' column",
                collection, ID_COLUMN
            )));
        }

        let mut columns = vec![ID_COLUMN.to_string()];
        if has_column(schema, DOCUMENT_COLUMN) {
            columns.push(DOCUMENT_COLUMN.to_string());
        }

        let metadata = include.metadatas && has_column(schema, METADATA_COLUMN);
        if metadata {
            columns.push(METADATA_COLUMN.to_string());
        }

        let embeddings = include.embeddings && has_column(schema, VECTOR_COLUMN);
        if embeddings {
            columns.push(VECTOR_COLUMN.to_string());
        }

        Ok(Self {
            columns,
            metadata,
            embeddings,
        })
    }
}

fn has_column(schema: &Schema, name: &str) -> bool {
    schema.fields().iter().any(|field| field.name() == name)
}

async fn collect_records(
    mut stream: lancedb::arrow::SendableRecordBatchStream,
    plan: &FieldPlan,
) -> Result<CollectionRecords> {
    let mut records = CollectionRecords {
        metadatas: plan.metadata.then(Vec::new),
        embeddings: plan.embeddings.then(Vec::new),
        ..CollectionRecords::default()
    };

    while let Some(batch) = stream
        .try_next()
        .await
        .map_err(|e| PeekError::Backend(format!("Failed to read result stream: {}", e)))?
    {
        append_batch(&batch, &mut records)?;
    }

    Ok(records)
}

fn append_batch(batch: &RecordBatch, records: &mut CollectionRecords) -> Result<()> {
    let rows = batch.num_rows();

    let ids = batch
        .column_by_name(ID_COLUMN)
        .ok_or_else(|| PeekError::Backend(format!("Missing {} column", ID_COLUMN)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| PeekError::Backend(format!("Invalid {} column type", ID_COLUMN)))?;
    for row in 0..rows {
        records.ids.push(ids.value(row).to_string());
    }

    // A collection without a document column still yields one (null) document
    // per record, keeping the parallel sequences aligned.
    match batch.column_by_name(DOCUMENT_COLUMN) {
        Some(column) => {
            let documents = column
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| {
                    PeekError::Backend(format!("Invalid {} column type", DOCUMENT_COLUMN))
                })?;
            for row in 0..rows {
                records.documents.push(if documents.is_null(row) {
                    None
                } else {
                    Some(documents.value(row).to_string())
                });
            }
        }
        None => records.documents.resize(records.ids.len(), None),
    }

    if let Some(metadatas) = records.metadatas.as_mut() {
        let column = batch
            .column_by_name(METADATA_COLUMN)
            .ok_or_else(|| PeekError::Backend(format!("Missing {} column", METADATA_COLUMN)))?
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| PeekError::Backend(format!("Invalid {} column type", METADATA_COLUMN)))?;
        for row in 0..rows {
            metadatas.push(parse_metadata(column, row));
        }
    }

    if let Some(embeddings) = records.embeddings.as_mut() {
        let column = batch
            .column_by_name(VECTOR_COLUMN)
            .ok_or_else(|| PeekError::Backend(format!("Missing {} column", VECTOR_COLUMN)))?
            .as_any()
            .downcast_ref::<FixedSizeListArray>()
            .ok_or_else(|| PeekError::Backend(format!("Invalid {} column type", VECTOR_COLUMN)))?;
        for row in 0..rows {
            if column.is_null(row) {
                embeddings.push(None);
            } else {
                let cell = column.value(row);
                let floats = cell
                    .as_any()
                    .downcast_ref::<Float32Array>()
                    .ok_or_else(|| {
                        PeekError::Backend(format!("Invalid {} column item type", VECTOR_COLUMN))
                    })?;
                embeddings.push(Some(floats.values().to_vec()));
            }
        }
    }

    // Only present on query results; the engine appends it after the
    // selected columns.
    if let Some(column) = batch.column_by_name(DISTANCE_COLUMN) {
        let scores = column
            .as_any()
            .downcast_ref::<Float32Array>()
            .ok_or_else(|| PeekError::Backend(format!("Invalid {} column type", DISTANCE_COLUMN)))?;
        let distances = records.distances.get_or_insert_with(Vec::new);
        for row in 0..rows {
            distances.push(if scores.is_null(row) {
                0.0
            } else {
                scores.value(row)
            });
        }
    }

    Ok(())
}

fn parse_metadata(column: &StringArray, row: usize) -> Option<Value> {
    if column.is_null(row) {
        return None;
    }
    let raw = column.value(row);
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Metadata cell is not valid JSON, keeping raw text: {}", e);
            Some(Value::String(raw.to_string()))
        }
    }
}

fn backend_err(error: lancedb::Error) -> PeekError {
    PeekError::Backend(error.to_string())
}
