// Tabular normalization module
// Converts heterogeneous retrieval results into a single flat table

#[cfg(test)]
mod tests;

use console::{Alignment, measure_text_width, pad_str, truncate_str};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Prefix applied to every flattened metadata column
pub const METADATA_COLUMN_PREFIX: &str = "metadata_";

const EMBEDDINGS_FIELD: &str = "embeddings";
const METADATAS_FIELD: &str = "metadatas";

const MAX_CELL_WIDTH: usize = 48;

/// Flat, row-major table produced from one retrieval snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

/// Normalize a field snapshot into a flat table.
///
/// Fields are `(name, value)` pairs in display order. List-valued fields are
/// reconciled to the longest observed length (shorter lists right-padded with
/// null, longer ones truncated), scalars are broadcast, embedding vectors are
/// replaced with a dimension-count placeholder, and the raw `metadatas` field
/// is expanded into one `metadata_<dot.path>` column per distinct leaf path.
#[inline]
pub fn to_table(fields: &[(String, Value)]) -> DataTable {
    let max_len = fields
        .iter()
        .filter_map(|(_, value)| value.as_array().map(Vec::len))
        .max()
        .unwrap_or(0);

    let mut columns: Vec<(String, Vec<Value>)> = Vec::new();

    for (name, value) in fields {
        match (name.as_str(), value) {
            (EMBEDDINGS_FIELD, Value::Array(vectors)) => {
                let cells = vectors.iter().map(embedding_placeholder).collect();
                columns.push((name.clone(), fit_length(cells, max_len)));
            }
            (METADATAS_FIELD, Value::Array(records)) => {
                columns.extend(metadata_columns(records, max_len));
            }
            // The raw metadatas field never survives into the output; a
            // non-list value carries no per-record information either.
            (METADATAS_FIELD, _) => {}
            (_, Value::Array(items)) => {
                columns.push((name.clone(), fit_length(items.clone(), max_len)));
            }
            (_, scalar) => {
                columns.push((name.clone(), vec![scalar.clone(); max_len]));
            }
        }
    }

    DataTable::from_columns(columns, max_len)
}

/// Flatten a metadata value into a map from dotted leaf path to leaf value.
///
/// Only map values are recursed into; anything else (including a null or
/// scalar metadata record) produces an empty map. Lookups against the result
/// must use the whole path string, since individual keys may contain dots.
#[inline]
pub fn flatten_paths(metadata: &Value) -> BTreeMap<String, Value> {
    let mut flat = BTreeMap::new();
    if let Value::Object(map) = metadata {
        for (key, value) in map {
            collect_leaf_paths(key.clone(), value, &mut flat);
        }
    }
    flat
}

fn collect_leaf_paths(path: String, value: &Value, flat: &mut BTreeMap<String, Value>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                collect_leaf_paths(format!("{}.{}", path, key), child, flat);
            }
        }
        leaf => {
            flat.insert(path, leaf.clone());
        }
    }
}

fn embedding_placeholder(cell: &Value) -> Value {
    match cell {
        Value::Array(vector) => Value::String(format!("Vector({} dims)", vector.len())),
        _ => Value::Null,
    }
}

/// Right-pads with null or truncates so every column ends up `len` cells tall.
fn fit_length(mut cells: Vec<Value>, len: usize) -> Vec<Value> {
    cells.resize(len, Value::Null);
    cells
}

fn metadata_columns(records: &[Value], max_len: usize) -> Vec<(String, Vec<Value>)> {
    let flattened: Vec<BTreeMap<String, Value>> = records.iter().map(flatten_paths).collect();

    let mut paths = BTreeSet::new();
    for record in &flattened {
        paths.extend(record.keys().cloned());
    }

    paths
        .into_iter()
        .map(|path| {
            let cells = (0..max_len)
                .map(|row| {
                    flattened
                        .get(row)
                        .and_then(|record| record.get(&path))
                        .cloned()
                        .unwrap_or(Value::Null)
                })
                .collect();
            (format!("{}{}", METADATA_COLUMN_PREFIX, path), cells)
        })
        .collect()
}

impl DataTable {
    fn from_columns(columns: Vec<(String, Vec<Value>)>, row_count: usize) -> Self {
        let names = columns.iter().map(|(name, _)| name.clone()).collect();
        let mut rows = vec![Vec::with_capacity(columns.len()); row_count];
        for (_, cells) in columns {
            debug_assert_eq!(cells.len(), row_count);
            for (row, cell) in rows.iter_mut().zip(cells) {
                row.push(cell);
            }
        }
        Self {
            columns: names,
            rows,
        }
    }

    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[inline]
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    #[inline]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cells of the named column, top to bottom.
    #[inline]
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let index = self.columns.iter().position(|column| column == name)?;
        Some(self.rows.iter().map(|row| &row[index]).collect())
    }

    /// Render the table as an aligned text grid for terminal display.
    #[inline]
    pub fn render(&self) -> String {
        if self.columns.is_empty() {
            return "(no columns)".to_string();
        }

        let header: Vec<String> = self
            .columns
            .iter()
            .map(|name| truncate_str(name, MAX_CELL_WIDTH, "…").into_owned())
            .collect();
        let body: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(render_cell).collect())
            .collect();

        let mut widths: Vec<usize> = header.iter().map(|cell| measure_text_width(cell)).collect();
        for row in &body {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(measure_text_width(cell));
            }
        }

        let mut lines = Vec::with_capacity(body.len() + 2);
        lines.push(render_line(&header, &widths));
        lines.push(
            widths
                .iter()
                .map(|width| "-".repeat(*width))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
        for row in &body {
            lines.push(render_line(row, &widths));
        }
        lines.join("\n")
    }
}

fn render_cell(value: &Value) -> String {
    let text = match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    truncate_str(&text, MAX_CELL_WIDTH, "…").into_owned()
}

fn render_line(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| pad_str(cell, *width, Alignment::Left, None).into_owned())
        .collect::<Vec<_>>()
        .join(" | ")
}
