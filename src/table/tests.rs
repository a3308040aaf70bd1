use super::*;
use serde_json::json;

fn field(name: &str, value: Value) -> (String, Value) {
    (name.to_string(), value)
}

#[test]
fn row_count_matches_longest_field() {
    let fields = vec![
        field("ids", json!(["a", "b"])),
        field("documents", json!(["first", "second", "third"])),
    ];

    let table = to_table(&fields);

    assert_eq!(table.row_count(), 3);
    assert_eq!(table.columns(), &["ids".to_string(), "documents".to_string()]);
}

#[test]
fn shorter_fields_are_padded_with_null() {
    let fields = vec![
        field("documents", json!(["first", "second", "third"])),
        field("ids", json!(["a", "b"])),
    ];

    let table = to_table(&fields);

    let ids = table.column("ids").expect("ids column should exist");
    assert_eq!(ids, vec![&json!("a"), &json!("b"), &Value::Null]);
}

#[test]
fn scalars_are_excluded_from_length_computation() {
    let fields = vec![
        field("ids", json!(["a", "b", "c", "d"])),
        field("documents", json!("not a list")),
    ];

    let table = to_table(&fields);

    // The scalar does not shrink the table; it broadcasts to every row.
    assert_eq!(table.row_count(), 4);
    let documents = table.column("documents").expect("documents column");
    assert!(documents.iter().all(|cell| **cell == json!("not a list")));
}

#[test]
fn empty_input_yields_empty_table() {
    let table = to_table(&[]);

    assert_eq!(table.row_count(), 0);
    assert!(table.is_empty());
    assert!(table.columns().is_empty());
}

#[test]
fn all_empty_fields_keep_structural_columns() {
    let fields = vec![field("ids", json!([])), field("documents", json!([]))];

    let table = to_table(&fields);

    assert_eq!(table.row_count(), 0);
    assert_eq!(table.columns(), &["ids".to_string(), "documents".to_string()]);
}

#[test]
fn embeddings_render_as_dimension_placeholder() {
    let vector: Vec<f32> = vec![0.5; 384];
    let fields = vec![
        field("ids", json!(["a", "b"])),
        field("embeddings", json!([vector, Value::Null])),
    ];

    let table = to_table(&fields);

    let embeddings = table.column("embeddings").expect("embeddings column");
    assert_eq!(embeddings[0], &json!("Vector(384 dims)"));
    assert_eq!(embeddings[1], &Value::Null);
}

#[test]
fn nested_metadata_flattens_to_dotted_columns() {
    let fields = vec![
        field("ids", json!(["a"])),
        field("metadatas", json!([{"a": {"b": 1, "c": 2}}])),
    ];

    let table = to_table(&fields);

    assert_eq!(
        table.columns(),
        &[
            "ids".to_string(),
            "metadata_a.b".to_string(),
            "metadata_a.c".to_string(),
        ]
    );
    assert_eq!(table.column("metadata_a.b").expect("column")[0], &json!(1));
    assert_eq!(table.column("metadata_a.c").expect("column")[0], &json!(2));
}

#[test]
fn metadata_columns_are_sorted_union_across_records() {
    let fields = vec![
        field("ids", json!(["a", "b", "c"])),
        field(
            "metadatas",
            json!([
                {"source": "web", "rank": 2},
                {"source": "pdf", "page": {"number": 7}},
                Value::Null,
            ]),
        ),
    ];

    let table = to_table(&fields);

    assert_eq!(
        table.columns(),
        &[
            "ids".to_string(),
            "metadata_page.number".to_string(),
            "metadata_rank".to_string(),
            "metadata_source".to_string(),
        ]
    );

    // A record missing a path reads as null in that column, and the null
    // metadata record reads as null everywhere.
    let pages = table.column("metadata_page.number").expect("column");
    assert_eq!(pages, vec![&Value::Null, &json!(7), &Value::Null]);
    let ranks = table.column("metadata_rank").expect("column");
    assert_eq!(ranks, vec![&json!(2), &Value::Null, &Value::Null]);
    let sources = table.column("metadata_source").expect("column");
    assert_eq!(sources, vec![&json!("web"), &json!("pdf"), &Value::Null]);
}

#[test]
fn non_map_metadata_contributes_no_columns() {
    let fields = vec![
        field("ids", json!(["a", "b"])),
        field("metadatas", json!(["loose text", Value::Null])),
    ];

    let table = to_table(&fields);

    assert_eq!(table.columns(), &["ids".to_string()]);
}

#[test]
fn raw_metadatas_field_is_dropped() {
    let fields = vec![
        field("ids", json!(["a"])),
        field("metadatas", json!([{"kind": "note"}])),
    ];

    let table = to_table(&fields);

    assert!(!table.columns().iter().any(|name| name == "metadatas"));
    assert_eq!(table.column("metadata_kind").expect("column")[0], &json!("note"));
}

#[test]
fn metadata_rows_pad_to_longest_field() {
    let fields = vec![
        field("ids", json!(["a", "b", "c"])),
        field("metadatas", json!([{"lang": "en"}])),
    ];

    let table = to_table(&fields);

    let langs = table.column("metadata_lang").expect("column");
    assert_eq!(langs, vec![&json!("en"), &Value::Null, &Value::Null]);
}

#[test]
fn scalar_fields_broadcast_to_all_rows() {
    let fields = vec![
        field("ids", json!(["a", "b"])),
        field("collection", json!("articles")),
    ];

    let table = to_table(&fields);

    let names = table.column("collection").expect("column");
    assert_eq!(names, vec![&json!("articles"), &json!("articles")]);
}

#[test]
fn flatten_paths_looks_up_whole_path_strings() {
    // Keys containing literal dots stay usable because lookups go through the
    // flattened map instead of re-splitting the path.
    let flat = flatten_paths(&json!({"file.ext": "report.pdf", "a": {"b": 2}}));

    assert_eq!(flat.get("file.ext"), Some(&json!("report.pdf")));
    assert_eq!(flat.get("a.b"), Some(&json!(2)));
}

#[test]
fn flatten_paths_treats_lists_as_leaves() {
    let flat = flatten_paths(&json!({"tags": ["x", "y"], "info": {"depth": 3}}));

    assert_eq!(flat.get("tags"), Some(&json!(["x", "y"])));
    assert_eq!(flat.get("info.depth"), Some(&json!(3)));
}

#[test]
fn render_produces_aligned_grid() {
    let fields = vec![
        field("ids", json!(["a", "b"])),
        field("documents", json!(["hello", Value::Null])),
    ];

    let rendered = to_table(&fields).render();
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines.len(), 4);
    assert!(lines[0].contains("ids"));
    assert!(lines[0].contains("documents"));
    assert!(lines[2].contains("hello"));
    // Every line pads to the same width.
    assert!(lines.iter().all(|line| line.len() == lines[0].len()));
}

#[test]
fn render_serializes_non_string_cells() {
    let fields = vec![
        field("ids", json!(["a"])),
        field("metadatas", json!([{"rank": 2, "draft": false}])),
    ];

    let rendered = to_table(&fields).render();

    assert!(rendered.contains('2'));
    assert!(rendered.contains("false"));
}
