//! Frame builders shared by the integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};

pub fn dataset_header(progressive: bool) -> Value {
    json!({"FrameType": "DataSetHeader", "Version": "v2.0", "IsProgressive": progressive})
}

pub fn columns(cols: &[(&str, &str)]) -> Value {
    Value::Array(
        cols.iter()
            .map(|(name, ty)| json!({"ColumnName": name, "ColumnType": ty}))
            .collect(),
    )
}

pub fn data_table(id: i64, kind: &str, cols: &[(&str, &str)], rows: Value) -> Value {
    json!({
        "FrameType": "DataTable",
        "TableId": id,
        "TableKind": kind,
        "TableName": kind,
        "Columns": columns(cols),
        "Rows": rows,
    })
}

pub fn table_header(id: i64, kind: &str, cols: &[(&str, &str)]) -> Value {
    json!({
        "FrameType": "TableHeader",
        "TableId": id,
        "TableKind": kind,
        "TableName": kind,
        "Columns": columns(cols),
    })
}

pub fn append(id: i64, rows: Value) -> Value {
    fragment(id, "DataAppend", rows)
}

pub fn replace(id: i64, rows: Value) -> Value {
    fragment(id, "DataReplace", rows)
}

fn fragment(id: i64, mode: &str, rows: Value) -> Value {
    json!({"FrameType": "TableFragment", "TableId": id, "TableFragmentType": mode, "Rows": rows})
}

pub fn table_completion(id: i64, row_count: Option<u64>) -> Value {
    match row_count {
        Some(n) => json!({"FrameType": "TableCompletion", "TableId": id, "RowCount": n}),
        None => json!({"FrameType": "TableCompletion", "TableId": id}),
    }
}

pub fn progress(id: i64, pct: f64) -> Value {
    json!({"FrameType": "TableProgress", "TableId": id, "TableProgress": pct})
}

pub fn dataset_completion(has_errors: bool, cancelled: bool) -> Value {
    json!({"FrameType": "DataSetCompletion", "HasErrors": has_errors, "Cancelled": cancelled})
}

/// A properties table, a progressive primary result and the completion
/// information table, as a typical query returns them.
pub fn progressive_query() -> Vec<Value> {
    vec![
        dataset_header(true),
        data_table(
            0,
            "QueryProperties",
            &[("TableId", "int"), ("Key", "string"), ("Value", "dynamic")],
            json!([[1, "Visualization", "{\"Visualization\":null}"]]),
        ),
        table_header(
            1,
            "PrimaryResult",
            &[("Name", "string"), ("Count", "long"), ("At", "datetime")],
        ),
        progress(1, 10.0),
        append(1, json!([["a", 1, "2024-01-01T00:00:00Z"], ["b", "2", null]])),
        append(1, json!([["c", null, "2024-01-02T12:30:00.5Z"]])),
        table_completion(1, Some(3)),
        data_table(
            2,
            "QueryCompletionInformation",
            &[("Timestamp", "datetime"), ("Level", "int")],
            json!([["2024-01-02T12:30:01Z", 4]]),
        ),
        dataset_completion(false, false),
    ]
}
