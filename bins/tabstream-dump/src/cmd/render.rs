use std::io::{self, Write};

use serde_json::{json, Value as Json};
use tabstream_api::{DataSetCompletion, DecodeWarning, ResultTable, TableRole};

fn role(role: TableRole) -> &'static str {
    match role {
        TableRole::Primary => "primary",
        TableRole::Metadata => "metadata",
    }
}

/// Tabs and newlines inside a cell would break the row layout.
fn cell(text: &str) -> String {
    text.replace('\\', "\\\\").replace('\t', "\\t").replace('\n', "\\n")
}

pub fn text_table<W: Write>(out: &mut W, t: &ResultTable) -> io::Result<()> {
    let table = &t.table;
    writeln!(
        out,
        "# table {} {} {} ({}, {} rows)",
        table.id,
        table.kind,
        table.name,
        role(t.role),
        table.row_count()
    )?;
    let header: Vec<_> = table
        .columns
        .iter()
        .map(|c| format!("{}:{}", cell(&c.name), c.column_type))
        .collect();
    writeln!(out, "{}", header.join("\t"))?;
    for row in &table.rows {
        let cells: Vec<_> = row.values().iter().map(|v| cell(&v.to_string())).collect();
        writeln!(out, "{}", cells.join("\t"))?;
    }
    Ok(())
}

pub fn json_table(t: &ResultTable) -> Json {
    let table = &t.table;
    let columns: Vec<_> = table
        .columns
        .iter()
        .map(|c| json!({"ColumnName": c.name, "ColumnType": c.column_type.as_str()}))
        .collect();
    let rows: Vec<_> = table
        .rows
        .iter()
        .map(|r| Json::Array(r.values().iter().map(|v| v.to_json()).collect()))
        .collect();
    json!({
        "TableId": table.id,
        "TableKind": table.kind.as_str(),
        "TableName": table.name,
        "Role": role(t.role),
        "Columns": columns,
        "Rows": rows,
    })
}

/// Dataset-level summary printed after the last table.
pub struct Summary<'a> {
    pub completion: &'a DataSetCompletion,
    pub warnings: &'a [DecodeWarning],
    pub frames: usize,
}

pub fn text_completion<W: Write>(out: &mut W, summary: &Summary<'_>) -> io::Result<()> {
    let completion = summary.completion;
    writeln!(
        out,
        "# completion frames={} clean={} has_errors={} cancelled={} warnings={}",
        summary.frames,
        completion.is_clean(),
        completion.has_errors,
        completion.cancelled,
        summary.warnings.len()
    )?;
    for e in &completion.one_api_errors {
        writeln!(out, "# error {}", cell(e))?;
    }
    for w in summary.warnings {
        writeln!(out, "# warning table {}: {}", w.table(), cell(&w.to_string()))?;
    }
    Ok(())
}

pub fn json_completion(summary: &Summary<'_>) -> Json {
    let completion = summary.completion;
    let warnings: Vec<_> = summary
        .warnings
        .iter()
        .map(|w| json!({"TableId": w.table(), "Message": w.to_string()}))
        .collect();
    json!({
        "Frames": summary.frames,
        "Clean": completion.is_clean(),
        "HasErrors": completion.has_errors,
        "Cancelled": completion.cancelled,
        "OneApiErrors": completion.one_api_errors,
        "Warnings": warnings,
    })
}
