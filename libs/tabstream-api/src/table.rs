use std::fmt;

use crate::value::{ColumnType, Row, Value};

/// Table identifier, unique within one decode run.
pub type TableId = i64;

/// A single column declaration.
///
/// Position in `Table.columns` is the index into every `Row` of that table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self { name: name.into(), column_type }
    }
}

/// Kind of a result table, from `TableKind`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TableKind {
    PrimaryResult,
    QueryProperties,
    QueryCompletionInformation,
    QueryTraceLog,
    QueryPerfLog,
    TableOfContents,
    QueryPlan,
    Other(String),
}

impl TableKind {
    pub fn from_wire(kind: &str) -> Self {
        match kind {
            "PrimaryResult" => TableKind::PrimaryResult,
            "QueryProperties" => TableKind::QueryProperties,
            "QueryCompletionInformation" => TableKind::QueryCompletionInformation,
            "QueryTraceLog" => TableKind::QueryTraceLog,
            "QueryPerfLog" => TableKind::QueryPerfLog,
            "TableOfContents" => TableKind::TableOfContents,
            "QueryPlan" => TableKind::QueryPlan,
            other => TableKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TableKind::PrimaryResult => "PrimaryResult",
            TableKind::QueryProperties => "QueryProperties",
            TableKind::QueryCompletionInformation => "QueryCompletionInformation",
            TableKind::QueryTraceLog => "QueryTraceLog",
            TableKind::QueryPerfLog => "QueryPerfLog",
            TableKind::TableOfContents => "TableOfContents",
            TableKind::QueryPlan => "QueryPlan",
            TableKind::Other(kind) => kind,
        }
    }

    /// Properties and completion-information tables describe the query,
    /// they never hold its output.
    pub fn is_metadata(&self) -> bool {
        matches!(self, TableKind::QueryProperties | TableKind::QueryCompletionInformation)
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role assigned to a finished table by the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableRole {
    /// The first non-metadata table of the dataset.
    Primary,
    Metadata,
}

/// A finished result table. Immutable once handed to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub id: TableId,
    pub kind: TableKind,
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Cell at `row` in the column called `column`.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// A finished table tagged with its role in the dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    pub role: TableRole,
    pub table: Table,
}

impl ResultTable {
    pub fn is_primary(&self) -> bool {
        self.role == TableRole::Primary
    }
}
