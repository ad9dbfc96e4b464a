use crate::dataset::FrameKind;
use crate::table::TableId;

/// Error kind tag, for callers that route on the category only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedFrame,
    UnknownFrameType,
    MissingField,
    WrongType,
    RowArityMismatch,
    ValueFormat,
    UnknownColumnType,
    OutOfOrderFragment,
    DuplicateHeader,
    RowCountMismatch,
    TruncatedStream,
    DataSet,
}

/// Decode error. Every variant except `DataSet` is structural and aborts
/// the decode call; `DataSet` is the terminal status reported by the
/// service in its completion frame.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("unknown frame type '{0}'")]
    UnknownFrameType(String),

    #[error("{frame}{}: missing field '{field}'", for_table(.table))]
    MissingField { frame: FrameKind, table: Option<TableId>, field: String },

    #[error("{frame}{}: field '{field}' must be {expected}", for_table(.table))]
    WrongType {
        frame: FrameKind,
        /// Known once `TableId` itself has been read.
        table: Option<TableId>,
        field: String,
        expected: &'static str,
    },

    #[error("{frame} table {table}: row {row} has {actual} values, expected {expected}")]
    RowArityMismatch {
        frame: FrameKind,
        table: TableId,
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("{frame} table {table}: row {row}, column '{column}': {reason}")]
    ValueFormat {
        frame: FrameKind,
        table: TableId,
        row: usize,
        column: String,
        reason: String,
    },

    #[error("{frame} table {table}: column '{column}' has unknown type '{type_name}'")]
    UnknownColumnType {
        frame: FrameKind,
        table: TableId,
        column: String,
        type_name: String,
    },

    #[error("{frame} for table {table} arrived outside its header/completion window")]
    OutOfOrderFragment { frame: FrameKind, table: TableId },

    #[error("{frame}: table {table} already has a header")]
    DuplicateHeader { frame: FrameKind, table: TableId },

    #[error("table {table}: completion reports {reported} rows, {actual} were received")]
    RowCountMismatch { table: TableId, reported: u64, actual: usize },

    #[error("frame stream ended before DataSetCompletion")]
    TruncatedStream,

    #[error("dataset reported errors (cancelled: {cancelled}): {}", .errors.join("; "))]
    DataSet { cancelled: bool, errors: Vec<String> },
}

fn for_table(table: &Option<TableId>) -> String {
    table.map(|id| format!(" table {id}")).unwrap_or_default()
}

impl DecodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::MalformedFrame(_) => ErrorKind::MalformedFrame,
            DecodeError::UnknownFrameType(_) => ErrorKind::UnknownFrameType,
            DecodeError::MissingField { .. } => ErrorKind::MissingField,
            DecodeError::WrongType { .. } => ErrorKind::WrongType,
            DecodeError::RowArityMismatch { .. } => ErrorKind::RowArityMismatch,
            DecodeError::ValueFormat { .. } => ErrorKind::ValueFormat,
            DecodeError::UnknownColumnType { .. } => ErrorKind::UnknownColumnType,
            DecodeError::OutOfOrderFragment { .. } => ErrorKind::OutOfOrderFragment,
            DecodeError::DuplicateHeader { .. } => ErrorKind::DuplicateHeader,
            DecodeError::RowCountMismatch { .. } => ErrorKind::RowCountMismatch,
            DecodeError::TruncatedStream => ErrorKind::TruncatedStream,
            DecodeError::DataSet { .. } => ErrorKind::DataSet,
        }
    }

    /// Table the error refers to, when there is one.
    pub fn table(&self) -> Option<TableId> {
        match self {
            DecodeError::MissingField { table, .. } | DecodeError::WrongType { table, .. } => {
                *table
            }
            DecodeError::RowArityMismatch { table, .. }
            | DecodeError::ValueFormat { table, .. }
            | DecodeError::UnknownColumnType { table, .. }
            | DecodeError::OutOfOrderFragment { table, .. }
            | DecodeError::DuplicateHeader { table, .. }
            | DecodeError::RowCountMismatch { table, .. } => Some(*table),
            _ => None,
        }
    }

    /// `false` only for the dataset-level status.
    pub fn is_structural(&self) -> bool {
        !matches!(self, DecodeError::DataSet { .. })
    }
}

/// Non-fatal condition observed while decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeWarning {
    #[error("table {table}: completion reports {reported} rows, {actual} were received")]
    RowCountMismatch { table: TableId, reported: u64, actual: usize },

    #[error("table {table} was still open at dataset completion ({rows} rows discarded)")]
    IncompleteTable { table: TableId, rows: usize },
}

impl DecodeWarning {
    pub fn table(&self) -> TableId {
        match self {
            DecodeWarning::RowCountMismatch { table, .. }
            | DecodeWarning::IncompleteTable { table, .. } => *table,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_frame_field_and_table() {
        let e = DecodeError::MissingField {
            frame: FrameKind::DataTable,
            table: Some(3),
            field: "TableKind".into(),
        };
        assert_eq!(e.to_string(), "DataTable table 3: missing field 'TableKind'");
        assert_eq!(e.kind(), ErrorKind::MissingField);
        assert_eq!(e.table(), Some(3));

        let e = DecodeError::WrongType {
            frame: FrameKind::TableCompletion,
            table: None,
            field: "TableId".into(),
            expected: "an integer",
        };
        assert_eq!(e.to_string(), "TableCompletion: field 'TableId' must be an integer");
        assert_eq!(e.table(), None);

        let e = DecodeError::OutOfOrderFragment { frame: FrameKind::TableFragment, table: 5 };
        assert!(e.to_string().contains("table 5"));
        assert_eq!(e.table(), Some(5));
    }

    #[test]
    fn dataset_error_is_not_structural() {
        let e = DecodeError::DataSet { cancelled: false, errors: vec!["a".into(), "b".into()] };
        assert!(!e.is_structural());
        assert_eq!(e.to_string(), "dataset reported errors (cancelled: false): a; b");
        assert!(DecodeError::TruncatedStream.is_structural());
    }
}
