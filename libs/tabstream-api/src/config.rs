use serde::Deserialize;

/// What to do with a column whose `ColumnType` is outside the vocabulary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownColumnTypePolicy {
    /// Keep the column; cells decode to their string representation.
    #[default]
    PassThrough,
    /// Fail the frame with `UnknownColumnType`.
    Reject,
}

/// What to do when a `TableCompletion` row count disagrees with the rows received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowCountPolicy {
    /// Record a `DecodeWarning` and keep the table.
    #[default]
    Warn,
    /// Abort the decode with `RowCountMismatch`.
    Fail,
}

/// Decode policy switches.
///
/// Parsed from the `[policy]` table of a TOML config:
///
/// ```toml
/// [policy]
/// unknown_column_types = "reject"
/// row_count_mismatch = "warn"
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DecodePolicy {
    pub unknown_column_types: UnknownColumnTypePolicy,
    pub row_count_mismatch: RowCountPolicy,
}

impl DecodePolicy {
    /// Both switches on their fatal setting.
    pub fn strict() -> Self {
        Self {
            unknown_column_types: UnknownColumnTypePolicy::Reject,
            row_count_mismatch: RowCountPolicy::Fail,
        }
    }
}
