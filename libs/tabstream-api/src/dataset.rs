use std::fmt;

/// Frame discriminator, the value of `FrameType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    DataSetHeader,
    DataTable,
    TableHeader,
    TableFragment,
    TableCompletion,
    DataSetCompletion,
    TableProgress,
}

impl FrameKind {
    pub const ALL: [FrameKind; 7] = [
        FrameKind::DataSetHeader,
        FrameKind::DataTable,
        FrameKind::TableHeader,
        FrameKind::TableFragment,
        FrameKind::TableCompletion,
        FrameKind::DataSetCompletion,
        FrameKind::TableProgress,
    ];

    /// Exact, case-sensitive match on the wire literal.
    pub fn from_wire(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == tag)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            FrameKind::DataSetHeader => "DataSetHeader",
            FrameKind::DataTable => "DataTable",
            FrameKind::TableHeader => "TableHeader",
            FrameKind::TableFragment => "TableFragment",
            FrameKind::TableCompletion => "TableCompletion",
            FrameKind::DataSetCompletion => "DataSetCompletion",
            FrameKind::TableProgress => "TableProgress",
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opening frame of a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSetHeader {
    pub version: String,
    /// Tables arrive as header/fragment/completion frames rather than
    /// as single `DataTable` frames.
    pub is_progressive: bool,
    pub is_fragmented: Option<bool>,
}

/// Terminal frame of a dataset. Written once, ends the sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataSetCompletion {
    pub has_errors: bool,
    pub cancelled: bool,
    /// Absent on the wire means empty.
    pub one_api_errors: Vec<String>,
}

impl DataSetCompletion {
    /// `true` when the service reported neither errors nor cancellation.
    pub fn is_clean(&self) -> bool {
        !self.has_errors && !self.cancelled
    }
}
