use tabstream_api::{Column, DataSetCompletion, DataSetHeader, FrameKind, Table, TableId, TableKind};

/// Row cells as they came off the wire. Only fragments carry these:
/// their columns are known to the assembler, not to the frame.
pub type RawRow = Vec<serde_json::Value>;

/// Opens a progressive table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableHeader {
    pub table_id: TableId,
    pub table_kind: TableKind,
    pub table_name: String,
    pub columns: Vec<Column>,
}

/// `TableFragmentType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentMode {
    /// `DataAppend`: extend the rows received so far.
    Append,
    /// `DataReplace`: drop the rows received so far, then append.
    Replace,
}

impl FragmentMode {
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "DataAppend" => Some(FragmentMode::Append),
            "DataReplace" => Some(FragmentMode::Replace),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableFragment {
    pub table_id: TableId,
    pub mode: FragmentMode,
    /// Column count announced by the fragment, when present.
    pub field_count: Option<usize>,
    pub rows: Vec<RawRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableCompletion {
    pub table_id: TableId,
    pub row_count: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableProgress {
    pub table_id: TableId,
    /// Percent complete, as reported by the service.
    pub progress: f64,
}

/// A parsed frame. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    DataSetHeader(DataSetHeader),
    /// A complete table in one frame; rows are already coerced.
    DataTable(Table),
    TableHeader(TableHeader),
    TableFragment(TableFragment),
    TableCompletion(TableCompletion),
    DataSetCompletion(DataSetCompletion),
    TableProgress(TableProgress),
}

impl Frame {
    pub fn kind(&self) -> FrameKind {
        match self {
            Frame::DataSetHeader(_) => FrameKind::DataSetHeader,
            Frame::DataTable(_) => FrameKind::DataTable,
            Frame::TableHeader(_) => FrameKind::TableHeader,
            Frame::TableFragment(_) => FrameKind::TableFragment,
            Frame::TableCompletion(_) => FrameKind::TableCompletion,
            Frame::DataSetCompletion(_) => FrameKind::DataSetCompletion,
            Frame::TableProgress(_) => FrameKind::TableProgress,
        }
    }

    pub fn table_id(&self) -> Option<TableId> {
        match self {
            Frame::DataTable(t) => Some(t.id),
            Frame::TableHeader(h) => Some(h.table_id),
            Frame::TableFragment(f) => Some(f.table_id),
            Frame::TableCompletion(c) => Some(c.table_id),
            Frame::TableProgress(p) => Some(p.table_id),
            Frame::DataSetHeader(_) | Frame::DataSetCompletion(_) => None,
        }
    }
}
