//! Per-table accumulation across header, fragment and completion frames.
//!
//! One `Assembler` belongs to one decode call. Tables with distinct ids
//! interleave freely; each id may be opened once per run.

use std::collections::{HashMap, HashSet};

use tabstream_api::{
    Column, DecodeError, DecodePolicy, DecodeWarning, FrameKind, Row, RowCountPolicy, Table,
    TableId, TableKind,
};

use crate::frame::{FragmentMode, TableCompletion, TableFragment, TableHeader, TableProgress};
use crate::parse::decode_row;

/// State of a table between its header and its completion.
#[derive(Debug)]
struct OpenTable {
    kind: TableKind,
    name: String,
    /// Fixed by the header.
    columns: Vec<Column>,
    rows: Vec<Row>,
    fragments: usize,
    progress: Option<f64>,
}

#[derive(Debug, Default)]
pub struct Assembler {
    policy: DecodePolicy,
    open: HashMap<TableId, OpenTable>,
    /// Every id that has had a header in this run, finished or not.
    seen: HashSet<TableId>,
    warnings: Vec<DecodeWarning>,
}

impl Assembler {
    pub fn new(policy: DecodePolicy) -> Self {
        Self { policy, ..Self::default() }
    }

    fn register(&mut self, frame: FrameKind, id: TableId) -> Result<(), DecodeError> {
        if !self.seen.insert(id) {
            return Err(DecodeError::DuplicateHeader { frame, table: id });
        }
        Ok(())
    }

    /// A `DataTable` frame is header, rows and completion at once.
    pub fn data_table(&mut self, table: Table) -> Result<Table, DecodeError> {
        self.register(FrameKind::DataTable, table.id)?;
        Ok(table)
    }

    pub fn header(&mut self, header: TableHeader) -> Result<(), DecodeError> {
        self.register(FrameKind::TableHeader, header.table_id)?;
        tracing::debug!(
            table = header.table_id,
            kind = %header.table_kind,
            columns = header.columns.len(),
            "table opened"
        );
        self.open.insert(
            header.table_id,
            OpenTable {
                kind: header.table_kind,
                name: header.table_name,
                columns: header.columns,
                rows: Vec::new(),
                fragments: 0,
                progress: None,
            },
        );
        Ok(())
    }

    fn open_table(&mut self, frame: FrameKind, id: TableId) -> Result<&mut OpenTable, DecodeError> {
        self.open.get_mut(&id).ok_or(DecodeError::OutOfOrderFragment { frame, table: id })
    }

    pub fn fragment(&mut self, fragment: TableFragment) -> Result<(), DecodeError> {
        const FRAME: FrameKind = FrameKind::TableFragment;
        let id = fragment.table_id;
        let table = self.open_table(FRAME, id)?;

        if let Some(count) = fragment.field_count {
            if count != table.columns.len() {
                return Err(DecodeError::MalformedFrame(format!(
                    "{FRAME} for table {id}: FieldCount {count} but the header declares {} columns",
                    table.columns.len()
                )));
            }
        }

        // Decode everything before touching the table so a bad cell leaves it as it was.
        let base = match fragment.mode {
            FragmentMode::Append => table.rows.len(),
            FragmentMode::Replace => 0,
        };
        let rows = fragment
            .rows
            .iter()
            .enumerate()
            .map(|(i, cells)| decode_row(FRAME, id, &table.columns, base + i, cells))
            .collect::<Result<Vec<_>, _>>()?;

        if fragment.mode == FragmentMode::Replace {
            table.rows.clear();
        }
        table.rows.extend(rows);
        table.fragments += 1;
        tracing::trace!(
            table = id,
            mode = ?fragment.mode,
            rows = table.rows.len(),
            "fragment applied"
        );
        Ok(())
    }

    pub fn progress(&mut self, progress: TableProgress) -> Result<(), DecodeError> {
        let table = self.open_table(FrameKind::TableProgress, progress.table_id)?;
        table.progress = Some(progress.progress);
        tracing::debug!(table = progress.table_id, progress = progress.progress, "table progress");
        Ok(())
    }

    /// Finalize a table and hand it out.
    pub fn complete(&mut self, completion: TableCompletion) -> Result<Table, DecodeError> {
        let id = completion.table_id;
        let state = self
            .open
            .remove(&id)
            .ok_or(DecodeError::OutOfOrderFragment {
                frame: FrameKind::TableCompletion,
                table: id,
            })?;

        if let Some(reported) = completion.row_count {
            let actual = state.rows.len();
            if reported != actual as u64 {
                match self.policy.row_count_mismatch {
                    RowCountPolicy::Fail => {
                        return Err(DecodeError::RowCountMismatch { table: id, reported, actual });
                    }
                    RowCountPolicy::Warn => {
                        let warning =
                            DecodeWarning::RowCountMismatch { table: id, reported, actual };
                        tracing::warn!(table = id, reported, actual, "{warning}");
                        self.warnings.push(warning);
                    }
                }
            }
        }

        tracing::debug!(
            table = id,
            rows = state.rows.len(),
            fragments = state.fragments,
            "table completed"
        );
        Ok(Table {
            id,
            kind: state.kind,
            name: state.name,
            columns: state.columns,
            rows: state.rows,
        })
    }

    /// Last reported progress of an open table.
    pub fn progress_of(&self, id: TableId) -> Option<f64> {
        self.open.get(&id).and_then(|t| t.progress)
    }

    pub fn open_tables(&self) -> usize {
        self.open.len()
    }

    /// Discard every table still open, recording each as incomplete.
    pub fn close(&mut self) {
        let mut ids: Vec<TableId> = self.open.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            if let Some(state) = self.open.remove(&id) {
                let warning = DecodeWarning::IncompleteTable { table: id, rows: state.rows.len() };
                tracing::warn!(table = id, "{warning}");
                self.warnings.push(warning);
            }
        }
    }

    pub fn warnings(&self) -> &[DecodeWarning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<DecodeWarning> {
        std::mem::take(&mut self.warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tabstream_api::{ColumnType, Value};

    fn header(id: TableId) -> TableHeader {
        TableHeader {
            table_id: id,
            table_kind: TableKind::PrimaryResult,
            table_name: "PrimaryResult".into(),
            columns: vec![Column::new("n", ColumnType::Long)],
        }
    }

    fn fragment(id: TableId, mode: FragmentMode, values: &[i64]) -> TableFragment {
        TableFragment {
            table_id: id,
            mode,
            field_count: None,
            rows: values.iter().map(|v| vec![json!(v)]).collect(),
        }
    }

    fn longs(table: &Table) -> Vec<i64> {
        table.rows.iter().filter_map(|r| r.0[0].as_i64()).collect()
    }

    #[test]
    fn fragment_before_header() {
        let mut a = Assembler::default();
        let err = a.fragment(fragment(5, FragmentMode::Append, &[1])).unwrap_err();
        assert_eq!(
            err,
            DecodeError::OutOfOrderFragment { frame: FrameKind::TableFragment, table: 5 }
        );
    }

    #[test]
    fn append_then_replace() {
        let mut a = Assembler::default();
        a.header(header(1)).unwrap();
        a.fragment(fragment(1, FragmentMode::Append, &[1, 2])).unwrap();
        a.fragment(fragment(1, FragmentMode::Append, &[3])).unwrap();
        a.fragment(fragment(1, FragmentMode::Replace, &[9, 8])).unwrap();
        a.fragment(fragment(1, FragmentMode::Append, &[7])).unwrap();
        let t = a.complete(TableCompletion { table_id: 1, row_count: Some(3) }).unwrap();
        assert_eq!(longs(&t), vec![9, 8, 7]);
        assert!(a.warnings().is_empty());
    }

    #[test]
    fn interleaved_tables_stay_separate() {
        let mut a = Assembler::default();
        a.header(header(1)).unwrap();
        a.header(header(2)).unwrap();
        a.fragment(fragment(2, FragmentMode::Append, &[20])).unwrap();
        a.fragment(fragment(1, FragmentMode::Append, &[10])).unwrap();
        a.fragment(fragment(2, FragmentMode::Append, &[21])).unwrap();
        let t2 = a.complete(TableCompletion { table_id: 2, row_count: None }).unwrap();
        let t1 = a.complete(TableCompletion { table_id: 1, row_count: None }).unwrap();
        assert_eq!(longs(&t1), vec![10]);
        assert_eq!(longs(&t2), vec![20, 21]);
    }

    #[test]
    fn duplicate_header_even_after_completion() {
        let mut a = Assembler::default();
        a.header(header(1)).unwrap();
        assert!(matches!(a.header(header(1)), Err(DecodeError::DuplicateHeader { table: 1, .. })));
        a.complete(TableCompletion { table_id: 1, row_count: None }).unwrap();
        assert!(matches!(a.header(header(1)), Err(DecodeError::DuplicateHeader { .. })));
        assert!(matches!(
            a.fragment(fragment(1, FragmentMode::Append, &[1])),
            Err(DecodeError::OutOfOrderFragment { .. })
        ));
    }

    #[test]
    fn row_count_mismatch_policy() {
        let mut a = Assembler::default();
        a.header(header(1)).unwrap();
        a.fragment(fragment(1, FragmentMode::Append, &[1])).unwrap();
        let t = a.complete(TableCompletion { table_id: 1, row_count: Some(2) }).unwrap();
        assert_eq!(t.rows.len(), 1);
        assert_eq!(
            a.warnings(),
            &[DecodeWarning::RowCountMismatch { table: 1, reported: 2, actual: 1 }]
        );

        let mut a = Assembler::new(DecodePolicy::strict());
        a.header(header(1)).unwrap();
        let err = a.complete(TableCompletion { table_id: 1, row_count: Some(2) }).unwrap_err();
        assert_eq!(err, DecodeError::RowCountMismatch { table: 1, reported: 2, actual: 0 });
    }

    #[test]
    fn bad_fragment_leaves_rows_untouched() {
        let mut a = Assembler::default();
        a.header(header(1)).unwrap();
        a.fragment(fragment(1, FragmentMode::Append, &[1])).unwrap();
        let bad = TableFragment {
            table_id: 1,
            mode: FragmentMode::Replace,
            field_count: None,
            rows: vec![vec![json!(2)], vec![json!("x")]],
        };
        let err = a.fragment(bad).unwrap_err();
        assert!(matches!(err, DecodeError::ValueFormat { row: 1, .. }));
        let t = a.complete(TableCompletion { table_id: 1, row_count: None }).unwrap();
        assert_eq!(t.rows[0].0[0], Value::Long(Some(1)));
    }

    #[test]
    fn field_count_must_match_columns() {
        let mut a = Assembler::default();
        a.header(header(1)).unwrap();
        let mut f = fragment(1, FragmentMode::Append, &[1]);
        f.field_count = Some(3);
        assert!(matches!(a.fragment(f), Err(DecodeError::MalformedFrame(_))));
    }

    #[test]
    fn progress_and_close() {
        let mut a = Assembler::default();
        assert!(a.progress(TableProgress { table_id: 4, progress: 1.0 }).is_err());
        a.header(header(4)).unwrap();
        a.progress(TableProgress { table_id: 4, progress: 55.0 }).unwrap();
        assert_eq!(a.progress_of(4), Some(55.0));
        a.fragment(fragment(4, FragmentMode::Append, &[1, 2])).unwrap();
        a.close();
        assert_eq!(a.open_tables(), 0);
        assert_eq!(a.take_warnings(), vec![DecodeWarning::IncompleteTable { table: 4, rows: 2 }]);
        assert!(a.warnings().is_empty());
    }
}
