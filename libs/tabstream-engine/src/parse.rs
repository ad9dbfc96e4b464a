//! One parser per frame kind.
//!
//! Parsers are total: they either return a fully populated frame or the
//! first validation error, never a partial frame.

use serde_json::Value as Json;
use tabstream_api::{
    Column, ColumnType, DataSetCompletion, DataSetHeader, DecodeError, DecodePolicy, FrameKind,
    Row, Table, TableId, TableKind, UnknownColumnTypePolicy,
};

use crate::coerce::coerce;
use crate::frame::{
    FragmentMode, RawRow, TableCompletion, TableFragment, TableHeader, TableProgress,
};
use crate::wire::Fields;

const TABLE_KIND: &str = "TableKind";
const TABLE_NAME: &str = "TableName";
const COLUMNS: &str = "Columns";
const COLUMN_NAME: &str = "ColumnName";
const COLUMN_TYPE: &str = "ColumnType";
const ROWS: &str = "Rows";

pub fn parse_data_set_header(element: &Json) -> Result<DataSetHeader, DecodeError> {
    let f = Fields::open(FrameKind::DataSetHeader, element)?;
    Ok(DataSetHeader {
        version: f.string("Version")?.to_string(),
        is_progressive: f.bool("IsProgressive")?,
        is_fragmented: f.opt_bool("IsFragmented")?,
    })
}

/// A complete table: header fields plus coerced rows.
pub fn parse_data_table(element: &Json, policy: &DecodePolicy) -> Result<Table, DecodeError> {
    let mut f = Fields::open(FrameKind::DataTable, element)?;
    let id = f.table_id()?;
    let kind = TableKind::from_wire(f.string(TABLE_KIND)?);
    let name = f.string(TABLE_NAME)?.to_string();
    let columns = parse_columns(&f, id, policy)?;
    let raw = raw_rows(&f)?;

    let rows = raw
        .iter()
        .enumerate()
        .map(|(i, cells)| decode_row(FrameKind::DataTable, id, &columns, i, cells))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Table { id, kind, name, columns, rows })
}

pub fn parse_table_header(
    element: &Json,
    policy: &DecodePolicy,
) -> Result<TableHeader, DecodeError> {
    let mut f = Fields::open(FrameKind::TableHeader, element)?;
    let table_id = f.table_id()?;
    let table_kind = TableKind::from_wire(f.string(TABLE_KIND)?);
    let table_name = f.string(TABLE_NAME)?.to_string();
    let columns = parse_columns(&f, table_id, policy)?;
    Ok(TableHeader { table_id, table_kind, table_name, columns })
}

pub fn parse_table_fragment(element: &Json) -> Result<TableFragment, DecodeError> {
    const FRAGMENT_TYPE: &str = "TableFragmentType";

    let mut f = Fields::open(FrameKind::TableFragment, element)?;
    let table_id = f.table_id()?;
    let mode = FragmentMode::from_wire(f.string(FRAGMENT_TYPE)?)
        .ok_or_else(|| f.wrong(FRAGMENT_TYPE, "\"DataAppend\" or \"DataReplace\""))?;
    let field_count = f
        .opt_count("FieldCount")?
        .map(usize::try_from)
        .transpose()
        .map_err(|_| f.wrong("FieldCount", "a column count"))?;
    let rows = raw_rows(&f)?.into_iter().map(<[Json]>::to_vec).collect::<Vec<RawRow>>();

    Ok(TableFragment { table_id, mode, field_count, rows })
}

pub fn parse_table_completion(element: &Json) -> Result<TableCompletion, DecodeError> {
    let mut f = Fields::open(FrameKind::TableCompletion, element)?;
    Ok(TableCompletion { table_id: f.table_id()?, row_count: f.opt_count("RowCount")? })
}

pub fn parse_table_progress(element: &Json) -> Result<TableProgress, DecodeError> {
    let mut f = Fields::open(FrameKind::TableProgress, element)?;
    Ok(TableProgress { table_id: f.table_id()?, progress: f.number("TableProgress")? })
}

pub fn parse_data_set_completion(element: &Json) -> Result<DataSetCompletion, DecodeError> {
    const ONE_API_ERRORS: &str = "OneApiErrors";

    let f = Fields::open(FrameKind::DataSetCompletion, element)?;
    let has_errors = f.bool("HasErrors")?;
    let cancelled = f.bool("Cancelled")?;
    let one_api_errors = match f.opt_array(ONE_API_ERRORS)? {
        None => Vec::new(),
        Some(entries) => entries
            .iter()
            .enumerate()
            .map(|(i, e)| {
                e.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| f.wrong(format!("{ONE_API_ERRORS}[{i}]"), "a string"))
            })
            .collect::<Result<_, _>>()?,
    };
    Ok(DataSetCompletion { has_errors, cancelled, one_api_errors })
}

fn parse_columns(
    f: &Fields<'_>,
    table_id: TableId,
    policy: &DecodePolicy,
) -> Result<Vec<Column>, DecodeError> {
    let entries = f.array(COLUMNS)?;
    let mut columns = Vec::with_capacity(entries.len());

    for (i, entry) in entries.iter().enumerate() {
        let path = |field: &str| format!("{COLUMNS}[{i}].{field}");
        let obj = entry.as_object().ok_or_else(|| f.wrong(format!("{COLUMNS}[{i}]"), "an object"))?;

        let name = obj
            .get(COLUMN_NAME)
            .ok_or_else(|| f.missing(path(COLUMN_NAME)))?
            .as_str()
            .ok_or_else(|| f.wrong(path(COLUMN_NAME), "a string"))?;
        let type_name = obj
            .get(COLUMN_TYPE)
            .ok_or_else(|| f.missing(path(COLUMN_TYPE)))?
            .as_str()
            .ok_or_else(|| f.wrong(path(COLUMN_TYPE), "a string"))?;

        let column_type = ColumnType::from_wire(type_name);
        if !column_type.is_known() {
            if policy.unknown_column_types == UnknownColumnTypePolicy::Reject {
                return Err(DecodeError::UnknownColumnType {
                    frame: f.frame(),
                    table: table_id,
                    column: name.to_string(),
                    type_name: type_name.to_string(),
                });
            }
            tracing::debug!(
                table = table_id,
                column = name,
                column_type = type_name,
                "passing through unknown column type"
            );
        }
        columns.push(Column::new(name, column_type));
    }
    Ok(columns)
}

/// `Rows`, each entry checked to be an array.
fn raw_rows<'a>(f: &Fields<'a>) -> Result<Vec<&'a [Json]>, DecodeError> {
    f.array(ROWS)?
        .iter()
        .enumerate()
        .map(|(i, row)| {
            row.as_array()
                .map(Vec::as_slice)
                .ok_or_else(|| f.wrong(format!("{ROWS}[{i}]"), "an array"))
        })
        .collect()
}

/// Coerce one row against `columns`. `row` is the row's index within the
/// table and only feeds error messages.
pub fn decode_row(
    frame: FrameKind,
    table: TableId,
    columns: &[Column],
    row: usize,
    cells: &[Json],
) -> Result<Row, DecodeError> {
    if cells.len() != columns.len() {
        return Err(DecodeError::RowArityMismatch {
            frame,
            table,
            row,
            expected: columns.len(),
            actual: cells.len(),
        });
    }
    columns
        .iter()
        .zip(cells)
        .map(|(column, cell)| {
            coerce(&column.column_type, cell).map_err(|e| DecodeError::ValueFormat {
                frame,
                table,
                row,
                column: column.name.clone(),
                reason: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tabstream_api::Value;

    fn properties_table() -> Json {
        json!({
            "FrameType": "DataTable",
            "TableId": 0,
            "TableKind": "QueryProperties",
            "TableName": "@ExtendedProperties",
            "Columns": [
                {"ColumnName": "TableId", "ColumnType": "int"},
                {"ColumnName": "Key", "ColumnType": "string"},
                {"ColumnName": "Value", "ColumnType": "dynamic"},
            ],
            "Rows": [[1, "Visualization", "{\"Visualization\":null}"]],
        })
    }

    #[test]
    fn data_table_success() {
        let table = parse_data_table(&properties_table(), &DecodePolicy::default()).unwrap();
        assert_eq!(table.id, 0);
        assert_eq!(table.kind, TableKind::QueryProperties);
        assert_eq!(table.name, "@ExtendedProperties");
        assert_eq!(
            table.columns,
            vec![
                Column::new("TableId", ColumnType::Int),
                Column::new("Key", ColumnType::String),
                Column::new("Value", ColumnType::Dynamic),
            ]
        );
        assert_eq!(
            table.rows,
            vec![Row(vec![
                Value::Int(Some(1)),
                Value::String(Some("Visualization".into())),
                Value::Dynamic(Some(json!({"Visualization": null}))),
            ])]
        );
    }

    #[test]
    fn data_table_column_errors_name_the_path() {
        let mut v = properties_table();
        v["Columns"][1].as_object_mut().unwrap().remove("ColumnName");
        let err = parse_data_table(&v, &DecodePolicy::default()).unwrap_err();
        assert_eq!(
            err,
            DecodeError::MissingField {
                frame: FrameKind::DataTable,
                table: Some(0),
                field: "Columns[1].ColumnName".into()
            }
        );

        let mut v = properties_table();
        v["Columns"][2]["ColumnType"] = json!(7);
        let err = parse_data_table(&v, &DecodePolicy::default()).unwrap_err();
        match err {
            DecodeError::WrongType { field, table, .. } => {
                assert_eq!(field, "Columns[2].ColumnType");
                assert_eq!(table, Some(0));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn data_table_row_must_be_array() {
        let mut v = properties_table();
        v["Rows"] = json!([[1, "a", null], "crap"]);
        let err = parse_data_table(&v, &DecodePolicy::default()).unwrap_err();
        assert!(matches!(err, DecodeError::WrongType { ref field, .. } if field == "Rows[1]"));
    }

    #[test]
    fn unknown_column_type_policy() {
        let mut v = properties_table();
        v["Columns"][1]["ColumnType"] = json!("int128");
        let table = parse_data_table(&v, &DecodePolicy::default()).unwrap();
        assert_eq!(table.columns[1].column_type, ColumnType::Other("int128".into()));
        assert_eq!(table.rows[0].0[1], Value::String(Some("Visualization".into())));

        let err = parse_data_table(&v, &DecodePolicy::strict()).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnknownColumnType { ref type_name, .. } if type_name == "int128"
        ));
    }

    #[test]
    fn bad_cell_names_row_and_column() {
        let mut v = properties_table();
        v["Rows"] = json!([[1, "a", null], ["x", "b", null]]);
        let err = parse_data_table(&v, &DecodePolicy::default()).unwrap_err();
        match err {
            DecodeError::ValueFormat { table, row, column, .. } => {
                assert_eq!((table, row, column.as_str()), (0, 1, "TableId"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn fragment_modes_and_field_count() {
        let v = json!({
            "FrameType": "TableFragment",
            "TableId": "3",
            "TableFragmentType": "DataReplace",
            "FieldCount": 2,
            "Rows": [[1, 2], [3, 4]],
        });
        let frag = parse_table_fragment(&v).unwrap();
        assert_eq!(frag.table_id, 3);
        assert_eq!(frag.mode, FragmentMode::Replace);
        assert_eq!(frag.field_count, Some(2));
        assert_eq!(frag.rows.len(), 2);

        let v = json!({
            "FrameType": "TableFragment",
            "TableId": 3,
            "TableFragmentType": "DataMerge",
            "Rows": [],
        });
        assert!(matches!(parse_table_fragment(&v), Err(DecodeError::WrongType { .. })));
    }

    #[test]
    fn completion_and_progress() {
        let c = parse_table_completion(&json!({
            "FrameType": "TableCompletion", "TableId": 1, "RowCount": 10
        }))
        .unwrap();
        assert_eq!(c, TableCompletion { table_id: 1, row_count: Some(10) });

        let c = parse_table_completion(&json!({"FrameType": "TableCompletion", "TableId": 1}))
            .unwrap();
        assert_eq!(c.row_count, None);

        assert!(parse_table_completion(&json!({
            "FrameType": "TableCompletion", "TableId": 1, "RowCount": -1
        }))
        .is_err());

        let p = parse_table_progress(&json!({
            "FrameType": "TableProgress", "TableId": 1, "TableProgress": 42.5
        }))
        .unwrap();
        assert_eq!(p.progress, 42.5);
    }

    #[test]
    fn data_set_header_fields() {
        let h = parse_data_set_header(&json!({
            "FrameType": "DataSetHeader", "Version": "v2.0", "IsProgressive": true
        }))
        .unwrap();
        assert_eq!(h.version, "v2.0");
        assert!(h.is_progressive);
        assert_eq!(h.is_fragmented, None);

        assert!(matches!(
            parse_data_set_header(&json!({"FrameType": "DataSetHeader", "Version": "v2.0"})),
            Err(DecodeError::MissingField { .. })
        ));
    }

    #[test]
    fn data_set_completion_cases() {
        let c = parse_data_set_completion(&json!({
            "FrameType": "DataSetCompletion", "HasErrors": true, "Cancelled": true
        }))
        .unwrap();
        assert_eq!(
            c,
            DataSetCompletion { has_errors: true, cancelled: true, one_api_errors: vec![] }
        );

        let c = parse_data_set_completion(&json!({
            "FrameType": "DataSetCompletion", "HasErrors": true, "Cancelled": true,
            "OneApiErrors": ["error"]
        }))
        .unwrap();
        assert_eq!(c.one_api_errors, vec!["error".to_string()]);

        let err = parse_data_set_completion(&json!({
            "FrameType": "DataSetCompletion", "HasErrors": true, "Cancelled": true,
            "OneApiErrors": ["error", 2]
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::WrongType { ref field, table: None, .. } if field == "OneApiErrors[1]"
        ));

        assert!(parse_data_set_completion(&json!({
            "FrameType": "DataSetCompletion", "HasErrors": true, "Cancelled": true,
            "OneApiErrors": "error"
        }))
        .is_err());
    }
}
