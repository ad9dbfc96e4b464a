pub mod config;
pub mod dataset;
pub mod error;
pub mod table;
pub mod value;

pub use config::{DecodePolicy, RowCountPolicy, UnknownColumnTypePolicy};
pub use dataset::{DataSetCompletion, DataSetHeader, FrameKind};
pub use error::{DecodeError, DecodeWarning, ErrorKind};
pub use table::{Column, ResultTable, Table, TableId, TableKind, TableRole};
pub use value::{ColumnType, Row, Value};
