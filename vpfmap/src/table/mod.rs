//! VPF binary table reader.
//!
//! Parses the row-column tabular format defined by Mil-Std-2407: a text
//! header declaring field names, types and lengths, followed by packed
//! binary rows. Byte-level compatibility with existing VPF datasets is the
//! contract here; there is no alternate ingestion path.

mod file;
mod header;
mod row;

pub use file::{Rows, Storage, TableFile};
pub use header::{ByteOrder, ColumnCount, ColumnDef, ColumnType, TableHeader};
pub use row::{Row, RowError, TripletId, Value};
