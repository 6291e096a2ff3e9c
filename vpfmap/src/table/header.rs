//! VPF table header parsing.
//!
//! Every VPF table file starts with a 4-byte header length followed by a
//! text header describing the table:
//!
//! ```text
//! <order>;<table description>;<narrative table>;<column>:<column>:...;
//! ```
//!
//! `<order>` is `L` (least significant byte first) or `M` (most significant
//! byte first) and governs both the length word and all numeric row data.
//! Each column definition is `name=type,count,keytype,...`; fields past the
//! key type are narrative/index references and are ignored here.

use bytes::{Buf, Bytes};

use crate::error::DataError;

/// Byte order of a table's numeric data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    pub(crate) fn get_i16(&self, buf: &mut Bytes) -> i16 {
        match self {
            ByteOrder::Little => buf.get_i16_le(),
            ByteOrder::Big => buf.get_i16(),
        }
    }

    pub(crate) fn get_i32(&self, buf: &mut Bytes) -> i32 {
        match self {
            ByteOrder::Little => buf.get_i32_le(),
            ByteOrder::Big => buf.get_i32(),
        }
    }

    pub(crate) fn get_u32(&self, buf: &mut Bytes) -> u32 {
        match self {
            ByteOrder::Little => buf.get_u32_le(),
            ByteOrder::Big => buf.get_u32(),
        }
    }

    pub(crate) fn get_f32(&self, buf: &mut Bytes) -> f32 {
        match self {
            ByteOrder::Little => buf.get_f32_le(),
            ByteOrder::Big => buf.get_f32(),
        }
    }

    pub(crate) fn get_f64(&self, buf: &mut Bytes) -> f64 {
        match self {
            ByteOrder::Little => buf.get_f64_le(),
            ByteOrder::Big => buf.get_f64(),
        }
    }
}

/// VPF column data types (Mil-Std-2407 type codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// `T`/`L`/`N`/`M` - text, one byte per character.
    Text,
    /// `S` - 16-bit signed integer.
    ShortInt,
    /// `I` - 32-bit signed integer.
    LongInt,
    /// `F` - 32-bit float.
    ShortFloat,
    /// `R` - 64-bit float.
    LongFloat,
    /// `C` - 2D coordinate pairs, 32-bit floats (lon, lat).
    CoordF,
    /// `B` - 2D coordinate pairs, 64-bit floats.
    CoordR,
    /// `Z` - 3D coordinate triples, 32-bit floats (elevation dropped).
    CoordZF,
    /// `Y` - 3D coordinate triples, 64-bit floats.
    CoordZR,
    /// `K` - triplet id (variable-width cross-tile reference).
    TripletId,
    /// `D` - date/time, 20 characters.
    Date,
    /// `X` - null field, occupies no row bytes.
    Null,
}

impl ColumnType {
    /// Map a VPF type code to a column type.
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'T' | 'L' | 'N' | 'M' => Some(ColumnType::Text),
            'S' => Some(ColumnType::ShortInt),
            'I' => Some(ColumnType::LongInt),
            'F' => Some(ColumnType::ShortFloat),
            'R' => Some(ColumnType::LongFloat),
            'C' => Some(ColumnType::CoordF),
            'B' => Some(ColumnType::CoordR),
            'Z' => Some(ColumnType::CoordZF),
            'Y' => Some(ColumnType::CoordZR),
            'K' => Some(ColumnType::TripletId),
            'D' => Some(ColumnType::Date),
            'X' => Some(ColumnType::Null),
            _ => None,
        }
    }

    /// Bytes per element, or `None` when the width varies per row.
    pub fn element_size(&self) -> Option<usize> {
        match self {
            ColumnType::Text => Some(1),
            ColumnType::ShortInt => Some(2),
            ColumnType::LongInt => Some(4),
            ColumnType::ShortFloat => Some(4),
            ColumnType::LongFloat => Some(8),
            ColumnType::CoordF => Some(8),
            ColumnType::CoordR => Some(16),
            ColumnType::CoordZF => Some(12),
            ColumnType::CoordZR => Some(24),
            ColumnType::Date => Some(20),
            ColumnType::Null => Some(0),
            ColumnType::TripletId => None,
        }
    }
}

/// Element count of a column: fixed, or prefixed per row by a u32 count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnCount {
    Fixed(u32),
    Variable,
}

/// A single column definition from a table header.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    pub count: ColumnCount,
    pub key_type: char,
}

/// Parsed VPF table header.
#[derive(Debug, Clone)]
pub struct TableHeader {
    pub byte_order: ByteOrder,
    pub description: String,
    pub narrative: String,
    pub columns: Vec<ColumnDef>,
}

impl TableHeader {
    /// Parse a header from the start of a table file, consuming the length
    /// word and the header text from `buf`. Row data follows.
    pub fn parse(buf: &mut Bytes, table: &str) -> Result<Self, DataError> {
        if buf.remaining() < 5 {
            return Err(DataError::parse(table, "file too short for header"));
        }

        // The byte-order indicator is the first header character, directly
        // after the length word it also governs.
        let len_raw = [buf[0], buf[1], buf[2], buf[3]];
        let byte_order = match buf[4] {
            b'L' | b'l' => ByteOrder::Little,
            b'M' | b'B' => ByteOrder::Big,
            other => {
                return Err(DataError::parse(
                    table,
                    format!("unknown byte order indicator {:?}", other as char),
                ));
            }
        };
        let header_len = match byte_order {
            ByteOrder::Little => u32::from_le_bytes(len_raw),
            ByteOrder::Big => u32::from_be_bytes(len_raw),
        } as usize;
        buf.advance(4);

        if buf.remaining() < header_len {
            return Err(DataError::parse(
                table,
                format!(
                    "header length {} exceeds file size ({} bytes remain)",
                    header_len,
                    buf.remaining()
                ),
            ));
        }
        let text_bytes = buf.split_to(header_len);
        let text = String::from_utf8_lossy(&text_bytes);

        Self::parse_text(byte_order, &text, table)
    }

    fn parse_text(byte_order: ByteOrder, text: &str, table: &str) -> Result<Self, DataError> {
        let mut chars = text.chars();
        chars.next(); // order indicator, already consumed above
        if chars.next() != Some(';') {
            return Err(DataError::parse(table, "missing separator after byte order"));
        }

        let rest: String = chars.collect();
        let mut segments = rest.split(';');
        let description = segments
            .next()
            .ok_or_else(|| DataError::parse(table, "missing table description"))?
            .trim()
            .to_string();
        let narrative = segments
            .next()
            .ok_or_else(|| DataError::parse(table, "missing narrative table field"))?
            .trim()
            .to_string();
        let column_text = segments
            .next()
            .ok_or_else(|| DataError::parse(table, "missing column definitions"))?;

        let mut columns = Vec::new();
        for def in column_text.split(':').filter(|s| !s.trim().is_empty()) {
            columns.push(Self::parse_column(def, table)?);
        }
        if columns.is_empty() {
            return Err(DataError::parse(table, "table defines no columns"));
        }

        Ok(TableHeader {
            byte_order,
            description,
            narrative,
            columns,
        })
    }

    fn parse_column(def: &str, table: &str) -> Result<ColumnDef, DataError> {
        let (name, spec) = def
            .split_once('=')
            .ok_or_else(|| DataError::parse(table, format!("column without '=': {:?}", def)))?;

        let mut fields = spec.split(',');
        let type_field = fields
            .next()
            .ok_or_else(|| DataError::parse(table, format!("column {:?} missing type", name)))?
            .trim();
        let type_code = type_field
            .chars()
            .next()
            .ok_or_else(|| DataError::parse(table, format!("column {:?} has empty type", name)))?;
        let column_type = ColumnType::from_code(type_code).ok_or_else(|| {
            DataError::parse(table, format!("column {:?} has unknown type {:?}", name, type_code))
        })?;

        let count_field = fields.next().map(str::trim).unwrap_or("1");
        let count = if count_field == "*" {
            ColumnCount::Variable
        } else {
            let n: u32 = count_field.parse().map_err(|_| {
                DataError::parse(
                    table,
                    format!("column {:?} has invalid count {:?}", name, count_field),
                )
            })?;
            ColumnCount::Fixed(n)
        };

        let key_type = fields
            .next()
            .and_then(|f| f.trim().chars().next())
            .unwrap_or('N');

        Ok(ColumnDef {
            name: name.trim().to_string(),
            column_type,
            count,
            key_type,
        })
    }

    /// Index of a column by name, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Total row length in bytes when every column is fixed width.
    ///
    /// Returns `None` for tables with variable-length or triplet columns;
    /// those rows cannot be skipped over without parsing.
    pub fn fixed_row_len(&self) -> Option<usize> {
        let mut total = 0usize;
        for col in &self.columns {
            let elem = col.column_type.element_size()?;
            match col.count {
                ColumnCount::Fixed(n) => total += elem * n as usize,
                ColumnCount::Variable => return None,
            }
        }
        Some(total)
    }
}
