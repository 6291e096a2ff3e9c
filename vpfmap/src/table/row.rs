//! Typed row values and row decoding.
//!
//! Rows follow the header back to back. Variable-count columns carry a
//! u32 element count before their elements; triplet ids carry a one-byte
//! width descriptor. Decoding never panics on truncated input; a damaged
//! row surfaces as a `RowError` which the iterator turns into a logged
//! skip.

use bytes::{Buf, Bytes};
use thiserror::Error;

use crate::table::header::{ByteOrder, ColumnCount, ColumnType, TableHeader};

/// Failure decoding a single row.
#[derive(Debug, Error)]
pub enum RowError {
    /// Row data ended before all columns were read.
    #[error("row truncated")]
    Truncated,

    /// A variable element count larger than the remaining file.
    #[error("element count {0} exceeds remaining data")]
    Oversized(u32),
}

/// A cross-tile primitive reference (`K` column).
///
/// Encodes up to three ids with a leading width descriptor byte; two bits
/// per field give each id a width of 0, 1, 2 or 4 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TripletId {
    pub id: i32,
    pub tile_id: i32,
    pub ext_id: i32,
}

/// One decoded column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Short(i16),
    Int(i32),
    Float(f32),
    Double(f64),
    /// Coordinate pairs as (lon, lat) in degrees; elevation components of
    /// 3D columns are dropped on decode.
    Coords(Vec<(f64, f64)>),
    Triplet(TripletId),
    Null,
}

/// A decoded table row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row(pub(crate) Vec<Value>);

impl Row {
    /// Raw value at a column index.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Integer view of a column (shorts widen, triplets yield their id).
    pub fn int(&self, index: usize) -> Option<i32> {
        match self.0.get(index)? {
            Value::Short(v) => Some(*v as i32),
            Value::Int(v) => Some(*v),
            Value::Triplet(t) => Some(t.id),
            _ => None,
        }
    }

    /// Floating-point view of a column (integers widen).
    pub fn float(&self, index: usize) -> Option<f64> {
        match self.0.get(index)? {
            Value::Float(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            Value::Short(v) => Some(*v as f64),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Text view of a column.
    pub fn text(&self, index: usize) -> Option<&str> {
        match self.0.get(index)? {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Coordinate view of a column.
    pub fn coords(&self, index: usize) -> Option<&[(f64, f64)]> {
        match self.0.get(index)? {
            Value::Coords(c) => Some(c.as_slice()),
            _ => None,
        }
    }
}

fn need(buf: &Bytes, bytes: usize) -> Result<(), RowError> {
    if buf.remaining() < bytes {
        Err(RowError::Truncated)
    } else {
        Ok(())
    }
}

fn element_count(
    buf: &mut Bytes,
    order: ByteOrder,
    count: ColumnCount,
    elem_size: usize,
) -> Result<usize, RowError> {
    match count {
        ColumnCount::Fixed(n) => Ok(n as usize),
        ColumnCount::Variable => {
            need(buf, 4)?;
            let n = order.get_u32(buf);
            if elem_size > 0 && (n as usize).saturating_mul(elem_size) > buf.remaining() {
                return Err(RowError::Oversized(n));
            }
            Ok(n as usize)
        }
    }
}

fn read_text(buf: &mut Bytes, chars: usize) -> Result<String, RowError> {
    need(buf, chars)?;
    let raw = buf.split_to(chars);
    // VPF text is ASCII, padded with spaces or NULs to the declared width.
    let s = String::from_utf8_lossy(&raw);
    Ok(s.trim_end_matches(['\0', ' ']).to_string())
}

fn read_coords(
    buf: &mut Bytes,
    order: ByteOrder,
    n: usize,
    column_type: ColumnType,
) -> Result<Vec<(f64, f64)>, RowError> {
    let mut coords = Vec::with_capacity(n);
    for _ in 0..n {
        let (lon, lat) = match column_type {
            ColumnType::CoordF => {
                need(buf, 8)?;
                (order.get_f32(buf) as f64, order.get_f32(buf) as f64)
            }
            ColumnType::CoordR => {
                need(buf, 16)?;
                (order.get_f64(buf), order.get_f64(buf))
            }
            ColumnType::CoordZF => {
                need(buf, 12)?;
                let pair = (order.get_f32(buf) as f64, order.get_f32(buf) as f64);
                let _elevation = order.get_f32(buf);
                pair
            }
            ColumnType::CoordZR => {
                need(buf, 24)?;
                let pair = (order.get_f64(buf), order.get_f64(buf));
                let _elevation = order.get_f64(buf);
                pair
            }
            _ => unreachable!("read_coords called for non-coordinate column"),
        };
        coords.push((lon, lat));
    }
    Ok(coords)
}

fn read_triplet_field(buf: &mut Bytes, order: ByteOrder, width_code: u8) -> Result<i32, RowError> {
    match width_code {
        0 => Ok(0),
        1 => {
            need(buf, 1)?;
            Ok(buf.get_u8() as i32)
        }
        2 => {
            need(buf, 2)?;
            Ok(order.get_i16(buf) as i32)
        }
        _ => {
            need(buf, 4)?;
            Ok(order.get_i32(buf))
        }
    }
}

fn read_triplet(buf: &mut Bytes, order: ByteOrder) -> Result<TripletId, RowError> {
    need(buf, 1)?;
    let descriptor = buf.get_u8();
    let id = read_triplet_field(buf, order, (descriptor >> 6) & 0x3)?;
    let tile_id = read_triplet_field(buf, order, (descriptor >> 4) & 0x3)?;
    let ext_id = read_triplet_field(buf, order, (descriptor >> 2) & 0x3)?;
    Ok(TripletId {
        id,
        tile_id,
        ext_id,
    })
}

/// Decode one row according to the header's column layout.
pub(crate) fn read_row(buf: &mut Bytes, header: &TableHeader) -> Result<Row, RowError> {
    let order = header.byte_order;
    let mut values = Vec::with_capacity(header.columns.len());

    for col in &header.columns {
        let value = match col.column_type {
            ColumnType::Null => Value::Null,
            ColumnType::Text => {
                let n = element_count(buf, order, col.count, 1)?;
                Value::Text(read_text(buf, n)?)
            }
            ColumnType::Date => {
                let n = element_count(buf, order, col.count, 20)?;
                Value::Text(read_text(buf, n * 20)?)
            }
            ColumnType::ShortInt => {
                need(buf, 2)?;
                Value::Short(order.get_i16(buf))
            }
            ColumnType::LongInt => {
                need(buf, 4)?;
                Value::Int(order.get_i32(buf))
            }
            ColumnType::ShortFloat => {
                need(buf, 4)?;
                Value::Float(order.get_f32(buf))
            }
            ColumnType::LongFloat => {
                need(buf, 8)?;
                Value::Double(order.get_f64(buf))
            }
            ColumnType::CoordF | ColumnType::CoordR | ColumnType::CoordZF | ColumnType::CoordZR => {
                let elem = match col.column_type {
                    ColumnType::CoordR => 16,
                    ColumnType::CoordZF => 12,
                    ColumnType::CoordZR => 24,
                    _ => 8,
                };
                let n = element_count(buf, order, col.count, elem)?;
                Value::Coords(read_coords(buf, order, n, col.column_type)?)
            }
            ColumnType::TripletId => Value::Triplet(read_triplet(buf, order)?),
        };
        values.push(value);
    }

    Ok(Row(values))
}
