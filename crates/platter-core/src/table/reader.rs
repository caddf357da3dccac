//! Little-endian field cursor over raw table bytes
//!
//! Every header field in the table formats is exactly four bytes wide and one
//! of three wire types: signed int, unsigned int or float. Headers are
//! described as flat `(name, kind)` layouts so generic tooling (table-inspect)
//! can walk any header without knowing the concrete table type; the typed
//! decoders read the same fields through the `read_*` methods.

use super::error::{TableError, TableResult};

/// Wire type of a single header field (always four bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    Uint,
    Float,
}

/// A decoded header field value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Int(i32),
    Uint(u32),
    Float(f32),
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Uint(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
        }
    }
}

/// A fixed header layout: field names with their wire types, in read order
pub type FieldLayout = &'static [(&'static str, FieldKind)];

/// Total byte size of a header layout
pub const fn layout_size(layout: FieldLayout) -> usize {
    layout.len() * 4
}

/// Cursor over a table byte buffer
///
/// Reads advance the position; running past the end yields
/// [`TableError::Truncated`] rather than panicking.
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current byte offset from the start of the buffer
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed
    #[inline]
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    fn take(&mut self, n: usize) -> TableResult<&'a [u8]> {
        let available = self.data.len() - self.pos;
        if available < n {
            return Err(TableError::Truncated { needed: n, available });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_i32(&mut self) -> TableResult<i32> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u32(&mut self) -> TableResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_f32(&mut self) -> TableResult<f32> {
        let b = self.take(4)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read `len` consecutive little-endian f32 values
    pub fn read_f32_array(&mut self, len: usize) -> TableResult<Vec<f32>> {
        let bytes = self.take(len * 4)?;
        Ok(bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect())
    }

    /// Read `len` consecutive little-endian i32 values
    pub fn read_i32_array(&mut self, len: usize) -> TableResult<Vec<i32>> {
        let bytes = self.take(len * 4)?;
        Ok(bytes
            .chunks_exact(4)
            .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect())
    }

    /// Read an entire header layout in declared order
    ///
    /// Consumes exactly `layout_size(layout)` bytes on success, so the cursor
    /// position afterwards is the payload offset.
    pub fn read_fields(&mut self, layout: FieldLayout) -> TableResult<Vec<FieldValue>> {
        let mut values = Vec::with_capacity(layout.len());
        for (_, kind) in layout {
            let value = match kind {
                FieldKind::Int => FieldValue::Int(self.read_i32()?),
                FieldKind::Uint => FieldValue::Uint(self.read_u32()?),
                FieldKind::Float => FieldValue::Float(self.read_f32()?),
            };
            values.push(value);
        }
        Ok(values)
    }
}
