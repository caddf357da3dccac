//! Sparse constant-Q transform matrices
//!
//! A constant-Q file stores a precomputed sparse linear map from half-spectrum
//! FFT magnitudes (`rows` inputs) to log-spaced constant-Q bins (`cols`
//! outputs), in compressed-column form: per-column value runs plus the FFT bin
//! row of each value. The matrix is built offline per sample rate and loaded
//! once at start-up; `apply` is the per-frame hot path.

use super::error::{TableError, TableResult};
use super::reader::{ByteCursor, FieldKind, FieldLayout};

/// Header layout for constant-Q files
pub const CQT_FIELDS: FieldLayout = &[
    ("sampleRate", FieldKind::Uint),
    ("binsPerOctave", FieldKind::Uint),
    ("minFreq", FieldKind::Float),
    ("maxFreq", FieldKind::Float),
    ("numRows", FieldKind::Uint),
    ("numCols", FieldKind::Uint),
    ("innerPtrSize", FieldKind::Uint),
    ("outerPtrSize", FieldKind::Uint),
];

/// Parsed constant-Q file header
#[derive(Debug, Clone, PartialEq)]
pub struct CqtHeader {
    pub sample_rate: u32,
    pub bins_per_octave: u32,
    pub min_freq: f32,
    pub max_freq: f32,
    pub num_rows: u32,
    pub num_cols: u32,
    pub inner_ptr_size: u32,
    pub outer_ptr_size: u32,
}

/// An immutable sparse constant-Q matrix
#[derive(Debug, Clone)]
pub struct CqtMatrix {
    header: CqtHeader,
    values: Vec<f32>,
    inner_index: Vec<i32>,
    outer_ptr: Vec<i32>,
}

impl CqtMatrix {
    /// Decode a constant-Q table from raw file bytes
    ///
    /// Validates the sparse structure up front so `apply` can index without
    /// bounds surprises: no partially decoded matrix is ever returned.
    pub fn decode(data: &[u8]) -> TableResult<CqtMatrix> {
        let mut cur = ByteCursor::new(data);

        let header = CqtHeader {
            sample_rate: cur.read_u32()?,
            bins_per_octave: cur.read_u32()?,
            min_freq: cur.read_f32()?,
            max_freq: cur.read_f32()?,
            num_rows: cur.read_u32()?,
            num_cols: cur.read_u32()?,
            inner_ptr_size: cur.read_u32()?,
            outer_ptr_size: cur.read_u32()?,
        };

        if header.num_rows == 0
            || header.num_cols == 0
            || header.inner_ptr_size == 0
            || header.outer_ptr_size == 0
            || header.min_freq == 0.0
            || header.max_freq == 0.0
        {
            return Err(TableError::MalformedHeader(format!(
                "constant-Q header has zero field(s): rows={} cols={} inner={} outer={} minFreq={} maxFreq={}",
                header.num_rows,
                header.num_cols,
                header.inner_ptr_size,
                header.outer_ptr_size,
                header.min_freq,
                header.max_freq
            )));
        }

        let nnz = header.inner_ptr_size as usize;
        let values = cur.read_f32_array(nnz)?;
        let inner_index = cur.read_i32_array(nnz)?;
        let outer_ptr = cur.read_i32_array(header.outer_ptr_size as usize)?;

        let matrix = CqtMatrix {
            header,
            values,
            inner_index,
            outer_ptr,
        };
        matrix.validate()?;

        log::debug!(
            "[TABLE] constant-Q: {}x{} matrix, {} nonzeros, {} bins/octave @ {}Hz",
            matrix.rows(),
            matrix.cols(),
            nnz,
            matrix.header.bins_per_octave,
            matrix.header.sample_rate
        );

        Ok(matrix)
    }

    /// Build a matrix from already-computed parts (used by the generator)
    pub fn from_parts(
        header: CqtHeader,
        values: Vec<f32>,
        inner_index: Vec<i32>,
        outer_ptr: Vec<i32>,
    ) -> TableResult<Self> {
        let matrix = CqtMatrix {
            header,
            values,
            inner_index,
            outer_ptr,
        };
        matrix.validate()?;
        Ok(matrix)
    }

    fn validate(&self) -> TableResult<()> {
        let nnz = self.values.len();
        if self.header.inner_ptr_size as usize != nnz
            || self.header.outer_ptr_size as usize != self.outer_ptr.len()
        {
            return Err(TableError::MalformedHeader(format!(
                "header claims {} values / {} outer pointers, got {} / {}",
                self.header.inner_ptr_size,
                self.header.outer_ptr_size,
                nnz,
                self.outer_ptr.len()
            )));
        }
        if self.inner_index.len() != nnz {
            return Err(TableError::MalformedHeader(format!(
                "inner index length {} != value count {}",
                self.inner_index.len(),
                nnz
            )));
        }
        if self.outer_ptr.len() != self.cols() + 1 {
            return Err(TableError::MalformedHeader(format!(
                "outer pointer length {} != cols + 1 ({})",
                self.outer_ptr.len(),
                self.cols() + 1
            )));
        }

        let mut prev = 0i32;
        for (c, &ptr) in self.outer_ptr.iter().enumerate() {
            if ptr < prev || ptr as usize > nnz {
                return Err(TableError::MalformedHeader(format!(
                    "outer pointer {} at column {} out of order (prev {}, nnz {})",
                    ptr, c, prev, nnz
                )));
            }
            prev = ptr;
        }
        if self.outer_ptr[0] != 0 || self.outer_ptr[self.cols()] as usize != nnz {
            return Err(TableError::MalformedHeader(
                "outer pointers must span exactly [0, nnz]".to_string(),
            ));
        }

        let rows = self.rows() as i32;
        for &row in &self.inner_index {
            if row < 0 || row >= rows {
                return Err(TableError::MalformedHeader(format!(
                    "inner index {} outside 0..{}",
                    row, rows
                )));
            }
        }
        Ok(())
    }

    #[inline]
    pub fn header(&self) -> &CqtHeader {
        &self.header
    }

    /// Input dimension: half-spectrum FFT bin count
    #[inline]
    pub fn rows(&self) -> usize {
        self.header.num_rows as usize
    }

    /// Output dimension: constant-Q bin count
    #[inline]
    pub fn cols(&self) -> usize {
        self.header.num_cols as usize
    }

    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    #[inline]
    pub fn inner_index(&self) -> &[i32] {
        &self.inner_index
    }

    #[inline]
    pub fn outer_ptr(&self) -> &[i32] {
        &self.outer_ptr
    }

    /// Sparse matrix x dense vector: `output[c] = Σ values[k] * input[row[k]]`
    ///
    /// Allocation-free; runs once per displayed frame per audio channel.
    /// Non-finite accumulations (NaN input) clamp to 0 so a bad analysis
    /// frame cannot poison the renderer.
    pub fn apply(&self, input: &[f32], output: &mut [f32]) {
        debug_assert!(input.len() >= self.rows(), "input shorter than matrix rows");
        debug_assert!(output.len() >= self.cols(), "output shorter than matrix cols");

        for c in 0..self.cols() {
            let start = self.outer_ptr[c] as usize;
            let end = self.outer_ptr[c + 1] as usize;

            let mut acc = 0.0f32;
            for k in start..end {
                acc += self.values[k] * input[self.inner_index[k] as usize];
            }
            output[c] = if acc.is_finite() { acc } else { 0.0 };
        }
    }
}
