//! Binary table loading
//!
//! The visualization pipeline runs off three kinds of precomputed binary
//! tables, fetched as raw bytes and decoded here:
//!
//! - **Waveform envelopes** - per-pixel min/max pairs for the circular
//!   waveform ring, normalized at load time
//! - **FIR kernels** - windowed-sinc interpolation taps for the circular
//!   resampler
//! - **Constant-Q matrices** - sparse spectral compression maps, one per
//!   sample rate
//!
//! All three share the same wire conventions: a flat little-endian header of
//! four-byte fields followed by the raw payload arrays. Decoding is strict -
//! a truncated or malformed file yields an error, never a partial table.

mod cqt;
mod error;
mod fir;
mod reader;
mod waveform;
pub mod writer;

pub use cqt::{CqtHeader, CqtMatrix, CQT_FIELDS};
pub use error::{TableError, TableResult};
pub use fir::{FirHeader, FirKernel, FIR_FIELDS};
pub use reader::{layout_size, ByteCursor, FieldKind, FieldLayout, FieldValue};
pub use waveform::{
    WaveformHeader, WaveformTable, FLAG_8BIT, WAVEFORM_FIELDS_V0, WAVEFORM_FIELDS_V1,
};
