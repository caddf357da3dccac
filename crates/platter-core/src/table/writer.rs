//! Binary table encoders
//!
//! Byte-exact inverses of the table decoders, used by table-pack to produce
//! shippable files and by tests to synthesize fixtures. All fields are written
//! little-endian, four bytes each, in the same order the decoders read them.

use super::cqt::CqtMatrix;
use super::fir::FirKernel;
use super::waveform::FLAG_8BIT;

/// Quantized waveform payload to embed in a file
pub enum WaveformPayload<'a> {
    Bits8(&'a [i8]),
    Bits16(&'a [i16]),
}

impl WaveformPayload<'_> {
    fn len(&self) -> u32 {
        match self {
            WaveformPayload::Bits8(s) => s.len() as u32,
            WaveformPayload::Bits16(s) => s.len() as u32,
        }
    }

    fn flags(&self) -> u32 {
        match self {
            WaveformPayload::Bits8(_) => FLAG_8BIT,
            WaveformPayload::Bits16(_) => 0,
        }
    }
}

/// Encode a waveform envelope file
///
/// `version` 0 omits the channels field; any other value writes the version 1
/// layout. The flags word and length are derived from the payload.
pub fn encode_waveform(
    version: i32,
    sample_rate: i32,
    samples_per_pixel: i32,
    channels: i32,
    payload: WaveformPayload,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(24 + payload.len() as usize * 2);
    out.extend_from_slice(&version.to_le_bytes());
    out.extend_from_slice(&payload.flags().to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&samples_per_pixel.to_le_bytes());
    out.extend_from_slice(&payload.len().to_le_bytes());
    if version != 0 {
        out.extend_from_slice(&channels.to_le_bytes());
    }

    match payload {
        WaveformPayload::Bits8(samples) => {
            out.extend(samples.iter().map(|&s| s as u8));
        }
        WaveformPayload::Bits16(samples) => {
            for &s in samples {
                out.extend_from_slice(&s.to_le_bytes());
            }
        }
    }
    out
}

/// Encode a FIR kernel file
pub fn encode_fir(kernel: &FirKernel) -> Vec<u8> {
    let h = kernel.header();
    let mut out = Vec::with_capacity(16 + kernel.filter_size() * 8);
    out.extend_from_slice(&h.num_crossings.to_le_bytes());
    out.extend_from_slice(&h.samples_per_crossing.to_le_bytes());
    out.extend_from_slice(&h.cutoff_cycle.to_le_bytes());
    out.extend_from_slice(&h.kaiser_beta.to_le_bytes());
    for &c in kernel.coeffs() {
        out.extend_from_slice(&c.to_le_bytes());
    }
    for &d in kernel.deltas() {
        out.extend_from_slice(&d.to_le_bytes());
    }
    out
}

/// Encode a constant-Q matrix file
pub fn encode_cqt(matrix: &CqtMatrix) -> Vec<u8> {
    let h = matrix.header();
    let mut out = Vec::with_capacity(32 + matrix.values().len() * 8 + matrix.outer_ptr().len() * 4);
    out.extend_from_slice(&h.sample_rate.to_le_bytes());
    out.extend_from_slice(&h.bins_per_octave.to_le_bytes());
    out.extend_from_slice(&h.min_freq.to_le_bytes());
    out.extend_from_slice(&h.max_freq.to_le_bytes());
    out.extend_from_slice(&h.num_rows.to_le_bytes());
    out.extend_from_slice(&h.num_cols.to_le_bytes());
    out.extend_from_slice(&h.inner_ptr_size.to_le_bytes());
    out.extend_from_slice(&h.outer_ptr_size.to_le_bytes());
    for &v in matrix.values() {
        out.extend_from_slice(&v.to_le_bytes());
    }
    for &i in matrix.inner_index() {
        out.extend_from_slice(&i.to_le_bytes());
    }
    for &p in matrix.outer_ptr() {
        out.extend_from_slice(&p.to_le_bytes());
    }
    out
}
