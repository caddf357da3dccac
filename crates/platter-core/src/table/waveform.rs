//! Precomputed waveform envelope tables
//!
//! A waveform file carries interleaved (min, max) sample pairs, one pair per
//! rendered pixel column, quantized to 8 or 16 bit. Decoding widens the
//! payload to float, normalizes the whole track so its loudest sample sits at
//! 1.0, and precomputes the drawing angle for every column so the envelope can
//! be rendered around a circle instead of a line.
//!
//! Header layouts (all fields little-endian, four bytes):
//! - version 0: `version | flags | sampleRate | samplesPerPixel | length`
//! - version 1: adds a trailing `channels` field

use std::f32::consts::PI;

use super::error::{TableError, TableResult};
use super::reader::{ByteCursor, FieldKind, FieldLayout};

/// Flag bit 0: payload samples are signed 8-bit (otherwise signed 16-bit)
pub const FLAG_8BIT: u32 = 1;

/// Channel count assumed when the header predates the channels field
const DEFAULT_CHANNELS: i32 = 2;

/// Header layout for version 0 files
pub const WAVEFORM_FIELDS_V0: FieldLayout = &[
    ("version", FieldKind::Int),
    ("flags", FieldKind::Uint),
    ("sampleRate", FieldKind::Int),
    ("samplesPerPixel", FieldKind::Int),
    ("length", FieldKind::Uint),
];

/// Header layout for version 1 files
pub const WAVEFORM_FIELDS_V1: FieldLayout = &[
    ("version", FieldKind::Int),
    ("flags", FieldKind::Uint),
    ("sampleRate", FieldKind::Int),
    ("samplesPerPixel", FieldKind::Int),
    ("length", FieldKind::Uint),
    ("channels", FieldKind::Int),
];

/// Parsed waveform file header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveformHeader {
    pub version: i32,
    pub flags: u32,
    pub sample_rate: i32,
    pub samples_per_pixel: i32,
    /// Total payload sample count (two samples per pixel column)
    pub length: u32,
    pub channels: i32,
}

impl WaveformHeader {
    /// Whether the payload is stored as signed 8-bit samples
    #[inline]
    pub fn is_8_bit(&self) -> bool {
        self.flags & FLAG_8BIT != 0
    }
}

/// A decoded, normalized waveform envelope
///
/// Immutable after decode; replaced wholesale when the active track changes.
#[derive(Debug, Clone)]
pub struct WaveformTable {
    header: WaveformHeader,
    /// Normalized samples in [-1, 1], interleaved (min, max) per column
    samples: Vec<f32>,
    /// Unit-circle direction (cos θ, sin θ) per column
    angles: Vec<(f32, f32)>,
}

impl WaveformTable {
    /// Decode a waveform table from raw file bytes
    pub fn decode(data: &[u8]) -> TableResult<WaveformTable> {
        let mut cur = ByteCursor::new(data);

        let version = cur.read_i32()?;
        let flags = cur.read_u32()?;
        let sample_rate = cur.read_i32()?;
        let samples_per_pixel = cur.read_i32()?;
        let length = cur.read_u32()?;
        let channels = match version {
            0 => DEFAULT_CHANNELS,
            1 => cur.read_i32()?,
            other => return Err(TableError::UnsupportedVersion(other)),
        };

        let header = WaveformHeader {
            version,
            flags,
            sample_rate,
            samples_per_pixel,
            length,
            channels,
        };

        let samples = Self::decode_payload(&header, cur.remaining())?;
        let angles = column_angles(samples.len() / 2);

        log::debug!(
            "[TABLE] waveform v{}: {} columns, {}-bit, {} samples/px",
            version,
            samples.len() / 2,
            if header.is_8_bit() { 8 } else { 16 },
            samples_per_pixel
        );

        Ok(WaveformTable { header, samples, angles })
    }

    /// Widen the integer payload to float and normalize to [-1, 1]
    ///
    /// The divisor is the payload-wide maximum absolute sample, so a silent
    /// track decodes to all zeros instead of dividing by zero.
    fn decode_payload(header: &WaveformHeader, payload: &[u8]) -> TableResult<Vec<f32>> {
        let count = header.length as usize;

        let mut samples: Vec<f32> = if header.is_8_bit() {
            if payload.len() < count {
                return Err(TableError::Truncated {
                    needed: count,
                    available: payload.len(),
                });
            }
            payload[..count].iter().map(|&b| b as i8 as f32).collect()
        } else {
            if payload.len() < count * 2 {
                return Err(TableError::Truncated {
                    needed: count * 2,
                    available: payload.len(),
                });
            }
            payload[..count * 2]
                .chunks_exact(2)
                .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32)
                .collect()
        };

        let max_abs = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        if max_abs > 0.0 {
            for s in &mut samples {
                *s /= max_abs;
            }
        }
        Ok(samples)
    }

    #[inline]
    pub fn header(&self) -> &WaveformHeader {
        &self.header
    }

    /// Number of pixel columns (min/max pairs)
    #[inline]
    pub fn columns(&self) -> usize {
        self.samples.len() / 2
    }

    /// Normalized (min, max) pair for one column
    #[inline]
    pub fn min_max(&self, column: usize) -> (f32, f32) {
        (self.samples[column * 2], self.samples[column * 2 + 1])
    }

    /// All normalized samples, interleaved (min, max)
    #[inline]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Unit-circle direction for one column
    #[inline]
    pub fn angle(&self, column: usize) -> (f32, f32) {
        self.angles[column]
    }

    /// Precomputed (cos θ, sin θ) per column
    #[inline]
    pub fn angles(&self) -> &[(f32, f32)] {
        &self.angles
    }
}

/// Evenly spaced unit-circle directions, offset by half a step
///
/// The half-step offset centers each column's wedge on its angle instead of
/// starting the first wedge at 3 o'clock exactly.
fn column_angles(columns: usize) -> Vec<(f32, f32)> {
    if columns == 0 {
        return Vec::new();
    }
    let offset = PI / columns as f32;
    (0..columns)
        .map(|k| {
            let theta = offset + (2.0 * PI * k as f32) / columns as f32;
            (theta.cos(), theta.sin())
        })
        .collect()
}
