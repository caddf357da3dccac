//! Windowed-sinc interpolation kernel tables
//!
//! A FIR file stores the interpolation kernel sampled at `samplesPerCrossing`
//! points per zero crossing, plus the finite-difference slope between adjacent
//! taps. The slope array lets the resampler evaluate the kernel at arbitrary
//! fractional positions with one multiply-add instead of storing every
//! fractional offset.

use super::error::{TableError, TableResult};
use super::reader::{ByteCursor, FieldKind, FieldLayout};

/// Header layout for FIR kernel files
pub const FIR_FIELDS: FieldLayout = &[
    ("numCrossings", FieldKind::Uint),
    ("samplesPerCrossing", FieldKind::Uint),
    ("cutoffCycle", FieldKind::Float),
    ("kaiserBeta", FieldKind::Float),
];

/// Parsed FIR file header
///
/// `cutoff_cycle` and `kaiser_beta` record how the kernel was generated; the
/// resampler never reads them.
#[derive(Debug, Clone, PartialEq)]
pub struct FirHeader {
    pub num_crossings: u32,
    pub samples_per_crossing: u32,
    pub cutoff_cycle: f32,
    pub kaiser_beta: f32,
}

/// An immutable fractional-delay interpolation kernel
#[derive(Debug, Clone)]
pub struct FirKernel {
    header: FirHeader,
    coeffs: Vec<f32>,
    deltas: Vec<f32>,
}

impl FirKernel {
    /// Decode a FIR kernel table from raw file bytes
    pub fn decode(data: &[u8]) -> TableResult<FirKernel> {
        let mut cur = ByteCursor::new(data);

        let header = FirHeader {
            num_crossings: cur.read_u32()?,
            samples_per_crossing: cur.read_u32()?,
            cutoff_cycle: cur.read_f32()?,
            kaiser_beta: cur.read_f32()?,
        };

        let filter_size = derived_filter_size(&header)?;
        let coeffs = cur.read_f32_array(filter_size)?;
        let deltas = cur.read_f32_array(filter_size)?;

        log::debug!(
            "[TABLE] fir kernel: {} crossings x {} taps, {} coefficients",
            header.num_crossings,
            header.samples_per_crossing,
            filter_size
        );

        Ok(FirKernel { header, coeffs, deltas })
    }

    /// Build a kernel from already-computed parts (used by the generator)
    pub fn from_parts(header: FirHeader, coeffs: Vec<f32>, deltas: Vec<f32>) -> TableResult<Self> {
        let filter_size = derived_filter_size(&header)?;
        if coeffs.len() != filter_size || deltas.len() != filter_size {
            return Err(TableError::MalformedHeader(format!(
                "kernel arrays must hold {} taps (got {} coeffs, {} deltas)",
                filter_size,
                coeffs.len(),
                deltas.len()
            )));
        }
        Ok(FirKernel { header, coeffs, deltas })
    }

    #[inline]
    pub fn header(&self) -> &FirHeader {
        &self.header
    }

    /// Number of stored taps: `samplesPerCrossing * (numCrossings - 1) - 1`
    #[inline]
    pub fn filter_size(&self) -> usize {
        self.coeffs.len()
    }

    /// Symmetric window half-width in input samples: `(numCrossings - 1) / 2`
    #[inline]
    pub fn half_crossings(&self) -> usize {
        ((self.header.num_crossings - 1) / 2) as usize
    }

    #[inline]
    pub fn samples_per_crossing(&self) -> usize {
        self.header.samples_per_crossing as usize
    }

    #[inline]
    pub fn coeffs(&self) -> &[f32] {
        &self.coeffs
    }

    #[inline]
    pub fn deltas(&self) -> &[f32] {
        &self.deltas
    }

    /// Kernel value at tap position `i` plus fractional offset `frac`
    #[inline]
    pub fn tap(&self, i: usize, frac: f32) -> f32 {
        self.coeffs[i] + frac * self.deltas[i]
    }
}

fn derived_filter_size(header: &FirHeader) -> TableResult<usize> {
    if header.num_crossings < 2 || header.samples_per_crossing == 0 {
        return Err(TableError::MalformedHeader(format!(
            "kernel needs numCrossings >= 2 and samplesPerCrossing >= 1 (got {}, {})",
            header.num_crossings, header.samples_per_crossing
        )));
    }
    let size = header.samples_per_crossing as usize * (header.num_crossings as usize - 1) - 1;
    if size == 0 {
        return Err(TableError::MalformedHeader(
            "kernel derives to zero taps".to_string(),
        ));
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::writer::encode_fir;

    fn synthetic_kernel(num_crossings: u32, samples_per_crossing: u32) -> FirKernel {
        let size = samples_per_crossing as usize * (num_crossings as usize - 1) - 1;
        let coeffs: Vec<f32> = (0..size).map(|i| i as f32 * 0.125).collect();
        let mut deltas: Vec<f32> = coeffs.windows(2).map(|w| w[1] - w[0]).collect();
        deltas.push(-coeffs[size - 1]);
        FirKernel::from_parts(
            FirHeader {
                num_crossings,
                samples_per_crossing,
                cutoff_cycle: 0.9,
                kaiser_beta: 6.0,
            },
            coeffs,
            deltas,
        )
        .unwrap()
    }

    #[test]
    fn test_derived_sizes() {
        let k = synthetic_kernel(4, 8);
        assert_eq!(k.filter_size(), 23);
        assert_eq!(k.half_crossings(), 1);

        let k = synthetic_kernel(9, 32);
        assert_eq!(k.filter_size(), 255);
        assert_eq!(k.half_crossings(), 4);
    }

    #[test]
    fn test_round_trip() {
        let kernel = synthetic_kernel(4, 8);
        let bytes = encode_fir(&kernel);
        let decoded = FirKernel::decode(&bytes).unwrap();

        assert_eq!(decoded.header(), kernel.header());
        assert_eq!(decoded.coeffs(), kernel.coeffs());
        assert_eq!(decoded.deltas(), kernel.deltas());
    }

    #[test]
    fn test_tap_interpolates_between_coeffs() {
        let k = synthetic_kernel(4, 8);
        let exact = k.tap(3, 0.0);
        assert!((exact - k.coeffs()[3]).abs() < 1e-6);

        let mid = k.tap(3, 0.5);
        let expected = k.coeffs()[3] + 0.5 * (k.coeffs()[4] - k.coeffs()[3]);
        assert!((mid - expected).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_headers_rejected() {
        let bad = FirHeader {
            num_crossings: 1,
            samples_per_crossing: 8,
            cutoff_cycle: 0.9,
            kaiser_beta: 6.0,
        };
        assert!(matches!(
            FirKernel::from_parts(bad, vec![], vec![]),
            Err(TableError::MalformedHeader(_))
        ));

        let zero_taps = FirHeader {
            num_crossings: 2,
            samples_per_crossing: 1,
            cutoff_cycle: 0.9,
            kaiser_beta: 6.0,
        };
        assert!(matches!(
            FirKernel::from_parts(zero_taps, vec![], vec![]),
            Err(TableError::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_truncated_coefficient_array() {
        let kernel = synthetic_kernel(4, 8);
        let mut bytes = encode_fir(&kernel);
        bytes.truncate(bytes.len() - 4);
        assert!(matches!(
            FirKernel::decode(&bytes),
            Err(TableError::Truncated { .. })
        ));
    }
}
