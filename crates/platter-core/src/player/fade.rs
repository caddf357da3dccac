//! Linear volume ramps for crossfading

/// A time-bounded linear volume ramp
///
/// Advanced from the per-tick update; a non-positive duration completes
/// immediately at the target value.
#[derive(Debug, Clone)]
pub struct VolumeRamp {
    from: f32,
    to: f32,
    duration: f64,
    elapsed: f64,
}

impl VolumeRamp {
    pub fn new(from: f32, to: f32, duration: f64) -> Self {
        Self {
            from,
            to,
            duration: duration.max(0.0),
            elapsed: 0.0,
        }
    }

    /// Advance by `dt` seconds and return the new volume
    pub fn advance(&mut self, dt: f64) -> f32 {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        self.value()
    }

    /// Current volume without advancing
    pub fn value(&self) -> f32 {
        if self.duration <= 0.0 {
            return self.to;
        }
        let t = (self.elapsed / self.duration).clamp(0.0, 1.0) as f32;
        self.from + (self.to - self.from) * t
    }

    /// Final volume this ramp lands on
    #[inline]
    pub fn target(&self) -> f32 {
        self.to
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_is_linear_and_completes() {
        let mut ramp = VolumeRamp::new(1.0, 0.0, 0.4);
        assert_eq!(ramp.value(), 1.0);
        assert!(!ramp.is_complete());

        let mid = ramp.advance(0.2);
        assert!((mid - 0.5).abs() < 1e-6);

        let end = ramp.advance(0.2);
        assert_eq!(end, 0.0);
        assert!(ramp.is_complete());

        // Advancing past the end stays clamped
        assert_eq!(ramp.advance(1.0), 0.0);
    }

    #[test]
    fn test_zero_duration_completes_instantly() {
        let ramp = VolumeRamp::new(0.3, 1.0, 0.0);
        assert_eq!(ramp.value(), 1.0);
        assert!(ramp.is_complete());
    }

    #[test]
    fn test_upward_ramp_from_nonzero_start() {
        let mut ramp = VolumeRamp::new(0.5, 1.0, 1.0);
        let v = ramp.advance(0.5);
        assert!((v - 0.75).abs() < 1e-6);
        assert_eq!(ramp.target(), 1.0);
    }
}
