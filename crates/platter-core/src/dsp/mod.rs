//! DSP kernels: circular resampling and offline table generation

pub mod generate;
pub mod resampler;

pub use resampler::RingResampler;
