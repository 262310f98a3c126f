//! Heron DSP - Spectral Equalizer Processing
//!
//! This crate provides the pure DSP half of the Heron equalizer:
//! - Logarithmic band-to-bin mapping with a fixed, compatibility-critical edge formula
//! - Overlap-based window buffering for 16-bit interleaved stereo PCM
//! - A spectral gain pass over a reused FFT plan (rustfft)
//! - Post-gain bin snapshots for the diagnostic control protocol
//!
//! # Architecture
//!
//! The processing path allocates nothing after construction. All shared
//! state, configuration, and I/O live in `heron_core`; this crate only sees
//! a frame, a raw band table, and a master gain per call.

mod bands;
mod error;
mod overlap;
mod processor;
mod spectral;

pub use bands::{
    band_range, clamp_gain, mapped_bands, GAIN_MAX, GAIN_MIN, HALF_WINDOW, MAX_BANDS,
    OUTPUT_OFFSET, WINDOW_SIZE,
};
pub use error::DspError;
pub use processor::{SpectralEq, CHANNELS, MAX_FRAME};
