//! External FIR filter seam
//!
//! The engine exposes highpass/lowpass entry points but does not ship FIR
//! kernels of its own; a platform integration installs an implementation of
//! this trait. Without one, the entry points copy input to output unchanged.

/// Platform-supplied FIR filter pair.
///
/// `gain` is the engine's live `lpf_gain`; implementations decide how to
/// apply it. Slices are interleaved stereo PCM and equally long.
pub trait FirBank: Send + Sync {
    fn highpass(&self, output: &mut [i16], input: &[i16], gain: f32);
    fn lowpass(&self, output: &mut [i16], input: &[i16], gain: f32);
}
