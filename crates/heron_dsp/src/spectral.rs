//! Frequency-domain gain application
//!
//! Runs the forward transform on a channel window, scales each mapped band's
//! bins by its clamped gain (magnitude only, no phase rotation), and runs the
//! inverse transform back into the window. The transform pair is used
//! unnormalized; the PCM rescale in the overlap stage is the only
//! normalization in the chain.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::bands::{band_range, clamp_gain, mapped_bands, WINDOW_SIZE};

/// Spectral gain pass over one transform window.
///
/// Plans are built once and reused; the bin buffer is the only per-call
/// working memory and is owned here, so the hot path never allocates.
pub(crate) struct SpectralProcessor {
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    bins: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl SpectralProcessor {
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(WINDOW_SIZE);
        let inverse = planner.plan_fft_inverse(WINDOW_SIZE);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());

        Self {
            forward,
            inverse,
            bins: vec![Complex::new(0.0, 0.0); WINDOW_SIZE],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
        }
    }

    /// Transform `window`, apply band gains, transform back.
    ///
    /// Gains cover the half spectrum up to Nyquist and are mirrored onto the
    /// conjugate bins so the inverse stays real-valued (the original
    /// real-to-complex transform only ever exposed the half spectrum).
    ///
    /// When `snapshot` is given, the post-gain bins `0..snapshot_bins` are
    /// copied out as interleaved re/im pairs for diagnostics.
    pub fn process_channel(
        &mut self,
        window: &mut [f32],
        bands: &[f32],
        snapshot: Option<(&mut Vec<f32>, usize)>,
    ) {
        debug_assert_eq!(window.len(), WINDOW_SIZE);

        for (bin, &sample) in self.bins.iter_mut().zip(window.iter()) {
            *bin = Complex::new(sample, 0.0);
        }
        self.forward
            .process_with_scratch(&mut self.bins, &mut self.scratch);

        let nyquist = WINDOW_SIZE / 2;
        for j in 0..mapped_bands(bands.len() as u32) {
            let gain = clamp_gain(bands[j as usize]);
            for k in band_range(j) {
                if k > nyquist {
                    break;
                }
                self.bins[k] *= gain;
                if k != 0 && k != nyquist {
                    self.bins[WINDOW_SIZE - k] *= gain;
                }
            }
        }

        if let Some((buf, count)) = snapshot {
            buf.clear();
            for bin in &self.bins[..count] {
                buf.push(bin.re);
                buf.push(bin.im);
            }
        }

        self.inverse
            .process_with_scratch(&mut self.bins, &mut self.scratch);
        for (sample, bin) in window.iter_mut().zip(self.bins.iter()) {
            *sample = bin.re;
        }
    }
}
