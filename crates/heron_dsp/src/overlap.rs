//! Sliding-window buffering for overlap reconstruction
//!
//! Each channel keeps a full transform window plus a copy of the previous
//! pre-transform window. Every call shifts the history left by the frame
//! length, appends the newly normalized samples, and later extracts the
//! reconstructed output at a fixed quarter-window offset. The offset
//! arithmetic guarantees every emitted sample position was covered by one
//! overlapping reconstruction.

use crate::bands::{HALF_WINDOW, OUTPUT_OFFSET, WINDOW_SIZE};

/// Per-channel window state.
///
/// `window` is both the transform input and, after the inverse transform,
/// its output. `history` snapshots the pre-transform window so the next
/// call can re-seed the leading half.
pub(crate) struct ChannelWindow {
    window: Vec<f32>,
    history: Vec<f32>,
}

impl ChannelWindow {
    pub fn new() -> Self {
        Self {
            window: vec![0.0; WINDOW_SIZE],
            history: vec![0.0; WINDOW_SIZE],
        }
    }

    /// Load one channel of an interleaved frame into the window.
    ///
    /// Caller guarantees `samples <= HALF_WINDOW` and
    /// `pcm.len() >= samples * stride`. Window slots past the new samples
    /// deliberately keep the previous call's contents; with full
    /// half-window frames they are always overwritten.
    pub fn load_frame(&mut self, pcm: &[i16], channel: usize, stride: usize, samples: usize) {
        self.window[..HALF_WINDOW]
            .copy_from_slice(&self.history[samples..samples + HALF_WINDOW]);

        for j in 0..samples {
            self.window[HALF_WINDOW + j] = pcm[j * stride + channel] as f32 / 32768.0;
        }

        // Snapshot taken before the transform overwrites the window.
        self.history.copy_from_slice(&self.window);
    }

    /// Write the reconstructed output back as 16-bit PCM, in place.
    ///
    /// The rescale divides by the frame length rather than the window size;
    /// together with the unnormalized transform pair this is the sole
    /// normalization step in the chain, preserved exactly from the shipped
    /// tuning. The i16 cast saturates on overflow.
    pub fn store_frame(
        &self,
        pcm: &mut [i16],
        channel: usize,
        stride: usize,
        samples: usize,
        master_gain: f32,
    ) {
        let factor = master_gain * 32768.0 / samples as f32;
        for j in 0..samples {
            pcm[j * stride + channel] = (self.window[OUTPUT_OFFSET + j] * factor) as i16;
        }
    }

    pub fn window_mut(&mut self) -> &mut [f32] {
        &mut self.window
    }

    #[cfg(test)]
    pub fn window(&self) -> &[f32] {
        &self.window
    }
}
