//! Frame-level processing: overlap buffering around the spectral pass
//!
//! `SpectralEq` is the per-stream DSP state. It owns one window per channel
//! and a shared spectral processor, and converts an interleaved 16-bit frame
//! to normalized windows, runs the gain pass, and writes the reconstructed
//! frame back in place.

use crate::bands::HALF_WINDOW;
use crate::error::DspError;
use crate::overlap::ChannelWindow;
use crate::spectral::SpectralProcessor;

/// Largest frame (samples per channel) the window sizing supports.
pub const MAX_FRAME: usize = HALF_WINDOW;

/// Fixed channel layout. Two windows, left and right; any other channel
/// count is a precondition violation handled at the engine boundary.
pub const CHANNELS: usize = 2;

pub struct SpectralEq {
    left: ChannelWindow,
    right: ChannelWindow,
    spectral: SpectralProcessor,
}

impl SpectralEq {
    pub fn new() -> Self {
        Self {
            left: ChannelWindow::new(),
            right: ChannelWindow::new(),
            spectral: SpectralProcessor::new(),
        }
    }

    /// Process one interleaved stereo frame in place.
    ///
    /// `bands` is the raw gain table (clamped at use time); `snapshot`
    /// receives channel 0's post-gain bins, `samples_count` re/im pairs,
    /// overwritten every call.
    ///
    /// # Real-time Safety
    /// No allocations beyond `snapshot` growth on the first call, no
    /// syscalls. The frame-size check makes the fixed-capacity history safe
    /// instead of assuming the caller honors it.
    pub fn process_frame(
        &mut self,
        pcm: &mut [i16],
        samples_count: usize,
        bands: &[f32],
        master_gain: f32,
        snapshot: &mut Vec<f32>,
    ) -> Result<(), DspError> {
        if samples_count > MAX_FRAME {
            return Err(DspError::FrameTooLarge {
                got: samples_count,
                max: MAX_FRAME,
            });
        }
        let need = samples_count * CHANNELS;
        if pcm.len() < need {
            return Err(DspError::BufferTooSmall {
                need,
                got: pcm.len(),
            });
        }

        self.left.load_frame(pcm, 0, CHANNELS, samples_count);
        self.right.load_frame(pcm, 1, CHANNELS, samples_count);

        self.spectral
            .process_channel(self.left.window_mut(), bands, Some((snapshot, samples_count)));
        self.spectral
            .process_channel(self.right.window_mut(), bands, None);

        self.left
            .store_frame(pcm, 0, CHANNELS, samples_count, master_gain);
        self.right
            .store_frame(pcm, 1, CHANNELS, samples_count, master_gain);

        Ok(())
    }
}

impl Default for SpectralEq {
    fn default() -> Self {
        Self::new()
    }
}
