//! Equalizer engine: lifecycle, the processing entry point, and fallback
//!
//! The engine starts `Uninitialized` and moves to `Ready` exactly once, on
//! the first processing call that manages to spawn the control task. A
//! failed spawn is permanent: the engine never retries and serves every
//! subsequent call through the gain-only fallback.
//!
//! # Real-time Safety
//!
//! Once `Ready`, a processing call takes no locks beyond two short
//! `parking_lot` read sections (configuration snapshot, temporal publish)
//! and performs no allocation in the steady state: the FFT scratch and the
//! snapshot buffer are reused across calls.

use std::sync::Arc;

use tracing::{debug, error, info};

use heron_dsp::{SpectralEq, MAX_FRAME};

use crate::config::{EqConfig, SharedState, DEFAULT_BAND_COUNT};
use crate::control::{ControlChannel, ControlTransport, FifoTransport};
use crate::fir::FirBank;
use crate::persist::EqFile;

/// Expected PCM sample width in bytes
pub const SAMPLE_WIDTH: usize = 2;

/// Expected channel count
pub const CHANNELS: usize = 2;

/// Lifecycle state. `Ready` is terminal; there is no teardown transition,
/// and a failed initialization never re-arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Ready,
}

/// Construction options for [`Equalizer`].
///
/// `transport: None` builds an engine whose initialization can never
/// succeed, pinning it to the fallback path.
pub struct EqOptions {
    pub transport: Option<Box<dyn ControlTransport>>,
    pub store: EqFile,
    pub band_count: usize,
}

impl Default for EqOptions {
    fn default() -> Self {
        Self {
            transport: Some(Box::new(FifoTransport::default())),
            store: EqFile::default(),
            band_count: DEFAULT_BAND_COUNT,
        }
    }
}

/// The spectral equalizer engine
pub struct Equalizer {
    state: EngineState,
    init_attempted: bool,
    shared: Arc<SharedState>,
    dsp: SpectralEq,
    snapshot_buf: Vec<f32>,
    fir: Option<Box<dyn FirBank>>,
    transport: Option<Box<dyn ControlTransport>>,
    control: Option<ControlChannel>,
    store: EqFile,
}

impl Equalizer {
    pub fn new(options: EqOptions) -> Self {
        Self {
            state: EngineState::Uninitialized,
            init_attempted: false,
            shared: Arc::new(SharedState::new(EqConfig::new(options.band_count))),
            dsp: SpectralEq::new(),
            snapshot_buf: Vec::new(),
            fir: None,
            transport: options.transport,
            control: None,
            store: options.store,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Shared configuration authority, for the control side and tests.
    pub fn shared_state(&self) -> &Arc<SharedState> {
        &self.shared
    }

    /// Install the platform FIR filter pair used by [`Self::highpass`] and
    /// [`Self::lowpass`].
    pub fn set_fir_bank(&mut self, bank: Box<dyn FirBank>) {
        self.fir = Some(bank);
    }

    /// Process one interleaved stereo frame in place.
    ///
    /// The spectral path runs only when the engine is `Ready` and the frame
    /// matches the supported format: 16-bit samples, two channels, at most
    /// [`MAX_FRAME`] frames, buffer long enough to hold them. Anything else
    /// takes the gain-only fallback, as does a DSP failure mid-call.
    pub fn process(
        &mut self,
        pcm: &mut [i16],
        samples_count: usize,
        sample_width_bytes: usize,
        channel_count: usize,
    ) {
        self.try_init();
        let config = self.shared.snapshot();

        let supported = self.state == EngineState::Ready
            && sample_width_bytes == SAMPLE_WIDTH
            && channel_count == CHANNELS
            && samples_count <= MAX_FRAME
            && pcm.len() >= samples_count * CHANNELS;

        if !supported {
            fallback(pcm, samples_count, channel_count, config.master_gain);
            return;
        }

        match self.dsp.process_frame(
            pcm,
            samples_count,
            &config.bands,
            config.master_gain,
            &mut self.snapshot_buf,
        ) {
            Ok(()) => self.shared.store_temporal(&self.snapshot_buf),
            Err(e) => {
                error!("spectral processing failed: {e}; falling back");
                fallback(pcm, samples_count, channel_count, config.master_gain);
            }
        }
    }

    /// Highpass entry point. Delegates to the installed FIR bank with the
    /// live filter gain; without a bank the input passes through unchanged.
    pub fn highpass(&self, output: &mut [i16], input: &[i16]) {
        let gain = self.shared.snapshot().lpf_gain;
        match &self.fir {
            Some(bank) => bank.highpass(output, input, gain),
            None => passthrough(output, input),
        }
    }

    /// Lowpass entry point; same contract as [`Self::highpass`].
    pub fn lowpass(&self, output: &mut [i16], input: &[i16]) {
        let gain = self.shared.snapshot().lpf_gain;
        match &self.fir {
            Some(bank) => bank.lowpass(output, input, gain),
            None => passthrough(output, input),
        }
    }

    /// Cancel the control task. The engine itself stays usable; with the
    /// task gone the configuration is simply frozen.
    pub fn shutdown(&mut self) {
        if let Some(control) = self.control.take() {
            control.shutdown();
            control.join();
        }
    }

    /// One-shot initialization: spawn the control task on the first
    /// processing call. Both outcomes are final.
    fn try_init(&mut self) {
        if self.init_attempted {
            return;
        }
        self.init_attempted = true;

        let Some(transport) = self.transport.take() else {
            debug!("no control transport configured; staying in fallback");
            return;
        };

        match ControlChannel::spawn(transport, Arc::clone(&self.shared), self.store.clone()) {
            Ok(channel) => {
                self.control = Some(channel);
                self.state = EngineState::Ready;
                info!("equalizer engine ready");
            }
            Err(e) => {
                error!("cannot spawn control task: {e}; engine stays in fallback");
            }
        }
    }
}

impl Default for Equalizer {
    fn default() -> Self {
        Self::new(EqOptions::default())
    }
}

impl Drop for Equalizer {
    fn drop(&mut self) {
        if let Some(control) = self.control.take() {
            control.shutdown();
        }
    }
}

/// Gain-only fallback: scale every sample of the frame by the master gain
/// with saturation.
fn fallback(pcm: &mut [i16], samples_count: usize, channel_count: usize, master_gain: f32) {
    let len = samples_count.saturating_mul(channel_count).min(pcm.len());
    for sample in &mut pcm[..len] {
        *sample = (*sample as f32 * master_gain) as i16;
    }
}

fn passthrough(output: &mut [i16], input: &[i16]) {
    let len = input.len().min(output.len());
    output[..len].copy_from_slice(&input[..len]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::testing::MemoryTransport;

    fn temp_store() -> (tempfile::TempDir, EqFile) {
        let dir = tempfile::tempdir().unwrap();
        let store = EqFile::new(dir.path().join("eq.dat"));
        (dir, store)
    }

    /// Engine with an in-memory control transport serving no commands.
    fn ready_engine() -> (tempfile::TempDir, Equalizer) {
        let (dir, store) = temp_store();
        let eq = Equalizer::new(EqOptions {
            transport: Some(Box::new(MemoryTransport::new(""))),
            store,
            band_count: DEFAULT_BAND_COUNT,
        });
        (dir, eq)
    }

    /// Engine pinned to fallback.
    fn fallback_engine() -> (tempfile::TempDir, Equalizer) {
        let (dir, store) = temp_store();
        let eq = Equalizer::new(EqOptions {
            transport: None,
            store,
            band_count: DEFAULT_BAND_COUNT,
        });
        (dir, eq)
    }

    #[test]
    fn test_first_process_call_initializes() {
        let (_dir, mut eq) = ready_engine();
        assert_eq!(eq.state(), EngineState::Uninitialized);

        let mut pcm = vec![0_i16; 2048];
        eq.process(&mut pcm, 1024, 2, 2);
        assert_eq!(eq.state(), EngineState::Ready);
    }

    #[test]
    fn test_silence_stays_silent_through_spectral_path() {
        let (_dir, mut eq) = ready_engine();
        let mut pcm = vec![0_i16; 2048];
        for _ in 0..3 {
            eq.process(&mut pcm, 1024, 2, 2);
            assert!(pcm.iter().all(|&s| s == 0));
        }
    }

    #[test]
    fn test_failed_init_is_permanent_fallback() {
        let (_dir, mut eq) = fallback_engine();

        let mut pcm = vec![1000_i16; 2048];
        for _ in 0..3 {
            eq.process(&mut pcm, 1024, 2, 2);
            assert_eq!(eq.state(), EngineState::Uninitialized);
        }
        // Unity master gain: fallback leaves samples untouched
        assert!(pcm.iter().all(|&s| s == 1000));
    }

    #[test]
    fn test_fallback_applies_master_gain() {
        let (_dir, mut eq) = fallback_engine();
        eq.shared_state().update(|c| c.master_gain = 0.5);

        let mut pcm = vec![1000_i16; 64];
        eq.process(&mut pcm, 32, 2, 2);
        assert!(pcm.iter().all(|&s| s == 500));
    }

    #[test]
    fn test_fallback_saturates() {
        let (_dir, mut eq) = fallback_engine();
        eq.shared_state().update(|c| c.master_gain = 100.0);

        let mut pcm = vec![8192_i16, -8192];
        eq.process(&mut pcm, 1, 2, 2);
        assert_eq!(pcm, vec![i16::MAX, i16::MIN]);
    }

    #[test]
    fn test_unsupported_format_takes_fallback() {
        let (_dir, mut eq) = ready_engine();
        eq.shared_state().update(|c| c.master_gain = 0.5);

        // Wrong sample width, wrong channel count, oversized frame, short
        // buffer: each must scale instead of entering the spectral path.
        let mut pcm = vec![100_i16; 64];
        eq.process(&mut pcm, 32, 4, 2);
        assert!(pcm.iter().all(|&s| s == 50));

        let mut pcm = vec![100_i16; 64];
        eq.process(&mut pcm, 32, 2, 1);
        assert!(pcm[..32].iter().all(|&s| s == 50));

        let mut pcm = vec![100_i16; 64];
        eq.process(&mut pcm, MAX_FRAME + 1, 2, 2);
        assert!(pcm.iter().all(|&s| s == 50));

        let mut pcm = vec![100_i16; 10];
        eq.process(&mut pcm, 32, 2, 2);
        assert!(pcm.iter().all(|&s| s == 50));
    }

    #[test]
    fn test_temporal_snapshot_published() {
        let (_dir, mut eq) = ready_engine();
        let mut pcm = vec![500_i16; 512];
        eq.process(&mut pcm, 256, 2, 2);

        // Interleaved re/im pairs for the first samples_count bins
        assert_eq!(eq.shared_state().temporal().len(), 256 * 2);
    }

    struct ScalingBank;

    impl FirBank for ScalingBank {
        fn highpass(&self, output: &mut [i16], input: &[i16], gain: f32) {
            for (o, i) in output.iter_mut().zip(input) {
                *o = (*i as f32 * gain) as i16;
            }
        }

        fn lowpass(&self, output: &mut [i16], input: &[i16], gain: f32) {
            for (o, i) in output.iter_mut().zip(input) {
                *o = (*i as f32 * gain * 2.0) as i16;
            }
        }
    }

    #[test]
    fn test_fir_entry_points_delegate_with_live_gain() {
        let (_dir, mut eq) = fallback_engine();
        eq.set_fir_bank(Box::new(ScalingBank));
        eq.shared_state().update(|c| c.lpf_gain = 0.5);

        let input = vec![100_i16; 8];
        let mut output = vec![0_i16; 8];

        eq.highpass(&mut output, &input);
        assert!(output.iter().all(|&s| s == 50));

        eq.lowpass(&mut output, &input);
        assert!(output.iter().all(|&s| s == 100));
    }

    #[test]
    fn test_fir_entry_points_pass_through_without_bank() {
        let (_dir, eq) = fallback_engine();
        let input = vec![7_i16, -7, 21, -21];
        let mut output = vec![0_i16; 4];

        eq.highpass(&mut output, &input);
        assert_eq!(output, input);

        let mut output = vec![0_i16; 4];
        eq.lowpass(&mut output, &input);
        assert_eq!(output, input);
    }

    #[test]
    fn test_shutdown_stops_control_task() {
        let (_dir, mut eq) = ready_engine();
        let mut pcm = vec![0_i16; 2048];
        eq.process(&mut pcm, 1024, 2, 2);
        assert_eq!(eq.state(), EngineState::Ready);

        eq.shutdown();
        // Processing keeps working with the frozen configuration.
        eq.process(&mut pcm, 1024, 2, 2);
        assert!(pcm.iter().all(|&s| s == 0));
    }
}
