//! Equalizer configuration and the shared-state authority
//!
//! `EqConfig` is the user-facing state: master gain, FIR gain, and the raw
//! band-gain table. `SharedState` is the single authority over it, shared
//! between the synchronous processing path and the background control task.
//!
//! # Concurrency
//!
//! Readers take an `Arc` snapshot once per processing call; writers clone,
//! modify, and swap the `Arc` under a short write lock. The processing path
//! therefore always sees a complete, consistent band table - never a
//! half-applied edit.

use std::sync::Arc;

use parking_lot::RwLock;

use heron_dsp::MAX_BANDS;

/// Band count used when no persisted table exists
pub const DEFAULT_BAND_COUNT: usize = 1024;

/// Live equalizer configuration
///
/// Band values are stored raw; the nominal [0, 2] range is clamped at use
/// time by the DSP layer, not at write time.
#[derive(Debug, Clone)]
pub struct EqConfig {
    /// Output gain applied in the final PCM rescale (and in fallback)
    pub master_gain: f32,

    /// Gain handed to the external FIR filter entry points
    pub lpf_gain: f32,

    /// Raw per-band gains; `bands.len()` is the configured band count
    pub bands: Vec<f32>,
}

impl EqConfig {
    /// Unit-gain configuration with `band_count` bands (capped at MAX_BANDS)
    pub fn new(band_count: usize) -> Self {
        Self {
            master_gain: 1.0,
            lpf_gain: 1.0,
            bands: vec![1.0; band_count.min(MAX_BANDS)],
        }
    }

    pub fn band_count(&self) -> u32 {
        self.bands.len() as u32
    }

    /// Store a band edit if it passes the acceptance rules: index in range
    /// and a non-negative value. Returns whether the edit was applied.
    pub fn set_band(&mut self, index: u32, value: f32) -> bool {
        let i = index as usize;
        // `!(value >= 0.0)` also rejects NaN
        if i >= self.bands.len() || !(value >= 0.0) {
            return false;
        }
        self.bands[i] = value;
        true
    }
}

impl Default for EqConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BAND_COUNT)
    }
}

/// Shared state between the processing path and the control task.
///
/// Owns the configuration snapshot and the diagnostic temporal snapshot
/// (channel 0's post-gain spectral bins, overwritten every processing call).
pub struct SharedState {
    config: RwLock<Arc<EqConfig>>,
    temporal: RwLock<Vec<f32>>,
}

impl SharedState {
    pub fn new(config: EqConfig) -> Self {
        Self {
            config: RwLock::new(Arc::new(config)),
            temporal: RwLock::new(Vec::new()),
        }
    }

    /// Consistent, immutable view of the configuration. Cheap: one Arc
    /// clone under a read lock.
    pub fn snapshot(&self) -> Arc<EqConfig> {
        self.config.read().clone()
    }

    /// Clone-modify-swap update. Readers keep their old snapshot until they
    /// ask for a new one; nobody observes the intermediate state.
    pub fn update<F: FnOnce(&mut EqConfig)>(&self, mutate: F) {
        let mut guard = self.config.write();
        let mut next = (**guard).clone();
        mutate(&mut next);
        *guard = Arc::new(next);
    }

    /// Replace the whole configuration (persistence restore).
    pub fn replace(&self, config: EqConfig) {
        *self.config.write() = Arc::new(config);
    }

    /// Overwrite the temporal snapshot with this call's bins.
    pub fn store_temporal(&self, bins: &[f32]) {
        let mut t = self.temporal.write();
        t.clear();
        t.extend_from_slice(bins);
    }

    /// Copy of the most recent temporal snapshot (interleaved re/im).
    pub fn temporal(&self) -> Vec<f32> {
        self.temporal.read().clone()
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new(EqConfig::default())
    }
}
