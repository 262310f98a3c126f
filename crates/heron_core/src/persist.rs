//! Flat-file persistence for the band-gain table
//!
//! Schema: line 1 is the decimal band count, lines 2..N hold one
//! floating-point gain per line. The whole file is rewritten after each
//! accepted band edit. Load failures are non-fatal at the call site; the
//! unit-gain defaults stay in effect.

use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use heron_dsp::MAX_BANDS;

use crate::config::{EqConfig, SharedState};
use crate::error::{EngineError, EngineResult};

/// Conventional location of the persisted table
pub const DEFAULT_STORE_PATH: &str = "/var/lib/heron/eq.dat";

/// Handle to the persisted equalizer table
#[derive(Debug, Clone)]
pub struct EqFile {
    path: PathBuf,
}

impl EqFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted band count and gains.
    ///
    /// The stored count is capped at MAX_BANDS rather than trusted.
    /// A gain line that does not parse keeps that band's 1.0 default;
    /// missing trailing lines do the same.
    pub fn load(&self) -> EngineResult<(u32, Vec<f32>)> {
        let file = fs::File::open(&self.path)?;
        let mut lines = BufReader::new(file).lines();

        let first = lines.next().ok_or_else(|| EngineError::MalformedStore {
            line: 1,
            text: String::new(),
        })??;
        let count: usize = first
            .trim()
            .parse()
            .map_err(|_| EngineError::MalformedStore {
                line: 1,
                text: first.clone(),
            })?;
        let count = count.min(MAX_BANDS);

        let mut gains = vec![1.0_f32; count];
        for (slot, line) in gains.iter_mut().zip(lines) {
            let line = line?;
            if let Ok(value) = line.trim().parse::<f32>() {
                *slot = value;
            }
        }

        Ok((count as u32, gains))
    }

    /// Rewrite the whole file from the given configuration.
    ///
    /// A failed open aborts the save cleanly; nothing is ever written
    /// through an invalid handle.
    pub fn save(&self, config: &EqConfig) -> EngineResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(&self.path)?;

        writeln!(file, "{}", config.band_count())?;
        for gain in &config.bands {
            writeln!(file, "{:.6}", gain)?;
        }
        Ok(())
    }

    /// Overwrite the live band table with the persisted one, keeping the
    /// runtime gains. Missing or unreadable files keep the defaults.
    pub fn restore(&self, state: &SharedState) {
        match self.load() {
            Ok((count, gains)) => {
                state.update(|c| c.bands = gains);
                info!(bands = count, path = %self.path.display(), "equalizer table loaded");
            }
            Err(e) => {
                warn!(path = %self.path.display(), "cannot load equalizer table: {e}; keeping defaults");
            }
        }
    }
}

impl Default for EqFile {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_PATH)
    }
}
