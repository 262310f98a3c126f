//! Engine Error Types

use thiserror::Error;

/// Errors that can occur in the equalizer engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("equalizer file line {line} is not a number: {text:?}")]
    MalformedStore { line: usize, text: String },

    #[error("failed to spawn control task: {0}")]
    ControlSpawn(std::io::Error),

    #[error("DSP error: {0}")]
    Dsp(#[from] heron_dsp::DspError),
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
