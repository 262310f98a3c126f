//! DSP Error Types

use thiserror::Error;

/// Errors that can occur during DSP operations
#[derive(Error, Debug)]
pub enum DspError {
    #[error("frame of {got} samples per channel exceeds the {max}-sample limit")]
    FrameTooLarge { got: usize, max: usize },

    #[error("interleaved buffer holds {got} samples, frame needs {need}")]
    BufferTooSmall { need: usize, got: usize },
}
