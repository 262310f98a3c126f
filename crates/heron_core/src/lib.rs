//! # Heron Core
//!
//! Engine layer of the Heron spectral equalizer: lifecycle, shared
//! configuration, the control channel, and flat-file persistence around the
//! DSP kernel in `heron_dsp`.
//!
//! - **Engine** ([`Equalizer`]): the in-place PCM processing entry point,
//!   one-shot initialization, and the gain-only fallback
//! - **Configuration** ([`SharedState`], [`EqConfig`]): snapshot/swap state
//!   shared with the control task
//! - **Control** ([`ControlChannel`], [`Command`]): background task serving
//!   the newline-delimited text protocol
//! - **Persistence** ([`EqFile`]): the band-gain table on disk
//! - **FIR seam** ([`FirBank`]): platform-supplied highpass/lowpass filters

pub mod command;
pub mod config;
pub mod control;
pub mod engine;
pub mod error;
pub mod fir;
pub mod persist;

pub use command::Command;
pub use config::{EqConfig, SharedState, DEFAULT_BAND_COUNT};
pub use control::{
    ControlChannel, ControlTransport, FifoTransport, DEFAULT_COMMAND_PATH, DEFAULT_RESPONSE_PATH,
};
pub use engine::{EngineState, EqOptions, Equalizer, CHANNELS, SAMPLE_WIDTH};
pub use error::{EngineError, EngineResult};
pub use fir::FirBank;
pub use persist::{EqFile, DEFAULT_STORE_PATH};

pub use heron_dsp::{self as dsp, SpectralEq, MAX_FRAME, WINDOW_SIZE};
