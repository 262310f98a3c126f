//! Control protocol grammar
//!
//! One newline-terminated ASCII line maps to one command. Parsing is a
//! closed grammar, independent of the transport, so it is testable without
//! any I/O. Anything that does not parse is silently dropped by the control
//! loop - malformed payloads never surface an error to the sender.

/// Commands accepted on the control channel
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `bandcount` - reply with the decimal band count
    GetBandCount,

    /// `master_gain=<f32>` - set the output gain, no reply
    SetMasterGain(f32),

    /// `lpf_gain=<f32>` - set the FIR filter gain, no reply
    SetLpfGain(f32),

    /// `band[<u32>]=<f32>` - set one band gain, persist on acceptance, no reply
    SetBand { index: u32, value: f32 },

    /// `bands` (prefix) - reply with the full gain table
    GetBands,

    /// `temporal` (prefix) - reply with the latest spectral snapshot
    GetTemporal,
}

impl Command {
    /// Parse one command line. Match order mirrors the original scan:
    /// `bandcount` before the `band[`/`bands` prefixes.
    pub fn parse(line: &str) -> Option<Command> {
        let line = line.trim_end();

        if line.starts_with("bandcount") {
            return Some(Command::GetBandCount);
        }
        if let Some(rest) = line.strip_prefix("master_gain=") {
            return rest.trim().parse().ok().map(Command::SetMasterGain);
        }
        if let Some(rest) = line.strip_prefix("lpf_gain=") {
            return rest.trim().parse().ok().map(Command::SetLpfGain);
        }
        if let Some(rest) = line.strip_prefix("band[") {
            let (index, value) = rest.split_once("]=")?;
            return Some(Command::SetBand {
                index: index.trim().parse().ok()?,
                value: value.trim().parse().ok()?,
            });
        }
        if line.starts_with("bands") {
            return Some(Command::GetBands);
        }
        if line.starts_with("temporal") {
            return Some(Command::GetTemporal);
        }
        None
    }
}
