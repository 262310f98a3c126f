//! Control channel: the background task serving the line protocol
//!
//! One task owns both transport endpoints for the process lifetime. It
//! restores the persisted table, gates on the endpoints opening (fixed
//! 1-second retry, one-time), then serves newline-terminated commands until
//! EOF or cancellation. Mutations go through the shared configuration
//! authority; accepted band edits trigger a persistence save. Only queries
//! get a response.

use std::fs::OpenOptions;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::command::Command;
use crate::config::SharedState;
use crate::persist::EqFile;

/// Conventional command endpoint path
pub const DEFAULT_COMMAND_PATH: &str = "/dev/eq_cmd";

/// Conventional response endpoint path
pub const DEFAULT_RESPONSE_PATH: &str = "/dev/eq_ret";

/// Fixed backoff between endpoint-open attempts during startup
const OPEN_RETRY: Duration = Duration::from_secs(1);

/// Byte-stream endpoints carrying the line protocol.
///
/// The engine only depends on this trait; the special-file transport below
/// is one implementation, tests supply in-memory ones.
pub trait ControlTransport: Send + 'static {
    fn open_command(&self) -> io::Result<Box<dyn BufRead + Send>>;
    fn open_response(&self) -> io::Result<Box<dyn Write + Send>>;
}

/// Special-file transport at the conventional control paths.
///
/// Both endpoints are opened read/write so the open does not block waiting
/// for a peer.
pub struct FifoTransport {
    pub command_path: PathBuf,
    pub response_path: PathBuf,
}

impl Default for FifoTransport {
    fn default() -> Self {
        Self {
            command_path: PathBuf::from(DEFAULT_COMMAND_PATH),
            response_path: PathBuf::from(DEFAULT_RESPONSE_PATH),
        }
    }
}

impl ControlTransport for FifoTransport {
    fn open_command(&self) -> io::Result<Box<dyn BufRead + Send>> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.command_path)?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn open_response(&self) -> io::Result<Box<dyn Write + Send>> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.response_path)?;
        Ok(Box::new(file))
    }
}

/// Handle to the running control task.
///
/// Dropping the handle sets the cancellation flag but does not join: the
/// task may be blocked on a transport read and only notices the flag at the
/// next line or at EOF.
pub struct ControlChannel {
    shutdown: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl ControlChannel {
    /// Spawn the control task. Spawn failure is the only error surfaced
    /// here; transport trouble is handled inside the task by the startup
    /// retry gate.
    pub fn spawn(
        transport: Box<dyn ControlTransport>,
        state: Arc<SharedState>,
        store: EqFile,
    ) -> io::Result<ControlChannel> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);

        let task = thread::Builder::new()
            .name("heron-control".into())
            .spawn(move || control_task(transport, state, store, flag))?;

        Ok(ControlChannel {
            shutdown,
            task: Some(task),
        })
    }

    /// Request cancellation. Takes effect at the next command boundary.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Block until the task exits (EOF, read error, or observed
    /// cancellation).
    pub fn join(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.join();
        }
    }
}

impl Drop for ControlChannel {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

fn control_task(
    transport: Box<dyn ControlTransport>,
    state: Arc<SharedState>,
    store: EqFile,
    shutdown: Arc<AtomicBool>,
) {
    info!("control task started");

    // Persisted gains overwrite the unit-gain defaults before any command
    // can observe them.
    store.restore(&state);

    // One-time startup gate: retry until both endpoints open. This is the
    // only blocking-with-backoff logic in the engine; the audio path runs
    // in fallback while it spins.
    let (mut reader, mut writer) = loop {
        if shutdown.load(Ordering::SeqCst) {
            info!("control task cancelled before endpoints opened");
            return;
        }
        match open_endpoints(&*transport) {
            Ok(endpoints) => break endpoints,
            Err(e) => {
                warn!("control endpoints not ready: {e}; retrying");
                thread::sleep(OPEN_RETRY);
            }
        }
    };

    info!("control task serving");
    let mut line = String::new();
    while !shutdown.load(Ordering::SeqCst) {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => {
                debug!("command endpoint closed");
                break;
            }
            Ok(_) => {
                let Some(command) = Command::parse(&line) else {
                    debug!(input = line.trim_end(), "ignored control input");
                    continue;
                };
                if let Err(e) = dispatch(command, &state, &store, writer.as_mut()) {
                    warn!("control response failed: {e}");
                }
            }
            Err(e) => {
                error!("control read failed: {e}");
                break;
            }
        }
    }
    info!("control task exited");
}

fn open_endpoints(
    transport: &dyn ControlTransport,
) -> io::Result<(Box<dyn BufRead + Send>, Box<dyn Write + Send>)> {
    Ok((transport.open_command()?, transport.open_response()?))
}

fn dispatch(
    command: Command,
    state: &SharedState,
    store: &EqFile,
    out: &mut dyn Write,
) -> io::Result<()> {
    use std::fmt::Write as _;

    match command {
        Command::GetBandCount => {
            writeln!(out, "{}", state.snapshot().band_count())?;
            out.flush()?;
        }
        Command::SetMasterGain(value) => state.update(|c| c.master_gain = value),
        Command::SetLpfGain(value) => state.update(|c| c.lpf_gain = value),
        Command::SetBand { index, value } => {
            let mut accepted = false;
            state.update(|c| accepted = c.set_band(index, value));
            if accepted {
                // A failed save aborts cleanly; the live table keeps the edit.
                if let Err(e) = store.save(&state.snapshot()) {
                    error!("cannot save equalizer table: {e}");
                }
            } else {
                debug!(index, value, "band edit rejected");
            }
        }
        Command::GetBands => {
            let config = state.snapshot();
            let mut reply = format!("bands[{}]=", config.band_count());
            for gain in &config.bands {
                let _ = write!(reply, "{:.6},", gain);
            }
            writeln!(out, "{reply}")?;
            out.flush()?;
        }
        Command::GetTemporal => {
            let bins = state.temporal();
            let mut reply = format!("temporal[{}]=", bins.len() / 2);
            for value in &bins {
                let _ = write!(reply, "{:.6},", value);
            }
            writeln!(out, "{reply}")?;
            out.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory transport for exercising the control task without
    //! special files.

    use super::*;
    use std::io::Cursor;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    /// Transport serving a pre-scripted command stream and collecting
    /// replies. Optionally fails the first `failures` open attempts to
    /// exercise the startup retry gate.
    pub struct MemoryTransport {
        script: Vec<u8>,
        replies: Arc<Mutex<Vec<u8>>>,
        failures: AtomicUsize,
    }

    impl MemoryTransport {
        pub fn new(script: &str) -> Self {
            Self {
                script: script.as_bytes().to_vec(),
                replies: Arc::new(Mutex::new(Vec::new())),
                failures: AtomicUsize::new(0),
            }
        }

        pub fn failing_first(script: &str, failures: usize) -> Self {
            let mut t = Self::new(script);
            t.failures = AtomicUsize::new(failures);
            t
        }

        pub fn replies(&self) -> Arc<Mutex<Vec<u8>>> {
            Arc::clone(&self.replies)
        }
    }

    impl ControlTransport for MemoryTransport {
        fn open_command(&self) -> io::Result<Box<dyn BufRead + Send>> {
            if self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(io::Error::new(io::ErrorKind::NotFound, "not ready"));
            }
            Ok(Box::new(Cursor::new(self.script.clone())))
        }

        fn open_response(&self) -> io::Result<Box<dyn Write + Send>> {
            Ok(Box::new(ReplySink(Arc::clone(&self.replies))))
        }
    }

    struct ReplySink(Arc<Mutex<Vec<u8>>>);

    impl Write for ReplySink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Transport whose endpoints never open; for cancellation tests.
    pub struct NeverReady;

    impl ControlTransport for NeverReady {
        fn open_command(&self) -> io::Result<Box<dyn BufRead + Send>> {
            Err(io::Error::new(io::ErrorKind::NotFound, "never ready"))
        }

        fn open_response(&self) -> io::Result<Box<dyn Write + Send>> {
            Err(io::Error::new(io::ErrorKind::NotFound, "never ready"))
        }
    }
}
