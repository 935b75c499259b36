//! # Printer Dispatcher
//!
//! Delivers an encoded job to whatever the `printer_backend` setting names.
//!
//! ## Dispatch Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  dispatch("cups:EPSON", bytes)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Backend::parse ─────────────────────────────────────────────┐          │
//! │       │                                                      │          │
//! │       ├── Test        → TestSink (captured, hex logged)      │          │
//! │       ├── Device      → open O_WRONLY, write                 │          │
//! │       ├── CupsQueue   → lp -d <queue> -o raw  ┐              │          │
//! │       ├── CupsDefault → lp -o raw             ┴─ timeout ─►  │ Printer- │
//! │       ├── Usb         → UnsupportedBackend         killed    │ Timeout  │
//! │       ├── WinSpool    → UnsupportedBackend                   │          │
//! │       └── Unknown     → UnknownBackend                       │          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything is async: a slow spooler never blocks the caller's runtime
//! thread, and a hung one is killed when the timeout fires.

use std::collections::VecDeque;
use std::path::Path;
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::error::{PrintError, PrintResult};

// =============================================================================
// Configuration
// =============================================================================

/// How spooled backends are invoked.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use stand_print::PrinterConfig;
///
/// let config = PrinterConfig::default().spool_timeout(Duration::from_secs(10));
/// assert_eq!(config.spool_program, "lp");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterConfig {
    /// Spooler executable. Default: `lp`
    pub spool_program: String,

    /// Arguments placed before the queue arguments.
    /// Default: none
    pub spool_args: Vec<String>,

    /// Upper bound for one spooler run, including writing the job.
    /// Default: 30 seconds
    pub spool_timeout: Duration,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        PrinterConfig {
            spool_program: "lp".to_string(),
            spool_args: Vec::new(),
            spool_timeout: Duration::from_secs(30),
        }
    }
}

impl PrinterConfig {
    /// Sets the spooler executable and its leading arguments.
    pub fn spool_program<I, S>(mut self, program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spool_program = program.into();
        self.spool_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the spooler timeout.
    pub fn spool_timeout(mut self, timeout: Duration) -> Self {
        self.spool_timeout = timeout;
        self
    }
}

// =============================================================================
// Test Sink
// =============================================================================

/// Jobs kept by a [`TestSink`]; older ones are dropped.
pub const TEST_SINK_CAPACITY: usize = 32;

/// Collects jobs sent to the `test` backend.
///
/// Clones share the same buffer, so a test can keep a handle and inspect
/// what the dispatcher received. Only the last [`TEST_SINK_CAPACITY`] jobs
/// are kept.
#[derive(Debug, Clone, Default)]
pub struct TestSink {
    jobs: Arc<Mutex<VecDeque<Vec<u8>>>>,
}

impl TestSink {
    fn record(&self, data: &[u8]) {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        if jobs.len() == TEST_SINK_CAPACITY {
            jobs.pop_front();
        }
        jobs.push_back(data.to_vec());
    }

    /// Captured jobs, oldest first.
    pub fn jobs(&self) -> Vec<Vec<u8>> {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// The most recent job.
    pub fn last(&self) -> Option<Vec<u8>> {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .back()
            .cloned()
    }

    pub fn clear(&self) {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// `1B 40 1B 74 10 ...`
pub fn hex_dump(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Sends print jobs to the configured backend.
#[derive(Debug, Clone, Default)]
pub struct PrinterDispatcher {
    config: PrinterConfig,
    sink: TestSink,
}

impl PrinterDispatcher {
    pub fn new(config: PrinterConfig) -> Self {
        PrinterDispatcher {
            config,
            sink: TestSink::default(),
        }
    }

    pub fn config(&self) -> &PrinterConfig {
        &self.config
    }

    /// Handle to the jobs captured by the `test` backend.
    pub fn test_sink(&self) -> &TestSink {
        &self.sink
    }

    /// Parses `backend_spec` and delivers `data` to it.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let bytes = escpos::encode(&lines, true);
    /// dispatcher.dispatch(&snapshot.printer_backend, &bytes).await?;
    /// ```
    pub async fn dispatch(&self, backend_spec: &str, data: &[u8]) -> PrintResult<()> {
        let backend = Backend::parse(backend_spec);
        self.dispatch_to(&backend, data).await
    }

    /// Delivers `data` to an already parsed backend.
    pub async fn dispatch_to(&self, backend: &Backend, data: &[u8]) -> PrintResult<()> {
        debug!(backend = %backend, bytes = data.len(), "Dispatching print job");

        match backend {
            Backend::Test => {
                self.sink.record(data);
                info!(bytes = data.len(), hex = %hex_dump(data), "[TEST PRINT]");
                Ok(())
            }
            Backend::Device(path) => write_device(path, data).await,
            Backend::CupsQueue(queue) => self.spool(backend, Some(queue), data).await,
            Backend::CupsDefault => self.spool(backend, None, data).await,
            Backend::Usb(_) => Err(PrintError::UnsupportedBackend {
                backend: backend.to_string(),
                hint: "direct USB is not available, use cups:<queue> or a /dev/usb/lp* device"
                    .to_string(),
            }),
            Backend::WinSpool(_) => Err(PrintError::UnsupportedBackend {
                backend: backend.to_string(),
                hint: "the Windows spooler is not available in this build".to_string(),
            }),
            Backend::Unknown(raw) => Err(PrintError::UnknownBackend(raw.clone())),
        }
    }

    async fn spool(&self, backend: &Backend, queue: Option<&str>, data: &[u8]) -> PrintResult<()> {
        let queue_name = queue.unwrap_or("default").to_string();
        let program = &self.config.spool_program;

        let mut cmd = Command::new(program);
        cmd.args(&self.config.spool_args);
        if let Some(queue) = queue {
            cmd.arg("-d").arg(queue);
        }
        cmd.arg("-o")
            .arg("raw")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let spool_err = |reason: String| PrintError::Spool {
            queue: queue_name.clone(),
            reason,
        };

        let run = async {
            let mut child = cmd
                .spawn()
                .map_err(|e| spool_err(format!("failed to start {program}: {e}")))?;

            // Dropping stdin at the end of the arm closes the pipe (EOF)
            let sent = match child.stdin.take() {
                Some(mut stdin) => stdin.write_all(data).await,
                None => Ok(()),
            };

            // Reap the spooler even when the write failed: a spooler that
            // quits early (unknown queue) says why on stderr.
            let output = child
                .wait_with_output()
                .await
                .map_err(|e| spool_err(format!("failed to wait for {program}: {e}")))?;
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();

            if let Err(e) = sent {
                return Err(spool_err(if stderr.is_empty() {
                    format!("failed to send job: {e}")
                } else {
                    format!("failed to send job: {e}: {stderr}")
                }));
            }

            if !output.status.success() {
                return Err(spool_err(format!(
                    "{program} exited with {}: {stderr}",
                    output.status
                )));
            }
            Ok(())
        };

        match tokio::time::timeout(self.config.spool_timeout, run).await {
            Ok(result) => {
                if result.is_ok() {
                    info!(backend = %backend, bytes = data.len(), "Print job spooled");
                }
                result
            }
            Err(_) => {
                warn!(
                    backend = %backend,
                    timeout_ms = self.config.spool_timeout.as_millis() as u64,
                    "Print spooler timed out, killed"
                );
                Err(PrintError::PrinterTimeout {
                    backend: backend.to_string(),
                    timeout: self.config.spool_timeout,
                })
            }
        }
    }
}

async fn write_device(path: &Path, data: &[u8]) -> PrintResult<()> {
    let mut device = tokio::fs::OpenOptions::new()
        .write(true)
        .open(path)
        .await
        .map_err(|source| PrintError::DeviceOpen {
            path: path.to_path_buf(),
            source,
        })?;

    let write_err = |source| PrintError::DeviceWrite {
        path: path.to_path_buf(),
        source,
    };
    device.write_all(data).await.map_err(write_err)?;
    device.flush().await.map_err(write_err)?;

    info!(device = %path.display(), bytes = data.len(), "Print job written");
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escpos::encode;
    use tempfile::{NamedTempFile, TempDir};

    fn job() -> Vec<u8> {
        encode(&["Testdruck €"], true)
    }

    /// `sh -c <script> lp -d <queue> -o raw`: the queue arguments land in "$@".
    fn shell(script: &str) -> PrinterConfig {
        PrinterConfig::default().spool_program("sh", ["-c", script, "lp"])
    }

    #[tokio::test]
    async fn test_backend_captures_job() {
        let dispatcher = PrinterDispatcher::default();
        let sink = dispatcher.test_sink().clone();

        dispatcher.dispatch("test", &job()).await.unwrap();
        dispatcher.dispatch("", b"x").await.unwrap();

        assert_eq!(sink.jobs(), vec![job(), b"x".to_vec()]);
        assert_eq!(sink.last(), Some(b"x".to_vec()));
        sink.clear();
        assert!(dispatcher.test_sink().jobs().is_empty());
    }

    #[tokio::test]
    async fn test_sink_keeps_latest_jobs() {
        let dispatcher = PrinterDispatcher::default();
        for i in 0..TEST_SINK_CAPACITY + 8 {
            dispatcher.dispatch("test", &[i as u8]).await.unwrap();
        }

        let jobs = dispatcher.test_sink().jobs();
        assert_eq!(jobs.len(), TEST_SINK_CAPACITY);
        assert_eq!(jobs[0], vec![8u8]);
        assert_eq!(
            dispatcher.test_sink().last(),
            Some(vec![(TEST_SINK_CAPACITY + 7) as u8])
        );
    }

    #[tokio::test]
    async fn test_device_write() {
        let device = NamedTempFile::new().unwrap();
        let spec = device.path().display().to_string();

        // Temp files live outside /dev, so dispatch to the parsed form directly
        let dispatcher = PrinterDispatcher::default();
        dispatcher
            .dispatch_to(&Backend::Device(device.path().to_path_buf()), &job())
            .await
            .unwrap();

        assert_eq!(std::fs::read(&spec).unwrap(), job());
    }

    #[tokio::test]
    async fn test_missing_device() {
        let err = PrinterDispatcher::default()
            .dispatch("/dev/stand-pos-no-such-printer", &job())
            .await
            .unwrap_err();
        assert!(matches!(err, PrintError::DeviceOpen { .. }));
    }

    #[tokio::test]
    async fn test_cups_queue_gets_job_on_stdin() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("job.bin");
        let args = dir.path().join("args.txt");
        let script = format!(
            "printf '%s\\n' \"$@\" > '{}'; cat > '{}'",
            args.display(),
            out.display()
        );

        let dispatcher = PrinterDispatcher::new(shell(&script));
        dispatcher.dispatch("cups:EPSON_TM", &job()).await.unwrap();

        assert_eq!(std::fs::read(&out).unwrap(), job());
        assert_eq!(std::fs::read_to_string(&args).unwrap(), "-d\nEPSON_TM\n-o\nraw\n");
    }

    #[tokio::test]
    async fn test_auto_uses_default_queue() {
        let dir = TempDir::new().unwrap();
        let args = dir.path().join("args.txt");
        let script = format!("printf '%s\\n' \"$@\" > '{}'; cat > /dev/null", args.display());

        PrinterDispatcher::new(shell(&script))
            .dispatch("auto", &job())
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&args).unwrap(), "-o\nraw\n");
    }

    #[tokio::test]
    async fn test_spooler_failure() {
        let dispatcher = PrinterDispatcher::new(shell("cat > /dev/null; echo 'no such queue' >&2; exit 3"));
        match dispatcher.dispatch("cups:GHOST", &job()).await {
            Err(PrintError::Spool { queue, reason }) => {
                assert_eq!(queue, "GHOST");
                assert!(reason.contains("no such queue"), "{reason}");
            }
            other => panic!("expected Spool, got {other:?}"),
        }

        let missing = PrinterConfig::default().spool_program("stand-pos-no-such-spooler", Vec::<String>::new());
        assert!(matches!(
            PrinterDispatcher::new(missing).dispatch("auto", &job()).await,
            Err(PrintError::Spool { .. })
        ));
    }

    #[tokio::test]
    async fn test_spooler_quitting_early_keeps_stderr() {
        // Exits without reading, so a large job hits a closed pipe
        let dispatcher = PrinterDispatcher::new(shell("echo 'unknown queue GHOST' >&2; exit 1"));
        let big = vec![b'x'; 1 << 20];

        match dispatcher.dispatch("cups:GHOST", &big).await {
            Err(PrintError::Spool { queue, reason }) => {
                assert_eq!(queue, "GHOST");
                assert!(reason.contains("unknown queue GHOST"), "{reason}");
            }
            other => panic!("expected Spool, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_hung_spooler_times_out() {
        let config = shell("sleep 5").spool_timeout(Duration::from_millis(200));
        let started = std::time::Instant::now();

        let err = PrinterDispatcher::new(config)
            .dispatch("cups:SLOW", &job())
            .await
            .unwrap_err();

        assert!(matches!(err, PrintError::PrinterTimeout { .. }), "{err:?}");
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_unsupported_and_unknown() {
        let dispatcher = PrinterDispatcher::default();
        for spec in ["usb", "usb:04b8:0202", "winspool:POS-80"] {
            assert!(matches!(
                dispatcher.dispatch(spec, &job()).await,
                Err(PrintError::UnsupportedBackend { .. })
            ));
        }
        match dispatcher.dispatch("lpt1", &job()).await {
            Err(PrintError::UnknownBackend(raw)) => assert_eq!(raw, "lpt1"),
            other => panic!("expected UnknownBackend, got {other:?}"),
        }
        assert!(dispatcher.test_sink().jobs().is_empty());
    }

    #[test]
    fn test_hex_dump() {
        assert_eq!(hex_dump(&[0x1B, 0x40, 0x0A]), "1B 40 0A");
        assert_eq!(hex_dump(&[]), "");
    }
}
