// src/monitor.rs
//! Ingestion loop and session coordination

use crate::{
    capture::{Capture, FixStore, RecordSink},
    config::LoggerConfig,
    error::{CaptureError, LoggerError, Result},
    gps::{
        data::CapturedRecord,
        framer::FrameBuffer,
        nmea::{self, SentenceKind},
    },
};
use log::{debug, info, warn};
use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    sync::{mpsc, watch, Mutex, Notify},
    task::JoinHandle,
    time::sleep,
};
use tokio_serial::{DataBits, Parity, SerialPortBuilderExt, SerialStream, StopBits};

/// Any byte source the ingestion loop can read from.
pub type BoxedTransport = Box<dyn AsyncRead + Send + Unpin>;

/// Human-readable transient conditions reported to the foreground.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Attached(String),
    Detached,
    WaitingForTransport,
    ReadError(String),
    ConnectFailed(String),
    SessionLog(String),
    Captured(CapturedRecord),
    CaptureFailed(String),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Attached(name) => write!(f, "Serial connected: {}", name),
            Status::Detached => write!(f, "Serial disconnected"),
            Status::WaitingForTransport => write!(f, "No serial device connected"),
            Status::ReadError(msg) => write!(f, "Reader error: {}", msg),
            Status::ConnectFailed(msg) => write!(f, "Failed to open serial port: {}", msg),
            Status::SessionLog(name) => write!(f, "CSV created: {}", name),
            Status::Captured(_) => write!(f, "Point recorded"),
            Status::CaptureFailed(msg) => write!(f, "{}", msg),
        }
    }
}

/// One-way status channel. Implementations must not block.
pub trait StatusSink: Send + Sync {
    fn notify(&self, status: Status);
}

impl StatusSink for mpsc::UnboundedSender<Status> {
    fn notify(&self, status: Status) {
        // Receiver gone means nobody is listening any more
        let _ = self.send(status);
    }
}

/// Wait intervals and buffer size for the ingestion loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderTiming {
    pub idle_backoff: Duration,
    pub no_data_backoff: Duration,
    pub error_backoff: Duration,
    pub buffer_size: usize,
}

impl Default for ReaderTiming {
    fn default() -> Self {
        Self {
            idle_backoff: Duration::from_millis(500),
            no_data_backoff: Duration::from_millis(50),
            error_backoff: Duration::from_millis(500),
            buffer_size: 4096,
        }
    }
}

/// Holder for the currently bound transport. Attach and detach may happen
/// at any time from outside the ingestion loop.
#[derive(Default)]
pub struct TransportSlot {
    current: Mutex<Option<(String, BoxedTransport)>>,
    release: Notify,
}

impl TransportSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a transport, dropping (and so closing) any previous one.
    pub async fn attach<T>(&self, name: impl Into<String>, transport: T)
    where
        T: AsyncRead + Send + Unpin + 'static,
    {
        // Wake a reader parked on the old transport so the lock frees up
        self.release.notify_one();
        let mut current = self.current.lock().await;
        *current = Some((name.into(), Box::new(transport)));
    }

    /// Unbind and drop the current transport. Returns its name if one was
    /// bound.
    pub async fn detach(&self) -> Option<String> {
        self.release.notify_one();
        let mut current = self.current.lock().await;
        current.take().map(|(name, _)| name)
    }
}

/// Counters updated by the ingestion loop.
#[derive(Debug, Default)]
pub struct IngestStats {
    lines: AtomicU64,
    fixes: AtomicU64,
    ignored: AtomicU64,
    read_errors: AtomicU64,
}

/// Point-in-time copy of [`IngestStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub lines: u64,
    pub fixes: u64,
    pub ignored: u64,
    pub read_errors: u64,
}

impl IngestStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            lines: self.lines.load(Ordering::Relaxed),
            fixes: self.fixes.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            read_errors: self.read_errors.load(Ordering::Relaxed),
        }
    }
}

/// Shared handles the ingestion loop works against.
#[derive(Clone)]
pub struct Reader {
    pub slot: Arc<TransportSlot>,
    pub fixes: FixStore,
    pub stats: Arc<IngestStats>,
    pub status: Arc<dyn StatusSink>,
    pub timing: ReaderTiming,
}

enum ReadOutcome {
    Data(usize),
    Released,
    NoData,
    NoTransport,
    Failed(std::io::Error),
}

impl Reader {
    /// Run until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// Read errors, missing transports and bad sentences are all recovered
    /// here; the loop has no other exit.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut buf = vec![0u8; self.timing.buffer_size.max(1)];
        let mut frames = FrameBuffer::new();
        let mut waiting_reported = false;

        loop {
            if *shutdown.borrow() {
                break;
            }

            let outcome = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                outcome = self.read_once(&mut buf) => outcome,
            };

            if !matches!(outcome, ReadOutcome::NoTransport) {
                waiting_reported = false;
            }

            let backoff = match outcome {
                ReadOutcome::Data(n) => {
                    frames.push(&buf[..n]);
                    self.drain_lines(&mut frames);
                    continue;
                }
                ReadOutcome::Released => continue,
                ReadOutcome::NoTransport => {
                    if !waiting_reported {
                        self.status.notify(Status::WaitingForTransport);
                        waiting_reported = true;
                    }
                    self.timing.idle_backoff
                }
                ReadOutcome::Failed(e) => {
                    self.stats.read_errors.fetch_add(1, Ordering::Relaxed);
                    warn!("Error reading from serial port: {}", e);
                    self.status.notify(Status::ReadError(e.to_string()));
                    self.timing.error_backoff
                }
                ReadOutcome::NoData => self.timing.no_data_backoff,
            };

            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = sleep(backoff) => {}
            }
        }

        debug!("Ingestion loop stopped");
    }

    async fn read_once(&self, buf: &mut [u8]) -> ReadOutcome {
        let mut current = self.slot.current.lock().await;
        let Some((_, transport)) = current.as_mut() else {
            return ReadOutcome::NoTransport;
        };

        tokio::select! {
            biased;
            _ = self.slot.release.notified() => ReadOutcome::Released,
            result = transport.read(buf) => match result {
                Ok(0) => ReadOutcome::NoData,
                Ok(n) => ReadOutcome::Data(n),
                Err(e) => ReadOutcome::Failed(e),
            },
        }
    }

    fn drain_lines(&self, frames: &mut FrameBuffer) {
        while let Some(line) = frames.next_line() {
            if line.is_empty() {
                continue;
            }
            self.stats.lines.fetch_add(1, Ordering::Relaxed);

            match nmea::parse(&line) {
                Some(pos) => {
                    debug!(
                        "Fix: lat={} lon={} alt={}",
                        pos.latitude(),
                        pos.longitude(),
                        pos.altitude_m()
                    );
                    self.stats.fixes.fetch_add(1, Ordering::Relaxed);
                    self.fixes.set_latest(pos);
                }
                None => {
                    if SentenceKind::of(&line) != SentenceKind::Other {
                        debug!("Discarding malformed sentence: {}", line);
                    }
                    self.stats.ignored.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }
}

/// Open a serial GNSS receiver, 8N1.
pub fn open_serial(port: &str, baudrate: u32) -> Result<SerialStream> {
    let stream = tokio_serial::new(port, baudrate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .open_native_async()?;
    Ok(stream)
}

/// One logging session: the ingestion task plus the capture path.
///
/// Dropping the session stops the ingestion task; the transport and the
/// session log are released with it.
pub struct Session {
    slot: Arc<TransportSlot>,
    fixes: FixStore,
    stats: Arc<IngestStats>,
    status: Arc<dyn StatusSink>,
    capture: Capture,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl Session {
    /// Spawn the ingestion loop. Must be called inside a tokio runtime.
    pub fn start(
        timing: ReaderTiming,
        sink: Box<dyn RecordSink>,
        status: Arc<dyn StatusSink>,
    ) -> Self {
        let slot = Arc::new(TransportSlot::new());
        let fixes = FixStore::new();
        let stats = Arc::new(IngestStats::default());
        let (shutdown, shutdown_rx) = watch::channel(false);

        let reader = Reader {
            slot: Arc::clone(&slot),
            fixes: fixes.clone(),
            stats: Arc::clone(&stats),
            status: Arc::clone(&status),
            timing,
        };
        let task = tokio::spawn(reader.run(shutdown_rx));

        Self {
            slot,
            fixes: fixes.clone(),
            stats,
            status,
            capture: Capture::new(fixes, sink),
            shutdown,
            task: Some(task),
        }
    }

    /// Bind a transport to the running loop.
    pub async fn attach<T>(&self, name: impl Into<String>, transport: T)
    where
        T: AsyncRead + Send + Unpin + 'static,
    {
        let name = name.into();
        info!("Attaching transport {}", name);
        self.slot.attach(name.clone(), transport).await;
        self.status.notify(Status::Attached(name));
    }

    /// Open the configured serial port and bind it. Failures are reported
    /// through the status sink as well as returned.
    pub async fn connect_serial(&self, config: &LoggerConfig) -> Result<()> {
        let Some(port) = config.serial_port.clone() else {
            let e = LoggerError::Config("No serial port configured".to_string());
            self.status.notify(Status::ConnectFailed(e.to_string()));
            return Err(e);
        };

        match open_serial(&port, config.baudrate) {
            Ok(stream) => {
                self.attach(port, stream).await;
                Ok(())
            }
            Err(e) => {
                warn!("Failed to open serial port {}: {}", port, e);
                self.status.notify(Status::ConnectFailed(format!("{}: {}", port, e)));
                Err(e)
            }
        }
    }

    pub async fn detach(&self) {
        if let Some(name) = self.slot.detach().await {
            info!("Detached transport {}", name);
            self.status.notify(Status::Detached);
        }
    }

    /// Record the latest fix to the session log and report the outcome.
    pub fn capture(&self) -> std::result::Result<CapturedRecord, CaptureError> {
        let result = self.capture.capture();
        match &result {
            Ok(record) => self.status.notify(Status::Captured(record.clone())),
            Err(e) => self.status.notify(Status::CaptureFailed(e.to_string())),
        }
        result
    }

    pub fn fixes(&self) -> &FixStore {
        &self.fixes
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Stop the ingestion loop and wait for it to finish.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Ingestion task ended abnormally: {}", e);
            }
        }
        self.slot.detach().await;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

/// List available serial ports
pub fn list_serial_ports() -> Result<()> {
    let ports = tokio_serial::available_ports()?;

    if ports.is_empty() {
        println!("No serial ports found.");
    } else {
        println!("Available serial ports:");
        for port in ports {
            println!("  {} - {:?}", port.port_name, port.port_type);
        }
    }

    Ok(())
}
