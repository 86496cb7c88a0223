//! Configuration object owning both logging hierarchies.

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use camino::Utf8Path;
use once_cell::sync::OnceCell;
use tracing_subscriber::layer::SubscriberExt;

use atlassian_config::{Config, LogLevel};

use super::caller::{CallerLog, ProgressSink};
use super::layer::DiagnosticLayer;
use super::redaction::Redactor;
use super::sink::{DiagnosticRecord, Sink, SinkOptions, SinkTarget};
use super::{TELEMETRY_TARGET, TelemetryError};

/// Initial logging settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSettings {
    /// Minimum severity for both channels.
    pub level: LogLevel,
    /// File and writer sinks emit JSON records.
    pub structured: bool,
    /// Mask sensitive substrings.
    pub redact: bool,
    /// Attach a standard error sink.
    pub stderr: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            structured: false,
            redact: true,
            stderr: true,
        }
    }
}

impl LogSettings {
    /// Derives settings from the server configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            level: config.log_level(),
            structured: config.log_format().is_structured(),
            redact: config.redact_logs(),
            stderr: true,
        }
    }
}

/// How [`LoggingRouter::finalize`] relates to the process-wide subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitMode {
    /// Install a global subscriber carrying the diagnostic layer.
    InstallGlobal,
    /// A host composes [`LoggingRouter::layer`] into its own subscriber.
    HostManaged,
}

/// Outcome of [`LoggingRouter::finalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Installation {
    /// The router installed the global subscriber.
    Installed,
    /// The host manages the subscriber; nothing global was touched.
    HostManaged,
    /// A global subscriber already existed and was left in place.
    HostOwned,
}

pub(crate) struct RouterState {
    level: AtomicU8,
    structured: AtomicBool,
    redactor: RwLock<Option<Arc<Redactor>>>,
    sinks: RwLock<Vec<Arc<Sink>>>,
    installation: OnceCell<Installation>,
}

impl RouterState {
    pub(crate) fn level(&self) -> LogLevel {
        LogLevel::from_rank(self.level.load(Ordering::Relaxed))
    }

    fn redactor(&self) -> Option<Arc<Redactor>> {
        self.redactor
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Redacts once, then hands the record to every sink.
    pub(crate) fn emit(&self, mut record: DiagnosticRecord) {
        if let Some(redactor) = self.redactor() {
            let masked = redactor.redact(&record.message).into_owned();
            record.message = masked;
            redactor.redact_attributes(&mut record.attributes);
        }
        let structured = self.structured.load(Ordering::Relaxed);
        let sinks = self
            .sinks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for sink in sinks {
            sink.emit(&record, structured);
        }
    }
}

/// Explicit configuration object for the process-diagnostic and
/// caller-visible logging hierarchies.
///
/// Construction registers intent only. Nothing global changes until
/// [`LoggingRouter::finalize`], so a hosting framework may install its own
/// logging first and compose [`LoggingRouter::layer`] into it. Every
/// configuration operation is idempotent and takes effect immediately for
/// events emitted afterwards.
#[derive(Clone)]
pub struct LoggingRouter {
    state: Arc<RouterState>,
}

impl std::fmt::Debug for LoggingRouter {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("LoggingRouter")
            .field("level", &self.level())
            .field("structured", &self.structured())
            .field("redaction", &self.redaction_active())
            .field("sinks", &self.sink_targets())
            .finish()
    }
}

impl LoggingRouter {
    /// Plans logging without touching global state.
    #[must_use]
    pub fn new(settings: LogSettings) -> Self {
        let sinks = if settings.stderr {
            vec![Arc::new(Sink::stderr())]
        } else {
            Vec::new()
        };
        let router = Self {
            state: Arc::new(RouterState {
                level: AtomicU8::new(settings.level.rank()),
                structured: AtomicBool::new(settings.structured),
                redactor: RwLock::new(None),
                sinks: RwLock::new(sinks),
                installation: OnceCell::new(),
            }),
        };
        router.set_redaction(settings.redact);
        router
    }

    /// Plans logging from configuration, opening the configured log file.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::OpenSink`] when the log file cannot be
    /// opened.
    pub fn from_config(config: &Config) -> Result<Self, TelemetryError> {
        let router = Self::new(LogSettings::from_config(config));
        if let Some(path) = config.log_file() {
            router.add_file_sink(path, SinkOptions::default())?;
        }
        Ok(router)
    }

    /// Layer rendering server events into this router's sinks.
    #[must_use]
    pub fn layer(&self) -> DiagnosticLayer {
        DiagnosticLayer::new(Arc::clone(&self.state))
    }

    /// Completes initialisation.
    ///
    /// The first call decides the outcome; later calls return it unchanged.
    /// [`InitMode::InstallGlobal`] never replaces an existing global
    /// subscriber: it reports [`Installation::HostOwned`] instead, and the
    /// host remains responsible for composing [`LoggingRouter::layer`].
    pub fn finalize(&self, mode: InitMode) -> Installation {
        *self.state.installation.get_or_init(|| match mode {
            InitMode::HostManaged => Installation::HostManaged,
            InitMode::InstallGlobal => {
                let subscriber = tracing_subscriber::registry().with(self.layer());
                match tracing::subscriber::set_global_default(subscriber) {
                    Ok(()) => Installation::Installed,
                    Err(_) => Installation::HostOwned,
                }
            }
        })
    }

    /// Outcome of a previous [`LoggingRouter::finalize`], if any.
    #[must_use]
    pub fn installation(&self) -> Option<Installation> {
        self.state.installation.get().copied()
    }

    /// Adds an append-only file sink with its own level and format. Adding
    /// the same path twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::OpenSink`] when the file cannot be opened.
    pub fn add_file_sink(&self, path: &Utf8Path, options: SinkOptions) -> Result<(), TelemetryError> {
        let target = SinkTarget::File(path.to_owned());
        if self.has_sink(&target) {
            return Ok(());
        }
        let sink = Arc::new(Sink::file(path, options)?);
        self.insert_sink(sink);
        tracing::debug!(target: TELEMETRY_TARGET, path = %path, "file sink added");
        Ok(())
    }

    /// Removes a file sink. Returns `false` when no such sink existed.
    pub fn remove_file_sink(&self, path: &Utf8Path) -> bool {
        self.remove_sink(&SinkTarget::File(path.to_owned()))
    }

    /// Adds a named sink over an arbitrary writer. A name already in use is
    /// left untouched.
    pub fn add_writer_sink(&self, name: &str, writer: Box<dyn Write + Send>) {
        let target = SinkTarget::Writer(name.to_owned());
        if self.has_sink(&target) {
            return;
        }
        self.insert_sink(Arc::new(Sink::with_writer(target, writer)));
    }

    /// Removes a named writer sink.
    pub fn remove_writer_sink(&self, name: &str) -> bool {
        self.remove_sink(&SinkTarget::Writer(name.to_owned()))
    }

    /// Targets of the attached sinks, in attachment order.
    #[must_use]
    pub fn sink_targets(&self) -> Vec<SinkTarget> {
        self.state
            .sinks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|sink| sink.target().clone())
            .collect()
    }

    /// Sets the minimum severity for both channels.
    pub fn set_level(&self, level: LogLevel) {
        self.state.level.store(level.rank(), Ordering::Relaxed);
    }

    /// Current minimum severity.
    #[must_use]
    pub fn level(&self) -> LogLevel {
        self.state.level()
    }

    /// Switches structured file output on or off.
    pub fn set_structured(&self, structured: bool) {
        self.state.structured.store(structured, Ordering::Relaxed);
    }

    /// Whether file sinks emit JSON records.
    #[must_use]
    pub fn structured(&self) -> bool {
        self.state.structured.load(Ordering::Relaxed)
    }

    /// Enables or disables redaction. Returns whether the stage is active
    /// afterwards; enabling can fail quietly when the stage is unavailable.
    pub fn set_redaction(&self, enabled: bool) -> bool {
        if enabled && self.redaction_active() {
            return true;
        }
        // Loading may log, and logging reads the slot, so compile first.
        let loaded = if enabled {
            Redactor::load().map(Arc::new)
        } else {
            None
        };
        let mut slot = self
            .state
            .redactor
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if !enabled || slot.is_none() {
            *slot = loaded;
        }
        slot.is_some()
    }

    /// Whether events are currently redacted.
    #[must_use]
    pub fn redaction_active(&self) -> bool {
        self.state
            .redactor
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Opens the caller-visible channel for one invocation.
    ///
    /// `requested` overrides the router level for this invocation only.
    #[must_use]
    pub fn caller_log(&self, sink: Arc<dyn ProgressSink>, requested: Option<LogLevel>) -> CallerLog {
        CallerLog::new(
            sink,
            requested.unwrap_or_else(|| self.level()),
            self.state.redactor(),
        )
    }

    fn has_sink(&self, target: &SinkTarget) -> bool {
        self.state
            .sinks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|sink| sink.target() == target)
    }

    fn insert_sink(&self, sink: Arc<Sink>) {
        let mut sinks = self
            .state
            .sinks
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if !sinks.iter().any(|existing| existing.target() == sink.target()) {
            sinks.push(sink);
        }
    }

    fn remove_sink(&self, target: &SinkTarget) -> bool {
        let mut sinks = self
            .state
            .sinks
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = sinks.len();
        sinks.retain(|sink| sink.target() != target);
        sinks.len() != before
    }
}
