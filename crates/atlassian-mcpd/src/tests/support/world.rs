//! Scenario worlds shared by the behaviour suites.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing_subscriber::layer::SubscriberExt;

use atlassian_config::{DEFAULT_TOOL_PREFIX, InstanceUrl, InstanceUrlError, LogLevel};
use atlassian_mcp_types::{CommandEnvelope, Field, Product, ToolResult};

use crate::bootstrap::{BootstrapError, ConfigLoader, Server, bootstrap_with_commands};
use crate::dispatch::{Cancellation, DispatchRequest, Dispatcher};
use crate::registry::{CommandRegistration, RegistryBuilder};
use crate::telemetry::{InitMode, LogSettings, LoggingRouter};
use crate::tools;
use crate::transport::InvokeRequest;

use super::backend::FakeBackend;
use super::buffer::SharedBuffer;
use super::config_loader::{FailingConfigLoader, TEST_INSTANCE, TestConfigLoader};
use super::reporter::RecordingHealthReporter;
use super::sink::RecordingSink;

/// Router with no standard error sink.
#[must_use]
pub fn quiet_router(level: LogLevel) -> LoggingRouter {
    LoggingRouter::new(LogSettings {
        level,
        structured: false,
        redact: true,
        stderr: false,
    })
}

/// The configured test instance.
#[must_use]
pub fn instance() -> InstanceUrl {
    InstanceUrl::parse(TEST_INSTANCE).expect("test instance URL should parse")
}

/// Prefixed name of a built-in tool.
#[must_use]
pub fn tool(name: &str) -> String {
    format!("{DEFAULT_TOOL_PREFIX}_{name}")
}

/// Dispatcher, backend and both logging channels for one scenario.
pub struct DispatchWorld {
    runtime: tokio::runtime::Runtime,
    /// Backend double handed to handlers.
    pub backend: Arc<FakeBackend>,
    /// Router shared by the dispatcher and the diagnostic capture.
    pub router: LoggingRouter,
    /// Process-diagnostic output.
    pub diagnostics: SharedBuffer,
    /// Caller-visible output.
    pub sink: Arc<RecordingSink>,
    extra: Vec<CommandRegistration>,
    instance: Result<InstanceUrl, InstanceUrlError>,
    timeout: Duration,
    dispatcher: Option<Arc<Dispatcher>>,
    command: String,
    envelope: CommandEnvelope,
    parameters: Map<String, Value>,
    log_level: Option<LogLevel>,
    result: Option<ToolResult<Value>>,
}

impl DispatchWorld {
    /// A configured server with the built-in tools.
    #[must_use]
    pub fn new() -> Self {
        let router = quiet_router(LogLevel::Debug);
        let diagnostics = SharedBuffer::default();
        router.add_writer_sink("diagnostics", Box::new(diagnostics.clone()));
        Self {
            runtime: tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("test runtime should build"),
            backend: Arc::new(FakeBackend::default()),
            router,
            diagnostics,
            sink: Arc::new(RecordingSink::default()),
            extra: Vec::new(),
            instance: Ok(instance()),
            timeout: Duration::from_secs(5),
            dispatcher: None,
            command: String::new(),
            envelope: CommandEnvelope::default(),
            parameters: Map::new(),
            log_level: None,
            result: None,
        }
    }

    /// Registers an additional command before the first dispatch.
    pub fn register(&mut self, registration: CommandRegistration) {
        self.extra.push(registration);
    }

    /// Runs without an instance URL.
    pub fn unconfigured(&mut self) {
        self.instance = Err(InstanceUrlError::Missing);
    }

    /// Replaces the handler timeout.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Starts a new request for `command` against `product`.
    pub fn request(&mut self, command: &str, product: Product) {
        self.command = command.to_owned();
        self.envelope = CommandEnvelope::for_product(product);
        self.parameters = Map::new();
        self.log_level = None;
        self.result = None;
    }

    /// Sets the request subject.
    pub fn set_subject(&mut self, subject: &str) {
        self.envelope.subject = Field::Present(subject.to_owned());
    }

    /// Sets one request parameter.
    pub fn set_parameter(&mut self, name: &str, value: Value) {
        self.parameters.insert(name.to_owned(), value);
    }

    /// Restricts the response to `fields`.
    pub fn set_fields(&mut self, fields: &[&str]) {
        self.envelope.response_fields =
            Field::Present(fields.iter().map(|field| (*field).to_owned()).collect());
    }

    /// Overrides caller-visible verbosity for the request.
    pub fn set_log_level(&mut self, level: LogLevel) {
        self.log_level = Some(level);
    }

    /// Dispatches the pending request.
    pub fn dispatch(&mut self) {
        let dispatcher = self.dispatcher();
        let mut envelope = self.envelope.clone();
        if !self.parameters.is_empty() {
            envelope.parameters = Field::Present(self.parameters.clone());
        }
        let mut request = DispatchRequest::new(self.command.clone(), envelope);
        request.log_level = self.log_level;
        let sink = Arc::clone(&self.sink);
        let subscriber = tracing_subscriber::registry().with(self.router.layer());
        let runtime = &self.runtime;
        let result = tracing::subscriber::with_default(subscriber, || {
            runtime.block_on(dispatcher.dispatch(request, sink, Cancellation::never()))
        });
        self.result = Some(result);
    }

    /// Sends the pending request through the transport with `product` as
    /// the raw product name.
    pub fn dispatch_named_product(&mut self, product: &str) {
        let dispatcher = self.dispatcher();
        let invoke = InvokeRequest {
            id: Value::Null,
            command: self.command.clone(),
            product: Some(product.to_owned()),
            subject: self.envelope.subject.clone(),
            parameters: Field::Absent,
            response_fields: Field::Absent,
            log_level: None,
        };
        let rejected = match invoke.into_dispatch(dispatcher.registry()) {
            Ok((_, request)) => {
                self.envelope.product = request.envelope.product;
                self.dispatch();
                return;
            }
            Err(rejected) => rejected,
        };
        let sink = Arc::clone(&self.sink);
        let subscriber = tracing_subscriber::registry().with(self.router.layer());
        let result = tracing::subscriber::with_default(subscriber, || {
            dispatcher.reject(&rejected.command, rejected.error, sink, self.log_level)
        });
        self.result = Some(result);
    }

    /// Result of the last dispatch.
    #[must_use]
    pub fn result(&self) -> &ToolResult<Value> {
        self.result.as_ref().expect("no request was dispatched")
    }

    fn dispatcher(&mut self) -> Arc<Dispatcher> {
        if let Some(dispatcher) = &self.dispatcher {
            return Arc::clone(dispatcher);
        }
        let mut builder = RegistryBuilder::new();
        for registration in tools::catalogue(DEFAULT_TOOL_PREFIX)
            .into_iter()
            .chain(self.extra.drain(..))
        {
            builder
                .register(registration)
                .expect("scenario commands should not collide");
        }
        let dispatcher = Arc::new(
            Dispatcher::new(
                Arc::new(builder.build()),
                self.backend.clone(),
                self.router.clone(),
            )
            .with_instance(self.instance.clone())
            .with_timeout(self.timeout),
        );
        self.dispatcher = Some(Arc::clone(&dispatcher));
        dispatcher
    }
}

impl Default for DispatchWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Loader, reporter and bootstrap outcome for one scenario.
pub struct BootstrapWorld {
    loader: Box<dyn ConfigLoader>,
    /// Recorded lifecycle events.
    pub reporter: Arc<RecordingHealthReporter>,
    extra: Vec<CommandRegistration>,
    server: Option<Server>,
    error: Option<BootstrapError>,
}

impl BootstrapWorld {
    /// Builds a world with a configured loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            loader: Box::new(TestConfigLoader::new()),
            reporter: Arc::new(RecordingHealthReporter::default()),
            extra: Vec::new(),
            server: None,
            error: None,
        }
    }

    /// Installs `loader` and forgets earlier outcomes.
    pub fn use_loader(&mut self, loader: impl ConfigLoader + 'static) {
        self.loader = Box::new(loader);
        self.server = None;
        self.error = None;
    }

    /// Installs a loader that always fails.
    pub fn use_failing_loader(&mut self) {
        self.use_loader(FailingConfigLoader);
    }

    /// Registers a command after the built-in catalogue.
    pub fn add_command(&mut self, registration: CommandRegistration) {
        self.extra.push(registration);
    }

    /// Runs bootstrap once, leaving the global subscriber untouched.
    pub fn bootstrap(&mut self) {
        if self.server.is_some() || self.error.is_some() {
            return;
        }
        match bootstrap_with_commands(
            &*self.loader,
            self.reporter.clone(),
            Arc::new(FakeBackend::default()),
            InitMode::HostManaged,
            self.extra.drain(..).collect(),
        ) {
            Ok(server) => self.server = Some(server),
            Err(error) => self.error = Some(error),
        }
    }

    /// The bootstrapped server, if any.
    #[must_use]
    pub const fn server(&self) -> Option<&Server> {
        self.server.as_ref()
    }

    /// The bootstrap error, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&BootstrapError> {
        self.error.as_ref()
    }
}

impl Default for BootstrapWorld {
    fn default() -> Self {
        Self::new()
    }
}
