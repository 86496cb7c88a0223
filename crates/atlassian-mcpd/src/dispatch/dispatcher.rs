//! Envelope dispatch from resolution through projection.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde_json::Value;

use atlassian_config::{
    DEFAULT_TIMEOUT_SECS, InstanceUrl, InstanceUrlError, LogLevel, SETUP_GUIDANCE,
};
use atlassian_mcp_types::{CommandEnvelope, Product, ToolResult};

use crate::backend::AtlassianBackend;
use crate::projection::project;
use crate::registry::{CommandRegistration, CommandRegistry};
use crate::telemetry::{CallerLog, LoggingRouter, ProgressSink};

use super::DISPATCH_TARGET;
use super::cancel::Cancellation;
use super::errors::InvocationError;
use super::handler::{CommandContext, CommandHandler};
use super::state::{InvocationState, Lifecycle};
use super::validate;

/// One invocation as handed over by a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRequest {
    /// Command name, including the tool prefix.
    pub command: String,
    /// Caller-supplied envelope.
    pub envelope: CommandEnvelope,
    /// Caller-visible verbosity for this invocation only.
    pub log_level: Option<LogLevel>,
}

impl DispatchRequest {
    /// Creates a request with the router's default verbosity.
    #[must_use]
    pub fn new(command: impl Into<String>, envelope: CommandEnvelope) -> Self {
        Self {
            command: command.into(),
            envelope,
            log_level: None,
        }
    }

    /// Overrides caller-visible verbosity.
    #[must_use]
    pub const fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }
}

/// Routes envelopes to handlers and turns every outcome into exactly one
/// [`ToolResult`].
pub struct Dispatcher {
    registry: Arc<CommandRegistry>,
    backend: Arc<dyn AtlassianBackend>,
    router: LoggingRouter,
    instance: Result<InstanceUrl, InstanceUrlError>,
    timeout: Duration,
    setup_notice_pending: AtomicBool,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Dispatcher")
            .field("commands", &self.registry.len())
            .field("instance", &self.instance)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Creates a dispatcher with no configured instance and the default
    /// timeout.
    #[must_use]
    pub fn new(
        registry: Arc<CommandRegistry>,
        backend: Arc<dyn AtlassianBackend>,
        router: LoggingRouter,
    ) -> Self {
        Self {
            registry,
            backend,
            router,
            instance: Err(InstanceUrlError::Missing),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            setup_notice_pending: AtomicBool::new(true),
        }
    }

    /// Sets the instance handlers run against.
    ///
    /// An unusable instance arms a one-time setup warning delivered to the
    /// first caller.
    #[must_use]
    pub fn with_instance(mut self, instance: Result<InstanceUrl, InstanceUrlError>) -> Self {
        self.setup_notice_pending = AtomicBool::new(instance.is_err());
        self.instance = instance;
        self
    }

    /// Sets the handler timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Registered commands.
    #[must_use]
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Logging router shared with the transport.
    #[must_use]
    pub const fn router(&self) -> &LoggingRouter {
        &self.router
    }

    /// Dispatches one invocation.
    ///
    /// Never fails: unknown commands, validation problems, handler faults,
    /// panics, timeouts and cancellation all come back as a failed result.
    pub async fn dispatch(
        &self,
        request: DispatchRequest,
        sink: Arc<dyn ProgressSink>,
        cancellation: Cancellation,
    ) -> ToolResult<Value> {
        let caller = self.router.caller_log(sink, request.log_level);
        self.deliver_setup_notice(&caller);
        let mut lifecycle = Lifecycle::new(&request.command);
        let outcome = self
            .run(&request, &caller, &mut lifecycle, cancellation)
            .await;
        conclude(&request.command, outcome, &caller, &mut lifecycle)
    }

    /// Fails an invocation the transport could not turn into a request.
    ///
    /// The rejection is logged on both channels like any other failure.
    pub fn reject(
        &self,
        command: &str,
        error: InvocationError,
        sink: Arc<dyn ProgressSink>,
        log_level: Option<LogLevel>,
    ) -> ToolResult<Value> {
        let caller = self.router.caller_log(sink, log_level);
        self.deliver_setup_notice(&caller);
        let mut lifecycle = Lifecycle::new(command);
        conclude(command, Err(error), &caller, &mut lifecycle)
    }

    async fn run(
        &self,
        request: &DispatchRequest,
        caller: &CallerLog,
        lifecycle: &mut Lifecycle,
        cancellation: Cancellation,
    ) -> Result<Value, InvocationError> {
        let registration = self
            .registry
            .resolve(&request.command)
            .ok_or_else(|| InvocationError::unknown_command(&request.command))?;
        lifecycle.advance(InvocationState::Resolved);

        let context = self.validate(&registration, request, caller)?;
        lifecycle.advance(InvocationState::Validated);

        lifecycle.advance(InvocationState::Executing);
        let raw = self
            .execute(registration.handler(), context, cancellation)
            .await?;

        let projected = project(&raw, request.envelope.projection());
        lifecycle.advance(InvocationState::Projected);
        Ok(projected)
    }

    fn validate(
        &self,
        registration: &CommandRegistration,
        request: &DispatchRequest,
        caller: &CallerLog,
    ) -> Result<CommandContext, InvocationError> {
        let envelope = &request.envelope;
        if !registration.accepts_product(envelope.product) {
            return Err(InvocationError::ProductNotAccepted {
                command: registration.name().to_owned(),
                product: envelope.product.to_string(),
                accepted: accepted_products(registration.products()),
            });
        }
        let subject = validate::subject(registration, &envelope.subject)?;
        let parameters = validate::parameters(registration, &envelope.parameters)?;
        if registration.needs_instance() {
            if let Err(error) = &self.instance {
                return Err(InvocationError::NotConfigured {
                    reason: error.to_string(),
                });
            }
        }
        Ok(CommandContext {
            command: registration.name().to_owned(),
            product: envelope.product,
            subject,
            parameters,
            caller: caller.clone(),
            backend: Arc::clone(&self.backend),
            instance: self.instance.clone(),
        })
    }

    /// Runs the handler in its own task, racing it against cancellation and
    /// the timeout.
    async fn execute(
        &self,
        handler: Arc<dyn CommandHandler>,
        context: CommandContext,
        mut cancellation: Cancellation,
    ) -> Result<Value, InvocationError> {
        let mut task = tokio::spawn(async move { handler.handle(context).await });
        let raced = tokio::select! {
            biased;
            () = cancellation.cancelled() => None,
            joined = tokio::time::timeout(self.timeout, &mut task) => Some(joined),
        };
        let Some(joined) = raced else {
            task.abort();
            return Err(InvocationError::Cancelled);
        };
        match joined {
            Err(_elapsed) => {
                task.abort();
                Err(InvocationError::TimedOut {
                    timeout: self.timeout,
                })
            }
            Ok(Err(join_error)) if join_error.is_panic() => Err(InvocationError::Panicked {
                message: panic_message(join_error.into_panic()),
            }),
            Ok(Err(_aborted)) => Err(InvocationError::Cancelled),
            Ok(Ok(outcome)) => outcome.map_err(InvocationError::from),
        }
    }

    fn deliver_setup_notice(&self, caller: &CallerLog) {
        let Err(error) = &self.instance else {
            return;
        };
        if self.setup_notice_pending.swap(false, Ordering::AcqRel) {
            caller.warning(format!(
                "Atlassian configuration is incomplete: {error}.\n{SETUP_GUIDANCE}"
            ));
        }
    }
}

fn conclude(
    command: &str,
    outcome: Result<Value, InvocationError>,
    caller: &CallerLog,
    lifecycle: &mut Lifecycle,
) -> ToolResult<Value> {
    match outcome {
        Ok(value) => {
            lifecycle.advance(InvocationState::Completed);
            let summary = summarize(&value);
            caller.info(format!("{command} completed: {summary}"));
            tracing::debug!(
                target: DISPATCH_TARGET,
                command,
                summary = %summary,
                "command completed"
            );
            ToolResult::ok(value)
        }
        Err(error) => {
            lifecycle.fail();
            let error_type = error.error_type();
            caller.warning(format!("{command} failed ({error_type}): {error}"));
            let cause = error
                .cause()
                .map_or_else(String::new, |record| record.to_string());
            tracing::error!(
                target: DISPATCH_TARGET,
                command,
                error_type = %error_type,
                error = %error,
                cause = %cause,
                "command failed"
            );
            error.into_result()
        }
    }
}

fn summarize(value: &Value) -> String {
    match value {
        Value::Array(items) if items.len() == 1 => "1 item".to_owned(),
        Value::Array(items) => format!("{} items", items.len()),
        Value::Object(members) => format!("{} fields", members.len()),
        Value::Null => "no content".to_owned(),
        _ => "1 value".to_owned(),
    }
}

fn accepted_products(products: &[Product]) -> String {
    products
        .iter()
        .map(|product| product.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => payload.downcast_ref::<&str>().map_or_else(
            || "handler panicked with a non-text payload".to_owned(),
            |message| (*message).to_owned(),
        ),
    }
}
