//! Structured health reporting for server lifecycle events.

use std::sync::Arc;

use atlassian_config::{Config, InstanceUrlError, SETUP_GUIDANCE};

use crate::bootstrap::BootstrapError;
use crate::telemetry::Installation;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config, commands: usize);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked when the server starts without a usable instance URL.
    fn configuration_incomplete(&self, error: &InstanceUrlError);

    /// Invoked once logging initialisation is finalised.
    fn logging_finalized(&self, installation: Installation);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config, commands: usize) {
        (**self).bootstrap_succeeded(config, commands);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn configuration_incomplete(&self, error: &InstanceUrlError) {
        (**self).configuration_incomplete(error);
    }

    fn logging_finalized(&self, installation: Installation) {
        (**self).logging_finalized(installation);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting server bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config, commands: usize) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            commands,
            tool_prefix = config.tool_prefix(),
            log_level = %config.log_level(),
            log_format = %config.log_format(),
            redaction = config.redact_logs(),
            timeout_secs = config.timeout().as_secs(),
            "server bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "server bootstrap failed"
        );
    }

    fn configuration_incomplete(&self, error: &InstanceUrlError) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "configuration_incomplete",
            error = %error,
            guidance = SETUP_GUIDANCE,
            "starting without a usable Atlassian instance"
        );
    }

    fn logging_finalized(&self, installation: Installation) {
        tracing::debug!(
            target: HEALTH_TARGET,
            event = "logging_finalized",
            installation = ?installation,
            "logging initialisation finalised"
        );
    }
}
