//! Test double for [`HealthReporter`] that records lifecycle events.

use std::sync::Mutex;

use atlassian_config::{Config, InstanceUrlError};

use crate::bootstrap::BootstrapError;
use crate::health::HealthReporter;
use crate::telemetry::Installation;

/// Lifecycle events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    /// Bootstrap started.
    BootstrapStarting,
    /// Bootstrap completed with this many registered commands.
    BootstrapSucceeded {
        /// Registered command count.
        commands: usize,
    },
    /// Bootstrap failed with an error description.
    BootstrapFailed(String),
    /// The server started without a usable instance.
    ConfigurationIncomplete(String),
    /// Logging initialisation was finalised.
    LoggingFinalized(Installation),
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config, commands: usize) {
        self.record(HealthEvent::BootstrapSucceeded { commands });
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn configuration_incomplete(&self, error: &InstanceUrlError) {
        self.record(HealthEvent::ConfigurationIncomplete(error.to_string()));
    }

    fn logging_finalized(&self, installation: Installation) {
        self.record(HealthEvent::LoggingFinalized(installation));
    }
}
