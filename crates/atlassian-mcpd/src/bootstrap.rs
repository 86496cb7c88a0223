//! Server bootstrap orchestration.

use std::sync::Arc;

use thiserror::Error;

use atlassian_config::{Config, ConfigError};

use crate::backend::AtlassianBackend;
use crate::dispatch::Dispatcher;
use crate::health::HealthReporter;
use crate::registry::{CommandRegistration, RegistryBuilder, RegistryError};
use crate::telemetry::{InitMode, Installation, LoggingRouter, TelemetryError};
use crate::tools;

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the server configuration.
    ///
    /// # Errors
    ///
    /// Returns the loader's [`ConfigError`] when flags or environment
    /// variables are invalid.
    fn load(&self) -> Result<Config, Arc<ConfigError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<ConfigError>> {
        Config::load().map_err(Arc::new)
    }
}

/// Loader returning a configuration resolved elsewhere.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already loaded configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<ConfigError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<ConfigError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The command table is inconsistent.
    #[error("failed to build the command registry: {source}")]
    Registry {
        /// Underlying registry error.
        #[source]
        source: RegistryError,
    },
}

/// Result of a successful bootstrap invocation.
#[derive(Debug)]
pub struct Server {
    config: Config,
    router: LoggingRouter,
    dispatcher: Arc<Dispatcher>,
    installation: Installation,
}

impl Server {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Logging router owning both hierarchies.
    #[must_use]
    pub const fn router(&self) -> &LoggingRouter {
        &self.router
    }

    /// Shared dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    /// How logging initialisation was finalised.
    #[must_use]
    pub const fn installation(&self) -> Installation {
        self.installation
    }
}

/// Bootstraps the server with the built-in tool catalogue.
///
/// # Errors
///
/// Returns [`BootstrapError`] when configuration, telemetry or registry
/// setup fails. A missing or invalid instance URL is not an error.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    backend: Arc<dyn AtlassianBackend>,
    mode: InitMode,
) -> Result<Server, BootstrapError> {
    bootstrap_with_commands(loader, reporter, backend, mode, Vec::new())
}

/// Bootstraps the server, registering `extra` after the built-in tools.
///
/// # Errors
///
/// Returns [`BootstrapError::Registry`] when an extra command reuses a
/// registered name, and otherwise as [`bootstrap_with`].
pub fn bootstrap_with_commands(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    backend: Arc<dyn AtlassianBackend>,
    mode: InitMode,
    extra: Vec<CommandRegistration>,
) -> Result<Server, BootstrapError> {
    reporter.bootstrap_starting();

    let config = match loader.load() {
        Ok(config) => config,
        Err(source) => return Err(fail(&*reporter, BootstrapError::Configuration { source })),
    };

    let router = match LoggingRouter::from_config(&config) {
        Ok(router) => router,
        Err(source) => return Err(fail(&*reporter, BootstrapError::Telemetry { source })),
    };

    let mut builder = RegistryBuilder::new();
    let registered = tools::catalogue(config.tool_prefix())
        .into_iter()
        .chain(extra)
        .try_for_each(|registration| builder.register(registration).map(drop));
    if let Err(source) = registered {
        return Err(fail(&*reporter, BootstrapError::Registry { source }));
    }
    let registry = Arc::new(builder.build());

    let installation = router.finalize(mode);
    reporter.logging_finalized(installation);

    let instance = config.instance();
    if let Err(error) = &instance {
        reporter.configuration_incomplete(error);
    }

    let dispatcher = Dispatcher::new(Arc::clone(&registry), backend, router.clone())
        .with_instance(instance)
        .with_timeout(config.timeout());
    reporter.bootstrap_succeeded(&config, registry.len());

    Ok(Server {
        config,
        router,
        dispatcher: Arc::new(dispatcher),
        installation,
    })
}

fn fail(reporter: &dyn HealthReporter, error: BootstrapError) -> BootstrapError {
    reporter.bootstrap_failed(&error);
    error
}
