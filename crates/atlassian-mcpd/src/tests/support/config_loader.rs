//! Configuration loaders for bootstrap scenarios.

use std::ffi::OsString;
use std::sync::Arc;

use atlassian_config::{Config, ConfigError};

use crate::bootstrap::ConfigLoader;

/// Instance URL used by scenarios that need a configured server.
pub const TEST_INSTANCE: &str = "https://example.atlassian.net";

/// Loader returning a fixed configuration without touching the environment.
#[derive(Debug, Clone)]
pub struct TestConfigLoader {
    config: Config,
}

impl TestConfigLoader {
    /// Configuration pointing at [`TEST_INSTANCE`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: Config {
                atlassian_url: Some(TEST_INSTANCE.to_owned()),
                ..Config::default()
            },
        }
    }

    /// Configuration with no instance URL.
    #[must_use]
    pub fn without_instance() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Configuration with an unusable instance URL.
    #[must_use]
    pub fn with_instance_url(url: &str) -> Self {
        Self {
            config: Config {
                atlassian_url: Some(url.to_owned()),
                ..Config::default()
            },
        }
    }

    /// Replaces the tool prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        prefix.clone_into(&mut self.config.tool_prefix);
        self
    }
}

impl Default for TestConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<ConfigError>> {
        Ok(self.config.clone())
    }
}

/// Loader that fails by passing an unknown log level.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<ConfigError>> {
        let args = [
            OsString::from("mcp-server-atlassian"),
            OsString::from("--log-level"),
            OsString::from("loud"),
        ];
        Config::load_from_iter(args).map_err(Arc::new)
    }
}
