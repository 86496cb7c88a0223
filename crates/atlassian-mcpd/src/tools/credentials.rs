//! `setup_atlassian_credentials`: validates an API token against the instance.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::TOOLS_TARGET;
use crate::backend::CommandFault;
use crate::dispatch::{CommandContext, CommandHandler};

/// Checks a token by authenticating with it. The token never reaches a log.
#[derive(Debug, Default, Clone, Copy)]
pub struct SetupCredentials;

#[async_trait]
impl CommandHandler for SetupCredentials {
    async fn handle(&self, context: CommandContext) -> Result<Value, CommandFault> {
        let token = context
            .string("token")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| CommandFault::invalid_input("token must not be empty"))?;
        let instance = context
            .instance()
            .as_ref()
            .map(ToString::to_string)
            .map_err(|error| CommandFault::Configuration(error.to_string()))?;

        context.caller().info(format!("validating API token against {instance}"));
        let identity = context.backend().authenticate(token).await?;
        tracing::info!(
            target: TOOLS_TARGET,
            instance = %instance,
            "API token accepted"
        );

        Ok(json!({
            "authenticated": true,
            "instance": instance,
            "user": identity,
        }))
    }
}
