//! `health_check`: server status, configuration and connectivity.

use async_trait::async_trait;
use serde_json::{Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use atlassian_config::{InstanceUrlError, SETUP_GUIDANCE};

use super::TOOLS_TARGET;
use crate::backend::CommandFault;
use crate::dispatch::{CommandContext, CommandHandler};

/// Reports whether the server is usable. Runs without an instance URL.
#[derive(Debug, Default, Clone, Copy)]
pub struct HealthCheck;

#[async_trait]
impl CommandHandler for HealthCheck {
    async fn handle(&self, context: CommandContext) -> Result<Value, CommandFault> {
        let (configuration, connectivity) = match context.instance() {
            Ok(instance) => {
                let configuration = json!({
                    "status": "valid",
                    "instance": instance.to_string(),
                    "cloud": instance.is_cloud(),
                });
                (configuration, probe(&context).await)
            }
            Err(error) => {
                let status = match error {
                    InstanceUrlError::Missing => "missing",
                    InstanceUrlError::Malformed { .. }
                    | InstanceUrlError::InsecureScheme { .. }
                    | InstanceUrlError::MissingHost { .. } => "invalid",
                };
                let configuration = json!({
                    "status": status,
                    "error": error.to_string(),
                    "guidance": SETUP_GUIDANCE,
                });
                (configuration, json!({"status": "skipped"}))
            }
        };

        Ok(json!({
            "server": {
                "status": "running",
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            },
            "configuration": configuration,
            "connectivity": connectivity,
            "timestamp": now(),
        }))
    }
}

async fn probe(context: &CommandContext) -> Value {
    match context.backend().server_info().await {
        Ok(info) => {
            context.caller().debug("connectivity check succeeded");
            json!({"status": "ok", "server": info})
        }
        Err(fault) => {
            tracing::warn!(
                target: TOOLS_TARGET,
                error_type = %fault.error_type(),
                error = %fault,
                "connectivity check failed"
            );
            context
                .caller()
                .warning(format!("connectivity check failed: {fault}"));
            json!({
                "status": "failed",
                "error_type": fault.error_type(),
                "error": fault.to_string(),
            })
        }
    }
}

fn now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| String::from("unknown"))
}
