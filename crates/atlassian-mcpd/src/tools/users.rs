//! User lookup tools.

use async_trait::async_trait;
use serde_json::Value;

use super::{finish_search, start_search};
use crate::backend::CommandFault;
use crate::dispatch::{CommandContext, CommandHandler, Subject};

/// `search_users`: users matching the subject query, at most `limit`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SearchUsers;

#[async_trait]
impl CommandHandler for SearchUsers {
    async fn handle(&self, context: CommandContext) -> Result<Value, CommandFault> {
        let (query, limit) = start_search(&context, "users")?;
        let users = context.backend().search_users(&query, limit).await?;
        Ok(finish_search(&context, users, limit, "users"))
    }
}

/// `get_user`: one user by account id, or the acting user.
#[derive(Debug, Default, Clone, Copy)]
pub struct GetUser;

#[async_trait]
impl CommandHandler for GetUser {
    async fn handle(&self, context: CommandContext) -> Result<Value, CommandFault> {
        let account = match context.subject() {
            Subject::Named(id) => Some(id.clone()),
            Subject::ActingUser | Subject::Unspecified => {
                context.caller().debug("no account id given, using the acting user");
                None
            }
        };
        context.backend().get_user(account).await
    }
}
