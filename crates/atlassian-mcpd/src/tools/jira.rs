//! Jira issue tools.

use async_trait::async_trait;
use serde_json::Value;

use super::{finish_search, start_search};
use crate::backend::CommandFault;
use crate::dispatch::{CommandContext, CommandHandler};

/// `get_issue`: one issue by key.
#[derive(Debug, Default, Clone, Copy)]
pub struct GetIssue;

#[async_trait]
impl CommandHandler for GetIssue {
    async fn handle(&self, context: CommandContext) -> Result<Value, CommandFault> {
        let key = context.require_subject()?;
        context.caller().debug(format!("fetching issue {key}"));
        context.backend().get_issue(key).await
    }
}

/// `search_issues`: JQL search, subject is the query.
#[derive(Debug, Default, Clone, Copy)]
pub struct SearchIssues;

#[async_trait]
impl CommandHandler for SearchIssues {
    async fn handle(&self, context: CommandContext) -> Result<Value, CommandFault> {
        let (jql, limit) = start_search(&context, "issues")?;
        let issues = context.backend().search_issues(&jql, limit).await?;
        Ok(finish_search(&context, issues, limit, "issues"))
    }
}
