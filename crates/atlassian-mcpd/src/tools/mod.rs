//! Built-in tool catalogue.
//!
//! Every tool is registered under `{prefix}_{name}`, with `atl` as the
//! default prefix. Handlers talk to the products only through the backend
//! collaborator and report failures as [`CommandFault`]s.

mod confluence;
mod credentials;
mod health;
mod jira;
mod users;

use serde_json::{Value, json};

use atlassian_mcp_types::Product;

use crate::backend::CommandFault;
use crate::dispatch::CommandContext;
use crate::registry::{CommandRegistration, ParamSpec, SubjectPolicy};

pub use confluence::{GetPage, GetSpace, SearchPages};
pub use credentials::SetupCredentials;
pub use health::HealthCheck;
pub use jira::{GetIssue, SearchIssues};
pub use users::{GetUser, SearchUsers};

/// Tracing target for tool handlers.
pub(crate) const TOOLS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::tools");

/// Default number of search results.
pub const DEFAULT_LIMIT: i64 = 50;

/// Largest accepted search limit.
pub const MAX_LIMIT: i64 = 1000;

/// Unprefixed names of the built-in tools, in registration order.
pub const TOOL_NAMES: [&str; 9] = [
    "health_check",
    "setup_atlassian_credentials",
    "search_users",
    "get_user",
    "get_issue",
    "search_issues",
    "get_page",
    "search_pages",
    "get_space",
];

/// Builds the registrations of every built-in tool.
#[must_use]
pub fn catalogue(prefix: &str) -> Vec<CommandRegistration> {
    let name = |tool: &str| format!("{prefix}_{tool}");
    vec![
        CommandRegistration::new(name("health_check"), HealthCheck),
        CommandRegistration::new(name("setup_atlassian_credentials"), SetupCredentials)
            .accepts(&[Product::Atlassian])
            .param(ParamSpec::string("token").required())
            .requires_instance(),
        searching(
            CommandRegistration::new(name("search_users"), SearchUsers)
                .accepts(&[Product::Atlassian, Product::Jira]),
        ),
        CommandRegistration::new(name("get_user"), GetUser)
            .accepts(&[Product::Atlassian, Product::Jira])
            .subject(SubjectPolicy::ActingUser)
            .requires_instance(),
        CommandRegistration::new(name("get_issue"), GetIssue)
            .accepts(&[Product::Jira])
            .subject(SubjectPolicy::Required)
            .requires_instance(),
        searching(
            CommandRegistration::new(name("search_issues"), SearchIssues).accepts(&[Product::Jira]),
        ),
        CommandRegistration::new(name("get_page"), GetPage)
            .accepts(&[Product::Confluence])
            .subject(SubjectPolicy::Required)
            .requires_instance(),
        searching(
            CommandRegistration::new(name("search_pages"), SearchPages)
                .accepts(&[Product::Confluence])
                .param(ParamSpec::string("space")),
        ),
        CommandRegistration::new(name("get_space"), GetSpace)
            .accepts(&[Product::Atlassian, Product::Confluence])
            .subject(SubjectPolicy::Required)
            .requires_instance(),
    ]
}

/// Search tools take a required query subject and a bounded `limit`.
fn searching(registration: CommandRegistration) -> CommandRegistration {
    registration
        .subject(SubjectPolicy::Required)
        .param(limit_param())
        .requires_instance()
}

fn limit_param() -> ParamSpec {
    ParamSpec::integer("limit", 1, MAX_LIMIT).with_default(json!(DEFAULT_LIMIT))
}

/// Validated `limit` parameter.
fn limit_of(context: &CommandContext) -> usize {
    let limit = context.integer("limit").unwrap_or(DEFAULT_LIMIT);
    usize::try_from(limit).unwrap_or(1)
}

/// Truncates search results to `limit` and reports the outcome as progress.
fn finish_search(context: &CommandContext, mut items: Vec<Value>, limit: usize, what: &str) -> Value {
    let found = items.len();
    if found > limit {
        items.truncate(limit);
        context
            .caller()
            .debug(format!("truncated {found} {what} to the limit of {limit}"));
    }
    let kept = u64::try_from(items.len()).unwrap_or(u64::MAX);
    context
        .caller()
        .progress(kept, Some(kept), Some(&format!("retrieved {kept} {what}")));
    Value::Array(items)
}

fn start_search(context: &CommandContext, what: &str) -> Result<(String, usize), CommandFault> {
    let query = context.require_subject()?.to_owned();
    let limit = limit_of(context);
    context.caller().progress(0, None, Some(&format!("searching {what}")));
    context
        .caller()
        .trace(format!("{} query '{query}' limit {limit}", context.command()));
    Ok((query, limit))
}
