//! Backend collaborator contract.
//!
//! Handlers reach the Atlassian products only through [`AtlassianBackend`].
//! The trait returns raw JSON payloads so handlers stay free of the HTTP
//! client's data shapes; every failure comes back as a categorised
//! [`CommandFault`].

mod errors;
mod offline;

use async_trait::async_trait;
use serde_json::Value;

pub use errors::CommandFault;
pub use offline::OfflineBackend;

/// Asynchronous access to the Jira and Confluence REST surfaces.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AtlassianBackend: Send + Sync {
    /// Fetches instance metadata; doubles as a connectivity probe.
    async fn server_info(&self) -> Result<Value, CommandFault>;

    /// Validates an API token and returns the authenticated identity.
    async fn authenticate(&self, token: &str) -> Result<Value, CommandFault>;

    /// Searches users matching `query`, returning at most `limit` entries.
    async fn search_users(&self, query: &str, limit: usize) -> Result<Vec<Value>, CommandFault>;

    /// Fetches a user by account id, or the acting user when `None`.
    async fn get_user(&self, account_id: Option<String>) -> Result<Value, CommandFault>;

    /// Fetches an issue by key.
    async fn get_issue(&self, key: &str) -> Result<Value, CommandFault>;

    /// Runs a JQL search.
    async fn search_issues(&self, jql: &str, limit: usize) -> Result<Vec<Value>, CommandFault>;

    /// Fetches a page by id.
    async fn get_page(&self, id: &str) -> Result<Value, CommandFault>;

    /// Runs a CQL search, optionally restricted to one space.
    async fn search_pages(
        &self,
        cql: &str,
        space: Option<String>,
        limit: usize,
    ) -> Result<Vec<Value>, CommandFault>;

    /// Fetches a space by key.
    async fn get_space(&self, key: &str) -> Result<Value, CommandFault>;
}
