//! Placeholder backend used until an HTTP client is wired in.

use async_trait::async_trait;
use serde_json::Value;

use super::{AtlassianBackend, CommandFault};

const BACKEND_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::backend::offline");

const OFFLINE_REASON: &str = "no backend client is wired";

/// Backend that reports every call as unreachable.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineBackend;

impl OfflineBackend {
    fn refuse<T>(operation: &'static str) -> Result<T, CommandFault> {
        tracing::warn!(
            target: BACKEND_TARGET,
            operation,
            "backend call requested but no client is available"
        );
        Err(CommandFault::unreachable(OFFLINE_REASON))
    }
}

#[async_trait]
impl AtlassianBackend for OfflineBackend {
    async fn server_info(&self) -> Result<Value, CommandFault> {
        Self::refuse("server_info")
    }

    async fn authenticate(&self, _token: &str) -> Result<Value, CommandFault> {
        Self::refuse("authenticate")
    }

    async fn search_users(&self, _query: &str, _limit: usize) -> Result<Vec<Value>, CommandFault> {
        Self::refuse("search_users")
    }

    async fn get_user(&self, _account_id: Option<String>) -> Result<Value, CommandFault> {
        Self::refuse("get_user")
    }

    async fn get_issue(&self, _key: &str) -> Result<Value, CommandFault> {
        Self::refuse("get_issue")
    }

    async fn search_issues(&self, _jql: &str, _limit: usize) -> Result<Vec<Value>, CommandFault> {
        Self::refuse("search_issues")
    }

    async fn get_page(&self, _id: &str) -> Result<Value, CommandFault> {
        Self::refuse("get_page")
    }

    async fn search_pages(
        &self,
        _cql: &str,
        _space: Option<String>,
        _limit: usize,
    ) -> Result<Vec<Value>, CommandFault> {
        Self::refuse("search_pages")
    }

    async fn get_space(&self, _key: &str) -> Result<Value, CommandFault> {
        Self::refuse("get_space")
    }
}

#[cfg(test)]
mod tests {
    use atlassian_mcp_types::ErrorType;

    use super::*;

    #[tokio::test]
    async fn every_call_is_a_network_error() {
        let backend = OfflineBackend;
        let fault = backend.get_issue("PRJ-1").await.expect_err("offline backend refuses");
        assert_eq!(fault.error_type(), ErrorType::NetworkError);
        assert!(fault.to_string().contains(OFFLINE_REASON));
    }
}
