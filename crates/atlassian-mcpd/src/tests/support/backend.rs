//! Programmable backend double with canned Jira and Confluence payloads.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::backend::{AtlassianBackend, CommandFault};

/// Backend returning canned payloads and recording every call.
///
/// `search_users` ignores the requested limit so handler-side truncation can
/// be observed.
#[derive(Debug, Default)]
pub struct FakeBackend {
    users: Mutex<Vec<Value>>,
    fault: Mutex<Option<CommandFault>>,
    calls: Mutex<Vec<String>>,
}

impl FakeBackend {
    /// Creates a backend that knows the given users.
    #[must_use]
    pub fn with_users(users: Vec<Value>) -> Self {
        let backend = Self::default();
        backend.set_users(users);
        backend
    }

    /// Replaces the known users.
    pub fn set_users(&self, users: Vec<Value>) {
        *self.users.lock().expect("users mutex poisoned") = users;
    }

    /// Makes every later call fail with `fault`.
    pub fn fail_with(&self, fault: CommandFault) {
        *self.fault.lock().expect("fault mutex poisoned") = Some(fault);
    }

    /// Names of the calls received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }

    fn record(&self, call: &str) -> Result<(), CommandFault> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(call.to_owned());
        match self.fault.lock().expect("fault mutex poisoned").clone() {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }

    fn users(&self) -> Vec<Value> {
        self.users.lock().expect("users mutex poisoned").clone()
    }
}

#[async_trait]
impl AtlassianBackend for FakeBackend {
    async fn server_info(&self) -> Result<Value, CommandFault> {
        self.record("server_info")?;
        Ok(json!({"version": "9.12.0", "deploymentType": "Cloud"}))
    }

    async fn authenticate(&self, _token: &str) -> Result<Value, CommandFault> {
        self.record("authenticate")?;
        Ok(json!({"accountId": "acct-me", "displayName": "Acting User"}))
    }

    async fn search_users(&self, _query: &str, _limit: usize) -> Result<Vec<Value>, CommandFault> {
        self.record("search_users")?;
        Ok(self.users())
    }

    async fn get_user(&self, account_id: Option<String>) -> Result<Value, CommandFault> {
        self.record("get_user")?;
        let id = account_id.unwrap_or_else(|| "acct-me".to_owned());
        Ok(json!({"accountId": id, "displayName": "Acting User", "active": true}))
    }

    async fn get_issue(&self, key: &str) -> Result<Value, CommandFault> {
        self.record("get_issue")?;
        Ok(json!({
            "key": key,
            "fields": {
                "summary": "Fix login",
                "status": {"name": "Open", "id": "1"},
                "assignee": null
            }
        }))
    }

    async fn search_issues(&self, _jql: &str, _limit: usize) -> Result<Vec<Value>, CommandFault> {
        self.record("search_issues")?;
        Ok(vec![
            json!({"key": "PRJ-1", "fields": {"summary": "First"}}),
            json!({"key": "PRJ-2", "fields": {"summary": "Second"}}),
            json!({"key": "PRJ-3", "fields": {"summary": "Third"}}),
        ])
    }

    async fn get_page(&self, id: &str) -> Result<Value, CommandFault> {
        self.record("get_page")?;
        Ok(json!({"id": id, "title": "Runbook", "space": {"key": "OPS"}}))
    }

    async fn search_pages(
        &self,
        _cql: &str,
        space: Option<String>,
        _limit: usize,
    ) -> Result<Vec<Value>, CommandFault> {
        self.record("search_pages")?;
        let space = space.unwrap_or_else(|| "OPS".to_owned());
        Ok(vec![
            json!({"id": "101", "title": "Runbook", "space": {"key": space}}),
            json!({"id": "102", "title": "Escalation", "space": {"key": space}}),
        ])
    }

    async fn get_space(&self, key: &str) -> Result<Value, CommandFault> {
        self.record("get_space")?;
        Ok(json!({"key": key, "name": "Operations"}))
    }
}
