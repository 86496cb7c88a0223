//! Validation of the Atlassian instance URL.

use std::fmt;

use thiserror::Error;
use url::Url;

/// Operator guidance shown when the instance URL is missing or invalid.
pub const SETUP_GUIDANCE: &str = "Please set the ATLASSIAN_URL environment variable to your \
Atlassian instance URL.\nExample: export ATLASSIAN_URL=https://your-company.atlassian.net\n\
You can also set MCP_TOOL_PREFIX to customise the tool prefix (default: atl).";

/// Host suffix identifying hosted (cloud) instances.
const CLOUD_HOST_MARKER: &str = "atlassian.net";

/// Errors raised while validating the instance URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstanceUrlError {
    /// No URL was configured.
    #[error("ATLASSIAN_URL environment variable is required")]
    Missing,
    /// The URL could not be parsed.
    #[error("invalid instance URL '{url}': {reason}")]
    Malformed {
        /// Rejected input.
        url: String,
        /// Parser diagnostic.
        reason: String,
    },
    /// The URL does not use HTTPS.
    #[error("instance URL must use https, got '{scheme}'")]
    InsecureScheme {
        /// Scheme that was supplied.
        scheme: String,
    },
    /// The URL has no host name.
    #[error("instance URL '{url}' has no host name")]
    MissingHost {
        /// Rejected input.
        url: String,
    },
}

/// Validated HTTPS URL of an Atlassian instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceUrl {
    url: Url,
}

impl InstanceUrl {
    /// Parses and validates an instance URL.
    ///
    /// # Errors
    ///
    /// Returns [`InstanceUrlError`] when the text is blank, unparsable, not
    /// HTTPS, or lacks a host.
    pub fn parse(raw: &str) -> Result<Self, InstanceUrlError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(InstanceUrlError::Missing);
        }
        let url = Url::parse(trimmed).map_err(|error| InstanceUrlError::Malformed {
            url: trimmed.to_owned(),
            reason: error.to_string(),
        })?;
        if url.scheme() != "https" {
            return Err(InstanceUrlError::InsecureScheme {
                scheme: url.scheme().to_owned(),
            });
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(InstanceUrlError::MissingHost {
                url: trimmed.to_owned(),
            });
        }
        Ok(Self { url })
    }

    /// Host name of the instance.
    #[must_use]
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Returns `true` for hosted cloud instances.
    #[must_use]
    pub fn is_cloud(&self) -> bool {
        self.host().contains(CLOUD_HOST_MARKER)
    }

    /// Builds the REST endpoint for `path` below the instance root.
    #[must_use]
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Borrows the parsed URL.
    #[must_use]
    pub fn as_url(&self) -> &Url {
        &self.url
    }
}

impl fmt::Display for InstanceUrl {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.url.as_str())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("https://company.atlassian.net", true)]
    #[case("https://jira.example.com", false)]
    fn detects_cloud_hosts(#[case] raw: &str, #[case] cloud: bool) {
        let url = InstanceUrl::parse(raw).expect("url should validate");
        assert_eq!(url.is_cloud(), cloud);
    }

    #[rstest]
    #[case::blank("   ", InstanceUrlError::Missing)]
    #[case::plain_http(
        "http://company.atlassian.net",
        InstanceUrlError::InsecureScheme { scheme: "http".to_owned() }
    )]
    fn rejects_invalid_urls(#[case] raw: &str, #[case] expected: InstanceUrlError) {
        assert_eq!(InstanceUrl::parse(raw), Err(expected));
    }

    #[test]
    fn rejects_unparsable_url() {
        let error = InstanceUrl::parse("not a url").expect_err("should fail");
        assert!(matches!(error, InstanceUrlError::Malformed { .. }));
    }

    #[test]
    fn joins_api_paths() {
        let url = InstanceUrl::parse("https://company.atlassian.net/").expect("valid");
        assert_eq!(
            url.api_url("/rest/api/3/serverInfo"),
            "https://company.atlassian.net/rest/api/3/serverInfo"
        );
    }

    #[test]
    fn guidance_names_the_variable() {
        assert!(SETUP_GUIDANCE.contains("ATLASSIAN_URL"));
        assert!(SETUP_GUIDANCE.contains("https://"));
    }
}
