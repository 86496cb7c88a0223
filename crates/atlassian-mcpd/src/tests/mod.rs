//! Test suites for the Atlassian command server.

mod dispatch_behaviour;
pub(crate) mod support;
