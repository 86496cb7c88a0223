//! Per-invocation state machine.

use std::fmt;

use super::DISPATCH_TARGET;

/// Stage of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    /// The request arrived.
    Received,
    /// The command name resolved to a registration.
    Resolved,
    /// Product, subject and parameters passed validation.
    Validated,
    /// The handler is running.
    Executing,
    /// The success payload was projected.
    Projected,
    /// A successful result was produced.
    Completed,
    /// A failed result was produced.
    Failed,
}

impl InvocationState {
    /// Lowercase state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Resolved => "resolved",
            Self::Validated => "validated",
            Self::Executing => "executing",
            Self::Projected => "projected",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Returns `true` for `Completed` and `Failed`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether `next` may follow `self`.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Received, Self::Resolved)
            | (Self::Resolved, Self::Validated)
            | (Self::Validated, Self::Executing)
            | (Self::Executing, Self::Projected)
            | (Self::Projected, Self::Completed) => true,
            (current, Self::Failed) => !current.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for InvocationState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Tracks one invocation through its states.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    command: String,
    state: InvocationState,
}

impl Lifecycle {
    pub(crate) fn new(command: &str) -> Self {
        tracing::trace!(
            target: DISPATCH_TARGET,
            command,
            state = %InvocationState::Received,
            "invocation received"
        );
        Self {
            command: command.to_owned(),
            state: InvocationState::Received,
        }
    }

    #[cfg(test)]
    pub(crate) const fn state(&self) -> InvocationState {
        self.state
    }

    pub(crate) fn advance(&mut self, next: InvocationState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal invocation transition {} -> {}",
            self.state,
            next
        );
        tracing::trace!(
            target: DISPATCH_TARGET,
            command = %self.command,
            from = %self.state,
            to = %next,
            "invocation state changed"
        );
        self.state = next;
    }

    pub(crate) fn fail(&mut self) {
        self.advance(InvocationState::Failed);
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::InvocationState::{
        Completed, Executing, Failed, Projected, Received, Resolved, Validated,
    };
    use super::*;

    #[rstest]
    #[case(Received, Resolved)]
    #[case(Resolved, Validated)]
    #[case(Validated, Executing)]
    #[case(Executing, Projected)]
    #[case(Projected, Completed)]
    fn forward_path_is_legal(#[case] from: InvocationState, #[case] to: InvocationState) {
        assert!(from.can_advance_to(to));
    }

    #[rstest]
    #[case(Received)]
    #[case(Resolved)]
    #[case(Validated)]
    #[case(Executing)]
    #[case(Projected)]
    fn any_live_state_may_fail(#[case] from: InvocationState) {
        assert!(from.can_advance_to(Failed));
    }

    #[rstest]
    #[case(Received, Executing)]
    #[case(Resolved, Projected)]
    #[case(Completed, Failed)]
    #[case(Failed, Failed)]
    #[case(Failed, Completed)]
    fn skips_and_terminal_exits_are_illegal(
        #[case] from: InvocationState,
        #[case] to: InvocationState,
    ) {
        assert!(!from.can_advance_to(to));
    }

    #[test]
    fn lifecycle_follows_transitions() {
        let mut lifecycle = Lifecycle::new("atl_get_issue");
        lifecycle.advance(Resolved);
        lifecycle.fail();
        assert_eq!(lifecycle.state(), Failed);
    }

    #[test]
    #[should_panic(expected = "illegal invocation transition")]
    #[cfg(debug_assertions)]
    fn illegal_transition_trips_the_assertion() {
        let mut lifecycle = Lifecycle::new("atl_get_issue");
        lifecycle.advance(Completed);
    }
}
