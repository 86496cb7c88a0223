//! Command dispatch.
//!
//! Each invocation walks a fixed state machine:
//!
//! ```text
//! Received -> Resolved -> Validated -> Executing -> Projected -> Completed
//!     \__________\___________\____________\____________\______-> Failed
//! ```
//!
//! The [`Dispatcher`] resolves the command in the frozen registry, checks the
//! product, applies the command's subject policy and parameter specs, runs
//! the handler in its own task under a timeout and a cancellation token, and
//! projects the success payload. Whatever happens, the caller gets exactly
//! one [`ToolResult`](atlassian_mcp_types::ToolResult): faults, panics,
//! timeouts and cancellation are all converted at this boundary.

mod cancel;
mod dispatcher;
mod errors;
mod handler;
mod state;
mod validate;

pub use cancel::{CancelHandle, Cancellation, cancellation_pair};
pub use dispatcher::{DispatchRequest, Dispatcher};
pub use errors::InvocationError;
pub use handler::{CommandContext, CommandHandler, Subject};
pub use state::InvocationState;

#[cfg(test)]
pub(crate) use handler::MockCommandHandler;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
