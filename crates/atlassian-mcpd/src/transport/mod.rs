//! JSONL transport over standard input and output.
//!
//! Every line a client writes is one [`ClientMessage`]; every line the server
//! writes is one [`ServerMessage`]. Invocations run concurrently and their
//! log, progress and result messages are multiplexed onto a single writer,
//! each tagged with the invocation id. A line the server cannot read still
//! gets a `validation_error` result, with a `null` id when none was
//! recoverable.

mod errors;
mod request;
mod response;
mod session;

pub use errors::DispatchError;
pub use request::{ClientMessage, InvokeRequest, RejectedInvoke, recover_id};
pub use response::{ChannelSink, ServerMessage, write_messages};
pub use session::{MAX_LINE_BYTES, OUTBOUND_CAPACITY, SessionEnd, serve};

/// Tracing target for transport operations.
pub(crate) const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
