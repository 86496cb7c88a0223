//! Shared wire types for the Atlassian command server.
//!
//! The types in this crate are plain data: they carry no handles, locks, or
//! live error objects, so every value can cross the transport boundary as
//! JSON. The server crate builds its dispatch pipeline on top of them and
//! clients may depend on this crate alone to speak the protocol.

mod envelope;
mod error_type;
mod field;
mod product;
mod result;

pub use envelope::CommandEnvelope;
pub use error_type::ErrorType;
pub use field::{Field, IsEmpty};
pub use product::{Product, ProductParseError};
pub use result::{CauseRecord, Failure, ToolResult};
