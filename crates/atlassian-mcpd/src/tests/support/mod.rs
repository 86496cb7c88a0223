//! Test harness utilities shared by unit and behaviour suites.

mod backend;
mod buffer;
mod config_loader;
mod reporter;
mod sink;
mod world;

pub use backend::FakeBackend;
pub use buffer::SharedBuffer;
pub use config_loader::{TEST_INSTANCE, TestConfigLoader};
pub use reporter::HealthEvent;
pub use sink::RecordingSink;
pub use world::{BootstrapWorld, DispatchWorld, instance, quiet_router, tool};
