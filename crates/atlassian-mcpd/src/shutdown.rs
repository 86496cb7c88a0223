//! Termination signal forwarding.

use std::io;
use std::thread::JoinHandle;

use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};
use thiserror::Error;
use tokio::sync::mpsc;

const SHUTDOWN_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::shutdown");

/// Errors reported by the shutdown listener.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The forwarding thread could not be spawned.
    #[error("failed to spawn the signal thread: {source}")]
    Spawn {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Forwards `SIGINT` and `SIGTERM` into an async channel.
///
/// Signals are read on a dedicated thread that dropping the listener stops.
#[derive(Debug)]
pub struct ShutdownListener {
    handle: Handle,
    thread: Option<JoinHandle<()>>,
    receiver: Option<mpsc::Receiver<i32>>,
}

impl ShutdownListener {
    /// Registers the handlers and starts forwarding.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError`] when the handlers or the thread cannot be
    /// set up.
    pub fn install() -> Result<Self, ShutdownError> {
        let mut signals =
            Signals::new([SIGINT, SIGTERM]).map_err(|source| ShutdownError::Install { source })?;
        let handle = signals.handle();
        let (sender, receiver) = mpsc::channel(4);
        let thread = std::thread::Builder::new()
            .name("signal-forwarder".to_owned())
            .spawn(move || {
                for signal in signals.forever() {
                    tracing::info!(target: SHUTDOWN_TARGET, signal, "termination signal received");
                    if sender.blocking_send(signal).is_err() {
                        break;
                    }
                }
            })
            .map_err(|source| ShutdownError::Spawn { source })?;
        Ok(Self {
            handle,
            thread: Some(thread),
            receiver: Some(receiver),
        })
    }

    /// Takes the receiving end. Later calls return `None`.
    pub fn receiver(&mut self) -> Option<mpsc::Receiver<i32>> {
        self.receiver.take()
    }
}

impl Drop for ShutdownListener {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!(target: SHUTDOWN_TARGET, "signal thread panicked");
            }
        }
    }
}
