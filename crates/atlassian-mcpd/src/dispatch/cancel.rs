//! Cancellation tokens for in-flight invocations.

use tokio::sync::watch;

/// Creates a linked handle and token.
#[must_use]
pub fn cancellation_pair() -> (CancelHandle, Cancellation) {
    let (sender, receiver) = watch::channel(false);
    (
        CancelHandle { sender },
        Cancellation {
            receiver: Some(receiver),
        },
    )
}

/// Requests cancellation of one invocation.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    /// Signals the linked [`Cancellation`]. Repeated calls are harmless.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

/// Observed by the dispatcher while a handler runs.
#[derive(Debug, Clone)]
pub struct Cancellation {
    receiver: Option<watch::Receiver<bool>>,
}

impl Cancellation {
    /// A token that never fires.
    #[must_use]
    pub const fn never() -> Self {
        Self { receiver: None }
    }

    /// Returns `true` once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.receiver
            .as_ref()
            .is_some_and(|receiver| *receiver.borrow())
    }

    /// Resolves when cancellation is requested. A dropped handle never
    /// cancels.
    pub async fn cancelled(&mut self) {
        let Some(receiver) = self.receiver.as_mut() else {
            return std::future::pending().await;
        };
        let outcome = receiver.wait_for(|cancelled| *cancelled).await.map(drop);
        if outcome.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn fires_after_cancel() {
        let (handle, mut token) = cancellation_pair();
        assert!(!token.is_cancelled());
        handle.cancel();
        handle.cancel();
        tokio::time::timeout(Duration::from_secs(1), token.cancelled())
            .await
            .expect("token should fire");
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn dropped_handle_never_fires() {
        let (handle, mut token) = cancellation_pair();
        drop(handle);
        let waited = tokio::time::timeout(Duration::from_millis(20), token.cancelled()).await;
        assert!(waited.is_err(), "dropped handle must not cancel");
    }

    #[tokio::test]
    async fn never_token_stays_quiet() {
        let mut token = Cancellation::never();
        let waited = tokio::time::timeout(Duration::from_millis(20), token.cancelled()).await;
        assert!(waited.is_err());
        assert!(!token.is_cancelled());
    }
}
