//! Test double for [`ProgressSink`] that records caller-visible events.

use std::sync::Mutex;

use atlassian_config::LogLevel;

use crate::telemetry::{CallerEvent, ProgressSink};

/// Records every delivered event.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<CallerEvent>>,
}

impl RecordingSink {
    /// Snapshot of delivered events.
    #[must_use]
    pub fn events(&self) -> Vec<CallerEvent> {
        self.events.lock().expect("sink mutex poisoned").clone()
    }

    /// Messages of delivered log events.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                CallerEvent::Log { message, .. } => Some(message),
                CallerEvent::Progress { .. } => None,
            })
            .collect()
    }

    /// Messages of delivered log events at `level`.
    #[must_use]
    pub fn messages_at(&self, level: LogLevel) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                CallerEvent::Log {
                    level: delivered,
                    message,
                    ..
                } if delivered == level => Some(message),
                _ => None,
            })
            .collect()
    }

    /// Delivered progress events as `(progress, total)` pairs.
    #[must_use]
    pub fn progress(&self) -> Vec<(u64, Option<u64>)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                CallerEvent::Progress {
                    progress, total, ..
                } => Some((progress, total)),
                CallerEvent::Log { .. } => None,
            })
            .collect()
    }
}

impl ProgressSink for RecordingSink {
    fn deliver(&self, event: CallerEvent) {
        self.events.lock().expect("sink mutex poisoned").push(event);
    }
}
