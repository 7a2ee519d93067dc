use std::fmt;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppLifecycleState {
    #[default]
    Foreground,
    Background,
}

impl AppLifecycleState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Foreground => "foreground",
            Self::Background => "background",
        }
    }
}

impl fmt::Display for AppLifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default)]
struct Flags {
    lifecycle: AppLifecycleState,
    device_ready: bool,
}

/// Tracks whether the app is in front of the user and whether the host has
/// signalled readiness. Shared between the scheduler and the event emitter.
#[derive(Debug, Default)]
pub struct StateReporter {
    flags: RwLock<Flags>,
}

impl StateReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_activated(&self) {
        self.transition(AppLifecycleState::Foreground);
    }

    pub fn on_deactivated(&self) {
        self.transition(AppLifecycleState::Background);
    }

    pub fn current(&self) -> AppLifecycleState {
        self.flags.read().lifecycle
    }

    pub fn mark_device_ready(&self) {
        self.flags.write().device_ready = true;
    }

    pub fn is_device_ready(&self) -> bool {
        self.flags.read().device_ready
    }

    fn transition(&self, next: AppLifecycleState) {
        let mut flags = self.flags.write();
        if flags.lifecycle != next {
            tracing::debug!(from = %flags.lifecycle, to = %next, "app state changed");
        }
        flags.lifecycle = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_foreground_and_follows_signals() {
        let reporter = StateReporter::new();
        assert_eq!(reporter.current(), AppLifecycleState::Foreground);
        assert!(!reporter.is_device_ready());

        reporter.on_deactivated();
        assert_eq!(reporter.current().as_str(), "background");
        reporter.on_deactivated();
        assert_eq!(reporter.current(), AppLifecycleState::Background);

        reporter.on_activated();
        assert_eq!(reporter.current().to_string(), "foreground");

        reporter.mark_device_ready();
        assert!(reporter.is_device_ready());
    }
}
