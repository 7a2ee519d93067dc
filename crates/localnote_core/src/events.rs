use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::request::NotificationId;
use crate::state::StateReporter;

/// Global the host's JavaScript layer exposes for lifecycle callbacks.
pub const HANDLER_NAMESPACE: &str = "window.plugin.notification.local";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResultStatus {
    Ok,
    Error,
    JsonException,
    InvalidAction,
}

/// A command result or event delivered back to the calling layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginResult {
    pub status: ResultStatus,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub message: serde_json::Value,
    /// Keeps the host listening on the same callback after delivery.
    pub keep_callback: bool,
}

impl PluginResult {
    pub fn ok() -> Self {
        Self {
            status: ResultStatus::Ok,
            message: serde_json::Value::Null,
            keep_callback: false,
        }
    }

    pub fn ok_with(message: impl Into<serde_json::Value>) -> Self {
        Self {
            message: message.into(),
            ..Self::ok()
        }
    }

    pub fn failure(status: ResultStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: serde_json::Value::String(message.into()),
            keep_callback: false,
        }
    }

    pub fn keep_callback(mut self) -> Self {
        self.keep_callback = true;
        self
    }

    pub fn is_ok(&self) -> bool {
        self.status == ResultStatus::Ok
    }

    pub fn message_str(&self) -> Option<&str> {
        self.message.as_str()
    }
}

/// Where results and events are handed back to the host.
pub trait CallbackChannel: Send + Sync {
    fn dispatch(&self, result: PluginResult);
}

/// Channel that buffers everything until the host drains it.
#[derive(Debug, Default)]
pub struct QueuedChannel {
    queue: Mutex<VecDeque<PluginResult>>,
}

impl QueuedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<PluginResult> {
        self.queue.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

impl CallbackChannel for QueuedChannel {
    fn dispatch(&self, result: PluginResult) {
        self.queue.lock().push_back(result);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Trigger,
    Add,
    Cancel,
}

impl LifecycleEvent {
    pub fn name(self) -> &'static str {
        match self {
            Self::Trigger => "trigger",
            Self::Add => "add",
            Self::Cancel => "cancel",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Formats lifecycle events as handler invocations and forwards them.
pub struct EventEmitter {
    state: Arc<StateReporter>,
    channel: Arc<dyn CallbackChannel>,
}

impl EventEmitter {
    pub fn new(state: Arc<StateReporter>, channel: Arc<dyn CallbackChannel>) -> Self {
        Self { state, channel }
    }

    pub fn state(&self) -> &Arc<StateReporter> {
        &self.state
    }

    pub fn emit_event(&self, event: LifecycleEvent, id: &NotificationId, payload: &str) {
        self.emit(event.name(), id, payload);
    }

    /// Any event name is accepted and passed through as `on<name>`.
    pub fn emit(&self, event_name: &str, id: &NotificationId, payload: &str) {
        let state = self.state.current();
        let script = format!(
            "{HANDLER_NAMESPACE}.on{event_name}('{}','{}','{}')",
            escape_js(id.as_str()),
            state.as_str(),
            escape_js(payload),
        );
        tracing::debug!(event = event_name, %id, %state, "emitting notification event");
        self.channel
            .dispatch(PluginResult::ok_with(script).keep_callback());
    }
}

/// Escapes text for a single-quoted JavaScript string literal.
fn escape_js(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\u{2028}' => escaped.push_str("\\u2028"),
            '\u{2029}' => escaped.push_str("\\u2029"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emitter() -> (EventEmitter, Arc<StateReporter>, Arc<QueuedChannel>) {
        let state = Arc::new(StateReporter::new());
        let channel = Arc::new(QueuedChannel::new());
        (
            EventEmitter::new(state.clone(), channel.clone()),
            state,
            channel,
        )
    }

    #[test]
    fn formats_handler_invocation() {
        let (emitter, _, channel) = emitter();
        emitter.emit_event(LifecycleEvent::Add, &"5".into(), r#"{"id":"5"}"#);

        let results = channel.drain();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_ok());
        assert!(results[0].keep_callback);
        assert_eq!(
            results[0].message_str(),
            Some(r#"window.plugin.notification.local.onadd('5','foreground','{"id":"5"}')"#)
        );
    }

    #[test]
    fn reads_state_at_emission_time() {
        let (emitter, state, channel) = emitter();
        state.on_deactivated();
        emitter.emit_event(LifecycleEvent::Cancel, &"1".into(), "");
        state.on_activated();
        emitter.emit_event(LifecycleEvent::Cancel, &"1".into(), "");

        let scripts: Vec<String> = channel
            .drain()
            .into_iter()
            .filter_map(|result| result.message_str().map(str::to_string))
            .collect();
        assert!(scripts[0].contains("'background'"));
        assert!(scripts[1].contains("'foreground'"));
    }

    #[test]
    fn passes_unknown_event_names_through() {
        let (emitter, _, channel) = emitter();
        emitter.emit("Click", &"9".into(), "");
        let result = channel.drain().remove(0);
        assert!(result
            .message_str()
            .unwrap()
            .starts_with("window.plugin.notification.local.onClick('9'"));
    }

    #[test]
    fn escapes_quotes_and_backslashes() {
        assert_eq!(escape_js(r#"it's "a\b""#), r#"it\'s "a\\b""#);
        assert_eq!(escape_js("line\nbreak"), "line\\nbreak");
    }
}
