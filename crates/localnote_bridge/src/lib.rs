use std::sync::Arc;

use anyhow::Result;
use localnote_core::{
    NotificationId, NotificationRequest, PluginResult, QueuedChannel, ResultStatus, Scheduler,
    SchedulerBuilder, SchedulerConfig,
};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("malformed arguments: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown action `{0}`")]
    UnknownAction(String),
}

impl BridgeError {
    fn into_result(self) -> PluginResult {
        let status = match &self {
            BridgeError::MissingArgument(_) | BridgeError::Json(_) => ResultStatus::JsonException,
            BridgeError::UnknownAction(_) => ResultStatus::InvalidAction,
        };
        PluginResult::failure(status, self.to_string())
    }
}

/// Commands the host can invoke, by their wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Add,
    Cancel,
    CancelAll,
    IsScheduled,
    GetScheduledIds,
    IsTriggered,
    GetTriggeredIds,
    DeviceReady,
    Pause,
    Resume,
}

impl Action {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "add" => Self::Add,
            "cancel" => Self::Cancel,
            "cancelAll" => Self::CancelAll,
            "isScheduled" => Self::IsScheduled,
            "getScheduledIds" => Self::GetScheduledIds,
            "isTriggered" => Self::IsTriggered,
            "getTriggeredIds" => Self::GetTriggeredIds,
            "deviceready" => Self::DeviceReady,
            "pause" => Self::Pause,
            "resume" => Self::Resume,
            _ => return None,
        })
    }
}

/// Host-facing command layer over a [`Scheduler`].
///
/// Arguments arrive as a JSON array whose first element is the options
/// object, a string holding it, or a notification ID. Lifecycle events raised
/// while a command runs are queued until the host calls
/// [`CommandBridge::take_events`].
pub struct CommandBridge {
    scheduler: Scheduler,
    events: Arc<QueuedChannel>,
}

impl CommandBridge {
    pub fn new(builder: SchedulerBuilder) -> Self {
        let events = Arc::new(QueuedChannel::new());
        let scheduler = builder.with_channel(events.clone()).build();
        Self { scheduler, events }
    }

    pub fn from_env() -> Result<Self> {
        let config = SchedulerConfig::from_env()?;
        Ok(Self::new(Scheduler::builder().with_config(config)))
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn take_events(&self) -> Vec<PluginResult> {
        self.events.drain()
    }

    pub fn execute(&self, action: &str, json_args: &str) -> PluginResult {
        match self.try_execute(action, json_args) {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(action, %err, "notification command rejected");
                err.into_result()
            }
        }
    }

    pub fn on_pause(&self) {
        self.scheduler.on_app_became_inactive();
    }

    pub fn on_resume(&self) {
        self.scheduler.on_app_became_active();
    }

    fn try_execute(&self, action: &str, json_args: &str) -> Result<PluginResult, BridgeError> {
        let parsed =
            Action::parse(action).ok_or_else(|| BridgeError::UnknownAction(action.to_string()))?;
        tracing::debug!(action, "notification command");

        let result = match parsed {
            Action::Add => {
                let request = parse_request(first_argument(json_args)?)?;
                let outcome = self.scheduler.add(&request);
                tracing::debug!(?outcome, "add finished");
                PluginResult::ok()
            }
            Action::Cancel => {
                let id = parse_id(first_argument(json_args)?)?;
                self.scheduler.cancel(&id);
                PluginResult::ok()
            }
            Action::CancelAll => {
                self.scheduler.cancel_all();
                PluginResult::ok()
            }
            Action::IsScheduled => {
                let id = parse_id(first_argument(json_args)?)?;
                PluginResult::ok_with(self.scheduler.is_scheduled(&id))
            }
            Action::GetScheduledIds => PluginResult::ok_with(json!(self.scheduler.scheduled_ids())),
            Action::IsTriggered => {
                let id = parse_id(first_argument(json_args)?)?;
                PluginResult::ok_with(self.scheduler.is_triggered(&id))
            }
            Action::GetTriggeredIds => PluginResult::ok_with(json!(self.scheduler.triggered_ids())),
            Action::DeviceReady => {
                self.scheduler.mark_device_ready();
                PluginResult::ok()
            }
            Action::Pause => {
                self.on_pause();
                PluginResult::ok()
            }
            Action::Resume => {
                self.on_resume();
                PluginResult::ok()
            }
        };
        Ok(result)
    }
}

fn first_argument(json_args: &str) -> Result<Value, BridgeError> {
    if json_args.trim().is_empty() {
        return Err(BridgeError::MissingArgument("arguments"));
    }
    match serde_json::from_str::<Value>(json_args)? {
        Value::Array(mut args) => {
            if args.is_empty() {
                Err(BridgeError::MissingArgument("first argument"))
            } else {
                Ok(args.swap_remove(0))
            }
        }
        other => Ok(other),
    }
}

fn parse_request(arg: Value) -> Result<NotificationRequest, BridgeError> {
    match arg {
        Value::String(raw) => Ok(NotificationRequest::from_json(&raw)?),
        Value::Object(_) => Ok(NotificationRequest::from_value(arg)?),
        _ => Err(BridgeError::MissingArgument("notification options")),
    }
}

fn parse_id(arg: Value) -> Result<NotificationId, BridgeError> {
    match arg {
        Value::Object(mut fields) => {
            let id = fields.remove("id").ok_or(BridgeError::MissingArgument("id"))?;
            Ok(serde_json::from_value(id)?)
        }
        Value::Null => Err(BridgeError::MissingArgument("id")),
        other => Ok(serde_json::from_value(other)?),
    }
}

static BRIDGE: Lazy<RwLock<Option<CommandBridge>>> = Lazy::new(|| RwLock::new(None));

/// Makes `bridge` the process-wide instance behind [`exec`].
pub fn install(bridge: CommandBridge) {
    *BRIDGE.write() = Some(bridge);
}

pub fn exec(action: &str, json_args: &str) -> PluginResult {
    match BRIDGE.read().as_ref() {
        Some(bridge) => bridge.execute(action, json_args),
        None => PluginResult::failure(ResultStatus::Error, "notification bridge is not installed"),
    }
}

pub fn take_events() -> Vec<PluginResult> {
    BRIDGE
        .read()
        .as_ref()
        .map(CommandBridge::take_events)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwraps_cordova_argument_shapes() {
        let from_string =
            parse_request(first_argument(r#"["{\"id\":3,\"title\":\"a\"}"]"#).unwrap()).unwrap();
        let from_object =
            parse_request(first_argument(r#"[{"id":"3","title":"a"}]"#).unwrap()).unwrap();
        assert_eq!(from_string.id, from_object.id);
        assert_eq!(from_string.title, "a");

        assert_eq!(parse_id(first_argument(r#"["12"]"#).unwrap()).unwrap().as_str(), "12");
        assert_eq!(parse_id(first_argument("[12]").unwrap()).unwrap().as_str(), "12");
        assert_eq!(parse_id(first_argument(r#"{"id":4}"#).unwrap()).unwrap().as_str(), "4");
    }

    #[test]
    fn rejects_malformed_arguments() {
        assert!(matches!(first_argument("[]"), Err(BridgeError::MissingArgument(_))));
        assert!(matches!(first_argument(""), Err(BridgeError::MissingArgument(_))));
        assert!(matches!(first_argument("[oops"), Err(BridgeError::Json(_))));
        assert!(parse_request(Value::Bool(true)).is_err());
        assert!(parse_id(Value::Null).is_err());
    }

    #[test]
    fn global_bridge_requires_install() {
        assert_eq!(exec("cancelAll", "[]").status, ResultStatus::Error);
        assert!(take_events().is_empty());

        install(CommandBridge::new(Scheduler::builder()));
        assert!(exec("cancelAll", "[]").is_ok());
        assert!(exec("add", r#"[{"id":1,"date":4102444800}]"#).is_ok());
        assert_eq!(take_events().len(), 2);
    }
}
