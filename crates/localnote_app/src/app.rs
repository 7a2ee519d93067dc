use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use localnote_bridge::CommandBridge;
use localnote_core::{
    JsonFileFacility, MemoryFacility, MemoryReporter, MemoryTile, Scheduler, SchedulerConfig,
    SchedulingFacility,
};
use serde_json::json;
use tracing::{debug, info, warn};

/// Settings for the desktop simulator.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Where registrations are persisted; in memory when unset.
    pub(crate) store_path: Option<PathBuf>,
    pub(crate) scheduler: SchedulerConfig,
}

impl AppConfig {
    /// Reads `LOCALNOTE_STORE` plus the scheduler variables. A bad scheduler
    /// value never costs the store path.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(path) = std::env::var("LOCALNOTE_STORE") {
            if !path.trim().is_empty() {
                config.store_path = Some(PathBuf::from(path));
            }
        }
        match SchedulerConfig::from_env() {
            Ok(scheduler) => config.scheduler = scheduler,
            Err(err) => warn!(%err, "invalid scheduler configuration, using defaults"),
        }
        Ok(config)
    }

    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    pub fn with_scheduler(mut self, scheduler: SchedulerConfig) -> Self {
        self.scheduler = scheduler;
        self
    }
}

/// Reads `<action> <json args>` lines and answers each with JSON lines: the
/// command result, then any events and swallowed failures it produced.
/// `tile` prints the current tile face; blank lines and `#` comments are
/// skipped.
pub fn run(config: AppConfig, input: impl BufRead, mut output: impl Write) -> Result<()> {
    let facility: Arc<dyn SchedulingFacility> = match &config.store_path {
        Some(path) => Arc::new(
            JsonFileFacility::open(path)
                .with_context(|| format!("failed to open store {}", path.display()))?,
        ),
        None => Arc::new(MemoryFacility::new()),
    };
    let tile = Arc::new(MemoryTile::new());
    let reporter = Arc::new(MemoryReporter::new());
    let bridge = CommandBridge::new(
        Scheduler::builder()
            .with_config(config.scheduler.clone())
            .with_facility(facility)
            .with_surface(tile.clone())
            .with_reporter(reporter.clone()),
    );
    info!(kind = ?config.scheduler.kind, store = ?config.store_path, "simulator ready");

    for line in input.lines() {
        let line = line.context("failed to read command")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (action, args) = line.split_once(char::is_whitespace).unwrap_or((line, "[]"));
        debug!(action, "simulated command");

        if action == "tile" {
            writeln!(output, "{}", json!({ "tile": tile.face() }))?;
            continue;
        }

        let result = bridge.execute(action, args.trim());
        writeln!(output, "{}", json!({ "action": action, "result": result }))?;
        for event in bridge.take_events() {
            writeln!(output, "{}", json!({ "event": event.message }))?;
        }
        for entry in reporter.take() {
            writeln!(output, "{}", json!({ "report": entry }))?;
        }
    }
    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use localnote_core::NotificationKind;
    use serde_json::Value;
    use tempfile::tempdir;

    fn lines(output: Vec<u8>) -> Vec<Value> {
        String::from_utf8(output)
            .expect("utf8 output")
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect()
    }

    #[test]
    fn runs_a_scripted_session() {
        let script = r#"
# schedule far in the future, then clear
add [{"id":1,"title":"Hello","badge":2,"date":4102444800}]
tile
isScheduled [1]
cancel [1]
add [{"id":2,"date":1}]
"#;
        let mut output = Vec::new();
        run(AppConfig::default(), script.as_bytes(), &mut output).expect("run");
        let out = lines(output);

        assert_eq!(out[0]["action"], "add");
        assert_eq!(out[0]["result"]["status"], "ok");
        assert!(out[1]["event"].as_str().unwrap().contains("ontrigger('1'"));
        assert!(out[2]["event"].as_str().unwrap().contains("onadd('1'"));
        assert_eq!(out[3]["tile"]["count"], 2);
        assert_eq!(out[3]["tile"]["back_title"], "Hello");
        assert_eq!(out[4]["result"]["message"], true);
        assert_eq!(out[5]["action"], "cancel");
        assert!(out[6]["event"].as_str().unwrap().contains("oncancel('1'"));

        let report = out
            .iter()
            .find(|line| line.get("report").is_some())
            .expect("past reminder reported");
        assert_eq!(report["report"]["code"], "PAST_SCHEDULE_TIME");
    }

    #[test]
    fn persists_to_the_configured_store() {
        let temp = tempdir().expect("tempdir");
        let store = temp.path().join("store.json");
        let config = AppConfig::default()
            .with_store_path(&store)
            .with_scheduler(SchedulerConfig::default().with_kind(NotificationKind::Alarm));

        run(config.clone(), "add [{\"id\":7}]\n".as_bytes(), Vec::new()).expect("first run");
        assert!(store.exists());

        let mut output = Vec::new();
        run(config, "getScheduledIds\n".as_bytes(), &mut output).expect("second run");
        let out = lines(output);
        assert_eq!(out[0]["result"]["message"], serde_json::json!(["7"]));
    }

    #[test]
    fn store_path_survives_a_bad_scheduler_value() {
        let temp = tempdir().expect("tempdir");
        let store = temp.path().join("store.json");
        std::env::set_var("LOCALNOTE_STORE", &store);
        std::env::set_var("LOCALNOTE_KIND", "toast");
        let config = AppConfig::from_env().expect("config");
        std::env::remove_var("LOCALNOTE_STORE");
        std::env::remove_var("LOCALNOTE_KIND");

        assert_eq!(config.store_path.as_deref(), Some(store.as_path()));
        assert_eq!(config.scheduler.kind, NotificationKind::Reminder);
    }
}
