use anyhow::Result;
use chrono::Duration;
use tracing::warn;

use crate::record::NotificationKind;
use crate::tile::TileDefaults;

pub const DEFAULT_LANDING_URI: &str = "/MainPage.xaml";
pub const DEFAULT_ALARM_LEAD_SECS: i64 = 60;

/// Process-wide scheduling settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Kind of record new requests produce. Existing records keep theirs.
    pub kind: NotificationKind,
    /// Alarms ignore the requested time and fire this long after "now".
    pub alarm_lead: Duration,
    /// Page a reminder opens when tapped.
    pub landing_uri: String,
    pub tile: TileDefaults,
}

impl SchedulerConfig {
    /// Reads `LOCALNOTE_*` variables. A value that does not parse is logged
    /// and the default kept, so this never fails in practice.
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_vars(|key| std::env::var(key).ok()))
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(kind) = var("LOCALNOTE_KIND") {
            match NotificationKind::parse(&kind) {
                Some(kind) => config.kind = kind,
                None => warn!(value = %kind, "LOCALNOTE_KIND is not `reminder` or `alarm`, ignoring"),
            }
        }
        if let Some(lead) = var("LOCALNOTE_ALARM_LEAD_SECS") {
            match lead
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|secs| *secs > 0)
                .and_then(Duration::try_seconds)
            {
                Some(lead) => config.alarm_lead = lead,
                None => warn!(value = %lead, "LOCALNOTE_ALARM_LEAD_SECS is not a usable number of seconds, ignoring"),
            }
        }
        if let Some(uri) = var("LOCALNOTE_LANDING_URI") {
            if !uri.trim().is_empty() {
                config.landing_uri = uri.trim().to_string();
            }
        }
        if let Some(image) = var("LOCALNOTE_TILE_IMAGE") {
            config.tile.image = image;
        }
        if let Some(image) = var("LOCALNOTE_TILE_WIDE_IMAGE") {
            config.tile.wide_image = image;
        }
        config
    }

    pub fn with_kind(mut self, kind: NotificationKind) -> Self {
        self.kind = kind;
        self
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            kind: NotificationKind::Reminder,
            alarm_lead: Duration::seconds(DEFAULT_ALARM_LEAD_SECS),
            landing_uri: DEFAULT_LANDING_URI.to_string(),
            tile: TileDefaults::default(),
        }
    }
}
