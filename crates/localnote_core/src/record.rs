use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::request::NotificationId;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// One-time notification with a navigation target.
    #[default]
    Reminder,
    /// One-time notification without a navigation target.
    Alarm,
}

impl NotificationKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "reminder" => Some(Self::Reminder),
            "alarm" => Some(Self::Alarm),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Recurrence {
    #[default]
    None,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LifecycleState {
    Pending,
    Fired,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationContent {
    /// Alarms carry no title.
    pub title: Option<String>,
    pub body: String,
}

/// A notification as registered with the scheduling facility.
///
/// Records are never edited after creation; a change is a remove followed by
/// a fresh record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationRecord {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub fire_at: DateTime<Local>,
    pub content: NotificationContent,
    #[serde(default)]
    pub recurrence: Recurrence,
    pub navigation: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    cancelled: bool,
}

impl NotificationRecord {
    pub fn reminder(
        id: NotificationId,
        title: impl Into<String>,
        body: impl Into<String>,
        fire_at: DateTime<Local>,
        navigation: impl Into<String>,
    ) -> Self {
        Self {
            id,
            kind: NotificationKind::Reminder,
            fire_at,
            content: NotificationContent {
                title: Some(title.into()),
                body: body.into(),
            },
            recurrence: Recurrence::None,
            navigation: Some(navigation.into()),
            cancelled: false,
        }
    }

    pub fn alarm(id: NotificationId, body: impl Into<String>, fire_at: DateTime<Local>) -> Self {
        Self {
            id,
            kind: NotificationKind::Alarm,
            fire_at,
            content: NotificationContent {
                title: None,
                body: body.into(),
            },
            recurrence: Recurrence::None,
            navigation: None,
            cancelled: false,
        }
    }

    /// The facility fires records on its own; a record whose time has come is
    /// reported as fired.
    pub fn state_at(&self, now: DateTime<Local>) -> LifecycleState {
        if self.cancelled {
            LifecycleState::Cancelled
        } else if self.fire_at > now {
            LifecycleState::Pending
        } else {
            LifecycleState::Fired
        }
    }

    pub(crate) fn into_cancelled(mut self) -> Self {
        self.cancelled = true;
        self
    }
}
