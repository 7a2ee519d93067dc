use chrono::{DateTime, Local};
use thiserror::Error;

use crate::request::NotificationId;

/// Failures raised by a [`crate::facility::SchedulingFacility`].
#[derive(Debug, Error)]
pub enum FacilityError {
    #[error("facility rejected the request: {0}")]
    Rejected(String),

    #[error("a notification with id `{0}` is already registered")]
    Duplicate(NotificationId),

    #[error("facility storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("facility serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Failures raised by a [`crate::tile::PresentationSurface`].
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("no application tile is available")]
    Unavailable,

    #[error("tile update rejected: {0}")]
    Rejected(String),
}

/// Everything the scheduler can swallow. None of these reach the caller as a
/// failed operation; they are routed through an
/// [`crate::report::ErrorReporter`].
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("notification `{id}` scheduled in the past ({fire_at}, now {now})")]
    PastScheduleTime {
        id: NotificationId,
        fire_at: DateTime<Local>,
        now: DateTime<Local>,
    },

    #[error("notification `{id}` is not schedulable: {reason}")]
    InvalidRequest { id: NotificationId, reason: String },

    #[error("unable to register notification `{id}`: {source}")]
    OsRegistration {
        id: NotificationId,
        #[source]
        source: FacilityError,
    },

    #[error("unable to remove notification `{id}`: {source}")]
    Removal {
        id: NotificationId,
        #[source]
        source: FacilityError,
    },

    #[error("unable to enumerate scheduled notifications: {0}")]
    Enumeration(#[source] FacilityError),

    #[error("unable to update the application tile: {0}")]
    Surface(#[from] SurfaceError),
}

impl SchedulerError {
    /// Short stable code, used in logs and the simulator's result log.
    pub fn code(&self) -> &'static str {
        match self {
            SchedulerError::PastScheduleTime { .. } => "PAST_SCHEDULE_TIME",
            SchedulerError::InvalidRequest { .. } => "INVALID_REQUEST",
            SchedulerError::OsRegistration { .. } => "OS_REGISTRATION_FAILURE",
            SchedulerError::Removal { .. } => "REMOVAL_FAILURE",
            SchedulerError::Enumeration(_) => "ENUMERATION_FAILURE",
            SchedulerError::Surface(_) => "SURFACE_FAILURE",
        }
    }
}
