pub mod config;
pub mod error;
pub mod events;
pub mod facility;
pub mod record;
pub mod registry;
pub mod report;
pub mod request;
pub mod scheduler;
pub mod state;
pub mod tile;
pub mod time;

pub use crate::config::SchedulerConfig;
pub use crate::error::{FacilityError, SchedulerError, SurfaceError};
pub use crate::events::{
    CallbackChannel, EventEmitter, LifecycleEvent, PluginResult, QueuedChannel, ResultStatus,
};
pub use crate::facility::{JsonFileFacility, MemoryFacility, SchedulingFacility};
pub use crate::record::{LifecycleState, NotificationKind, NotificationRecord};
pub use crate::registry::{ClearReport, Registry};
pub use crate::report::{ErrorReporter, MemoryReporter, ReportEntry, TracingReporter};
pub use crate::request::{NotificationId, NotificationRequest};
pub use crate::scheduler::{AddOutcome, ScheduleStatus, Scheduler, SchedulerBuilder};
pub use crate::state::{AppLifecycleState, StateReporter};
pub use crate::tile::{ImageRef, MemoryTile, PresentationSurface, TileData, TileDefaults, TileFace};
pub use crate::time::{Clock, ManualClock, SystemClock};
