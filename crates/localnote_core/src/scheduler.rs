use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::instrument;

use crate::{
    config::SchedulerConfig,
    error::SchedulerError,
    events::{CallbackChannel, EventEmitter, LifecycleEvent, QueuedChannel},
    facility::{MemoryFacility, SchedulingFacility},
    record::{LifecycleState, NotificationKind, NotificationRecord},
    registry::Registry,
    report::{ErrorReporter, TracingReporter},
    request::{NotificationId, NotificationRequest},
    state::StateReporter,
    tile::{MemoryTile, PresentationSurface, TileData},
    time::{self, Clock, SystemClock},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ScheduleStatus {
    Scheduled {
        kind: NotificationKind,
        fire_at: DateTime<Local>,
    },
    /// Nothing was registered; `reason` is the code of the swallowed error.
    Skipped { reason: &'static str },
}

/// What `add` did. The call itself never fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddOutcome {
    pub id: NotificationId,
    #[serde(flatten)]
    pub status: ScheduleStatus,
}

impl AddOutcome {
    pub fn is_scheduled(&self) -> bool {
        matches!(self.status, ScheduleStatus::Scheduled { .. })
    }

    pub fn fire_at(&self) -> Option<DateTime<Local>> {
        match self.status {
            ScheduleStatus::Scheduled { fire_at, .. } => Some(fire_at),
            ScheduleStatus::Skipped { .. } => None,
        }
    }
}

/// Turns notification requests into tile updates, facility registrations and
/// lifecycle events.
///
/// Every public operation completes from the caller's point of view. Side
/// effects that fail are reported through the [`ErrorReporter`] and skipped;
/// the tile update of an `add` is never rolled back because registration
/// failed.
pub struct Scheduler {
    config: SchedulerConfig,
    clock: Arc<dyn Clock>,
    registry: Registry,
    surface: Arc<dyn PresentationSurface>,
    emitter: EventEmitter,
    reporter: Arc<dyn ErrorReporter>,
}

pub struct SchedulerBuilder {
    config: SchedulerConfig,
    clock: Option<Arc<dyn Clock>>,
    facility: Option<Arc<dyn SchedulingFacility>>,
    surface: Option<Arc<dyn PresentationSurface>>,
    channel: Option<Arc<dyn CallbackChannel>>,
    state: Option<Arc<StateReporter>>,
    reporter: Option<Arc<dyn ErrorReporter>>,
}

impl SchedulerBuilder {
    pub fn new() -> Self {
        Self {
            config: SchedulerConfig::default(),
            clock: None,
            facility: None,
            surface: None,
            channel: None,
            state: None,
            reporter: None,
        }
    }

    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_kind(mut self, kind: NotificationKind) -> Self {
        self.config.kind = kind;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_facility(mut self, facility: Arc<dyn SchedulingFacility>) -> Self {
        self.facility = Some(facility);
        self
    }

    pub fn with_surface(mut self, surface: Arc<dyn PresentationSurface>) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn with_channel(mut self, channel: Arc<dyn CallbackChannel>) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn with_state(mut self, state: Arc<StateReporter>) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn build(self) -> Scheduler {
        let facility = self
            .facility
            .unwrap_or_else(|| Arc::new(MemoryFacility::new()));
        let state = self.state.unwrap_or_else(|| Arc::new(StateReporter::new()));
        let channel = self
            .channel
            .unwrap_or_else(|| Arc::new(QueuedChannel::new()));
        Scheduler {
            config: self.config,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            registry: Registry::new(facility),
            surface: self.surface.unwrap_or_else(|| Arc::new(MemoryTile::new())),
            emitter: EventEmitter::new(state, channel),
            reporter: self.reporter.unwrap_or_else(|| Arc::new(TracingReporter)),
        }
    }
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::new()
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn state(&self) -> &Arc<StateReporter> {
        self.emitter.state()
    }

    #[instrument(skip(self, request), fields(id = %request.id))]
    pub fn add(&self, request: &NotificationRequest) -> AddOutcome {
        if let Err(err) = self.surface.update(&TileData::from_request(request)) {
            self.reporter.report(&SchedulerError::from(err), "add: tile update");
        }

        let status = match self.build_record(request) {
            Ok(record) => self.register(record),
            Err(err) => {
                self.reporter.report(&err, "add: schedule");
                ScheduleStatus::Skipped { reason: err.code() }
            }
        };

        let payload = request.payload();
        self.emitter
            .emit_event(LifecycleEvent::Trigger, &request.id, &payload);
        self.emitter
            .emit_event(LifecycleEvent::Add, &request.id, &payload);

        AddOutcome {
            id: request.id.clone(),
            status,
        }
    }

    /// Clears the whole tile, not just this notification's share of it.
    #[instrument(skip(self))]
    pub fn cancel(&self, id: &NotificationId) {
        self.cancel_all();
        self.emitter.emit_event(LifecycleEvent::Cancel, id, "");
        match self.registry.remove(id) {
            Ok(true) => tracing::info!(%id, "notification cancelled"),
            Ok(false) => {}
            Err(source) => self.reporter.report(
                &SchedulerError::Removal {
                    id: id.clone(),
                    source,
                },
                "cancel",
            ),
        }
    }

    #[instrument(skip(self))]
    pub fn cancel_all(&self) {
        if let Err(err) = self.surface.reset(&TileData::cleared(&self.config.tile)) {
            self.reporter.report(&SchedulerError::from(err), "cancel_all: tile reset");
        }

        let report = self.registry.clear();
        if let Some(source) = report.enumeration {
            self.reporter
                .report(&SchedulerError::Enumeration(source), "cancel_all");
        }
        for (id, source) in report.failures {
            self.reporter
                .report(&SchedulerError::Removal { id, source }, "cancel_all");
        }
        tracing::info!(removed = report.removed.len(), "cleared all notifications");
    }

    pub fn is_scheduled(&self, id: &NotificationId) -> bool {
        self.state_of(id) == Some(LifecycleState::Pending)
    }

    pub fn scheduled_ids(&self) -> Vec<NotificationId> {
        self.ids_in(LifecycleState::Pending)
    }

    pub fn is_triggered(&self, id: &NotificationId) -> bool {
        self.state_of(id) == Some(LifecycleState::Fired)
    }

    pub fn triggered_ids(&self) -> Vec<NotificationId> {
        self.ids_in(LifecycleState::Fired)
    }

    pub fn on_app_became_active(&self) {
        self.state().on_activated();
    }

    pub fn on_app_became_inactive(&self) {
        self.state().on_deactivated();
    }

    pub fn mark_device_ready(&self) {
        self.state().mark_device_ready();
    }
}

impl Scheduler {
    fn build_record(
        &self,
        request: &NotificationRequest,
    ) -> Result<NotificationRecord, SchedulerError> {
        let now = self.clock.now();
        match self.config.kind {
            NotificationKind::Reminder => {
                let Some(date) = request.date else {
                    return Err(SchedulerError::InvalidRequest {
                        id: request.id.clone(),
                        reason: "reminders need a `date`".to_string(),
                    });
                };
                let fire_at = time::to_local(date);
                if fire_at < now {
                    return Err(SchedulerError::PastScheduleTime {
                        id: request.id.clone(),
                        fire_at,
                        now,
                    });
                }
                Ok(NotificationRecord::reminder(
                    request.id.clone(),
                    request.title.clone(),
                    request.message.clone(),
                    fire_at,
                    self.config.landing_uri.clone(),
                ))
            }
            NotificationKind::Alarm => {
                let fire_at = now.checked_add_signed(self.config.alarm_lead).ok_or_else(|| {
                    SchedulerError::InvalidRequest {
                        id: request.id.clone(),
                        reason: format!(
                            "alarm lead of {}s overflows the calendar",
                            self.config.alarm_lead.num_seconds()
                        ),
                    }
                })?;
                Ok(NotificationRecord::alarm(
                    request.id.clone(),
                    request.message.clone(),
                    fire_at,
                ))
            }
        }
    }

    fn register(&self, record: NotificationRecord) -> ScheduleStatus {
        let id = record.id.clone();
        let kind = record.kind;
        let fire_at = record.fire_at;
        match self.registry.upsert(record) {
            Ok(()) => {
                tracing::info!(%id, ?kind, %fire_at, "notification registered");
                ScheduleStatus::Scheduled { kind, fire_at }
            }
            Err(source) => {
                let err = SchedulerError::OsRegistration { id, source };
                self.reporter.report(&err, "add: register");
                ScheduleStatus::Skipped { reason: err.code() }
            }
        }
    }

    fn state_of(&self, id: &NotificationId) -> Option<LifecycleState> {
        match self.registry.find(id) {
            Ok(record) => record.map(|record| record.state_at(self.clock.now())),
            Err(source) => {
                self.reporter
                    .report(&SchedulerError::Enumeration(source), "query");
                None
            }
        }
    }

    fn ids_in(&self, state: LifecycleState) -> Vec<NotificationId> {
        let now = self.clock.now();
        match self.registry.list_all() {
            Ok(records) => records
                .into_iter()
                .filter(|record| record.state_at(now) == state)
                .map(|record| record.id)
                .collect(),
            Err(source) => {
                self.reporter
                    .report(&SchedulerError::Enumeration(source), "query");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::report::MemoryReporter;
    use crate::time::ManualClock;

    const NOW: f64 = 1_700_000_000.0;

    fn scheduler(kind: NotificationKind) -> (Scheduler, Arc<ManualClock>, Arc<MemoryReporter>) {
        let clock = Arc::new(ManualClock::at_epoch(NOW));
        let reporter = Arc::new(MemoryReporter::new());
        let scheduler = Scheduler::builder()
            .with_kind(kind)
            .with_clock(clock.clone())
            .with_reporter(reporter.clone())
            .build();
        (scheduler, clock, reporter)
    }

    #[test]
    fn reminder_is_scheduled_at_requested_time() {
        let (scheduler, _, reporter) = scheduler(NotificationKind::Reminder);
        let outcome = scheduler.add(
            &NotificationRequest::new(1)
                .with_title("Standup")
                .with_message("in five minutes")
                .with_date(NOW + 300.0),
        );

        assert!(outcome.is_scheduled());
        assert_eq!(outcome.fire_at(), Some(time::to_local(NOW + 300.0)));
        let record = scheduler.registry().find(&"1".into()).unwrap().unwrap();
        assert_eq!(record.navigation.as_deref(), Some("/MainPage.xaml"));
        assert_eq!(record.content.title.as_deref(), Some("Standup"));
        assert!(reporter.entries().is_empty());
    }

    #[test]
    fn reminder_at_exactly_now_is_accepted() {
        let (scheduler, _, _) = scheduler(NotificationKind::Reminder);
        let outcome = scheduler.add(&NotificationRequest::new(1).with_date(NOW));
        assert!(outcome.is_scheduled());
    }

    #[test]
    fn reminder_without_date_is_skipped() {
        let (scheduler, _, reporter) = scheduler(NotificationKind::Reminder);
        let outcome = scheduler.add(&NotificationRequest::new(1).with_title("no date"));
        assert_eq!(
            outcome.status,
            ScheduleStatus::Skipped {
                reason: "INVALID_REQUEST"
            }
        );
        assert_eq!(reporter.codes(), ["INVALID_REQUEST"]);
    }

    #[test]
    fn queries_follow_the_clock() {
        let (scheduler, clock, _) = scheduler(NotificationKind::Reminder);
        scheduler.add(&NotificationRequest::new(1).with_date(NOW + 60.0));
        scheduler.add(&NotificationRequest::new(2).with_date(NOW + 600.0));

        assert!(scheduler.is_scheduled(&"1".into()));
        assert!(!scheduler.is_triggered(&"1".into()));
        assert_eq!(scheduler.scheduled_ids().len(), 2);
        assert!(scheduler.triggered_ids().is_empty());

        clock.advance(Duration::seconds(120));
        assert!(scheduler.is_triggered(&"1".into()));
        assert_eq!(scheduler.triggered_ids(), vec![NotificationId::from(1)]);
        assert_eq!(scheduler.scheduled_ids(), vec![NotificationId::from(2)]);
        assert!(!scheduler.is_scheduled(&"missing".into()));
    }

    #[test]
    fn outcome_serializes_flat() {
        let (scheduler, _, _) = scheduler(NotificationKind::Alarm);
        let outcome = scheduler.add(&NotificationRequest::new(4));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["id"], "4");
        assert_eq!(json["status"], "scheduled");
        assert_eq!(json["kind"], "alarm");
    }

    #[test]
    fn alarm_lead_past_the_calendar_is_skipped() {
        let clock = Arc::new(ManualClock::at_epoch(NOW));
        let reporter = Arc::new(MemoryReporter::new());
        let mut config = SchedulerConfig::default().with_kind(NotificationKind::Alarm);
        config.alarm_lead = Duration::seconds(9_000_000_000_000);
        let scheduler = Scheduler::builder()
            .with_config(config)
            .with_clock(clock)
            .with_reporter(reporter.clone())
            .build();

        let outcome = scheduler.add(&NotificationRequest::new(5));
        assert_eq!(
            outcome.status,
            ScheduleStatus::Skipped {
                reason: "INVALID_REQUEST"
            }
        );
        assert_eq!(reporter.codes(), ["INVALID_REQUEST"]);
        assert!(scheduler.registry().list_all().unwrap().is_empty());
    }
}
