use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::FacilityError;
use crate::facility::SchedulingFacility;
use crate::record::{NotificationKind, NotificationRecord};
use crate::request::NotificationId;

/// Outcome of a best-effort sweep over every registration.
#[derive(Debug, Default)]
pub struct ClearReport {
    pub removed: Vec<NotificationId>,
    /// Set when the facility could not be enumerated and the sweep fell back
    /// to the IDs this registry knows.
    pub enumeration: Option<FacilityError>,
    pub failures: Vec<(NotificationId, FacilityError)>,
}

/// Index of active notifications, unique by ID.
///
/// The facility holds the only durable copy. The registry remembers the order
/// in which it registered IDs and reconciles against the facility whenever it
/// lists, so records the OS dropped disappear and records it kept across a
/// restart are adopted.
pub struct Registry {
    facility: Arc<dyn SchedulingFacility>,
    order: Mutex<Vec<NotificationId>>,
}

impl Registry {
    /// Starts out knowing whatever the facility already holds, so a later
    /// sweep still reaches records from an earlier run if enumeration fails.
    pub fn new(facility: Arc<dyn SchedulingFacility>) -> Self {
        let order = match facility.list() {
            Ok(records) => records.into_iter().map(|record| record.id).collect(),
            Err(err) => {
                tracing::warn!(%err, "could not enumerate existing notifications");
                Vec::new()
            }
        };
        Self {
            facility,
            order: Mutex::new(order),
        }
    }

    pub fn facility(&self) -> &Arc<dyn SchedulingFacility> {
        &self.facility
    }

    pub fn find(&self, id: &NotificationId) -> Result<Option<NotificationRecord>, FacilityError> {
        self.facility.find(id)
    }

    pub fn remove(&self, id: &NotificationId) -> Result<bool, FacilityError> {
        Ok(self.take(id)?.is_some())
    }

    /// Removes a registration and hands back the record, marked cancelled.
    pub fn take(&self, id: &NotificationId) -> Result<Option<NotificationRecord>, FacilityError> {
        let mut order = self.order.lock();
        self.take_locked(&mut order, id)
    }

    /// Replace-on-conflict insert. The lookup, removal and registration run
    /// under one lock so concurrent callers never leave two records for an ID.
    pub fn upsert(&self, record: NotificationRecord) -> Result<(), FacilityError> {
        let mut order = self.order.lock();
        if self.take_locked(&mut order, &record.id)?.is_some() {
            tracing::debug!(id = %record.id, "replacing existing notification");
        }
        let id = record.id.clone();
        self.facility.add(record)?;
        order.push(id);
        Ok(())
    }

    pub fn list_all(&self) -> Result<Vec<NotificationRecord>, FacilityError> {
        let mut order = self.order.lock();
        let listed = self.facility.list()?;

        let mut by_id: HashMap<NotificationId, NotificationRecord> = listed
            .iter()
            .map(|record| (record.id.clone(), record.clone()))
            .collect();

        let mut records: Vec<NotificationRecord> = order
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect();
        let stale = order.len() - records.len();
        if stale > 0 {
            tracing::debug!(stale, "dropping notifications the facility no longer holds");
        }

        for record in listed {
            if by_id.remove(&record.id).is_some() {
                tracing::debug!(id = %record.id, "adopting notification registered outside this session");
                records.push(record);
            }
        }

        *order = records.iter().map(|record| record.id.clone()).collect();
        Ok(records)
    }

    pub fn list_of_kind(
        &self,
        kind: NotificationKind,
    ) -> Result<Vec<NotificationRecord>, FacilityError> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|record| record.kind == kind)
            .collect())
    }

    /// Removes everything it can find. Never stops at the first failure and
    /// always forgets every ID it was tracking.
    pub fn clear(&self) -> ClearReport {
        let mut order = self.order.lock();
        let mut report = ClearReport::default();

        let ids: Vec<NotificationId> = match self.facility.list() {
            Ok(records) => records.into_iter().map(|record| record.id).collect(),
            Err(err) => {
                report.enumeration = Some(err);
                order.clone()
            }
        };

        for id in ids {
            match self.facility.remove(&id) {
                Ok(()) => report.removed.push(id),
                Err(err) => report.failures.push((id, err)),
            }
        }

        order.clear();
        report
    }

    fn take_locked(
        &self,
        order: &mut Vec<NotificationId>,
        id: &NotificationId,
    ) -> Result<Option<NotificationRecord>, FacilityError> {
        let Some(existing) = self.facility.find(id)? else {
            order.retain(|known| known != id);
            return Ok(None);
        };
        self.facility.remove(id)?;
        order.retain(|known| known != id);
        Ok(Some(existing.into_cancelled()))
    }
}
