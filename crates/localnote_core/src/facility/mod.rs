//! The OS-side scheduling facility. It owns firing and is the only durable
//! copy of what has been registered.

mod file;

use parking_lot::Mutex;

use crate::error::FacilityError;
use crate::record::NotificationRecord;
use crate::request::NotificationId;

pub use file::JsonFileFacility;

/// Platform alarm/reminder registration primitive.
///
/// Like the platform service it stands for, `add` refuses an ID that is
/// already registered and `remove` refuses an unknown one.
pub trait SchedulingFacility: Send + Sync {
    fn find(&self, id: &NotificationId) -> Result<Option<NotificationRecord>, FacilityError>;
    fn add(&self, record: NotificationRecord) -> Result<(), FacilityError>;
    fn remove(&self, id: &NotificationId) -> Result<(), FacilityError>;
    /// Every registered alarm and reminder.
    fn list(&self) -> Result<Vec<NotificationRecord>, FacilityError>;
}

/// Non-durable facility, kept in registration order.
#[derive(Debug, Default)]
pub struct MemoryFacility {
    records: Mutex<Vec<NotificationRecord>>,
}

impl MemoryFacility {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl SchedulingFacility for MemoryFacility {
    fn find(&self, id: &NotificationId) -> Result<Option<NotificationRecord>, FacilityError> {
        Ok(self
            .records
            .lock()
            .iter()
            .find(|record| &record.id == id)
            .cloned())
    }

    fn add(&self, record: NotificationRecord) -> Result<(), FacilityError> {
        insert_unique(&mut self.records.lock(), record)
    }

    fn remove(&self, id: &NotificationId) -> Result<(), FacilityError> {
        remove_existing(&mut self.records.lock(), id)
    }

    fn list(&self) -> Result<Vec<NotificationRecord>, FacilityError> {
        Ok(self.records.lock().clone())
    }
}

pub(crate) fn insert_unique(
    records: &mut Vec<NotificationRecord>,
    record: NotificationRecord,
) -> Result<(), FacilityError> {
    if records.iter().any(|existing| existing.id == record.id) {
        return Err(FacilityError::Duplicate(record.id));
    }
    records.push(record);
    Ok(())
}

pub(crate) fn remove_existing(
    records: &mut Vec<NotificationRecord>,
    id: &NotificationId,
) -> Result<(), FacilityError> {
    let Some(position) = records.iter().position(|record| &record.id == id) else {
        return Err(FacilityError::Rejected(format!(
            "no notification with id `{id}` is registered"
        )));
    };
    records.remove(position);
    Ok(())
}
