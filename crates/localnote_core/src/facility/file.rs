use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::{insert_unique, remove_existing, SchedulingFacility};
use crate::error::FacilityError;
use crate::record::NotificationRecord;
use crate::request::NotificationId;

const STORE_VERSION: u32 = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    notifications: Vec<NotificationRecord>,
}

/// Desktop stand-in for the platform facility that keeps registrations in a
/// JSON file, so they survive a restart the way OS-held alarms do.
#[derive(Debug)]
pub struct JsonFileFacility {
    path: PathBuf,
    records: Mutex<Vec<NotificationRecord>>,
}

impl JsonFileFacility {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FacilityError> {
        let path = path.as_ref().to_path_buf();
        let records = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                Vec::new()
            } else {
                let store: StoreFile = serde_json::from_str(&raw)?;
                if store.version != STORE_VERSION {
                    tracing::warn!(
                        path = %path.display(),
                        version = store.version,
                        "unexpected notification store version"
                    );
                }
                store.notifications
            }
        } else {
            Vec::new()
        };
        tracing::debug!(path = %path.display(), count = records.len(), "opened notification store");
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, records: &[NotificationRecord]) -> Result<(), FacilityError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let store = StoreFile {
            version: STORE_VERSION,
            notifications: records.to_vec(),
        };
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, serde_json::to_vec_pretty(&store)?)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }

    fn mutate(
        &self,
        change: impl FnOnce(&mut Vec<NotificationRecord>) -> Result<(), FacilityError>,
    ) -> Result<(), FacilityError> {
        let mut records = self.records.lock();
        let mut next = records.clone();
        change(&mut next)?;
        self.persist(&next)?;
        *records = next;
        Ok(())
    }
}

impl SchedulingFacility for JsonFileFacility {
    fn find(&self, id: &NotificationId) -> Result<Option<NotificationRecord>, FacilityError> {
        Ok(self
            .records
            .lock()
            .iter()
            .find(|record| &record.id == id)
            .cloned())
    }

    fn add(&self, record: NotificationRecord) -> Result<(), FacilityError> {
        self.mutate(|records| insert_unique(records, record))
    }

    fn remove(&self, id: &NotificationId) -> Result<(), FacilityError> {
        self.mutate(|records| remove_existing(records, id))
    }

    fn list(&self) -> Result<Vec<NotificationRecord>, FacilityError> {
        Ok(self.records.lock().clone())
    }
}
