//! Sticky assignments backed by a host-provided storage.
use serde::{Deserialize, Serialize};

use crate::Result;

/// A remembered variation for a `(user_id, campaign_key)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStorageRecord {
    pub user_id: String,
    pub campaign_key: String,
    pub variation_name: String,
}

/// Storage plugin that lets the SDK remember which variation a user got, so the user keeps it
/// even after traffic or weights change.
///
/// Errors returned by the plugin are logged and otherwise ignored: a failing lookup behaves like
/// a missing record and a failing save leaves the decision unchanged.
///
/// # Examples
/// ```
/// # use std::{collections::HashMap, sync::Mutex};
/// # use vwo::{Result, UserStorageRecord, UserStorageService};
/// #[derive(Default)]
/// struct InMemory(Mutex<HashMap<(String, String), UserStorageRecord>>);
///
/// impl UserStorageService for InMemory {
///     fn lookup(&self, user_id: &str, campaign_key: &str) -> Result<Option<UserStorageRecord>> {
///         let records = self.0.lock().unwrap();
///         Ok(records.get(&(user_id.to_owned(), campaign_key.to_owned())).cloned())
///     }
///
///     fn save(&self, record: UserStorageRecord) -> Result<()> {
///         let key = (record.user_id.clone(), record.campaign_key.clone());
///         self.0.lock().unwrap().insert(key, record);
///         Ok(())
///     }
/// }
/// ```
pub trait UserStorageService {
    /// Return the stored record for `user_id` in `campaign_key`, if any.
    fn lookup(&self, user_id: &str, campaign_key: &str) -> Result<Option<UserStorageRecord>>;

    /// Persist `record`, replacing any previous record for the same user and campaign.
    fn save(&self, record: UserStorageRecord) -> Result<()>;
}

/// Wraps the optional storage plugin and validates what it returns.
pub(crate) struct UserStorageAdapter {
    service: Option<Box<dyn UserStorageService + Send + Sync>>,
}

impl UserStorageAdapter {
    pub fn new(service: Option<Box<dyn UserStorageService + Send + Sync>>) -> Self {
        UserStorageAdapter { service }
    }

    /// Look up a sticky record. Records that are incomplete or belong to another user or
    /// campaign are discarded.
    pub fn lookup(&self, user_id: &str, campaign_key: &str) -> Option<UserStorageRecord> {
        let service = self.service.as_ref()?;

        let record = match service.lookup(user_id, campaign_key) {
            Ok(Some(record)) => record,
            Ok(None) => {
                log::debug!(target: "vwo", user_id, campaign_key; "no stored variation found");
                return None;
            }
            Err(err) => {
                log::warn!(target: "vwo", user_id, campaign_key; "user storage lookup failed: {err}");
                return None;
            }
        };

        if record.user_id.is_empty()
            || record.campaign_key.is_empty()
            || record.variation_name.is_empty()
            || record.user_id != user_id
            || record.campaign_key != campaign_key
        {
            log::warn!(target: "vwo",
                       user_id,
                       campaign_key;
                       "ignoring invalid user storage record: {record:?}");
            return None;
        }

        log::debug!(target: "vwo",
                    user_id,
                    campaign_key,
                    variation_name:display = record.variation_name;
                    "found stored variation");
        Some(record)
    }

    /// Save a record. Failures are logged.
    pub fn save(&self, user_id: &str, campaign_key: &str, variation_name: &str) {
        let Some(service) = &self.service else {
            return;
        };

        let record = UserStorageRecord {
            user_id: user_id.to_owned(),
            campaign_key: campaign_key.to_owned(),
            variation_name: variation_name.to_owned(),
        };
        match service.save(record) {
            Ok(()) => {
                log::debug!(target: "vwo", user_id, campaign_key, variation_name; "saved variation to user storage");
            }
            Err(err) => {
                log::warn!(target: "vwo", user_id, campaign_key; "user storage save failed: {err}");
            }
        }
    }
}
