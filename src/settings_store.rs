use std::sync::{Arc, RwLock};

use crate::settings::AccountSettings;

/// Holds the account settings decisions are made against.
///
/// Settings arrive either from [`ClientConfig::settings`](crate::ClientConfig::settings) or from
/// a later [`Client::fetch_settings`](crate::Client::fetch_settings) refresh. A refresh swaps in a
/// whole new `Arc`; a decision clones the `Arc` once when it starts, so campaigns, groups and
/// buckets stay consistent for the rest of that decision even if a refresh lands meanwhile.
pub(crate) struct SettingsStore {
    current: RwLock<Option<Arc<AccountSettings>>>,
}

impl SettingsStore {
    pub fn new() -> Self {
        SettingsStore {
            current: RwLock::new(None),
        }
    }

    /// Snapshot of the current settings, `None` until the first install.
    pub fn get_settings(&self) -> Option<Arc<AccountSettings>> {
        // A poisoned lock means a refresh panicked midway; decisions then see no settings.
        self.current.read().ok()?.clone()
    }

    /// Install `settings`, returning the snapshot it replaces.
    pub fn set_settings(&self, settings: AccountSettings) -> Option<Arc<AccountSettings>> {
        let settings = Arc::new(settings);
        let mut current = self.current.write().ok()?;
        current.replace(settings)
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Arc};

    use super::SettingsStore;
    use crate::settings::{AccountSettings, SettingsWire};

    fn empty_settings(version: u64) -> AccountSettings {
        AccountSettings::new(SettingsWire {
            sdk_key: "key".into(),
            account_id: 1,
            version,
            campaigns: Vec::new(),
            groups: HashMap::new(),
        })
    }

    #[test]
    fn can_set_settings_from_another_thread() {
        let store = Arc::new(SettingsStore::new());
        assert!(store.get_settings().is_none());

        {
            let store = store.clone();
            let _ = std::thread::spawn(move || {
                store.set_settings(empty_settings(1));
            })
            .join();
        }

        assert!(store.get_settings().is_some());
    }

    #[test]
    fn snapshot_survives_replacement() {
        let store = SettingsStore::new();
        store.set_settings(empty_settings(1));
        let snapshot = store.get_settings().unwrap();

        let previous = store.set_settings(empty_settings(2)).unwrap();

        assert_eq!(snapshot.version, 1);
        assert_eq!(previous.version, 1);
        assert_eq!(store.get_settings().unwrap().version, 2);
    }
}
