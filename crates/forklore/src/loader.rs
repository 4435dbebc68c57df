//! Parallel test-fixture loading.
//!
//! All files of a test case are fetched at once; each slot settles
//! independently and in any order. One failing file never blocks the rest
//! of the case. Loaded cases are cached per (version, test path) and never
//! evicted for the lifetime of the process.

use crate::store::DataStore;
use eyre::Result;
use forklore_core::is_binary;
use futures_util::future::join_all;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::warn;

/// How long a deep-link navigation will wait for a targeted file to settle.
pub const FILE_WAIT_CAP: Duration = Duration::from_secs(2);

/// Content of one settled fixture file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    pub bytes: Vec<u8>,
    pub binary: bool,
}

/// State of one file slot of a test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSlot {
    Pending,
    Loaded(FileContent),
    Failed(String),
}

impl FileSlot {
    pub fn is_settled(&self) -> bool {
        !matches!(self, FileSlot::Pending)
    }
}

/// The file slots of one test case. Slots settle as fetches resolve;
/// waiters are woken through the notifier.
#[derive(Debug, Default)]
pub struct CaseFiles {
    slots: Mutex<BTreeMap<String, FileSlot>>,
    settled: Notify,
}

impl CaseFiles {
    fn new(files: &[String]) -> Self {
        let slots = files
            .iter()
            .map(|name| (name.clone(), FileSlot::Pending))
            .collect();
        Self {
            slots: Mutex::new(slots),
            settled: Notify::new(),
        }
    }

    pub fn slot(&self, name: &str) -> Option<FileSlot> {
        self.slots.lock().ok()?.get(name).cloned()
    }

    fn settle(&self, name: &str, slot: FileSlot) {
        if let Ok(mut slots) = self.slots.lock() {
            slots.insert(name.to_string(), slot);
        }
        self.settled.notify_waiters();
    }

    /// Wait until the named slot has settled, up to `cap`. Returns the slot
    /// as it stands when the wait ends, `None` if the case has no such file.
    pub async fn wait_for(&self, name: &str, cap: Duration) -> Option<FileSlot> {
        let wait = async {
            loop {
                // Register interest before re-checking the slot, so a settle
                // landing in between is not missed.
                let pending = self.settled.notified();
                tokio::pin!(pending);
                pending.as_mut().enable();
                match self.slot(name) {
                    Some(slot) if slot.is_settled() => return Some(slot),
                    Some(_) => pending.await,
                    None => return None,
                }
            }
        };
        match tokio::time::timeout(cap, wait).await {
            Ok(result) => result,
            Err(_) => self.slot(name),
        }
    }

    /// The hex/yaml toggle becomes available only once both the binary file
    /// and its companion have arrived, whichever order they land in.
    pub fn toggle_ready(&self, name: &str) -> bool {
        let companion = format!("{name}.yaml");
        matches!(self.slot(name), Some(FileSlot::Loaded(_)))
            && matches!(self.slot(&companion), Some(FileSlot::Loaded(_)))
    }

    pub fn all_settled(&self) -> bool {
        self.slots
            .lock()
            .map(|slots| slots.values().all(FileSlot::is_settled))
            .unwrap_or(false)
    }
}

/// Fetches and caches test-case files.
#[derive(Debug)]
pub struct CaseLoader {
    store: DataStore,
    cache: Mutex<BTreeMap<(String, String), Arc<CaseFiles>>>,
}

impl CaseLoader {
    pub fn new(store: DataStore) -> Self {
        Self {
            store,
            cache: Mutex::new(BTreeMap::new()),
        }
    }

    /// Start loading a case's files, or return the already-cached entry.
    /// Fetches run in the background; the returned handle settles slot by
    /// slot. A navigation away mid-load simply leaves the entry filling in
    /// the cache.
    pub fn load(
        self: &Arc<Self>,
        version: &str,
        case_path: &str,
        files: &[String],
    ) -> Result<Arc<CaseFiles>> {
        let key = (version.to_string(), case_path.to_string());
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| eyre::eyre!("case cache poisoned"))?;
        if let Some(existing) = cache.get(&key) {
            return Ok(Arc::clone(existing));
        }

        let case = Arc::new(CaseFiles::new(files));
        cache.insert(key, Arc::clone(&case));
        drop(cache);

        let fetches: Vec<_> = files
            .iter()
            .map(|name| {
                let loader = Arc::clone(self);
                let case = Arc::clone(&case);
                let version = version.to_string();
                let case_path = case_path.to_string();
                let name = name.clone();
                async move {
                    match loader.store.test_file(&version, &case_path, &name).await {
                        Ok(bytes) => {
                            case.settle(
                                &name,
                                FileSlot::Loaded(FileContent {
                                    binary: is_binary(&name),
                                    bytes,
                                }),
                            );
                        }
                        Err(err) => {
                            warn!(%case_path, %name, "test file fetch failed: {err:#}");
                            case.settle(&name, FileSlot::Failed(format!("{err:#}")));
                        }
                    }
                }
            })
            .collect();

        tokio::spawn(async move {
            join_all(fetches).await;
        });

        Ok(case)
    }

    pub fn cached(&self, version: &str, case_path: &str) -> Option<Arc<CaseFiles>> {
        let key = (version.to_string(), case_path.to_string());
        self.cache.lock().ok()?.get(&key).cloned()
    }
}
