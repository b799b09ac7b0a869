//! Change watcher: reports external mutation of a chosen set of keys.
//!
//! One OS-level watch is placed on the parameter directory (not on the
//! individual files, which are replaced by rename on every write). A
//! background thread filters events down to the registered keys, coalesces
//! bursts inside a short debounce window, and hands key names to the UI loop
//! through a bounded channel. If the channel is full the key is parked in an
//! overflow set, so a change is never dropped, only merged.
//!
//! Events carry no value. Receivers must re-read the store.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::{Arc, Mutex, RwLock};
use std::thread;
use std::time::{Duration, Instant};

use notify::event::{AccessKind, EventKind};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use crate::error::WatchError;
use crate::store::file::TEMP_MARKER;
use crate::store::{validate_key, ParamStore};


/// Default coalescing window for a burst of filesystem events.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(50);
/// Default number of undelivered change events held for the UI loop.
pub const DEFAULT_CAPACITY: usize = 64;


/// Whether any key is currently watched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Active,
}


/// Tuning for [`ChangeWatcher::start`].
#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub debounce: Duration,
    pub capacity: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        WatchConfig {
            debounce: DEFAULT_DEBOUNCE,
            capacity: DEFAULT_CAPACITY,
        }
    }
}


/// State shared between the watcher handle and its notifier thread.
#[derive(Debug, Default)]
struct Shared {
    keys: RwLock<BTreeSet<String>>,
    overflow: Mutex<BTreeSet<String>>,
}

impl Shared {
    fn is_watched(&self, key: &str) -> bool {
        self.keys
            .read()
            .map(|keys| keys.contains(key))
            .unwrap_or(false)
    }

    fn take_overflow(&self) -> BTreeSet<String> {
        self.overflow
            .lock()
            .map(|mut set| std::mem::take(&mut *set))
            .unwrap_or_default()
    }
}


/// Watches a bounded, mutable set of parameter keys for external change.
pub struct ChangeWatcher {
    dir: PathBuf,
    shared: Arc<Shared>,
    receiver: Receiver<String>,
    // Dropping the OS watcher closes the raw event channel and ends the thread.
    _watcher: RecommendedWatcher,
}

impl ChangeWatcher {
    /// Start watching the directory of `store`. No key is watched yet.
    pub fn start(store: &ParamStore, config: WatchConfig) -> Result<Self, WatchError> {
        let dir = store.dir().to_path_buf();
        let shared = Arc::new(Shared::default());
        let (events_tx, events_rx) = mpsc::sync_channel::<String>(config.capacity.max(1));
        let (raw_tx, raw_rx) = mpsc::channel::<notify::Result<Event>>();

        let mut watcher = notify::recommended_watcher(move |result| {
            let _ = raw_tx.send(result);
        })
        .map_err(|source| WatchError::Notify {
            path: dir.clone(),
            source,
        })?;
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|source| WatchError::Notify {
                path: dir.clone(),
                source,
            })?;

        let thread_shared = Arc::clone(&shared);
        let debounce = config.debounce;
        thread::Builder::new()
            .name("param-watch".into())
            .spawn(move || notifier_loop(raw_rx, events_tx, thread_shared, debounce))
            .map_err(|e| WatchError::Notify {
                path: dir.clone(),
                source: notify::Error::io(e),
            })?;

        debug!("watching {}", dir.display());
        Ok(ChangeWatcher {
            dir,
            shared,
            receiver: events_rx,
            _watcher: watcher,
        })
    }

    /// Directory being observed.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Add keys to the watched set. Takes effect for the next event.
    pub fn watch<I, S>(&self, keys: I) -> Result<(), WatchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys: Vec<String> = keys
            .into_iter()
            .map(|k| {
                let k = k.as_ref();
                validate_key(k).map(|_| k.to_string())
            })
            .collect::<Result<_, _>>()?;
        if let Ok(mut set) = self.shared.keys.write() {
            set.extend(keys);
        }
        Ok(())
    }

    /// Stop watching `key`. Unknown keys are ignored.
    pub fn unwatch(&self, key: &str) {
        if let Ok(mut set) = self.shared.keys.write() {
            set.remove(key);
        }
    }

    /// Swap the whole watched set in one step. Keys present in both the old
    /// and new set stay watched throughout. On an invalid key nothing changes.
    pub fn replace<I, S>(&self, keys: I) -> Result<(), WatchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys: BTreeSet<String> = keys
            .into_iter()
            .map(|k| {
                let k = k.as_ref();
                validate_key(k).map(|_| k.to_string())
            })
            .collect::<Result<_, _>>()?;
        if let Ok(mut set) = self.shared.keys.write() {
            *set = keys;
        }
        Ok(())
    }

    /// Currently watched keys, sorted.
    pub fn watched(&self) -> Vec<String> {
        self.shared
            .keys
            .read()
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn state(&self) -> WatchState {
        let empty = self
            .shared
            .keys
            .read()
            .map(|set| set.is_empty())
            .unwrap_or(true);
        if empty {
            WatchState::Idle
        } else {
            WatchState::Active
        }
    }

    /// Take every pending change without blocking. Each key appears once,
    /// in arrival order.
    pub fn drain(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut changed = Vec::new();
        for key in self.receiver.try_iter().chain(self.shared.take_overflow()) {
            if seen.insert(key.clone()) {
                changed.push(key);
            }
        }
        changed
    }

    /// Invoke `on_change` for each pending change, on the caller's thread.
    pub fn dispatch(&self, mut on_change: impl FnMut(&str)) -> usize {
        let changed = self.drain();
        for key in &changed {
            on_change(key);
        }
        changed.len()
    }

    /// Block up to `timeout` for the next change.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<String> {
        if let Some(key) = self.take_one_overflow() {
            return Some(key);
        }
        match self.receiver.recv_timeout(timeout) {
            Ok(key) => Some(key),
            Err(RecvTimeoutError::Timeout) => self.take_one_overflow(),
            Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    fn take_one_overflow(&self) -> Option<String> {
        let mut set = self.shared.overflow.lock().ok()?;
        set.pop_first()
    }
}


// ---------------------------------------------------------------------------
// Notifier thread
// ---------------------------------------------------------------------------

fn notifier_loop(
    raw: Receiver<notify::Result<Event>>,
    out: SyncSender<String>,
    shared: Arc<Shared>,
    debounce: Duration,
) {
    loop {
        let mut pending = BTreeSet::new();
        match raw.recv() {
            Ok(result) => collect(result, &shared, &mut pending),
            Err(_) => break,
        }
        if pending.is_empty() {
            continue;
        }

        let deadline = Instant::now() + debounce;
        loop {
            let Some(timeout) = deadline.checked_duration_since(Instant::now()) else {
                break;
            };
            match raw.recv_timeout(timeout) {
                Ok(result) => collect(result, &shared, &mut pending),
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    deliver(pending, &out, &shared);
                    return;
                }
            }
        }

        if !deliver(pending, &out, &shared) {
            break;
        }
    }
    debug!("param watcher thread exiting");
}


/// Add watched keys touched by `result` to `pending`.
fn collect(result: notify::Result<Event>, shared: &Shared, pending: &mut BTreeSet<String>) {
    let event = match result {
        Ok(event) => event,
        Err(err) => {
            // Transient: e.g. a path vanished mid-rename. Keep watching.
            warn!("param watcher event error: {}", err);
            return;
        }
    };
    if !is_mutation(&event.kind) {
        return;
    }
    for path in &event.paths {
        if let Some(key) = key_of(path) {
            if shared.is_watched(key) {
                pending.insert(key.to_string());
            }
        }
    }
}

fn is_mutation(kind: &EventKind) -> bool {
    match kind {
        EventKind::Access(AccessKind::Close(notify::event::AccessMode::Write)) => true,
        EventKind::Access(_) => false,
        _ => true,
    }
}

/// Parameter key named by `path`, ignoring temp files.
fn key_of(path: &Path) -> Option<&str> {
    let name = path.file_name()?.to_str()?;
    if name.starts_with('.') || name.contains(TEMP_MARKER) {
        return None;
    }
    Some(name)
}

/// Push keys to the UI channel, parking them in the overflow set when full.
/// Returns false once the receiving side is gone.
fn deliver(pending: BTreeSet<String>, out: &SyncSender<String>, shared: &Shared) -> bool {
    for key in pending {
        match out.try_send(key) {
            Ok(()) => {}
            Err(TrySendError::Full(key)) => {
                if let Ok(mut set) = shared.overflow.lock() {
                    set.insert(key);
                }
            }
            Err(TrySendError::Disconnected(_)) => return false,
        }
    }
    true
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Params;

    fn setup() -> (tempfile::TempDir, ParamStore, ChangeWatcher) {
        let dir = tempfile::tempdir().unwrap();
        let store = ParamStore::open(dir.path()).unwrap();
        let watcher = ChangeWatcher::start(&store, WatchConfig::default()).unwrap();
        (dir, store, watcher)
    }

    /// Collect changes until `want` distinct keys arrived or 5 s passed.
    fn wait_for(watcher: &ChangeWatcher, want: usize) -> BTreeSet<String> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut got = BTreeSet::new();
        while got.len() < want && Instant::now() < deadline {
            got.extend(watcher.drain());
            thread::sleep(Duration::from_millis(20));
        }
        got
    }

    #[test]
    fn starts_idle_and_becomes_active() {
        let (_tmp, _store, watcher) = setup();
        assert_eq!(watcher.state(), WatchState::Idle);
        watcher.watch(["IsMetric"]).unwrap();
        assert_eq!(watcher.state(), WatchState::Active);
        watcher.unwatch("IsMetric");
        assert_eq!(watcher.state(), WatchState::Idle);
    }

    #[test]
    fn rejects_invalid_keys() {
        let (_tmp, _store, watcher) = setup();
        assert!(watcher.watch(["ok", "no/slash"]).is_err());
        assert!(watcher.watched().is_empty());
    }

    #[test]
    fn replace_swaps_the_set_and_rejects_atomically() {
        let (_tmp, _store, watcher) = setup();
        watcher.watch(["A", "B"]).unwrap();
        watcher.replace(["B", "C"]).unwrap();
        assert_eq!(watcher.watched(), vec!["B".to_string(), "C".to_string()]);
        assert!(watcher.replace(["D", "bad/key"]).is_err());
        assert_eq!(watcher.watched(), vec!["B".to_string(), "C".to_string()]);
        watcher.replace(Vec::<String>::new()).unwrap();
        assert_eq!(watcher.state(), WatchState::Idle);
    }

    #[test]
    fn keys_the_notifier_would_skip_cannot_be_watched() {
        let (_tmp, store, watcher) = setup();
        assert!(watcher.watch(["Backup.tmp.old"]).is_err());
        assert!(store.put("Backup.tmp.old", b"1").is_err());
        assert_eq!(watcher.state(), WatchState::Idle);
    }

    #[test]
    fn external_write_fires_and_reread_sees_new_value() {
        let (_tmp, store, watcher) = setup();
        watcher.watch(["IsMetric"]).unwrap();

        // A second handle on the same directory stands in for another process.
        let other = ParamStore::open(store.dir()).unwrap();
        let writer = thread::spawn(move || other.put_bool("IsMetric", true).unwrap());
        writer.join().unwrap();

        let got = wait_for(&watcher, 1);
        assert_eq!(got.into_iter().collect::<Vec<_>>(), vec!["IsMetric".to_string()]);
        assert!(store.get_bool("IsMetric"));
    }

    #[test]
    fn one_write_yields_one_event() {
        let (_tmp, store, watcher) = setup();
        watcher.watch(["GitBranch"]).unwrap();
        store.put("GitBranch", b"release").unwrap();
        let got = wait_for(&watcher, 1);
        assert_eq!(got.len(), 1);
        thread::sleep(Duration::from_millis(200));
        assert!(watcher.drain().is_empty(), "a single rename must not echo");
    }

    #[test]
    fn removal_fires() {
        let (_tmp, store, watcher) = setup();
        store.put_bool("DoReboot", true).unwrap();
        watcher.watch(["DoReboot"]).unwrap();
        store.remove("DoReboot").unwrap();
        assert!(wait_for(&watcher, 1).contains("DoReboot"));
    }

    #[test]
    fn unwatched_keys_and_temp_files_are_ignored() {
        let (_tmp, store, watcher) = setup();
        watcher.watch(["Watched"]).unwrap();
        store.put("Other", b"1").unwrap();
        drop(store.stage("Watched", b"never committed").unwrap());
        thread::sleep(Duration::from_millis(300));
        assert!(watcher.drain().is_empty());
    }

    #[test]
    fn added_keys_take_effect_without_restart() {
        let (_tmp, store, watcher) = setup();
        watcher.watch(["First"]).unwrap();
        watcher.watch(["Second"]).unwrap();
        store.put("Second", b"x").unwrap();
        assert!(wait_for(&watcher, 1).contains("Second"));
    }

    #[test]
    fn full_channel_overflows_without_losing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParamStore::open(dir.path()).unwrap();
        let config = WatchConfig {
            debounce: Duration::from_millis(100),
            capacity: 1,
        };
        let watcher = ChangeWatcher::start(&store, config).unwrap();
        watcher.watch(["A", "B", "C"]).unwrap();
        for key in ["A", "B", "C"] {
            store.put(key, b"1").unwrap();
        }
        let got = wait_for(&watcher, 3);
        assert_eq!(got.len(), 3);
    }

    #[test]
    fn dispatch_runs_callback_per_key() {
        let (_tmp, store, watcher) = setup();
        watcher.watch(["HoldForSetting"]).unwrap();
        store.put_bool("HoldForSetting", true).unwrap();

        let mut seen = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(5);
        while seen.is_empty() && Instant::now() < deadline {
            watcher.dispatch(|key| seen.push(key.to_string()));
            thread::sleep(Duration::from_millis(20));
        }
        assert_eq!(seen, vec!["HoldForSetting".to_string()]);
    }

    #[test]
    fn key_of_skips_hidden_and_temp_names() {
        assert_eq!(key_of(Path::new("/p/IsMetric")), Some("IsMetric"));
        assert_eq!(key_of(Path::new("/p/.IsMetric.tmp.1.0")), None);
        assert_eq!(key_of(Path::new("/p/.hidden")), None);
    }
}
