// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! File system watching for live reload.
//!
//! [`WatchRegistry`] keeps the set of files that render requests have
//! referenced and publishes a [`ChangeEvent`] whenever one of them changes.
//!
//! # Features
//!
//! - Idempotent registration: a path is handed to the notifier only once
//!   while the notifier still tracks it
//! - A file replaced by an atomic save is re-registered on its next request
//! - Debounced notifier events, so one save is one event
//! - Fan-out through a broadcast channel: every caller of
//!   [`WatchRegistry::events`] gets its own receiver
//! - Watch failures are reported, never fatal

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use notify::event::ModifyKind;
use notify::{EventKind, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, Debouncer, RecommendedCache};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Buffered events per receiver before a slow receiver starts lagging.
const CHANNEL_CAPACITY: usize = 64;

/// Kind of file system operation behind a [`ChangeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// File created.
    Create,
    /// File contents written.
    Write,
    /// File removed.
    Remove,
    /// File renamed or moved.
    Rename,
    /// Permissions or other metadata changed.
    Chmod,
}

impl ChangeKind {
    /// Maps a notifier event kind. Access and unclassified events yield `None`.
    pub fn from_event_kind(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(ChangeKind::Create),
            EventKind::Remove(_) => Some(ChangeKind::Remove),
            EventKind::Modify(ModifyKind::Name(_)) => Some(ChangeKind::Rename),
            EventKind::Modify(ModifyKind::Metadata(_)) => Some(ChangeKind::Chmod),
            EventKind::Modify(_) | EventKind::Any => Some(ChangeKind::Write),
            EventKind::Access(_) | EventKind::Other => None,
        }
    }

    /// Upper-case name sent to browsers.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Create => "CREATE",
            ChangeKind::Write => "WRITE",
            ChangeKind::Remove => "REMOVE",
            ChangeKind::Rename => "RENAME",
            ChangeKind::Chmod => "CHMOD",
        }
    }

    /// Whether the notifier loses track of a file after this change.
    fn detaches(&self) -> bool {
        matches!(self, ChangeKind::Remove | ChangeKind::Rename)
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change to one watched file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// The file that changed.
    pub path: PathBuf,
    /// What happened to it.
    pub kind: ChangeKind,
}

/// Failure to observe a path.
#[derive(Error, Debug, Clone)]
pub enum WatchError {
    /// The path could not be resolved, usually because it does not exist.
    #[error("cannot watch {path}: {message}")]
    Resolve {
        /// Path as requested.
        path: PathBuf,
        /// Underlying IO failure.
        message: String,
    },

    /// The notifier rejected the path or reported a failure.
    #[error("watch error: {message}")]
    Notify {
        /// Paths involved, if the notifier named any.
        paths: Vec<PathBuf>,
        /// Notifier message.
        message: String,
    },

    /// The registry has been closed.
    #[error("watch registry is closed")]
    Closed,
}

impl From<&notify::Error> for WatchError {
    fn from(err: &notify::Error) -> Self {
        WatchError::Notify {
            paths: err.paths.clone(),
            message: err.to_string(),
        }
    }
}

/// Watched paths, each mapped to whether the notifier still tracks it.
///
/// Shared with the notifier thread, which clears the flag when a file is
/// removed or renamed away.
type Entries = Arc<Mutex<HashMap<PathBuf, bool>>>;

fn lock_entries(entries: &Entries) -> MutexGuard<'_, HashMap<PathBuf, bool>> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Inner {
    debouncer: Option<Debouncer<RecommendedWatcher, RecommendedCache>>,
    events_tx: Option<broadcast::Sender<ChangeEvent>>,
    errors_tx: Option<broadcast::Sender<WatchError>>,
}

/// Deduplicated set of watched files plus the streams of their changes.
pub struct WatchRegistry {
    inner: Mutex<Inner>,
    entries: Entries,
}

impl WatchRegistry {
    /// Starts the notifier with the given debounce window.
    ///
    /// No path is watched until [`watch`](Self::watch) is called.
    pub fn new(debounce: Duration) -> Result<Self, WatchError> {
        let (events_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (errors_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let entries: Entries = Arc::default();

        let handler_events = events_tx.clone();
        let handler_errors = errors_tx.clone();
        let handler_entries = Arc::clone(&entries);
        let debouncer = new_debouncer(debounce, None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    let mut sent = HashSet::new();
                    for event in events {
                        let Some(kind) = ChangeKind::from_event_kind(&event.kind) else {
                            continue;
                        };
                        for path in &event.paths {
                            // One event per file and kind for each debounce batch.
                            if !sent.insert((path.clone(), kind)) {
                                continue;
                            }
                            // Clear the flag before anyone hears about the change, so
                            // the reload that follows re-registers the file.
                            if kind.detaches() {
                                if let Some(active) = lock_entries(&handler_entries).get_mut(path) {
                                    debug!(path = %path.display(), "watch detached by {}", kind);
                                    *active = false;
                                }
                            }
                            // No receivers is fine: nobody is viewing right now.
                            let _ = handler_events.send(ChangeEvent {
                                path: path.clone(),
                                kind,
                            });
                        }
                    }
                }
                Err(errors) => {
                    for error in &errors {
                        let _ = handler_errors.send(WatchError::from(error));
                    }
                }
            }
        })
        .map_err(|err| WatchError::from(&err))?;

        Ok(Self {
            inner: Mutex::new(Inner {
                debouncer: Some(debouncer),
                events_tx: Some(events_tx),
                errors_tx: Some(errors_tx),
            }),
            entries,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts observing `path`.
    ///
    /// Returns `Ok(true)` when the path was handed to the notifier and
    /// `Ok(false)` when it is already watched. Paths are canonicalized first,
    /// so different spellings of the same file share one entry. A file that
    /// was removed or renamed since it was added is registered again.
    ///
    /// Touches the file system; async callers should run it on a blocking thread.
    pub fn watch(&self, path: impl AsRef<Path>) -> Result<bool, WatchError> {
        let requested = path.as_ref();
        let canonical = std::fs::canonicalize(requested).map_err(|err| WatchError::Resolve {
            path: requested.to_path_buf(),
            message: err.to_string(),
        })?;

        let mut inner = self.lock();
        let debouncer = inner.debouncer.as_mut().ok_or(WatchError::Closed)?;
        let known = lock_entries(&self.entries).get(&canonical).copied();
        match known {
            Some(true) => return Ok(false),
            Some(false) => {
                // The notifier may still hold the old descriptor after a rename.
                let _ = debouncer.unwatch(&canonical);
            }
            None => {}
        }

        debouncer
            .watch(&canonical, RecursiveMode::NonRecursive)
            .map_err(|err| WatchError::from(&err))?;
        if known.is_some() {
            info!(path = %canonical.display(), "watching again");
        } else {
            info!(path = %canonical.display(), "watching");
        }
        lock_entries(&self.entries).insert(canonical, true);
        Ok(true)
    }

    /// Whether `path` (after canonicalization) is watched and still tracked.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        match std::fs::canonicalize(path.as_ref()) {
            Ok(canonical) => lock_entries(&self.entries)
                .get(&canonical)
                .copied()
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Number of watched paths, including ones waiting to be registered again.
    pub fn len(&self) -> usize {
        lock_entries(&self.entries).len()
    }

    /// Whether no path is watched.
    pub fn is_empty(&self) -> bool {
        lock_entries(&self.entries).is_empty()
    }

    /// Snapshot of the watched paths.
    pub fn paths(&self) -> Vec<PathBuf> {
        lock_entries(&self.entries).keys().cloned().collect()
    }

    /// A new receiver of change events for every watched path.
    ///
    /// Once the registry is closed the receiver reports `Closed`.
    pub fn events(&self) -> broadcast::Receiver<ChangeEvent> {
        subscribe_or_closed(self.lock().events_tx.as_ref())
    }

    /// A new receiver of notifier failures.
    pub fn errors(&self) -> broadcast::Receiver<WatchError> {
        subscribe_or_closed(self.lock().errors_tx.as_ref())
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().debouncer.is_none()
    }

    /// Stops the notifier and ends both streams.
    ///
    /// Blocks until the notifier thread has exited. Calling it again is a no-op.
    pub fn close(&self) {
        let debouncer = {
            let mut inner = self.lock();
            lock_entries(&self.entries).clear();
            inner.events_tx = None;
            inner.errors_tx = None;
            inner.debouncer.take()
        };

        if let Some(debouncer) = debouncer {
            // Joining drops the event handler and with it the last senders.
            debouncer.stop();
            debug!("watch registry closed");
        }
    }
}

fn subscribe_or_closed<T: Clone>(sender: Option<&broadcast::Sender<T>>) -> broadcast::Receiver<T> {
    match sender {
        Some(sender) => sender.subscribe(),
        None => broadcast::channel(1).1,
    }
}

/// Drains both registry streams into the log until the registry closes.
pub async fn log_activity(
    mut events: broadcast::Receiver<ChangeEvent>,
    mut errors: broadcast::Receiver<WatchError>,
) {
    let mut errors_open = true;
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => info!(path = %event.path.display(), kind = %event.kind, "file changed"),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "change log fell behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            error = errors.recv(), if errors_open => match error {
                Ok(error) => warn!("{}", error),
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => errors_open = false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RemoveKind, RenameMode};
    use std::fs;
    use tempfile::tempdir;

    fn registry() -> WatchRegistry {
        WatchRegistry::new(Duration::from_millis(50)).unwrap()
    }

    #[test]
    fn test_change_kind_mapping() {
        let cases = [
            (EventKind::Create(CreateKind::File), Some(ChangeKind::Create)),
            (
                EventKind::Modify(ModifyKind::Data(DataChange::Content)),
                Some(ChangeKind::Write),
            ),
            (
                EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
                Some(ChangeKind::Rename),
            ),
            (
                EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)),
                Some(ChangeKind::Chmod),
            ),
            (EventKind::Remove(RemoveKind::File), Some(ChangeKind::Remove)),
            (EventKind::Access(AccessKind::Any), None),
            (EventKind::Other, None),
        ];
        for (kind, expected) in cases {
            assert_eq!(ChangeKind::from_event_kind(&kind), expected, "{:?}", kind);
        }
        assert_eq!(ChangeKind::Write.to_string(), "WRITE");
    }

    #[test]
    fn test_watch_is_idempotent() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("page.html");
        fs::write(&file, "x").unwrap();

        let registry = registry();
        assert!(registry.watch(&file).unwrap());
        assert!(!registry.watch(&file).unwrap());
        // Another spelling of the same file.
        assert!(!registry.watch(dir.path().join(".").join("page.html")).unwrap());

        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&file));
        registry.close();
    }

    /// Waits for the first event of one of the `wanted` kinds.
    async fn next_of(
        events: &mut broadcast::Receiver<ChangeEvent>,
        wanted: &[ChangeKind],
    ) -> ChangeEvent {
        tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                match events.recv().await {
                    Ok(event) if wanted.contains(&event.kind) => return event,
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(err) => panic!("event stream ended: {err}"),
                }
            }
        })
        .await
        .expect("change event")
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_file_replaced_by_rename_is_watched_again() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("page.html");
        fs::write(&file, "v1").unwrap();

        let registry = registry();
        let mut events = registry.events();
        assert!(registry.watch(&file).unwrap());

        // Editors save by writing a sibling and renaming it over the original.
        let swap = dir.path().join(".page.html.swp");
        fs::write(&swap, "v2").unwrap();
        fs::rename(&swap, &file).unwrap();

        next_of(&mut events, &[ChangeKind::Remove, ChangeKind::Rename]).await;
        assert!(!registry.contains(&file));
        assert_eq!(registry.len(), 1);

        assert!(registry.watch(&file).unwrap());
        assert!(!registry.watch(&file).unwrap());
        assert!(registry.contains(&file));
        assert_eq!(registry.len(), 1);

        fs::write(&file, "v3").unwrap();
        let written = next_of(&mut events, &[ChangeKind::Write]).await;
        assert_eq!(written.path, fs::canonicalize(&file).unwrap());
        registry.close();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_one_save_is_one_event() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("page.html");
        fs::write(&file, "v1").unwrap();

        let registry = registry();
        let mut events = registry.events();
        registry.watch(&file).unwrap();

        // Truncate and write show up as two modifications to the notifier.
        fs::write(&file, "v2").unwrap();
        next_of(&mut events, &[ChangeKind::Write]).await;

        let extra = tokio::time::timeout(Duration::from_millis(400), events.recv()).await;
        assert!(extra.is_err(), "duplicate event {extra:?}");
        registry.close();
    }

    #[test]
    fn test_missing_path_is_an_error_not_a_panic() {
        let dir = tempdir().unwrap();
        let registry = registry();

        let err = registry.watch(dir.path().join("absent.html")).unwrap_err();
        assert!(matches!(err, WatchError::Resolve { .. }));
        assert!(registry.is_empty());
        registry.close();
    }

    #[tokio::test]
    async fn test_close_ends_streams() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("page.html");
        fs::write(&file, "x").unwrap();

        let registry = registry();
        registry.watch(&file).unwrap();
        let mut events = registry.events();
        let mut errors = registry.errors();

        registry.close();
        registry.close();

        assert!(registry.is_closed());
        assert!(matches!(
            events.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
        assert!(matches!(
            errors.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
        assert!(matches!(
            registry.events().recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
        assert!(matches!(registry.watch(&file), Err(WatchError::Closed)));
    }

    #[tokio::test]
    async fn test_log_activity_stops_on_close() {
        let registry = registry();
        let task = tokio::spawn(log_activity(registry.events(), registry.errors()));
        registry.close();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("log task should end")
            .unwrap();
    }
}
