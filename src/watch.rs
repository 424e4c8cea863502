//! File watch dispatcher
//!
//! A [`Dispatcher`] owns one notification subscription covering a set of
//! [`WatchTarget`]s. Notifications are debounced, so a burst of writes to
//! the same file collapses into one reaction. Every target touched by a batch
//! gets exactly one `on_change` call followed by one `on_reload` call, in
//! target order.
//! Reactions run one after another on the thread that called [`Dispatcher::run`].

use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{
    new_debouncer, DebounceEventResult, DebouncedEvent, DebouncedEventKind, Debouncer,
};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;
use tracing::{debug, info};

use crate::constants::watch::DEBOUNCE_MS;
use crate::error::{Error, Result};

/// A single file, or a directory subtree when `recursive`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    pub path: PathBuf,
    pub recursive: bool,
}

impl WatchTarget {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            recursive: false,
        }
    }

    pub fn recursive(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            recursive: true,
        }
    }

    fn matches(&self, changed: &Path) -> bool {
        if self.recursive {
            changed.starts_with(&self.path)
        } else {
            changed == self.path
        }
    }

    /// Path handed to the notification backend
    ///
    /// Single files are observed through their parent directory so that
    /// editors saving via write-then-rename keep being seen.
    fn subscription(&self) -> (PathBuf, RecursiveMode) {
        if self.recursive {
            return (self.path.clone(), RecursiveMode::Recursive);
        }
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        (parent.to_path_buf(), RecursiveMode::NonRecursive)
    }
}

/// Live subscription over a fixed set of targets
pub struct Dispatcher {
    targets: Vec<WatchTarget>,
    events: Receiver<DebounceEventResult>,
    _debouncer: Debouncer<RecommendedWatcher>,
}

impl Dispatcher {
    /// Establish the subscription with the default debounce window
    pub fn new(targets: Vec<WatchTarget>) -> Result<Self> {
        Self::with_debounce(targets, Duration::from_millis(DEBOUNCE_MS))
    }

    pub fn with_debounce(targets: Vec<WatchTarget>, debounce: Duration) -> Result<Self> {
        let targets: Vec<WatchTarget> = targets.into_iter().map(canonical_target).collect();

        let (tx, events) = mpsc::channel();
        let mut debouncer = new_debouncer(debounce, tx).map_err(|e| Error::WatchSetupFailed {
            path: PathBuf::new(),
            reason: e.to_string(),
        })?;

        // Recursive wins when a directory is both a file's parent and a recursive target
        let mut subscriptions: BTreeMap<PathBuf, RecursiveMode> = BTreeMap::new();
        for target in &targets {
            let (path, mode) = target.subscription();
            let entry = subscriptions.entry(path).or_insert(mode);
            if mode == RecursiveMode::Recursive {
                *entry = mode;
            }
        }

        for (path, mode) in &subscriptions {
            debouncer
                .watcher()
                .watch(path, *mode)
                .map_err(|e| Error::WatchSetupFailed {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            debug!(path = %path.display(), recursive = (*mode == RecursiveMode::Recursive), "Subscribed");
        }

        info!(targets = targets.len(), "Watching for changes");
        Ok(Self {
            targets,
            events,
            _debouncer: debouncer,
        })
    }

    /// Dispatch change notifications until a failure occurs
    ///
    /// Never returns under normal operation. A notification error or a failing
    /// `on_change` ends the loop; callers treat that as fatal.
    pub fn run<C, R>(self, mut on_change: C, mut on_reload: Option<R>) -> Result<Infallible>
    where
        C: FnMut(&Path) -> anyhow::Result<()>,
        R: FnMut(),
    {
        loop {
            let batch = self
                .events
                .recv()
                .map_err(|_| Error::WatchFailed("notification channel closed".to_string()))?;
            let events = batch.map_err(|e| Error::WatchFailed(e.to_string()))?;
            dispatch_batch(&self.targets, &events, &mut on_change, on_reload.as_mut())?;
        }
    }
}

/// Resolve symlinks (e.g. `/tmp` on macOS) so backend paths compare equal
fn canonical_target(target: WatchTarget) -> WatchTarget {
    let canonical = if target.recursive {
        target.path.canonicalize().ok()
    } else {
        target.path.parent().and_then(|parent| {
            let name = target.path.file_name()?;
            parent.canonicalize().ok().map(|p| p.join(name))
        })
    };
    WatchTarget {
        path: canonical.unwrap_or(target.path),
        recursive: target.recursive,
    }
}

/// Targets touched by `events` in target order, each paired with the first changed path seen for it
///
/// `AnyContinuous` events are skipped: the debouncer emits them while a path
/// is still being written and always follows up with a settled `Any` event.
fn touched_targets<'a>(
    targets: &'a [WatchTarget],
    events: &[DebouncedEvent],
) -> Vec<(&'a WatchTarget, PathBuf)> {
    targets
        .iter()
        .filter_map(|target| {
            events
                .iter()
                .filter(|event| matches!(event.kind, DebouncedEventKind::Any))
                .find(|event| target.matches(&event.path))
                .map(|event| (target, event.path.clone()))
        })
        .collect()
}

fn dispatch_batch<C, R>(
    targets: &[WatchTarget],
    events: &[DebouncedEvent],
    on_change: &mut C,
    mut on_reload: Option<&mut R>,
) -> Result<()>
where
    C: FnMut(&Path) -> anyhow::Result<()>,
    R: FnMut(),
{
    for (target, changed) in touched_targets(targets, events) {
        debug!(target = %target.path.display(), changed = %changed.display(), "Change detected");
        on_change(&changed).map_err(|e| Error::WatchFailed(format!("{e:#}")))?;
        if let Some(reload) = on_reload.as_deref_mut() {
            reload();
        }
    }
    Ok(())
}
