use crate::api::{BuildOptions, BuildTarget, Project};
use crate::error::{LoadError, TokenError};
use crate::store::SourceCache;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Coalesces bursts of file events into one rebuild.
///
/// Every event restarts the stability window; a rebuild is due once the
/// window passes with no further events.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending_since: Option<Instant>,
    changed: Vec<PathBuf>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Debouncer {
            window,
            pending_since: None,
            changed: Vec::new(),
        }
    }

    pub fn record(&mut self, paths: impl IntoIterator<Item = PathBuf>, now: Instant) {
        for path in paths {
            if !self.changed.contains(&path) {
                self.changed.push(path);
            }
        }
        self.pending_since = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }

    /// Returns the changed paths once the window has elapsed, and resets.
    pub fn take_ready(&mut self, now: Instant) -> Option<Vec<PathBuf>> {
        let since = self.pending_since?;
        if now.duration_since(since) < self.window {
            return None;
        }
        self.pending_since = None;
        Some(std::mem::take(&mut self.changed))
    }

    /// Drops anything pending without reporting it.
    pub fn clear(&mut self) {
        self.pending_since = None;
        self.changed.clear();
    }
}

fn is_relevant(event: &Event, build_dir: &Path) -> bool {
    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) {
        return false;
    }
    event.paths.iter().any(|path| {
        !path.starts_with(build_dir) && path.extension().and_then(|e| e.to_str()) == Some("json")
    })
}

/// Runs the builds for `targets` whenever a source file changes, until
/// Ctrl+C.
///
/// A failed build is logged and the watcher keeps going, so a half-edited
/// file does not end the session.
pub fn watch(project: &Project, targets: &[BuildTarget], debounce: Duration) -> Result<(), TokenError> {
    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::Relaxed);
    })?;

    // Cache keys must match the absolute paths notify reports.
    let root = std::fs::canonicalize(&project.root).map_err(|source| LoadError::Read {
        path: project.root.clone(),
        source,
    })?;
    let project = Project::new(root, project.config.clone());
    let project = &project;

    let options = BuildOptions::default();
    let mut cache = SourceCache::new();
    run_builds(project, targets, &options, &mut cache);

    let (tx, rx) = channel();
    let mut watcher = notify::recommended_watcher(tx)?;
    let roots = project.watch_roots();
    for root in &roots {
        watcher.watch(root, RecursiveMode::Recursive)?;
        log::info!("watching {}", root.display());
    }

    let build_dir = project.build_dir();
    let mut debouncer = Debouncer::new(debounce);
    while !interrupted.load(Ordering::Relaxed) {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(Ok(event)) => {
                if is_relevant(&event, &build_dir) {
                    log::debug!("change: {:?}", event.paths);
                    debouncer.record(event.paths, Instant::now());
                }
            }
            Ok(Err(err)) => log::warn!("watch error: {err}"),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if let Some(changed) = debouncer.take_ready(Instant::now()) {
            for path in &changed {
                cache.invalidate(path);
            }
            log::info!("{} file(s) changed, rebuilding", changed.len());
            run_builds(project, targets, &options, &mut cache);
        }
    }

    debouncer.clear();
    for root in &roots {
        if let Err(err) = watcher.unwatch(root) {
            log::debug!("unwatch {}: {err}", root.display());
        }
    }
    log::info!("stopped watching");
    Ok(())
}

fn run_builds(project: &Project, targets: &[BuildTarget], options: &BuildOptions, cache: &mut SourceCache) {
    for target in targets {
        match project.build(target, options, cache) {
            Ok(summary) => log::info!(
                "{target} build finished, {} file(s) written",
                summary.written.len()
            ),
            Err(err) => log::error!("{target} build failed: {:?}", miette::Report::new(err)),
        }
    }
}
