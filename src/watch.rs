//! Watch mode.
//!
//! Regenerates whenever an icon source or the config file changes. Bursts of
//! changes (an editor's save, a `git checkout`) are coalesced: a cycle starts
//! only after a quiet period of `watch.debounce_ms` with no further change.
//!
//! ## State machine
//!
//! ```text
//!            Change                       Tick ≥ deadline
//!   Idle ───────────▶ Debouncing ──────────────────────────▶ Generating
//!    ▲                 │    ▲ Change (deadline reset)           │   │
//!    │                 └────┘                        Change     │   │
//!    │                                         (pending = true) │   │
//!    │       Finished, nothing pending                          ◀───┘
//!    └──────────────────────────────────────────────────────────┘
//!            Finished with pending ──▶ Debouncing
//!
//!   any state ── Stop ──▶ Stopped
//! ```
//!
//! [`Session`] is the pure state machine and takes explicit [`Instant`]s, so
//! it is tested without real time. [`drive`] feeds it from a channel of
//! changed paths; [`watch`] connects that channel to `notify`.
//!
//! Cycles never overlap: a change that arrives while one runs only marks a
//! follow-up. A failed cycle is reported and the session keeps watching.
//! Options are resolved afresh for every cycle, so config edits apply
//! without a restart.

use crate::cache::Reconciled;
use crate::config::{self, Config, ResolveRequest, SkipFirstCleanup};
use crate::error::Error;
use crate::font::FontConverter;
use crate::pipeline::{self, CycleReport};
use crate::scan;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

/// Longest the driver blocks before re-checking the stop flag.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

// ============================================================================
// State machine
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Debouncing { deadline: Instant },
    Generating { pending: bool },
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchInput {
    /// A relevant file changed.
    Change(Instant),
    /// Time passed with nothing else happening.
    Tick(Instant),
    /// The running cycle ended (successfully or not).
    Finished(Instant),
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Generate,
}

#[derive(Debug)]
pub struct Session {
    state: WatchState,
    debounce: Duration,
}

impl Session {
    pub fn new(debounce: Duration) -> Self {
        Self {
            state: WatchState::Idle,
            debounce,
        }
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    /// When the pending debounce window closes, if one is open.
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            WatchState::Debouncing { deadline } => Some(deadline),
            _ => None,
        }
    }

    /// Begin the session, generating immediately when `run_first` is set.
    pub fn start(&mut self, run_first: bool) -> Option<Action> {
        if run_first && self.state == WatchState::Idle {
            self.state = WatchState::Generating { pending: false };
            Some(Action::Generate)
        } else {
            None
        }
    }

    pub fn step(&mut self, input: WatchInput) -> Option<Action> {
        use WatchInput::*;
        use WatchState::*;

        match (self.state, input) {
            (Stopped, _) => None,
            (_, Stop) => {
                self.state = Stopped;
                None
            }
            (Idle | Debouncing { .. }, Change(at)) => {
                self.state = Debouncing {
                    deadline: at + self.debounce,
                };
                None
            }
            (Debouncing { deadline }, Tick(now)) if now >= deadline => {
                self.state = Generating { pending: false };
                Some(Action::Generate)
            }
            (Generating { .. }, Change(_)) => {
                self.state = Generating { pending: true };
                None
            }
            (Generating { pending }, Finished(at)) => {
                self.state = if pending {
                    Debouncing {
                        deadline: at + self.debounce,
                    }
                } else {
                    Idle
                };
                None
            }
            _ => None,
        }
    }
}

// ============================================================================
// Stop signal
// ============================================================================

/// Cloneable flag that ends a watch session between cycles.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Driver
// ============================================================================

/// What the driver needs from the thing it regenerates.
pub trait CycleRunner {
    /// Whether a change to `path` should trigger a cycle.
    fn is_relevant(&self, path: &Path) -> bool;

    /// Run one cycle to completion. Failures are the runner's to report.
    fn run_cycle(&mut self);
}

/// Run the session until stopped or the event channel closes.
pub fn drive(
    events: &Receiver<Vec<PathBuf>>,
    session: &mut Session,
    stop: &StopHandle,
    runner: &mut impl CycleRunner,
    run_first: bool,
) {
    if session.start(run_first).is_some() {
        generate(events, session, runner);
    }

    loop {
        if stop.is_stopped() {
            session.step(WatchInput::Stop);
            break;
        }

        let wait = session
            .next_deadline()
            .map(|d| d.saturating_duration_since(Instant::now()))
            .unwrap_or(POLL_INTERVAL)
            .min(POLL_INTERVAL);

        match events.recv_timeout(wait) {
            Ok(paths) => note_changes(session, runner, &paths),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                log::warn!("File watcher stopped delivering events");
                session.step(WatchInput::Stop);
                break;
            }
        }

        if session.step(WatchInput::Tick(Instant::now())).is_some() {
            generate(events, session, runner);
        }
    }
}

fn generate(events: &Receiver<Vec<PathBuf>>, session: &mut Session, runner: &mut impl CycleRunner) {
    runner.run_cycle();
    // Changes made while the cycle ran.
    while let Ok(paths) = events.try_recv() {
        note_changes(session, runner, &paths);
    }
    session.step(WatchInput::Finished(Instant::now()));
}

fn note_changes(session: &mut Session, runner: &impl CycleRunner, paths: &[PathBuf]) {
    if let Some(path) = paths.iter().find(|p| runner.is_relevant(p)) {
        log::debug!("Changed: {}", path.display());
        session.step(WatchInput::Change(Instant::now()));
    } else {
        log::trace!("Ignoring change to {:?}", paths);
    }
}

// ============================================================================
// Filesystem wiring
// ============================================================================

/// Which changed paths matter for a resolved config.
#[derive(Debug, Clone)]
pub struct EventFilter {
    input: PathBuf,
    config_file: Option<PathBuf>,
}

impl EventFilter {
    pub fn new(config: &Config) -> Self {
        Self {
            input: config.input.clone(),
            config_file: config.config_file.clone(),
        }
    }

    /// The config file, or an eligible source directly in the input
    /// directory. Generated files never qualify: fonts and templates are
    /// not `.svg`/`.eps` unless SVG fonts go to the input directory, which
    /// config validation rejects.
    pub fn is_relevant(&self, path: &Path) -> bool {
        if self.config_file.as_deref() == Some(path) {
            return true;
        }
        path.parent() == Some(self.input.as_path()) && scan::is_source_path(path)
    }
}

/// Reported to the [`watch`] callback.
#[derive(Debug)]
pub enum WatchEvent<'a> {
    /// Startup cleanup under `skip_first_cleanup = "reconcile"`.
    Reconciled(&'a Result<Reconciled, Error>),
    Cycle(&'a Result<CycleReport, Error>),
}

struct PipelineRunner<'a, C, F> {
    request: &'a ResolveRequest,
    converter: &'a C,
    filter: EventFilter,
    on_event: F,
}

impl<C, F> CycleRunner for PipelineRunner<'_, C, F>
where
    C: FontConverter,
    F: FnMut(WatchEvent<'_>),
{
    fn is_relevant(&self, path: &Path) -> bool {
        self.filter.is_relevant(path)
    }

    fn run_cycle(&mut self) {
        let outcome = config::resolve(self.request)
            .map_err(Error::from)
            .and_then(|config| {
                self.filter = EventFilter::new(&config);
                pipeline::run_cycle(self.converter, &config)
            });
        if let Err(e) = &outcome {
            log::debug!("Cycle failed ({}): {}", e.category(), e);
        }
        (self.on_event)(WatchEvent::Cycle(&outcome));
    }
}

/// Watch the project and regenerate on change until `stop` is set.
///
/// Options that fail to resolve at startup are returned as an error before
/// anything is watched; after that every failure goes to `on_event` and the
/// session continues.
pub fn watch<C, F>(
    request: &ResolveRequest,
    converter: &C,
    stop: &StopHandle,
    mut on_event: F,
) -> Result<(), Error>
where
    C: FontConverter,
    F: FnMut(WatchEvent<'_>),
{
    let config = config::resolve(request)?;

    let (tx, rx) = mpsc::channel::<Vec<PathBuf>>();
    let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
        match result {
            Ok(event)
                if matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                ) =>
            {
                if tx.send(event.paths).is_err() {
                    log::trace!("Watch session ended; dropping event");
                }
            }
            Ok(_) => {}
            Err(e) => log::warn!("Watch error: {}", e),
        }
    })?;

    watcher.watch(&config.input, RecursiveMode::NonRecursive)?;
    if let Some(dir) = config.config_file.as_deref().and_then(Path::parent)
        && dir != config.input
    {
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
    }
    log::info!("Watching {} for changes", config.input.display());

    let run_first = match (config.watch.skip_first, config.watch.skip_first_cleanup) {
        (false, _) => true,
        (true, SkipFirstCleanup::Skip) => false,
        (true, SkipFirstCleanup::Reconcile) => {
            on_event(WatchEvent::Reconciled(&pipeline::reconcile_only(&config)));
            false
        }
    };

    let mut session = Session::new(config.watch.debounce);
    let mut runner = PipelineRunner {
        request,
        converter,
        filter: EventFilter::new(&config),
        on_event,
    };
    drive(&rx, &mut session, stop, &mut runner, run_first);
    log::info!("Stopped watching");
    Ok(())
}
