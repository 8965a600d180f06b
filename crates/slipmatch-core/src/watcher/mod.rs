pub mod clock;

use crate::config::Config;
use crate::error::SlipmatchError;
use crate::folder::{is_hidden, same_file_name, WatchedFolder};
use clock::{Clock, SystemClock};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Receives a completed pair. Roles are not known yet at this point.
pub trait PairDispatcher {
    /// Process the pair and return the number of orders produced.
    fn dispatch(&mut self, first: &Path, second: &Path) -> Result<usize, SlipmatchError>;
}

/// The first file of a pair, waiting for its partner.
#[derive(Debug, Clone)]
pub struct PairingSession {
    pub first_path: PathBuf,
    pub first_arrival: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingState {
    Idle,
    AwaitingSecond,
}

/// What an arrival did to the watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Hidden file, directory or a file already cleared away.
    Ignored,
    /// First file of a pair recorded.
    Armed { path: PathBuf },
    /// Pair processed; its two files removed.
    Dispatched {
        first: PathBuf,
        second: PathBuf,
        orders: usize,
    },
    /// Pair failed; the error has been logged and its two files removed.
    JobFailed {
        first: PathBuf,
        second: PathBuf,
        reason: String,
    },
    /// The partner came too late. The old file was deleted and the new one
    /// is now waiting for a partner.
    StaleReplaced { stale: Vec<PathBuf>, path: PathBuf },
    /// More than two files were present; all were removed.
    AnomalyCleared { count: usize },
}

/// Pairing protocol for the watched folder.
///
/// The packing-slip PDF and the shipping-label PDF arrive as two separate
/// print jobs. The first file arms a session; a second file within the pair
/// timeout completes it and the pair is dispatched. A late second file
/// replaces the stale first one, and more than two files clear the folder.
pub struct PairingWatcher<C: Clock = SystemClock> {
    folder: WatchedFolder,
    session: Option<PairingSession>,
    pair_timeout: Duration,
    anomaly_grace: Duration,
    settle_delay: Duration,
    clock: C,
}

impl PairingWatcher<SystemClock> {
    pub fn new(folder: WatchedFolder, config: &Config) -> Self {
        Self::with_clock(folder, config, SystemClock)
    }
}

impl<C: Clock> PairingWatcher<C> {
    pub fn with_clock(folder: WatchedFolder, config: &Config, clock: C) -> Self {
        PairingWatcher {
            folder,
            session: None,
            pair_timeout: config.pair_timeout(),
            anomaly_grace: config.anomaly_grace(),
            settle_delay: config.settle_delay(),
            clock,
        }
    }

    pub fn state(&self) -> PairingState {
        match self.session {
            Some(_) => PairingState::AwaitingSecond,
            None => PairingState::Idle,
        }
    }

    pub fn session(&self) -> Option<&PairingSession> {
        self.session.as_ref()
    }

    pub fn folder(&self) -> &WatchedFolder {
        &self.folder
    }

    /// Prepare the watched folder and go idle.
    pub fn start(&mut self) -> Result<(), SlipmatchError> {
        if self.folder.prepare()? {
            tracing::warn!(
                folder = %self.folder.path().display(),
                "created the watched folder; point the virtual printer's output at it"
            );
        }
        self.session = None;
        tracing::info!(folder = %self.folder.path().display(), "ready to receive a new PDF pair");
        Ok(())
    }

    /// Drop the session and clear the folder, e.g. after an unexpected error.
    pub fn reset(&mut self) -> Result<(), SlipmatchError> {
        self.session = None;
        self.folder.clear()?;
        Ok(())
    }

    /// React to a file-created event.
    ///
    /// Must not be called concurrently; the caller serializes arrivals.
    pub fn handle_arrival(
        &mut self,
        path: &Path,
        dispatcher: &mut dyn PairDispatcher,
    ) -> Result<Transition, SlipmatchError> {
        let hidden = path
            .file_name()
            .map(|n| is_hidden(&n.to_string_lossy()))
            .unwrap_or(true);
        if hidden || !path.is_file() {
            tracing::debug!(path = %path.display(), "ignoring event");
            return Ok(Transition::Ignored);
        }

        tracing::info!(path = %path.display(), "started receiving PDF");

        let files = self.folder.files()?;
        let now = self.clock.now();

        match files.len() {
            0 => Ok(Transition::Ignored),
            1 => Ok(self.arm(path, now)),
            2 => {
                let partner = match self.session.take() {
                    Some(session)
                        if !same_file_name(&session.first_path, path)
                            && files.iter().any(|f| same_file_name(f, &session.first_path)) =>
                    {
                        let waited = now.saturating_duration_since(session.first_arrival);
                        if waited > self.pair_timeout {
                            return self.replace_stale(path, waited, now);
                        }
                        session.first_path
                    }
                    // Both files landed before the first event was handled.
                    _ => match files.into_iter().find(|f| !same_file_name(f, path)) {
                        Some(other) => other,
                        None => return Ok(self.arm(path, now)),
                    },
                };
                self.dispatch(partner, path, dispatcher)
            }
            count => self.clear_anomaly(count),
        }
    }

    fn arm(&mut self, path: &Path, now: Instant) -> Transition {
        self.session = Some(PairingSession {
            first_path: path.to_path_buf(),
            first_arrival: now,
        });
        tracing::info!(
            path = %path.display(),
            timeout_secs = self.pair_timeout.as_secs(),
            "first PDF of a pair received; waiting for its partner"
        );
        Transition::Armed {
            path: path.to_path_buf(),
        }
    }

    fn replace_stale(
        &mut self,
        path: &Path,
        waited: Duration,
        now: Instant,
    ) -> Result<Transition, SlipmatchError> {
        let stale = self.folder.clear_except(path)?;
        tracing::warn!(
            waited_secs = waited.as_secs(),
            stale = ?stale,
            "partner arrived after the pair timeout; discarded the stale PDF"
        );
        self.arm(path, now);
        Ok(Transition::StaleReplaced {
            stale,
            path: path.to_path_buf(),
        })
    }

    fn dispatch(
        &mut self,
        first: PathBuf,
        second: &Path,
        dispatcher: &mut dyn PairDispatcher,
    ) -> Result<Transition, SlipmatchError> {
        if !self.settle_delay.is_zero() {
            std::thread::sleep(self.settle_delay);
        }

        let outcome = dispatcher.dispatch(&first, second);
        self.session = None;
        // Only the pair; files that arrived mid-job still have queued events.
        let cleared = self.folder.remove(&[first.as_path(), second]);

        let transition = match outcome {
            Ok(orders) => {
                tracing::info!(orders, "print job completed");
                Transition::Dispatched {
                    first,
                    second: second.to_path_buf(),
                    orders,
                }
            }
            Err(e) => {
                if e.is_job_fatal() {
                    tracing::error!(error = %e, "job abandoned; resubmit both PDFs");
                } else {
                    tracing::error!(error = %e, "job could not run; resubmit both PDFs");
                }
                Transition::JobFailed {
                    first,
                    second: second.to_path_buf(),
                    reason: e.to_string(),
                }
            }
        };

        cleared?;
        let waiting = self.folder.files()?;
        if !waiting.is_empty() {
            tracing::info!(waiting = ?waiting, "PDFs arrived during the job; handling them next");
        }
        tracing::info!("ready to receive a new PDF pair");
        Ok(transition)
    }

    fn clear_anomaly(&mut self, count: usize) -> Result<Transition, SlipmatchError> {
        tracing::error!(
            count,
            folder = %self.folder.path().display(),
            "more than two files in the watched folder; clearing it"
        );
        if !self.anomaly_grace.is_zero() {
            std::thread::sleep(self.anomaly_grace);
        }
        self.session = None;
        self.folder.clear()?;
        tracing::info!("ready to receive a new PDF pair");
        Ok(Transition::AnomalyCleared { count })
    }
}
