use crate::config::Config;
use crate::error::SlipmatchError;
use crate::folder::WatchedFolder;
use crate::pipeline::{OrderSink, Pipeline};
use crate::watcher::clock::Clock;
use crate::watcher::{PairDispatcher, PairingWatcher, Transition};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};

/// Runs the pipeline on each dispatched pair and hands records to a sink.
pub struct PipelineDispatcher<'a> {
    pipeline: &'a Pipeline,
    sink: &'a mut dyn OrderSink,
}

impl<'a> PipelineDispatcher<'a> {
    pub fn new(pipeline: &'a Pipeline, sink: &'a mut dyn OrderSink) -> Self {
        PipelineDispatcher { pipeline, sink }
    }
}

impl PairDispatcher for PipelineDispatcher<'_> {
    fn dispatch(&mut self, first: &Path, second: &Path) -> Result<usize, SlipmatchError> {
        self.pipeline.process(first, second, self.sink)
    }
}

/// Message on the service queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Created(PathBuf),
    Shutdown,
}

/// Asks a running [`WatchService`] to stop once the current job is done.
#[derive(Debug, Clone)]
pub struct ShutdownHandle(Sender<WatchEvent>);

impl ShutdownHandle {
    pub fn shutdown(&self) {
        // Service already gone.
        let _ = self.0.send(WatchEvent::Shutdown);
    }
}

/// Long-running watch service.
///
/// notify's watcher thread only forwards "file created" paths into the queue.
/// The thread calling [`WatchService::run`] is the single consumer and the
/// only owner of the [`PairingWatcher`], so arrivals are handled one at a time
/// and arrivals during a running job wait in the queue.
pub struct WatchService {
    tx: Sender<WatchEvent>,
    rx: Receiver<WatchEvent>,
}

impl WatchService {
    pub fn new() -> Self {
        let (tx, rx) = channel();
        WatchService { tx, rx }
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(self.tx.clone())
    }

    /// Watch `config.watch_dir` and process pairs until shut down.
    pub fn run(
        self,
        config: &Config,
        pipeline: &Pipeline,
        sink: &mut dyn OrderSink,
    ) -> Result<(), SlipmatchError> {
        let (rasterizer, recognizer) = pipeline.backend_names();
        tracing::info!(rasterizer, recognizer, "starting watch service");

        let mut watcher = PairingWatcher::new(WatchedFolder::new(&config.watch_dir), config);
        watcher.start()?;

        let WatchService { tx, rx } = self;
        let mut fs_watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            forward_created(res, &tx)
        })?;
        fs_watcher.watch(&config.watch_dir, RecursiveMode::NonRecursive)?;

        let mut dispatcher = PipelineDispatcher::new(pipeline, sink);
        drain(&mut watcher, rx, &mut dispatcher);

        tracing::info!("stopping the file watcher");
        drop(fs_watcher);
        tracing::info!("watch service stopped");
        Ok(())
    }
}

impl Default for WatchService {
    fn default() -> Self {
        Self::new()
    }
}

fn forward_created(res: notify::Result<Event>, tx: &Sender<WatchEvent>) {
    match res {
        Ok(event) if matches!(event.kind, EventKind::Create(_)) => {
            for path in event.paths {
                // Receiver gone means the service is shutting down.
                let _ = tx.send(WatchEvent::Created(path));
            }
        }
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "file watcher error"),
    }
}

/// Handle queued arrivals in order until a shutdown request or until every
/// sender has hung up.
///
/// An error while handling an arrival is logged and the watcher is reset, so
/// the service never stays in a half-cleared state.
pub fn drain<C: Clock>(
    watcher: &mut PairingWatcher<C>,
    events: Receiver<WatchEvent>,
    dispatcher: &mut dyn PairDispatcher,
) -> Vec<Transition> {
    let mut transitions = Vec::new();

    for event in events {
        let path = match event {
            WatchEvent::Created(path) => path,
            WatchEvent::Shutdown => {
                tracing::info!("shutdown requested");
                break;
            }
        };

        match watcher.handle_arrival(&path, dispatcher) {
            Ok(transition) => {
                tracing::debug!(?transition, "handled arrival");
                transitions.push(transition);
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to handle arrival; clearing the watched folder");
                if let Err(e) = watcher.reset() {
                    tracing::error!(error = %e, "failed to clear the watched folder");
                }
            }
        }
    }

    transitions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watcher::clock::ManualClock;
    use std::fs;

    struct CountingDispatcher(usize);

    impl PairDispatcher for CountingDispatcher {
        fn dispatch(&mut self, _first: &Path, _second: &Path) -> Result<usize, SlipmatchError> {
            self.0 += 1;
            Ok(1)
        }
    }

    fn watcher(dir: &Path) -> PairingWatcher<ManualClock> {
        let config = Config {
            anomaly_grace_ms: 0,
            ..Config::default()
        };
        let mut watcher =
            PairingWatcher::with_clock(WatchedFolder::new(dir), &config, ManualClock::new());
        watcher.start().unwrap();
        watcher
    }

    fn drop_pdf(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"%PDF").unwrap();
        path
    }

    fn drain_events(
        watcher: &mut PairingWatcher<ManualClock>,
        events: Vec<WatchEvent>,
        dispatcher: &mut dyn PairDispatcher,
    ) -> Vec<Transition> {
        let (tx, rx) = channel();
        for event in events {
            tx.send(event).unwrap();
        }
        drop(tx);
        drain(watcher, rx, dispatcher)
    }

    #[test]
    fn test_drain_arms_then_dispatches() {
        let tmp = tempfile::tempdir().unwrap();
        let mut watcher = watcher(tmp.path());
        let mut dispatcher = CountingDispatcher(0);

        let a = drop_pdf(tmp.path(), "a.pdf");
        let t = drain_events(&mut watcher, vec![WatchEvent::Created(a.clone())], &mut dispatcher);
        assert_eq!(t, vec![Transition::Armed { path: a.clone() }]);

        let b = drop_pdf(tmp.path(), "b.pdf");
        let t = drain_events(&mut watcher, vec![WatchEvent::Created(b.clone())], &mut dispatcher);
        assert_eq!(
            t,
            vec![Transition::Dispatched {
                first: a,
                second: b,
                orders: 1
            }]
        );
        assert_eq!(dispatcher.0, 1);
    }

    #[test]
    fn test_drain_pairs_files_that_landed_together() {
        let tmp = tempfile::tempdir().unwrap();
        let mut watcher = watcher(tmp.path());
        let mut dispatcher = CountingDispatcher(0);

        let a = drop_pdf(tmp.path(), "a.pdf");
        let b = drop_pdf(tmp.path(), "b.pdf");
        let t = drain_events(
            &mut watcher,
            vec![WatchEvent::Created(a.clone()), WatchEvent::Created(b.clone())],
            &mut dispatcher,
        );

        assert_eq!(
            t,
            vec![
                Transition::Dispatched {
                    first: b,
                    second: a,
                    orders: 1
                },
                Transition::Ignored
            ]
        );
        assert_eq!(dispatcher.0, 1);
        assert_eq!(watcher.folder().count().unwrap(), 0);
    }

    #[test]
    fn test_shutdown_stops_draining() {
        let tmp = tempfile::tempdir().unwrap();
        let mut watcher = watcher(tmp.path());
        let mut dispatcher = CountingDispatcher(0);

        let service = WatchService::new();
        let handle = service.shutdown_handle();
        let a = drop_pdf(tmp.path(), "a.pdf");
        service.tx.send(WatchEvent::Created(a.clone())).unwrap();
        handle.shutdown();
        let b = drop_pdf(tmp.path(), "b.pdf");
        service.tx.send(WatchEvent::Created(b)).unwrap();

        // The service keeps its own sender, so only the shutdown ends the loop.
        let t = drain(&mut watcher, service.rx, &mut dispatcher);
        assert_eq!(t, vec![Transition::Armed { path: a }]);
        assert_eq!(dispatcher.0, 0);
    }

    #[test]
    fn test_forward_created_only() {
        let (tx, rx) = channel();
        let created = Event::new(EventKind::Create(notify::event::CreateKind::File))
            .add_path(PathBuf::from("/watch/a.pdf"));
        let modified = Event::new(EventKind::Modify(notify::event::ModifyKind::Any))
            .add_path(PathBuf::from("/watch/a.pdf"));

        forward_created(Ok(created), &tx);
        forward_created(Ok(modified), &tx);
        drop(tx);

        let events: Vec<WatchEvent> = rx.iter().collect();
        assert_eq!(events, vec![WatchEvent::Created(PathBuf::from("/watch/a.pdf"))]);
    }
}
