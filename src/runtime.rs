//! Paced runs on a tokio task.
//!
//! One task owns the [`Simulation`] for the whole run. The next tick is only
//! scheduled after the previous one has been committed and reported, so
//! observers never see two ticks at once.

use std::future::pending;
use std::pin::Pin;

use tokio::{
    sync::{
        mpsc,
        oneshot::{self, error::TryRecvError},
    },
    task::JoinHandle,
    time::{sleep, Instant, Sleep},
};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::debug;

use crate::{
    config::{RunSettings, SimulationConfig},
    disaster::DisasterEvent,
    engine::{Phase, Simulation, TickFrame},
    error::{ConfigError, RunError},
    rng::RandomSource,
    verdict::RunResult,
    world::History,
};

/// Receives progress from a paced run. All calls happen on the run's task.
pub trait RunObserver: Send + 'static {
    fn on_tick(&mut self, frame: &TickFrame, history: &History);

    /// The disaster banner's display time ran out.
    fn on_event_cleared(&mut self, _event: &DisasterEvent) {}

    fn on_finish(&mut self, result: &RunResult);
}

/// Observer assembled from a tick closure and a finish closure.
pub struct Callbacks<T, F> {
    on_tick: T,
    on_finish: F,
}

pub fn callbacks<T, F>(on_tick: T, on_finish: F) -> Callbacks<T, F>
where
    T: FnMut(&TickFrame, &History) + Send + 'static,
    F: FnMut(&RunResult) + Send + 'static,
{
    Callbacks { on_tick, on_finish }
}

impl<T, F> RunObserver for Callbacks<T, F>
where
    T: FnMut(&TickFrame, &History) + Send + 'static,
    F: FnMut(&RunResult) + Send + 'static,
{
    fn on_tick(&mut self, frame: &TickFrame, history: &History) {
        (self.on_tick)(frame, history);
    }

    fn on_finish(&mut self, result: &RunResult) {
        (self.on_finish)(result);
    }
}

pub struct RunHandle {
    cancel: Option<oneshot::Sender<()>>,
    task: JoinHandle<Option<RunResult>>,
}

impl RunHandle {
    /// Stops ticking and drops any pending banner timer. A callback already
    /// in progress completes; none start afterwards.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the run task. `None` means the run was cancelled.
    /// Must not be awaited again once it has returned.
    pub async fn finished(&mut self) -> Result<Option<RunResult>, RunError> {
        Ok((&mut self.task).await?)
    }
}

/// Validates `config` and starts ticking it at `settings.tick_interval`.
pub fn start_run<R, O>(
    config: SimulationConfig,
    settings: RunSettings,
    rng: R,
    observer: O,
) -> Result<RunHandle, ConfigError>
where
    R: RandomSource + Send + 'static,
    O: RunObserver,
{
    let simulation = Simulation::builder(config, rng).settings(settings).build()?;
    Ok(spawn(simulation, observer))
}

/// Runs an already-built simulation on a new task.
pub fn spawn<R, O>(simulation: Simulation<R>, observer: O) -> RunHandle
where
    R: RandomSource + Send + 'static,
    O: RunObserver,
{
    let (cancel_tx, cancel_rx) = oneshot::channel();
    let task = tokio::spawn(drive(simulation, observer, cancel_rx));
    RunHandle {
        cancel: Some(cancel_tx),
        task,
    }
}

async fn drive<R, O>(
    mut simulation: Simulation<R>,
    mut observer: O,
    mut cancel: oneshot::Receiver<()>,
) -> Option<RunResult>
where
    R: RandomSource,
    O: RunObserver,
{
    let tick_interval = simulation.settings().tick_interval;
    let event_display = simulation.settings().event_display;
    let mut next_tick = Box::pin(sleep(tick_interval));
    let mut banner: Option<(DisasterEvent, Pin<Box<Sleep>>)> = None;
    // A dropped handle detaches the run instead of cancelling it.
    let mut cancellable = true;

    loop {
        tokio::select! {
            biased;

            signal = &mut cancel, if cancellable => {
                if signal.is_ok() {
                    debug!(step = simulation.current_step(), "run cancelled");
                    return None;
                }
                cancellable = false;
            }

            _ = async {
                match banner.as_mut() {
                    Some((_, timer)) => timer.as_mut().await,
                    None => pending().await,
                }
            } => {
                if cancel_requested(&mut cancel, &mut cancellable) {
                    debug!(step = simulation.current_step(), "run cancelled");
                    return None;
                }
                if let Some((event, _)) = banner.take() {
                    debug!(kind = %event.kind, "disaster banner cleared");
                    observer.on_event_cleared(&event);
                }
            }

            _ = &mut next_tick => {
                let frame = simulation.step()?;
                if let Some(event) = frame.event {
                    // Replacing the tuple drops any earlier timer.
                    banner = Some((event, Box::pin(sleep(event_display))));
                }
                observer.on_tick(&frame, simulation.history());

                // The handle may have cancelled while `on_tick` was running.
                if cancel_requested(&mut cancel, &mut cancellable) {
                    debug!(step = simulation.current_step(), "run cancelled");
                    return None;
                }
                if simulation.phase() == Phase::Finished {
                    banner = None;
                    let result = simulation.into_result();
                    observer.on_finish(&result);
                    return Some(result);
                }
                next_tick.as_mut().reset(Instant::now() + tick_interval);
            }
        }
    }
}

/// Polls the cancel channel without waiting. A closed channel means the
/// handle was dropped, which detaches the run.
fn cancel_requested(cancel: &mut oneshot::Receiver<()>, cancellable: &mut bool) -> bool {
    if !*cancellable {
        return false;
    }
    match cancel.try_recv() {
        Ok(()) => true,
        Err(TryRecvError::Empty) => false,
        Err(TryRecvError::Closed) => {
            *cancellable = false;
            false
        }
    }
}

/// Progress items produced by [`stream_run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunUpdate {
    Tick(TickFrame),
    EventCleared(DisasterEvent),
    Finished(RunResult),
}

struct ChannelObserver {
    tx: mpsc::UnboundedSender<RunUpdate>,
}

impl RunObserver for ChannelObserver {
    fn on_tick(&mut self, frame: &TickFrame, _history: &History) {
        let _ = self.tx.send(RunUpdate::Tick(*frame));
    }

    fn on_event_cleared(&mut self, event: &DisasterEvent) {
        let _ = self.tx.send(RunUpdate::EventCleared(*event));
    }

    fn on_finish(&mut self, result: &RunResult) {
        let _ = self.tx.send(RunUpdate::Finished(result.clone()));
    }
}

/// Same as [`start_run`], delivered as a single-consumer stream. The stream
/// ends after `Finished`, or early if the run is cancelled.
pub fn stream_run<R>(
    config: SimulationConfig,
    settings: RunSettings,
    rng: R,
) -> Result<(UnboundedReceiverStream<RunUpdate>, RunHandle), ConfigError>
where
    R: RandomSource + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = start_run(config, settings, rng, ChannelObserver { tx })?;
    Ok((UnboundedReceiverStream::new(rx), handle))
}
