use std::{
    sync::{mpsc, Arc, Mutex},
    thread,
    time::Duration,
};

use tokio_stream::StreamExt;

use ecobalance::{
    config::RunSettings,
    disaster::{DisasterEvent, DisasterKind},
    engine::TickFrame,
    rng::ScriptedRandom,
    runtime::{self, callbacks, RunObserver, RunUpdate},
    verdict::{Verdict, GOLDEN_RATIO},
    ConfigError, GameMode, History, PopulationSnapshot, RunResult, SimulationConfig,
};

#[derive(Debug, Clone, PartialEq)]
enum Seen {
    Tick(u32, Option<DisasterKind>),
    Cleared(DisasterKind),
    Finished(Verdict),
}

#[derive(Clone, Default)]
struct Recorder {
    log: Arc<Mutex<Vec<Seen>>>,
}

impl Recorder {
    fn seen(&self) -> Vec<Seen> {
        self.log.lock().unwrap().clone()
    }

    fn ticks(&self) -> usize {
        self.seen()
            .iter()
            .filter(|s| matches!(s, Seen::Tick(..)))
            .count()
    }
}

impl RunObserver for Recorder {
    fn on_tick(&mut self, frame: &TickFrame, history: &History) {
        assert_eq!(history.len(), frame.step as usize + 1);
        assert_eq!(history.latest(), frame.snapshot);
        self.log
            .lock()
            .unwrap()
            .push(Seen::Tick(frame.step, frame.event.map(|e| e.kind)));
    }

    fn on_event_cleared(&mut self, event: &DisasterEvent) {
        self.log.lock().unwrap().push(Seen::Cleared(event.kind));
    }

    fn on_finish(&mut self, result: &RunResult) {
        self.log.lock().unwrap().push(Seen::Finished(result.verdict));
    }
}

#[tokio::test(start_paused = true)]
async fn paced_run_reports_every_tick_then_finishes() {
    let recorder = Recorder::default();
    let config = SimulationConfig::new(GameMode::Normal, GOLDEN_RATIO);
    let mut handle = runtime::start_run(
        config,
        RunSettings::for_mode(GameMode::Normal),
        ScriptedRandom::constant(0.5),
        recorder.clone(),
    )
    .unwrap();

    let result = handle.finished().await.unwrap().expect("run completes");
    assert_eq!(result.verdict, Verdict::Success);

    let seen = recorder.seen();
    assert_eq!(seen.len(), 101);
    assert_eq!(seen[0], Seen::Tick(1, None));
    assert_eq!(seen[99], Seen::Tick(100, None));
    assert_eq!(seen[100], Seen::Finished(Verdict::Success));
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_ticking_without_finishing() {
    let recorder = Recorder::default();
    let config = SimulationConfig::new(GameMode::Hard, PopulationSnapshot::new(120, 45, 10, 25));
    let mut handle = runtime::start_run(
        config,
        RunSettings::for_mode(GameMode::Hard),
        ScriptedRandom::constant(0.5),
        recorder.clone(),
    )
    .unwrap();

    tokio::time::sleep(Duration::from_millis(1_050)).await;
    handle.cancel();
    assert_eq!(handle.finished().await.unwrap(), None);

    assert!(handle.is_finished());

    let ticks = recorder.ticks();
    assert!((1..100).contains(&ticks), "saw {ticks} ticks");
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(recorder.ticks(), ticks);
    assert!(!recorder
        .seen()
        .iter()
        .any(|s| matches!(s, Seen::Finished(_))));
}

#[tokio::test(start_paused = true)]
async fn disaster_banner_clears_after_display_time() {
    let recorder = Recorder::default();
    let config = SimulationConfig::new(GameMode::Hard, PopulationSnapshot::new(120, 58, 13, 25));
    let mut settings = RunSettings::for_mode(GameMode::Hard);
    settings.event_display = Duration::from_millis(4_100);
    let mut handle = runtime::start_run(
        config,
        settings,
        ScriptedRandom::new([0.0, 0.6], 0.9),
        recorder.clone(),
    )
    .unwrap();
    let result = handle.finished().await.unwrap().unwrap();
    assert_eq!(result.verdict, Verdict::Success);

    let seen = recorder.seen();
    let struck = seen
        .iter()
        .position(|s| *s == Seen::Tick(21, Some(DisasterKind::Typhoon)))
        .expect("typhoon at step 21");
    let cleared = seen
        .iter()
        .position(|s| *s == Seen::Cleared(DisasterKind::Typhoon))
        .expect("banner cleared");
    // 200 ms ticks, struck at 4.2 s, cleared at 8.3 s between ticks 41 and 42.
    assert_eq!(seen[cleared - 1], Seen::Tick(41, None));
    assert!(struck < cleared);
    assert_eq!(seen.last(), Some(&Seen::Finished(Verdict::Success)));
}

#[tokio::test(start_paused = true)]
async fn banner_still_showing_at_run_end_is_dropped() {
    let recorder = Recorder::default();
    let config = SimulationConfig::new(GameMode::Hard, GOLDEN_RATIO);
    let mut settings = RunSettings::for_mode(GameMode::Hard);
    settings.event_display = Duration::from_secs(3_600);
    // Quiet until step 69, the last step inside the window.
    let script = [0.9; 48].into_iter().chain([0.0, 0.1]);
    let mut handle = runtime::start_run(
        config,
        settings,
        ScriptedRandom::new(script, 0.9),
        recorder.clone(),
    )
    .unwrap();
    handle.finished().await.unwrap().unwrap();

    let seen = recorder.seen();
    assert!(seen.contains(&Seen::Tick(69, Some(DisasterKind::Drought))));
    assert!(!seen.iter().any(|s| matches!(s, Seen::Cleared(_))));
}

#[tokio::test(start_paused = true)]
async fn closures_work_as_observers() {
    let ticks = Arc::new(Mutex::new(0u32));
    let finished = Arc::new(Mutex::new(None));
    let (t, f) = (ticks.clone(), finished.clone());
    let settings =
        RunSettings::with_steps(GameMode::Normal, 10).with_tick_interval(Duration::from_millis(5));
    let mut handle = runtime::start_run(
        SimulationConfig::new(GameMode::Normal, PopulationSnapshot::suggested()),
        settings,
        ScriptedRandom::constant(0.5),
        callbacks(
            move |_, _| *t.lock().unwrap() += 1,
            move |result: &RunResult| *f.lock().unwrap() = Some(result.final_snapshot),
        ),
    )
    .unwrap();
    let result = handle.finished().await.unwrap().unwrap();
    assert_eq!(*ticks.lock().unwrap(), 10);
    assert_eq!(*finished.lock().unwrap(), Some(result.final_snapshot));
}

#[tokio::test(start_paused = true)]
async fn stream_yields_ticks_then_result() {
    let (stream, _handle) = runtime::stream_run(
        SimulationConfig::new(GameMode::Normal, GOLDEN_RATIO),
        RunSettings::for_mode(GameMode::Normal),
        ScriptedRandom::constant(0.5),
    )
    .unwrap();
    let updates: Vec<RunUpdate> = stream.collect().await;
    assert_eq!(updates.len(), 101);
    assert!(updates[..100]
        .iter()
        .all(|u| matches!(u, RunUpdate::Tick(frame) if frame.snapshot == GOLDEN_RATIO)));
    match updates.last() {
        Some(RunUpdate::Finished(result)) => assert!(result.is_success()),
        other => panic!("expected result, got {other:?}"),
    }
}

#[tokio::test]
async fn invalid_start_never_spawns() {
    let config = SimulationConfig::new(GameMode::Normal, PopulationSnapshot::new(0, 0, 0, 101));
    let err = runtime::start_run(
        config,
        RunSettings::for_mode(GameMode::Normal),
        ScriptedRandom::constant(0.5),
        Recorder::default(),
    )
    .err()
    .expect("decomposer above 100 is rejected");
    assert!(matches!(err, ConfigError::OutOfRange { value: 101, .. }));

    let zero_steps = runtime::start_run(
        SimulationConfig::new(GameMode::Normal, GOLDEN_RATIO),
        RunSettings::with_steps(GameMode::Normal, 0),
        ScriptedRandom::constant(0.5),
        Recorder::default(),
    );
    assert!(matches!(zero_steps.err(), Some(ConfigError::NoSteps)));
}

/// A [`Recorder`] that reports each tick as it starts and then stalls in it.
struct SlowTick {
    recorder: Recorder,
    entered: mpsc::Sender<()>,
}

impl RunObserver for SlowTick {
    fn on_tick(&mut self, frame: &TickFrame, history: &History) {
        self.recorder.on_tick(frame, history);
        let _ = self.entered.send(());
        thread::sleep(Duration::from_millis(300));
    }

    fn on_finish(&mut self, result: &RunResult) {
        self.recorder.on_finish(result);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancel_during_last_tick_skips_finish() {
    let recorder = Recorder::default();
    let (entered_tx, entered_rx) = mpsc::channel();
    let settings = RunSettings::with_steps(GameMode::Normal, 1)
        .with_tick_interval(Duration::from_millis(10));
    let mut handle = runtime::start_run(
        SimulationConfig::new(GameMode::Normal, GOLDEN_RATIO),
        settings,
        ScriptedRandom::constant(0.5),
        SlowTick {
            recorder: recorder.clone(),
            entered: entered_tx,
        },
    )
    .unwrap();

    tokio::task::spawn_blocking(move || entered_rx.recv())
        .await
        .unwrap()
        .expect("final tick started");
    handle.cancel();
    assert_eq!(recorder.seen(), vec![Seen::Tick(1, None)]);

    assert_eq!(handle.finished().await.unwrap(), None);
    assert_eq!(recorder.seen(), vec![Seen::Tick(1, None)]);
}
