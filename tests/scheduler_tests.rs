//! Periodic scheduler behavior against real Tokio timers.
//!
//! Periods are short and assertions leave generous slack so the tests hold
//! on a loaded machine.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread;
use std::time::{Duration, Instant};
use tickstate::builder::{periodic_transition, StateMachineBuilder};
use tickstate::config::{OverlapPolicy, SchedulerConfig};
use tickstate::core::{Event, State};
use tickstate::engine::{FireError, HandlerError, StateMachine, Transition};
use tickstate::scheduler::{PeriodicEventScheduler, TickError, TickFailure};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Poll `done` until it holds, failing the test after a generous deadline.
async fn wait_until(what: &str, mut done: impl FnMut() -> bool) {
    let waited = tokio::time::timeout(Duration::from_secs(5), async {
        while !done() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "timed out waiting for {what}");
}

type Failures = Arc<Mutex<Vec<TickFailure>>>;

fn collecting_scheduler(config: SchedulerConfig) -> (PeriodicEventScheduler, Failures) {
    let failures: Failures = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&failures);
    let scheduler = PeriodicEventScheduler::new(config)
        .with_failure_sink(move |failure: TickFailure| sink.lock().unwrap().push(failure));
    (scheduler, failures)
}

/// Self-loop on a periodic event whose handler sleeps for `work`, recording
/// when each invocation started and ended and the peak concurrency.
struct SlowLoop {
    machine: Arc<StateMachine>,
    spans: Arc<Mutex<Vec<(Instant, Instant)>>>,
    max_active: Arc<AtomicUsize>,
}

fn slow_loop(period: Duration, work: Duration) -> SlowLoop {
    let spans = Arc::new(Mutex::new(Vec::new()));
    let active = Arc::new(AtomicUsize::new(0));
    let max_active = Arc::new(AtomicUsize::new(0));

    let handler = {
        let spans = Arc::clone(&spans);
        let max_active = Arc::clone(&max_active);
        move |_: &Event| -> Result<(), HandlerError> {
            let started = Instant::now();
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            max_active.fetch_max(now, Ordering::SeqCst);
            thread::sleep(work);
            active.fetch_sub(1, Ordering::SeqCst);
            spans.lock().unwrap().push((started, Instant::now()));
            Ok(())
        }
    };

    let machine = StateMachineBuilder::new(["WORKING"], "WORKING")
        .transition(
            Transition::builder()
                .name("work")
                .from("WORKING")
                .to("WORKING")
                .every(period)
                .handler(handler),
        )
        .unwrap()
        .build()
        .unwrap();

    SlowLoop {
        machine: Arc::new(machine),
        spans,
        max_active,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn periodic_transition_moves_once_then_reports_failures() {
    init_tracing();
    let period = Duration::from_millis(20);
    let machine = Arc::new(
        StateMachineBuilder::new(["A", "B"], "A")
            .register(periodic_transition("expire", "A", "B", period).unwrap())
            .build()
            .unwrap(),
    );
    let (scheduler, failures) = collecting_scheduler(SchedulerConfig::default());

    scheduler.start(Arc::clone(&machine)).unwrap();
    wait_until("repeated failures from B", || failures.lock().unwrap().len() >= 2).await;

    assert_eq!(machine.current_state(), State::new("B"));
    assert_eq!(machine.history().len(), 1);
    assert!(scheduler.is_running());

    scheduler.stop();
    tokio::time::sleep(period * 2).await;

    let failures = failures.lock().unwrap();
    assert!(
        failures.len() >= 2,
        "expected repeated failures from B, got {}",
        failures.len()
    );
    for failure in failures.iter() {
        assert_eq!(failure.transition, "expire");
        assert!(matches!(
            &failure.error,
            TickError::Fire(FireError::NoTransitionForEvent { state, event_kind })
                if *state == State::new("B") && event_kind.is_periodic()
        ));
    }

    let stats = scheduler.stats();
    assert_eq!(stats.failures, failures.len() as u64);
    assert_eq!(stats.ticks_delivered, stats.failures + 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn handler_failures_do_not_stop_the_timer() {
    init_tracing();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let machine = Arc::new(
        StateMachineBuilder::new(["A", "B"], "A")
            .transition(
                Transition::builder()
                    .name("flaky")
                    .from("A")
                    .to("B")
                    .every(Duration::from_millis(15))
                    .handler(move |_: &Event| -> Result<(), HandlerError> {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Err("downstream unavailable".into())
                    }),
            )
            .unwrap()
            .build()
            .unwrap(),
    );
    let (scheduler, failures) = collecting_scheduler(SchedulerConfig::default());

    scheduler.start(Arc::clone(&machine)).unwrap();
    wait_until("three handler calls", || calls.load(Ordering::SeqCst) >= 3).await;
    scheduler.stop();

    assert_eq!(machine.current_state(), State::new("A"));
    assert!(failures
        .lock()
        .unwrap()
        .iter()
        .all(|f| matches!(f.error, TickError::Fire(FireError::HandlerExecution { .. }))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn panicking_handler_does_not_stop_the_timer() {
    init_tracing();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let machine = Arc::new(
        StateMachineBuilder::new(["ON"], "ON")
            .transition(
                Transition::builder()
                    .name("beat")
                    .from("ON")
                    .to("ON")
                    .every(Duration::from_millis(10))
                    .handler(move |_: &Event| -> Result<(), HandlerError> {
                        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                            panic!("first beat fails");
                        }
                        Ok(())
                    }),
            )
            .unwrap()
            .build()
            .unwrap(),
    );
    let (scheduler, failures) = collecting_scheduler(SchedulerConfig::default());

    scheduler.start(Arc::clone(&machine)).unwrap();
    wait_until("ticks after the panic", || calls.load(Ordering::SeqCst) >= 4).await;
    scheduler.stop();

    let failures = failures.lock().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].transition, "beat");
    assert!(matches!(
        &failures[0].error,
        TickError::HandlerPanicked { message } if message == "first beat fails"
    ));

    assert_eq!(machine.current_state(), State::new("ON"));
    assert!(machine.history().len() >= 3);
    assert_eq!(scheduler.stats().failures, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn two_periodic_edges_each_get_a_timer() {
    init_tracing();
    let machine = Arc::new(
        StateMachineBuilder::new(["GREEN", "YELLOW", "RED"], "GREEN")
            .register(
                periodic_transition("to yellow", "GREEN", "YELLOW", Duration::from_millis(15))
                    .unwrap(),
            )
            .register(
                periodic_transition("to red", "YELLOW", "RED", Duration::from_millis(15)).unwrap(),
            )
            .build()
            .unwrap(),
    );
    let (scheduler, _) = collecting_scheduler(SchedulerConfig::default());

    scheduler.start(Arc::clone(&machine)).unwrap();
    wait_until("RED", || machine.current_state() == State::new("RED")).await;
    scheduler.stop();

    let history = machine.history();
    let path: Vec<&str> = history.get_path().iter().map(|s| s.name()).collect();
    assert_eq!(path, vec!["GREEN", "YELLOW", "RED"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn overlapping_ticks_are_dropped() {
    init_tracing();
    let slow = slow_loop(Duration::from_millis(10), Duration::from_millis(60));
    let period_ticks = 250 / 10;
    let (scheduler, failures) = collecting_scheduler(SchedulerConfig::default());

    scheduler.start(Arc::clone(&slow.machine)).unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;
    scheduler.stop();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let stats = scheduler.stats();
    let runs = slow.spans.lock().unwrap().len();

    assert_eq!(slow.max_active.load(Ordering::SeqCst), 1);
    assert!(stats.ticks_dropped > 0);
    assert!(runs >= 1);
    // Dropping keeps runs well below one per period.
    assert!(
        runs < period_ticks / 2,
        "handler ran {runs} times in 250ms at 60ms per run"
    );
    assert_eq!(stats.ticks_delivered, runs as u64);
    assert!(failures.lock().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn queue_one_fires_a_pending_tick_back_to_back() {
    init_tracing();
    let slow = slow_loop(Duration::from_millis(20), Duration::from_millis(45));
    let config = SchedulerConfig::default().with_overlap(OverlapPolicy::QueueOne);
    let (scheduler, _) = collecting_scheduler(config);

    scheduler.start(Arc::clone(&slow.machine)).unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;
    scheduler.stop();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let spans = slow.spans.lock().unwrap();
    assert_eq!(slow.max_active.load(Ordering::SeqCst), 1);
    assert!(spans.len() >= 2);

    // Ticks every 20ms against 45ms of work: with a tick always queued, the
    // next run follows the previous one much sooner than a full period.
    let min_gap = spans
        .windows(2)
        .map(|pair| pair[1].0.saturating_duration_since(pair[0].1))
        .min()
        .unwrap();
    assert!(
        min_gap < Duration::from_millis(20),
        "queued tick should start right after the running one, gap was {min_gap:?}"
    );
    assert!(scheduler.stats().ticks_dropped > 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn no_tick_starts_after_stop() {
    init_tracing();
    let starts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&starts);
    let machine = Arc::new(
        StateMachineBuilder::new(["ON"], "ON")
            .transition(
                Transition::builder()
                    .name("beat")
                    .from("ON")
                    .to("ON")
                    .every(Duration::from_millis(5))
                    .handler(move |_: &Event| -> Result<(), HandlerError> {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }),
            )
            .unwrap()
            .build()
            .unwrap(),
    );
    let (scheduler, _) = collecting_scheduler(SchedulerConfig::default());

    scheduler.start(Arc::clone(&machine)).unwrap();
    wait_until("two beats", || starts.load(Ordering::SeqCst) >= 2).await;
    scheduler.stop();
    let at_stop = starts.load(Ordering::SeqCst);

    tokio::time::sleep(Duration::from_millis(60)).await;
    let later = starts.load(Ordering::SeqCst);

    // A tick already past its shutdown check may still finish.
    assert!(later <= at_stop + 1, "{later} starts after stopping at {at_stop}");
    assert!(!scheduler.is_running());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_from_inside_a_handler_does_not_deadlock() {
    init_tracing();
    let scheduler_slot: Arc<OnceLock<Arc<PeriodicEventScheduler>>> = Arc::new(OnceLock::new());
    let slot = Arc::clone(&scheduler_slot);

    let machine = Arc::new(
        StateMachineBuilder::new(["ON", "OFF"], "ON")
            .transition(
                Transition::builder()
                    .name("shutdown")
                    .from("ON")
                    .to("OFF")
                    .every(Duration::from_millis(10))
                    .handler(move |_: &Event| -> Result<(), HandlerError> {
                        if let Some(scheduler) = slot.get() {
                            scheduler.stop();
                        }
                        Ok(())
                    }),
            )
            .unwrap()
            .build()
            .unwrap(),
    );

    let scheduler = Arc::new(PeriodicEventScheduler::default());
    let _ = scheduler_slot.set(Arc::clone(&scheduler));
    scheduler.start(Arc::clone(&machine)).unwrap();

    wait_until("the handler to stop the scheduler", || {
        !scheduler.is_running() && machine.current_state() == State::new("OFF")
    })
    .await;

    assert_eq!(machine.history().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn external_fires_interleave_with_ticks_consistently() {
    init_tracing();
    let machine = Arc::new(
        StateMachineBuilder::new(["LEFT", "RIGHT"], "LEFT")
            .register(
                periodic_transition("drift", "LEFT", "RIGHT", Duration::from_millis(3)).unwrap(),
            )
            .transition(
                Transition::builder()
                    .name("reset")
                    .from("RIGHT")
                    .to("LEFT")
                    .on("RESET"),
            )
            .unwrap()
            .build()
            .unwrap(),
    );
    let (scheduler, _) = collecting_scheduler(SchedulerConfig::default());
    scheduler.start(Arc::clone(&machine)).unwrap();

    let external = Arc::clone(&machine);
    let resets = tokio::task::spawn_blocking(move || {
        let mut moved = 0;
        let deadline = Instant::now() + Duration::from_millis(150);
        while Instant::now() < deadline {
            if external.fire(Event::new("RESET")).is_ok() {
                moved += 1;
            }
            thread::sleep(Duration::from_millis(1));
        }
        moved
    })
    .await
    .unwrap();
    scheduler.stop();

    assert!(resets > 0);
    let history = machine.history();
    let records: Vec<_> = history.iter().collect();
    for pair in records.windows(2) {
        assert_eq!(pair[0].to, pair[1].from);
        assert_ne!(pair[0].from, pair[0].to);
    }
}
