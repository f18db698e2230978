//! Lightweight runtime metrics aggregation for the studio server
//!
//! Counters are recorded on every generation attempt, summarised to the log
//! on a fixed interval when enabled, and exposed as a JSON snapshot on the
//! `/metrics` route.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};
use tokio::time::{self, MissedTickBehavior};
use tracing::info;

static METRICS: OnceLock<Arc<MetricsInner>> = OnceLock::new();

/// Enable periodic metrics emission with the provided interval in seconds.
pub fn enable(interval_secs: u64) {
    let interval = interval_secs.max(5);
    let inner = Arc::clone(METRICS.get_or_init(|| Arc::new(MetricsInner::new(interval))));
    inner.update_interval(interval);
    inner.ensure_task();
}

/// Record the outcome of one generation attempt.
pub fn record_generation(duration: Duration, success: bool) {
    if let Some(inner) = METRICS.get() {
        inner.record_generation(duration, success);
    }
}

/// Record a non-fatal warning surfaced to the user.
pub fn record_warning() {
    if let Some(inner) = METRICS.get() {
        inner.record_warning();
    }
}

/// Current counters as a JSON document, or `None` before `enable`.
pub fn snapshot_json() -> Option<serde_json::Value> {
    METRICS
        .get()
        .and_then(|inner| serde_json::to_value(inner.snapshot()).ok())
}

struct MetricsInner {
    state: Mutex<MetricsState>,
    interval_secs: AtomicU64,
    task_spawned: AtomicBool,
}

impl MetricsInner {
    fn new(interval_secs: u64) -> Self {
        Self {
            state: Mutex::new(MetricsState::new()),
            interval_secs: AtomicU64::new(interval_secs.max(5)),
            task_spawned: AtomicBool::new(false),
        }
    }

    fn update_interval(&self, interval_secs: u64) {
        self.interval_secs
            .store(interval_secs.max(5), Ordering::Relaxed);
    }

    fn ensure_task(self: &Arc<Self>) {
        if self
            .task_spawned
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let runner = Arc::clone(self);
            tokio::spawn(async move {
                runner.run().await;
            });
        }
    }

    fn record_generation(&self, duration: Duration, success: bool) {
        let mut state = self.state.lock().expect("metrics mutex poisoned");
        state.generations += 1;
        if success {
            state.successes += 1;
            state.render_duration += duration;
        } else {
            state.failures += 1;
        }
    }

    fn record_warning(&self) {
        let mut state = self.state.lock().expect("metrics mutex poisoned");
        state.warnings += 1;
    }

    fn snapshot(&self) -> Snapshot {
        let state = self.state.lock().expect("metrics mutex poisoned");
        state.snapshot()
    }

    async fn run(self: Arc<Self>) {
        let mut current_secs = self.interval_secs.load(Ordering::Relaxed).max(5);
        loop {
            let mut ticker = time::interval(Duration::from_secs(current_secs));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // Align the ticker so the first report happens after a full interval
            ticker.tick().await;

            loop {
                ticker.tick().await;
                log_snapshot(&self.snapshot());

                let next_secs = self.interval_secs.load(Ordering::Relaxed).max(5);
                if next_secs != current_secs {
                    current_secs = next_secs;
                    break;
                }
            }
        }
    }
}

struct MetricsState {
    generations: u64,
    successes: u64,
    failures: u64,
    warnings: u64,
    render_duration: Duration,
    started: Instant,
}

impl MetricsState {
    fn new() -> Self {
        Self {
            generations: 0,
            successes: 0,
            failures: 0,
            warnings: 0,
            render_duration: Duration::ZERO,
            started: Instant::now(),
        }
    }

    fn snapshot(&self) -> Snapshot {
        let avg_render_ms = if self.successes == 0 {
            0.0
        } else {
            self.render_duration.as_secs_f64() * 1_000.0 / self.successes as f64
        };

        Snapshot {
            uptime_secs: self.started.elapsed().as_secs(),
            generations: self.generations,
            successes: self.successes,
            failures: self.failures,
            warnings: self.warnings,
            avg_render_ms,
        }
    }
}

/// Aggregated counters since process start.
#[derive(Debug, Clone, Serialize)]
struct Snapshot {
    uptime_secs: u64,
    generations: u64,
    successes: u64,
    failures: u64,
    warnings: u64,
    avg_render_ms: f64,
}

fn log_snapshot(snapshot: &Snapshot) {
    info!(
        target: "qrforge::metrics",
        uptime_secs = snapshot.uptime_secs,
        generations = snapshot.generations,
        successes = snapshot.successes,
        failures = snapshot.failures,
        warnings = snapshot.warnings,
        avg_render_ms = snapshot.avg_render_ms,
        "Generation metrics"
    );
}
