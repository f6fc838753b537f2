//! Tick-counting task scheduler
//!
//! The loop only decides when a task is due. Every due run is spawned onto
//! the runtime and never awaited by the loop, so one slow task cannot hold
//! back the others. Runs of the same task may overlap.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// A periodic unit of background work
#[async_trait::async_trait]
pub trait Task: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    async fn run(&self) -> Result<()>;
}

/// A registered task and its tick bookkeeping
pub struct ScheduledTask {
    task: Arc<dyn Task>,
    /// Ticks that must elapse before the task is due
    due_after: u64,
    elapsed_ticks: u64,
}

impl ScheduledTask {
    pub fn elapsed_ticks(&self) -> u64 {
        self.elapsed_ticks
    }
}

pub struct Scheduler {
    tick_period: Duration,
    tasks: Vec<ScheduledTask>,
    run_counter: Arc<AtomicU64>,
}

impl Scheduler {
    /// `tick_period` is clamped to at least one millisecond
    pub fn new(tick_period: Duration) -> Self {
        Self {
            tick_period: tick_period.max(Duration::from_millis(1)),
            tasks: Vec::new(),
            run_counter: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn tasks(&self) -> &[ScheduledTask] {
        &self.tasks
    }

    /// Register `task` to run every `every`
    pub fn add(&mut self, task: Arc<dyn Task>, every: Duration) {
        let period = self.tick_period.as_nanos();
        let due_after = every.as_nanos().div_ceil(period).max(1);
        let effective = u32::try_from(due_after)
            .ok()
            .and_then(|ticks| self.tick_period.checked_mul(ticks))
            .unwrap_or(Duration::MAX);

        if every.as_nanos() % period != 0 || every.is_zero() {
            warn!(
                task = task.name(),
                requested = ?every,
                effective = ?effective,
                "interval is not a multiple of the tick period, rounding up"
            );
        }
        info!(task = task.name(), every = ?effective, "task scheduled");

        self.tasks.push(ScheduledTask {
            task,
            due_after: u64::try_from(due_after).unwrap_or(u64::MAX),
            elapsed_ticks: 0,
        });
    }

    /// Advance every counter by one tick and spawn the tasks that became due.
    ///
    /// Must be called from within a Tokio runtime. The returned handles can
    /// be awaited, but the run loop drops them.
    pub fn tick(&mut self) -> Vec<JoinHandle<()>> {
        let mut dispatched = Vec::new();
        for scheduled in &mut self.tasks {
            scheduled.elapsed_ticks += 1;
            if scheduled.elapsed_ticks < scheduled.due_after {
                continue;
            }
            scheduled.elapsed_ticks = 0;

            let run_id = self.run_counter.fetch_add(1, Ordering::Relaxed);
            debug!(task = scheduled.task.name(), run = run_id, "dispatching");
            dispatched.push(tokio::spawn(run_guarded(
                Arc::clone(&scheduled.task),
                run_id,
                self.tick_period,
            )));
        }
        dispatched
    }

    /// Tick forever
    pub async fn run(mut self) {
        info!(tick = ?self.tick_period, tasks = self.tasks.len(), "scheduler started");
        let mut ticker = interval(self.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of a tokio interval fires immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            self.tick();
        }
    }

    /// Run every task once, one after another, and wait for each
    pub async fn run_all_once(&self) {
        info!(tasks = self.tasks.len(), "running all tasks once");
        for scheduled in &self.tasks {
            let run_id = self.run_counter.fetch_add(1, Ordering::Relaxed);
            run_guarded(Arc::clone(&scheduled.task), run_id, self.tick_period).await;
        }
    }
}

/// Run one task execution, logging instead of propagating its failure.
///
/// The body runs on its own Tokio task so a panic is caught and reported
/// against the task name and run number.
async fn run_guarded(task: Arc<dyn Task>, run_id: u64, tick_period: Duration) {
    let name = task.name();
    let started = Instant::now();
    debug!("running {name}#{run_id}");

    match tokio::spawn(async move { task.run().await }).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            error!(task = name, run = run_id, "task {name}#{run_id} failed: {err:#}");
            return;
        }
        Err(err) if err.is_panic() => {
            error!(task = name, run = run_id, "task {name}#{run_id} panicked: {err}");
            return;
        }
        Err(err) => {
            warn!(task = name, run = run_id, "task {name}#{run_id} cancelled: {err}");
            return;
        }
    }

    let elapsed = started.elapsed();
    if elapsed > tick_period {
        warn!(
            task = name,
            run = run_id,
            elapsed = ?elapsed,
            tick = ?tick_period,
            "task {name}#{run_id} took longer than one tick, increase the tick period or split the task"
        );
    } else {
        debug!(task = name, run = run_id, elapsed = ?elapsed, "task finished");
    }
}
