use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use mintcheck::infrastructure::runtime::{Scheduler, Task};

struct Stuck {
    started: AtomicUsize,
}

#[async_trait::async_trait]
impl Task for Stuck {
    fn name(&self) -> &'static str {
        "stuck"
    }

    async fn run(&self) -> Result<()> {
        self.started.fetch_add(1, Ordering::SeqCst);
        std::future::pending::<()>().await;
        Ok(())
    }
}

struct Quick {
    runs: AtomicUsize,
}

#[async_trait::async_trait]
impl Task for Quick {
    fn name(&self) -> &'static str {
        "quick"
    }

    async fn run(&self) -> Result<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn test_stuck_task_does_not_delay_others() {
    let stuck = Arc::new(Stuck {
        started: AtomicUsize::new(0),
    });
    let quick = Arc::new(Quick {
        runs: AtomicUsize::new(0),
    });

    let mut scheduler = Scheduler::new(Duration::from_millis(10));
    scheduler.add(stuck.clone(), Duration::from_millis(10));
    scheduler.add(quick.clone(), Duration::from_millis(10));

    for round in 1..=3 {
        let mut handles = scheduler.tick();
        assert_eq!(handles.len(), 2);

        let quick_run = handles.pop().unwrap();
        tokio::time::timeout(Duration::from_secs(5), quick_run)
            .await
            .expect("quick task finished")
            .unwrap();
        assert_eq!(quick.runs.load(Ordering::SeqCst), round);
    }

    // Each tick started its own overlapping run of the stuck task
    tokio::time::timeout(Duration::from_secs(5), async {
        while stuck.started.load(Ordering::SeqCst) < 3 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("stuck task started once per tick");
}

#[tokio::test]
async fn test_run_all_once_awaits_each_task() {
    let quick = Arc::new(Quick {
        runs: AtomicUsize::new(0),
    });
    let mut scheduler = Scheduler::new(Duration::from_secs(5));
    scheduler.add(quick.clone(), Duration::from_secs(30));
    scheduler.add(quick.clone(), Duration::from_secs(300));

    scheduler.run_all_once().await;
    assert_eq!(quick.runs.load(Ordering::SeqCst), 2);
    assert!(scheduler.tasks().iter().all(|task| task.elapsed_ticks() == 0));
}

#[tokio::test(start_paused = true)]
async fn test_run_loop_dispatches_on_schedule() {
    let quick = Arc::new(Quick {
        runs: AtomicUsize::new(0),
    });
    let mut scheduler = Scheduler::new(Duration::from_secs(5));
    scheduler.add(quick.clone(), Duration::from_secs(10));

    let loop_handle = tokio::spawn(scheduler.run());
    // Four ticks elapse: the task is due on the second and fourth
    tokio::time::sleep(Duration::from_millis(20_500)).await;
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    loop_handle.abort();

    assert_eq!(quick.runs.load(Ordering::SeqCst), 2);
}
