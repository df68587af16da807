//! Cancellable timers scoped to one round generation.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Message a timer delivers back to the driver loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerFired {
    Tick { generation: u64 },
    MismatchReveal { generation: u64 },
}

/// Owned handle to a spawned timer task.
///
/// Dropping the handle aborts the task.
#[derive(Debug)]
pub struct TimerHandle {
    generation: u64,
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Fire `Tick { generation }` every `period`, first firing one period from now.
    pub fn ticker(
        period: Duration,
        generation: u64,
        tx: mpsc::UnboundedSender<TimerFired>,
    ) -> Self {
        let task = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(TimerFired::Tick { generation }).is_err() {
                    break;
                }
            }
        });
        Self { generation, task }
    }

    /// Fire `MismatchReveal { generation }` once after `delay`.
    pub fn mismatch_reveal(
        delay: Duration,
        generation: u64,
        tx: mpsc::UnboundedSender<TimerFired>,
    ) -> Self {
        let task = tokio::spawn(async move {
            time::sleep(delay).await;
            let _ = tx.send(TimerFired::MismatchReveal { generation });
        });
        Self { generation, task }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
