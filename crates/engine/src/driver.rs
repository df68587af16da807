//! Driver task owning one [`Round`].
//!
//! All mutations funnel through [`Driver::run`]: commands from
//! [`RoundHandle`] and firings from the round's timers share one loop.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use crate::core::{Round, RoundError, RoundSnapshot, Selection};
use crate::timer::{TimerFired, TimerHandle};
use crate::types::{RoundResult, Tile, MISMATCH_REVEAL_MS, TICK_MS};

/// Driver timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    pub tick: Duration,
    pub mismatch_reveal: Duration,
    pub max_pending_commands: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(TICK_MS),
            mismatch_reveal: Duration::from_millis(MISMATCH_REVEAL_MS),
            max_pending_commands: 32,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DriverError {
    #[error("round driver has shut down")]
    Closed,
    #[error(transparent)]
    Round(#[from] RoundError),
}

/// Change notification for renderers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundEvent {
    Started {
        generation: u64,
        total_pairs: usize,
    },
    TileRevealed {
        position: usize,
    },
    PairMatched {
        first: usize,
        second: usize,
        matched_pairs: usize,
        total_pairs: usize,
    },
    PairHidden {
        first: usize,
        second: usize,
    },
    Tick {
        elapsed_seconds: u32,
    },
    Completed(RoundResult),
    Reset,
}

enum Command {
    Start(Vec<Tile>, oneshot::Sender<u64>),
    Restart(Vec<Tile>, oneshot::Sender<u64>),
    Reset(oneshot::Sender<()>),
    Select(usize, oneshot::Sender<Result<Selection, RoundError>>),
    Snapshot(oneshot::Sender<RoundSnapshot>),
}

/// Cloneable handle for sending commands to the driver
#[derive(Debug, Clone)]
pub struct RoundHandle {
    cmd_tx: mpsc::Sender<Command>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Start(tiles, _) => write!(f, "Start({} tiles)", tiles.len()),
            Command::Restart(tiles, _) => write!(f, "Restart({} tiles)", tiles.len()),
            Command::Reset(_) => write!(f, "Reset"),
            Command::Select(position, _) => write!(f, "Select({position})"),
            Command::Snapshot(_) => write!(f, "Snapshot"),
        }
    }
}

impl RoundHandle {
    /// Deal `tiles` and start the elapsed counter. Returns the new generation.
    pub async fn start(&self, tiles: Vec<Tile>) -> Result<u64, DriverError> {
        self.request(|reply| Command::Start(tiles, reply)).await
    }

    /// Cancel both timers, abandon the current round, and deal `tiles`.
    pub async fn restart(&self, tiles: Vec<Tile>) -> Result<u64, DriverError> {
        self.request(|reply| Command::Restart(tiles, reply)).await
    }

    /// Cancel both timers and return the round to `Idle`.
    pub async fn reset(&self) -> Result<(), DriverError> {
        self.request(Command::Reset).await
    }

    pub async fn select(&self, position: usize) -> Result<Selection, DriverError> {
        let outcome = self
            .request(|reply| Command::Select(position, reply))
            .await?;
        Ok(outcome?)
    }

    pub async fn snapshot(&self) -> Result<RoundSnapshot, DriverError> {
        self.request(Command::Snapshot).await
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, DriverError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(make(reply_tx))
            .await
            .map_err(|_| DriverError::Closed)?;
        reply_rx.await.map_err(|_| DriverError::Closed)
    }
}

/// Spawn a driver on the current tokio runtime.
///
/// The driver stops (cancelling its timers) once every [`RoundHandle`] clone
/// has been dropped.
pub fn spawn_round(
    config: DriverConfig,
) -> (
    RoundHandle,
    mpsc::UnboundedReceiver<RoundEvent>,
    JoinHandle<()>,
) {
    let (cmd_tx, cmd_rx) = mpsc::channel(config.max_pending_commands.max(1));
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (timer_tx, timer_rx) = mpsc::unbounded_channel();

    let driver = Driver {
        round: Round::new(),
        config,
        events: event_tx,
        timer_tx,
        ticker: None,
        reveal: None,
    };
    let task = tokio::spawn(driver.run(cmd_rx, timer_rx));

    (RoundHandle { cmd_tx }, event_rx, task)
}

struct Driver {
    round: Round,
    config: DriverConfig,
    events: mpsc::UnboundedSender<RoundEvent>,
    timer_tx: mpsc::UnboundedSender<TimerFired>,
    ticker: Option<TimerHandle>,
    reveal: Option<TimerHandle>,
}

impl Driver {
    async fn run(
        mut self,
        mut cmd_rx: mpsc::Receiver<Command>,
        mut timer_rx: mpsc::UnboundedReceiver<TimerFired>,
    ) {
        loop {
            tokio::select! {
                biased;
                cmd = cmd_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
                Some(fired) = timer_rx.recv() => self.handle_timer(fired),
            }
        }
        self.cancel_timers();
        debug!("round driver stopped");
    }

    fn handle_command(&mut self, cmd: Command) {
        trace!(?cmd, "round command");
        match cmd {
            Command::Start(tiles, reply) => {
                self.cancel_timers();
                self.round.start(tiles);
                self.arm_ticker();
                let _ = reply.send(self.announce_start());
            }
            Command::Restart(tiles, reply) => {
                self.cancel_timers();
                self.round.restart(tiles);
                self.arm_ticker();
                let _ = reply.send(self.announce_start());
            }
            Command::Reset(reply) => {
                self.cancel_timers();
                self.round.reset();
                self.emit(RoundEvent::Reset);
                let _ = reply.send(());
            }
            Command::Select(position, reply) => {
                let outcome = self.round.select_tile(position);
                if let Ok(selection) = &outcome {
                    self.apply_selection(selection);
                }
                let _ = reply.send(outcome);
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.round.snapshot());
            }
        }
    }

    fn apply_selection(&mut self, selection: &Selection) {
        match *selection {
            Selection::Ignored => {}
            Selection::FirstPick { position } => {
                self.emit(RoundEvent::TileRevealed { position });
            }
            Selection::Mismatched { first, second } => {
                debug!(first, second, "mismatch, hiding after reveal delay");
                self.emit(RoundEvent::TileRevealed { position: second });
                self.reveal = Some(TimerHandle::mismatch_reveal(
                    self.config.mismatch_reveal,
                    self.round.generation(),
                    self.timer_tx.clone(),
                ));
            }
            Selection::Matched {
                first,
                second,
                completed,
            } => {
                self.emit(RoundEvent::TileRevealed { position: second });
                self.emit(RoundEvent::PairMatched {
                    first,
                    second,
                    matched_pairs: self.round.matched_pairs(),
                    total_pairs: self.round.total_pairs(),
                });
                if let Some(result) = completed {
                    self.cancel_timers();
                    info!(
                        elapsed_seconds = result.elapsed_seconds,
                        "round complete"
                    );
                    self.emit(RoundEvent::Completed(result));
                }
            }
        }
    }

    fn handle_timer(&mut self, fired: TimerFired) {
        match fired {
            TimerFired::Tick { generation } => {
                if let Some(elapsed_seconds) = self.round.tick(generation) {
                    self.emit(RoundEvent::Tick { elapsed_seconds });
                }
            }
            TimerFired::MismatchReveal { generation } => {
                if let Some((first, second)) = self.round.resolve_mismatch(generation) {
                    self.reveal = None;
                    self.emit(RoundEvent::PairHidden { first, second });
                }
            }
        }
    }

    fn announce_start(&self) -> u64 {
        let generation = self.round.generation();
        debug!(generation, total_pairs = self.round.total_pairs(), "round started");
        self.emit(RoundEvent::Started {
            generation,
            total_pairs: self.round.total_pairs(),
        });
        generation
    }

    fn arm_ticker(&mut self) {
        self.ticker = Some(TimerHandle::ticker(
            self.config.tick,
            self.round.generation(),
            self.timer_tx.clone(),
        ));
    }

    fn cancel_timers(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
        if let Some(reveal) = self.reveal.take() {
            reveal.cancel();
        }
    }

    fn emit(&self, event: RoundEvent) {
        let _ = self.events.send(event);
    }
}
