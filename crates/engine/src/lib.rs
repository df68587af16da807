//! Round driver - the single thread of control for one board
//!
//! A [`Round`](memory_match_core::Round) is pure; something has to own it,
//! feed it ticks, and flip mismatched pairs back after the reveal delay. This
//! crate does that on a tokio task:
//!
//! - Commands from the UI (start, select, restart, snapshot) and timer
//!   firings arrive on channels and are applied one at a time, so no two
//!   mutations of the round ever interleave.
//! - The elapsed-time ticker and the mismatch reveal are [`TimerHandle`]s
//!   keyed to the round generation. Restart and teardown cancel both before
//!   arming new ones; the generation check drops anything already in flight.
//! - Every change is published as a [`RoundEvent`] for renderers.
//!
//! # Example
//!
//! ```no_run
//! use memory_match_engine::{spawn_round, DriverConfig, RoundEvent};
//! # async fn demo(tiles: Vec<memory_match_types::Tile>) -> Result<(), memory_match_engine::DriverError> {
//! let (handle, mut events, _task) = spawn_round(DriverConfig::default());
//! handle.start(tiles).await?;
//! handle.select(0).await?;
//! while let Some(event) = events.recv().await {
//!     if let RoundEvent::Completed(result) = event {
//!         println!("done in {}s", result.elapsed_seconds);
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod driver;
pub mod timer;

pub use memory_match_core as core;
pub use memory_match_types as types;

pub use driver::{spawn_round, DriverConfig, DriverError, RoundEvent, RoundHandle};
pub use timer::{TimerFired, TimerHandle};
