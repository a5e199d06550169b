//! Trigger dispatcher, timed events, and deferred requests for mapscript.
//!
//! This crate provides:
//! - [`Scheduler`] - Script invocation, triggers, and the per-frame driver
//! - [`RequestQueue`] - Deferred side effects drained after each tick
//! - [`EventQueue`] - Time-ordered script and map-update events
//! - [`GameClock`] - Game time and the real-time intervals that advance it
//! - [`World`] / [`RequestHandler`] - What the embedding game supplies
//! - [`ImageSource`] - Where script images are loaded from

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod clock;
pub mod config;
mod context;
pub mod dispatcher;
pub mod events;
pub mod loader;
pub mod requests;
pub mod scratch;
pub mod world;

pub use clock::{ClockPoll, GameClock};
pub use config::SchedulerConfig;
pub use dispatcher::{ExecStatus, Scheduler, SchedulerState};
pub use events::{Event, EventKind, EventQueue, NO_OWNER};
pub use loader::{DirectorySource, ImageSource, MemorySource};
pub use requests::{
    CombatRequest, DrainReport, ElevatorRequest, ExplosionRequest, RequestFlags, RequestHandler,
    RequestQueue, TransferRequest,
};
pub use scratch::TempArrays;
pub use world::{EmptyWorld, World};
