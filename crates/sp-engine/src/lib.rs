//! Runtime for the spatium motion engine.
//!
//! Samples trajectories into source positions, records freehand paths,
//! and keeps linked sources consistent with the primary. Everything here
//! is synchronous; the per-tick path does not allocate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod enforcer;
mod listener;
mod playback;
mod recorder;
mod sampler;
pub mod strategy;

pub use enforcer::{
    ChangedSources, LinkOutcome, LinkState, MoveOutcome, SourceLinkEnforcer, PRIMARY,
};
pub use listener::{ListenerId, ListenerList, PositionListener};
pub use playback::{PlaybackDriver, PlaybackState};
pub use recorder::{PathRecorder, SMOOTHING};
pub use sampler::{Direction, TrajectorySampler};
