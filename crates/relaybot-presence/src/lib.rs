//! Peer presence tracking for relaybot.
//!
//! The service pushes a presence update whenever a peer's online state or
//! activity changes. [`PresenceTracker`] folds those updates into one
//! record per peer and answers aggregate questions about them.
//!
//! # Key types
//!
//! - [`PresenceTracker`]: owns the peer → presence mapping
//! - [`PresenceSnapshot`]: online / total / watched counts
//! - [`WatchedActivity`]: which activity counts as notable

mod tracker;

pub use tracker::{PresenceSnapshot, PresenceTracker, WatchedActivity};
