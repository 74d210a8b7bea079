//! Session and button tracking.
//!
//! Action payloads only carry the 1-based index of the pressed button, so the
//! buttons served with each rewritten frame are kept per (context, user) in the
//! shared store. Returning to the entry document starts a fresh session.

pub mod tracker;

pub use tracker::ButtonTracker;
