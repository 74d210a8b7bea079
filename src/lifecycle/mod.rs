//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → open store → build pipeline → start listener
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT → trigger → stop accepting → drain → persist store
//! ```
//!
//! # Design Decisions
//! - The store is opened before and persisted after everything else
//! - Config reloads never touch the store

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
