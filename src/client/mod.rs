//! Collaborator interfaces consumed by the watcher.
//!
//! The market and sealing subsystems drive deal and sector lifecycles; this
//! crate only observes them through these traits. [`MockNode`] is the scripted
//! in-memory fixture used by the crate's own tests and available to downstream
//! consumers.

pub mod market;
pub mod mock;
pub mod sealing;

pub use market::MarketClient;
pub use mock::MockNode;
pub use sealing::SealingClient;
