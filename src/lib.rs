//! # Deal Watch Library
//!
//! This library implements the state-convergence watcher of a storage
//! marketplace node. Storage deals progress through lifecycles driven by
//! external market and sealing subsystems; this crate blocks callers until a
//! set of tracked deals reaches acceptable terminal states, correlating each
//! deal with the sector sealing it and fast-failing on known-bad states.
//!
//! ## Core Components
//!
//! * `check` - Composable state predicates with optional side effects
//! * `client` - Collaborator traits for the market and sealing subsystems,
//!   plus the scripted `MockNode` fixture
//! * `config` - Watcher configuration and loading
//! * `correlate` - Deal-to-sector correlation index
//! * `error` - Error types and handling
//! * `types` - Deal and sector identities, lifecycle states, snapshots
//! * `watcher` - Polling and event-driven convergers and orchestration
//!   helpers
//!
//! ## Observation Models
//!
//! The polling converger ([`DealWatcher::wait_for_states`]) re-evaluates a
//! conjunction of predicates against fresh snapshots of every tracked deal
//! each fixed-interval pass. The event-driven converger
//! ([`DealWatcher::wait_until_published`]) waits on a single deal through a
//! push subscription multiplexed against a deadline. Both abort immediately
//! on fatal deal states and collaborator errors; nothing is retried
//! internally.

pub mod check;
pub mod client;
pub mod config;
pub mod correlate;
pub mod error;
pub mod types;
pub mod watcher;

pub use check::{side_effect, FireMode, SideEffect, StateCheck};
pub use client::{MarketClient, MockNode, SealingClient};
pub use config::{load_watch_config, WatchConfig};
pub use correlate::SectorIndex;
pub use error::{WatchError, WatchResult};
pub use types::{
    DealId, DealInfo, DealState, DealUpdate, SectorInfo, SectorNumber, SectorState,
    StartDealParams,
};
pub use watcher::{DealWatcher, SealedOptions};
