//! Composable state predicates evaluated against deal snapshots.
//!
//! A `StateCheck` is an immutable predicate value: it captures its accepted
//! states (and, for side-effect checks, a callback) at construction and is
//! safe to reuse across polling passes and across independent wait
//! invocations. Per-invocation bookkeeping such as fire-once tracking lives in
//! the converger, never in the check itself.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::WatchResult;
use crate::types::{DealState, SectorState};

/// Async side-effect callback attached to an [`StateCheck::on_states`] check.
pub type SideEffect =
    Arc<dyn Fn() -> Pin<Box<dyn Future<Output = WatchResult<()>> + Send>> + Send + Sync>;

/// Build a [`SideEffect`] from an async closure.
pub fn side_effect<F, Fut>(f: F) -> SideEffect
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = WatchResult<()>> + Send + 'static,
{
    Arc::new(move || Box::pin(f()))
}

/// When a side-effect callback fires relative to matching evaluations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireMode {
    /// Fire on the evaluation where the deal enters a matching state; fire
    /// again only after it leaves and re-enters.
    OncePerEntry,
    /// Fire on every evaluation in which the state matches. At-least-once
    /// semantics: the callback may run once per polling pass while the deal
    /// stays in a matching state, so it must be idempotent.
    EveryPass,
}

/// One predicate of a wait conjunction.
///
/// A tracked deal is done only when every check of the conjunction returns
/// true in the same evaluation pass; a fatal signal from any check fails the
/// whole wait.
pub enum StateCheck {
    /// True iff the deal's current state is one of `accept`. Membership is
    /// tested first; a non-member state that belongs to the fatal set signals
    /// the classified fatal error instead of returning false.
    DealStates { accept: Vec<DealState> },
    /// Resolves the correlated sector; false while no sector holds the deal,
    /// otherwise true iff the sector's state equals `target`.
    SectorState { target: SectorState },
    /// Always true; additionally fires `callback` per `mode` whenever the
    /// deal's state is in `trigger`. A callback error aborts the wait, but the
    /// boolean contribution is true regardless of whether the callback fired.
    OnStates {
        callback: SideEffect,
        trigger: Vec<DealState>,
        mode: FireMode,
    },
}

impl StateCheck {
    pub fn deal_states(accept: impl Into<Vec<DealState>>) -> Self {
        StateCheck::DealStates {
            accept: accept.into(),
        }
    }

    pub fn sector_state(target: SectorState) -> Self {
        StateCheck::SectorState { target }
    }

    pub fn on_states(callback: SideEffect, trigger: impl Into<Vec<DealState>>) -> Self {
        StateCheck::OnStates {
            callback,
            trigger: trigger.into(),
            mode: FireMode::OncePerEntry,
        }
    }

    /// Legacy at-least-once compatibility mode of [`StateCheck::on_states`].
    pub fn on_states_every_pass(callback: SideEffect, trigger: impl Into<Vec<DealState>>) -> Self {
        StateCheck::OnStates {
            callback,
            trigger: trigger.into(),
            mode: FireMode::EveryPass,
        }
    }
}

impl fmt::Debug for StateCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateCheck::DealStates { accept } => {
                f.debug_struct("DealStates").field("accept", accept).finish()
            }
            StateCheck::SectorState { target } => {
                f.debug_struct("SectorState").field("target", target).finish()
            }
            StateCheck::OnStates { trigger, mode, .. } => f
                .debug_struct("OnStates")
                .field("trigger", trigger)
                .field("mode", mode)
                .finish_non_exhaustive(),
        }
    }
}
