use crate::error::WatchError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Content-addressed reference identifying a storage deal proposal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DealId(pub String);

impl DealId {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }
}

impl fmt::Display for DealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a sector managed by the sealing subsystem.
pub type SectorNumber = u64;

/// Market-side lifecycle states of a storage deal.
///
/// The lifecycle is driven entirely by the market subsystem; this crate only
/// observes it. `ProposalRejected`, `Failing` and `Error` are the fatal
/// states: observing a tracked deal in any of them aborts the whole wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DealState {
    Unknown,
    ProposalAccepted,
    Staged,
    Transferring,
    Publishing,
    AwaitingPreCommit,
    Sealing,
    Finalizing,
    Active,
    Expired,
    Slashed,
    ProposalRejected,
    Failing,
    Error,
}

impl DealState {
    /// Classify a fatal state into its wait-aborting error, carrying the
    /// deal's diagnostic message for `Error`.
    pub fn fatal_error(&self, message: Option<&str>) -> Option<WatchError> {
        match self {
            DealState::ProposalRejected => Some(WatchError::Rejected),
            DealState::Failing => Some(WatchError::Failing),
            DealState::Error => Some(WatchError::Errored(message.unwrap_or_default().to_string())),
            _ => None,
        }
    }

    /// True once the deal has reached at least the publish milestone.
    pub fn is_published(&self) -> bool {
        matches!(
            self,
            DealState::Finalizing
                | DealState::AwaitingPreCommit
                | DealState::Sealing
                | DealState::Active
        )
    }
}

/// Sealing-side lifecycle states of a sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectorState {
    WaitDeals,
    Packing,
    PreCommitting,
    Committing,
    Proving,
    Removed,
}

/// Read-only snapshot of a deal, obtained fresh per query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealInfo {
    pub proposal: DealId,
    pub state: DealState,
    pub message: Option<String>,
    pub piece: Option<String>,
}

impl DealInfo {
    pub fn fatal_error(&self) -> Option<WatchError> {
        self.state.fatal_error(self.message.as_deref())
    }
}

/// Read-only snapshot of a sector and the deals it currently contains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorInfo {
    pub number: SectorNumber,
    pub state: SectorState,
    pub deals: Vec<DealId>,
}

/// One item of the market's push-based deal-update stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealUpdate {
    pub proposal: DealId,
    pub state: DealState,
    pub message: Option<String>,
}

/// Parameters for proposing a new storage deal through the market client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartDealParams {
    pub data_root: String,
    pub price_per_epoch: u64,
    pub min_duration_epochs: u64,
    #[serde(default)]
    pub start_epoch: Option<u64>,
    #[serde(default)]
    pub fast_retrieval: bool,
}
