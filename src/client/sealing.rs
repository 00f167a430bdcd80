use crate::error::WatchResult;
use crate::types::{SectorInfo, SectorNumber};
use async_trait::async_trait;
use std::fmt::Debug;

#[async_trait]
pub trait SealingClient: Send + Sync + Debug {
    /// Lists all known sector identities
    async fn list_sectors(&self) -> WatchResult<Vec<SectorNumber>>;

    /// Fetches a sector's state and the deals it currently contains
    async fn sector_status(&self, sector: SectorNumber) -> WatchResult<SectorInfo>;

    /// Instructs the sealing subsystem to begin sealing the sector
    async fn start_sealing(&self, sector: SectorNumber) -> WatchResult<()>;

    /// Requests that any batched sealing operations be flushed
    async fn flush_sealing_batches(&self) -> WatchResult<()>;
}
