//! Deal-to-sector correlation.
//!
//! A deal is not directly addressable on the sealing side; the sector holding
//! it has to be discovered by inspecting sector statuses. `SectorIndex` keeps
//! an incrementally maintained deal-to-sector map: a lookup miss triggers one
//! full enumeration that records every containment observed along the way, and
//! later lookups hit the map without re-scanning. A deal's sector assignment
//! is stable once made, so the memoized answer stays correct for the lifetime
//! of one wait invocation.

use std::collections::HashMap;

use crate::client::SealingClient;
use crate::error::WatchResult;
use crate::types::{DealId, SectorNumber};

#[derive(Debug, Default)]
pub struct SectorIndex {
    by_deal: HashMap<DealId, SectorNumber>,
}

impl SectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the sector currently holding `proposal`, or `None` if the deal
    /// has not been placed into any sector yet.
    pub async fn sector_for(
        &mut self,
        sealing: &dyn SealingClient,
        proposal: &DealId,
    ) -> WatchResult<Option<SectorNumber>> {
        if let Some(number) = self.by_deal.get(proposal) {
            return Ok(Some(*number));
        }

        for number in sealing.list_sectors().await? {
            let info = sealing.sector_status(number).await?;
            for deal in info.deals {
                // first containment observed wins
                self.by_deal.entry(deal).or_insert(number);
            }
        }

        Ok(self.by_deal.get(proposal).copied())
    }
}
