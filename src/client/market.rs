use crate::error::WatchResult;
use crate::types::{DealId, DealInfo, DealUpdate, StartDealParams};
use async_trait::async_trait;
use std::fmt::Debug;
use tokio::sync::mpsc;

#[async_trait]
pub trait MarketClient: Send + Sync + Debug {
    /// Fetches a fresh snapshot of the deal's current state
    async fn deal_status(&self, proposal: &DealId) -> WatchResult<DealInfo>;

    /// Opens a live stream of deal updates, active until the receiver is dropped
    async fn subscribe_deal_updates(&self) -> WatchResult<mpsc::UnboundedReceiver<DealUpdate>>;

    /// Proposes a new storage deal, returning its proposal reference
    async fn start_deal(&self, params: &StartDealParams) -> WatchResult<DealId>;
}
