use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use super::{MarketClient, SealingClient};
use crate::error::{WatchError, WatchResult};
use crate::types::{
    DealId, DealInfo, DealState, DealUpdate, SectorInfo, SectorNumber, SectorState,
    StartDealParams,
};

/// Scripted in-memory collaborator implementing both client traits.
///
/// Deals are scripted as a sequence of states: each status query observes the
/// next state in the sequence and the last one repeats forever, so one query
/// per polling pass maps script positions onto passes. Subscriptions replay a
/// scripted update timeline on a background task. Sector fixtures are plain
/// mutable state so tests can reshape them while a wait is in flight.
#[derive(Debug, Default)]
pub struct MockNode {
    state: Mutex<MockState>,
}

#[derive(Debug, Default)]
struct MockState {
    deals: HashMap<DealId, DealScript>,
    sectors: BTreeMap<SectorNumber, SectorFixture>,
    updates: Vec<(Duration, DealUpdate)>,
    started_deals: Vec<StartDealParams>,
    sealing_started: Vec<SectorNumber>,
    flush_count: u64,
    list_sectors_calls: u64,
    status_queries: HashMap<DealId, u64>,
}

#[derive(Debug, Clone)]
struct DealScript {
    states: Vec<DealState>,
    message: Option<String>,
    cursor: usize,
}

#[derive(Debug, Clone)]
struct SectorFixture {
    state: SectorState,
    deals: Vec<DealId>,
}

impl MockNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a deal to step through `states`, one per status query.
    pub async fn script_deal(&self, proposal: DealId, states: Vec<DealState>) {
        self.script_deal_with_message(proposal, states, None).await;
    }

    /// Script a deal with a diagnostic message attached to every snapshot.
    pub async fn script_deal_with_message(
        &self,
        proposal: DealId,
        states: Vec<DealState>,
        message: Option<String>,
    ) {
        let mut state = self.state.lock().await;
        state.deals.insert(
            proposal,
            DealScript {
                states,
                message,
                cursor: 0,
            },
        );
    }

    /// Add a sector fixture containing the given deals.
    pub async fn add_sector(&self, number: SectorNumber, sector_state: SectorState, deals: Vec<DealId>) {
        let mut state = self.state.lock().await;
        state.sectors.insert(
            number,
            SectorFixture {
                state: sector_state,
                deals,
            },
        );
    }

    /// Change an existing sector's state; adds an empty sector if unknown.
    pub async fn set_sector_state(&self, number: SectorNumber, sector_state: SectorState) {
        let mut state = self.state.lock().await;
        state
            .sectors
            .entry(number)
            .and_modify(|s| s.state = sector_state)
            .or_insert(SectorFixture {
                state: sector_state,
                deals: Vec::new(),
            });
    }

    /// Append an update to the subscription timeline, delivered `delay` after
    /// the previous scripted update.
    pub async fn push_update(&self, delay: Duration, update: DealUpdate) {
        let mut state = self.state.lock().await;
        state.updates.push((delay, update));
    }

    pub async fn sealing_started(&self) -> Vec<SectorNumber> {
        self.state.lock().await.sealing_started.clone()
    }

    pub async fn flush_count(&self) -> u64 {
        self.state.lock().await.flush_count
    }

    pub async fn list_sectors_calls(&self) -> u64 {
        self.state.lock().await.list_sectors_calls
    }

    pub async fn status_queries(&self, proposal: &DealId) -> u64 {
        self.state
            .lock()
            .await
            .status_queries
            .get(proposal)
            .copied()
            .unwrap_or(0)
    }

    pub async fn started_deals(&self) -> Vec<StartDealParams> {
        self.state.lock().await.started_deals.clone()
    }
}

#[async_trait]
impl MarketClient for MockNode {
    async fn deal_status(&self, proposal: &DealId) -> WatchResult<DealInfo> {
        let mut state = self.state.lock().await;
        *state.status_queries.entry(proposal.clone()).or_insert(0) += 1;
        let script = state
            .deals
            .get_mut(proposal)
            .ok_or_else(|| WatchError::Transport(format!("unknown deal {}", proposal)))?;
        if script.states.is_empty() {
            return Err(WatchError::Transport(format!(
                "deal {} has no scripted states",
                proposal
            )));
        }
        let position = script.cursor.min(script.states.len() - 1);
        script.cursor += 1;
        Ok(DealInfo {
            proposal: proposal.clone(),
            state: script.states[position],
            message: script.message.clone(),
            piece: None,
        })
    }

    async fn subscribe_deal_updates(&self) -> WatchResult<mpsc::UnboundedReceiver<DealUpdate>> {
        let timeline = self.state.lock().await.updates.clone();
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            for (delay, update) in timeline {
                tokio::time::sleep(delay).await;
                if tx.send(update).is_err() {
                    break;
                }
            }
        });
        Ok(rx)
    }

    async fn start_deal(&self, params: &StartDealParams) -> WatchResult<DealId> {
        let proposal = DealId::new(format!("bafyrei{}", Uuid::new_v4().simple()));
        let mut state = self.state.lock().await;
        state.started_deals.push(params.clone());
        state.deals.insert(
            proposal.clone(),
            DealScript {
                states: vec![DealState::ProposalAccepted],
                message: None,
                cursor: 0,
            },
        );
        Ok(proposal)
    }
}

#[async_trait]
impl SealingClient for MockNode {
    async fn list_sectors(&self) -> WatchResult<Vec<SectorNumber>> {
        let mut state = self.state.lock().await;
        state.list_sectors_calls += 1;
        Ok(state.sectors.keys().copied().collect())
    }

    async fn sector_status(&self, sector: SectorNumber) -> WatchResult<SectorInfo> {
        let state = self.state.lock().await;
        let fixture = state
            .sectors
            .get(&sector)
            .ok_or_else(|| WatchError::Transport(format!("unknown sector {}", sector)))?;
        Ok(SectorInfo {
            number: sector,
            state: fixture.state,
            deals: fixture.deals.clone(),
        })
    }

    async fn start_sealing(&self, sector: SectorNumber) -> WatchResult<()> {
        let mut state = self.state.lock().await;
        if !state.sectors.contains_key(&sector) {
            return Err(WatchError::Transport(format!("unknown sector {}", sector)));
        }
        state.sealing_started.push(sector);
        Ok(())
    }

    async fn flush_sealing_batches(&self) -> WatchResult<()> {
        self.state.lock().await.flush_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_deal_advances_and_holds_last_state() {
        let node = MockNode::new();
        let deal = DealId::new("bafy-script");
        node.script_deal(deal.clone(), vec![DealState::Staged, DealState::Active])
            .await;

        assert_eq!(node.deal_status(&deal).await.unwrap().state, DealState::Staged);
        assert_eq!(node.deal_status(&deal).await.unwrap().state, DealState::Active);
        // last state repeats
        assert_eq!(node.deal_status(&deal).await.unwrap().state, DealState::Active);
        assert_eq!(node.status_queries(&deal).await, 3);
    }

    #[tokio::test]
    async fn unknown_deal_is_a_transport_error() {
        let node = MockNode::new();
        let err = node.deal_status(&DealId::new("missing")).await.unwrap_err();
        assert!(matches!(err, WatchError::Transport(_)));
    }

    #[tokio::test]
    async fn start_deal_registers_an_accepted_proposal() {
        let node = MockNode::new();
        let params = StartDealParams {
            data_root: "bafy-root".to_string(),
            price_per_epoch: 1_000_000,
            min_duration_epochs: 180,
            start_epoch: None,
            fast_retrieval: false,
        };
        let proposal = node.start_deal(&params).await.unwrap();
        assert_eq!(
            node.deal_status(&proposal).await.unwrap().state,
            DealState::ProposalAccepted
        );
        assert_eq!(node.started_deals().await.len(), 1);
    }

    #[tokio::test]
    async fn sector_fixture_roundtrip() {
        let node = MockNode::new();
        let deal = DealId::new("bafy-sectored");
        node.add_sector(7, SectorState::WaitDeals, vec![deal.clone()]).await;

        let info = node.sector_status(7).await.unwrap();
        assert_eq!(info.state, SectorState::WaitDeals);
        assert_eq!(info.deals, vec![deal]);

        node.set_sector_state(7, SectorState::Proving).await;
        assert_eq!(node.sector_status(7).await.unwrap().state, SectorState::Proving);
    }

    #[tokio::test(start_paused = true)]
    async fn subscription_replays_the_scripted_timeline() {
        let node = MockNode::new();
        let deal = DealId::new("bafy-sub");
        node.push_update(
            Duration::from_millis(10),
            DealUpdate {
                proposal: deal.clone(),
                state: DealState::Publishing,
                message: None,
            },
        )
        .await;
        node.push_update(
            Duration::from_millis(10),
            DealUpdate {
                proposal: deal.clone(),
                state: DealState::Sealing,
                message: None,
            },
        )
        .await;

        let mut updates = node.subscribe_deal_updates().await.unwrap();
        assert_eq!(updates.recv().await.unwrap().state, DealState::Publishing);
        assert_eq!(updates.recv().await.unwrap().state, DealState::Sealing);
        assert!(updates.recv().await.is_none());
    }
}
