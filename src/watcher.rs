//! Convergence watchers over externally-driven deal lifecycles.
//!
//! `DealWatcher` blocks a caller until tracked deals reach acceptable states:
//! the polling converger re-evaluates a conjunction of [`StateCheck`]s against
//! fresh snapshots every pass, and the event-driven converger multiplexes a
//! deal-update subscription against a deadline. Every collaborator call is an
//! `.await`, so a caller that wraps a wait in `tokio::time::timeout` (or drops
//! the future) cancels cooperatively between per-deal evaluations.

use std::collections::HashMap;
use std::sync::Arc;

use crate::check::{side_effect, FireMode, StateCheck};
use crate::client::{MarketClient, SealingClient};
use crate::config::WatchConfig;
use crate::correlate::SectorIndex;
use crate::error::{WatchError, WatchResult};
use crate::types::{DealId, DealInfo, DealState, SectorNumber, SectorState, StartDealParams};

/// Per-invocation fire-once bookkeeping, keyed by (check slot, deal): whether
/// the previous evaluation of that check for that deal matched.
type FireMemo = HashMap<(usize, DealId), bool>;

/// Options for [`DealWatcher::wait_until_sealed`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SealedOptions {
    /// Accept any of `AwaitingPreCommit`, `Sealing`, `Active` instead of
    /// requiring `Active`.
    pub accept_early: bool,
    /// While the deal is pre-commit or sealing, kick sectors idling in
    /// `WaitDeals` into sealing and flush batched sealing operations.
    pub kick_sealing: bool,
}

/// Observer of deal and sector lifecycles driven by external subsystems.
#[derive(Debug)]
pub struct DealWatcher {
    config: WatchConfig,
    market: Arc<dyn MarketClient>,
    sealing: Arc<dyn SealingClient>,
}

impl DealWatcher {
    pub fn new(
        market: Arc<dyn MarketClient>,
        sealing: Arc<dyn SealingClient>,
        config: &WatchConfig,
    ) -> Self {
        Self {
            config: config.clone(),
            market,
            sealing,
        }
    }

    /// Block until every tracked deal satisfies all `checks` in the same
    /// pass, or fail fast on the first fatal signal or collaborator error.
    ///
    /// Convergence is checked independently per deal: different deals may
    /// satisfy the conjunction in different passes. After any pass with
    /// still-pending deals the watcher sleeps `poll_interval` and runs
    /// another.
    pub async fn wait_for_states(
        &self,
        deals: &[DealId],
        checks: &[StateCheck],
    ) -> WatchResult<()> {
        let mut pending: Vec<DealId> = Vec::with_capacity(deals.len());
        for deal in deals {
            if !pending.contains(deal) {
                pending.push(deal.clone());
            }
        }

        let mut index = SectorIndex::new();
        let mut memo = FireMemo::new();

        while !pending.is_empty() {
            let mut satisfied = Vec::new();
            for proposal in &pending {
                let info = self.market.deal_status(proposal).await?;
                let sector = index.sector_for(self.sealing.as_ref(), proposal).await?;

                let mut done = true;
                for (slot, check) in checks.iter().enumerate() {
                    if !self.evaluate(slot, check, &info, sector, &mut memo).await? {
                        done = false;
                        break;
                    }
                }

                log::debug!(
                    "deal {} state: {:?}, sector: {:?}",
                    proposal,
                    info.state,
                    sector
                );
                if done {
                    log::info!("deal {} satisfied all checks", proposal);
                    satisfied.push(proposal.clone());
                }
            }

            pending.retain(|proposal| !satisfied.contains(proposal));
            if !pending.is_empty() {
                tokio::time::sleep(self.config.poll_interval()).await;
            }
        }

        Ok(())
    }

    async fn evaluate(
        &self,
        slot: usize,
        check: &StateCheck,
        info: &DealInfo,
        sector: Option<SectorNumber>,
        memo: &mut FireMemo,
    ) -> WatchResult<bool> {
        match check {
            StateCheck::DealStates { accept } => {
                if accept.contains(&info.state) {
                    return Ok(true);
                }
                if let Some(fatal) = info.fatal_error() {
                    return Err(fatal);
                }
                Ok(false)
            }
            StateCheck::SectorState { target } => {
                let Some(number) = sector else {
                    return Ok(false);
                };
                let status = self.sealing.sector_status(number).await?;
                Ok(status.state == *target)
            }
            StateCheck::OnStates {
                callback,
                trigger,
                mode,
            } => {
                let matching = trigger.contains(&info.state);
                let fire = match mode {
                    FireMode::EveryPass => matching,
                    FireMode::OncePerEntry => {
                        let previous = memo
                            .insert((slot, info.proposal.clone()), matching)
                            .unwrap_or(false);
                        matching && !previous
                    }
                };
                if fire {
                    callback().await?;
                }
                Ok(true)
            }
        }
    }

    /// Block until the deal is sealed.
    pub async fn wait_until_sealed(&self, deal: &DealId, opts: SealedOptions) -> WatchResult<()> {
        if opts.accept_early {
            return self
                .wait_for_states(
                    std::slice::from_ref(deal),
                    &[StateCheck::deal_states([
                        DealState::AwaitingPreCommit,
                        DealState::Sealing,
                        DealState::Active,
                    ])],
                )
                .await;
        }

        let mut checks = Vec::new();
        if opts.kick_sealing {
            let sealing = Arc::clone(&self.sealing);
            checks.push(StateCheck::on_states(
                side_effect(move || {
                    let sealing = Arc::clone(&sealing);
                    async move { kick_waiting_sectors(sealing.as_ref()).await }
                }),
                [DealState::AwaitingPreCommit, DealState::Sealing],
            ));
        }
        checks.push(StateCheck::deal_states([DealState::Active]));

        self.wait_for_states(std::slice::from_ref(deal), &checks)
            .await
    }

    /// Block until the deal reaches at least the publish milestone, observed
    /// through the market's deal-update stream.
    ///
    /// The subscription is established before waiting begins, so no update
    /// between subscription and first receive can be missed. Updates for
    /// other proposals are ignored; intermediate states of the target are
    /// logged and the wait continues. The configured `publish_timeout` bounds
    /// the whole wait.
    pub async fn wait_until_published(&self, deal: &DealId) -> WatchResult<()> {
        let mut updates = self.market.subscribe_deal_updates().await?;
        let deadline = tokio::time::sleep(self.config.publish_timeout());
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => return Err(WatchError::Timeout),
                update = updates.recv() => {
                    let Some(update) = update else {
                        return Err(WatchError::Transport(
                            "deal update stream closed".to_string(),
                        ));
                    };
                    if update.proposal != *deal {
                        continue;
                    }
                    if let Some(fatal) = update.state.fatal_error(update.message.as_deref()) {
                        return Err(fatal);
                    }
                    if update.state.is_published() {
                        log::info!("deal {} published, state: {:?}", update.proposal, update.state);
                        return Ok(());
                    }
                    log::debug!("deal {} state: {:?}", update.proposal, update.state);
                }
            }
        }
    }

    /// Kick every sector idling in `WaitDeals` into sealing and flush batched
    /// sealing operations.
    pub async fn start_sealing_waiting(&self) -> WatchResult<()> {
        kick_waiting_sectors(self.sealing.as_ref()).await
    }

    /// Propose a new storage deal through the market client.
    pub async fn start_deal(&self, params: &StartDealParams) -> WatchResult<DealId> {
        let proposal = self.market.start_deal(params).await?;
        log::info!("started deal {} for {}", proposal, params.data_root);
        Ok(proposal)
    }
}

async fn kick_waiting_sectors(sealing: &dyn SealingClient) -> WatchResult<()> {
    for number in sealing.list_sectors().await? {
        let status = sealing.sector_status(number).await?;
        log::debug!("sector {} state: {:?}", number, status.state);
        if status.state == SectorState::WaitDeals {
            sealing.start_sealing(number).await?;
        }
        // flushed once per visited sector
        sealing.flush_sealing_batches().await?;
    }
    Ok(())
}
