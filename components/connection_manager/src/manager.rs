use std::convert::TryFrom;
use std::time::Duration;

use derive_more::From;

use futures::channel::oneshot;
use futures::future;
use futures::task::{Spawn, SpawnExt};

use proto::consts::BOOTSTRAP_ADDRESS;
use proto::ledger::messages::{
    Address, Amount, ChannelState, CloseError, DepositError, SettleWaitError, TokenNetworkIds,
};

use crate::join::{join_partner, JoinOutcome};
use crate::ledger::{ChannelActions, LedgerView, SettlementWaiter};
use crate::partners::find_new_partners;
use crate::report::ConnectionManagerReport;
use crate::strategy::{SharedStrategy, StrategyGuard, StrategyParams};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidAmount {
    /// Funds must be positive
    NonPositiveFunds,
    /// Our token balance is lower than the requested funds
    InsufficientBalance { balance: Amount, funds: Amount },
}

#[derive(Debug, From)]
pub enum ConnectError {
    InvalidAmount(InvalidAmount),
}

#[derive(Debug, From)]
pub enum LeaveError {
    CloseError(CloseError),
    SettleWaitError(SettleWaitError),
    SpawnError,
}

/// Outcome of one pass of channel maintenance.
#[derive(Debug, Default)]
pub(crate) struct MaintainOutcome {
    join_outcomes: Vec<(Address, JoinOutcome)>,
}

impl MaintainOutcome {
    /// Were any join attempts dispatched?
    /// `false` means there is nothing more to do for now.
    pub fn dispatched(&self) -> bool {
        !self.join_outcomes.is_empty()
    }

    /// Did at least one of the dispatched joins end up with a funded channel?
    pub fn made_progress(&self) -> bool {
        self.join_outcomes
            .iter()
            .any(|(_partner, outcome)| outcome.is_funded())
    }

    #[cfg(test)]
    pub fn join_outcomes(&self) -> &[(Address, JoinOutcome)] {
        &self.join_outcomes
    }
}

/// Keeps a node connected to a token network.
///
/// Opens and funds channels until a target amount of funded channels is reached, using
/// only the funds given to `connect()`. Starts inert: no funds and no channel target.
/// Cloning gives another handle to the same manager.
#[derive(Clone)]
pub struct ConnectionManager<LV, CA, SW, S> {
    ids: TokenNetworkIds,
    local_address: Address,
    strategy: SharedStrategy,
    ledger_view: LV,
    channel_actions: CA,
    settlement_waiter: SW,
    /// Interval between settlement queries when leaving
    settle_poll_interval: Duration,
    spawner: S,
}

impl<LV, CA, SW, S> ConnectionManager<LV, CA, SW, S>
where
    LV: LedgerView + Clone + Send + Sync + 'static,
    CA: ChannelActions + Clone + Send + Sync + 'static,
    SW: SettlementWaiter + Clone + Send + Sync + 'static,
    S: Spawn + Clone + Send + Sync + 'static,
{
    pub fn new(
        ids: TokenNetworkIds,
        local_address: Address,
        ledger_view: LV,
        channel_actions: CA,
        settlement_waiter: SW,
        settle_poll_interval: Duration,
        spawner: S,
    ) -> Self {
        ConnectionManager {
            ids,
            local_address,
            strategy: SharedStrategy::new(),
            ledger_view,
            channel_actions,
            settlement_waiter,
            settle_poll_interval,
            spawner,
        }
    }

    pub fn ids(&self) -> &TokenNetworkIds {
        &self.ids
    }

    pub fn local_address(&self) -> Address {
        self.local_address
    }

    #[cfg(test)]
    pub(crate) async fn lock_strategy(&self) -> StrategyGuard<'_> {
        self.strategy.lock().await
    }

    /// Connect to the token network.
    ///
    /// May be called again later: only the funds and the strategy used from now on are
    /// affected. Channels are never closed by `connect()`.
    ///
    /// Channels opened manually are not distinguished from channels opened by the connection
    /// manager. Their deposits affect the funding per channel and the amount of new channels.
    pub async fn connect(&self, funds: Amount, params: StrategyParams) -> Result<(), ConnectError> {
        if funds == 0 {
            return Err(InvalidAmount::NonPositiveFunds.into());
        }

        let balance = self
            .ledger_view
            .token_balance(self.ids.token_address, self.local_address)
            .await;
        if balance < funds {
            return Err(InvalidAmount::InsufficientBalance { balance, funds }.into());
        }

        let mut guard = self.strategy.lock().await;
        guard.update(funds, params);

        self.log_open_channels(funds).await;

        let num_network_channels = self
            .ledger_view
            .network_channel_count(self.ids.registry_address, self.ids.token_address)
            .await;

        if num_network_channels == 0 {
            debug!("bootstrapping token network {}", self.ids.token_network_id);
            // Make ourselves visible:
            if let Err(e) = self
                .channel_actions
                .open(
                    self.ids.registry_address,
                    self.ids.token_address,
                    BOOTSTRAP_ADDRESS,
                )
                .await
            {
                warn!("connect: opening a bootstrap channel failed: {:?}", e);
            }
        } else {
            let maintain_outcome = self.maintain_channels(&guard).await;
            if !maintain_outcome.dispatched() {
                debug!("connect: no channels to join");
            }
        }
        Ok(())
    }

    async fn log_open_channels(&self, funds: Amount) {
        let open_channels = self
            .ledger_view
            .open_channels(self.ids.registry_address, self.ids.token_address)
            .await;
        if open_channels.is_empty() {
            return;
        }

        let sum_deposits = self
            .ledger_view
            .own_deposit_sum(self.ids.registry_address, self.ids.token_address)
            .await;
        debug!(
            "connect() called on an already joined token network {}: open_channels = {}, \
             sum_deposits = {}, funds = {}",
            self.ids.token_network_id,
            open_channels.len(),
            sum_deposits,
            funds
        );
    }

    /// Called when new channels are detected in the token network.
    /// Keeps opening and funding channels as long as progress can be made.
    ///
    /// This is a noop if the connection manager has no funds.
    pub async fn retry_connect(&self) {
        let guard = self.strategy.lock().await;
        loop {
            if guard.is_leaving() {
                break;
            }
            let funds_remaining = guard
                .funds_remaining(&self.ledger_view, &self.ids, self.local_address)
                .await;
            if funds_remaining == 0 {
                break;
            }

            let maintain_outcome = self.maintain_channels(&guard).await;
            if !maintain_outcome.dispatched() {
                break;
            }
            if !maintain_outcome.made_progress() {
                // All joins failed. Wait for the next trigger instead of retrying right away.
                debug!("retry_connect: no join attempt succeeded");
                break;
            }
        }
    }

    /// Called when another node selected us as a channel partner.
    ///
    /// Funds the channel with up to the partner's deposit, but not more than our remaining
    /// funds or the initial funding per channel.
    pub async fn join_channel(&self, partner: Address, partner_deposit: Amount) {
        let guard = self.strategy.lock().await;
        if guard.is_leaving() {
            return;
        }

        let funds_remaining = guard
            .funds_remaining(&self.ledger_view, &self.ids, self.local_address)
            .await;
        let joining_funds = partner_deposit
            .min(funds_remaining)
            .min(guard.initial_funding_per_partner());
        if joining_funds == 0 {
            return;
        }

        let deposit_res = self
            .channel_actions
            .set_total_deposit(
                self.ids.registry_address,
                self.ids.token_address,
                partner,
                joining_funds,
            )
            .await;

        match deposit_res {
            Ok(()) => debug!(
                "joined a channel! funds = {}, me = {}, partner = {}",
                joining_funds,
                self.local_address.short_hex(),
                partner.short_hex()
            ),
            Err(DepositError::ChannelNotOpen) => {
                warn!("join_channel: channel not in opened state");
            }
            Err(e) => warn!(
                "join_channel: deposit to {} failed: {:?}",
                partner.short_hex(),
                e
            ),
        }
    }

    /// Leave the token network.
    ///
    /// Closes all of our open channels and waits until they are all settled.
    /// Returns the channels that were closed.
    pub async fn leave(
        &self,
        registry_address: Address,
    ) -> Result<Vec<ChannelState>, LeaveError> {
        // The lock is held until all channels are settled:
        let mut guard = self.strategy.lock().await;
        guard.mark_leaving();

        let channels_to_close = self
            .ledger_view
            .open_channels(registry_address, self.ids.token_address)
            .await;
        info!(
            "leaving token network {}: closing {} channels",
            self.ids.token_network_id,
            channels_to_close.len()
        );
        if channels_to_close.is_empty() {
            return Ok(channels_to_close);
        }

        let partners = channels_to_close
            .iter()
            .map(|channel_state| channel_state.partner)
            .collect::<Vec<_>>();
        self.channel_actions
            .batch_close(registry_address, self.ids.token_address, partners)
            .await?;

        let channel_ids = channels_to_close
            .iter()
            .map(|channel_state| channel_state.channel_id)
            .collect::<Vec<_>>();
        self.settlement_waiter
            .wait_settled(
                registry_address,
                self.ids.token_address,
                channel_ids,
                self.settle_poll_interval,
            )
            .await?;

        info!(
            "left token network {}: {} channels settled",
            self.ids.token_network_id,
            channels_to_close.len()
        );
        Ok(channels_to_close)
    }

    /// Leave the token network in the background.
    /// The returned receiver resolves to the result of `leave()`. Dropping the receiver
    /// does not stop the leave.
    pub fn leave_async(
        &self,
        registry_address: Address,
    ) -> Result<oneshot::Receiver<Result<Vec<ChannelState>, LeaveError>>, LeaveError> {
        let connection_manager = self.clone();
        let (res_sender, res_receiver) = oneshot::channel();
        self.spawner
            .spawn(async move {
                let leave_res = connection_manager.leave(registry_address).await;
                if res_sender.send(leave_res).is_err() {
                    debug!("leave_async: result receiver was dropped");
                }
            })
            .map_err(|_| LeaveError::SpawnError)?;
        Ok(res_receiver)
    }

    /// A consistent snapshot of the connection state.
    pub async fn report(&self) -> ConnectionManagerReport {
        let guard = self.strategy.lock().await;
        let open_channels = self
            .ledger_view
            .open_channels(self.ids.registry_address, self.ids.token_address)
            .await;

        ConnectionManagerReport {
            ids: self.ids,
            funds: guard.funds(),
            initial_channel_target: guard.initial_channel_target(),
            joinable_funds_target: guard.joinable_funds_target(),
            initial_funding_per_partner: guard.initial_funding_per_partner(),
            open_channels,
        }
    }

    /// Open and fund channels until we have `initial_channel_target` funded channels.
    ///
    /// Channels we already have but did not fund are funded first. Only then new channels
    /// are opened, because funding an existing channel takes one transaction instead of two.
    ///
    /// Takes a strategy guard: the funding amount must be computed against the same
    /// strategy state for the whole pass. The spawned joins do not hold the lock.
    pub(crate) async fn maintain_channels(&self, guard: &StrategyGuard<'_>) -> MaintainOutcome {
        let open_channels = self
            .ledger_view
            .open_channels(self.ids.registry_address, self.ids.token_address)
            .await
            .into_iter()
            // The bootstrap channel is not a real channel:
            .filter(|channel_state| channel_state.partner != BOOTSTRAP_ADDRESS)
            .collect::<Vec<_>>();

        let funding_per_partner = guard.initial_funding_per_partner();
        let (funded_channels, nonfunded_channels): (Vec<_>, Vec<_>) = open_channels
            .into_iter()
            .partition(|channel_state| channel_state.own_deposit >= funding_per_partner);

        let possible_new_partners =
            find_new_partners(&self.ledger_view, &self.ids, self.local_address).await;

        let initial_channel_target =
            usize::try_from(guard.initial_channel_target()).unwrap_or(usize::max_value());
        // We already met our target:
        if funded_channels.len() >= initial_channel_target {
            return MaintainOutcome::default();
        }
        // The network is smaller than our target:
        if nonfunded_channels.is_empty() && possible_new_partners.is_empty() {
            return MaintainOutcome::default();
        }

        let num_to_join = initial_channel_target - funded_channels.len();
        let join_partners = nonfunded_channels
            .into_iter()
            .map(|channel_state| channel_state.partner)
            .chain(possible_new_partners.into_iter())
            .take(num_to_join)
            .collect::<Vec<_>>();

        debug!(
            "maintain_channels: joining {} partners, funding per partner: {}",
            join_partners.len(),
            funding_per_partner
        );

        let join_futs = join_partners.into_iter().map(|partner| {
            let spawn_res = self.spawner.spawn_with_handle(join_partner(
                self.channel_actions.clone(),
                self.ids,
                partner,
                funding_per_partner,
            ));
            async move {
                match spawn_res {
                    Ok(join_handle) => (partner, join_handle.await),
                    Err(e) => {
                        error!(
                            "maintain_channels: failed to spawn join with {}: {:?}",
                            partner.short_hex(),
                            e
                        );
                        (partner, JoinOutcome::SpawnFailed)
                    }
                }
            }
        });
        let join_outcomes = future::join_all(join_futs).await;

        let num_funded = join_outcomes
            .iter()
            .filter(|(_partner, outcome)| outcome.is_funded())
            .count();
        debug!(
            "maintain_channels: {}/{} joins funded",
            num_funded,
            join_outcomes.len()
        );

        MaintainOutcome { join_outcomes }
    }
}
