use std::sync::Arc;

use futures::lock::{Mutex, MutexGuard};

use proto::consts::{DEFAULT_INITIAL_CHANNEL_TARGET, DEFAULT_JOINABLE_FUNDS_TARGET};
use proto::funding::{self, JoinableFraction};
use proto::ledger::messages::{Address, Amount, TokenNetworkIds};

use crate::ledger::LedgerView;

/// Parameters of the connection strategy, as given to `connect()`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyParams {
    /// Amount of funded channels we want to have
    pub initial_channel_target: u32,
    /// Fraction of the funds we do not assign to the initial channels
    pub joinable_funds_target: JoinableFraction,
}

impl Default for StrategyParams {
    fn default() -> Self {
        StrategyParams {
            initial_channel_target: DEFAULT_INITIAL_CHANNEL_TARGET,
            joinable_funds_target: JoinableFraction::from_f64(DEFAULT_JOINABLE_FUNDS_TARGET)
                .unwrap_or_else(JoinableFraction::zero),
        }
    }
}

#[derive(Debug)]
struct Strategy {
    funds: Amount,
    initial_channel_target: u32,
    joinable_funds_target: JoinableFraction,
}

/// Connection strategy state, shared between all the users of a connection manager.
/// The state can only be observed or changed through a `StrategyGuard`.
#[derive(Clone)]
pub(crate) struct SharedStrategy {
    inner: Arc<Mutex<Strategy>>,
}

impl SharedStrategy {
    /// An inert strategy: no funds, no channel target.
    pub fn new() -> Self {
        SharedStrategy {
            inner: Arc::new(Mutex::new(Strategy {
                funds: 0,
                initial_channel_target: 0,
                joinable_funds_target: JoinableFraction::zero(),
            })),
        }
    }

    pub async fn lock(&self) -> StrategyGuard<'_> {
        StrategyGuard {
            guard: self.inner.lock().await,
        }
    }
}

/// Exclusive access to the strategy state.
/// All the quantities derived from the strategy are computed through this guard, so they
/// are always computed against a consistent snapshot.
pub(crate) struct StrategyGuard<'a> {
    guard: MutexGuard<'a, Strategy>,
}

impl<'a> StrategyGuard<'a> {
    pub fn funds(&self) -> Amount {
        self.guard.funds
    }

    pub fn initial_channel_target(&self) -> u32 {
        self.guard.initial_channel_target
    }

    pub fn joinable_funds_target(&self) -> JoinableFraction {
        self.guard.joinable_funds_target
    }

    /// Replace funds and strategy parameters together.
    pub fn update(&mut self, funds: Amount, params: StrategyParams) {
        self.guard.funds = funds;
        self.guard.initial_channel_target = params.initial_channel_target;
        self.guard.joinable_funds_target = params.joinable_funds_target;
    }

    pub fn mark_leaving(&mut self) {
        self.guard.initial_channel_target = 0;
    }

    pub fn is_leaving(&self) -> bool {
        self.guard.initial_channel_target < 1
    }

    pub fn initial_funding_per_partner(&self) -> Amount {
        funding::initial_funding_per_partner(
            self.guard.funds,
            self.guard.initial_channel_target,
            self.guard.joinable_funds_target,
        )
    }

    /// Funds we may still deposit: our funds minus what we already deposited, capped by our
    /// token balance.
    pub async fn funds_remaining<LV>(
        &self,
        ledger_view: &LV,
        ids: &TokenNetworkIds,
        local_address: Address,
    ) -> Amount
    where
        LV: LedgerView,
    {
        if self.guard.funds == 0 {
            return 0;
        }
        let token_balance = ledger_view
            .token_balance(ids.token_address, local_address)
            .await;
        let own_deposit_sum = ledger_view
            .own_deposit_sum(ids.registry_address, ids.token_address)
            .await;

        funding::funds_remaining(self.guard.funds, own_deposit_sum, token_balance)
    }
}
