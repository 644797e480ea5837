use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::executor::ThreadPool;
use futures::future::{self, BoxFuture};

use proto::ledger::messages::{
    Address, Amount, ChannelId, ChannelState, CloseError, DepositError, OpenChannelError,
    SettleWaitError, TokenNetworkIds, ADDRESS_LEN, CHANNEL_ID_LEN,
};

use crate::ledger::{ChannelActions, LedgerView, SettlementWaiter};
use crate::manager::ConnectionManager;
use crate::settle::PollSettlementWaiter;

pub fn address(index: u8) -> Address {
    // Note that index 0x22 is the bootstrap address.
    Address::new([index; ADDRESS_LEN])
}

pub fn dummy_ids() -> TokenNetworkIds {
    TokenNetworkIds {
        registry_address: address(0xf0),
        token_network_id: address(0xf1),
        token_address: address(0xf2),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimChannelStatus {
    Open,
    Closed,
    Settled,
}

#[derive(Debug, Clone)]
pub struct SimChannel {
    pub channel_id: ChannelId,
    pub participants: (Address, Address),
    pub deposits: (Amount, Amount),
    pub status: SimChannelStatus,
}

impl SimChannel {
    fn has_participant(&self, address: &Address) -> bool {
        self.participants.0 == *address || self.participants.1 == *address
    }

    fn is_between(&self, a: &Address, b: &Address) -> bool {
        (self.participants.0 == *a && self.participants.1 == *b)
            || (self.participants.0 == *b && self.participants.1 == *a)
    }

    /// (own_deposit, partner, partner_deposit) from the point of view of `local`.
    fn view_from(&self, local: &Address) -> (Amount, Address, Amount) {
        if self.participants.0 == *local {
            (self.deposits.0, self.participants.1, self.deposits.1)
        } else {
            (self.deposits.1, self.participants.0, self.deposits.0)
        }
    }

    fn own_deposit_mut(&mut self, local: &Address) -> &mut Amount {
        if self.participants.0 == *local {
            &mut self.deposits.0
        } else {
            &mut self.deposits.1
        }
    }
}

/// Successful ledger transactions, in the order they were confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerOp {
    Open {
        from: Address,
        partner: Address,
    },
    Deposit {
        from: Address,
        partner: Address,
        total_deposit: Amount,
    },
    BatchClose {
        from: Address,
        partners: Vec<Address>,
    },
}

#[derive(Default)]
struct SimLedgerState {
    channels: Vec<SimChannel>,
    balances: HashMap<Address, Amount>,
    ops: Vec<LedgerOp>,
    failing_deposits: HashMap<Address, DepositError>,
    next_channel_index: u64,
    participants_queries: usize,
}

impl SimLedgerState {
    fn new_channel_id(&mut self) -> ChannelId {
        let mut inner = [0u8; CHANNEL_ID_LEN];
        inner[CHANNEL_ID_LEN - 8..].copy_from_slice(&self.next_channel_index.to_be_bytes());
        self.next_channel_index += 1;
        ChannelId::new(inner)
    }

    fn open_channel_mut(&mut self, a: &Address, b: &Address) -> Option<&mut SimChannel> {
        self.channels
            .iter_mut()
            .find(|channel| channel.status == SimChannelStatus::Open && channel.is_between(a, b))
    }
}

/// An in memory token network with a single token.
/// Transactions are confirmed immediately.
#[derive(Clone, Default)]
pub struct SimLedger {
    state: Arc<Mutex<SimLedgerState>>,
}

impl SimLedger {
    pub fn new() -> Self {
        SimLedger::default()
    }

    pub fn set_balance(&self, address: Address, balance: Amount) {
        let mut state = self.state.lock().unwrap();
        state.balances.insert(address, balance);
    }

    pub fn balance(&self, address: &Address) -> Amount {
        let state = self.state.lock().unwrap();
        state.balances.get(address).cloned().unwrap_or(0)
    }

    /// Add an open channel without going through transactions.
    pub fn add_channel(
        &self,
        a: Address,
        b: Address,
        deposit_a: Amount,
        deposit_b: Amount,
    ) -> ChannelId {
        let mut state = self.state.lock().unwrap();
        let channel_id = state.new_channel_id();
        state.channels.push(SimChannel {
            channel_id,
            participants: (a, b),
            deposits: (deposit_a, deposit_b),
            status: SimChannelStatus::Open,
        });
        channel_id
    }

    /// All deposits to `partner` fail with `deposit_error` from now on.
    pub fn fail_deposits_to(&self, partner: Address, deposit_error: DepositError) {
        let mut state = self.state.lock().unwrap();
        state.failing_deposits.insert(partner, deposit_error);
    }

    pub fn ops(&self) -> Vec<LedgerOp> {
        let state = self.state.lock().unwrap();
        state.ops.clone()
    }

    pub fn participants_queries(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.participants_queries
    }

    pub fn channel_status(&self, channel_id: &ChannelId) -> Option<SimChannelStatus> {
        let state = self.state.lock().unwrap();
        state
            .channels
            .iter()
            .find(|channel| channel.channel_id == *channel_id)
            .map(|channel| channel.status)
    }

    /// Open channels of `local`, as seen by `local`.
    pub fn open_channels_of(&self, local: &Address) -> Vec<ChannelState> {
        let state = self.state.lock().unwrap();
        state
            .channels
            .iter()
            .filter(|channel| {
                channel.status == SimChannelStatus::Open && channel.has_participant(local)
            })
            .map(|channel| {
                let (own_deposit, partner, partner_deposit) = channel.view_from(local);
                ChannelState {
                    channel_id: channel.channel_id,
                    partner,
                    own_deposit,
                    partner_deposit,
                }
            })
            .collect()
    }

    /// Settle all closed channels. Returns the amount of channels settled.
    pub fn settle_closed(&self) -> usize {
        let mut state = self.state.lock().unwrap();
        let mut num_settled = 0;
        for channel in &mut state.channels {
            if channel.status == SimChannelStatus::Closed {
                channel.status = SimChannelStatus::Settled;
                num_settled += 1;
            }
        }
        num_settled
    }

    pub fn node(&self, address: Address) -> SimNode {
        SimNode {
            ledger: self.clone(),
            address,
        }
    }
}

/// Access to the simulated ledger from the point of view of a single node.
#[derive(Clone)]
pub struct SimNode {
    ledger: SimLedger,
    address: Address,
}

impl SimNode {
    fn open_sync(&self, partner: Address) -> Result<(), OpenChannelError> {
        let mut state = self.ledger.state.lock().unwrap();
        if state.open_channel_mut(&self.address, &partner).is_some() {
            return Err(OpenChannelError::DuplicateChannel);
        }
        let channel_id = state.new_channel_id();
        state.channels.push(SimChannel {
            channel_id,
            participants: (self.address, partner),
            deposits: (0, 0),
            status: SimChannelStatus::Open,
        });
        state.ops.push(LedgerOp::Open {
            from: self.address,
            partner,
        });
        Ok(())
    }

    fn set_total_deposit_sync(
        &self,
        partner: Address,
        total_deposit: Amount,
    ) -> Result<(), DepositError> {
        let mut guard = self.ledger.state.lock().unwrap();
        let state = &mut *guard;
        if let Some(deposit_error) = state.failing_deposits.get(&partner) {
            return Err(deposit_error.clone());
        }
        let local = self.address;
        let balance = state.balances.get(&local).cloned().unwrap_or(0);

        let channel = state
            .channels
            .iter_mut()
            .find(|channel| {
                channel.status == SimChannelStatus::Open && channel.is_between(&local, &partner)
            })
            .ok_or(DepositError::ChannelNotOpen)?;

        let own_deposit = channel.own_deposit_mut(&local);
        if total_deposit <= *own_deposit {
            return Ok(());
        }
        let added = total_deposit - *own_deposit;
        if balance < added {
            return Err(DepositError::InsufficientFunds);
        }
        *own_deposit = total_deposit;
        state.balances.insert(local, balance - added);
        state.ops.push(LedgerOp::Deposit {
            from: local,
            partner,
            total_deposit,
        });
        Ok(())
    }

    fn batch_close_sync(&self, partners: Vec<Address>) -> Result<(), CloseError> {
        let mut state = self.ledger.state.lock().unwrap();
        for partner in &partners {
            let channel = state
                .open_channel_mut(&self.address, partner)
                .ok_or(CloseError::ChannelNotOpen)?;
            channel.status = SimChannelStatus::Closed;
        }
        state.ops.push(LedgerOp::BatchClose {
            from: self.address,
            partners,
        });
        Ok(())
    }
}

impl LedgerView for SimNode {
    fn open_channels(
        &self,
        _registry_address: Address,
        _token_address: Address,
    ) -> BoxFuture<'_, Vec<ChannelState>> {
        Box::pin(future::ready(self.ledger.open_channels_of(&self.address)))
    }

    fn participants(
        &self,
        _registry_address: Address,
        _token_address: Address,
    ) -> BoxFuture<'_, HashSet<Address>> {
        let mut state = self.ledger.state.lock().unwrap();
        state.participants_queries += 1;
        let participants = state
            .channels
            .iter()
            .filter(|channel| channel.status == SimChannelStatus::Open)
            .flat_map(|channel| vec![channel.participants.0, channel.participants.1])
            .collect::<HashSet<_>>();
        Box::pin(future::ready(participants))
    }

    fn network_channel_count(
        &self,
        _registry_address: Address,
        _token_address: Address,
    ) -> BoxFuture<'_, usize> {
        let state = self.ledger.state.lock().unwrap();
        let count = state
            .channels
            .iter()
            .filter(|channel| channel.status == SimChannelStatus::Open)
            .count();
        Box::pin(future::ready(count))
    }

    fn token_balance(&self, _token_address: Address, address: Address) -> BoxFuture<'_, Amount> {
        Box::pin(future::ready(self.ledger.balance(&address)))
    }

    fn own_deposit_sum(
        &self,
        _registry_address: Address,
        _token_address: Address,
    ) -> BoxFuture<'_, Amount> {
        let sum = self
            .ledger
            .open_channels_of(&self.address)
            .iter()
            .map(|channel_state| channel_state.own_deposit)
            .sum();
        Box::pin(future::ready(sum))
    }

    fn channel_settled(
        &self,
        _registry_address: Address,
        _token_address: Address,
        channel_id: ChannelId,
    ) -> BoxFuture<'_, bool> {
        let settled = self.ledger.channel_status(&channel_id) == Some(SimChannelStatus::Settled);
        Box::pin(future::ready(settled))
    }
}

impl ChannelActions for SimNode {
    fn open(
        &self,
        _registry_address: Address,
        _token_address: Address,
        partner: Address,
    ) -> BoxFuture<'_, Result<(), OpenChannelError>> {
        Box::pin(future::ready(self.open_sync(partner)))
    }

    fn set_total_deposit(
        &self,
        _registry_address: Address,
        _token_address: Address,
        partner: Address,
        total_deposit: Amount,
    ) -> BoxFuture<'_, Result<(), DepositError>> {
        Box::pin(future::ready(
            self.set_total_deposit_sync(partner, total_deposit),
        ))
    }

    fn batch_close(
        &self,
        _registry_address: Address,
        _token_address: Address,
        partners: Vec<Address>,
    ) -> BoxFuture<'_, Result<(), CloseError>> {
        Box::pin(future::ready(self.batch_close_sync(partners)))
    }
}

/// A settlement waiter whose wait is always canceled.
#[derive(Clone)]
pub struct FailingSettlementWaiter;

impl SettlementWaiter for FailingSettlementWaiter {
    fn wait_settled(
        &self,
        _registry_address: Address,
        _token_address: Address,
        _channel_ids: Vec<ChannelId>,
        _poll_interval: Duration,
    ) -> BoxFuture<'_, Result<(), SettleWaitError>> {
        Box::pin(future::ready(Err(SettleWaitError::Canceled)))
    }
}

pub type SimConnectionManager =
    ConnectionManager<SimNode, SimNode, PollSettlementWaiter<SimNode>, ThreadPool>;

pub const TEST_SETTLE_POLL_INTERVAL: Duration = Duration::from_millis(5);

pub fn create_connection_manager(
    ledger: &SimLedger,
    local_address: Address,
    thread_pool: ThreadPool,
) -> SimConnectionManager {
    let sim_node = ledger.node(local_address);
    ConnectionManager::new(
        dummy_ids(),
        local_address,
        sim_node.clone(),
        sim_node.clone(),
        PollSettlementWaiter::new(sim_node),
        TEST_SETTLE_POLL_INTERVAL,
        thread_pool,
    )
}
