use std::collections::HashSet;
use std::time::Duration;

use futures::future::BoxFuture;

use proto::ledger::messages::{
    Address, Amount, ChannelId, ChannelState, CloseError, DepositError, OpenChannelError,
    SettleWaitError,
};

/// Read only queries against the ledger (And our local view of the token network).
pub trait LedgerView {
    /// Open channels we participate in.
    fn open_channels(
        &self,
        registry_address: Address,
        token_address: Address,
    ) -> BoxFuture<'_, Vec<ChannelState>>;

    /// Addresses of all the participants of the token network.
    fn participants(
        &self,
        registry_address: Address,
        token_address: Address,
    ) -> BoxFuture<'_, HashSet<Address>>;

    /// Amount of channels in the whole token network.
    fn network_channel_count(
        &self,
        registry_address: Address,
        token_address: Address,
    ) -> BoxFuture<'_, usize>;

    fn token_balance(&self, token_address: Address, address: Address) -> BoxFuture<'_, Amount>;

    /// Sum of our deposits over all of our open channels.
    fn own_deposit_sum(
        &self,
        registry_address: Address,
        token_address: Address,
    ) -> BoxFuture<'_, Amount>;

    fn channel_settled(
        &self,
        registry_address: Address,
        token_address: Address,
        channel_id: ChannelId,
    ) -> BoxFuture<'_, bool>;
}

/// Ledger transactions over channels. Every method resolves only after the transaction was
/// confirmed (or failed).
pub trait ChannelActions {
    fn open(
        &self,
        registry_address: Address,
        token_address: Address,
        partner: Address,
    ) -> BoxFuture<'_, Result<(), OpenChannelError>>;

    /// Set our total deposit in the channel with `partner` to `total_deposit`.
    fn set_total_deposit(
        &self,
        registry_address: Address,
        token_address: Address,
        partner: Address,
        total_deposit: Amount,
    ) -> BoxFuture<'_, Result<(), DepositError>>;

    fn batch_close(
        &self,
        registry_address: Address,
        token_address: Address,
        partners: Vec<Address>,
    ) -> BoxFuture<'_, Result<(), CloseError>>;
}

pub trait SettlementWaiter {
    /// Resolves when all the channels in `channel_ids` are settled.
    fn wait_settled(
        &self,
        registry_address: Address,
        token_address: Address,
        channel_ids: Vec<ChannelId>,
        poll_interval: Duration,
    ) -> BoxFuture<'_, Result<(), SettleWaitError>>;
}
