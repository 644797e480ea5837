use serde::{Deserialize, Serialize};

pub const ADDRESS_LEN: usize = 20;
pub const CHANNEL_ID_LEN: usize = 32;

// An address on the ledger (A participant, a token or a registry).
define_fixed_bytes!(Address, ADDRESS_LEN);

// The identifier of a channel inside a token network.
define_fixed_bytes!(ChannelId, CHANNEL_ID_LEN);

/// An amount of tokens.
pub type Amount = u128;

/// Identifiers of a single token network. Immutable for the lifetime of a connection manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenNetworkIds {
    pub registry_address: Address,
    pub token_network_id: Address,
    pub token_address: Address,
}

/// Our view of a channel we participate in, as reported by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelState {
    pub channel_id: ChannelId,
    pub partner: Address,
    /// Total amount we deposited into the channel
    pub own_deposit: Amount,
    /// Total amount the partner deposited into the channel
    pub partner_deposit: Amount,
}

/// Notifications about changes in the token network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkEvent {
    /// A new channel was opened somewhere in the token network
    ChannelOpened {
        channel_id: ChannelId,
        participant1: Address,
        participant2: Address,
    },
    /// A partner deposited into a channel we participate in.
    PartnerDeposit {
        channel_id: ChannelId,
        partner: Address,
        /// Total deposit of the partner
        partner_deposit: Amount,
        /// Our total deposit in the same channel
        own_deposit: Amount,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenChannelError {
    /// A channel with this partner already exists
    DuplicateChannel,
    TransactionFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepositError {
    /// The deposit transaction was reverted
    TransactionFailed,
    /// The channel is not in an opened state (For example: it is already closing)
    ChannelNotOpen,
    /// Not enough tokens to perform the deposit
    InsufficientFunds,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseError {
    TransactionFailed,
    ChannelNotOpen,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleWaitError {
    /// Settlement status could not be queried
    QueryFailed,
    /// The wait was aborted before all channels were settled
    Canceled,
}
