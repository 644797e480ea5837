use crate::ledger::messages::{Address, ADDRESS_LEN};

/// A well known address that is never a real participant.
/// The first node of an empty token network opens a channel with this address to become
/// visible to other nodes.
pub const BOOTSTRAP_ADDRESS: Address = Address::new([0x22; ADDRESS_LEN]);

/// Default amount of funded channels we try to keep open.
pub const DEFAULT_INITIAL_CHANNEL_TARGET: u32 = 3;

/// Default fraction of the funds that is not assigned to the initial channels.
/// It is kept for channels other nodes open with us.
pub const DEFAULT_JOINABLE_FUNDS_TARGET: f64 = 0.4;

/// Default interval between two queries for the settlement of closed channels.
pub const DEFAULT_SETTLE_POLL_INTERVAL_MS: u64 = 500;

/// Memory allocated to the channel of incoming network events.
pub const DEFAULT_EVENT_CHANNEL_LEN: usize = 0x20;
