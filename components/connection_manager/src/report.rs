use std::fmt;

use proto::funding::JoinableFraction;
use proto::ledger::messages::{Amount, ChannelState, TokenNetworkIds};

/// A snapshot of a connection manager's state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionManagerReport {
    pub ids: TokenNetworkIds,
    pub funds: Amount,
    pub initial_channel_target: u32,
    pub joinable_funds_target: JoinableFraction,
    pub initial_funding_per_partner: Amount,
    pub open_channels: Vec<ChannelState>,
}

impl ConnectionManagerReport {
    pub fn is_leaving(&self) -> bool {
        self.initial_channel_target < 1
    }

    /// Open channels where our deposit reaches the current funding per partner
    pub fn num_funded_channels(&self) -> usize {
        self.open_channels
            .iter()
            .filter(|channel_state| channel_state.own_deposit >= self.initial_funding_per_partner)
            .count()
    }
}

impl fmt::Display for ConnectionManagerReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "ConnectionManager(target={} channels={})",
            self.initial_channel_target,
            self.open_channels.len()
        )
    }
}
