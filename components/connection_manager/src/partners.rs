use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use proto::consts::BOOTSTRAP_ADDRESS;
use proto::ledger::messages::{Address, ChannelState, TokenNetworkIds};

use crate::ledger::LedgerView;

/// Pick the participants we could open a new channel with.
///
/// Participants we already have an open channel with, our own address and the bootstrap
/// address are never selected. The result is shuffled, so that over many nodes all
/// participants have a similar chance of being picked.
pub fn select_new_partners<R>(
    participants: &HashSet<Address>,
    open_channels: &[ChannelState],
    local_address: Address,
    rng: &mut R,
) -> Vec<Address>
where
    R: Rng + ?Sized,
{
    let mut known: HashSet<Address> = open_channels
        .iter()
        .map(|channel_state| channel_state.partner)
        .collect();
    known.insert(BOOTSTRAP_ADDRESS);
    known.insert(local_address);

    let mut available: Vec<Address> = participants.difference(&known).cloned().collect();
    // Iteration order of a HashSet is arbitrary, we want the result to only depend on rng:
    available.sort();
    available.shuffle(rng);
    available
}

/// Search the token network for potential channel partners.
pub async fn find_new_partners<LV>(
    ledger_view: &LV,
    ids: &TokenNetworkIds,
    local_address: Address,
) -> Vec<Address>
where
    LV: LedgerView,
{
    let open_channels = ledger_view
        .open_channels(ids.registry_address, ids.token_address)
        .await;
    let participants = ledger_view
        .participants(ids.registry_address, ids.token_address)
        .await;

    let new_partners = select_new_partners(
        &participants,
        &open_channels,
        local_address,
        &mut rand::thread_rng(),
    );
    debug!("found {} partners", new_partners.len());
    new_partners
}
