use proto::ledger::messages::{Address, Amount, DepositError, OpenChannelError, TokenNetworkIds};

use crate::ledger::ChannelActions;

/// The result of trying to get a funded channel with one partner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The channel exists and our deposit was set
    Funded,
    OpenFailed(OpenChannelError),
    DepositFailed(DepositError),
    /// The join task could not be spawned
    SpawnFailed,
}

impl JoinOutcome {
    pub fn is_funded(&self) -> bool {
        match self {
            JoinOutcome::Funded => true,
            _ => false,
        }
    }
}

/// Make sure a channel with `partner` exists, and that it is funded on our side with
/// `total_deposit`.
///
/// Failures are logged and returned as part of the outcome. They never affect other
/// join attempts running at the same time.
pub async fn join_partner<CA>(
    channel_actions: CA,
    ids: TokenNetworkIds,
    partner: Address,
    total_deposit: Amount,
) -> JoinOutcome
where
    CA: ChannelActions,
{
    match channel_actions
        .open(ids.registry_address, ids.token_address, partner)
        .await
    {
        // The channel may already exist: either the partner opened it, or we opened it
        // earlier and never managed to fund it.
        Ok(()) | Err(OpenChannelError::DuplicateChannel) => {}
        Err(open_error) => {
            warn!(
                "join_partner: opening a channel with {} failed: {:?}",
                partner.short_hex(),
                open_error
            );
            return JoinOutcome::OpenFailed(open_error);
        }
    }

    let deposit_res = channel_actions
        .set_total_deposit(
            ids.registry_address,
            ids.token_address,
            partner,
            total_deposit,
        )
        .await;

    match deposit_res {
        Ok(()) => {
            debug!(
                "join_partner: funded channel with {}, deposit: {}",
                partner.short_hex(),
                total_deposit
            );
            JoinOutcome::Funded
        }
        Err(DepositError::TransactionFailed) => {
            warn!(
                "join_partner: deposit to {} failed: transaction reverted",
                partner.short_hex()
            );
            JoinOutcome::DepositFailed(DepositError::TransactionFailed)
        }
        Err(DepositError::ChannelNotOpen) => {
            warn!(
                "join_partner: channel with {} not in opened state",
                partner.short_hex()
            );
            JoinOutcome::DepositFailed(DepositError::ChannelNotOpen)
        }
        Err(DepositError::InsufficientFunds) => {
            // Concurrent joins compete over the same funds.
            error!(
                "join_partner: not enough funds to deposit {} to {}",
                total_deposit,
                partner.short_hex()
            );
            JoinOutcome::DepositFailed(DepositError::InsufficientFunds)
        }
    }
}
