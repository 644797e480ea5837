use futures::channel::{mpsc, oneshot};
use futures::task::{Spawn, SpawnError, SpawnExt};
use futures::StreamExt;

use proto::ledger::messages::NetworkEvent;

use crate::ledger::{ChannelActions, LedgerView, SettlementWaiter};
use crate::manager::ConnectionManager;

/// Feed network events into the connection manager.
///
/// A new channel anywhere in the token network is a chance to make progress towards our
/// channel target. A deposit from a partner into a channel we did not fund yet means we
/// were selected as a partner, and we should join the channel.
pub async fn connection_manager_loop<LV, CA, SW, S>(
    connection_manager: ConnectionManager<LV, CA, SW, S>,
    mut incoming_events: mpsc::Receiver<NetworkEvent>,
) where
    LV: LedgerView + Clone + Send + Sync + 'static,
    CA: ChannelActions + Clone + Send + Sync + 'static,
    SW: SettlementWaiter + Clone + Send + Sync + 'static,
    S: Spawn + Clone + Send + Sync + 'static,
{
    while let Some(event) = incoming_events.next().await {
        match event {
            NetworkEvent::ChannelOpened {
                channel_id,
                participant1,
                participant2,
            } => {
                trace!(
                    "connection_manager_loop: new channel {} between {} and {}",
                    channel_id.short_hex(),
                    participant1.short_hex(),
                    participant2.short_hex()
                );
                connection_manager.retry_connect().await;
            }
            NetworkEvent::PartnerDeposit {
                channel_id,
                partner,
                partner_deposit,
                own_deposit,
            } => {
                if own_deposit != 0 {
                    // We already funded our side of this channel.
                    continue;
                }
                trace!(
                    "connection_manager_loop: partner {} deposited {} into channel {}",
                    partner.short_hex(),
                    partner_deposit,
                    channel_id.short_hex()
                );
                connection_manager
                    .join_channel(partner, partner_deposit)
                    .await;
            }
        }
    }
    debug!("connection_manager_loop: incoming events closed");
}

/// Spawn a `connection_manager_loop`.
/// Returns a sender for network events, and a receiver that resolves when the loop ends
/// (After all event senders were dropped). The loop keeps running if the receiver is
/// dropped.
pub fn spawn_connection_manager_loop<LV, CA, SW, S>(
    connection_manager: ConnectionManager<LV, CA, SW, S>,
    event_channel_len: usize,
    spawner: &S,
) -> Result<(mpsc::Sender<NetworkEvent>, oneshot::Receiver<()>), SpawnError>
where
    LV: LedgerView + Clone + Send + Sync + 'static,
    CA: ChannelActions + Clone + Send + Sync + 'static,
    SW: SettlementWaiter + Clone + Send + Sync + 'static,
    S: Spawn + Clone + Send + Sync + 'static,
{
    let (event_sender, incoming_events) = mpsc::channel(event_channel_len);
    let (done_sender, done_receiver) = oneshot::channel();
    spawner.spawn(async move {
        connection_manager_loop(connection_manager, incoming_events).await;
        if done_sender.send(()).is_err() {
            trace!("connection_manager_loop: nobody is waiting for the loop to end");
        }
    })?;
    Ok((event_sender, done_receiver))
}
