use std::time::Duration;

use async_std::task::sleep;
use futures::future::BoxFuture;

use proto::ledger::messages::{Address, ChannelId, SettleWaitError};

use crate::ledger::{LedgerView, SettlementWaiter};

/// Waits for settlement by querying the ledger view every `poll_interval`.
#[derive(Clone)]
pub struct PollSettlementWaiter<LV> {
    ledger_view: LV,
}

impl<LV> PollSettlementWaiter<LV> {
    pub fn new(ledger_view: LV) -> Self {
        PollSettlementWaiter { ledger_view }
    }
}

impl<LV> SettlementWaiter for PollSettlementWaiter<LV>
where
    LV: LedgerView + Send + Sync,
{
    fn wait_settled(
        &self,
        registry_address: Address,
        token_address: Address,
        channel_ids: Vec<ChannelId>,
        poll_interval: Duration,
    ) -> BoxFuture<'_, Result<(), SettleWaitError>> {
        Box::pin(async move {
            let mut pending = channel_ids;
            loop {
                let mut still_pending = Vec::new();
                for channel_id in pending {
                    if !self
                        .ledger_view
                        .channel_settled(registry_address, token_address, channel_id)
                        .await
                    {
                        still_pending.push(channel_id);
                    }
                }
                if still_pending.is_empty() {
                    return Ok(());
                }
                trace!(
                    "wait_settled: {} channels not settled yet",
                    still_pending.len()
                );
                pending = still_pending;
                sleep(poll_interval).await;
            }
        })
    }
}
