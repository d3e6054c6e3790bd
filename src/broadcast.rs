use anyhow::Result;
use tracing::{info, warn};

use crate::store::ChatStore;
use crate::telegram::Notify;

/// Outcome of one fan-out run. Failures are counted, never dropped.
#[derive(Debug, PartialEq, Eq)]
pub struct BroadcastReport {
    pub sent: usize,
    pub failed: usize,
}

impl BroadcastReport {
    pub fn all_sent(&self) -> bool {
        self.failed == 0
    }
}

/// Send `text` to every chat id in the store, one at a time. A failed
/// send is logged and counted; the remaining sends still run.
pub async fn fan_out(
    store: &ChatStore,
    notifier: &dyn Notify,
    text: &str,
) -> Result<BroadcastReport> {
    let chat_ids = store.all_chat_ids().await?;

    let mut report = BroadcastReport { sent: 0, failed: 0 };
    for chat_id in chat_ids {
        match notifier.send_message(chat_id, text).await {
            Ok(()) => report.sent += 1,
            Err(e) => {
                warn!("Broadcast send to chat {} failed: {:#}", chat_id, e);
                report.failed += 1;
            }
        }
    }

    info!(
        "Broadcast complete: {} sent, {} failed",
        report.sent, report.failed
    );
    Ok(report)
}
