//! Long-poll update source.
//!
//! One loop: fetch a batch with `getUpdates`, forward each update to the
//! dispatch channel, then advance the confirmed offset. The offset is only
//! stored after the channel accepts the update, so a full queue never
//! confirms updates that were not handed off.

use std::sync::atomic::Ordering;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::api::GetUpdatesParams;
use crate::bot::Bot;
use crate::error::ApiError;
use crate::types::Update;

/// Runs until cancelled or until the dispatch side hangs up. Fetch failures
/// never end the loop; they back off per the configured retry policy.
pub(crate) async fn run(bot: Bot, tx: mpsc::Sender<Update>, cancel: CancellationToken) {
    let config = bot.poller_config().clone();
    let mut failures: u32 = 0;

    loop {
        let offset = match bot.offset().load(Ordering::SeqCst) {
            0 => None,
            confirmed => Some(confirmed),
        };
        let params = GetUpdatesParams {
            offset,
            limit: config.limit,
            timeout: Some(config.timeout.as_secs()),
            allowed_updates: config.allowed_updates.clone(),
        };

        let batch = tokio::select! {
            () = cancel.cancelled() => return,
            result = bot.api().get_updates(&params) => result,
        };

        match batch {
            Ok(updates) => {
                failures = 0;
                if !updates.is_empty() {
                    tracing::debug!(count = updates.len(), "fetched update batch");
                }
                for update in updates {
                    let update_id = update.update_id;
                    if tx.send(update).await.is_err() {
                        // Dispatch loop is gone; nothing left to feed.
                        return;
                    }
                    bot.offset().store(update_id + 1, Ordering::SeqCst);
                }
            }
            Err(err) => {
                let mut delay = config.retry.delay_for_attempt(failures);
                if let ApiError::Telegram { retry_after: Some(hint), .. } = &err {
                    delay = delay.max(*hint);
                }
                failures = failures.saturating_add(1);
                tracing::warn!(
                    error = %err,
                    failures,
                    delay_ms = delay.as_millis() as u64,
                    "getUpdates failed; backing off"
                );
                bot.report(err.into(), None);
                tokio::select! {
                    () = cancel.cancelled() => return,
                    () = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
}
