//! Queues campaign messages and delivers them.

use chrono::Utc;

use feedletter_core::campaign::{campaign_outcome, CampaignStatus};
use feedletter_core::message::compose;
use feedletter_core::subscriber::unsubscribe_link;

use crate::state::AppState;

/// Reason stored on messages whose subscriber left before delivery.
pub const INACTIVE_SUBSCRIBER: &str = "subscriber not active";

/// Queues one message per active subscriber.
///
/// Returns how many messages were newly queued; pairs that were already
/// queued are skipped. A failure for one subscriber is logged and does not
/// stop the others.
pub async fn queue_messages_for_campaign(
    state: &AppState,
    campaign_id: i64,
) -> anyhow::Result<usize> {
    let subscriber_ids = state.subscribers.active_subscriber_ids().await?;

    if subscriber_ids.is_empty() {
        tracing::warn!(campaign_id, "No active subscribers, nothing queued");
        return Ok(0);
    }

    let mut queued = 0;
    for subscriber_id in subscriber_ids {
        match state
            .messages
            .enqueue_message(campaign_id, subscriber_id, Utc::now())
            .await
        {
            Ok(true) => queued += 1,
            Ok(false) => {}
            Err(err) => {
                tracing::warn!(campaign_id, subscriber_id, error = %err, "Failed to queue message");
            }
        }
    }

    tracing::info!(campaign_id, queued, "Messages queued");
    Ok(queued)
}

/// Sends up to `batch_size` queued messages, oldest first.
///
/// Each message ends up `sent` or `failed`. Returns how many were sent. A
/// batch size below 1 is treated as 1.
pub async fn send_queued_messages(state: &AppState, batch_size: i64) -> anyhow::Result<usize> {
    let batch = state.messages.queued_messages(batch_size.max(1)).await?;

    if batch.is_empty() {
        tracing::debug!("No queued messages");
        return Ok(0);
    }

    let total = batch.len();
    let mut sent = 0;

    for message in batch {
        if !message.subscriber_status.receives_mail() {
            tracing::debug!(
                message_id = message.id,
                subscriber_id = message.subscriber_id,
                status = %message.subscriber_status,
                "Skipping message for inactive subscriber"
            );
            if let Err(err) = state
                .messages
                .mark_failed(message.id, INACTIVE_SUBSCRIBER)
                .await
            {
                tracing::error!(message_id = message.id, error = %err, "Failed to mark message failed");
            }
            continue;
        }

        let link = unsubscribe_link(&state.config.public_url, &message.email);
        let mail = compose(&message, &link);

        match state.mailer.send(&mail).await {
            Ok(()) => {
                sent += 1;
                if let Err(err) = state.messages.mark_sent(message.id, Utc::now()).await {
                    tracing::error!(message_id = message.id, error = %err, "Failed to mark message sent");
                }
            }
            Err(send_error) => {
                tracing::warn!(
                    message_id = message.id,
                    campaign_id = message.campaign_id,
                    error = %send_error,
                    "Failed to send message"
                );
                if let Err(err) = state
                    .messages
                    .mark_failed(message.id, &send_error.to_string())
                    .await
                {
                    tracing::error!(message_id = message.id, error = %err, "Failed to mark message failed");
                }
            }
        }
    }

    tracing::info!(sent, failed = total - sent, "Dispatch batch finished");
    Ok(sent)
}

/// Moves scheduled campaigns without queued messages to `sent` or `failed`.
///
/// A settled campaign that gained queued messages afterwards is put back to
/// `scheduled` and settled again once they drain. Returns how many campaigns
/// were settled.
pub async fn settle_campaigns(state: &AppState) -> anyhow::Result<usize> {
    let mut settled = 0;

    for (campaign_id, current) in state.campaigns.unsettled_campaigns().await? {
        let counts = state.messages.message_counts(campaign_id).await?;

        match campaign_outcome(counts) {
            Some(status) => {
                if status != current {
                    state
                        .campaigns
                        .update_campaign_status(campaign_id, status)
                        .await?;
                }
                tracing::info!(
                    campaign_id,
                    %status,
                    sent = counts.sent,
                    failed = counts.failed,
                    "Campaign settled"
                );
                settled += 1;
            }
            None if current != CampaignStatus::Scheduled => {
                state
                    .campaigns
                    .update_campaign_status(campaign_id, CampaignStatus::Scheduled)
                    .await?;
                tracing::warn!(
                    campaign_id,
                    previous = %current,
                    queued = counts.queued,
                    "Campaign has queued messages again, reopened"
                );
            }
            None => {}
        }
    }

    Ok(settled)
}
