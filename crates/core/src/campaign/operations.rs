//! Pure campaign operations.

use crate::message::MessageCounts;

use super::CampaignStatus;

/// Prefix of every campaign subject line.
pub const SUBJECT_PREFIX: &str = "New post: ";

/// Builds the subject line announcing a post.
pub fn post_subject(title: &str) -> String {
    format!("{SUBJECT_PREFIX}{}", title.trim())
}

/// Decides the final status of a scheduled campaign from its message counts.
///
/// Returns `None` while messages are still queued. A campaign where every
/// processed message failed is `Failed`; anything else (including a campaign
/// that never had recipients) is `Sent`.
pub fn campaign_outcome(counts: MessageCounts) -> Option<CampaignStatus> {
    if counts.queued > 0 {
        return None;
    }

    if counts.failed > 0 && counts.sent == 0 {
        Some(CampaignStatus::Failed)
    } else {
        Some(CampaignStatus::Sent)
    }
}
