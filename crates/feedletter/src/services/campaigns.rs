use anyhow::Context;
use chrono::Utc;

use feedletter_core::campaign::NewCampaign;
use feedletter_core::storage::CampaignRepository;

/// Creates the campaign for a source, or returns the id of the existing one.
///
/// When the upsert fails the id is looked up by source, so a campaign created
/// by a concurrent poll is still found. Fails only when both steps fail.
pub async fn create_campaign(
    repo: &dyn CampaignRepository,
    campaign: &NewCampaign,
) -> anyhow::Result<i64> {
    let upsert_error = match repo.upsert_campaign(campaign, Utc::now()).await {
        Ok(id) => {
            tracing::debug!(campaign_id = id, source = %campaign.source, "Campaign stored");
            return Ok(id);
        }
        Err(err) => err,
    };

    tracing::warn!(
        source = %campaign.source,
        error = %upsert_error,
        "Campaign upsert failed, looking up existing campaign"
    );

    match repo.find_campaign_id_by_source(&campaign.source).await {
        Ok(Some(id)) => Ok(id),
        Ok(None) => Err(upsert_error)
            .with_context(|| format!("Failed to create campaign for {}", campaign.source)),
        Err(lookup_error) => {
            tracing::error!(
                source = %campaign.source,
                error = %lookup_error,
                "Campaign lookup failed"
            );
            Err(upsert_error)
                .with_context(|| format!("Failed to create campaign for {}", campaign.source))
        }
    }
}
