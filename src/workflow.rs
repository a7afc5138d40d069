use crate::config::CampaignConfig;
use crate::mailchimp::error::ApiError;
use crate::mailchimp::types::{CampaignCreationRequest, Member, SegmentBatchResponse};
use crate::mailchimp::CampaignApi;
use crate::poll::{self, PollError, PollPolicy};
use crate::segments::{batch_request, TagMode};
use crate::templates;
use chrono::NaiveDate;

/// Tag segments the run moves members through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentIds {
    pub remaining: u64,
    pub queued: u64,
    pub sent: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowReport {
    pub campaign_id: String,
    pub web_id: u64,
    pub members: usize,
    pub poll_attempts: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("failed to fetch members of segment {segment_id}")]
    FetchMembers {
        segment_id: u64,
        #[source]
        source: ApiError,
    },

    #[error("segment {0} has no members")]
    NoMembers(u64),

    #[error("failed to {mode} members on segment {segment_id}")]
    Tagging {
        segment_id: u64,
        mode: TagMode,
        #[source]
        source: ApiError,
    },

    #[error("failed to fetch templates")]
    FetchTemplates(#[source] ApiError),

    #[error("no template named {name:?} created on the day before {today}")]
    NoTemplate { name: String, today: NaiveDate },

    #[error("failed to create campaign")]
    CreateCampaign(#[source] ApiError),

    #[error("campaign {campaign_id} never became visible")]
    CampaignNotVisible {
        campaign_id: String,
        #[source]
        source: PollError,
    },

    #[error("failed to send campaign {campaign_id}")]
    SendCampaign {
        campaign_id: String,
        #[source]
        source: ApiError,
    },
}

/// Queue the remaining members, build and send today's campaign, then mark them sent.
pub struct CampaignWorkflow<A> {
    api: A,
    list_id: String,
    segments: SegmentIds,
    campaign: CampaignConfig,
    polling: PollPolicy,
}

impl<A: CampaignApi> CampaignWorkflow<A> {
    pub fn new(
        api: A,
        list_id: impl Into<String>,
        segments: SegmentIds,
        campaign: CampaignConfig,
        polling: PollPolicy,
    ) -> Self {
        Self {
            api,
            list_id: list_id.into(),
            segments,
            campaign,
            polling,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Run every step in order. `today` anchors the template lookup.
    ///
    /// Everything up to and including the send stops at the first failure;
    /// tags already applied are left in place. Once the campaign is sent both
    /// re-tagging calls are attempted and the first failure is returned.
    pub async fn run(&self, today: NaiveDate) -> Result<WorkflowReport, WorkflowError> {
        let members = self.remaining_members().await?;
        self.tag(self.segments.queued, &members, TagMode::Add).await?;

        let template_id = self.yesterdays_template(today).await?;

        let request = CampaignCreationRequest::targeting_segment(
            &self.list_id,
            self.segments.queued,
            template_id,
            &self.campaign,
        );
        let campaign = self
            .api
            .create_campaign(&request)
            .await
            .map_err(WorkflowError::CreateCampaign)?;
        tracing::info!(
            campaign_id = %campaign.id,
            web_id = campaign.web_id,
            status = %campaign.status,
            "campaign created"
        );

        let poll_attempts = poll::wait_until(&self.polling, || self.api.campaign_exists(&campaign.id))
            .await
            .map_err(|source| WorkflowError::CampaignNotVisible {
                campaign_id: campaign.id.clone(),
                source,
            })?;
        tracing::debug!(campaign_id = %campaign.id, attempts = poll_attempts, "campaign visible");

        self.api
            .send_campaign(&campaign.id)
            .await
            .map_err(|source| WorkflowError::SendCampaign {
                campaign_id: campaign.id.clone(),
                source,
            })?;
        tracing::info!(campaign_id = %campaign.id, recipients = members.len(), "campaign sent");

        let sent = self.tag(self.segments.sent, &members, TagMode::Add).await;
        if let Err(ref e) = sent {
            tracing::error!(error = %e, "failed to tag members as sent, still clearing queued tag");
        }
        let unqueued = self.tag(self.segments.queued, &members, TagMode::Remove).await;
        sent?;
        unqueued?;

        Ok(WorkflowReport {
            campaign_id: campaign.id,
            web_id: campaign.web_id,
            members: members.len(),
            poll_attempts,
        })
    }

    async fn remaining_members(&self) -> Result<Vec<Member>, WorkflowError> {
        let segment_id = self.segments.remaining;
        let page = self
            .api
            .segment_members(segment_id)
            .await
            .map_err(|source| WorkflowError::FetchMembers { segment_id, source })?;

        if page.members.is_empty() {
            return Err(WorkflowError::NoMembers(segment_id));
        }
        // Only the first page is fetched.
        if page.total_items > page.members.len() as u64 {
            tracing::warn!(
                segment_id,
                total = page.total_items,
                fetched = page.members.len(),
                "segment has more members than one page, the rest are left for the next run"
            );
        }
        tracing::info!(segment_id, count = page.members.len(), "fetched remaining members");
        Ok(page.members)
    }

    async fn yesterdays_template(&self, today: NaiveDate) -> Result<u64, WorkflowError> {
        let catalog = self
            .api
            .templates()
            .await
            .map_err(WorkflowError::FetchTemplates)?;

        let name = &self.campaign.template_name;
        let template = templates::find_yesterdays_template(&catalog, name, today).ok_or_else(|| {
            WorkflowError::NoTemplate {
                name: name.clone(),
                today,
            }
        })?;
        tracing::info!(template_id = template.id, name = %template.name, "found yesterday's template");
        Ok(template.id)
    }

    async fn tag(
        &self,
        segment_id: u64,
        members: &[Member],
        mode: TagMode,
    ) -> Result<SegmentBatchResponse, WorkflowError> {
        let batch = batch_request(mode, members);
        let resp = self
            .api
            .update_segment(segment_id, &batch)
            .await
            .map_err(|source| WorkflowError::Tagging {
                segment_id,
                mode,
                source,
            })?;

        for failure in &resp.errors {
            tracing::warn!(
                segment_id,
                %mode,
                emails = ?failure.email_addresses,
                error = %failure.error,
                "platform rejected part of the batch"
            );
        }
        tracing::info!(
            segment_id,
            %mode,
            added = resp.total_added,
            removed = resp.total_removed,
            errors = resp.error_count,
            "segment updated"
        );
        Ok(resp)
    }
}
