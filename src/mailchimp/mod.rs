pub mod auth;
pub mod error;
pub mod rest;
pub mod types;

use async_trait::async_trait;
use error::ApiError;
use types::{Campaign, CampaignCreationRequest, MembersPage, SegmentBatchRequest, SegmentBatchResponse, Template};

/// The marketing-platform calls the campaign workflow depends on.
#[async_trait]
pub trait CampaignApi: Send + Sync {
    /// First page of members carrying the segment's tag.
    async fn segment_members(&self, segment_id: u64) -> Result<MembersPage, ApiError>;

    async fn update_segment(
        &self,
        segment_id: u64,
        batch: &SegmentBatchRequest,
    ) -> Result<SegmentBatchResponse, ApiError>;

    async fn templates(&self) -> Result<Vec<Template>, ApiError>;

    async fn create_campaign(&self, request: &CampaignCreationRequest) -> Result<Campaign, ApiError>;

    /// `Ok(false)` when the platform answers 404 for the id.
    async fn campaign_exists(&self, campaign_id: &str) -> Result<bool, ApiError>;

    async fn send_campaign(&self, campaign_id: &str) -> Result<(), ApiError>;
}
