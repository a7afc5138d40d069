use serde::{Deserialize, Serialize};

use crate::config::CampaignConfig;

/// GET /lists/{list_id}/segments/{segment_id}/members
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MembersPage {
    #[serde(default)]
    pub total_items: u64,
    #[serde(default)]
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MemberStats {
    #[serde(default)]
    pub avg_open_rate: f64,
    #[serde(default)]
    pub avg_click_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Member {
    pub id: String,
    #[serde(default)]
    pub list_id: String,
    pub email_address: String,
    #[serde(default)]
    pub unique_email_id: String,
    #[serde(default)]
    pub email_type: String,
    #[serde(default)]
    pub stats: MemberStats,
    #[serde(default)]
    pub ip_signup: String,
    #[serde(default)]
    pub timestamp_signup: String,
    #[serde(default)]
    pub timestamp_opt: String,
    #[serde(default)]
    pub member_rating: u8,
    #[serde(default)]
    pub last_changed: String,
    #[serde(default)]
    pub email_client: String,
}

/// POST /lists/{list_id}/segments/{segment_id}
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SegmentBatchRequest {
    pub members_to_add: Vec<String>,
    pub members_to_remove: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SegmentBatchResponse {
    #[serde(default)]
    pub members_added: Vec<Member>,
    #[serde(default)]
    pub members_removed: Vec<Member>,
    #[serde(default)]
    pub errors: Vec<BatchError>,
    #[serde(default)]
    pub total_added: u64,
    #[serde(default)]
    pub total_removed: u64,
    #[serde(default)]
    pub error_count: u64,
}

/// A single address the platform refused to add or remove.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchError {
    #[serde(default)]
    pub email_addresses: Vec<String>,
    #[serde(default)]
    pub error: String,
}

/// GET /templates
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplatesPage {
    #[serde(default)]
    pub templates: Vec<Template>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Template {
    pub id: u64,
    #[serde(rename = "type", default)]
    pub template_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub drag_and_drop: bool,
    #[serde(default)]
    pub responsive: bool,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub date_created: String,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub folder_id: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub share_url: String,
}

/// POST /campaigns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignCreationRequest {
    #[serde(rename = "type")]
    pub campaign_type: String, // "regular", "plaintext", ...
    pub recipients: Recipients,
    pub settings: CampaignSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipients {
    pub list_id: String,
    #[serde(rename = "segment_opts")]
    pub segment_options: SegmentOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentOptions {
    pub saved_segment_id: u64,
    #[serde(rename = "match")]
    pub match_mode: String, // "any" or "all"
    pub conditions: Vec<SegmentCondition>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentCondition {
    pub condition_type: String,
    pub field: String,
    pub op: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignSettings {
    pub subject_line: String,
    pub title: String,
    pub from_name: String,
    pub reply_to: String,
    pub template_id: u64,
}

impl CampaignCreationRequest {
    /// Campaign aimed at a single static (tag) segment of `list_id`.
    pub fn targeting_segment(
        list_id: &str,
        segment_id: u64,
        template_id: u64,
        campaign: &CampaignConfig,
    ) -> Self {
        Self {
            campaign_type: campaign.campaign_type.clone(),
            recipients: Recipients {
                list_id: list_id.to_string(),
                segment_options: SegmentOptions {
                    saved_segment_id: segment_id,
                    match_mode: campaign.match_mode.clone(),
                    conditions: vec![SegmentCondition {
                        condition_type: "StaticSegment".to_string(),
                        field: "static_segment".to_string(),
                        op: "static_is".to_string(),
                        value: segment_id,
                    }],
                },
            },
            settings: CampaignSettings {
                subject_line: campaign.subject_line.clone(),
                title: campaign.title.clone(),
                from_name: campaign.from_name.clone(),
                reply_to: campaign.reply_to.clone(),
                template_id,
            },
        }
    }
}

/// GET /campaigns/{id}, POST /campaigns
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Campaign {
    pub id: String,
    #[serde(default)]
    pub web_id: u64,
    #[serde(rename = "type", default)]
    pub campaign_type: String,
    #[serde(default)]
    pub create_time: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub emails_sent: u64,
    #[serde(default)]
    pub send_time: String,
}
