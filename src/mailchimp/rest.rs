use super::auth::MailchimpAuth;
use super::error::ApiError;
use super::types::*;
use super::CampaignApi;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Members fetched per segment request. Only the first page is read.
pub const MEMBERS_PAGE_SIZE: u32 = 100;

pub struct MailchimpRest {
    client: Client,
    auth: MailchimpAuth,
    base_url: String,
    list_id: String,
}

impl MailchimpRest {
    pub fn new(
        auth: MailchimpAuth,
        base_url: &str,
        list_id: &str,
        request_timeout: Duration,
    ) -> reqwest::Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(2)
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            client,
            auth,
            base_url: base_url.trim_end_matches('/').to_string(),
            list_id: list_id.to_string(),
        })
    }

    /// Authenticated request builder for `path` under the base URL.
    fn request(&self, method: Method, path: &str, query: &str) -> RequestBuilder {
        let url = format!("{}{}{}", self.base_url, path, query);
        self.auth.apply(self.client.request(method, url))
    }

    /// Send a request and return the body of a 2xx response.
    async fn execute(
        &self,
        method: &'static str,
        path: &str,
        req: RequestBuilder,
    ) -> Result<String, ApiError> {
        let transport = |source| ApiError::Transport {
            method,
            path: path.to_string(),
            source,
        };

        let resp = req.send().await.map_err(transport)?;
        let status = resp.status();
        let body = resp.text().await.map_err(transport)?;
        if !status.is_success() {
            return Err(ApiError::Status {
                method,
                path: path.to_string(),
                status,
                body,
            });
        }
        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &str) -> Result<T, ApiError> {
        let body = self.execute("GET", path, self.request(Method::GET, path, query)).await?;
        decode(path, &body)
    }

    async fn post_json<B, T>(&self, path: &str, payload: &B) -> Result<T, ApiError>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.request(Method::POST, path, "").json(payload);
        let body = self.execute("POST", path, req).await?;
        decode(path, &body)
    }
}

fn decode<T: DeserializeOwned>(path: &str, body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|source| ApiError::Decode {
        path: path.to_string(),
        source,
    })
}

#[async_trait]
impl CampaignApi for MailchimpRest {
    async fn segment_members(&self, segment_id: u64) -> Result<MembersPage, ApiError> {
        let path = format!("/lists/{}/segments/{}/members", self.list_id, segment_id);
        let query = format!("?offset=0&count={}", MEMBERS_PAGE_SIZE);
        self.get_json(&path, &query).await
    }

    async fn update_segment(
        &self,
        segment_id: u64,
        batch: &SegmentBatchRequest,
    ) -> Result<SegmentBatchResponse, ApiError> {
        let path = format!("/lists/{}/segments/{}", self.list_id, segment_id);
        self.post_json(&path, batch).await
    }

    async fn templates(&self) -> Result<Vec<Template>, ApiError> {
        let page: TemplatesPage = self.get_json("/templates", "").await?;
        Ok(page.templates)
    }

    async fn create_campaign(&self, request: &CampaignCreationRequest) -> Result<Campaign, ApiError> {
        self.post_json("/campaigns", request).await
    }

    async fn campaign_exists(&self, campaign_id: &str) -> Result<bool, ApiError> {
        let path = format!("/campaigns/{}", campaign_id);
        match self.get_json::<Campaign>(&path, "").await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn send_campaign(&self, campaign_id: &str) -> Result<(), ApiError> {
        let path = format!("/campaigns/{}/actions/send", campaign_id);
        self.execute("POST", &path, self.request(Method::POST, &path, "")).await?;
        Ok(())
    }
}
