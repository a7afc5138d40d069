use anyhow::{Context, Result};
use campaign_runner::config::{Config, Environment};
use campaign_runner::mailchimp::auth::MailchimpAuth;
use campaign_runner::mailchimp::rest::MailchimpRest;
use campaign_runner::workflow::{CampaignWorkflow, SegmentIds};
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("campaign_runner=info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("campaign run failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = Config::load_or_default(Path::new("config.toml"))?;
    let env = Environment::from_env().context("incomplete environment")?;
    let polling = config.polling.policy()?;

    let auth = MailchimpAuth::new(config.mailchimp.username.clone(), env.api_key.clone());
    let request_timeout = config.mailchimp.request_timeout()?;
    let rest = MailchimpRest::new(auth, &env.base_url, &env.list_id, request_timeout)
        .context("failed to build HTTP client")?;

    let segments = SegmentIds {
        remaining: env.remaining_segment_id,
        queued: env.queued_segment_id,
        sent: env.sent_segment_id,
    };
    tracing::info!(
        list_id = %env.list_id,
        remaining = segments.remaining,
        queued = segments.queued,
        sent = segments.sent,
        "starting campaign run"
    );

    let workflow = CampaignWorkflow::new(rest, env.list_id, segments, config.campaign, polling);
    let today = chrono::Utc::now().date_naive();
    let report = workflow.run(today).await?;

    tracing::info!(
        campaign_id = %report.campaign_id,
        web_id = report.web_id,
        members = report.members,
        poll_attempts = report.poll_attempts,
        "campaign run complete"
    );
    Ok(())
}
