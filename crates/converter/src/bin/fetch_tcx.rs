//! Downloads raw TCX exports for the authenticated athlete's activities.
//!
//! Requires `STRAVA_CLIENT_ID`, `STRAVA_CLIENT_SECRET` and
//! `STRAVA_REFRESH_TOKEN` (create an API application at
//! <https://www.strava.com/settings/api>). Already-downloaded activities
//! are skipped, so the fetch is resumable.

use std::fs;
use std::path::PathBuf;

use anyhow::Context as _;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use converter::client::{self, ExportClient};
use converter::env;

const PER_PAGE: u32 = 30;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let client_id =
        std::env::var("STRAVA_CLIENT_ID").context("STRAVA_CLIENT_ID must be set")?;
    let client_secret =
        std::env::var("STRAVA_CLIENT_SECRET").context("STRAVA_CLIENT_SECRET must be set")?;
    let refresh_token =
        std::env::var("STRAVA_REFRESH_TOKEN").context("STRAVA_REFRESH_TOKEN must be set")?;
    let output_dir = PathBuf::from(env::var_or("STRAVA_TCX_OUTPUT_DIR", "./strava_tcx_data"));

    fs::create_dir_all(&output_dir)?;

    let token = client::refresh_access_token(
        "https://www.strava.com",
        &client_id,
        &client_secret,
        &refresh_token,
    )
    .await?;
    info!("access token refreshed");

    let api = ExportClient::new(token.access_token);

    let mut downloaded = 0usize;
    let mut skipped = 0usize;
    for page in 1u32.. {
        let activities = api.list_activities(page, PER_PAGE).await?;
        if activities.is_empty() {
            break;
        }

        for activity in &activities {
            let path = output_dir.join(format!("activity_{}.tcx", activity.id));
            if path.exists() {
                skipped += 1;
                continue;
            }

            // A failed export is logged and skipped; the batch continues.
            match api.fetch_tcx(activity.id).await {
                Ok(tcx_text) => {
                    fs::write(&path, tcx_text)?;
                    downloaded += 1;
                    info!(id = activity.id, name = %activity.name, "downloaded");
                }
                Err(e) => {
                    error!(id = activity.id, "export failed: {e}");
                }
            }
        }

        if activities.len() < PER_PAGE as usize {
            break;
        }
    }

    info!(downloaded, skipped, "fetch complete");
    Ok(())
}
