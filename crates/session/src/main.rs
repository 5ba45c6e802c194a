//! `animator` -- animate a single image from the command line.
//!
//! Runs one session end to end against the job API named by
//! `ANIMATOR_API_URL`, or the local simulation when it is unset, and prints
//! the location of the result. Ctrl-C cancels the running job.
//!
//! ```text
//! animator <image> [--style natural] [--quality MEDIUM] [--duration 3] [--motion 0.5]
//! ```
//!
//! # Environment variables
//!
//! | Variable                    | Required | Default | Description                        |
//! |-----------------------------|----------|---------|------------------------------------|
//! | `ANIMATOR_API_URL`          | no       | --      | Job API base URL, e.g. `http://localhost:5000` |
//! | `ANIMATOR_POLL_INTERVAL_MS` | no       | `2000`  | Delay between remote status polls  |

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use animator_client::JobApi;
use animator_core::config::{Quality, StyleType};
use animator_core::source_image::mime_type_for_path;
use animator_core::status::LifecycleStatus;
use animator_core::video::{format_duration, format_time_remaining};
use animator_session::{AnimationSessionStore, SessionConfig};

const USAGE: &str =
    "usage: animator <image> [--style NAME] [--quality LOW|MEDIUM|HIGH] [--duration SECS] [--motion 0..1]";

#[derive(Debug, Default)]
struct CliArgs {
    image: PathBuf,
    style: Option<StyleType>,
    quality: Option<Quality>,
    duration_secs: Option<f64>,
    motion_intensity: Option<f64>,
}

impl CliArgs {
    fn parse(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let mut parsed = Self::default();
        let mut image = None;

        while let Some(arg) = args.next() {
            let mut value = || args.next().with_context(|| format!("{arg} requires a value\n{USAGE}"));
            match arg.as_str() {
                "--style" => parsed.style = Some(StyleType::parse(&value()?)?),
                "--quality" => parsed.quality = Some(Quality::parse(&value()?)?),
                "--duration" => {
                    parsed.duration_secs =
                        Some(value()?.parse().context("--duration must be a number")?)
                }
                "--motion" => {
                    parsed.motion_intensity =
                        Some(value()?.parse().context("--motion must be a number")?)
                }
                "-h" | "--help" => bail!(USAGE),
                other if image.is_none() && !other.starts_with("--") => {
                    image = Some(PathBuf::from(other))
                }
                other => bail!("Unexpected argument '{other}'\n{USAGE}"),
            }
        }

        parsed.image = image.context(USAGE)?;
        Ok(parsed)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "animator=info,animator_session=info,animator_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse(std::env::args().skip(1))?;
    let config = SessionConfig::from_env()?;

    if let Some(url) = &config.api_url {
        let health = JobApi::new(url.as_str())
            .health()
            .await
            .with_context(|| format!("Job backend at {url} is not reachable"))?;
        tracing::info!(
            api_url = %url,
            status = %health.status,
            model_loaded = health.model_loaded,
            device = health.device.as_deref().unwrap_or("unknown"),
            "Job backend is healthy",
        );
    }

    let store = Arc::new(AnimationSessionStore::with_backend(config.build_backend()));
    tracing::info!(
        session_id = %store.session_id(),
        backend = store.backend_kind().as_str(),
        "Starting animator",
    );

    load_image(&store, &args.image).await?;
    store.update_config(|c| {
        if let Some(style) = args.style {
            c.set_style(style);
        }
        if let Some(quality) = args.quality {
            c.set_quality(quality);
        }
        if let Some(duration) = args.duration_secs {
            c.set_duration_secs(duration)?;
        }
        if let Some(motion) = args.motion_intensity {
            c.set_motion_intensity(motion)?;
        }
        Ok(())
    })?;

    let mut snapshots = store.watch();
    if !store.start_processing() {
        bail!("Could not start processing");
    }

    tokio::spawn({
        let store = Arc::clone(&store);
        async move {
            if tokio::signal::ctrl_c().await.is_ok() && store.cancel_processing() {
                tracing::warn!("Cancelling on Ctrl-C");
            }
        }
    });

    let mut last_status = None;
    let mut last_percent = None;
    let finished = loop {
        if snapshots.changed().await.is_err() {
            bail!("Session closed unexpectedly");
        }
        let snapshot = snapshots.borrow_and_update().clone();

        let percent = (snapshot.progress * 100.0).round() as i64;
        if snapshot.status != last_status || Some(percent) != last_percent {
            if let Some(message) = &snapshot.status_message {
                if snapshot.status == Some(LifecycleStatus::Processing) {
                    tracing::info!(
                        eta = %format_time_remaining(snapshot.estimated_seconds_remaining),
                        "{message}",
                    );
                } else {
                    tracing::info!("{message}");
                }
            }
            last_status = snapshot.status;
            last_percent = Some(percent);
        }

        if !snapshot.is_processing {
            break snapshot;
        }
    };

    match finished.status {
        Some(LifecycleStatus::Completed) => {
            if let Some(video) = &finished.result {
                tracing::info!(
                    width = video.width,
                    height = video.height,
                    duration = %format_duration(video.duration_secs),
                    format = %video.mime_type(),
                    "Animation ready",
                );
            }
            if let Some(url) = store.download_video() {
                println!("{url}");
            }
            Ok(())
        }
        Some(LifecycleStatus::Failed) => {
            bail!("Animation failed: {}", finished.error.as_deref().unwrap_or("Unknown error"))
        }
        Some(LifecycleStatus::Canceled) => {
            tracing::warn!("Animation was canceled");
            Ok(())
        }
        other => bail!("Session ended in unexpected state {other:?}"),
    }
}

async fn load_image(store: &AnimationSessionStore, path: &Path) -> anyhow::Result<()> {
    let display = path.display().to_string();
    let mime_type = mime_type_for_path(&display)
        .with_context(|| format!("Unsupported image type: {display}"))?;
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {display}"))?;
    let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| display.clone());

    store.load_image(
        file_name,
        mime_type,
        data,
        format!("file://{}", absolute.display()),
    )?;
    Ok(())
}
