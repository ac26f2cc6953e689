//! CLI command implementations

use crate::output::{self, format_clock, print_qualities, print_snapshot, OutputFormat};
use anyhow::bail;
use reel_core::{
    Config, ContentId, HttpApi, InitOutcome, PlaybackCoordinator, PlaybackServices, ProfileId,
    QualityCatalog, ResumePositionStore, SessionSnapshot,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How long to hold the player for a background lookup
const LOOKUP_WAIT: Duration = Duration::from_secs(2);

/// Options for a simulated watch session
pub struct WatchOptions {
    pub content: String,
    pub profile: Option<String>,
    pub play_seconds: u64,
    pub speed: f64,
    pub quality: Option<String>,
}

/// Run a watch session with a simulated player clock
pub async fn watch(config: &Config, options: WatchOptions, format: &str) -> anyhow::Result<()> {
    if !options.speed.is_finite() || options.speed <= 0.0 {
        bail!("--speed must be a positive number");
    }

    let api = Arc::new(HttpApi::new(&config.api)?);
    let coordinator =
        PlaybackCoordinator::new(PlaybackServices::from_api(api), config.playback.clone());

    println!("Starting playback of content {}", options.content);

    let outcome = coordinator
        .initialize(
            Some(ContentId::new(options.content.clone())),
            options.profile.clone().map(ProfileId::new),
        )
        .await;

    match outcome {
        Ok(InitOutcome::Ready) | Ok(InitOutcome::AlreadyActive) => {}
        Ok(InitOutcome::ProfileRequired) => {
            println!("Select a profile with --profile before watching");
            return Ok(());
        }
        Ok(other) => {
            println!("Session not started ({:?})", other);
            return Ok(());
        }
        Err(err) => {
            let snapshot = coordinator.snapshot();
            print_snapshot(&snapshot, format);
            eprintln!("\nPlayback failed: {}", err);
            if err.is_fatal() && snapshot.is_error() {
                tokio::time::sleep(config.playback.error_redirect_delay()).await;
                println!("Returning to details for content {}", options.content);
            }
            coordinator.teardown();
            return Err(err.into());
        }
    }

    if let Some(quality) = &options.quality {
        await_lookup(&coordinator, "GetQualities", |s| s.quality_switch_enabled).await;
        if let Err(err) = coordinator.change_quality(quality) {
            warn!(quality = %quality, error = %err, "Keeping default quality");
        }
    }

    // The player clock must not start before the stored position is known
    if !await_lookup(&coordinator, "GetResumePosition", |s| s.resume_settled).await {
        warn!("Resume position still pending, starting from the manifest offset");
    }

    let snapshot = coordinator.snapshot();
    print_snapshot(&snapshot, format);
    if !snapshot.is_ready() {
        println!("Session ended before playback started");
        return Ok(());
    }

    let duration = snapshot.duration.unwrap_or(0.0);
    let mut position = snapshot.resume_position;
    let mut played = 0u64;

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.tick().await;
    coordinator.report_time(position);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                position = (position + options.speed).min(duration);
                played += 1;
                coordinator.report_time(position);

                if position >= duration {
                    coordinator.handle_ended().await?;
                    println!("\nFinished at {}", format_clock(position));
                    break;
                }
                if options.play_seconds > 0 && played >= options.play_seconds {
                    coordinator.teardown();
                    println!("\nStopped at {}", format_clock(position));
                    break;
                }
            }
            _ = &mut ctrl_c => {
                coordinator.teardown();
                println!("\nInterrupted at {}", format_clock(position));
                break;
            }
        }
    }

    info!(position, played, "Watch session ended");
    Ok(())
}

/// Wait up to [`LOOKUP_WAIT`] for a background lookup to land in the session state
async fn await_lookup(
    coordinator: &PlaybackCoordinator,
    lookup: &'static str,
    settled: impl FnMut(&SessionSnapshot) -> bool,
) -> bool {
    let mut rx = coordinator.subscribe();
    let settled_in_time = match tokio::time::timeout(LOOKUP_WAIT, rx.wait_for(settled)).await {
        Ok(Ok(_)) => true,
        Ok(Err(_)) => {
            debug!(lookup, "Session state closed before lookup settled");
            false
        }
        Err(_) => {
            debug!(
                lookup,
                waited_ms = LOOKUP_WAIT.as_millis() as u64,
                "Lookup did not settle in time"
            );
            false
        }
    };
    settled_in_time
}

/// List the quality catalog for a content item
pub async fn qualities(config: &Config, content: &str, format: &str) -> anyhow::Result<()> {
    let api = HttpApi::new(&config.api)?;
    let qualities = api.get_qualities(&ContentId::new(content)).await?;

    if OutputFormat::from(format) == OutputFormat::Text {
        println!("Content {}: {} qualities", content, qualities.len());
    }
    print_qualities(&qualities, format);
    Ok(())
}

/// Show the stored resume position
pub async fn resume(
    config: &Config,
    content: &str,
    profile: &str,
    format: &str,
) -> anyhow::Result<()> {
    let api = HttpApi::new(&config.api)?;
    let position = api
        .get_position(&ContentId::new(content), &ProfileId::new(profile))
        .await?;

    match OutputFormat::from(format) {
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "contentId": content,
            "profileId": profile,
            "position": position,
        })),
        OutputFormat::Text => println!(
            "Content {} / profile {}: resume at {}",
            content,
            profile,
            format_clock(position)
        ),
    }
    Ok(())
}
