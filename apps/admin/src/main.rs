use std::{sync::Arc, time::Duration};

use analysis_backend::HttpAnalysisBackend;
use anyhow::{bail, Context, Result};
use clap::Parser;
use courts::{analyzable_bookings, CourtDirectory, MockCourtDirectory};
use shared::domain::SessionId;
use tracing::info;
use url::Url;
use workflow::{AnalysisWorkflowController, ControllerConfig, WorkflowState};

mod config;

use config::load_settings;

#[derive(Parser, Debug)]
struct Args {
    /// Base URL of the analysis service (overrides config).
    #[arg(long)]
    backend_url: Option<String>,
    /// Session id to analyze; omit to only list analyzable bookings.
    #[arg(long)]
    session: Option<String>,
    /// Pipeline deadline in seconds (overrides config).
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(backend_url) = args.backend_url {
        settings.backend_url = backend_url;
    }
    if let Some(timeout_secs) = args.timeout_secs {
        settings.request_timeout_secs = Some(timeout_secs);
    }

    let directory = MockCourtDirectory::seeded();
    let courts = directory.list_courts().await?;
    let bookings = analyzable_bookings(&courts);
    println!("Analyzable past bookings:");
    for booking in &bookings {
        println!(
            "  {} {} booked by {} -> session {}",
            booking.court_name,
            booking.time,
            booking.booked_by.as_deref().unwrap_or("-"),
            booking.session_id
        );
    }

    let Some(session) = args.session else {
        return Ok(());
    };
    let session = SessionId::new(session);

    let base_url: Url = settings
        .backend_url
        .parse()
        .with_context(|| format!("invalid backend url: {}", settings.backend_url))?;
    let backend = Arc::new(HttpAnalysisBackend::new(base_url));
    let controller = AnalysisWorkflowController::new_with_config(
        backend,
        ControllerConfig {
            deadline: settings.request_timeout_secs.map(Duration::from_secs),
            max_sessions: settings.max_sessions,
        },
    );

    let mut events = controller.subscribe(&session).await;
    if let Err(err) = controller.request_analysis(&session).await {
        bail!("analysis request rejected: {err}");
    }
    controller.set_display_focus(&session).await;

    loop {
        let snapshot = events.recv().await?;
        match snapshot.state {
            WorkflowState::Idle => {}
            WorkflowState::Triggering => info!(session_id = %session, "triggering analysis"),
            WorkflowState::AwaitingResults => {
                info!(session_id = %session, "analysis running, awaiting results")
            }
            WorkflowState::Succeeded => {
                let result = snapshot
                    .result
                    .context("succeeded snapshot must carry a result")?;
                println!("Analysis results for session {session}");
                println!("  Total shots detected: {}", result.total_shots);
                match result.heatmap_data {
                    Some(points) => println!("  Position samples: {}", points.len()),
                    None => println!("  No player position data available."),
                }
                if let Some(dims) = result.video_dimensions {
                    println!("  Reference frame: {}x{}", dims.width, dims.height);
                }
                break;
            }
            WorkflowState::Failed => {
                let error = snapshot
                    .error
                    .context("failed snapshot must carry an error")?;
                println!("Analysis failed ({:?}): {}", error.kind, error.message);
                break;
            }
        }
    }

    controller.clear_display_focus().await;
    Ok(())
}
