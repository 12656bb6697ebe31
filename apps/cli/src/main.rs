use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    config::load_settings_from, ClientEvent, HttpMatchApi, MatchAction, MatchCache,
    MatchController, MatchView, Notification,
};
use shared::{
    domain::{MatchId, MatchStatus, UserId, Viewer},
    protocol::PhotoUpload,
};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Inspect and act on a beauty score match")]
struct Args {
    /// Settings file; missing files fall back to defaults.
    #[arg(long, default_value = client_core::config::DEFAULT_SETTINGS_FILE)]
    config: PathBuf,
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    viewer_id: Option<i64>,
    #[arg(long)]
    match_id: i64,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current screen and the controls it offers.
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Accept the challenge with a photo.
    Accept {
        #[arg(long)]
        photo: Option<PathBuf>,
    },
    Decline,
    /// Run the comparison (creator only, once both photos are in).
    Compare,
    /// Poll until the match completes.
    Watch,
}

async fn read_photo(path: &Path) -> Result<PhotoUpload> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("photo.bin")
        .to_string();
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read photo '{}'", path.display()))?;
    let mime_type = mime_guess::from_path(path).first_raw().map(str::to_string);
    Ok(PhotoUpload {
        filename,
        mime_type,
        bytes,
    })
}

fn print_notification(notification: &Notification) {
    if notification.is_error() {
        eprintln!("error: {}: {}", notification.title, notification.detail);
    } else {
        println!("{}: {}", notification.title, notification.detail);
    }
}

/// Prints queued notifications. Returns whether the first one, which reports
/// the action itself, was an error; later ones come from the follow-up refetch.
fn drain_notifications(events: &mut broadcast::Receiver<ClientEvent>) -> bool {
    let mut action_failed = None;
    loop {
        match events.try_recv() {
            Ok(ClientEvent::Notification(notification)) => {
                if action_failed.is_none() {
                    action_failed = Some(notification.is_error());
                }
                print_notification(&notification);
            }
            Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => {
                return action_failed.unwrap_or(false)
            }
        }
    }
}

async fn print_screen(controller: &MatchController) -> Result<()> {
    let view = controller.view().await?;
    println!("{view}");
    if !matches!(view, MatchView::Result(_)) {
        let affordances = controller.affordances().await?;
        println!(
            "controls: photo={} accept={} decline={} compare={}",
            affordances.photo_picker, affordances.accept, affordances.decline, affordances.compare
        );
    }
    Ok(())
}

async fn run_action(controller: &MatchController, action: MatchAction) -> Result<()> {
    let mut events = controller.subscribe_events();
    controller.handle(action).await;
    if drain_notifications(&mut events) {
        return Err(anyhow!("match action failed"));
    }
    print_screen(controller).await
}

async fn watch(controller: &Arc<MatchController>, every: std::time::Duration) -> Result<()> {
    let mut events = controller.subscribe_events();
    let poller = controller.spawn_poller(every);
    loop {
        match events.recv().await {
            Ok(ClientEvent::SnapshotUpdated(snapshot)) => {
                println!("-- status: {}", snapshot.status);
                print_screen(controller).await?;
                if snapshot.status == MatchStatus::Completed {
                    break;
                }
            }
            Ok(ClientEvent::Notification(notification)) => print_notification(&notification),
            Ok(ClientEvent::SnapshotInvalidated(_)) | Err(broadcast::error::RecvError::Lagged(_)) => {}
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    poller.await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let args = Args::parse();

    let mut settings = load_settings_from(&args.config, std::env::vars());
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    if let Some(viewer_id) = args.viewer_id {
        settings.viewer_id = Some(viewer_id);
    }
    settings.validate()?;
    let viewer_id = settings
        .viewer_id
        .ok_or_else(|| anyhow!("viewer id missing: pass --viewer-id or set APP__VIEWER_ID"))?;

    let api = HttpMatchApi::with_timeout(settings.server_url.clone(), settings.request_timeout())?;
    let server_url = api.server_url().to_string();
    let controller = MatchController::new(
        Arc::new(api),
        Arc::new(MatchCache::new()),
        MatchId(args.match_id),
        Viewer::new(UserId(viewer_id)),
    );
    info!(
        server_url = %server_url,
        match_id = %controller.match_id(),
        viewer_id = %controller.viewer().id,
        "match client ready"
    );

    match args.command {
        Command::Show { json } => {
            let snapshot = controller.refresh().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                print_screen(&controller).await?;
            }
            Ok(())
        }
        Command::Accept { photo } => {
            if let Some(path) = photo {
                let upload = read_photo(&path).await?;
                controller.handle(MatchAction::SelectPhoto(upload)).await;
            }
            run_action(&controller, MatchAction::Accept).await
        }
        Command::Decline => run_action(&controller, MatchAction::Decline).await,
        Command::Compare => run_action(&controller, MatchAction::Compare).await,
        Command::Watch => watch(&controller, settings.poll_interval()).await,
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
