//! MediaSuite - command line front end
//!
//! Talks to a running MediaSuite backend to inspect and download media.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use mediasuite::downloader::{format_rate, sanitize_filename};
use mediasuite::queue::QueueEvent;
use mediasuite::{resolve, AcquisitionStatus, AppSettings, MediaKind, MediaSession};
use std::path::PathBuf;
use tokio::sync::broadcast::error::RecvError;

#[derive(Parser)]
#[command(name = "mediasuite", version, about = "Resolve, inspect and download media")]
struct Cli {
    /// Backend base URL (overrides MEDIASUITE_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Directory completed downloads are saved to
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Keep history in memory only
    #[arg(long, global = true)]
    no_history_db: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show what a URL resolves to, without contacting the backend
    Resolve { url: String },
    /// Fetch and print metadata for a URL
    Info { url: String },
    /// Download a URL and wait for it to finish
    Download {
        url: String,
        /// Download audio instead of video
        #[arg(long)]
        audio: bool,
        /// Quality to request (defaults to the first offered)
        #[arg(long)]
        quality: Option<String>,
    },
    /// List completed downloads
    History {
        /// Remove every history entry
        #[arg(long)]
        clear: bool,
        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Ask the backend to update yt-dlp
    UpdateTool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt::init();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    let mut settings = AppSettings::from_env();
    if let Some(url) = cli.api_url {
        settings.api_base_url = url;
    }
    if let Some(dir) = cli.output_dir {
        settings.download_location = dir;
    }
    if cli.no_history_db {
        settings.persist_history = false;
    }

    match cli.command {
        Command::Resolve { url } => {
            let resource = resolve(&url)?;
            println!("{}\t{}", resource.kind(), resource.id());
        }
        Command::Info { url } => {
            let session = MediaSession::connect(settings).await?;
            session.set_url(url).await;
            let metadata = session.fetch_metadata().await?;

            println!("Title:    {}", metadata.title);
            println!("Uploader: {}", metadata.uploader_name);
            println!("Duration: {}", metadata.duration_label);
            if let Some(views) = metadata.view_count {
                println!("Views:    {}", views);
            }
            println!("Video:    {}", metadata.available_video_qualities.join(", "));
            println!("Audio:    {}", metadata.available_audio_qualities.join(", "));
        }
        Command::Download {
            url,
            audio,
            quality,
        } => {
            let session = MediaSession::connect(settings).await?;
            download(&session, url, audio, quality).await?;
        }
        Command::History { clear, json } => {
            let session = MediaSession::connect(settings).await?;
            if clear {
                session.clear_history().await?;
                println!("History cleared");
                return Ok(());
            }

            let entries = session.history().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("No downloads yet");
            } else {
                for entry in entries {
                    println!(
                        "{}  {:<5} {:<6} {}  ({})",
                        entry.completed_at.format("%Y-%m-%d %H:%M"),
                        entry.media_kind,
                        entry.quality,
                        entry.title,
                        entry.filename
                    );
                }
            }
        }
        Command::UpdateTool => {
            let session = MediaSession::connect(settings).await?;
            let message = session.update_tool().await?;
            println!("{}", message);
        }
    }

    Ok(())
}

async fn download(
    session: &MediaSession,
    url: String,
    audio: bool,
    quality: Option<String>,
) -> Result<()> {
    session.set_url(url).await;
    let metadata = session.fetch_metadata().await?;
    println!("Title: {}", metadata.title);

    if audio {
        session.set_download_kind(MediaKind::Audio).await;
    }
    if let Some(quality) = quality {
        session.select_quality(&quality).await?;
    }

    let mut events = session.subscribe();
    let id = session.start_download().await?;
    println!(
        "Downloading {} at {}",
        session.download_kind().await,
        session.selected_quality().await
    );

    loop {
        match events.recv().await {
            Ok(QueueEvent::Progress {
                id: event_id,
                percent,
                rate,
                eta,
            }) if event_id == id => {
                println!("Progress: {:.1}%, {}, ETA {}", percent, format_rate(rate), eta);
            }
            Ok(QueueEvent::Completed {
                id: event_id,
                filename,
                ..
            }) if event_id == id => {
                println!(
                    "Saved {}",
                    session
                        .settings()
                        .download_location
                        .join(sanitize_filename(&filename))
                        .display()
                );
                return Ok(());
            }
            Ok(QueueEvent::Failed {
                id: event_id,
                error,
                ..
            }) if event_id == id => bail!("Download failed: {}", error),
            Ok(_) => {}
            Err(RecvError::Lagged(_)) => {
                if let Some(record) = session.record(id).await {
                    match record.status {
                        AcquisitionStatus::Completed => return Ok(()),
                        AcquisitionStatus::Failed(error) => bail!("Download failed: {}", error),
                        _ => {}
                    }
                }
            }
            Err(RecvError::Closed) => bail!("Download {} ended without a result", id),
        }
    }
}
