//! # Verify Binary Entry Point
//!
//! Drives one verification screen from the terminal.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin verify -- guide
//!
//! cargo run --bin verify -- --config config/kiosk.toml submit \
//!   --id-image ./passport.jpg --live-image ./selfie.jpg
//! ```
//!
//! Capture the live photo from a camera helper's snapshot file instead:
//! ```bash
//! cargo run --bin verify -- submit --id-image ./passport.jpg \
//!   --live-snapshot /run/kiosk/frame.jpg --faces-dir ./faces
//! ```
//!
//! The binary will:
//! 1. Load configuration (or use defaults) and apply `--base-url`
//! 2. Upload the ID photo and upload or capture the live photo
//! 3. Submit both, once per `--repeat`, printing status, faces and timing
//! 4. Write extracted faces and metrics if asked
//! 5. Exit non-zero if the last submission failed

use clap::{Parser, Subcommand};
use log::{info, warn, LevelFilter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use face_verify::acquisition::{ImageSlot, Role, SnapshotCamera};
use face_verify::client::{Started, SubmissionMetrics, VerificationClient, VerificationScreen};
use face_verify::common::config::ClientConfig;
use face_verify::common::logging::init_logger;
use face_verify::presentation::{render_faces, render_guide, render_status, render_timer, save_faces};

/// Command-line arguments for the verify binary
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the client configuration file (TOML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Override the service origin from the configuration
    #[arg(long)]
    base_url: Option<String>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the three-step user guide
    Guide,
    /// Submit an ID photo and a live photo for verification
    Submit(SubmitArgs),
}

#[derive(clap::Args, Debug)]
struct SubmitArgs {
    /// Photo of the identity document
    #[arg(long)]
    id_image: PathBuf,

    /// Live photo of the person, uploaded from a file
    #[arg(long, conflicts_with = "live_snapshot", required_unless_present = "live_snapshot")]
    live_image: Option<PathBuf>,

    /// Capture the live photo from a camera snapshot file
    #[arg(long)]
    live_snapshot: Option<PathBuf>,

    /// Number of sequential submissions of the same pair
    #[arg(long, default_value_t = 1)]
    repeat: u32,

    /// Directory to write the extracted faces into
    #[arg(long)]
    faces_dir: Option<PathBuf>,

    /// Path to write metrics JSON output
    #[arg(long)]
    metrics_output: Option<String>,
}

async fn upload_into(slot: &mut ImageSlot, path: &Path) -> anyhow::Result<()> {
    let role = slot.role();
    slot.upload(path)
        .await
        .map_err(|e| anyhow::anyhow!("{}: {}", role.label(), e.log_context()))?;
    Ok(())
}

fn print_view(screen: &VerificationScreen) {
    let view = screen.view();
    for section in [render_faces(view), render_status(view), render_timer(view)]
        .into_iter()
        .flatten()
    {
        println!("{}\n", section);
    }
}

async fn submit(config: ClientConfig, args: SubmitArgs) -> anyhow::Result<ExitCode> {
    let client = Arc::new(VerificationClient::new(&config.service)?);
    info!(
        "Client '{}' using {}",
        config.client.name,
        client.verify_url()
    );

    let live_slot = match &args.live_snapshot {
        Some(path) => ImageSlot::with_camera(
            Role::Live,
            Box::new(SnapshotCamera::new(path)),
            &config.camera,
        ),
        None => ImageSlot::new(Role::Live),
    };

    let mut screen = VerificationScreen::new(client, ImageSlot::new(Role::Document), live_slot);

    let metrics = if args.metrics_output.is_some() {
        let m = Arc::new(Mutex::new(SubmissionMetrics::new(config.client.name.clone())));
        screen = screen.with_metrics(m.clone());
        Some(m)
    } else {
        None
    };

    upload_into(screen.slot_mut(Role::Document), &args.id_image).await?;

    match &args.live_image {
        Some(path) => upload_into(screen.slot_mut(Role::Live), path).await?,
        None => {
            let captured = screen
                .slot_mut(Role::Live)
                .capture()
                .map_err(|e| anyhow::anyhow!("{}: {}", Role::Live.label(), e.log_context()))?;
            if captured.is_none() {
                anyhow::bail!("No camera frame available for {}", Role::Live.label());
            }
        }
    }

    let mut last_ok = false;
    for round in 1..=args.repeat.max(1) {
        if args.repeat > 1 {
            println!("── Submission {}/{} ──", round, args.repeat);
        }

        if screen.start_verification() != Started::Submitted {
            print_view(&screen);
            break;
        }
        print_view(&screen);

        let finished = tokio::select! {
            result = screen.finish_verification() => Some(result),
            _ = tokio::signal::ctrl_c() => None,
        };

        let Some(result) = finished.flatten() else {
            warn!("Interrupted, cancelling verification");
            screen.cancel();
            last_ok = false;
            break;
        };

        print_view(&screen);
        last_ok = result.is_success();
        if let Some(outcome) = result.outcome() {
            info!(
                "Verification {} (confidence {:.4})",
                if outcome.verified { "passed" } else { "did not match" },
                outcome.confidence
            );
        }

        if let (Some(dir), Some(faces)) = (&args.faces_dir, &screen.view().faces) {
            for path in save_faces(faces, dir)? {
                println!("Saved {}", path.display());
            }
        }
    }

    if let (Some(metrics), Some(output_path)) = (metrics, &args.metrics_output) {
        let metrics = metrics
            .lock()
            .map_err(|_| anyhow::anyhow!("metrics lock poisoned"))?;
        metrics.export_to_json(output_path)?;
        println!("Metrics exported to: {}", output_path);
    }

    Ok(if last_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    init_logger(if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });

    let mut config = match &args.config {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    };
    if let Some(base_url) = args.base_url {
        config.service.base_url = base_url;
    }

    match args.command {
        Command::Guide => {
            println!("{}", render_guide());
            Ok(ExitCode::SUCCESS)
        }
        Command::Submit(submit_args) => submit(config, submit_args).await,
    }
}
