use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use snapdict::upload::classify_body;
use snapdict::{
    normalize, Acquire, CommandCamera, Config, ConfigError, ConfiguredPermissions,
    DeviceImageSource, FilePicker, PresentationRouter, Progress, Screen, Session,
    TerminalPresenter, UploadOutcome, Uploader,
};

#[derive(Debug, Parser)]
#[command(name = "snapdict", version, about = "Scan a photo and look up its complex words")]
struct Cli {
    /// Backend base URL, e.g. http://192.168.1.20:8000
    #[arg(long, env = "API_BASE_URL", global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Capture or pick a photo and upload it for processing
    Scan {
        /// Capture with the camera command instead of picking files
        #[arg(long, conflicts_with = "images")]
        camera: bool,

        /// Camera command line, shell-quoted; `{output}` is replaced with the capture path
        #[arg(long, env = "SNAPDICT_CAMERA_CMD")]
        camera_cmd: Option<String>,

        /// Deny access to picked files
        #[arg(long)]
        no_gallery: bool,

        /// Picked images; only the first is uploaded
        images: Vec<PathBuf>,

        #[command(flatten)]
        view: ViewArgs,
    },
    /// Render a saved process-image response without uploading
    Show {
        file: PathBuf,

        #[command(flatten)]
        view: ViewArgs,
    },
}

#[derive(Debug, Args)]
struct ViewArgs {
    /// Show the detail view for one word
    #[arg(long)]
    word: Option<String>,

    /// Print the normalized result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("could not write JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine; the environment may already be set.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "snapdict failed");
            eprintln!("snapdict: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, AppError> {
    match cli.command {
        Command::Scan {
            camera,
            camera_cmd,
            no_gallery,
            images,
            view,
        } => {
            let config = Config::new(cli.base_url.as_deref())?;
            let camera_picker = camera_cmd.as_deref().and_then(CommandCamera::parse);
            let permissions = ConfiguredPermissions {
                camera: camera_picker.is_some(),
                media_library: !no_gallery,
            };
            let mut source = DeviceImageSource::new(permissions).with_gallery(FilePicker::new(images));
            if let Some(picker) = camera_picker {
                source = source.with_camera(picker);
            }

            let uploader = Uploader::new(config.endpoint.clone(), config.timeout)?;
            let acquire = if camera { Acquire::Camera } else { Acquire::Gallery };
            tracing::info!(?acquire, endpoint = %config.endpoint, "starting scan");

            let outcome = Session::new()
                .scan(&source, acquire, &uploader, &progress_display())
                .await;
            if io::stderr().is_terminal() {
                eprintln!();
            }
            present(outcome, &view)
        }
        Command::Show { file, view } => {
            let body = tokio::fs::read(&file).await?;
            present(classify_body(&body), &view)
        }
    }
}

fn progress_display() -> Progress {
    if !io::stderr().is_terminal() {
        return Progress::silent();
    }
    Progress::new(|percent| {
        eprint!("\rUploading... {percent:>3}%");
    })
}

fn present(outcome: UploadOutcome, view: &ViewArgs) -> Result<ExitCode, AppError> {
    let failed = outcome.error_kind().is_some_and(|kind| !kind.is_cancelled());
    let mut stdout = io::stdout().lock();

    match outcome {
        UploadOutcome::Success(payload) if view.json => {
            serde_json::to_writer_pretty(&mut stdout, &normalize(payload))?;
            writeln!(stdout)?;
        }
        outcome => {
            let mut router = PresentationRouter::new(TerminalPresenter::new(&mut stdout));
            let screen = router.deliver(outcome)?;
            if let (Screen::Summary, Some(word)) = (screen, view.word.as_deref()) {
                router.show_detail(word)?;
            }
        }
    }

    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}
