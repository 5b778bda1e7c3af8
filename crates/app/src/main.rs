use std::{
    io,
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
};

use clap::{Parser, Subcommand};
use roblox_toolkit_core::{
    lookup::FriendLookup, web, AppConfig, FriendSource, FriendsFetcher, MontagePaths,
    MontageRenderer, RenderOutcome, ToolkitError,
};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { host, port } => run_serve(host, port),
        Commands::Lookup { user_id } => run_lookup(&user_id),
        Commands::Montage { dir } => run_montage(dir),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("❌ {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_serve(host: Option<String>, port: Option<u16>) -> roblox_toolkit_core::Result<ExitCode> {
    let mut config = AppConfig::from_env()?.server;
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    tracing::info!(address = %config.bind_address(), "starting friend lookup service");

    // The blocking HTTP client has to be built outside the async runtime.
    let source: Arc<dyn FriendSource> = Arc::new(FriendsFetcher::from_config(&config)?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(web::serve(&config, source))?;
    Ok(ExitCode::SUCCESS)
}

fn run_lookup(user_id: &str) -> roblox_toolkit_core::Result<ExitCode> {
    let config = AppConfig::from_env()?.server;
    let lookup = FriendLookup::new(FriendsFetcher::from_config(&config)?);

    let outcome = lookup.handle(user_id);
    for friend in &outcome.friends {
        println!("{}", web::page::friend_label(friend));
    }
    match outcome.error {
        Some(message) => {
            eprintln!("{message}");
            Ok(ExitCode::FAILURE)
        }
        None => Ok(ExitCode::SUCCESS),
    }
}

fn run_montage(dir: Option<PathBuf>) -> roblox_toolkit_core::Result<ExitCode> {
    let base = match dir {
        Some(dir) => dir,
        None => executable_dir()?,
    };
    tracing::info!(base = %base.display(), "running montage render");

    let config = AppConfig::default().montage;
    let paths = MontagePaths::in_dir(&base, &config);
    let renderer = MontageRenderer::new(paths, config.encoder);

    match renderer.render(&mut io::stdout().lock())? {
        RenderOutcome::Completed { .. } => Ok(ExitCode::SUCCESS),
        RenderOutcome::EncoderFailed { .. } => Ok(ExitCode::FAILURE),
    }
}

fn executable_dir() -> roblox_toolkit_core::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| ToolkitError::msg("cannot resolve the executable directory"))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Roblox friend lookup and montage helpers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the friend lookup web form.
    Serve {
        /// Address to bind.
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on. Defaults to `PORT` or 5000.
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Look up a user's friends once and print them.
    Lookup {
        /// Numeric Roblox user id.
        user_id: String,
    },
    /// Detect beats and render the montage with FFmpeg.
    Montage {
        /// Directory holding gameplay.mp4, audio.mp3 and filters_pro.txt.
        /// Defaults to the directory containing this executable.
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}
