use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use shashin::{
    Config,
    gallery::{Gallery, GalleryError},
    startup_checks,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Global options that apply to all commands
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Overrides `app.log_level` from the config file
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan the photos tree, create missing thumbnails and print a summary (default)
    Scan,

    /// Print all albums as JSON
    Albums,

    /// Print the photos of one album as JSON
    Photos {
        /// Album id; the empty string is the root album
        album: String,
    },

    /// Print the filesystem path behind a photo or its thumbnail
    Resolve {
        album: String,
        filename: String,

        /// Resolve the thumbnail instead of the original
        #[arg(long)]
        thumbnail: bool,
    },
}

#[derive(Serialize)]
struct ScanSummary {
    mode: shashin::gallery::GalleryMode,
    albums: usize,
    photos: usize,
    cached: usize,
    created: usize,
    failed: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = Config::load_or_default(&cli.config)?;

    // Set up logging first; RUST_LOG wins over the configured level
    let log_level = cli.log_level.as_deref().unwrap_or(config.app.log_level.as_str());
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting {}", config.app.name);
    info!("Configuration loaded from: {:?}", cli.config);
    info!("Photos directory: {:?}", config.gallery.photos_root);
    info!("Thumbnails directory: {:?}", config.gallery.thumbnails_root);

    if let Err(errors) = startup_checks::perform_startup_checks(&config).await {
        for error in &errors {
            tracing::error!("Startup check failed: {}", error);
        }
        if errors.iter().any(|e| e.is_critical()) {
            tracing::error!("Critical startup check failed, exiting");
            return Err("Critical startup check failed".into());
        }
        tracing::warn!("Non-critical startup checks failed, continuing");
    }

    let gallery = Gallery::initialize(config.gallery.clone()).await;

    match cli.command.unwrap_or(Commands::Scan) {
        Commands::Scan => {
            let model = gallery.snapshot().await;
            let stats = model.stats();
            print_json(&ScanSummary {
                mode: model.mode(),
                albums: stats.albums,
                photos: stats.photos,
                cached: stats.cached,
                created: stats.created,
                failed: stats.failed,
            })?;
        }
        Commands::Albums => print_json(&gallery.list_albums().await?)?,
        Commands::Photos { album } => match gallery.list_photos(&album).await {
            Ok(photos) => print_json(&photos)?,
            Err(e) => return not_found(e),
        },
        Commands::Resolve {
            album,
            filename,
            thumbnail,
        } => {
            let resolved = if thumbnail {
                gallery.resolve_thumbnail(&album, &filename).await
            } else {
                gallery.resolve_photo(&album, &filename).await
            };
            match resolved {
                Ok(path) => println!("{}", path.display()),
                Err(e) => return not_found(e),
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn not_found(e: GalleryError) -> Result<(), Box<dyn std::error::Error>> {
    if e.is_not_found() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Err(e.into())
}
