use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use flickr_archive::archive::{Archiver, EXIT_FATAL};
use flickr_archive::config::Config;
use flickr_archive::faults::FaultCategory;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Turn a Flickr data export into a browsable offline archive"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize with a default config file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,

        /// Path to config file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Build the archive: derivatives, album directories and the site
    Build {
        /// Path to config file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Read and link the export without writing anything
    Status {
        /// Path to config file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Root of the unpacked export
        #[arg(short, long, value_name = "DIR")]
        input: Option<PathBuf>,
    },
}

/// Command-line values that take precedence over the config file
#[derive(Args, Debug, Default)]
struct Overrides {
    /// Root of the unpacked export
    #[arg(short, long, value_name = "DIR")]
    input: Option<PathBuf>,

    /// Where to write the archive
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Longer edge of thumbnails, in pixels
    #[arg(long, value_name = "PIXELS")]
    thumbnail_size: Option<u32>,

    /// Longer edge of display images, in pixels
    #[arg(long, value_name = "PIXELS")]
    display_size: Option<u32>,

    /// Image worker threads
    #[arg(short, long, value_name = "N")]
    workers: Option<usize>,
}

impl Overrides {
    fn apply(&self, config: &mut Config) {
        if let Some(ref input) = self.input {
            config.input_dir = input.display().to_string();
        }
        if let Some(ref output) = self.output {
            config.out_dir = output.display().to_string();
        }
        if let Some(size) = self.thumbnail_size {
            config.thumbnail_size = size;
        }
        if let Some(size) = self.display_size {
            config.display_size = size;
        }
        if let Some(workers) = self.workers {
            config.workers = Some(workers);
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(Some(env_logger::fmt::TimestampPrecision::Seconds))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

async fn run(cli: Cli) -> Result<u8> {
    match cli.command {
        Commands::Init { force, config } => {
            init_config(&config, force)?;
            Ok(0)
        }
        Commands::Build { config, overrides } => {
            let mut config_data = load_config(&config)?;
            overrides.apply(&mut config_data);

            println!("Building archive...");
            println!("Export: {}", config_data.input_dir);
            println!("Output directory: {}", config_data.out_dir);

            let stop = Arc::new(AtomicBool::new(false));
            let signal_stop = Arc::clone(&stop);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received, finishing images in progress");
                    signal_stop.store(true, Ordering::Relaxed);
                }
            });

            let archiver = Archiver::new(config_data);
            let summary = tokio::task::spawn_blocking(move || archiver.run(&stop))
                .await
                .context("Archive task failed")??;

            println!("{summary}");
            Ok(summary.outcome.exit_code())
        }
        Commands::Status { config, input } => {
            let mut config_data = load_config(&config)?;
            if let Some(input) = input {
                config_data.input_dir = input.display().to_string();
            }

            println!("flickr-archive Status");
            println!("=====================");
            println!("Configuration:");
            println!("  JSON directory: {}", config_data.json_path().display());
            println!("  Images directory: {}", config_data.images_path().display());
            println!("  Output directory: {}", config_data.out_dir);
            println!(
                "  Sizes: thumbnails {}px, display {}px",
                config_data.thumbnail_size, config_data.display_size
            );

            let archiver = Archiver::new(config_data);
            let inspection = archiver.inspect()?;
            let graph = &inspection.graph;

            println!("Export:");
            println!("  JSON files read: {}", inspection.files_read);
            println!("  Photos: {}", graph.photo_count());
            println!("  Albums: {}", graph.album_count());
            println!("  Comments: {}", graph.comment_count());
            println!("  Tags: {}", graph.tags().len());
            println!("  Photos in no album: {}", graph.unsorted_photos().len());

            let faults = inspection.faults.faults();
            let summary = inspection.faults.summary();
            println!(
                "Record faults: {}",
                summary.category_count(FaultCategory::Record)
            );
            for fault in faults
                .iter()
                .filter(|f| f.kind.category() == FaultCategory::Record)
            {
                println!("  {fault}");
            }

            Ok(0)
        }
    }
}

fn init_config(config_path_opt: &Option<PathBuf>, force: bool) -> Result<()> {
    let config_path = Config::get_config_path(config_path_opt);

    if config_path.exists() && !force {
        println!("Config file already exists at {}", config_path.display());
        println!("Use --force to overwrite");
        return Ok(());
    }

    let config = Config::default();
    config
        .save_to_file(&config_path)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    println!("Created config file at {}", config_path.display());
    Ok(())
}

/// Loads the config file; the default file may be absent, a named one may not
fn load_config(config_path_opt: &Option<PathBuf>) -> Result<Config> {
    let config_path = Config::get_config_path(config_path_opt);

    if !config_path.exists() {
        if config_path_opt.is_some() {
            anyhow::bail!(
                "Config file not found at {}. Run 'flickr-archive init' to create one.",
                config_path.display()
            );
        }
        info!(
            "No config file at {}, using defaults",
            config_path.display()
        );
        return Ok(Config::default());
    }

    Config::load_from_file(&config_path)
}
