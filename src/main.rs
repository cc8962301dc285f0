use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pdftrans::config::Settings;
use pdftrans::logging;
use pdftrans::ui::UiMode;
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "pdftrans")]
#[command(version, about = "Translate PDF documents with live progress")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the config file. Defaults to $PDFTRANS_CONFIG, then the platform config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// UI output mode: full, minimal, json
    #[arg(long, default_value = "full", global = true)]
    pub ui: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate a PDF and follow its progress
    Translate(TranslateArgs),
    /// Run a captured translator log through the progress engine
    Replay {
        /// Log file to read, or `-` for stdin
        #[arg(default_value = "-")]
        log_file: String,

        /// Treat the log as ending with this exit code
        #[arg(long)]
        exit_code: Option<i32>,
    },
    /// View or initialize configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct TranslateArgs {
    /// The PDF to translate
    pub input: PathBuf,

    /// Where to write the translated PDFs (defaults to the input's directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Translation service passed to the tool
    #[arg(short, long)]
    pub service: Option<String>,

    /// Source language
    #[arg(long)]
    pub lang_in: Option<String>,

    /// Target language
    #[arg(long)]
    pub lang_out: Option<String>,

    /// Open the translated PDF when done
    #[arg(long)]
    pub open: bool,
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the config file location
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = Settings::resolve_path(cli.config.as_deref());
    let loaded = Settings::load_or_default(&config_path);

    let log_settings = loaded
        .as_ref()
        .map(|s| s.logging.clone())
        .unwrap_or_default();
    let _log_guard = logging::init(&log_settings, cli.verbose)?;

    let mode = UiMode::parse(&cli.ui);

    match cli.command {
        Commands::Config { command } => {
            cmd::cmd_config(&config_path, loaded, command)?;
        }
        Commands::Translate(args) => {
            let settings = loaded
                .with_context(|| format!("Failed to load {}", config_path.display()))?;
            cmd::cmd_translate(&settings, &args, mode).await?;
        }
        Commands::Replay {
            log_file,
            exit_code,
        } => {
            let settings = loaded
                .with_context(|| format!("Failed to load {}", config_path.display()))?;
            cmd::cmd_replay(&settings, &log_file, exit_code, mode)?;
        }
    }

    Ok(())
}
