//! Treeshake CLI - scope-aware dead binding elimination for ES modules

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "treeshake")]
#[command(version)]
#[command(about = "Remove unreferenced declarations from an ES module graph")]
#[command(long_about = r#"
Treeshake follows the imports of an entry module, works out which
top-level and nested declarations are never referenced, and writes a
pruned copy of every module into a sibling directory.

Example usage:
  treeshake shake src/index.js
  treeshake shake src/index.js --out-dir dist --jobs 4 --format json
  treeshake graph src/index.js
  treeshake init
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true, default_value = "treeshake.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prune the module graph and write the results
    Shake {
        /// Entry module
        entry: PathBuf,

        /// Directory created next to each module for its output
        #[arg(short, long)]
        out_dir: Option<String>,

        /// Number of writer threads
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Report what would be written without writing
        #[arg(long)]
        dry_run: bool,

        /// Skip dependencies that fail to load instead of aborting
        #[arg(short, long)]
        keep_going: bool,
    },

    /// Print the module tree with import liveness
    Graph {
        /// Entry module
        entry: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Write a default config file
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

/// How results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn from_format(format: &str) -> anyhow::Result<Self> {
        match format {
            "text" => Ok(OutputMode::Human),
            "json" => Ok(OutputMode::Json),
            other => anyhow::bail!("unknown format '{}' (expected text or json)", other),
        }
    }

    /// Human output that `TREESHAKE_QUIET` has not silenced
    pub fn is_human(self) -> bool {
        self == OutputMode::Human && !treeshake::output::is_quiet()
    }
}

/// Print a JSON envelope for a finished command
pub fn emit_success(mode: OutputMode, command: &str, data: serde_json::Value) -> anyhow::Result<()> {
    if mode == OutputMode::Json {
        let envelope = serde_json::json!({
            "ok": true,
            "command": command,
            "data": data,
        });
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Shake {
            entry,
            out_dir,
            jobs,
            format,
            dry_run,
            keep_going,
        } => {
            let mode = OutputMode::from_format(&format)?;
            let mut config = treeshake::config::load_config(Some(&cli.config))?.unwrap_or_default();
            if let Some(out_dir) = out_dir {
                config.output.dir_name = out_dir;
            }
            if let Some(jobs) = jobs {
                config.jobs = jobs;
            }
            config.keep_going |= keep_going;
            commands::run_shake(&entry, &config, dry_run, mode)
        }

        Commands::Graph { entry, format } => {
            let mode = OutputMode::from_format(&format)?;
            let config = treeshake::config::load_config(Some(&cli.config))?.unwrap_or_default();
            commands::run_graph(&entry, &config, mode)
        }

        Commands::Init { force } => commands::run_init(&cli.config, force),
    }
}
