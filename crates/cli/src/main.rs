use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;
mod output;

use output::OutputFormat;

/// sanmatrix - experiment matrix for memory-safety instrumentation
#[derive(Parser)]
#[command(name = "sanmatrix")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Matrix manifest (TOML). Without it the built-in FloatZone matrix is used.
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// List registered variants and targets
  List {
    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Resolve every variant x target pair into a build configuration
  Plan {
    /// Only include this variant
    #[arg(long)]
    variant: Option<String>,

    /// Only include this benchmark suite
    #[arg(long)]
    target: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Print the runtime environment a variant applies before running
  Env {
    /// Variant name, e.g. asan_O2
    variant: String,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let config = cli.config.as_deref();
  match cli.command {
    Commands::List { output } => cmd::cmd_list(config, output),
    Commands::Plan {
      variant,
      target,
      output,
    } => cmd::cmd_plan(config, variant.as_deref(), target.as_deref(), cli.verbose, output),
    Commands::Env { variant } => cmd::cmd_env(config, &variant),
  }
}
