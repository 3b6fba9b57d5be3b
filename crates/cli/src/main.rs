use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;
mod output;

use output::{OutputFormat, print_error};

/// relaybuild - build relay implementations and record what was built
#[derive(Parser)]
#[command(name = "relaybuild")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Path to relaybuild.toml (default: $RELAYBUILD_CONFIG, then search upward)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Enable debug logging on stderr
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build an implementation's images and write its provenance record
  Build(BuildArgs),

  /// List configured implementations and their targets
  List {
    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Show the last provenance record of an implementation
  Last {
    /// Implementation name
    implementation: String,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },
}

#[derive(Args, Debug)]
pub struct BuildArgs {
  /// Implementation name
  pub implementation: String,

  /// Branch, tag or commit to build (default: the implementation's default ref)
  #[arg(long = "ref", value_name = "REF")]
  pub git_ref: Option<String>,

  /// Build from an existing local tree instead of cloning
  #[arg(long, value_name = "PATH")]
  pub local: Option<PathBuf>,

  /// Override the repository URL
  #[arg(long, value_name = "URL")]
  pub repo: Option<String>,

  /// Build only this target
  #[arg(long, value_name = "NAME")]
  pub target: Option<String>,
}

fn init_logging(verbose: bool) {
  let default_level = if verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  let config = cli.config.as_deref();
  let result = match cli.command {
    Commands::Build(args) => cmd::cmd_build(config, args),
    Commands::List { output } => cmd::cmd_list(config, output),
    Commands::Last { implementation, output } => cmd::cmd_last(config, &implementation, output),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_error(&format!("{:#}", err));
      ExitCode::FAILURE
    }
  }
}
