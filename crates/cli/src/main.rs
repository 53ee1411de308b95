mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use relkit_lib::platform::paths::{default_user, update_root};
use relkit_lib::server::Pointer;

use crate::output::OutputFormat;

/// relkit - content-addressed release staging for update servers
#[derive(Parser)]
#[command(name = "relkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Update-server root (defaults to $RELKIT_ROOT)
  #[arg(long, global = true)]
  root: Option<PathBuf>,

  /// User recorded in pointer logs (defaults to $RELKIT_USER, then the login name)
  #[arg(long, global = true)]
  user: Option<String>,

  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Install a built release into the server root and stage it
  Install {
    /// Release directory containing release.spec
    source: PathBuf,

    /// Run only one install step
    #[arg(long, value_enum)]
    step: Option<InstallStep>,
  },

  /// Point staging at an already installed build
  Stage {
    build_id: String,

    /// Notes recorded in the staging log
    #[arg(long, default_value = "")]
    notes: String,
  },

  /// Point release at the current staging build
  Release {
    /// Notes recorded in the release log
    #[arg(long, default_value = "")]
    notes: String,
  },

  /// Show the staged and released builds
  Status {
    #[arg(short, long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Show a pointer's transition log
  Log {
    /// staging or release
    pointer: Pointer,

    #[arg(short, long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Write MANIFEST.* files and release.spec for a release directory
  Generate {
    release_dir: PathBuf,

    /// Build id written to the Build field
    #[arg(long)]
    build: String,

    /// Extra spec header field (KEY=VALUE), in order
    #[arg(long = "field", value_name = "KEY=VALUE")]
    fields: Vec<String>,

    /// Component to scan (NAME or NAME=SUBDIR); defaults to one component named after the directory
    #[arg(long = "component", value_name = "NAME[=SUBDIR]")]
    components: Vec<String>,
  },

  /// Upload a release directory to a remote server and install it there
  Push {
    release_dir: PathBuf,

    /// Remote host
    #[arg(long)]
    server: String,

    /// Remote ssh user
    #[arg(long)]
    ssh_user: Option<String>,

    /// Remote directory to upload into
    #[arg(long)]
    remote_dir: String,

    /// rsync exclude pattern
    #[arg(long)]
    exclude: Vec<String>,
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InstallStep {
  ManifestDir,
  Pool,
  Stage,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let root = cli.root.unwrap_or_else(update_root);
  let user = cli.user.unwrap_or_else(default_user);

  match cli.command {
    Commands::Install { source, step } => cmd::cmd_install(&source, &root, &user, step),
    Commands::Stage { build_id, notes } => cmd::cmd_stage(&root, &user, &build_id, &notes),
    Commands::Release { notes } => cmd::cmd_release(&root, &user, &notes),
    Commands::Status { output } => cmd::cmd_status(&root, &user, output),
    Commands::Log { pointer, output } => cmd::cmd_log(&root, &user, pointer, output),
    Commands::Generate {
      release_dir,
      build,
      fields,
      components,
    } => cmd::cmd_generate(&release_dir, &build, &fields, &components),
    Commands::Push {
      release_dir,
      server,
      ssh_user,
      remote_dir,
      exclude,
    } => cmd::cmd_push(&release_dir, &server, ssh_user, &remote_dir, &exclude, &user),
  }
}
