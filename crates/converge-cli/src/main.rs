mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "converge",
    about = "Converge database client packages and repositories to their declared state",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .converge/)
    #[arg(long, global = true, env = "CONVERGE_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration for this host
    Init {
        /// Platform family: debian, rhel or other
        #[arg(long, default_value = "other")]
        platform: String,

        /// Database implementation: default, percona, mariadb or galera
        #[arg(long, default_value = "")]
        implementation: String,
    },

    /// Show the actions a pass would run, without running anything
    Plan {
        /// Treat a step as already processed (repeatable)
        #[arg(long = "step")]
        steps: Vec<String>,

        /// Ignore steps recorded by the previous run
        #[arg(long)]
        fresh: bool,
    },

    /// Run a full convergence pass
    ///
    /// Interrupting apply (Ctrl-C) ends the process together with the running
    /// command; no run record is written for that pass. Stopping cleanly
    /// between actions is only available to library callers via CancelFlag.
    Apply {
        /// Treat a step as already processed (repeatable)
        #[arg(long = "step")]
        steps: Vec<String>,

        /// Ignore steps recorded by the previous run
        #[arg(long)]
        fresh: bool,

        /// Per-action timeout in seconds (overrides config)
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Check the configuration for problems
    Validate,

    /// Show the record of the last apply
    Record,
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Apply { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init {
            platform,
            implementation,
        } => cmd::init::run(&root, &platform, &implementation, cli.json),
        Commands::Plan { steps, fresh } => cmd::plan::run(&root, &steps, fresh, cli.json),
        Commands::Apply {
            steps,
            fresh,
            timeout,
        } => cmd::apply::run(&root, &steps, fresh, timeout, cli.json),
        Commands::Validate => cmd::validate::run(&root, cli.json),
        Commands::Record => cmd::record::run(&root, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
