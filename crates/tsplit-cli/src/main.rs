use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "tsplit",
    about = "Split Go tests across multiple nodes by recorded duration",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Balance tests across nodes and generate one script per node.
    ///
    /// Packages are read from stdin, one per line, unless --scan-packages
    /// is given. Flags after `--` are passed to every test binary.
    Split(commands::split::SplitArgs),
    /// Write a tsplit.toml with the default settings
    Init {
        /// Directory to write tsplit.toml into
        #[arg(short, long, default_value = ".")]
        path: String,
        /// Overwrite an existing tsplit.toml
        #[arg(long)]
        force: bool,
    },
}

/// Filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "info,tsplit=info";

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so `--format json` output stays parseable.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Split(args) => commands::split::split(args).await,
        Commands::Init { path, force } => commands::init::init(&path, force),
    }
}
