//! DoubleFinder CLI - 列出 OpenCL 设备及其双精度支持

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod doctor_cmd;
mod list_cmd;

#[derive(Parser)]
#[command(name = "doublefinder")]
#[command(about = "List OpenCL devices and whether they support double precision", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List compute devices (default)
    List(list_cmd::ListArgs),
    /// Check the OpenCL installation
    Doctor,
    /// Initialize configuration
    Init {
        /// Configuration file path
        #[arg(short, long, default_value = "~/.doublefinder/config.json")]
        config: String,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Show version info
    Version,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "doublefinder=debug,info"
    } else {
        "doublefinder=info,warn"
    };

    // 日志写到 stderr，stdout 只保留表格或 JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command.unwrap_or(Commands::List(list_cmd::ListArgs::default())) {
        Commands::List(args) => {
            list_cmd::run(args).await?;
        }
        Commands::Doctor => {
            doctor_cmd::run(cli.verbose).await?;
        }
        Commands::Init { config, force } => {
            commands::init::run(&config, force).await?;
        }
        Commands::Version => {
            println!("DoubleFinder {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
