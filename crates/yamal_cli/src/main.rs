//! Yamal CLI
//!
//! Command-line tools for yamal log files.
//!
//! # Commands
//!
//! - `inspect` - Display header state and record counts
//! - `tail` - Print framed records with their persistable offsets
//! - `announce` - Write a producer announcement
//! - `allocate` - Preallocate pages

mod commands;

use clap::{Parser, Subcommand};
use commands::LogOptions;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Yamal command-line log tools.
#[derive(Parser)]
#[command(name = "yamal")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the log file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Page size the log was created with
    #[arg(global = true, long, default_value_t = 8 * 1024 * 1024)]
    page_size: u64,

    /// Maximum page count the log was created with
    #[arg(global = true, long, default_value_t = 1024 * 64 * 8)]
    max_pages: usize,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display header state and record counts
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print framed records
    Tail {
        /// Maximum number of records to print
        #[arg(short, long)]
        limit: Option<usize>,

        /// Start from this offset (as printed by a previous tail)
        #[arg(long, default_value = "0")]
        from: u64,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Write a producer announcement
    Announce {
        /// Producer name
        name: String,
    },

    /// Preallocate pages
    Allocate {
        /// Number of pages, counted from the start of the file
        #[arg(long)]
        pages: usize,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let options = LogOptions {
        page_size: cli.page_size,
        max_pages: cli.max_pages,
    };

    match cli.command {
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Log path required for inspect")?;
            commands::inspect::run(&path, &options, &format)?;
        }
        Commands::Tail {
            limit,
            from,
            format,
        } => {
            let path = cli.path.ok_or("Log path required for tail")?;
            commands::tail::run(&path, &options, limit, from, &format)?;
        }
        Commands::Announce { name } => {
            let path = cli.path.ok_or("Log path required for announce")?;
            commands::announce::run(&path, &options, &name)?;
        }
        Commands::Allocate { pages } => {
            let path = cli.path.ok_or("Log path required for allocate")?;
            commands::allocate::run(&path, &options, pages)?;
        }
        Commands::Version => {
            println!("yamal CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("log signature {}", String::from_utf8_lossy(&yamal_core::SIGNATURE));
        }
    }

    Ok(())
}
