//! CLI entry point for marksite

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "marksite")]
#[command(version)]
#[command(about = "A static site builder for markdown content with per-page templating", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new site
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Create a new content file
    New {
        /// Title of the new file
        title: String,

        /// Directory under the content root
        #[arg(long, default_value = "posts")]
        dir: String,

        /// Mark the file as a draft
        #[arg(long)]
        draft: bool,
    },

    /// Build the site
    #[command(alias = "b")]
    Build,

    /// Remove the output directory
    Clean,

    /// List content items under a prefix, newest first
    List {
        /// Source path prefix (defaults to the content directory)
        prefix: Option<String>,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "marksite=debug,info"
    } else {
        "marksite=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing site in {:?}", target_dir);
            marksite::commands::init::init_site(&target_dir)?;
            println!("Initialized site in {:?}", target_dir);
        }

        Commands::New { title, dir, draft } => {
            let site = marksite::Site::new(&base_dir)?;
            tracing::info!("Creating new file with title: {}", title);
            let path = marksite::commands::new::create_post(&site, &title, &dir, draft)?;
            println!("Created: {:?}", path);
        }

        Commands::Build => {
            let site = marksite::Site::new(&base_dir)?;
            let report = site.build()?;
            println!(
                "Built successfully: {} pages rendered, {} drafts skipped, {} assets copied",
                report.rendered, report.scan.drafts, report.assets.copied
            );
            let failed = report.scan.failed + report.assets.failed;
            if failed > 0 {
                println!("{} files skipped with errors, see the log above", failed);
            }
        }

        Commands::Clean => {
            let site = marksite::Site::new(&base_dir)?;
            tracing::info!("Cleaning output folder...");
            site.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List { prefix } => {
            let site = marksite::Site::new(&base_dir)?;
            marksite::commands::list::run(&site, prefix.as_deref())?;
        }

        Commands::Version => {
            println!("marksite version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
