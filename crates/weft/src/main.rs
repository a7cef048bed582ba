//! weft CLI - Main entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod diagnostic;

use config::{Config, Overrides};

#[derive(Parser)]
#[command(name = "weft")]
#[command(version)]
#[command(
    about = "Fill XHTML templates from view models, snippets and merged documents",
    long_about = None
)]
struct Cli {
    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./weft.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Deepest element nesting to descend into
    #[arg(long, global = true)]
    max_depth: Option<usize>,

    /// Start the output with an XML declaration
    #[arg(long, global = true)]
    xml_declaration: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a template with a view model, snippets and assets
    Render {
        /// Template file
        template: PathBuf,

        /// JSON view model
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Directory of snippets to splice in by id
        #[arg(short, long)]
        snippets: Option<PathBuf>,

        /// Stylesheet or script reference (ID=URL)
        #[arg(short, long = "asset")]
        assets: Vec<String>,

        /// Write output to FILE
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Merge documents into a target at matching ids
    Merge {
        /// Target document
        target: PathBuf,

        /// Part files or directories
        #[arg(required = true)]
        parts: Vec<PathBuf>,

        /// Write output to FILE
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Apply a directory of snippets to a template
    Snippets {
        /// Template file
        template: PathBuf,

        /// Snippet directory
        dir: PathBuf,

        /// List the snippet ids instead of applying them
        #[arg(long)]
        list: bool,

        /// Write output to FILE
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the nodes matching an XPath expression or CSS selector
    Select {
        /// Document to query
        file: PathBuf,

        /// XPath expression (CSS selector with --css)
        query: String,

        /// Treat the query as a CSS selector
        #[arg(long)]
        css: bool,

        /// Write output to FILE
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check that files are well-formed
    Check {
        /// Files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Only report failures
        #[arg(short, long)]
        quiet: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose { "weft=debug" } else { "weft=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load(cli.config.as_deref())?.with_overrides(Overrides {
        max_depth: cli.max_depth,
        xml_declaration: cli.xml_declaration,
    });

    match cli.command {
        Commands::Render {
            template,
            model,
            snippets,
            assets,
            output,
        } => commands::render::execute(
            commands::render::RenderArgs {
                template,
                model,
                snippets,
                assets,
                output,
            },
            &config,
        ),
        Commands::Merge {
            target,
            parts,
            output,
        } => commands::merge::execute(
            commands::merge::MergeArgs {
                target,
                parts,
                output,
            },
            &config,
        ),
        Commands::Snippets {
            template,
            dir,
            list,
            output,
        } => commands::snippets::execute(
            commands::snippets::SnippetsArgs {
                template,
                dir,
                list,
                output,
            },
            &config,
        ),
        Commands::Select {
            file,
            query,
            css,
            output,
        } => commands::select::execute(
            commands::select::SelectArgs {
                file,
                query,
                css,
                output,
            },
            &config,
        ),
        Commands::Check { files, quiet } => {
            commands::check::execute(commands::check::CheckArgs { files, quiet })
        }
    }
}
