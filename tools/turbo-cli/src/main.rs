//! Turbo CLI - Operator tool for free-gift promotions.
//!
//! Commands:
//! - `turbo promotions` - Show the gift promotions that apply to a product
//! - `turbo reconcile` - Run a gift reconciliation pass on a cart
//! - `turbo remove-item` - Remove a line item and reconcile gifts
//! - `turbo config` - Manage configuration

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use turbo_observability::{init_logging, LogFormat, LogLevel};

use commands::{ConfigArgs, PromotionsArgs, ReconcileArgs, RemoveItemArgs};

/// Turbo CLI - Inspect and reconcile free-gift promotions
#[derive(Parser)]
#[command(name = "turbo")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Debug-level human logs and extra detail
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    /// Path to turbo.toml or turbo.json
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show gift promotions for a paid product
    Promotions(PromotionsArgs),

    /// Run a gift reconciliation pass on a cart
    Reconcile(ReconcileArgs),

    /// Remove a line item, then reconcile gifts
    RemoveItem(RemoveItemArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let output = output::Output::new(cli.verbose, cli.json);
    let ctx = context::Context::load(cli.config.as_deref(), output)?;

    let mut logging = ctx.config.logging.clone();
    if cli.verbose {
        logging = logging.with_level(LogLevel::Debug).with_format(LogFormat::Human);
    }
    if let Err(e) = init_logging(&logging) {
        ctx.output.warn(&format!("Logging disabled: {}", e));
    }

    let result = match cli.command {
        Commands::Promotions(args) => commands::promotions::run(args, &ctx).await,
        Commands::Reconcile(args) => commands::reconcile::run(args, &ctx).await,
        Commands::RemoveItem(args) => commands::remove_item::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
