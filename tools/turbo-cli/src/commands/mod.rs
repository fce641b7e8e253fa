//! CLI command implementations.

pub mod config;
pub mod promotions;
pub mod reconcile;
pub mod remove_item;

use clap::{Args, Subcommand};

/// Arguments for the promotions command.
#[derive(Args)]
pub struct PromotionsArgs {
    /// Paid product ID.
    pub product_id: u64,
}

/// Arguments for the reconcile command.
#[derive(Args)]
pub struct ReconcileArgs {
    /// Cart ID.
    pub cart_id: String,
}

/// Arguments for the remove-item command.
#[derive(Args)]
pub struct RemoveItemArgs {
    /// Cart ID.
    pub cart_id: String,

    /// Line item ID to remove.
    pub line_item_id: String,

    /// Skip confirmation prompt.
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// Store hash to write into the file.
        #[arg(long, default_value = "")]
        store_hash: String,

        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file.
    Validate,
}
