//! Config command - manage the CLI configuration file.

use anyhow::{bail, Result};

use super::{ConfigArgs, ConfigCommand};
use crate::config::{generate_default_config, mask_secret};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show(ctx),
        ConfigCommand::Init { store_hash, force } => init(ctx, &store_hash, force),
        ConfigCommand::Validate => validate(ctx),
    }
}

fn show(ctx: &Context) -> Result<()> {
    let output = &ctx.output;
    let config = ctx.config.redacted();

    if output.is_json() {
        output.json(&config);
        return Ok(());
    }

    output.header("Configuration");
    match &ctx.config_path {
        Some(path) => output.kv("File", &path.display().to_string()),
        None => output.kv("File", "(none, using defaults)"),
    }

    let bigcommerce = &config.bigcommerce;
    output.kv("Store hash", &bigcommerce.store_hash);
    output.kv("Access token", &bigcommerce.access_token);
    output.kv("Channel", &bigcommerce.channel_id.to_string());
    output.kv("Management API", &bigcommerce.management_base_url());
    output.kv("Storefront GraphQL", &bigcommerce.storefront_graphql_url());
    output.kv(
        "Storefront token TTL",
        &format!("{}s", bigcommerce.storefront_token_ttl_secs),
    );
    output.kv(
        "Call timeout",
        &format!("{}ms", config.reconciler.call_timeout.as_millis()),
    );
    output.kv("Log level", &format!("{:?}", config.logging.level));

    Ok(())
}

fn init(ctx: &Context, store_hash: &str, force: bool) -> Result<()> {
    let output = &ctx.output;
    let path = ctx.cwd.join("turbo.toml");

    if path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            path.display()
        );
    }

    std::fs::write(&path, generate_default_config(store_hash))?;
    output.success(&format!("Created {}", path.display()));
    output.info("Set BIGCOMMERCE_ACCESS_TOKEN before running commands against the store");

    Ok(())
}

fn validate(ctx: &Context) -> Result<()> {
    let output = &ctx.output;
    let config = &ctx.config;

    if let Err(e) = config.bigcommerce.validate() {
        bail!("Invalid configuration: {}", e);
    }
    if config.reconciler.call_timeout.is_zero() {
        bail!("Invalid configuration: reconciler.call_timeout must be greater than zero");
    }

    output.success("Configuration is valid");
    output.kv("Store hash", &config.bigcommerce.store_hash);
    output.kv("Access token", &mask_secret(&config.bigcommerce.access_token));

    Ok(())
}
