//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use turbo_commerce::actions::CartActions;
use turbo_commerce::bigcommerce::{BigCommercePromotionCatalog, ManagementClient, StorefrontClient};
use turbo_commerce::reconcile::GiftReconciler;

use crate::config::{TurboConfig, CONFIG_FILE_NAMES};
use crate::output::Output;

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration, environment overrides applied.
    pub config: TurboConfig,
    /// Where the configuration came from, if a file was found.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

/// Platform clients wired together from the configuration.
pub struct Services {
    pub catalog: Arc<BigCommercePromotionCatalog>,
    pub reconciler: Arc<GiftReconciler>,
    pub actions: CartActions,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, config_path) = if let Some(path) = config_path {
            (TurboConfig::load(path)?, Some(PathBuf::from(path)))
        } else {
            // Try to find config in current directory or parent directories
            match Self::find_config(&cwd) {
                Some((config, path)) => (config, Some(path)),
                None => (TurboConfig::default(), None),
            }
        };

        let config = config.with_env_overrides()?;

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Find config file in directory tree.
    fn find_config(start: &Path) -> Option<(TurboConfig, PathBuf)> {
        let mut current = start.to_path_buf();
        loop {
            for name in &CONFIG_FILE_NAMES {
                let config_path = current.join(name);
                if config_path.exists() {
                    if let Ok(config) = TurboConfig::load(config_path.to_str()?) {
                        return Some((config, config_path));
                    }
                }
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Build the platform clients. Fails when the store is not configured.
    pub fn services(&self) -> Result<Services> {
        let bigcommerce = &self.config.bigcommerce;
        bigcommerce
            .validate()
            .context("BigCommerce is not configured; see `turbo config init`")?;

        let management = ManagementClient::new(bigcommerce);
        let storefront = Arc::new(StorefrontClient::new(bigcommerce, management.clone()));
        let catalog = Arc::new(BigCommercePromotionCatalog::new(management));

        let reconciler = Arc::new(
            GiftReconciler::new(storefront.clone(), storefront.clone(), catalog.clone())
                .with_config(self.config.reconciler),
        );
        let actions = CartActions::new(storefront.clone(), storefront, reconciler.clone());

        Ok(Services {
            catalog,
            reconciler,
            actions,
        })
    }
}
