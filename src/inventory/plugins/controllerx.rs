//! Controller-backed inventory plugin
//!
//! Resolves the configured inventory on the Controller, downloads its script
//! export (and optionally server metadata), then filters it.
//!
//! ```yaml
//! plugin: controllerx
//! host: controller.example.com
//! username: admin
//! password: secret
//! inventory_name: Production
//! hostgroups_filter: '^web'
//! include_metadata: true
//! ```

use async_trait::async_trait;
use tracing::info;

use super::filter_options;
use crate::config::{
    ConfigOverrides, ControllerConfig, InventorySource, ENV_HOST, ENV_INVENTORY, ENV_METADATA,
    ENV_PASSWORD, ENV_USERNAME, ENV_VERIFY_SSL, PLUGIN_NAME,
};
use crate::controller::ControllerClient;
use crate::error::Result;
use crate::inventory::plugin::{InventoryPlugin, PluginOption};
use crate::inventory::{build_inventory, Inventory, Snapshot};

/// Inventory plugin reading from the Controller REST API
#[derive(Debug, Clone)]
pub struct ControllerxPlugin {
    config: ControllerConfig,
}

impl ControllerxPlugin {
    /// Create a plugin from resolved configuration
    pub fn new(config: ControllerConfig) -> Self {
        Self { config }
    }

    /// Resolve configuration for a source and create the plugin
    pub fn from_source(source: &InventorySource, overrides: &ConfigOverrides) -> Result<Self> {
        Ok(Self::new(ControllerConfig::load(source, overrides)?))
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Download the unfiltered snapshot for the configured inventory.
    pub async fn fetch_snapshot(&self) -> Result<Snapshot> {
        let client = ControllerClient::new(&self.config)?;
        info!(
            "fetching inventory '{}' from {}",
            self.config.inventory_name,
            client.base_url()
        );

        let inventory_id = client
            .resolve_inventory_id(&self.config.inventory_name)
            .await?;
        let script = client.fetch_script(&inventory_id).await?;
        let mut snapshot = Snapshot::from_script(&script)?;

        if self.config.include_metadata {
            let metadata = client.fetch_metadata().await?;
            snapshot.metadata = Some(metadata.with_inventory_id(inventory_id));
        }

        Ok(snapshot)
    }

    /// Documentation for every option this plugin reads
    pub fn options() -> Vec<PluginOption> {
        let mut options = vec![
            PluginOption::required_string(
                "plugin",
                "Token that ensures this is a source file for the controllerx plugin.",
            ),
            PluginOption::required_string(
                "host",
                "Controller URL; https:// is assumed when no scheme is given.",
            )
            .with_env_var(ENV_HOST),
            PluginOption::required_string("username", "Controller user name (basic auth).")
                .with_env_var(ENV_USERNAME),
            PluginOption::required_string("password", "Controller password (basic auth).")
                .with_env_var(ENV_PASSWORD),
            PluginOption::required_string(
                "inventory_name",
                "Name of the Controller inventory, or its numeric ID.",
            )
            .with_env_var(ENV_INVENTORY),
        ];
        options.extend(filter_options());
        options.push(
            PluginOption::optional_bool(
                "validate_certs",
                "Verify the Controller's TLS certificate.",
                true,
            )
            .with_alias("verify_ssl")
            .with_env_var(ENV_VERIFY_SSL),
        );
        options.push(
            PluginOption::optional_bool(
                "include_metadata",
                "Add Controller details as 'controller_metadata' on the all group.",
                false,
            )
            .with_env_var(ENV_METADATA),
        );
        options
    }
}

#[async_trait]
impl InventoryPlugin for ControllerxPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn description(&self) -> &str {
        "Ansible Controller inventory with regex host and group filtering"
    }

    fn verify(&self) -> Result<()> {
        ControllerClient::new(&self.config)?;
        Ok(())
    }

    async fn parse(&self) -> Result<Inventory> {
        let snapshot = self.fetch_snapshot().await?;
        Ok(build_inventory(&snapshot, &self.config.filters)?)
    }

    fn options_documentation(&self) -> Vec<PluginOption> {
        Self::options()
    }
}
