//! Offline inventory plugin reading a saved script export
//!
//! Takes the JSON body of `/api/v2/inventories/<id>/script/` from a file, so
//! filters can be tried without a reachable Controller.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

use super::filter_options;
use crate::config::ConfigError;
use crate::error::Result;
use crate::inventory::plugin::{InventoryPlugin, PluginOption};
use crate::inventory::{build_inventory, FilterSpec, Inventory, InventoryError, Snapshot};

/// Inventory plugin reading a script export from disk
#[derive(Debug, Clone)]
pub struct ScriptFilePlugin {
    path: PathBuf,
    filters: FilterSpec,
}

impl ScriptFilePlugin {
    pub fn new(path: impl Into<PathBuf>, filters: FilterSpec) -> Self {
        Self {
            path: path.into(),
            filters,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the export into an unfiltered snapshot.
    pub async fn load_snapshot(&self) -> Result<Snapshot> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| ConfigError::Io {
                path: self.path.clone(),
                source,
            })?;
        let document: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
            InventoryError::MalformedSnapshot(format!("{}: {}", self.path.display(), e))
        })?;
        Ok(Snapshot::from_script(&document)?)
    }
}

#[async_trait]
impl InventoryPlugin for ScriptFilePlugin {
    fn name(&self) -> &str {
        "script_file"
    }

    fn description(&self) -> &str {
        "Saved Controller inventory script export"
    }

    fn verify(&self) -> Result<()> {
        std::fs::metadata(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(())
    }

    async fn parse(&self) -> Result<Inventory> {
        info!("reading inventory script from {}", self.path.display());
        let snapshot = self.load_snapshot().await?;
        Ok(build_inventory(&snapshot, &self.filters)?)
    }

    fn options_documentation(&self) -> Vec<PluginOption> {
        filter_options()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use std::io::Write;

    fn script_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_parse_filters_script() {
        let file = script_file(
            r#"{
                "_meta": {"hostvars": {"web1": {}, "db1": {}}},
                "web": {"hosts": ["web1"]},
                "db": {"hosts": ["db1"]}
            }"#,
        );
        let filters = FilterSpec::new(None, None, Some("^web$")).unwrap();
        let plugin = ScriptFilePlugin::new(file.path(), filters);

        plugin.verify().unwrap();
        let inventory = plugin.parse().await.unwrap();
        assert_eq!(inventory.host_count(), 1);
        assert!(inventory.get_host("web1").is_some());
        assert!(inventory.get_group("db").is_none());
    }

    #[tokio::test]
    async fn test_invalid_json_is_ingestion_error() {
        let file = script_file("{not json");
        let plugin = ScriptFilePlugin::new(file.path(), FilterSpec::default());
        let err = plugin.parse().await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Ingestion);
    }

    #[test]
    fn test_missing_file_fails_verify() {
        let plugin = ScriptFilePlugin::new("/nonexistent/script.json", FilterSpec::default());
        let err = plugin.verify().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }
}
