//! Inventory plugin interface.
//!
//! An inventory plugin turns some external source into an [`Inventory`].
//! The CLI only talks to plugins through [`InventoryPlugin`], so the
//! Controller-backed plugin and any offline source look the same to it.

use async_trait::async_trait;
use std::fmt;

use super::Inventory;
use crate::error::Result;

/// Common trait for dynamic inventory plugins
#[async_trait]
pub trait InventoryPlugin: Send + Sync + fmt::Debug {
    /// Get the plugin name
    fn name(&self) -> &str;

    /// Get the plugin version
    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    /// Get the plugin description
    fn description(&self) -> &str;

    /// Verify plugin configuration without touching the network
    fn verify(&self) -> Result<()>;

    /// Fetch, filter and return the inventory
    async fn parse(&self) -> Result<Inventory>;

    /// Get plugin-specific options documentation
    fn options_documentation(&self) -> Vec<PluginOption>;
}

/// Documentation for a plugin option
#[derive(Debug, Clone)]
pub struct PluginOption {
    /// Option name
    pub name: String,
    /// Option description
    pub description: String,
    /// Whether the option is required
    pub required: bool,
    /// Default value (if any)
    pub default: Option<String>,
    /// Option type
    pub option_type: PluginOptionType,
    /// Environment variable alternative
    pub env_var: Option<String>,
    /// Other accepted spellings of the option name
    pub aliases: Vec<String>,
}

impl PluginOption {
    /// Create a new required string option
    pub fn required_string(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            required: true,
            default: None,
            option_type: PluginOptionType::String,
            env_var: None,
            aliases: Vec::new(),
        }
    }

    /// Create a new optional string option without a default
    pub fn optional_string(name: &str, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required_string(name, description)
        }
    }

    /// Create a new optional boolean option
    pub fn optional_bool(name: &str, description: &str, default: bool) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            required: false,
            default: Some(default.to_string()),
            option_type: PluginOptionType::Bool,
            env_var: None,
            aliases: Vec::new(),
        }
    }

    /// Set environment variable alternative
    pub fn with_env_var(mut self, env_var: &str) -> Self {
        self.env_var = Some(env_var.to_string());
        self
    }

    /// Add an alternative option name
    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }
}

impl fmt::Display for PluginOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}", self.name, self.option_type)?;
        if self.required {
            write!(f, ", required")?;
        }
        if let Some(default) = &self.default {
            write!(f, ", default: {}", default)?;
        }
        writeln!(f, ")")?;
        writeln!(f, "    {}", self.description)?;
        if !self.aliases.is_empty() {
            writeln!(f, "    aliases: {}", self.aliases.join(", "))?;
        }
        if let Some(env) = &self.env_var {
            writeln!(f, "    env: {}", env)?;
        }
        Ok(())
    }
}

/// Type of plugin option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginOptionType {
    /// String value
    String,
    /// Boolean value
    Bool,
}

impl fmt::Display for PluginOptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginOptionType::String => write!(f, "string"),
            PluginOptionType::Bool => write!(f, "bool"),
        }
    }
}
