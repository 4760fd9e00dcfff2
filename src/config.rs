//! Configuration for controllerx
//!
//! Options are resolved once, from several sources in decreasing priority:
//! - Command-line flags
//! - The YAML inventory source file (`plugin: controllerx`)
//! - Environment variables
//! - Defaults
//!
//! Filter patterns are compiled during resolution, so a bad regex stops the
//! run before the Controller is contacted.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::controller::{normalize_host, DEFAULT_TIMEOUT_SECS};
use crate::inventory::{FilterError, FilterSpec};

/// Value of the `plugin:` key in a source file
pub const PLUGIN_NAME: &str = "controllerx";

/// Inventory source meaning "read everything from the environment"
pub const ENV_SOURCE: &str = "@controllerx_inventory";

/// File name endings accepted as inventory sources
pub const SOURCE_SUFFIXES: [&str; 4] = [
    "controllerx.yml",
    "controllerx.yaml",
    "controllerx_inventory.yml",
    "controllerx_inventory.yaml",
];

pub const ENV_HOST: &str = "CONTROLLER_HOST";
pub const ENV_USERNAME: &str = "CONTROLLER_USERNAME";
pub const ENV_PASSWORD: &str = "CONTROLLER_PASSWORD";
pub const ENV_INVENTORY: &str = "CONTROLLER_INVENTORY";
pub const ENV_HOSTS_FILTER: &str = "HOSTS_FILTER";
pub const ENV_HOSTGROUPS_FILTER: &str = "HOSTGROUPS_FILTER";
pub const ENV_GROUPS_FILTER: &str = "GROUPS_FILTER";
pub const ENV_VERIFY_SSL: &str = "CONTROLLER_VERIFY_SSL";
pub const ENV_METADATA: &str = "METADATA_ENABLED";

/// Errors raised while resolving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("config file is not a controllerx inventory source (plugin: {found})")]
    WrongPlugin { found: String },

    #[error("'{0}' is not a controllerx inventory source")]
    UnsupportedSource(String),

    #[error("missing required option '{option}' (set it in the config file or via {env})")]
    MissingOption { option: String, env: String },

    #[error("invalid value '{value}' for option '{option}': expected {expected}")]
    InvalidValue {
        option: String,
        value: String,
        expected: String,
    },

    #[error(transparent)]
    InvalidFilter(#[from] FilterError),
}

impl ConfigError {
    fn missing(option: &str, env: &str) -> Self {
        ConfigError::MissingOption {
            option: option.to_string(),
            env: env.to_string(),
        }
    }

    fn invalid(option: &str, value: impl Into<String>, expected: &str) -> Self {
        ConfigError::InvalidValue {
            option: option.to_string(),
            value: value.into(),
            expected: expected.to_string(),
        }
    }

    /// Get a hint for resolving the error, when one is known.
    pub fn hint(&self) -> Option<String> {
        match self {
            ConfigError::UnsupportedSource(_) => Some(format!(
                "Use {} or a file whose name ends in {}",
                ENV_SOURCE,
                SOURCE_SUFFIXES.join(", ")
            )),
            ConfigError::WrongPlugin { .. } => {
                Some(format!("Add 'plugin: {}' to the config file", PLUGIN_NAME))
            }
            ConfigError::InvalidFilter(e) => Some(format!(
                "'{}' must be a valid regular expression; got '{}'",
                e.option, e.pattern
            )),
            ConfigError::InvalidValue { expected, .. } => Some(format!("Use {}", expected)),
            _ => None,
        }
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Where the plugin reads its options from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventorySource {
    /// Environment variables and CLI flags only
    Environment,
    /// A YAML config file
    File(PathBuf),
}

impl InventorySource {
    /// Classify an `-i` argument, rejecting anything this plugin cannot read.
    pub fn from_path(path: &str) -> ConfigResult<Self> {
        if path == ENV_SOURCE {
            return Ok(InventorySource::Environment);
        }
        if verify_source(path) {
            return Ok(InventorySource::File(PathBuf::from(path)));
        }
        Err(ConfigError::UnsupportedSource(path.to_string()))
    }
}

/// Returns true if `path` names a source this plugin accepts.
pub fn verify_source(path: &str) -> bool {
    if path == ENV_SOURCE {
        return true;
    }
    SOURCE_SUFFIXES.iter().any(|suffix| path.ends_with(suffix)) && Path::new(path).is_file()
}

/// Parse an Ansible-style boolean.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "t" | "on" | "1" => Some(true),
        "no" | "n" | "false" | "f" | "off" | "0" => Some(false),
        _ => None,
    }
}

const BOOL_EXPECTED: &str = "a boolean (yes/no, true/false, on/off, 1/0)";

/// Options as written in the YAML source file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub plugin: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Name or numeric ID; YAML may give either a string or an integer
    #[serde(default)]
    pub inventory_name: Option<serde_yaml::Value>,
    #[serde(default)]
    pub hosts_filter: Option<String>,
    #[serde(default)]
    pub hostgroups_filter: Option<String>,
    #[serde(default)]
    pub groups_filter: Option<String>,
    #[serde(default, alias = "verify_ssl")]
    pub validate_certs: Option<serde_yaml::Value>,
    #[serde(default)]
    pub include_metadata: Option<serde_yaml::Value>,

    /// Keys this plugin does not know
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl FileConfig {
    /// Load a source file from disk
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("loaded inventory source {}", path.display());
        Self::from_yaml(&content)
    }

    /// Parse a source file's contents
    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        let config: FileConfig = serde_yaml::from_str(content)?;

        match config.plugin.as_deref() {
            Some(PLUGIN_NAME) => {}
            other => {
                return Err(ConfigError::WrongPlugin {
                    found: other.unwrap_or("<missing>").to_string(),
                })
            }
        }

        for key in config.extra.keys() {
            warn!("ignoring unknown option '{}' in inventory source", key);
        }

        Ok(config)
    }

    fn inventory_name(&self) -> ConfigResult<Option<String>> {
        match &self.inventory_name {
            None | Some(serde_yaml::Value::Null) => Ok(None),
            Some(serde_yaml::Value::String(s)) => Ok(Some(s.clone())),
            Some(serde_yaml::Value::Number(n)) => Ok(Some(n.to_string())),
            Some(other) => Err(ConfigError::invalid(
                "inventory_name",
                yaml_excerpt(other),
                "a string or an integer",
            )),
        }
    }
}

fn yaml_bool(option: &str, value: &Option<serde_yaml::Value>) -> ConfigResult<Option<bool>> {
    match value {
        None | Some(serde_yaml::Value::Null) => Ok(None),
        Some(serde_yaml::Value::Bool(b)) => Ok(Some(*b)),
        Some(serde_yaml::Value::String(s)) => parse_bool(s)
            .map(Some)
            .ok_or_else(|| ConfigError::invalid(option, s.clone(), BOOL_EXPECTED)),
        Some(serde_yaml::Value::Number(n)) => parse_bool(&n.to_string())
            .map(Some)
            .ok_or_else(|| ConfigError::invalid(option, n.to_string(), BOOL_EXPECTED)),
        Some(other) => Err(ConfigError::invalid(option, yaml_excerpt(other), BOOL_EXPECTED)),
    }
}

fn yaml_excerpt(value: &serde_yaml::Value) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| "<unprintable>".to_string())
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub inventory_name: Option<String>,
    pub hosts_filter: Option<String>,
    pub hostgroups_filter: Option<String>,
    pub groups_filter: Option<String>,
    pub validate_certs: Option<bool>,
    pub include_metadata: Option<bool>,
}

/// Filter pattern strings after source resolution, before compilation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPatterns {
    pub hosts: Option<String>,
    pub hostgroups: Option<String>,
    pub groups: Option<String>,
}

impl FilterPatterns {
    /// Pick each pattern from the highest-priority source that sets it.
    pub fn resolve(
        file: &FileConfig,
        overrides: &ConfigOverrides,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Self {
        Self {
            hosts: pick(&overrides.hosts_filter, &file.hosts_filter, env, ENV_HOSTS_FILTER),
            hostgroups: pick(
                &overrides.hostgroups_filter,
                &file.hostgroups_filter,
                env,
                ENV_HOSTGROUPS_FILTER,
            ),
            groups: pick(&overrides.groups_filter, &file.groups_filter, env, ENV_GROUPS_FILTER),
        }
    }

    /// Compile into a filter spec.
    pub fn compile(&self) -> Result<FilterSpec, FilterError> {
        FilterSpec::new(
            self.hosts.as_deref(),
            self.hostgroups.as_deref(),
            self.groups.as_deref(),
        )
    }
}

fn pick(
    explicit: &Option<String>,
    file: &Option<String>,
    env: &dyn Fn(&str) -> Option<String>,
    env_name: &str,
) -> Option<String> {
    explicit
        .clone()
        .or_else(|| file.clone())
        .or_else(|| env(env_name))
}

fn pick_bool(
    option: &str,
    explicit: Option<bool>,
    file: &Option<serde_yaml::Value>,
    env: &dyn Fn(&str) -> Option<String>,
    env_name: &str,
) -> ConfigResult<Option<bool>> {
    if explicit.is_some() {
        return Ok(explicit);
    }
    if let Some(value) = yaml_bool(option, file)? {
        return Ok(Some(value));
    }
    match env(env_name) {
        Some(raw) => parse_bool(&raw)
            .map(Some)
            .ok_or_else(|| ConfigError::invalid(option, raw, BOOL_EXPECTED)),
        None => Ok(None),
    }
}

fn required(option: &str, value: Option<String>, env_name: &str) -> ConfigResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::missing(option, env_name)),
    }
}

fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Fully resolved plugin configuration
#[derive(Clone)]
pub struct ControllerConfig {
    /// Controller base URL, scheme included
    pub host: String,
    pub username: String,
    pub password: String,
    /// Inventory name or numeric ID
    pub inventory_name: String,
    pub filters: FilterSpec,
    pub validate_certs: bool,
    pub include_metadata: bool,
    pub timeout: Duration,
}

impl fmt::Debug for ControllerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("inventory_name", &self.inventory_name)
            .field("filters", &self.filters)
            .field("validate_certs", &self.validate_certs)
            .field("include_metadata", &self.include_metadata)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ControllerConfig {
    /// Load configuration for a source, reading the process environment
    pub fn load(source: &InventorySource, overrides: &ConfigOverrides) -> ConfigResult<Self> {
        let file = match source {
            InventorySource::File(path) => FileConfig::from_file(path)?,
            InventorySource::Environment => FileConfig::default(),
        };
        Self::resolve(&file, overrides, &process_env)
    }

    /// Resolve configuration from explicit sources.
    ///
    /// Filters are compiled before required options are checked.
    pub fn resolve(
        file: &FileConfig,
        overrides: &ConfigOverrides,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> ConfigResult<Self> {
        let filters = FilterPatterns::resolve(file, overrides, env).compile()?;

        let host = required("host", pick(&overrides.host, &file.host, env, ENV_HOST), ENV_HOST)?;
        let username = required(
            "username",
            pick(&overrides.username, &file.username, env, ENV_USERNAME),
            ENV_USERNAME,
        )?;
        let password = required(
            "password",
            pick(&overrides.password, &file.password, env, ENV_PASSWORD),
            ENV_PASSWORD,
        )?;
        let inventory_name = required(
            "inventory_name",
            pick(&overrides.inventory_name, &file.inventory_name()?, env, ENV_INVENTORY),
            ENV_INVENTORY,
        )?;

        let validate_certs = pick_bool(
            "validate_certs",
            overrides.validate_certs,
            &file.validate_certs,
            env,
            ENV_VERIFY_SSL,
        )?
        .unwrap_or(true);
        let include_metadata = pick_bool(
            "include_metadata",
            overrides.include_metadata,
            &file.include_metadata,
            env,
            ENV_METADATA,
        )?
        .unwrap_or(false);

        Ok(Self {
            host: normalize_host(&host),
            username,
            password,
            inventory_name: inventory_name.trim().to_string(),
            filters,
            validate_certs,
            include_metadata,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Resolve only the filter patterns, for offline sources.
    pub fn load_filters(
        source: &InventorySource,
        overrides: &ConfigOverrides,
    ) -> ConfigResult<FilterSpec> {
        let file = match source {
            InventorySource::File(path) => FileConfig::from_file(path)?,
            InventorySource::Environment => FileConfig::default(),
        };
        Ok(FilterPatterns::resolve(&file, overrides, &process_env).compile()?)
    }
}
