//! Inventory plugins shipped with controllerx
//!
//! - [`controllerx`]: live inventory from the Controller REST API
//! - [`script`]: a saved inventory script export read from disk
//!
//! Both run the same filter engine; only the snapshot source differs.

pub mod controllerx;
pub mod script;

pub use controllerx::ControllerxPlugin;
pub use script::ScriptFilePlugin;

use super::plugin::PluginOption;
use crate::config::{ENV_GROUPS_FILTER, ENV_HOSTGROUPS_FILTER, ENV_HOSTS_FILTER};
use crate::inventory::filter::{GROUPS_FILTER, HOSTGROUPS_FILTER, HOSTS_FILTER};

/// Documentation for the three filter options
pub fn filter_options() -> Vec<PluginOption> {
    vec![
        PluginOption::optional_string(
            HOSTS_FILTER,
            "Regular expression; keep only hosts whose name matches (unanchored).",
        )
        .with_env_var(ENV_HOSTS_FILTER),
        PluginOption::optional_string(
            HOSTGROUPS_FILTER,
            "Regular expression; keep only hosts that are direct members of a group whose name matches.",
        )
        .with_env_var(ENV_HOSTGROUPS_FILTER),
        PluginOption::optional_string(
            GROUPS_FILTER,
            "Regular expression; keep only groups whose name matches. Also gates hosts when hostgroups_filter is unset.",
        )
        .with_env_var(ENV_GROUPS_FILTER),
    ]
}
