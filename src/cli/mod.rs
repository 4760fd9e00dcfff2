//! CLI module for controllerx
//!
//! The interface mirrors `ansible-inventory`: `--list`, `--host`, `--graph`,
//! plus flags overriding every plugin option.

pub mod output;

use clap::{ArgGroup, Parser};
use std::path::PathBuf;

use controllerx::config::{parse_bool, ConfigOverrides};
use controllerx::inventory::ALL_GROUP;

/// controllerx - Ansible Controller dynamic inventory
///
/// Fetches an inventory from an Ansible Controller and filters its hosts and
/// groups with regular expressions.
#[derive(Parser, Debug, Clone)]
#[command(name = "controllerx")]
#[command(author, version)]
#[command(
    about = "Ansible Controller dynamic inventory with regex host and group filtering",
    long_about = None
)]
#[command(group(ArgGroup::new("action").args(["list", "host", "graph", "doc"])))]
pub struct Cli {
    /// Inventory source: @controllerx_inventory or a *controllerx.yml file
    #[arg(short = 'i', long, value_name = "SOURCE")]
    pub inventory: Option<String>,

    /// Output the whole inventory (default action)
    #[arg(long)]
    pub list: bool,

    /// Output the merged variables of one host
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Draw the group tree from GROUP (default: all)
    #[arg(long, value_name = "GROUP", num_args = 0..=1, default_missing_value = ALL_GROUP)]
    pub graph: Option<String>,

    /// Print the plugin option documentation
    #[arg(long)]
    pub doc: bool,

    /// Render --list output as YAML instead of JSON
    #[arg(short = 'y', long)]
    pub yaml: bool,

    /// Read a saved inventory script export instead of calling the Controller
    #[arg(long, value_name = "PATH")]
    pub script_file: Option<PathBuf>,

    /// Controller URL (overrides `host`)
    #[arg(long = "controller-host", value_name = "URL")]
    pub controller_host: Option<String>,

    /// Controller user name
    #[arg(long, value_name = "USER")]
    pub username: Option<String>,

    /// Controller password
    #[arg(long, value_name = "PASSWORD")]
    pub password: Option<String>,

    /// Controller inventory name or numeric ID
    #[arg(long, value_name = "NAME")]
    pub inventory_name: Option<String>,

    /// Keep only hosts whose name matches
    #[arg(long, value_name = "REGEX")]
    pub hosts_filter: Option<String>,

    /// Keep only hosts that belong to a group whose name matches
    #[arg(long, value_name = "REGEX")]
    pub hostgroups_filter: Option<String>,

    /// Keep only groups whose name matches
    #[arg(long, value_name = "REGEX")]
    pub groups_filter: Option<String>,

    /// Verify the Controller's TLS certificate
    #[arg(long, value_name = "BOOL", value_parser = parse_bool_arg)]
    pub validate_certs: Option<bool>,

    /// Attach Controller metadata to the all group
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = parse_bool_arg
    )]
    pub include_metadata: Option<bool>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// What the run should print
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    List,
    Host(String),
    Graph(String),
    Doc,
}

fn parse_bool_arg(value: &str) -> Result<bool, String> {
    parse_bool(value).ok_or_else(|| format!("expected a boolean (yes/no, true/false), got '{}'", value))
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }

    /// The requested action; `--list` when none is given
    pub fn action(&self) -> Action {
        if self.doc {
            Action::Doc
        } else if let Some(host) = &self.host {
            Action::Host(host.clone())
        } else if let Some(group) = &self.graph {
            Action::Graph(group.clone())
        } else {
            Action::List
        }
    }

    /// Plugin options given on the command line
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.controller_host.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            inventory_name: self.inventory_name.clone(),
            hosts_filter: self.hosts_filter.clone(),
            hostgroups_filter: self.hostgroups_filter.clone(),
            groups_filter: self.groups_filter.clone(),
            validate_certs: self.validate_certs,
            include_metadata: self.include_metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_action_is_list() {
        let cli = Cli::try_parse_from(["controllerx"]).unwrap();
        assert_eq!(cli.action(), Action::List);
    }

    #[test]
    fn test_graph_defaults_to_all() {
        let cli = Cli::try_parse_from(["controllerx", "--graph"]).unwrap();
        assert_eq!(cli.action(), Action::Graph("all".to_string()));

        let cli = Cli::try_parse_from(["controllerx", "--graph", "web"]).unwrap();
        assert_eq!(cli.action(), Action::Graph("web".to_string()));
    }

    #[test]
    fn test_actions_conflict() {
        assert!(Cli::try_parse_from(["controllerx", "--list", "--host", "web1"]).is_err());
    }

    #[test]
    fn test_verbosity() {
        let cli = Cli::try_parse_from(["controllerx", "-vvvvv"]).unwrap();
        assert_eq!(cli.verbosity(), 3);
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::try_parse_from([
            "controllerx",
            "--controller-host",
            "controller.local",
            "--hosts-filter",
            "^web",
            "--validate-certs",
            "no",
            "--include-metadata",
        ])
        .unwrap();
        let overrides = cli.overrides();
        assert_eq!(overrides.host.as_deref(), Some("controller.local"));
        assert_eq!(overrides.hosts_filter.as_deref(), Some("^web"));
        assert_eq!(overrides.validate_certs, Some(false));
        assert_eq!(overrides.include_metadata, Some(true));
    }

    #[test]
    fn test_bad_bool_flag() {
        assert!(Cli::try_parse_from(["controllerx", "--validate-certs", "maybe"]).is_err());
    }
}
