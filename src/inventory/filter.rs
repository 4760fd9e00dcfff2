//! Regex filtering of the inventory graph.
//!
//! Three independent patterns narrow an ingested inventory:
//!
//! - `groups_filter` keeps groups whose name matches
//! - `hostgroups_filter` picks the groups whose direct members are eligible hosts
//! - `hosts_filter` keeps hosts whose name matches
//!
//! When `hostgroups_filter` is unset the retained groups double as the host
//! gate; with neither group pattern set every host is eligible. Patterns are
//! unanchored, an empty pattern counts as unset, and the structural groups
//! (`all`, `ungrouped`) are never filtered and never gate hosts.

use regex::Regex;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

use super::group::{is_reserved_name, Group, ALL_GROUP};
use super::host::Host;
use super::Inventory;

/// Option names as they appear in configuration
pub const HOSTS_FILTER: &str = "hosts_filter";
pub const HOSTGROUPS_FILTER: &str = "hostgroups_filter";
pub const GROUPS_FILTER: &str = "groups_filter";

/// A filter pattern failed to compile
#[derive(Debug, Error)]
#[error("invalid regular expression for '{option}': {source}")]
pub struct FilterError {
    pub option: &'static str,
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// Which hosts may survive filtering, independent of their own name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostGate {
    /// No group pattern is set
    Open,
    /// Hosts must be a direct member of one of these groups
    Groups(BTreeSet<String>),
}

impl HostGate {
    /// Returns true if the host passes the gate.
    pub fn admits(&self, host: &Host) -> bool {
        match self {
            HostGate::Open => true,
            HostGate::Groups(groups) => host.groups.iter().any(|g| groups.contains(g)),
        }
    }
}

/// Compiled filter patterns
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    hosts: Option<Regex>,
    hostgroups: Option<Regex>,
    groups: Option<Regex>,
}

impl FilterSpec {
    /// Compile the three patterns. `None` or an empty string leaves a
    /// pattern unset.
    pub fn new(
        hosts: Option<&str>,
        hostgroups: Option<&str>,
        groups: Option<&str>,
    ) -> Result<Self, FilterError> {
        Ok(Self {
            hosts: compile(HOSTS_FILTER, hosts)?,
            hostgroups: compile(HOSTGROUPS_FILTER, hostgroups)?,
            groups: compile(GROUPS_FILTER, groups)?,
        })
    }

    /// Returns true when no pattern is set and filtering is a no-op.
    pub fn is_identity(&self) -> bool {
        self.hosts.is_none() && self.hostgroups.is_none() && self.groups.is_none()
    }

    pub fn hosts_pattern(&self) -> Option<&str> {
        self.hosts.as_ref().map(Regex::as_str)
    }

    pub fn hostgroups_pattern(&self) -> Option<&str> {
        self.hostgroups.as_ref().map(Regex::as_str)
    }

    pub fn groups_pattern(&self) -> Option<&str> {
        self.groups.as_ref().map(Regex::as_str)
    }

    /// Returns true if a real group survives `groups_filter`.
    pub fn retains_group(&self, name: &str) -> bool {
        !is_reserved_name(name) && pattern_matches(&self.groups, name)
    }

    /// Compute the host gate for an inventory.
    ///
    /// `hostgroups_filter` is evaluated against every real group, not only
    /// the ones `groups_filter` keeps.
    pub fn host_gate(&self, inventory: &Inventory) -> HostGate {
        match self.hostgroups.as_ref().or(self.groups.as_ref()) {
            Some(re) => HostGate::Groups(
                inventory
                    .real_groups()
                    .filter(|g| re.is_match(&g.name))
                    .map(|g| g.name.clone())
                    .collect(),
            ),
            None => HostGate::Open,
        }
    }

    /// Returns true if a host survives filtering under the given gate.
    pub fn retains_host(&self, host: &Host, gate: &HostGate) -> bool {
        pattern_matches(&self.hosts, &host.name) && gate.admits(host)
    }

    /// Produce the filtered inventory.
    ///
    /// Retained groups keep their variables and the edges whose other end
    /// also survived; retained hosts keep their variables unchanged. Groups
    /// left empty by filtering are kept. The structural groups are rebuilt
    /// from scratch.
    pub fn apply(&self, inventory: &Inventory) -> Inventory {
        let gate = self.host_gate(inventory);

        let kept_groups: BTreeSet<&str> = inventory
            .real_groups()
            .filter(|g| self.retains_group(&g.name))
            .map(|g| g.name.as_str())
            .collect();
        let kept_hosts: BTreeSet<&str> = inventory
            .hosts()
            .filter(|h| self.retains_host(h, &gate))
            .map(|h| h.name.as_str())
            .collect();

        debug!(
            "filter kept {} of {} groups and {} of {} hosts",
            kept_groups.len(),
            inventory.real_groups().count(),
            kept_hosts.len(),
            inventory.host_count()
        );

        let mut filtered = Inventory::new();
        if let Some(root) = inventory.get_group(ALL_GROUP) {
            let mut all = Group::all();
            all.merge_vars(&root.vars);
            filtered.add_group(all);
        }

        for name in &kept_groups {
            let Some(source) = inventory.get_group(name) else {
                continue;
            };
            let mut group = Group::new(*name);
            group.merge_vars(&source.vars);
            group.children = source
                .children
                .iter()
                .filter(|c| kept_groups.contains(c.as_str()))
                .cloned()
                .collect();
            group.hosts = source
                .hosts
                .iter()
                .filter(|h| kept_hosts.contains(h.as_str()))
                .cloned()
                .collect();
            filtered.add_group(group);
        }

        for name in &kept_hosts {
            let Some(source) = inventory.get_host(name) else {
                continue;
            };
            let mut host = Host::with_vars(*name, source.vars.clone());
            host.groups = source
                .groups
                .iter()
                .filter(|g| kept_groups.contains(g.as_str()))
                .cloned()
                .collect();
            filtered.add_host(host);
        }

        filtered.reconcile();
        filtered
    }
}

fn compile(option: &'static str, pattern: Option<&str>) -> Result<Option<Regex>, FilterError> {
    match pattern {
        None => Ok(None),
        Some(p) if p.is_empty() => Ok(None),
        Some(p) => Regex::new(p).map(Some).map_err(|source| FilterError {
            option,
            pattern: p.to_string(),
            source,
        }),
    }
}

fn pattern_matches(pattern: &Option<Regex>, name: &str) -> bool {
    pattern.as_ref().map_or(true, |re| re.is_match(name))
}
