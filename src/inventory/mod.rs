//! Inventory graph for controllerx.
//!
//! This module turns a Controller [`Snapshot`] into a consistent host/group
//! graph, filters it with a [`FilterSpec`], and keeps the structural groups
//! (`all`, `ungrouped`) reconciled with the real ones:
//! - ingestion drops malformed records with a warning and rejects records
//!   that would corrupt the graph (conflicting duplicates, nesting cycles)
//! - every host/group edge is stored on both endpoints
//! - variable resolution for a single host follows the group hierarchy

pub mod export;
pub mod filter;
pub mod group;
pub mod host;
pub mod plugin;
pub mod plugins;
pub mod snapshot;

pub use filter::{FilterError, FilterSpec, HostGate};
pub use group::{
    is_reserved_name, Group, GroupHierarchy, ALL_GROUP, META_KEY, UNGROUPED_GROUP,
};
pub use host::Host;
pub use plugin::{InventoryPlugin, PluginOption, PluginOptionType};
pub use snapshot::{ControllerMetadata, GroupRecord, HostRecord, Snapshot};

use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Variable mapping attached to hosts and groups. Values are opaque.
pub type Vars = IndexMap<String, serde_json::Value>;

/// Key under which Controller metadata is stored in the `all` group vars
pub const METADATA_VAR: &str = "controller_metadata";

/// Errors that can occur during inventory operations
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("malformed inventory snapshot: {0}")]
    MalformedSnapshot(String),

    #[error("duplicate host '{0}' with conflicting variables")]
    DuplicateHost(String),

    #[error("duplicate group '{0}' with conflicting variables")]
    DuplicateGroup(String),

    #[error("circular group dependency detected: {0}")]
    CircularDependency(String),

    #[error("inventory graph is inconsistent: '{from}' references missing or unlinked '{to}'")]
    DanglingEdge { from: String, to: String },

    #[error("host not found: {0}")]
    HostNotFound(String),

    #[error("group not found: {0}")]
    GroupNotFound(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl InventoryError {
    /// Returns true if this error means the graph broke its own invariants.
    pub fn is_consistency_violation(&self) -> bool {
        matches!(self, InventoryError::DanglingEdge { .. })
    }
}

/// Result type for inventory operations
pub type InventoryResult<T> = Result<T, InventoryError>;

/// The main inventory structure holding all hosts and groups
#[derive(Debug, Clone)]
pub struct Inventory {
    /// All hosts indexed by name
    hosts: BTreeMap<String, Host>,

    /// All groups indexed by name, including `all` and `ungrouped`
    groups: BTreeMap<String, Group>,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

impl Inventory {
    /// Create a new empty inventory with default groups
    pub fn new() -> Self {
        let mut inventory = Self {
            hosts: BTreeMap::new(),
            groups: BTreeMap::new(),
        };

        inventory.groups.insert(ALL_GROUP.to_string(), Group::all());
        inventory
            .groups
            .insert(UNGROUPED_GROUP.to_string(), Group::ungrouped());
        inventory.reconcile();

        inventory
    }

    /// Build the unfiltered graph from a snapshot.
    ///
    /// Records without a name and edges pointing at unknown entities are
    /// dropped with a warning. Duplicate records are merged only when their
    /// variables agree; a disagreement, or a group nesting cycle, fails the
    /// whole ingestion.
    pub fn from_snapshot(snapshot: &Snapshot) -> InventoryResult<Self> {
        let mut inventory = Self::new();

        if let Some(all) = inventory.groups.get_mut(ALL_GROUP) {
            all.merge_vars(&snapshot.root_vars);
        }

        for record in &snapshot.hosts {
            let name = record.name.as_str();
            if name.trim().is_empty() {
                warn!("dropping host record without a name");
                continue;
            }

            match inventory.hosts.get(name) {
                Some(existing) if existing.vars != record.vars => {
                    return Err(InventoryError::DuplicateHost(name.to_string()));
                }
                Some(_) => debug!("merging duplicate record for host '{}'", name),
                None => {
                    inventory
                        .hosts
                        .insert(name.to_string(), Host::with_vars(name, record.vars.clone()));
                }
            }
        }

        let mut accepted: Vec<&GroupRecord> = Vec::with_capacity(snapshot.groups.len());
        for record in &snapshot.groups {
            let name = record.name.as_str();
            if name.trim().is_empty() {
                warn!("dropping group record without a name");
                continue;
            }
            if is_reserved_name(name) {
                warn!("dropping group record using reserved name '{}'", name);
                continue;
            }

            match inventory.groups.get(name) {
                Some(existing) if existing.vars != record.vars => {
                    return Err(InventoryError::DuplicateGroup(name.to_string()));
                }
                Some(_) => debug!("merging duplicate record for group '{}'", name),
                None => {
                    let mut group = Group::new(name);
                    group.merge_vars(&record.vars);
                    inventory.groups.insert(name.to_string(), group);
                }
            }
            accepted.push(record);
        }

        for record in accepted {
            let group_name = record.name.as_str();

            for host_name in &record.hosts {
                match inventory.hosts.get_mut(host_name) {
                    Some(host) => {
                        host.add_to_group(group_name);
                        if let Some(group) = inventory.groups.get_mut(group_name) {
                            group.add_host(host_name.clone());
                        }
                    }
                    None => warn!(
                        "group '{}' references unknown host '{}'; dropping membership",
                        group_name, host_name
                    ),
                }
            }

            for child_name in &record.children {
                if child_name == group_name {
                    return Err(InventoryError::CircularDependency(format!(
                        "{} -> {}",
                        group_name, child_name
                    )));
                }
                let known = !is_reserved_name(child_name) && inventory.groups.contains_key(child_name);
                if !known {
                    warn!(
                        "group '{}' references unknown child group '{}'; dropping edge",
                        group_name, child_name
                    );
                    continue;
                }
                if let Some(group) = inventory.groups.get_mut(group_name) {
                    group.add_child(child_name.clone());
                }
            }
        }

        inventory.detect_cycles()?;

        if let Some(metadata) = &snapshot.metadata {
            let value = serde_json::to_value(metadata)?;
            if let Some(all) = inventory.groups.get_mut(ALL_GROUP) {
                all.set_var(METADATA_VAR, value);
            }
        }

        inventory.reconcile();
        debug!(
            "ingested {} hosts and {} groups",
            inventory.host_count(),
            inventory.group_count()
        );

        Ok(inventory)
    }

    /// Recompute parent links and the structural `all`/`ungrouped` groups.
    ///
    /// Groups without a parent hang off `all`; hosts outside every real
    /// group land in `ungrouped`.
    pub fn reconcile(&mut self) {
        if let Some(all) = self.groups.get_mut(ALL_GROUP) {
            all.hosts.clear();
            all.children.clear();
        }
        if let Some(ungrouped) = self.groups.get_mut(UNGROUPED_GROUP) {
            ungrouped.hosts.clear();
            ungrouped.children.clear();
        }
        for host in self.hosts.values_mut() {
            host.remove_from_group(UNGROUPED_GROUP);
        }

        self.compute_group_parents();

        let top_level: Vec<String> = self
            .groups
            .values()
            .filter(|g| g.name != ALL_GROUP && g.parents.is_empty())
            .map(|g| g.name.clone())
            .collect();

        let ungrouped_hosts: Vec<String> = self
            .hosts
            .values()
            .filter(|h| h.is_ungrouped())
            .map(|h| h.name.clone())
            .collect();

        for name in &ungrouped_hosts {
            if let Some(host) = self.hosts.get_mut(name) {
                host.add_to_group(UNGROUPED_GROUP);
            }
        }
        if let Some(ungrouped) = self.groups.get_mut(UNGROUPED_GROUP) {
            ungrouped.hosts.extend(ungrouped_hosts);
        }
        if let Some(all) = self.groups.get_mut(ALL_GROUP) {
            all.children.extend(top_level.iter().cloned());
        }
        for name in top_level {
            if let Some(group) = self.groups.get_mut(&name) {
                group.add_parent(ALL_GROUP);
            }
        }
    }

    /// Compute parent group relationships from children
    fn compute_group_parents(&mut self) {
        for group in self.groups.values_mut() {
            group.parents.clear();
        }

        let children_map: Vec<(String, Vec<String>)> = self
            .groups
            .iter()
            .map(|(name, group)| (name.clone(), group.children.iter().cloned().collect()))
            .collect();

        for (parent_name, children) in children_map {
            for child_name in children {
                if let Some(child) = self.groups.get_mut(&child_name) {
                    child.add_parent(parent_name.clone());
                }
            }
        }
    }

    /// Reject nesting cycles among the real groups.
    ///
    /// Depth-first over `children` with an explicit stack, so arbitrarily
    /// deep nesting is walked without recursion.
    fn detect_cycles(&self) -> InventoryResult<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        let mut marks: HashMap<&str, Mark> = HashMap::new();
        for root in self.groups.keys().map(String::as_str) {
            if is_reserved_name(root) || marks.contains_key(root) {
                continue;
            }

            // Each frame is a group on the current path and its unvisited children
            let mut path: Vec<(&str, Vec<&str>)> = vec![(root, self.child_names(root))];
            marks.insert(root, Mark::Visiting);

            while let Some((name, pending)) = path.last_mut() {
                let name = *name;
                let Some(child) = pending.pop() else {
                    marks.insert(name, Mark::Done);
                    path.pop();
                    continue;
                };

                match marks.get(child) {
                    Some(Mark::Done) => {}
                    Some(Mark::Visiting) => {
                        let start = path.iter().position(|(n, _)| *n == child).unwrap_or(0);
                        let mut cycle: Vec<&str> = path[start..].iter().map(|(n, _)| *n).collect();
                        cycle.push(child);
                        return Err(InventoryError::CircularDependency(cycle.join(" -> ")));
                    }
                    None => {
                        marks.insert(child, Mark::Visiting);
                        path.push((child, self.child_names(child)));
                    }
                }
            }
        }
        Ok(())
    }

    /// Child group names in reverse order, ready to be popped in order.
    fn child_names(&self, name: &str) -> Vec<&str> {
        self.groups
            .get(name)
            .map(|g| g.children.iter().rev().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Longest path from a group up to a parentless group.
    ///
    /// Memoized in `cache` and computed with an explicit stack. A parent
    /// already being expanded is skipped, so a cycle cannot loop forever.
    fn group_depth<'a>(&'a self, start: &'a str, cache: &mut HashMap<&'a str, usize>) -> usize {
        let mut expanding: BTreeSet<&str> = BTreeSet::new();
        let mut stack: Vec<&str> = vec![start];

        while let Some(&name) = stack.last() {
            if cache.contains_key(name) {
                stack.pop();
                continue;
            }
            let parents: Vec<&str> = self
                .groups
                .get(name)
                .map(|g| g.parents.iter().map(String::as_str).collect())
                .unwrap_or_default();

            let unresolved: Vec<&str> = if expanding.insert(name) {
                parents
                    .iter()
                    .copied()
                    .filter(|p| !cache.contains_key(p) && !expanding.contains(p))
                    .collect()
            } else {
                Vec::new()
            };

            if unresolved.is_empty() {
                let depth = parents
                    .iter()
                    .filter_map(|p| cache.get(p))
                    .map(|d| d + 1)
                    .max()
                    .unwrap_or(0);
                cache.insert(name, depth);
                expanding.remove(name);
                stack.pop();
            } else {
                stack.extend(unresolved);
            }
        }

        cache.get(start).copied().unwrap_or(0)
    }

    /// Verify that every edge is present on both of its endpoints.
    pub fn check_consistency(&self) -> InventoryResult<()> {
        let dangling = |from: &str, to: &str| InventoryError::DanglingEdge {
            from: from.to_string(),
            to: to.to_string(),
        };

        for group in self.groups.values() {
            for host_name in &group.hosts {
                let linked = self
                    .hosts
                    .get(host_name)
                    .is_some_and(|h| h.in_group(&group.name));
                if !linked {
                    return Err(dangling(&group.name, host_name));
                }
            }
            for child_name in &group.children {
                let linked = self
                    .groups
                    .get(child_name)
                    .is_some_and(|c| c.parents.contains(&group.name));
                if !linked {
                    return Err(dangling(&group.name, child_name));
                }
            }
            for parent_name in &group.parents {
                let linked = self
                    .groups
                    .get(parent_name)
                    .is_some_and(|p| p.has_child(&group.name));
                if !linked {
                    return Err(dangling(&group.name, parent_name));
                }
            }
        }

        for host in self.hosts.values() {
            for group_name in &host.groups {
                let linked = self
                    .groups
                    .get(group_name)
                    .is_some_and(|g| g.has_host(&host.name));
                if !linked {
                    return Err(dangling(&host.name, group_name));
                }
            }
        }

        Ok(())
    }

    /// Add a host to the inventory
    pub fn add_host(&mut self, host: Host) {
        let name = host.name.clone();
        for group_name in &host.groups {
            if let Some(group) = self.groups.get_mut(group_name) {
                group.add_host(name.clone());
            }
        }
        self.hosts.insert(name, host);
    }

    /// Add a group to the inventory
    pub fn add_group(&mut self, group: Group) {
        let name = group.name.clone();
        self.groups.insert(name, group);
    }

    /// Get a host by name
    pub fn get_host(&self, name: &str) -> Option<&Host> {
        self.hosts.get(name)
    }

    /// Get a group by name
    pub fn get_group(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    /// Get all hosts
    pub fn hosts(&self) -> impl Iterator<Item = &Host> {
        self.hosts.values()
    }

    /// Get all groups, including `all` and `ungrouped`
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    /// Get the groups that came from the Controller (no structural groups)
    pub fn real_groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values().filter(|g| !g.is_reserved())
    }

    /// Get all host names
    pub fn host_names(&self) -> impl Iterator<Item = &String> {
        self.hosts.keys()
    }

    /// Get all group names
    pub fn group_names(&self) -> impl Iterator<Item = &String> {
        self.groups.keys()
    }

    /// Get the ancestor groups of a host in variable precedence order.
    ///
    /// Groups are ordered by depth below `all` (shallowest first), ties
    /// broken by name, so deeper groups override shallower ones.
    pub fn get_host_group_hierarchy(&self, host: &Host) -> GroupHierarchy {
        let mut ancestors: BTreeSet<&str> = BTreeSet::new();
        let mut stack: Vec<&str> = host.groups.iter().map(String::as_str).collect();
        while let Some(name) = stack.pop() {
            if !ancestors.insert(name) {
                continue;
            }
            if let Some(group) = self.groups.get(name) {
                stack.extend(group.parents.iter().map(String::as_str));
            }
        }
        ancestors.insert(ALL_GROUP);

        let mut cache = HashMap::new();
        let mut ordered: Vec<(usize, &str)> = ancestors
            .into_iter()
            .map(|name| (self.group_depth(name, &mut cache), name))
            .collect();
        ordered.sort();

        let mut hierarchy = GroupHierarchy::new();
        for (_, name) in ordered {
            hierarchy.push(name);
        }
        hierarchy
    }

    /// Get merged variables for a host (respecting group hierarchy)
    pub fn get_host_vars(&self, host: &Host) -> Vars {
        let mut vars = Vars::new();

        let hierarchy = self.get_host_group_hierarchy(host);
        for group_name in hierarchy.in_precedence_order() {
            if let Some(group) = self.groups.get(group_name) {
                for (key, value) in &group.vars {
                    vars.insert(key.clone(), value.clone());
                }
            }
        }

        for (key, value) in &host.vars {
            vars.insert(key.clone(), value.clone());
        }

        vars
    }

    /// Count total hosts
    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    /// Count total groups, including `all` and `ungrouped`
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

impl std::fmt::Display for Inventory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Inventory ({} hosts, {} groups)",
            self.hosts.len(),
            self.groups.len()
        )?;

        for group in self.groups.values() {
            if group.hosts.is_empty() {
                continue;
            }
            writeln!(f, "  [{}]", group.name)?;
            for host_name in &group.hosts {
                writeln!(f, "    {}", host_name)?;
            }
        }

        Ok(())
    }
}

/// Ingest a snapshot, apply the filters and check the result.
///
/// This is the whole inventory build minus the network: the same snapshot
/// and filter spec always produce the same graph.
pub fn build_inventory(snapshot: &Snapshot, filters: &FilterSpec) -> InventoryResult<Inventory> {
    let ingested = Inventory::from_snapshot(snapshot)?;
    let filtered = filters.apply(&ingested);
    filtered.check_consistency()?;

    info!(
        "inventory filtered from {} to {} hosts and from {} to {} groups",
        ingested.host_count(),
        filtered.host_count(),
        ingested.real_groups().count(),
        filtered.real_groups().count()
    );

    Ok(filtered)
}
