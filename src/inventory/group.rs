//! Group node of the inventory graph, plus the names the inventory reserves
//! for itself.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::Vars;

/// Name of the implicit root group
pub const ALL_GROUP: &str = "all";

/// Name of the synthetic bucket for hosts outside every other group
pub const UNGROUPED_GROUP: &str = "ungrouped";

/// Name of the script-format key holding host variables
pub const META_KEY: &str = "_meta";

/// Returns true for names the inventory manages itself.
///
/// Reserved names are never filtered, never gate hosts and are never taken
/// from Controller input.
pub fn is_reserved_name(name: &str) -> bool {
    matches!(name, ALL_GROUP | UNGROUPED_GROUP | META_KEY)
}

/// A named set of hosts and child groups with shared variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,

    /// Direct host members
    #[serde(default)]
    pub hosts: BTreeSet<String>,

    #[serde(default)]
    pub children: BTreeSet<String>,

    /// Derived from the other groups' `children`; rebuilt by `reconcile`
    #[serde(skip)]
    pub parents: BTreeSet<String>,

    #[serde(default)]
    pub vars: Vars,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hosts: BTreeSet::new(),
            children: BTreeSet::new(),
            parents: BTreeSet::new(),
            vars: Vars::new(),
        }
    }

    pub fn all() -> Self {
        Self::new(ALL_GROUP)
    }

    pub fn ungrouped() -> Self {
        Self::new(UNGROUPED_GROUP)
    }

    /// True for the names the inventory manages itself
    pub fn is_reserved(&self) -> bool {
        is_reserved_name(&self.name)
    }

    pub fn add_host(&mut self, host: impl Into<String>) {
        self.hosts.insert(host.into());
    }

    pub fn has_host(&self, host: &str) -> bool {
        self.hosts.contains(host)
    }

    pub fn add_child(&mut self, child: impl Into<String>) {
        self.children.insert(child.into());
    }

    pub fn has_child(&self, child: &str) -> bool {
        self.children.contains(child)
    }

    pub fn add_parent(&mut self, parent: impl Into<String>) {
        self.parents.insert(parent.into());
    }

    pub fn set_var(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.vars.insert(key.into(), value);
    }

    pub fn get_var(&self, key: &str) -> Option<&serde_json::Value> {
        self.vars.get(key)
    }

    /// Overlay `other` onto this group's variables; `other` wins.
    pub fn merge_vars(&mut self, other: &Vars) {
        for (key, value) in other {
            self.vars.insert(key.clone(), value.clone());
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{} ({} hosts", self.name, self.hosts.len())?;
        if !self.children.is_empty() {
            write!(f, ", {} children", self.children.len())?;
        }
        write!(f, ")")
    }
}

/// Ancestor groups of one host, in variable precedence order.
///
/// The first entry is applied first and loses every conflict; the last is
/// the most specific group and wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupHierarchy {
    groups: Vec<String>,
}

impl GroupHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a group more specific than every group pushed so far.
    pub fn push(&mut self, group: impl Into<String>) {
        self.groups.push(group.into());
    }

    /// Groups from least to most specific.
    pub fn in_precedence_order(&self) -> impl Iterator<Item = &String> {
        self.groups.iter()
    }

    pub fn contains(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
