//! Host node of the inventory graph.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::group::UNGROUPED_GROUP;
use super::Vars;

/// A managed host as exported by the Controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Host {
    pub name: String,

    /// Variables from `_meta.hostvars`
    #[serde(default)]
    pub vars: Vars,

    /// Direct group memberships, mirrored from the groups' `hosts` sets
    #[serde(skip)]
    pub groups: BTreeSet<String>,
}

impl Host {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_vars(name, Vars::new())
    }

    pub fn with_vars(name: impl Into<String>, vars: Vars) -> Self {
        Self {
            name: name.into(),
            vars,
            groups: BTreeSet::new(),
        }
    }

    pub fn set_var(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.vars.insert(key.into(), value);
    }

    pub fn get_var(&self, key: &str) -> Option<&serde_json::Value> {
        self.vars.get(key)
    }

    /// Record a direct membership. The group side is not touched.
    pub fn add_to_group(&mut self, group: impl Into<String>) {
        self.groups.insert(group.into());
    }

    pub fn remove_from_group(&mut self, group: &str) -> bool {
        self.groups.remove(group)
    }

    pub fn in_group(&self, group: &str) -> bool {
        self.groups.contains(group)
    }

    /// True when the host sits only in the synthetic `ungrouped` bucket.
    pub fn is_ungrouped(&self) -> bool {
        self.groups.iter().all(|g| g == UNGROUPED_GROUP)
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
