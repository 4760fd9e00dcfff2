//! Raw inventory data as fetched from the Controller.
//!
//! A [`Snapshot`] is the unfiltered input to an inventory build. It is built
//! from the Controller's inventory script document (the classic dynamic
//! inventory JSON format) and, optionally, carries Controller metadata.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use super::group::{ALL_GROUP, META_KEY, UNGROUPED_GROUP};
use super::{InventoryError, InventoryResult, Vars};

/// Fallback for metadata fields the Controller did not report
const UNKNOWN: &str = "unknown";

/// One host as reported by the Controller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub vars: Vars,
}

impl HostRecord {
    pub fn new(name: impl Into<String>, vars: Vars) -> Self {
        Self {
            name: name.into(),
            vars,
        }
    }
}

/// One group as reported by the Controller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub vars: Vars,
    /// Names of direct member hosts
    #[serde(default)]
    pub hosts: Vec<String>,
    /// Names of direct child groups
    #[serde(default)]
    pub children: Vec<String>,
}

impl GroupRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hosts.extend(hosts.into_iter().map(Into::into));
        self
    }

    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    pub fn with_vars(mut self, vars: Vars) -> Self {
        self.vars = vars;
        self
    }
}

/// Controller facts attached to the inventory when metadata is enabled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerMetadata {
    pub license_type: String,
    pub version: String,
    pub ansible_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory_id: Option<String>,
}

impl ControllerMetadata {
    /// Extract metadata from the Controller's `/api/v2/config/` document.
    ///
    /// Missing fields read as `"unknown"`; the call never fails on shape.
    pub fn from_config_document(document: &Value) -> Self {
        let field = |value: Option<&Value>| match value {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => UNKNOWN.to_string(),
            Some(other) => other.to_string(),
        };

        Self {
            license_type: field(
                document
                    .get("license_info")
                    .and_then(|info| info.get("license_type")),
            ),
            version: field(document.get("version")),
            ansible_version: field(document.get("ansible_version")),
            inventory_id: None,
        }
    }

    pub fn with_inventory_id(mut self, id: impl Into<String>) -> Self {
        self.inventory_id = Some(id.into());
        self
    }
}

/// Unfiltered inventory data: hosts, groups, root variables and metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub hosts: Vec<HostRecord>,
    #[serde(default)]
    pub groups: Vec<GroupRecord>,
    /// Variables of the implicit `all` group
    #[serde(default)]
    pub root_vars: Vars,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ControllerMetadata>,
}

impl Snapshot {
    /// Parse an inventory script document.
    ///
    /// Host variables come from `_meta.hostvars`; every other top-level key
    /// is a group, either an object with `hosts`/`children`/`vars` or a bare
    /// list of host names. Hosts only mentioned inside a group get empty
    /// variables. The `ungrouped` entry is ignored because membership in it
    /// is recomputed after filtering.
    pub fn from_script(document: &Value) -> InventoryResult<Self> {
        let root = document.as_object().ok_or_else(|| {
            InventoryError::MalformedSnapshot(format!(
                "expected a JSON object at the top level, found {}",
                type_name(document)
            ))
        })?;

        let mut snapshot = Snapshot::default();
        let mut host_index: indexmap::IndexMap<String, Vars> = indexmap::IndexMap::new();

        if let Some(meta) = root.get(META_KEY) {
            let hostvars = meta.get("hostvars").unwrap_or(&Value::Null);
            match hostvars {
                Value::Object(entries) => {
                    for (name, vars) in entries {
                        host_index.insert(name.clone(), object_vars(vars, "host", name));
                    }
                }
                Value::Null => {}
                other => {
                    return Err(InventoryError::MalformedSnapshot(format!(
                        "_meta.hostvars must be an object, found {}",
                        type_name(other)
                    )))
                }
            }
        }

        for (name, entry) in root {
            if name == META_KEY {
                continue;
            }

            let (hosts, children, vars) = match entry {
                Value::Object(fields) => (
                    string_list(fields.get("hosts"), name, "hosts"),
                    string_list(fields.get("children"), name, "children"),
                    fields
                        .get("vars")
                        .map(|v| object_vars(v, "group", name))
                        .unwrap_or_default(),
                ),
                Value::Array(_) => (string_list(Some(entry), name, "hosts"), Vec::new(), Vars::new()),
                other => {
                    warn!(
                        "ignoring group '{}': expected an object or a host list, found {}",
                        name,
                        type_name(other)
                    );
                    continue;
                }
            };

            for host in &hosts {
                host_index.entry(host.clone()).or_default();
            }

            match name.as_str() {
                ALL_GROUP => snapshot.root_vars = vars,
                UNGROUPED_GROUP => {}
                _ => snapshot.groups.push(GroupRecord {
                    name: name.clone(),
                    vars,
                    hosts,
                    children,
                }),
            }
        }

        snapshot.hosts = host_index
            .into_iter()
            .map(|(name, vars)| HostRecord { name, vars })
            .collect();

        Ok(snapshot)
    }

    pub fn with_metadata(mut self, metadata: ControllerMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn object_vars(value: &Value, kind: &str, name: &str) -> Vars {
    match value {
        Value::Object(map) => map_to_vars(map),
        Value::Null => Vars::new(),
        other => {
            warn!(
                "ignoring variables of {} '{}': expected an object, found {}",
                kind,
                name,
                type_name(other)
            );
            Vars::new()
        }
    }
}

fn map_to_vars(map: &Map<String, Value>) -> Vars {
    map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

fn string_list(value: Option<&Value>, group: &str, field: &str) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                other => {
                    warn!(
                        "ignoring entry in '{}.{}': expected a name, found {}",
                        group,
                        field,
                        type_name(other)
                    );
                    None
                }
            })
            .collect(),
        Some(other) => {
            warn!(
                "ignoring '{}.{}': expected a list, found {}",
                group,
                field,
                type_name(other)
            );
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_script_basic() {
        let doc = json!({
            "_meta": {
                "hostvars": {
                    "web1": {"ansible_host": "10.0.0.1"},
                    "db1": {}
                }
            },
            "all": {
                "children": ["webservers", "databases", "ungrouped"],
                "vars": {"ntp": "pool.ntp.org"}
            },
            "webservers": {"hosts": ["web1", "web2"], "vars": {"http_port": 80}},
            "databases": ["db1"],
            "ungrouped": {"hosts": ["stray"]}
        });

        let snapshot = Snapshot::from_script(&doc).unwrap();

        let host = |name: &str| snapshot.hosts.iter().find(|h| h.name == name).unwrap();
        let mut names: Vec<_> = snapshot.hosts.iter().map(|h| h.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["db1", "stray", "web1", "web2"]);
        assert_eq!(host("web1").vars.get("ansible_host"), Some(&json!("10.0.0.1")));
        assert!(host("web2").vars.is_empty());

        let mut groups: Vec<_> = snapshot.groups.iter().map(|g| g.name.as_str()).collect();
        groups.sort_unstable();
        assert_eq!(groups, vec!["databases", "webservers"]);
        let databases = snapshot.groups.iter().find(|g| g.name == "databases").unwrap();
        assert_eq!(databases.hosts, vec!["db1"]);
        assert_eq!(snapshot.root_vars.get("ntp"), Some(&json!("pool.ntp.org")));
        assert!(snapshot.metadata.is_none());
    }

    #[test]
    fn test_from_script_rejects_non_object() {
        let err = Snapshot::from_script(&json!(["web1"])).unwrap_err();
        assert!(matches!(err, InventoryError::MalformedSnapshot(_)));
    }

    #[test]
    fn test_from_script_rejects_bad_hostvars() {
        let err = Snapshot::from_script(&json!({"_meta": {"hostvars": []}})).unwrap_err();
        assert!(matches!(err, InventoryError::MalformedSnapshot(_)));
    }

    #[test]
    fn test_from_script_skips_malformed_entries() {
        let doc = json!({
            "weird": 42,
            "web": {"hosts": ["web1", 7, ""], "vars": "nope", "children": "x"}
        });

        let snapshot = Snapshot::from_script(&doc).unwrap();
        assert_eq!(snapshot.groups.len(), 1);
        assert_eq!(snapshot.groups[0].hosts, vec!["web1"]);
        assert!(snapshot.groups[0].vars.is_empty());
        assert!(snapshot.groups[0].children.is_empty());
    }

    #[test]
    fn test_metadata_from_config_document() {
        let doc = json!({
            "license_info": {"license_type": "open"},
            "version": "23.1.0",
            "ansible_version": "2.15.2"
        });
        let meta = ControllerMetadata::from_config_document(&doc).with_inventory_id("7");
        assert_eq!(meta.license_type, "open");
        assert_eq!(meta.version, "23.1.0");
        assert_eq!(meta.ansible_version, "2.15.2");
        assert_eq!(meta.inventory_id.as_deref(), Some("7"));

        let meta = ControllerMetadata::from_config_document(&json!({}));
        assert_eq!(meta.license_type, "unknown");
        assert_eq!(meta.version, "unknown");
    }
}
