//! Rendering of a built inventory.
//!
//! The `--list` document follows the dynamic inventory script format that
//! `ansible-inventory` consumes: one object per group plus `_meta.hostvars`.

use serde_json::{json, Map, Value};

use super::group::{ALL_GROUP, META_KEY};
use super::{Inventory, InventoryError, InventoryResult, Vars};

/// Build the script-format document for an inventory.
///
/// Every group carries a `hosts` array, possibly empty, except `all` whose
/// members are reached through its children. `children` and `vars` are
/// emitted only when non-empty. Keys come out sorted.
pub fn to_document(inventory: &Inventory) -> Value {
    let mut document = Map::new();

    let hostvars: Map<String, Value> = inventory
        .hosts()
        .map(|host| (host.name.clone(), vars_to_value(&host.vars)))
        .collect();
    document.insert(META_KEY.to_string(), json!({ "hostvars": hostvars }));

    for group in inventory.groups() {
        let mut entry = Map::new();
        if group.name != ALL_GROUP {
            entry.insert("hosts".to_string(), json!(group.hosts));
        }
        if !group.children.is_empty() {
            entry.insert("children".to_string(), json!(group.children));
        }
        if !group.vars.is_empty() {
            entry.insert("vars".to_string(), vars_to_value(&group.vars));
        }
        document.insert(group.name.clone(), Value::Object(entry));
    }

    Value::Object(document)
}

/// Render the inventory as pretty-printed JSON.
pub fn to_json(inventory: &Inventory) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&to_document(inventory))
}

/// Render the inventory as YAML.
pub fn to_yaml(inventory: &Inventory) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(&to_document(inventory))
}

/// Merged variables of one host, as `--host` prints them.
pub fn host_vars_document(inventory: &Inventory, host_name: &str) -> InventoryResult<Value> {
    let host = inventory
        .get_host(host_name)
        .ok_or_else(|| InventoryError::HostNotFound(host_name.to_string()))?;
    Ok(vars_to_value(&inventory.get_host_vars(host)))
}

/// Draw the group tree below `root` the way `ansible-inventory --graph` does.
///
/// Child groups come first, then hosts, each sorted by name.
pub fn render_graph(inventory: &Inventory, root: &str) -> InventoryResult<String> {
    if inventory.get_group(root).is_none() {
        return Err(InventoryError::GroupNotFound(root.to_string()));
    }

    let mut out = String::new();
    graph_walk(inventory, root, &mut out);
    Ok(out)
}

enum GraphNode<'a> {
    Group(&'a str, usize),
    Host(&'a str, usize),
}

/// Pre-order walk with an explicit stack; entries are pushed in reverse
/// so they pop in drawing order.
fn graph_walk<'a>(inventory: &'a Inventory, root: &'a str, out: &mut String) {
    let mut stack = vec![GraphNode::Group(root, 0)];

    while let Some(node) = stack.pop() {
        match node {
            GraphNode::Host(name, depth) => out.push_str(&graph_line(name, depth)),
            GraphNode::Group(name, depth) => {
                let Some(group) = inventory.get_group(name) else {
                    continue;
                };
                out.push_str(&graph_line(&format!("@{}:", name), depth));
                stack.extend(
                    group
                        .hosts
                        .iter()
                        .rev()
                        .map(|h| GraphNode::Host(h.as_str(), depth + 1)),
                );
                stack.extend(
                    group
                        .children
                        .iter()
                        .rev()
                        .map(|c| GraphNode::Group(c.as_str(), depth + 1)),
                );
            }
        }
    }
}

fn graph_line(label: &str, depth: usize) -> String {
    if depth == 0 {
        format!("{}\n", label)
    } else {
        format!("{}--{}\n", "  |".repeat(depth), label)
    }
}

fn vars_to_value(vars: &Vars) -> Value {
    Value::Object(vars.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::{GroupRecord, HostRecord, Snapshot};
    use pretty_assertions::assert_eq;

    fn inventory() -> Inventory {
        let mut web1 = Vars::new();
        web1.insert("ansible_host".to_string(), json!("10.0.0.1"));
        let mut web_vars = Vars::new();
        web_vars.insert("http_port".to_string(), json!(80));

        let snapshot = Snapshot {
            hosts: vec![
                HostRecord::new("web1", web1),
                HostRecord::new("web2", Vars::new()),
                HostRecord::new("stray", Vars::new()),
            ],
            groups: vec![
                GroupRecord::new("prod").with_children(["web"]),
                GroupRecord::new("web")
                    .with_hosts(["web2", "web1"])
                    .with_vars(web_vars),
                GroupRecord::new("empty"),
            ],
            ..Default::default()
        };
        Inventory::from_snapshot(&snapshot).unwrap()
    }

    #[test]
    fn test_document_shape() {
        let doc = to_document(&inventory());
        assert_eq!(
            doc,
            json!({
                "_meta": {"hostvars": {
                    "stray": {},
                    "web1": {"ansible_host": "10.0.0.1"},
                    "web2": {}
                }},
                "all": {"children": ["empty", "prod", "ungrouped"]},
                "empty": {"hosts": []},
                "prod": {"hosts": [], "children": ["web"]},
                "ungrouped": {"hosts": ["stray"]},
                "web": {"hosts": ["web1", "web2"], "vars": {"http_port": 80}}
            })
        );
    }

    #[test]
    fn test_json_is_deterministic() {
        let first = to_json(&inventory()).unwrap();
        let second = to_json(&inventory()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_host_vars_document() {
        let doc = host_vars_document(&inventory(), "web1").unwrap();
        assert_eq!(doc, json!({"http_port": 80, "ansible_host": "10.0.0.1"}));

        let err = host_vars_document(&inventory(), "ghost").unwrap_err();
        assert!(matches!(err, InventoryError::HostNotFound(_)));
    }

    #[test]
    fn test_graph() {
        let graph = render_graph(&inventory(), "all").unwrap();
        let expected = "\
@all:
  |--@empty:
  |--@prod:
  |  |--@web:
  |  |  |--web1
  |  |  |--web2
  |--@ungrouped:
  |  |--stray
";
        assert_eq!(graph, expected);

        let sub = render_graph(&inventory(), "web").unwrap();
        assert_eq!(sub, "@web:\n  |--web1\n  |--web2\n");

        assert!(render_graph(&inventory(), "nope").is_err());
    }

    #[test]
    fn test_graph_deep_nesting() {
        const DEPTH: usize = 3_000;

        let names: Vec<String> = (0..DEPTH).map(|i| format!("g{:05}", i)).collect();
        let mut groups: Vec<GroupRecord> = names
            .windows(2)
            .map(|pair| GroupRecord::new(pair[0].as_str()).with_children([pair[1].as_str()]))
            .collect();
        groups.push(GroupRecord::new(names[DEPTH - 1].as_str()).with_hosts(["leaf"]));

        let snapshot = Snapshot {
            hosts: vec![HostRecord::new("leaf", Vars::new())],
            groups,
            ..Default::default()
        };
        let inventory = Inventory::from_snapshot(&snapshot).unwrap();

        let graph = render_graph(&inventory, "all").unwrap();
        let lines: Vec<&str> = graph.lines().collect();
        // all, every group of the chain, the host, then the empty ungrouped
        assert_eq!(lines.len(), DEPTH + 3);
        assert_eq!(lines[1], "  |--@g00000:");
        assert_eq!(lines[DEPTH + 1], format!("{}--leaf", "  |".repeat(DEPTH + 1)));
        assert_eq!(lines[DEPTH + 2], "  |--@ungrouped:");
    }
}
