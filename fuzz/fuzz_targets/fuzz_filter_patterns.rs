//! Fuzz target for filter patterns.
//!
//! Arbitrary pattern strings are compiled and applied to a fixed inventory.
//! Invalid patterns must be rejected with an error, and every filtered result
//! must keep the graph consistent.

#![no_main]

use arbitrary::Arbitrary;
use controllerx::inventory::{build_inventory, FilterSpec, GroupRecord, HostRecord, Snapshot, Vars};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct FuzzFilters {
    hosts: Option<String>,
    hostgroups: Option<String>,
    groups: Option<String>,
}

fn snapshot() -> Snapshot {
    Snapshot {
        hosts: ["important-1", "boring-1", "nova-1", "lonely"]
            .into_iter()
            .map(|name| HostRecord::new(name, Vars::new()))
            .collect(),
        groups: vec![
            GroupRecord::new("meta-keep-them").with_hosts(["important-1", "boring-1"]),
            GroupRecord::new("nova").with_hosts(["nova-1"]),
            GroupRecord::new("compute-nova").with_children(["nova"]),
        ],
        ..Default::default()
    }
}

fuzz_target!(|input: FuzzFilters| {
    let Ok(filters) = FilterSpec::new(
        input.hosts.as_deref(),
        input.hostgroups.as_deref(),
        input.groups.as_deref(),
    ) else {
        return;
    };
    let inventory = build_inventory(&snapshot(), &filters).expect("filtered inventory");
    assert!(inventory.check_consistency().is_ok());
});
