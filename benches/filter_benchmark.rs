//! Filter engine benchmarks for controllerx
//!
//! 1. INGESTION: script document to snapshot to inventory
//! 2. FILTERING: each filter alone and combined over 100/1000/10000 hosts
//! 3. RENDERING: `--list` document output

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::{json, Map, Value};

use controllerx::inventory::{
    build_inventory, export, FilterSpec, GroupRecord, HostRecord, Inventory, Snapshot, Vars,
};

const SIZES: [usize; 3] = [100, 1_000, 10_000];

// ============================================================================
// DATA GENERATORS
// ============================================================================

/// Hosts spread over role groups, with role groups nested under site groups
fn generate_snapshot(hosts: usize) -> Snapshot {
    let roles = ["web", "db", "cache", "queue", "monitoring"];
    let sites = ["meta-eu", "meta-us", "meta-ap"];

    let host_records: Vec<HostRecord> = (0..hosts)
        .map(|i| {
            let mut vars = Vars::new();
            let address = format!("10.{}.{}.{}", i / 65536, (i / 256) % 256, i % 256);
            vars.insert("ansible_host".to_string(), json!(address));
            vars.insert("rack".to_string(), json!(i % 40));
            let name = if i % 7 == 0 {
                format!("important-{:05}", i)
            } else {
                format!("host-{:05}", i)
            };
            HostRecord::new(name, vars)
        })
        .collect();

    let mut groups = Vec::new();
    for (r, role) in roles.iter().enumerate() {
        for (s, site) in sites.iter().enumerate() {
            let members: Vec<&str> = host_records
                .iter()
                .enumerate()
                .filter(|(i, _)| i % roles.len() == r && (i / roles.len()) % sites.len() == s)
                .map(|(_, h)| h.name.as_str())
                .collect();
            groups.push(GroupRecord::new(format!("{}-{}", site, role)).with_hosts(members));
        }
    }
    for site in sites {
        let children: Vec<String> = roles.iter().map(|r| format!("{}-{}", site, r)).collect();
        groups.push(GroupRecord::new(site).with_children(children));
    }

    Snapshot {
        hosts: host_records,
        groups,
        ..Default::default()
    }
}

/// The same data as a Controller script export
fn generate_script(snapshot: &Snapshot) -> Value {
    let mut doc = Map::new();
    let hostvars: Map<String, Value> = snapshot
        .hosts
        .iter()
        .map(|h| (h.name.clone(), Value::Object(h.vars.clone().into_iter().collect())))
        .collect();
    doc.insert("_meta".to_string(), json!({ "hostvars": hostvars }));
    for group in &snapshot.groups {
        doc.insert(
            group.name.clone(),
            json!({"hosts": group.hosts, "children": group.children}),
        );
    }
    Value::Object(doc)
}

fn filters(hosts: Option<&str>, hostgroups: Option<&str>, groups: Option<&str>) -> FilterSpec {
    FilterSpec::new(hosts, hostgroups, groups).unwrap()
}

// ============================================================================
// BENCHMARKS
// ============================================================================

fn bench_ingestion(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingestion");

    for size in SIZES {
        let script = generate_script(&generate_snapshot(size));
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &script, |b, script| {
            b.iter(|| {
                let snapshot = Snapshot::from_script(black_box(script)).unwrap();
                Inventory::from_snapshot(&snapshot).unwrap()
            })
        });
    }

    group.finish();
}

fn bench_filtering(c: &mut Criterion) {
    let cases = [
        ("identity", filters(None, None, None)),
        ("hosts_filter", filters(Some("important"), None, None)),
        ("hostgroups_filter", filters(None, Some("-(web|db)$"), None)),
        ("groups_filter", filters(None, None, Some("^meta-eu"))),
        (
            "combined",
            filters(Some("important"), Some("^meta-us-web$"), Some("^meta-.*|web$")),
        ),
    ];

    let mut group = c.benchmark_group("filtering");

    for size in SIZES {
        let snapshot = generate_snapshot(size);
        group.throughput(Throughput::Elements(size as u64));
        for (name, spec) in &cases {
            group.bench_with_input(BenchmarkId::new(*name, size), &snapshot, |b, snapshot| {
                b.iter(|| build_inventory(black_box(snapshot), spec).unwrap())
            });
        }
    }

    group.finish();
}

fn bench_rendering(c: &mut Criterion) {
    let mut group = c.benchmark_group("rendering");

    for size in SIZES {
        let inventory = build_inventory(&generate_snapshot(size), &FilterSpec::default()).unwrap();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("json", size), &inventory, |b, inventory| {
            b.iter(|| export::to_json(black_box(inventory)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("graph", size), &inventory, |b, inventory| {
            b.iter(|| export::render_graph(black_box(inventory), "all").unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_ingestion, bench_filtering, bench_rendering);
criterion_main!(benches);
