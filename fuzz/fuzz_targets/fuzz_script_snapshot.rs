//! Fuzz target for script export ingestion.
//!
//! Arbitrary bytes are parsed as JSON and pushed through snapshot parsing and
//! the unfiltered build. Ingestion may reject input but must never panic,
//! and any inventory it accepts must be consistent.

#![no_main]

use controllerx::inventory::{build_inventory, export, FilterSpec, Snapshot};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(document) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let Ok(snapshot) = Snapshot::from_script(&document) else {
        return;
    };
    if let Ok(inventory) = build_inventory(&snapshot, &FilterSpec::default()) {
        assert!(inventory.check_consistency().is_ok());
        let _ = export::to_json(&inventory);
        let _ = export::render_graph(&inventory, "all");
    }
});
