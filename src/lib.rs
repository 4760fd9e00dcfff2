//! # controllerx - Ansible Controller dynamic inventory
//!
//! controllerx builds an Ansible inventory from an Ansible Controller
//! (AWX/Tower) inventory and narrows it with three regular expressions:
//!
//! - `hosts_filter` keeps hosts by name
//! - `hostgroups_filter` keeps hosts by the groups they belong to
//! - `groups_filter` keeps groups by name
//!
//! ## Pipeline
//!
//! ```text
//! ┌────────────────┐   ┌────────────────┐   ┌────────────────┐   ┌────────────────┐
//! │ config         │──▶│ controller     │──▶│ inventory      │──▶│ export         │
//! │ (file/env/CLI) │   │ (REST fetch)   │   │ (ingest+filter)│   │ (JSON/YAML/    │
//! │                │   │                │   │                │   │  graph)        │
//! └────────────────┘   └────────────────┘   └────────────────┘   └────────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use controllerx::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let source = InventorySource::from_path("prod.controllerx.yml")?;
//!     let plugin = ControllerxPlugin::from_source(&source, &ConfigOverrides::default())?;
//!     let inventory = plugin.parse().await?;
//!     println!("{}", export::to_json(&inventory)?);
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::config::{ConfigOverrides, ControllerConfig, InventorySource};
    pub use crate::controller::{ControllerClient, ControllerError};
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::inventory::export;
    pub use crate::inventory::plugins::{ControllerxPlugin, ScriptFilePlugin};
    pub use crate::inventory::{
        build_inventory, FilterSpec, Group, Host, Inventory, InventoryPlugin, Snapshot,
    };
}

// ============================================================================
// Core Modules
// ============================================================================

/// Error types and result aliases.
///
/// [`Error`](error::Error) folds the per-stage errors together and maps each
/// failure to a category and a CLI exit status.
pub mod error;

/// Option resolution from source file, environment and command line.
pub mod config;

// ============================================================================
// Inventory
// ============================================================================

/// Controller REST API client.
pub mod controller;

/// Host/group graph, ingestion, filtering and rendering.
///
/// The filter engine in [`inventory::filter`] is pure: the same snapshot and
/// patterns always give the same inventory.
pub mod inventory;

pub use error::{Error, Result};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
