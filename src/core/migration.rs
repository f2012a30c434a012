//! Versioned store migrations
//!
//! The root document carries `schemaVersion`. [`run`] brings a store up to
//! [`CURRENT_VERSION`] and is safe to call on every open.
//!
//! | Version | Layout |
//! |---------|--------|
//! | 0 | single project: tool documents at bare `<tool>` keys |
//! | 1 | multi-project: tool documents at `<tool>-<projectId>` |

use serde_json::Value;

use crate::core::scope::{self, load_root, save_root};
use crate::core::store::Store;
use crate::core::tool::ToolKey;

/// Layout version written by this build
pub const CURRENT_VERSION: u32 = 1;

/// What a migration run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Version found before the run
    pub from_version: u32,
    /// Version persisted after the run
    pub to_version: u32,
    /// Legacy documents moved into the active project
    pub migrated: Vec<ToolKey>,
    /// Legacy documents left in place because the project already had data
    pub kept_legacy: Vec<ToolKey>,
}

impl MigrationReport {
    pub fn changed(&self) -> bool {
        self.from_version != self.to_version || !self.migrated.is_empty()
    }
}

/// Bring the store up to [`CURRENT_VERSION`].
///
/// Version 0 → 1 needs an active project to migrate into. Without one the
/// store is left at version 0 and the step is retried on the next run, which
/// happens after the first project is created.
pub fn run(store: &mut Store) -> MigrationReport {
    let root = load_root(store);
    let mut report = MigrationReport {
        from_version: root.schema_version,
        to_version: root.schema_version,
        ..Default::default()
    };

    if root.schema_version >= CURRENT_VERSION {
        return report;
    }

    let Some(project_id) = root.active().map(|p| p.id.clone()) else {
        tracing::debug!("no active project; legacy migration deferred");
        return report;
    };

    for tool in ToolKey::all() {
        if !store.contains(tool.as_str()) {
            continue;
        }
        if store.contains(&tool.scoped_key(&project_id)) {
            tracing::warn!(tool = %tool, "project already has data; legacy document kept");
            report.kept_legacy.push(*tool);
            continue;
        }
        let _: Value = scope::migrate_tool_data_to_project(store, *tool, Value::Null);
        if !store.contains(tool.as_str()) {
            report.migrated.push(*tool);
        }
    }

    let mut root = root;
    root.schema_version = CURRENT_VERSION;
    if save_root(store, &mut root).is_written() {
        report.to_version = CURRENT_VERSION;
        tracing::info!(
            from = report.from_version,
            to = report.to_version,
            migrated = report.migrated.len(),
            "store migrated"
        );
    }
    report
}
