//! Project partitioning - every tool document is stored per project
//!
//! Tool documents live at `<tool>-<projectId>`. The project id comes from
//! the root document at [`ROOT_KEY`]; nothing here caches it, so the active
//! project is always whatever the root document says at the time of the call.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::core::store::{Store, WriteOutcome};
use crate::core::tool::ToolKey;
use crate::entities::project::ProjectsDoc;
use crate::entities::raci::RaciMatrix;
use crate::entities::sprint::{ensure_sprint, Sprint};
use crate::entities::team::SprintConfig;

/// Key of the root project-list document
pub const ROOT_KEY: &str = "projects";

/// Errors from project-scoped operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScopeError {
    #[error("no active project; create or select a project first")]
    NoActiveProject,
}

/// Load the root document; a missing or malformed root reads as empty
pub fn load_root(store: &Store) -> ProjectsDoc {
    store.load(ROOT_KEY, ProjectsDoc::default())
}

/// Persist the root document, repairing a dangling active pointer first
pub fn save_root(store: &mut Store, doc: &mut ProjectsDoc) -> WriteOutcome {
    if doc.repair_active() {
        tracing::info!(active = ?doc.active_project_id, "repaired active project pointer");
    }
    store.save(ROOT_KEY, doc)
}

/// Id of the active project; `None` if there is no root document, no
/// pointer, or the pointer names no existing project
pub fn active_project_id(store: &Store) -> Option<String> {
    load_root(store).active().map(|p| p.id.clone())
}

/// Load a tool document for the active project, or `fallback`
pub fn load_project_data<T: DeserializeOwned>(store: &Store, tool: ToolKey, fallback: T) -> T {
    match active_project_id(store) {
        Some(project_id) => store.load(&tool.scoped_key(&project_id), fallback),
        None => fallback,
    }
}

/// Save a tool document for the active project.
///
/// With no active project nothing is written and
/// [`ScopeError::NoActiveProject`] is returned. A storage failure is not an
/// error: it yields `Ok(WriteOutcome::Dropped)` and a queued store warning.
pub fn save_project_data<T: Serialize + ?Sized>(
    store: &mut Store,
    tool: ToolKey,
    data: &T,
) -> Result<WriteOutcome, ScopeError> {
    let project_id = active_project_id(store).ok_or(ScopeError::NoActiveProject)?;
    Ok(store.save(&tool.scoped_key(&project_id), data))
}

/// Read a tool document, first moving a legacy unscoped value into the
/// active project if the scoped slot is still empty.
///
/// Idempotent: once the scoped key exists this is a plain scoped read. With
/// no active project, `fallback` is returned and storage is not touched.
pub fn migrate_tool_data_to_project<T: DeserializeOwned + Serialize>(
    store: &mut Store,
    tool: ToolKey,
    fallback: T,
) -> T {
    let Some(project_id) = active_project_id(store) else {
        return fallback;
    };
    let scoped = tool.scoped_key(&project_id);
    if store.contains(&scoped) {
        return store.load(&scoped, fallback);
    }

    let legacy = tool.as_str();
    if !store.contains(legacy) {
        return fallback;
    }
    let Some(value) = store.load_opt::<T>(legacy) else {
        tracing::warn!(key = legacy, "legacy value is not valid; left in place");
        return fallback;
    };

    if store.save(&scoped, &value).is_written() {
        store.remove(legacy);
        tracing::info!(tool = %tool, project = %project_id, "migrated legacy data into project");
    }
    value
}

/// Remove every registered tool document of `project_id`; returns how many
/// keys were present
pub fn delete_project_tool_data(store: &mut Store, project_id: &str) -> usize {
    let mut removed = 0;
    for tool in ToolKey::all() {
        let key = tool.scoped_key(project_id);
        if store.contains(&key) {
            removed += 1;
        }
        store.remove(&key);
    }
    tracing::debug!(project = project_id, removed, "deleted project tool data");
    removed
}

/// Explicit project context handed to every command
///
/// Captures the project id once; every load and save goes to that project's
/// keys regardless of later changes to the active pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectContext {
    project_id: String,
}

impl ProjectContext {
    /// Context for the active project
    pub fn active(store: &Store) -> Result<Self, ScopeError> {
        active_project_id(store)
            .map(Self::new)
            .ok_or(ScopeError::NoActiveProject)
    }

    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn key(&self, tool: ToolKey) -> String {
        tool.scoped_key(&self.project_id)
    }

    pub fn load<T: DeserializeOwned>(&self, store: &Store, tool: ToolKey, fallback: T) -> T {
        store.load(&self.key(tool), fallback)
    }

    /// Load a list document, empty if absent
    pub fn load_list<T: DeserializeOwned>(&self, store: &Store, tool: ToolKey) -> Vec<T> {
        self.load(store, tool, Vec::new())
    }

    pub fn save<T: Serialize + ?Sized>(&self, store: &mut Store, tool: ToolKey, data: &T) -> WriteOutcome {
        store.save(&self.key(tool), data)
    }

    /// Sprints for this project; never empty
    pub fn load_sprints(&self, store: &Store) -> Vec<Sprint> {
        let mut sprints: Vec<Sprint> = self.load_list(store, ToolKey::Sprints);
        if ensure_sprint(&mut sprints) {
            tracing::debug!(project = %self.project_id, "no sprints stored; using a fresh default");
        }
        sprints
    }

    pub fn load_sprint_config(&self, store: &Store) -> SprintConfig {
        self.load(store, ToolKey::SprintConfig, SprintConfig::default())
    }

    pub fn load_raci(&self, store: &Store) -> RaciMatrix {
        self.load(store, ToolKey::Raci, RaciMatrix::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backend::MemoryBackend;
    use crate::entities::project::Project;

    fn store_with_projects(names: &[&str]) -> (Store, Vec<String>) {
        let mut store = Store::new(Box::new(MemoryBackend::new()));
        let projects: Vec<Project> = names.iter().map(|n| Project::new(n, "")).collect();
        let ids = projects.iter().map(|p| p.id.clone()).collect();
        let mut doc = ProjectsDoc {
            active_project_id: projects.first().map(|p| p.id.clone()),
            projects,
            schema_version: 1,
        };
        save_root(&mut store, &mut doc);
        (store, ids)
    }

    fn activate(store: &mut Store, id: &str) {
        let mut doc = load_root(store);
        doc.active_project_id = Some(id.to_string());
        save_root(store, &mut doc);
    }

    #[test]
    fn test_active_project_id_malformed_root() {
        let mut backend = MemoryBackend::new();
        backend.insert_raw("awb.projects", "[1, 2");
        let store = Store::new(Box::new(backend));
        assert_eq!(active_project_id(&store), None);
    }

    #[test]
    fn test_active_project_id_dangling_pointer() {
        let mut backend = MemoryBackend::new();
        backend.insert_raw(
            "awb.projects",
            r#"{"activeProjectId":"PROJ-GONE","projects":[]}"#,
        );
        let store = Store::new(Box::new(backend));
        assert_eq!(active_project_id(&store), None);
    }

    #[test]
    fn test_save_without_project_writes_nothing() {
        let mut store = Store::new(Box::new(MemoryBackend::new()));
        let result = save_project_data(&mut store, ToolKey::Epics, &vec!["x"]);
        assert_eq!(result, Err(ScopeError::NoActiveProject));
        assert!(store.keys().is_empty());
    }

    #[test]
    fn test_project_isolation() {
        let (mut store, ids) = store_with_projects(&["A", "B"]);
        save_project_data(&mut store, ToolKey::Risks, &vec!["a-risk"]).unwrap();

        activate(&mut store, &ids[1]);
        let seen: Vec<String> = load_project_data(&store, ToolKey::Risks, Vec::new());
        assert!(seen.is_empty());

        activate(&mut store, &ids[0]);
        let seen: Vec<String> = load_project_data(&store, ToolKey::Risks, Vec::new());
        assert_eq!(seen, vec!["a-risk".to_string()]);
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let (mut store, ids) = store_with_projects(&["A"]);
        store.save("team", &vec!["Jane"]);

        let first: Vec<String> = migrate_tool_data_to_project(&mut store, ToolKey::Team, Vec::new());
        let second: Vec<String> = migrate_tool_data_to_project(&mut store, ToolKey::Team, Vec::new());
        assert_eq!(first, vec!["Jane".to_string()]);
        assert_eq!(first, second);
        assert!(!store.contains("team"));
        assert!(store.contains(&ToolKey::Team.scoped_key(&ids[0])));
    }

    #[test]
    fn test_migrate_without_project_touches_nothing() {
        let mut store = Store::new(Box::new(MemoryBackend::new()));
        store.save("team", &vec!["Jane"]);
        let value: Vec<String> = migrate_tool_data_to_project(&mut store, ToolKey::Team, Vec::new());
        assert!(value.is_empty());
        assert!(store.contains("team"));
    }

    #[test]
    fn test_delete_project_tool_data() {
        let (mut store, ids) = store_with_projects(&["A"]);
        let ctx = ProjectContext::new(ids[0].clone());
        for tool in ToolKey::all() {
            ctx.save(&mut store, *tool, &serde_json::json!([]));
        }
        assert_eq!(delete_project_tool_data(&mut store, &ids[0]), ToolKey::all().len());
        assert_eq!(store.keys(), vec![ROOT_KEY.to_string()]);
    }

    #[test]
    fn test_context_sprints_never_empty() {
        let (store, ids) = store_with_projects(&["A"]);
        let ctx = ProjectContext::new(ids[0].clone());
        let sprints = ctx.load_sprints(&store);
        assert_eq!(sprints.len(), 1);
        assert_eq!(sprints[0].name, "Sprint 1");
    }
}
