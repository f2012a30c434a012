//! Project registry - create, select and delete projects
//!
//! Every operation is a read-modify-write of the root document.

use thiserror::Error;

use crate::core::identity::match_id;
use crate::core::migration;
use crate::core::refs::names_match;
use crate::core::scope::{delete_project_tool_data, load_root, save_root};
use crate::core::store::Store;
use crate::entities::project::{DocKind, GeneratedDoc, Project, ProjectsDoc};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("project name cannot be empty")]
    EmptyName,

    #[error("a project named '{0}' already exists")]
    DuplicateName(String),

    #[error("no project matches '{0}'")]
    NotFound(String),
}

/// Result of deleting a project
#[derive(Debug, Clone, PartialEq)]
pub struct DeletedProject {
    pub project: Project,
    /// Tool documents that existed and were removed
    pub removed_documents: usize,
    /// Active project after the delete
    pub active_project_id: Option<String>,
}

/// Find a project by id, unique id prefix, or case-insensitive name
pub fn find_project<'a>(doc: &'a ProjectsDoc, query: &str) -> Option<&'a Project> {
    if let Some(id) = match_id(query, doc.projects.iter().map(|p| p.id.as_str())) {
        return doc.projects.iter().find(|p| p.id == id);
    }
    doc.projects
        .iter()
        .find(|p| names_match(&p.project_name, query))
}

/// Create a project and make it active.
///
/// Legacy single-project data, if any, is migrated into the first project
/// created.
pub fn create_project(store: &mut Store, name: &str, description: &str) -> Result<Project, RegistryError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RegistryError::EmptyName);
    }
    let mut doc = load_root(store);
    if doc.projects.iter().any(|p| names_match(&p.project_name, name)) {
        return Err(RegistryError::DuplicateName(name.to_string()));
    }

    let project = Project::new(name, description.trim());
    doc.active_project_id = Some(project.id.clone());
    doc.projects.push(project.clone());
    save_root(store, &mut doc);
    tracing::info!(project = %project.id, name, "created project");

    migration::run(store);
    Ok(project)
}

/// Make a project active
pub fn select_project(store: &mut Store, query: &str) -> Result<Project, RegistryError> {
    let mut doc = load_root(store);
    let project = find_project(&doc, query)
        .cloned()
        .ok_or_else(|| RegistryError::NotFound(query.to_string()))?;
    doc.active_project_id = Some(project.id.clone());
    save_root(store, &mut doc);
    tracing::debug!(project = %project.id, "selected project");
    Ok(project)
}

/// Delete a project and all of its tool documents.
///
/// If the deleted project was active, the first remaining project becomes
/// active, or none if the list is now empty.
pub fn delete_project(store: &mut Store, query: &str) -> Result<DeletedProject, RegistryError> {
    let mut doc = load_root(store);
    let id = find_project(&doc, query)
        .map(|p| p.id.clone())
        .ok_or_else(|| RegistryError::NotFound(query.to_string()))?;

    let removed_documents = delete_project_tool_data(store, &id);

    let pos = doc
        .projects
        .iter()
        .position(|p| p.id == id)
        .ok_or_else(|| RegistryError::NotFound(query.to_string()))?;
    let project = doc.projects.remove(pos);
    if doc.active_project_id.as_deref() == Some(id.as_str()) {
        doc.active_project_id = None;
    }
    save_root(store, &mut doc);
    tracing::info!(project = %id, removed_documents, "deleted project");

    Ok(DeletedProject {
        project,
        removed_documents,
        active_project_id: doc.active_project_id,
    })
}

/// Update name and/or description of a project
pub fn update_project(
    store: &mut Store,
    query: &str,
    name: Option<&str>,
    description: Option<&str>,
) -> Result<Project, RegistryError> {
    let mut doc = load_root(store);
    let id = find_project(&doc, query)
        .map(|p| p.id.clone())
        .ok_or_else(|| RegistryError::NotFound(query.to_string()))?;

    if let Some(name) = name.map(str::trim) {
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if doc
            .projects
            .iter()
            .any(|p| p.id != id && names_match(&p.project_name, name))
        {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }
    }

    let project = doc
        .projects
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or_else(|| RegistryError::NotFound(query.to_string()))?;
    if let Some(name) = name {
        project.project_name = name.trim().to_string();
    }
    if let Some(description) = description {
        project.project_description = description.trim().to_string();
    }
    let updated = project.clone();
    save_root(store, &mut doc);
    Ok(updated)
}

/// Attach a generated document to the active project
pub fn set_active_doc(store: &mut Store, kind: DocKind, generated: GeneratedDoc) -> Option<Project> {
    let mut doc = load_root(store);
    let project = doc.active_mut()?;
    project.set_doc(kind, generated);
    let updated = project.clone();
    save_root(store, &mut doc);
    Some(updated)
}

/// Replace one section's content in the active project's document.
///
/// Returns false if there is no active project, no such document, or no
/// section with that title.
pub fn set_active_doc_section(store: &mut Store, kind: DocKind, title: &str, content: &str) -> bool {
    let mut doc = load_root(store);
    let Some(generated) = doc.active_mut().and_then(|p| p.doc_mut(kind)) else {
        return false;
    };
    let Some(section) = generated
        .sections
        .iter_mut()
        .find(|s| s.title.eq_ignore_ascii_case(title.trim()))
    else {
        return false;
    };
    section.content = content.to_string();
    save_root(store, &mut doc).is_written()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backend::MemoryBackend;
    use crate::core::scope::{active_project_id, ProjectContext};
    use crate::core::tool::ToolKey;

    fn store() -> Store {
        Store::new(Box::new(MemoryBackend::new()))
    }

    #[test]
    fn test_create_makes_project_active() {
        let mut store = store();
        let acme = create_project(&mut store, "Acme", "").unwrap();
        assert_eq!(active_project_id(&store), Some(acme.id.clone()));

        let beta = create_project(&mut store, "Beta", "").unwrap();
        assert_eq!(active_project_id(&store), Some(beta.id));
        assert_eq!(
            create_project(&mut store, "acme", ""),
            Err(RegistryError::DuplicateName("acme".to_string()))
        );
        assert_eq!(create_project(&mut store, "  ", ""), Err(RegistryError::EmptyName));
    }

    #[test]
    fn test_select_by_name_or_prefix() {
        let mut store = store();
        let acme = create_project(&mut store, "Acme", "").unwrap();
        create_project(&mut store, "Beta", "").unwrap();

        assert_eq!(select_project(&mut store, "ACME").unwrap().id, acme.id);
        assert_eq!(active_project_id(&store), Some(acme.id.clone()));
        assert!(select_project(&mut store, "nope").is_err());
    }

    #[test]
    fn test_delete_active_repoints() {
        let mut store = store();
        let acme = create_project(&mut store, "Acme", "").unwrap();
        let beta = create_project(&mut store, "Beta", "").unwrap();
        let ctx = ProjectContext::new(beta.id.clone());
        ctx.save(&mut store, ToolKey::Stories, &Vec::<u8>::new());

        let deleted = delete_project(&mut store, &beta.id).unwrap();
        assert_eq!(deleted.removed_documents, 1);
        assert_eq!(deleted.active_project_id, Some(acme.id.clone()));
        assert_eq!(active_project_id(&store), Some(acme.id.clone()));
        assert!(!store.contains(&ToolKey::Stories.scoped_key(&beta.id)));

        let last = delete_project(&mut store, "Acme").unwrap();
        assert_eq!(last.active_project_id, None);
        assert_eq!(active_project_id(&store), None);
    }

    #[test]
    fn test_update_project_rejects_duplicate() {
        let mut store = store();
        create_project(&mut store, "Acme", "").unwrap();
        let beta = create_project(&mut store, "Beta", "").unwrap();
        assert!(update_project(&mut store, &beta.id, Some("acme"), None).is_err());
        let updated = update_project(&mut store, &beta.id, None, Some("Second")).unwrap();
        assert_eq!(updated.project_description, "Second");
    }

    #[test]
    fn test_doc_section_edit() {
        let mut store = store();
        create_project(&mut store, "Acme", "").unwrap();
        let generated = GeneratedDoc::from_markdown("## Goals\nold");
        set_active_doc(&mut store, DocKind::Prd, generated).unwrap();

        assert!(set_active_doc_section(&mut store, DocKind::Prd, "goals", "new"));
        assert!(!set_active_doc_section(&mut store, DocKind::Brd, "goals", "new"));
        let root = load_root(&store);
        assert_eq!(root.active().unwrap().prd.as_ref().unwrap().sections[0].content, "new");
    }
}
