//! Project entity and the root project-list document

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::entity::Record;
use crate::core::identity::{new_id, IdKind};

/// Which generated business document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocKind {
    /// Product requirements document
    Prd,
    /// Business requirements document
    Brd,
}

impl DocKind {
    pub fn title(&self) -> &'static str {
        match self {
            DocKind::Prd => "Product Requirements Document",
            DocKind::Brd => "Business Requirements Document",
        }
    }
}

impl fmt::Display for DocKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocKind::Prd => write!(f, "prd"),
            DocKind::Brd => write!(f, "brd"),
        }
    }
}

impl FromStr for DocKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "prd" => Ok(DocKind::Prd),
            "brd" => Ok(DocKind::Brd),
            _ => Err(format!("Unknown document kind: {}", s)),
        }
    }
}

/// One titled section of a generated document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocSection {
    pub title: String,
    pub content: String,
}

/// A generated business document (PRD or BRD)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedDoc {
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub sections: Vec<DocSection>,
}

impl GeneratedDoc {
    pub fn new(sections: Vec<DocSection>) -> Self {
        Self {
            generated_at: Utc::now(),
            sections,
        }
    }

    /// Parse a `{"sections": [{"title", "content"}]}` document
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        #[derive(Deserialize)]
        struct Sections {
            sections: Vec<DocSection>,
        }
        let parsed: Sections = serde_json::from_str(json)?;
        Ok(Self::new(parsed.sections))
    }

    /// Parse Markdown into sections, splitting on `## ` headings.
    ///
    /// Text before the first heading becomes an "Overview" section when it
    /// is not blank. A leading `# ` title line is dropped.
    pub fn from_markdown(markdown: &str) -> Self {
        let mut sections = Vec::new();
        let mut title = String::from("Overview");
        let mut body: Vec<&str> = Vec::new();

        for line in markdown.lines() {
            if let Some(heading) = line.strip_prefix("## ") {
                push_section(&mut sections, &title, &body);
                title = heading.trim().to_string();
                body.clear();
            } else if line.starts_with("# ") && sections.is_empty() && body.is_empty() {
                continue;
            } else {
                body.push(line);
            }
        }
        push_section(&mut sections, &title, &body);

        Self::new(sections)
    }
}

fn push_section(sections: &mut Vec<DocSection>, title: &str, body: &[&str]) {
    let content = body.join("\n").trim().to_string();
    if content.is_empty() && title == "Overview" {
        return;
    }
    sections.push(DocSection {
        title: title.to_string(),
        content,
    });
}

/// A project: the tenant every other record is partitioned by
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub project_name: String,
    #[serde(default)]
    pub project_description: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub prd: Option<GeneratedDoc>,
    #[serde(default)]
    pub brd: Option<GeneratedDoc>,
}

impl Project {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            id: new_id(IdKind::Proj),
            project_name: name.to_string(),
            project_description: description.to_string(),
            created_at: Utc::now(),
            prd: None,
            brd: None,
        }
    }

    pub fn doc(&self, kind: DocKind) -> Option<&GeneratedDoc> {
        match kind {
            DocKind::Prd => self.prd.as_ref(),
            DocKind::Brd => self.brd.as_ref(),
        }
    }

    pub fn doc_mut(&mut self, kind: DocKind) -> Option<&mut GeneratedDoc> {
        match kind {
            DocKind::Prd => self.prd.as_mut(),
            DocKind::Brd => self.brd.as_mut(),
        }
    }

    pub fn set_doc(&mut self, kind: DocKind, doc: GeneratedDoc) {
        match kind {
            DocKind::Prd => self.prd = Some(doc),
            DocKind::Brd => self.brd = Some(doc),
        }
    }
}

impl Record for Project {
    const KIND: &'static str = "project";

    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> String {
        self.project_name.clone()
    }
}

/// Root document: project list plus the active-project pointer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectsDoc {
    #[serde(default)]
    pub active_project_id: Option<String>,
    #[serde(default)]
    pub projects: Vec<Project>,
    /// Layout version, advanced by `core::migration`
    #[serde(default)]
    pub schema_version: u32,
}

impl ProjectsDoc {
    /// The active project, or `None` if the pointer is unset or dangling
    pub fn active(&self) -> Option<&Project> {
        let id = self.active_project_id.as_deref()?;
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn active_mut(&mut self) -> Option<&mut Project> {
        let id = self.active_project_id.clone()?;
        self.projects.iter_mut().find(|p| p.id == id)
    }

    /// Point at an existing project, or clear the pointer if it dangles.
    ///
    /// Returns true if the pointer changed.
    pub fn repair_active(&mut self) -> bool {
        if self.active().is_some() {
            return false;
        }
        let replacement = self.projects.first().map(|p| p.id.clone());
        let changed = replacement != self.active_project_id;
        self.active_project_id = replacement;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_serializes_camel_case() {
        let project = Project::new("Acme", "Widgets");
        let json = serde_json::to_value(&project).unwrap();
        assert_eq!(json["projectName"], "Acme");
        assert_eq!(json["projectDescription"], "Widgets");
        assert!(json["prd"].is_null());
    }

    #[test]
    fn test_projects_doc_dangling_pointer() {
        let mut doc = ProjectsDoc {
            active_project_id: Some("PROJ-GONE".to_string()),
            projects: vec![Project::new("A", "")],
            schema_version: 1,
        };
        assert!(doc.active().is_none());
        assert!(doc.repair_active());
        assert_eq!(doc.active().unwrap().project_name, "A");
        assert!(!doc.repair_active());
    }

    #[test]
    fn test_repair_active_with_no_projects_clears_pointer() {
        let mut doc = ProjectsDoc {
            active_project_id: Some("PROJ-GONE".to_string()),
            ..Default::default()
        };
        assert!(doc.repair_active());
        assert!(doc.active_project_id.is_none());
    }

    #[test]
    fn test_root_doc_tolerates_missing_fields() {
        let doc: ProjectsDoc = serde_json::from_str("{}").unwrap();
        assert!(doc.projects.is_empty());
        assert_eq!(doc.schema_version, 0);
    }

    #[test]
    fn test_doc_from_markdown_sections() {
        let md = "# PRD\n\nIntro text.\n\n## Goals\nShip it.\n\n## Scope\n- a\n- b\n";
        let doc = GeneratedDoc::from_markdown(md);
        let titles: Vec<_> = doc.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["Overview", "Goals", "Scope"]);
        assert_eq!(doc.sections[0].content, "Intro text.");
        assert_eq!(doc.sections[2].content, "- a\n- b");
    }

    #[test]
    fn test_doc_from_markdown_without_intro() {
        let doc = GeneratedDoc::from_markdown("## Only\nbody");
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].title, "Only");
    }

    #[test]
    fn test_doc_from_json() {
        let doc = GeneratedDoc::from_json(r#"{"sections":[{"title":"Goals","content":"Ship."}]}"#)
            .unwrap();
        assert_eq!(doc.sections[0].title, "Goals");
        assert!(GeneratedDoc::from_json(r#"{"title":"no sections"}"#).is_err());
    }
}
