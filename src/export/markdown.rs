//! Markdown export through embedded Tera templates

use rust_embed::Embed;
use serde::Serialize;
use tera::{Context, Tera};

use crate::core::refs::resolve_opt;
use crate::entities::decision::Decision;
use crate::entities::project::{DocKind, Project};
use crate::entities::retro::{RetroCard, RetroSession};
use crate::entities::sprint::Sprint;
use crate::export::ExportError;

#[derive(Embed)]
#[folder = "templates/"]
struct EmbeddedTemplates;

const DOC_TEMPLATE: &str = "doc.md.tera";
const RETRO_TEMPLATE: &str = "retro.md.tera";
const DECISIONS_TEMPLATE: &str = "decisions.md.tera";

#[derive(Serialize)]
struct CardView {
    text: String,
    details: String,
}

impl CardView {
    fn from_card(card: &RetroCard) -> Self {
        let mut details = Vec::new();
        if let Some(assignee) = &card.assignee {
            details.push(assignee.clone());
        }
        if let Some(points) = card.points {
            details.push(format!("{} pts", points));
        }
        if let Some(status) = card.sprint_status {
            details.push(status.to_string());
        }
        Self {
            text: card.text.clone(),
            details: details.join(", "),
        }
    }
}

#[derive(Serialize)]
struct ActionView {
    status: String,
    text: String,
    owner: String,
    due: String,
}

#[derive(Serialize)]
struct DecisionView {
    date: String,
    decision: String,
    status: String,
    owner: String,
    sprint: String,
    context: String,
    rationale: String,
    remarks: String,
}

/// Renders Markdown documents from the embedded templates
pub struct MarkdownRenderer {
    tera: Tera,
}

impl MarkdownRenderer {
    pub fn new() -> Result<Self, ExportError> {
        let mut tera = Tera::default();

        for file in EmbeddedTemplates::iter() {
            let filename = file.as_ref();
            if let Some(content) = EmbeddedTemplates::get(filename) {
                if let Ok(template_str) = std::str::from_utf8(&content.data) {
                    tera.add_raw_template(filename, template_str)
                        .map_err(|e| ExportError::Render {
                            name: filename.to_string(),
                            reason: e.to_string(),
                        })?;
                }
            }
        }

        Ok(Self { tera })
    }

    fn render(&self, name: &str, context: &Context) -> Result<String, ExportError> {
        if !self.tera.get_template_names().any(|n| n == name) {
            return Err(ExportError::TemplateNotFound(name.to_string()));
        }
        self.tera.render(name, context).map_err(|e| ExportError::Render {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }

    /// Render a project's PRD or BRD
    pub fn render_doc(&self, project: &Project, kind: DocKind) -> Result<String, ExportError> {
        let doc = project
            .doc(kind)
            .ok_or_else(|| ExportError::MissingDocument(kind.to_string().to_uppercase()))?;

        let mut context = Context::new();
        context.insert("title", kind.title());
        context.insert("project_name", &project.project_name);
        context.insert("project_description", &project.project_description);
        context.insert("generated_at", &doc.generated_at.format("%Y-%m-%d %H:%M UTC").to_string());
        context.insert("sections", &doc.sections);
        self.render(DOC_TEMPLATE, &context)
    }

    /// Render one retro session; a dangling sprint link shows as not found
    pub fn render_retro(
        &self,
        project: &Project,
        retro: &RetroSession,
        sprints: &[Sprint],
    ) -> Result<String, ExportError> {
        let sprint = match resolve_opt(retro.sprint_id.as_ref(), sprints) {
            Some(resolution) => match resolution.found() {
                Some(sprint) => sprint.name.clone(),
                None => resolution.describe(),
            },
            None => "-".to_string(),
        };
        let actions: Vec<ActionView> = retro
            .action_items
            .iter()
            .map(|a| ActionView {
                status: a.status.to_string(),
                text: a.text.clone(),
                owner: if a.owner.is_empty() { "-".to_string() } else { a.owner.clone() },
                due: a.due_date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
            })
            .collect();

        let mut context = Context::new();
        context.insert("project_name", &project.project_name);
        context.insert("date", &retro.date.to_string());
        context.insert("sprint", &sprint);
        context.insert(
            "went_well",
            &retro.went_well.iter().map(CardView::from_card).collect::<Vec<_>>(),
        );
        context.insert(
            "didnt_go_well",
            &retro.didnt_go_well.iter().map(CardView::from_card).collect::<Vec<_>>(),
        );
        context.insert("actions", &actions);
        self.render(RETRO_TEMPLATE, &context)
    }

    /// Render the decision log in the order given
    pub fn render_decisions(
        &self,
        project: &Project,
        decisions: &[Decision],
        sprints: &[Sprint],
    ) -> Result<String, ExportError> {
        let views: Vec<DecisionView> = decisions
            .iter()
            .map(|d| DecisionView {
                date: d.date.to_string(),
                decision: d.decision.clone(),
                status: d.status.to_string(),
                owner: if d.owner.is_empty() { "-".to_string() } else { d.owner.clone() },
                sprint: resolve_opt(d.sprint_id.as_ref(), sprints)
                    .map(|r| r.found().map(|s| s.name.clone()).unwrap_or_else(|| r.describe()))
                    .unwrap_or_else(|| "-".to_string()),
                context: d.context.clone(),
                rationale: d.rationale.clone(),
                remarks: d.remarks.clone(),
            })
            .collect();

        let mut context = Context::new();
        context.insert("project_name", &project.project_name);
        context.insert("decisions", &views);
        self.render(DECISIONS_TEMPLATE, &context)
    }
}
