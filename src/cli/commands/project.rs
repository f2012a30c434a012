//! `awb project` command - Project registry and generated documents

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::io::Read;
use std::path::PathBuf;

use crate::cli::helpers::{
    confirm, field, or_dash, print_detail, print_list, success, truncate_str, Session,
};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::registry::{self, find_project};
use crate::core::scope::load_root;
use crate::entities::project::{DocKind, GeneratedDoc, Project};

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Create a project and make it active
    New {
        /// Project name (unique, case-insensitive)
        name: String,

        /// Short description
        #[arg(long, short = 'd', default_value = "")]
        description: String,
    },

    /// List projects (the active one is marked with *)
    List,

    /// Make a project active
    Select {
        /// Project ID, ID prefix, or name
        project: String,
    },

    /// Show a project (default: the active one)
    Show {
        /// Project ID, ID prefix, or name
        project: Option<String>,
    },

    /// Rename a project or change its description
    Edit {
        /// Project ID, ID prefix, or name
        project: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, short = 'd')]
        description: Option<String>,
    },

    /// Delete a project and every tool document it owns
    Delete {
        /// Project ID, ID prefix, or name
        project: String,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Attach or edit the active project's PRD/BRD
    #[command(subcommand)]
    Doc(DocCommands),
}

#[derive(Subcommand, Debug)]
pub enum DocCommands {
    /// Replace a document from Markdown (`## Title` starts a section) or
    /// JSON (`{"sections": [...]}`)
    Import {
        /// prd or brd
        kind: DocKind,

        /// Markdown or JSON file ("-" reads stdin)
        file: PathBuf,
    },

    /// Print a document's sections
    Show {
        /// prd or brd
        kind: DocKind,
    },

    /// Replace one section's content
    Section {
        /// prd or brd
        kind: DocKind,

        /// Section title (case-insensitive)
        title: String,

        /// New section content
        content: String,
    },
}

pub fn run(cmd: ProjectCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ProjectCommands::New { name, description } => run_new(&name, &description, global),
        ProjectCommands::List => run_list(global),
        ProjectCommands::Select { project } => run_select(&project, global),
        ProjectCommands::Show { project } => run_show(project.as_deref(), global),
        ProjectCommands::Edit {
            project,
            name,
            description,
        } => run_edit(&project, name.as_deref(), description.as_deref(), global),
        ProjectCommands::Delete { project, yes } => run_delete(&project, yes, global),
        ProjectCommands::Doc(cmd) => run_doc(cmd, global),
    }
}

fn run_new(name: &str, description: &str, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let project = registry::create_project(&mut session.store, name, description)
        .map_err(|e| miette::miette!("{}", e))?;

    if session.format() == OutputFormat::Id {
        println!("{}", project.id);
        return Ok(());
    }
    success(
        global,
        format!(
            "Created project {} ({}), now active",
            style(&project.project_name).cyan(),
            project.id
        ),
    );
    Ok(())
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let doc = load_root(&session.store);
    let active = doc.active().map(|p| p.id.clone());

    print_list(
        session.format(),
        &doc.projects,
        &["", "ID", "NAME", "DESCRIPTION", "CREATED"],
        "No projects found. Create one with: awb project new <NAME>",
        |p: &Project| {
            vec![
                if active.as_deref() == Some(p.id.as_str()) { "*" } else { "" }.to_string(),
                p.id.clone(),
                p.project_name.clone(),
                truncate_str(&p.project_description, 40),
                p.created_at.format("%Y-%m-%d").to_string(),
            ]
        },
    )
}

fn run_select(query: &str, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let project = registry::select_project(&mut session.store, query)
        .map_err(|e| miette::miette!("{}", e))?;
    success(
        global,
        format!("Active project is now {}", style(&project.project_name).cyan()),
    );
    Ok(())
}

fn run_show(query: Option<&str>, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let doc = load_root(&session.store);
    let project = match query {
        Some(q) => find_project(&doc, q).ok_or_else(|| miette::miette!("no project matches '{}'", q))?,
        None => doc
            .active()
            .ok_or_else(|| miette::miette!("no active project; create or select a project first"))?,
    };
    let is_active = doc.active_project_id.as_deref() == Some(project.id.as_str());

    print_detail(session.format(), project, || {
        println!("{}", style(&project.project_name).bold());
        field("ID", &project.id);
        field("Active", if is_active { "yes" } else { "no" });
        field("Description", or_dash(&project.project_description));
        field("Created", project.created_at.format("%Y-%m-%d %H:%M"));
        for kind in [DocKind::Prd, DocKind::Brd] {
            let summary = match project.doc(kind) {
                Some(doc) => format!(
                    "{} section(s), generated {}",
                    doc.sections.len(),
                    doc.generated_at.format("%Y-%m-%d")
                ),
                None => "-".to_string(),
            };
            field(&kind.to_string().to_uppercase(), summary);
        }
    })
}

fn run_edit(
    query: &str,
    name: Option<&str>,
    description: Option<&str>,
    global: &GlobalOpts,
) -> Result<()> {
    if name.is_none() && description.is_none() {
        return Err(miette::miette!("nothing to change; pass --name or --description"));
    }
    let mut session = Session::open(global)?;
    let project = registry::update_project(&mut session.store, query, name, description)
        .map_err(|e| miette::miette!("{}", e))?;
    success(global, format!("Updated project {}", style(&project.project_name).cyan()));
    Ok(())
}

fn run_delete(query: &str, yes: bool, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let doc = load_root(&session.store);
    let project = find_project(&doc, query)
        .ok_or_else(|| miette::miette!("no project matches '{}'", query))?;

    let prompt = format!(
        "Delete project '{}' and all of its epics, stories, sprints and other data?",
        project.project_name
    );
    if !confirm(&prompt, yes)? {
        println!("Cancelled.");
        return Ok(());
    }

    let deleted = registry::delete_project(&mut session.store, &project.id)
        .map_err(|e| miette::miette!("{}", e))?;
    success(
        global,
        format!(
            "Deleted project {} ({} document(s) removed)",
            style(&deleted.project.project_name).cyan(),
            deleted.removed_documents
        ),
    );
    if !global.quiet {
        match deleted
            .active_project_id
            .as_deref()
            .and_then(|id| find_project(&load_root(&session.store), id).cloned())
        {
            Some(active) => println!("  Active project: {}", style(&active.project_name).cyan()),
            None => println!("  No projects left. Create one with: awb project new <NAME>"),
        }
    }
    Ok(())
}

fn run_doc(cmd: DocCommands, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    match cmd {
        DocCommands::Import { kind, file } => {
            let text = if file.as_os_str() == "-" {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf).into_diagnostic()?;
                buf
            } else {
                std::fs::read_to_string(&file).into_diagnostic()?
            };
            let is_json = file.extension().is_some_and(|e| e == "json")
                || text.trim_start().starts_with('{');
            let generated = if is_json {
                GeneratedDoc::from_json(&text)
                    .map_err(|e| miette::miette!("invalid document JSON: {}", e))?
            } else {
                GeneratedDoc::from_markdown(&text)
            };
            let sections = generated.sections.len();
            registry::set_active_doc(&mut session.store, kind, generated)
                .ok_or_else(|| miette::miette!("no active project; create or select a project first"))?;
            success(
                global,
                format!("Saved {} with {} section(s)", kind.to_string().to_uppercase(), sections),
            );
        }
        DocCommands::Show { kind } => {
            let project = session.active_project()?;
            let doc = project.doc(kind).ok_or_else(|| {
                miette::miette!(
                    "project '{}' has no {} document",
                    project.project_name,
                    kind.to_string().to_uppercase()
                )
            })?;
            match session.format() {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(doc).into_diagnostic()?)
                }
                OutputFormat::Yaml => print!("{}", serde_yml::to_string(doc).into_diagnostic()?),
                _ => {
                    println!("{}", style(kind.title()).bold());
                    for section in &doc.sections {
                        println!();
                        println!("{}", style(&section.title).cyan());
                        println!("{}", section.content);
                    }
                }
            }
        }
        DocCommands::Section {
            kind,
            title,
            content,
        } => {
            if !registry::set_active_doc_section(&mut session.store, kind, &title, &content) {
                return Err(miette::miette!(
                    "no section '{}' in the active project's {}",
                    title,
                    kind.to_string().to_uppercase()
                ));
            }
            success(global, format!("Updated section {}", style(&title).cyan()));
        }
    }
    Ok(())
}
