//! `awb raci` command - Responsibility assignment matrix

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{confirm, pick_index, print_table, report_saved, Session};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::Record;
use crate::core::refs::names_match;
use crate::core::tool::ToolKey;
use crate::entities::raci::{RaciMatrix, RaciRole, RaciWarning};

#[derive(Subcommand, Debug)]
pub enum RaciCommands {
    /// Show the matrix (tasks x stakeholders)
    Show,

    /// Add a task row
    AddTask {
        name: String,
    },

    /// Remove a task row
    RemoveTask {
        /// Task name, ID or ID prefix
        task: String,

        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Add a stakeholder column
    AddStakeholder {
        name: String,

        /// Job title or team
        #[arg(long, short = 'r', default_value = "")]
        role: String,
    },

    /// Remove a stakeholder column
    RemoveStakeholder {
        /// Stakeholder name, ID or ID prefix
        stakeholder: String,

        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Set one cell to R, A, C or I
    Assign {
        task: String,

        stakeholder: String,

        role: RaciRole,
    },

    /// Clear one cell
    Clear {
        task: String,

        stakeholder: String,
    },

    /// Check every task has one Accountable and at least one Responsible
    Validate,
}

pub fn run(cmd: RaciCommands, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let ctx = session.project()?;
    let mut raci = ctx.load_raci(&session.store);

    match cmd {
        RaciCommands::Show => show(&raci, session.format()),

        RaciCommands::AddTask { name } => {
            let name = name.trim();
            if name.is_empty() {
                return Err(miette::miette!("task name cannot be empty"));
            }
            raci.add_task(name);
            let written = session.save(&ctx, ToolKey::Raci, &raci);
            report_saved(global, written, format!("Added task {}", style(name).cyan()))
        }

        RaciCommands::RemoveTask { task, yes } => {
            let index = pick_named(&raci.tasks, &task, |t| &t.name)?;
            let prompt = format!("Remove task '{}'?", raci.tasks[index].name);
            if !confirm(&prompt, yes)? {
                println!("Cancelled.");
                return Ok(());
            }
            let id = raci.tasks[index].id.clone();
            let removed = raci
                .remove_task(&id)
                .ok_or_else(|| miette::miette!("no task matches '{}'", task))?;
            let written = session.save(&ctx, ToolKey::Raci, &raci);
            report_saved(global, written, format!("Removed task {}", style(removed.name).cyan()))
        }

        RaciCommands::AddStakeholder { name, role } => {
            let name = name.trim();
            if name.is_empty() {
                return Err(miette::miette!("stakeholder name cannot be empty"));
            }
            raci.add_stakeholder(name, role.trim());
            let written = session.save(&ctx, ToolKey::Raci, &raci);
            report_saved(global, written, format!("Added stakeholder {}", style(name).cyan()))
        }

        RaciCommands::RemoveStakeholder { stakeholder, yes } => {
            let index = pick_named(&raci.stakeholders, &stakeholder, |s| &s.name)?;
            let prompt = format!("Remove stakeholder '{}'?", raci.stakeholders[index].name);
            if !confirm(&prompt, yes)? {
                println!("Cancelled.");
                return Ok(());
            }
            let id = raci.stakeholders[index].id.clone();
            let removed = raci
                .remove_stakeholder(&id)
                .ok_or_else(|| miette::miette!("no stakeholder matches '{}'", stakeholder))?;
            let written = session.save(&ctx, ToolKey::Raci, &raci);
            report_saved(
                global,
                written,
                format!("Removed stakeholder {}", style(removed.name).cyan()),
            )
        }

        RaciCommands::Assign {
            task,
            stakeholder,
            role,
        } => {
            let (task_id, stakeholder_id) = cell(&raci, &task, &stakeholder)?;
            raci.assign(&task_id, &stakeholder_id, Some(role));
            let written = session.save(&ctx, ToolKey::Raci, &raci);
            report_saved(
                global,
                written,
                format!("{} is {} for {}", stakeholder, role.description(), task),
            )?;
            print_warnings_for(&raci, &task_id, global);
            Ok(())
        }

        RaciCommands::Clear { task, stakeholder } => {
            let (task_id, stakeholder_id) = cell(&raci, &task, &stakeholder)?;
            raci.assign(&task_id, &stakeholder_id, None);
            let written = session.save(&ctx, ToolKey::Raci, &raci);
            report_saved(global, written, format!("Cleared {} / {}", task, stakeholder))
        }

        RaciCommands::Validate => {
            let warnings = raci.validate();
            if warnings.is_empty() {
                println!("{} RACI matrix is consistent", style("✓").green());
                return Ok(());
            }
            for warning in &warnings {
                println!("{} {}", style("!").yellow(), warning);
            }
            println!();
            println!("{} warning(s)", style(warnings.len()).yellow());
            Ok(())
        }
    }
}

/// Tasks and stakeholders are addressed by name first, then by id
fn pick_named<T: Record>(records: &[T], query: &str, name: impl Fn(&T) -> &String) -> Result<usize> {
    if let Some(index) = records.iter().position(|r| names_match(name(r), query)) {
        return Ok(index);
    }
    pick_index(records, query)
}

fn cell(raci: &RaciMatrix, task: &str, stakeholder: &str) -> Result<(String, String)> {
    let t = pick_named(&raci.tasks, task, |t| &t.name)?;
    let s = pick_named(&raci.stakeholders, stakeholder, |s| &s.name)?;
    Ok((raci.tasks[t].id.clone(), raci.stakeholders[s].id.clone()))
}

fn print_warnings_for(raci: &RaciMatrix, task_id: &str, global: &GlobalOpts) {
    if global.quiet {
        return;
    }
    let Some(task) = raci.tasks.iter().find(|t| t.id == task_id) else {
        return;
    };
    for warning in raci.validate() {
        let name = match &warning {
            RaciWarning::NoAccountable { task }
            | RaciWarning::MultipleAccountable { task, .. }
            | RaciWarning::NoResponsible { task } => task,
        };
        if *name == task.name {
            println!("  {} {}", style("!").yellow(), warning);
        }
    }
}

fn show(raci: &RaciMatrix, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(raci).into_diagnostic()?);
            return Ok(());
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(raci).into_diagnostic()?);
            return Ok(());
        }
        OutputFormat::Csv => {
            let csv = crate::export::raci_to_csv(raci).map_err(|e| miette::miette!("{}", e))?;
            print!("{}", csv);
            return Ok(());
        }
        _ => {}
    }

    if raci.tasks.is_empty() {
        println!("No RACI tasks found. Add one with: awb raci add-task <NAME>");
        return Ok(());
    }

    let mut headers = vec!["TASK".to_string()];
    headers.extend(raci.stakeholders.iter().map(|s| {
        if s.role.is_empty() {
            s.name.clone()
        } else {
            format!("{} ({})", s.name, s.role)
        }
    }));
    let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();

    let rows = raci.tasks.iter().map(|task| {
        let mut row = vec![task.name.clone()];
        row.extend(raci.stakeholders.iter().map(|s| {
            raci.role(&task.id, &s.id)
                .map(|r| r.to_string())
                .unwrap_or_default()
        }));
        row
    });
    print_table(format, &header_refs, rows);

    let warnings = raci.validate();
    if !warnings.is_empty() {
        println!();
        for warning in warnings {
            println!("{} {}", style("!").yellow(), warning);
        }
    }
    Ok(())
}
