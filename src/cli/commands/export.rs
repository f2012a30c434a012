//! `awb export` command - CSV and Markdown projections

use clap::{Subcommand, ValueEnum};
use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::helpers::{pick_index, pick_sprint, write_output, Session};
use crate::cli::GlobalOpts;
use crate::core::scope::ProjectContext;
use crate::core::tool::ToolKey;
use crate::entities::decision::{sort_newest_first, Decision};
use crate::entities::epic::Epic;
use crate::entities::project::DocKind;
use crate::entities::retro::{ActionItem, RetroSession};
use crate::entities::risk::Risk;
use crate::entities::sprint::Sprint;
use crate::entities::story::{sort_by_order, Story};
use crate::entities::team::TeamMember;
use crate::export::{raci_to_csv, to_csv, MarkdownRenderer};

#[derive(Subcommand, Debug)]
pub enum ExportCommands {
    /// Export one collection of the active project as CSV
    Csv {
        collection: Collection,

        /// Sprint for board and planner exports (default: current sprint)
        #[arg(long, short = 'S')]
        sprint: Option<String>,

        /// Write to a file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Export the PRD or BRD as Markdown
    Doc {
        kind: DocKind,

        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Export a retro session as Markdown
    Retro {
        /// Retro ID or ID prefix (default: latest)
        retro: Option<String>,

        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Export the decision log as Markdown
    Decisions {
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collection {
    Epics,
    Stories,
    Board,
    Planner,
    Team,
    Actions,
    Decisions,
    Risks,
    Raci,
}

pub fn run(cmd: ExportCommands, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let ctx = session.project()?;

    let (content, output) = match cmd {
        ExportCommands::Csv {
            collection,
            sprint,
            output,
        } => (export_csv(&mut session, &ctx, collection, sprint.as_deref())?, output),

        ExportCommands::Doc { kind, output } => {
            let project = session.active_project()?;
            let renderer = renderer()?;
            let md = renderer
                .render_doc(&project, kind)
                .map_err(|e| miette::miette!("{}", e))?;
            (md, output)
        }

        ExportCommands::Retro { retro, output } => {
            let project = session.active_project()?;
            let retros: Vec<RetroSession> = session.load(&ctx, ToolKey::Retros);
            let index = match retro {
                Some(q) => pick_index(&retros, &q)?,
                None => latest_retro(&retros)?,
            };
            let sprints: Vec<Sprint> = session.load(&ctx, ToolKey::Sprints);
            let md = renderer()?
                .render_retro(&project, &retros[index], &sprints)
                .map_err(|e| miette::miette!("{}", e))?;
            (md, output)
        }

        ExportCommands::Decisions { output } => {
            let project = session.active_project()?;
            let mut decisions: Vec<Decision> = session.load(&ctx, ToolKey::Decisions);
            sort_newest_first(&mut decisions);
            let sprints: Vec<Sprint> = session.load(&ctx, ToolKey::Sprints);
            let md = renderer()?
                .render_decisions(&project, &decisions, &sprints)
                .map_err(|e| miette::miette!("{}", e))?;
            (md, output)
        }
    };

    write_output(output.as_deref(), &content)?;
    if let Some(path) = output {
        if !global.quiet {
            eprintln!("{} Wrote {}", style("✓").green(), style(path.display()).cyan());
        }
    }
    Ok(())
}

fn renderer() -> Result<MarkdownRenderer> {
    MarkdownRenderer::new().map_err(|e| miette::miette!("{}", e))
}

fn latest_retro(retros: &[RetroSession]) -> Result<usize> {
    retros
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)))
        .map(|(i, _)| i)
        .ok_or_else(|| miette::miette!("no retros to export"))
}

fn export_csv(
    session: &mut Session,
    ctx: &ProjectContext,
    collection: Collection,
    sprint: Option<&str>,
) -> Result<String> {
    let csv = match collection {
        Collection::Epics => to_csv(&session.load::<Epic>(ctx, ToolKey::Epics)),
        Collection::Stories => {
            let mut stories: Vec<Story> = session.load(ctx, ToolKey::Stories);
            sort_by_order(&mut stories);
            to_csv(&stories)
        }
        Collection::Board | Collection::Planner => {
            let sprints = session.sprints(ctx);
            let sprint = &sprints[pick_sprint(&sprints, sprint)?];
            if collection == Collection::Board {
                to_csv(&sprint.items)
            } else {
                to_csv(&sprint.planner_backlog)
            }
        }
        Collection::Team => to_csv(&session.load::<TeamMember>(ctx, ToolKey::Team)),
        Collection::Actions => {
            let retros: Vec<RetroSession> = session.load(ctx, ToolKey::Retros);
            let actions: Vec<ActionItem> = retros
                .into_iter()
                .flat_map(|r| r.action_items)
                .collect();
            to_csv(&actions)
        }
        Collection::Decisions => {
            let mut decisions: Vec<Decision> = session.load(ctx, ToolKey::Decisions);
            sort_newest_first(&mut decisions);
            to_csv(&decisions)
        }
        Collection::Risks => to_csv(&session.load::<Risk>(ctx, ToolKey::Risks)),
        Collection::Raci => raci_to_csv(&ctx.load_raci(&session.store)),
    };
    csv.map_err(|e| miette::miette!("{}", e))
}
