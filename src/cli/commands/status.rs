//! `awb status` command - Project dashboard

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::helpers::{field, Session};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::refs::{find_dangling, DanglingRef};
use crate::core::tool::ToolKey;
use crate::entities::decision::{Decision, DecisionStatus};
use crate::entities::epic::Epic;
use crate::entities::retro::RetroSession;
use crate::entities::risk::{Risk, RiskLevel};
use crate::entities::sprint::current_sprint;
use crate::entities::story::{Story, StoryStatus};
use crate::entities::team::{CapacityReport, TeamMember};

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    /// Show every dangling reference instead of a count
    #[arg(long)]
    pub detailed: bool,
}

#[derive(Serialize)]
struct StatusSummary {
    project_id: String,
    project_name: String,
    epics: usize,
    stories: usize,
    stories_done: usize,
    story_points: u32,
    current_sprint: Option<SprintSummary>,
    team_members: usize,
    open_risks: usize,
    high_risks: usize,
    open_actions: usize,
    active_decisions: usize,
    raci_warnings: Vec<String>,
    dangling_refs: Vec<String>,
}

#[derive(Serialize)]
struct SprintSummary {
    id: String,
    name: String,
    status: String,
    items: usize,
    points: u32,
    done_points: u32,
    capacity_hours: f64,
    committed_hours: f64,
}

pub fn run(args: StatusArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let ctx = session.project()?;
    let project = session.active_project()?;

    let epics: Vec<Epic> = session.load(&ctx, ToolKey::Epics);
    let stories: Vec<Story> = session.load(&ctx, ToolKey::Stories);
    let sprints = ctx.load_sprints(&session.store);
    let team: Vec<TeamMember> = session.load(&ctx, ToolKey::Team);
    let retros: Vec<RetroSession> = session.load(&ctx, ToolKey::Retros);
    let decisions: Vec<Decision> = session.load(&ctx, ToolKey::Decisions);
    let risks: Vec<Risk> = session.load(&ctx, ToolKey::Risks);
    let raci = ctx.load_raci(&session.store);
    let config = ctx.load_sprint_config(&session.store);

    let dangling: Vec<DanglingRef> = find_dangling(&epics, &stories, &sprints, &retros, &decisions);

    let summary = StatusSummary {
        project_id: project.id.clone(),
        project_name: project.project_name.clone(),
        epics: epics.len(),
        stories: stories.len(),
        stories_done: stories.iter().filter(|s| s.status == StoryStatus::Done).count(),
        story_points: stories
            .iter()
            .map(|s| s.story_points)
            .fold(0, u32::saturating_add),
        current_sprint: current_sprint(&sprints).map(|sprint| {
            let capacity = CapacityReport::build(&team, &config, sprint);
            SprintSummary {
                id: sprint.id.clone(),
                name: sprint.name.clone(),
                status: sprint.status.to_string(),
                items: sprint.items.len(),
                points: sprint.total_points(),
                done_points: sprint.done_points(),
                capacity_hours: capacity.total_hours,
                committed_hours: capacity.committed_hours,
            }
        }),
        team_members: team.len(),
        open_risks: risks.iter().filter(|r| r.is_open()).count(),
        high_risks: risks
            .iter()
            .filter(|r| r.is_open() && r.level() >= RiskLevel::High)
            .count(),
        open_actions: retros.iter().map(RetroSession::open_actions).sum(),
        active_decisions: decisions
            .iter()
            .filter(|d| d.status == DecisionStatus::Active)
            .count(),
        raci_warnings: raci.validate().iter().map(|w| w.to_string()).collect(),
        dangling_refs: dangling.iter().map(|d| d.to_string()).collect(),
    };

    match session.format() {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary).into_diagnostic()?);
            return Ok(());
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&summary).into_diagnostic()?);
            return Ok(());
        }
        _ => {}
    }

    println!("{} {}", style(&summary.project_name).bold(), style(&summary.project_id).dim());
    println!("{}", style("─".repeat(48)).dim());

    field("Epics", summary.epics);
    field(
        "Stories",
        format!(
            "{} ({} done, {} pts)",
            summary.stories, summary.stories_done, summary.story_points
        ),
    );
    field("Team", format!("{} member(s)", summary.team_members));

    if let Some(sprint) = &summary.current_sprint {
        println!();
        println!("{} {} [{}]", style("Sprint").bold(), style(&sprint.name).cyan(), sprint.status);
        field(
            "Board",
            format!(
                "{} item(s), {}/{} pts done",
                sprint.items, sprint.done_points, sprint.points
            ),
        );
        let capacity = format!(
            "{:.1} h committed of {:.1} h",
            sprint.committed_hours, sprint.capacity_hours
        );
        if sprint.committed_hours > sprint.capacity_hours {
            field("Capacity", style(format!("{} (over capacity)", capacity)).red());
        } else {
            field("Capacity", capacity);
        }
    }

    println!();
    let risk_line = format!("{} open ({} high or critical)", summary.open_risks, summary.high_risks);
    if summary.high_risks > 0 {
        field("Risks", style(risk_line).yellow());
    } else {
        field("Risks", risk_line);
    }
    field("Actions", format!("{} open retro action(s)", summary.open_actions));
    field("Decisions", format!("{} active", summary.active_decisions));

    if !summary.raci_warnings.is_empty() {
        println!();
        println!("{}", style("RACI").bold());
        for warning in &summary.raci_warnings {
            println!("  {} {}", style("!").yellow(), warning);
        }
    }

    println!();
    if summary.dangling_refs.is_empty() {
        println!("{} All references resolve", style("✓").green());
    } else if args.detailed {
        println!("{}", style("Dangling references").bold());
        for reference in &summary.dangling_refs {
            println!("  {} {}", style("!").yellow(), reference);
        }
    } else {
        println!(
            "{} {} dangling reference(s); run with --detailed to list them",
            style("!").yellow(),
            summary.dangling_refs.len()
        );
    }

    Ok(())
}
