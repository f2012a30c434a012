//! `awb sprint` command - Sprint lifecycle, board and capacity planner

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{
    confirm, field, or_dash, parse_date, pick, pick_sprint, print_detail, print_list,
    print_table, report_saved, truncate_str, Session,
};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::refs::{resolve_name, resolve_opt, NameResolution, Resolution};
use crate::core::scope::ProjectContext;
use crate::core::tool::ToolKey;
use crate::entities::sprint::{
    delete_sprint, other_active, BoardItem, Column, CommentType, PlannerItem, Sprint,
};
use crate::entities::story::Story;
use crate::entities::team::{CapacityReport, TeamMember, Workload};

#[derive(Subcommand, Debug)]
pub enum SprintCommands {
    /// Create a sprint
    New {
        /// Sprint name
        name: String,

        #[arg(long, short = 'g', default_value = "")]
        goal: String,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,
    },

    /// List sprints
    List,

    /// Show a sprint board grouped by column
    Show {
        /// Sprint name, ID or ID prefix (default: current sprint)
        sprint: Option<String>,
    },

    /// Start a planned sprint
    Start {
        sprint: Option<String>,
    },

    /// Complete a sprint; its board becomes read-only
    Complete {
        sprint: Option<String>,
    },

    /// Delete a sprint (a fresh "Sprint 1" replaces the last one)
    Delete {
        sprint: String,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Put a story, or a free-text item, on the board
    Add {
        /// Story ID or ID prefix
        #[arg(long, conflicts_with = "text", required_unless_present = "text")]
        story: Option<String>,

        /// Title for an item with no story
        #[arg(long)]
        text: Option<String>,

        /// Story points for a free-text item
        #[arg(long, default_value_t = 0)]
        points: u32,

        #[arg(long, short = 'S')]
        sprint: Option<String>,
    },

    /// Remove an item from the board
    Remove {
        /// Board item ID or ID prefix
        item: String,

        #[arg(long, short = 'S')]
        sprint: Option<String>,
    },

    /// Move a board item to another column (updates the linked story's status)
    Move {
        /// Board item ID or ID prefix
        item: String,

        /// backlog, todo, in-progress, review or done
        column: Column,

        #[arg(long, short = 'S')]
        sprint: Option<String>,
    },

    /// Assign a board item to a person (empty string clears)
    Assign {
        item: String,

        assignee: String,

        #[arg(long, short = 'S')]
        sprint: Option<String>,
    },

    /// Comment on a board item
    Comment {
        item: String,

        text: String,

        /// Record the comment as AI-generated
        #[arg(long)]
        ai: bool,

        #[arg(long, short = 'S')]
        sprint: Option<String>,
    },

    /// Attach or clear a suggested solution on a board item
    Solution {
        item: String,

        /// Solution text (omit with --clear)
        #[arg(required_unless_present = "clear")]
        text: Option<String>,

        #[arg(long)]
        clear: bool,

        #[arg(long, short = 'S')]
        sprint: Option<String>,
    },

    /// Capacity planner backlog for a sprint
    #[command(subcommand)]
    Plan(PlanCommands),

    /// Story points per assignee on the board
    Workload {
        sprint: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum PlanCommands {
    /// List the planner backlog
    List {
        #[arg(long, short = 'S')]
        sprint: Option<String>,
    },

    /// Add a planner item from a story or a title
    Add {
        /// Story ID or ID prefix
        #[arg(long, conflicts_with = "title", required_unless_present = "title")]
        story: Option<String>,

        #[arg(long)]
        title: Option<String>,

        #[arg(long, default_value_t = 0)]
        points: u32,

        /// Estimated hours (default: points x hours per point)
        #[arg(long)]
        hours: Option<f64>,

        #[arg(long, short = 'S')]
        sprint: Option<String>,
    },

    /// Remove a planner item
    Remove {
        item: String,

        #[arg(long, short = 'S')]
        sprint: Option<String>,
    },

    /// Mark a planner item as committed
    Commit {
        item: String,

        #[arg(long, short = 'S')]
        sprint: Option<String>,
    },

    /// Clear the committed mark
    Uncommit {
        item: String,

        #[arg(long, short = 'S')]
        sprint: Option<String>,
    },

    /// Copy committed planner items onto the board
    Import {
        #[arg(long, short = 'S')]
        sprint: Option<String>,
    },

    /// Team capacity against committed work
    Capacity {
        #[arg(long, short = 'S')]
        sprint: Option<String>,
    },
}

fn sprint_error(e: impl std::fmt::Display) -> miette::Report {
    miette::miette!("{}", e)
}

pub fn run(cmd: SprintCommands, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let ctx = session.project()?;
    let mut sprints = session.sprints(&ctx);

    match cmd {
        SprintCommands::New {
            name,
            goal,
            start,
            end,
        } => {
            if name.trim().is_empty() {
                return Err(miette::miette!("sprint name cannot be empty"));
            }
            let mut sprint = Sprint::new(name.trim());
            sprint.goal = goal;
            sprint.start_date = start.as_deref().map(parse_date).transpose()?;
            sprint.end_date = end.as_deref().map(parse_date).transpose()?;
            if let (Some(s), Some(e)) = (sprint.start_date, sprint.end_date) {
                if e < s {
                    return Err(miette::miette!("end date {} is before start date {}", e, s));
                }
            }
            let id = sprint.id.clone();
            sprints.push(sprint);
            let written = session.save(&ctx, ToolKey::Sprints, &sprints);
            if session.format() == OutputFormat::Id {
                println!("{}", id);
                return Ok(());
            }
            report_saved(global, written, format!("Created sprint {} ({})", style(name.trim()).cyan(), id))
        }

        SprintCommands::List => print_list(
            session.format(),
            &sprints,
            &["ID", "NAME", "STATUS", "START", "END", "ITEMS", "POINTS", "DONE"],
            "No sprints found.",
            |s: &Sprint| {
                vec![
                    s.id.clone(),
                    s.name.clone(),
                    s.status.to_string(),
                    s.start_date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
                    s.end_date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
                    s.items.len().to_string(),
                    s.total_points().to_string(),
                    s.done_points().to_string(),
                ]
            },
        ),

        SprintCommands::Show { sprint } => {
            let sprint = &sprints[pick_sprint(&sprints, sprint.as_deref())?];
            let stories: Vec<Story> = session.load(&ctx, ToolKey::Stories);
            print_detail(session.format(), sprint, || show_board(sprint, &stories))
        }

        SprintCommands::Start { sprint } => {
            let index = pick_sprint(&sprints, sprint.as_deref())?;
            sprints[index].start().map_err(sprint_error)?;
            let others: Vec<String> = other_active(&sprints, &sprints[index].id)
                .iter()
                .map(|s| s.name.clone())
                .collect();
            if !others.is_empty() && !global.quiet {
                println!(
                    "{} other active sprint(s): {}",
                    style("!").yellow(),
                    others.join(", ")
                );
            }
            let name = sprints[index].name.clone();
            let written = session.save(&ctx, ToolKey::Sprints, &sprints);
            report_saved(global, written, format!("Started sprint {}", style(name).cyan()))
        }

        SprintCommands::Complete { sprint } => {
            let index = pick_sprint(&sprints, sprint.as_deref())?;
            sprints[index].complete().map_err(sprint_error)?;
            let name = sprints[index].name.clone();
            let written = session.save(&ctx, ToolKey::Sprints, &sprints);
            report_saved(global, written, format!("Completed sprint {}", style(name).cyan()))
        }

        SprintCommands::Delete { sprint, yes } => {
            let index = pick_sprint(&sprints, Some(&sprint))?;
            let id = sprints[index].id.clone();
            let prompt = format!(
                "Delete sprint '{}' and its {} board item(s)?",
                sprints[index].name,
                sprints[index].items.len()
            );
            if !confirm(&prompt, yes)? {
                println!("Cancelled.");
                return Ok(());
            }
            let removed = delete_sprint(&mut sprints, &id)
                .ok_or_else(|| miette::miette!("no sprint matches '{}'", sprint))?;
            let written = session.save(&ctx, ToolKey::Sprints, &sprints);
            report_saved(global, written, format!("Deleted sprint {}", style(removed.name).cyan()))
        }

        SprintCommands::Add {
            story,
            text,
            points,
            sprint,
        } => {
            let index = pick_sprint(&sprints, sprint.as_deref())?;
            let item = match (story, text) {
                (Some(query), _) => {
                    let stories: Vec<Story> = session.load(&ctx, ToolKey::Stories);
                    let story = pick(&stories, &query)?;
                    let on_board = sprints[index]
                        .items
                        .iter()
                        .any(|i| i.story_id.as_ref().map(|r| r.id()) == Some(story.id.as_str()));
                    if on_board {
                        return Err(miette::miette!(
                            "{} is already on the {} board",
                            story.id,
                            sprints[index].name
                        ));
                    }
                    BoardItem::from_story(story)
                }
                (None, Some(text)) => {
                    if text.trim().is_empty() {
                        return Err(miette::miette!("item text cannot be empty"));
                    }
                    BoardItem::from_text(text.trim(), points)
                }
                (None, None) => return Err(miette::miette!("pass --story or --text")),
            };
            let column = item.column;
            let id = sprints[index].add_item(item).map_err(sprint_error)?;
            let written = session.save(&ctx, ToolKey::Sprints, &sprints);
            if session.format() == OutputFormat::Id {
                println!("{}", id);
                return Ok(());
            }
            report_saved(
                global,
                written,
                format!("Added {} to {} ({})", style(&id).cyan(), sprints[index].name, column),
            )
        }

        SprintCommands::Remove { item, sprint } => {
            let index = pick_sprint(&sprints, sprint.as_deref())?;
            let item_id = pick(&sprints[index].items, &item)?.id.clone();
            sprints[index].remove_item(&item_id).map_err(sprint_error)?;
            let written = session.save(&ctx, ToolKey::Sprints, &sprints);
            report_saved(global, written, format!("Removed {} from the board", style(item_id).cyan()))
        }

        SprintCommands::Move {
            item,
            column,
            sprint,
        } => {
            let index = pick_sprint(&sprints, sprint.as_deref())?;
            let item_id = pick(&sprints[index].items, &item)?.id.clone();
            let mut stories: Vec<Story> = session.load(&ctx, ToolKey::Stories);
            let synced = sprints[index]
                .move_item(&item_id, column, &mut stories)
                .map_err(sprint_error)?;

            let mut written = session.save(&ctx, ToolKey::Sprints, &sprints);
            if synced.is_some() {
                written &= session.save(&ctx, ToolKey::Stories, &stories);
            }
            let message = match synced {
                Some(status) => format!(
                    "Moved {} to {} (story is now {})",
                    style(&item_id).cyan(),
                    column,
                    status
                ),
                None => format!("Moved {} to {}", style(&item_id).cyan(), column),
            };
            report_saved(global, written, message)
        }

        SprintCommands::Assign {
            item,
            assignee,
            sprint,
        } => {
            let index = pick_sprint(&sprints, sprint.as_deref())?;
            let item_id = pick(&sprints[index].items, &item)?.id.clone();
            sprints[index].assign(&item_id, &assignee).map_err(sprint_error)?;

            let roster: Vec<TeamMember> = session.load(&ctx, ToolKey::Team);
            if let NameResolution::Unlinked(name) = resolve_name(&assignee, &roster) {
                if !global.quiet {
                    println!("{} '{}' is not on the team roster", style("!").yellow(), name);
                }
            }
            let written = session.save(&ctx, ToolKey::Sprints, &sprints);
            let message = if assignee.trim().is_empty() {
                format!("Unassigned {}", style(&item_id).cyan())
            } else {
                format!("Assigned {} to {}", style(&item_id).cyan(), assignee.trim())
            };
            report_saved(global, written, message)
        }

        SprintCommands::Comment {
            item,
            text,
            ai,
            sprint,
        } => {
            if text.trim().is_empty() {
                return Err(miette::miette!("comment text cannot be empty"));
            }
            let index = pick_sprint(&sprints, sprint.as_deref())?;
            let item_id = pick(&sprints[index].items, &item)?.id.clone();
            let kind = if ai { CommentType::Ai } else { CommentType::User };
            sprints[index]
                .add_comment(&item_id, kind, text.trim())
                .map_err(sprint_error)?;
            let written = session.save(&ctx, ToolKey::Sprints, &sprints);
            report_saved(global, written, format!("Commented on {}", style(item_id).cyan()))
        }

        SprintCommands::Solution {
            item,
            text,
            clear,
            sprint,
        } => {
            let index = pick_sprint(&sprints, sprint.as_deref())?;
            let item_id = pick(&sprints[index].items, &item)?.id.clone();
            let solution = if clear { None } else { text };
            sprints[index]
                .set_ai_solution(&item_id, solution)
                .map_err(sprint_error)?;
            let written = session.save(&ctx, ToolKey::Sprints, &sprints);
            report_saved(global, written, format!("Updated solution on {}", style(item_id).cyan()))
        }

        SprintCommands::Plan(cmd) => run_plan(cmd, &mut session, &ctx, sprints, global),

        SprintCommands::Workload { sprint } => {
            let sprint = &sprints[pick_sprint(&sprints, sprint.as_deref())?];
            let roster: Vec<TeamMember> = session.load(&ctx, ToolKey::Team);
            let workload = Workload::build(sprint, &roster);

            println!("{} {}", style("Workload").bold(), style(&sprint.name).cyan());
            if workload.assignees.is_empty() && workload.unassigned_points == 0 {
                println!("No points on the board.");
                return Ok(());
            }
            let mut rows: Vec<Vec<String>> = workload
                .assignees
                .iter()
                .map(|(name, points, linked)| {
                    vec![
                        name.clone(),
                        points.to_string(),
                        if *linked { "yes" } else { "no" }.to_string(),
                    ]
                })
                .collect();
            rows.push(vec![
                "(unassigned)".to_string(),
                workload.unassigned_points.to_string(),
                "-".to_string(),
            ]);
            print_table(session.format(), &["ASSIGNEE", "POINTS", "ON ROSTER"], rows.into_iter());
            Ok(())
        }
    }
}

fn run_plan(
    cmd: PlanCommands,
    session: &mut Session,
    ctx: &ProjectContext,
    mut sprints: Vec<Sprint>,
    global: &GlobalOpts,
) -> Result<()> {
    match cmd {
        PlanCommands::List { sprint } => {
            let sprint = &sprints[pick_sprint(&sprints, sprint.as_deref())?];
            let config = ctx.load_sprint_config(&session.store);
            print_list(
                session.format(),
                &sprint.planner_backlog,
                &["ID", "TITLE", "PTS", "HOURS", "COMMITTED"],
                "Planner backlog is empty. Add items with: awb sprint plan add",
                |p: &PlannerItem| {
                    vec![
                        p.id.clone(),
                        truncate_str(&p.title, 50),
                        p.story_points.to_string(),
                        format!("{:.1}", p.hours(config.hours_per_point)),
                        if p.committed { "yes" } else { "" }.to_string(),
                    ]
                },
            )
        }

        PlanCommands::Add {
            story,
            title,
            points,
            hours,
            sprint,
        } => {
            let index = pick_sprint(&sprints, sprint.as_deref())?;
            let item = match (story, title) {
                (Some(query), _) => {
                    let stories: Vec<Story> = session.load(ctx, ToolKey::Stories);
                    PlannerItem::from_story(pick(&stories, &query)?, hours)
                }
                (None, Some(title)) => {
                    if title.trim().is_empty() {
                        return Err(miette::miette!("planner item title cannot be empty"));
                    }
                    PlannerItem::new(title.trim(), points, hours)
                }
                (None, None) => return Err(miette::miette!("pass --story or --title")),
            };
            let id = sprints[index].add_planner_item(item).map_err(sprint_error)?;
            let written = session.save(ctx, ToolKey::Sprints, &sprints);
            if session.format() == OutputFormat::Id {
                println!("{}", id);
                return Ok(());
            }
            report_saved(global, written, format!("Added planner item {}", style(id).cyan()))
        }

        PlanCommands::Remove { item, sprint } => {
            let index = pick_sprint(&sprints, sprint.as_deref())?;
            let item_id = pick(&sprints[index].planner_backlog, &item)?.id.clone();
            sprints[index].remove_planner_item(&item_id).map_err(sprint_error)?;
            let written = session.save(ctx, ToolKey::Sprints, &sprints);
            report_saved(global, written, format!("Removed planner item {}", style(item_id).cyan()))
        }

        PlanCommands::Commit { item, sprint } => {
            set_committed(&item, sprint.as_deref(), true, session, ctx, sprints, global)
        }

        PlanCommands::Uncommit { item, sprint } => {
            set_committed(&item, sprint.as_deref(), false, session, ctx, sprints, global)
        }

        PlanCommands::Import { sprint } => {
            let index = pick_sprint(&sprints, sprint.as_deref())?;
            let stories: Vec<Story> = session.load(ctx, ToolKey::Stories);
            let report = sprints[index].import_committed(&stories).map_err(sprint_error)?;
            let written = session.save(ctx, ToolKey::Sprints, &sprints);
            report_saved(
                global,
                written,
                format!(
                    "Imported {} item(s) onto {} ({} already on the board)",
                    report.imported.len(),
                    style(&sprints[index].name).cyan(),
                    report.skipped.len()
                ),
            )
        }

        PlanCommands::Capacity { sprint } => {
            let sprint = &sprints[pick_sprint(&sprints, sprint.as_deref())?];
            let roster: Vec<TeamMember> = session.load(ctx, ToolKey::Team);
            let config = ctx.load_sprint_config(&session.store);
            let report = CapacityReport::build(&roster, &config, sprint);

            println!("{} {}", style("Capacity").bold(), style(&sprint.name).cyan());
            field("Sprint days", config.sprint_days);
            field("Focus factor", config.focus_factor);
            field("Hours/point", config.hours_per_point);
            println!();
            if report.members.is_empty() {
                println!("No team members. Add some with: awb team add <NAME>");
            } else {
                print_table(
                    session.format(),
                    &["MEMBER", "DAYS", "HOURS"],
                    report.members.iter().map(|m| {
                        vec![
                            m.name.clone(),
                            format!("{:.1}", m.available_days),
                            format!("{:.1}", m.hours),
                        ]
                    }),
                );
            }
            println!();
            field("Capacity", format!("{:.1} h", report.total_hours));
            field(
                "Committed",
                format!("{:.1} h ({} pts)", report.committed_hours, report.committed_points),
            );
            field("Backlog", format!("{:.1} h", report.backlog_hours));
            match report.utilization() {
                Some(pct) if report.is_overcommitted() => field(
                    "Utilization",
                    style(format!("{:.0}% (over capacity)", pct)).red(),
                ),
                Some(pct) => field("Utilization", style(format!("{:.0}%", pct)).green()),
                None => field("Utilization", "-"),
            }
            Ok(())
        }
    }
}

fn set_committed(
    item: &str,
    sprint: Option<&str>,
    committed: bool,
    session: &mut Session,
    ctx: &ProjectContext,
    mut sprints: Vec<Sprint>,
    global: &GlobalOpts,
) -> Result<()> {
    let index = pick_sprint(&sprints, sprint)?;
    let item_id = pick(&sprints[index].planner_backlog, item)?.id.clone();
    sprints[index]
        .set_committed(&item_id, committed)
        .map_err(sprint_error)?;
    let written = session.save(ctx, ToolKey::Sprints, &sprints);
    let verb = if committed { "Committed" } else { "Uncommitted" };
    report_saved(global, written, format!("{} {}", verb, style(item_id).cyan()))
}

fn show_board(sprint: &Sprint, stories: &[Story]) {
    println!("{} {}", style(&sprint.name).bold(), style(&sprint.id).dim());
    field("Status", sprint.status);
    field("Goal", or_dash(&sprint.goal));
    let dates = match (sprint.start_date, sprint.end_date) {
        (None, None) => "-".to_string(),
        (s, e) => format!(
            "{} → {}",
            s.map(|d| d.to_string()).unwrap_or_else(|| "?".to_string()),
            e.map(|d| d.to_string()).unwrap_or_else(|| "?".to_string())
        ),
    };
    field("Dates", dates);
    field(
        "Points",
        format!("{}/{} done", sprint.done_points(), sprint.total_points()),
    );

    for column in Column::all() {
        let items: Vec<&BoardItem> = sprint.items_in(*column).collect();
        println!();
        println!(
            "{} ({})",
            style(column.to_string().to_uppercase()).bold(),
            items.len()
        );
        for item in items {
            let story_note = match resolve_opt(item.story_id.as_ref(), stories) {
                Some(Resolution::Dangling(id)) => {
                    format!(" {}", style(format!("[{} (not found)]", id)).yellow())
                }
                _ => String::new(),
            };
            let assignee = if item.assignee.is_empty() {
                String::new()
            } else {
                format!(" @{}", item.assignee)
            };
            println!(
                "  {} {} ({} pts){}{}",
                style(&item.id).cyan(),
                truncate_str(&item.title(), 60),
                item.story_points,
                assignee,
                story_note
            );
        }
    }
}
