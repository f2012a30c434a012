//! `awb story` command - User stories and backlog ordering

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{
    confirm, field, pick_index, print_detail, print_list, report_saved, split_list, truncate_str,
    Session,
};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::refs::EpicIndex;
use crate::core::tool::ToolKey;
use crate::entities::epic::Epic;
use crate::entities::sprint::Sprint;
use crate::entities::story::{move_story, sort_by_order, Story, StoryDraft, StoryPriority, StoryStatus};

#[derive(Subcommand, Debug)]
pub enum StoryCommands {
    /// Create a story: "As a <role>, I want <action>, so that <benefit>"
    New {
        #[arg(long, short = 'r')]
        role: String,

        #[arg(long, short = 'a')]
        action: String,

        #[arg(long, short = 'b', default_value = "")]
        benefit: String,

        /// Acceptance criteria, separated by ';'
        #[arg(long, short = 'c', default_value = "")]
        criteria: String,

        #[arg(long, default_value_t = 0)]
        points: u32,

        /// MoSCoW priority: must, should, could, wont
        #[arg(long, short = 'p', default_value = "should")]
        priority: StoryPriority,

        /// Link the new story to this epic
        #[arg(long, short = 'e')]
        epic: Option<String>,
    },

    /// List stories in backlog order
    List {
        #[arg(long, short = 's')]
        status: Option<StoryStatus>,

        /// Only stories linked to this epic
        #[arg(long, short = 'e')]
        epic: Option<String>,
    },

    /// Show a story with its epics and board placements
    Show {
        /// Story ID or ID prefix
        story: String,
    },

    /// Edit story fields
    Edit {
        /// Story ID or ID prefix
        story: String,

        #[arg(long, short = 'r')]
        role: Option<String>,

        #[arg(long, short = 'a')]
        action: Option<String>,

        #[arg(long, short = 'b')]
        benefit: Option<String>,

        /// Replace acceptance criteria (';'-separated)
        #[arg(long, short = 'c')]
        criteria: Option<String>,

        #[arg(long)]
        points: Option<u32>,

        #[arg(long, short = 'p')]
        priority: Option<StoryPriority>,

        #[arg(long, short = 's')]
        status: Option<StoryStatus>,
    },

    /// Delete a story (epic links and board copies are left in place)
    Delete {
        /// Story ID or ID prefix
        story: String,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Move a story to a 1-based position in the backlog
    Move {
        /// Story ID or ID prefix
        story: String,

        /// New position (1 = top)
        position: usize,
    },
}

pub fn run(cmd: StoryCommands, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let ctx = session.project()?;
    let mut stories: Vec<Story> = session.load(&ctx, ToolKey::Stories);
    sort_by_order(&mut stories);

    match cmd {
        StoryCommands::New {
            role,
            action,
            benefit,
            criteria,
            points,
            priority,
            epic,
        } => {
            if role.trim().is_empty() || action.trim().is_empty() {
                return Err(miette::miette!("a story needs both a role and an action"));
            }
            let mut epics: Vec<Epic> = session.load(&ctx, ToolKey::Epics);
            let epic_index = epic
                .as_deref()
                .map(|q| pick_index(&epics, q))
                .transpose()?;

            let story = Story::new(
                StoryDraft {
                    role: role.trim().to_string(),
                    action: action.trim().to_string(),
                    benefit: benefit.trim().to_string(),
                    acceptance_criteria: split_list(&criteria),
                    story_points: points,
                    priority,
                },
                &stories,
            );
            let id = story.id.clone();
            stories.push(story);
            let mut written = session.save(&ctx, ToolKey::Stories, &stories);

            if let Some(index) = epic_index {
                epics[index].link_story(&id);
                written &= session.save(&ctx, ToolKey::Epics, &epics);
            }

            if session.format() == OutputFormat::Id {
                println!("{}", id);
                return Ok(());
            }
            report_saved(global, written, format!("Created story {}", style(&id).cyan()))
        }

        StoryCommands::List { status, epic } => {
            let epics: Vec<Epic> = session.load(&ctx, ToolKey::Epics);
            let index = EpicIndex::build(&epics);
            let epic_filter = epic
                .as_deref()
                .map(|q| pick_index(&epics, q).map(|i| epics[i].id.clone()))
                .transpose()?;

            let stories: Vec<Story> = stories
                .into_iter()
                .filter(|s| status.map_or(true, |st| s.status == st))
                .filter(|s| {
                    epic_filter
                        .as_deref()
                        .map_or(true, |e| index.epics_for(&s.id).iter().any(|id| id == e))
                })
                .collect();

            print_list(
                session.format(),
                &stories,
                &["#", "ID", "STORY", "PTS", "PRIORITY", "STATUS", "EPIC"],
                "No stories found. Create one with: awb story new --role <ROLE> --action <ACTION>",
                |s: &Story| {
                    vec![
                        format!("{}", s.order),
                        s.id.clone(),
                        truncate_str(&s.sentence(), 60),
                        s.story_points.to_string(),
                        s.priority.to_string(),
                        s.status.to_string(),
                        index.primary_epic(&s.id).unwrap_or("-").to_string(),
                    ]
                },
            )
        }

        StoryCommands::Show { story } => {
            let story = &stories[pick_index(&stories, &story)?];
            let epics: Vec<Epic> = session.load(&ctx, ToolKey::Epics);
            let sprints: Vec<Sprint> = session.load(&ctx, ToolKey::Sprints);
            let index = EpicIndex::build(&epics);

            print_detail(session.format(), story, || {
                println!("{}", style(&story.id).cyan());
                println!("{}", style(story.sentence()).bold());
                field("Points", story.story_points);
                field("Priority", story.priority);
                field("Status", story.status);
                field("Created", story.created_at.format("%Y-%m-%d"));
                let linked = index.epics_for(&story.id);
                field("Epics", if linked.is_empty() { "-".to_string() } else { linked.join(", ") });

                let story_id = story.id.as_str();
                let placements: Vec<String> = sprints
                    .iter()
                    .flat_map(|sprint| {
                        sprint
                            .items
                            .iter()
                            .filter(move |i| i.story_id.as_ref().map(|r| r.id()) == Some(story_id))
                            .map(move |i| format!("{} ({})", sprint.name, i.column))
                    })
                    .collect();
                field(
                    "Boards",
                    if placements.is_empty() { "-".to_string() } else { placements.join(", ") },
                );

                if !story.acceptance_criteria.is_empty() {
                    println!();
                    println!("{}", style("Acceptance criteria").bold());
                    for criterion in &story.acceptance_criteria {
                        println!("  - {}", criterion);
                    }
                }
            })
        }

        StoryCommands::Edit {
            story,
            role,
            action,
            benefit,
            criteria,
            points,
            priority,
            status,
        } => {
            let index = pick_index(&stories, &story)?;
            let target = &mut stories[index];
            if let Some(role) = role {
                target.role = role.trim().to_string();
            }
            if let Some(action) = action {
                target.action = action.trim().to_string();
            }
            if let Some(benefit) = benefit {
                target.benefit = benefit.trim().to_string();
            }
            if let Some(criteria) = criteria {
                target.acceptance_criteria = split_list(&criteria);
            }
            if let Some(points) = points {
                target.story_points = points;
            }
            if let Some(priority) = priority {
                target.priority = priority;
            }
            if let Some(status) = status {
                target.status = status;
            }
            if target.role.is_empty() || target.action.is_empty() {
                return Err(miette::miette!("a story needs both a role and an action"));
            }
            let id = target.id.clone();
            let written = session.save(&ctx, ToolKey::Stories, &stories);
            report_saved(global, written, format!("Updated story {}", style(id).cyan()))
        }

        StoryCommands::Delete { story, yes } => {
            let index = pick_index(&stories, &story)?;
            let prompt = format!("Delete story {}?", stories[index].id);
            if !confirm(&prompt, yes)? {
                println!("Cancelled.");
                return Ok(());
            }
            let removed = stories.remove(index);
            let written = session.save(&ctx, ToolKey::Stories, &stories);

            let epics: Vec<Epic> = session.load(&ctx, ToolKey::Epics);
            let linking = epics.iter().filter(|e| e.links_story(&removed.id)).count();
            if linking > 0 && !global.quiet {
                println!(
                    "{} {} epic(s) still link {}; they will show it as not found",
                    style("!").yellow(),
                    linking,
                    removed.id
                );
            }
            report_saved(global, written, format!("Deleted story {}", style(&removed.id).cyan()))
        }

        StoryCommands::Move { story, position } => {
            if position == 0 {
                return Err(miette::miette!("positions start at 1"));
            }
            let id = stories[pick_index(&stories, &story)?].id.clone();
            move_story(&mut stories, &id, position - 1);
            let written = session.save(&ctx, ToolKey::Stories, &stories);
            report_saved(
                global,
                written,
                format!("Moved {} to position {}", style(&id).cyan(), position.min(stories.len())),
            )
        }
    }
}
