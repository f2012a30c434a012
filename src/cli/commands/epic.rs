//! `awb epic` command - Epic management and story links

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{
    confirm, field, or_dash, pick, pick_index, print_detail, print_list, report_saved, split_list,
    truncate_str, Session,
};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::Record;
use crate::core::identity::{match_id, EPIC_PREFIX};
use crate::core::refs::Resolution;
use crate::core::tool::ToolKey;
use crate::entities::epic::{Epic, EpicDraft, EpicPriority, EpicStatus};
use crate::entities::story::Story;

#[derive(Subcommand, Debug)]
pub enum EpicCommands {
    /// Create an epic (ids are sequential: EPIC-001, EPIC-002, ...)
    New {
        /// Epic title
        title: String,

        #[arg(long, short = 'd', default_value = "")]
        description: String,

        /// High, Medium or Low
        #[arg(long, short = 'p', default_value = "medium")]
        priority: EpicPriority,

        /// Not Started, In Progress, Complete or Blocked
        #[arg(long, short = 's', default_value = "not-started")]
        status: EpicStatus,

        /// Where the epic came from (document, meeting, ...)
        #[arg(long, default_value = "")]
        source: String,

        /// Features, separated by ';'
        #[arg(long, default_value = "")]
        features: String,

        /// Test cases, separated by ';'
        #[arg(long, default_value = "")]
        test_cases: String,
    },

    /// List epics with progress over their linked stories
    List {
        /// Filter by status
        #[arg(long, short = 's')]
        status: Option<EpicStatus>,
    },

    /// Show an epic and its linked stories
    Show {
        /// Epic ID or number (e.g. EPIC-003 or 3)
        epic: String,
    },

    /// Edit epic fields
    Edit {
        /// Epic ID or number
        epic: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long, short = 'd')]
        description: Option<String>,

        #[arg(long, short = 'p')]
        priority: Option<EpicPriority>,

        #[arg(long, short = 's')]
        status: Option<EpicStatus>,

        #[arg(long)]
        source: Option<String>,

        /// Replace features (';'-separated)
        #[arg(long)]
        features: Option<String>,

        /// Replace test cases (';'-separated)
        #[arg(long)]
        test_cases: Option<String>,
    },

    /// Delete an epic (its stories are kept)
    Delete {
        /// Epic ID or number
        epic: String,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Link a story to an epic
    Link {
        /// Epic ID or number
        epic: String,

        /// Story ID or ID prefix
        story: String,
    },

    /// Remove a story link (works for links to deleted stories too)
    Unlink {
        /// Epic ID or number
        epic: String,

        /// Linked story ID or ID prefix
        story: String,
    },
}

pub fn run(cmd: EpicCommands, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let ctx = session.project()?;
    let mut epics: Vec<Epic> = session.load(&ctx, ToolKey::Epics);

    match cmd {
        EpicCommands::New {
            title,
            description,
            priority,
            status,
            source,
            features,
            test_cases,
        } => {
            if title.trim().is_empty() {
                return Err(miette::miette!("epic title cannot be empty"));
            }
            let epic = Epic::new(
                EpicDraft {
                    title: title.trim().to_string(),
                    description,
                    priority,
                    status,
                    source,
                    features: split_list(&features),
                    test_cases: split_list(&test_cases),
                },
                &epics,
            );
            let id = epic.id.clone();
            epics.push(epic);
            let written = session.save(&ctx, ToolKey::Epics, &epics);
            if session.format() == OutputFormat::Id {
                println!("{}", id);
                return Ok(());
            }
            report_saved(global, written, format!("Created epic {}", style(&id).cyan()))
        }

        EpicCommands::List { status } => {
            let stories: Vec<Story> = session.load(&ctx, ToolKey::Stories);
            let epics: Vec<Epic> = epics
                .into_iter()
                .filter(|e| status.map_or(true, |s| e.status == s))
                .collect();
            print_list(
                session.format(),
                &epics,
                &["ID", "TITLE", "PRIORITY", "STATUS", "STORIES", "POINTS", "DONE"],
                "No epics found. Create one with: awb epic new <TITLE>",
                |e: &Epic| {
                    let progress = e.progress(&stories);
                    let linked = if progress.dangling > 0 {
                        format!("{} (+{} missing)", progress.resolved, progress.dangling)
                    } else {
                        progress.resolved.to_string()
                    };
                    vec![
                        e.id.clone(),
                        truncate_str(&e.title, 40),
                        e.priority.to_string(),
                        e.status.to_string(),
                        linked,
                        e.total_points(&stories).to_string(),
                        format!("{}%", progress.percent()),
                    ]
                },
            )
        }

        EpicCommands::Show { epic } => {
            let stories: Vec<Story> = session.load(&ctx, ToolKey::Stories);
            let epic = &epics[pick_epic(&epics, &epic)?];
            print_detail(session.format(), epic, || {
                let progress = epic.progress(&stories);
                println!("{} {}", style(&epic.id).cyan(), style(&epic.title).bold());
                field("Priority", epic.priority);
                field("Status", epic.status);
                field("Source", or_dash(&epic.source));
                field("Created", epic.created_at.format("%Y-%m-%d"));
                field(
                    "Progress",
                    format!(
                        "{}% ({}/{} done, {} pts)",
                        progress.percent(),
                        progress.done,
                        progress.resolved,
                        epic.total_points(&stories)
                    ),
                );
                if !epic.description.is_empty() {
                    println!();
                    println!("{}", epic.description);
                }
                print_bullets("Features", &epic.features);
                print_bullets("Test cases", &epic.test_cases);

                println!();
                println!("{}", style("Linked stories").bold());
                if epic.linked_stories.is_empty() {
                    println!("  (none)");
                }
                for resolution in epic.resolve_stories(&stories) {
                    match resolution {
                        Resolution::Found(story) => println!(
                            "  {} [{}] {}",
                            style(&story.id).cyan(),
                            story.status,
                            story.sentence()
                        ),
                        Resolution::Dangling(_) => {
                            println!("  {}", style(resolution.describe()).yellow())
                        }
                    }
                }
            })
        }

        EpicCommands::Edit {
            epic,
            title,
            description,
            priority,
            status,
            source,
            features,
            test_cases,
        } => {
            let index = pick_epic(&epics, &epic)?;
            let target = &mut epics[index];
            if let Some(title) = title {
                if title.trim().is_empty() {
                    return Err(miette::miette!("epic title cannot be empty"));
                }
                target.title = title.trim().to_string();
            }
            if let Some(description) = description {
                target.description = description;
            }
            if let Some(priority) = priority {
                target.priority = priority;
            }
            if let Some(status) = status {
                target.status = status;
            }
            if let Some(source) = source {
                target.source = source;
            }
            if let Some(features) = features {
                target.features = split_list(&features);
            }
            if let Some(test_cases) = test_cases {
                target.test_cases = split_list(&test_cases);
            }
            let id = target.id.clone();
            let written = session.save(&ctx, ToolKey::Epics, &epics);
            report_saved(global, written, format!("Updated epic {}", style(id).cyan()))
        }

        EpicCommands::Delete { epic, yes } => {
            let index = pick_epic(&epics, &epic)?;
            let prompt = format!("Delete epic {} '{}'?", epics[index].id, epics[index].title);
            if !confirm(&prompt, yes)? {
                println!("Cancelled.");
                return Ok(());
            }
            let removed = epics.remove(index);
            let written = session.save(&ctx, ToolKey::Epics, &epics);
            report_saved(global, written, format!("Deleted epic {}", style(removed.id).cyan()))
        }

        EpicCommands::Link { epic, story } => {
            let stories: Vec<Story> = session.load(&ctx, ToolKey::Stories);
            let story_id = pick(&stories, &story)?.id.clone();
            let index = pick_epic(&epics, &epic)?;
            if !epics[index].link_story(&story_id) {
                println!(
                    "{} {} is already linked to {}",
                    style("!").yellow(),
                    story_id,
                    epics[index].id
                );
                return Ok(());
            }
            let epic_id = epics[index].id.clone();
            let written = session.save(&ctx, ToolKey::Epics, &epics);
            report_saved(
                global,
                written,
                format!("Linked {} to {}", style(story_id).cyan(), style(epic_id).cyan()),
            )
        }

        EpicCommands::Unlink { epic, story } => {
            let index = pick_epic(&epics, &epic)?;
            let target = &mut epics[index];
            let story_id = match_id(&story, target.linked_stories.iter().map(|s| s.id()))
                .map(String::from)
                .ok_or_else(|| miette::miette!("{} has no linked story matching '{}'", target.id, story))?;
            target.unlink_story(&story_id);
            let epic_id = target.id.clone();
            let written = session.save(&ctx, ToolKey::Epics, &epics);
            report_saved(
                global,
                written,
                format!("Unlinked {} from {}", style(story_id).cyan(), style(epic_id).cyan()),
            )
        }
    }
}

/// Accept a bare epic number as shorthand for its `EPIC-###` id
fn pick_epic(epics: &[Epic], query: &str) -> Result<usize> {
    if let Ok(number) = query.trim().parse::<u64>() {
        let id = format!("{}-{:03}", EPIC_PREFIX, number);
        if let Some(index) = epics.iter().position(|e| e.id() == id) {
            return Ok(index);
        }
    }
    pick_index(epics, query)
}

fn print_bullets(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!();
    println!("{}", style(title).bold());
    for item in items {
        println!("  - {}", item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_epic_by_number() {
        let first = Epic::new(EpicDraft::default(), &[]);
        let second = Epic::new(EpicDraft::default(), std::slice::from_ref(&first));
        let epics = vec![first, second];
        assert_eq!(pick_epic(&epics, "2").unwrap(), 1);
        assert_eq!(pick_epic(&epics, "EPIC-001").unwrap(), 0);
        assert_eq!(pick_epic(&epics, "epic-002").unwrap(), 1);
        assert!(pick_epic(&epics, "7").is_err());
    }
}
