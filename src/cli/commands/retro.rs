//! `awb retro` command - Retrospective sessions and action items

use chrono::Utc;
use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{
    confirm, field, or_dash, parse_date, pick, pick_index, pick_sprint, print_detail, print_list,
    report_saved, Session,
};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::Record;
use crate::core::refs::{resolve_opt, Resolution};
use crate::core::tool::ToolKey;
use crate::entities::retro::{ActionStatus, CardList, RetroCard, RetroSession};
use crate::entities::sprint::Sprint;

#[derive(Subcommand, Debug)]
pub enum RetroCommands {
    /// Start a retro session
    New {
        /// Session date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,

        /// Sprint this retro reviews (name, ID or ID prefix)
        #[arg(long, short = 'S')]
        sprint: Option<String>,
    },

    /// List retro sessions, newest first
    List,

    /// Show a session's cards and action items
    Show {
        /// Retro ID or ID prefix (default: latest)
        retro: Option<String>,
    },

    /// Delete a retro session
    Delete {
        retro: String,

        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Add a card
    Card {
        /// went-well or didnt-go-well
        list: CardList,

        text: String,

        /// Retro ID or ID prefix (default: latest)
        #[arg(long, short = 'R')]
        retro: Option<String>,
    },

    /// Remove a card
    RemoveCard {
        card: String,

        #[arg(long, short = 'R')]
        retro: Option<String>,
    },

    /// Seed cards from a sprint board (done items went well)
    Seed {
        /// Sprint name, ID or ID prefix (default: the retro's sprint)
        #[arg(long, short = 'S')]
        sprint: Option<String>,

        #[arg(long, short = 'R')]
        retro: Option<String>,
    },

    /// Add an action item
    Action {
        text: String,

        #[arg(long, short = 'o', default_value = "")]
        owner: String,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,

        #[arg(long, short = 'R')]
        retro: Option<String>,
    },

    /// Toggle an action item between Open and Done
    Toggle {
        action: String,

        #[arg(long, short = 'R')]
        retro: Option<String>,
    },

    /// Remove an action item
    RemoveAction {
        action: String,

        #[arg(long, short = 'R')]
        retro: Option<String>,
    },
}

pub fn run(cmd: RetroCommands, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let ctx = session.project()?;
    let mut retros: Vec<RetroSession> = session.load(&ctx, ToolKey::Retros);

    match cmd {
        RetroCommands::New { date, sprint } => {
            let date = match date {
                Some(d) => parse_date(&d)?,
                None => Utc::now().date_naive(),
            };
            let sprint_id = match sprint {
                Some(query) => {
                    let sprints = session.sprints(&ctx);
                    Some(sprints[pick_sprint(&sprints, Some(&query))?].id.clone())
                }
                None => None,
            };
            let retro = RetroSession::new(date, sprint_id.as_deref());
            let id = retro.id.clone();
            retros.push(retro);
            let written = session.save(&ctx, ToolKey::Retros, &retros);
            if session.format() == OutputFormat::Id {
                println!("{}", id);
                return Ok(());
            }
            report_saved(global, written, format!("Started retro {} ({})", style(&id).cyan(), date))
        }

        RetroCommands::List => {
            let sprints: Vec<Sprint> = session.load(&ctx, ToolKey::Sprints);
            retros.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
            print_list(
                session.format(),
                &retros,
                &["ID", "DATE", "SPRINT", "WENT WELL", "DIDN'T", "OPEN ACTIONS"],
                "No retros found. Start one with: awb retro new",
                |r: &RetroSession| {
                    vec![
                        r.id.clone(),
                        r.date.to_string(),
                        sprint_label(r, &sprints),
                        r.went_well.len().to_string(),
                        r.didnt_go_well.len().to_string(),
                        r.open_actions().to_string(),
                    ]
                },
            )
        }

        RetroCommands::Show { retro } => {
            let sprints: Vec<Sprint> = session.load(&ctx, ToolKey::Sprints);
            let retro = &retros[pick_retro(&retros, retro.as_deref())?];
            print_detail(session.format(), retro, || {
                println!("{} {}", style("Retrospective").bold(), style(&retro.id).cyan());
                field("Date", retro.date);
                field("Sprint", sprint_label(retro, &sprints));
                for list in [CardList::WentWell, CardList::DidntGoWell] {
                    println!();
                    println!("{}", style(list_title(list)).bold());
                    let cards = retro.cards(list);
                    if cards.is_empty() {
                        println!("  (none)");
                    }
                    for card in cards {
                        println!("  {} {}", style(&card.id).dim(), card.text);
                    }
                }
                println!();
                println!("{}", style("Action items").bold());
                if retro.action_items.is_empty() {
                    println!("  (none)");
                }
                for action in &retro.action_items {
                    let mark = match action.status {
                        ActionStatus::Open => style("[ ]").yellow(),
                        ActionStatus::Done => style("[x]").green(),
                    };
                    println!(
                        "  {} {} {} (owner: {}, due: {})",
                        mark,
                        style(&action.id).dim(),
                        action.text,
                        or_dash(&action.owner),
                        action.due_date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
                    );
                }
            })
        }

        RetroCommands::Delete { retro, yes } => {
            let index = pick_index(&retros, &retro)?;
            let prompt = format!("Delete retro from {}?", retros[index].date);
            if !confirm(&prompt, yes)? {
                println!("Cancelled.");
                return Ok(());
            }
            let removed = retros.remove(index);
            let written = session.save(&ctx, ToolKey::Retros, &retros);
            report_saved(global, written, format!("Deleted retro {}", style(removed.id).cyan()))
        }

        RetroCommands::Card { list, text, retro } => {
            if text.trim().is_empty() {
                return Err(miette::miette!("card text cannot be empty"));
            }
            let index = pick_retro(&retros, retro.as_deref())?;
            let id = retros[index].add_card(list, RetroCard::new(text.trim()));
            let written = session.save(&ctx, ToolKey::Retros, &retros);
            report_saved(global, written, format!("Added card {} to {}", style(id).cyan(), list))
        }

        RetroCommands::RemoveCard { card, retro } => {
            let index = pick_retro(&retros, retro.as_deref())?;
            let target = &mut retros[index];
            let card_id = {
                let all: Vec<RetroCard> = target
                    .went_well
                    .iter()
                    .chain(target.didnt_go_well.iter())
                    .cloned()
                    .collect();
                pick(&all, &card)?.id().to_string()
            };
            target.remove_card(&card_id);
            let written = session.save(&ctx, ToolKey::Retros, &retros);
            report_saved(global, written, format!("Removed card {}", style(card_id).cyan()))
        }

        RetroCommands::Seed { sprint, retro } => {
            let index = pick_retro(&retros, retro.as_deref())?;
            let sprints = session.sprints(&ctx);
            let sprint_index = match (sprint.as_deref(), retros[index].sprint_id.as_ref()) {
                (Some(query), _) => pick_sprint(&sprints, Some(query))?,
                (None, Some(sprint_ref)) => match sprint_ref.resolve(&sprints) {
                    Resolution::Found(s) => pick_index(&sprints, s.id())?,
                    Resolution::Dangling(id) => {
                        return Err(miette::miette!(
                            "this retro's sprint {} (not found); pass --sprint",
                            id
                        ))
                    }
                },
                (None, None) => pick_sprint(&sprints, None)?,
            };
            let report = retros[index].seed_from_sprint(&sprints[sprint_index]);
            let written = session.save(&ctx, ToolKey::Retros, &retros);
            report_saved(
                global,
                written,
                format!(
                    "Seeded from {}: {} went well, {} didn't go well, {} already present",
                    style(&sprints[sprint_index].name).cyan(),
                    report.went_well,
                    report.didnt_go_well,
                    report.skipped
                ),
            )
        }

        RetroCommands::Action {
            text,
            owner,
            due,
            retro,
        } => {
            if text.trim().is_empty() {
                return Err(miette::miette!("action text cannot be empty"));
            }
            let due = due.as_deref().map(parse_date).transpose()?;
            let index = pick_retro(&retros, retro.as_deref())?;
            let id = retros[index].add_action(text.trim(), &owner, due);
            let written = session.save(&ctx, ToolKey::Retros, &retros);
            report_saved(global, written, format!("Added action {}", style(id).cyan()))
        }

        RetroCommands::Toggle { action, retro } => {
            let index = pick_retro(&retros, retro.as_deref())?;
            let action_id = pick(&retros[index].action_items, &action)?.id.clone();
            let status = retros[index]
                .toggle_action(&action_id)
                .ok_or_else(|| miette::miette!("no action matches '{}'", action))?;
            let written = session.save(&ctx, ToolKey::Retros, &retros);
            report_saved(global, written, format!("{} is now {}", style(action_id).cyan(), status))
        }

        RetroCommands::RemoveAction { action, retro } => {
            let index = pick_retro(&retros, retro.as_deref())?;
            let action_id = pick(&retros[index].action_items, &action)?.id.clone();
            retros[index].remove_action(&action_id);
            let written = session.save(&ctx, ToolKey::Retros, &retros);
            report_saved(global, written, format!("Removed action {}", style(action_id).cyan()))
        }
    }
}

/// Named retro, else the most recent by date
fn pick_retro(retros: &[RetroSession], query: Option<&str>) -> Result<usize> {
    match query {
        Some(q) => pick_index(retros, q),
        None => retros
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)))
            .map(|(i, _)| i)
            .ok_or_else(|| miette::miette!("no retros yet; start one with: awb retro new")),
    }
}

fn sprint_label(retro: &RetroSession, sprints: &[Sprint]) -> String {
    match resolve_opt(retro.sprint_id.as_ref(), sprints) {
        Some(Resolution::Found(sprint)) => sprint.name.clone(),
        Some(dangling) => dangling.describe(),
        None => "-".to_string(),
    }
}

fn list_title(list: CardList) -> &'static str {
    match list {
        CardList::WentWell => "Went well",
        CardList::DidntGoWell => "Didn't go well",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_pick_retro_defaults_to_latest() {
        let older = RetroSession::new(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(), None);
        let newer = RetroSession::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), None);
        let retros = vec![newer, older];
        assert_eq!(pick_retro(&retros, None).unwrap(), 0);
        assert!(pick_retro(&[], None).is_err());
    }

    #[test]
    fn test_sprint_label_dangling() {
        let retro = RetroSession::new(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(), Some("SPRINT-X"));
        assert_eq!(sprint_label(&retro, &[]), "SPRINT-X (not found)");
    }
}
