//! `awb decision` command - Decision log

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{
    confirm, field, or_dash, parse_date, pick_index, pick_sprint, print_detail, print_list,
    report_saved, truncate_str, Session,
};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::refs::{resolve_opt, Resolution};
use crate::core::tool::ToolKey;
use crate::entities::decision::{sort_newest_first, Decision, DecisionDraft, DecisionStatus};
use crate::entities::sprint::Sprint;

#[derive(Subcommand, Debug)]
pub enum DecisionCommands {
    /// Record a decision
    New {
        /// What was decided
        decision: String,

        #[arg(long, short = 'c', default_value = "")]
        context: String,

        #[arg(long, short = 'r', default_value = "")]
        rationale: String,

        #[arg(long, short = 'o', default_value = "")]
        owner: String,

        /// Decision date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,

        /// Sprint the decision was made in (name, ID or ID prefix)
        #[arg(long, short = 'S')]
        sprint: Option<String>,
    },

    /// List decisions, newest first
    List {
        #[arg(long, short = 's')]
        status: Option<DecisionStatus>,
    },

    /// Show a decision
    Show {
        decision: String,
    },

    /// Edit context, rationale or owner
    Edit {
        decision: String,

        #[arg(long, short = 'c')]
        context: Option<String>,

        #[arg(long, short = 'r')]
        rationale: Option<String>,

        #[arg(long, short = 'o')]
        owner: Option<String>,
    },

    /// Change status (superseded and reversed need remarks)
    Status {
        decision: String,

        /// active, superseded or reversed
        status: DecisionStatus,

        #[arg(long, short = 'm')]
        remarks: Option<String>,
    },

    /// Delete a decision
    Delete {
        decision: String,

        #[arg(long, short = 'y')]
        yes: bool,
    },
}

pub fn run(cmd: DecisionCommands, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let ctx = session.project()?;
    let mut decisions: Vec<Decision> = session.load(&ctx, ToolKey::Decisions);

    match cmd {
        DecisionCommands::New {
            decision,
            context,
            rationale,
            owner,
            date,
            sprint,
        } => {
            let sprint_id = match sprint {
                Some(query) => {
                    let sprints = session.sprints(&ctx);
                    Some(sprints[pick_sprint(&sprints, Some(&query))?].id.clone())
                }
                None => None,
            };
            let decision = Decision::new(DecisionDraft {
                date: date.as_deref().map(parse_date).transpose()?,
                sprint_id,
                context: context.trim().to_string(),
                decision: decision.trim().to_string(),
                rationale: rationale.trim().to_string(),
                owner,
            })
            .map_err(|e| miette::miette!("{}", e))?;
            let id = decision.id.clone();
            decisions.push(decision);
            let written = session.save(&ctx, ToolKey::Decisions, &decisions);
            if session.format() == OutputFormat::Id {
                println!("{}", id);
                return Ok(());
            }
            report_saved(global, written, format!("Recorded decision {}", style(id).cyan()))
        }

        DecisionCommands::List { status } => {
            let sprints: Vec<Sprint> = session.load(&ctx, ToolKey::Sprints);
            decisions.retain(|d| status.map_or(true, |s| d.status == s));
            sort_newest_first(&mut decisions);
            print_list(
                session.format(),
                &decisions,
                &["ID", "DATE", "DECISION", "STATUS", "OWNER", "SPRINT"],
                "No decisions found. Record one with: awb decision new <DECISION>",
                |d: &Decision| {
                    vec![
                        d.id.clone(),
                        d.date.to_string(),
                        truncate_str(&d.decision, 50),
                        d.status.to_string(),
                        or_dash(&d.owner),
                        sprint_label(d, &sprints),
                    ]
                },
            )
        }

        DecisionCommands::Show { decision } => {
            let sprints: Vec<Sprint> = session.load(&ctx, ToolKey::Sprints);
            let decision = &decisions[pick_index(&decisions, &decision)?];
            print_detail(session.format(), decision, || {
                println!("{}", style(&decision.id).cyan());
                println!("{}", style(&decision.decision).bold());
                field("Date", decision.date);
                field("Status", decision.status);
                field("Owner", or_dash(&decision.owner));
                field("Sprint", sprint_label(decision, &sprints));
                field("Context", or_dash(&decision.context));
                field("Rationale", or_dash(&decision.rationale));
                if !decision.remarks.is_empty() {
                    field("Remarks", &decision.remarks);
                }
            })
        }

        DecisionCommands::Edit {
            decision,
            context,
            rationale,
            owner,
        } => {
            let index = pick_index(&decisions, &decision)?;
            let target = &mut decisions[index];
            if let Some(context) = context {
                target.context = context.trim().to_string();
            }
            if let Some(rationale) = rationale {
                target.rationale = rationale.trim().to_string();
            }
            if let Some(owner) = owner {
                target.owner = owner.trim().to_string();
            }
            let id = target.id.clone();
            let written = session.save(&ctx, ToolKey::Decisions, &decisions);
            report_saved(global, written, format!("Updated decision {}", style(id).cyan()))
        }

        DecisionCommands::Status {
            decision,
            status,
            remarks,
        } => {
            let index = pick_index(&decisions, &decision)?;
            decisions[index]
                .set_status(status, remarks.as_deref())
                .map_err(|e| miette::miette!("{}", e))?;
            let id = decisions[index].id.clone();
            let written = session.save(&ctx, ToolKey::Decisions, &decisions);
            report_saved(global, written, format!("{} is now {}", style(id).cyan(), status))
        }

        DecisionCommands::Delete { decision, yes } => {
            let index = pick_index(&decisions, &decision)?;
            let prompt = format!("Delete decision '{}'?", truncate_str(&decisions[index].decision, 60));
            if !confirm(&prompt, yes)? {
                println!("Cancelled.");
                return Ok(());
            }
            let removed = decisions.remove(index);
            let written = session.save(&ctx, ToolKey::Decisions, &decisions);
            report_saved(global, written, format!("Deleted decision {}", style(removed.id).cyan()))
        }
    }
}

fn sprint_label(decision: &Decision, sprints: &[Sprint]) -> String {
    match resolve_opt(decision.sprint_id.as_ref(), sprints) {
        Some(Resolution::Found(sprint)) => sprint.name.clone(),
        Some(dangling) => dangling.describe(),
        None => "-".to_string(),
    }
}
