//! `awb risk` command - Risk register and heat matrix

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{
    confirm, field, or_dash, pick_index, print_detail, print_list, report_saved, truncate_str,
    Session,
};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::tool::ToolKey;
use crate::entities::risk::{
    sort_by_score, HeatMatrix, Risk, RiskCategory, RiskDraft, RiskLevel, RiskStatus,
};

#[derive(Subcommand, Debug)]
pub enum RiskCommands {
    /// Register a risk
    New {
        title: String,

        #[arg(long, short = 'd', default_value = "")]
        description: String,

        /// technical, business, resource, schedule or external
        #[arg(long, short = 'c', default_value = "technical")]
        category: RiskCategory,

        /// Probability rating 1-5
        #[arg(long, short = 'p')]
        probability: u8,

        /// Impact rating 1-5
        #[arg(long, short = 'i')]
        impact: u8,

        #[arg(long, short = 'm', default_value = "")]
        mitigation: String,

        #[arg(long, short = 'o', default_value = "")]
        owner: String,
    },

    /// List risks, highest score first
    List {
        #[arg(long, short = 's')]
        status: Option<RiskStatus>,

        /// Only open and mitigating risks
        #[arg(long)]
        open: bool,
    },

    /// Show a risk and its score history
    Show {
        risk: String,
    },

    /// Edit descriptive fields
    Edit {
        risk: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long, short = 'd')]
        description: Option<String>,

        #[arg(long, short = 'c')]
        category: Option<RiskCategory>,

        #[arg(long, short = 'm')]
        mitigation: Option<String>,

        #[arg(long, short = 'o')]
        owner: Option<String>,
    },

    /// Re-rate probability and impact (score changes are recorded)
    Reassess {
        risk: String,

        probability: u8,

        impact: u8,
    },

    /// Change status: open, mitigating, closed or accepted
    Status {
        risk: String,

        status: RiskStatus,
    },

    /// Probability x impact heat matrix of open risks
    Matrix,

    /// Delete a risk
    Delete {
        risk: String,

        #[arg(long, short = 'y')]
        yes: bool,
    },
}

pub fn run(cmd: RiskCommands, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let ctx = session.project()?;
    let mut risks: Vec<Risk> = session.load(&ctx, ToolKey::Risks);

    match cmd {
        RiskCommands::New {
            title,
            description,
            category,
            probability,
            impact,
            mitigation,
            owner,
        } => {
            let risk = Risk::new(RiskDraft {
                title: title.trim().to_string(),
                description,
                category,
                probability,
                impact,
                mitigation_plan: mitigation,
                owner,
            })
            .map_err(|e| miette::miette!("{}", e))?;
            let id = risk.id.clone();
            let summary = format!("score {} ({})", risk.score, risk.level());
            risks.push(risk);
            let written = session.save(&ctx, ToolKey::Risks, &risks);
            if session.format() == OutputFormat::Id {
                println!("{}", id);
                return Ok(());
            }
            report_saved(global, written, format!("Registered risk {}, {}", style(id).cyan(), summary))
        }

        RiskCommands::List { status, open } => {
            risks.retain(|r| status.map_or(true, |s| r.status == s) && (!open || r.is_open()));
            sort_by_score(&mut risks);
            print_list(
                session.format(),
                &risks,
                &["ID", "TITLE", "CATEGORY", "P", "I", "SCORE", "LEVEL", "STATUS", "OWNER"],
                "No risks found. Register one with: awb risk new <TITLE> -p <1-5> -i <1-5>",
                |r: &Risk| {
                    vec![
                        r.id.clone(),
                        truncate_str(&r.title, 40),
                        r.category.to_string(),
                        r.probability.to_string(),
                        r.impact.to_string(),
                        r.score.to_string(),
                        r.level().to_string(),
                        r.status.to_string(),
                        or_dash(&r.owner),
                    ]
                },
            )
        }

        RiskCommands::Show { risk } => {
            let risk = &risks[pick_index(&risks, &risk)?];
            print_detail(session.format(), risk, || {
                println!("{} {}", style(&risk.id).cyan(), style(&risk.title).bold());
                field("Category", risk.category);
                field("Status", risk.status);
                field(
                    "Score",
                    format!(
                        "{} = {} x {} ({})",
                        risk.score,
                        risk.probability,
                        risk.impact,
                        level_styled(risk.level())
                    ),
                );
                field("Owner", or_dash(&risk.owner));
                field("Mitigation", or_dash(&risk.mitigation_plan));
                if !risk.description.is_empty() {
                    println!();
                    println!("{}", risk.description);
                }
                if !risk.history.is_empty() {
                    println!();
                    println!("{}", style("Score history").bold());
                    for change in &risk.history {
                        println!("  {}  {} → {}", change.date, change.old_score, change.new_score);
                    }
                }
            })
        }

        RiskCommands::Edit {
            risk,
            title,
            description,
            category,
            mitigation,
            owner,
        } => {
            let index = pick_index(&risks, &risk)?;
            let target = &mut risks[index];
            if let Some(title) = title {
                if title.trim().is_empty() {
                    return Err(miette::miette!("risk title cannot be empty"));
                }
                target.title = title.trim().to_string();
            }
            if let Some(description) = description {
                target.description = description;
            }
            if let Some(category) = category {
                target.category = category;
            }
            if let Some(mitigation) = mitigation {
                target.mitigation_plan = mitigation;
            }
            if let Some(owner) = owner {
                target.owner = owner.trim().to_string();
            }
            let id = target.id.clone();
            let written = session.save(&ctx, ToolKey::Risks, &risks);
            report_saved(global, written, format!("Updated risk {}", style(id).cyan()))
        }

        RiskCommands::Reassess {
            risk,
            probability,
            impact,
        } => {
            let index = pick_index(&risks, &risk)?;
            let message = match risks[index]
                .reassess(probability, impact)
                .map_err(|e| miette::miette!("{}", e))?
            {
                Some(change) => format!(
                    "Score {} → {} ({})",
                    change.old_score,
                    change.new_score,
                    RiskLevel::from_score(change.new_score)
                ),
                None => "Score unchanged".to_string(),
            };
            let written = session.save(&ctx, ToolKey::Risks, &risks);
            report_saved(global, written, message)
        }

        RiskCommands::Status { risk, status } => {
            let index = pick_index(&risks, &risk)?;
            risks[index].status = status;
            let id = risks[index].id.clone();
            let written = session.save(&ctx, ToolKey::Risks, &risks);
            report_saved(global, written, format!("{} is now {}", style(id).cyan(), status))
        }

        RiskCommands::Matrix => {
            let matrix = HeatMatrix::build(&risks);
            println!("{}", style("Risk heat matrix (open and mitigating)").bold());
            println!();
            println!("{:>14}   {}", "", style("impact →").dim());
            print!("{:>14}", "probability ↓");
            for impact in 1..=5u8 {
                print!(" {:>3}", impact);
            }
            println!();
            for probability in (1..=5u8).rev() {
                print!("{:>14}", probability);
                for impact in 1..=5u8 {
                    let count = matrix.count(probability, impact);
                    let cell = if count == 0 { ".".to_string() } else { count.to_string() };
                    let cell = format!("{:>3}", cell);
                    let level = RiskLevel::from_score(probability * impact);
                    print!(" {}", level_color(level, cell));
                }
                println!();
            }
            Ok(())
        }

        RiskCommands::Delete { risk, yes } => {
            let index = pick_index(&risks, &risk)?;
            let prompt = format!("Delete risk '{}'?", risks[index].title);
            if !confirm(&prompt, yes)? {
                println!("Cancelled.");
                return Ok(());
            }
            let removed = risks.remove(index);
            let written = session.save(&ctx, ToolKey::Risks, &risks);
            report_saved(global, written, format!("Deleted risk {}", style(removed.id).cyan()))
        }
    }
}

fn level_color(level: RiskLevel, text: String) -> console::StyledObject<String> {
    match level {
        RiskLevel::Low => style(text).green(),
        RiskLevel::Medium => style(text).yellow(),
        RiskLevel::High => style(text).red(),
        RiskLevel::Critical => style(text).red().bold(),
    }
}

fn level_styled(level: RiskLevel) -> console::StyledObject<String> {
    level_color(level, level.to_string())
}
