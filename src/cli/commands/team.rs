//! `awb team` command - Team roster and capacity settings

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{confirm, field, or_dash, pick_index, print_list, report_saved, Session};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::refs::names_match;
use crate::core::tool::ToolKey;
use crate::entities::team::{find_by_name, SprintConfig, TeamMember};

#[derive(Subcommand, Debug)]
pub enum TeamCommands {
    /// Add a team member
    Add {
        /// Member name (unique, case-insensitive)
        name: String,

        #[arg(long, short = 'r', default_value = "")]
        role: String,

        /// Hours per day available for sprint work
        #[arg(long, short = 'c', default_value_t = 6.0)]
        capacity: f64,

        /// Days off during the sprint
        #[arg(long, default_value_t = 0.0)]
        pto: f64,
    },

    /// List team members
    List,

    /// Edit a team member
    Edit {
        /// Member name, ID or ID prefix
        member: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, short = 'r')]
        role: Option<String>,

        #[arg(long, short = 'c')]
        capacity: Option<f64>,

        #[arg(long)]
        pto: Option<f64>,
    },

    /// Remove a team member (assignments by name are kept)
    Remove {
        /// Member name, ID or ID prefix
        member: String,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Show or change sprint capacity settings
    Config {
        /// Working days per sprint
        #[arg(long)]
        days: Option<f64>,

        /// Focus factor between 0 and 1
        #[arg(long)]
        focus: Option<f64>,

        /// Hours per story point
        #[arg(long)]
        hours_per_point: Option<f64>,
    },
}

pub fn run(cmd: TeamCommands, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let ctx = session.project()?;
    let mut roster: Vec<TeamMember> = session.load(&ctx, ToolKey::Team);

    match cmd {
        TeamCommands::Add {
            name,
            role,
            capacity,
            pto,
        } => {
            let name = name.trim();
            if name.is_empty() {
                return Err(miette::miette!("member name cannot be empty"));
            }
            if find_by_name(&roster, name).is_some() {
                return Err(miette::miette!("a team member named '{}' already exists", name));
            }
            check_non_negative("capacity", capacity)?;
            check_non_negative("pto", pto)?;

            let mut member = TeamMember::new(name, role.trim(), capacity);
            member.pto_days = pto;
            let id = member.id.clone();
            roster.push(member);
            let written = session.save(&ctx, ToolKey::Team, &roster);
            if session.format() == OutputFormat::Id {
                println!("{}", id);
                return Ok(());
            }
            report_saved(global, written, format!("Added {} to the team", style(name).cyan()))
        }

        TeamCommands::List => {
            let config = ctx.load_sprint_config(&session.store);
            print_list(
                session.format(),
                &roster,
                &["ID", "NAME", "ROLE", "HOURS/DAY", "PTO", "SPRINT HOURS"],
                "No team members found. Add one with: awb team add <NAME>",
                |m: &TeamMember| {
                    vec![
                        m.id.clone(),
                        m.name.clone(),
                        or_dash(&m.role),
                        format!("{:.1}", m.daily_capacity),
                        format!("{:.1}", m.pto_days),
                        format!("{:.1}", m.sprint_hours(&config)),
                    ]
                },
            )
        }

        TeamCommands::Edit {
            member,
            name,
            role,
            capacity,
            pto,
        } => {
            let index = pick_member(&roster, &member)?;
            if let Some(name) = name.as_deref().map(str::trim) {
                if name.is_empty() {
                    return Err(miette::miette!("member name cannot be empty"));
                }
                let taken = roster
                    .iter()
                    .enumerate()
                    .any(|(i, m)| i != index && names_match(&m.name, name));
                if taken {
                    return Err(miette::miette!("a team member named '{}' already exists", name));
                }
                roster[index].name = name.to_string();
            }
            if let Some(role) = role {
                roster[index].role = role.trim().to_string();
            }
            if let Some(capacity) = capacity {
                check_non_negative("capacity", capacity)?;
                roster[index].daily_capacity = capacity;
            }
            if let Some(pto) = pto {
                check_non_negative("pto", pto)?;
                roster[index].pto_days = pto;
            }
            let name = roster[index].name.clone();
            let written = session.save(&ctx, ToolKey::Team, &roster);
            report_saved(global, written, format!("Updated {}", style(name).cyan()))
        }

        TeamCommands::Remove { member, yes } => {
            let index = pick_member(&roster, &member)?;
            let prompt = format!("Remove {} from the team?", roster[index].name);
            if !confirm(&prompt, yes)? {
                println!("Cancelled.");
                return Ok(());
            }
            let removed = roster.remove(index);
            let written = session.save(&ctx, ToolKey::Team, &roster);
            report_saved(global, written, format!("Removed {}", style(removed.name).cyan()))
        }

        TeamCommands::Config {
            days,
            focus,
            hours_per_point,
        } => {
            let mut config = ctx.load_sprint_config(&session.store);
            let changed = days.is_some() || focus.is_some() || hours_per_point.is_some();
            if let Some(days) = days {
                check_non_negative("days", days)?;
                config.sprint_days = days;
            }
            if let Some(focus) = focus {
                if !(0.0..=1.0).contains(&focus) {
                    return Err(miette::miette!("focus must be between 0 and 1, got {}", focus));
                }
                config.focus_factor = focus;
            }
            if let Some(hours) = hours_per_point {
                check_non_negative("hours-per-point", hours)?;
                config.hours_per_point = hours;
            }

            if changed {
                let written = session.save(&ctx, ToolKey::SprintConfig, &config);
                report_saved(global, written, "Updated sprint settings")?;
            }
            show_config(&config, session.format())
        }
    }
}

/// Members are addressed by name first, then by id
fn pick_member(roster: &[TeamMember], query: &str) -> Result<usize> {
    if let Some(member) = find_by_name(roster, query) {
        if let Some(index) = roster.iter().position(|m| m.id == member.id) {
            return Ok(index);
        }
    }
    pick_index(roster, query)
}

fn check_non_negative(name: &str, value: f64) -> Result<()> {
    if value < 0.0 || !value.is_finite() {
        return Err(miette::miette!("{} must be a non-negative number, got {}", name, value));
    }
    Ok(())
}

fn show_config(config: &SprintConfig, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(config).map_err(|e| miette::miette!("{}", e))?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(config).map_err(|e| miette::miette!("{}", e))?;
            print!("{}", yaml);
        }
        _ => {
            field("Sprint days", config.sprint_days);
            field("Focus factor", config.focus_factor);
            field("Hours/point", config.hours_per_point);
        }
    }
    Ok(())
}
