//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::cli::commands::{
    completions::CompletionsArgs, decision::DecisionCommands, epic::EpicCommands,
    export::ExportCommands, init::InitArgs, project::ProjectCommands, raci::RaciCommands,
    retro::RetroCommands, risk::RiskCommands, sprint::SprintCommands, status::StatusArgs,
    story::StoryCommands, team::TeamCommands,
};

#[derive(Parser)]
#[command(name = "awb")]
#[command(author, version, about = "Agile Workbench")]
#[command(long_about = "Project-scoped epics, stories, sprints, RACI, retrospectives, decisions and risks kept in a local key-value store.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Workspace root (default: auto-detect by finding .awb/)
    #[arg(long, global = true, env = "AWB_WORKSPACE")]
    pub workspace: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new workspace
    Init(InitArgs),

    /// Project management (create, select, delete, PRD/BRD)
    #[command(subcommand)]
    Project(ProjectCommands),

    /// Epic management
    #[command(subcommand)]
    Epic(EpicCommands),

    /// User story management
    #[command(subcommand)]
    Story(StoryCommands),

    /// Sprint board and capacity planner
    #[command(subcommand)]
    Sprint(SprintCommands),

    /// Team roster and sprint capacity settings
    #[command(subcommand)]
    Team(TeamCommands),

    /// RACI matrix
    #[command(subcommand)]
    Raci(RaciCommands),

    /// Retrospectives
    #[command(subcommand)]
    Retro(RetroCommands),

    /// Decision log
    #[command(subcommand)]
    Decision(DecisionCommands),

    /// Risk register
    #[command(subcommand)]
    Risk(RiskCommands),

    /// Export collections as CSV or documents as Markdown
    #[command(subcommand)]
    Export(ExportCommands),

    /// Show project status dashboard
    Status(StatusArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table for lists, details for single records
    #[default]
    Auto,
    /// JSON format (full fidelity)
    Json,
    /// YAML format
    Yaml,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Auto => "auto",
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
            OutputFormat::Csv => "csv",
            OutputFormat::Md => "md",
            OutputFormat::Id => "id",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <OutputFormat as ValueEnum>::from_str(s, true)
    }
}
