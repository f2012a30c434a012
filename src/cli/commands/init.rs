//! `awb init` command - Initialize a new workspace

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::GlobalOpts;
use crate::core::config::BackendKind;
use crate::core::registry;
use crate::core::workspace::{Workspace, WorkspaceError};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Storage backend
    #[arg(long, short = 'b', default_value = "files")]
    pub backend: BackendKind,

    /// Create a first project with this name
    #[arg(long)]
    pub project: Option<String>,

    /// Force initialization even if .awb/ already exists
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs, global: &GlobalOpts) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    let workspace = match Workspace::init(&path, args.backend, args.force) {
        Ok(workspace) => workspace,
        Err(WorkspaceError::AlreadyExists(root)) => {
            println!(
                "{} awb workspace already exists at {}",
                style("!").yellow(),
                style(root.display()).cyan()
            );
            println!("  Use {} to reinitialize", style("--force").yellow());
            return Ok(());
        }
        Err(e) => return Err(miette::miette!("{}", e)),
    };

    if !global.quiet {
        println!(
            "{} Initialized awb workspace at {} ({} backend)",
            style("✓").green(),
            style(workspace.root().display()).cyan(),
            args.backend
        );
    }

    if let Some(name) = args.project.as_deref() {
        let config = workspace.config();
        let mut store = workspace
            .open_store(&config)
            .map_err(|e| miette::miette!("{}", e))?;
        let project = registry::create_project(&mut store, name, "")
            .map_err(|e| miette::miette!("{}", e))?;
        crate::cli::helpers::print_warnings(&mut store);
        if !global.quiet {
            println!(
                "{} Created project {} ({})",
                style("✓").green(),
                style(&project.project_name).cyan(),
                project.id
            );
        }
    } else if !global.quiet {
        println!();
        println!("Next steps:");
        println!("  {} Create your first project", style("awb project new <NAME>").yellow());
        println!("  {} Add an epic", style("awb epic new <TITLE>").yellow());
    }

    Ok(())
}
