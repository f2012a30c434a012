//! Shared helper functions for CLI commands
//!
//! This module contains utility functions that are used across multiple
//! command modules to avoid code duplication.

use chrono::NaiveDate;
use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::io::{self, Write};
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::Record;
use crate::core::identity::match_id;
use crate::core::scope::{load_root, ProjectContext};
use crate::core::store::Store;
use crate::core::tool::ToolKey;
use crate::core::workspace::Workspace;
use crate::entities::project::Project;
use crate::entities::sprint::{current_sprint, Sprint};

/// An open workspace and its store for the duration of one command.
///
/// Store warnings collected while the command runs are printed when the
/// session is dropped, so they surface even when the command fails.
pub struct Session {
    pub workspace: Workspace,
    pub store: Store,
    format: OutputFormat,
}

impl Session {
    pub fn open(global: &GlobalOpts) -> Result<Self> {
        let workspace = match &global.workspace {
            Some(path) => Workspace::open(path),
            None => Workspace::discover(),
        }
        .map_err(|e| miette::miette!("{}", e))?;

        let config = workspace.config();
        let store = workspace
            .open_store(&config)
            .map_err(|e| miette::miette!("{}", e))?;

        let format = match global.format {
            OutputFormat::Auto => config
                .default_format
                .as_deref()
                .and_then(|f| f.parse().ok())
                .unwrap_or(OutputFormat::Auto),
            other => other,
        };

        Ok(Self {
            workspace,
            store,
            format,
        })
    }

    /// Output format after applying the workspace default
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// The active project, or an error telling the user to pick one
    pub fn project(&self) -> Result<ProjectContext> {
        ProjectContext::active(&self.store).map_err(|e| miette::miette!("{}", e))
    }

    /// The active project's full record
    pub fn active_project(&self) -> Result<Project> {
        load_root(&self.store)
            .active()
            .cloned()
            .ok_or_else(|| miette::miette!("no active project; create or select a project first"))
    }

    pub fn load<T: Record>(&self, ctx: &ProjectContext, tool: ToolKey) -> Vec<T> {
        ctx.load_list(&self.store, tool)
    }

    /// Save and report whether the write reached the backend
    pub fn save<T: Serialize + ?Sized>(&mut self, ctx: &ProjectContext, tool: ToolKey, data: &T) -> bool {
        ctx.save(&mut self.store, tool, data).is_written()
    }

    /// Sprints for the project; a synthesized default sprint is persisted
    /// so its id stays stable between commands
    pub fn sprints(&mut self, ctx: &ProjectContext) -> Vec<Sprint> {
        let stored = self.store.contains(&ctx.key(ToolKey::Sprints));
        let sprints = ctx.load_sprints(&self.store);
        if !stored {
            self.save(ctx, ToolKey::Sprints, &sprints);
        }
        sprints
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        print_warnings(&mut self.store);
    }
}

/// Print and clear any warnings the store collected
pub fn print_warnings(store: &mut Store) {
    for warning in store.take_warnings() {
        eprintln!("{} {}", style("!").yellow(), warning);
    }
}

/// Print a success line unless quiet
pub fn success(global: &GlobalOpts, message: impl std::fmt::Display) {
    if !global.quiet {
        println!("{} {}", style("✓").green(), message);
    }
}

/// Report a save: success line when written, nothing extra otherwise
/// (the store warning explains the failure)
pub fn report_saved(global: &GlobalOpts, written: bool, message: impl std::fmt::Display) -> Result<()> {
    if written {
        success(global, message);
        Ok(())
    } else {
        Err(miette::miette!("changes were not saved"))
    }
}

/// Find a record by id or unique id prefix
pub fn pick<'a, T: Record>(records: &'a [T], query: &str) -> Result<&'a T> {
    let index = pick_index(records, query)?;
    Ok(&records[index])
}

/// Position of a record by id or unique id prefix
pub fn pick_index<T: Record>(records: &[T], query: &str) -> Result<usize> {
    let id = match_id(query.trim(), records.iter().map(|r| r.id()))
        .ok_or_else(|| miette::miette!("No {} matches '{}'", T::KIND, query))?;
    records
        .iter()
        .position(|r| r.id() == id)
        .ok_or_else(|| miette::miette!("No {} matches '{}'", T::KIND, query))
}

/// Sprint named on the command line, else the current sprint
pub fn pick_sprint(sprints: &[Sprint], query: Option<&str>) -> Result<usize> {
    match query {
        Some(q) => {
            if let Some(i) = sprints
                .iter()
                .position(|s| s.name.eq_ignore_ascii_case(q.trim()))
            {
                return Ok(i);
            }
            pick_index(sprints, q)
        }
        None => {
            let current = current_sprint(sprints)
                .ok_or_else(|| miette::miette!("project has no sprints"))?;
            pick_index(sprints, &current.id)
        }
    }
}

/// Ask for confirmation unless `yes` was given
pub fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .into_diagnostic()
}

/// Parse a YYYY-MM-DD date argument
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| miette::miette!("Invalid date '{}': expected YYYY-MM-DD", s))
}

/// Split a `;`-separated argument into trimmed, non-empty parts
pub fn split_list(s: &str) -> Vec<String> {
    s.split(';')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Display text for an optional or blank value
pub fn or_dash(s: &str) -> String {
    if s.trim().is_empty() {
        "-".to_string()
    } else {
        s.to_string()
    }
}

/// Print a collection in the requested format.
///
/// Table formats use `headers` and `row`; JSON and YAML serialize the
/// records themselves; `id` prints one id per line.
pub fn print_list<T: Record>(
    format: OutputFormat,
    records: &[T],
    headers: &[&str],
    empty: &str,
    row: impl Fn(&T) -> Vec<String>,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(records).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(records).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Id => {
            for record in records {
                println!("{}", record.id());
            }
        }
        OutputFormat::Csv => {
            let mut writer = ::csv::Writer::from_writer(io::stdout());
            writer.write_record(headers).into_diagnostic()?;
            for record in records {
                writer.write_record(row(record)).into_diagnostic()?;
            }
            writer.flush().into_diagnostic()?;
        }
        OutputFormat::Auto | OutputFormat::Md => {
            if records.is_empty() {
                println!("{}", empty);
                return Ok(());
            }
            print_table(format, headers, records.iter().map(row));
            if format == OutputFormat::Auto {
                println!();
                println!("{} record(s)", style(records.len()).cyan());
            }
        }
    }
    Ok(())
}

/// Render rows as a table: markdown style for `md`, psql style otherwise
pub fn print_table(format: OutputFormat, headers: &[&str], rows: impl Iterator<Item = Vec<String>>) {
    let mut builder = Builder::default();
    builder.push_record(headers.iter().map(|h| h.to_string()));
    for row in rows {
        builder.push_record(row);
    }
    let mut table = builder.build();
    if format == OutputFormat::Md {
        table.with(Style::markdown());
    } else {
        table.with(Style::psql());
    }
    println!("{}", table);
}

/// Print one record: serialized for json/yaml/id, else via `human`
pub fn print_detail<T: Record>(format: OutputFormat, record: &T, human: impl FnOnce()) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(record).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(record).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Id => println!("{}", record.id()),
        _ => human(),
    }
    Ok(())
}

/// Print a labeled field in detail views
pub fn field(label: &str, value: impl std::fmt::Display) {
    println!("{:<14} {}", style(format!("{}:", label)).bold(), value);
}

/// Write `content` to `path`, or stdout when no path is given
pub fn write_output(path: Option<&std::path::Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, content).into_diagnostic(),
        None => {
            let mut stdout = io::stdout();
            stdout.write_all(content.as_bytes()).into_diagnostic()?;
            stdout.flush().into_diagnostic()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::team::TeamMember;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("héllo wörld", 8), "héllo...");
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("a; b ;;c"), vec!["a", "b", "c"]);
        assert!(split_list("  ").is_empty());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-05-10").unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
        );
        assert!(parse_date("10/05/2024").is_err());
    }

    #[test]
    fn test_pick_by_prefix() {
        let a = TeamMember::new("Alice", "Dev", 6.0);
        let b = TeamMember::new("Bob", "QA", 6.0);
        let roster = vec![a.clone(), b];
        assert_eq!(pick(&roster, &a.id).unwrap().name, "Alice");
        assert!(pick(&roster, "MEMBER-").is_err());
        assert!(pick(&roster, "nope").is_err());
    }

    #[test]
    fn test_pick_sprint_by_name() {
        let sprints = vec![Sprint::new("Sprint 1"), Sprint::new("Sprint 2")];
        assert_eq!(pick_sprint(&sprints, Some("sprint 2")).unwrap(), 1);
        assert_eq!(pick_sprint(&sprints, None).unwrap(), 0);
    }
}
