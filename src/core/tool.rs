//! Registry of project-scoped documents
//!
//! Every document stored per project is listed here exactly once. Project
//! deletion and legacy migration walk [`ToolKey::all`], so a tool that writes
//! a scoped key without registering it here would leak storage.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Project-scoped document kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolKey {
    /// Epic list
    Epics,
    /// User story list
    Stories,
    /// Sprints with their board and planner items
    Sprints,
    /// Team roster
    Team,
    /// Capacity planner settings
    SprintConfig,
    /// RACI matrix state
    Raci,
    /// Retrospective sessions
    Retros,
    /// Decision log
    Decisions,
    /// Risk register
    Risks,
}

impl ToolKey {
    /// Storage key stem for this tool
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKey::Epics => "epics",
            ToolKey::Stories => "stories",
            ToolKey::Sprints => "sprints",
            ToolKey::Team => "team",
            ToolKey::SprintConfig => "sprint-config",
            ToolKey::Raci => "raci",
            ToolKey::Retros => "retros",
            ToolKey::Decisions => "decisions",
            ToolKey::Risks => "risks",
        }
    }

    /// Every registered tool
    pub fn all() -> &'static [ToolKey] {
        &[
            ToolKey::Epics,
            ToolKey::Stories,
            ToolKey::Sprints,
            ToolKey::Team,
            ToolKey::SprintConfig,
            ToolKey::Raci,
            ToolKey::Retros,
            ToolKey::Decisions,
            ToolKey::Risks,
        ]
    }

    /// Storage key of this tool's document for `project_id`
    pub fn scoped_key(&self, project_id: &str) -> String {
        format!("{}-{}", self.as_str(), project_id)
    }

    /// Split a scoped key back into its tool, given the owning project id
    pub fn from_scoped_key(key: &str, project_id: &str) -> Option<Self> {
        let stem = key.strip_suffix(project_id)?.strip_suffix('-')?;
        stem.parse().ok()
    }
}

impl fmt::Display for ToolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ToolKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolKey::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown tool: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tool_names_unique() {
        let names: HashSet<_> = ToolKey::all().iter().map(|t| t.as_str()).collect();
        assert_eq!(names.len(), ToolKey::all().len());
    }

    #[test]
    fn test_scoped_key_roundtrip() {
        for tool in ToolKey::all() {
            let key = tool.scoped_key("PROJ-01ABC");
            assert_eq!(ToolKey::from_scoped_key(&key, "PROJ-01ABC"), Some(*tool));
        }
        assert_eq!(ToolKey::Epics.scoped_key("p1"), "epics-p1");
        assert_eq!(ToolKey::from_scoped_key("epics-p1", "p2"), None);
    }

    #[test]
    fn test_hyphenated_tool_parses() {
        assert_eq!("sprint-config".parse::<ToolKey>().unwrap(), ToolKey::SprintConfig);
        assert!("projects".parse::<ToolKey>().is_err());
    }
}
