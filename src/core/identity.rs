//! Record identity: type-prefixed ULIDs and sequential epic numbers
//!
//! Ids are opaque strings. Generated ids are `<PREFIX>-<ULID>`, i.e. a
//! millisecond timestamp followed by random bits, which is collision-free for
//! practical single-user use but not globally ordered across machines.
//! Epics are the exception: they are numbered `EPIC-001`, `EPIC-002`, ...
//! by scanning the ids already present in the project.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Prefix used by sequential epic ids
pub const EPIC_PREFIX: &str = "EPIC";

/// Record kinds that receive generated ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IdKind {
    /// Project (root aggregate)
    Proj,
    /// User story
    Story,
    /// Sprint
    Sprint,
    /// Board item inside a sprint
    Item,
    /// Planner backlog item inside a sprint
    Plan,
    /// Board item comment
    Cmt,
    /// Team member
    Member,
    /// RACI task
    Task,
    /// RACI stakeholder
    Stk,
    /// Retro session
    Retro,
    /// Retro card
    Card,
    /// Retro action item
    Act,
    /// Decision log entry
    Dec,
    /// Risk register entry
    Risk,
}

impl IdKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdKind::Proj => "PROJ",
            IdKind::Story => "STORY",
            IdKind::Sprint => "SPRINT",
            IdKind::Item => "ITEM",
            IdKind::Plan => "PLAN",
            IdKind::Cmt => "CMT",
            IdKind::Member => "MEMBER",
            IdKind::Task => "TASK",
            IdKind::Stk => "STK",
            IdKind::Retro => "RETRO",
            IdKind::Card => "CARD",
            IdKind::Act => "ACT",
            IdKind::Dec => "DEC",
            IdKind::Risk => "RISK",
        }
    }

    pub fn all() -> &'static [IdKind] {
        &[
            IdKind::Proj,
            IdKind::Story,
            IdKind::Sprint,
            IdKind::Item,
            IdKind::Plan,
            IdKind::Cmt,
            IdKind::Member,
            IdKind::Task,
            IdKind::Stk,
            IdKind::Retro,
            IdKind::Card,
            IdKind::Act,
            IdKind::Dec,
            IdKind::Risk,
        ]
    }

    /// Guess the kind of an id from its prefix
    pub fn from_id(id: &str) -> Option<Self> {
        let (prefix, _) = id.split_once('-')?;
        prefix.parse().ok()
    }
}

impl fmt::Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IdKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        IdKind::all()
            .iter()
            .copied()
            .find(|k| k.as_str() == upper)
            .ok_or_else(|| format!("Unknown id prefix: {}", s))
    }
}

/// Generate a fresh id for a record of `kind`
pub fn new_id(kind: IdKind) -> String {
    format!("{}-{}", kind, Ulid::new())
}

/// Next sequential epic id, one past the highest `EPIC-###` present.
///
/// Ids that do not follow the pattern are ignored. Gaps are not reused.
pub fn next_epic_id<'a>(existing: impl IntoIterator<Item = &'a str>) -> String {
    let max = existing
        .into_iter()
        .filter_map(epic_number)
        .max()
        .unwrap_or(0);
    format!("{}-{:03}", EPIC_PREFIX, max.saturating_add(1))
}

/// Numeric part of an `EPIC-###` id
pub fn epic_number(id: &str) -> Option<u64> {
    let (prefix, number) = id.split_once('-')?;
    if !prefix.eq_ignore_ascii_case(EPIC_PREFIX) {
        return None;
    }
    number.parse().ok()
}

/// Find a record id by exact match, then by unique case-insensitive prefix
///
/// Lets CLI users type `STORY-01J8` instead of the full ULID.
pub fn match_id<'a>(query: &str, ids: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let ids: Vec<&str> = ids.into_iter().collect();
    if let Some(exact) = ids.iter().find(|id| **id == query) {
        return Some(*exact);
    }
    let upper = query.to_uppercase();
    let mut matches = ids.iter().filter(|id| id.to_uppercase().starts_with(&upper));
    match (matches.next(), matches.next()) {
        (Some(only), None) => Some(*only),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id_has_prefix() {
        let id = new_id(IdKind::Story);
        assert!(id.starts_with("STORY-"));
        assert_eq!(id.len(), "STORY-".len() + 26);
        assert_eq!(IdKind::from_id(&id), Some(IdKind::Story));
    }

    #[test]
    fn test_new_ids_differ() {
        assert_ne!(new_id(IdKind::Risk), new_id(IdKind::Risk));
    }

    #[test]
    fn test_next_epic_id_empty() {
        assert_eq!(next_epic_id(Vec::<&str>::new()), "EPIC-001");
    }

    #[test]
    fn test_next_epic_id_scans_max() {
        let ids = ["EPIC-001", "EPIC-007", "EPIC-003", "custom"];
        assert_eq!(next_epic_id(ids), "EPIC-008");
    }

    #[test]
    fn test_next_epic_id_past_three_digits() {
        assert_eq!(next_epic_id(["EPIC-999"]), "EPIC-1000");
    }

    #[test]
    fn test_next_epic_id_past_u32_max() {
        assert_eq!(next_epic_id(["EPIC-4294967295"]), "EPIC-4294967296");
        assert_eq!(next_epic_id(["EPIC-4294967296"]), "EPIC-4294967297");
    }

    #[test]
    fn test_match_id_prefix() {
        let ids = ["STORY-01AAA", "STORY-01BBB", "EPIC-001"];
        assert_eq!(match_id("EPIC-001", ids), Some("EPIC-001"));
        assert_eq!(match_id("story-01a", ids), Some("STORY-01AAA"));
        // Ambiguous prefix
        assert_eq!(match_id("STORY-01", ids), None);
        assert_eq!(match_id("nope", ids), None);
    }
}
