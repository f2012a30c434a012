//! Cross-entity references
//!
//! Nothing in storage enforces a foreign key. References are plain id (or
//! name) strings, and every read resolves them explicitly against the target
//! collection. A reference that no longer resolves is *dangling*: it is
//! reported, never repaired and never an error.
//!
//! Reverse lookups (which epics contain a story) are derived by scanning the
//! owning side and rebuilt before each use; they are never persisted.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use crate::core::entity::Record;
use crate::entities::decision::Decision;
use crate::entities::epic::Epic;
use crate::entities::retro::RetroSession;
use crate::entities::sprint::Sprint;
use crate::entities::story::Story;
use crate::entities::team::TeamMember;

/// Typed id reference to a record of type `T`.
///
/// Serializes as the bare id string.
pub struct Ref<T> {
    id: String,
    _target: PhantomData<fn() -> T>,
}

pub type StoryRef = Ref<Story>;
pub type SprintRef = Ref<Sprint>;
pub type EpicRef = Ref<Epic>;

impl<T> Ref<T> {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            _target: PhantomData,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl<T: Record> Ref<T> {
    /// Look the target up by exact id
    pub fn resolve<'a>(&'a self, targets: &'a [T]) -> Resolution<'a, T> {
        match targets.iter().find(|t| t.id() == self.id) {
            Some(target) => Resolution::Found(target),
            None => Resolution::Dangling(&self.id),
        }
    }
}

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        Self::new(self.id.clone())
    }
}

impl<T> PartialEq for Ref<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Ref<T> {}

impl<T> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Ref").field(&self.id).finish()
    }
}

impl<T> fmt::Display for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<T> Serialize for Ref<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.id)
    }
}

impl<'de, T> Deserialize<'de> for Ref<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Ref::new)
    }
}

/// Outcome of resolving an id reference
#[derive(Debug, PartialEq)]
pub enum Resolution<'a, T> {
    /// The target exists
    Found(&'a T),
    /// No target with this id exists (any more)
    Dangling(&'a str),
}

impl<'a, T> Resolution<'a, T> {
    pub fn found(&self) -> Option<&'a T> {
        match self {
            Resolution::Found(t) => Some(*t),
            Resolution::Dangling(_) => None,
        }
    }

    pub fn is_dangling(&self) -> bool {
        matches!(self, Resolution::Dangling(_))
    }
}

impl<'a, T: Record> Resolution<'a, T> {
    /// Label of the target, or a "not found" marker naming the id
    pub fn describe(&self) -> String {
        match self {
            Resolution::Found(t) => format!("{} {}", t.id(), t.label()),
            Resolution::Dangling(id) => format!("{} (not found)", id),
        }
    }
}

/// Resolve an optional reference; `None` means "no reference", not dangling
pub fn resolve_opt<'a, T: Record>(
    reference: Option<&'a Ref<T>>,
    targets: &'a [T],
) -> Option<Resolution<'a, T>> {
    reference.map(|r| r.resolve(targets))
}

// =========================================================================
// Name references (people)
// =========================================================================

/// Outcome of resolving a free-text person name against the team roster
#[derive(Debug, PartialEq)]
pub enum NameResolution<'a> {
    /// Matches a roster member (case-insensitive exact equality)
    Linked(&'a TeamMember),
    /// Valid data that matches nobody; displayed as typed
    Unlinked(&'a str),
    /// Blank name
    Empty,
}

/// Resolve a person name by case-insensitive equality
pub fn resolve_name<'a>(name: &'a str, roster: &'a [TeamMember]) -> NameResolution<'a> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return NameResolution::Empty;
    }
    match roster.iter().find(|m| names_match(&m.name, trimmed)) {
        Some(member) => NameResolution::Linked(member),
        None => NameResolution::Unlinked(name),
    }
}

/// Name equality used for every person reference
pub fn names_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

// =========================================================================
// Reverse index
// =========================================================================

/// Story id → ids of every epic whose `linkedStories` contains it.
///
/// Derived from the epic collection; build it fresh before each use.
#[derive(Debug, Default)]
pub struct EpicIndex {
    by_story: HashMap<String, Vec<String>>,
}

impl EpicIndex {
    pub fn build(epics: &[Epic]) -> Self {
        let mut by_story: HashMap<String, Vec<String>> = HashMap::new();
        for epic in epics {
            for story in &epic.linked_stories {
                let owners = by_story.entry(story.id().to_string()).or_default();
                if !owners.iter().any(|e| e == &epic.id) {
                    owners.push(epic.id.clone());
                }
            }
        }
        Self { by_story }
    }

    /// Epics linking the story, in epic collection order
    pub fn epics_for(&self, story_id: &str) -> &[String] {
        self.by_story.get(story_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First epic linking the story
    pub fn primary_epic(&self, story_id: &str) -> Option<&str> {
        self.epics_for(story_id).first().map(String::as_str)
    }
}

// =========================================================================
// Reference report
// =========================================================================

/// A reference that does not resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingRef {
    /// Record holding the reference
    pub source: String,
    /// Field holding the reference
    pub field: &'static str,
    /// Id that failed to resolve
    pub target: String,
}

impl fmt::Display for DanglingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} -> {} (not found)", self.source, self.field, self.target)
    }
}

/// Every id reference in a project's collections that does not resolve.
///
/// Read-only: callers decide what to show; nothing is repaired.
pub fn find_dangling(
    epics: &[Epic],
    stories: &[Story],
    sprints: &[Sprint],
    retros: &[RetroSession],
    decisions: &[Decision],
) -> Vec<DanglingRef> {
    let mut out = Vec::new();

    for epic in epics {
        for story in &epic.linked_stories {
            if story.resolve(stories).is_dangling() {
                out.push(DanglingRef {
                    source: epic.id.clone(),
                    field: "linkedStories",
                    target: story.id().to_string(),
                });
            }
        }
    }

    for sprint in sprints {
        for item in &sprint.items {
            if let Some(Resolution::Dangling(id)) = resolve_opt(item.story_id.as_ref(), stories) {
                out.push(DanglingRef {
                    source: item.id.clone(),
                    field: "storyId",
                    target: id.to_string(),
                });
            }
        }
        for plan in &sprint.planner_backlog {
            if let Some(Resolution::Dangling(id)) = resolve_opt(plan.story_id.as_ref(), stories) {
                out.push(DanglingRef {
                    source: plan.id.clone(),
                    field: "storyId",
                    target: id.to_string(),
                });
            }
        }
    }

    for retro in retros {
        if let Some(Resolution::Dangling(id)) = resolve_opt(retro.sprint_id.as_ref(), sprints) {
            out.push(DanglingRef {
                source: retro.id.clone(),
                field: "sprintId",
                target: id.to_string(),
            });
        }
    }

    for decision in decisions {
        if let Some(Resolution::Dangling(id)) = resolve_opt(decision.sprint_id.as_ref(), sprints) {
            out.push(DanglingRef {
                source: decision.id.clone(),
                field: "sprintId",
                target: id.to_string(),
            });
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::epic::EpicDraft;
    use crate::entities::story::StoryDraft;

    fn story(role: &str) -> Story {
        Story::new(
            StoryDraft {
                role: role.to_string(),
                action: "log in".to_string(),
                benefit: "see my data".to_string(),
                ..Default::default()
            },
            &[],
        )
    }

    fn epic(existing: &[Epic], title: &str) -> Epic {
        Epic::new(
            EpicDraft {
                title: title.to_string(),
                ..Default::default()
            },
            existing,
        )
    }

    #[test]
    fn test_resolve_found_and_dangling() {
        let stories = vec![story("user")];
        let found: StoryRef = Ref::new(stories[0].id.clone());
        let missing: StoryRef = Ref::new("STORY-GONE");

        assert_eq!(found.resolve(&stories).found().unwrap().role, "user");
        assert_eq!(missing.resolve(&stories), Resolution::Dangling("STORY-GONE"));
        assert_eq!(missing.resolve(&stories).describe(), "STORY-GONE (not found)");
    }

    #[test]
    fn test_ref_serializes_as_string() {
        let r: StoryRef = Ref::new("S1");
        assert_eq!(serde_json::to_string(&r).unwrap(), "\"S1\"");
        let back: StoryRef = serde_json::from_str("\"S1\"").unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn test_resolve_name_case_insensitive() {
        let roster = vec![TeamMember::new("Jane Smith", "Developer", 6.0)];
        assert!(matches!(
            resolve_name("jane smith", &roster),
            NameResolution::Linked(m) if m.name == "Jane Smith"
        ));
        assert_eq!(resolve_name("Jane", &roster), NameResolution::Unlinked("Jane"));
        assert_eq!(resolve_name("  ", &roster), NameResolution::Empty);
    }

    #[test]
    fn test_epic_index_multiple_owners() {
        let s = story("user");
        let mut epics = Vec::new();
        let mut a = epic(&epics, "A");
        a.link_story(&s.id);
        epics.push(a);
        let mut b = epic(&epics, "B");
        b.link_story(&s.id);
        epics.push(b);

        let index = EpicIndex::build(&epics);
        assert_eq!(index.epics_for(&s.id), ["EPIC-001", "EPIC-002"]);
        assert_eq!(index.primary_epic(&s.id), Some("EPIC-001"));
        assert!(index.epics_for("other").is_empty());
    }

    #[test]
    fn test_find_dangling_reports_epic_links() {
        let s = story("user");
        let mut e = epic(&[], "Login");
        e.link_story(&s.id);
        e.link_story("STORY-GONE");

        let report = find_dangling(&[e], &[s], &[], &[], &[]);
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].target, "STORY-GONE");
        assert_eq!(report[0].field, "linkedStories");
    }
}
