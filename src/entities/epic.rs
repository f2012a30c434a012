//! Epic entity - a grouping of stories toward a larger goal

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::entity::Record;
use crate::core::identity::next_epic_id;
use crate::core::refs::{Resolution, StoryRef};
use crate::entities::story::{Story, StoryStatus};

/// Epic priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EpicPriority {
    High,
    #[default]
    Medium,
    Low,
}

impl fmt::Display for EpicPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EpicPriority::High => write!(f, "High"),
            EpicPriority::Medium => write!(f, "Medium"),
            EpicPriority::Low => write!(f, "Low"),
        }
    }
}

impl FromStr for EpicPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(EpicPriority::High),
            "medium" => Ok(EpicPriority::Medium),
            "low" => Ok(EpicPriority::Low),
            _ => Err(format!("Unknown epic priority: {}", s)),
        }
    }
}

/// Epic status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EpicStatus {
    #[default]
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    Complete,
    Blocked,
}

impl fmt::Display for EpicStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EpicStatus::NotStarted => write!(f, "Not Started"),
            EpicStatus::InProgress => write!(f, "In Progress"),
            EpicStatus::Complete => write!(f, "Complete"),
            EpicStatus::Blocked => write!(f, "Blocked"),
        }
    }
}

impl FromStr for EpicStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], " ").as_str() {
            "not started" => Ok(EpicStatus::NotStarted),
            "in progress" => Ok(EpicStatus::InProgress),
            "complete" => Ok(EpicStatus::Complete),
            "blocked" => Ok(EpicStatus::Blocked),
            _ => Err(format!("Unknown epic status: {}", s)),
        }
    }
}

/// Fields supplied when creating an epic
#[derive(Debug, Clone, Default)]
pub struct EpicDraft {
    pub title: String,
    pub description: String,
    pub priority: EpicPriority,
    pub status: EpicStatus,
    pub source: String,
    pub features: Vec<String>,
    pub test_cases: Vec<String>,
}

/// An epic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Epic {
    /// `EPIC-###`, sequential per project
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: EpicPriority,
    #[serde(default)]
    pub status: EpicStatus,
    /// Where the epic came from (free text, e.g. "PRD")
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub test_cases: Vec<String>,
    /// Stories grouped under this epic; may contain ids of deleted stories
    #[serde(default)]
    pub linked_stories: Vec<StoryRef>,
    pub created_at: DateTime<Utc>,
}

/// Completion of an epic's linked stories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EpicProgress {
    /// Linked ids that resolve to a story
    pub resolved: usize,
    /// Resolved stories in `Done`
    pub done: usize,
    /// Linked ids that no longer resolve
    pub dangling: usize,
}

impl EpicProgress {
    /// Percentage of resolved stories that are done
    pub fn percent(&self) -> u8 {
        if self.resolved == 0 {
            return 0;
        }
        ((self.done * 100) / self.resolved) as u8
    }
}

impl Epic {
    /// Create an epic numbered after the highest id in `existing`
    pub fn new(draft: EpicDraft, existing: &[Epic]) -> Self {
        Self {
            id: next_epic_id(existing.iter().map(|e| e.id.as_str())),
            title: draft.title,
            description: draft.description,
            priority: draft.priority,
            status: draft.status,
            source: draft.source,
            features: draft.features,
            test_cases: draft.test_cases,
            linked_stories: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Link a story; returns false if it was already linked
    pub fn link_story(&mut self, story_id: &str) -> bool {
        if self.links_story(story_id) {
            return false;
        }
        self.linked_stories.push(StoryRef::new(story_id));
        true
    }

    /// Unlink a story; returns false if it was not linked
    pub fn unlink_story(&mut self, story_id: &str) -> bool {
        let before = self.linked_stories.len();
        self.linked_stories.retain(|s| s.id() != story_id);
        self.linked_stories.len() < before
    }

    pub fn links_story(&self, story_id: &str) -> bool {
        self.linked_stories.iter().any(|s| s.id() == story_id)
    }

    /// Resolve every linked story, in link order
    pub fn resolve_stories<'a>(&'a self, stories: &'a [Story]) -> Vec<Resolution<'a, Story>> {
        self.linked_stories
            .iter()
            .map(|s| s.resolve(stories))
            .collect()
    }

    pub fn progress(&self, stories: &[Story]) -> EpicProgress {
        let mut progress = EpicProgress::default();
        for resolution in self.resolve_stories(stories) {
            match resolution {
                Resolution::Found(story) => {
                    progress.resolved += 1;
                    if story.status == StoryStatus::Done {
                        progress.done += 1;
                    }
                }
                Resolution::Dangling(_) => progress.dangling += 1,
            }
        }
        progress
    }

    /// Sum of story points over resolved linked stories
    pub fn total_points(&self, stories: &[Story]) -> u32 {
        self.resolve_stories(stories)
            .iter()
            .filter_map(Resolution::found)
            .map(|s| s.story_points)
            .fold(0, u32::saturating_add)
    }
}

impl Record for Epic {
    const KIND: &'static str = "epic";

    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> String {
        self.title.clone()
    }
}
