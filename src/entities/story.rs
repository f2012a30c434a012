//! User story entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::entity::Record;
use crate::core::identity::{new_id, IdKind};

/// MoSCoW priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum StoryPriority {
    #[serde(rename = "Must Have")]
    MustHave,
    #[default]
    #[serde(rename = "Should Have")]
    ShouldHave,
    #[serde(rename = "Could Have")]
    CouldHave,
    #[serde(rename = "Won't Have")]
    WontHave,
}

impl fmt::Display for StoryPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoryPriority::MustHave => write!(f, "Must Have"),
            StoryPriority::ShouldHave => write!(f, "Should Have"),
            StoryPriority::CouldHave => write!(f, "Could Have"),
            StoryPriority::WontHave => write!(f, "Won't Have"),
        }
    }
}

impl FromStr for StoryPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_lowercase().replace(['-', '_'], " ").replace('\'', "");
        match normalized.as_str() {
            "must" | "must have" => Ok(StoryPriority::MustHave),
            "should" | "should have" => Ok(StoryPriority::ShouldHave),
            "could" | "could have" => Ok(StoryPriority::CouldHave),
            "wont" | "wont have" => Ok(StoryPriority::WontHave),
            _ => Err(format!("Unknown story priority: {}", s)),
        }
    }
}

/// Story workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum StoryStatus {
    #[default]
    Backlog,
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    Review,
    Done,
}

impl fmt::Display for StoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoryStatus::Backlog => write!(f, "Backlog"),
            StoryStatus::ToDo => write!(f, "To Do"),
            StoryStatus::InProgress => write!(f, "In Progress"),
            StoryStatus::Review => write!(f, "Review"),
            StoryStatus::Done => write!(f, "Done"),
        }
    }
}

impl FromStr for StoryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], " ").as_str() {
            "backlog" => Ok(StoryStatus::Backlog),
            "to do" | "todo" => Ok(StoryStatus::ToDo),
            "in progress" => Ok(StoryStatus::InProgress),
            "review" => Ok(StoryStatus::Review),
            "done" => Ok(StoryStatus::Done),
            _ => Err(format!("Unknown story status: {}", s)),
        }
    }
}

/// Fields supplied when creating a story
#[derive(Debug, Clone, Default)]
pub struct StoryDraft {
    pub role: String,
    pub action: String,
    pub benefit: String,
    pub acceptance_criteria: Vec<String>,
    pub story_points: u32,
    pub priority: StoryPriority,
}

/// A user story
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: String,
    pub role: String,
    pub action: String,
    #[serde(default)]
    pub benefit: String,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    #[serde(default)]
    pub story_points: u32,
    #[serde(default)]
    pub priority: StoryPriority,
    #[serde(default)]
    pub status: StoryStatus,
    pub created_at: DateTime<Utc>,
    /// Manual sort key; ties keep collection order
    #[serde(default)]
    pub order: f64,
}

impl Story {
    /// Create a story ordered after every story in `existing`
    pub fn new(draft: StoryDraft, existing: &[Story]) -> Self {
        let order = existing
            .iter()
            .map(|s| s.order)
            .fold(0.0_f64, f64::max)
            + 1.0;
        Self {
            id: new_id(IdKind::Story),
            role: draft.role,
            action: draft.action,
            benefit: draft.benefit,
            acceptance_criteria: draft.acceptance_criteria,
            story_points: draft.story_points,
            priority: draft.priority,
            status: StoryStatus::default(),
            created_at: Utc::now(),
            order,
        }
    }

    /// "As a <role>, I want <action>, so that <benefit>"
    pub fn sentence(&self) -> String {
        story_sentence(&self.role, &self.action, &self.benefit)
    }
}

/// Render the canonical story sentence; the benefit clause is optional
pub fn story_sentence(role: &str, action: &str, benefit: &str) -> String {
    if benefit.trim().is_empty() {
        format!("As a {}, I want {}", role, action)
    } else {
        format!("As a {}, I want {}, so that {}", role, action, benefit)
    }
}

impl Record for Story {
    const KIND: &'static str = "story";

    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> String {
        self.sentence()
    }
}

/// Stable sort by `order`; equal keys keep their relative position
pub fn sort_by_order(stories: &mut [Story]) {
    stories.sort_by(|a, b| a.order.partial_cmp(&b.order).unwrap_or(std::cmp::Ordering::Equal));
}

/// Move a story to `position` (0-based, clamped) in display order and
/// renumber every story's `order` as 1, 2, 3, ...
///
/// Returns false if the id is unknown.
pub fn move_story(stories: &mut Vec<Story>, id: &str, position: usize) -> bool {
    sort_by_order(stories);
    let Some(from) = stories.iter().position(|s| s.id == id) else {
        return false;
    };
    let story = stories.remove(from);
    let to = position.min(stories.len());
    stories.insert(to, story);
    for (i, story) in stories.iter_mut().enumerate() {
        story.order = (i + 1) as f64;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(action: &str) -> StoryDraft {
        StoryDraft {
            role: "user".to_string(),
            action: action.to_string(),
            ..Default::default()
        }
    }

    fn push(stories: &mut Vec<Story>, action: &str) -> String {
        let story = Story::new(draft(action), stories);
        let id = story.id.clone();
        stories.push(story);
        id
    }

    #[test]
    fn test_new_story_orders_after_existing() {
        let mut stories = Vec::new();
        push(&mut stories, "a");
        push(&mut stories, "b");
        assert_eq!(stories[0].order, 1.0);
        assert_eq!(stories[1].order, 2.0);
        assert_eq!(stories[1].status, StoryStatus::Backlog);
    }

    #[test]
    fn test_move_story_renumbers() {
        let mut stories = Vec::new();
        push(&mut stories, "a");
        push(&mut stories, "b");
        let c = push(&mut stories, "c");

        assert!(move_story(&mut stories, &c, 0));
        let actions: Vec<_> = stories.iter().map(|s| s.action.as_str()).collect();
        assert_eq!(actions, ["c", "a", "b"]);
        let orders: Vec<_> = stories.iter().map(|s| s.order).collect();
        assert_eq!(orders, [1.0, 2.0, 3.0]);

        assert!(!move_story(&mut stories, "missing", 0));
    }

    #[test]
    fn test_sort_keeps_ties_stable() {
        let mut stories = Vec::new();
        push(&mut stories, "a");
        push(&mut stories, "b");
        for s in stories.iter_mut() {
            s.order = 5.0;
        }
        sort_by_order(&mut stories);
        assert_eq!(stories[0].action, "a");
    }

    #[test]
    fn test_sentence() {
        let mut story = Story::new(draft("to log in"), &[]);
        assert_eq!(story.sentence(), "As a user, I want to log in");
        story.benefit = "I can see my data".to_string();
        assert_eq!(
            story.sentence(),
            "As a user, I want to log in, so that I can see my data"
        );
    }

    #[test]
    fn test_priority_and_status_parse() {
        assert_eq!("won't have".parse::<StoryPriority>().unwrap(), StoryPriority::WontHave);
        assert_eq!("must".parse::<StoryPriority>().unwrap(), StoryPriority::MustHave);
        assert_eq!("todo".parse::<StoryStatus>().unwrap(), StoryStatus::ToDo);
        assert_eq!(
            serde_json::to_string(&StoryPriority::WontHave).unwrap(),
            "\"Won't Have\""
        );
    }
}
