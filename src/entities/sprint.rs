//! Sprint entity: execution board and capacity-planner backlog
//!
//! A completed sprint is read-only. Every method that adds, removes, moves or
//! edits a board or planner item checks [`Sprint::ensure_open`] itself;
//! comments stay allowed after completion.
//!
//! Board items are copies of stories taken at import time and drift from the
//! source story afterwards. The only link back is the one-way status sync in
//! [`Sprint::move_item`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::core::entity::{self, Record};
use crate::core::identity::{new_id, IdKind};
use crate::core::refs::{resolve_opt, Resolution, StoryRef};
use crate::entities::story::{story_sentence, Story, StoryPriority, StoryStatus};

/// Sprint lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SprintStatus {
    #[default]
    Planned,
    Active,
    Completed,
}

impl fmt::Display for SprintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SprintStatus::Planned => write!(f, "planned"),
            SprintStatus::Active => write!(f, "active"),
            SprintStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Board column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Column {
    #[default]
    #[serde(rename = "backlog")]
    Backlog,
    #[serde(rename = "todo")]
    Todo,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "review")]
    Review,
    #[serde(rename = "done")]
    Done,
}

impl Column {
    pub fn all() -> &'static [Column] {
        &[
            Column::Backlog,
            Column::Todo,
            Column::InProgress,
            Column::Review,
            Column::Done,
        ]
    }

    /// Story status a story takes when its board item lands in this column
    pub fn story_status(&self) -> StoryStatus {
        match self {
            Column::Backlog => StoryStatus::Backlog,
            Column::Todo => StoryStatus::ToDo,
            Column::InProgress => StoryStatus::InProgress,
            Column::Review => StoryStatus::Review,
            Column::Done => StoryStatus::Done,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Column::Backlog => write!(f, "backlog"),
            Column::Todo => write!(f, "todo"),
            Column::InProgress => write!(f, "in-progress"),
            Column::Review => write!(f, "review"),
            Column::Done => write!(f, "done"),
        }
    }
}

impl FromStr for Column {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['_', ' '], "-").as_str() {
            "backlog" => Ok(Column::Backlog),
            "todo" | "to-do" => Ok(Column::Todo),
            "in-progress" | "doing" => Ok(Column::InProgress),
            "review" => Ok(Column::Review),
            "done" => Ok(Column::Done),
            _ => Err(format!("Unknown column: {}", s)),
        }
    }
}

/// Who wrote a comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CommentType {
    #[default]
    User,
    Ai,
}

/// A comment on a board item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    #[serde(rename = "type", default)]
    pub comment_type: CommentType,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A story's working copy on the sprint board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardItem {
    pub id: String,
    #[serde(default)]
    pub story_id: Option<StoryRef>,
    /// Planner item this was imported from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planner_item_id: Option<String>,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub benefit: String,
    /// Copied from the story at import time
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    #[serde(default)]
    pub story_points: u32,
    #[serde(default)]
    pub priority: StoryPriority,
    #[serde(default)]
    pub column: Column,
    /// Free-text name, matched against the roster by name
    #[serde(default)]
    pub assignee: String,
    #[serde(default)]
    pub ai_solution: Option<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BoardItem {
    fn blank() -> Self {
        let now = Utc::now();
        Self {
            id: new_id(IdKind::Item),
            story_id: None,
            planner_item_id: None,
            role: String::new(),
            action: String::new(),
            benefit: String::new(),
            acceptance_criteria: Vec::new(),
            story_points: 0,
            priority: StoryPriority::default(),
            column: Column::default(),
            assignee: String::new(),
            ai_solution: None,
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Copy a story onto the board; the copy column follows the story status
    pub fn from_story(story: &Story) -> Self {
        Self {
            story_id: Some(StoryRef::new(story.id.clone())),
            role: story.role.clone(),
            action: story.action.clone(),
            benefit: story.benefit.clone(),
            acceptance_criteria: story.acceptance_criteria.clone(),
            story_points: story.story_points,
            priority: story.priority,
            column: column_for_status(story.status),
            ..Self::blank()
        }
    }

    /// Board item with no backing story
    pub fn from_text(title: &str, story_points: u32) -> Self {
        Self {
            action: title.to_string(),
            story_points,
            ..Self::blank()
        }
    }

    /// Copy a committed planner item, preferring the story's text when it resolves
    pub fn from_planner(item: &PlannerItem, stories: &[Story]) -> Self {
        let mut board_item = match resolve_opt(item.story_id.as_ref(), stories) {
            Some(Resolution::Found(story)) => Self::from_story(story),
            Some(Resolution::Dangling(id)) => Self {
                story_id: Some(StoryRef::new(id)),
                ..Self::from_text(&item.title, item.story_points)
            },
            None => Self::from_text(&item.title, item.story_points),
        };
        board_item.planner_item_id = Some(item.id.clone());
        board_item.story_points = item.story_points;
        board_item.column = Column::Todo;
        board_item
    }

    pub fn title(&self) -> String {
        if self.role.is_empty() {
            self.action.clone()
        } else {
            story_sentence(&self.role, &self.action, &self.benefit)
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Record for BoardItem {
    const KIND: &'static str = "board item";

    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> String {
        self.title()
    }
}

fn column_for_status(status: StoryStatus) -> Column {
    match status {
        StoryStatus::Backlog => Column::Backlog,
        StoryStatus::ToDo => Column::Todo,
        StoryStatus::InProgress => Column::InProgress,
        StoryStatus::Review => Column::Review,
        StoryStatus::Done => Column::Done,
    }
}

/// A capacity-planning copy of a story
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerItem {
    pub id: String,
    #[serde(default)]
    pub story_id: Option<StoryRef>,
    pub title: String,
    #[serde(default)]
    pub story_points: u32,
    #[serde(default)]
    pub estimated_hours: Option<f64>,
    #[serde(default)]
    pub committed: bool,
}

impl PlannerItem {
    pub fn new(title: &str, story_points: u32, estimated_hours: Option<f64>) -> Self {
        Self {
            id: new_id(IdKind::Plan),
            story_id: None,
            title: title.to_string(),
            story_points,
            estimated_hours,
            committed: false,
        }
    }

    pub fn from_story(story: &Story, estimated_hours: Option<f64>) -> Self {
        Self {
            story_id: Some(StoryRef::new(story.id.clone())),
            ..Self::new(&story.sentence(), story.story_points, estimated_hours)
        }
    }

    /// Estimated hours, or points converted at `hours_per_point`
    pub fn hours(&self, hours_per_point: f64) -> f64 {
        self.estimated_hours
            .unwrap_or(self.story_points as f64 * hours_per_point)
    }
}

impl Record for PlannerItem {
    const KIND: &'static str = "planner item";

    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> String {
        self.title.clone()
    }
}

/// Errors from sprint operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SprintError {
    #[error("sprint '{0}' is completed and read-only")]
    Completed(String),

    #[error("board item not found: {0}")]
    ItemNotFound(String),

    #[error("planner item not found: {0}")]
    PlannerItemNotFound(String),

    #[error("cannot move sprint from {from} to {to}")]
    InvalidTransition { from: SprintStatus, to: SprintStatus },
}

/// Result of importing committed planner items onto the board
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Board item ids created
    pub imported: Vec<String>,
    /// Planner item ids skipped because they are already on the board
    pub skipped: Vec<String>,
}

/// A sprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sprint {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: SprintStatus,
    #[serde(default)]
    pub goal: String,
    #[serde(default)]
    pub items: Vec<BoardItem>,
    #[serde(default)]
    pub planner_backlog: Vec<PlannerItem>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Sprint {
    pub fn new(name: &str) -> Self {
        Self {
            id: new_id(IdKind::Sprint),
            name: name.to_string(),
            start_date: None,
            end_date: None,
            status: SprintStatus::default(),
            goal: String::new(),
            items: Vec::new(),
            planner_backlog: Vec::new(),
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == SprintStatus::Completed
    }

    /// Refuse item mutations on a completed sprint
    pub fn ensure_open(&self) -> Result<(), SprintError> {
        if self.is_completed() {
            return Err(SprintError::Completed(self.name.clone()));
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// planned → active
    pub fn start(&mut self) -> Result<(), SprintError> {
        if self.status != SprintStatus::Planned {
            return Err(SprintError::InvalidTransition {
                from: self.status,
                to: SprintStatus::Active,
            });
        }
        self.status = SprintStatus::Active;
        if self.start_date.is_none() {
            self.start_date = Some(Utc::now().date_naive());
        }
        Ok(())
    }

    /// planned | active → completed
    pub fn complete(&mut self) -> Result<(), SprintError> {
        if self.is_completed() {
            return Err(SprintError::InvalidTransition {
                from: self.status,
                to: SprintStatus::Completed,
            });
        }
        self.status = SprintStatus::Completed;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Board
    // ---------------------------------------------------------------------

    pub fn item(&self, item_id: &str) -> Option<&BoardItem> {
        entity::find(&self.items, item_id)
    }

    fn item_mut(&mut self, item_id: &str) -> Result<&mut BoardItem, SprintError> {
        entity::find_mut(&mut self.items, item_id)
            .ok_or_else(|| SprintError::ItemNotFound(item_id.to_string()))
    }

    /// Add a board item; returns its id
    pub fn add_item(&mut self, item: BoardItem) -> Result<String, SprintError> {
        self.ensure_open()?;
        let id = item.id.clone();
        self.items.push(item);
        Ok(id)
    }

    pub fn remove_item(&mut self, item_id: &str) -> Result<BoardItem, SprintError> {
        self.ensure_open()?;
        entity::remove(&mut self.items, item_id)
            .ok_or_else(|| SprintError::ItemNotFound(item_id.to_string()))
    }

    /// Move a board item to `column` and sync the linked story's status.
    ///
    /// Returns the new story status when a linked story was updated, `None`
    /// when the item has no story or its story no longer exists.
    pub fn move_item(
        &mut self,
        item_id: &str,
        column: Column,
        stories: &mut [Story],
    ) -> Result<Option<StoryStatus>, SprintError> {
        self.ensure_open()?;
        let item = self.item_mut(item_id)?;
        item.column = column;
        item.touch();

        let Some(story_ref) = item.story_id.as_ref() else {
            return Ok(None);
        };
        match entity::find_mut(stories, story_ref.id()) {
            Some(story) => {
                story.status = column.story_status();
                Ok(Some(story.status))
            }
            None => Ok(None),
        }
    }

    pub fn assign(&mut self, item_id: &str, assignee: &str) -> Result<(), SprintError> {
        self.ensure_open()?;
        let item = self.item_mut(item_id)?;
        item.assignee = assignee.trim().to_string();
        item.touch();
        Ok(())
    }

    pub fn set_ai_solution(&mut self, item_id: &str, solution: Option<String>) -> Result<(), SprintError> {
        self.ensure_open()?;
        let item = self.item_mut(item_id)?;
        item.ai_solution = solution;
        item.touch();
        Ok(())
    }

    /// Comment on a board item; allowed on completed sprints
    pub fn add_comment(
        &mut self,
        item_id: &str,
        comment_type: CommentType,
        text: &str,
    ) -> Result<String, SprintError> {
        let item = self.item_mut(item_id)?;
        let comment = Comment {
            id: new_id(IdKind::Cmt),
            comment_type,
            text: text.to_string(),
            created_at: Utc::now(),
        };
        let id = comment.id.clone();
        item.comments.push(comment);
        item.touch();
        Ok(id)
    }

    pub fn items_in(&self, column: Column) -> impl Iterator<Item = &BoardItem> {
        self.items.iter().filter(move |i| i.column == column)
    }

    pub fn total_points(&self) -> u32 {
        self.items.iter().map(|i| i.story_points).fold(0, u32::saturating_add)
    }

    pub fn done_points(&self) -> u32 {
        self.items_in(Column::Done)
            .map(|i| i.story_points)
            .fold(0, u32::saturating_add)
    }

    // ---------------------------------------------------------------------
    // Planner
    // ---------------------------------------------------------------------

    pub fn add_planner_item(&mut self, item: PlannerItem) -> Result<String, SprintError> {
        self.ensure_open()?;
        let id = item.id.clone();
        self.planner_backlog.push(item);
        Ok(id)
    }

    pub fn remove_planner_item(&mut self, item_id: &str) -> Result<PlannerItem, SprintError> {
        self.ensure_open()?;
        entity::remove(&mut self.planner_backlog, item_id)
            .ok_or_else(|| SprintError::PlannerItemNotFound(item_id.to_string()))
    }

    pub fn set_committed(&mut self, item_id: &str, committed: bool) -> Result<(), SprintError> {
        self.ensure_open()?;
        let item = entity::find_mut(&mut self.planner_backlog, item_id)
            .ok_or_else(|| SprintError::PlannerItemNotFound(item_id.to_string()))?;
        item.committed = committed;
        Ok(())
    }

    /// Copy every committed planner item onto the board.
    ///
    /// Planner items stay in the backlog. An item is skipped when a board
    /// item already carries its planner id, or the same story id.
    pub fn import_committed(&mut self, stories: &[Story]) -> Result<ImportReport, SprintError> {
        self.ensure_open()?;
        let mut report = ImportReport::default();

        let committed: Vec<PlannerItem> = self
            .planner_backlog
            .iter()
            .filter(|p| p.committed)
            .cloned()
            .collect();

        for plan in committed {
            if self.is_on_board(&plan) {
                report.skipped.push(plan.id.clone());
                continue;
            }
            let item = BoardItem::from_planner(&plan, stories);
            report.imported.push(item.id.clone());
            self.items.push(item);
        }

        Ok(report)
    }

    fn is_on_board(&self, plan: &PlannerItem) -> bool {
        self.items.iter().any(|item| {
            item.planner_item_id.as_deref() == Some(plan.id.as_str())
                || matches!(
                    (&item.story_id, &plan.story_id),
                    (Some(a), Some(b)) if a == b
                )
        })
    }
}

impl Record for Sprint {
    const KIND: &'static str = "sprint";

    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

/// Name of the sprint synthesized when a project would have none
pub const DEFAULT_SPRINT_NAME: &str = "Sprint 1";

/// Add "Sprint 1" if the collection is empty; returns true if one was added
pub fn ensure_sprint(sprints: &mut Vec<Sprint>) -> bool {
    if !sprints.is_empty() {
        return false;
    }
    sprints.push(Sprint::new(DEFAULT_SPRINT_NAME));
    true
}

/// Delete a sprint, synthesizing a fresh "Sprint 1" if it was the last one
pub fn delete_sprint(sprints: &mut Vec<Sprint>, sprint_id: &str) -> Option<Sprint> {
    let removed = entity::remove(sprints, sprint_id)?;
    ensure_sprint(sprints);
    Some(removed)
}

/// The sprint commands act on by default: the first active sprint, else the
/// first planned sprint, else the most recent one
pub fn current_sprint(sprints: &[Sprint]) -> Option<&Sprint> {
    sprints
        .iter()
        .find(|s| s.status == SprintStatus::Active)
        .or_else(|| sprints.iter().find(|s| s.status == SprintStatus::Planned))
        .or_else(|| sprints.last())
}

/// Sprints other than `except_id` that are active
pub fn other_active<'a>(sprints: &'a [Sprint], except_id: &str) -> Vec<&'a Sprint> {
    sprints
        .iter()
        .filter(|s| s.status == SprintStatus::Active && s.id != except_id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::story::StoryDraft;

    fn story() -> Story {
        Story::new(
            StoryDraft {
                role: "user".to_string(),
                action: "log in".to_string(),
                story_points: 3,
                acceptance_criteria: vec!["works".to_string()],
                ..Default::default()
            },
            &[],
        )
    }

    #[test]
    fn test_move_item_syncs_story_status() {
        let mut stories = vec![story()];
        let mut sprint = Sprint::new("S");
        let item_id = sprint.add_item(BoardItem::from_story(&stories[0])).unwrap();

        let synced = sprint.move_item(&item_id, Column::Done, &mut stories).unwrap();
        assert_eq!(synced, Some(StoryStatus::Done));
        assert_eq!(stories[0].status, StoryStatus::Done);
        assert_eq!(sprint.item(&item_id).unwrap().column, Column::Done);
    }

    #[test]
    fn test_move_item_with_deleted_story_still_moves() {
        let mut stories = vec![story()];
        let mut sprint = Sprint::new("S");
        let item_id = sprint.add_item(BoardItem::from_story(&stories[0])).unwrap();
        stories.clear();

        let synced = sprint.move_item(&item_id, Column::Review, &mut stories).unwrap();
        assert_eq!(synced, None);
        assert_eq!(sprint.item(&item_id).unwrap().column, Column::Review);
    }

    #[test]
    fn test_board_copy_diverges_from_story() {
        let mut s = story();
        let item = BoardItem::from_story(&s);
        s.acceptance_criteria.push("new".to_string());
        assert_eq!(item.acceptance_criteria, vec!["works".to_string()]);
    }

    #[test]
    fn test_completed_sprint_rejects_mutation_but_allows_comments() {
        let mut stories = vec![story()];
        let mut sprint = Sprint::new("S");
        let item_id = sprint.add_item(BoardItem::from_story(&stories[0])).unwrap();
        let plan_id = sprint.add_planner_item(PlannerItem::new("p", 1, None)).unwrap();
        sprint.complete().unwrap();
        let snapshot = sprint.clone();

        let closed = SprintError::Completed("S".to_string());
        assert_eq!(sprint.add_item(BoardItem::from_text("x", 1)), Err(closed.clone()));
        assert_eq!(sprint.remove_item(&item_id), Err(closed.clone()));
        assert_eq!(
            sprint.move_item(&item_id, Column::Done, &mut stories),
            Err(closed.clone())
        );
        assert_eq!(sprint.assign(&item_id, "Jane"), Err(closed.clone()));
        assert_eq!(
            sprint.add_planner_item(PlannerItem::new("q", 1, None)),
            Err(closed.clone())
        );
        assert_eq!(sprint.remove_planner_item(&plan_id), Err(closed.clone()));
        assert_eq!(sprint.set_committed(&plan_id, true), Err(closed.clone()));
        assert_eq!(sprint.import_committed(&stories), Err(closed));
        assert_eq!(sprint, snapshot);
        assert_eq!(stories[0].status, StoryStatus::Backlog);

        sprint.add_comment(&item_id, CommentType::User, "retro note").unwrap();
        assert_eq!(sprint.item(&item_id).unwrap().comments.len(), 1);
    }

    #[test]
    fn test_import_committed_copies_and_skips_duplicates() {
        let stories = vec![story()];
        let mut sprint = Sprint::new("S");
        let from_story = PlannerItem::from_story(&stories[0], Some(8.0));
        let loose = PlannerItem::new("Spike", 2, None);
        let uncommitted = PlannerItem::new("Later", 1, None);
        let a = sprint.add_planner_item(from_story).unwrap();
        let b = sprint.add_planner_item(loose).unwrap();
        sprint.add_planner_item(uncommitted).unwrap();
        sprint.set_committed(&a, true).unwrap();
        sprint.set_committed(&b, true).unwrap();

        let first = sprint.import_committed(&stories).unwrap();
        assert_eq!(first.imported.len(), 2);
        assert!(first.skipped.is_empty());
        assert_eq!(sprint.items.len(), 2);
        // Planner items are copied, not moved
        assert_eq!(sprint.planner_backlog.len(), 3);
        assert_eq!(sprint.items[0].role, "user");
        assert_eq!(sprint.items[0].column, Column::Todo);
        assert_eq!(sprint.items[1].action, "Spike");

        let second = sprint.import_committed(&stories).unwrap();
        assert!(second.imported.is_empty());
        assert_eq!(second.skipped.len(), 2);
        assert_eq!(sprint.items.len(), 2);
    }

    #[test]
    fn test_import_skips_story_already_on_board() {
        let stories = vec![story()];
        let mut sprint = Sprint::new("S");
        sprint.add_item(BoardItem::from_story(&stories[0])).unwrap();
        let plan = sprint
            .add_planner_item(PlannerItem::from_story(&stories[0], None))
            .unwrap();
        sprint.set_committed(&plan, true).unwrap();

        let report = sprint.import_committed(&stories).unwrap();
        assert_eq!(report.skipped, vec![plan]);
        assert_eq!(sprint.items.len(), 1);
    }

    #[test]
    fn test_delete_last_sprint_synthesizes_default() {
        let mut sprints = vec![Sprint::new("Only")];
        let id = sprints[0].id.clone();
        let removed = delete_sprint(&mut sprints, &id).unwrap();

        assert_eq!(removed.name, "Only");
        assert_eq!(sprints.len(), 1);
        assert_eq!(sprints[0].name, DEFAULT_SPRINT_NAME);
        assert_ne!(sprints[0].id, id);
        assert!(delete_sprint(&mut sprints, "missing").is_none());
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut sprint = Sprint::new("S");
        sprint.start().unwrap();
        assert!(sprint.start_date.is_some());
        assert!(sprint.start().is_err());
        sprint.complete().unwrap();
        assert!(sprint.completed_at.is_some());
        assert!(sprint.complete().is_err());
    }

    #[test]
    fn test_current_sprint_prefers_active() {
        let planned = Sprint::new("A");
        let mut active = Sprint::new("B");
        active.status = SprintStatus::Active;
        let sprints = vec![planned, active];
        assert_eq!(current_sprint(&sprints).unwrap().name, "B");
        assert!(current_sprint(&[]).is_none());
    }

    #[test]
    fn test_point_totals_saturate() {
        let mut sprint = Sprint::new("S");
        sprint.add_item(BoardItem::from_text("a", 3_000_000_000)).unwrap();
        let b = sprint.add_item(BoardItem::from_text("b", 3_000_000_000)).unwrap();
        assert_eq!(sprint.total_points(), u32::MAX);

        let mut stories: Vec<Story> = Vec::new();
        sprint.move_item(&b, Column::Done, &mut stories).unwrap();
        assert_eq!(sprint.done_points(), 3_000_000_000);
    }

    #[test]
    fn test_column_serialization() {
        assert_eq!(serde_json::to_string(&Column::InProgress).unwrap(), "\"in-progress\"");
        assert_eq!(serde_json::to_string(&Column::Todo).unwrap(), "\"todo\"");
        assert_eq!("In Progress".parse::<Column>().unwrap(), Column::InProgress);
    }
}
