//! Retrospective sessions

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::entity::{self, Record};
use crate::core::identity::{new_id, IdKind};
use crate::core::refs::SprintRef;
use crate::entities::sprint::{Column, Sprint};
use crate::entities::story::StoryPriority;

/// Which column of the retro board a card sits in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardList {
    WentWell,
    DidntGoWell,
}

impl fmt::Display for CardList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardList::WentWell => write!(f, "went-well"),
            CardList::DidntGoWell => write!(f, "didnt-go-well"),
        }
    }
}

impl FromStr for CardList {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['_', ' ', '\''], "-").as_str() {
            "went-well" | "good" | "well" => Ok(CardList::WentWell),
            "didnt-go-well" | "didn-t-go-well" | "bad" | "improve" => Ok(CardList::DidntGoWell),
            _ => Err(format!("Unknown card list: {}", s)),
        }
    }
}

/// A retro card, optionally seeded from a sprint board item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetroCard {
    pub id: String,
    pub text: String,
    /// Board item the card was seeded from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<StoryPriority>,
    /// Board column at seeding time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprint_status: Option<Column>,
}

impl RetroCard {
    pub fn new(text: &str) -> Self {
        Self {
            id: new_id(IdKind::Card),
            text: text.to_string(),
            source_id: None,
            assignee: None,
            points: None,
            priority: None,
            sprint_status: None,
        }
    }
}

impl Record for RetroCard {
    const KIND: &'static str = "retro card";

    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> String {
        self.text.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ActionStatus {
    #[default]
    Open,
    Done,
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionStatus::Open => write!(f, "Open"),
            ActionStatus::Done => write!(f, "Done"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub id: String,
    pub text: String,
    /// Free-text name
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: ActionStatus,
}

impl Record for ActionItem {
    const KIND: &'static str = "action item";

    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> String {
        self.text.clone()
    }
}

/// Result of seeding a retro from a sprint board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedReport {
    pub went_well: usize,
    pub didnt_go_well: usize,
    pub skipped: usize,
}

/// A retrospective session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetroSession {
    pub id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub sprint_id: Option<SprintRef>,
    #[serde(default)]
    pub went_well: Vec<RetroCard>,
    #[serde(default)]
    pub didnt_go_well: Vec<RetroCard>,
    #[serde(default)]
    pub action_items: Vec<ActionItem>,
    pub created_at: DateTime<Utc>,
}

impl RetroSession {
    pub fn new(date: NaiveDate, sprint_id: Option<&str>) -> Self {
        Self {
            id: new_id(IdKind::Retro),
            date,
            sprint_id: sprint_id.map(SprintRef::new),
            went_well: Vec::new(),
            didnt_go_well: Vec::new(),
            action_items: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn cards(&self, list: CardList) -> &[RetroCard] {
        match list {
            CardList::WentWell => &self.went_well,
            CardList::DidntGoWell => &self.didnt_go_well,
        }
    }

    fn cards_mut(&mut self, list: CardList) -> &mut Vec<RetroCard> {
        match list {
            CardList::WentWell => &mut self.went_well,
            CardList::DidntGoWell => &mut self.didnt_go_well,
        }
    }

    pub fn add_card(&mut self, list: CardList, card: RetroCard) -> String {
        let id = card.id.clone();
        self.cards_mut(list).push(card);
        id
    }

    /// Remove a card from whichever list holds it
    pub fn remove_card(&mut self, card_id: &str) -> Option<RetroCard> {
        entity::remove(&mut self.went_well, card_id)
            .or_else(|| entity::remove(&mut self.didnt_go_well, card_id))
    }

    /// Seed cards from a sprint board: done items went well, every other
    /// column did not. Items already seeded into this session are skipped.
    pub fn seed_from_sprint(&mut self, sprint: &Sprint) -> SeedReport {
        let mut report = SeedReport::default();
        for item in &sprint.items {
            let already = self
                .went_well
                .iter()
                .chain(self.didnt_go_well.iter())
                .any(|c| c.source_id.as_deref() == Some(item.id.as_str()));
            if already {
                report.skipped += 1;
                continue;
            }

            let assignee = item.assignee.trim();
            let card = RetroCard {
                source_id: Some(item.id.clone()),
                assignee: (!assignee.is_empty()).then(|| assignee.to_string()),
                points: Some(item.story_points),
                priority: Some(item.priority),
                sprint_status: Some(item.column),
                ..RetroCard::new(&item.title())
            };
            if item.column == Column::Done {
                self.went_well.push(card);
                report.went_well += 1;
            } else {
                self.didnt_go_well.push(card);
                report.didnt_go_well += 1;
            }
        }
        if self.sprint_id.is_none() {
            self.sprint_id = Some(SprintRef::new(sprint.id.clone()));
        }
        report
    }

    pub fn add_action(&mut self, text: &str, owner: &str, due_date: Option<NaiveDate>) -> String {
        let action = ActionItem {
            id: new_id(IdKind::Act),
            text: text.to_string(),
            owner: owner.trim().to_string(),
            due_date,
            status: ActionStatus::Open,
        };
        let id = action.id.clone();
        self.action_items.push(action);
        id
    }

    /// Flip an action item between Open and Done; returns the new status
    pub fn toggle_action(&mut self, action_id: &str) -> Option<ActionStatus> {
        let action = entity::find_mut(&mut self.action_items, action_id)?;
        action.status = match action.status {
            ActionStatus::Open => ActionStatus::Done,
            ActionStatus::Done => ActionStatus::Open,
        };
        Some(action.status)
    }

    pub fn remove_action(&mut self, action_id: &str) -> Option<ActionItem> {
        entity::remove(&mut self.action_items, action_id)
    }

    pub fn open_actions(&self) -> usize {
        self.action_items
            .iter()
            .filter(|a| a.status == ActionStatus::Open)
            .count()
    }
}

impl Record for RetroSession {
    const KIND: &'static str = "retro";

    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> String {
        format!("Retro {}", self.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::sprint::BoardItem;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_seed_from_sprint_splits_by_column() {
        let mut sprint = Sprint::new("Sprint 1");
        let mut done = BoardItem::from_text("Ship login", 3);
        done.column = Column::Done;
        done.assignee = "Jane".to_string();
        let open = BoardItem::from_text("Fix bug", 2);
        sprint.items = vec![done, open];

        let mut retro = RetroSession::new(day(), None);
        let report = retro.seed_from_sprint(&sprint);
        assert_eq!(report.went_well, 1);
        assert_eq!(report.didnt_go_well, 1);
        assert_eq!(retro.went_well[0].text, "Ship login");
        assert_eq!(retro.went_well[0].assignee.as_deref(), Some("Jane"));
        assert_eq!(retro.went_well[0].points, Some(3));
        assert_eq!(retro.didnt_go_well[0].sprint_status, Some(Column::Backlog));
        assert_eq!(retro.didnt_go_well[0].assignee, None);
        assert_eq!(retro.sprint_id.as_ref().unwrap().id(), sprint.id);

        let again = retro.seed_from_sprint(&sprint);
        assert_eq!(again.skipped, 2);
        assert_eq!(retro.went_well.len() + retro.didnt_go_well.len(), 2);
    }

    #[test]
    fn test_action_toggle() {
        let mut retro = RetroSession::new(day(), Some("SPRINT-1"));
        let id = retro.add_action("Write docs", "Bob", None);
        assert_eq!(retro.open_actions(), 1);
        assert_eq!(retro.toggle_action(&id), Some(ActionStatus::Done));
        assert_eq!(retro.open_actions(), 0);
        assert_eq!(retro.toggle_action("missing"), None);
    }

    #[test]
    fn test_remove_card_from_either_list() {
        let mut retro = RetroSession::new(day(), None);
        let id = retro.add_card(CardList::DidntGoWell, RetroCard::new("slow CI"));
        assert!(retro.remove_card(&id).is_some());
        assert!(retro.didnt_go_well.is_empty());
    }

    #[test]
    fn test_card_list_parse() {
        assert_eq!("didn't go well".parse::<CardList>().unwrap(), CardList::DidntGoWell);
        assert_eq!("went_well".parse::<CardList>().unwrap(), CardList::WentWell);
    }
}
