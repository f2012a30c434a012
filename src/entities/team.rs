//! Team roster and capacity planning
//!
//! Team members are referenced everywhere by *name*, not id: board item
//! assignees, RACI stakeholders, decision owners and retro action owners
//! all store the typed string. Renaming a member therefore orphans earlier
//! references; they stay valid data and show as unlinked.

use serde::{Deserialize, Serialize};

use crate::core::entity::Record;
use crate::core::identity::{new_id, IdKind};
use crate::core::refs::names_match;
use crate::entities::sprint::{PlannerItem, Sprint};

/// A team member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: String,
    /// Focus hours available per working day
    #[serde(default)]
    pub daily_capacity: f64,
    /// Days absent during the sprint
    #[serde(default)]
    pub pto_days: f64,
}

impl TeamMember {
    pub fn new(name: &str, role: &str, daily_capacity: f64) -> Self {
        Self {
            id: new_id(IdKind::Member),
            name: name.to_string(),
            role: role.to_string(),
            daily_capacity,
            pto_days: 0.0,
        }
    }

    /// Hours this member can contribute over a sprint
    pub fn sprint_hours(&self, config: &SprintConfig) -> f64 {
        let days = (config.sprint_days - self.pto_days).max(0.0);
        self.daily_capacity.max(0.0) * days * config.focus_factor
    }
}

impl Record for TeamMember {
    const KIND: &'static str = "team member";

    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> String {
        if self.role.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.role)
        }
    }
}

/// Find a member by case-insensitive name
pub fn find_by_name<'a>(roster: &'a [TeamMember], name: &str) -> Option<&'a TeamMember> {
    roster.iter().find(|m| names_match(&m.name, name))
}

/// Capacity planner settings, one per project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintConfig {
    /// Working days in a sprint
    #[serde(default = "default_sprint_days")]
    pub sprint_days: f64,
    /// Share of capacity available for sprint work (0.0 - 1.0)
    #[serde(default = "default_focus_factor")]
    pub focus_factor: f64,
    /// Hours one story point represents, for points-only planner items
    #[serde(default = "default_hours_per_point")]
    pub hours_per_point: f64,
}

fn default_sprint_days() -> f64 {
    10.0
}

fn default_focus_factor() -> f64 {
    0.8
}

fn default_hours_per_point() -> f64 {
    6.0
}

impl Default for SprintConfig {
    fn default() -> Self {
        Self {
            sprint_days: default_sprint_days(),
            focus_factor: default_focus_factor(),
            hours_per_point: default_hours_per_point(),
        }
    }
}

/// One member's line in a capacity report
#[derive(Debug, Clone, PartialEq)]
pub struct MemberCapacity {
    pub name: String,
    pub available_days: f64,
    pub hours: f64,
}

/// Sprint capacity versus committed planner work
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityReport {
    pub members: Vec<MemberCapacity>,
    pub total_hours: f64,
    pub committed_hours: f64,
    pub committed_points: u32,
    pub backlog_hours: f64,
}

impl CapacityReport {
    pub fn build(roster: &[TeamMember], config: &SprintConfig, sprint: &Sprint) -> Self {
        let members: Vec<MemberCapacity> = roster
            .iter()
            .map(|m| MemberCapacity {
                name: m.name.clone(),
                available_days: (config.sprint_days - m.pto_days).max(0.0),
                hours: m.sprint_hours(config),
            })
            .collect();
        let total_hours = members.iter().map(|m| m.hours).sum();

        let hours_of = |item: &PlannerItem| item.hours(config.hours_per_point);
        let committed: Vec<&PlannerItem> =
            sprint.planner_backlog.iter().filter(|i| i.committed).collect();

        Self {
            members,
            total_hours,
            committed_hours: committed.iter().map(|i| hours_of(i)).sum(),
            committed_points: committed
                .iter()
                .map(|i| i.story_points)
                .fold(0, u32::saturating_add),
            backlog_hours: sprint.planner_backlog.iter().map(hours_of).sum(),
        }
    }

    /// Committed hours as a percentage of capacity; `None` with no capacity
    pub fn utilization(&self) -> Option<f64> {
        if self.total_hours <= 0.0 {
            return None;
        }
        Some(self.committed_hours / self.total_hours * 100.0)
    }

    pub fn is_overcommitted(&self) -> bool {
        self.committed_hours > self.total_hours
    }
}

/// Story points on a sprint board grouped by assignee
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workload {
    /// (display name, points, matches a roster member)
    pub assignees: Vec<(String, u32, bool)>,
    pub unassigned_points: u32,
}

impl Workload {
    /// Group by case-insensitive assignee name; the first spelling seen wins
    pub fn build(sprint: &Sprint, roster: &[TeamMember]) -> Self {
        let mut workload = Workload::default();
        for item in &sprint.items {
            let name = item.assignee.trim();
            if name.is_empty() {
                workload.unassigned_points =
                    workload.unassigned_points.saturating_add(item.story_points);
                continue;
            }
            match workload
                .assignees
                .iter_mut()
                .find(|(n, _, _)| names_match(n, name))
            {
                Some(entry) => entry.1 = entry.1.saturating_add(item.story_points),
                None => {
                    let linked = find_by_name(roster, name).is_some();
                    workload
                        .assignees
                        .push((name.to_string(), item.story_points, linked));
                }
            }
        }
        workload
    }
}
