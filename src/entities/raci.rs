//! RACI matrix: tasks × stakeholders with one role letter per cell
//!
//! Assignments are keyed `<taskId>-<stakeholderId>`. Removing a task or a
//! stakeholder leaves its cells in the map; they are skipped wherever the
//! matrix is read.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::core::entity::{self, Record};
use crate::core::identity::{new_id, IdKind};

/// Responsible / Accountable / Consulted / Informed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RaciRole {
    R,
    A,
    C,
    I,
}

impl RaciRole {
    pub fn description(&self) -> &'static str {
        match self {
            RaciRole::R => "Responsible",
            RaciRole::A => "Accountable",
            RaciRole::C => "Consulted",
            RaciRole::I => "Informed",
        }
    }
}

impl fmt::Display for RaciRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            RaciRole::R => "R",
            RaciRole::A => "A",
            RaciRole::C => "C",
            RaciRole::I => "I",
        };
        write!(f, "{}", letter)
    }
}

impl FromStr for RaciRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "r" | "responsible" => Ok(RaciRole::R),
            "a" | "accountable" => Ok(RaciRole::A),
            "c" | "consulted" => Ok(RaciRole::C),
            "i" | "informed" => Ok(RaciRole::I),
            _ => Err(format!("Unknown RACI role: {} (expected R, A, C or I)", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaciTask {
    pub id: String,
    pub name: String,
}

impl Record for RaciTask {
    const KIND: &'static str = "task";

    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

/// A matrix column; `name` is free text and not tied to the team roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stakeholder {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: String,
}

impl Record for Stakeholder {
    const KIND: &'static str = "stakeholder";

    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

/// A problem found by [`RaciMatrix::validate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaciWarning {
    NoAccountable { task: String },
    MultipleAccountable { task: String, count: usize },
    NoResponsible { task: String },
}

impl fmt::Display for RaciWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RaciWarning::NoAccountable { task } => {
                write!(f, "'{}' has no Accountable stakeholder", task)
            }
            RaciWarning::MultipleAccountable { task, count } => {
                write!(f, "'{}' has {} Accountable stakeholders (expected one)", task, count)
            }
            RaciWarning::NoResponsible { task } => {
                write!(f, "'{}' has no Responsible stakeholder", task)
            }
        }
    }
}

/// Persisted RACI state for one project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RaciMatrix {
    #[serde(default)]
    pub tasks: Vec<RaciTask>,
    #[serde(default)]
    pub stakeholders: Vec<Stakeholder>,
    #[serde(default)]
    pub assignments: BTreeMap<String, RaciRole>,
}

fn cell_key(task_id: &str, stakeholder_id: &str) -> String {
    format!("{}-{}", task_id, stakeholder_id)
}

impl RaciMatrix {
    pub fn add_task(&mut self, name: &str) -> String {
        let task = RaciTask {
            id: new_id(IdKind::Task),
            name: name.to_string(),
        };
        let id = task.id.clone();
        self.tasks.push(task);
        id
    }

    /// Remove a task; its assignments stay in the map
    pub fn remove_task(&mut self, task_id: &str) -> Option<RaciTask> {
        entity::remove(&mut self.tasks, task_id)
    }

    pub fn add_stakeholder(&mut self, name: &str, role: &str) -> String {
        let stakeholder = Stakeholder {
            id: new_id(IdKind::Stk),
            name: name.to_string(),
            role: role.to_string(),
        };
        let id = stakeholder.id.clone();
        self.stakeholders.push(stakeholder);
        id
    }

    /// Remove a stakeholder; its assignments stay in the map
    pub fn remove_stakeholder(&mut self, stakeholder_id: &str) -> Option<Stakeholder> {
        entity::remove(&mut self.stakeholders, stakeholder_id)
    }

    /// Set or clear (`None`) one cell
    pub fn assign(&mut self, task_id: &str, stakeholder_id: &str, role: Option<RaciRole>) {
        let key = cell_key(task_id, stakeholder_id);
        match role {
            Some(role) => {
                self.assignments.insert(key, role);
            }
            None => {
                self.assignments.remove(&key);
            }
        }
    }

    pub fn role(&self, task_id: &str, stakeholder_id: &str) -> Option<RaciRole> {
        self.assignments
            .get(&cell_key(task_id, stakeholder_id))
            .copied()
    }

    /// Roles for one task across current stakeholders
    pub fn roles_for_task(&self, task_id: &str) -> Vec<(&Stakeholder, RaciRole)> {
        self.stakeholders
            .iter()
            .filter_map(|s| self.role(task_id, &s.id).map(|r| (s, r)))
            .collect()
    }

    /// Per-task consistency warnings; stale assignments are ignored
    pub fn validate(&self) -> Vec<RaciWarning> {
        let mut warnings = Vec::new();
        for task in &self.tasks {
            let roles = self.roles_for_task(&task.id);
            let accountable = roles.iter().filter(|(_, r)| *r == RaciRole::A).count();
            let responsible = roles.iter().any(|(_, r)| *r == RaciRole::R);

            match accountable {
                0 => warnings.push(RaciWarning::NoAccountable {
                    task: task.name.clone(),
                }),
                1 => {}
                count => warnings.push(RaciWarning::MultipleAccountable {
                    task: task.name.clone(),
                    count,
                }),
            }
            if !responsible {
                warnings.push(RaciWarning::NoResponsible {
                    task: task.name.clone(),
                });
            }
        }
        warnings
    }

    /// Assignment keys whose task or stakeholder no longer exists
    pub fn stale_assignments(&self) -> Vec<&str> {
        self.assignments
            .keys()
            .filter(|key| {
                !self.tasks.iter().any(|t| {
                    self.stakeholders
                        .iter()
                        .any(|s| key.as_str() == cell_key(&t.id, &s.id))
                })
            })
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_warnings() {
        let mut raci = RaciMatrix::default();
        let ok = raci.add_task("Design");
        let bad = raci.add_task("Deploy");
        let alice = raci.add_stakeholder("Alice", "PM");
        let bob = raci.add_stakeholder("Bob", "Dev");

        raci.assign(&ok, &alice, Some(RaciRole::A));
        raci.assign(&ok, &bob, Some(RaciRole::R));
        raci.assign(&bad, &alice, Some(RaciRole::A));
        raci.assign(&bad, &bob, Some(RaciRole::A));

        let warnings = raci.validate();
        assert_eq!(
            warnings,
            vec![
                RaciWarning::MultipleAccountable {
                    task: "Deploy".to_string(),
                    count: 2
                },
                RaciWarning::NoResponsible {
                    task: "Deploy".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_removed_stakeholder_assignments_are_kept_but_ignored() {
        let mut raci = RaciMatrix::default();
        let task = raci.add_task("Design");
        let alice = raci.add_stakeholder("Alice", "");
        raci.assign(&task, &alice, Some(RaciRole::A));
        raci.assign(&task, &alice, Some(RaciRole::R));
        assert_eq!(raci.role(&task, &alice), Some(RaciRole::R));

        raci.remove_stakeholder(&alice);
        assert_eq!(raci.assignments.len(), 1);
        assert_eq!(raci.stale_assignments().len(), 1);
        assert_eq!(raci.validate().len(), 2);
    }

    #[test]
    fn test_clear_cell() {
        let mut raci = RaciMatrix::default();
        let task = raci.add_task("T");
        let s = raci.add_stakeholder("S", "");
        raci.assign(&task, &s, Some(RaciRole::C));
        raci.assign(&task, &s, None);
        assert!(raci.assignments.is_empty());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("accountable".parse::<RaciRole>().unwrap(), RaciRole::A);
        assert_eq!("i".parse::<RaciRole>().unwrap(), RaciRole::I);
        assert!("x".parse::<RaciRole>().is_err());
    }
}
