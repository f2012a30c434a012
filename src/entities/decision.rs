//! Decision log entries

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::core::entity::Record;
use crate::core::identity::{new_id, IdKind};
use crate::core::refs::SprintRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DecisionStatus {
    #[default]
    Active,
    Superseded,
    Reversed,
}

impl DecisionStatus {
    /// Superseded and Reversed decisions must say why
    pub fn requires_remarks(&self) -> bool {
        matches!(self, DecisionStatus::Superseded | DecisionStatus::Reversed)
    }
}

impl fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionStatus::Active => write!(f, "Active"),
            DecisionStatus::Superseded => write!(f, "Superseded"),
            DecisionStatus::Reversed => write!(f, "Reversed"),
        }
    }
}

impl FromStr for DecisionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(DecisionStatus::Active),
            "superseded" => Ok(DecisionStatus::Superseded),
            "reversed" => Ok(DecisionStatus::Reversed),
            _ => Err(format!("Unknown decision status: {}", s)),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecisionError {
    #[error("remarks are required when marking a decision {0}")]
    RemarksRequired(DecisionStatus),

    #[error("decision text cannot be empty")]
    EmptyDecision,
}

/// Fields supplied when recording a decision
#[derive(Debug, Clone, Default)]
pub struct DecisionDraft {
    pub date: Option<NaiveDate>,
    pub sprint_id: Option<String>,
    pub context: String,
    pub decision: String,
    pub rationale: String,
    pub owner: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub sprint_id: Option<SprintRef>,
    #[serde(default)]
    pub context: String,
    pub decision: String,
    #[serde(default)]
    pub rationale: String,
    /// Free-text name
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub status: DecisionStatus,
    #[serde(default)]
    pub remarks: String,
    pub created_at: DateTime<Utc>,
}

impl Decision {
    pub fn new(draft: DecisionDraft) -> Result<Self, DecisionError> {
        if draft.decision.trim().is_empty() {
            return Err(DecisionError::EmptyDecision);
        }
        let now = Utc::now();
        Ok(Self {
            id: new_id(IdKind::Dec),
            date: draft.date.unwrap_or_else(|| now.date_naive()),
            sprint_id: draft.sprint_id.map(SprintRef::new),
            context: draft.context,
            decision: draft.decision,
            rationale: draft.rationale,
            owner: draft.owner.trim().to_string(),
            status: DecisionStatus::Active,
            remarks: String::new(),
            created_at: now,
        })
    }

    /// Change status; a blank `remarks` keeps the existing remarks
    pub fn set_status(&mut self, status: DecisionStatus, remarks: Option<&str>) -> Result<(), DecisionError> {
        let remarks = remarks.map(str::trim).filter(|r| !r.is_empty());
        if status.requires_remarks() && remarks.is_none() && self.remarks.trim().is_empty() {
            return Err(DecisionError::RemarksRequired(status));
        }
        self.status = status;
        if let Some(remarks) = remarks {
            self.remarks = remarks.to_string();
        }
        Ok(())
    }
}

impl Record for Decision {
    const KIND: &'static str = "decision";

    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> String {
        self.decision.clone()
    }
}

/// Newest first, by date then creation time
pub fn sort_newest_first(decisions: &mut [Decision]) {
    decisions.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decision() -> Decision {
        Decision::new(DecisionDraft {
            decision: "Use Postgres".to_string(),
            owner: " Jane ".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_new_decision_defaults() {
        let d = decision();
        assert_eq!(d.status, DecisionStatus::Active);
        assert_eq!(d.owner, "Jane");
        assert!(d.sprint_id.is_none());
    }

    #[test]
    fn test_empty_decision_rejected() {
        let err = Decision::new(DecisionDraft::default()).unwrap_err();
        assert_eq!(err, DecisionError::EmptyDecision);
    }

    #[test]
    fn test_superseded_requires_remarks() {
        let mut d = decision();
        assert_eq!(
            d.set_status(DecisionStatus::Superseded, None),
            Err(DecisionError::RemarksRequired(DecisionStatus::Superseded))
        );
        assert_eq!(
            d.set_status(DecisionStatus::Reversed, Some("  ")),
            Err(DecisionError::RemarksRequired(DecisionStatus::Reversed))
        );
        assert_eq!(d.status, DecisionStatus::Active);

        d.set_status(DecisionStatus::Superseded, Some("Replaced by DEC-2")).unwrap();
        assert_eq!(d.status, DecisionStatus::Superseded);
        // Existing remarks satisfy the requirement
        d.set_status(DecisionStatus::Reversed, None).unwrap();
        assert_eq!(d.remarks, "Replaced by DEC-2");
    }

    #[test]
    fn test_active_needs_no_remarks() {
        let mut d = decision();
        d.set_status(DecisionStatus::Active, None).unwrap();
    }
}
