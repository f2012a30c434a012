//! Risk register
//!
//! `score` is stored and recomputed from probability × impact on every
//! reassessment. A score change appends to `history`; nothing else does.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::core::entity::Record;
use crate::core::identity::{new_id, IdKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RiskCategory {
    #[default]
    Technical,
    Business,
    Resource,
    Schedule,
    External,
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskCategory::Technical => write!(f, "Technical"),
            RiskCategory::Business => write!(f, "Business"),
            RiskCategory::Resource => write!(f, "Resource"),
            RiskCategory::Schedule => write!(f, "Schedule"),
            RiskCategory::External => write!(f, "External"),
        }
    }
}

impl FromStr for RiskCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "technical" => Ok(RiskCategory::Technical),
            "business" => Ok(RiskCategory::Business),
            "resource" => Ok(RiskCategory::Resource),
            "schedule" => Ok(RiskCategory::Schedule),
            "external" => Ok(RiskCategory::External),
            _ => Err(format!("Unknown risk category: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RiskStatus {
    #[default]
    Open,
    Mitigating,
    Closed,
    Accepted,
}

impl fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskStatus::Open => write!(f, "Open"),
            RiskStatus::Mitigating => write!(f, "Mitigating"),
            RiskStatus::Closed => write!(f, "Closed"),
            RiskStatus::Accepted => write!(f, "Accepted"),
        }
    }
}

impl FromStr for RiskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(RiskStatus::Open),
            "mitigating" => Ok(RiskStatus::Mitigating),
            "closed" => Ok(RiskStatus::Closed),
            "accepted" => Ok(RiskStatus::Accepted),
            _ => Err(format!("Unknown risk status: {}", s)),
        }
    }
}

/// Severity band derived from the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=4 => RiskLevel::Low,
            5..=9 => RiskLevel::Medium,
            10..=16 => RiskLevel::High,
            _ => RiskLevel::Critical,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High => write!(f, "High"),
            RiskLevel::Critical => write!(f, "Critical"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RiskError {
    #[error("{field} must be between 1 and 5, got {value}")]
    OutOfRange { field: &'static str, value: u8 },

    #[error("risk title cannot be empty")]
    EmptyTitle,
}

fn check_rating(field: &'static str, value: u8) -> Result<u8, RiskError> {
    if (1..=5).contains(&value) {
        Ok(value)
    } else {
        Err(RiskError::OutOfRange { field, value })
    }
}

/// One score change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreChange {
    pub date: NaiveDate,
    pub old_score: u8,
    pub new_score: u8,
}

/// Fields supplied when creating a risk
#[derive(Debug, Clone, Default)]
pub struct RiskDraft {
    pub title: String,
    pub description: String,
    pub category: RiskCategory,
    pub probability: u8,
    pub impact: u8,
    pub mitigation_plan: String,
    pub owner: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Risk {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: RiskCategory,
    pub probability: u8,
    pub impact: u8,
    pub score: u8,
    #[serde(default)]
    pub mitigation_plan: String,
    /// Free-text name
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub status: RiskStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub history: Vec<ScoreChange>,
}

impl Risk {
    pub fn new(draft: RiskDraft) -> Result<Self, RiskError> {
        if draft.title.trim().is_empty() {
            return Err(RiskError::EmptyTitle);
        }
        let probability = check_rating("probability", draft.probability)?;
        let impact = check_rating("impact", draft.impact)?;
        Ok(Self {
            id: new_id(IdKind::Risk),
            title: draft.title,
            description: draft.description,
            category: draft.category,
            probability,
            impact,
            score: probability * impact,
            mitigation_plan: draft.mitigation_plan,
            owner: draft.owner.trim().to_string(),
            status: RiskStatus::Open,
            created_at: Utc::now(),
            history: Vec::new(),
        })
    }

    pub fn level(&self) -> RiskLevel {
        RiskLevel::from_score(self.score)
    }

    /// Update ratings and recompute the score.
    ///
    /// Returns the appended history entry when the score changed.
    pub fn reassess(&mut self, probability: u8, impact: u8) -> Result<Option<&ScoreChange>, RiskError> {
        let probability = check_rating("probability", probability)?;
        let impact = check_rating("impact", impact)?;
        let old_score = self.score;

        self.probability = probability;
        self.impact = impact;
        self.score = probability * impact;

        if self.score == old_score {
            return Ok(None);
        }
        self.history.push(ScoreChange {
            date: Utc::now().date_naive(),
            old_score,
            new_score: self.score,
        });
        Ok(self.history.last())
    }

    pub fn is_open(&self) -> bool {
        matches!(self.status, RiskStatus::Open | RiskStatus::Mitigating)
    }
}

impl Record for Risk {
    const KIND: &'static str = "risk";

    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> String {
        self.title.clone()
    }
}

/// Count of open risks in each probability × impact cell.
///
/// `cells[p - 1][i - 1]` holds probability `p`, impact `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeatMatrix {
    pub cells: [[usize; 5]; 5],
}

impl HeatMatrix {
    pub fn build(risks: &[Risk]) -> Self {
        let mut matrix = HeatMatrix::default();
        for risk in risks.iter().filter(|r| r.is_open()) {
            let p = usize::from(risk.probability.clamp(1, 5)) - 1;
            let i = usize::from(risk.impact.clamp(1, 5)) - 1;
            matrix.cells[p][i] += 1;
        }
        matrix
    }

    pub fn count(&self, probability: u8, impact: u8) -> usize {
        let p = usize::from(probability.clamp(1, 5)) - 1;
        let i = usize::from(impact.clamp(1, 5)) - 1;
        self.cells[p][i]
    }
}

/// Highest score first
pub fn sort_by_score(risks: &mut [Risk]) {
    risks.sort_by(|a, b| b.score.cmp(&a.score));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn risk(p: u8, i: u8) -> Risk {
        Risk::new(RiskDraft {
            title: "Vendor delay".to_string(),
            probability: p,
            impact: i,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_score_and_level() {
        let r = risk(3, 4);
        assert_eq!(r.score, 12);
        assert_eq!(r.level(), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(4), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(5), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(16), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(17), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(25), RiskLevel::Critical);
    }

    #[test]
    fn test_reassess_records_history_only_on_change() {
        let mut r = risk(2, 2);
        // 4 -> 4 with different factors: no history
        assert!(r.reassess(4, 1).unwrap().is_none());
        assert!(r.history.is_empty());

        let change = r.reassess(5, 5).unwrap().cloned().unwrap();
        assert_eq!(change.old_score, 4);
        assert_eq!(change.new_score, 25);
        assert_eq!(r.history.len(), 1);
        assert_eq!(r.score, 25);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut r = risk(1, 1);
        assert_eq!(
            r.reassess(6, 1),
            Err(RiskError::OutOfRange {
                field: "probability",
                value: 6
            })
        );
        assert_eq!(r.score, 1);
        assert!(Risk::new(RiskDraft {
            title: "x".to_string(),
            probability: 0,
            impact: 3,
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn test_heat_matrix_skips_closed() {
        let open = risk(5, 1);
        let mut closed = risk(5, 1);
        closed.status = RiskStatus::Closed;
        let matrix = HeatMatrix::build(&[open, closed]);
        assert_eq!(matrix.count(5, 1), 1);
        assert_eq!(matrix.count(1, 1), 0);
    }
}
