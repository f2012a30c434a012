//! Entity type definitions
//!
//! Every record below belongs to one project, except [`Project`] itself:
//!
//! **Planning:**
//! - [`Epic`] - a grouping of stories, numbered `EPIC-###`
//! - [`Story`] - user stories with MoSCoW priority
//! - [`Sprint`] - board items and a capacity-planner backlog
//! - [`TeamMember`] - roster entries with daily capacity and PTO
//!
//! **Governance:**
//! - [`RaciMatrix`] - task × stakeholder responsibility matrix
//! - [`RetroSession`] - retrospective cards and action items
//! - [`Decision`] - decision log
//! - [`Risk`] - risk register with score history

pub mod decision;
pub mod epic;
pub mod project;
pub mod raci;
pub mod retro;
pub mod risk;
pub mod sprint;
pub mod story;
pub mod team;

pub use decision::Decision;
pub use epic::Epic;
pub use project::{Project, ProjectsDoc};
pub use raci::RaciMatrix;
pub use retro::RetroSession;
pub use risk::Risk;
pub use sprint::{BoardItem, PlannerItem, Sprint};
pub use story::Story;
pub use team::{SprintConfig, TeamMember};
