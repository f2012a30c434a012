//! Core module - storage, project partitioning and references

pub mod backend;
pub mod config;
pub mod entity;
pub mod identity;
pub mod migration;
pub mod refs;
pub mod registry;
pub mod scope;
pub mod store;
pub mod tool;
pub mod workspace;

pub use backend::{Backend, BackendError, FileBackend, MemoryBackend, SqliteBackend};
pub use config::{BackendKind, Config};
pub use entity::Record;
pub use identity::{new_id, IdKind};
pub use refs::{EpicIndex, NameResolution, Ref, Resolution, SprintRef, StoryRef};
pub use registry::RegistryError;
pub use scope::{ProjectContext, ScopeError};
pub use store::{Store, StoreWarning, WriteOutcome};
pub use tool::ToolKey;
pub use workspace::{Workspace, WorkspaceError};
