//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod config_doc;
pub mod entities;
pub mod error;

pub use config_doc::{normalize_branch, BranchRewrite, ConfigDocument, BRANCH_PATHS};
pub use entities::*;
pub use error::DomainError;
