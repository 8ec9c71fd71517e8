//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (JenkinsApi, FileSystem, Clock)
//! but are themselves concrete structs, not traits.

mod branch;
mod build;
mod jobs;
mod system;

pub use branch::{BranchService, ReplaceOutcome};
pub use build::{BuildService, WaitOutcome, WaitProgress};
pub use jobs::{BuildLog, JobRow, JobService, NESTED_FOLDER_DEPTH};
pub use system::SystemService;
