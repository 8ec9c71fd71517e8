//! platter: Jenkins automation from the command line
//!
//! Layers, outermost first:
//! - `cli`: argument parsing, rendering, exit codes
//! - `application`: services for builds, branches, jobs and the controller
//! - `domain`: job paths, build parameters, API entities, config documents
//! - `infrastructure`: the HTTP client, filesystem and clock boundaries

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
