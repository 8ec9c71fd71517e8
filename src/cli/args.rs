//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Jenkins automation: jobs, builds, branches, plugins, nodes and the build queue
#[derive(Parser, Debug)]
#[command(name = "platter")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List jobs under a folder ("/" for the top level)
    ListJobs {
        /// Folder path, e.g. "team/services"
        path: String,
        /// Show last build status, time and duration
        #[arg(long)]
        status: bool,
        /// Keep only jobs whose status contains this text (needs --status)
        #[arg(long)]
        filter: Option<String>,
    },

    /// Show the SCM branch a job builds
    GetBranch {
        /// Job path
        job: String,
    },

    /// Point a job at another SCM branch
    ReplaceBranch {
        /// Job path
        job: String,
        /// New branch; "*/" is prepended when missing
        branch: String,
    },

    /// Trigger a build
    Build {
        /// Job path
        job: String,
        /// Build parameters as a JSON object, e.g. '{"ENV":"staging"}'
        #[arg(long)]
        params: Option<String>,
        /// Wait for the build to finish
        #[arg(long)]
        wait: bool,
        /// Give up waiting after this many seconds (needs --wait)
        #[arg(long, requires = "wait")]
        timeout: Option<u64>,
    },

    /// Print the console output of a build
    Logs {
        /// Job path
        job: String,
        /// Build number (default: last build)
        #[arg(long)]
        build: Option<u64>,
    },

    /// Print or save a job's config.xml
    ConfigGet {
        /// Job path
        job: String,
        /// Write to this file instead of stdout
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Replace a job's config.xml with a local file
    ConfigUpdate {
        /// Job path
        job: String,
        /// Configuration file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Create a job from a config.xml file
    Create {
        /// New job path
        name: String,
        /// Configuration file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Copy a job
    Copy {
        /// Source job path
        source: String,
        /// Target job path
        target: String,
    },

    /// Delete a job
    Delete {
        /// Job path
        job: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Enable a job
    Enable {
        /// Job path
        job: String,
    },

    /// Disable a job
    Disable {
        /// Job path
        job: String,
    },

    /// List installed plugins
    Plugins {
        /// Write the table to this file instead of stdout
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// List build agents
    Nodes,

    /// List queued builds
    Queue,

    /// Cancel a queued build
    CancelQueue {
        /// Queue item id
        queue_id: u64,
    },

    /// Show server information
    Info,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Show config file location
    Path,
    /// Print a commented config template
    Template,
}
