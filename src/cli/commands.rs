//! Command dispatch: one typed handler per subcommand
//!
//! Handlers call exactly one service operation and render its outcome.
//! Errors propagate to `main`, which picks the exit code.

use std::io::{self, BufRead};
use std::path::Path;
use std::time::Duration;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use colored::{Color, Colorize};
use tracing::{debug, instrument};

use crate::application::services::{ReplaceOutcome, WaitOutcome, WaitProgress};
use crate::application::IoResultExt;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output::{self, Cell, Table};
use crate::config::{global_config_path, Settings};
use crate::domain::{BuildParams, JobPath, JobStatus};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

const LIST_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";
const QUEUE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Execute the parsed command line.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Cli::command()
            .print_help()
            .map_err(|e| InfraError::io("print help", e).into());
    };

    match command {
        Commands::Completion { shell } => cmd_completion(*shell),
        Commands::Config { command } => cmd_config(command),
        command => {
            let settings = Settings::load()?;
            let credentials = settings.credentials()?;
            debug!("execute_command: {:?}", credentials);
            let container = ServiceContainer::new(settings, credentials)?;
            dispatch(&container, command)
        }
    }
}

/// Run a server command against an already wired container.
pub fn dispatch(container: &ServiceContainer, command: &Commands) -> CliResult<()> {
    match command {
        Commands::ListJobs {
            path,
            status,
            filter,
        } => cmd_list_jobs(container, path, *status, filter.as_deref()),
        Commands::GetBranch { job } => cmd_get_branch(container, job),
        Commands::ReplaceBranch { job, branch } => cmd_replace_branch(container, job, branch),
        Commands::Build {
            job,
            params,
            wait,
            timeout,
        } => cmd_build(
            container,
            job,
            params.as_deref(),
            *wait,
            timeout.map(Duration::from_secs),
        ),
        Commands::Logs { job, build } => cmd_logs(container, job, *build),
        Commands::ConfigGet { job, output } => cmd_config_get(container, job, output.as_deref()),
        Commands::ConfigUpdate { job, file } => {
            let job = JobPath::parse(job);
            container.job_service().update_config(&job, file)?;
            output::success(&format!("Configuration updated for {job}"));
            Ok(())
        }
        Commands::Create { name, file } => {
            let job = JobPath::parse(name);
            container.job_service().create(&job, file)?;
            output::success(&format!("Job {job} created successfully"));
            Ok(())
        }
        Commands::Copy { source, target } => {
            let (source, target) = (JobPath::parse(source), JobPath::parse(target));
            container.job_service().copy(&source, &target)?;
            output::success(&format!("Job {source} copied to {target}"));
            Ok(())
        }
        Commands::Delete { job, force } => cmd_delete(container, job, *force),
        Commands::Enable { job } => {
            let job = JobPath::parse(job);
            container.job_service().enable(&job)?;
            output::success(&format!("Job {job} enabled"));
            Ok(())
        }
        Commands::Disable { job } => {
            let job = JobPath::parse(job);
            container.job_service().disable(&job)?;
            output::success(&format!("Job {job} disabled"));
            Ok(())
        }
        Commands::Plugins { output } => cmd_plugins(container, output.as_deref()),
        Commands::Nodes => cmd_nodes(container),
        Commands::Queue => cmd_queue(container),
        Commands::CancelQueue { queue_id } => {
            container.system_service().cancel_queue(*queue_id)?;
            output::success(&format!("Cancelled queue item {queue_id}"));
            Ok(())
        }
        Commands::Info => cmd_info(container),
        Commands::Config { .. } | Commands::Completion { .. } => Err(CliError::Usage(
            "command does not talk to the server".to_string(),
        )),
    }
}

fn cmd_completion(shell: Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}

fn cmd_config(command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load()?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => match global_config_path() {
            Some(path) => {
                let state = if path.exists() { "exists" } else { "not found" };
                output::info(&format!("{} ({state})", path.display()));
            }
            None => output::notice("No config directory available on this platform"),
        },
        ConfigCommands::Template => output::info(&Settings::template()),
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_list_jobs(
    container: &ServiceContainer,
    path: &str,
    with_status: bool,
    filter: Option<&str>,
) -> CliResult<()> {
    if filter.is_some() && !with_status {
        output::warning("--filter only applies together with --status");
    }

    let path = JobPath::parse(path);
    let rows = container
        .job_service()
        .list_jobs(&path, with_status, filter)?;

    if rows.is_empty() {
        output::notice("No jobs found matching the criteria.");
        return Ok(());
    }

    let mut headers = vec!["Type", "Name", "Path"];
    if with_status {
        headers.extend(["Status", "Last Build", "Duration"]);
    }
    let mut table = Table::new(headers);

    for row in rows {
        let kind = if row.entry.is_folder() { "Folder" } else { "Job" };
        let mut cells = vec![
            Cell::plain(kind),
            Cell::plain(row.entry.name.as_str()),
            Cell::plain(row.entry.fullname.as_str()),
        ];
        match &row.status {
            Some(status @ JobStatus::Built {
                timestamp_ms,
                duration_ms,
                ..
            }) => cells.extend([
                Cell::status(status.label()),
                Cell::plain(output::format_timestamp(*timestamp_ms, LIST_TIME_FORMAT)),
                Cell::plain(output::format_duration(Duration::from_millis(*duration_ms))),
            ]),
            Some(status @ JobStatus::NeverBuilt) => cells.extend([
                Cell::status(status.label()),
                Cell::plain("Never built"),
                Cell::plain("N/A"),
            ]),
            Some(status @ JobStatus::FetchFailed(_)) => cells.extend([
                Cell::status(status.label()),
                Cell::plain("Failed to fetch"),
                Cell::plain("N/A"),
            ]),
            None => {}
        }
        table.push(cells);
    }

    table.print();
    Ok(())
}

fn cmd_get_branch(container: &ServiceContainer, job: &str) -> CliResult<()> {
    let job = JobPath::parse(job);
    match container.branch_service().get_branch(&job)? {
        Some(branch) => output::info(&format!("Branch: {}", branch.cyan())),
        None => output::notice("No branch configuration found for this job."),
    }
    Ok(())
}

fn cmd_replace_branch(container: &ServiceContainer, job: &str, branch: &str) -> CliResult<()> {
    let job = JobPath::parse(job);
    match container.branch_service().replace_branch(&job, branch)? {
        ReplaceOutcome::NotFound => {
            output::notice("No branch configuration found for this job. Nothing changed.")
        }
        ReplaceOutcome::Unchanged { branch } => {
            output::notice(&format!("No changes made. Branch stays {branch}"))
        }
        ReplaceOutcome::Replaced {
            old,
            new,
            occurrences,
        } => {
            if occurrences > 1 {
                output::warning(&format!(
                    "'{old}' appeared {occurrences} times in the configuration; all were replaced"
                ));
            }
            output::success(&format!("Successfully updated branch from {old} to {new}"));
        }
    }
    Ok(())
}

#[instrument(skip(container, params))]
fn cmd_build(
    container: &ServiceContainer,
    job: &str,
    params: Option<&str>,
    wait: bool,
    timeout: Option<Duration>,
) -> CliResult<()> {
    // Bad parameters must fail before anything is submitted.
    let params = match params {
        Some(raw) => BuildParams::from_json(raw)?,
        None => BuildParams::default(),
    };
    let job = JobPath::parse(job);
    let service = container.build_service();

    let queue_id = service.trigger(&job, &params)?;
    output::success(&format!("Build triggered for {job} (Queue ID: {queue_id})"));
    if !wait {
        return Ok(());
    }

    let mut report = |progress: &WaitProgress| match progress {
        WaitProgress::Queued { .. } => output::progress("Waiting for build to start..."),
        WaitProgress::Started { number } => {
            output::progress(&format!("Build #{number} started. Waiting for completion..."))
        }
    };

    match service.wait(&job, queue_id, timeout, &mut report)? {
        WaitOutcome::Completed {
            number,
            result,
            duration,
        } => {
            let duration = output::format_duration(duration);
            match result {
                Some(result) if result.is_success() => {
                    output::success(&format!(
                        "Build #{number} completed successfully in {duration}"
                    ));
                    Ok(())
                }
                result => Err(CliError::BuildUnsuccessful {
                    job: job.to_string(),
                    number,
                    result: result
                        .map(|r| r.to_string())
                        .unwrap_or_else(|| "UNKNOWN".to_string()),
                    duration,
                }),
            }
        }
        WaitOutcome::Cancelled { queue_id } => Err(CliError::Cancelled { queue_id }),
        WaitOutcome::TimedOut { queue_id, number } => Err(CliError::TimedOut {
            waiting_for: match number {
                Some(number) => format!("build #{number} of {job}"),
                None => format!("queue item {queue_id} to start"),
            },
        }),
    }
}

fn cmd_logs(container: &ServiceContainer, job: &str, build: Option<u64>) -> CliResult<()> {
    let job = JobPath::parse(job);
    match container.job_service().logs(&job, build)? {
        Some(log) => {
            output::header(&format!("=== Build #{} Console Output ===", log.number));
            output::info(&log.text);
        }
        None => output::notice(&format!("No builds found for {job}")),
    }
    Ok(())
}

fn cmd_config_get(container: &ServiceContainer, job: &str, out: Option<&Path>) -> CliResult<()> {
    let job = JobPath::parse(job);
    let service = container.job_service();
    match out {
        Some(path) => {
            service.save_config(&job, path)?;
            output::success(&format!("Configuration saved to {}", path.display()));
        }
        None => output::info(service.config(&job)?.as_str()),
    }
    Ok(())
}

fn cmd_delete(container: &ServiceContainer, job: &str, force: bool) -> CliResult<()> {
    let job = JobPath::parse(job);
    job.require_job()?;

    if !force && !confirm(&format!("Are you sure you want to delete {job}? (y/N):"))? {
        output::info("Operation cancelled.");
        return Ok(());
    }

    container.job_service().delete(&job)?;
    output::success(&format!("Job {job} deleted successfully"));
    Ok(())
}

/// Ask a yes/no question on stdin; only `y` or `yes` confirms.
fn confirm(question: &str) -> CliResult<bool> {
    output::prompt(question);
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .map_err(|e| InfraError::io("read confirmation", e))?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn cmd_plugins(container: &ServiceContainer, out: Option<&Path>) -> CliResult<()> {
    let plugins = container.system_service().plugins()?;

    let mut table = Table::new(["Name", "Version", "Enabled", "Long Name"]);
    for plugin in &plugins {
        let enabled = if plugin.enabled {
            Cell::colored("yes", Some(Color::Green))
        } else {
            Cell::colored("no", Some(Color::Red))
        };
        table.push(vec![
            Cell::plain(plugin.short_name.as_str()),
            Cell::plain(plugin.version.as_str()),
            enabled,
            Cell::plain(plugin.long_name.as_str()),
        ]);
    }

    match out {
        Some(path) => {
            let mut rendered = table.render(false);
            rendered.push('\n');
            container.fs.write(path, &rendered).writing(path)?;
            output::success(&format!("Plugin list saved to {}", path.display()));
        }
        None => table.print(),
    }
    Ok(())
}

fn cmd_nodes(container: &ServiceContainer) -> CliResult<()> {
    let nodes = container.system_service().nodes()?;

    let mut table = Table::new(["Name", "Status", "Executors"]);
    for node in &nodes {
        let status = if node.offline { "Offline" } else { "Online" };
        table.push(vec![
            Cell::plain(node.name()),
            Cell::status(status),
            Cell::plain(node.num_executors.to_string()),
        ]);
    }
    table.print();
    Ok(())
}

fn cmd_queue(container: &ServiceContainer) -> CliResult<()> {
    let entries = container.system_service().queue()?;
    if entries.is_empty() {
        output::notice("Build queue is empty");
        return Ok(());
    }

    let mut table = Table::new(["ID", "Name", "Why Blocked", "In Queue Since"]);
    for entry in &entries {
        table.push(vec![
            Cell::plain(entry.id.to_string()),
            Cell::plain(entry.task.name.as_str()),
            Cell::plain(entry.why.as_deref().unwrap_or("N/A")),
            Cell::plain(output::format_timestamp(
                entry.in_queue_since,
                QUEUE_TIME_FORMAT,
            )),
        ]);
    }
    table.print();
    Ok(())
}

fn cmd_info(container: &ServiceContainer) -> CliResult<()> {
    let info = container.system_service().info()?;
    let controller = &info.controller;
    let unknown = || "Unknown".to_string();

    output::header("=== Jenkins System Information ===");
    output::field("URL", &info.url);
    output::field("Version", &controller.version.clone().unwrap_or_else(unknown));
    output::field(
        "Connected as",
        &format!("{} ({})", info.user.full_name, info.username),
    );
    output::field("Mode", &controller.mode.clone().unwrap_or_else(unknown));
    output::field(
        "Node Description",
        &controller.node_description.clone().unwrap_or_else(unknown),
    );
    output::field("Quieting Down", &controller.quieting_down);
    output::field(
        "Agent Port",
        &controller
            .slave_agent_port
            .map(|p| p.to_string())
            .unwrap_or_else(unknown),
    );
    output::field("CSRF Protection", &controller.use_crumbs);
    output::field("Views", &controller.views.len());
    output::field(
        "Primary View",
        &controller
            .primary_view
            .as_ref()
            .map(|v| v.name.clone())
            .unwrap_or_else(unknown),
    );
    output::field("Total Executors", &info.executors.total_executors);
    output::field("Busy Executors", &info.executors.busy_executors);
    output::field("Idle Executors", &info.executors.idle());
    Ok(())
}
