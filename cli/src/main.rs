mod logging;
mod stats;
mod table;
mod tui;

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use taskdeck_core::{
    apply_to_form, build_report, parse_args, AppConfig, HttpTaskGateway, MutationOutcome, Status,
    TaskForm, TaskId, TaskStore,
};
use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;

#[derive(Parser)]
#[command(name = "taskdeck")]
#[command(about = "A kanban client for a remote task service", long_about = None)]
struct Cli {
    /// Base URL of the task service (overrides config and TASKDECK_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Print the kanban board
    Board,
    /// List all tasks as a table
    List,
    /// Show the analytics dashboard
    Stats {
        /// Print figures instead of opening the dashboard
        #[arg(long)]
        plain: bool,
    },
    /// Add a new task (usage: add "Task title" desc:"details" start:today due:fri pri:H)
    Add {
        /// Task title followed by metadata (key:value)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Edit a task; only the given fields change (usage: edit 12 due:+1w pri:L)
    Edit {
        id: TaskId,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Move a task to another column (usage: move 12 wip)
    Move {
        id: TaskId,
        /// To Do, Work In Progress, Completed or Expired; short forms accepted
        #[arg(num_args = 1.., required = true)]
        status: Vec<String>,
    },
    /// Delete a task
    Delete { id: TaskId },
    /// Open the Terminal User Interface
    Tui,
}

/// Waits for a mutation and turns a failed outcome into an error.
fn settle(runtime: &Runtime, handle: JoinHandle<MutationOutcome>, action: &str) -> Result<MutationOutcome> {
    let outcome = runtime
        .block_on(handle)
        .with_context(|| format!("{} was aborted", action))?;
    if let MutationOutcome::Failed { .. } = outcome {
        bail!("{} failed", action);
    }
    Ok(outcome)
}

fn build_form(args: &[String], base: TaskForm) -> Result<TaskForm> {
    let parsed = parse_args(args);
    let mut form = base;
    for warning in apply_to_form(&parsed, &mut form) {
        println!("Warning: {}", warning);
    }
    if let Err(errors) = form.validate() {
        let text: Vec<String> = errors.iter().map(ToString::to_string).collect();
        bail!(text.join("; "));
    }
    Ok(form)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load(None)?;
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }

    let interactive = matches!(
        cli.command,
        None | Some(Commands::Tui) | Some(Commands::Stats { plain: false })
    );
    if interactive {
        logging::init_file(&config.log_path(), &config.log_filter)?;
    } else {
        logging::init_stderr(&config.log_filter)?;
    }
    tracing::debug!(api = %config.api_base_url, "configuration loaded");

    let runtime = Builder::new_multi_thread().enable_all().build()?;
    let gateway = Arc::new(HttpTaskGateway::new(&config.api_base_url));
    let store = TaskStore::new(gateway, runtime.handle().clone()).with_policy(config.policy());

    match cli.command {
        Some(Commands::Board) => {
            settle(&runtime, store.load(), "Loading tasks")?;
            table::show_board(&store.snapshot());
        }
        Some(Commands::List) => {
            settle(&runtime, store.load(), "Loading tasks")?;
            table::show_table(&store.snapshot());
        }
        Some(Commands::Stats { plain }) => {
            settle(&runtime, store.load(), "Loading tasks")?;
            let report = build_report(store.snapshot().as_ref());
            if plain {
                println!("Total tasks:      {}", report.total);
                println!("Completion rate:  {}%", report.completion_rate);
                println!("Avg. completion:  {:.1} days", report.avg_completion_days);
                println!("Overdue:          {}", report.overdue);
                for s in &report.by_status {
                    println!("  {:<18} {}", s.status.label(), s.count);
                }
                for p in &report.by_priority {
                    println!("  {:<18} {}", p.priority.label(), p.count);
                }
            } else {
                stats::run(&report)?;
            }
        }
        Some(Commands::Add { args }) => {
            if args.is_empty() {
                bail!("Task title is required.");
            }
            let form = build_form(&args, TaskForm::default())?;
            settle(&runtime, store.create(form), "Creating task")?;

            // The new task is the only one in the local collection.
            match store.snapshot().iter().next() {
                Some(task) => {
                    println!("Task added: {} (ID: {})", task.title, task.id);
                    if let Some(d) = task.due_date {
                        println!("  Due: {}", d);
                    }
                    println!("  Priority: {}", task.priority());
                }
                None => println!("Task added."),
            }
        }
        Some(Commands::Edit { id, args }) => {
            settle(&runtime, store.load(), "Loading tasks")?;
            let current = store
                .snapshot()
                .get(id)
                .cloned()
                .ok_or_else(|| anyhow!("Task #{} not found", id))?;
            let form = build_form(&args, TaskForm::from_task(&current))?;
            settle(&runtime, store.update(id, form), "Updating task")?;
            println!("Task #{} updated.", id);
        }
        Some(Commands::Move { id, status }) => {
            let status = Status::parse_loose(&status.join(" "))?;
            settle(&runtime, store.load(), "Loading tasks")?;
            if !store.snapshot().contains(id) {
                bail!("Task #{} not found", id);
            }
            settle(&runtime, store.move_task(id, status), "Moving task")?;
            println!("Task #{} moved to {}.", id, status);
        }
        Some(Commands::Delete { id }) => {
            settle(&runtime, store.remove(id), "Deleting task")?;
            println!("Task #{} deleted.", id);
        }
        Some(Commands::Tui) | None => {
            tui::run(store, runtime.handle().clone())?;
        }
    }
    Ok(())
}
