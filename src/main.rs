use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, eyre};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use taskpad::{
    Config, DirStorage, NewTask, Priority, PriorityFilter, StatusFilter, Task, TaskError, TaskPatch, TaskStore, Theme,
    parse_date, today,
};

#[derive(Parser)]
#[command(name = "taskpad")]
#[command(about = "taskpad - personal task tracker with heuristic suggestions")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Directory holding task data (default: from config, else the platform data dir)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Config file (default: ~/.config/taskpad/taskpad.yml)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a task
    Add {
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        /// Due date, YYYY-MM-DD
        #[arg(long, value_parser = parse_date)]
        due: Option<NaiveDate>,
        #[arg(short, long)]
        priority: Option<Priority>,
    },

    /// Change fields of a task
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_parser = parse_date, conflicts_with = "no_due")]
        due: Option<NaiveDate>,
        /// Clear the due date
        #[arg(long)]
        no_due: bool,
        #[arg(long)]
        priority: Option<Priority>,
    },

    /// Mark a task completed, or pending again
    Toggle { id: String },

    /// Delete a task
    Rm {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List tasks
    List {
        #[arg(short, long, default_value = "all")]
        status: StatusFilter,
        #[arg(short, long, default_value = "all")]
        priority: PriorityFilter,
    },

    /// Show task counts
    Stats,

    /// Show counts, the priority recommendation and a suggestion preview
    Overview,

    /// Show the priority recommendation
    Recommend,

    /// Show suggestions based on completed tasks
    Suggest {
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Create a task from a suggestion
    SuggestAdd { suggestion: String },

    /// Show the daily summary
    Summary {
        /// Day to summarize, YYYY-MM-DD (default: today)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },

    /// Show or change the theme: light, dark or toggle
    Theme { value: Option<String> },
}

#[derive(Clone, Copy)]
enum Severity {
    Success,
    Error,
    Info,
}

fn notify(message: &str, severity: Severity) {
    match severity {
        Severity::Success => println!("{}", message.green()),
        Severity::Error => eprintln!("{}", message.red()),
        Severity::Info => println!("{}", message.blue()),
    }
}

fn main() {
    // Logs go to stderr so command output stays clean
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        match e.downcast_ref::<TaskError>() {
            Some(TaskError::Validation(msg)) => notify(&format!("Error: {}", msg), Severity::Error),
            Some(TaskError::NotFound(id)) => notify(&format!("Error: task not found: {}", id), Severity::Error),
            _ => notify(&format!("Error: {:#}", e), Severity::Error),
        }
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data_dir());

    let storage = DirStorage::open(&data_dir)?;
    let mut store = TaskStore::open(storage);

    match cli.command {
        Commands::Add {
            title,
            description,
            due,
            priority,
        } => {
            let task = store.create(NewTask {
                title,
                description,
                due_date: due,
                priority,
            })?;
            notify("Task created successfully!", Severity::Success);
            print_task(&task, today());
        }
        Commands::Edit {
            id,
            title,
            description,
            due,
            no_due,
            priority,
        } => {
            let id = resolve_id(&store, &id)?;
            let patch = TaskPatch {
                title,
                description,
                due_date: if no_due { Some(None) } else { due.map(Some) },
                priority,
            };
            if patch.is_empty() {
                notify("Nothing to change", Severity::Info);
                return Ok(());
            }
            let task = store.update(&id, patch)?;
            notify("Task updated successfully!", Severity::Success);
            print_task(&task, today());
        }
        Commands::Toggle { id } => {
            let id = resolve_id(&store, &id)?;
            let task = store.toggle_completion(&id)?;
            if task.completed {
                notify("Task completed!", Severity::Success);
            } else {
                notify("Task marked as pending", Severity::Success);
            }
        }
        Commands::Rm { id, yes } => {
            let id = resolve_id(&store, &id)?;
            let title = store.get(&id)?.title.clone();
            if !yes && !confirm(&format!("Are you sure you want to delete \"{}\"?", title))? {
                notify("Delete cancelled", Severity::Info);
                return Ok(());
            }
            store.delete(&id)?;
            notify("Task deleted successfully!", Severity::Success);
        }
        Commands::List { status, priority } => {
            let tasks = store.list(status, priority);
            if tasks.is_empty() {
                notify("No tasks found", Severity::Info);
            }
            let today = today();
            for task in tasks {
                print_task(task, today);
            }
        }
        Commands::Stats => print_stats(&store),
        Commands::Overview => {
            print_stats(&store);
            println!();
            println!("{} {}", "Priority:".bold(), store.priority_recommendation());
            println!();
            println!("{}", "Suggestions:".bold());
            for suggestion in store.suggestions(config.preview_limit) {
                println!("  - {}", suggestion);
            }
        }
        Commands::Recommend => println!("{}", store.priority_recommendation()),
        Commands::Suggest { limit } => {
            println!("Based on your task patterns, here are some suggestions:");
            for (index, suggestion) in store.suggestions(limit.unwrap_or(usize::MAX)).iter().enumerate() {
                println!("  {}. {}", index + 1, suggestion);
            }
        }
        Commands::SuggestAdd { suggestion } => {
            let task = store.add_suggestion(&suggestion)?;
            notify("Task created successfully!", Severity::Success);
            print_task(&task, today());
        }
        Commands::Summary { date } => {
            let summary = store.daily_summary(date.unwrap_or_else(today));
            println!("{} {}", "Daily summary for".bold(), summary.date);
            println!("  Completed today:    {}", summary.completed_today);
            println!("  Still pending:      {}", summary.pending);
            println!("  Productivity:       {}%", summary.productivity_percent);
            println!("  High priority left: {}", summary.high_priority_pending);
            println!();
            for insight in &summary.insights {
                println!("  {}", insight);
            }
            if !summary.completed_today_titles.is_empty() {
                println!();
                println!("{}", "Completed today:".bold());
                for title in &summary.completed_today_titles {
                    println!("  - {}", title);
                }
            }
        }
        Commands::Theme { value } => {
            let current = Theme::load(store.storage());
            let next = match value.as_deref() {
                None => {
                    println!("{}", current);
                    return Ok(());
                }
                Some("toggle") => current.toggled(),
                Some(other) => other.parse::<Theme>().map_err(|e| eyre!(e))?,
            };
            next.save(store.storage_mut())?;
            notify(&format!("Switched to {} theme", next), Severity::Success);
        }
    }

    Ok(())
}

/// Accept a full id or an unambiguous prefix of one
fn resolve_id<S: taskpad::Storage>(store: &TaskStore<S>, id: &str) -> Result<String> {
    Ok(store.resolve_prefix(id)?)
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn print_stats<S: taskpad::Storage>(store: &TaskStore<S>) {
    let stats = store.stats();
    println!(
        "Total: {}  Completed: {}  Pending: {}",
        stats.total.to_string().bold(),
        stats.completed.to_string().green(),
        stats.pending.to_string().yellow()
    );
}

fn print_task(task: &Task, today: NaiveDate) {
    let marker = if task.completed { "[x]".green() } else { "[ ]".normal() };
    let priority = match task.priority {
        Priority::High => task.priority.as_str().red(),
        Priority::Medium => task.priority.as_str().yellow(),
        Priority::Low => task.priority.as_str().cyan(),
    };
    let title = if task.completed {
        task.title.strikethrough()
    } else {
        task.title.normal()
    };
    let due = match task.due_date {
        Some(date) if task.is_overdue_on(today) => format!("due {}", date).red(),
        Some(date) => format!("due {}", date).normal(),
        None => "no due date".dimmed(),
    };

    println!("{} {} {} ({}, {})", marker, task.id.dimmed(), title, priority, due);
    if !task.description.is_empty() {
        println!("      {}", task.description);
    }
}
