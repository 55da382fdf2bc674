//! Demo 01: Basic Usage
//!
//! Creates, edits, completes and deletes tasks in a directory-backed store,
//! then prints the derived views.
//!
//! Run with: cargo run --example 01_basic_usage

use eyre::Result;
use taskpad::{DirStorage, NewTask, Priority, PriorityFilter, StatusFilter, TaskPatch, TaskStore, today};

fn main() -> Result<()> {
    // Create a temporary directory for this demo
    let temp_dir = tempfile::tempdir()?;
    let data_path = temp_dir.path().to_path_buf();

    println!("taskpad Basic Usage Demo");
    println!("========================\n");
    println!("Data path: {}\n", data_path.display());

    let mut store = TaskStore::open(DirStorage::open(&data_path)?);

    // CREATE
    println!("1. CREATE - Adding tasks...");
    let report = store.create(
        NewTask::new("Finish client report")
            .description("Numbers for Q3")
            .priority(Priority::High),
    )?;
    let walk = store.create(NewTask::new("Evening walk").description("Exercise for health"))?;
    store.create(NewTask::new("Read chapter 4").priority(Priority::Low))?;
    println!("   Created {} tasks\n", store.len());

    // UPDATE
    println!("2. UPDATE - Raising priority of the walk...");
    let walk = store.update(&walk.id, TaskPatch::default().priority(Priority::High))?;
    println!("   {} is now {}\n", walk.title, walk.priority);

    // TOGGLE
    println!("3. TOGGLE - Completing the report...");
    store.toggle_completion(&report.id)?;
    let stats = store.stats();
    println!(
        "   total={} completed={} pending={}\n",
        stats.total, stats.completed, stats.pending
    );

    // LIST
    println!("4. LIST - Pending high-priority tasks...");
    for task in store.list(StatusFilter::Pending, PriorityFilter::Only(Priority::High)) {
        println!("   - {}", task.title);
    }
    println!();

    // INSIGHTS
    println!("5. INSIGHTS");
    println!("   Recommendation: {}", store.priority_recommendation());
    for suggestion in store.suggestion_preview() {
        println!("   Suggestion: {}", suggestion);
    }
    let summary = store.daily_summary(today());
    println!(
        "   Today: {} completed, {}% productivity",
        summary.completed_today, summary.productivity_percent
    );
    println!();

    // DELETE
    println!("6. DELETE - Removing the walk...");
    store.delete(&walk.id)?;
    println!("   Remaining tasks: {}\n", store.len());

    // Reopen to show the collection was persisted
    let reopened = TaskStore::open(DirStorage::open(&data_path)?);
    println!("Reopened store holds {} tasks", reopened.len());

    println!("Demo complete!");
    Ok(())
}
