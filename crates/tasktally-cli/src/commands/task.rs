//! Task management commands for CLI.

use clap::{Args, Subcommand};
use serde::Serialize;
use tasktally_core::{aggregate, format_hms, now_local, Config, Task, TimeTotals, Timestamp};

use crate::common::{
    deadline_arg, load_tasks, open_tracker, print_json, resolve_task, timestamp_arg, CliResult,
};

/// Pomodoro overrides shared by `add` and `edit`.
#[derive(Args, Default)]
pub struct PomodoroArgs {
    /// Work phase in minutes
    #[arg(long)]
    work: Option<u32>,
    /// Short break in minutes
    #[arg(long = "break")]
    break_min: Option<u32>,
    /// Long break in minutes
    #[arg(long)]
    long_break: Option<u32>,
    /// Work phases before a long break
    #[arg(long)]
    cycles: Option<u32>,
}

impl PomodoroArgs {
    fn apply(&self, task: &mut Task) {
        if let Some(v) = self.work {
            task.pomodoro.work_min = v;
        }
        if let Some(v) = self.break_min {
            task.pomodoro.break_min = v;
        }
        if let Some(v) = self.long_break {
            task.pomodoro.long_break_min = v;
        }
        if let Some(v) = self.cycles {
            task.pomodoro.cycles_before_long = v;
        }
    }
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Add {
        /// Task title
        title: String,
        /// Task description
        #[arg(long)]
        description: Option<String>,
        /// Deadline (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)
        #[arg(long, value_parser = deadline_arg)]
        deadline: Option<Timestamp>,
        /// Allocated minutes (default from config)
        #[arg(long)]
        allocated: Option<u32>,
        /// Track this task in Pomodoro cycles
        #[arg(long)]
        pomodoro: Option<bool>,
        #[command(flatten)]
        cycle: PomodoroArgs,
    },
    /// List tasks with tracked totals
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one task with its sessions
    Show {
        /// Task ID or unique prefix
        id: String,
    },
    /// Update a task
    Edit {
        /// Task ID or unique prefix
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New deadline
        #[arg(long, value_parser = deadline_arg, conflicts_with = "clear_deadline")]
        deadline: Option<Timestamp>,
        /// Remove the deadline
        #[arg(long)]
        clear_deadline: bool,
        /// New allocated minutes
        #[arg(long)]
        allocated: Option<u32>,
        /// Set completed status
        #[arg(long)]
        completed: Option<bool>,
        /// Enable or disable Pomodoro cycles
        #[arg(long)]
        pomodoro: Option<bool>,
        #[command(flatten)]
        cycle: PomodoroArgs,
    },
    /// Delete a task and its history
    Remove {
        /// Task ID or unique prefix
        id: String,
    },
    /// Record time spent away from the tracker
    Log {
        /// Task ID or unique prefix
        id: String,
        /// Session start (YYYY-MM-DDTHH:MM:SS)
        #[arg(long, value_parser = timestamp_arg)]
        start: Timestamp,
        /// Session end (YYYY-MM-DDTHH:MM:SS)
        #[arg(long, value_parser = timestamp_arg)]
        end: Timestamp,
    },
}

#[derive(Serialize)]
struct TaskRow<'a> {
    id: &'a str,
    title: &'a str,
    is_completed: bool,
    is_overdue: bool,
    use_pomodoro: bool,
    time_allocated: u32,
    totals: TimeTotals,
}

pub fn run(action: TaskAction, config: &Config) -> CliResult {
    let now = now_local();

    match action {
        TaskAction::Add {
            title,
            description,
            deadline,
            allocated,
            pomodoro,
            cycle,
        } => {
            let mut task = config.new_task(title);
            if let Some(description) = description {
                task.description = description;
            }
            task.deadline = deadline;
            if let Some(allocated) = allocated {
                task.time_allocated = allocated;
            }
            if let Some(pomodoro) = pomodoro {
                task.use_pomodoro = pomodoro;
            }
            cycle.apply(&mut task);
            let id = task.id().to_string();
            open_tracker(config)?.add_task(task)?;
            println!("Task created: {id}");
        }
        TaskAction::List { json } => {
            let tasks = load_tasks(config)?;
            let rows: Vec<TaskRow<'_>> = tasks
                .iter()
                .map(|t| TaskRow {
                    id: t.id(),
                    title: &t.title,
                    is_completed: t.is_completed,
                    is_overdue: t.is_overdue(now),
                    use_pomodoro: t.use_pomodoro,
                    time_allocated: t.time_allocated,
                    totals: aggregate(t, now),
                })
                .collect();
            if json {
                print_json(&rows)?;
            } else if rows.is_empty() {
                println!("No tasks.");
            } else {
                for row in rows {
                    let mark = if row.is_completed {
                        "x"
                    } else if row.is_overdue {
                        "!"
                    } else {
                        " "
                    };
                    println!(
                        "[{mark}] {}  {}  today {}  total {}",
                        row.id,
                        row.title,
                        format_hms(row.totals.today),
                        format_hms(row.totals.total)
                    );
                }
            }
        }
        TaskAction::Show { id } => {
            let tasks = load_tasks(config)?;
            let task = resolve_task(&tasks, &id)?;
            print_json(task)?;
        }
        TaskAction::Edit {
            id,
            title,
            description,
            deadline,
            clear_deadline,
            allocated,
            completed,
            pomodoro,
            cycle,
        } => {
            let mut tracker = open_tracker(config)?;
            let id = resolve_task(tracker.tasks(), &id)?.id().to_string();
            tracker.update_task(&id, |task| {
                if let Some(title) = title {
                    task.title = title;
                }
                if let Some(description) = description {
                    task.description = description;
                }
                if clear_deadline {
                    task.deadline = None;
                } else if deadline.is_some() {
                    task.deadline = deadline;
                }
                if let Some(allocated) = allocated {
                    task.time_allocated = allocated;
                }
                if let Some(completed) = completed {
                    task.is_completed = completed;
                }
                if let Some(pomodoro) = pomodoro {
                    task.use_pomodoro = pomodoro;
                }
                cycle.apply(task);
            })?;
            println!("Task updated: {id}");
        }
        TaskAction::Remove { id } => {
            let mut tracker = open_tracker(config)?;
            let id = resolve_task(tracker.tasks(), &id)?.id().to_string();
            let task = tracker.remove_task(&id)?;
            println!("Task removed: {} ({})", id, task.title);
        }
        TaskAction::Log { id, start, end } => {
            let mut tracker = open_tracker(config)?;
            let id = resolve_task(tracker.tasks(), &id)?.id().to_string();
            tracker.record_session(&id, start, end)?;
            println!(
                "Logged {} on {id}",
                format_hms((end - start).num_seconds().max(0) as u64)
            );
        }
    }
    Ok(())
}
