use clap::Args;
use serde::Serialize;
use tasktally_core::{aggregate, aggregate_all, format_hms, now_local, Config, TimeTotals};

use crate::common::{load_tasks, print_json, resolve_task, CliResult};

#[derive(Args)]
pub struct StatsArgs {
    /// Only this task (ID or unique prefix)
    #[arg(long)]
    task: Option<String>,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct StatsRow {
    id: Option<String>,
    title: String,
    totals: TimeTotals,
}

fn print_row(row: &StatsRow) {
    println!(
        "{:<30} today {}  week {}  month {}  total {}",
        row.title,
        format_hms(row.totals.today),
        format_hms(row.totals.week),
        format_hms(row.totals.month),
        format_hms(row.totals.total)
    );
}

pub fn run(args: StatsArgs, config: &Config) -> CliResult {
    let tasks = load_tasks(config)?;
    let now = now_local();

    let mut rows: Vec<StatsRow> = match &args.task {
        Some(key) => {
            let task = resolve_task(&tasks, key)?;
            vec![StatsRow {
                id: Some(task.id().to_string()),
                title: task.title.clone(),
                totals: aggregate(task, now),
            }]
        }
        None => tasks
            .iter()
            .map(|t| StatsRow {
                id: Some(t.id().to_string()),
                title: t.title.clone(),
                totals: aggregate(t, now),
            })
            .collect(),
    };
    if args.task.is_none() {
        rows.push(StatsRow {
            id: None,
            title: "All tasks".to_string(),
            totals: aggregate_all(&tasks, now),
        });
    }

    if args.json {
        print_json(&rows)?;
    } else {
        rows.iter().for_each(print_row);
    }
    Ok(())
}
