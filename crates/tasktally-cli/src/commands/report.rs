use chrono::{Days, NaiveDate};
use clap::Args;
use tasktally_core::{format_hms, now_local, period_report, Config, Period};

use crate::common::{load_tasks, print_json, resolve_task, CliResult};

#[derive(Args)]
pub struct ReportArgs {
    /// Task ID or unique prefix
    id: String,
    /// Bucket size: day, week or month
    #[arg(long, default_value = "day")]
    period: Period,
    /// First day (default: six days before --to)
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Last day (default: today)
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: ReportArgs, config: &Config) -> CliResult {
    let tasks = load_tasks(config)?;
    let now = now_local();
    let task = resolve_task(&tasks, &args.id)?;

    let to = args.to.unwrap_or_else(|| now.date());
    let from = args
        .from
        .unwrap_or_else(|| to.checked_sub_days(Days::new(6)).unwrap_or(to));
    if from > to {
        return Err(format!("--from {from} is after --to {to}").into());
    }

    let report = period_report(task, from, to, args.period, now);
    if args.json {
        return print_json(&report);
    }

    println!("{} ({} to {}, by {})", task.title, from, to, report.period);
    for bucket in &report.buckets {
        println!(
            "{}  spent {}  allocated {}",
            bucket.label,
            format_hms(bucket.spent_secs),
            format_hms(bucket.allocated_secs)
        );
    }
    println!(
        "total       spent {}  allocated {}",
        format_hms(report.total_spent_secs),
        format_hms(report.total_allocated_secs)
    );
    Ok(())
}
