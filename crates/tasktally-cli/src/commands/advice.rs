use clap::Args;
use tasktally_core::{advice_for, now_local, Config, RuleBasedAdvisor, TaskSnapshot};

use crate::common::{load_tasks, resolve_task, CliResult};

#[derive(Args)]
pub struct AdviceArgs {
    /// Task ID or unique prefix; all tasks when omitted
    id: Option<String>,
}

const UNAVAILABLE: &str = "(advice unavailable)";

pub fn run(args: AdviceArgs, config: &Config) -> CliResult {
    let tasks = load_tasks(config)?;
    let now = now_local();
    let advisor = RuleBasedAdvisor;

    match args.id {
        Some(key) => {
            let task = resolve_task(&tasks, &key)?;
            let text = advice_for(&advisor, &TaskSnapshot::of(task, now));
            println!("{}", text.as_deref().unwrap_or(UNAVAILABLE));
        }
        None => {
            let blocks: Vec<String> = tasks
                .iter()
                .map(|task| {
                    let title = if task.title.is_empty() {
                        "(no title)"
                    } else {
                        task.title.as_str()
                    };
                    let text = advice_for(&advisor, &TaskSnapshot::of(task, now));
                    format!("{title}:\n{}", text.as_deref().unwrap_or(UNAVAILABLE))
                })
                .collect();
            if blocks.is_empty() {
                println!("No tasks.");
            } else {
                println!("{}", blocks.join("\n\n"));
            }
        }
    }
    Ok(())
}
