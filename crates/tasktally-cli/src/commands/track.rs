//! Foreground tracking loop.
//!
//! Starts the task, prints one status line per tick, and shuts the tracker
//! down on Ctrl-C or when `--for` elapses.

use std::future::Future;
use std::io;
use std::time::Duration;

use clap::Args;
use tasktally_core::{
    aggregate, format_hms, now_local, run_ticker, Config, Event, SharedTracker, TrackerStatus,
};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::common::{open_tracker, resolve_task, CliResult};

#[derive(Args)]
pub struct TrackArgs {
    /// Task ID or unique prefix
    id: String,
    /// Stop automatically after this many seconds
    #[arg(long = "for", value_name = "SECS")]
    limit: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    Interrupted,
    TimeLimit,
    /// Ctrl-C could not be watched and there is no time limit.
    SignalUnavailable,
}

/// Wait for `interrupt` or for `limit` to elapse, whichever comes first.
///
/// If listening for the interrupt fails, the failure is logged and only the
/// limit is waited for.
async fn wait_for_stop<F>(limit: Option<Duration>, interrupt: F) -> StopReason
where
    F: Future<Output = io::Result<()>>,
{
    let deadline = async move {
        match limit {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);
    tokio::pin!(interrupt);

    let signal = tokio::select! {
        result = &mut interrupt => result,
        () = &mut deadline => return StopReason::TimeLimit,
    };
    match signal {
        Ok(()) => StopReason::Interrupted,
        Err(e) => {
            warn!(error = %e, "cannot listen for Ctrl-C");
            if limit.is_some() {
                deadline.await;
                StopReason::TimeLimit
            } else {
                StopReason::SignalUnavailable
            }
        }
    }
}

fn status_line(status: &TrackerStatus) -> String {
    match (status.cycles_completed, status.cycles_before_long) {
        (Some(done), Some(every)) => format!(
            "{:<10} {}  cycles {done} (long break every {every})",
            status.label(),
            status.display()
        ),
        _ => format!("{:<10} {}", status.label(), status.display()),
    }
}

fn print_events(events: Vec<Event>) {
    for event in events {
        if let Event::PhaseChanged {
            to, duration_secs, ..
        } = event
        {
            println!("-> {} ({})", to.label(), format_hms(duration_secs));
        }
    }
}

pub fn run(args: TrackArgs, config: &Config) -> CliResult {
    let mut tracker = open_tracker(config)?;
    let id = resolve_task(tracker.tasks(), &args.id)?.id().to_string();
    let title = tracker.task(&id).map(|t| t.title.clone()).unwrap_or_default();

    let status = tracker.start(&id, now_local())?;
    tracker.drain_events();
    println!("Tracking \"{title}\" (Ctrl-C to stop)");
    println!("{}", status_line(&status));

    let shared = SharedTracker::new(tracker);
    let (cancel_tx, cancel_rx) = watch::channel(false);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let limit = args.limit.map(Duration::from_secs);
        tokio::spawn(async move {
            let reason = wait_for_stop(limit, tokio::signal::ctrl_c()).await;
            if reason == StopReason::SignalUnavailable {
                eprintln!("warning: cannot listen for Ctrl-C; stopping now");
            }
            debug!(?reason, "stopping tracker");
            // Fails only when the ticker has already exited.
            let _ = cancel_tx.send(true);
        });

        let events = shared.clone();
        run_ticker(shared.clone(), cancel_rx, now_local, |status| {
            print_events(events.lock().drain_events());
            println!("{}", status_line(status));
        })
        .await;
    });

    let now = now_local();
    let tracker = shared.lock();
    if tracker.is_dirty() {
        eprintln!("warning: tracked time could not be saved");
    }
    if let Some(task) = tracker.task(&id) {
        let totals = aggregate(task, now);
        println!(
            "Stopped. Today {}  total {}",
            format_hms(totals.today),
            format_hms(totals.total)
        );
    }
    Ok(())
}
