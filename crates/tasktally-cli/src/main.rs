use clap::{Parser, Subcommand};
use tasktally_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;
mod common;

#[derive(Parser)]
#[command(name = "tasktally", version, about = "Task time tracking with Pomodoro cycles")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Track a task in the foreground until Ctrl-C
    Track(commands::track::TrackArgs),
    /// Time spent today, this week, this month and overall
    Stats(commands::stats::StatsArgs),
    /// Spent vs allocated time per day, week or month
    Report(commands::report::ReportArgs),
    /// Suggestions for one task or all of them
    Advice(commands::advice::AdviceArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_env("TASKTALLY_LOG")
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("warning: {e}; using default configuration");
            Config::default()
        }
    };
    init_tracing(&config);

    let result = match cli.command {
        Commands::Task { action } => commands::task::run(action, &config),
        Commands::Track(args) => commands::track::run(args, &config),
        Commands::Stats(args) => commands::stats::run(args, &config),
        Commands::Report(args) => commands::report::run(args, &config),
        Commands::Advice(args) => commands::advice::run(args, &config),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
