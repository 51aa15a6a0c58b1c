use sortdir::cli::{AppConfig, Args};
use sortdir::config::UserConfig;
use sortdir::domain::{Outcome, OutcomeStatus};
use sortdir::logging::init_logging;
use sortdir::organizer::{Organizer, Reporter};

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::warn;

/// Prints each move as it happens
struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn file_moved(&self, from: &Path, to: &Path) {
        println!("  {} -> {}", from.display(), to.display());
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::from(2);
    }

    if let Err(e) = init_logging(args.verbose) {
        eprintln!("Warning: {}", e);
    }

    // Load user configuration
    let user_config = UserConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "falling back to default configuration");
        eprintln!("Warning: Failed to load user config: {}", e);
        UserConfig::default()
    });

    let config = AppConfig::new(&args, &user_config);

    let mut organizer = Organizer::from_config(&user_config).with_workers(config.workers);
    if !config.json && config.verbose > 0 {
        organizer = organizer.with_reporter(Arc::new(ConsoleReporter));
    }

    // Ctrl-C stops moves that have not started yet
    let cancel = organizer.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; cancelling pending moves");
            cancel.cancel();
        }
    });

    // The operation blocks until its pool drains, so keep it off the async workers
    let request = config.request.clone();
    let outcome = match tokio::task::spawn_blocking(move || organizer.run(&request)).await {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Error: organize task failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    print_outcome(&outcome, config.json);

    match outcome.status {
        OutcomeStatus::Success | OutcomeStatus::EmptyResult => ExitCode::SUCCESS,
        OutcomeStatus::Failed => ExitCode::FAILURE,
    }
}

fn print_outcome(outcome: &Outcome, json: bool) {
    if json {
        match serde_json::to_string_pretty(outcome) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("Error: Failed to serialize outcome: {}", e),
        }
        return;
    }

    match outcome.status {
        OutcomeStatus::Failed => eprintln!("{}", outcome.message()),
        _ => println!("{}", outcome.message()),
    }

    if outcome.skipped > 0 {
        println!("   Skipped: {} file(s)", outcome.skipped);
    }
}
