/// Replays recorded live-data snapshots through the alert engine.
///
/// Usage: aquamon_alerts <snapshots.jsonl> [commands.json]
///
/// Each line of the snapshot file is one live-data document. Alerts are
/// printed to stdout as JSON lines; logs go to stderr. With `DATABASE_URL`
/// set, transition state persists in Postgres between runs.

use aquamon_alerts::alert::{AlertEngine, AutomationModes};
use aquamon_alerts::config::{self, AppConfig};
use aquamon_alerts::ingest::{automation_modes, parse_commands, parse_snapshot};
use aquamon_alerts::logging::{self, init_logger, Component};
use aquamon_alerts::store::{InMemoryTransitionStore, PostgresTransitionStore, TransitionStore};
use chrono::Utc;
use std::env;
use std::error::Error;
use std::fs;

fn main() -> Result<(), Box<dyn Error>> {
    let config = config::load_from_env()?;
    init_logger(config.log_level(), config.log_file.as_deref(), config.console_timestamps);
    logging::debug(
        Component::Config,
        None,
        &format!(
            "cooldown {}s, {} automation override(s)",
            config.cooldown_secs,
            config.automation.len()
        ),
    );

    let args: Vec<String> = env::args().collect();
    let Some(snapshot_path) = args.get(1) else {
        eprintln!("Usage: aquamon_alerts <snapshots.jsonl> [commands.json]");
        std::process::exit(2);
    };

    let modes = load_automation(&config, args.get(2).map(String::as_str))?;
    let engine = config.engine();
    let lines = fs::read_to_string(snapshot_path)?;

    match config.database_url.as_deref() {
        Some(url) => {
            logging::info(Component::System, None, "Using Postgres transition store");
            let mut store = PostgresTransitionStore::connect(url)?;
            replay(&engine, &mut store, &lines, &modes)
        }
        None => {
            logging::info(Component::System, None, "DATABASE_URL not set, using in-memory store");
            let mut store = InMemoryTransitionStore::new();
            replay(&engine, &mut store, &lines, &modes)
        }
    }
}

/// Commands-document modes, with config overrides applied on top.
fn load_automation(config: &AppConfig, commands_path: Option<&str>) -> Result<AutomationModes, Box<dyn Error>> {
    let mut modes = match commands_path {
        Some(path) => automation_modes(&parse_commands(&fs::read_to_string(path)?)?),
        None => AutomationModes::new(),
    };
    modes.merge(&config.automation_modes());
    Ok(modes)
}

fn replay<S: TransitionStore>(
    engine: &AlertEngine,
    store: &mut S,
    lines: &str,
    modes: &AutomationModes,
) -> Result<(), Box<dyn Error>> {
    let mut total_alerts = 0;

    for (n, line) in lines.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let snapshot = match parse_snapshot(line) {
            Ok(s) => s,
            Err(e) => {
                logging::warn(Component::Ingest, None, &format!("Line {} skipped: {}", n + 1, e));
                continue;
            }
        };

        let outcome = engine.evaluate(store, &snapshot.readings(Utc::now()), modes);
        for alert in &outcome.alerts {
            println!("{}", serde_json::to_string(alert)?);
        }
        total_alerts += outcome.alerts.len();
    }

    logging::info(Component::System, None, &format!("Replay finished, {} alert(s)", total_alerts));
    Ok(())
}
