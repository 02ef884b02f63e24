mod config;
mod data;
mod monitoring;
mod races;
mod timing;

use anyhow::{Context, Result};
use config::{Config, EnvConfig};
use data::racing_api::RacingApiClient;
use data::types::{parse_category_filter, Category};
use races::board::RaceBoard;
use races::reconciler::{RaceListReconciler, ReconcilerSettings};
use std::path::Path;
use std::sync::Arc;
use timing::clock::SharedClock;
use timing::notifier::ExpirationTracker;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

const CONFIG_PATH: &str = "config.toml";
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// A line typed at the board prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Refetch,
    Filter(Option<Category>),
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    match line.trim().to_ascii_lowercase().as_str() {
        "" => None,
        "r" | "retry" | "refresh" => Some(Command::Refetch),
        "q" | "quit" | "exit" => Some(Command::Quit),
        other => parse_category_filter(other).ok().map(Command::Filter),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_config = EnvConfig::load();
    let mut config = Config::load_or_default(CONFIG_PATH)?;
    config.apply_env(&env_config);

    monitoring::logger::init_tracing(&config.monitoring.log_level);

    if !Path::new(CONFIG_PATH).exists() {
        info!("{} not found, using defaults", CONFIG_PATH);
    }
    info!("Racing API: {}", config.api.base_url);
    info!(
        "Expiration threshold: {}s, refetch every {}s, showing {} races",
        config.races.expiration_threshold_secs,
        config.races.refetch_interval_secs,
        config.races.display_limit
    );

    let category = config.category_filter()?;

    let mut clock = SharedClock::new(config.clock.tick_interval());
    clock.start();

    let client = RacingApiClient::new(config.api.base_url.clone(), config.api.request_timeout())
        .context("Failed to create racing API client")?;
    let reconciler = Arc::new(RaceListReconciler::new(
        client,
        clock.reader(),
        ReconcilerSettings::from_config(&config.races, &config.api),
    ));
    let refetch_task = tokio::spawn(Arc::clone(&reconciler).run());

    let mut board = RaceBoard::new(
        config.races.display_limit,
        config.races.expiration_threshold_secs,
        category,
    );
    let mut tracker = ExpirationTracker::new(config.races.expiration_threshold_secs);
    let mut ticks = clock.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            changed = ticks.changed() => {
                if changed.is_err() {
                    warn!("Clock closed, shutting down");
                    break;
                }
                let now = *ticks.borrow_and_update();
                let view = reconciler.snapshot().await;

                if view.is_success() {
                    let visible = board.visible(&view.races);
                    for race in tracker.observe(visible.iter().copied(), now) {
                        reconciler.remove_expired_race(&race);
                    }
                }

                print!("{}{}", CLEAR_SCREEN, board.render(&view, now));
                println!("\n[r] refresh  [all|greyhound|harness|horse] filter  [q] quit");
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) => match parse_command(&line) {
                        Some(Command::Refetch) => reconciler.request_refetch(),
                        Some(Command::Filter(category)) => {
                            board.set_category(category);
                            info!("Category filter: {}", board.category().map(|c| c.name()).unwrap_or("all"));
                        }
                        Some(Command::Quit) => break,
                        None => {}
                    },
                    Ok(None) => stdin_open = false,
                    Err(e) => {
                        warn!("Failed to read stdin: {}", e);
                        stdin_open = false;
                    }
                }
            }
            _ = &mut ctrl_c => break,
        }
    }

    info!("Shutting down...");
    refetch_task.abort();
    clock.stop();

    Ok(())
}
