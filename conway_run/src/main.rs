// main.rs - Headless driver for the life engine
//
//   CONWAY_PATTERN=glider CONWAY_TOPOLOGY=bounded CONWAY_RUN_MS=2000 cargo run -p conway_run

use std::time::Duration;

use anyhow::{Context, anyhow};
use tokio::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use conway_life::config::env_parse;
use conway_life::{Grid, GridChange, LifeConfig, LifeEngine, LifeObservable, patterns};

const DEFAULT_RUN: Duration = Duration::from_secs(3);
const REPORT_EVERY: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = std::env::var("CONWAY_LOG")
        .ok()
        .and_then(|level| EnvFilter::try_new(level).ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = LifeConfig::from_env().context("reading CONWAY_* settings")?;
    let run_for = env_parse::<u64>("CONWAY_RUN_MS")?
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_RUN);
    let pattern = std::env::var("CONWAY_PATTERN").unwrap_or_else(|_| "random".to_string());

    info!(
        width = config.field_width,
        height = config.field_height,
        topology = %config.topology,
        delay_ms = config.step_delay.as_millis() as u64,
        %pattern,
        "starting life"
    );

    let engine = LifeEngine::with_config(None, config.clone())?;
    engine.new_field().await;
    seed(&engine, &pattern).await?;

    let mut updates = engine.subscribe();
    let mut last = updates.borrow_and_update().clone();
    let deadline = Instant::now() + run_for;
    let mut next_report = Instant::now() + REPORT_EVERY;

    engine.start();
    while Instant::now() < deadline {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() { break; }
                let snapshot = updates.borrow_and_update().clone();
                if snapshot.change_since(&last) == GridChange::Replaced {
                    warn!("grid replaced while running");
                }
                last = snapshot;
            }
            _ = tokio::time::sleep_until(next_report) => {
                report(&last);
                next_report += REPORT_EVERY;
            }
            _ = tokio::time::sleep_until(deadline) => break,
        }
    }
    engine.stop();

    let final_state = engine.snapshot();
    report(&final_state);
    info!(generation = final_state.generation, "finished");
    Ok(())
}

async fn seed(engine: &LifeEngine, name: &str) -> anyhow::Result<()> {
    if name.eq_ignore_ascii_case("random") {
        engine.random().await;
        return Ok(());
    }

    let pattern = patterns::find(name).ok_or_else(|| {
        let known: Vec<_> = patterns::PATTERNS.iter().map(|p| p.name).collect();
        anyhow!("unknown pattern {name:?}, expected random or one of {known:?}")
    })?;

    let current = engine.current().context("no field installed")?;
    let mut grid = Grid::with_id(current.width(), current.height(), current.id());
    let placed = pattern.centre(&mut grid);
    if placed < pattern.cells.len() {
        warn!(placed, total = pattern.cells.len(), "pattern clipped by field edge");
    }
    engine.set_current(Some(grid)).await;
    Ok(())
}

fn report(snapshot: &conway_life::LifeSnapshot) {
    let population = snapshot.current.as_ref().map_or(0, |grid| grid.population());
    info!(generation = snapshot.generation, population, "progress");
}
