mod ui;

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use incubate_backend::config::IncubateConfig;
use incubate_backend::lock::UnlockOutcome;
use incubate_backend::profile;
use incubate_backend::runtime::IncubateRuntime;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use ui::pacing::Pacer;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,incubate=debug,incubate_backend=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Incubate starting...");

    let config = IncubateConfig::load();
    let runtime = match IncubateRuntime::bootstrap(config) {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Cannot open journal: {:#}", e);
            std::process::exit(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to start tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = rt.block_on(run(runtime)) {
        tracing::error!("Incubate error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(runtime: IncubateRuntime) -> Result<()> {
    let mut stdout = std::io::stdout();
    let mut rng = runtime.rng();
    let mut input = BufReader::new(tokio::io::stdin());

    if !unlock(&runtime, &mut input, &mut stdout).await? {
        return Ok(());
    }

    let today = Local::now().date_naive();
    let profile = profile::load_profile(&runtime.store, runtime.config.fetch_limit, today)
        .await
        .context("Failed to load profile")?;
    writeln!(
        stdout,
        "Hi {}! Journaling streak: {} day(s).\n",
        profile.first_name, profile.streak_count
    )?;

    let pacer = Pacer::new(runtime.config.pacing_range_ms());
    ui::reflection::run_reflection(&runtime, input, &mut stdout, pacer, &mut rng).await?;
    Ok(())
}

/// Prompt for the PIN when one is set. Returns false if input ends first.
async fn unlock<I, W>(runtime: &IncubateRuntime, input: &mut I, out: &mut W) -> Result<bool>
where
    I: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lock = runtime.app_lock();
    if !lock.has_pin().await? {
        return Ok(true);
    }

    let mut lines = input.lines();
    loop {
        write!(out, "PIN: ")?;
        out.flush()?;
        let Some(pin) = lines.next_line().await? else {
            return Ok(false);
        };

        match lock.verify_pin(pin.trim(), Utc::now()).await? {
            UnlockOutcome::Unlocked => return Ok(true),
            UnlockOutcome::Rejected { attempts_left } => {
                writeln!(out, "Incorrect PIN ({} attempt(s) left)", attempts_left)?;
            }
            UnlockOutcome::LockedOut { remaining_secs } => {
                writeln!(out, "Too many attempts. Try again in {}s.", remaining_secs)?;
            }
        }
    }
}
