use anyhow::{Context, Result};
use chrono::Utc;
use incubate_backend::config::IncubateConfig;
use incubate_backend::demo;
use incubate_backend::entry::EntryType;
use incubate_backend::runtime::IncubateRuntime;
use tracing_subscriber::EnvFilter;

const SMOKE_FLAG_KEY: &str = "did_run_db_smoke_test";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,incubate_backend=debug")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let force = args.iter().any(|a| a == "--force");
    let seed = args.iter().any(|a| a == "--seed");

    let config = IncubateConfig::load();
    let runtime =
        IncubateRuntime::bootstrap(config).context("failed to bootstrap journal runtime")?;

    let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    rt.block_on(async {
        let store = &runtime.store;

        if seed {
            let written = demo::seed(store, &runtime.config.user_id, Utc::now()).await?;
            println!("Seeded {} demo entries", written);
        }

        if !force && store.get_state(SMOKE_FLAG_KEY).await?.is_some() {
            tracing::info!("Smoke test already ran against this journal (pass --force to rerun)");
        } else {
            let inserted = store
                .save_new_raw(Some("Smoke test"), "Checking that the journal opens and writes.")
                .await?;
            println!("Inserted {} ({})", inserted.id, inserted.entry_type.as_db_str());
            store.set_state(SMOKE_FLAG_KEY, "true").await?;
        }

        let recent = store.fetch_all_active(10).await?;
        println!("Fetched {} recent entries", recent.len());
        for entry_type in EntryType::ALL {
            let count = store
                .fetch_by_type(entry_type, runtime.config.fetch_limit)
                .await?
                .len();
            println!("  {:<10} {}", entry_type.title(), count);
        }

        let report = runtime.insights.generate(Utc::now()).await?;
        println!(
            "Insights: {} (weekly momentum {:+.3}{})",
            report.insights.len(),
            report.weekly_momentum,
            if report.used_demo_data { ", demo data" } else { "" }
        );
        for insight in &report.insights {
            println!(
                "  [{}] {} ({:.0}%)",
                insight.category.as_str(),
                insight.title,
                insight.confidence * 100.0
            );
        }

        Ok(())
    })
}
