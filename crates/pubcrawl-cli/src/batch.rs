//! Ledger-guarded batch publishing from a JSON queue file.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use pubcrawl_bilibili::BilibiliClient;
use pubcrawl_browser::{XiaohongshuPublisher, ZhihuPublisher};
use pubcrawl_core::{
    load_queue, AppConfig, BatchReport, BatchRunner, DedupLedger, OfflinePublisher, Publisher,
    QueueItem,
};
use pubcrawl_twitter::TwitterClient;

use crate::BatchPlatform;

pub(crate) struct BatchOptions {
    pub queue: PathBuf,
    pub platform: BatchPlatform,
    pub variables: HashMap<String, String>,
    pub cooldown_secs: u64,
    pub keep_open_secs: u64,
}

/// Publish every queued item not yet in the ledger to one platform.
///
/// Browser runs stop at the first item that needs manual help and keep the
/// session open for `keep_open_secs` so it can be finished by hand; the
/// remaining items are picked up by the next run.
///
/// # Errors
///
/// Returns an error if the queue or ledger cannot be read, the publisher
/// cannot be built, a confirmed publish cannot be recorded, or the run was
/// aborted by a session-level failure. Per-item failures only show up in the
/// printed report.
pub(crate) async fn run_batch(config: &AppConfig, options: BatchOptions) -> anyhow::Result<()> {
    let items = load_queue(&options.queue)?;
    let ledger = DedupLedger::open(&config.ledger_path)?;
    tracing::info!(
        queue = %options.queue.display(),
        items = items.len(),
        already_published = ledger.len(),
        "starting batch"
    );
    // Browser runs share one session across items.
    let browser = matches!(options.platform, BatchPlatform::Xhs | BatchPlatform::Zhihu);
    let mut runner = BatchRunner::new(ledger, Duration::from_secs(options.cooldown_secs))
        .with_variables(options.variables)
        .with_stop_on_manual(browser);
    let grace = Duration::from_secs(options.keep_open_secs);

    let report = match options.platform {
        BatchPlatform::Twitter => {
            let mut publisher = TwitterClient::from_config(config)?;
            runner.run(&mut publisher, &items).await?
        }
        BatchPlatform::Bilibili => {
            let mut publisher = BilibiliClient::from_config(config)?;
            runner.run(&mut publisher, &items).await?
        }
        BatchPlatform::Offline => {
            let mut publisher = OfflinePublisher::new();
            runner.run(&mut publisher, &items).await?
        }
        BatchPlatform::Xhs => {
            let mut publisher = XiaohongshuPublisher::connect(config).await?;
            let report = run_in_browser(&mut runner, &mut publisher, &items).await;
            if report.as_ref().is_ok_and(|r| !r.manual.is_empty()) {
                publisher.close_after(grace).await?;
            } else {
                publisher.close().await?;
            }
            report?
        }
        BatchPlatform::Zhihu => {
            let mut publisher = ZhihuPublisher::connect(config).await?;
            let report = run_in_browser(&mut runner, &mut publisher, &items).await;
            if report.as_ref().is_ok_and(|r| !r.manual.is_empty()) {
                publisher.close_after(grace).await?;
            } else {
                publisher.close().await?;
            }
            report?
        }
    };

    print_report(&report);
    if report.held_for_manual {
        println!("stopped for manual completion; rerun the queue afterwards to continue");
    }
    if let Some(reason) = report.aborted {
        anyhow::bail!("batch aborted: {reason}");
    }
    Ok(())
}

async fn run_in_browser<P: Publisher>(
    runner: &mut BatchRunner,
    publisher: &mut P,
    items: &[QueueItem],
) -> anyhow::Result<BatchReport> {
    Ok(runner.run(publisher, items).await?)
}

fn print_report(report: &BatchReport) {
    println!(
        "published {}, skipped {}, manual {}, failed {}",
        report.published.len(),
        report.skipped.len(),
        report.manual.len(),
        report.failed.len()
    );
    for (id, remote_id) in &report.published {
        println!("  published {id} -> {remote_id}");
    }
    for (id, step) in &report.manual {
        println!("  manual    {id} (stopped at {step})");
    }
    for (id, error) in &report.failed {
        println!("  failed    {id}: {error}");
    }
}
