//! `dsync plan`: dry run of a sync cycle.

use anyhow::Result;
use dsync_core::config::SyncConfig;
use dsync_core::http::CurlClient;
use dsync_core::SyncEngine;

pub fn run_plan(cfg: &SyncConfig) -> Result<()> {
    let options = cfg.to_options()?;
    let engine = SyncEngine::new(CurlClient::new(), options);
    let plan = engine.plan()?;

    if plan.catalog.is_empty() {
        println!("Catalog is empty (or could not be fetched).");
        return Ok(());
    }
    println!(
        "{} file(s) in catalog, {} present locally, {} to download.",
        plan.catalog.len(),
        plan.inventory.len(),
        plan.work.len()
    );
    for item in &plan.work {
        println!("  {}  {}", item.file_name, item.download_url);
    }
    Ok(())
}
