//! Periodic purge of expired trash entries

use std::time::Duration;

use tb_core::trash::TrashService;
use tokio::task::JoinHandle;
use tracing::{error, info};

pub fn start_purge_job(trash: TrashService, period: Duration) -> JoinHandle<()> {
    info!("Trash purge job running every {:?}", period);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            run_purge_once(&trash).await;
        }
    })
}

async fn run_purge_once(trash: &TrashService) {
    match trash.purge_expired(None, None).await {
        Ok(result) if !result.skipped_entry_ids.is_empty() => {
            tracing::warn!(
                skipped = ?result.skipped_entry_ids,
                "Purge skipped inconsistent trash entries"
            );
        }
        Ok(_) => {}
        Err(err) => error!("Scheduled trash purge failed: {}", err),
    }
}
