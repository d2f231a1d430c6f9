use tokio_cron_scheduler::{Job, JobScheduler};

use crate::bot::wizard::WizardStore;
use crate::utils::logging::log_system_event;

/// Every five minutes, on the minute.
pub const SWEEP_SCHEDULE: &str = "0 */5 * * * *";

pub struct WizardSweeper {
    wizards: WizardStore,
    scheduler: JobScheduler,
}

impl WizardSweeper {
    pub async fn new(wizards: WizardStore) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let scheduler = JobScheduler::new().await?;

        Ok(Self { wizards, scheduler })
    }

    pub async fn start(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let wizards = self.wizards.clone();

        let sweep_job = Job::new_async(SWEEP_SCHEDULE, move |_uuid, _l| {
            let wizards = wizards.clone();
            Box::pin(async move {
                sweep(&wizards).await;
            })
        })?;

        self.scheduler.add(sweep_job).await?;
        self.scheduler.start().await?;

        tracing::info!("Wizard sweeper started - schedule '{}'", SWEEP_SCHEDULE);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.scheduler.shutdown().await?;
        Ok(())
    }

    /// Runs one sweep immediately.
    pub async fn sweep_now(&self) -> usize {
        sweep(&self.wizards).await
    }
}

async fn sweep(wizards: &WizardStore) -> usize {
    let removed = wizards.sweep_expired().await;
    if removed > 0 {
        log_system_event("Expired wizards swept", Some(&format!("{removed} removed")));
    }
    removed
}
