use crate::core::{Availability, LoadOutcome, Pipeline};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub source_url: String,
    pub passes: usize,
    pub outcome: LoadOutcome,
}

/// 依序執行 fetch → parse → diff/append，任何一步失敗都不寫檔
pub struct ScrapeEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> ScrapeEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<RunReport> {
        tracing::info!("Starting scrape");

        let (source_url, availability) = self.fetch_and_parse().await?;
        let passes = availability.passes.len();

        tracing::info!("Updating snapshot...");
        let outcome = self.pipeline.load(availability).await?;
        self.monitor.log_stats("Load");

        match &outcome {
            LoadOutcome::Appended {
                path,
                observations_today,
                ..
            } => tracing::info!(
                "Saved new observation to {} ({} today)",
                path,
                observations_today
            ),
            LoadOutcome::Unchanged { day } => {
                tracing::info!("No change for {}, snapshot left untouched", day)
            }
        }

        self.monitor.log_final_stats();
        tracing::info!("Scrape complete");

        Ok(RunReport {
            source_url,
            passes,
            outcome,
        })
    }

    /// 只抓取與解析，不寫入快照
    pub async fn preview(&self) -> Result<Availability> {
        let (_, availability) = self.fetch_and_parse().await?;
        self.monitor.log_final_stats();
        Ok(availability)
    }

    async fn fetch_and_parse(&self) -> Result<(String, Availability)> {
        tracing::info!("Fetching availability page...");
        let page = self.pipeline.extract().await?;
        let source_url = page.url.clone();
        self.monitor.log_stats("Fetch");

        tracing::info!("Parsing availability...");
        let availability = self.pipeline.transform(page).await?;
        self.monitor.log_stats("Parse");

        Ok((source_url, availability))
    }
}
