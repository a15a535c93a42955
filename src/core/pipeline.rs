use crate::adapters::http::HttpFetcher;
use crate::core::history::DailyHistory;
use crate::core::parser::AvailabilityParser;
use crate::core::{Availability, ConfigProvider, LoadOutcome, Pipeline, RawPage, Storage};
use crate::utils::clock::{Clock, SystemClock};
use crate::utils::error::Result;

pub struct ScrapePipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    fetcher: HttpFetcher,
    parser: AvailabilityParser,
    clock: Box<dyn Clock>,
}

impl<S: Storage, C: ConfigProvider> ScrapePipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let clock = SystemClock::new(config.timezone())?;
        Self::with_clock(storage, config, Box::new(clock))
    }

    pub fn with_clock(storage: S, config: C, clock: Box<dyn Clock>) -> Result<Self> {
        let fetcher = HttpFetcher::new(
            config.user_agent(),
            config.request_timeout(),
            config.headers(),
        )?;
        let parser = AvailabilityParser::from_config(config.selectors())?;

        Ok(Self {
            storage,
            config,
            fetcher,
            parser,
            clock,
        })
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ScrapePipeline<S, C> {
    async fn extract(&self) -> Result<RawPage> {
        self.fetcher.fetch(self.config.source_url()).await
    }

    async fn transform(&self, page: RawPage) -> Result<Availability> {
        let availability = self.parser.parse(&page.body)?;
        tracing::info!(
            "Data point: {} passes, {} remaining, {} sold out",
            availability.passes.len(),
            availability.total_remaining(),
            availability.sold_out_count()
        );
        Ok(availability)
    }

    async fn load(&self, availability: Availability) -> Result<LoadOutcome> {
        let path = self.config.history_file();
        let mut history = DailyHistory::load(&self.storage, path).await?;

        let now = self.clock.now();
        let day = now.date_naive();
        let appended = history.add(now, availability, self.config.ignore_repeat())?;

        if !appended {
            tracing::info!("Availability unchanged since the last observation of {}", day);
            return Ok(LoadOutcome::Unchanged { day });
        }

        history.save(&self.storage).await?;
        let observations_today = history.get(day).len();
        tracing::debug!("Saved {} ({} observations today)", path, observations_today);

        Ok(LoadOutcome::Appended {
            day,
            observations_today,
            path: path.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::toml_config::TomlConfig;
    use crate::utils::clock::FixedClock;
    use crate::utils::error::ScrapeError;
    use httpmock::prelude::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    const FIXTURE: &str = include_str!("../../tests/fixtures/availability.html");

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
        writes: Arc<Mutex<usize>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
                writes: Arc::new(Mutex::new(0)),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }

        async fn write_count(&self) -> usize {
            *self.writes.lock().await
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                ScrapeError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            *self.writes.lock().await += 1;
            Ok(())
        }

        async fn exists(&self, path: &str) -> Result<bool> {
            Ok(self.files.lock().await.contains_key(path))
        }
    }

    fn config(url: String) -> TomlConfig {
        let mut config = TomlConfig::default();
        config.source.url = url;
        config.source.timeout_seconds = 5;
        config
    }

    fn pipeline_at(
        storage: MockStorage,
        url: String,
        now: &str,
    ) -> ScrapePipeline<MockStorage, TomlConfig> {
        let clock = FixedClock::parse(now).unwrap();
        ScrapePipeline::with_clock(storage, config(url), Box::new(clock)).unwrap()
    }

    #[tokio::test]
    async fn test_extract_and_transform_fixture() {
        let server = MockServer::start();
        let page_mock = server.mock(|when, then| {
            when.method(GET).path("/availability");
            then.status(200)
                .header("Content-Type", "text/html; charset=utf-8")
                .body(FIXTURE);
        });

        let pipeline = pipeline_at(
            MockStorage::new(),
            server.url("/availability"),
            "2026-10-16T09:00:00-04:00",
        );

        let page = pipeline.extract().await.unwrap();
        let availability = pipeline.transform(page).await.unwrap();

        page_mock.assert();
        assert_eq!(availability.venue.as_deref(), Some("Riverside Hall"));
        assert_eq!(availability.passes.len(), 4);
    }

    #[tokio::test]
    async fn test_extract_server_error() {
        let server = MockServer::start();
        let page_mock = server.mock(|when, then| {
            when.method(GET).path("/availability");
            then.status(500);
        });

        let pipeline = pipeline_at(
            MockStorage::new(),
            server.url("/availability"),
            "2026-10-16T09:00:00-04:00",
        );

        let err = pipeline.extract().await.unwrap_err();

        page_mock.assert();
        assert!(matches!(err, ScrapeError::HttpStatus { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_load_writes_first_observation() {
        let storage = MockStorage::new();
        let pipeline = pipeline_at(
            storage.clone(),
            "http://test.com".to_string(),
            "2026-10-16T09:00:00-04:00",
        );
        let availability = pipeline
            .transform(RawPage {
                url: "http://test.com".to_string(),
                status: 200,
                body: FIXTURE.to_string(),
            })
            .await
            .unwrap();

        let outcome = pipeline.load(availability).await.unwrap();

        match outcome {
            LoadOutcome::Appended {
                day,
                observations_today,
                path,
            } => {
                assert_eq!(day.to_string(), "2026-10-16");
                assert_eq!(observations_today, 1);
                assert_eq!(path, "pass_availability.json");
            }
            other => panic!("expected append, got {:?}", other),
        }

        let saved = storage.get_file("pass_availability.json").await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&saved).unwrap();
        assert_eq!(value["2026-10-16"][0][0], "2026-10-16T09:00:00-04:00");
        assert_eq!(storage.write_count().await, 1);
    }

    #[tokio::test]
    async fn test_load_unchanged_does_not_write() {
        let storage = MockStorage::new();
        let page = RawPage {
            url: "http://test.com".to_string(),
            status: 200,
            body: FIXTURE.to_string(),
        };

        let first = pipeline_at(
            storage.clone(),
            "http://test.com".to_string(),
            "2026-10-16T09:00:00-04:00",
        );
        let availability = first.transform(page.clone()).await.unwrap();
        assert!(first.load(availability).await.unwrap().is_appended());
        let before = storage.get_file("pass_availability.json").await.unwrap();

        let second = pipeline_at(
            storage.clone(),
            "http://test.com".to_string(),
            "2026-10-16T10:00:00-04:00",
        );
        let availability = second.transform(page).await.unwrap();
        let outcome = second.load(availability).await.unwrap();

        assert!(matches!(outcome, LoadOutcome::Unchanged { .. }));
        assert_eq!(storage.write_count().await, 1);
        assert_eq!(storage.get_file("pass_availability.json").await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_load_refuses_corrupt_history() {
        let storage = MockStorage::new();
        storage
            .write_file("pass_availability.json", b"[1, 2")
            .await
            .unwrap();

        let pipeline = pipeline_at(
            storage.clone(),
            "http://test.com".to_string(),
            "2026-10-16T09:00:00-04:00",
        );
        let availability = pipeline
            .transform(RawPage {
                url: "http://test.com".to_string(),
                status: 200,
                body: FIXTURE.to_string(),
            })
            .await
            .unwrap();

        assert!(pipeline.load(availability).await.is_err());
        assert_eq!(
            storage.get_file("pass_availability.json").await.unwrap(),
            b"[1, 2"
        );
    }
}
