use crate::config::toml_config::SelectorConfig;
use crate::domain::model::{Availability, LoadOutcome, RawPage};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = Result<bool>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn source_url(&self) -> &str;
    fn request_timeout(&self) -> Duration;
    fn user_agent(&self) -> &str;
    fn headers(&self) -> &HashMap<String, String>;
    fn selectors(&self) -> &SelectorConfig;
    /// 相對於 storage 根目錄的快照檔路徑
    fn history_file(&self) -> &str;
    fn timezone(&self) -> &str;
    fn ignore_repeat(&self) -> bool;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<RawPage>;
    async fn transform(&self, page: RawPage) -> Result<Availability>;
    async fn load(&self, availability: Availability) -> Result<LoadOutcome>;
}
