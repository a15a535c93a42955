use crate::adapters::http::DEFAULT_USER_AGENT;
use crate::domain::ports::ConfigProvider;
use crate::utils::clock::{parse_timezone, DEFAULT_TIMEZONE};
use crate::utils::error::{Result, ScrapeError};
use crate::utils::logger::LogFormat;
use crate::utils::validation::{
    compile_regex, compile_selector, validate_path, validate_range, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub source: SourceConfig,
    pub selectors: SelectorConfig,
    pub output: OutputConfig,
    pub schedule: ScheduleConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub url: String,
    pub timeout_seconds: u64,
    pub user_agent: String,
    pub headers: HashMap<String, String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_seconds: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: HashMap::new(),
        }
    }
}

/// 票券列表的 CSS selectors。`row` 以外的 selector 都在每一列之內查找，`venue` 除外。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub venue: Option<String>,
    pub row: String,
    pub name: String,
    pub date: Option<String>,
    pub remaining: Option<String>,
    pub price: Option<String>,
    pub sold_out_pattern: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            venue: Some("h1.venue-name".to_string()),
            row: "tr.pass-row".to_string(),
            name: ".pass-name".to_string(),
            date: Some(".pass-date".to_string()),
            remaining: Some(".pass-remaining".to_string()),
            price: Some(".pass-price".to_string()),
            sold_out_pattern: r"(?i)sold\s*out|unavailable".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: String,
    pub file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "data".to_string(),
            file: "pass_availability.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub timezone: String,
    pub ignore_repeat: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
            ignore_repeat: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: Option<String>,
    pub format: LogFormat,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content)
            .map_err(|e| ScrapeError::config(format!("TOML parsing error: {}", e)))
    }

    /// 替換環境變數 (例如 ${TICKETS_URL})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ScrapeError::config(format!("env substitution: {}", e)))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_url("source.url", &self.source.url)?;
        validate_range("source.timeout_seconds", self.source.timeout_seconds, 1, 300)?;
        validate_path("output.dir", &self.output.dir)?;
        validate_path("output.file", &self.output.file)?;
        parse_timezone(&self.schedule.timezone)?;

        let selectors = &self.selectors;
        if let Some(venue) = &selectors.venue {
            compile_selector("selectors.venue", venue)?;
        }
        compile_selector("selectors.row", &selectors.row)?;
        compile_selector("selectors.name", &selectors.name)?;
        if let Some(date) = &selectors.date {
            compile_selector("selectors.date", date)?;
        }
        if let Some(remaining) = &selectors.remaining {
            compile_selector("selectors.remaining", remaining)?;
        }
        if let Some(price) = &selectors.price {
            compile_selector("selectors.price", price)?;
        }
        compile_regex("selectors.sold_out_pattern", &selectors.sold_out_pattern)?;

        if let Some(dir) = &self.logging.dir {
            validate_path("logging.dir", dir)?;
        }

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn source_url(&self) -> &str {
        &self.source.url
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.source.timeout_seconds)
    }

    fn user_agent(&self) -> &str {
        &self.source.user_agent
    }

    fn headers(&self) -> &HashMap<String, String> {
        &self.source.headers
    }

    fn selectors(&self) -> &SelectorConfig {
        &self.selectors
    }

    fn history_file(&self) -> &str {
        &self.output.file
    }

    fn timezone(&self) -> &str {
        &self.schedule.timezone
    }

    fn ignore_repeat(&self) -> bool {
        self.schedule.ignore_repeat
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
