use crate::config::toml_config::TomlConfig;
use crate::core::export::ExportFormat;
use crate::utils::error::Result;
use crate::utils::logger::LogFormat;
use clap::{Parser, Subcommand};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "passwatch.toml";

#[derive(Debug, Clone, Parser)]
#[command(name = "passwatch")]
#[command(about = "Scrape a venue's pass availability page and keep a JSON history of it")]
#[command(version)]
pub struct CliConfig {
    /// Path to TOML configuration file (defaults to ./passwatch.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override source.url
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Override output.dir
    #[arg(long, global = true)]
    pub output_dir: Option<String>,

    /// Override schedule.timezone
    #[arg(long, global = true)]
    pub timezone: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log process CPU and memory after each phase
    #[arg(long, global = true)]
    pub monitor: bool,

    /// Also write a daily-rotated scrape.log into this directory
    #[arg(long, global = true)]
    pub log_dir: Option<String>,

    #[arg(long, value_enum, global = true)]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Fetch, parse and append a new observation if availability changed
    Run {
        /// Record the observation even if it repeats the last one of the day
        #[arg(long)]
        allow_repeat: bool,
    },
    /// Fetch and parse only; print the parsed availability without writing
    Check,
    /// Print stored observations
    Show {
        /// YYYY-MM-DD, `today` or `yesterday`; defaults to every day
        #[arg(long)]
        day: Option<String>,

        /// Print raw JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Flatten the history into CSV or TSV
    Export {
        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,

        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<String>,
    },
}

impl CliConfig {
    pub fn selected_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run {
            allow_repeat: false,
        })
    }

    /// 載入設定檔後套用命令列覆蓋
    pub fn resolve(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                TomlConfig::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => TomlConfig::default(),
        };

        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut TomlConfig) {
        if let Some(url) = &self.url {
            config.source.url = url.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if let Some(timezone) = &self.timezone {
            config.schedule.timezone = timezone.clone();
        }
        if let Some(dir) = &self.log_dir {
            config.logging.dir = Some(dir.clone());
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        if let Some(Command::Run { allow_repeat: true }) = &self.command {
            config.schedule.ignore_repeat = false;
        }
    }
}
