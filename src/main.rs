use clap::Parser;
use passwatch::config::{CliConfig, Command, TomlConfig};
use passwatch::core::export::{export_history, ExportFormat};
use passwatch::core::history::DailyHistory;
use passwatch::utils::clock::{format_capture_time, prev_day, today, SystemClock};
use passwatch::utils::{logger, validation::Validate};
use passwatch::{LocalStorage, ScrapeEngine, ScrapeError, ScrapePipeline};
use chrono::NaiveDate;
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    };

    // 初始化日誌
    let _log_guard = match logger::init_cli_logger(
        cli.verbose,
        config.logging.format,
        config.logging.dir.as_deref().map(Path::new),
    ) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("❌ Failed to initialize logging: {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    };

    tracing::info!("Starting passwatch");
    tracing::debug!("Resolved config: {:?}", config);

    let result = match cli.selected_command() {
        Command::Run { .. } => run(&config, cli.monitor).await,
        Command::Check => check(&config, cli.monitor).await,
        Command::Show { day, json } => show(&config, day.as_deref(), json).await,
        Command::Export { format, out } => export(&config, format, out.as_deref()).await,
    };

    if let Err(e) = result {
        tracing::error!(
            "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = e.exit_code();
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    tracing::info!("Exiting");
    Ok(())
}

async fn run(config: &TomlConfig, monitor: bool) -> Result<(), ScrapeError> {
    config.validate()?;
    if monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(&config.output.dir);
    let pipeline = ScrapePipeline::new(storage, config.clone())?;
    let engine = ScrapeEngine::new_with_monitoring(pipeline, monitor);

    let report = engine.run().await?;
    if report.outcome.is_appended() {
        println!("✅ Recorded {} passes from {}", report.passes, report.source_url);
    } else {
        println!("✅ No change in availability; snapshot untouched");
    }
    Ok(())
}

async fn check(config: &TomlConfig, monitor: bool) -> Result<(), ScrapeError> {
    config.validate()?;

    let storage = LocalStorage::new(&config.output.dir);
    let pipeline = ScrapePipeline::new(storage, config.clone())?;
    let engine = ScrapeEngine::new_with_monitoring(pipeline, monitor);

    let availability = engine.preview().await?;
    println!("{}", serde_json::to_string_pretty(&availability)?);
    Ok(())
}

async fn load_history(config: &TomlConfig) -> Result<DailyHistory, ScrapeError> {
    let storage = LocalStorage::new(&config.output.dir);
    DailyHistory::load(&storage, &config.output.file).await
}

fn resolve_day(config: &TomlConfig, day: &str) -> Result<NaiveDate, ScrapeError> {
    let clock = SystemClock::new(&config.schedule.timezone)?;
    let invalid = || ScrapeError::InvalidConfigValue {
        field: "--day".to_string(),
        value: day.to_string(),
        reason: "expected YYYY-MM-DD, today or yesterday".to_string(),
    };

    match day {
        "today" => Ok(today(&clock)),
        "yesterday" => {
            use chrono::Datelike;
            let now = today(&clock);
            let (y, m, d) = prev_day(now.year(), now.month(), now.day()).ok_or_else(invalid)?;
            NaiveDate::from_ymd_opt(y, m, d).ok_or_else(invalid)
        }
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d").map_err(|_| invalid()),
    }
}

async fn show(config: &TomlConfig, day: Option<&str>, json: bool) -> Result<(), ScrapeError> {
    let history = load_history(config).await?;
    let days: Vec<NaiveDate> = match day {
        Some(day) => vec![resolve_day(config, day)?],
        None => history.days().collect(),
    };

    if json {
        let selected: std::collections::BTreeMap<_, _> =
            days.iter().map(|d| (*d, history.get(*d))).collect();
        println!("{}", serde_json::to_string_pretty(&selected)?);
        return Ok(());
    }

    if history.is_empty() {
        println!("No observations recorded yet");
        return Ok(());
    }

    for day in days {
        let observations = history.get(day);
        println!("📅 {} ({} observations)", day, observations.len());
        for observation in observations {
            let availability = observation.availability();
            println!(
                "  {}  {} passes, {} remaining, {} sold out",
                format_capture_time(observation.captured_at()),
                availability.passes.len(),
                availability.total_remaining(),
                availability.sold_out_count()
            );
        }
    }
    Ok(())
}

async fn export(
    config: &TomlConfig,
    format: ExportFormat,
    out: Option<&str>,
) -> Result<(), ScrapeError> {
    let history = load_history(config).await?;
    let content = export_history(&history, format)?;

    match out {
        Some(path) => {
            if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(path, &content).await?;
            tracing::info!("📁 Export saved to: {}", path);
        }
        None => print!("{}", content),
    }
    Ok(())
}
