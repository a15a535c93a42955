use crate::utils::error::{ScrapeError, Result};
use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, Offset, Utc};
use chrono_tz::Tz;

pub const DEFAULT_TIMEZONE: &str = "US/Eastern";

/// 觀測時間的來源。正式執行用 [`SystemClock`]，測試用 [`FixedClock`]。
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(timezone: &str) -> Result<Self> {
        Ok(Self {
            tz: parse_timezone(timezone)?,
        })
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        let local = Utc::now().with_timezone(&self.tz);
        local.with_timezone(&local.offset().fix())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl FixedClock {
    pub fn parse(rfc3339: &str) -> Result<Self> {
        DateTime::parse_from_rfc3339(rfc3339)
            .map(Self)
            .map_err(|e| ScrapeError::InvalidConfigValue {
                field: "clock".to_string(),
                value: rfc3339.to_string(),
                reason: e.to_string(),
            })
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| ScrapeError::InvalidConfigValue {
            field: "schedule.timezone".to_string(),
            value: name.to_string(),
            reason: format!("unknown timezone: {}", e),
        })
}

/// 觀測所屬的日期（依設定時區）
pub fn today(clock: &dyn Clock) -> NaiveDate {
    clock.now().date_naive()
}

pub fn prev_day(year: i32, month: u32, day: u32) -> Option<(i32, u32, u32)> {
    NaiveDate::from_ymd_opt(year, month, day)?
        .checked_sub_days(Days::new(1))
        .map(|d| (d.year(), d.month(), d.day()))
}

pub fn next_day(year: i32, month: u32, day: u32) -> Option<(i32, u32, u32)> {
    NaiveDate::from_ymd_opt(year, month, day)?
        .checked_add_days(Days::new(1))
        .map(|d| (d.year(), d.month(), d.day()))
}

/// 給人看的時間格式，例如 `2026-10-16 09:05AM`
pub fn format_capture_time(at: &DateTime<FixedOffset>) -> String {
    at.format("%Y-%m-%d %I:%M%p").to_string()
}
