use crate::domain::model::{Availability, Observation};
use crate::domain::ports::Storage;
use crate::utils::clock::Clock;
use crate::utils::error::{Result, ScrapeError};
use chrono::{DateTime, FixedOffset, NaiveDate};
use std::collections::BTreeMap;

/// 以日期分組、只能附加的觀測紀錄，對應到 repo 中提交的 JSON 快照檔
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyHistory {
    data: BTreeMap<NaiveDate, Vec<Observation>>,
    file_path: Option<String>,
}

impl DailyHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: BTreeMap<NaiveDate, Vec<Observation>>) -> Self {
        Self {
            data,
            file_path: None,
        }
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        // 空檔案視為沒有紀錄
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::new());
        }
        Ok(Self::with_data(serde_json::from_slice(bytes)?))
    }

    pub fn to_json_pretty(&self) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(&self.data)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// 檔案不存在時回傳空紀錄；檔案壞掉時回傳錯誤，不會覆寫
    pub async fn load<S: Storage>(storage: &S, path: &str) -> Result<Self> {
        let mut history = if storage.exists(path).await? {
            let bytes = storage.read_file(path).await?;
            Self::from_json_slice(&bytes)?
        } else {
            tracing::info!("No snapshot at {}, starting a new history", path);
            Self::new()
        };
        history.file_path = Some(path.to_string());
        Ok(history)
    }

    pub async fn save<S: Storage>(&self, storage: &S) -> Result<()> {
        let path = self
            .file_path
            .as_deref()
            .ok_or_else(|| ScrapeError::config("no filename available for the history"))?;
        self.save_as(storage, path).await
    }

    pub async fn save_as<S: Storage>(&self, storage: &S, path: &str) -> Result<()> {
        storage.write_file(path, &self.to_json_pretty()?).await
    }

    pub fn get(&self, day: NaiveDate) -> &[Observation] {
        self.data.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 新增一筆觀測。`ignore_repeat` 時，若與當天最後一筆相同則不新增並回傳 `false`。
    pub fn add(
        &mut self,
        captured_at: DateTime<FixedOffset>,
        value: Availability,
        ignore_repeat: bool,
    ) -> Result<bool> {
        // 時區變更時，較晚的時間點可能落在較早的日期鍵，兩者都必須不早於最後一筆
        if let Some(last) = self.latest() {
            let last_day = last.captured_at().date_naive();
            if captured_at < *last.captured_at() || captured_at.date_naive() < last_day {
                return Err(ScrapeError::OutOfOrder {
                    last: last.captured_at().to_rfc3339(),
                    new: captured_at.to_rfc3339(),
                });
            }
        }

        let observations = self.data.entry(captured_at.date_naive()).or_default();
        if ignore_repeat
            && observations
                .last()
                .is_some_and(|last| last.availability() == &value)
        {
            return Ok(false);
        }

        observations.push(Observation::new(captured_at, value));
        Ok(true)
    }

    pub fn add_now(&mut self, clock: &dyn Clock, value: Availability, ignore_repeat: bool) -> Result<bool> {
        self.add(clock.now(), value, ignore_repeat)
    }

    pub fn latest(&self) -> Option<&Observation> {
        self.data.values().next_back().and_then(|day| day.last())
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.data.keys().copied()
    }

    pub fn observations(&self) -> impl Iterator<Item = &Observation> + '_ {
        self.data.values().flatten()
    }

    pub fn observation_count(&self) -> usize {
        self.data.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.observation_count() == 0
    }

    pub fn file_path(&self) -> Option<&str> {
        self.file_path.as_deref()
    }

    pub fn data(&self) -> &BTreeMap<NaiveDate, Vec<Observation>> {
        &self.data
    }
}
