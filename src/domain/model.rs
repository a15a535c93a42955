use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// 頁面上的一列票券
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassAvailability {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
    #[serde(default)]
    pub sold_out: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_cents: Option<u64>,
}

/// 一次抓取解析出的結果，依頁面順序
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    pub passes: Vec<PassAvailability>,
}

impl Availability {
    pub fn total_remaining(&self) -> u64 {
        self.passes
            .iter()
            .filter_map(|p| p.remaining)
            .map(u64::from)
            .sum()
    }

    pub fn sold_out_count(&self) -> usize {
        self.passes.iter().filter(|p| p.sold_out).count()
    }
}

/// `[captured_at, availability]`，序列化為兩個元素的 JSON 陣列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation(pub DateTime<FixedOffset>, pub Availability);

impl Observation {
    pub fn new(captured_at: DateTime<FixedOffset>, availability: Availability) -> Self {
        Self(captured_at, availability)
    }

    pub fn captured_at(&self) -> &DateTime<FixedOffset> {
        &self.0
    }

    pub fn availability(&self) -> &Availability {
        &self.1
    }

    /// 觀測所屬日期，以擷取時的時區為準
    pub fn day(&self) -> NaiveDate {
        self.0.date_naive()
    }
}

/// 抓回來尚未解析的頁面
#[derive(Debug, Clone)]
pub struct RawPage {
    pub url: String,
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Appended {
        day: NaiveDate,
        observations_today: usize,
        path: String,
    },
    Unchanged {
        day: NaiveDate,
    },
}

impl LoadOutcome {
    pub fn is_appended(&self) -> bool {
        matches!(self, Self::Appended { .. })
    }
}
