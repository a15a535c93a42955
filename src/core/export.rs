use crate::core::history::DailyHistory;
use crate::utils::error::{Result, ScrapeError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Tsv,
}

impl ExportFormat {
    fn delimiter(self) -> u8 {
        match self {
            Self::Csv => b',',
            Self::Tsv => b'\t',
        }
    }
}

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    day: String,
    captured_at: String,
    venue: &'a str,
    pass: &'a str,
    date: &'a str,
    remaining: Option<u32>,
    sold_out: bool,
    price: &'a str,
    price_cents: Option<u64>,
}

/// 每個 (觀測, 票券) 一列
pub fn export_history(history: &DailyHistory, format: ExportFormat) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(format.delimiter())
        .from_writer(Vec::new());

    let mut rows = 0usize;
    for observation in history.observations() {
        let availability = observation.availability();
        for pass in &availability.passes {
            writer.serialize(ExportRow {
                day: observation.day().to_string(),
                captured_at: observation.captured_at().to_rfc3339(),
                venue: availability.venue.as_deref().unwrap_or(""),
                pass: &pass.name,
                date: pass.date.as_deref().unwrap_or(""),
                remaining: pass.remaining,
                sold_out: pass.sold_out,
                price: pass.price.as_deref().unwrap_or(""),
                price_cents: pass.price_cents,
            })?;
            rows += 1;
        }
    }

    // 沒有資料時 serialize 不會寫出標題列
    if rows == 0 {
        writer.write_record([
            "day",
            "captured_at",
            "venue",
            "pass",
            "date",
            "remaining",
            "sold_out",
            "price",
            "price_cents",
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ScrapeError::Io(std::io::Error::new(e.error().kind(), e.to_string())))?;
    String::from_utf8(bytes).map_err(|e| ScrapeError::parse(format!("export is not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Availability, PassAvailability};
    use chrono::DateTime;

    fn history() -> DailyHistory {
        let mut history = DailyHistory::new();
        let passes = vec![
            PassAvailability {
                name: "Day Pass".to_string(),
                date: Some("Sat, Oct 17".to_string()),
                remaining: Some(1250),
                sold_out: false,
                price: Some("$45.00".to_string()),
                price_cents: Some(4500),
            },
            PassAvailability {
                name: "Weekend Pass".to_string(),
                date: None,
                remaining: Some(0),
                sold_out: true,
                price: None,
                price_cents: None,
            },
        ];
        history
            .add(
                DateTime::parse_from_rfc3339("2026-10-16T09:00:00-04:00").unwrap(),
                Availability {
                    venue: Some("Riverside Hall".to_string()),
                    passes,
                },
                true,
            )
            .unwrap();
        history
    }

    #[test]
    fn test_export_csv() {
        let csv = export_history(&history(), ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "day,captured_at,venue,pass,date,remaining,sold_out,price,price_cents"
        );
        assert_eq!(
            lines[1],
            "2026-10-16,2026-10-16T09:00:00-04:00,Riverside Hall,Day Pass,\"Sat, Oct 17\",1250,false,$45.00,4500"
        );
        assert_eq!(
            lines[2],
            "2026-10-16,2026-10-16T09:00:00-04:00,Riverside Hall,Weekend Pass,,0,true,,"
        );
    }

    #[test]
    fn test_export_tsv() {
        let tsv = export_history(&history(), ExportFormat::Tsv).unwrap();
        let first_row: Vec<&str> = tsv.lines().nth(1).unwrap().split('\t').collect();

        assert_eq!(first_row.len(), 9);
        assert_eq!(first_row[3], "Day Pass");
        assert_eq!(first_row[4], "Sat, Oct 17");
    }

    #[test]
    fn test_export_empty_history_has_header() {
        let csv = export_history(&DailyHistory::new(), ExportFormat::Csv).unwrap();
        assert_eq!(
            csv.trim_end(),
            "day,captured_at,venue,pass,date,remaining,sold_out,price,price_cents"
        );
    }
}
