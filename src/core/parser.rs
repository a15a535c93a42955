//! 從票務網站的可用性頁面解析票券資料。
//!
//! 所有 selector 與 regex 在建構時就編譯好，之後的 `parse` 不會因設定失敗；
//! 相同的 HTML 一定得到相同的 [`Availability`]。

use crate::config::toml_config::SelectorConfig;
use crate::domain::model::{Availability, PassAvailability};
use crate::utils::error::{Result, ScrapeError};
use crate::utils::validation::{compile_regex, compile_selector};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

pub struct AvailabilityParser {
    venue: Option<Selector>,
    row: Selector,
    name: Selector,
    date: Option<Selector>,
    remaining: Option<Selector>,
    price: Option<Selector>,
    sold_out: Regex,
    number: Regex,
    amount: Regex,
    free: Regex,
    row_selector_text: String,
}

impl AvailabilityParser {
    pub fn from_config(config: &SelectorConfig) -> Result<Self> {
        let optional = |field: &str, selector: &Option<String>| -> Result<Option<Selector>> {
            selector
                .as_deref()
                .map(|s| compile_selector(field, s))
                .transpose()
        };

        Ok(Self {
            venue: optional("selectors.venue", &config.venue)?,
            row: compile_selector("selectors.row", &config.row)?,
            name: compile_selector("selectors.name", &config.name)?,
            date: optional("selectors.date", &config.date)?,
            remaining: optional("selectors.remaining", &config.remaining)?,
            price: optional("selectors.price", &config.price)?,
            sold_out: compile_regex("selectors.sold_out_pattern", &config.sold_out_pattern)?,
            number: compile_regex("number", r"\d[\d,]*")?,
            amount: compile_regex("amount", r"(\d[\d,]*)(?:\.(\d{1,2}))?")?,
            free: compile_regex("free", r"(?i)\bfree\b")?,
            row_selector_text: config.row.clone(),
        })
    }

    pub fn parse(&self, html: &str) -> Result<Availability> {
        let document = Html::parse_document(html);

        let venue = self
            .venue
            .as_ref()
            .and_then(|sel| document.select(sel).next())
            .map(element_text)
            .filter(|text| !text.is_empty());

        let mut passes = Vec::new();
        for row in document.select(&self.row) {
            match self.parse_row(&row) {
                Some(pass) => passes.push(pass),
                None => tracing::debug!("Skipping row without a pass name"),
            }
        }

        if passes.is_empty() {
            return Err(ScrapeError::parse(format!(
                "no pass rows matched selector '{}'",
                self.row_selector_text
            )));
        }

        tracing::debug!("Parsed {} passes", passes.len());
        Ok(Availability { venue, passes })
    }

    fn parse_row(&self, row: &ElementRef<'_>) -> Option<PassAvailability> {
        let name = select_text(row, &self.name).filter(|n| !n.is_empty())?;
        let date = self
            .date
            .as_ref()
            .and_then(|sel| select_text(row, sel))
            .filter(|d| !d.is_empty());

        // 沒有剩餘數欄位時，用整列文字判斷是否售完
        let remaining_text = match &self.remaining {
            Some(sel) => select_text(row, sel),
            None => Some(element_text(*row)),
        };
        let mut remaining = match &self.remaining {
            Some(_) => remaining_text.as_deref().and_then(|t| self.first_number(t)),
            None => None,
        };
        let marked_sold_out = remaining_text
            .as_deref()
            .is_some_and(|t| self.sold_out.is_match(t));
        if marked_sold_out && remaining.is_none() {
            remaining = Some(0);
        }
        let sold_out = marked_sold_out || remaining == Some(0);

        let price = self
            .price
            .as_ref()
            .and_then(|sel| select_text(row, sel))
            .filter(|p| !p.is_empty());
        let price_cents = price.as_deref().and_then(|p| self.price_cents(p));

        Some(PassAvailability {
            name,
            date,
            remaining,
            sold_out,
            price,
            price_cents,
        })
    }

    fn first_number(&self, text: &str) -> Option<u32> {
        let m = self.number.find(text)?;
        match m.as_str().replace(',', "").parse() {
            Ok(n) => Some(n),
            Err(e) => {
                tracing::debug!("Ignoring remaining count '{}' in '{}': {}", m.as_str(), text, e);
                None
            }
        }
    }

    /// `$1,234.5` -> 123450，`Free` -> 0
    fn price_cents(&self, text: &str) -> Option<u64> {
        if let Some(caps) = self.amount.captures(text) {
            let whole: u64 = caps[1].replace(',', "").parse().ok()?;
            let fraction = match caps.get(2) {
                Some(f) if f.as_str().len() == 1 => f.as_str().parse::<u64>().ok()? * 10,
                Some(f) => f.as_str().parse::<u64>().ok()?,
                None => 0,
            };
            return whole.checked_mul(100)?.checked_add(fraction);
        }
        if self.free.is_match(text) {
            return Some(0);
        }
        None
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn select_text(row: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    row.select(selector).next().map(element_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = include_str!("../../tests/fixtures/availability.html");

    fn parser() -> AvailabilityParser {
        AvailabilityParser::from_config(&SelectorConfig::default()).unwrap()
    }

    #[test]
    fn test_parse_fixture() {
        let availability = parser().parse(FIXTURE).unwrap();

        assert_eq!(availability.venue.as_deref(), Some("Riverside Hall"));
        assert_eq!(availability.passes.len(), 4);

        let day = &availability.passes[0];
        assert_eq!(day.name, "Day Pass");
        assert_eq!(day.date.as_deref(), Some("Sat, Oct 17"));
        assert_eq!(day.remaining, Some(1250));
        assert!(!day.sold_out);
        assert_eq!(day.price.as_deref(), Some("$45.00"));
        assert_eq!(day.price_cents, Some(4500));

        let weekend = &availability.passes[1];
        assert_eq!(weekend.name, "Weekend Pass");
        assert_eq!(weekend.remaining, Some(0));
        assert!(weekend.sold_out);
        assert_eq!(weekend.price_cents, Some(8950));

        let kids = &availability.passes[2];
        assert_eq!(kids.remaining, Some(8));
        assert_eq!(kids.price_cents, Some(0));

        // 沒有日期欄位
        let season = &availability.passes[3];
        assert_eq!(season.name, "Season Pass");
        assert_eq!(season.date, None);
        assert_eq!(season.price_cents, Some(120000));
    }

    #[test]
    fn test_parse_is_deterministic() {
        let parser = parser();
        assert_eq!(parser.parse(FIXTURE).unwrap(), parser.parse(FIXTURE).unwrap());
    }

    #[test]
    fn test_rows_without_name_are_skipped() {
        let html = r#"
<table>
  <tr class="pass-row"><td class="pass-name"> </td><td class="pass-remaining">4 left</td></tr>
  <tr class="pass-row"><td class="pass-name">VIP</td><td class="pass-remaining">2 left</td></tr>
</table>"#;

        let availability = parser().parse(html).unwrap();
        assert_eq!(availability.venue, None);
        assert_eq!(availability.passes.len(), 1);
        assert_eq!(availability.passes[0].name, "VIP");
        assert_eq!(availability.passes[0].remaining, Some(2));
    }

    #[test]
    fn test_count_too_large_is_recorded_as_unknown() {
        let html = r#"
<table>
  <tr class="pass-row"><td class="pass-name">Day Pass</td><td class="pass-remaining">99,999,999,999 left</td></tr>
</table>"#;

        let pass = &parser().parse(html).unwrap().passes[0];
        assert_eq!(pass.remaining, None);
        assert!(!pass.sold_out);
    }

    #[test]
    fn test_no_rows_is_parse_error() {
        let err = parser()
            .parse("<html><body><p>Service unavailable</p></body></html>")
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Parse { .. }));
        assert!(err.to_string().contains("tr.pass-row"));
    }

    #[test]
    fn test_sold_out_from_row_text_without_remaining_selector() {
        let config = SelectorConfig {
            venue: None,
            row: "li.pass".to_string(),
            name: "strong".to_string(),
            date: None,
            remaining: None,
            price: None,
            sold_out_pattern: r"(?i)sold\s*out".to_string(),
        };
        let html = r#"
<ul>
  <li class="pass"><strong>Early Entry</strong> SOLD OUT</li>
  <li class="pass"><strong>General</strong> on sale</li>
</ul>"#;

        let availability = AvailabilityParser::from_config(&config)
            .unwrap()
            .parse(html)
            .unwrap();

        assert!(availability.passes[0].sold_out);
        assert_eq!(availability.passes[0].remaining, Some(0));
        assert!(!availability.passes[1].sold_out);
        assert_eq!(availability.passes[1].remaining, None);
    }

    #[test]
    fn test_invalid_selector_fails_at_construction() {
        let config = SelectorConfig {
            row: "tr[[".to_string(),
            ..SelectorConfig::default()
        };
        assert!(AvailabilityParser::from_config(&config).is_err());
    }
}
