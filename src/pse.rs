//! PSE day-ahead price retrieval
//!
//! Fetches the operator's public CSV export for a given calendar day and
//! reshapes it into parallel price/start-time sequences. Transport failures
//! and malformed bodies are absorbed here and surface only as missing data,
//! never as errors.

use crate::error::Result;
use crate::logging::{StructuredLogger, get_logger};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// CSV export path for the day-ahead market price table (RCE)
const EXPORT_PATH: &str = "/getcsv/-/export/csv/PL_CENY_RYN_EN/data";

/// Hourly price series for one calendar day
///
/// `prices[i]` is the clearing price for the hour starting at
/// `start_times[i]`; the two sequences always have equal length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySeries {
    /// Hourly prices in currency per unit of energy
    pub prices: Vec<f64>,

    /// ISO-formatted hour-start timestamps (`YYYY-MM-DD HH:MM:SS`)
    pub start_times: Vec<String>,
}

/// Source of daily price series
///
/// Implemented by [`PseClient`] for the real endpoint and by mocks in tests.
/// A failed or empty fetch is `None`; implementations must not error out.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch the price series for the given calendar day, if published
    async fn fetch_day(&self, date: NaiveDate) -> Option<DaySeries>;
}

/// HTTP client for the PSE CSV export
pub struct PseClient {
    base_url: String,
    client: reqwest::Client,
    logger: StructuredLogger,
}

impl PseClient {
    /// Create a new client with the given base URL and read timeout
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            logger: get_logger("pse"),
        })
    }

    /// Build the export URL for one calendar day
    pub fn url_for(&self, date: NaiveDate) -> String {
        format!("{}{}/{}", self.base_url, EXPORT_PATH, date.format("%Y%m%d"))
    }
}

#[async_trait]
impl PriceSource for PseClient {
    async fn fetch_day(&self, date: NaiveDate) -> Option<DaySeries> {
        let url = self.url_for(date);
        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                self.logger.debug(&format!("Fetch failed for {}: {}", date, e));
                return None;
            }
        };

        if !response.status().is_success() {
            self.logger
                .debug(&format!("Fetch for {} returned status {}", date, response.status()));
            return None;
        }

        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                self.logger.debug(&format!("Body read failed for {}: {}", date, e));
                return None;
            }
        };

        let series = parse_day_csv(&body, date);
        if series.is_none() {
            self.logger.debug(&format!("No data for {}, unable to set attrs", date));
        }
        series
    }
}

/// Parse a semicolon-delimited export body into a day series
///
/// The second column is the hour of day (1-24) and the third the price with
/// a comma decimal separator. Rows whose hour field is not a valid hour
/// number are header/footer rows and are skipped. Returns `None` when no
/// numeric rows are present.
pub fn parse_day_csv(body: &str, date: NaiveDate) -> Option<DaySeries> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut prices = Vec::new();
    let mut start_times = Vec::new();

    for record in reader.records() {
        let Ok(record) = record else {
            continue;
        };
        let Some(hour_field) = record.get(1) else {
            continue;
        };
        // Header and footer rows carry a non-numeric hour field
        let Ok(hour) = hour_field.trim().parse::<u32>() else {
            continue;
        };
        if !(1..=24).contains(&hour) {
            continue;
        }
        let Some(price_field) = record.get(2) else {
            continue;
        };
        let Ok(price) = price_field.trim().replace(',', ".").parse::<f64>() else {
            continue;
        };

        prices.push(price);
        start_times.push(format!("{} {:02}:00:00", date.format("%Y-%m-%d"), hour - 1));
    }

    if prices.is_empty() {
        return None;
    }

    Some(DaySeries { prices, start_times })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn parses_example_body() {
        let body = "2024-03-15;1;120,50\n2024-03-15;2;95,00\n";
        let series = parse_day_csv(body, day()).unwrap();
        assert_eq!(series.prices, vec![120.50, 95.00]);
        assert_eq!(series.start_times[0], "2024-03-15 00:00:00");
        assert_eq!(series.start_times[1], "2024-03-15 01:00:00");
    }

    #[test]
    fn skips_header_and_footer_rows() {
        let body = "Data;Godzina;RCE\n2024-03-15;1;351,99\n2024-03-15;2;340,10\nSuma;;692,09\n";
        let series = parse_day_csv(body, day()).unwrap();
        assert_eq!(series.prices, vec![351.99, 340.10]);
        assert_eq!(series.prices.len(), series.start_times.len());
    }

    #[test]
    fn full_day_indexes_hours() {
        let mut body = String::from("Data;Godzina;RCE\n");
        for h in 1..=24 {
            body.push_str(&format!("2024-03-15;{};{},00\n", h, 100 + h));
        }
        let series = parse_day_csv(&body, day()).unwrap();
        assert_eq!(series.prices.len(), 24);
        assert_eq!(series.prices[0], 101.0);
        assert_eq!(series.prices[23], 124.0);
        assert_eq!(series.start_times[23], "2024-03-15 23:00:00");
    }

    #[test]
    fn empty_body_is_none() {
        assert!(parse_day_csv("", day()).is_none());
        assert!(parse_day_csv("Data;Godzina;RCE\n", day()).is_none());
    }

    #[test]
    fn out_of_range_hours_are_skipped() {
        let body = "2024-03-15;0;10,00\n2024-03-15;25;10,00\n2024-03-15;3;10,00\n";
        let series = parse_day_csv(body, day()).unwrap();
        assert_eq!(series.prices, vec![10.0]);
        assert_eq!(series.start_times[0], "2024-03-15 02:00:00");
    }

    #[test]
    fn unparsable_price_rows_are_skipped() {
        let body = "2024-03-15;1;n/a\n2024-03-15;2;95,00\n";
        let series = parse_day_csv(body, day()).unwrap();
        assert_eq!(series.prices, vec![95.0]);
    }

    #[test]
    fn builds_export_url() {
        let client = PseClient::new("https://www.pse.pl/", 10).unwrap();
        assert_eq!(
            client.url_for(day()),
            "https://www.pse.pl/getcsv/-/export/csv/PL_CENY_RYN_EN/data/20240315"
        );
    }
}
