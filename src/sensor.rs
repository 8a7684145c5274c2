//! RCE sensor entity
//!
//! Owns the cached price series, the derived statistics, and the refresh
//! state machine. The driver invokes [`RceSensor::update`] serially on its
//! scheduling cadence; every other method is a synchronous, side-effect-free
//! read of cached state, mirroring a platform sensor entity contract.

use crate::config::SensorConfig;
use crate::logging::{StructuredLogger, get_logger};
use crate::pse::{DaySeries, PriceSource};
use crate::stats::DayStats;
use chrono::{Days, NaiveDateTime, Timelike};
use std::sync::Arc;

/// Day-ahead market price sensor
pub struct RceSensor {
    config: SensorConfig,
    tomorrow_cutoff_hour: u32,
    source: Arc<dyn PriceSource>,
    logger: StructuredLogger,

    today: Option<DaySeries>,
    tomorrow: Option<DaySeries>,
    stats: Option<DayStats>,
    native_value: Option<f64>,

    /// Local time of the last handled tick; `None` until the first update
    last_network_pull: Option<NaiveDateTime>,
}

impl RceSensor {
    /// Create a new sensor instance backed by the given price source
    pub fn new(config: SensorConfig, tomorrow_cutoff_hour: u32, source: Arc<dyn PriceSource>) -> Self {
        let logger = get_logger("sensor");
        logger.info("RCE sensor created");
        Self {
            config,
            tomorrow_cutoff_hour,
            source,
            logger,
            today: None,
            tomorrow: None,
            stats: None,
            native_value: None,
            last_network_pull: None,
        }
    }

    /// Display name of the entity
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Entity icon
    pub fn icon(&self) -> &str {
        &self.config.icon
    }

    /// Stable unique identifier
    pub fn unique_id(&self) -> &str {
        &self.config.unique_id
    }

    /// Device registry metadata
    pub fn device_info(&self) -> serde_json::Value {
        serde_json::json!({
            "entry_type": "service",
            "identifiers": [["rce", self.config.unique_id]],
            "name": self.config.name,
            "manufacturer": "PSE.RCE",
        })
    }

    /// Price denominator unit
    pub fn unit(&self) -> &str {
        &self.config.price_type
    }

    /// Combined unit string, e.g. `PLN/MWh`
    pub fn unit_of_measurement(&self) -> String {
        format!("{}/{}", self.config.currency, self.config.price_type)
    }

    /// Current hour's price, if known
    pub fn native_value(&self) -> Option<f64> {
        self.native_value
    }

    /// Attribute map published alongside the native value
    pub fn extra_state_attributes(&self) -> serde_json::Value {
        let stats = self.stats.as_ref();
        serde_json::json!({
            "average": stats.map(|s| s.average),
            "off_peak_1": stats.and_then(|s| s.off_peak_1),
            "off_peak_2": stats.and_then(|s| s.off_peak_2),
            "peak": stats.and_then(|s| s.peak),
            "min": stats.map(|s| s.min),
            "max": stats.map(|s| s.max),
            "mean": stats.map(|s| s.median),
            "geometric_mean": stats.and_then(|s| s.geometric_mean),
            "harmonic_mean": stats.and_then(|s| s.harmonic_mean),
            "unit": self.config.price_type,
            "currency": self.config.currency,
            "today": self.today.as_ref().map(|s| &s.prices),
            "tomorrow": self.tomorrow.as_ref().map(|s| &s.prices),
            "start_time_today": self.today.as_ref().map(|s| &s.start_times),
            "start_time_tomorrow": self.tomorrow.as_ref().map(|s| &s.start_times),
        })
    }

    /// Handle one scheduled tick at local wall-clock time `now`
    ///
    /// Performs a full refresh when no data has been fetched yet or the
    /// calendar day rolled over; otherwise only re-derives the current-hour
    /// price when the hour changed, and retries the next-day fetch once the
    /// publication cutoff has passed. Failures never escape this method.
    pub async fn update(&mut self, now: NaiveDateTime) {
        let Some(last) = self.last_network_pull else {
            self.full_refresh(now).await;
            self.last_network_pull = Some(now);
            return;
        };

        if last.date() != now.date() {
            self.full_refresh(now).await;
            self.last_network_pull = Some(now);
            return;
        }

        if last.hour() == now.hour() {
            return;
        }

        if let Some(today) = &self.today {
            self.native_value = current_hour_price(today, now.hour(), &self.logger);
        }
        self.last_network_pull = Some(now);

        if self.tomorrow.is_none() && now.hour() > self.tomorrow_cutoff_hour {
            self.full_refresh(now).await;
            self.last_network_pull = Some(now);
        }
    }

    /// Fetch both days and recompute all derived state
    async fn full_refresh(&mut self, now: NaiveDateTime) {
        let today = self.source.fetch_day(now.date()).await;
        let tomorrow = match now.date().checked_add_days(Days::new(1)) {
            Some(next_day) => self.source.fetch_day(next_day).await,
            None => None,
        };

        match &today {
            Some(series) => {
                self.stats = DayStats::compute(&series.prices);
                self.native_value = current_hour_price(series, now.hour(), &self.logger);
            }
            None => {
                // Keep last published value and statistics until data returns
                self.logger.debug("No data for today, unable to set attrs");
            }
        }

        self.today = today;
        self.tomorrow = tomorrow;
    }

    /// Local time of the last handled tick
    pub fn last_network_pull(&self) -> Option<NaiveDateTime> {
        self.last_network_pull
    }
}

/// Look up the price for the given local hour
///
/// An hour beyond the series length (short DST days, truncated publications)
/// clamps to the last published hour rather than erroring.
fn current_hour_price(series: &DaySeries, hour: u32, logger: &StructuredLogger) -> Option<f64> {
    let idx = hour as usize;
    if let Some(price) = series.prices.get(idx) {
        return Some(*price);
    }
    let last = series.prices.last().copied();
    if last.is_some() {
        logger.warn(&format!(
            "Hour {} beyond published series of {} entries, clamping to last",
            hour,
            series.prices.len()
        ));
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{NaiveDate, NaiveTime};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockSource {
        days: Mutex<HashMap<NaiveDate, DaySeries>>,
        fetches: AtomicUsize,
    }

    impl MockSource {
        fn new() -> Self {
            Self {
                days: Mutex::new(HashMap::new()),
                fetches: AtomicUsize::new(0),
            }
        }

        fn publish(&self, date: NaiveDate, prices: Vec<f64>) {
            let start_times = (0..prices.len())
                .map(|h| format!("{} {:02}:00:00", date.format("%Y-%m-%d"), h))
                .collect();
            self.days
                .lock()
                .unwrap()
                .insert(date, DaySeries { prices, start_times });
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PriceSource for MockSource {
        async fn fetch_day(&self, date: NaiveDate) -> Option<DaySeries> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.days.lock().unwrap().get(&date).cloned()
        }
    }

    fn at(date: NaiveDate, hour: u32) -> NaiveDateTime {
        date.and_time(NaiveTime::from_hms_opt(hour, 5, 0).unwrap())
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn full_day_prices() -> Vec<f64> {
        (0..24).map(|h| 100.0 + h as f64).collect()
    }

    fn sensor_with(source: Arc<MockSource>) -> RceSensor {
        RceSensor::new(SensorConfig::default(), 14, source)
    }

    #[tokio::test]
    async fn first_tick_performs_full_refresh() {
        let source = Arc::new(MockSource::new());
        source.publish(day(), full_day_prices());
        source.publish(day().succ_opt().unwrap(), vec![50.0; 24]);

        let mut sensor = sensor_with(source.clone());
        sensor.update(at(day(), 9)).await;

        assert_eq!(sensor.native_value(), Some(109.0));
        assert_eq!(source.fetch_count(), 2);

        let attrs = sensor.extra_state_attributes();
        assert_eq!(attrs["today"].as_array().unwrap().len(), 24);
        assert_eq!(attrs["tomorrow"][0], 50.0);
        assert_eq!(attrs["start_time_today"][0], "2024-03-15 00:00:00");
        assert_eq!(attrs["currency"], "PLN");
        assert!(attrs["average"].is_number());
    }

    #[tokio::test]
    async fn same_hour_tick_is_a_noop() {
        let source = Arc::new(MockSource::new());
        source.publish(day(), full_day_prices());
        source.publish(day().succ_opt().unwrap(), vec![50.0; 24]);

        let mut sensor = sensor_with(source.clone());
        sensor.update(at(day(), 9)).await;
        let fetched = source.fetch_count();

        sensor.update(at(day(), 9)).await;
        assert_eq!(source.fetch_count(), fetched);
        assert_eq!(sensor.native_value(), Some(109.0));
    }

    #[tokio::test]
    async fn hour_change_rereads_cached_series_without_fetching() {
        let source = Arc::new(MockSource::new());
        source.publish(day(), full_day_prices());
        source.publish(day().succ_opt().unwrap(), vec![50.0; 24]);

        let mut sensor = sensor_with(source.clone());
        sensor.update(at(day(), 9)).await;
        let fetched = source.fetch_count();

        sensor.update(at(day(), 10)).await;
        assert_eq!(sensor.native_value(), Some(110.0));
        assert_eq!(source.fetch_count(), fetched);
    }

    #[tokio::test]
    async fn missing_tomorrow_refetches_only_past_cutoff() {
        let source = Arc::new(MockSource::new());
        source.publish(day(), full_day_prices());

        let mut sensor = sensor_with(source.clone());
        sensor.update(at(day(), 9)).await;
        assert_eq!(source.fetch_count(), 2);

        // Before the cutoff: only the hourly price moves, no network pull
        sensor.update(at(day(), 10)).await;
        assert_eq!(source.fetch_count(), 2);

        // Past the cutoff with tomorrow still missing: full refresh again
        sensor.update(at(day(), 15)).await;
        assert_eq!(source.fetch_count(), 4);

        // Tomorrow appears; the next hour no longer refetches
        source.publish(day().succ_opt().unwrap(), vec![50.0; 24]);
        sensor.update(at(day(), 16)).await;
        assert_eq!(source.fetch_count(), 6);
        sensor.update(at(day(), 17)).await;
        assert_eq!(source.fetch_count(), 6);
    }

    #[tokio::test]
    async fn day_rollover_triggers_one_full_refresh() {
        let source = Arc::new(MockSource::new());
        source.publish(day(), full_day_prices());
        let next = day().succ_opt().unwrap();
        source.publish(next, vec![200.0; 24]);

        let mut sensor = sensor_with(source.clone());
        sensor.update(at(day(), 23)).await;
        assert_eq!(sensor.native_value(), Some(123.0));
        let fetched = source.fetch_count();

        sensor.update(at(next, 0)).await;
        assert_eq!(source.fetch_count(), fetched + 2);
        assert_eq!(sensor.native_value(), Some(200.0));
        assert_eq!(sensor.last_network_pull().unwrap().date(), next);
    }

    #[tokio::test]
    async fn transport_failure_leaves_series_null() {
        let source = Arc::new(MockSource::new());

        let mut sensor = sensor_with(source.clone());
        sensor.update(at(day(), 9)).await;

        assert_eq!(sensor.native_value(), None);
        let attrs = sensor.extra_state_attributes();
        assert!(attrs["today"].is_null());
        assert!(attrs["tomorrow"].is_null());
        assert!(attrs["average"].is_null());

        // Same day, later hour, before the cutoff: no new full refresh
        let fetched = source.fetch_count();
        sensor.update(at(day(), 10)).await;
        assert_eq!(source.fetch_count(), fetched);
    }

    #[tokio::test]
    async fn stale_value_persists_when_new_day_fetch_fails() {
        let source = Arc::new(MockSource::new());
        source.publish(day(), full_day_prices());

        let mut sensor = sensor_with(source.clone());
        sensor.update(at(day(), 9)).await;
        assert_eq!(sensor.native_value(), Some(109.0));

        // Day rolls over but the operator publishes nothing
        let next = day().succ_opt().unwrap();
        sensor.update(at(next, 0)).await;

        assert_eq!(sensor.native_value(), Some(109.0));
        let attrs = sensor.extra_state_attributes();
        assert!(attrs["today"].is_null());
        assert!(attrs["average"].is_number());
    }

    #[tokio::test]
    async fn out_of_range_hour_clamps_to_last_entry() {
        let source = Arc::new(MockSource::new());
        source.publish(day(), vec![10.0, 20.0, 30.0]);

        let mut sensor = sensor_with(source.clone());
        sensor.update(at(day(), 9)).await;

        assert_eq!(sensor.native_value(), Some(30.0));
    }

    #[test]
    fn entity_metadata() {
        let source = Arc::new(MockSource::new());
        let sensor = sensor_with(source);

        assert_eq!(sensor.unique_id(), "rce_pse_pln");
        assert_eq!(sensor.icon(), "mdi:currency-eur");
        assert_eq!(sensor.unit_of_measurement(), "PLN/MWh");
        assert_eq!(sensor.unit(), "MWh");
        let info = sensor.device_info();
        assert_eq!(info["manufacturer"], "PSE.RCE");
        assert_eq!(info["entry_type"], "service");
    }
}
