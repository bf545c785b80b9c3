//! Trailing-year climate statistics from the Open-Meteo archive.
//!
//! The fetch window always ends yesterday and starts on the same calendar day
//! one year earlier, so the monthly buckets at both edges are usually partial
//! and the same month name can appear twice.

use crate::config::ClimateConfig;
use crate::error::{AppError, Result};
use crate::http::retry_with_backoff;
use crate::models::{Coordinate, DailyObservation, MonthlyStat};
use crate::parser::{Parser, DAILY_SERIES};
use crate::season::month_name;
use chrono::{Datelike, Duration, Local, NaiveDate};
use reqwest::Client;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive date range requested from the archive service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FetchWindow {
    /// Window ending the day before `today`. A 29 February start falls back to the 28th.
    pub fn trailing_year(today: NaiveDate) -> Self {
        let end = today - Duration::days(1);
        let start = end
            .with_year(end.year() - 1)
            .or_else(|| NaiveDate::from_ymd_opt(end.year() - 1, end.month(), 28))
            .unwrap_or(end - Duration::days(365));
        Self { start, end }
    }
}

pub struct ClimateClient {
    client: Client,
    base_url: String,
    retries: u32,
}

impl ClimateClient {
    pub fn new(client: Client, config: &ClimateConfig, retries: u32) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            retries,
        }
    }

    /// Monthly statistics for the trailing year as of the local system date.
    pub async fn fetch_monthly_climate(&self, coord: Coordinate) -> Result<Vec<MonthlyStat>> {
        self.fetch_monthly_climate_on(coord, Local::now().date_naive())
            .await
    }

    pub async fn fetch_monthly_climate_on(
        &self,
        coord: Coordinate,
        today: NaiveDate,
    ) -> Result<Vec<MonthlyStat>> {
        let window = FetchWindow::trailing_year(today);
        let daily = self.fetch_daily(coord, window).await?;
        let monthly = aggregate_monthly(&daily);

        if monthly.is_empty() {
            return Err(AppError::NoClimateData);
        }

        info!("Monthly weather data (rainfall, humidity):");
        for stat in &monthly {
            info!(
                "  {:>9} {}  rain {:>8.2} mm  humidity {:>6.2} %",
                stat.month_name, stat.year, stat.rainfall_mm, stat.humidity_avg
            );
        }

        Ok(monthly)
    }

    pub async fn fetch_daily(
        &self,
        coord: Coordinate,
        window: FetchWindow,
    ) -> Result<Vec<DailyObservation>> {
        let latitude = coord.latitude.to_string();
        let longitude = coord.longitude.to_string();
        let start = window.start.format(DATE_FORMAT).to_string();
        let end = window.end.format(DATE_FORMAT).to_string();

        debug!(
            "Fetching daily climate for ({}, {}) from {} to {}",
            latitude, longitude, start, end
        );

        let fetched = retry_with_backoff(self.retries, || {
            let query = [
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("daily", DAILY_SERIES),
                ("timezone", "auto"),
                ("start_date", start.as_str()),
                ("end_date", end.as_str()),
            ];
            async move {
                let response = self.client.get(&self.base_url).query(&query).send().await?;
                if response.status().is_server_error() {
                    response.error_for_status_ref()?;
                }
                Ok(response.text().await?)
            }
        })
        .await;

        let body = match fetched {
            Ok(body) => body,
            Err(AppError::Http(e)) if e.status().is_some() => {
                warn!(
                    "Climate archive failed for ({}, {}): {}",
                    latitude, longitude, e
                );
                return Err(AppError::NoClimateData);
            }
            Err(e) => return Err(e),
        };

        let (observations, stats) = match Parser::parse_daily(&body) {
            Ok(parsed) => parsed,
            Err(AppError::Parse(msg)) => {
                warn!(
                    "Unusable climate archive response for ({}, {}): {}",
                    latitude, longitude, msg
                );
                return Err(AppError::NoClimateData);
            }
            Err(e) => return Err(e),
        };
        debug!(
            "Parsed {} days ({} incomplete, {} unreadable)",
            stats.parsed_successfully, stats.incomplete_days, stats.parse_failures
        );

        Ok(observations)
    }
}

#[derive(Default)]
struct MonthBucket {
    rainfall_sum: f64,
    temp_max: RunningMean,
    temp_min: RunningMean,
    humidity: RunningMean,
}

#[derive(Default)]
struct RunningMean {
    sum: f64,
    count: usize,
}

impl RunningMean {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Bucket daily rows by calendar month, in chronological order.
///
/// Rainfall is summed, the other readings are averaged. Missing readings are
/// skipped; a month with no reading for a field averages to NaN.
pub fn aggregate_monthly(daily: &[DailyObservation]) -> Vec<MonthlyStat> {
    let mut buckets: BTreeMap<(i32, u32), MonthBucket> = BTreeMap::new();

    for obs in daily {
        let bucket = buckets
            .entry((obs.date.year(), obs.date.month()))
            .or_default();
        bucket.rainfall_sum += obs.precipitation_mm.unwrap_or(0.0);
        bucket.temp_max.push(obs.temp_max_c);
        bucket.temp_min.push(obs.temp_min_c);
        bucket.humidity.push(obs.humidity_pct);
    }

    buckets
        .into_iter()
        .map(|((year, month), bucket)| MonthlyStat {
            month_name: month_name(month).to_string(),
            year,
            rainfall_mm: bucket.rainfall_sum,
            temp_max_avg: bucket.temp_max.mean(),
            temp_min_avg: bucket.temp_min.mean(),
            humidity_avg: bucket.humidity.mean(),
        })
        .collect()
}
