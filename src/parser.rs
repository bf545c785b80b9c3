use crate::error::{AppError, Result};
use crate::models::DailyObservation;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::warn;

/// Default failure threshold - fail if more than 10% of days carry an unreadable date
const DEFAULT_FAILURE_THRESHOLD: f64 = 0.10;

/// Series requested from the archive service, in request order.
pub const DAILY_SERIES: &str =
    "precipitation_sum,temperature_2m_max,temperature_2m_min,relative_humidity_2m_mean";

#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    daily: Option<DailySeries>,
}

#[derive(Debug, Deserialize)]
struct DailySeries {
    time: Vec<String>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    relative_humidity_2m_mean: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default)]
pub struct ParseStats {
    pub total_days: usize,
    pub parsed_successfully: usize,
    pub parse_failures: usize,
    pub incomplete_days: usize,
    pub failure_rate: f64,
}

impl ParseStats {
    pub fn finalize(&mut self) {
        self.failure_rate = if self.total_days > 0 {
            self.parse_failures as f64 / self.total_days as f64
        } else {
            0.0
        };
    }

    pub fn exceeds_threshold(&self, threshold: f64) -> bool {
        self.failure_rate > threshold
    }
}

pub struct Parser;

impl Parser {
    /// Parse an archive response body into daily observations with parse statistics
    pub fn parse_daily(body: &str) -> Result<(Vec<DailyObservation>, ParseStats)> {
        Self::parse_daily_with_threshold(body, DEFAULT_FAILURE_THRESHOLD)
    }

    /// Parse an archive response body with a custom failure threshold
    pub fn parse_daily_with_threshold(
        body: &str,
        failure_threshold: f64,
    ) -> Result<(Vec<DailyObservation>, ParseStats)> {
        let response: ArchiveResponse = serde_json::from_str(body)
            .map_err(|e| AppError::Parse(format!("Invalid archive response: {}", e)))?;

        let daily = response.daily.ok_or(AppError::NoClimateData)?;
        if daily.time.is_empty() {
            return Err(AppError::NoClimateData);
        }

        let days = daily.time.len();
        let series = [
            ("precipitation_sum", daily.precipitation_sum.len()),
            ("temperature_2m_max", daily.temperature_2m_max.len()),
            ("temperature_2m_min", daily.temperature_2m_min.len()),
            ("relative_humidity_2m_mean", daily.relative_humidity_2m_mean.len()),
        ];
        for (name, len) in series {
            if len != days {
                return Err(AppError::Parse(format!(
                    "Series {} has {} values, expected {}",
                    name, len, days
                )));
            }
        }

        let mut observations = Vec::with_capacity(days);
        let mut stats = ParseStats::default();

        for (idx, raw_date) in daily.time.iter().enumerate() {
            stats.total_days += 1;

            let date = match parse_date(raw_date) {
                Ok(date) => date,
                Err(e) => {
                    stats.parse_failures += 1;
                    warn!(
                        "Failed to parse day {} (failure {}/{}): {}",
                        idx + 1,
                        stats.parse_failures,
                        days,
                        e
                    );
                    continue;
                }
            };

            let obs = DailyObservation {
                date,
                precipitation_mm: daily.precipitation_sum[idx],
                temp_max_c: daily.temperature_2m_max[idx],
                temp_min_c: daily.temperature_2m_min[idx],
                humidity_pct: daily.relative_humidity_2m_mean[idx],
            };

            if obs.precipitation_mm.is_none()
                || obs.temp_max_c.is_none()
                || obs.temp_min_c.is_none()
                || obs.humidity_pct.is_none()
            {
                stats.incomplete_days += 1;
            }

            observations.push(obs);
            stats.parsed_successfully += 1;
        }

        stats.finalize();

        if stats.exceeds_threshold(failure_threshold) {
            return Err(AppError::Parse(format!(
                "Parse failure rate {:.1}% exceeds threshold {:.1}%: {} failures out of {} days",
                stats.failure_rate * 100.0,
                failure_threshold * 100.0,
                stats.parse_failures,
                stats.total_days
            )));
        }

        if observations.is_empty() {
            return Err(AppError::NoClimateData);
        }

        if stats.incomplete_days > 0 {
            warn!(
                "{} of {} days have at least one missing reading",
                stats.incomplete_days, stats.total_days
            );
        }

        Ok((observations, stats))
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| AppError::Parse(format!("Failed to parse date '{}': {}", s, e)))
}
