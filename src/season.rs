use crate::error::{AppError, Result};
use crate::models::{MonthlyStat, SeasonalAverage};
use tracing::{info, warn};

pub const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Number of consecutive months averaged from the sowing month onwards.
pub const SEASON_LENGTH: usize = 3;

/// Lowercase English name for a 1-based calendar month.
pub fn month_name(month: u32) -> &'static str {
    MONTH_NAMES[(month.clamp(1, 12) - 1) as usize]
}

/// Positions averaged for a season starting at `start` in a sequence of `len`
/// months. Positions wrap around, so short sequences repeat entries.
pub fn season_indices(start: usize, len: usize) -> [usize; SEASON_LENGTH] {
    [start % len, (start + 1) % len, (start + 2) % len]
}

/// Average temperature, rainfall and humidity over the sowing month and the
/// two months after it.
///
/// The lookup takes the first entry whose name matches. The trailing-year
/// window can hold the same month name twice; the earlier (older) one wins.
pub fn three_month_average(monthly: &[MonthlyStat], start_month: &str) -> Result<SeasonalAverage> {
    let target = start_month.trim().to_lowercase();

    let start = monthly
        .iter()
        .position(|m| m.month_name == target)
        .ok_or_else(|| AppError::InvalidMonth(start_month.to_string()))?;

    if monthly.iter().filter(|m| m.month_name == target).count() > 1 {
        warn!(
            "Month '{}' appears more than once in the climate window, using the earliest ({})",
            target, monthly[start].year
        );
    }

    let selected: Vec<&MonthlyStat> = season_indices(start, monthly.len())
        .iter()
        .map(|&i| &monthly[i])
        .collect();

    let avg_rainfall_mm = finite_mean(selected.iter().map(|m| m.rainfall_mm));
    let avg_temp_max = finite_mean(selected.iter().map(|m| m.temp_max_avg));
    let avg_temp_min = finite_mean(selected.iter().map(|m| m.temp_min_avg));
    let avg_humidity_pct = finite_mean(selected.iter().map(|m| m.humidity_avg));

    let average = SeasonalAverage {
        avg_temp_c: (avg_temp_max + avg_temp_min) / 2.0,
        avg_rainfall_mm,
        avg_humidity_pct,
    };

    let names: Vec<&str> = selected.iter().map(|m| m.month_name.as_str()).collect();
    info!("Selected months: {}", names.join(", "));
    info!("Avg temp (3M): {:.2} °C", average.avg_temp_c);
    info!("Avg rainfall (3M): {:.2} mm", average.avg_rainfall_mm);
    info!("Avg humidity (3M): {:.2} %", average.avg_humidity_pct);

    Ok(average)
}

/// Mean of the finite values only. NaN when none are finite.
fn finite_mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .filter(|v| v.is_finite())
        .fold((0.0, 0u32), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / f64::from(count)
    }
}
