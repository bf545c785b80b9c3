use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// One row of the archive service's daily series. Missing readings are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyObservation {
    pub date: NaiveDate,
    pub precipitation_mm: Option<f64>,
    pub temp_max_c: Option<f64>,
    pub temp_min_c: Option<f64>,
    pub humidity_pct: Option<f64>,
}

/// Climate statistics for one calendar month of the trailing year.
///
/// `month_name` is the lowercase English name and the only lookup key used
/// downstream. `year` is kept for diagnostics only.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyStat {
    pub month_name: String,
    pub year: i32,
    pub rainfall_mm: f64,
    pub temp_max_avg: f64,
    pub temp_min_avg: f64,
    pub humidity_avg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonalAverage {
    pub avg_temp_c: f64,
    pub avg_rainfall_mm: f64,
    pub avg_humidity_pct: f64,
}

impl SeasonalAverage {
    pub fn is_finite(&self) -> bool {
        self.avg_temp_c.is_finite()
            && self.avg_rainfall_mm.is_finite()
            && self.avg_humidity_pct.is_finite()
    }
}
