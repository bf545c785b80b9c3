//! Two-step form flow: fetch the seasonal weather first, then ask for a
//! recommendation. The weather is kept between the two steps.

use crate::error::{AppError, Result};
use crate::features::SoilProfile;
use crate::models::SeasonalAverage;
use crate::pipeline::Recommender;
use crate::recommend::Recommendation;
use crate::season::MONTH_NAMES;
use std::io::{BufRead, Write};

const NUTRIENT_RANGE: (f64, f64) = (0.0, 200.0);
const PH_RANGE: (f64, f64) = (0.0, 14.0);

pub const DEFAULT_SOIL: SoilProfile = SoilProfile {
    nitrogen: 50.0,
    phosphorus: 50.0,
    potassium: 50.0,
    ph: 6.5,
};

/// Reject soil inputs outside the ranges the form accepts.
pub fn validate_soil(soil: &SoilProfile) -> Result<()> {
    let checks = [
        ("Nitrogen (N)", soil.nitrogen, NUTRIENT_RANGE),
        ("Phosphorus (P)", soil.phosphorus, NUTRIENT_RANGE),
        ("Potassium (K)", soil.potassium, NUTRIENT_RANGE),
        ("pH Value", soil.ph, PH_RANGE),
    ];

    for (label, value, (min, max)) in checks {
        if !(min..=max).contains(&value) {
            return Err(AppError::InvalidData(format!(
                "{} must be between {} and {}, got {}",
                label, min, max, value
            )));
        }
    }
    Ok(())
}

pub struct FormSession<'a> {
    recommender: &'a Recommender,
    soil: SoilProfile,
    city: String,
    month: String,
    weather: Option<SeasonalAverage>,
}

impl<'a> FormSession<'a> {
    pub fn new(recommender: &'a Recommender) -> Self {
        Self {
            recommender,
            soil: DEFAULT_SOIL,
            city: "Delhi".to_string(),
            month: "January".to_string(),
            weather: None,
        }
    }

    pub fn soil(&self) -> &SoilProfile {
        &self.soil
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn month(&self) -> &str {
        &self.month
    }

    pub fn weather(&self) -> Option<&SeasonalAverage> {
        self.weather.as_ref()
    }

    pub fn set_soil(&mut self, soil: SoilProfile) -> Result<()> {
        validate_soil(&soil)?;
        self.soil = soil;
        Ok(())
    }

    /// Changing the place invalidates previously fetched weather.
    pub fn set_city(&mut self, city: &str) {
        self.city = city.trim().to_string();
        self.weather = None;
    }

    /// Only the twelve calendar month names are accepted.
    pub fn set_month(&mut self, month: &str) -> Result<()> {
        let normalized = month.trim().to_lowercase();
        if !MONTH_NAMES.contains(&normalized.as_str()) {
            return Err(AppError::InvalidMonth(month.to_string()));
        }
        self.month = month.trim().to_string();
        self.weather = None;
        Ok(())
    }

    pub async fn fetch_weather(&mut self) -> Result<SeasonalAverage> {
        self.weather = None;
        let report = self
            .recommender
            .fetch_weather(&self.city, &self.month)
            .await?;
        self.weather = Some(report.season);
        Ok(report.season)
    }

    pub fn recommend(&self) -> Result<Recommendation> {
        let weather = self.weather.as_ref().ok_or(AppError::MissingPrerequisite)?;
        let ranked = self.recommender.recommend(&self.soil, weather)?;
        Ok(Recommendation::from_ranked(ranked))
    }
}

pub fn format_weather(weather: &SeasonalAverage) -> String {
    format!(
        "Temperature: {:.2} °C\nHumidity: {:.2} %\nRainfall: {:.2} mm",
        weather.avg_temp_c, weather.avg_humidity_pct, weather.avg_rainfall_mm
    )
}

const HELP: &str = "\
Commands:
  soil <N> <P> <K> <pH>   set soil information
  city <name>             set the city
  month <name>            set the month to sow the crop
  fetch                   fetch weather data
  recommend               recommend a crop
  show                    show current inputs
  help                    show this message
  quit                    exit";

/// Drive a session from line-oriented input until `quit` or end of input.
pub async fn run_terminal<R, W>(session: &mut FormSession<'_>, input: R, output: &mut W) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    writeln!(output, "Agrocast Crop Recommendation System")?;
    writeln!(output, "{}", HELP)?;

    for line in input.lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            continue;
        };
        let rest: Vec<&str> = parts.collect();

        match command.to_lowercase().as_str() {
            "quit" | "exit" => break,
            "help" => writeln!(output, "{}", HELP)?,
            "show" => {
                let soil = session.soil();
                writeln!(
                    output,
                    "N={} P={} K={} pH={} city={} month={}",
                    soil.nitrogen,
                    soil.phosphorus,
                    soil.potassium,
                    soil.ph,
                    session.city(),
                    session.month()
                )?;
            }
            "soil" => match parse_soil(&rest) {
                Some(soil) => match session.set_soil(soil) {
                    Ok(()) => writeln!(output, "Soil information updated")?,
                    Err(e) => writeln!(output, "Error: {}", e)?,
                },
                None => writeln!(output, "Usage: soil <N> <P> <K> <pH>")?,
            },
            "city" if !rest.is_empty() => {
                session.set_city(&rest.join(" "));
                writeln!(output, "City set to {}", session.city())?;
            }
            "month" if rest.len() == 1 => match session.set_month(rest[0]) {
                Ok(()) => writeln!(output, "Month set to {}", session.month())?,
                Err(e) => writeln!(output, "Error: {}", e.user_message())?,
            },
            "fetch" => match session.fetch_weather().await {
                Ok(weather) => writeln!(output, "{}", format_weather(&weather))?,
                Err(e) => writeln!(output, "Error: {}", e.user_message())?,
            },
            "recommend" => match session.recommend() {
                Ok(rec) => writeln!(output, "{}", rec)?,
                Err(e) => writeln!(output, "Error: {}", e.user_message())?,
            },
            _ => writeln!(output, "Unknown command, type 'help' for options")?,
        }
        output.flush()?;
    }

    Ok(())
}

fn parse_soil(args: &[&str]) -> Option<SoilProfile> {
    if args.len() != 4 {
        return None;
    }
    let values: Vec<f64> = args
        .iter()
        .map(|a| a.parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .ok()?;

    Some(SoilProfile {
        nitrogen: values[0],
        phosphorus: values[1],
        potassium: values[2],
        ph: values[3],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_soil_is_valid() {
        assert!(validate_soil(&DEFAULT_SOIL).is_ok());
    }

    #[test]
    fn test_soil_out_of_range() {
        let soil = SoilProfile {
            ph: 14.5,
            ..DEFAULT_SOIL
        };
        let err = validate_soil(&soil).unwrap_err();
        assert!(err.to_string().contains("pH Value"));

        let soil = SoilProfile {
            nitrogen: -1.0,
            ..DEFAULT_SOIL
        };
        assert!(validate_soil(&soil).is_err());
    }

    #[test]
    fn test_parse_soil() {
        let soil = parse_soil(&["90", "42", "43", "6.5"]).unwrap();
        assert_eq!(soil.nitrogen, 90.0);
        assert_eq!(soil.ph, 6.5);
        assert!(parse_soil(&["90", "42"]).is_none());
        assert!(parse_soil(&["90", "x", "43", "6.5"]).is_none());
    }

    #[test]
    fn test_format_weather() {
        let weather = SeasonalAverage {
            avg_temp_c: 25.0,
            avg_rainfall_mm: 50.127,
            avg_humidity_pct: 60.5,
        };
        assert_eq!(
            format_weather(&weather),
            "Temperature: 25.00 °C\nHumidity: 60.50 %\nRainfall: 50.13 mm"
        );
    }
}
