use crate::models::SeasonalAverage;

pub const FEATURE_COUNT: usize = 7;

/// Column names in the order the classifier was trained on.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] =
    ["N", "P", "K", "temperature", "humidity", "ph", "rainfall"];

/// Soil chemistry supplied by the grower.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoilProfile {
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub ph: f64,
}

/// Model input `[N, P, K, temperature, humidity, pH, rainfall]`.
///
/// The column order is fixed by the trained model; reordering corrupts predictions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn assemble(soil: &SoilProfile, weather: &SeasonalAverage) -> Self {
        Self([
            soil.nitrogen,
            soil.phosphorus,
            soil.potassium,
            weather.avg_temp_c,
            weather.avg_humidity_pct,
            soil.ph,
            weather.avg_rainfall_mm,
        ])
    }

    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }

    /// Values paired with their column names, in model order.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.0.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_order() {
        let soil = SoilProfile {
            nitrogen: 90.0,
            phosphorus: 42.0,
            potassium: 43.0,
            ph: 6.5,
        };
        let weather = SeasonalAverage {
            avg_temp_c: 20.8,
            avg_rainfall_mm: 202.9,
            avg_humidity_pct: 82.0,
        };

        let features = FeatureVector::assemble(&soil, &weather);
        assert_eq!(
            features.values(),
            &[90.0, 42.0, 43.0, 20.8, 82.0, 6.5, 202.9]
        );
    }

    #[test]
    fn test_named_features_follow_column_order() {
        let features = FeatureVector::assemble(
            &SoilProfile {
                nitrogen: 1.0,
                phosphorus: 2.0,
                potassium: 3.0,
                ph: 6.0,
            },
            &SeasonalAverage {
                avg_temp_c: 4.0,
                avg_rainfall_mm: 7.0,
                avg_humidity_pct: 5.0,
            },
        );

        let named: Vec<_> = features.named().collect();
        assert_eq!(named[3], ("temperature", 4.0));
        assert_eq!(named[5], ("ph", 6.0));
        assert_eq!(named[6], ("rainfall", 7.0));
    }
}
