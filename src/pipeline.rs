use crate::climate::ClimateClient;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::features::{FeatureVector, SoilProfile};
use crate::geocoder::Geocoder;
use crate::http::build_client;
use crate::model::{CropClassifier, ModelArtifacts};
use crate::models::{Coordinate, SeasonalAverage};
use crate::recommend::{rank_top, RankedCrop, TOP_N};
use crate::season::three_month_average;
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tracing::{debug, info};

/// Seasonal weather for a place, ready to be combined with soil inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherReport {
    pub coordinate: Coordinate,
    pub season: SeasonalAverage,
}

/// Everything a request needs, built once at startup and shared read-only.
pub struct Recommender {
    geocoder: Geocoder,
    climate: ClimateClient,
    classifier: Arc<dyn CropClassifier>,
}

impl Recommender {
    pub fn new(
        geocoder: Geocoder,
        climate: ClimateClient,
        classifier: Arc<dyn CropClassifier>,
    ) -> Self {
        Self {
            geocoder,
            climate,
            classifier,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = build_client(&config.http)?;
        let geocoder = Geocoder::new(client.clone(), &config.geocoding, config.http.retries);
        let climate = ClimateClient::new(client, &config.climate, config.http.retries);
        let classifier = ModelArtifacts::load(&config.model.path)?;

        Ok(Self::new(geocoder, climate, Arc::new(classifier)))
    }

    pub async fn fetch_weather(&self, city: &str, month: &str) -> Result<WeatherReport> {
        self.fetch_weather_on(city, month, Local::now().date_naive())
            .await
    }

    /// Geocode `city`, pull its trailing-year climate as of `today` and average
    /// the three months starting at `month`.
    pub async fn fetch_weather_on(
        &self,
        city: &str,
        month: &str,
        today: NaiveDate,
    ) -> Result<WeatherReport> {
        let coordinate = self.geocoder.resolve(city).await?;
        let monthly = self.climate.fetch_monthly_climate_on(coordinate, today).await?;
        let season = three_month_average(&monthly, month)?;

        if !season.is_finite() {
            return Err(AppError::NoClimateData);
        }

        Ok(WeatherReport { coordinate, season })
    }

    /// Rank crops for the given soil and seasonal weather, best first.
    pub fn recommend(&self, soil: &SoilProfile, weather: &SeasonalAverage) -> Result<Vec<RankedCrop>> {
        let features = FeatureVector::assemble(soil, weather);
        let named: Vec<String> = features
            .named()
            .map(|(name, value)| format!("{}={:.2}", name, value))
            .collect();
        debug!("Feature vector: {}", named.join(", "));

        let probabilities = self.classifier.predict_proba(&features)?;
        let ranked = rank_top(&probabilities, self.classifier.classes(), TOP_N);

        if let Some(best) = ranked.first() {
            info!(
                "Top recommendation: {} ({:.2}%)",
                best.crop,
                best.confidence * 100.0
            );
        }
        Ok(ranked)
    }
}
