//! Forward geocoding of free-text place names via the OpenWeatherMap
//! direct geocoding endpoint.

use crate::config::GeocodingConfig;
use crate::error::{AppError, Result};
use crate::http::retry_with_backoff;
use crate::models::Coordinate;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct GeocodeMatch {
    lat: f64,
    lon: f64,
}

pub struct Geocoder {
    client: Client,
    base_url: String,
    api_key: String,
    retries: u32,
}

impl Geocoder {
    pub fn new(client: Client, config: &GeocodingConfig, retries: u32) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            retries,
        }
    }

    /// Resolve `place` to the provider's single best match.
    ///
    /// An empty result set and a non-success status (bad key, quota) are both
    /// reported as `LocationNotFound`.
    pub async fn resolve(&self, place: &str) -> Result<Coordinate> {
        debug!("Geocoding '{}' via {}", place, self.base_url);

        let matches =
            match retry_with_backoff(self.retries, || async move { self.lookup(place).await })
                .await
            {
                Ok(matches) => matches,
                Err(AppError::Http(e)) if e.status().is_some() => {
                    warn!("Geocoding service failed for '{}': {}", place, e);
                    Vec::new()
                }
                Err(e) => return Err(e),
            };

        let best = matches.into_iter().next().ok_or_else(|| {
            warn!("Invalid city name or API key for '{}'", place);
            AppError::LocationNotFound(place.to_string())
        })?;

        let coordinate = Coordinate {
            latitude: best.lat,
            longitude: best.lon,
        };
        info!(
            "Location: {} -> lat: {}, lon: {}",
            place, coordinate.latitude, coordinate.longitude
        );
        Ok(coordinate)
    }

    async fn lookup(&self, place: &str) -> Result<Vec<GeocodeMatch>> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", place), ("limit", "1"), ("appid", self.api_key.as_str())])
            .send()
            .await?;

        if let Err(e) = response.error_for_status_ref() {
            if response.status().is_server_error() {
                return Err(e.into());
            }
            warn!(
                "Geocoding service returned status {} for '{}'",
                response.status(),
                place
            );
            return Ok(Vec::new());
        }

        let body = response.text().await?;
        serde_json::from_str::<Vec<GeocodeMatch>>(&body).or_else(|e| {
            warn!("Unexpected geocoding response for '{}': {}", place, e);
            Ok(Vec::new())
        })
    }
}
