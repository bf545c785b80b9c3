#![allow(dead_code)]

use agrocast::climate::ClimateClient;
use agrocast::config::{ClimateConfig, GeocodingConfig};
use agrocast::geocoder::Geocoder;
use agrocast::model::ModelArtifacts;
use agrocast::pipeline::Recommender;
use chrono::{Duration, NaiveDate};
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::MockServer;

pub const GEOCODE_PATH: &str = "/geo/1.0/direct";
pub const ARCHIVE_PATH: &str = "/v1/archive";
pub const API_KEY: &str = "test-key";

/// Softmax over constant logits: rice 0.5, maize 0.3, jute 0.2 for any input.
pub const UNCERTAIN_MODEL: &str = r#"{
    "scaler": {
        "mean": [50.55, 53.36, 48.15, 25.62, 71.48, 6.47, 103.46],
        "scale": [36.92, 32.99, 50.65, 5.06, 22.26, 0.77, 54.96]
    },
    "encoder": {"classes": ["rice", "maize", "jute"]},
    "network": {"layers": [{
        "weights": [[0,0,0,0,0,0,0],[0,0,0,0,0,0,0],[0,0,0,0,0,0,0]],
        "bias": [-0.6931471805599453, -1.2039728043259361, -1.6094379124341003],
        "activation": "softmax"
    }]}
}"#;

/// Softmax over constant logits: rice 0.85, maize 0.10, jute 0.05.
pub const CONFIDENT_MODEL: &str = r#"{
    "scaler": {
        "mean": [0, 0, 0, 0, 0, 0, 0],
        "scale": [1, 1, 1, 1, 1, 1, 1]
    },
    "encoder": {"classes": ["rice", "maize", "jute"]},
    "network": {"layers": [{
        "weights": [[0,0,0,0,0,0,0],[0,0,0,0,0,0,0],[0,0,0,0,0,0,0]],
        "bias": [-0.16251892949777494, -2.3025850929940455, -2.995732273553991],
        "activation": "softmax"
    }]}
}"#;

pub fn recommender(server: &MockServer, model_json: &str) -> Recommender {
    recommender_at(
        &format!("{}{}", server.uri(), GEOCODE_PATH),
        &format!("{}{}", server.uri(), ARCHIVE_PATH),
        API_KEY,
        model_json,
    )
}

/// Recommender wired to arbitrary service URLs, without retries.
pub fn recommender_at(
    geocode_url: &str,
    archive_url: &str,
    api_key: &str,
    model_json: &str,
) -> Recommender {
    let client = reqwest::Client::new();
    let geocoder = Geocoder::new(
        client.clone(),
        &GeocodingConfig {
            base_url: geocode_url.to_string(),
            api_key: api_key.to_string(),
        },
        0,
    );
    let climate = ClimateClient::new(
        client,
        &ClimateConfig {
            base_url: archive_url.to_string(),
        },
        0,
    );
    let model = ModelArtifacts::from_json(model_json).expect("test model should load");

    Recommender::new(geocoder, climate, Arc::new(model))
}

/// Archive response with identical readings on every day from `start` to `end`.
pub fn daily_archive(
    start: NaiveDate,
    end: NaiveDate,
    rain: f64,
    tmax: f64,
    tmin: f64,
    humidity: f64,
) -> Value {
    let mut time = Vec::new();
    let mut day = start;
    while day <= end {
        time.push(day.format("%Y-%m-%d").to_string());
        day += Duration::days(1);
    }
    let n = time.len();
    let precipitation = vec![rain; n];
    let temp_max = vec![tmax; n];
    let temp_min = vec![tmin; n];
    let humidity_mean = vec![humidity; n];

    json!({
        "latitude": 28.625,
        "longitude": 77.25,
        "timezone": "Asia/Kolkata",
        "daily_units": {"time": "iso8601"},
        "daily": {
            "time": time,
            "precipitation_sum": precipitation,
            "temperature_2m_max": temp_max,
            "temperature_2m_min": temp_min,
            "relative_humidity_2m_mean": humidity_mean,
        }
    })
}

pub fn delhi() -> Value {
    json!([{
        "name": "Delhi",
        "lat": 28.6517178,
        "lon": 77.2219388,
        "country": "IN",
        "state": "Delhi"
    }])
}
