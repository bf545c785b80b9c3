//! REST surface for the recommendation pipeline.

use crate::error::AppError;
use crate::features::SoilProfile;
use crate::pipeline::Recommender;
use crate::recommend::RankedCrop;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

pub const HEALTH_MESSAGE: &str = "Agrocast crop recommendation API is working!";

#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendParams {
    #[serde(rename = "N")]
    pub nitrogen: f64,
    #[serde(rename = "P")]
    pub phosphorus: f64,
    #[serde(rename = "K")]
    pub potassium: f64,
    pub ph: f64,
    pub city: String,
    pub month: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WeatherBody {
    pub temperature: f64,
    pub humidity: f64,
    pub rainfall: f64,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub weather: WeatherBody,
    pub top_3_crops: Vec<RankedCrop>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::LocationNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidMonth(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::MissingPrerequisite => StatusCode::CONFLICT,
            AppError::NoClimateData | AppError::Http(_) | AppError::Parse(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::InvalidData(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_) | AppError::Io(_) | AppError::Model(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }

        (
            status,
            Json(ErrorBody {
                error: self.user_message(),
            }),
        )
            .into_response()
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(home))
        .route("/recommend_crop", post(recommend_crop))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn home() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: HEALTH_MESSAGE.to_string(),
    })
}

async fn recommend_crop(
    State(state): State<AppState>,
    query: Result<Query<RecommendParams>, QueryRejection>,
) -> Result<Json<RecommendResponse>, AppError> {
    let Query(params) = query.map_err(|rejection| AppError::InvalidData(rejection.body_text()))?;

    let report = state
        .recommender
        .fetch_weather(&params.city, &params.month)
        .await?;

    let soil = SoilProfile {
        nitrogen: params.nitrogen,
        phosphorus: params.phosphorus,
        potassium: params.potassium,
        ph: params.ph,
    };
    let top_3_crops = state.recommender.recommend(&soil, &report.season)?;

    Ok(Json(RecommendResponse {
        weather: WeatherBody {
            temperature: report.season.avg_temp_c,
            humidity: report.season.avg_humidity_pct,
            rainfall: report.season.avg_rainfall_mm,
        },
        top_3_crops,
    }))
}
