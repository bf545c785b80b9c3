use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request error: {0}")]
    Http(reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("No climate data available for this location")]
    NoClimateData,

    #[error("Invalid month name: {0}")]
    InvalidMonth(String),

    #[error("Weather data has not been fetched")]
    MissingPrerequisite,
}

impl From<reqwest::Error> for AppError {
    /// Request URLs carry the geocoding key as a query parameter, so they never
    /// make it into an `AppError`.
    fn from(err: reqwest::Error) -> Self {
        AppError::Http(err.without_url())
    }
}

impl AppError {
    /// Message shown to the person asking for a recommendation.
    pub fn user_message(&self) -> String {
        match self {
            AppError::LocationNotFound(_) => "Invalid city name!".to_string(),
            AppError::NoClimateData => {
                "Could not fetch weather data. Try a nearby city.".to_string()
            }
            AppError::InvalidMonth(_) => {
                "Invalid month name. Please try again (e.g., May, July, September).".to_string()
            }
            AppError::MissingPrerequisite => "Please fetch weather data first!".to_string(),
            AppError::Http(_) => {
                "Weather services are unreachable. Please try again later.".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_http_error_drops_request_url() {
        let err = reqwest::Client::new()
            .get("http://127.0.0.1:1/geo?q=Delhi&appid=SECRET-KEY")
            .send()
            .await
            .unwrap_err();

        let app_err = AppError::from(err);
        assert!(!app_err.to_string().contains("SECRET-KEY"));
        assert!(!format!("{:?}", app_err).contains("SECRET-KEY"));
        assert!(!app_err.user_message().contains("SECRET-KEY"));
    }
}
