use crate::config::HttpConfig;
use crate::error::{AppError, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::warn;

/// Build the client shared by the geocoder and the climate archive client.
pub fn build_client(config: &HttpConfig) -> Result<Client> {
    let mut builder = Client::builder().user_agent(config.user_agent.as_str());

    if let Some(secs) = config.timeout_seconds {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    Ok(builder.build()?)
}

/// Retry a future with exponential backoff
///
/// `max_retries == 0` runs the request exactly once.
pub async fn retry_with_backoff<F, Fut, T>(max_retries: u32, mut f: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut retries = 0;
    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                retries += 1;

                if retries > max_retries || !is_transient(&e) {
                    return Err(e);
                }

                let delay = Duration::from_secs(2u64.pow(retries.saturating_sub(1)));
                warn!(
                    "Request failed (attempt {}/{}): {}. Retrying in {:?}...",
                    retries, max_retries, e, delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Connection errors, timeouts and 5xx responses are worth another attempt.
fn is_transient(e: &AppError) -> bool {
    match e {
        AppError::Http(reqwest_err) => {
            reqwest_err.is_timeout()
                || reqwest_err.is_connect()
                || reqwest_err
                    .status()
                    .map(|s| s.is_server_error())
                    .unwrap_or(false)
        }
        AppError::Io(_) => true,
        _ => false,
    }
}
