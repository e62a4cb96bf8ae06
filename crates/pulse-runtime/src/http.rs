//! Shared HTTP plumbing for the adapters

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use pulse_core::{PulseError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client with the timeouts every provider call uses
pub fn client() -> Client {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Send a request and decode a successful JSON body.
///
/// Non-2xx statuses become `UpstreamStatus`; undecodable bodies become
/// `MalformedPayload`.
pub async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| PulseError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PulseError::UpstreamStatus {
            status: status.as_u16(),
            body: truncate(&body, 512),
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| PulseError::MalformedPayload(format!("undecodable response body: {e}")))
}

fn truncate(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}
