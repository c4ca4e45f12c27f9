// SPDX-License-Identifier: Apache-2.0

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bijux_screen_model::{Endpoint, HttpMethod, Payload, Response, TransportFailure, TransportKind};
use tracing::{debug, instrument};

use crate::{wire, ProbeClient};

/// reqwest-backed probe client rooted at the service base URL.
pub struct HttpProbeClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpProbeClient {
    pub fn new(base_url: &str) -> Result<Self, String> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let parsed = reqwest::Url::parse(trimmed)
            .map_err(|e| format!("invalid base url `{base_url}`: {e}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(format!("base url must be http or https: {base_url}"));
        }
        if parsed.host_str().is_none() {
            return Err(format!("base url missing host: {base_url}"));
        }
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Ok(Self {
            base_url: trimmed.to_string(),
            client,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn url_for(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }
}

fn classify(err: &reqwest::Error) -> TransportKind {
    if err.is_timeout() {
        TransportKind::Timeout
    } else if err.is_connect() {
        TransportKind::Connect
    } else if err.is_body() || err.is_decode() {
        TransportKind::Body
    } else {
        TransportKind::Request
    }
}

#[async_trait]
impl ProbeClient for HttpProbeClient {
    fn backend_tag(&self) -> &'static str {
        "http"
    }

    #[instrument(
        name = "probe_http",
        skip(self, endpoint, payload),
        fields(endpoint = endpoint.as_str())
    )]
    async fn probe(
        &self,
        endpoint: Endpoint,
        payload: &Payload,
        timeout: Duration,
    ) -> Result<Response, TransportFailure> {
        let url = self.url_for(endpoint);
        let request = match endpoint.method() {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url).json(&payload.to_json()),
        };
        let started = Instant::now();
        let resp = request
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| TransportFailure::new(classify(&e), format!("{url}: {e}")))?;
        let code = resp.status().as_u16();
        let body = resp
            .bytes()
            .await
            .map_err(|e| {
                TransportFailure::new(classify(&e), format!("{url}: read body failed: {e}"))
            })?;
        let elapsed = started.elapsed();
        debug!(status = code, elapsed_ms = elapsed.as_millis() as u64, "probe answered");
        Ok(wire::normalize(endpoint, code, &body, elapsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_validated_and_trimmed() {
        let client =
            HttpProbeClient::new("http://127.0.0.1:8000/").unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(client.base_url(), "http://127.0.0.1:8000");
        assert_eq!(
            client.url_for(Endpoint::Behavioral),
            "http://127.0.0.1:8000/api/assessment/behavioral"
        );
        assert_eq!(client.url_for(Endpoint::ApiRoot), "http://127.0.0.1:8000/api/");
        assert!(HttpProbeClient::new("ftp://host").is_err());
        assert!(HttpProbeClient::new("not a url").is_err());
    }
}
