// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bijux_screen_model::{Endpoint, Payload, Response, TransportFailure};

mod http;
mod retry;
pub mod wire;

pub use http::HttpProbeClient;
pub use retry::{RetryPolicy, RetryingProbe};

pub const CRATE_NAME: &str = "bijux-screen-adapters";

/// Sends a single request to one assessment endpoint.
///
/// Implementations never retry on their own; compose [`RetryingProbe`] for that.
/// Any answered HTTP exchange is `Ok`, whatever its status code.
#[async_trait]
pub trait ProbeClient: Send + Sync + 'static {
    fn backend_tag(&self) -> &'static str {
        "unknown"
    }

    async fn probe(
        &self,
        endpoint: Endpoint,
        payload: &Payload,
        timeout: Duration,
    ) -> Result<Response, TransportFailure>;
}

#[async_trait]
impl<P: ProbeClient + ?Sized> ProbeClient for Arc<P> {
    fn backend_tag(&self) -> &'static str {
        (**self).backend_tag()
    }

    async fn probe(
        &self,
        endpoint: Endpoint,
        payload: &Payload,
        timeout: Duration,
    ) -> Result<Response, TransportFailure> {
        (**self).probe(endpoint, payload, timeout).await
    }
}
