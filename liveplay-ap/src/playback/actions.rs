//! Fire-and-forget HTTP custom actions
//!
//! The engine hands requests to an [`ActionDispatcher`] and moves on;
//! dispatch never blocks cue start/stop and failures never reach playback
//! state.

use liveplay_common::model::{ContentType, HttpMethod, HttpRequest};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Sends custom-action HTTP requests
pub trait ActionDispatcher: Send {
    fn dispatch(&self, request: HttpRequest);
}

/// reqwest-backed dispatcher; each request runs on its own tokio task
#[derive(Clone)]
pub struct HttpActionDispatcher {
    client: reqwest::Client,
}

impl HttpActionDispatcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    fn build(&self, request: &HttpRequest) -> reqwest::RequestBuilder {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };
        let builder = self.client.request(method, &request.url);

        match (&request.body, request.content_type) {
            (None, _) => builder,
            (Some(body), ContentType::Json) => builder.json(body),
            (Some(_), ContentType::Form) => builder.form(&request.form_fields()),
        }
    }
}

impl ActionDispatcher for HttpActionDispatcher {
    fn dispatch(&self, request: HttpRequest) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(
                "No async runtime, dropping {} {}",
                request.method.as_str(),
                request.url
            );
            return;
        };

        let pending = self.build(&request);
        runtime.spawn(async move {
            match pending.send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(
                        "Custom action {} {} -> {}",
                        request.method.as_str(),
                        request.url,
                        response.status()
                    );
                }
                Ok(response) => {
                    warn!(
                        "Custom action {} {} returned {}",
                        request.method.as_str(),
                        request.url,
                        response.status()
                    );
                }
                Err(e) => {
                    warn!(
                        "Custom action {} {} failed: {}",
                        request.method.as_str(),
                        request.url,
                        e
                    );
                }
            }
        });
    }
}

/// Dispatcher that only records requests
///
/// Used by `--dry-run` style setups and tests; clones share one log.
#[derive(Debug, Clone, Default)]
pub struct RecordingDispatcher {
    sent: Arc<Mutex<Vec<HttpRequest>>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<HttpRequest> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl ActionDispatcher for RecordingDispatcher {
    fn dispatch(&self, request: HttpRequest) {
        debug!("Recorded custom action {} {}", request.method.as_str(), request.url);
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);
    }
}
