//! Best-effort remote consent reporting.
//!
//! Fire-and-forget POST of a decision to a reporting endpoint. The request
//! runs detached on the current tokio runtime; its outcome is logged and
//! discarded. No retries, no timeouts beyond the client's transport defaults,
//! and no path by which a reporting failure can reach the consent state.

use std::sync::Arc;

use log::{debug, warn};
use serde::Serialize;
use url::Url;

use crate::decision::ConsentDecision;
use crate::errors::ConsentError;

/// Anti-forgery token header expected by the reporting endpoint.
const CSRF_HEADER: &str = "X-CSRFToken";

/// Supplies the anti-forgery token, typically sourced from page-level
/// metadata. `None` sends the report without the header.
pub trait TokenSource: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// Report payload as expected by the consent endpoint.
#[derive(Debug, Serialize, PartialEq)]
pub struct ConsentReport<'a> {
    consent_type: &'a str,
    analytics_enabled: bool,
    timestamp: String,
}

impl<'a> ConsentReport<'a> {
    pub fn from_decision(decision: &'a ConsentDecision) -> Self {
        Self {
            consent_type: decision.category().as_str(),
            analytics_enabled: decision.analytics_enabled(),
            timestamp: decision.decided_at_rfc3339(),
        }
    }
}

/// Detached reporter for recorded decisions.
pub struct RemoteSync {
    client: reqwest::Client,
    endpoint: Url,
    tokens: Arc<dyn TokenSource>,
}

impl RemoteSync {
    pub fn new(endpoint: Url, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            tokens,
        }
    }

    /// Reports `decision` without waiting for the outcome.
    ///
    /// Spawns onto the current tokio runtime; when called outside a runtime
    /// the report is skipped (and logged), since blocking the caller would
    /// violate the fire-and-forget contract.
    pub fn report(&self, decision: &ConsentDecision) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                debug!("no async runtime available, consent report skipped");
                return;
            }
        };

        let report = ConsentReport::from_decision(decision);
        let mut request = self.client.post(self.endpoint.clone()).json(&report);
        if let Some(token) = self.tokens.token() {
            request = request.header(CSRF_HEADER, token);
        }

        handle.spawn(async move {
            match request.send().await {
                Ok(resp) if resp.status().is_success() => {
                    debug!("consent report delivered: {}", resp.status());
                }
                Ok(resp) => {
                    warn!("{}", ConsentError::ReportingFailure(resp.status().to_string()));
                }
                Err(e) => {
                    warn!("{}", ConsentError::ReportingFailure(e.to_string()));
                }
            }
        });
    }
}
