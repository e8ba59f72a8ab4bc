//! Remote bridge client
//!
//! A remote endpoint is a URL pasted by a human (typically a notebook tunnel).
//! There is no handshake and no credential: possession of the URL is the only
//! trust, and an expired notebook simply stops answering. `connect` probes the
//! URL once; `submit` forwards one generation and waits for the video.
//!
//! A `submit` that times out or is cancelled does not stop the remote side; the
//! remote host may still finish a video nobody collects. Sessions stay usable
//! after such failures.

use crate::config::RemoteConfig;
use crate::orchestrator::{CancelToken, GenerationRequest, GenerationResult, GenerationStatus};
use crate::remote::protocol::{ErrorBody, RunRequest, PROBE_PATH, RUN_PATH};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

static SCHEME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://").unwrap());

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectError {
    #[error("no remote URL given")]
    InvalidUrl(String),

    #[error("remote endpoint {url} is unreachable: {detail}")]
    Unreachable { url: String, detail: String },

    #[error("remote endpoint {url} did not answer within {after:?}")]
    Timeout { url: String, after: Duration },
}

impl ConnectError {
    pub fn kind(&self) -> &'static str {
        match self {
            ConnectError::InvalidUrl(_) => "invalid_url",
            ConnectError::Unreachable { .. } => "unreachable",
            ConnectError::Timeout { .. } => "timeout",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmitError {
    #[error("remote generation did not finish within {0:?}")]
    Timeout(Duration),

    #[error("remote host rejected the request ({status}): {detail}")]
    RemoteRejected { status: u16, detail: String },

    #[error("lost connection to remote host: {0}")]
    Transport(String),

    #[error("stopped waiting for the remote host")]
    Cancelled,

    #[error("could not save remote video: {0}")]
    Output(String),
}

impl SubmitError {
    pub fn kind(&self) -> &'static str {
        match self {
            SubmitError::Timeout(_) => "timeout",
            SubmitError::RemoteRejected { .. } => "remote_rejected",
            SubmitError::Transport(_) => "transport",
            SubmitError::Cancelled => "cancelled",
            SubmitError::Output(_) => "output",
        }
    }

    /// The remote host is alive but occupied with another generation
    pub fn is_busy(&self) -> bool {
        match self {
            SubmitError::RemoteRejected { status, detail } => {
                *status == 409 || *status == 429 || detail.to_lowercase().contains("queue")
            }
            _ => false,
        }
    }
}

/// A pasted URL plus when we expect it to stop working
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteEndpoint {
    pub url: String,
    pub connected_at: DateTime<Utc>,
    /// Informational only; nothing enforces it
    pub expiry_estimate: DateTime<Utc>,
}

/// Validated handle to a remote host
#[derive(Debug, Clone)]
pub struct Session {
    endpoint: RemoteEndpoint,
}

impl Session {
    pub fn endpoint(&self) -> &RemoteEndpoint {
        &self.endpoint
    }

    pub fn url(&self) -> &str {
        &self.endpoint.url
    }

    pub fn probably_expired(&self) -> bool {
        Utc::now() >= self.endpoint.expiry_estimate
    }
}

/// Normalise a pasted URL: trim, default to https, drop trailing slashes
pub fn normalize_url(raw: &str) -> Result<String, ConnectError> {
    let url = raw.trim();
    if url.is_empty() {
        return Err(ConnectError::InvalidUrl(raw.to_string()));
    }
    let url = if SCHEME.is_match(url) {
        url.to_string()
    } else {
        format!("https://{}", url)
    };
    Ok(url.trim_end_matches('/').to_string())
}

#[derive(Debug, Clone)]
pub struct RemoteBridge {
    client: reqwest::Client,
    probe_timeout: Duration,
    submit_timeout: Duration,
    session_lifetime: chrono::Duration,
}

impl RemoteBridge {
    pub fn new(config: &RemoteConfig) -> Self {
        Self::with_timeouts(config.probe_timeout(), config.submit_timeout())
            .with_session_lifetime(config.session_lifetime())
    }

    pub fn with_timeouts(probe_timeout: Duration, submit_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("veda/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            probe_timeout,
            submit_timeout,
            session_lifetime: chrono::Duration::hours(72),
        }
    }

    pub fn with_session_lifetime(mut self, lifetime: chrono::Duration) -> Self {
        self.session_lifetime = lifetime;
        self
    }

    /// Probe `raw_url` once. No retries: a dead URL usually means the notebook
    /// expired or has not started, which only the user can fix.
    pub async fn connect(&self, raw_url: &str) -> Result<Session, ConnectError> {
        let url = normalize_url(raw_url)?;
        let probe = format!("{}{}", url, PROBE_PATH);

        let response = self
            .client
            .get(&probe)
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ConnectError::Timeout {
                        url: url.clone(),
                        after: self.probe_timeout,
                    }
                } else {
                    ConnectError::Unreachable {
                        url: url.clone(),
                        detail: e.to_string(),
                    }
                }
            })?;

        if !response.status().is_success() {
            return Err(ConnectError::Unreachable {
                url,
                detail: format!("probe answered {}", response.status()),
            });
        }

        let connected_at = Utc::now();
        info!(url = %url, "connected to remote endpoint");
        Ok(Session {
            endpoint: RemoteEndpoint {
                url,
                connected_at,
                expiry_estimate: connected_at
                    .checked_add_signed(self.session_lifetime)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC),
            },
        })
    }

    /// Forward one generation and store the returned video at `request.output_path`.
    ///
    /// `request.prompt` is sent as-is; callers enhance beforehand and set
    /// `request.enhance = false` so the host does not enhance again.
    pub async fn submit(
        &self,
        session: &Session,
        request: &GenerationRequest,
        cancel: &CancelToken,
    ) -> Result<GenerationResult, SubmitError> {
        let started = Instant::now();
        let url = format!("{}{}", session.url(), RUN_PATH);
        let body = RunRequest::from_request(request);

        let call = async {
            let response = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| self.transport_error(e))?;

            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                let detail = serde_json::from_str::<ErrorBody>(&text)
                    .map(|b| b.detail)
                    .unwrap_or(text);
                return Err(SubmitError::RemoteRejected {
                    status: status.as_u16(),
                    detail,
                });
            }

            response.bytes().await.map_err(|e| self.transport_error(e))
        };

        let bytes = tokio::select! {
            outcome = tokio::time::timeout(self.submit_timeout, call) => match outcome {
                Ok(result) => result?,
                Err(_) => {
                    warn!(url = %url, "remote generation timed out; the remote job is left running");
                    return Err(SubmitError::Timeout(self.submit_timeout));
                }
            },
            _ = cancel.cancelled() => return Err(SubmitError::Cancelled),
        };

        if let Some(parent) = request.output_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SubmitError::Output(e.to_string()))?;
        }
        tokio::fs::write(&request.output_path, &bytes)
            .await
            .map_err(|e| SubmitError::Output(e.to_string()))?;

        info!(
            url = %session.url(),
            bytes = bytes.len(),
            path = %request.output_path.display(),
            "remote video received"
        );

        Ok(GenerationResult {
            status: GenerationStatus::Ok,
            video_path: Some(request.output_path.clone()),
            error_detail: None,
            prompt: request.prompt.clone(),
            config: None,
            tier: None,
            notices: Vec::new(),
            target: format!("remote ({})", session.url()),
            elapsed_secs: started.elapsed().as_secs_f64(),
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> SubmitError {
        if e.is_timeout() {
            SubmitError::Timeout(self.submit_timeout)
        } else {
            SubmitError::Transport(e.to_string())
        }
    }
}
