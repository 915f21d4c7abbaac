//! Link liveness checking for Linkvault.
//!
//! Issues one lightweight HTTP probe per URL, all probes concurrent with a
//! semaphore-bounded fan-out and a per-probe timeout. A batch call returns
//! only once every probe has resolved; network failures are verdicts, never
//! errors.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};
use url::Url;

/// Liveness verdict for a single URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The URL answered with a success or redirect status.
    Active,
    /// The URL answered with an error status, or the request failed outright.
    Dead,
    /// The probe did not resolve within the configured timeout.
    Timeout,
}

/// Tuning knobs for the validator, loadable from a JSON settings file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Per-probe timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum number of probes in flight at once.
    pub concurrency: usize,
    pub user_agent: String,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            concurrency: 16,
            user_agent: concat!("linkvault/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ValidatorConfig {
    /// Loads settings from a JSON file. A missing or malformed file falls
    /// back to the defaults so a bad settings file never blocks startup.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!("invalid validator settings, using defaults: {}", err);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }
}

/// Concurrent link validator backed by a shared `reqwest::Client`.
pub struct LinkValidator {
    client: Client,
    timeout: Duration,
    limiter: Arc<Semaphore>,
}

impl LinkValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(timeout)
            .build()
            .unwrap_or_else(|err| {
                warn!("falling back to default HTTP client: {}", err);
                Client::new()
            });
        Self {
            client,
            timeout,
            limiter: Arc::new(Semaphore::new(config.concurrency.max(1))),
        }
    }

    /// Probes every URL in the batch concurrently and blocks until the whole
    /// batch has resolved. Repeated URLs are probed once.
    pub async fn validate(&self, urls: Vec<String>) -> HashMap<String, Verdict> {
        let unique: HashSet<String> = urls.into_iter().collect();
        let mut tasks = JoinSet::new();
        for url in unique {
            let client = self.client.clone();
            let limiter = self.limiter.clone();
            let timeout = self.timeout;
            tasks.spawn(async move {
                // holds the slot for the duration of the probe; Err only if
                // the semaphore is closed, which never happens here
                let _permit = limiter.acquire_owned().await.ok();
                let verdict = probe(&client, &url, timeout).await;
                (url, verdict)
            });
        }

        let mut verdicts = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((url, verdict)) => {
                    debug!(url = %url, ?verdict, "probe finished");
                    verdicts.insert(url, verdict);
                }
                Err(err) => warn!("probe task aborted: {}", err),
            }
        }
        verdicts
    }
}

impl Default for LinkValidator {
    fn default() -> Self {
        Self::new(ValidatorConfig::default())
    }
}

/// One HEAD probe with a GET retry for servers that reject HEAD.
async fn probe(client: &Client, url: &str, timeout: Duration) -> Verdict {
    match tokio::time::timeout(timeout, client.head(url).send()).await {
        Err(_) => Verdict::Timeout,
        Ok(Err(err)) => {
            debug!(url = %url, "probe failed: {}", err);
            Verdict::Dead
        }
        Ok(Ok(response)) => {
            let status = response.status();
            if status == StatusCode::METHOD_NOT_ALLOWED || status == StatusCode::NOT_IMPLEMENTED {
                match tokio::time::timeout(timeout, client.get(url).send()).await {
                    Err(_) => Verdict::Timeout,
                    Ok(Err(_)) => Verdict::Dead,
                    Ok(Ok(retry)) => classify(retry.status()),
                }
            } else {
                classify(status)
            }
        }
    }
}

fn classify(status: StatusCode) -> Verdict {
    if status.is_success() || status.is_redirection() {
        Verdict::Active
    } else {
        Verdict::Dead
    }
}

/// True for URLs that point at the local machine. These are tagged
/// `localhost` by the store instead of being probed.
pub fn is_local_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    match parsed.host_str() {
        Some(host) => {
            host == "localhost"
                || host.ends_with(".localhost")
                || host == "127.0.0.1"
                || host == "[::1]"
                || host == "::1"
                || host == "0.0.0.0"
        }
        None => false,
    }
}
