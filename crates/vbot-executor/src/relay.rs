//! Atomic bundle submission.
//!
//! A bundle is a list of pre-built signed operations plus a tip payment,
//! submitted in one JSON-RPC `sendBundle` request. The relay either returns
//! one bundle id or an error; there is no retry and no partial id.

use crate::error::{BundleRelayError, ExecutorError, ExecutorResult, RelayResult};
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use vbot_core::{BoxFuture, Lamports, SignedOperation};
use vbot_telemetry::Metrics;

/// Fixed relay timeout.
pub const DEFAULT_RELAY_TIMEOUT: Duration = Duration::from_secs(30);

/// Default block-engine bundle endpoint.
pub const DEFAULT_RELAY_URL: &str = "https://mainnet.block-engine.jito.wtf/api/v1/bundles";

/// A bundle to submit. Transient.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleRequest {
    pub operations: Vec<SignedOperation>,
    pub tip_account: Pubkey,
    pub tip_amount: Lamports,
}

/// Relay acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleReceipt {
    pub bundle_id: String,
    #[serde(default)]
    pub transactions: Vec<String>,
}

/// Block-space auction relay.
pub trait BundleRelay: Send + Sync {
    /// Submit one bundle. Empty bundles are rejected before anything is sent.
    fn submit(&self, request: BundleRequest) -> BoxFuture<'_, RelayResult<BundleReceipt>>;
}

/// Arc wrapper for BundleRelay trait objects.
pub type DynBundleRelay = Arc<dyn BundleRelay>;

/// Submit through any relay, bounded by `timeout`, and record the outcome.
pub async fn submit_with_timeout(
    relay: &dyn BundleRelay,
    request: BundleRequest,
    timeout: Duration,
) -> RelayResult<BundleReceipt> {
    let operations = request.operations.len();
    let result = match tokio::time::timeout(timeout, relay.submit(request)).await {
        Ok(result) => result,
        Err(_) => Err(BundleRelayError::Timeout(timeout)),
    };
    match &result {
        Ok(receipt) => {
            Metrics::bundle_submitted("accepted");
            info!(bundle_id = %receipt.bundle_id, operations, "Bundle accepted");
        }
        Err(e) => {
            Metrics::bundle_submitted(e.outcome());
            warn!(error = %e, operations, "Bundle submission failed");
        }
    }
    result
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Serialize)]
struct SendBundleRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: SendBundleParams<'a>,
}

#[derive(Debug, Serialize)]
struct SendBundleParams<'a> {
    bundles: &'a [SignedOperation],
    tip_account: String,
    tip_amount: u64,
}

#[derive(Debug, Deserialize)]
struct SendBundleResponse {
    #[serde(default)]
    result: Option<BundleReceipt>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl SendBundleResponse {
    fn into_result(self) -> RelayResult<BundleReceipt> {
        if let Some(error) = self.error {
            return Err(BundleRelayError::Rejected {
                code: error.code,
                message: error.message,
            });
        }
        self.result.ok_or_else(|| {
            BundleRelayError::InvalidResponse("response has neither result nor error".to_string())
        })
    }
}

// ============================================================================
// JitoRelay
// ============================================================================

/// JSON-RPC bundle relay over HTTP.
pub struct JitoRelay {
    client: Client,
    url: String,
    timeout: Duration,
}

impl JitoRelay {
    /// Create a new relay client with the default 30 s timeout.
    pub fn new(url: impl Into<String>) -> ExecutorResult<Self> {
        Self::with_timeout(url, DEFAULT_RELAY_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> ExecutorResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExecutorError::HttpClient(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn send(&self, request: &BundleRequest) -> RelayResult<BundleReceipt> {
        let body = SendBundleRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "sendBundle",
            params: SendBundleParams {
                bundles: &request.operations,
                tip_account: request.tip_account.to_string(),
                tip_amount: request.tip_amount.inner(),
            },
        };

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BundleRelayError::Timeout(self.timeout)
                } else {
                    BundleRelayError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| BundleRelayError::Network(e.to_string()))?;

        // JSON-RPC errors may arrive with a non-2xx status; prefer the error object.
        match serde_json::from_str::<SendBundleResponse>(&text) {
            Ok(parsed) => parsed.into_result(),
            Err(_) if !status.is_success() => {
                Err(BundleRelayError::Network(format!("HTTP {status}: {text}")))
            }
            Err(e) => Err(BundleRelayError::InvalidResponse(e.to_string())),
        }
    }
}

impl BundleRelay for JitoRelay {
    fn submit(&self, request: BundleRequest) -> BoxFuture<'_, RelayResult<BundleReceipt>> {
        Box::pin(async move {
            if request.operations.is_empty() {
                return Err(BundleRelayError::EmptyBundle);
            }
            info!(
                url = %self.url,
                operations = request.operations.len(),
                tip = %request.tip_amount,
                "Submitting bundle"
            );
            match tokio::time::timeout(self.timeout, self.send(&request)).await {
                Ok(result) => result,
                Err(_) => Err(BundleRelayError::Timeout(self.timeout)),
            }
        })
    }
}

// ============================================================================
// MockRelay
// ============================================================================

/// Scripted relay for dry runs and tests.
#[derive(Debug)]
pub struct MockRelay {
    delay: Duration,
    submissions: Mutex<Vec<BundleRequest>>,
    next_error: Mutex<Option<BundleRelayError>>,
}

impl Default for MockRelay {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRelay {
    /// Create a mock relay that answers immediately.
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    /// Create a mock relay that answers after `delay`.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            submissions: Mutex::new(Vec::new()),
            next_error: Mutex::new(None),
        }
    }

    /// Fail the next submission with `error`.
    pub fn set_next_error(&self, error: BundleRelayError) {
        *self.next_error.lock() = Some(error);
    }

    /// Recorded submissions.
    pub fn submissions(&self) -> Vec<BundleRequest> {
        self.submissions.lock().clone()
    }
}

impl BundleRelay for MockRelay {
    fn submit(&self, request: BundleRequest) -> BoxFuture<'_, RelayResult<BundleReceipt>> {
        Box::pin(async move {
            if request.operations.is_empty() {
                return Err(BundleRelayError::EmptyBundle);
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let transactions = request
                .operations
                .iter()
                .map(|op| op.as_str().to_string())
                .collect();
            let n = {
                let mut submissions = self.submissions.lock();
                submissions.push(request);
                submissions.len()
            };
            if let Some(error) = self.next_error.lock().take() {
                return Err(error);
            }
            Ok(BundleReceipt {
                bundle_id: format!("mock-bundle-{n}"),
                transactions,
            })
        })
    }
}
