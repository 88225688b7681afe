use crate::domain::entities::{UpstreamChatReply, UpstreamChatRequest};
use crate::domain::ports::chat_provider::{ChatProvider, LyzrError};
use crate::infrastructure::observability::LYZR_REQUEST_DURATION;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{info, warn};

/// Longest upstream error body kept for logs.
const MAX_ERROR_BODY: usize = 500;

/// HTTP client for Lyzr inference endpoints.
///
/// One request per chat message with a fixed timeout; failures are
/// reported to the caller and never retried.
pub struct LyzrClient {
    http_client: Client,
    timeout: Duration,
}

impl LyzrClient {
    pub fn new(timeout: Duration) -> Result<Self, LyzrError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LyzrError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            timeout,
        })
    }
}

#[async_trait]
impl ChatProvider for LyzrClient {
    #[tracing::instrument(skip(self, api_key, request), fields(session_id = %request.session_id))]
    async fn send_message(
        &self,
        endpoint: &str,
        api_key: &str,
        request: &UpstreamChatRequest,
    ) -> Result<UpstreamChatReply, LyzrError> {
        let started = std::time::Instant::now();

        let response = self
            .http_client
            .post(endpoint)
            .header("Content-Type", "application/json")
            .header("x-api-key", api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    warn!("Lyzr call timed out after {:?}", self.timeout);
                    LyzrError::Timeout
                } else {
                    warn!("Lyzr call failed: {}", e);
                    LyzrError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        metrics::histogram!(LYZR_REQUEST_DURATION).record(started.elapsed().as_secs_f64());

        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            warn!("Lyzr returned status {}", status.as_u16());
            return Err(LyzrError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply = response
            .json::<UpstreamChatReply>()
            .await
            .map_err(|e| LyzrError::Decode(e.to_string()))?;

        info!(
            "Lyzr replied in {} ms",
            started.elapsed().as_millis()
        );
        Ok(reply)
    }
}
