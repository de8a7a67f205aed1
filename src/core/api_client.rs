use crate::core::retry::{FailureKind, RetryPolicy};
use crate::core::signing::RequestSigner;
use crate::utils::error::{DiscountError, Result};
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiOperation {
    SearchItems,
    GetItems,
}

impl ApiOperation {
    pub fn name(&self) -> &'static str {
        match self {
            ApiOperation::SearchItems => "SearchItems",
            ApiOperation::GetItems => "GetItems",
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            ApiOperation::SearchItems => "/paapi5/searchitems",
            ApiOperation::GetItems => "/paapi5/getitems",
        }
    }
}

/// 回應中的 `Errors` 欄位
#[derive(Debug, Deserialize)]
struct ApiErrorEntry {
    #[serde(rename = "Code", default)]
    code: String,
    #[serde(rename = "Message", default)]
    message: String,
}

/// 簽章並可重試的 PA-API 客戶端。呼叫端只會拿到完整的回應或最終失敗。
pub struct SignedApiClient {
    client: Client,
    base_url: String,
    host: String,
    signer: RequestSigner,
    retry: RetryPolicy,
}

impl SignedApiClient {
    pub fn new(
        base_url: &str,
        signer: RequestSigner,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Result<Self> {
        let parsed = Url::parse(base_url).map_err(|e| DiscountError::InvalidConfigValueError {
            field: "marketplace.base_url".to_string(),
            value: base_url.to_string(),
            reason: format!("Invalid URL format: {}", e),
        })?;
        let host = match (parsed.host_str(), parsed.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(DiscountError::InvalidConfigValueError {
                    field: "marketplace.base_url".to_string(),
                    value: base_url.to_string(),
                    reason: "URL has no host".to_string(),
                })
            }
        };

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            host,
            signer,
            retry,
        })
    }

    /// 呼叫 API，依重試策略處理 429、非 200、傳輸錯誤、格式錯誤與 `Errors` 回應
    pub async fn call(
        &self,
        operation: ApiOperation,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let body = serde_json::to_string(payload)?;
        let attempts = self.retry.attempts();
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            let (kind, error) = match self.attempt(operation, &body).await {
                Ok(value) => return Ok(value),
                Err(failure) => failure,
            };

            tracing::warn!(
                "⚠️ {} attempt {}/{} failed: {}",
                operation.name(),
                attempt,
                attempts,
                error
            );
            last_error = error.to_string();

            if let Some(delay) = self.retry.delay_after(attempt, kind) {
                tracing::debug!("⏳ {}: waiting {:?} before retry", operation.name(), delay);
                tokio::time::sleep(delay).await;
            }
        }

        tracing::error!(
            "❌ {} gave up after {} attempts",
            operation.name(),
            attempts
        );
        Err(DiscountError::RetriesExhausted {
            operation: operation.name().to_string(),
            attempts,
            last_error,
        })
    }

    /// 單次嘗試。每次都重新簽章，因為簽章只在短時間內有效。
    async fn attempt(
        &self,
        operation: ApiOperation,
        body: &str,
    ) -> std::result::Result<serde_json::Value, (FailureKind, DiscountError)> {
        let signed = self
            .signer
            .sign(&self.host, operation.path(), operation.name(), body, Utc::now())
            .map_err(|e| (FailureKind::Transient, e))?;

        let url = format!("{}{}", self.base_url, operation.path());
        let mut request = self.client.post(&url).body(body.to_string());
        for (key, value) in &signed.headers {
            // reqwest 依 URL 自動帶入 host
            if key != "host" {
                request = request.header(key.as_str(), value.as_str());
            }
        }

        tracing::debug!("📡 {} -> {}", operation.name(), url);
        let response = request
            .send()
            .await
            .map_err(|e| (FailureKind::Transient, DiscountError::from(e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| (FailureKind::Transient, DiscountError::from(e)))?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err((
                FailureKind::RateLimited,
                DiscountError::ApiStatusError {
                    status: status.as_u16(),
                    body: text,
                },
            ));
        }
        if status != StatusCode::OK {
            return Err((
                FailureKind::Transient,
                DiscountError::ApiStatusError {
                    status: status.as_u16(),
                    body: text,
                },
            ));
        }

        let value: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
            (
                FailureKind::Transient,
                DiscountError::MalformedResponse {
                    message: format!("{} (body: {})", e, truncate_for_log(&text)),
                },
            )
        })?;

        if let Some(errors) = value.get("Errors") {
            let entries: Vec<ApiErrorEntry> =
                serde_json::from_value(errors.clone()).unwrap_or_default();
            let messages: Vec<String> = if entries.is_empty() {
                vec![errors.to_string()]
            } else {
                entries
                    .iter()
                    .map(|entry| format!("{}: {}", entry.code, entry.message))
                    .collect()
            };
            for message in &messages {
                tracing::error!("❌ {} API error: {}", operation.name(), message);
            }
            return Err((FailureKind::Transient, DiscountError::ApiErrors { messages }));
        }

        Ok(value)
    }
}

fn truncate_for_log(text: &str) -> String {
    text.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client_for(server: &MockServer, attempts: u32) -> SignedApiClient {
        SignedApiClient::new(
            &server.base_url(),
            RequestSigner::new("AKID", "secret", "us-west-2"),
            RetryPolicy::immediate(attempts),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_call_sends_signed_request() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/paapi5/getitems")
                .header(
                    "x-amz-target",
                    "com.amazon.paapi5.v1.ProductAdvertisingAPIv1.GetItems",
                )
                .header("content-encoding", "amz-1.0")
                .header_exists("authorization")
                .header_exists("x-amz-date")
                .json_body(serde_json::json!({"ItemIds": ["B000TEST01"]}));
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"ItemsResult": {"Items": []}}));
        });

        let client = client_for(&server, 3);
        let value = client
            .call(
                ApiOperation::GetItems,
                &serde_json::json!({"ItemIds": ["B000TEST01"]}),
            )
            .await
            .unwrap();

        api_mock.assert();
        assert!(value.get("ItemsResult").is_some());
    }

    #[tokio::test]
    async fn test_rate_limit_retries_until_exhausted() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/paapi5/searchitems");
            then.status(429).body("Too Many Requests");
        });

        let client = client_for(&server, 3);
        let err = client
            .call(ApiOperation::SearchItems, &serde_json::json!({}))
            .await
            .unwrap_err();

        api_mock.assert_hits(3);
        match err {
            DiscountError::RetriesExhausted {
                operation,
                attempts,
                last_error,
            } => {
                assert_eq!(operation, "SearchItems");
                assert_eq!(attempts, 3);
                assert!(last_error.contains("429"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/paapi5/getitems");
            then.status(503);
        });

        let client = client_for(&server, 2);
        let result = client
            .call(ApiOperation::GetItems, &serde_json::json!({}))
            .await;

        api_mock.assert_hits(2);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_errors_field_is_retried_then_fails() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/paapi5/getitems");
            then.status(200).json_body(serde_json::json!({
                "Errors": [{"Code": "InvalidParameterValue", "Message": "bad ASIN"}]
            }));
        });

        let client = client_for(&server, 3);
        let err = client
            .call(ApiOperation::GetItems, &serde_json::json!({}))
            .await
            .unwrap_err();

        api_mock.assert_hits(3);
        assert!(err.to_string().contains("InvalidParameterValue: bad ASIN"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_retried() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/paapi5/searchitems");
            then.status(200).body("<html>not json</html>");
        });

        let client = client_for(&server, 3);
        let err = client
            .call(ApiOperation::SearchItems, &serde_json::json!({}))
            .await
            .unwrap_err();

        api_mock.assert_hits(3);
        assert!(err.to_string().contains("Malformed response"));
    }

    #[tokio::test]
    async fn test_connection_failure_is_retried_until_exhausted() {
        // a port nobody listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = SignedApiClient::new(
            &format!("http://127.0.0.1:{}", port),
            RequestSigner::new("AKID", "secret", "us-west-2"),
            RetryPolicy::immediate(3),
            Duration::from_secs(2),
        )
        .unwrap();

        let err = client
            .call(ApiOperation::GetItems, &serde_json::json!({}))
            .await
            .unwrap_err();

        match err {
            DiscountError::RetriesExhausted {
                attempts,
                last_error,
                ..
            } => {
                assert_eq!(attempts, 3);
                assert!(!last_error.is_empty());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rate_limit_waits_with_exponential_backoff() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/paapi5/searchitems");
            then.status(429);
        });

        let client = SignedApiClient::new(
            &server.base_url(),
            RequestSigner::new("AKID", "secret", "us-west-2"),
            RetryPolicy::new(3, Duration::from_millis(100), 3.0),
            Duration::from_secs(5),
        )
        .unwrap();

        let started = std::time::Instant::now();
        let result = client
            .call(ApiOperation::SearchItems, &serde_json::json!({}))
            .await;
        let elapsed = started.elapsed();

        api_mock.assert_hits(3);
        assert!(result.is_err());
        // 100ms + 300ms; a constant delay would only wait 200ms
        assert!(elapsed >= Duration::from_millis(400), "elapsed {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_server_error_waits_constant_delay() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/paapi5/getitems");
            then.status(503);
        });

        let client = SignedApiClient::new(
            &server.base_url(),
            RequestSigner::new("AKID", "secret", "us-west-2"),
            RetryPolicy::new(3, Duration::from_millis(100), 3.0),
            Duration::from_secs(5),
        )
        .unwrap();

        let started = std::time::Instant::now();
        let result = client
            .call(ApiOperation::GetItems, &serde_json::json!({}))
            .await;

        assert!(result.is_err());
        assert!(started.elapsed() >= Duration::from_millis(200));
    }

    #[test]
    fn test_rejects_base_url_without_host() {
        let result = SignedApiClient::new(
            "not a url",
            RequestSigner::new("a", "b", "us-west-2"),
            RetryPolicy::default(),
            Duration::from_secs(1),
        );
        assert!(result.is_err());
    }
}
