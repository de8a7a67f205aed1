use crate::domain::ports::Publisher;
use crate::utils::error::{DiscountError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const X_TARGET: &str = "x";

#[derive(Debug, Serialize)]
struct TweetRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct TweetResponse {
    data: Option<TweetData>,
}

#[derive(Debug, Deserialize)]
struct TweetData {
    id: String,
}

/// X (Twitter) v2 發文，只發文字
pub struct XPublisher {
    client: Client,
    api_base: String,
    access_token: String,
    char_limit: usize,
}

impl XPublisher {
    pub fn new(
        api_base: &str,
        access_token: String,
        char_limit: usize,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_base: api_base.trim_end_matches('/').to_string(),
            access_token,
            char_limit,
        })
    }
}

#[async_trait]
impl Publisher for XPublisher {
    fn name(&self) -> &str {
        X_TARGET
    }

    fn char_limit(&self) -> usize {
        self.char_limit
    }

    async fn publish(&self, text: &str, image_url: Option<&str>) -> Result<()> {
        if image_url.is_some() {
            tracing::debug!("🖼️ X posts are text only, image skipped");
        }

        let response = self
            .client
            .post(format!("{}/2/tweets", self.api_base))
            .bearer_auth(&self.access_token)
            .json(&TweetRequest { text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DiscountError::PublishError {
                target: X_TARGET.to_string(),
                message: format!("status {}: {}", status.as_u16(), body),
            });
        }

        let tweet: TweetResponse = response.json().await?;
        match tweet.data {
            Some(data) => {
                tracing::debug!("🐦 Tweet id {}", data.id);
                Ok(())
            }
            None => Err(DiscountError::PublishError {
                target: X_TARGET.to_string(),
                message: "response has no tweet id".to_string(),
            }),
        }
    }
}
