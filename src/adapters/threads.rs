use crate::domain::ports::Publisher;
use crate::utils::error::{DiscountError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;

pub const THREADS_TARGET: &str = "threads";

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: Option<String>,
}

/// Threads 發文：先建立容器，再發佈
pub struct ThreadsPublisher {
    client: Client,
    api_base: String,
    user_id: String,
    access_token: String,
    char_limit: usize,
}

impl ThreadsPublisher {
    pub fn new(
        api_base: &str,
        user_id: String,
        access_token: String,
        char_limit: usize,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_base: api_base.trim_end_matches('/').to_string(),
            user_id,
            access_token,
            char_limit,
        })
    }

    async fn create_container(&self, text: &str, image_url: Option<&str>) -> Result<String> {
        let mut query: Vec<(&str, &str)> = vec![
            ("text", text),
            ("access_token", self.access_token.as_str()),
        ];
        match image_url {
            Some(url) => {
                query.push(("media_type", "IMAGE"));
                query.push(("image_url", url));
            }
            None => query.push(("media_type", "TEXT")),
        }

        let response = self
            .client
            .post(format!("{}/{}/threads", self.api_base, self.user_id))
            .query(&query)
            .send()
            .await?;

        extract_id(response, "create container").await
    }

    async fn publish_container(&self, creation_id: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/{}/threads_publish", self.api_base, self.user_id))
            .query(&[
                ("creation_id", creation_id),
                ("access_token", self.access_token.as_str()),
            ])
            .send()
            .await?;

        extract_id(response, "publish").await
    }
}

async fn extract_id(response: Response, step: &str) -> Result<String> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(DiscountError::PublishError {
            target: THREADS_TARGET.to_string(),
            message: format!("{} returned status {}: {}", step, status.as_u16(), body),
        });
    }

    let parsed: IdResponse = response.json().await?;
    parsed.id.ok_or_else(|| DiscountError::PublishError {
        target: THREADS_TARGET.to_string(),
        message: format!("{} response has no id", step),
    })
}

#[async_trait]
impl Publisher for ThreadsPublisher {
    fn name(&self) -> &str {
        THREADS_TARGET
    }

    fn char_limit(&self) -> usize {
        self.char_limit
    }

    async fn publish(&self, text: &str, image_url: Option<&str>) -> Result<()> {
        let creation_id = self.create_container(text, image_url).await?;
        tracing::debug!("🧵 Threads container {} created", creation_id);

        let post_id = self.publish_container(&creation_id).await?;
        tracing::debug!("🧵 Threads post {} published", post_id);
        Ok(())
    }
}
