use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while notifying the aggregation collaborator
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Webhook returned error: {0}")]
    ApiError(String),
}

/// Receives a signal whenever a place's reviews changed, so place-level
/// aggregates can be recomputed elsewhere
#[async_trait]
pub trait ReviewChangedHook: Send + Sync {
    async fn review_changed(&self, place_id: &str) -> Result<(), NotifyError>;
}

/// Posts `{ "placeId": ... }` to a configured URL
pub struct WebhookNotifier {
    url: String,
    client: Client,
}

impl WebhookNotifier {
    pub fn new(url: String, timeout: Duration) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { url, client })
    }
}

#[async_trait]
impl ReviewChangedHook for WebhookNotifier {
    async fn review_changed(&self, place_id: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "placeId": place_id }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifyError::ApiError(format!(
                "review_changed for {} returned {}",
                place_id,
                response.status()
            )));
        }

        tracing::debug!("Notified aggregate webhook for place {}", place_id);
        Ok(())
    }
}

/// Used when no webhook is configured
pub struct LogNotifier;

#[async_trait]
impl ReviewChangedHook for LogNotifier {
    async fn review_changed(&self, place_id: &str) -> Result<(), NotifyError> {
        tracing::debug!("Review changed for place {} (no aggregate webhook configured)", place_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_webhook_posts_place_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hooks/review-changed")
            .match_body(mockito::Matcher::Json(serde_json::json!({ "placeId": "p1" })))
            .with_status(204)
            .create_async()
            .await;

        let notifier = WebhookNotifier::new(
            format!("{}/hooks/review-changed", server.url()),
            Duration::from_secs(5),
        )
        .unwrap();

        notifier.review_changed("p1").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_webhook_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/hooks/review-changed")
            .with_status(500)
            .create_async()
            .await;

        let notifier = WebhookNotifier::new(
            format!("{}/hooks/review-changed", server.url()),
            Duration::from_secs(5),
        )
        .unwrap();

        let err = notifier.review_changed("p1").await.unwrap_err();
        assert!(matches!(err, NotifyError::ApiError(_)));
    }
}
