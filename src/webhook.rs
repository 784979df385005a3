//! Webhook transport for delivering files to configured HTTP endpoints.

use std::future::Future;
use std::pin::Pin;

use reqwest::multipart::{Form, Part};
use reqwest::Body;
use tokio::fs::File;
use tokio_util::codec::{BytesCodec, FramedRead};
use tracing::{error, info};

use crate::{AppError, Result};

/// Transport capable of posting one file to a webhook endpoint.
pub trait WebhookTransport: Send + Sync {
    /// POST `file` to `url` as a multipart upload named `file_name`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Webhook`](crate::AppError::Webhook) on connection
    /// failure or any non-success HTTP status.
    fn post_file(
        &self,
        url: &str,
        file_name: &str,
        file: File,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// [`WebhookTransport`] over a shared `reqwest` client.
///
/// The client is cheap to clone; one instance is shared across all folder
/// operations in a cycle.
#[derive(Debug, Clone, Default)]
pub struct HttpWebhookClient {
    client: reqwest::Client,
}

impl HttpWebhookClient {
    /// Create a webhook client with a fresh connection pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    async fn send(&self, url: String, file_name: String, file: File) -> Result<()> {
        info!(file_name, url, "sending file to webhook");

        // Stream the file body instead of buffering it; uploads may be large.
        let stream = FramedRead::new(file, BytesCodec::new());
        let part = Part::stream(Body::wrap_stream(stream)).file_name(file_name.clone());
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&url)
            .header("accept", "application/json")
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // Read the body for diagnostics before failing the folder's cycle.
            let body = response.text().await.unwrap_or_default();
            error!(file_name, url, %status, body, "webhook rejected file");
            return Err(AppError::Webhook(format!(
                "posting file {file_name} to {url} failed with status {status}: {body}"
            )));
        }

        Ok(())
    }
}

impl WebhookTransport for HttpWebhookClient {
    fn post_file(
        &self,
        url: &str,
        file_name: &str,
        file: File,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let url = url.to_owned();
        let file_name = file_name.to_owned();
        Box::pin(self.send(url, file_name, file))
    }
}
