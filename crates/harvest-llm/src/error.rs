//! Inference client error taxonomy.

use harvest_core::Retryable;

/// Errors from inference server operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// HTTP request failed (transport or status error).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Retryable for LlmError {
    /// Transient transport failures and server-side errors are worth
    /// re-attempting; everything else (client errors, decode failures)
    /// is not.
    fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.is_body()
                    || e.status().is_some_and(|s| {
                        s == reqwest::StatusCode::TOO_MANY_REQUESTS || s.is_server_error()
                    })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn http_connect_error_is_retryable() {
        // Nothing listens on this port.
        let err = reqwest::Client::new()
            .get("http://127.0.0.1:1/")
            .send()
            .await
            .unwrap_err();
        assert!(LlmError::Http(err).is_retryable());
    }

    #[tokio::test]
    async fn http_server_status_error_is_retryable() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let err = reqwest::get(server.uri())
            .await
            .unwrap()
            .error_for_status()
            .unwrap_err();
        assert!(LlmError::Http(err).is_retryable());
    }

    #[tokio::test]
    async fn http_client_status_error_is_not_retryable() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(400))
            .mount(&server)
            .await;
        let err = reqwest::get(server.uri())
            .await
            .unwrap()
            .error_for_status()
            .unwrap_err();
        assert!(!LlmError::Http(err).is_retryable());
    }
}
