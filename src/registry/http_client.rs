//! HTTP client for the location registry
//!
//! Sends one `POST <base>/saveLocation` per record.

use crate::core::error::SeedError;
use crate::core::traits::{LocationRegistry, RegistryResponse, SaveLocationRequest};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Path of the save operation, relative to the base URL
pub const SAVE_LOCATION_PATH: &str = "saveLocation";

/// Query parameter carrying the parent code
pub const PARENT_CODE_PARAM: &str = "parentCode";

/// reqwest-backed `LocationRegistry`
pub struct HttpRegistryClient {
    client: Client,
    base_url: String,
}

impl HttpRegistryClient {
    /// Create a new client with the given per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SeedError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SeedError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Full URL of the save operation
    pub fn save_location_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            SAVE_LOCATION_PATH
        )
    }
}

#[async_trait]
impl LocationRegistry for HttpRegistryClient {
    fn name(&self) -> &str {
        &self.base_url
    }

    async fn save_location(
        &self,
        request: &SaveLocationRequest,
    ) -> Result<RegistryResponse, SeedError> {
        let code = &request.payload.location_code;

        let mut builder = self.client.post(self.save_location_url());
        if let Some(parent) = &request.parent_code {
            builder = builder.query(&[(PARENT_CODE_PARAM, parent)]);
        }

        let http_request = builder
            .json(&request.payload)
            .build()
            .map_err(|e| SeedError::RequestSetupFailed {
                code: code.clone(),
                message: e.to_string(),
            })?;

        debug!(code = %code, url = %http_request.url(), "Sending saveLocation");

        let response = self
            .client
            .execute(http_request)
            .await
            .map_err(|e| SeedError::NoResponse {
                code: code.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        // An unreadable body is not a reason to fail an otherwise answered call
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(code = %code, status = status.as_u16(), error = %e, "Could not read response body");
                String::new()
            }
        };

        if !status.is_success() {
            return Err(SeedError::ServerRejected {
                code: code.clone(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(RegistryResponse {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_location_url() {
        let client =
            HttpRegistryClient::new("https://registry.test/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.save_location_url(),
            "https://registry.test/api/saveLocation"
        );

        let client =
            HttpRegistryClient::new("https://registry.test/api", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.save_location_url(),
            "https://registry.test/api/saveLocation"
        );
    }

    #[tokio::test]
    async fn test_invalid_base_url_is_request_setup_failure() {
        let client = HttpRegistryClient::new("not a url", Duration::from_secs(1)).unwrap();
        let request = crate::core::traits::LocationRecord::new("province", "RW01", "Kigali", "")
            .to_request();

        let err = client.save_location(&request).await.unwrap_err();
        assert_eq!(err.code(), "REQUEST_SETUP_FAILED");
        assert_eq!(err.location_code(), Some("RW01"));
    }

    #[tokio::test]
    async fn test_unreachable_registry_is_no_response() {
        // Port 9 (discard) on localhost is closed in test environments
        let client =
            HttpRegistryClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let request = crate::core::traits::LocationRecord::new("province", "RW01", "Kigali", "")
            .to_request();

        let err = client.save_location(&request).await.unwrap_err();
        assert_eq!(err.code(), "NO_RESPONSE");
    }

    #[tokio::test]
    async fn test_truncated_body_on_success_still_saves() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            // Read the whole request: headers, then the JSON body
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if n == 0 || (text.contains("\r\n\r\n") && text.ends_with('}')) {
                    break;
                }
            }

            // Promise more bytes than are sent, then close
            socket
                .write_all(b"HTTP/1.1 201 Created\r\ncontent-length: 64\r\n\r\npartial")
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
            while socket.read(&mut buf).await.map(|n| n > 0).unwrap_or(false) {}
        });

        let client =
            HttpRegistryClient::new(format!("http://{}", addr), Duration::from_secs(5)).unwrap();
        let request = crate::core::traits::LocationRecord::new("province", "RW01", "Kigali", "")
            .to_request();

        let response = client.save_location(&request).await.unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(response.body, "");
    }
}
