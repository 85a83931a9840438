//! HTTP client for the switch management REST API.
//!
//! This module provides the concrete [`Transport`] implementation: session
//! login/logout, bounded retry for transient "busy" responses, and
//! normalization of the vendor error payload shape.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace};

use crate::error::{RestoreError, Result, TransportError};

use super::transport::{Method, Transport};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for transient failures.
const MAX_RETRIES: u32 = 3;

/// Delay between retries in milliseconds.
const RETRY_DELAY_MS: u64 = 1000;

/// Management API client for one chassis.
///
/// The session is owned by a single restore run for its duration and is
/// never shared across concurrent runs against different devices.
#[derive(Debug)]
pub struct FosClient {
    /// HTTP client.
    client: Client,
    /// Base URL of the device, e.g. `https://10.1.1.1`.
    base_url: String,
    /// Session token obtained at login.
    auth_token: String,
}

impl FosClient {
    /// Logs in to the device and returns a client holding the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created, the device
    /// is unreachable, or the credentials are rejected.
    pub async fn login(base_url: &str, username: &str, password: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| TransportError::network(format!("Failed to create HTTP client: {e}")))?;

        let base_url = base_url.trim_end_matches('/').to_string();

        let response = client
            .post(format!("{base_url}/rest/login"))
            .basic_auth(username, Some(password))
            .send()
            .await
            .map_err(|e| TransportError::network(format!("Login request failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RestoreError::Transport(
                TransportError::AuthenticationFailed {
                    message: String::from("Invalid credentials"),
                },
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RestoreError::Transport(TransportError::api(
                status.as_u16(),
                body,
            )));
        }

        let auth_token = response
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .ok_or_else(|| {
                TransportError::invalid_response("Login response carried no session token")
            })?;

        debug!("Logged in to {base_url}");

        Ok(Self {
            client,
            base_url,
            auth_token,
        })
    }

    /// Logs out, releasing the device-side session.
    ///
    /// # Errors
    ///
    /// Returns an error if the logout request fails.
    pub async fn logout(&self) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/rest/logout", self.base_url))
            .header(header::AUTHORIZATION, &self.auth_token)
            .send()
            .await
            .map_err(|e| TransportError::network(format!("Logout request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RestoreError::Transport(normalize_error(status, &body)));
        }

        debug!("Logged out of {}", self.base_url);
        Ok(())
    }

    /// Builds the full URL for a logical resource path.
    ///
    /// Ordinary resources live under `running/`; `cli/` paths address the
    /// device's command-line channel under `operations/`.
    fn url_for(&self, path: &str) -> String {
        if path.starts_with("cli/") {
            format!("{}/rest/operations/{path}", self.base_url)
        } else {
            format!("{}/rest/running/{path}", self.base_url)
        }
    }

    /// Issues a single request without retrying.
    async fn request_once(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> std::result::Result<Value, TransportError> {
        let url = self.url_for(path);
        trace!("{method} {url}");

        let mut builder = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Patch => self.client.patch(&url),
            Method::Delete => self.client.delete(&url),
        };
        builder = builder.header(header::AUTHORIZATION, &self.auth_token);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::network(format!("Request failed: {e}")))?;

        let status = response.status();

        if status == StatusCode::SERVICE_UNAVAILABLE {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(0);
            let retry_after = if retry_after == 0 { 10 } else { retry_after };
            return Err(TransportError::Busy {
                retry_after_secs: retry_after,
            });
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TransportError::AuthenticationFailed {
                message: String::from("Session rejected by device"),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| TransportError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(normalize_error(status.as_u16(), &text));
        }

        if text.trim().is_empty() {
            // DELETE and some POST operations return no content.
            return Ok(Value::Null);
        }

        serde_json::from_str(&text)
            .map_err(|e| TransportError::invalid_response(format!("Failed to parse response: {e}")))
    }
}

#[async_trait]
impl Transport for FosClient {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> std::result::Result<Value, TransportError> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                debug!("Retry attempt {attempt} of {MAX_RETRIES} for {method} {path}");
                tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt)))
                    .await;
            }

            match self.request_once(method, path, body.as_ref()).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if e.is_retryable() {
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| TransportError::network(String::from("Max retries exceeded"))))
    }
}

/// Normalizes a vendor error payload into a [`TransportError`].
///
/// The device reports application failures as
/// `{"errors": {"error": [{"error-message": "..."}]}}`; anything that does
/// not parse to that shape is treated as an unparseable response.
fn normalize_error(status: u16, body: &str) -> TransportError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    let Some(parsed) = parsed else {
        return TransportError::invalid_response(format!(
            "HTTP {status} with unparseable body: {body}"
        ));
    };

    let messages: Vec<String> = parsed
        .pointer("/errors/error")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e.get("error-message"))
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    let message = if messages.is_empty() {
        parsed.to_string()
    } else {
        messages.join("; ")
    };

    TransportError::api(status, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn logged_in_client(server: &MockServer) -> FosClient {
        Mock::given(method("POST"))
            .and(path("/rest/login"))
            .respond_with(ResponseTemplate::new(200).insert_header("Authorization", "Custom_Basic abc123"))
            .mount(server)
            .await;

        FosClient::login(&server.uri(), "admin", "password")
            .await
            .expect("login should succeed")
    }

    #[tokio::test]
    async fn test_login_captures_session_token() {
        let server = MockServer::start().await;
        let client = logged_in_client(&server).await;
        assert_eq!(client.auth_token, "Custom_Basic abc123");
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/login"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result = FosClient::login(&server.uri(), "admin", "wrong").await;
        assert!(matches!(
            result,
            Err(RestoreError::Transport(
                TransportError::AuthenticationFailed { .. }
            ))
        ));
    }

    #[tokio::test]
    async fn test_request_retries_busy_then_succeeds() {
        let server = MockServer::start().await;
        let client = logged_in_client(&server).await;

        Mock::given(method("GET"))
            .and(path("/rest/running/chassis"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/running/chassis"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"chassis-enabled": true})))
            .mount(&server)
            .await;

        let value = client
            .request(Method::Get, "chassis", None)
            .await
            .expect("request should succeed after retry");
        assert_eq!(value["chassis-enabled"], json!(true));
    }

    #[tokio::test]
    async fn test_vendor_error_is_normalized() {
        let server = MockServer::start().await;
        let client = logged_in_client(&server).await;

        Mock::given(method("PATCH"))
            .and(path("/rest/running/chassis"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "errors": {"error": [
                    {"error-message": "Invalid attribute"},
                    {"error-message": "Value out of range"}
                ]}
            })))
            .mount(&server)
            .await;

        let err = client
            .request(Method::Patch, "chassis", Some(json!({"bogus": 1})))
            .await
            .expect_err("request should fail");
        match err {
            TransportError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid attribute; Value out of range");
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cli_path_routes_to_operations() {
        let server = MockServer::start().await;
        let client = logged_in_client(&server).await;

        Mock::given(method("POST"))
            .and(path("/rest/operations/cli/command"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .mount(&server)
            .await;

        let value = client
            .request(
                Method::Post,
                "cli/command",
                Some(json!({"fid": 1, "command": "portcfgshow"})),
            )
            .await
            .expect("cli request should succeed");
        assert_eq!(value["status"], json!("ok"));
    }
}
