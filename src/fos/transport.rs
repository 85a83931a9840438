//! Transport contract consumed by the restore engine.
//!
//! The engine depends on the management API only through this trait: one
//! logical request in, one parsed response object or a normalized error
//! out. Retries for transient "busy" responses belong to implementations,
//! never to the engine.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransportError;

/// HTTP method for a management API request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Read a resource.
    Get,
    /// Create a resource.
    Post,
    /// Update attributes of a resource.
    Patch,
    /// Delete a resource.
    Delete,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        };
        write!(f, "{s}")
    }
}

/// Trait for management API transports.
///
/// Paths are logical resource paths such as `chassis` or
/// `fibrechannel-switch?fid=3`. Paths under the `cli/` prefix address the
/// device's command-line channel for settings the API cannot express;
/// implementations route them accordingly.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues one request and returns the parsed response object.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Api`] when the device reported an
    /// application-level failure (a parseable error object was obtained),
    /// or a transport-level variant when no object could be obtained —
    /// the latter is fatal for the enclosing capture or action.
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, TransportError>;
}

#[async_trait]
impl Transport for Box<dyn Transport> {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, TransportError> {
        (**self).request(method, path, body).await
    }
}
