//! HTTP client port
//!
//! A minimal request/response pair for the authenticated request wrapper.
//! The wrapper only needs to set a header, read a status code, and replay
//! a request, so the types stay deliberately small.

use async_trait::async_trait;

/// Errors from the HTTP transport.
#[derive(Debug, thiserror::Error)]
pub enum HttpClientError {
    /// The connection could not be established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// Any other transport error.
    #[error("{0}")]
    Other(String),
}

/// HTTP methods the wrapper can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    /// GET request.
    #[default]
    Get,
    /// POST request.
    Post,
    /// PUT request.
    Put,
    /// PATCH request.
    Patch,
    /// DELETE request.
    Delete,
}

/// An HTTP request to be issued through the wrapper.
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    /// Request method.
    pub method: HttpMethod,
    /// Absolute request URL.
    pub url: String,
    /// Request headers as name/value pairs.
    pub headers: Vec<(String, String)>,
    /// Optional request body.
    pub body: Option<String>,
}

impl HttpRequest {
    /// Creates a GET request for the given URL.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            ..Self::default()
        }
    }

    /// Creates a POST request with a body.
    #[must_use]
    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            body: Some(body.into()),
            ..Self::default()
        }
    }

    /// Sets a header, replacing any existing header with the same name.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
    }

    /// Returns the value of a header, if set.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// An HTTP response returned by the transport.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Response status code.
    pub status: u16,
    /// Response headers as name/value pairs.
    pub headers: Vec<(String, String)>,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Returns true if the status signals a missing or rejected bearer
    /// token (401 or 403).
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self.status, 401 | 403)
    }
}

/// Port for issuing HTTP requests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Issues the request and returns the response.
    ///
    /// A response with an error status is `Ok`; `Err` means no response
    /// was received at all.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_header_replaces_case_insensitively() {
        let mut request = HttpRequest::get("https://api.example.com/data");
        request.set_header("Authorization", "Bearer one");
        request.set_header("authorization", "Bearer two");

        assert_eq!(request.header("AUTHORIZATION"), Some("Bearer two"));
        assert_eq!(request.headers.len(), 1);
    }

    #[test]
    fn test_auth_failure_statuses() {
        for (status, auth_failure) in [(200, false), (401, true), (403, true), (500, false)] {
            let response = HttpResponse {
                status,
                headers: Vec::new(),
                body: Vec::new(),
            };
            assert_eq!(response.is_auth_failure(), auth_failure, "status {status}");
        }
    }
}
