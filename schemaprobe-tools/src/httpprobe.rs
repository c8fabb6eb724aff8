//! One-shot HTTP requests with the raw response printed back.

use crate::error::ToolError;
use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use std::fmt;
use std::time::Duration;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A request to send.
#[derive(Debug, Clone)]
pub struct ProbeRequest {
    /// Target URL (http or https)
    pub url: String,
    /// Method; POST with a body and GET without one when absent
    pub method: Option<String>,
    /// Request body
    pub body: Option<String>,
    /// Extra headers
    pub headers: Vec<(String, String)>,
    /// Whole-request timeout
    pub timeout: Duration,
}

impl ProbeRequest {
    /// Creates a request to `url` with no body.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: None,
            body: None,
            headers: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Builder method to set the body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Method that will be used.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for a malformed method name.
    pub fn effective_method(&self) -> Result<Method, ToolError> {
        match &self.method {
            Some(name) => Method::from_bytes(name.to_ascii_uppercase().as_bytes())
                .map_err(|_| ToolError::invalid(format!("invalid HTTP method '{name}'"))),
            None if self.body.is_some() => Ok(Method::POST),
            None => Ok(Method::GET),
        }
    }
}

/// Parses a `Name: value` header argument.
///
/// # Errors
/// Returns `InvalidArgument` when there is no colon or the name is empty.
pub fn parse_header(raw: &str) -> Result<(String, String), ToolError> {
    let Some((name, value)) = raw.split_once(':') else {
        return Err(ToolError::invalid(format!(
            "header '{raw}' must look like 'Name: value'"
        )));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(ToolError::invalid("header name must not be empty"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// A received response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    /// Protocol version, e.g. `HTTP/1.1`
    pub version: String,
    /// Status code
    pub status: u16,
    /// Reason phrase, empty for non-standard codes
    pub reason: String,
    /// Headers in received order
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8 (lossy)
    pub body: String,
}

impl fmt::Display for ProbeResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {} {}", self.version, self.status, self.reason)?;
        for (name, value) in &self.headers {
            writeln!(f, "{name}: {value}")?;
        }
        writeln!(f)?;
        write!(f, "{}", self.body)
    }
}

/// Sends `request` and collects the response.
///
/// Any HTTP status, including 4xx and 5xx, is a successful probe.
///
/// # Errors
/// - `InvalidArgument` for a bad URL, method, header or a zero timeout
/// - `Transport` when no response was received
pub async fn send(request: &ProbeRequest) -> Result<ProbeResponse, ToolError> {
    let url = url::Url::parse(&request.url)
        .map_err(|e| ToolError::invalid(format!("invalid URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ToolError::invalid("URL must use http or https"));
    }
    if request.timeout.is_zero() {
        return Err(ToolError::invalid("timeout must be greater than 0"));
    }
    let method = request.effective_method()?;

    let client = reqwest::Client::builder()
        .timeout(request.timeout)
        .build()
        .map_err(|e| transport(&request.url, e))?;

    let mut builder = client.request(method.clone(), url);
    let mut has_content_type = false;
    for (name, value) in &request.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ToolError::invalid(format!("invalid header name '{name}'")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| ToolError::invalid(format!("invalid value for header '{name}'")))?;
        has_content_type |= name == CONTENT_TYPE;
        builder = builder.header(name, value);
    }

    if let Some(body) = &request.body {
        if !has_content_type && serde_json::from_str::<serde_json::Value>(body).is_ok() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        builder = builder.body(body.clone());
    }

    tracing::info!("{} {}", method, request.url);
    let response = builder.send().await.map_err(|e| transport(&request.url, e))?;

    let status = response.status();
    let version = format!("{:?}", response.version());
    let headers = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| transport(&request.url, e))?;

    tracing::debug!("Received {} ({} body bytes)", status, bytes.len());
    Ok(ProbeResponse {
        version,
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or_default().to_string(),
        headers,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    })
}

fn transport(url: &str, source: reqwest::Error) -> ToolError {
    ToolError::Transport {
        url: url.to_string(),
        source,
    }
}
