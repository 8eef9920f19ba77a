//! Command implementations for the livedoc CLI.
//!
//! Each command module provides:
//! - Args struct for clap argument parsing
//! - execute() function that performs the command
//! - Human-readable and JSON output formatting

pub mod create;
pub mod delete;
pub mod list;
pub mod read;
pub mod rename;
pub mod share;

use anyhow::Result;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Url, redirect};
use serde::Serialize;

/// Header carrying the development identity.
const DEV_EMAIL_HEADER: &str = "x-user-email";

/// Common error type for HTTP requests.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },
}

/// Build an HTTP client with the caller's identity attached.
///
/// Redirects are not followed: deleting a document answers `303 See Other`
/// and the command reports that response itself.
pub fn build_client(token: Option<&str>, dev_email: Option<&str>) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();

    if let Some(token) = token {
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| anyhow::anyhow!("Invalid token value: {}", e))?;
        headers.insert(AUTHORIZATION, value);
    }

    if let Some(email) = dev_email {
        let value = HeaderValue::from_str(email)
            .map_err(|e| anyhow::anyhow!("Invalid dev email: {}", e))?;
        headers.insert(HeaderName::from_static(DEV_EMAIL_HEADER), value);
    }

    Ok(reqwest::Client::builder()
        .default_headers(headers)
        .redirect(redirect::Policy::none())
        .build()?)
}

/// Join path segments onto the server URL, escaping each segment.
pub fn endpoint(base_url: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base_url)?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("Server URL cannot have a path: {}", base_url))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Print output in JSON or human-readable format.
pub fn output<T: Serialize + HumanReadable>(value: &T, human: bool) -> Result<()> {
    if human {
        value.print_human();
    } else {
        println!("{}", serde_json::to_string_pretty(value)?);
    }
    Ok(())
}

/// Trait for types that can be printed in human-readable format.
pub trait HumanReadable {
    fn print_human(&self);
}

/// Turn an unsuccessful response into a [`CliError::Server`].
pub async fn server_error(response: reqwest::Response) -> CliError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    // Server errors look like {"error": {"code": "...", "message": "..."}}
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|json| {
            json.pointer("/error/message")
                .and_then(|v| v.as_str())
                .map(str::to_string)
        })
        .unwrap_or(body);

    CliError::Server { status, message }
}

/// Make an HTTP request and handle common error cases.
pub async fn make_request<T: serde::de::DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, CliError> {
    let response = request.send().await?;

    if response.status().is_success() {
        Ok(response.json::<T>().await?)
    } else {
        Err(server_error(response).await)
    }
}

/// Format a timestamp for human display.
pub fn format_timestamp(ts: &chrono::DateTime<chrono::Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Truncate a string for display, adding ellipsis if needed.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
