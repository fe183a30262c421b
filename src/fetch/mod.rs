//! HTTP clients for the three public data sources.
//!
//! Every adapter (UniProt, Entrez, Open Targets) reuses `FetchClient`: one
//! blocking client with a shared timeout, user agent, and retry policy.
//! Requests run strictly in sequence; there is nothing to parallelize in a
//! one-deck batch job.

pub mod entrez;
pub mod opentargets;
pub mod uniprot;

pub use entrez::EntrezClient;
pub use opentargets::OpenTargetsClient;
pub use uniprot::UniprotClient;

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use std::thread;
use std::time::Duration;
use tracing::warn;

const MAX_RETRIES: u32 = 3;
const USER_AGENT: &str = concat!("genedeck/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client handling timeout, retry, and status classification.
///
/// 429 and 5xx responses are retried with doubling backoff; other non-2xx
/// statuses fail immediately with the server's message when one is present.
pub struct FetchClient {
    http: reqwest::blocking::Client,
    source_name: &'static str,
}

impl FetchClient {
    pub fn new(source_name: &'static str, timeout: Duration) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { http, source_name })
    }

    /// GET a JSON document.
    pub fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        let resp = self.request_with_retry(|http| http.get(url).query(query))?;
        Ok(resp.json()?)
    }

    /// GET a raw body (the Entrez payload is XML).
    pub fn get_bytes(&self, url: &str, query: &[(&str, &str)]) -> Result<Vec<u8>> {
        let resp = self.request_with_retry(|http| http.get(url).query(query))?;
        Ok(resp.bytes()?.to_vec())
    }

    /// POST a JSON body and decode a JSON response.
    pub fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let resp = self.request_with_retry(|http| http.post(url).json(body))?;
        Ok(resp.json()?)
    }

    /// Run a request with up to `MAX_RETRIES` retries and doubling backoff.
    ///
    /// `build_request` is called once per attempt and must return a fully
    /// configured builder.
    fn request_with_retry(
        &self,
        build_request: impl Fn(&reqwest::blocking::Client) -> reqwest::blocking::RequestBuilder,
    ) -> Result<reqwest::blocking::Response> {
        let mut backoff_secs = 1u64;

        for attempt in 0..=MAX_RETRIES {
            let outcome = build_request(&self.http).send();

            match outcome {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return Ok(resp);
                    }

                    let retryable = status.as_u16() == 429 || status.is_server_error();
                    if retryable && attempt < MAX_RETRIES {
                        warn!(
                            source = self.source_name,
                            status = status.as_u16(),
                            attempt = attempt + 1,
                            "retrying after {backoff_secs}s"
                        );
                        thread::sleep(Duration::from_secs(backoff_secs));
                        backoff_secs *= 2;
                        continue;
                    }

                    let message = extract_message(resp);
                    return Err(Error::Api {
                        source_name: self.source_name,
                        status: status.as_u16(),
                        message,
                    });
                },
                Err(err) => {
                    if attempt < MAX_RETRIES {
                        warn!(
                            source = self.source_name,
                            attempt = attempt + 1,
                            "request failed ({err}), retrying after {backoff_secs}s"
                        );
                        thread::sleep(Duration::from_secs(backoff_secs));
                        backoff_secs *= 2;
                        continue;
                    }
                    return Err(err.into());
                },
            }
        }

        unreachable!("retry loop always returns")
    }
}

/// Pull a short, human-readable message out of an error response body.
fn extract_message(resp: reqwest::blocking::Response) -> String {
    let body = resp.text().unwrap_or_default();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&body) {
        // UniProt reports {"messages": [...]}; GraphQL reports {"errors": [{"message": ...}]}
        if let Some(messages) = value.get("messages").and_then(|m| m.as_array()) {
            let joined: Vec<&str> = messages.iter().filter_map(|m| m.as_str()).collect();
            if !joined.is_empty() {
                return joined.join("; ");
            }
        }
        if let Some(message) = value
            .pointer("/errors/0/message")
            .and_then(|m| m.as_str())
        {
            return message.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no response body".to_string()
    } else if trimmed.len() > 200 {
        let mut end = 200;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &trimmed[..end])
    } else {
        trimmed.to_string()
    }
}
