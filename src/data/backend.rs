//! HTTP client for the inspection / text-diff backend.
//!
//! Two endpoints:
//!
//! - `POST /api/cmm_summary` → [`Summary`]
//! - `GET /textdiff?l=&r=&page=` → [`TextDiff`]
//!
//! Non-2xx responses carry a plain-text (or ad-hoc JSON) body that is shown to
//! the user verbatim, so [`ClientError::Rejected`] displays only that body.

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::domain::{Summary, SummaryRequest, TextDiff};

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";
pub const BACKEND_URL_ENV: &str = "CMMV_BACKEND_URL";

const SUMMARY_PATH: &str = "/api/cmm_summary";
const TEXTDIFF_PATH: &str = "/textdiff";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// Backend answered with a non-success status.
    #[error("{body}")]
    Rejected { status: u16, body: String },
    /// Request never completed (connect, read, DNS...).
    #[error("{0}")]
    Transport(String),
    /// Body was not the JSON we expected.
    #[error("{0}")]
    Decode(String),
}

/// Source of inspection summaries.
pub trait SummarySource {
    fn fetch_summary(&self, request: &SummaryRequest) -> Result<Summary, ClientError>;
}

/// Query for one page of text differences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffQuery {
    pub left: String,
    pub right: String,
    pub page: u32,
}

/// Source of per-page text-difference boxes.
pub trait DiffSource {
    fn fetch_text_diff(&self, query: &DiffQuery) -> Result<TextDiff, ClientError>;
}

pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
        }
    }

    /// Resolve the base URL: explicit override, then `CMMV_BACKEND_URL`
    /// (`.env` honored), then [`DEFAULT_BACKEND_URL`].
    pub fn from_env(override_url: Option<&str>) -> Self {
        dotenvy::dotenv().ok();
        let url = override_url
            .map(str::to_string)
            .or_else(|| std::env::var(BACKEND_URL_ENV).ok())
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        Self::new(url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Download a document's raw bytes.
    pub fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        tracing::debug!(%url, "fetching document");
        let resp = self.client.get(url).send().map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(rejected(status.as_u16(), body));
        }
        let bytes = resp.bytes().map_err(transport)?;
        Ok(bytes.to_vec())
    }
}

impl SummarySource for BackendClient {
    fn fetch_summary(&self, request: &SummaryRequest) -> Result<Summary, ClientError> {
        let url = self.endpoint(SUMMARY_PATH);
        tracing::debug!(%url, folder = %request.folder, "requesting inspection summary");

        let resp = self.client.post(&url).json(request).send().map_err(transport)?;
        read_json(resp, "{}")
    }
}

impl DiffSource for BackendClient {
    fn fetch_text_diff(&self, query: &DiffQuery) -> Result<TextDiff, ClientError> {
        let url = self.endpoint(TEXTDIFF_PATH);
        tracing::debug!(%url, left = %query.left, right = %query.right, page = query.page, "requesting text diff");

        let page = query.page.to_string();
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("l", query.left.as_str()),
                ("r", query.right.as_str()),
                ("page", page.as_str()),
            ])
            .send()
            .map_err(transport)?;
        read_json(resp, "")
    }
}

/// Read the full body first so a failure can show it verbatim. An empty success
/// body is decoded as `empty_as` (pass `""` to treat it as an error).
fn read_json<T: DeserializeOwned>(resp: reqwest::blocking::Response, empty_as: &str) -> Result<T, ClientError> {
    let status = resp.status();
    let text = resp.text().map_err(transport)?;

    if !status.is_success() {
        return Err(rejected(status.as_u16(), text));
    }

    let body = if text.is_empty() { empty_as } else { text.as_str() };
    serde_json::from_str(body).map_err(|e| ClientError::Decode(e.to_string()))
}

fn rejected(status: u16, body: String) -> ClientError {
    tracing::warn!(status, %body, "backend rejected request");
    ClientError::Rejected { status, body }
}

fn transport(err: reqwest::Error) -> ClientError {
    tracing::error!(error = %err, "backend request failed");
    ClientError::Transport(err.to_string())
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    use super::*;

    /// What the local responder saw.
    struct Received {
        request_line: String,
        body: String,
    }

    /// Answer exactly one request with `status` and `body`, then hang up.
    fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<Received>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();

            let mut content_length = 0usize;
            loop {
                let mut header = String::new();
                reader.read_line(&mut header).unwrap();
                if header.trim().is_empty() {
                    break;
                }
                if let Some((name, value)) = header.split_once(':') {
                    if name.trim().eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
            }
            let mut raw = vec![0u8; content_length];
            reader.read_exact(&mut raw).unwrap();

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();

            Received { request_line: request_line.trim_end().to_string(), body: String::from_utf8(raw).unwrap() }
        });
        (format!("http://{addr}"), handle)
    }

    fn request() -> SummaryRequest {
        SummaryRequest { folder: "/reports".into(), part_type: Some("50TT".into()), ..SummaryRequest::default() }
    }

    #[test]
    fn empty_summary_body_reads_as_empty_object() {
        let (url, server) = serve_once("200 OK", "");
        let summary = BackendClient::new(url).fetch_summary(&request()).unwrap();
        assert!(summary.features.is_empty());
        assert_eq!(summary.reports_analyzed, None);

        let seen = server.join().unwrap();
        assert_eq!(seen.request_line, "POST /api/cmm_summary HTTP/1.1");
        let sent: serde_json::Value = serde_json::from_str(&seen.body).unwrap();
        assert_eq!(sent["folder"], "/reports");
        assert_eq!(sent["partType"], "50TT");
        assert!(sent["startDate"].is_null());
    }

    #[test]
    fn non_success_body_is_kept_verbatim() {
        let (url, server) = serve_once("400 Bad Request", "Folder not found: /reports");
        let err = BackendClient::new(url).fetch_summary(&request()).unwrap_err();
        assert_eq!(err, ClientError::Rejected { status: 400, body: "Folder not found: /reports".into() });
        server.join().unwrap();
    }

    #[test]
    fn text_diff_sends_names_and_page_as_query() {
        let (url, server) = serve_once("200 OK", r#"{"left":[],"right":[{"box":[0,0,1,1],"dashCount":2}]}"#);
        let query = DiffQuery { left: "left.pdf".into(), right: "right v2.pdf".into(), page: 3 };
        let diff = BackendClient::new(url).fetch_text_diff(&query).unwrap();
        assert!(diff.left.is_empty());
        assert_eq!(diff.right.len(), 1);

        let seen = server.join().unwrap();
        assert_eq!(seen.request_line, "GET /textdiff?l=left.pdf&r=right+v2.pdf&page=3 HTTP/1.1");
    }

    #[test]
    fn empty_text_diff_body_is_a_decode_error() {
        let (url, server) = serve_once("200 OK", "");
        let query = DiffQuery { left: "a.pdf".into(), right: "b.pdf".into(), page: 1 };
        let err = BackendClient::new(url).fetch_text_diff(&query).unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
        server.join().unwrap();
    }

    #[test]
    fn text_diff_rejection_keeps_body() {
        let (url, server) = serve_once("404 Not Found", "file not found");
        let query = DiffQuery { left: "a.pdf".into(), right: "b.pdf".into(), page: 9 };
        let err = BackendClient::new(url).fetch_text_diff(&query).unwrap_err();
        assert_eq!(err.to_string(), "file not found");
        server.join().unwrap();
    }

    #[test]
    fn base_url_is_normalized() {
        let client = BackendClient::new(" http://host:5000/ ");
        assert_eq!(client.base_url(), "http://host:5000");
        assert_eq!(client.endpoint(SUMMARY_PATH), "http://host:5000/api/cmm_summary");
    }

    #[test]
    fn explicit_override_wins() {
        let client = BackendClient::from_env(Some("http://example:8080"));
        assert_eq!(client.base_url(), "http://example:8080");
    }

    #[test]
    fn rejected_error_shows_raw_body() {
        let err = ClientError::Rejected { status: 400, body: "{\"error\": \"Missing folder path\"}".to_string() };
        assert_eq!(err.to_string(), "{\"error\": \"Missing folder path\"}");
    }

    #[test]
    fn unreachable_backend_is_a_transport_error() {
        let client = BackendClient::new("http://127.0.0.1:9");
        let err = client
            .fetch_summary(&SummaryRequest { folder: "/x".into(), ..SummaryRequest::default() })
            .unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }
}
