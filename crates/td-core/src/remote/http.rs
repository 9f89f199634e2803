//! HTTP implementation of the server collaborator
//!
//! Blocking JSON-over-HTTP client. Every request carries the session token
//! as a `token` query parameter and is bounded by the configured timeout.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, Url};
use serde::Deserialize;
use tracing::{debug, info};

use super::error::{RemoteError, RemoteResult};
use super::TopicServer;
use crate::config::Config;
use crate::models::Topic;

/// Talks to a td server over HTTP
#[derive(Debug, Clone)]
pub struct HttpTopicServer {
    client: Client,
    base: Url,
    token: Option<String>,
}

/// Just enough of a response body to spot an error payload
#[derive(Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    error: String,
}

impl HttpTopicServer {
    /// Create a client for `server`, failing if the URL is unusable
    pub fn new(server: &str, token: Option<&str>, timeout: Duration) -> RemoteResult<Self> {
        let base = Url::parse(server).map_err(|e| RemoteError::InvalidUrl {
            url: server.to_string(),
            details: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(RemoteError::InvalidUrl {
                url: server.to_string(),
                details: "not a base URL".to_string(),
            });
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("td/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RemoteError::Transport {
                details: e.to_string(),
            })?;

        Ok(Self {
            client,
            base,
            token: token.filter(|t| !t.is_empty()).map(str::to_string),
        })
    }

    /// Create a client from the configured server, token and timeout
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let server = config.require_server()?;
        Ok(Self::new(server, config.token.as_deref(), config.timeout())?)
    }

    /// Build the URL for API path segments, keeping any path prefix of the base
    ///
    /// Each segment is percent-encoded on its own, so a `/` or `?` inside an
    /// id stays part of that segment.
    fn request_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);
        // Always Ok: `new` rejects cannot-be-a-base URLs
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if let Some(ref token) = self.token {
            url.query_pairs_mut().append_pair("token", token);
        }
        url
    }

    /// Perform a request, returning the status code and body
    fn send(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<serde_json::Value>,
    ) -> RemoteResult<(u16, String)> {
        let url = self.request_url(segments);
        let path = url.path().to_string();
        debug!(%method, %path, "sending request");

        let mut request = self
            .client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.body(body.to_string());
        }

        let response = request.send().map_err(|e| classify(e, &path))?;
        let status = response.status().as_u16();
        let text = response.text().map_err(|e| classify(e, &path))?;

        debug!(%path, status, bytes = text.len(), "received response");
        Ok((status, text))
    }
}

impl TopicServer for HttpTopicServer {
    fn list_topics(&self) -> RemoteResult<Vec<Topic>> {
        info!("Fetching the topics from the server");
        let (status, body) = self.send(Method::GET, &["topics"], None)?;
        parse_topics(status, &body)
    }

    fn create_topic(&self, name: &str) -> RemoteResult<Topic> {
        let body = serde_json::json!({ "name": name });
        let (status, body) = self.send(Method::POST, &["topics"], Some(body))?;
        parse_topic(status, &body, "create")
    }

    fn update_topic(&self, id: &str, contents: &str) -> RemoteResult<Topic> {
        let body = serde_json::json!({ "contents": contents });
        let (status, body) = self.send(Method::PUT, &["topics", id], Some(body))?;
        parse_topic(status, &body, "update")
    }

    fn delete_topic(&self, id: &str) -> RemoteResult<()> {
        let (status, body) = self.send(Method::DELETE, &["topics", id], None)?;
        check_response(status, &body)
    }

    fn rename_topic(&self, id: &str, new_name: &str) -> RemoteResult<Topic> {
        let body = serde_json::json!({ "name": new_name });
        let (status, body) = self.send(Method::PUT, &["topics", id], Some(body))?;
        parse_topic(status, &body, "rename")
    }
}

/// Separate timeouts from other transport failures
fn classify(error: reqwest::Error, path: &str) -> RemoteError {
    if error.is_timeout() {
        RemoteError::Timeout {
            path: path.to_string(),
        }
    } else {
        RemoteError::Transport {
            details: error.to_string(),
        }
    }
}

/// Fail on an error payload or a non-success status
///
/// An `{"error": ...}` body wins over the status code, so the server's own
/// message reaches the user.
fn check_response(status: u16, body: &str) -> RemoteResult<()> {
    if let Ok(payload) = serde_json::from_str::<ErrorPayload>(body) {
        if !payload.error.is_empty() {
            return Err(RemoteError::Server {
                message: payload.error,
            });
        }
    }
    if !(200..300).contains(&status) {
        return Err(RemoteError::Server {
            message: format!("the server responded with status {}", status),
        });
    }
    Ok(())
}

fn parse_topics(status: u16, body: &str) -> RemoteResult<Vec<Topic>> {
    check_response(status, body)?;
    serde_json::from_str(body).map_err(|_| RemoteError::invalid_response("unknown topics format"))
}

/// Parse a single topic answered to `action` (create, update, rename)
fn parse_topic(status: u16, body: &str, action: &str) -> RemoteResult<Topic> {
    check_response(status, body)?;
    if body.trim().is_empty() {
        return Err(RemoteError::invalid_response(format!(
            "could not {} this topic",
            action
        )));
    }

    let topic: Topic = serde_json::from_str(body)
        .map_err(|_| RemoteError::invalid_response("unknown topic format"))?;
    if topic.id.is_empty() {
        return Err(RemoteError::invalid_response(format!(
            "could not {} this topic",
            action
        )));
    }
    Ok(topic)
}
