//! HTTP client for an external session gateway.
//!
//! The gateway owns the chat platform protocol. grouplock talks to it with
//! plain JSON requests:
//!
//! - `POST /login` with `{"appState": ...}` returns `{"session": "<token>"}`
//! - `GET /threads/{id}` returns thread metadata
//! - `POST /threads/{id}/title` with `{"title": ...}` renames the thread
//! - `GET /events` streams newline-delimited JSON account events
//!
//! Every request after login carries the session token as a bearer token.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use grouplock_core::{BridgeConfig, Credential, GroupId};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tokio_util::io::StreamReader;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::event::AccountEvent;
use crate::session::{ChatSession, EventStream, SessionConnector};
use crate::thread::ThreadInfo;

/// Capacity of the channel between the feed reader and its consumer.
const FEED_BUFFER: usize = 100;

/// Longest event line accepted from the feed, in bytes.
pub const MAX_EVENT_LINE: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
struct LoginResponse {
    session: String,
}

/// Connector that logs in through the session gateway.
#[derive(Debug, Clone)]
pub struct BridgeConnector {
    base_url: Url,
    timeout: Duration,
    http_client: reqwest::Client,
}

impl BridgeConnector {
    /// Create a connector from gateway settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be built.
    pub fn new(config: &BridgeConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::config_error(format!(
                "gateway URL cannot be a base: {base_url}"
            )));
        }

        // No client-wide timeout: it would also cut off the long-lived event feed.
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::config_error(e.to_string()))?;

        Ok(Self {
            base_url,
            timeout: config.timeout,
            http_client,
        })
    }
}

#[async_trait]
impl SessionConnector for BridgeConnector {
    async fn login(&self, credential: &Credential) -> Result<Arc<dyn ChatSession>> {
        let url = endpoint(&self.base_url, &["login"])?;
        debug!(url = %url, "Logging in through session gateway");

        let response = self
            .http_client
            .post(url)
            .timeout(self.timeout)
            .json(&serde_json::json!({ "appState": credential }))
            .send()
            .await
            .map_err(|e| Error::login_failed(e.to_string()))?;

        let response = check_status("login", response)
            .await
            .map_err(|e| Error::login_failed(e.to_string()))?;
        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| Error::login_failed(format!("invalid login response: {e}")))?;

        info!("Session gateway login accepted");

        Ok(Arc::new(BridgeSession {
            base_url: self.base_url.clone(),
            timeout: self.timeout,
            http_client: self.http_client.clone(),
            token: login.session,
        }))
    }
}

/// Session handle issued by the gateway.
#[derive(Clone)]
pub struct BridgeSession {
    base_url: Url,
    timeout: Duration,
    http_client: reqwest::Client,
    token: String,
}

impl std::fmt::Debug for BridgeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeSession")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ChatSession for BridgeSession {
    async fn set_title(&self, title: &str, group: &GroupId) -> Result<()> {
        let url = endpoint(&self.base_url, &["threads", group.as_str(), "title"])?;

        let response = self
            .http_client
            .post(url)
            .timeout(self.timeout)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "title": title }))
            .send()
            .await
            .map_err(|e| Error::request_failed("setTitle", e.to_string()))?;

        check_status("setTitle", response).await?;
        Ok(())
    }

    async fn thread_info(&self, group: &GroupId) -> Result<ThreadInfo> {
        let url = endpoint(&self.base_url, &["threads", group.as_str()])?;

        let response = self
            .http_client
            .get(url)
            .timeout(self.timeout)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Error::request_failed("getThreadInfo", e.to_string()))?;

        let info = check_status("getThreadInfo", response)
            .await?
            .json()
            .await
            .map_err(|e| Error::request_failed("getThreadInfo", e.to_string()))?;
        Ok(info)
    }

    async fn listen(&self) -> Result<EventStream> {
        let url = endpoint(&self.base_url, &["events"])?;

        let response = self
            .http_client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Error::subscription_failed(e.to_string()))?;

        let response = check_status("listen", response)
            .await
            .map_err(|e| Error::subscription_failed(e.to_string()))?;

        let (tx, rx) = mpsc::channel::<Result<AccountEvent>>(FEED_BUFFER);
        tokio::spawn(read_feed(response, tx));

        Ok(Box::pin(tokio_stream::wrappers::ReceiverStream::new(rx)))
    }
}

/// Build `base/segment/...`, percent-encoding each segment.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| Error::config_error(format!("gateway URL cannot be a base: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Turn a non-success response into an error carrying its status and body.
async fn check_status(operation: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(Error::unexpected_status(operation, status.as_u16(), body))
}

/// Pump newline-delimited events from the response body into `tx`.
///
/// A line longer than [`MAX_EVENT_LINE`] is reported as an invalid event and
/// skipped; reading resumes at the next newline.
async fn read_feed(response: reqwest::Response, tx: mpsc::Sender<Result<AccountEvent>>) {
    let body = Box::pin(response.bytes_stream().map_err(std::io::Error::other));
    let mut lines = FramedRead::new(
        StreamReader::new(body),
        LinesCodec::new_with_max_length(MAX_EVENT_LINE),
    );
    // After a decode error the framed reader yields one `None` before resuming.
    let mut resume_after_error = false;

    loop {
        let item = match lines.next().await {
            Some(Ok(line)) => {
                resume_after_error = false;
                if line.trim().is_empty() {
                    continue;
                }
                decode_line(&line)
            }
            Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                resume_after_error = true;
                Err(Error::invalid_event(format!(
                    "event line longer than {MAX_EVENT_LINE} bytes"
                )))
            }
            Some(Err(LinesCodecError::Io(e))) => {
                let _ = tx.send(Err(Error::subscription_failed(e.to_string()))).await;
                return;
            }
            None if resume_after_error => {
                resume_after_error = false;
                continue;
            }
            None => break,
        };

        if tx.send(item).await.is_err() {
            debug!("Event feed receiver dropped");
            return;
        }
    }

    warn!("Session gateway closed the event feed");
}

fn decode_line(line: &str) -> Result<AccountEvent> {
    serde_json::from_str(line).map_err(|e| Error::invalid_event(e.to_string()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn logged_in(server: &MockServer) -> Arc<dyn ChatSession> {
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"session": "tok-1"})),
            )
            .mount(server)
            .await;

        let config = BridgeConfig {
            base_url: server.uri(),
            timeout: Duration::from_secs(5),
        };
        BridgeConnector::new(&config)
            .unwrap()
            .login(&Credential::new(serde_json::json!([{"key": "c_user"}])))
            .await
            .unwrap()
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let base = Url::parse("http://gateway:8787/api/").unwrap();
        let url = endpoint(&base, &["threads", "a/b", "title"]).unwrap();
        assert_eq!(url.as_str(), "http://gateway:8787/api/threads/a%2Fb/title");
    }

    #[test]
    fn test_invalid_base_url() {
        let config = BridgeConfig {
            base_url: "not a url".to_string(),
            timeout: Duration::from_secs(1),
        };
        assert!(BridgeConnector::new(&config).is_err());
    }

    #[tokio::test]
    async fn test_login_sends_app_state() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .and(body_json(serde_json::json!({"appState": [{"key": "c_user"}]})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"session": "tok-1"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let config = BridgeConfig {
            base_url: server.uri(),
            timeout: Duration::from_secs(5),
        };
        let result = BridgeConnector::new(&config)
            .unwrap()
            .login(&Credential::new(serde_json::json!([{"key": "c_user"}])))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(401).set_body_string("checkpoint"))
            .mount(&server)
            .await;

        let config = BridgeConfig {
            base_url: server.uri(),
            timeout: Duration::from_secs(5),
        };
        let result = BridgeConnector::new(&config)
            .unwrap()
            .login(&Credential::new(serde_json::json!([])))
            .await;

        match result {
            Err(Error::LoginFailed { reason }) => assert!(reason.contains("401")),
            other => panic!("expected login failure, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_set_title_posts_title_with_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/threads/42/title"))
            .and(header("authorization", "Bearer tok-1"))
            .and(body_json(serde_json::json!({"title": "Locked Name"})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let session = logged_in(&server).await;
        session
            .set_title("Locked Name", &GroupId::new("42"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_set_title_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/threads/42/title"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let session = logged_in(&server).await;
        let result = session.set_title("Locked Name", &GroupId::new("42")).await;
        assert!(matches!(
            result,
            Err(Error::UnexpectedStatus { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_thread_info_decodes_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/threads/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "threadID": "42",
                "threadName": "Old Name",
                "participantIDs": ["1", "2"]
            })))
            .mount(&server)
            .await;

        let session = logged_in(&server).await;
        let info = session.thread_info(&GroupId::new("42")).await.unwrap();
        assert_eq!(info.title(), "Old Name");
    }

    #[tokio::test]
    async fn test_listen_streams_ndjson_events() {
        let server = MockServer::start().await;
        let body = concat!(
            r#"{"type":"event","threadID":"42","logMessageType":"log:thread-name"}"#,
            "\n",
            "not json\n",
            r#"{"type":"message","threadID":"42"}"#,
        );
        Mock::given(method("GET"))
            .and(path("/events"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let session = logged_in(&server).await;
        let items: Vec<Result<AccountEvent>> = session.listen().await.unwrap().collect().await;

        assert_eq!(items.len(), 3);
        assert_eq!(
            items[0].as_ref().unwrap().log_marker(),
            Some("log:thread-name")
        );
        assert!(matches!(items[1], Err(Error::InvalidEvent { .. })));
        assert_eq!(items[2].as_ref().unwrap().kind.as_deref(), Some("message"));
    }

    #[tokio::test]
    async fn test_listen_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let session = logged_in(&server).await;
        let result = session.listen().await;
        assert!(matches!(result, Err(Error::SubscriptionFailed { .. })));
    }

    #[tokio::test]
    async fn test_listen_skips_blank_lines_and_handles_crlf() {
        let server = MockServer::start().await;
        let body = concat!(
            "\r\n",
            r#"{"type":"event","threadID":42,"logMessageType":"log:thread-title"}"#,
            "\r\n\n",
        );
        Mock::given(method("GET"))
            .and(path("/events"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let session = logged_in(&server).await;
        let items: Vec<Result<AccountEvent>> = session.listen().await.unwrap().collect().await;

        assert_eq!(items.len(), 1);
        let event = items[0].as_ref().unwrap();
        assert_eq!(event.thread_id.as_deref(), Some("42"));
        assert_eq!(event.log_marker(), Some("log:thread-title"));
    }

    #[tokio::test]
    async fn test_listen_rejects_oversized_line_and_recovers() {
        let server = MockServer::start().await;
        let oversized = "x".repeat(MAX_EVENT_LINE + 1);
        let body = format!(
            "{oversized}\n{}\n",
            r#"{"type":"event","threadID":"42","logMessageType":"log:thread-name"}"#
        );
        Mock::given(method("GET"))
            .and(path("/events"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let session = logged_in(&server).await;
        let items: Vec<Result<AccountEvent>> = session.listen().await.unwrap().collect().await;

        assert_eq!(items.len(), 2);
        assert!(matches!(
            items[0],
            Err(Error::InvalidEvent { ref reason }) if reason.contains("longer than")
        ));
        assert_eq!(
            items[1].as_ref().unwrap().log_marker(),
            Some("log:thread-name")
        );
    }

    #[tokio::test]
    async fn test_listen_without_newline_is_bounded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("y".repeat(MAX_EVENT_LINE * 4)),
            )
            .mount(&server)
            .await;

        let session = logged_in(&server).await;
        let items: Vec<Result<AccountEvent>> = session.listen().await.unwrap().collect().await;

        assert!(!items.is_empty());
        assert!(
            items
                .iter()
                .all(|item| matches!(item, Err(Error::InvalidEvent { .. })))
        );
    }
}
