//! JIRA API client implementation.
//!
//! This module provides the request executor for the JIRA REST API v2:
//! a single place that builds requests, classifies responses, retries
//! transient failures with exponential backoff, and surfaces typed errors.

use std::time::Duration;

use reqwest::{header, Client, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::auth::Credentials;
use super::error::{ApiError, Result};
use super::types::{CreatedIssue, FieldMeta, IssueType, MetaPage, SearchResult};

/// Per-attempt request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of attempts per request.
const MAX_RETRIES: u32 = 3;

/// Default base delay between retries in milliseconds. Doubles per attempt.
const RETRY_DELAY_MS: u64 = 1000;

/// Whether 401/403 responses go through the retry loop like transient
/// failures. Matches long-observed behavior of this tool; see DESIGN.md
/// before changing.
const RETRY_AUTH_FAILURES: bool = true;

/// Field projection requested by the search call.
const SEARCH_FIELDS: &str = "summary,status,assignee,reporter,priority";

/// HTTP method for a request. The API surface needs nothing beyond these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Retry knobs for one attempt sequence.
///
/// `max_retries` is the total number of attempts (so `1` means a single
/// attempt with no sleeping); `base_delay` is the sleep before the second
/// attempt and doubles for each attempt after that.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            base_delay: Duration::from_millis(RETRY_DELAY_MS),
        }
    }
}

/// The JIRA API client.
///
/// Holds validated credentials and an HTTP client configured with a fixed
/// per-attempt timeout. All requests are issued sequentially; the client
/// keeps no mutable state between calls.
#[derive(Debug)]
pub struct JiraClient {
    http: Client,
    creds: Credentials,
    verify_tls: bool,
    retry: RetryPolicy,
}

impl JiraClient {
    /// Create a client for validated credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(creds: Credentials, verify_tls: bool, retry: RetryPolicy) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .danger_accept_invalid_certs(!verify_tls)
            .build()
            .map_err(|e| ApiError::Connection(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            creds,
            verify_tls,
            retry,
        })
    }

    /// The normalized base URL this client talks to.
    pub fn base_url(&self) -> &str {
        self.creds.url()
    }

    /// Execute a request against `/rest/api/2/{endpoint}` with the client's
    /// default retry policy.
    ///
    /// Returns `Ok(None)` for 204 responses and `Ok(Some(json))` otherwise.
    pub async fn execute(
        &self,
        endpoint: &str,
        method: Method,
        payload: Option<&Value>,
    ) -> Result<Option<Value>> {
        self.execute_with(endpoint, method, payload, self.retry).await
    }

    /// Execute a request with a per-call retry policy.
    ///
    /// One attempt sequence produces exactly one outcome: the first success
    /// returns immediately, a retryable error sleeps and doubles the delay,
    /// and the error of the final attempt is returned unchanged.
    #[instrument(skip(self, payload), fields(endpoint = %endpoint))]
    pub async fn execute_with(
        &self,
        endpoint: &str,
        method: Method,
        payload: Option<&Value>,
        retry: RetryPolicy,
    ) -> Result<Option<Value>> {
        let url = format!("{}/rest/api/2/{}", self.creds.url(), endpoint);
        let max_attempts = retry.max_retries.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!("Request attempt {}/{}", attempt, max_attempts);

            match self.attempt(&url, endpoint, method, payload).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if attempt < max_attempts && Self::is_retryable(&e) {
                        let delay = Self::retry_delay(retry.base_delay, attempt);
                        warn!(
                            "Request failed (attempt {}), retrying in {:?}: {}",
                            attempt, delay, e
                        );
                        tokio::time::sleep(delay).await;
                    } else {
                        return Err(e);
                    }
                }
            }
        }
    }

    /// Fetch the issue types available for a project.
    ///
    /// Calls `GET /rest/api/2/issue/createmeta/{projectKey}/issuetypes`.
    pub async fn issue_types(&self, project_key: &str) -> Result<Vec<IssueType>> {
        let endpoint = format!("issue/createmeta/{}/issuetypes", project_key);
        let page: MetaPage<IssueType> = self.get_json(&endpoint).await?;
        Ok(page.values)
    }

    /// Fetch the field metadata for creating an issue of the given type.
    ///
    /// Calls `GET /rest/api/2/issue/createmeta/{projectKey}/issuetypes/{id}`.
    pub async fn create_fields(
        &self,
        project_key: &str,
        issue_type_id: &str,
    ) -> Result<Vec<FieldMeta>> {
        let endpoint = format!("issue/createmeta/{}/issuetypes/{}", project_key, issue_type_id);
        let page: MetaPage<FieldMeta> = self.get_json(&endpoint).await?;
        Ok(page.values)
    }

    /// Create an issue from a `{"fields": {...}}` payload.
    ///
    /// Issue creation is not idempotent, so this makes a single attempt:
    /// a retried POST whose first response was lost could file the same
    /// issue twice.
    #[instrument(skip(self, payload))]
    pub async fn create_issue(&self, payload: &Value) -> Result<CreatedIssue> {
        let single = RetryPolicy {
            max_retries: 1,
            base_delay: self.retry.base_delay,
        };

        let value = self
            .execute_with("issue", Method::Post, Some(payload), single)
            .await?
            .ok_or_else(|| ApiError::InvalidResponse("empty response from issue creation".into()))?;

        serde_json::from_value(value)
            .map_err(|e| ApiError::InvalidResponse(format!("failed to parse created issue: {}", e)))
    }

    /// Search for issues using JQL.
    ///
    /// GET `search` with `jql` passed verbatim (urlencoded) and a fixed
    /// field projection. Shares the executor's classification and backoff.
    #[instrument(skip(self), fields(jql = %jql))]
    pub async fn search_issues(&self, jql: &str) -> Result<SearchResult> {
        let endpoint = format!(
            "search?jql={}&fields={}",
            urlencoding::encode(jql),
            SEARCH_FIELDS
        );
        let result: SearchResult = self.get_json(&endpoint).await?;
        debug!("Found {} issues", result.issues.len());
        Ok(result)
    }

    /// GET an endpoint and deserialize the JSON body.
    async fn get_json<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let value = self
            .execute(endpoint, Method::Get, None)
            .await?
            .ok_or_else(|| {
                ApiError::InvalidResponse(format!("empty response from '{}'", endpoint))
            })?;

        serde_json::from_value(value)
            .map_err(|e| ApiError::InvalidResponse(format!("failed to parse response: {}", e)))
    }

    /// Issue a single HTTP request and classify the outcome.
    async fn attempt(
        &self,
        url: &str,
        endpoint: &str,
        method: Method,
        payload: Option<&Value>,
    ) -> Result<Option<Value>> {
        let request = match method {
            Method::Get => self.http.get(url),
            // .json() also sets Content-Type: application/json
            Method::Post => self.http.post(url).json(payload.unwrap_or(&Value::Null)),
        };

        let response = request
            .header(header::AUTHORIZATION, self.creds.bearer_header())
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        self.classify(response, endpoint).await
    }

    /// Classify an HTTP response by status before any body handling.
    async fn classify(&self, response: Response, endpoint: &str) -> Result<Option<Value>> {
        let status = response.status();

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        if status.is_success() {
            let value = response.json::<Value>().await.map_err(|e| {
                ApiError::InvalidResponse(format!("failed to parse response: {}", e))
            })?;
            return Ok(Some(value));
        }

        let body = response.text().await.unwrap_or_default();
        debug!("Error response body: {}", body);

        let context = if status == StatusCode::NOT_FOUND {
            format!("endpoint '{}' was not found", endpoint)
        } else {
            extract_error_messages(&body).unwrap_or(body)
        };

        Err(ApiError::from_status(status, &context))
    }

    /// Wrap a transport-level failure into a `Connection` error with a
    /// context-specific message.
    fn transport_error(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            return ApiError::Connection(format!(
                "request timed out after {}s",
                DEFAULT_TIMEOUT_SECS
            ));
        }

        let detail = error_chain(&err);
        let lowered = detail.to_lowercase();
        if lowered.contains("certificate") || lowered.contains("tls") || lowered.contains("ssl") {
            let hint = if self.verify_tls {
                " (pass --no-verify-tls to skip certificate verification)"
            } else {
                ""
            };
            return ApiError::Connection(format!("TLS error: {}{}", detail, hint));
        }

        if err.is_connect() {
            return ApiError::Connection(format!(
                "cannot connect to {}: {}",
                self.creds.url(),
                detail
            ));
        }

        ApiError::Connection(detail)
    }

    /// Check whether an error goes back through the retry loop.
    ///
    /// All API-status errors are retried uniformly, 4xx and 5xx alike;
    /// validation and response-parsing failures are terminal.
    fn is_retryable(error: &ApiError) -> bool {
        match error {
            ApiError::Validation { .. }
            | ApiError::InvalidResponse(_)
            | ApiError::Keyring(_) => false,
            ApiError::Unauthorized | ApiError::Forbidden => RETRY_AUTH_FAILURES,
            ApiError::NotFound(_) | ApiError::Api { .. } | ApiError::Connection(_) => true,
        }
    }

    /// Delay before the attempt after `attempt` (1-based), doubling from
    /// `base`: base, 2*base, 4*base, ... Saturates instead of overflowing
    /// for attempt counts beyond any sane configuration.
    fn retry_delay(base: Duration, attempt: u32) -> Duration {
        base * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// Render a reqwest error together with its source chain.
fn error_chain(err: &reqwest::Error) -> String {
    let mut msg = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        msg = format!("{}: {}", msg, inner);
        source = inner.source();
    }
    msg
}

/// Pull JIRA's structured error messages out of an error body, if present.
///
/// JIRA error bodies usually carry `errorMessages` (a list) and/or `errors`
/// (a field-name map); either beats echoing raw JSON at the user.
fn extract_error_messages(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;

    if let Some(messages) = json.get("errorMessages").and_then(Value::as_array) {
        let joined: Vec<&str> = messages.iter().filter_map(Value::as_str).collect();
        if !joined.is_empty() {
            return Some(joined.join(", "));
        }
    }

    if let Some(errors) = json.get("errors").and_then(Value::as_object) {
        let joined: Vec<String> = errors
            .iter()
            .map(|(field, msg)| format!("{}: {}", field, msg.as_str().unwrap_or("invalid")))
            .collect();
        if !joined.is_empty() {
            return Some(joined.join(", "));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use std::time::Instant;

    const TEST_TOKEN: &str = "abcdef123456";

    fn test_client(base_url: &str, max_retries: u32) -> JiraClient {
        let creds = Credentials::new(base_url, TEST_TOKEN).unwrap();
        JiraClient::new(
            creds,
            true,
            RetryPolicy {
                max_retries,
                base_delay: Duration::from_millis(20),
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_success_returns_json_without_retry() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/api/2/myself")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name": "jdoe"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = test_client(&server.url(), 3);
        let result = client.execute("myself", Method::Get, None).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.unwrap()["name"], "jdoe");
    }

    #[tokio::test]
    async fn test_204_returns_none_without_parsing() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/api/2/myself")
            .with_status(204)
            .expect(1)
            .create_async()
            .await;

        let client = test_client(&server.url(), 3);
        let result = client.execute("myself", Method::Get, None).await.unwrap();

        mock.assert_async().await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_401_is_retried_until_exhaustion() {
        // Deliberate coverage of the retry-on-auth-failure policy: every
        // attempt sees a 401 and the loop still runs the full sequence.
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/api/2/myself")
            .with_status(401)
            .expect(3)
            .create_async()
            .await;

        let client = test_client(&server.url(), 3);
        let err = client.execute("myself", Method::Get, None).await.unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn test_backoff_doubles_between_attempts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/api/2/myself")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let client = test_client(&server.url(), 3);
        let start = Instant::now();
        let err = client.execute("myself", Method::Get, None).await.unwrap_err();
        let elapsed = start.elapsed();

        mock.assert_async().await;
        assert!(matches!(err, ApiError::Api { status: 503, .. }));
        // Two sleeps: base_delay then 2 * base_delay.
        assert!(elapsed >= Duration::from_millis(60), "elapsed: {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_recovers_when_transport_fails_then_succeeds() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        // The first two connections are dropped without a response; the
        // third gets a real payload. mockito mocks cannot expire per hit,
        // so this drives a raw listener with an attempt counter.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let server_hits = Arc::clone(&hits);

        tokio::spawn(async move {
            loop {
                let (mut stream, _) = listener.accept().await.unwrap();
                let attempt = server_hits.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 2048];
                let _ = stream.read(&mut buf).await;
                if attempt >= 2 {
                    let body = r#"{"ok": true}"#;
                    let response = format!(
                        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\n\
                         content-length: {}\r\nconnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                }
                // Dropping the stream here aborts the attempt mid-exchange.
            }
        });

        let client = test_client(&format!("http://{}", addr), 3);
        let start = Instant::now();
        let result = client.execute("myself", Method::Get, None).await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(result.unwrap()["ok"], true);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        // Two sleeps before the successful attempt: base_delay then
        // 2 * base_delay.
        assert!(elapsed >= Duration::from_millis(60), "elapsed: {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_single_attempt_when_max_retries_is_one() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/api/2/myself")
            .with_status(500)
            .with_body("boom")
            .expect(1)
            .create_async()
            .await;

        let client = test_client(&server.url(), 1);
        let err = client.execute("myself", Method::Get, None).await.unwrap_err();

        mock.assert_async().await;
        match err {
            ApiError::Api { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_404_error_mentions_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/rest/api/2/issue/createmeta/NOPE/issuetypes")
            .with_status(404)
            .expect(3)
            .create_async()
            .await;

        let client = test_client(&server.url(), 3);
        let err = client.issue_types("NOPE").await.unwrap_err();

        match err {
            ApiError::NotFound(msg) => assert!(msg.contains("issue/createmeta/NOPE")),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unparseable_success_body_is_terminal() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/api/2/myself")
            .with_status(200)
            .with_body("not json")
            .expect(1)
            .create_async()
            .await;

        let client = test_client(&server.url(), 3);
        let err = client.execute("myself", Method::Get, None).await.unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_search_sends_jql_and_fixed_field_list() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/api/2/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("jql".into(), r#"project = "ABC""#.into()),
                Matcher::UrlEncoded("fields".into(), SEARCH_FIELDS.into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"issues": []}"#)
            .create_async()
            .await;

        let client = test_client(&server.url(), 3);
        let result = client.search_issues(r#"project = "ABC""#).await.unwrap();

        mock.assert_async().await;
        assert!(result.issues.is_empty());
    }

    #[tokio::test]
    async fn test_search_404_mentions_search_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/rest/api/2/search")
            .match_query(Matcher::Any)
            .with_status(404)
            .expect(3)
            .create_async()
            .await;

        let client = test_client(&server.url(), 3);
        let err = client.search_issues("project = X").await.unwrap_err();

        match err {
            ApiError::NotFound(msg) => assert!(msg.contains("search")),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_issue_makes_exactly_one_attempt() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/rest/api/2/issue")
            .match_header("content-type", Matcher::Regex("application/json".into()))
            .with_status(500)
            .expect(1)
            .create_async()
            .await;

        let client = test_client(&server.url(), 3);
        let payload = serde_json::json!({"fields": {"summary": "Test"}});
        let err = client.create_issue(&payload).await.unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, ApiError::Api { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_create_issue_parses_receipt() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/rest/api/2/issue")
            .match_body(Matcher::PartialJson(
                serde_json::json!({"fields": {"summary": "Test"}}),
            ))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "10500", "key": "ABC-7"}"#)
            .create_async()
            .await;

        let client = test_client(&server.url(), 3);
        let payload = serde_json::json!({"fields": {"summary": "Test"}});
        let created = client.create_issue(&payload).await.unwrap();

        mock.assert_async().await;
        assert_eq!(created.key, "ABC-7");
    }

    #[tokio::test]
    async fn test_connection_refused_maps_to_connection_error() {
        // Nothing listens on this port.
        let creds = Credentials::new("http://127.0.0.1:1", TEST_TOKEN).unwrap();
        let client = JiraClient::new(
            creds,
            true,
            RetryPolicy {
                max_retries: 1,
                base_delay: Duration::from_millis(10),
            },
        )
        .unwrap();

        let err = client.execute("myself", Method::Get, None).await.unwrap_err();
        assert!(matches!(err, ApiError::Connection(_)));
    }

    #[test]
    fn test_retry_delay_exponential() {
        let base = Duration::from_millis(1000);
        assert_eq!(JiraClient::retry_delay(base, 1), Duration::from_millis(1000));
        assert_eq!(JiraClient::retry_delay(base, 2), Duration::from_millis(2000));
        assert_eq!(JiraClient::retry_delay(base, 3), Duration::from_millis(4000));
    }

    #[test]
    fn test_retry_delay_saturates_for_huge_attempt_counts() {
        let base = Duration::from_millis(1);
        assert_eq!(
            JiraClient::retry_delay(base, 40),
            Duration::from_millis(1) * u32::MAX
        );
    }

    #[test]
    fn test_is_retryable_connection() {
        assert!(JiraClient::is_retryable(&ApiError::Connection(
            "timeout".into()
        )));
    }

    #[test]
    fn test_is_retryable_api_status_uniformly() {
        // 400s are retried like 500s under the current policy.
        assert!(JiraClient::is_retryable(&ApiError::Api {
            status: 400,
            body: String::new()
        }));
        assert!(JiraClient::is_retryable(&ApiError::Api {
            status: 503,
            body: String::new()
        }));
    }

    #[test]
    fn test_is_retryable_auth_policy() {
        assert_eq!(
            JiraClient::is_retryable(&ApiError::Unauthorized),
            RETRY_AUTH_FAILURES
        );
        assert_eq!(
            JiraClient::is_retryable(&ApiError::Forbidden),
            RETRY_AUTH_FAILURES
        );
    }

    #[test]
    fn test_is_not_retryable_validation() {
        assert!(!JiraClient::is_retryable(&ApiError::validation(
            "url",
            "empty"
        )));
    }

    #[test]
    fn test_extract_error_messages_list() {
        let body = r#"{"errorMessages": ["Field 'summary' is required"], "errors": {}}"#;
        assert_eq!(
            extract_error_messages(body).unwrap(),
            "Field 'summary' is required"
        );
    }

    #[test]
    fn test_extract_error_messages_field_map() {
        let body = r#"{"errorMessages": [], "errors": {"priority": "Invalid priority"}}"#;
        assert_eq!(
            extract_error_messages(body).unwrap(),
            "priority: Invalid priority"
        );
    }

    #[test]
    fn test_extract_error_messages_non_json() {
        assert!(extract_error_messages("<html>Bad Gateway</html>").is_none());
    }
}
