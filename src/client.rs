use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use tracing::{debug, warn};

use crate::collection::Collection;
use crate::errors::{ChatBeesError, Result};
use crate::models::{CollectionRequest, ListCollectionsResponse, PUBLIC_NAMESPACE};

const DEFAULT_REGION_DOMAIN: &str = ".us-west-2.aws.chatbees.ai";
const LOCAL_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const API_KEY_HEADER: &str = "api-key";
const ORG_URL_HEADER: &str = "x-org-url";

/// Builder for constructing a [`Client`] with custom configuration.
///
/// # Example
///
/// ```no_run
/// use chatbees::ClientBuilder;
/// use std::time::Duration;
///
/// # fn example() -> chatbees::Result<()> {
/// let client = ClientBuilder::new()
///     .api_key("MDItMDAwMDAwMDAt...")
///     .account_id("IYT7YW3F")
///     .max_retries(5)
///     .timeout(Duration::from_secs(120))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    api_key: Option<String>,
    account_id: Option<String>,
    base_url: Option<String>,
    max_retries: u32,
    timeout: Duration,
}

impl ClientBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            api_key: None,
            account_id: None,
            base_url: None,
            max_retries: DEFAULT_MAX_RETRIES,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the API key for authentication.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the account id the API key belongs to.
    pub fn account_id(mut self, id: impl Into<String>) -> Self {
        self.account_id = Some(id.into());
        self
    }

    /// Override the service URL (defaults to `https://{account_id}.us-west-2.aws.chatbees.ai`).
    ///
    /// The value `localhost` is shorthand for `http://localhost:8080`.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the maximum number of retries for transient errors (defaults to 3).
    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Set the HTTP request timeout (defaults to 60 seconds).
    pub fn timeout(mut self, d: Duration) -> Self {
        self.timeout = d;
        self
    }

    /// Build the [`Client`].
    ///
    /// Unset values fall back to the `CHATBEES_API_KEY`, `CHATBEES_ACCOUNT_ID`
    /// and `CHATBEES_BASE_URL` environment variables.
    ///
    /// Returns [`ChatBeesError::Authentication`] if no usable key is available
    /// and [`ChatBeesError::Configuration`] if no account id is.
    pub fn build(self) -> Result<Client> {
        let api_key = self
            .api_key
            .or_else(|| non_empty_env("CHATBEES_API_KEY"))
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ChatBeesError::Authentication {
                message: "API key is required. Pass it to ClientBuilder::api_key() \
                          or set the CHATBEES_API_KEY environment variable."
                    .into(),
            })?;

        let account_id = self
            .account_id
            .or_else(|| non_empty_env("CHATBEES_ACCOUNT_ID"))
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ChatBeesError::Configuration {
                message: "account id is required. Pass it to ClientBuilder::account_id() \
                          or set the CHATBEES_ACCOUNT_ID environment variable."
                    .into(),
            })?;

        let base_override = self.base_url.or_else(|| non_empty_env("CHATBEES_BASE_URL"));

        let mut headers = HeaderMap::new();
        let mut key_value =
            HeaderValue::from_str(&api_key).map_err(|_| ChatBeesError::Authentication {
                message: "API key contains characters that are not valid in a header".into(),
            })?;
        key_value.set_sensitive(true);
        headers.insert(HeaderName::from_static(API_KEY_HEADER), key_value);

        // A shared endpoint routes on the account id instead of the host name.
        if base_override.is_some() {
            let org = HeaderValue::from_str(&account_id).map_err(|_| ChatBeesError::Configuration {
                message: format!("account id {account_id:?} is not a valid header value"),
            })?;
            headers.insert(HeaderName::from_static(ORG_URL_HEADER), org);
        }
        let base_url = service_url(base_override.as_deref(), &account_id);

        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .default_headers(headers)
            .build()
            .map_err(ChatBeesError::Http)?;

        debug!(%base_url, %account_id, "chatbees client configured");

        Ok(Client {
            base_url,
            account_id,
            http,
            max_retries: self.max_retries,
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Resolve the service URL from an optional override and the account id.
fn service_url(base_override: Option<&str>, account_id: &str) -> String {
    match base_override {
        Some("localhost") => LOCAL_BASE_URL.to_string(),
        Some(url) => url.trim_end_matches('/').to_string(),
        None => format!("https://{account_id}{DEFAULT_REGION_DOMAIN}"),
    }
}

/// Delay before retry `attempt` (1-based): 1s, 2s, 4s, ... capped at 32s, or
/// the server's `retry_after` when that is longer.
fn backoff_for(attempt: u32, last_err: Option<&ChatBeesError>) -> Duration {
    let exponential = Duration::from_secs(1 << (attempt.saturating_sub(1)).min(5));
    let requested = match last_err {
        Some(ChatBeesError::RateLimit {
            retry_after: Some(secs),
            ..
        }) => Duration::try_from_secs_f64(*secs).ok(),
        _ => None,
    };
    requested.map_or(exponential, |r| r.max(exponential))
}

/// Body of a single API call.
pub(crate) enum Payload {
    Json(serde_json::Value),
    /// JSON request descriptor plus a file, sent as `multipart/form-data`.
    Multipart {
        request: serde_json::Value,
        file_name: String,
        bytes: Vec<u8>,
    },
}

impl Payload {
    pub(crate) fn json(body: &impl Serialize) -> Result<Self> {
        Ok(Self::Json(serde_json::to_value(body)?))
    }

    pub(crate) fn multipart(
        request: &impl Serialize,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self> {
        Ok(Self::Multipart {
            request: serde_json::to_value(request)?,
            file_name: file_name.into(),
            bytes,
        })
    }

    /// A sent form cannot be reused; each attempt builds its own.
    fn form(request: &serde_json::Value, file_name: &str, bytes: &[u8]) -> Form {
        let file = Part::bytes(bytes.to_vec()).file_name(file_name.to_string());
        Form::new()
            .text("request", request.to_string())
            .part("file", file)
    }
}

/// The ChatBees API client.
///
/// Cheap to clone; clones share one connection pool. Use [`Client::new`] for
/// quick construction or [`ClientBuilder`] for full control.
///
/// # Example
///
/// ```no_run
/// use chatbees::Client;
///
/// # async fn example() -> chatbees::Result<()> {
/// let client = Client::new("MDItMDAwMDAwMDAt...", "IYT7YW3F")?;
/// let col = client.get_or_create_collection("lectures").await?;
///
/// col.upload_document("T1.txt").await?;
/// let resp = col.ask("What is a discount?", Some("T1.txt")).await?;
/// println!("{}", resp.answer);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    base_url: String,
    account_id: String,
    http: reqwest::Client,
    max_retries: u32,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("account_id", &self.account_id)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a new client for `account_id` with default settings.
    ///
    /// For customization, use [`ClientBuilder`] instead.
    pub fn new(api_key: impl Into<String>, account_id: impl Into<String>) -> Result<Self> {
        ClientBuilder::new()
            .api_key(api_key)
            .account_id(account_id)
            .build()
    }

    /// The account this client is bound to.
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Service URL every API path is appended to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Handle to an existing collection. No request is made.
    pub fn collection(&self, name: impl Into<String>) -> Collection<'_> {
        Collection::new(self, name.into())
    }

    /// Create a collection and return a handle to it.
    ///
    /// Fails if the collection already exists; see
    /// [`get_or_create_collection`](Self::get_or_create_collection).
    pub async fn create_collection(&self, name: &str) -> Result<Collection<'_>> {
        require("collection name", name)?;
        let body = CollectionRequest {
            namespace_name: PUBLIC_NAMESPACE,
            collection_name: name,
        };
        let _: IgnoredAny = self
            .post("/collections/create", Payload::json(&body)?)
            .await?;
        Ok(self.collection(name))
    }

    /// Names of every collection in the account's public namespace.
    pub async fn list_collections(&self) -> Result<Vec<String>> {
        let body = serde_json::json!({ "namespace_name": PUBLIC_NAMESPACE });
        let resp: ListCollectionsResponse = self
            .post("/collections/list", Payload::Json(body))
            .await?;
        Ok(resp.names)
    }

    /// Delete a collection and every document in it.
    pub async fn delete_collection(&self, name: &str) -> Result<()> {
        require("collection name", name)?;
        let body = CollectionRequest {
            namespace_name: PUBLIC_NAMESPACE,
            collection_name: name,
        };
        let _: IgnoredAny = self
            .post("/collections/delete", Payload::json(&body)?)
            .await?;
        Ok(())
    }

    /// Return a handle to `name`, creating the collection only if it is missing.
    pub async fn get_or_create_collection(&self, name: &str) -> Result<Collection<'_>> {
        require("collection name", name)?;
        if self.list_collections().await?.iter().any(|c| c == name) {
            debug!(collection = name, "collection already exists");
            return Ok(self.collection(name));
        }
        self.create_collection(name).await
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    /// POST to an API path with automatic retry for transient failures.
    ///
    /// Retries are performed for:
    /// - HTTP 5xx server errors
    /// - HTTP 429 rate-limit responses
    /// - Network-level errors (connection refused, timeout, etc.)
    ///
    /// Exponential backoff is applied: 1s, 2s, 4s, ... A longer `retry_after`
    /// from a 429 response takes precedence. Requests that cannot be built
    /// (e.g. a malformed base URL) fail without retrying.
    pub(crate) async fn post<T: DeserializeOwned>(&self, path: &str, payload: Payload) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut last_err: Option<ChatBeesError> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = backoff_for(attempt, last_err.as_ref());
                if let Some(err) = &last_err {
                    warn!(%url, attempt, backoff_secs = backoff.as_secs(), error = %err, "retrying request");
                }
                tokio::time::sleep(backoff).await;
            }

            let req = match &payload {
                Payload::Json(body) => self.http.post(&url).json(body),
                Payload::Multipart {
                    request,
                    file_name,
                    bytes,
                } => self
                    .http
                    .post(&url)
                    .multipart(Payload::form(request, file_name, bytes)),
            };

            debug!(%url, attempt, "sending request");

            let response = match req.send().await {
                Ok(r) => r,
                Err(e) if e.is_builder() => return Err(ChatBeesError::Http(e)),
                Err(e) => {
                    last_err = Some(ChatBeesError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            let text = match response.text().await {
                Ok(t) => t,
                Err(e) => {
                    last_err = Some(ChatBeesError::Http(e));
                    continue;
                }
            };

            if status.is_success() {
                // Acknowledgement endpoints may answer with an empty body.
                let body = if text.trim().is_empty() { "null" } else { &text };
                return Ok(serde_json::from_str(body)?);
            }

            let err = error_from_response(status.as_u16(), &text);
            if err.is_transient() {
                last_err = Some(err);
                continue;
            }

            return Err(err);
        }

        // All retries exhausted.
        Err(last_err.unwrap_or_else(|| ChatBeesError::Api {
            status_code: 0,
            message: "request failed after all retries".into(),
            body: None,
        }))
    }
}

/// Map a non-success response to a typed error.
fn error_from_response(status_code: u16, text: &str) -> ChatBeesError {
    let parsed_body: Option<serde_json::Value> = serde_json::from_str(text).ok();

    let message = parsed_body
        .as_ref()
        .and_then(|b| b.get("detail").or_else(|| b.get("error")))
        .and_then(|e| e.as_str())
        .unwrap_or(text)
        .to_string();

    match status_code {
        401 => ChatBeesError::Authentication { message },
        403 => ChatBeesError::PermissionDenied { message },
        404 => ChatBeesError::NotFound { message },
        429 => {
            let retry_after = parsed_body
                .as_ref()
                .and_then(|b| b.get("retry_after").or_else(|| b.get("retryAfter")))
                .and_then(|v| v.as_f64());

            ChatBeesError::RateLimit {
                message,
                retry_after,
            }
        }
        _ => ChatBeesError::Api {
            status_code,
            message,
            body: parsed_body,
        },
    }
}

/// Reject blank names and questions before they reach the network.
pub(crate) fn require(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ChatBeesError::InvalidArgument(format!("{what} must not be empty")));
    }
    Ok(())
}
