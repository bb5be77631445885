// API client module: a small blocking HTTP client for the platform's
// admin REST APIs. Seeding is a sequential batch job, so synchronous
// requests keep the control flow obvious; per-record failures are folded
// into an `Outcome` instead of an error so one bad record never aborts
// the batch.

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::config::Config;

/// Headless list-type (picklist) admin API root.
pub const LIST_TYPE_ENDPOINT: &str = "/o/headless-admin-list-type/v1.0/list-type-definitions";
/// Object-admin API root for object definitions.
pub const OBJECT_ADMIN_ENDPOINT: &str = "/o/object-admin/v1.0/object-definitions";
/// Object-admin API root for object folders.
pub const OBJECT_FOLDER_ENDPOINT: &str = "/o/object-admin/v1.0/object-folders";

/// Publishing an object definition can take the platform a while, so the
/// per-request timeout is generous.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Error bodies are truncated to this many characters before they are
/// kept for the failure report.
const BODY_PREVIEW_LEN: usize = 200;

/// What one request came to. `Created` is the only success; the failure
/// variants split by whether a retry can plausibly help.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// 2xx. The record (or definition) now exists on the instance.
    Created,
    /// 429. The instance asked us to slow down.
    Throttled { body: String },
    /// Any other 4xx. The payload itself was refused; resending the same
    /// bytes cannot succeed.
    Rejected { status: u16, body: String },
    /// 5xx. Instance-side trouble, often transient under seeding load.
    ServerError { status: u16, body: String },
    /// The request never produced an HTTP response at all.
    Network(String),
}

impl Outcome {
    /// Classify a status line plus body text. Pure so the mapping is
    /// testable without a server.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        if status.is_success() {
            Outcome::Created
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            Outcome::Throttled {
                body: preview(body),
            }
        } else if status.is_client_error() {
            Outcome::Rejected {
                status: status.as_u16(),
                body: preview(body),
            }
        } else {
            Outcome::ServerError {
                status: status.as_u16(),
                body: preview(body),
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Created)
    }

    /// Whether waiting and resending the same request can change the
    /// answer. Rejections are terminal; everything else is worth another
    /// attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Outcome::Throttled { .. } | Outcome::ServerError { .. } | Outcome::Network(_)
        )
    }

    /// One-line description for failure reports.
    pub fn describe(&self) -> String {
        match self {
            Outcome::Created => "created".to_string(),
            Outcome::Throttled { body } => format!("HTTP 429 (rate limited): {body}"),
            Outcome::Rejected { status, body } => format!("HTTP {status}: {body}"),
            Outcome::ServerError { status, body } => format!("HTTP {status}: {body}"),
            Outcome::Network(err) => format!("network error: {err}"),
        }
    }
}

fn preview(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= BODY_PREVIEW_LEN {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(BODY_PREVIEW_LEN).collect();
    format!("{cut}...")
}

/// Build the Basic-Auth header value from a credential pair.
pub fn basic_auth_value(username: &str, password: &str) -> String {
    format!("Basic {}", BASE64.encode(format!("{username}:{password}")))
}

/// Id (and optional REST context path) the platform assigns to a freshly
/// created admin resource. Needed for follow-up calls such as publishing
/// an object definition or adding entries to a picklist.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedResource {
    pub id: i64,
    #[serde(default, rename = "restContextPath")]
    pub rest_context_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListPage {
    #[serde(default)]
    items: Vec<PicklistSummary>,
}

/// The slice of a list-type definition we care about when checking what
/// already exists on an instance.
#[derive(Debug, Clone, Deserialize)]
pub struct PicklistSummary {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "externalReferenceCode")]
    pub external_reference_code: String,
    #[serde(default, rename = "listTypeEntries")]
    pub entries: Vec<Value>,
}

/// Blocking client that holds the connection pool plus the resolved
/// target configuration. Every call authenticates with Basic auth; the
/// admin APIs used here do not issue tokens.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: Config,
}

impl ApiClient {
    pub fn new(config: Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient { client, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Headers for every admin call: Basic auth plus JSON content types.
    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let val = basic_auth_value(&self.config.username, &self.config.password);
        // base64 output is printable ASCII, so this cannot fail.
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&val).unwrap());
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    /// POST one JSON body to an endpoint and classify whatever happens.
    pub fn post_json<T: Serialize + ?Sized>(&self, endpoint: &str, body: &T) -> Outcome {
        let url = self.config.endpoint(endpoint);
        classify(
            self.client
                .post(&url)
                .headers(self.auth_headers())
                .json(body)
                .send(),
        )
    }

    /// POST a JSON body and parse the created resource out of the
    /// response. Used by flows that need the platform-assigned id for a
    /// follow-up call.
    pub fn create_resource<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> std::result::Result<CreatedResource, Outcome> {
        let url = self.config.endpoint(endpoint);
        let res = self
            .client
            .post(&url)
            .headers(self.auth_headers())
            .json(body)
            .send();
        match res {
            Ok(res) => {
                let status = res.status();
                let text = res.text().unwrap_or_else(|_| "".into());
                if status.is_success() {
                    // The resource exists at this point even if the body is
                    // unreadable, so a parse failure must not be retryable.
                    serde_json::from_str(&text).map_err(|e| Outcome::Rejected {
                        status: status.as_u16(),
                        body: format!("unparseable create response: {e}"),
                    })
                } else {
                    Err(Outcome::from_status(status, &text))
                }
            }
            Err(err) => Err(Outcome::Network(err.to_string())),
        }
    }

    /// Move an object definition from draft to published. The platform
    /// answers this one with 200, 201 or 204 depending on version, all
    /// of which classify as success.
    pub fn publish_object(&self, definition_id: i64) -> Outcome {
        let url = self
            .config
            .endpoint(&format!("{OBJECT_ADMIN_ENDPOINT}/{definition_id}/publish"));
        classify(self.client.post(&url).headers(self.auth_headers()).send())
    }

    /// Add one entry to an existing list-type definition.
    pub fn add_picklist_entry(&self, definition_id: i64, entry: &Value) -> Outcome {
        let url = self.config.endpoint(&format!(
            "{LIST_TYPE_ENDPOINT}/{definition_id}/list-type-entries"
        ));
        classify(
            self.client
                .post(&url)
                .headers(self.auth_headers())
                .json(entry)
                .send(),
        )
    }

    /// Fetch the list-type definitions already present on the instance.
    /// This one propagates errors: a failed check is a failed command,
    /// not a tally entry.
    pub fn list_picklists(&self) -> Result<Vec<PicklistSummary>> {
        let url = self
            .config
            .endpoint(&format!("{LIST_TYPE_ENDPOINT}?pageSize=100"));
        let res = self
            .client
            .get(&url)
            .headers(self.auth_headers())
            .send()
            .context("Failed to fetch list-type definitions")?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_else(|_| "".into());
            anyhow::bail!("Listing picklists failed: {} - {}", status, preview(&txt));
        }
        let page: ListPage = res.json().context("Parsing list-type definitions json")?;
        Ok(page.items)
    }
}

fn classify(res: reqwest::Result<reqwest::blocking::Response>) -> Outcome {
    match res {
        Ok(res) => {
            let status = res.status();
            let text = res.text().unwrap_or_else(|_| "".into());
            let outcome = Outcome::from_status(status, &text);
            if !outcome.is_success() {
                tracing::debug!(%status, "request failed");
            }
            outcome
        }
        Err(err) => Outcome::Network(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_auth_matches_known_vector() {
        // "user:pass" in base64.
        assert_eq!(basic_auth_value("user", "pass"), "Basic dXNlcjpwYXNz");
    }

    #[test]
    fn status_classification() {
        assert_eq!(Outcome::from_status(StatusCode::OK, ""), Outcome::Created);
        assert_eq!(
            Outcome::from_status(StatusCode::CREATED, "{}"),
            Outcome::Created
        );
        assert_eq!(
            Outcome::from_status(StatusCode::NO_CONTENT, ""),
            Outcome::Created
        );
        assert!(matches!(
            Outcome::from_status(StatusCode::TOO_MANY_REQUESTS, "slow down"),
            Outcome::Throttled { .. }
        ));
        assert!(matches!(
            Outcome::from_status(StatusCode::BAD_REQUEST, "no such field"),
            Outcome::Rejected { status: 400, .. }
        ));
        assert!(matches!(
            Outcome::from_status(StatusCode::INTERNAL_SERVER_ERROR, "oops"),
            Outcome::ServerError { status: 500, .. }
        ));
    }

    #[test]
    fn retryable_covers_throttle_server_and_network() {
        assert!(Outcome::from_status(StatusCode::TOO_MANY_REQUESTS, "").is_retryable());
        assert!(Outcome::from_status(StatusCode::BAD_GATEWAY, "").is_retryable());
        assert!(Outcome::Network("connection reset".into()).is_retryable());
        assert!(!Outcome::from_status(StatusCode::NOT_FOUND, "").is_retryable());
        assert!(!Outcome::from_status(StatusCode::BAD_REQUEST, "").is_retryable());
        assert!(!Outcome::Created.is_retryable());
    }

    #[test]
    fn long_bodies_are_truncated_in_descriptions() {
        let body = "x".repeat(500);
        let outcome = Outcome::from_status(StatusCode::BAD_REQUEST, &body);
        let desc = outcome.describe();
        assert!(desc.len() < 300);
        assert!(desc.ends_with("..."));
    }

    #[test]
    fn short_bodies_are_kept_verbatim() {
        let outcome = Outcome::from_status(StatusCode::BAD_REQUEST, " field missing \n");
        assert_eq!(outcome.describe(), "HTTP 400: field missing");
    }
}
