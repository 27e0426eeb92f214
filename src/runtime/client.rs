//! Decision runtime API client: discovery, descriptors, metadata, execution.

use crate::error::RuntimeError;
use crate::openapi::ServiceDescriptor;
use crate::runtime::credentials::Credentials;
use crate::runtime::types::{check_incident, decision_service_ids, string_values, MetadataMap};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use std::collections::HashMap;
use tracing::debug;
use url::Url;

/// Operations the synchronization engine needs from the decision runtime.
#[async_trait]
pub trait DecisionRuntime: Send + Sync {
    /// Ids of the decision services deployed in `space`, first-seen order.
    async fn list_deployed_service_ids(&self, space: &str) -> Result<Vec<String>, RuntimeError>;

    /// API descriptor of one decision service.
    async fn fetch_service_descriptor(
        &self,
        space: &str,
        service_id: &str,
    ) -> Result<ServiceDescriptor, RuntimeError>;

    /// String metadata of a decision, keyed by metadata name. Carries the
    /// tool name overrides of all its operations.
    ///
    /// A decision without metadata yields an empty map.
    async fn decision_metadata(
        &self,
        space: &str,
        decision_id: &str,
    ) -> Result<HashMap<String, String>, RuntimeError>;

    /// Execute an operation and return the runtime's JSON output as text.
    async fn execute(
        &self,
        space: &str,
        service_id: &str,
        operation_id: &str,
        input: &serde_json::Value,
    ) -> Result<String, RuntimeError>;
}

/// HTTP client for the decision runtime REST API.
#[derive(Debug, Clone)]
pub struct HttpDecisionRuntime {
    base_url: Url,
    credentials: Credentials,
    http: reqwest::Client,
}

impl HttpDecisionRuntime {
    /// Create a new decision runtime client.
    ///
    /// `base_url` must be an absolute URL that can carry a path, such as
    /// `https://host/api/v1`.
    pub fn new(base_url: &str, credentials: Credentials) -> Result<Self, RuntimeError> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(RuntimeError::UnsupportedUrl(base_url.to_string()));
        }
        Ok(Self {
            base_url,
            credentials,
            http: reqwest::Client::new(),
        })
    }

    /// Base URL extended by `segments`, each percent-encoded as one segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Always Ok: `new` rejects cannot-be-a-base URLs.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn space_url(&self, space: &str, rest: &[&str]) -> Url {
        let mut segments = vec!["deploymentSpaces", space];
        segments.extend_from_slice(rest);
        self.endpoint(&segments)
    }

    fn selector_url(&self, space: &str, rest: &[&str]) -> Url {
        let mut segments = vec![
            "selectors",
            "lastDeployedDecisionService",
            "deploymentSpaces",
            space,
        ];
        segments.extend_from_slice(rest);
        self.endpoint(&segments)
    }

    /// Send a request and return the body. A 404 yields `None`.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Option<String>, RuntimeError> {
        let resp = request
            .header(AUTHORIZATION, self.credentials.authorization_header())
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(RuntimeError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(Some(body))
    }

    /// Like [`send`](Self::send), but a 404 is an error.
    async fn send_expecting(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<String, RuntimeError> {
        self.send(request).await?.ok_or_else(|| RuntimeError::Status {
            status: StatusCode::NOT_FOUND.as_u16(),
            body: format!("{what} not found"),
        })
    }
}

#[async_trait]
impl DecisionRuntime for HttpDecisionRuntime {
    async fn list_deployed_service_ids(&self, space: &str) -> Result<Vec<String>, RuntimeError> {
        let url = self.space_url(space, &["metadata"]);
        debug!("Listing decision services in {}", space);

        let body = self
            .send_expecting(
                self.http.get(url).query(&[("names", "decisionServiceId")]),
                "deployment space",
            )
            .await?;

        let deployments: Vec<MetadataMap> = serde_json::from_str(&body)?;
        Ok(decision_service_ids(&deployments))
    }

    async fn fetch_service_descriptor(
        &self,
        space: &str,
        service_id: &str,
    ) -> Result<ServiceDescriptor, RuntimeError> {
        let url = self.selector_url(space, &["openapi"]);
        debug!("Fetching descriptor of {} in {}", service_id, space);

        let body = self
            .send_expecting(
                self.http.get(url).query(&[
                    ("decisionServiceId", service_id),
                    ("outputFormat", "JSON/openapi"),
                ]),
                "decision service",
            )
            .await?;

        let value: serde_json::Value = serde_json::from_str(&body)?;
        check_incident(&value)?;
        Ok(serde_json::from_value(value)?)
    }

    async fn decision_metadata(
        &self,
        space: &str,
        decision_id: &str,
    ) -> Result<HashMap<String, String>, RuntimeError> {
        let url = self.space_url(space, &["decisions", decision_id, "metadata"]);
        debug!("Fetching metadata of {} in {}", decision_id, space);

        let Some(body) = self.send(self.http.get(url)).await? else {
            return Ok(HashMap::new());
        };

        let value: serde_json::Value = serde_json::from_str(&body)?;
        check_incident(&value)?;
        let metadata: MetadataMap = serde_json::from_value(value)?;
        Ok(string_values(&metadata))
    }

    async fn execute(
        &self,
        space: &str,
        service_id: &str,
        operation_id: &str,
        input: &serde_json::Value,
    ) -> Result<String, RuntimeError> {
        let url = self.selector_url(space, &["operations", operation_id, "execute"]);
        debug!("Executing {}/{} in {}", service_id, operation_id, space);

        let body = self
            .send_expecting(
                self.http
                    .post(url)
                    .query(&[("decisionServiceId", service_id)])
                    .json(input),
                "decision operation",
            )
            .await?;

        // Non-JSON output is passed through untouched.
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&body) {
            check_incident(&value)?;
        }
        Ok(body)
    }
}
