//! reqwest implementation of [`ReplicaApi`].

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::error::ApiError;

use super::types::{
    CompletionRequest, CompletionResponse, NewReplica, NewUser, ReplicaList, ReplicaRecord,
    UserRecord,
};
use super::{ApiAuth, ReplicaApi};

pub(crate) const ORGANIZATION_SECRET_HEADER: &str = "X-ORGANIZATION-SECRET";
pub(crate) const USER_ID_HEADER: &str = "X-USER-ID";
pub(crate) const API_VERSION_HEADER: &str = "X-API-Version";

/// HTTP client for the replica API.
#[derive(Clone)]
pub struct HttpReplicaApi {
    base_url: Url,
    api_version: String,
    http: reqwest::Client,
}

impl HttpReplicaApi {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ApiError::Config(format!("invalid base URL {:?}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Config(format!(
                "base URL {:?} cannot carry a path",
                config.base_url
            )));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            api_version: config.api_version.clone(),
            http,
        })
    }

    /// Append percent-encoded path segments to the base URL.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub(crate) fn request(&self, method: Method, segments: &[&str], auth: &ApiAuth) -> RequestBuilder {
        let mut request = self
            .http
            .request(method, self.endpoint(segments))
            .header(ORGANIZATION_SECRET_HEADER, auth.credential().expose())
            .header(API_VERSION_HEADER, &self.api_version);
        if let Some(user_id) = auth.user_id() {
            request = request.header(USER_ID_HEADER, user_id);
        }
        request
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let body = match serde_json::from_str::<serde_json::Value>(&text) {
                Ok(json) => json,
                Err(_) => serde_json::Value::String(text),
            };
            debug!(status = status.as_u16(), "Replica API returned an error status");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&text).map_err(|e| {
            warn!(error = %e, "Unexpected replica API response body");
            ApiError::Parse(e.to_string())
        })
    }
}

#[async_trait]
impl ReplicaApi for HttpReplicaApi {
    async fn get_user(&self, auth: &ApiAuth, user_id: &str) -> Result<UserRecord, ApiError> {
        debug!(user_id, "GET user");
        self.send(self.request(Method::GET, &["v1", "users", user_id], auth))
            .await
    }

    async fn create_user(&self, auth: &ApiAuth, user: &NewUser) -> Result<UserRecord, ApiError> {
        debug!(user_id = %user.id, "POST user");
        self.send(self.request(Method::POST, &["v1", "users"], auth).json(user))
            .await
    }

    async fn list_replicas(&self, auth: &ApiAuth) -> Result<ReplicaList, ApiError> {
        debug!("GET replicas");
        self.send(self.request(Method::GET, &["v1", "replicas"], auth))
            .await
    }

    async fn create_replica(
        &self,
        auth: &ApiAuth,
        replica: &NewReplica,
    ) -> Result<ReplicaRecord, ApiError> {
        debug!(slug = %replica.slug, "POST replica");
        self.send(self.request(Method::POST, &["v1", "replicas"], auth).json(replica))
            .await
    }

    async fn post_completion(
        &self,
        auth: &ApiAuth,
        replica_id: &str,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ApiError> {
        debug!(replica_id, "POST chat completion");
        self.send(
            self.request(
                Method::POST,
                &["v1", "replicas", replica_id, "chat", "completions"],
                auth,
            )
            .json(request),
        )
        .await
    }
}
