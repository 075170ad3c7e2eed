//! Replica API access.
//!
//! [`ReplicaApi`] is the seam between the chat session and the remote
//! service; [`HttpReplicaApi`] talks to the real endpoint over reqwest.
//! Calls are either organization-scoped (secret only) or user-scoped
//! (secret plus end-user id), see [`ApiAuth`].

mod client;
mod error_detail;
mod types;

use async_trait::async_trait;

use crate::credential::Credential;
use crate::error::ApiError;

pub use client::HttpReplicaApi;
pub use error_detail::describe_error;
pub use types::{
    CompletionRequest, CompletionResponse, LlmSettings, NewReplica, NewUser, ReplicaList,
    ReplicaRecord, UserRecord,
};

/// Authentication attached to a single call.
#[derive(Debug, Clone)]
pub struct ApiAuth {
    credential: Credential,
    user_id: Option<String>,
}

impl ApiAuth {
    /// Organization-scoped: no end-user identity attached.
    pub fn organization(credential: Credential) -> Self {
        Self {
            credential,
            user_id: None,
        }
    }

    /// User-scoped: acts on behalf of `user_id`.
    pub fn for_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }
}

#[async_trait]
pub trait ReplicaApi: Send + Sync {
    /// Fails with a 404 status when the user does not exist.
    async fn get_user(&self, auth: &ApiAuth, user_id: &str) -> Result<UserRecord, ApiError>;

    async fn create_user(&self, auth: &ApiAuth, user: &NewUser) -> Result<UserRecord, ApiError>;

    async fn list_replicas(&self, auth: &ApiAuth) -> Result<ReplicaList, ApiError>;

    async fn create_replica(
        &self,
        auth: &ApiAuth,
        replica: &NewReplica,
    ) -> Result<ReplicaRecord, ApiError>;

    async fn post_completion(
        &self,
        auth: &ApiAuth,
        replica_id: &str,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ApiError>;
}
