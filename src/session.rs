use std::sync::Arc;

use tracing::{debug, info};

use crate::api::{ApiAuth, CompletionRequest, ReplicaApi, describe_error};
use crate::config::DemoConfig;
use crate::credential::Credential;
use crate::error::ChatError;
use crate::provisioner::SessionProvisioner;
use crate::transcript::{PlaceholderId, Transcript};

/// Progress of the current exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Idle,
    /// User message appended, session being provisioned
    Submitting,
    /// Completion request in flight
    AwaitingCompletion,
}

/// An exchange accepted by [`ConversationSession::begin_exchange`] that still
/// has to be sent.
#[derive(Debug)]
pub struct PendingExchange {
    content: String,
    credential: Credential,
    placeholder: PlaceholderId,
}

/// Owns the credential, transcript and provisioned session for one user.
pub struct ConversationSession {
    api: Arc<dyn ReplicaApi>,
    credential: Option<Credential>,
    provisioner: SessionProvisioner,
    transcript: Transcript,
    state: ExchangeState,
    completion_source: String,
    last_error: Option<String>,
}

impl ConversationSession {
    pub fn new(api: Arc<dyn ReplicaApi>, demo: DemoConfig, credential: Option<Credential>) -> Self {
        let completion_source = demo.completion_source.clone();
        Self {
            api,
            credential,
            provisioner: SessionProvisioner::new(demo),
            transcript: Transcript::new(),
            state: ExchangeState::Idle,
            completion_source,
            last_error: None,
        }
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Replace the credential. A different value drops the provisioned session.
    pub fn set_credential(&mut self, credential: Option<Credential>) {
        if credential == self.credential {
            return;
        }
        info!(present = credential.is_some(), "API key changed");
        self.provisioner.invalidate();
        self.credential = credential;
        self.last_error = None;
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Clear the visible messages. The provisioned session is kept.
    pub fn clear_transcript(&mut self) {
        self.transcript.clear();
        self.last_error = None;
    }

    pub fn is_busy(&self) -> bool {
        self.state != ExchangeState::Idle
    }

    /// Error to display for the most recent submission, if it failed.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Replica id already resolved for the current credential.
    pub fn replica_id(&self) -> Option<&str> {
        self.credential
            .as_ref()
            .and_then(|c| self.provisioner.cached(c))
    }

    /// Send `text` and return the reply.
    pub async fn submit(&mut self, text: &str) -> Result<String, ChatError> {
        let pending = self.begin_exchange(text)?;
        self.complete_exchange(pending).await
    }

    /// Validate input and append the user message plus an empty assistant
    /// placeholder. Nothing is appended when validation fails.
    pub fn begin_exchange(&mut self, text: &str) -> Result<PendingExchange, ChatError> {
        if self.is_busy() {
            return Err(ChatError::Busy);
        }

        let validation = if text.trim().is_empty() {
            Err(ChatError::EmptyMessage)
        } else {
            self.credential.clone().ok_or(ChatError::MissingCredential)
        };
        let credential = match validation {
            Ok(credential) => credential,
            Err(e) => {
                self.last_error = Some(e.to_string());
                return Err(e);
            }
        };

        self.last_error = None;
        self.transcript.push_user(text);
        let placeholder = self.transcript.push_placeholder();
        self.state = ExchangeState::Submitting;

        Ok(PendingExchange {
            content: text.to_string(),
            credential,
            placeholder,
        })
    }

    /// Provision if needed, request the completion and reconcile the transcript.
    pub async fn complete_exchange(&mut self, pending: PendingExchange) -> Result<String, ChatError> {
        let result = self.run(&pending).await;
        match &result {
            Ok(reply) => {
                self.transcript.fill(pending.placeholder, reply.as_str());
            }
            Err(e) => {
                self.transcript.discard(pending.placeholder);
                self.last_error = Some(e.to_string());
            }
        }
        self.state = ExchangeState::Idle;
        result
    }

    async fn run(&mut self, pending: &PendingExchange) -> Result<String, ChatError> {
        let api = Arc::clone(&self.api);
        let replica_id = self
            .provisioner
            .ensure_replica(api.as_ref(), &pending.credential)
            .await?;

        self.state = ExchangeState::AwaitingCompletion;
        let auth = ApiAuth::organization(pending.credential.clone())
            .for_user(self.provisioner.user_id().to_string());
        let request = CompletionRequest {
            content: pending.content.clone(),
            source: self.completion_source.clone(),
            skip_chat_history: false,
        };

        debug!(replica_id = %replica_id, "Sending message");
        match api.post_completion(&auth, &replica_id, &request).await {
            Ok(response) => Ok(response.content),
            Err(source) => {
                let message = describe_error(&source);
                debug!(error = %source, "Completion request failed");
                Err(ChatError::Completion { message, source })
            }
        }
    }
}
