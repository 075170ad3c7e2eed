//! Lazily provisions the demo user and replica on the remote side.

use tracing::{debug, info};

use crate::api::{ApiAuth, LlmSettings, NewReplica, NewUser, ReplicaApi};
use crate::config::DemoConfig;
use crate::credential::Credential;
use crate::error::{ApiError, ChatError};

/// Replica resolved for a specific credential
#[derive(Debug, Clone)]
struct ResolvedSession {
    credential: Credential,
    replica_id: String,
}

/// Resolves the replica to chat with, creating remote records on first use.
///
/// The resolved id is cached together with the credential it was obtained
/// with; a different credential never reuses it.
#[derive(Debug, Clone)]
pub struct SessionProvisioner {
    demo: DemoConfig,
    resolved: Option<ResolvedSession>,
}

impl SessionProvisioner {
    pub fn new(demo: DemoConfig) -> Self {
        Self {
            demo,
            resolved: None,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.demo.user_id
    }

    /// Cached replica id for `credential`, without any network call.
    pub fn cached(&self, credential: &Credential) -> Option<&str> {
        self.resolved
            .as_ref()
            .filter(|r| &r.credential == credential)
            .map(|r| r.replica_id.as_str())
    }

    pub fn invalidate(&mut self) {
        if self.resolved.take().is_some() {
            debug!("Cleared cached replica id");
        }
    }

    /// Return the replica id for `credential`, provisioning if needed.
    pub async fn ensure_replica(
        &mut self,
        api: &dyn ReplicaApi,
        credential: &Credential,
    ) -> Result<String, ChatError> {
        if let Some(replica_id) = self.cached(credential) {
            return Ok(replica_id.to_string());
        }

        let replica_id = self.provision(api, credential).await.map_err(|e| {
            debug!(error = %e, "Session provisioning failed");
            ChatError::Provisioning(e)
        })?;

        info!(replica_id = %replica_id, user_id = %self.demo.user_id, "Session ready");
        self.resolved = Some(ResolvedSession {
            credential: credential.clone(),
            replica_id: replica_id.clone(),
        });
        Ok(replica_id)
    }

    async fn provision(&self, api: &dyn ReplicaApi, credential: &Credential) -> Result<String, ApiError> {
        let org = ApiAuth::organization(credential.clone());
        self.ensure_user(api, &org).await?;

        let user = org.for_user(self.demo.user_id.clone());
        self.ensure_demo_replica(api, &user).await
    }

    /// Only a 404 means "missing"; any other lookup failure aborts.
    async fn ensure_user(&self, api: &dyn ReplicaApi, org: &ApiAuth) -> Result<(), ApiError> {
        match api.get_user(org, &self.demo.user_id).await {
            Ok(_) => {
                debug!(user_id = %self.demo.user_id, "Demo user exists");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                info!(user_id = %self.demo.user_id, "Creating demo user");
                let user = NewUser {
                    id: self.demo.user_id.clone(),
                    email: self.demo.user_email(),
                    name: self.demo.user_name.clone(),
                };
                api.create_user(org, &user).await.map(|_| ())
            }
            Err(e) => Err(e),
        }
    }

    async fn ensure_demo_replica(&self, api: &dyn ReplicaApi, user: &ApiAuth) -> Result<String, ApiError> {
        let replicas = api.list_replicas(user).await?;
        if let Some(existing) = replicas.find_by_slug(&self.demo.replica_slug) {
            debug!(replica_id = %existing.uuid, "Found demo replica");
            return Ok(existing.uuid.clone());
        }

        info!(slug = %self.demo.replica_slug, "Creating demo replica");
        let created = api.create_replica(user, &self.new_replica()).await?;
        if created.uuid.is_empty() {
            return Err(ApiError::Parse("replica creation returned no uuid".to_string()));
        }
        Ok(created.uuid)
    }

    fn new_replica(&self) -> NewReplica {
        NewReplica {
            name: self.demo.replica_name.clone(),
            short_description: self.demo.replica_description.clone(),
            greeting: self.demo.replica_greeting.clone(),
            slug: self.demo.replica_slug.clone(),
            owner_id: self.demo.user_id.clone(),
            llm: LlmSettings {
                model: self.demo.model.clone(),
                memory_mode: self.demo.memory_mode.clone(),
                system_message: self.demo.system_message.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{Call, FakeApi};
    use std::io;
    use std::sync::{Arc, Mutex};

    fn cred(s: &str) -> Credential {
        Credential::new(s).unwrap()
    }

    fn provisioner() -> SessionProvisioner {
        SessionProvisioner::new(DemoConfig::default())
    }

    #[tokio::test]
    async fn fresh_org_creates_user_and_replica_once() {
        let api = FakeApi::new();
        let mut prov = provisioner();

        let first = prov.ensure_replica(&api, &cred("k1")).await.unwrap();
        let calls_after_first = api.calls().len();
        let second = prov.ensure_replica(&api, &cred("k1")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(api.calls().len(), calls_after_first, "second call must be cached");
        assert_eq!(api.count(|c| matches!(c, Call::CreateUser { .. })), 1);
        assert_eq!(api.count(|c| matches!(c, Call::CreateReplica { .. })), 1);
        assert_eq!(
            api.calls()[1],
            Call::CreateUser {
                id: "sample-user".into(),
                email: "sample-user@example.com".into()
            }
        );
    }

    #[tokio::test]
    async fn existing_records_are_adopted() {
        let api = FakeApi::new()
            .with_user("sample-user")
            .with_replica("other-uuid", "someone-else")
            .with_replica("demo-uuid", "sample-replica");
        let mut prov = provisioner();

        let id = prov.ensure_replica(&api, &cred("k1")).await.unwrap();
        assert_eq!(id, "demo-uuid");
        assert_eq!(
            api.calls(),
            vec![
                Call::GetUser {
                    user_id: "sample-user".into(),
                    scoped_user: None
                },
                Call::ListReplicas {
                    scoped_user: Some("sample-user".into())
                },
            ]
        );
    }

    #[tokio::test]
    async fn replica_is_owned_by_demo_user() {
        let api = FakeApi::new().with_user("sample-user");
        let mut prov = provisioner();

        prov.ensure_replica(&api, &cred("k1")).await.unwrap();
        assert!(api.calls().contains(&Call::CreateReplica {
            slug: "sample-replica".into(),
            owner_id: "sample-user".into()
        }));
    }

    #[tokio::test]
    async fn different_credential_reprovisions() {
        let api = FakeApi::new().with_user("sample-user").with_replica("demo-uuid", "sample-replica");
        let mut prov = provisioner();

        prov.ensure_replica(&api, &cred("k1")).await.unwrap();
        assert!(prov.cached(&cred("k1")).is_some());
        assert!(prov.cached(&cred("k2")).is_none());

        let before = api.calls().len();
        prov.ensure_replica(&api, &cred("k2")).await.unwrap();
        assert!(api.calls().len() > before);
        assert!(prov.cached(&cred("k1")).is_none());
    }

    #[tokio::test]
    async fn invalidate_forces_lookup() {
        let api = FakeApi::new().with_user("sample-user").with_replica("demo-uuid", "sample-replica");
        let mut prov = provisioner();

        prov.ensure_replica(&api, &cred("k1")).await.unwrap();
        prov.invalidate();
        assert!(prov.cached(&cred("k1")).is_none());

        let before = api.calls().len();
        prov.ensure_replica(&api, &cred("k1")).await.unwrap();
        assert_eq!(api.calls().len(), before + 2);
    }

    #[tokio::test]
    async fn non_404_lookup_failure_is_not_treated_as_missing() {
        let api = FakeApi::new();
        *api.get_user_error.lock().unwrap() = Some(ApiError::Status {
            status: 401,
            body: serde_json::json!({"error": "Invalid organization secret"}),
        });
        let mut prov = provisioner();

        let err = prov.ensure_replica(&api, &cred("bad")).await.unwrap_err();
        assert!(matches!(err, ChatError::Provisioning(ApiError::Status { status: 401, .. })));
        assert_eq!(err.to_string(), "Failed to initialize session. Please check your API key.");
        assert_eq!(api.count(|c| matches!(c, Call::CreateUser { .. })), 0);
        assert!(prov.cached(&cred("bad")).is_none());
    }

    #[tokio::test]
    async fn listing_failure_is_wrapped_and_not_cached() {
        let api = FakeApi::new().with_user("sample-user");
        *api.list_error.lock().unwrap() = Some(ApiError::Network("connection reset".into()));
        let mut prov = provisioner();

        let err = prov.ensure_replica(&api, &cred("k1")).await.unwrap_err();
        assert!(matches!(err, ChatError::Provisioning(ApiError::Network(_))));
        assert!(prov.cached(&cred("k1")).is_none());

        // Next attempt retries from scratch and succeeds.
        let id = prov.ensure_replica(&api, &cred("k1")).await.unwrap();
        assert_eq!(id, "replica-1");
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn failure_cause_is_hidden_at_default_log_level() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new(crate::DEFAULT_LOG_FILTER))
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let api = FakeApi::new();
        *api.get_user_error.lock().unwrap() = Some(ApiError::Status {
            status: 401,
            body: serde_json::json!({"error": "Invalid organization secret"}),
        });
        let err = provisioner().ensure_replica(&api, &cred("bad")).await.unwrap_err();
        assert!(matches!(err, ChatError::Provisioning(_)));

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(!output.contains("Invalid organization secret"), "{output}");
    }
}
