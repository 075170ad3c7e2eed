use anyhow::{Context, Result, anyhow, bail};
use std::sync::Arc;

use crate::api::{HttpReplicaApi, ReplicaApi};
use crate::config::{API_KEY_ENV, Config};
use crate::credential::{Credential, CredentialPanel};
use crate::session::ConversationSession;
use crate::ui::ChatRepl;

fn build_session(config: &Config, credential: Option<Credential>) -> Result<ConversationSession> {
    let api: Arc<dyn ReplicaApi> =
        Arc::new(HttpReplicaApi::new(&config.api).context("Failed to set up API client")?);
    Ok(ConversationSession::new(api, config.demo.clone(), credential))
}

/// Interactive chat session
pub async fn chat(config: &Config, credential: Option<Credential>) -> Result<()> {
    let session = build_session(config, credential)?;
    let panel = CredentialPanel::new(config.ui.show_credential);
    ChatRepl::new(session, panel).run().await
}

/// Send one message and print the reply
pub async fn ask(config: &Config, credential: Option<Credential>, message: &str) -> Result<()> {
    let mut session = build_session(config, credential)?;
    match session.submit(message).await {
        Ok(reply) => {
            println!("{}", reply);
            Ok(())
        }
        // Only the user-facing message; causes are already logged.
        Err(e) => Err(anyhow!("{}", e)),
    }
}

/// Print the effective configuration with the secret masked
pub fn show_config(config: &Config, credential: Option<&Credential>) -> Result<()> {
    let path = Config::path()?;
    let panel = CredentialPanel::new(false);

    println!("📄 Config file: {}", path.display());
    if !path.exists() {
        println!("   (not created yet, run 'replica-chat init')");
    }
    println!();
    println!("🌐 API:      {}", config.api.base_url);
    println!("🏷️  Version:  {}", config.api.api_version);
    println!("🔑 API key:  {}", panel.render(credential));
    if credential.is_none() {
        println!("   Set one in the config file, with --api-key, or via {}", API_KEY_ENV);
    }
    println!();
    println!("👤 Demo user:    {} <{}>", config.demo.user_id, config.demo.user_email());
    println!("🤖 Demo replica: {} ({})", config.demo.replica_name, config.demo.replica_slug);
    println!("🧠 Model:        {} [{}]", config.demo.model, config.demo.memory_mode);
    Ok(())
}

/// Write a default config file
pub fn init_config(force: bool) -> Result<()> {
    let path = Config::path()?;
    if path.exists() && !force {
        bail!(
            "Config file already exists at {} (use --force to overwrite)",
            path.display()
        );
    }

    let path = Config::default().save()?;
    println!("✅ Wrote default configuration to {}", path.display());
    println!("   Add your organization secret under [api] organization_secret.");
    Ok(())
}
