//! In-memory reference implementation of the [`Identity`] contract.
//!
//! Users are registered ahead of time (see the `admin` CLI
//! subcommand); a subject with no registered entry is `Unknown` to
//! `requires_password`, which AUTHINFO USER treats as an outright
//! `481` without ever calling `authenticate`. `authenticate` itself
//! still accepts an unregistered subject with no password, since
//! nothing stops a caller other than AUTHINFO USER from invoking it
//! directly (ingestion's submitter checks, for one).

use super::{Identity, IdentityError, PasswordRequirement};
use crate::article::ArticleHeaders;
use crate::wire::MessageId;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

pub struct MemoryIdentity {
    host: String,
    /// username -> required password, `None` meaning registered but
    /// passwordless.
    users: RwLock<HashMap<String, Option<String>>>,
    tokens: RwLock<HashMap<String, String>>,
}

impl MemoryIdentity {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            users: RwLock::new(HashMap::new()),
            tokens: RwLock::new(HashMap::new()),
        }
    }

    pub async fn register(&self, username: impl Into<String>, password: Option<String>) {
        self.users.write().await.insert(username.into(), password);
    }
}

#[async_trait]
impl Identity for MemoryIdentity {
    async fn requires_password(&self, subject: &str) -> Result<PasswordRequirement> {
        Ok(match self.users.read().await.get(subject) {
            Some(Some(_)) => PasswordRequirement::Required,
            Some(None) => PasswordRequirement::NotRequired,
            None => PasswordRequirement::Unknown,
        })
    }

    async fn authenticate(&self, subject: &str, password: Option<&str>) -> Result<String> {
        match self.users.read().await.get(subject) {
            Some(Some(expected)) => {
                if password != Some(expected.as_str()) {
                    return Err(IdentityError::InvalidPassword.into());
                }
            }
            Some(None) | None => {}
        }
        let token = Uuid::new_v4().to_string();
        self.tokens.write().await.insert(token.clone(), subject.to_string());
        Ok(token)
    }

    async fn is_valid(&self, token: &str) -> Result<bool> {
        Ok(self.tokens.read().await.contains_key(token))
    }

    fn create_message_id(&self, _headers: &ArticleHeaders) -> MessageId {
        let candidate = format!("<{}@{}>", Uuid::new_v4(), self.host);
        MessageId::parse(&candidate).expect("synthesized message-id is always well-formed")
    }

    fn host_identifier(&self) -> &str {
        &self.host
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
