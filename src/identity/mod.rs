//! The Identity contract (§6.3): authentication and Message-ID
//! synthesis, consumed by AUTHINFO and by POST/IHAVE when an article
//! arrives without its own Message-ID.

use crate::article::ArticleHeaders;
use crate::wire::MessageId;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Whether a subject must present a password to authenticate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordRequirement {
    Required,
    NotRequired,
    /// The subject is not known to this identity service.
    Unknown,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("unknown subject")]
    UnknownSubject,
    #[error("invalid password")]
    InvalidPassword,
}

#[async_trait]
pub trait Identity: Send + Sync {
    async fn requires_password(&self, subject: &str) -> Result<PasswordRequirement>;

    /// Authenticate `subject`, returning an opaque session token on
    /// success.
    async fn authenticate(&self, subject: &str, password: Option<&str>) -> Result<String>;

    async fn is_valid(&self, token: &str) -> Result<bool>;

    /// Synthesize a fresh, globally unique Message-ID for an article
    /// that arrived without one.
    fn create_message_id(&self, headers: &ArticleHeaders) -> MessageId;

    /// This server's identifier, used as the domain part of
    /// synthesized Message-IDs and in the `Path` header.
    fn host_identifier(&self) -> &str;

    async fn close(&self) -> Result<()>;
}

pub type DynIdentity = Arc<dyn Identity>;

pub mod memory;
