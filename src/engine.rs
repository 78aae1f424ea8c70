//! The per-connection Protocol Engine (spec §4.1): owns a session's
//! [`SessionState`] plus its borrowed Store/Identity/Policy handles for
//! the connection's lifetime, drives the greeting and read-dispatch
//! loop, and closes resources in the defined order on exit.

use crate::article::ArticleHeaders;
use crate::conn::Conn;
use crate::handlers::{self, Flow};
use crate::identity::DynIdentity;
use crate::parse::parse_command;
use crate::policy::DynPolicy;
use crate::responses;
use crate::session::SessionState;
use crate::store::{DynStore, PostingMode};
use crate::wire::{NewsgroupName, format_compact_datetime};
use anyhow::Result;
use chrono::Utc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};

/// Fixed, server-wide identity presented in the greeting and used to
/// name the local event log newsgroup (spec §4.1).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub server_name: String,
    pub server_version: String,
    pub local_log_group: NewsgroupName,
    /// A session idle this long between request lines is closed. The
    /// wire protocol itself defines no such timeout (§5); this is the
    /// transport-layer policy this crate's deployments are given.
    pub idle_timeout: Duration,
}

/// One Protocol Engine per accepted connection (spec §2). `store`,
/// `identity`, and `policy` are borrowed handles to the three external
/// collaborators of §6; `session` is owned exclusively.
pub struct Engine {
    pub(crate) store: DynStore,
    pub(crate) identity: DynIdentity,
    pub(crate) policy: DynPolicy,
    pub(crate) session: SessionState,
    pub(crate) config: EngineConfig,
}

impl Engine {
    pub fn new(store: DynStore, identity: DynIdentity, policy: DynPolicy, config: EngineConfig) -> Self {
        Self {
            store,
            identity,
            policy,
            session: SessionState::new(),
            config,
        }
    }

    /// Ensure the local log newsgroup exists (creating it Prohibited
    /// if not) and append a connection event to it, temporarily
    /// flipping its posting mode to Allowed and restoring it
    /// afterwards (spec §4.1).
    async fn record_connection_event(&self) -> Result<()> {
        let name = self.config.local_log_group.clone();
        if self.store.get_group(&name).await?.is_none() {
            self.store
                .add_group(
                    name.clone(),
                    "server event log".into(),
                    PostingMode::Prohibited,
                    Utc::now(),
                    self.config.server_name.clone(),
                    false,
                )
                .await?;
        }
        let Some(group) = self.store.get_group(&name).await? else {
            return Ok(());
        };
        let original_mode = group.posting_mode;
        self.store.set_posting_mode(&name, PostingMode::Allowed).await?;

        let message_id = self.identity.create_message_id(&ArticleHeaders::new());
        let mut headers = ArticleHeaders::new();
        headers.set("Message-ID", message_id.as_str().to_string());
        headers.set("Newsgroups", name.as_str().to_string());
        headers.set("From", self.config.server_name.clone());
        headers.set("Subject", "connection opened".into());
        headers.set("Date", format_compact_datetime(Utc::now()));
        headers.set("Path", self.identity.host_identifier().to_string());
        let body = format!(
            "{} {} accepted a client connection\r\n",
            self.config.server_name, self.config.server_version
        );
        self.store.add_article(&name, &message_id, &headers, &body, false).await?;
        self.store.set_posting_mode(&name, original_mode).await?;
        Ok(())
    }

    /// Run the engine to completion over `stream`: greeting, the
    /// read-dispatch loop, and the defined resource close order on
    /// exit (spec §4.1, §5).
    pub async fn run<S>(mut self, stream: S) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        if let Err(err) = self.record_connection_event().await {
            tracing::warn!(%err, "failed to record connection event in the local log newsgroup");
        }

        let mut conn = Conn::new(stream);

        let posting_allowed = self.policy.is_posting_allowed_by(None).await.unwrap_or(false);
        let greeting = format!(
            "{} {} {}",
            if posting_allowed { 200 } else { 201 },
            self.config.server_name,
            self.config.server_version
        );
        conn.write_line(&greeting).await?;
        conn.flush().await?;

        loop {
            let line = match tokio::time::timeout(self.config.idle_timeout, conn.read_line()).await {
                Ok(Ok(Some(line))) => line,
                Ok(Ok(None)) => break,
                Ok(Err(err)) => {
                    tracing::warn!(%err, "transport read failed");
                    let _ = conn.write_const(responses::RESP_500_UNKNOWN_COMMAND).await;
                    break;
                }
                Err(_) => {
                    tracing::debug!("closing idle connection");
                    break;
                }
            };

            let Ok((_, cmd)) = parse_command(&line) else {
                conn.write_const(responses::RESP_501_SYNTAX).await?;
                continue;
            };

            tracing::debug!(command = %cmd.name, "dispatching command");

            match handlers::dispatch(&mut self, &mut conn, &cmd).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(err) => {
                    tracing::error!(%err, "unrecoverable error handling command");
                    let _ = conn.write_const(responses::RESP_500_UNKNOWN_COMMAND).await;
                    break;
                }
            }
            conn.flush().await?;
        }

        drop(conn);
        let _ = self.identity.close().await;
        let _ = self.policy.close().await;
        let _ = self.store.close().await;
        Ok(())
    }
}
