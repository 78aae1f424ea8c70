//! TCP accept loop: one [`Engine`] per accepted connection, each
//! running on its own spawned task against the shared Store/Identity/
//! Policy handles.

use crate::config::Config;
use crate::engine::{Engine, EngineConfig};
use crate::identity::DynIdentity;
use crate::policy::DynPolicy;
use crate::store::DynStore;
use crate::wire::NewsgroupName;
use anyhow::{Context, Result};
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Bind `cfg.addr` and serve connections until the process is
/// interrupted, spawning one [`Engine`] task per accepted socket.
pub async fn run(cfg: Config, store: DynStore, identity: DynIdentity, policy: DynPolicy) -> Result<()> {
    store.init().await.context("initializing store")?;

    let listener = TcpListener::bind(&cfg.addr)
        .await
        .with_context(|| format!("binding listen address {}", cfg.addr))?;
    info!(addr = %cfg.addr, "nntp-postus listening");

    let local_log_group = NewsgroupName::parse(&cfg.local_log_group)
        .context("local_log_group in configuration is not a valid newsgroup name")?;
    let engine_config = EngineConfig {
        server_name: cfg.server_name.clone(),
        server_version: cfg.server_version.clone(),
        local_log_group,
        idle_timeout: Duration::from_secs(cfg.idle_timeout_secs),
    };

    loop {
        let (socket, peer_addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                error!(%err, "failed to accept connection");
                continue;
            }
        };
        info!(%peer_addr, "accepted connection");

        let engine = Engine::new(store.clone(), identity.clone(), policy.clone(), engine_config.clone());
        tokio::spawn(async move {
            if let Err(err) = engine.run(socket).await {
                error!(%peer_addr, %err, "connection ended with an error");
            }
        });
    }
}
