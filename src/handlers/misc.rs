//! DATE, HELP, CAPABILITIES, MODE READER (spec §4.3, §4.7).

use super::Flow;
use crate::conn::Conn;
use crate::engine::Engine;
use crate::parse::Command;
use crate::responses;
use crate::wire::format_compact_datetime;
use anyhow::Result;
use chrono::Utc;
use tokio::io::{AsyncRead, AsyncWrite};

pub async fn handle_date<S>(conn: &mut Conn<S>, _cmd: &Command) -> Result<Flow>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    conn.write_line(&format!("111 {}", format_compact_datetime(Utc::now())))
        .await?;
    Ok(Flow::Continue)
}

pub async fn handle_help<S>(conn: &mut Conn<S>, _cmd: &Command) -> Result<Flow>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    conn.write_const(responses::RESP_100_HELP_FOLLOWS).await?;
    conn.write_raw(responses::RESP_HELP_TEXT.as_bytes()).await?;
    conn.write_terminator().await?;
    Ok(Flow::Continue)
}

pub async fn handle_capabilities<S>(engine: &mut Engine, conn: &mut Conn<S>, _cmd: &Command) -> Result<Flow>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    conn.write_const(responses::RESP_101_CAPABILITIES).await?;
    conn.write_raw(responses::RESP_CAP_VERSION.as_bytes()).await?;
    for capability in engine.session.active_capabilities() {
        conn.write_line(capability.label()).await?;
    }
    conn.write_terminator().await?;
    Ok(Flow::Continue)
}

pub async fn handle_mode<S>(engine: &mut Engine, conn: &mut Conn<S>, cmd: &Command) -> Result<Flow>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let Some(arg) = cmd.args.first() else {
        conn.write_const(responses::RESP_501_SYNTAX).await?;
        return Ok(Flow::Continue);
    };
    if !arg.eq_ignore_ascii_case("READER") {
        conn.write_const(responses::RESP_501_SYNTAX).await?;
        return Ok(Flow::Continue);
    }
    engine.session.enter_reader_mode();
    let posting_allowed = engine.policy.is_posting_allowed_by(engine.session.subject()).await?;
    conn.write_const(if posting_allowed {
        responses::RESP_200_POSTING_ALLOWED
    } else {
        responses::RESP_201_POSTING_PROHIBITED
    })
    .await?;
    Ok(Flow::Continue)
}
