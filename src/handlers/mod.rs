//! Command dispatcher (spec §4.2, §4.3): tokenized request lines are
//! mapped to a handler by keyword (and sub-keyword for LIST/MODE/
//! AUTHINFO); commands outside the session's active capability set are
//! answered `502` without reaching a handler.

mod article;
mod auth;
mod group;
mod list;
mod misc;
mod over;
mod post;
mod resolve;

use crate::conn::Conn;
use crate::engine::Engine;
use crate::parse::Command;
use crate::responses;
use crate::session::Capability;
use anyhow::Result;
use tokio::io::{AsyncRead, AsyncWrite};

/// What the engine loop should do after a handler returns.
pub enum Flow {
    Continue,
    Quit,
}

/// The capability a keyword belongs to, for handlers gated by the
/// active set. Commands not listed here are either mandatory (handled
/// directly in [`dispatch`]) or unrecognized.
fn capability_for(keyword: &str) -> Option<Capability> {
    match keyword {
        "ARTICLE" | "HEAD" | "BODY" | "STAT" | "GROUP" | "LISTGROUP" | "LAST" | "NEXT" | "HDR" | "XPAT" => {
            Some(Capability::Reader)
        }
        "LIST" => Some(Capability::List),
        "NEWGROUPS" | "NEWNEWS" => Some(Capability::NewNews),
        "OVER" | "XOVER" => Some(Capability::Over),
        "POST" => Some(Capability::Post),
        "IHAVE" => Some(Capability::Ihave),
        _ => None,
    }
}

/// Map a tokenized request line to its handler and run it, enforcing
/// the session's active capability set along the way.
pub async fn dispatch<S>(engine: &mut Engine, conn: &mut Conn<S>, cmd: &Command) -> Result<Flow>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let keyword = cmd.name.as_str();

    // Mandatory commands are always active, independent of MODE READER.
    match keyword {
        "QUIT" => {
            conn.write_const(responses::RESP_205_CLOSING).await?;
            let _ = engine.store.commit().await;
            return Ok(Flow::Quit);
        }
        "DATE" => return misc::handle_date(conn, cmd).await,
        "HELP" => return misc::handle_help(conn, cmd).await,
        "CAPABILITIES" => return misc::handle_capabilities(engine, conn, cmd).await,
        "MODE" => return misc::handle_mode(engine, conn, cmd).await,
        "AUTHINFO" => return auth::handle_authinfo(engine, conn, cmd).await,
        _ => {}
    }

    let Some(capability) = capability_for(keyword) else {
        conn.write_const(responses::RESP_502_UNKNOWN).await?;
        return Ok(Flow::Continue);
    };
    if !engine.session.is_active(capability) {
        conn.write_const(responses::RESP_502_UNKNOWN).await?;
        return Ok(Flow::Continue);
    }

    match keyword {
        "ARTICLE" => article::handle(engine, conn, cmd, article::Flavor::Article).await,
        "HEAD" => article::handle(engine, conn, cmd, article::Flavor::Head).await,
        "BODY" => article::handle(engine, conn, cmd, article::Flavor::Body).await,
        "STAT" => article::handle(engine, conn, cmd, article::Flavor::Stat).await,
        "GROUP" => group::handle_group(engine, conn, cmd).await,
        "LISTGROUP" => group::handle_listgroup(engine, conn, cmd).await,
        "LAST" => group::handle_last(engine, conn).await,
        "NEXT" => group::handle_next(engine, conn).await,
        "LIST" => list::handle_list(engine, conn, cmd).await,
        "NEWGROUPS" => list::handle_newgroups(engine, conn, cmd).await,
        "NEWNEWS" => list::handle_newnews(engine, conn, cmd).await,
        "POST" => post::handle_post(engine, conn, cmd).await,
        "IHAVE" => post::handle_ihave(engine, conn, cmd).await,
        "OVER" | "XOVER" => over::handle_over(engine, conn, cmd).await,
        "HDR" => over::handle_hdr(engine, conn, cmd).await,
        "XPAT" => over::handle_xpat(engine, conn, cmd).await,
        _ => {
            conn.write_const(responses::RESP_502_UNKNOWN).await?;
            Ok(Flow::Continue)
        }
    }
}

/// Translate a [`resolve::ResolveError`] into its response code.
async fn write_resolve_error<S>(conn: &mut Conn<S>, err: resolve::ResolveError) -> Result<Flow>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    use resolve::ResolveError::*;
    conn.write_const(match err {
        NoGroup => responses::RESP_412_NO_GROUP,
        NoCurrent => responses::RESP_420_NO_CURRENT,
        NoSuchNumber => responses::RESP_423_RANGE_EMPTY,
        NoSuchId => responses::RESP_430_NO_ARTICLE,
    })
    .await?;
    Ok(Flow::Continue)
}

/// Parse the `n`, `n-m`, or `n-` range forms OVER/HDR/XPAT accept. A
/// leading-dash `-m` form (no low bound) is rejected, per spec §4.11.
fn parse_over_range(raw: &str) -> Option<(crate::wire::ArticleNumber, Option<crate::wire::ArticleNumber>)> {
    if let Some(idx) = raw.find('-') {
        let (low_s, rest) = raw.split_at(idx);
        let high_s = &rest[1..];
        if low_s.is_empty() {
            return None;
        }
        let low = low_s.parse().ok()?;
        if high_s.is_empty() {
            Some((low, None))
        } else {
            Some((low, Some(high_s.parse().ok()?)))
        }
    } else {
        let n = raw.parse().ok()?;
        Some((n, Some(n)))
    }
}

/// Status letter LIST ACTIVE / NEWGROUPS render for a group's posting
/// mode (spec §4.6).
fn posting_status_letter(mode: crate::store::PostingMode) -> char {
    match mode {
        crate::store::PostingMode::Allowed => 'y',
        crate::store::PostingMode::Moderated => 'm',
        crate::store::PostingMode::Prohibited => 'n',
    }
}
