//! ARTICLE / HEAD / BODY / STAT (spec §4.4): a single shared handler
//! parameterized by which parts of the article to send.

use super::resolve::{self, SelectorError};
use super::{Flow, write_resolve_error};
use crate::conn::Conn;
use crate::engine::Engine;
use crate::parse::Command;
use crate::responses;
use anyhow::Result;
use tokio::io::{AsyncRead, AsyncWrite};

#[derive(Clone, Copy)]
pub enum Flavor {
    Article,
    Head,
    Body,
    Stat,
}

impl Flavor {
    fn code(self) -> u16 {
        match self {
            Flavor::Article => 220,
            Flavor::Head => 221,
            Flavor::Body => 222,
            Flavor::Stat => 223,
        }
    }

    fn send_headers(self) -> bool {
        matches!(self, Flavor::Article | Flavor::Head)
    }

    fn send_body(self) -> bool {
        matches!(self, Flavor::Article | Flavor::Body)
    }
}

pub async fn handle<S>(engine: &mut Engine, conn: &mut Conn<S>, cmd: &Command, flavor: Flavor) -> Result<Flow>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let selector = match resolve::parse_selector(cmd.args.first().map(String::as_str)) {
        Ok(selector) => selector,
        Err(SelectorError::BadMessageId) => {
            conn.write_const(responses::RESP_430_NO_ARTICLE).await?;
            return Ok(Flow::Continue);
        }
        Err(SelectorError::BadNumber) => {
            conn.write_const(responses::RESP_501_SYNTAX).await?;
            return Ok(Flow::Continue);
        }
    };

    let resolved = match resolve::resolve(engine, selector).await? {
        Ok(resolved) => resolved,
        Err(err) => return write_resolve_error(conn, err).await,
    };

    conn.write_line(&format!(
        "{} {} {}",
        flavor.code(),
        resolved.number,
        resolved.article.message_id
    ))
    .await?;

    if flavor.send_headers() {
        for (name, value) in resolved.article.headers.iter_display() {
            conn.write_line(&format!("{name}: {value}")).await?;
        }
    }
    if flavor.send_headers() && flavor.send_body() {
        conn.write_line("").await?;
    }
    if flavor.send_body() {
        conn.write_body_and_terminator(&resolved.article.body).await?;
    } else if flavor.send_headers() {
        conn.write_terminator().await?;
    }

    Ok(Flow::Continue)
}
