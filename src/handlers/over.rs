//! OVER/XOVER (spec §4.11) and the supplemented HDR/XPAT commands
//! (spec §10.5), all three resolved through the same argument forms:
//! none (current article), `<message-id>`, or a numeric range.

use super::resolve::{self, Resolved, ResolveError, Selector, SelectorError};
use super::{Flow, parse_over_range, write_resolve_error};
use crate::article::Article;
use crate::conn::Conn;
use crate::engine::Engine;
use crate::overview::overview_line;
use crate::parse::Command;
use crate::responses;
use crate::store::GroupMetrics;
use crate::wildmat::wildmat;
use crate::wire::{ArticleNumber, NewsgroupName};
use anyhow::Result;
use tokio::io::{AsyncRead, AsyncWrite};

pub async fn handle_over<S>(engine: &mut Engine, conn: &mut Conn<S>, cmd: &Command) -> Result<Flow>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let articles = match resolve_many(engine, cmd.args.first().map(String::as_str)).await? {
        Ok(articles) => articles,
        Err(OverError::Resolve(err)) => return write_resolve_error(conn, err).await,
        Err(OverError::Syntax) => {
            conn.write_const(responses::RESP_501_SYNTAX).await?;
            return Ok(Flow::Continue);
        }
    };
    if articles.is_empty() {
        conn.write_const(responses::RESP_423_RANGE_EMPTY).await?;
        return Ok(Flow::Continue);
    }

    conn.write_const(responses::RESP_224_OVERVIEW).await?;
    for (number, article) in &articles {
        conn.write_line(&overview_line(*number, article)).await?;
    }
    conn.write_terminator().await?;
    Ok(Flow::Continue)
}

pub async fn handle_hdr<S>(engine: &mut Engine, conn: &mut Conn<S>, cmd: &Command) -> Result<Flow>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let Some(header) = cmd.args.first() else {
        conn.write_const(responses::RESP_501_SYNTAX).await?;
        return Ok(Flow::Continue);
    };
    let articles = match resolve_many(engine, cmd.args.get(1).map(String::as_str)).await? {
        Ok(articles) => articles,
        Err(OverError::Resolve(err)) => return write_resolve_error(conn, err).await,
        Err(OverError::Syntax) => {
            conn.write_const(responses::RESP_501_SYNTAX).await?;
            return Ok(Flow::Continue);
        }
    };
    if articles.is_empty() {
        conn.write_const(responses::RESP_423_RANGE_EMPTY).await?;
        return Ok(Flow::Continue);
    }

    conn.write_const(responses::RESP_225_HDR_FOLLOWS).await?;
    for (number, article) in &articles {
        match header_value(article, header) {
            Some(value) => conn.write_line(&format!("{number} {value}")).await?,
            None => conn.write_line(&number.to_string()).await?,
        }
    }
    conn.write_terminator().await?;
    Ok(Flow::Continue)
}

pub async fn handle_xpat<S>(engine: &mut Engine, conn: &mut Conn<S>, cmd: &Command) -> Result<Flow>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (Some(header), Some(selector_arg), Some(pattern)) =
        (cmd.args.first(), cmd.args.get(1), cmd.args.get(2))
    else {
        conn.write_const(responses::RESP_501_SYNTAX).await?;
        return Ok(Flow::Continue);
    };
    let articles = match resolve_many(engine, Some(selector_arg.as_str())).await? {
        Ok(articles) => articles,
        Err(OverError::Resolve(err)) => return write_resolve_error(conn, err).await,
        Err(OverError::Syntax) => {
            conn.write_const(responses::RESP_501_SYNTAX).await?;
            return Ok(Flow::Continue);
        }
    };

    conn.write_const(responses::RESP_225_HDR_FOLLOWS).await?;
    for (number, article) in &articles {
        if let Some(value) = header_value(article, header) {
            if wildmat(pattern, &value) {
                conn.write_line(&format!("{number} {value}")).await?;
            }
        }
    }
    conn.write_terminator().await?;
    Ok(Flow::Continue)
}

fn header_value(article: &Article, header: &str) -> Option<String> {
    if header.eq_ignore_ascii_case("message-id") {
        return Some(article.message_id.as_str().to_string());
    }
    article.headers.first(header).map(str::to_string)
}

enum OverError {
    Resolve(ResolveError),
    Syntax,
}

/// Resolve the shared OVER/HDR/XPAT argument form into zero or more
/// `(number, article)` pairs: none (the current article), a
/// `<message-id>`, or a numeric range.
async fn resolve_many(engine: &mut Engine, arg: Option<&str>) -> Result<Result<Vec<(ArticleNumber, Article)>, OverError>> {
    match arg {
        None => match resolve::resolve(engine, Selector::Current).await? {
            Ok(Resolved { number, article }) => Ok(Ok(vec![(number, article)])),
            Err(err) => Ok(Err(OverError::Resolve(err))),
        },
        Some(s) if s.starts_with('<') => match resolve::parse_selector(Some(s)) {
            Ok(selector) => match resolve::resolve(engine, selector).await? {
                Ok(Resolved { number, article }) => Ok(Ok(vec![(number, article)])),
                Err(err) => Ok(Err(OverError::Resolve(err))),
            },
            Err(SelectorError::BadMessageId) => Ok(Err(OverError::Resolve(ResolveError::NoSuchId))),
            Err(SelectorError::BadNumber) => Ok(Err(OverError::Syntax)),
        },
        Some(s) => {
            let Some((low, high)) = parse_over_range(s) else {
                return Ok(Err(OverError::Syntax));
            };
            let Some(group) = engine.session.current_group().map(str::to_string) else {
                return Ok(Err(OverError::Resolve(ResolveError::NoGroup)));
            };
            let name = NewsgroupName::parse(&group).expect("current group name was validated when it was selected");
            let high = match high {
                Some(h) => h,
                None => {
                    let metrics = engine
                        .store
                        .group_metrics(&name)
                        .await?
                        .unwrap_or_else(GroupMetrics::empty);
                    metrics.highest.max(0) as ArticleNumber
                }
            };
            let articles = engine.store.article_range(&name, low, high).await?;
            Ok(Ok(articles))
        }
    }
}
