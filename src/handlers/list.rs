//! LIST family, NEWGROUPS, NEWNEWS (spec §4.6, §4.8).

use super::{Flow, posting_status_letter};
use crate::conn::Conn;
use crate::engine::Engine;
use crate::overview::OVERVIEW_FORMAT;
use crate::parse::Command;
use crate::responses;
use crate::store::GroupMetrics;
use crate::wildmat::Wildmat;
use crate::wire::parse_compact_datetime;
use anyhow::Result;
use chrono::Utc;
use std::collections::HashSet;
use tokio::io::{AsyncRead, AsyncWrite};

const KNOWN_SUBCOMMANDS: &[&str] = &[
    "ACTIVE",
    "ACTIVE.TIMES",
    "NEWSGROUPS",
    "HEADERS",
    "OVERVIEW.FMT",
    "DISTRIB.PATS",
];

pub async fn handle_list<S>(engine: &mut Engine, conn: &mut Conn<S>, cmd: &Command) -> Result<Flow>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (sub, pattern) = match cmd.args.first() {
        None => ("ACTIVE".to_string(), None),
        Some(first) if KNOWN_SUBCOMMANDS.contains(&first.to_ascii_uppercase().as_str()) => {
            (first.to_ascii_uppercase(), cmd.args.get(1).map(String::as_str))
        }
        Some(first) => ("ACTIVE".to_string(), Some(first.as_str())),
    };

    match sub.as_str() {
        "ACTIVE" => list_active(engine, conn, pattern).await,
        "ACTIVE.TIMES" => list_active_times(engine, conn, pattern).await,
        "NEWSGROUPS" => list_newsgroups(engine, conn, pattern).await,
        "HEADERS" => {
            conn.write_const(responses::RESP_215_HEADERS).await?;
            conn.write_terminator().await?;
            Ok(Flow::Continue)
        }
        "OVERVIEW.FMT" => {
            conn.write_const(responses::RESP_215_OVERVIEW_FMT).await?;
            for field in OVERVIEW_FORMAT {
                conn.write_line(field).await?;
            }
            conn.write_terminator().await?;
            Ok(Flow::Continue)
        }
        "DISTRIB.PATS" => {
            conn.write_line("215 distribution patterns follow").await?;
            conn.write_terminator().await?;
            Ok(Flow::Continue)
        }
        _ => {
            conn.write_const(responses::RESP_501_SYNTAX).await?;
            Ok(Flow::Continue)
        }
    }
}

async fn list_active<S>(engine: &mut Engine, conn: &mut Conn<S>, pattern: Option<&str>) -> Result<Flow>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    conn.write_const(responses::RESP_215_ACTIVE).await?;
    let wildmat = pattern.map(Wildmat::compile);
    for group in engine.store.list_all_groups(false, false).await? {
        if wildmat.as_ref().is_some_and(|w| !w.matches(group.name.as_str())) {
            continue;
        }
        let metrics = engine
            .store
            .group_metrics(&group.name)
            .await?
            .unwrap_or_else(GroupMetrics::empty);
        conn.write_line(&format!(
            "{} {} {} {}",
            group.name,
            metrics.highest,
            metrics.lowest,
            posting_status_letter(group.posting_mode)
        ))
        .await?;
    }
    conn.write_terminator().await?;
    Ok(Flow::Continue)
}

async fn list_active_times<S>(engine: &mut Engine, conn: &mut Conn<S>, pattern: Option<&str>) -> Result<Flow>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    conn.write_const(responses::RESP_215_ACTIVE_TIMES).await?;
    let wildmat = pattern.map(Wildmat::compile);
    for group in engine.store.list_all_groups(false, false).await? {
        if wildmat.as_ref().is_some_and(|w| !w.matches(group.name.as_str())) {
            continue;
        }
        conn.write_line(&format!(
            "{} {} {}",
            group.name,
            group.created_at.timestamp(),
            group.created_by
        ))
        .await?;
    }
    conn.write_terminator().await?;
    Ok(Flow::Continue)
}

async fn list_newsgroups<S>(engine: &mut Engine, conn: &mut Conn<S>, pattern: Option<&str>) -> Result<Flow>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    conn.write_const(responses::RESP_215_NEWSGROUPS).await?;
    let wildmat = pattern.map(Wildmat::compile);
    for group in engine.store.list_all_groups(false, false).await? {
        if wildmat.as_ref().is_some_and(|w| !w.matches(group.name.as_str())) {
            continue;
        }
        conn.write_line(&format!("{} {}", group.name, group.description)).await?;
    }
    conn.write_terminator().await?;
    Ok(Flow::Continue)
}

pub async fn handle_newgroups<S>(engine: &mut Engine, conn: &mut Conn<S>, cmd: &Command) -> Result<Flow>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (Some(date), Some(time)) = (cmd.args.first(), cmd.args.get(1)) else {
        conn.write_const(responses::RESP_501_SYNTAX).await?;
        return Ok(Flow::Continue);
    };
    let Some(since) = parse_compact_datetime(date, time, Utc::now()) else {
        conn.write_const(responses::RESP_501_SYNTAX).await?;
        return Ok(Flow::Continue);
    };

    conn.write_const(responses::RESP_231_NEWGROUPS).await?;
    for group in engine.store.list_all_groups_added_since(since).await? {
        let metrics = engine
            .store
            .group_metrics(&group.name)
            .await?
            .unwrap_or_else(GroupMetrics::empty);
        conn.write_line(&format!(
            "{} {} {} {}",
            group.name,
            metrics.highest,
            metrics.lowest,
            posting_status_letter(group.posting_mode)
        ))
        .await?;
    }
    conn.write_terminator().await?;
    Ok(Flow::Continue)
}

pub async fn handle_newnews<S>(engine: &mut Engine, conn: &mut Conn<S>, cmd: &Command) -> Result<Flow>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (Some(pattern), Some(date), Some(time)) = (cmd.args.first(), cmd.args.get(1), cmd.args.get(2)) else {
        conn.write_const(responses::RESP_501_SYNTAX).await?;
        return Ok(Flow::Continue);
    };
    let Some(since) = parse_compact_datetime(date, time, Utc::now()) else {
        conn.write_const(responses::RESP_501_SYNTAX).await?;
        return Ok(Flow::Continue);
    };
    let wildmat = Wildmat::compile(pattern);

    conn.write_const(responses::RESP_230_NEWNEWS).await?;
    let mut seen = HashSet::new();
    for group in engine.store.list_all_groups(false, false).await? {
        if !wildmat.matches(group.name.as_str()) {
            continue;
        }
        for id in engine.store.article_ids_since(&group.name, since).await? {
            if seen.insert(id.clone()) {
                conn.write_line(id.as_str()).await?;
            }
        }
    }
    conn.write_terminator().await?;
    Ok(Flow::Continue)
}
