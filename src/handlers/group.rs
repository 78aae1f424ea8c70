//! GROUP / LISTGROUP / LAST / NEXT (spec §4.5).

use super::Flow;
use crate::conn::Conn;
use crate::engine::Engine;
use crate::parse::Command;
use crate::responses;
use crate::store::GroupMetrics;
use crate::wire::{ArticleNumber, NewsgroupName};
use anyhow::Result;
use tokio::io::{AsyncRead, AsyncWrite};

/// Validate, look up, and select `name` as the current group,
/// resetting `currentArticle` to its first article. Returns `false`
/// (having already written the `411` response) if the group doesn't
/// exist or is ignored.
async fn select_group<S>(engine: &mut Engine, conn: &mut Conn<S>, name: &NewsgroupName) -> Result<bool>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let Some(group) = engine.store.get_group(name).await? else {
        conn.write_line(&format!("411 no such newsgroup: {name}")).await?;
        return Ok(false);
    };
    if group.ignored {
        conn.write_line(&format!("411 no such newsgroup: {name}")).await?;
        return Ok(false);
    }
    let first = engine.store.first_article(name).await?;
    engine.session.select_group(name.as_str().to_string(), first);
    Ok(true)
}

pub async fn handle_group<S>(engine: &mut Engine, conn: &mut Conn<S>, cmd: &Command) -> Result<Flow>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let Some(raw) = cmd.args.first() else {
        conn.write_const(responses::RESP_501_SYNTAX).await?;
        return Ok(Flow::Continue);
    };
    let Ok(name) = NewsgroupName::parse(raw) else {
        conn.write_const(responses::RESP_501_SYNTAX).await?;
        return Ok(Flow::Continue);
    };
    if !select_group(engine, conn, &name).await? {
        return Ok(Flow::Continue);
    }
    write_group_summary(engine, conn, &name).await
}

pub async fn handle_listgroup<S>(engine: &mut Engine, conn: &mut Conn<S>, cmd: &Command) -> Result<Flow>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let name = if let Some(raw) = cmd.args.first() {
        let Ok(name) = NewsgroupName::parse(raw) else {
            conn.write_const(responses::RESP_501_SYNTAX).await?;
            return Ok(Flow::Continue);
        };
        if !select_group(engine, conn, &name).await? {
            return Ok(Flow::Continue);
        }
        name
    } else {
        let Some(current) = engine.session.current_group().map(str::to_string) else {
            conn.write_const(responses::RESP_412_NO_GROUP).await?;
            return Ok(Flow::Continue);
        };
        NewsgroupName::parse(&current).expect("current group name was validated when it was selected")
    };

    let metrics = engine
        .store
        .group_metrics(&name)
        .await?
        .unwrap_or_else(GroupMetrics::empty);
    conn.write_line(&format!(
        "211 {} {} {} {}",
        metrics.count, metrics.lowest, metrics.highest, name
    ))
    .await?;
    if metrics.count > 0 {
        let low = metrics.lowest.max(0) as ArticleNumber;
        let high = metrics.highest.max(0) as ArticleNumber;
        for (number, _) in engine.store.article_range(&name, low, high).await? {
            conn.write_line(&number.to_string()).await?;
        }
    }
    conn.write_terminator().await?;
    Ok(Flow::Continue)
}

async fn write_group_summary<S>(engine: &mut Engine, conn: &mut Conn<S>, name: &NewsgroupName) -> Result<Flow>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let metrics = engine
        .store
        .group_metrics(name)
        .await?
        .unwrap_or_else(GroupMetrics::empty);
    conn.write_line(&format!(
        "211 {} {} {} {}",
        metrics.count, metrics.lowest, metrics.highest, name
    ))
    .await?;
    Ok(Flow::Continue)
}

pub async fn handle_last<S>(engine: &mut Engine, conn: &mut Conn<S>) -> Result<Flow>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let Some(group) = engine.session.current_group().map(str::to_string) else {
        conn.write_const(responses::RESP_412_NO_GROUP).await?;
        return Ok(Flow::Continue);
    };
    let Some(current) = engine.session.current_article() else {
        conn.write_const(responses::RESP_420_NO_CURRENT).await?;
        return Ok(Flow::Continue);
    };
    let name = NewsgroupName::parse(&group).expect("current group name was validated when it was selected");
    match engine.store.previous_article_by_number(&name, current).await? {
        Some(number) => {
            let article = engine
                .store
                .article_by_number(&name, number)
                .await?
                .expect("previous_article_by_number returned a number that must resolve");
            engine.session.set_current_article(number);
            conn.write_line(&format!("223 {} {}", number, article.message_id)).await?;
        }
        None => conn.write_const(responses::RESP_422_NO_PREV).await?,
    }
    Ok(Flow::Continue)
}

pub async fn handle_next<S>(engine: &mut Engine, conn: &mut Conn<S>) -> Result<Flow>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let Some(group) = engine.session.current_group().map(str::to_string) else {
        conn.write_const(responses::RESP_412_NO_GROUP).await?;
        return Ok(Flow::Continue);
    };
    let Some(current) = engine.session.current_article() else {
        conn.write_const(responses::RESP_420_NO_CURRENT).await?;
        return Ok(Flow::Continue);
    };
    let name = NewsgroupName::parse(&group).expect("current group name was validated when it was selected");
    match engine.store.next_article_by_number(&name, current).await? {
        Some(number) => {
            let article = engine
                .store
                .article_by_number(&name, number)
                .await?
                .expect("next_article_by_number returned a number that must resolve");
            engine.session.set_current_article(number);
            conn.write_line(&format!("223 {} {}", number, article.message_id)).await?;
        }
        None => conn.write_const(responses::RESP_421_NO_NEXT).await?,
    }
    Ok(Flow::Continue)
}
