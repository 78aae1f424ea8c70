//! POST (spec §4.9) and IHAVE (spec §4.10): the two article-ingestion
//! paths, sharing a checkpoint/commit/rollback bracket and a
//! cross-post distribution loop that persists an article's content
//! exactly once and references it from every subsequent group.

use super::Flow;
use crate::article::{ArticleHeaders, ArticleValidationError, validate_headers};
use crate::conn::Conn;
use crate::engine::Engine;
use crate::parse::Command;
use crate::responses;
use crate::store::{Group, PostingMode};
use crate::wire::{MessageId, NewsgroupName, format_compact_datetime};
use anyhow::Result;
use chrono::Utc;
use tokio::io::{AsyncRead, AsyncWrite};

#[derive(Clone, Copy, PartialEq, Eq)]
enum IngestMode {
    Post,
    Ihave,
}

pub async fn handle_post<S>(engine: &mut Engine, conn: &mut Conn<S>, cmd: &Command) -> Result<Flow>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if !cmd.args.is_empty() {
        conn.write_const(responses::RESP_501_SYNTAX).await?;
        return Ok(Flow::Continue);
    }
    let submitter = engine.session.subject().map(str::to_string);
    if !engine.policy.is_posting_allowed_by(submitter.as_deref()).await? {
        conn.write_const(responses::RESP_440_POSTING_NOT_ALLOWED).await?;
        return Ok(Flow::Continue);
    }

    conn.write_const(responses::RESP_340_SEND_ARTICLE).await?;
    let body_text = conn.read_dot_terminated().await?;

    let (message_id, headers, body) = match prepare_article(engine, &body_text).await {
        Ok(parsed) => parsed,
        Err(()) => {
            conn.write_const(responses::RESP_441_POSTING_FAILED).await?;
            return Ok(Flow::Continue);
        }
    };

    match ingest(engine, &message_id, &headers, &body, submitter.as_deref(), IngestMode::Post).await {
        Ok(true) => conn.write_line(&format!("240 {message_id}")).await?,
        Ok(false) => conn.write_const(responses::RESP_441_POSTING_FAILED).await?,
        Err(err) => {
            tracing::warn!(%err, "POST ingestion failed");
            conn.write_const(responses::RESP_441_POSTING_FAILED).await?;
        }
    }
    Ok(Flow::Continue)
}

pub async fn handle_ihave<S>(engine: &mut Engine, conn: &mut Conn<S>, cmd: &Command) -> Result<Flow>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let Some(raw_id) = cmd.args.first() else {
        conn.write_const(responses::RESP_501_SYNTAX).await?;
        return Ok(Flow::Continue);
    };
    if cmd.args.len() != 1 {
        conn.write_const(responses::RESP_501_SYNTAX).await?;
        return Ok(Flow::Continue);
    }
    let submitter = engine.session.subject().map(str::to_string);
    if !engine.policy.is_ihave_transfer_allowed_by(submitter.as_deref()).await? {
        conn.write_const(responses::RESP_500_IHAVE_NOT_PERMITTED).await?;
        return Ok(Flow::Continue);
    }
    let Ok(claimed_id) = MessageId::parse(raw_id) else {
        conn.write_const(responses::RESP_501_SYNTAX).await?;
        return Ok(Flow::Continue);
    };
    if engine.store.has_article(&claimed_id).await? || engine.store.is_rejected(&claimed_id).await? {
        conn.write_const(responses::RESP_435_NOT_WANTED).await?;
        return Ok(Flow::Continue);
    }

    conn.write_const(responses::RESP_335_SEND_IT).await?;
    let body_text = conn.read_dot_terminated().await?;

    let (message_id, headers, body) = match prepare_article(engine, &body_text).await {
        Ok(parsed) => parsed,
        Err(()) => {
            conn.write_const(responses::RESP_437_REJECTED).await?;
            return Ok(Flow::Continue);
        }
    };
    if message_id != claimed_id {
        tracing::warn!(%claimed_id, %message_id, "IHAVE article Message-ID does not match the command argument");
    }

    conn.write_const(responses::RESP_235_TRANSFER_OK).await?;

    if let Err(err) = ingest(engine, &message_id, &headers, &body, submitter.as_deref(), IngestMode::Ihave).await {
        tracing::warn!(%err, "IHAVE ingestion failed after 235 was already sent");
    }
    Ok(Flow::Continue)
}

/// Run the checkpoint/distribute/commit-or-rollback bracket shared by
/// POST and IHAVE, returning whether any group accepted the article.
async fn ingest(
    engine: &mut Engine,
    message_id: &MessageId,
    headers: &ArticleHeaders,
    body: &str,
    submitter: Option<&str>,
    mode: IngestMode,
) -> Result<bool> {
    engine.store.checkpoint().await?;
    match distribute(engine, message_id, headers, body, submitter, mode).await {
        Ok(accepted) => {
            if accepted {
                engine.store.commit().await?;
            } else {
                engine.store.rollback().await?;
            }
            Ok(accepted)
        }
        Err(err) => {
            let _ = engine.store.rollback().await;
            Err(err)
        }
    }
}

/// Parse the dot-terminated transmission, synthesize/inject the
/// Message-ID/Date/Path headers the wire form may have omitted, and
/// validate the result (spec §4.9 steps 1-6).
async fn prepare_article(engine: &mut Engine, body_text: &str) -> Result<(MessageId, ArticleHeaders, String), ()> {
    let Some(raw) = crate::article::parse_raw_article(body_text) else {
        return Err(());
    };
    let mut headers = ArticleHeaders::from_raw(&raw.headers);

    if headers.all("message-id").len() > 1 {
        return Err(());
    }
    if headers.first("message-id").is_none() {
        let synthesized = engine.identity.create_message_id(&headers);
        headers.set("Message-ID", synthesized.as_str().to_string());
    }
    if headers.first("date").is_none() {
        headers.set("Date", format_compact_datetime(Utc::now()));
    }
    if headers.first("path").is_none() {
        headers.set("Path", engine.identity.host_identifier().to_string());
    }

    let message_id = match validate_headers(&headers) {
        Ok(id) => id,
        Err(ArticleValidationError::MissingMessageId | ArticleValidationError::MultipleMessageIds) => {
            return Err(());
        }
        Err(_) => return Err(()),
    };

    match engine.store.has_article(&message_id).await {
        Ok(true) => return Err(()),
        Ok(false) => {}
        Err(_) => return Err(()),
    }
    match engine.store.is_rejected(&message_id).await {
        Ok(true) => return Err(()),
        Ok(false) => {}
        Err(_) => return Err(()),
    }

    Ok((message_id, headers, raw.body))
}

/// Distribute an already-validated article across its `Newsgroups`
/// targets. The first qualifying group persists the article's content
/// via `add_article`, passing along whether *that* group's own policy
/// check approved it; every later qualifying group references the
/// already-persisted content via `include_article` instead, since
/// `add_article` stores the body exactly once per MessageId regardless
/// of any group's verdict. Each group's approval is judged
/// independently, so a rejection in the first group never stops later
/// groups from being evaluated and, if approved, included (spec §4.9
/// step 8-9).
async fn distribute(
    engine: &mut Engine,
    message_id: &MessageId,
    headers: &ArticleHeaders,
    body: &str,
    submitter: Option<&str>,
    mode: IngestMode,
) -> Result<bool> {
    let mut persisted = false;
    let mut any_accepted = false;

    for name in headers.newsgroups() {
        if mode == IngestMode::Ihave && name.is_local_reserved() {
            continue;
        }
        let Some(group) = engine.store.get_group(&name).await? else {
            continue;
        };
        if group.ignored {
            continue;
        }
        if mode == IngestMode::Post && group.posting_mode != PostingMode::Allowed {
            continue;
        }

        let approved = is_article_allowed(engine, message_id, headers, body, &name, &group, submitter).await?;
        if !persisted {
            engine
                .store
                .add_article(&name, message_id, headers, body, !approved)
                .await?;
            persisted = true;
            any_accepted |= approved;
        } else if approved {
            engine.store.include_article(&name, message_id).await?;
            any_accepted = true;
        }
    }

    Ok(any_accepted)
}

async fn is_article_allowed(
    engine: &Engine,
    message_id: &MessageId,
    headers: &ArticleHeaders,
    body: &str,
    name: &NewsgroupName,
    group: &Group,
    submitter: Option<&str>,
) -> Result<bool> {
    engine
        .policy
        .is_article_allowed(message_id, headers, body, name, group.posting_mode, submitter)
        .await
}
