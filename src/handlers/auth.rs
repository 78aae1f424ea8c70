//! AUTHINFO USER / PASS (spec §4.12, RFC 4643).

use super::Flow;
use crate::conn::Conn;
use crate::engine::Engine;
use crate::identity::{IdentityError, PasswordRequirement};
use crate::parse::Command;
use crate::responses;
use anyhow::Result;
use tokio::io::{AsyncRead, AsyncWrite};

pub async fn handle_authinfo<S>(engine: &mut Engine, conn: &mut Conn<S>, cmd: &Command) -> Result<Flow>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (Some(sub), Some(arg)) = (cmd.args.first(), cmd.args.get(1)) else {
        conn.write_const(responses::RESP_501_SYNTAX).await?;
        return Ok(Flow::Continue);
    };

    if sub.eq_ignore_ascii_case("USER") {
        handle_user(engine, conn, arg).await
    } else if sub.eq_ignore_ascii_case("PASS") {
        handle_pass(engine, conn, arg).await
    } else {
        conn.write_const(responses::RESP_501_SYNTAX).await?;
        Ok(Flow::Continue)
    }
}

async fn handle_user<S>(engine: &mut Engine, conn: &mut Conn<S>, username: &str) -> Result<Flow>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    engine.session.clear_pending_user();
    if username.is_empty() {
        conn.write_const(responses::RESP_501_SYNTAX).await?;
        return Ok(Flow::Continue);
    }
    match engine.identity.requires_password(username).await? {
        PasswordRequirement::Unknown => {
            conn.write_const(responses::RESP_481_AUTH_REJECTED).await?;
        }
        PasswordRequirement::Required => {
            engine.session.set_pending_user(username.to_string());
            conn.write_const(responses::RESP_381_PASSWORD_REQUIRED).await?;
        }
        PasswordRequirement::NotRequired => {
            complete_auth(engine, conn, username, None).await?;
        }
    }
    Ok(Flow::Continue)
}

async fn handle_pass<S>(engine: &mut Engine, conn: &mut Conn<S>, password: &str) -> Result<Flow>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let Some(username) = engine.session.pending_user().map(str::to_string) else {
        conn.write_const(responses::RESP_482_AUTH_OUT_OF_SEQUENCE).await?;
        return Ok(Flow::Continue);
    };
    complete_auth(engine, conn, &username, Some(password)).await?;
    Ok(Flow::Continue)
}

async fn complete_auth<S>(
    engine: &mut Engine,
    conn: &mut Conn<S>,
    username: &str,
    password: Option<&str>,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    match engine.identity.authenticate(username, password).await {
        Ok(token) => {
            engine.session.set_auth_token(username.to_string(), token);
            conn.write_const(responses::RESP_281_AUTH_OK).await?;
        }
        Err(err) if err.downcast_ref::<IdentityError>().is_some() => {
            engine.session.clear_pending_user();
            conn.write_const(responses::RESP_481_AUTH_REJECTED).await?;
        }
        Err(err) => return Err(err),
    }
    Ok(())
}
