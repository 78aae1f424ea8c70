//! Domain error type mapping engine-level failures to the RFC 3977
//! response code the caller should emit.
//!
//! Most fallible paths in this crate return a plain `anyhow::Result`
//! and let an unexpected error collapse to the generic `500` fallback
//! described in §4.1/§7 of the specification.
//! `NntpError` is reserved for the places the engine itself needs to
//! pick a *specific* code rather than the generic one.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NntpError {
    #[error("no newsgroup selected")]
    NoGroupSelected,

    #[error("no such newsgroup: {0}")]
    NoSuchGroup(String),

    #[error("no current article")]
    NoCurrentArticle,

    #[error("no next article")]
    NoNextArticle,

    #[error("no previous article")]
    NoPreviousArticle,

    #[error("no articles in range")]
    RangeEmpty,

    #[error("no such article: {0}")]
    NoSuchArticle(String),

    #[error("posting not allowed")]
    PostingNotAllowed,

    #[error("posting failed: {0}")]
    PostingFailed(String),

    #[error("article not wanted")]
    TransferNotWanted,

    #[error("article transfer rejected")]
    TransferRejected,

    #[error("authentication rejected")]
    AuthRejected,

    #[error("authentication commands out of sequence")]
    AuthOutOfSequence,

    #[error("syntax error")]
    SyntaxError,

    #[error("command not recognized")]
    UnknownCommand,
}

impl NntpError {
    /// The RFC 3977 response code this error maps to.
    pub fn response_code(&self) -> u16 {
        match self {
            NntpError::NoGroupSelected => 412,
            NntpError::NoSuchGroup(_) => 411,
            NntpError::NoCurrentArticle => 420,
            NntpError::NoNextArticle => 421,
            NntpError::NoPreviousArticle => 422,
            NntpError::RangeEmpty => 423,
            NntpError::NoSuchArticle(_) => 430,
            NntpError::PostingNotAllowed => 440,
            NntpError::PostingFailed(_) => 441,
            NntpError::TransferNotWanted => 435,
            NntpError::TransferRejected => 437,
            NntpError::AuthRejected => 481,
            NntpError::AuthOutOfSequence => 482,
            NntpError::SyntaxError => 501,
            NntpError::UnknownCommand => 502,
        }
    }

    /// A client-safe response line: `"<code> <message>\r\n"`.
    pub fn to_response(&self) -> String {
        format!("{} {}\r\n", self.response_code(), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_codes_match_specification_table() {
        assert_eq!(NntpError::NoGroupSelected.response_code(), 412);
        assert_eq!(NntpError::NoCurrentArticle.response_code(), 420);
        assert_eq!(NntpError::RangeEmpty.response_code(), 423);
        assert_eq!(NntpError::TransferNotWanted.response_code(), 435);
        assert_eq!(NntpError::PostingFailed("x".into()).response_code(), 441);
        assert_eq!(NntpError::UnknownCommand.response_code(), 502);
    }

    #[test]
    fn to_response_ends_with_crlf() {
        assert!(NntpError::SyntaxError.to_response().ends_with("\r\n"));
    }
}
