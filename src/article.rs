//! Article data model: headers, body, and the validation rules §3 of
//! the specification imposes on both.

use crate::parse::RawArticle;
use crate::wire::{MessageId, NewsgroupName};
use std::collections::BTreeMap;
use thiserror::Error;

/// Header names that every article must carry once normalized.
const REQUIRED_HEADERS: &[&str] = &["message-id", "newsgroups", "from", "subject", "date", "path"];

/// Headers that are split on `,` into multiple values at parse time.
const MULTIVALUE_HEADERS: &[&str] = &["newsgroups", "references"];

/// A mapping from lower-cased header name to its set of values, in the
/// order they were parsed. Multivalued headers (`Newsgroups`,
/// `References`) are pre-split on `,`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleHeaders {
    values: BTreeMap<String, Vec<String>>,
    /// Original-case header names, first occurrence wins, for emit.
    display_names: BTreeMap<String, String>,
    /// Arrival order of (lower-cased name) for stable iteration on emit.
    order: Vec<String>,
}

impl ArticleHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the raw `(name, value)` pairs produced by
    /// [`crate::parse::parse_article`], splitting multivalue headers.
    pub fn from_raw(raw: &[(String, String)]) -> Self {
        let mut headers = Self::new();
        for (name, value) in raw {
            let lower = name.to_ascii_lowercase();
            if MULTIVALUE_HEADERS.contains(&lower.as_str()) {
                for part in value.split(',') {
                    let part = part.trim();
                    if !part.is_empty() {
                        headers.push(name, part.to_string());
                    }
                }
            } else {
                headers.push(name, value.clone());
            }
        }
        headers
    }

    fn push(&mut self, display_name: &str, value: String) {
        let lower = display_name.to_ascii_lowercase();
        if !self.values.contains_key(&lower) {
            self.order.push(lower.clone());
            self.display_names
                .insert(lower.clone(), display_name.to_string());
        }
        self.values.entry(lower).or_default().push(value);
    }

    /// Insert a single value, replacing any previous values.
    pub fn set(&mut self, display_name: &str, value: String) {
        let lower = display_name.to_ascii_lowercase();
        if !self.values.contains_key(&lower) {
            self.order.push(lower.clone());
        }
        self.display_names
            .insert(lower.clone(), display_name.to_string());
        self.values.insert(lower, vec![value]);
    }

    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(&name.to_ascii_lowercase())
    }

    /// The first value for `name`, if present.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.values
            .get(&name.to_ascii_lowercase())
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    /// All values for `name`, in arrival order.
    pub fn all(&self, name: &str) -> &[String] {
        self.values
            .get(&name.to_ascii_lowercase())
            .map_or(&[], Vec::as_slice)
    }

    /// Iterate `(display-name, value)` pairs, one per value, in the
    /// header's arrival order, for emitting back over the wire.
    pub fn iter_display(&self) -> impl Iterator<Item = (&str, &str)> {
        self.order.iter().flat_map(move |lower| {
            let display = self.display_names[lower].as_str();
            self.values[lower].iter().map(move |v| (display, v.as_str()))
        })
    }

    /// Parsed, de-duplicated newsgroup targets from the `Newsgroups`
    /// header. Entries that fail [`NewsgroupName`] validation are
    /// silently skipped; callers that need to reject malformed entries
    /// should inspect `all("newsgroups")` directly.
    pub fn newsgroups(&self) -> Vec<NewsgroupName> {
        let mut seen = std::collections::HashSet::new();
        self.all("newsgroups")
            .iter()
            .filter_map(|raw| NewsgroupName::parse(raw).ok())
            .filter(|g| seen.insert(g.clone()))
            .collect()
    }
}

/// A fully parsed article: identifier, headers, and verbatim body.
#[derive(Debug, Clone)]
pub struct Article {
    pub message_id: MessageId,
    pub headers: ArticleHeaders,
    pub body: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArticleValidationError {
    #[error("missing Message-ID header")]
    MissingMessageId,
    #[error("more than one Message-ID value")]
    MultipleMessageIds,
    #[error("invalid Message-ID")]
    InvalidMessageId,
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),
}

/// Undo dot-stuffing and split a dot-terminated article transmission
/// into headers and body, per RFC 3977 §3.6.
pub fn parse_raw_article(text: &str) -> Option<RawArticle> {
    crate::parse::parse_article(text).ok().map(|(_, a)| a)
}

/// Validate that `headers` carries exactly one well-formed Message-ID
/// and every other required header (RFC 3977 §3.6 / §3 of this spec).
/// Callers are responsible for injecting synthesized `Message-ID`,
/// `Date`, and `Path` values before calling this (see the POST/IHAVE
/// handlers), since those three may be legitimately absent on the wire.
pub fn validate_headers(headers: &ArticleHeaders) -> Result<MessageId, ArticleValidationError> {
    let ids = headers.all("message-id");
    match ids.len() {
        0 => return Err(ArticleValidationError::MissingMessageId),
        1 => {}
        _ => return Err(ArticleValidationError::MultipleMessageIds),
    }
    let message_id =
        MessageId::parse(&ids[0]).map_err(|_| ArticleValidationError::InvalidMessageId)?;

    for required in REQUIRED_HEADERS {
        if *required == "message-id" {
            continue;
        }
        if !headers.has(required) {
            return Err(ArticleValidationError::MissingHeader(required));
        }
    }

    Ok(message_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn newsgroups_header_splits_on_comma() {
        let headers = ArticleHeaders::from_raw(&raw(&[("Newsgroups", "g1, g2 ,g3")]));
        assert_eq!(headers.all("newsgroups"), &["g1", "g2", "g3"]);
    }

    #[test]
    fn validate_headers_requires_message_id() {
        let headers = ArticleHeaders::from_raw(&raw(&[
            ("Newsgroups", "g1"),
            ("From", "a@b"),
            ("Subject", "s"),
            ("Date", "20240101000000"),
            ("Path", "host"),
        ]));
        assert_eq!(
            validate_headers(&headers),
            Err(ArticleValidationError::MissingMessageId)
        );
    }

    #[test]
    fn validate_headers_rejects_multiple_message_ids() {
        let headers = ArticleHeaders::from_raw(&raw(&[
            ("Message-ID", "<a@b>"),
            ("Message-ID", "<c@d>"),
        ]));
        assert_eq!(
            validate_headers(&headers),
            Err(ArticleValidationError::MultipleMessageIds)
        );
    }

    #[test]
    fn validate_headers_success() {
        let headers = ArticleHeaders::from_raw(&raw(&[
            ("Message-ID", "<a@b>"),
            ("Newsgroups", "g1"),
            ("From", "a@b"),
            ("Subject", "s"),
            ("Date", "20240101000000"),
            ("Path", "host"),
        ]));
        assert_eq!(validate_headers(&headers).unwrap().as_str(), "<a@b>");
    }
}
