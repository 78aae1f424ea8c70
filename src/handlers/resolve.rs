//! Shared article-resolution logic for the three argument forms
//! ARTICLE/HEAD/BODY/STAT/OVER/HDR accept: none (current article),
//! `<message-id>`, or a numeric article number (spec §4.4, §4.11).

use crate::article::Article;
use crate::engine::Engine;
use crate::wire::{ArticleNumber, MessageId, NewsgroupName};
use anyhow::Result;

pub enum Selector {
    Current,
    ById(MessageId),
    ByNumber(ArticleNumber),
}

/// A malformed selector argument; the caller picks the response code
/// (`430` for a bad Message-ID, `501` for a non-numeric second form).
pub enum SelectorError {
    BadMessageId,
    BadNumber,
}

pub fn parse_selector(arg: Option<&str>) -> Result<Selector, SelectorError> {
    match arg {
        None => Ok(Selector::Current),
        Some(s) if s.starts_with('<') => MessageId::parse(s)
            .map(Selector::ById)
            .map_err(|_| SelectorError::BadMessageId),
        Some(s) => s
            .parse::<ArticleNumber>()
            .map(Selector::ByNumber)
            .map_err(|_| SelectorError::BadNumber),
    }
}

/// A resolution failure, named after the RFC 3977 code it maps to.
pub enum ResolveError {
    NoGroup,
    NoCurrent,
    NoSuchNumber,
    NoSuchId,
}

pub struct Resolved {
    /// The number to print on the status line: the article's number
    /// in the current group, or `0` for a Message-ID lookup outside
    /// the current group (spec §4.11).
    pub number: ArticleNumber,
    pub article: Article,
}

/// Resolve `selector` against `engine`'s session and store, mutating
/// `currentArticle` exactly where §4.4 specifies (numeric lookups
/// only; Message-ID lookups never touch the session pointers).
pub async fn resolve(engine: &mut Engine, selector: Selector) -> Result<Result<Resolved, ResolveError>> {
    match selector {
        Selector::Current => {
            let Some(group) = engine.session.current_group().map(str::to_string) else {
                return Ok(Err(ResolveError::NoGroup));
            };
            let Some(number) = engine.session.current_article() else {
                return Ok(Err(ResolveError::NoCurrent));
            };
            let name = current_group_name(&group);
            match engine.store.article_by_number(&name, number).await? {
                Some(article) => Ok(Ok(Resolved { number, article })),
                None => Ok(Err(ResolveError::NoCurrent)),
            }
        }
        Selector::ById(id) => match engine.store.get_article(&id).await? {
            Some(article) => {
                let number = match engine.session.current_group() {
                    Some(group) => {
                        let name = current_group_name(group);
                        engine.store.article_number_of(&name, &id).await?.unwrap_or(0)
                    }
                    None => 0,
                };
                Ok(Ok(Resolved { number, article }))
            }
            None => Ok(Err(ResolveError::NoSuchId)),
        },
        Selector::ByNumber(number) => {
            let Some(group) = engine.session.current_group().map(str::to_string) else {
                return Ok(Err(ResolveError::NoGroup));
            };
            let name = current_group_name(&group);
            match engine.store.article_by_number(&name, number).await? {
                Some(article) => {
                    engine.session.set_current_article(number);
                    Ok(Ok(Resolved { number, article }))
                }
                None => Ok(Err(ResolveError::NoSuchNumber)),
            }
        }
    }
}

/// The current group's name is validated once, at selection time
/// (GROUP/LISTGROUP), so re-parsing it here cannot fail.
fn current_group_name(group: &str) -> NewsgroupName {
    NewsgroupName::parse(group).expect("current group name was validated when it was selected")
}
