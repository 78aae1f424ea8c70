//! The Store contract (§6.2): article persistence and newsgroup
//! bookkeeping, consumed by the handlers and owned for the lifetime of
//! the engine.
//!
//! The specification describes groups as stateful handle objects
//! (`getGroupByName` returning something with its own navigation
//! methods). This trait instead exposes every group-scoped operation
//! as a flat async method taking the group name, matching how the
//! teacher's own `Storage` trait is shaped — no lifetime-entangled
//! handle type is needed, and implementations stay free to back it
//! with whatever indexing scheme they like.

use crate::article::{Article, ArticleHeaders};
use crate::wire::{ArticleNumber, HIGHEST_WHEN_EMPTY, LOWEST_WHEN_EMPTY, MessageId, NewsgroupName};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub mod memory;

/// Whether a newsgroup accepts postings, and under what condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostingMode {
    Allowed,
    Moderated,
    Prohibited,
}

/// A snapshot of a newsgroup's metadata, as returned by `get_group` and
/// the `list_all_groups*` family.
#[derive(Debug, Clone)]
pub struct Group {
    pub name: NewsgroupName,
    pub description: String,
    pub posting_mode: PostingMode,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub ignored: bool,
}

/// Article count and low/high water marks for a group, using the
/// sentinel values §3 defines for an empty group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupMetrics {
    pub count: u64,
    pub lowest: i64,
    pub highest: i64,
}

impl GroupMetrics {
    pub fn empty() -> Self {
        Self {
            count: 0,
            lowest: LOWEST_WHEN_EMPTY,
            highest: HIGHEST_WHEN_EMPTY,
        }
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn init(&self) -> Result<()>;
    /// Begin a transactional bracket for a multi-group ingest.
    async fn checkpoint(&self) -> Result<()>;
    async fn commit(&self) -> Result<()>;
    async fn rollback(&self) -> Result<()>;
    async fn close(&self) -> Result<()>;

    async fn has_article(&self, id: &MessageId) -> Result<bool>;
    async fn is_rejected(&self, id: &MessageId) -> Result<bool>;
    async fn get_article(&self, id: &MessageId) -> Result<Option<Article>>;

    async fn get_group(&self, name: &NewsgroupName) -> Result<Option<Group>>;
    #[allow(clippy::too_many_arguments)]
    async fn add_group(
        &self,
        name: NewsgroupName,
        description: String,
        posting_mode: PostingMode,
        created_at: DateTime<Utc>,
        created_by: String,
        ignored: bool,
    ) -> Result<()>;
    async fn set_posting_mode(&self, name: &NewsgroupName, mode: PostingMode) -> Result<()>;
    async fn list_all_groups(&self, subscribed_only: bool, include_ignored: bool) -> Result<Vec<Group>>;
    async fn list_all_groups_added_since(&self, since: DateTime<Utc>) -> Result<Vec<Group>>;

    async fn group_metrics(&self, name: &NewsgroupName) -> Result<Option<GroupMetrics>>;
    async fn first_article(&self, name: &NewsgroupName) -> Result<Option<ArticleNumber>>;
    async fn article_by_number(
        &self,
        name: &NewsgroupName,
        number: ArticleNumber,
    ) -> Result<Option<Article>>;
    async fn article_number_of(
        &self,
        name: &NewsgroupName,
        id: &MessageId,
    ) -> Result<Option<ArticleNumber>>;
    async fn next_article_by_number(
        &self,
        name: &NewsgroupName,
        after: ArticleNumber,
    ) -> Result<Option<ArticleNumber>>;
    async fn previous_article_by_number(
        &self,
        name: &NewsgroupName,
        before: ArticleNumber,
    ) -> Result<Option<ArticleNumber>>;
    async fn article_range(
        &self,
        name: &NewsgroupName,
        low: ArticleNumber,
        high: ArticleNumber,
    ) -> Result<Vec<(ArticleNumber, Article)>>;
    async fn article_ids_since(
        &self,
        name: &NewsgroupName,
        since: DateTime<Utc>,
    ) -> Result<Vec<MessageId>>;

    /// Store a brand-new article's content and assign it a number in
    /// `name`. Called exactly once per MessageId per ingest. When
    /// `rejected` is true the MessageId is recorded so that future
    /// `is_rejected` checks (and the IHAVE `435` dedup rule) see it,
    /// but no article number is assigned; the returned number is `0`.
    async fn add_article(
        &self,
        name: &NewsgroupName,
        id: &MessageId,
        headers: &ArticleHeaders,
        body: &str,
        rejected: bool,
    ) -> Result<ArticleNumber>;

    /// Assign a number in `name` to an article already stored under
    /// `id` via `add_article` in another group (cross-posting).
    async fn include_article(&self, name: &NewsgroupName, id: &MessageId) -> Result<ArticleNumber>;
}

pub type DynStore = Arc<dyn Store>;
