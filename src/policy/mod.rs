//! The Policy contract (§6.4): posting, transfer, and newsgroup
//! acceptance decisions, consumed by POST, IHAVE, and the NEWGROUPS
//! advertisement paths.

use crate::article::ArticleHeaders;
use crate::store::PostingMode;
use crate::wire::{MessageId, NewsgroupName};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait Policy: Send + Sync {
    async fn is_posting_allowed_by(&self, subject: Option<&str>) -> Result<bool>;

    async fn is_ihave_transfer_allowed_by(&self, subject: Option<&str>) -> Result<bool>;

    async fn is_newsgroup_allowed(
        &self,
        name: &NewsgroupName,
        mode: PostingMode,
        est_articles: u64,
        advertiser: Option<&str>,
    ) -> Result<bool>;

    #[allow(clippy::too_many_arguments)]
    async fn is_article_allowed(
        &self,
        id: &MessageId,
        headers: &ArticleHeaders,
        body: &str,
        destination_group: &NewsgroupName,
        posting_mode: PostingMode,
        submitter: Option<&str>,
    ) -> Result<bool>;

    async fn close(&self) -> Result<()>;
}

pub type DynPolicy = Arc<dyn Policy>;

pub mod default;
