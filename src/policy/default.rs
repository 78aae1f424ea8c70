//! Default in-memory [`Policy`] implementation: a small fixed chain of
//! checks in the spirit of the teacher's `FilterChain` (size,
//! moderation, newsgroup-acceptance), configured rather than composed
//! from a user-extensible filter list since the specification exposes
//! a single policy boundary, not a pluggable chain.

use super::Policy;
use crate::article::ArticleHeaders;
use crate::store::PostingMode;
use crate::wire::{MessageId, NewsgroupName};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;

pub struct DefaultPolicy {
    allow_anonymous_posting: bool,
    /// `None` means any peer may IHAVE; `Some` restricts to the set.
    allowed_ihave_peers: Option<HashSet<String>>,
    max_article_bytes: Option<u64>,
}

impl DefaultPolicy {
    pub fn new(allow_anonymous_posting: bool, max_article_bytes: Option<u64>) -> Self {
        Self {
            allow_anonymous_posting,
            allowed_ihave_peers: None,
            max_article_bytes,
        }
    }

    pub fn with_ihave_peers(mut self, peers: HashSet<String>) -> Self {
        self.allowed_ihave_peers = Some(peers);
        self
    }
}

#[async_trait]
impl Policy for DefaultPolicy {
    async fn is_posting_allowed_by(&self, subject: Option<&str>) -> Result<bool> {
        Ok(subject.is_some() || self.allow_anonymous_posting)
    }

    async fn is_ihave_transfer_allowed_by(&self, subject: Option<&str>) -> Result<bool> {
        Ok(match &self.allowed_ihave_peers {
            None => true,
            Some(peers) => subject.is_some_and(|s| peers.contains(s)),
        })
    }

    async fn is_newsgroup_allowed(
        &self,
        name: &NewsgroupName,
        _mode: PostingMode,
        _est_articles: u64,
        advertiser: Option<&str>,
    ) -> Result<bool> {
        // Only this server may create or advertise names under its own
        // local. hierarchy; an external advertiser claiming one is
        // rejected.
        Ok(!(name.is_local_reserved() && advertiser.is_some()))
    }

    async fn is_article_allowed(
        &self,
        _id: &MessageId,
        headers: &ArticleHeaders,
        body: &str,
        _destination_group: &NewsgroupName,
        posting_mode: PostingMode,
        _submitter: Option<&str>,
    ) -> Result<bool> {
        if posting_mode == PostingMode::Prohibited {
            return Ok(false);
        }
        if let Some(max) = self.max_article_bytes {
            if body.len() as u64 > max {
                return Ok(false);
            }
        }
        if posting_mode == PostingMode::Moderated && !headers.has("approved") {
            return Ok(false);
        }
        Ok(true)
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::ArticleHeaders;

    fn group(name: &str) -> NewsgroupName {
        NewsgroupName::parse(name).unwrap()
    }
    fn msg_id() -> MessageId {
        MessageId::parse("<a@b>").unwrap()
    }

    #[tokio::test]
    async fn anonymous_posting_gated_by_flag() {
        let open = DefaultPolicy::new(true, None);
        assert!(open.is_posting_allowed_by(None).await.unwrap());
        let closed = DefaultPolicy::new(false, None);
        assert!(!closed.is_posting_allowed_by(None).await.unwrap());
        assert!(closed.is_posting_allowed_by(Some("alice")).await.unwrap());
    }

    #[tokio::test]
    async fn moderated_group_requires_approved_header() {
        let policy = DefaultPolicy::new(true, None);
        let mut headers = ArticleHeaders::new();
        let g = group("comp.moderated");
        assert!(!policy
            .is_article_allowed(&msg_id(), &headers, "body", &g, PostingMode::Moderated, None)
            .await
            .unwrap());
        headers.set("Approved", "mod@host".into());
        assert!(policy
            .is_article_allowed(&msg_id(), &headers, "body", &g, PostingMode::Moderated, None)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn prohibited_group_always_rejects() {
        let policy = DefaultPolicy::new(true, None);
        let g = group("g1");
        assert!(!policy
            .is_article_allowed(&msg_id(), &ArticleHeaders::new(), "b", &g, PostingMode::Prohibited, None)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn oversized_article_rejected() {
        let policy = DefaultPolicy::new(true, Some(4));
        let g = group("g1");
        assert!(!policy
            .is_article_allowed(&msg_id(), &ArticleHeaders::new(), "toolong", &g, PostingMode::Allowed, None)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn local_hierarchy_rejected_for_external_advertiser() {
        let policy = DefaultPolicy::new(true, None);
        let local = group("local.nntp.postus.log");
        assert!(!policy
            .is_newsgroup_allowed(&local, PostingMode::Allowed, 0, Some("peer.example"))
            .await
            .unwrap());
        assert!(policy
            .is_newsgroup_allowed(&local, PostingMode::Allowed, 0, None)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn ihave_peer_allowlist_enforced() {
        let mut peers = HashSet::new();
        peers.insert("peer.example".to_string());
        let policy = DefaultPolicy::new(true, None).with_ihave_peers(peers);
        assert!(policy.is_ihave_transfer_allowed_by(Some("peer.example")).await.unwrap());
        assert!(!policy.is_ihave_transfer_allowed_by(Some("other")).await.unwrap());
        assert!(!policy.is_ihave_transfer_allowed_by(None).await.unwrap());
    }
}
