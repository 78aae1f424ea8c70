//! In-memory reference implementation of the [`Store`] contract.
//!
//! This is not a production backend: it exists so the crate is
//! runnable and testable without a real external database, the way
//! the specification's abstract service boundaries require. It holds
//! everything in a single [`tokio::sync::RwLock`] and keeps one
//! rollback snapshot at a time, which is sufficient for the
//! non-nested checkpoint/commit/rollback bracket the engine uses
//! around ingestion.

use super::{Group, GroupMetrics, PostingMode, Store};
use crate::article::{Article, ArticleHeaders};
use crate::wire::{ArticleNumber, MessageId, NewsgroupName};
use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::{Mutex, RwLock};

#[derive(Clone)]
struct GroupData {
    meta: Group,
    numbers: BTreeMap<ArticleNumber, MessageId>,
    ids: HashMap<MessageId, ArticleNumber>,
    added_at: HashMap<MessageId, DateTime<Utc>>,
    next_number: ArticleNumber,
}

impl GroupData {
    fn new(meta: Group) -> Self {
        Self {
            meta,
            numbers: BTreeMap::new(),
            ids: HashMap::new(),
            added_at: HashMap::new(),
            next_number: 1,
        }
    }

    fn assign(&mut self, id: &MessageId, at: DateTime<Utc>) -> ArticleNumber {
        let number = self.next_number;
        self.next_number += 1;
        self.numbers.insert(number, id.clone());
        self.ids.insert(id.clone(), number);
        self.added_at.insert(id.clone(), at);
        number
    }

    fn metrics(&self) -> GroupMetrics {
        match (self.numbers.keys().next(), self.numbers.keys().next_back()) {
            (Some(&lo), Some(&hi)) => GroupMetrics {
                count: self.numbers.len() as u64,
                lowest: lo as i64,
                highest: hi as i64,
            },
            _ => GroupMetrics::empty(),
        }
    }
}

#[derive(Clone, Default)]
struct Inner {
    groups: HashMap<NewsgroupName, GroupData>,
    articles: HashMap<MessageId, Article>,
    rejected: HashSet<MessageId>,
}

pub struct MemoryStore {
    inner: RwLock<Inner>,
    checkpoint: Mutex<Option<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            checkpoint: Mutex::new(None),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn checkpoint(&self) -> Result<()> {
        let snapshot = self.inner.read().await.clone();
        *self.checkpoint.lock().await = Some(snapshot);
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        *self.checkpoint.lock().await = None;
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        if let Some(snapshot) = self.checkpoint.lock().await.take() {
            *self.inner.write().await = snapshot;
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    async fn has_article(&self, id: &MessageId) -> Result<bool> {
        Ok(self.inner.read().await.articles.contains_key(id))
    }

    async fn is_rejected(&self, id: &MessageId) -> Result<bool> {
        Ok(self.inner.read().await.rejected.contains(id))
    }

    async fn get_article(&self, id: &MessageId) -> Result<Option<Article>> {
        Ok(self.inner.read().await.articles.get(id).cloned())
    }

    async fn get_group(&self, name: &NewsgroupName) -> Result<Option<Group>> {
        Ok(self.inner.read().await.groups.get(name).map(|g| g.meta.clone()))
    }

    async fn add_group(
        &self,
        name: NewsgroupName,
        description: String,
        posting_mode: PostingMode,
        created_at: DateTime<Utc>,
        created_by: String,
        ignored: bool,
    ) -> Result<()> {
        let meta = Group {
            name: name.clone(),
            description,
            posting_mode,
            created_at,
            created_by,
            ignored,
        };
        self.inner.write().await.groups.insert(name, GroupData::new(meta));
        Ok(())
    }

    async fn set_posting_mode(&self, name: &NewsgroupName, mode: PostingMode) -> Result<()> {
        let mut inner = self.inner.write().await;
        match inner.groups.get_mut(name) {
            Some(group) => {
                group.meta.posting_mode = mode;
                Ok(())
            }
            None => bail!("no such group: {name}"),
        }
    }

    async fn list_all_groups(&self, _subscribed_only: bool, include_ignored: bool) -> Result<Vec<Group>> {
        let inner = self.inner.read().await;
        let mut groups: Vec<Group> = inner
            .groups
            .values()
            .filter(|g| include_ignored || !g.meta.ignored)
            .map(|g| g.meta.clone())
            .collect();
        groups.sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
        Ok(groups)
    }

    async fn list_all_groups_added_since(&self, since: DateTime<Utc>) -> Result<Vec<Group>> {
        let inner = self.inner.read().await;
        let mut groups: Vec<Group> = inner
            .groups
            .values()
            .filter(|g| g.meta.created_at >= since)
            .map(|g| g.meta.clone())
            .collect();
        groups.sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
        Ok(groups)
    }

    async fn group_metrics(&self, name: &NewsgroupName) -> Result<Option<GroupMetrics>> {
        Ok(self.inner.read().await.groups.get(name).map(GroupData::metrics))
    }

    async fn first_article(&self, name: &NewsgroupName) -> Result<Option<ArticleNumber>> {
        Ok(self
            .inner
            .read()
            .await
            .groups
            .get(name)
            .and_then(|g| g.numbers.keys().next().copied()))
    }

    async fn article_by_number(
        &self,
        name: &NewsgroupName,
        number: ArticleNumber,
    ) -> Result<Option<Article>> {
        let inner = self.inner.read().await;
        let Some(group) = inner.groups.get(name) else {
            return Ok(None);
        };
        let Some(id) = group.numbers.get(&number) else {
            return Ok(None);
        };
        Ok(inner.articles.get(id).cloned())
    }

    async fn article_number_of(
        &self,
        name: &NewsgroupName,
        id: &MessageId,
    ) -> Result<Option<ArticleNumber>> {
        Ok(self
            .inner
            .read()
            .await
            .groups
            .get(name)
            .and_then(|g| g.ids.get(id).copied()))
    }

    async fn next_article_by_number(
        &self,
        name: &NewsgroupName,
        after: ArticleNumber,
    ) -> Result<Option<ArticleNumber>> {
        Ok(self
            .inner
            .read()
            .await
            .groups
            .get(name)
            .and_then(|g| g.numbers.range((after + 1)..).next().map(|(n, _)| *n)))
    }

    async fn previous_article_by_number(
        &self,
        name: &NewsgroupName,
        before: ArticleNumber,
    ) -> Result<Option<ArticleNumber>> {
        if before == 0 {
            return Ok(None);
        }
        Ok(self
            .inner
            .read()
            .await
            .groups
            .get(name)
            .and_then(|g| g.numbers.range(..before).next_back().map(|(n, _)| *n)))
    }

    async fn article_range(
        &self,
        name: &NewsgroupName,
        low: ArticleNumber,
        high: ArticleNumber,
    ) -> Result<Vec<(ArticleNumber, Article)>> {
        let inner = self.inner.read().await;
        let Some(group) = inner.groups.get(name) else {
            return Ok(Vec::new());
        };
        Ok(group
            .numbers
            .range(low..=high)
            .filter_map(|(n, id)| inner.articles.get(id).map(|a| (*n, a.clone())))
            .collect())
    }

    async fn article_ids_since(
        &self,
        name: &NewsgroupName,
        since: DateTime<Utc>,
    ) -> Result<Vec<MessageId>> {
        let inner = self.inner.read().await;
        let Some(group) = inner.groups.get(name) else {
            return Ok(Vec::new());
        };
        let mut ids: Vec<MessageId> = group
            .numbers
            .values()
            .filter(|id| group.added_at.get(*id).is_some_and(|t| *t >= since))
            .cloned()
            .collect();
        ids.dedup();
        Ok(ids)
    }

    async fn add_article(
        &self,
        name: &NewsgroupName,
        id: &MessageId,
        headers: &ArticleHeaders,
        body: &str,
        rejected: bool,
    ) -> Result<ArticleNumber> {
        let mut inner = self.inner.write().await;
        // The article's content is persisted exactly once regardless of
        // this group's verdict, so a later `include_article` call against
        // a different group can still reference it. `rejected` is
        // group-scoped: a rejected group simply never gets a number
        // assigned for this article, it does not withhold the body.
        inner.articles.insert(
            id.clone(),
            Article {
                message_id: id.clone(),
                headers: headers.clone(),
                body: body.to_string(),
            },
        );
        if rejected {
            inner.rejected.insert(id.clone());
            return Ok(0);
        }
        let now = Utc::now();
        let Some(group) = inner.groups.get_mut(name) else {
            bail!("no such group: {name}");
        };
        Ok(group.assign(id, now))
    }

    async fn include_article(&self, name: &NewsgroupName, id: &MessageId) -> Result<ArticleNumber> {
        let mut inner = self.inner.write().await;
        if !inner.articles.contains_key(id) {
            bail!("cannot include unknown article {id}");
        }
        let now = Utc::now();
        let Some(group) = inner.groups.get_mut(name) else {
            bail!("no such group: {name}");
        };
        Ok(group.assign(id, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::ArticleHeaders;

    fn group_name(s: &str) -> NewsgroupName {
        NewsgroupName::parse(s).unwrap()
    }

    async fn seeded() -> (MemoryStore, NewsgroupName) {
        let store = MemoryStore::new();
        let name = group_name("g1");
        store
            .add_group(name.clone(), "desc".into(), PostingMode::Allowed, Utc::now(), "admin".into(), false)
            .await
            .unwrap();
        (store, name)
    }

    #[tokio::test]
    async fn add_article_assigns_sequential_numbers() {
        let (store, name) = seeded().await;
        let id1 = MessageId::parse("<1@h>").unwrap();
        let id2 = MessageId::parse("<2@h>").unwrap();
        let n1 = store.add_article(&name, &id1, &ArticleHeaders::new(), "b", false).await.unwrap();
        let n2 = store.add_article(&name, &id2, &ArticleHeaders::new(), "b", false).await.unwrap();
        assert_eq!(n1, 1);
        assert_eq!(n2, 2);
        assert!(store.has_article(&id1).await.unwrap());
    }

    #[tokio::test]
    async fn rejected_article_is_tracked_without_a_number() {
        let (store, name) = seeded().await;
        let id = MessageId::parse("<dup@h>").unwrap();
        let number = store.add_article(&name, &id, &ArticleHeaders::new(), "b", true).await.unwrap();
        assert_eq!(number, 0);
        assert!(store.is_rejected(&id).await.unwrap());
        // Content is persisted regardless of this group's verdict, so a
        // later group can still `include_article` against it.
        assert!(store.has_article(&id).await.unwrap());
        assert!(store.article_number_of(&name, &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejected_in_first_group_still_included_in_second() {
        let store = MemoryStore::new();
        let g1 = group_name("g1");
        let g2 = group_name("g2");
        for g in [&g1, &g2] {
            store
                .add_group(g.clone(), "d".into(), PostingMode::Allowed, Utc::now(), "a".into(), false)
                .await
                .unwrap();
        }
        let id = MessageId::parse("<y@h>").unwrap();
        let n1 = store.add_article(&g1, &id, &ArticleHeaders::new(), "body", true).await.unwrap();
        assert_eq!(n1, 0);
        let n2 = store.include_article(&g2, &id).await.unwrap();
        assert_eq!(n2, 1);
        assert!(store.article_by_number(&g2, n2).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn checkpoint_rollback_discards_writes() {
        let (store, name) = seeded().await;
        store.checkpoint().await.unwrap();
        let id = MessageId::parse("<a@h>").unwrap();
        store.add_article(&name, &id, &ArticleHeaders::new(), "b", false).await.unwrap();
        assert!(store.has_article(&id).await.unwrap());
        store.rollback().await.unwrap();
        assert!(!store.has_article(&id).await.unwrap());
    }

    #[tokio::test]
    async fn checkpoint_commit_keeps_writes() {
        let (store, name) = seeded().await;
        store.checkpoint().await.unwrap();
        let id = MessageId::parse("<a@h>").unwrap();
        store.add_article(&name, &id, &ArticleHeaders::new(), "b", false).await.unwrap();
        store.commit().await.unwrap();
        assert!(store.has_article(&id).await.unwrap());
    }

    #[tokio::test]
    async fn cross_post_shares_content_distinct_numbers() {
        let store = MemoryStore::new();
        let g1 = group_name("g1");
        let g2 = group_name("g2");
        for g in [&g1, &g2] {
            store
                .add_group(g.clone(), "d".into(), PostingMode::Allowed, Utc::now(), "a".into(), false)
                .await
                .unwrap();
        }
        let id = MessageId::parse("<x@h>").unwrap();
        let n1 = store.add_article(&g1, &id, &ArticleHeaders::new(), "body", false).await.unwrap();
        let n2 = store.include_article(&g2, &id).await.unwrap();
        assert_eq!(n1, 1);
        assert_eq!(n2, 1);
        assert!(store.article_by_number(&g2, n2).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn empty_group_reports_sentinel_metrics() {
        let (store, name) = seeded().await;
        let metrics = store.group_metrics(&name).await.unwrap().unwrap();
        assert_eq!(metrics, GroupMetrics::empty());
    }
}
