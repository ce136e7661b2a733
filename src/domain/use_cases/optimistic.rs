//! Speculative content state for an event page.
//!
//! The page shows `confirmed` content with the pending overlay of local
//! actions folded over it. A successful round trip replaces the confirmed
//! list wholesale and clears the overlay; a failed one is rolled back.

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    entities::content::{ContentBlock, ContentDraft},
    errors::AppError,
    use_cases::content::ContentHandler,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ContentAction {
    Add(ContentBlock),
    Remove(Uuid),
}

/// Applies one action to `list` without touching it.
pub fn reduce(list: &[ContentBlock], action: &ContentAction) -> Vec<ContentBlock> {
    match action {
        ContentAction::Add(block) => {
            if list.iter().any(|existing| existing.id == block.id) {
                return list.to_vec();
            }
            let mut next = Vec::with_capacity(list.len() + 1);
            next.extend_from_slice(list);
            next.push(block.clone());
            next
        }
        ContentAction::Remove(id) => list.iter().filter(|block| block.id != *id).cloned().collect(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct OptimisticContent {
    confirmed: Vec<ContentBlock>,
    pending: Vec<ContentAction>,
}

impl OptimisticContent {
    pub fn new(confirmed: Vec<ContentBlock>) -> Self {
        OptimisticContent {
            confirmed,
            pending: Vec::new(),
        }
    }

    pub fn dispatch(&mut self, action: ContentAction) {
        self.pending.push(action);
    }

    /// What the page renders: confirmed plus overlay, oldest first.
    pub fn visible(&self) -> Vec<ContentBlock> {
        let mut list = self
            .pending
            .iter()
            .fold(self.confirmed.clone(), |list, action| reduce(&list, action));
        list.sort_by_key(|block| block.created_at);
        list
    }

    /// Server confirmed: adopt the fresh list, drop the overlay.
    pub fn confirm(&mut self, fresh: Vec<ContentBlock>) {
        self.confirmed = fresh;
        self.pending.clear();
    }

    /// A failed add is undone by re-fetching confirmed state.
    pub fn rollback_add(&mut self, fresh: Vec<ContentBlock>) {
        self.confirm(fresh);
    }

    /// A failed remove is undone by re-adding the block to the overlay.
    pub fn rollback_remove(&mut self, block: ContentBlock) {
        self.dispatch(ContentAction::Add(block));
    }

    pub fn confirmed(&self) -> &[ContentBlock] {
        &self.confirmed
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Where a [`ContentSession`] reads and writes content.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch(&self, event_id: &Uuid) -> Result<Vec<ContentBlock>, AppError>;
    async fn add(&self, event_id: &Uuid, draft: ContentDraft) -> Result<ContentBlock, AppError>;
    async fn remove(&self, event_id: &Uuid, content_id: &Uuid) -> Result<(), AppError>;
}

#[async_trait]
impl ContentSource for ContentHandler {
    async fn fetch(&self, event_id: &Uuid) -> Result<Vec<ContentBlock>, AppError> {
        self.list_content(&event_id.to_string()).await
    }

    async fn add(&self, event_id: &Uuid, draft: ContentDraft) -> Result<ContentBlock, AppError> {
        self.submit(&event_id.to_string(), draft).await
    }

    async fn remove(&self, event_id: &Uuid, content_id: &Uuid) -> Result<(), AppError> {
        self.delete_content(&event_id.to_string(), &content_id.to_string()).await
    }
}

/// One event page's content, kept in sync with a [`ContentSource`].
pub struct ContentSession<S: ContentSource> {
    source: S,
    event_id: Uuid,
    state: OptimisticContent,
}

impl<S: ContentSource> ContentSession<S> {
    pub async fn open(source: S, event_id: Uuid) -> Result<Self, AppError> {
        let confirmed = source.fetch(&event_id).await?;
        Ok(ContentSession {
            source,
            event_id,
            state: OptimisticContent::new(confirmed),
        })
    }

    pub fn visible(&self) -> Vec<ContentBlock> {
        self.state.visible()
    }

    pub fn state(&self) -> &OptimisticContent {
        &self.state
    }

    /// Shows a placeholder right away, then submits `draft`.
    pub async fn add(&mut self, draft: ContentDraft) -> Result<ContentBlock, AppError> {
        let placeholder = ContentBlock {
            id: Uuid::new_v4(),
            event_id: self.event_id,
            created_at: Utc::now(),
            body: draft.preview(),
        };
        self.state.dispatch(ContentAction::Add(placeholder));

        match self.source.add(&self.event_id, draft).await {
            Ok(block) => {
                if let Err(e) = self.refresh().await {
                    tracing::warn!(error = %e, content_id = %block.id, "Refetch after add failed, confirming stored block locally");
                    let confirmed = reduce(self.state.confirmed(), &ContentAction::Add(block.clone()));
                    self.state.confirm(confirmed);
                }
                Ok(block)
            }
            Err(e) => {
                match self.source.fetch(&self.event_id).await {
                    Ok(fresh) => self.state.rollback_add(fresh),
                    Err(fetch_err) => {
                        tracing::warn!(error = %fetch_err, "Refetch after failed add failed, keeping last confirmed list");
                        let confirmed = self.state.confirmed().to_vec();
                        self.state.rollback_add(confirmed);
                    }
                }
                Err(e)
            }
        }
    }

    /// Hides the block right away, then deletes it.
    pub async fn remove(&mut self, content_id: Uuid) -> Result<(), AppError> {
        let block = self
            .state
            .visible()
            .into_iter()
            .find(|block| block.id == content_id)
            .ok_or_else(|| AppError::NotFound(format!("Content {} not found", content_id)))?;
        self.state.dispatch(ContentAction::Remove(content_id));

        match self.source.remove(&self.event_id, &content_id).await {
            Ok(()) => {
                if let Err(e) = self.refresh().await {
                    tracing::warn!(error = %e, %content_id, "Refetch after remove failed, confirming removal locally");
                    let confirmed = reduce(self.state.confirmed(), &ContentAction::Remove(content_id));
                    self.state.confirm(confirmed);
                }
                Ok(())
            }
            Err(e) => {
                self.state.rollback_remove(block);
                Err(e)
            }
        }
    }

    pub async fn refresh(&mut self) -> Result<(), AppError> {
        let fresh = self.source.fetch(&self.event_id).await?;
        self.state.confirm(fresh);
        Ok(())
    }
}
