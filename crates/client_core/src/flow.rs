//! The two review call sites: cards of one thread, and threads of one view.

use std::sync::Arc;

use async_trait::async_trait;
use shared::domain::{Action, Card, ThreadDetail, ThreadId, ThreadSummary, View};

use crate::{
    api::ThreadApi,
    error::ClientError,
    review::{Applied, ReviewExecutor, ReviewItem},
};

impl ReviewItem for Card {
    fn key(&self) -> &str {
        self.id.as_str()
    }

    fn label(&self) -> &str {
        &self.title
    }
}

impl ReviewItem for ThreadSummary {
    fn key(&self) -> &str {
        self.id.as_str()
    }

    fn label(&self) -> &str {
        &self.title
    }
}

/// Unchecked cards of a thread, in server order.
pub fn working_cards(thread: &ThreadDetail) -> Vec<Card> {
    thread.unchecked_cards().cloned().collect()
}

/// Checks and unchecks cards of one thread.
pub struct CardReview {
    api: Arc<dyn ThreadApi>,
    thread_id: ThreadId,
}

impl CardReview {
    pub fn new(api: Arc<dyn ThreadApi>, thread_id: ThreadId) -> Self {
        Self { api, thread_id }
    }

    pub async fn load(&self) -> Result<ThreadDetail, ClientError> {
        self.api.get_thread_detail(&self.thread_id).await
    }
}

#[async_trait]
impl ReviewExecutor<Card> for CardReview {
    async fn apply(&self, item: &Card) -> Result<Applied<Card>, ClientError> {
        let card = self
            .api
            .set_card_checked(&self.thread_id, &item.id, true)
            .await?;
        let remains = !card.checked;
        Ok(Applied {
            item: card,
            remains,
        })
    }

    async fn revert(&self, item: &Card) -> Result<Card, ClientError> {
        self.api
            .set_card_checked(&self.thread_id, &item.id, false)
            .await
    }
}

/// Confirms and undoes threads while working through one view.
pub struct ThreadReview {
    api: Arc<dyn ThreadApi>,
    view: View,
}

impl ThreadReview {
    pub fn new(api: Arc<dyn ThreadApi>, view: View) -> Self {
        Self { api, view }
    }

    pub async fn load(&self) -> Result<Vec<ThreadSummary>, ClientError> {
        self.api.list_threads(self.view).await
    }
}

#[async_trait]
impl ReviewExecutor<ThreadSummary> for ThreadReview {
    async fn apply(&self, item: &ThreadSummary) -> Result<Applied<ThreadSummary>, ClientError> {
        let thread = self.api.perform_action(&item.id, Action::Confirm).await?;
        let remains = thread.view == self.view;
        Ok(Applied {
            item: thread.summary(),
            remains,
        })
    }

    async fn revert(&self, item: &ThreadSummary) -> Result<ThreadSummary, ClientError> {
        let thread = self.api.perform_action(&item.id, Action::Undo).await?;
        Ok(thread.summary())
    }
}

#[cfg(test)]
#[path = "tests/flow_tests.rs"]
mod tests;
