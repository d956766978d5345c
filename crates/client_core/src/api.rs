use async_trait::async_trait;
use shared::domain::{Action, Card, CardId, Session, ThreadDetail, ThreadId, ThreadSummary, View};

use crate::error::ClientError;

/// Read/write access to threads and their cards.
///
/// The server is authoritative: results of mutating calls replace local state.
#[async_trait]
pub trait ThreadApi: Send + Sync {
    async fn list_threads(&self, view: View) -> Result<Vec<ThreadSummary>, ClientError>;
    async fn get_thread_detail(&self, id: &ThreadId) -> Result<ThreadDetail, ClientError>;
    async fn perform_action(
        &self,
        id: &ThreadId,
        action: Action,
    ) -> Result<ThreadDetail, ClientError>;
    async fn set_card_checked(
        &self,
        thread_id: &ThreadId,
        card_id: &CardId,
        checked: bool,
    ) -> Result<Card, ClientError>;
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<Session, ClientError>;
    async fn logout(&self);
}
