//! In-memory implementation of [`ThreadApi`] for tests and the offline demo.
//!
//! Each instance owns its data; nothing is shared between instances.

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use shared::domain::{
    Action, Card, CardId, Session, ThreadDetail, ThreadId, ThreadSummary, View,
};
use storage::SessionStore;
use tracing::info;

use crate::{
    api::{AuthApi, ThreadApi},
    error::ClientError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureCall {
    ListThreads(View),
    GetThread(ThreadId),
    PerformAction(ThreadId, Action),
    SetCardChecked {
        thread_id: ThreadId,
        card_id: CardId,
        checked: bool,
    },
}

struct StoredThread {
    detail: ThreadDetail,
    previous_views: Vec<View>,
}

#[derive(Default)]
struct FixtureState {
    order: Vec<ThreadId>,
    threads: HashMap<ThreadId, StoredThread>,
    failures: VecDeque<u16>,
    calls: Vec<FixtureCall>,
}

#[derive(Default)]
pub struct InMemoryThreadApi {
    state: Mutex<FixtureState>,
    latency: Duration,
}

fn card(id: &str, title: &str, rationale: &str) -> Card {
    Card {
        id: CardId::from(id),
        title: title.to_string(),
        rationale: rationale.to_string(),
        checked: false,
    }
}

impl InMemoryThreadApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two unchecked threads: `t-1` with cards `c-1`, `c-2` and `t-2` with `c-3`.
    pub fn seeded() -> Self {
        let api = Self::new();
        api.insert_thread(ThreadDetail {
            id: ThreadId::from("t-1"),
            title: "Onboarding: product understanding".to_string(),
            view: View::Unchecked,
            content: Some("First-week review of how new users find the core value.".to_string()),
            cards: vec![
                card(
                    "c-1",
                    "What is the core benefit?",
                    "Fast start for new users.",
                ),
                card(
                    "c-2",
                    "Where do users get stuck first?",
                    "Friction at the entry point lowers conversion.",
                ),
            ],
        });
        api.insert_thread(ThreadDetail {
            id: ThreadId::from("t-2"),
            title: "Retention review".to_string(),
            view: View::Unchecked,
            content: Some("Which habits bring people back every week.".to_string()),
            cards: vec![card(
                "c-3",
                "Which habit do we want to build?",
                "Habit loops raise return rate and lifetime value.",
            )],
        });
        api
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FixtureState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert_thread(&self, detail: ThreadDetail) {
        let mut state = self.state();
        if !state.threads.contains_key(&detail.id) {
            state.order.push(detail.id.clone());
        }
        state.threads.insert(
            detail.id.clone(),
            StoredThread {
                detail,
                previous_views: Vec::new(),
            },
        );
    }

    pub fn thread(&self, id: &ThreadId) -> Option<ThreadDetail> {
        self.state().threads.get(id).map(|t| t.detail.clone())
    }

    /// The next call fails with `status` instead of touching the data.
    pub fn fail_next(&self, status: u16) {
        self.state().failures.push_back(status);
    }

    pub fn calls(&self) -> Vec<FixtureCall> {
        self.state().calls.clone()
    }

    async fn begin(&self, call: FixtureCall) -> Result<(), ClientError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let mut state = self.state();
        state.calls.push(call);
        match state.failures.pop_front() {
            Some(status) => Err(ClientError::status(status)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ThreadApi for InMemoryThreadApi {
    async fn list_threads(&self, view: View) -> Result<Vec<ThreadSummary>, ClientError> {
        self.begin(FixtureCall::ListThreads(view)).await?;
        let state = self.state();
        let now = Utc::now();
        Ok(state
            .order
            .iter()
            .filter_map(|id| state.threads.get(id))
            .filter(|stored| stored.detail.view == view)
            .map(|stored| ThreadSummary {
                updated_at: Some(now),
                ..stored.detail.summary()
            })
            .collect())
    }

    async fn get_thread_detail(&self, id: &ThreadId) -> Result<ThreadDetail, ClientError> {
        self.begin(FixtureCall::GetThread(id.clone())).await?;
        self.thread(id).ok_or_else(|| ClientError::status(404))
    }

    async fn perform_action(
        &self,
        id: &ThreadId,
        action: Action,
    ) -> Result<ThreadDetail, ClientError> {
        self.begin(FixtureCall::PerformAction(id.clone(), action))
            .await?;
        let mut state = self.state();
        let stored = state
            .threads
            .get_mut(id)
            .ok_or_else(|| ClientError::status(404))?;

        let current = stored.detail.view;
        stored.detail.view = match action {
            Action::Undo => stored.previous_views.pop().unwrap_or(View::Unchecked),
            Action::Confirm => {
                stored.previous_views.push(current);
                View::Done
            }
            Action::SnoozeNow => {
                stored.previous_views.push(current);
                View::Now
            }
            Action::SnoozeLater => {
                stored.previous_views.push(current);
                View::Later
            }
        };
        Ok(stored.detail.clone())
    }

    async fn set_card_checked(
        &self,
        thread_id: &ThreadId,
        card_id: &CardId,
        checked: bool,
    ) -> Result<Card, ClientError> {
        self.begin(FixtureCall::SetCardChecked {
            thread_id: thread_id.clone(),
            card_id: card_id.clone(),
            checked,
        })
        .await?;
        let mut state = self.state();
        let card = state
            .threads
            .get_mut(thread_id)
            .and_then(|stored| stored.detail.cards.iter_mut().find(|c| &c.id == card_id))
            .ok_or_else(|| ClientError::status(404))?;
        card.checked = checked;
        Ok(card.clone())
    }
}

/// Offline [`AuthApi`]: any non-blank credentials sign in.
#[derive(Clone)]
pub struct LocalAuth {
    sessions: SessionStore,
}

impl LocalAuth {
    pub fn new(sessions: SessionStore) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl AuthApi for LocalAuth {
    async fn login(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let email = email.trim();
        if email.is_empty() || password.trim().is_empty() {
            return Err(ClientError::InvalidCredentials);
        }
        let session = Session {
            token: format!("local-{email}"),
            user_id: Some(email.to_string()),
            expires_at: None,
        };
        self.sessions.write(&session);
        info!(user = email, "signed in locally");
        Ok(session)
    }

    async fn logout(&self) {
        self.sessions.clear();
    }
}
