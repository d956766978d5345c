//! Single-select review flow with optimistic apply and a timed undo window.
//!
//! The controller never performs I/O itself. Mutating steps are split into a
//! `begin_*` call that marks the controller busy and hands out a [`Mutation`],
//! and a `complete_*` call that feeds the server's answer back. The async
//! helpers [`ReviewController::confirm_with`] and [`ReviewController::undo_with`]
//! glue both halves together around a [`ReviewExecutor`].

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::{
    clock::{Clock, Scheduler, TimerId},
    error::ClientError,
    keymap::{command_for_key, KeyContext, ReviewCommand, ReviewKey},
};

pub const DEFAULT_UNDO_WINDOW: Duration = Duration::from_millis(5000);

pub trait ReviewItem: Clone + Send + Sync + 'static {
    fn key(&self) -> &str;
    fn label(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStatus {
    Loading,
    Active,
    /// Loaded and nothing left to review.
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Apply,
    Revert,
}

#[derive(Debug, Clone)]
pub struct Mutation<T> {
    pub kind: MutationKind,
    pub item: T,
}

/// Server answer to an apply: the new version of the item and whether it still
/// belongs to the working list.
#[derive(Debug, Clone)]
pub struct Applied<T> {
    pub item: T,
    pub remains: bool,
}

#[derive(Debug)]
pub enum Completion<T> {
    Apply(Result<Applied<T>, ClientError>),
    Revert(Result<T, ClientError>),
}

#[async_trait]
pub trait ReviewExecutor<T: ReviewItem>: Send + Sync {
    async fn apply(&self, item: &T) -> Result<Applied<T>, ClientError>;
    async fn revert(&self, item: &T) -> Result<T, ClientError>;
}

pub async fn run_mutation<T, E>(executor: &E, mutation: Mutation<T>) -> Completion<T>
where
    T: ReviewItem,
    E: ReviewExecutor<T> + ?Sized,
{
    match mutation.kind {
        MutationKind::Apply => Completion::Apply(executor.apply(&mutation.item).await),
        MutationKind::Revert => Completion::Revert(executor.revert(&mutation.item).await),
    }
}

#[derive(Debug, Clone)]
pub struct UndoToken<T> {
    pub item: T,
    /// Position the item held in the working list before it was applied.
    pub index: usize,
    pub expires_at: u64,
    timer: TimerId,
}

impl<T> UndoToken<T> {
    pub fn timer(&self) -> TimerId {
        self.timer
    }

    pub fn is_live(&self, now_millis: u64) -> bool {
        now_millis < self.expires_at
    }

    pub fn remaining(&self, now_millis: u64) -> Duration {
        Duration::from_millis(self.expires_at.saturating_sub(now_millis))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InFlight {
    Apply,
    Revert { index: usize },
}

pub struct ReviewController<T: ReviewItem> {
    items: Option<Vec<T>>,
    focus: usize,
    pending_confirmation: Option<T>,
    undo: Option<UndoToken<T>>,
    in_flight: Option<InFlight>,
    undo_window: Duration,
    clock: Arc<dyn Clock>,
    scheduler: Arc<dyn Scheduler>,
}

impl<T: ReviewItem> ReviewController<T> {
    pub fn new(clock: Arc<dyn Clock>, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            items: None,
            focus: 0,
            pending_confirmation: None,
            undo: None,
            in_flight: None,
            undo_window: DEFAULT_UNDO_WINDOW,
            clock,
            scheduler,
        }
    }

    pub fn with_undo_window(mut self, undo_window: Duration) -> Self {
        self.undo_window = undo_window;
        self
    }

    pub fn load(&mut self, items: Vec<T>) {
        self.items = Some(items);
        self.focus = 0;
        self.pending_confirmation = None;
    }

    pub fn status(&self) -> ReviewStatus {
        match &self.items {
            None => ReviewStatus::Loading,
            Some(items) if items.is_empty() => ReviewStatus::Complete,
            Some(_) => ReviewStatus::Active,
        }
    }

    pub fn items(&self) -> &[T] {
        self.items.as_deref().unwrap_or(&[])
    }

    pub fn focus_index(&self) -> usize {
        self.focus
    }

    pub fn focused(&self) -> Option<&T> {
        self.items().get(self.focus)
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn pending_confirmation(&self) -> Option<&T> {
        self.pending_confirmation.as_ref()
    }

    pub fn undo(&self) -> Option<&UndoToken<T>> {
        self.undo.as_ref()
    }

    pub fn undo_window(&self) -> Duration {
        self.undo_window
    }

    pub fn now_millis(&self) -> u64 {
        self.clock.now_millis()
    }

    /// Time left on the live undo token, if any.
    pub fn undo_remaining(&self) -> Option<Duration> {
        let now = self.clock.now_millis();
        self.undo
            .as_ref()
            .filter(|token| token.is_live(now))
            .map(|token| token.remaining(now))
    }

    pub fn key_context(&self) -> KeyContext {
        KeyContext {
            busy: self.is_busy(),
            modal_open: self.pending_confirmation.is_some(),
            undo_live: self.undo_remaining().is_some(),
        }
    }

    pub fn move_next(&mut self) -> bool {
        let len = self.items().len();
        if self.is_busy() || len == 0 {
            return false;
        }
        let next = (self.focus + 1).min(len - 1);
        let moved = next != self.focus;
        self.focus = next;
        moved
    }

    pub fn move_previous(&mut self) -> bool {
        let len = self.items().len();
        if self.is_busy() || len == 0 {
            return false;
        }
        let previous = self.focus.saturating_sub(1).min(len - 1);
        let moved = previous != self.focus;
        self.focus = previous;
        moved
    }

    pub fn request_confirmation(&mut self, item: T) -> bool {
        if self.is_busy() {
            return false;
        }
        debug!(item = item.key(), "review: confirmation requested");
        self.pending_confirmation = Some(item);
        true
    }

    pub fn request_confirmation_for_focus(&mut self) -> bool {
        match self.focused().cloned() {
            Some(item) => self.request_confirmation(item),
            None => false,
        }
    }

    pub fn cancel_confirmation(&mut self) -> bool {
        if self.is_busy() {
            return false;
        }
        self.pending_confirmation.take().is_some()
    }

    pub fn begin_confirm(&mut self) -> Option<Mutation<T>> {
        if self.is_busy() {
            return None;
        }
        let item = self.pending_confirmation.clone()?;
        self.in_flight = Some(InFlight::Apply);
        Some(Mutation {
            kind: MutationKind::Apply,
            item,
        })
    }

    pub fn complete_confirm(
        &mut self,
        result: Result<Applied<T>, ClientError>,
    ) -> Result<(), ClientError> {
        self.in_flight = None;
        let pending = self.pending_confirmation.take();

        let applied = match result {
            Ok(applied) => applied,
            Err(error) => {
                info!(%error, "review: apply failed; state left unchanged");
                return Err(error);
            }
        };

        let key = pending
            .as_ref()
            .map(|item| item.key().to_string())
            .unwrap_or_else(|| applied.item.key().to_string());
        let items = self.items.get_or_insert_with(Vec::new);
        let index = match items.iter().position(|item| item.key() == key) {
            Some(index) => {
                if applied.remains {
                    items[index] = applied.item.clone();
                } else {
                    items.remove(index);
                }
                index
            }
            None => self.focus,
        };

        info!(item = %key, remains = applied.remains, "review: applied");
        self.arm_undo(applied.item, index);
        self.clamp_focus();
        Ok(())
    }

    pub fn begin_undo(&mut self) -> Option<Mutation<T>> {
        if self.is_busy() {
            return None;
        }
        let now = self.clock.now_millis();
        let token = self.undo.as_ref()?;
        if !token.is_live(now) {
            self.clear_undo();
            return None;
        }
        let mutation = Mutation {
            kind: MutationKind::Revert,
            item: token.item.clone(),
        };
        self.in_flight = Some(InFlight::Revert { index: token.index });
        Some(mutation)
    }

    pub fn complete_undo(&mut self, result: Result<T, ClientError>) -> Result<(), ClientError> {
        let index = match self.in_flight.take() {
            Some(InFlight::Revert { index }) => index,
            _ => self.undo.as_ref().map(|token| token.index).unwrap_or(self.focus),
        };

        let restored = match result {
            Ok(item) => item,
            Err(error) => {
                info!(%error, "review: undo failed; token kept");
                return Err(error);
            }
        };

        self.clear_undo();
        let items = self.items.get_or_insert_with(Vec::new);
        let position = match items.iter().position(|item| item.key() == restored.key()) {
            Some(existing) => {
                items[existing] = restored;
                existing
            }
            None => {
                let at = index.min(items.len());
                items.insert(at, restored);
                at
            }
        };
        self.focus = position;
        self.clamp_focus();
        info!("review: undo applied");
        Ok(())
    }

    pub fn complete(&mut self, completion: Completion<T>) -> Result<(), ClientError> {
        match completion {
            Completion::Apply(result) => self.complete_confirm(result),
            Completion::Revert(result) => self.complete_undo(result),
        }
    }

    /// Timer callback. Only the timer of the live token clears it.
    pub fn fire_timer(&mut self, timer: TimerId) -> bool {
        let Some(token) = self.undo.take_if(|token| token.timer == timer) else {
            return false;
        };
        debug!(item = token.item.key(), "review: undo window closed");
        true
    }

    /// Applies a command from the key map; returns a mutation the caller must run.
    pub fn dispatch(&mut self, command: ReviewCommand) -> Option<Mutation<T>> {
        match command {
            ReviewCommand::MoveNext => {
                self.move_next();
                None
            }
            ReviewCommand::MovePrevious => {
                self.move_previous();
                None
            }
            ReviewCommand::RequestConfirmation => {
                self.request_confirmation_for_focus();
                None
            }
            ReviewCommand::Cancel => {
                self.cancel_confirmation();
                None
            }
            ReviewCommand::Confirm => self.begin_confirm(),
            ReviewCommand::UndoLast => self.begin_undo(),
        }
    }

    pub fn handle_key(&mut self, key: ReviewKey) -> Option<Mutation<T>> {
        let command = command_for_key(key, self.key_context())?;
        self.dispatch(command)
    }

    pub async fn confirm_with<E>(&mut self, executor: &E) -> Result<bool, ClientError>
    where
        E: ReviewExecutor<T> + ?Sized,
    {
        let Some(mutation) = self.begin_confirm() else {
            return Ok(false);
        };
        let result = executor.apply(&mutation.item).await;
        self.complete_confirm(result).map(|()| true)
    }

    pub async fn undo_with<E>(&mut self, executor: &E) -> Result<bool, ClientError>
    where
        E: ReviewExecutor<T> + ?Sized,
    {
        let Some(mutation) = self.begin_undo() else {
            return Ok(false);
        };
        let result = executor.revert(&mutation.item).await;
        self.complete_undo(result).map(|()| true)
    }

    fn arm_undo(&mut self, item: T, index: usize) {
        self.clear_undo();
        let timer = self.scheduler.schedule(self.undo_window);
        let expires_at = self.clock.now_millis() + self.undo_window.as_millis() as u64;
        self.undo = Some(UndoToken {
            item,
            index,
            expires_at,
            timer,
        });
    }

    fn clear_undo(&mut self) {
        if let Some(token) = self.undo.take() {
            self.scheduler.cancel(token.timer);
        }
    }

    fn clamp_focus(&mut self) {
        let len = self.items().len();
        self.focus = self.focus.min(len.saturating_sub(1));
    }
}

#[cfg(test)]
#[path = "tests/review_tests.rs"]
mod tests;
