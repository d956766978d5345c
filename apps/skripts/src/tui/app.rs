use client_core::{
    ClientError, Completion, Mutation, ReviewController, ReviewItem, ReviewKey, TimerId,
};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use shared::{
    domain::{Card, ThreadSummary},
    route::Route,
};

/// A list entry the review surface knows how to draw.
pub trait ReviewRow: ReviewItem {
    /// Secondary line under the label, if any.
    fn detail(&self) -> Option<String>;
}

impl ReviewRow for Card {
    fn detail(&self) -> Option<String> {
        (!self.rationale.is_empty()).then(|| format!("why: {}", self.rationale))
    }
}

impl ReviewRow for ThreadSummary {
    fn detail(&self) -> Option<String> {
        let cards = match self.open_cards {
            0 => None,
            1 => Some("1 open card".to_string()),
            n => Some(format!("{n} open cards")),
        };
        match (self.preview.as_deref().filter(|p| !p.is_empty()), cards) {
            (Some(preview), Some(cards)) => Some(format!("{preview} ({cards})")),
            (Some(preview), None) => Some(preview.to_string()),
            (None, cards) => cards,
        }
    }
}

/// Wording for one kind of review.
#[derive(Debug, Clone)]
pub struct Surface {
    pub title: String,
    /// Imperative shown in hints and the modal ("Check").
    pub verb: &'static str,
    /// Past tense for the undo banner ("Checked").
    pub done: &'static str,
    pub complete: &'static str,
}

impl Surface {
    pub fn cards(thread_title: &str) -> Self {
        Self {
            title: thread_title.to_string(),
            verb: "Check",
            done: "Checked",
            complete: "All cards checked. Nothing left to review.",
        }
    }

    pub fn threads(view: shared::domain::View) -> Self {
        Self {
            title: format!("Threads: {view}"),
            verb: "Mark done",
            done: "Marked done",
            complete: "No threads left in this view.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Quit,
    SessionExpired,
}

pub struct ReviewApp<T: ReviewRow> {
    pub surface: Surface,
    pub controller: ReviewController<T>,
    pub notice: Option<Notice>,
    pub load_error: Option<String>,
    pub exit: Option<Exit>,
    /// Ctrl-C arrived while a mutation was in flight; quit once it completes.
    quit_pending: bool,
}

impl<T: ReviewRow> ReviewApp<T> {
    pub fn new(surface: Surface, controller: ReviewController<T>) -> Self {
        Self {
            surface,
            controller,
            notice: None,
            load_error: None,
            exit: None,
            quit_pending: false,
        }
    }

    pub fn on_loaded(&mut self, result: Result<Vec<T>, ClientError>) {
        match result {
            Ok(items) => self.controller.load(items),
            Err(err) if err.is_unauthorized() => self.exit = Some(Exit::SessionExpired),
            Err(err) if err.is_not_found() => {
                self.load_error = Some("Not found. It may have been removed.".to_string())
            }
            Err(err) => self.load_error = Some(format!("Could not load: {err}")),
        }
    }

    /// Handles one terminal key event; a returned mutation must be executed by the caller.
    pub fn on_key(&mut self, key: KeyEvent) -> Option<Mutation<T>> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if key.code == KeyCode::Char('c') {
                self.request_quit();
            }
            return None;
        }

        let context = self.controller.key_context();
        if key.code == KeyCode::Char('q') && !context.modal_open && !context.busy {
            self.exit = Some(Exit::Quit);
            return None;
        }

        let mutation = self.controller.handle_key(review_key(key.code)?);
        if mutation.is_some() {
            self.notice = None;
        }
        mutation
    }

    pub fn on_completion(&mut self, completion: Completion<T>) {
        let reverting = matches!(completion, Completion::Revert(_));
        match self.controller.complete(completion) {
            Ok(()) if reverting => self.notice = Some(Notice::Info("Restored.".to_string())),
            Ok(()) => {}
            Err(err) if err.is_unauthorized() => self.exit = Some(Exit::SessionExpired),
            Err(err) => {
                let what = if reverting { "Undo" } else { self.surface.verb };
                self.notice = Some(Notice::Error(format!("{what} failed: {err}")));
            }
        }
        if self.quit_pending && self.exit.is_none() {
            self.exit = Some(Exit::Quit);
        }
    }

    fn request_quit(&mut self) {
        if self.controller.is_busy() {
            self.quit_pending = true;
            self.notice = Some(Notice::Info("Finishing the pending change...".to_string()));
        } else {
            self.exit = Some(Exit::Quit);
        }
    }

    pub fn on_timer(&mut self, timer: TimerId) {
        self.controller.fire_timer(timer);
    }

    pub fn on_route(&mut self, route: Route) {
        if route == Route::Login {
            self.exit = Some(Exit::SessionExpired);
        }
    }
}

pub fn review_key(code: KeyCode) -> Option<ReviewKey> {
    match code {
        KeyCode::Char(c) => Some(ReviewKey::Char(c)),
        KeyCode::Enter => Some(ReviewKey::Enter),
        KeyCode::Esc => Some(ReviewKey::Esc),
        KeyCode::Down => Some(ReviewKey::Char('j')),
        KeyCode::Up => Some(ReviewKey::Char('k')),
        _ => None,
    }
}

#[cfg(test)]
#[path = "../tests/tui_app_tests.rs"]
mod tests;
