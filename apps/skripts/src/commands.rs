//! Non-interactive commands. Each prints a plain-text rendering to stdout.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use client_core::ClientError;
use shared::{
    domain::{Action, ThreadDetail, ThreadId, ThreadSummary, View},
    route::Route,
};
use tracing::info;

use crate::{
    context::{AppContext, LOGIN_HINT},
    tui, Command,
};

pub async fn run(ctx: &AppContext, command: Command) -> Result<()> {
    let result = dispatch(ctx, command).await;
    match result {
        Err(err) if login_requested(ctx) => {
            Err(err.context(format!("session ended; {LOGIN_HINT}")))
        }
        other => other,
    }
}

/// Drains navigation requests raised by the data layer during a command.
fn login_requested(ctx: &AppContext) -> bool {
    ctx.routes
        .try_iter()
        .fold(false, |seen, route| seen || route == Route::Login)
}

async fn dispatch(ctx: &AppContext, command: Command) -> Result<()> {
    match command {
        Command::Login { email, password } => login(ctx, &email, &password).await,
        Command::Logout => logout(ctx).await,
        Command::Whoami => whoami(ctx),
        Command::Threads { view } => threads(ctx, view).await,
        Command::Thread { id } => open(ctx, Route::Thread(id)).await,
        Command::Conversation { id } => open(ctx, Route::Conversation(id)).await,
        Command::Act { id, action } => act(ctx, &id, action).await,
        Command::Review { thread_id } => open(ctx, Route::ThreadCards(thread_id)).await,
        Command::Session { view } => tui::run_thread_session(ctx, view).await,
        Command::Open { route } => open(ctx, route).await,
    }
}

async fn login(ctx: &AppContext, email: &str, password: &str) -> Result<()> {
    match ctx.auth.login(email, password).await {
        Ok(session) => {
            println!(
                "Signed in as {}.",
                session.user_id.as_deref().unwrap_or(email.trim())
            );
            Ok(())
        }
        Err(ClientError::InvalidCredentials) => {
            anyhow::bail!("login failed: check your email and password")
        }
        Err(err) => Err(err).context("login failed"),
    }
}

async fn logout(ctx: &AppContext) -> Result<()> {
    ctx.auth.logout().await;
    println!("Signed out.");
    Ok(())
}

fn whoami(ctx: &AppContext) -> Result<()> {
    let session = ctx.require_session()?;
    let expiry = session
        .expires_at
        .map(|at| format!(" (expires {})", at.to_rfc3339()))
        .unwrap_or_default();
    let mode = if ctx.demo { " [demo]" } else { "" };
    println!(
        "{}{expiry}{mode}",
        session.user_id.as_deref().unwrap_or("signed in")
    );
    Ok(())
}

async fn threads(ctx: &AppContext, view: Option<View>) -> Result<()> {
    ctx.guard(&Route::Threads)?;
    let views = match view {
        Some(view) => vec![view],
        None => View::ALL.to_vec(),
    };
    for view in views {
        let threads = ctx
            .threads
            .list_threads(view)
            .await
            .with_context(|| format!("list {view} threads"))?;
        print!("{}", format_thread_list(view, &threads));
    }
    Ok(())
}

async fn act(ctx: &AppContext, id: &ThreadId, action: Action) -> Result<()> {
    ctx.guard(&Route::Thread(id.clone()))?;
    let thread = ctx
        .threads
        .perform_action(id, action)
        .await
        .with_context(|| format!("{action} on thread {id}"))?;
    info!(thread = %id, %action, view = %thread.view, "action applied");
    print!("{}", format_action_result(&thread, action));
    Ok(())
}

pub fn format_action_result(thread: &ThreadDetail, action: Action) -> String {
    let mut out = format!("{} is now in {}.\n", thread.title, thread.view);
    if action.is_reversible() {
        let _ = writeln!(out, "Revert with `skripts act {} undo`.", thread.id);
    }
    out
}

/// Dispatches a route to the surface that renders it.
pub async fn open(ctx: &AppContext, route: Route) -> Result<()> {
    ctx.guard(&route)?;
    match route {
        Route::Login => {
            println!("To sign in, {LOGIN_HINT}.");
            Ok(())
        }
        Route::Threads => threads(ctx, None).await,
        Route::ThreadCards(id) => tui::run_card_review(ctx, id).await,
        Route::Thread(id) => {
            let thread = load_thread(ctx, &id).await?;
            print!("{}", format_thread_detail(&thread));
            Ok(())
        }
        Route::Conversation(id) => {
            let thread = load_thread(ctx, &id).await?;
            print!("{}", format_conversation(&thread));
            Ok(())
        }
        Route::View(View::Unchecked) => tui::run_thread_session(ctx, View::Unchecked).await,
        Route::View(view) => threads(ctx, Some(view)).await,
    }
}

async fn load_thread(ctx: &AppContext, id: &ThreadId) -> Result<ThreadDetail> {
    match ctx.threads.get_thread_detail(id).await {
        Ok(thread) => Ok(thread),
        Err(err) if err.is_not_found() => anyhow::bail!("thread {id} not found"),
        Err(err) => Err(err).with_context(|| format!("load thread {id}")),
    }
}

pub fn format_thread_list(view: View, threads: &[ThreadSummary]) -> String {
    let mut out = format!("{view} ({})\n", threads.len());
    if threads.is_empty() {
        out.push_str("  No threads left in this view.\n");
        return out;
    }
    for thread in threads {
        let _ = write!(out, "  {}  {}", thread.id, thread.title);
        if thread.open_cards > 0 {
            let _ = write!(out, "  [{} open]", thread.open_cards);
        }
        out.push('\n');
        if let Some(preview) = thread.preview.as_deref().filter(|p| !p.is_empty()) {
            let _ = writeln!(out, "      {preview}");
        }
    }
    out
}

pub fn format_thread_detail(thread: &ThreadDetail) -> String {
    let mut out = format!("{}  {}\nview: {}\n", thread.id, thread.title, thread.view);
    if let Some(content) = thread.content.as_deref() {
        let _ = writeln!(out, "\n{content}");
    }
    let open = thread.unchecked_cards().count();
    let _ = writeln!(out, "\ncards: {open} open of {}", thread.cards.len());
    let actions: Vec<&str> = Action::ALL
        .iter()
        .filter(|action| **action != Action::Undo || thread.view != View::Unchecked)
        .map(|action| action.as_str())
        .collect();
    let _ = writeln!(out, "actions: {}", actions.join(", "));
    out
}

pub fn format_conversation(thread: &ThreadDetail) -> String {
    let mut out = format!("{}\n", thread.title);
    if thread.cards.is_empty() {
        out.push_str("  No cards in this thread.\n");
        return out;
    }
    for card in &thread.cards {
        let mark = if card.checked { "x" } else { " " };
        let _ = writeln!(out, "  [{mark}] {}", card.title);
        if !card.rationale.is_empty() {
            let _ = writeln!(out, "      why: {}", card.rationale);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use async_trait::async_trait;
    use client_core::{ChannelNavigator, LocalAuth, Navigator, ThreadApi};
    use shared::domain::{Card, CardId, Session};
    use std::sync::Arc;
    use storage::SessionStore;

    /// Answers every call the way the remote client answers a revoked token.
    struct RevokedApi {
        sessions: SessionStore,
        navigator: ChannelNavigator,
    }

    impl RevokedApi {
        fn reject(&self) -> ClientError {
            self.sessions.clear();
            self.navigator.navigate(Route::Login);
            ClientError::status(401)
        }
    }

    #[async_trait]
    impl ThreadApi for RevokedApi {
        async fn list_threads(&self, _view: View) -> Result<Vec<ThreadSummary>, ClientError> {
            Err(self.reject())
        }

        async fn get_thread_detail(&self, _id: &ThreadId) -> Result<ThreadDetail, ClientError> {
            Err(self.reject())
        }

        async fn perform_action(
            &self,
            _id: &ThreadId,
            _action: Action,
        ) -> Result<ThreadDetail, ClientError> {
            Err(self.reject())
        }

        async fn set_card_checked(
            &self,
            _thread_id: &ThreadId,
            _card_id: &CardId,
            _checked: bool,
        ) -> Result<Card, ClientError> {
            Err(self.reject())
        }
    }

    fn revoked_context() -> AppContext {
        let sessions = SessionStore::in_memory();
        sessions.write(&Session::new("stale"));
        let (tx, routes) = crossbeam_channel::bounded(8);
        AppContext {
            settings: Settings::default(),
            threads: Arc::new(RevokedApi {
                sessions: sessions.clone(),
                navigator: ChannelNavigator::new(tx),
            }),
            auth: Arc::new(LocalAuth::new(sessions.clone())),
            sessions,
            routes,
            demo: false,
        }
    }

    #[tokio::test]
    async fn revoked_session_sends_the_user_to_login() {
        let ctx = revoked_context();

        let err = run(
            &ctx,
            Command::Threads {
                view: Some(View::Unchecked),
            },
        )
        .await
        .expect_err("unauthorized");

        assert!(err.to_string().contains("skripts login"));
        assert!(format!("{err:#}").contains("request failed with status 401"));
        assert!(ctx.routes.try_recv().is_err(), "login request consumed");
        assert!(ctx.sessions.read().is_none());
    }

    #[tokio::test]
    async fn revoked_session_during_an_action_is_reported_the_same_way() {
        let ctx = revoked_context();

        let err = run(
            &ctx,
            Command::Act {
                id: ThreadId::from("t-1"),
                action: Action::Confirm,
            },
        )
        .await
        .expect_err("unauthorized");

        assert!(err.to_string().starts_with("session ended"));
    }

    #[tokio::test]
    async fn other_failures_are_not_blamed_on_the_session() {
        let ctx = AppContext::demo(Settings::default());

        let err = run(
            &ctx,
            Command::Thread {
                id: ThreadId::from("t-404"),
            },
        )
        .await
        .expect_err("missing");

        assert_eq!(err.to_string(), "thread t-404 not found");
    }

    #[test]
    fn only_reversible_actions_offer_a_revert_hint() {
        let mut done = thread();
        done.view = View::Done;
        assert_eq!(
            format_action_result(&done, Action::Confirm),
            "Onboarding is now in done.\nRevert with `skripts act t-1 undo`.\n"
        );

        let mut later = thread();
        later.view = View::Later;
        assert_eq!(
            format_action_result(&later, Action::SnoozeLater),
            "Onboarding is now in later.\n"
        );
    }

    fn thread() -> ThreadDetail {
        ThreadDetail {
            id: ThreadId::from("t-1"),
            title: "Onboarding".into(),
            view: View::Unchecked,
            content: None,
            cards: vec![
                Card {
                    id: CardId::from("c-1"),
                    title: "Core benefit?".into(),
                    rationale: "Fast start.".into(),
                    checked: true,
                },
                Card {
                    id: CardId::from("c-2"),
                    title: "First blocker?".into(),
                    rationale: String::new(),
                    checked: false,
                },
            ],
        }
    }

    #[test]
    fn empty_list_says_so() {
        assert_eq!(
            format_thread_list(View::Later, &[]),
            "later (0)\n  No threads left in this view.\n"
        );
    }

    #[test]
    fn list_shows_open_cards_and_preview() {
        let summary = ThreadSummary {
            preview: Some("First week".into()),
            ..thread().summary()
        };
        let out = format_thread_list(View::Unchecked, &[summary]);
        assert_eq!(
            out,
            "unchecked (1)\n  t-1  Onboarding  [1 open]\n      First week\n"
        );
    }

    #[test]
    fn detail_hides_undo_for_unchecked_threads() {
        let out = format_thread_detail(&thread());
        assert!(out.contains("cards: 1 open of 2"));
        assert!(out.contains("actions: confirm, snooze-now, snooze-later"));
    }

    #[test]
    fn conversation_marks_checked_cards() {
        let out = format_conversation(&thread());
        assert_eq!(
            out,
            "Onboarding\n  [x] Core benefit?\n      why: Fast start.\n  [ ] First blocker?\n"
        );
    }
}
