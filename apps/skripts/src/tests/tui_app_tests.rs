use super::*;
use client_core::{Applied, ManualTimeline, MutationKind};
use shared::domain::{CardId, ThreadId, View};
use std::{sync::Arc, time::Duration};

fn press(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn card(id: &str, title: &str) -> Card {
    Card {
        id: CardId::from(id),
        title: title.into(),
        rationale: String::new(),
        checked: false,
    }
}

fn card_app(timeline: &Arc<ManualTimeline>) -> ReviewApp<Card> {
    let controller = ReviewController::new(timeline.clone(), timeline.clone());
    let mut app = ReviewApp::new(Surface::cards("Onboarding"), controller);
    app.on_loaded(Ok(vec![card("c-1", "First"), card("c-2", "Second")]));
    app
}

#[test]
fn q_quits_from_the_list_but_not_from_the_modal() {
    let timeline = Arc::new(ManualTimeline::new());
    let mut app = card_app(&timeline);

    app.on_key(press(KeyCode::Enter));
    assert!(app.on_key(press(KeyCode::Char('q'))).is_none());
    assert_eq!(app.exit, None);

    app.on_key(press(KeyCode::Esc));
    app.on_key(press(KeyCode::Char('q')));
    assert_eq!(app.exit, Some(Exit::Quit));
}

#[test]
fn ctrl_c_quits_from_the_modal_when_idle() {
    let timeline = Arc::new(ManualTimeline::new());
    let mut app = card_app(&timeline);
    app.on_key(press(KeyCode::Enter));

    app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));

    assert_eq!(app.exit, Some(Exit::Quit));
}

#[test]
fn ctrl_c_waits_for_the_change_in_flight() {
    let timeline = Arc::new(ManualTimeline::new());
    let mut app = card_app(&timeline);
    app.on_key(press(KeyCode::Enter));
    let mutation = app.on_key(press(KeyCode::Enter)).expect("apply");

    app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert_eq!(app.exit, None);
    assert_eq!(
        app.notice,
        Some(Notice::Info("Finishing the pending change...".into()))
    );

    let mut checked = mutation.item;
    checked.checked = true;
    app.on_completion(Completion::Apply(Ok(Applied {
        item: checked,
        remains: false,
    })));

    assert_eq!(app.controller.items().len(), 1);
    assert_eq!(app.exit, Some(Exit::Quit));
}

#[test]
fn ctrl_c_after_a_failed_change_still_quits() {
    let timeline = Arc::new(ManualTimeline::new());
    let mut app = card_app(&timeline);
    app.on_key(press(KeyCode::Enter));
    app.on_key(press(KeyCode::Enter));
    app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));

    app.on_completion(Completion::Apply(Err(ClientError::status(401))));

    assert_eq!(app.exit, Some(Exit::SessionExpired));
}

#[test]
fn arrow_keys_move_like_j_and_k() {
    let timeline = Arc::new(ManualTimeline::new());
    let mut app = card_app(&timeline);

    app.on_key(press(KeyCode::Down));
    assert_eq!(app.controller.focus_index(), 1);
    app.on_key(press(KeyCode::Up));
    assert_eq!(app.controller.focus_index(), 0);
}

#[test]
fn enter_twice_starts_an_apply_for_the_focused_card() {
    let timeline = Arc::new(ManualTimeline::new());
    let mut app = card_app(&timeline);

    assert!(app.on_key(press(KeyCode::Enter)).is_none());
    let mutation = app.on_key(press(KeyCode::Enter)).expect("apply");

    assert_eq!(mutation.kind, MutationKind::Apply);
    assert_eq!(mutation.item.id, CardId::from("c-1"));
    assert!(app.controller.is_busy());
}

#[test]
fn failed_apply_reports_without_touching_the_list() {
    let timeline = Arc::new(ManualTimeline::new());
    let mut app = card_app(&timeline);
    app.on_key(press(KeyCode::Enter));
    app.on_key(press(KeyCode::Enter));

    app.on_completion(Completion::Apply(Err(ClientError::status(500))));

    assert_eq!(
        app.notice,
        Some(Notice::Error(
            "Check failed: request failed with status 500".into()
        ))
    );
    assert_eq!(app.controller.items().len(), 2);
    assert_eq!(app.exit, None);
}

#[test]
fn unauthorized_completion_exits_to_login() {
    let timeline = Arc::new(ManualTimeline::new());
    let mut app = card_app(&timeline);
    app.on_key(press(KeyCode::Enter));
    app.on_key(press(KeyCode::Enter));

    app.on_completion(Completion::Apply(Err(ClientError::status(401))));

    assert_eq!(app.exit, Some(Exit::SessionExpired));
}

#[test]
fn undo_after_apply_restores_and_says_so() {
    let timeline = Arc::new(ManualTimeline::new());
    let mut app = card_app(&timeline);
    app.on_key(press(KeyCode::Enter));
    let mutation = app.on_key(press(KeyCode::Enter)).expect("apply");
    let mut checked = mutation.item.clone();
    checked.checked = true;
    app.on_completion(Completion::Apply(Ok(Applied {
        item: checked,
        remains: false,
    })));
    assert_eq!(app.controller.items().len(), 1);

    timeline.advance(Duration::from_millis(1200));
    let undo = app.on_key(press(KeyCode::Char('u'))).expect("undo");
    assert_eq!(undo.kind, MutationKind::Revert);
    app.on_completion(Completion::Revert(Ok(mutation.item)));

    assert_eq!(app.controller.items().len(), 2);
    assert_eq!(app.notice, Some(Notice::Info("Restored.".into())));
}

#[test]
fn load_failures_are_kept_for_display() {
    let timeline = Arc::new(ManualTimeline::new());
    let controller = ReviewController::<Card>::new(timeline.clone(), timeline);
    let mut app = ReviewApp::new(Surface::cards("Missing"), controller);

    app.on_loaded(Err(ClientError::status(404)));

    assert_eq!(
        app.load_error.as_deref(),
        Some("Not found. It may have been removed.")
    );
}

#[test]
fn login_route_ends_the_session() {
    let timeline = Arc::new(ManualTimeline::new());
    let mut app = card_app(&timeline);

    app.on_route(Route::Threads);
    assert_eq!(app.exit, None);
    app.on_route(Route::Login);
    assert_eq!(app.exit, Some(Exit::SessionExpired));
}

#[test]
fn thread_rows_describe_preview_and_open_cards() {
    let summary = ThreadSummary {
        id: ThreadId::from("t-1"),
        title: "Onboarding".into(),
        view: View::Unchecked,
        preview: Some("First week".into()),
        open_cards: 2,
        updated_at: None,
    };
    assert_eq!(
        summary.detail().as_deref(),
        Some("First week (2 open cards)")
    );

    let bare = ThreadSummary {
        preview: None,
        open_cards: 0,
        ..summary
    };
    assert_eq!(bare.detail(), None);
}
