//! Interactive review surfaces: card review of one thread and the thread session of a view.

pub mod app;
pub mod render;

use std::{
    io::{self, Stdout},
    sync::Arc,
    time::Duration,
};

use anyhow::{bail, Context, Result};
use client_core::{
    run_mutation, working_cards, CardReview, ClientError, Completion, ReviewController,
    ReviewExecutor, SystemClock, ThreadReview, TimerId, TokioScheduler,
};
use crossbeam_channel::Receiver;
use crossterm::{
    event::{Event, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::{future::BoxFuture, FutureExt, StreamExt};
use ratatui::{backend::CrosstermBackend, Terminal};
use shared::{
    domain::{ThreadId, View},
    route::Route,
};
use tokio::sync::mpsc;

use crate::context::{AppContext, LOGIN_HINT};
use app::{Exit, ReviewApp, ReviewRow, Surface};

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Result of the initial fetch: an optional better title plus the working list.
pub struct Loaded<T> {
    pub title: Option<String>,
    pub items: Vec<T>,
}

type Loader<T> = BoxFuture<'static, Result<Loaded<T>, ClientError>>;

pub async fn run_card_review(ctx: &AppContext, thread_id: ThreadId) -> Result<()> {
    ctx.guard(&Route::ThreadCards(thread_id.clone()))?;
    let review = Arc::new(CardReview::new(ctx.threads.clone(), thread_id.clone()));
    let loader = {
        let review = review.clone();
        async move {
            let thread = review.load().await?;
            Ok::<_, ClientError>(Loaded {
                title: Some(thread.title.clone()),
                items: working_cards(&thread),
            })
        }
        .boxed()
    };
    run_review(
        ctx,
        Surface::cards(&format!("Thread {thread_id}")),
        review,
        loader,
    )
    .await
}

pub async fn run_thread_session(ctx: &AppContext, view: View) -> Result<()> {
    ctx.guard(&Route::View(view))?;
    let review = Arc::new(ThreadReview::new(ctx.threads.clone(), view));
    let loader = {
        let review = review.clone();
        async move {
            Ok::<_, ClientError>(Loaded {
                title: None,
                items: review.load().await?,
            })
        }
        .boxed()
    };
    run_review(ctx, Surface::threads(view), review, loader).await
}

async fn run_review<T, E>(
    ctx: &AppContext,
    surface: Surface,
    executor: Arc<E>,
    loader: Loader<T>,
) -> Result<()>
where
    T: ReviewRow,
    E: ReviewExecutor<T> + 'static,
{
    let (scheduler, timers) = TokioScheduler::new();
    let controller = ReviewController::new(Arc::new(SystemClock), scheduler)
        .with_undo_window(ctx.settings.undo_window());
    let mut app = ReviewApp::new(surface, controller);

    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, &mut app, executor, loader, timers, &ctx.routes).await;
    restore_terminal(&mut terminal)?;
    result?;

    if app.exit == Some(Exit::SessionExpired) {
        bail!("session expired; {LOGIN_HINT}");
    }
    Ok(())
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.clear()?;

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn event_loop<T, E>(
    terminal: &mut Tui,
    app: &mut ReviewApp<T>,
    executor: Arc<E>,
    loader: Loader<T>,
    mut timers: mpsc::UnboundedReceiver<TimerId>,
    routes: &Receiver<Route>,
) -> Result<()>
where
    T: ReviewRow,
    E: ReviewExecutor<T> + 'static,
{
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion<T>>();
    let (loaded_tx, mut loaded_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let _ = loaded_tx.send(loader.await);
    });

    let mut events = EventStream::new();
    // Redraws the undo countdown.
    let mut tick = tokio::time::interval(Duration::from_millis(250));

    loop {
        while let Ok(route) = routes.try_recv() {
            app.on_route(route);
        }
        if app.exit.is_some() {
            return Ok(());
        }
        terminal.draw(|frame| render::render(frame, app))?;

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) => {
                    if let Some(mutation) = app.on_key(key) {
                        let executor = executor.clone();
                        let done_tx = done_tx.clone();
                        tokio::spawn(async move {
                            let completion = run_mutation(executor.as_ref(), mutation).await;
                            let _ = done_tx.send(completion);
                        });
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err).context("read terminal event"),
                None => return Ok(()),
            },
            Some(timer) = timers.recv() => app.on_timer(timer),
            Some(completion) = done_rx.recv() => app.on_completion(completion),
            Some(loaded) = loaded_rx.recv() => match loaded {
                Ok(Loaded { title, items }) => {
                    if let Some(title) = title {
                        app.surface.title = title;
                    }
                    app.on_loaded(Ok(items));
                }
                Err(err) => app.on_loaded(Err(err)),
            },
            _ = tick.tick() => {}
        }
    }
}
