mod commands;
mod config;
mod context;
mod tui;

use std::{fs, path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::{Parser, Subcommand};
use shared::{
    domain::{Action, ThreadId, View},
    route::Route,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use config::{load_settings, Settings};
use context::AppContext;

#[derive(Parser, Debug)]
#[command(name = "skripts", about = "Keyboard-first review of Skripts threads and cards")]
struct Cli {
    #[arg(long, global = true)]
    server_url: Option<String>,
    #[arg(long, global = true)]
    api_base: Option<String>,
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Run against built-in sample data instead of a server.
    #[arg(long, global = true)]
    demo: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    Whoami,
    /// List threads, one view or all of them.
    Threads {
        #[arg(long)]
        view: Option<View>,
    },
    Thread {
        id: ThreadId,
    },
    Conversation {
        id: ThreadId,
    },
    /// Apply a thread action: confirm, undo, snooze-now, snooze-later.
    Act {
        id: ThreadId,
        action: Action,
    },
    /// Check the open cards of one thread.
    Review {
        thread_id: ThreadId,
    },
    /// Work through the threads of a view.
    Session {
        #[arg(default_value = "unchecked")]
        view: View,
    },
    /// Open a route such as /threads/t-1 or /later.
    Open {
        route: Route,
    },
}

impl Command {
    fn is_interactive(&self) -> bool {
        match self {
            Command::Review { .. } | Command::Session { .. } => true,
            Command::Open { route } => matches!(
                route,
                Route::ThreadCards(_) | Route::View(View::Unchecked)
            ),
            _ => false,
        }
    }
}

fn apply_cli(settings: &mut Settings, cli: &Cli) {
    if let Some(v) = &cli.server_url {
        settings.server_url = v.clone();
    }
    if let Some(v) = &cli.api_base {
        settings.api_base = v.clone();
    }
    if let Some(v) = &cli.data_dir {
        settings.data_dir = Some(v.clone());
    }
}

fn init_tracing(settings: &Settings, interactive: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if interactive {
        // Anything written to the terminal would tear the review screen.
        let log_file = settings.log_path().and_then(|path| {
            if let Some(dir) = path.parent() {
                let _ = fs::create_dir_all(dir);
            }
            fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });
        match log_file {
            Some(file) => builder.with_ansi(false).with_writer(Arc::new(file)).init(),
            None => builder.with_writer(std::io::sink).init(),
        }
    } else {
        builder.with_writer(std::io::stderr).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (mut settings, warnings) = load_settings();
    apply_cli(&mut settings, &cli);
    init_tracing(&settings, cli.command.is_interactive());
    for warning in warnings {
        warn!("{warning}");
    }

    let ctx = if cli.demo {
        AppContext::demo(settings)
    } else {
        AppContext::remote(settings)?
    };
    commands::run(&ctx, cli.command).await
}
