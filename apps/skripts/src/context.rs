use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use client_core::{
    AuthApi, ChannelNavigator, ClientError, InMemoryThreadApi, LocalAuth, RemoteDataClient,
    ThreadApi,
};
use crossbeam_channel::Receiver;
use shared::{domain::Session, route::Route};
use storage::{FileStore, SessionStore};
use tracing::{debug, warn};

use crate::config::Settings;

pub const LOGIN_HINT: &str = "run `skripts login --email <email> --password <password>`";

/// Everything a command needs: data access, auth, and the navigation feed.
pub struct AppContext {
    pub settings: Settings,
    pub sessions: SessionStore,
    pub threads: Arc<dyn ThreadApi>,
    pub auth: Arc<dyn AuthApi>,
    pub routes: Receiver<Route>,
    pub demo: bool,
}

impl AppContext {
    pub fn remote(settings: Settings) -> Result<Self> {
        let api_url = settings.api_url()?;
        let sessions = match &settings.data_dir {
            Some(dir) => SessionStore::new(Arc::new(FileStore::for_origin(dir, &api_url))),
            None => {
                warn!("no data directory; sessions will not survive this process");
                SessionStore::detached()
            }
        };
        let (tx, routes) = crossbeam_channel::bounded(8);
        let client = Arc::new(
            RemoteDataClient::from_base(
                api_url.as_str(),
                sessions.clone(),
                Arc::new(ChannelNavigator::new(tx)),
            )
            .context("build remote data client")?,
        );
        debug!(api = %api_url, durable = sessions.is_durable(), "remote context ready");

        Ok(Self {
            settings,
            sessions,
            threads: client.clone(),
            auth: client,
            routes,
            demo: false,
        })
    }

    /// Offline context backed by the seeded fixture, already signed in.
    pub fn demo(settings: Settings) -> Self {
        let sessions = SessionStore::in_memory();
        sessions.write(&Session {
            token: "local-demo".into(),
            user_id: Some("demo@skripts.dev".into()),
            expires_at: None,
        });
        // The fixture never answers 401, so nothing is ever sent here.
        let (_tx, routes) = crossbeam_channel::bounded(1);

        Self {
            settings,
            threads: Arc::new(InMemoryThreadApi::seeded()),
            auth: Arc::new(LocalAuth::new(sessions.clone())),
            sessions,
            routes,
            demo: true,
        }
    }

    /// The auth gate: protected routes need an unexpired session.
    pub fn require_session(&self) -> Result<Session> {
        self.sessions
            .current(Utc::now())
            .ok_or(ClientError::NotAuthenticated)
            .with_context(|| format!("sign in first: {LOGIN_HINT}"))
    }

    pub fn guard(&self, route: &Route) -> Result<()> {
        if route.requires_session() {
            self.require_session()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn demo_context_starts_signed_in() {
        let ctx = AppContext::demo(Settings::default());
        assert!(ctx.guard(&Route::Threads).is_ok());
    }

    #[test]
    fn expired_session_fails_the_gate_and_is_removed() {
        let ctx = AppContext::demo(Settings::default());
        ctx.sessions.write(&Session {
            token: "stale".into(),
            user_id: None,
            expires_at: Some(Utc::now() - Duration::minutes(1)),
        });

        let err = ctx.guard(&Route::View(shared::domain::View::Later)).expect_err("gated");

        assert!(err.to_string().starts_with("sign in first"));
        assert!(ctx.sessions.read().is_none());
    }

    #[test]
    fn login_route_is_open_without_a_session() {
        let ctx = AppContext::demo(Settings::default());
        ctx.sessions.clear();
        assert!(ctx.guard(&Route::Login).is_ok());
        assert!(ctx.require_session().is_err());
    }

    #[test]
    fn remote_context_without_data_dir_is_detached() {
        let settings = Settings {
            data_dir: None,
            ..Settings::default()
        };
        let ctx = AppContext::remote(settings).expect("context");
        assert!(!ctx.sessions.is_durable());
        assert!(!ctx.demo);
    }
}
