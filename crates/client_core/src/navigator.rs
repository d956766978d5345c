//! Seam through which the data layer asks the front end to change screens.

use std::sync::Mutex;

use crossbeam_channel::{Sender, TrySendError};
use shared::route::Route;
use tracing::{debug, warn};

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<Route> {
        self.routes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(route);
    }
}

/// Forwards navigation requests to the UI loop.
pub struct ChannelNavigator {
    tx: Sender<Route>,
}

impl ChannelNavigator {
    pub fn new(tx: Sender<Route>) -> Self {
        Self { tx }
    }
}

impl Navigator for ChannelNavigator {
    fn navigate(&self, route: Route) {
        match self.tx.try_send(route) {
            Ok(()) => {}
            Err(TrySendError::Full(route)) => {
                warn!(route = %route, "navigation queue is full; dropping request")
            }
            Err(TrySendError::Disconnected(route)) => {
                debug!(route = %route, "navigation receiver gone")
            }
        }
    }
}
