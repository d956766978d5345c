//! Navigation surface shared by the client core and the front ends.

use std::{fmt, str::FromStr};

use crate::domain::{ParseKindError, ThreadId, View};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Threads,
    /// Card review of one thread.
    ThreadCards(ThreadId),
    /// Thread detail with thread-level actions.
    Thread(ThreadId),
    Conversation(ThreadId),
    View(View),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Threads => "/threads".to_string(),
            Route::ThreadCards(id) => format!("/threads/{id}"),
            Route::Thread(id) => format!("/thread/{id}"),
            Route::Conversation(id) => format!("/conversation/{id}"),
            Route::View(view) => format!("/{view}"),
        }
    }

    pub fn requires_session(&self) -> bool {
        !matches!(self, Route::Login)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl FromStr for Route {
    type Err = ParseKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseKindError {
            kind: "route",
            value: value.to_string(),
        };
        let trimmed = value.trim().trim_end_matches('/');
        let segments: Vec<&str> = trimmed
            .strip_prefix('/')
            .ok_or_else(invalid)?
            .split('/')
            .collect();

        match segments.as_slice() {
            ["login"] => Ok(Route::Login),
            ["threads"] => Ok(Route::Threads),
            ["threads", id] if !id.is_empty() => Ok(Route::ThreadCards(ThreadId::from(*id))),
            ["thread", id] if !id.is_empty() => Ok(Route::Thread(ThreadId::from(*id))),
            ["conversation", id] if !id.is_empty() => {
                Ok(Route::Conversation(ThreadId::from(*id)))
            }
            [view] => view.parse::<View>().map(Route::View).map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}
