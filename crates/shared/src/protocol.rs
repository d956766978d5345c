use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Action, Session, ThreadDetail, View};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ListThreadsQuery {
    pub view: View,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub action: Action,
}

/// Servers answer an action either with the bare thread or wrapped in `{"thread": ..}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionResponse {
    Wrapped { thread: ThreadDetail },
    Bare(ThreadDetail),
}

impl ActionResponse {
    pub fn into_thread(self) -> ThreadDetail {
        match self {
            ActionResponse::Wrapped { thread } => thread,
            ActionResponse::Bare(thread) => thread,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardCheckRequest {
    pub checked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<LoginResponse> for Session {
    fn from(value: LoginResponse) -> Self {
        Session {
            token: value.token,
            user_id: value.user_id,
            expires_at: value.expires_at,
        }
    }
}
