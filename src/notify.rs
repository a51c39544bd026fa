use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

/// Transient messages waiting to be shown once.
#[derive(Default)]
pub struct Notifications {
    pending: Mutex<VecDeque<Toast>>,
}

impl Notifications {
    /// Unread toasts beyond this are dropped oldest first.
    pub const MAX_PENDING: usize = 32;

    pub fn success(&self, message: impl Into<String>) { self.push(ToastLevel::Success, message.into()) }

    pub fn error(&self, message: impl Into<String>) { self.push(ToastLevel::Error, message.into()) }

    fn push(&self, level: ToastLevel, message: String) {
        let mut pending = self.pending.lock();
        if pending.len() == Self::MAX_PENDING {
            pending.pop_front();
        }
        pending.push_back(Toast { level, message, raised_at: Utc::now() });
    }

    pub fn drain(&self) -> Vec<Toast> {
        self.pending.lock().drain(..).collect()
    }
}
