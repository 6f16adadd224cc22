//! Toast notification center.
//!
//! Holds the user-visible messages raised by services (remote failures,
//! camera errors, verification results). Toasts are kept in a bounded
//! queue and broadcast on the event bus as they arrive.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use sh_core::constants::MAX_TOASTS;
use sh_core::error::ShError;

use crate::event_bus::{AppEvent, EventBus};

/// Severity of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A user-visible message.
#[derive(Debug, Clone, Serialize)]
pub struct Toast {
    pub id: String,
    pub level: ToastLevel,
    pub title: String,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

/// Shared toast queue. Cloning shares the queue.
#[derive(Clone)]
pub struct NotificationCenter {
    toasts: Arc<Mutex<VecDeque<Toast>>>,
    event_bus: EventBus,
}

impl NotificationCenter {
    pub fn new(event_bus: EventBus) -> Self {
        Self {
            toasts: Arc::new(Mutex::new(VecDeque::new())),
            event_bus,
        }
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<Toast>> {
        self.toasts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Raise a toast and return it.
    pub fn push(&self, level: ToastLevel, title: &str, message: &str) -> Toast {
        let toast = Toast {
            id: uuid::Uuid::new_v4().to_string(),
            level,
            title: title.to_string(),
            message: message.to_string(),
            raised_at: Utc::now(),
        };

        {
            let mut queue = self.queue();
            if queue.len() >= MAX_TOASTS {
                queue.pop_front();
            }
            queue.push_back(toast.clone());
        }

        self.event_bus.emit(AppEvent::ToastRaised(toast.clone()));
        toast
    }

    pub fn info(&self, title: &str, message: &str) -> Toast {
        self.push(ToastLevel::Info, title, message)
    }

    pub fn success(&self, title: &str, message: &str) -> Toast {
        self.push(ToastLevel::Success, title, message)
    }

    pub fn warning(&self, title: &str, message: &str) -> Toast {
        self.push(ToastLevel::Warning, title, message)
    }

    pub fn error(&self, title: &str, message: &str) -> Toast {
        self.push(ToastLevel::Error, title, message)
    }

    /// Log a remote failure and surface it to the user.
    pub fn report_remote_error(&self, context: &str, err: &ShError) -> Toast {
        warn!("{context}: {err}");
        self.error(context, &err.user_message())
    }

    /// Log a completed action and confirm it to the user.
    pub fn report_success(&self, title: &str, message: &str) -> Toast {
        info!("{title}: {message}");
        self.success(title, message)
    }

    /// The most recent `limit` toasts, newest last.
    pub fn recent(&self, limit: usize) -> Vec<Toast> {
        let queue = self.queue();
        let skip = queue.len().saturating_sub(limit);
        queue.iter().skip(skip).cloned().collect()
    }

    /// Remove and return every queued toast.
    pub fn drain(&self) -> Vec<Toast> {
        self.queue().drain(..).collect()
    }

    /// Dismiss one toast by id. Returns whether it was queued.
    pub fn dismiss(&self, id: &str) -> bool {
        let mut queue = self.queue();
        let before = queue.len();
        queue.retain(|t| t.id != id);
        queue.len() != before
    }

    pub fn len(&self) -> usize {
        self.queue().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
