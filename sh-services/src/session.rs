//! Signed-in user context.
//!
//! Sign-in itself happens elsewhere; this only carries the user the
//! current process acts as, so services can default "my bookings",
//! "my conversations" and the verification target to it.

use std::sync::Arc;
use tokio::sync::RwLock;

use sh_core::error::{ShError, ShResult};

#[derive(Debug, Clone, Default)]
struct SessionState {
    user_id: Option<String>,
}

/// Shared, explicitly passed session holder.
#[derive(Clone, Default)]
pub struct SessionContext {
    inner: Arc<RwLock<SessionState>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        Self {
            inner: Arc::new(RwLock::new(SessionState {
                user_id: (!user_id.trim().is_empty()).then_some(user_id),
            })),
        }
    }

    pub async fn set_user(&self, user_id: Option<String>) {
        self.inner.write().await.user_id = user_id.filter(|u| !u.trim().is_empty());
    }

    pub async fn current_user(&self) -> Option<String> {
        self.inner.read().await.user_id.clone()
    }

    /// The explicit id if given, otherwise the signed-in user.
    pub async fn resolve_user(&self, explicit: Option<&str>) -> ShResult<String> {
        if let Some(id) = explicit.map(str::trim).filter(|id| !id.is_empty()) {
            return Ok(id.to_string());
        }
        self.current_user().await.ok_or_else(|| {
            ShError::InvalidInput("no user given and no signed-in user (pass --user)".into())
        })
    }
}
