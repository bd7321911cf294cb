//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::PortalConfig;
use crate::db::UserStore;
use crate::services::notify::NotificationService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the user store and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: PortalConfig,
    users: Arc<dyn UserStore>,
    notifications: NotificationService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Portal configuration
    /// * `users` - User storage (`PostgreSQL` in production)
    /// * `notifications` - Registration notice dispatch
    #[must_use]
    pub fn new(
        config: PortalConfig,
        users: Arc<dyn UserStore>,
        notifications: NotificationService,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                users,
                notifications,
            }),
        }
    }

    /// Get a reference to the portal configuration.
    #[must_use]
    pub fn config(&self) -> &PortalConfig {
        &self.inner.config
    }

    /// Get a reference to the user store.
    #[must_use]
    pub fn users(&self) -> &dyn UserStore {
        self.inner.users.as_ref()
    }

    /// Get a reference to the notification service.
    #[must_use]
    pub fn notifications(&self) -> &NotificationService {
        &self.inner.notifications
    }
}
