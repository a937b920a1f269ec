use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::services::rate_limit::{InMemoryAttemptStore, LoginThrottle};
use crate::services::session::AdminCredentials;

const MAX_TRACKED_CLIENTS: usize = 10_000;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub credentials: Arc<AdminCredentials>,
    pub login_throttle: LoginThrottle,
}

impl AppState {
    pub fn new(conn: Connection, config: AppConfig, credentials: AdminCredentials) -> Self {
        let store = InMemoryAttemptStore::new(
            Duration::from_secs(config.login_window_secs),
            MAX_TRACKED_CLIENTS,
        );
        let login_throttle = LoginThrottle::new(Box::new(store), config.login_max_attempts);
        Self {
            db: Arc::new(Mutex::new(conn)),
            config,
            credentials: Arc::new(credentials),
            login_throttle,
        }
    }

    pub fn conn(&self) -> Result<MutexGuard<'_, Connection>, AppError> {
        self.db
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("database mutex poisoned")))
    }
}
