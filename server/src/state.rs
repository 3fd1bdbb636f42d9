use std::sync::Arc;

use dashmap::DashMap;
use larder_core::config::ConfigError;
use larder_core::orchestrator::{BacklogHandle, Engine, GenerationSession};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::db::DbPool;

pub type AppState = Arc<AppContext>;

/// Everything the handlers share.
pub struct AppContext {
    pub pool: DbPool,
    pub engine: Engine,
    pub admin: AdminCredentials,
    /// Interactive sessions. Each is locked for the length of an action so
    /// two clicks cannot interleave.
    pub sessions: DashMap<Uuid, Arc<Mutex<GenerationSession>>>,
    pub backlogs: DashMap<Uuid, BacklogHandle>,
}

impl AppContext {
    pub fn new(pool: DbPool, engine: Engine, admin: AdminCredentials) -> Self {
        Self {
            pool,
            engine,
            admin,
            sessions: DashMap::new(),
            backlogs: DashMap::new(),
        }
    }

    pub fn session(&self, id: Uuid) -> Option<Arc<Mutex<GenerationSession>>> {
        self.sessions.get(&id).map(|entry| entry.value().clone())
    }
}

#[derive(Clone)]
pub struct AdminCredentials {
    pub username: String,
    /// Argon2 PHC string.
    pub password_hash: String,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl AdminCredentials {
    /// Required: `ADMIN_USERNAME`, `ADMIN_PASSWORD_HASH`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
        };
        Ok(Self {
            username: read("ADMIN_USERNAME")?,
            password_hash: read("ADMIN_PASSWORD_HASH")?,
        })
    }
}
