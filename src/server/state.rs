//! Server state and configuration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::business::google::{DEFAULT_BASE_URL, GoogleMapsClient};
use crate::error::ReviewQrError;
use crate::session::{Providers, WizardSession};

/// Sessions idle longer than this are dropped (30 minutes).
pub const SESSION_EXPIRATION_SECS: u64 = 30 * 60;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
    /// Google Maps API key. Empty keeps the search box disabled.
    pub api_key: String,
    /// Maps web-service host
    pub maps_base_url: String,
    /// Pixel scale for previews and exports
    pub render_scale: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            api_key: String::new(),
            maps_base_url: DEFAULT_BASE_URL.to_string(),
            render_scale: 1,
        }
    }
}

/// A wizard session with its last access time.
pub struct SessionEntry {
    pub session: WizardSession,
    pub last_accessed: Instant,
}

impl SessionEntry {
    pub fn new(session: WizardSession) -> Self {
        Self {
            session,
            last_accessed: Instant::now(),
        }
    }

    /// Update last accessed time.
    pub fn touch(&mut self) {
        self.last_accessed = Instant::now();
    }
}

/// One session behind its own lock, so work on it never blocks the others.
pub type SharedEntry = Arc<Mutex<SessionEntry>>;

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub providers: Providers,
    /// Unix timestamp of server boot for cache busting.
    pub boot_time: u64,
    /// The map lock is only held for lookups and inserts.
    pub sessions: RwLock<HashMap<Uuid, SharedEntry>>,
}

impl AppState {
    pub fn new(config: ServerConfig, providers: Providers) -> Self {
        let boot_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            config,
            providers,
            boot_time,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// State backed by the Google Maps client described in `config`.
    pub fn from_config(config: ServerConfig) -> Result<Self, ReviewQrError> {
        let client = GoogleMapsClient::with_base_url(&config.api_key, &config.maps_base_url)?;
        Ok(Self::new(config, Providers::google(client)))
    }

    /// Start a new wizard session and return its id.
    pub async fn create_session(&self) -> Uuid {
        let id = Uuid::new_v4();
        let session = WizardSession::with_scale(&self.providers, self.config.render_scale);
        let entry = Arc::new(Mutex::new(SessionEntry::new(session)));
        self.sessions.write().await.insert(id, entry);
        id
    }

    pub async fn session(&self, id: &Uuid) -> Option<SharedEntry> {
        self.sessions.read().await.get(id).cloned()
    }
}
