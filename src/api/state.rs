use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use secrecy::ExposeSecret;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::Config;
use crate::services::model_fetcher::{ModelFetcher, QrModelFetcher};
use crate::services::parcel;
use crate::services::scan_dispatcher::ScanDispatcher;
use crate::services::ticketing_client::{TicketingClient, TicketingClientError};

/// Scan dispatchers of the currently open code-reader screens
pub type ScanSessions = Arc<Mutex<HashMap<Uuid, ScanSession>>>;

#[derive(Debug, Clone)]
pub struct ScanSession {
    pub dispatcher: ScanDispatcher,
    pub last_seen: DateTime<Utc>,
}

impl ScanSession {
    pub fn new(dispatcher: ScanDispatcher, now: DateTime<Utc>) -> Self {
        Self {
            dispatcher,
            last_seen: now,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_seen = now;
    }

    pub fn is_stale(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.last_seen > ttl
    }
}

/// Drops sessions idle for longer than `ttl`, returning how many were removed
pub fn evict_stale_sessions(
    sessions: &mut HashMap<Uuid, ScanSession>,
    now: DateTime<Utc>,
    ttl: Duration,
) -> usize {
    let before = sessions.len();
    sessions.retain(|session_id, session| {
        let stale = session.is_stale(now, ttl);
        if stale {
            tracing::info!(session_id = %session_id, "Evicting idle scan session");
        }
        !stale
    });
    before - sessions.len()
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: ScanSessions,
    pub fetcher: Arc<dyn ModelFetcher>,
    pub ticketing: TicketingClient,
    pub parcel_key: [u8; 32],
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, TicketingClientError> {
        Self::with_fetcher(config, Arc::new(QrModelFetcher))
    }

    pub fn with_fetcher(
        config: Config,
        fetcher: Arc<dyn ModelFetcher>,
    ) -> Result<Self, TicketingClientError> {
        let ticketing = TicketingClient::new(config.http_timeout())?;
        let parcel_key = parcel::derive_key(config.parcel_key.expose_secret());

        Ok(Self {
            config,
            sessions: ScanSessions::default(),
            fetcher,
            ticketing,
            parcel_key,
        })
    }
}
