use crate::audit::AuditLog;
use crate::config::PortalConfig;
use crate::contact::ContactService;
use crate::dashboard::DashboardService;
use crate::donations::DonationService;
use crate::forum::ForumService;
use crate::session::SessionService;
use crate::store::{SharedStore, SqliteStore};
use anyhow::Result;
use std::sync::Arc;

/// Bundles the backing store and every service around it. Pages in the
/// original site each re-wired this by hand; here it is assembled once.
pub struct Portal {
    config: PortalConfig,
    store: SharedStore,
    sessions: SessionService,
    forum: ForumService,
    dashboard: DashboardService,
    donations: DonationService,
    contact: ContactService,
    audit: AuditLog,
}

impl Portal {
    /// Opens the SQLite-backed store at the configured path.
    pub fn open(config: PortalConfig) -> Result<Self> {
        let store: SharedStore = Arc::new(SqliteStore::connect(&config.paths)?);
        Ok(Self::with_store(config, store))
    }

    /// Assembles the portal over any backing store; tests use the in-memory
    /// one.
    pub fn with_store(config: PortalConfig, store: SharedStore) -> Self {
        let sessions = SessionService::new(store.clone());
        let forum = ForumService::new(store.clone());
        let dashboard = DashboardService::new(store.clone(), sessions.clone());
        let donations = DonationService::new(store.clone());
        let contact = ContactService::new(store.clone());
        let audit = AuditLog::new(store.clone());
        Self {
            config,
            store,
            sessions,
            forum,
            dashboard,
            donations,
            contact,
            audit,
        }
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn sessions(&self) -> &SessionService {
        &self.sessions
    }

    pub fn forum(&self) -> &ForumService {
        &self.forum
    }

    pub fn dashboard(&self) -> &DashboardService {
        &self.dashboard
    }

    pub fn donations(&self) -> &DonationService {
        &self.donations
    }

    pub fn contact(&self) -> &ContactService {
        &self.contact
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }
}
