pub mod api;
pub mod authz;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod notify;
pub mod session;
pub mod store;
pub mod transport;
pub mod views;

pub use error::{Error, Result};

use config::Config;
use std::sync::Arc;

use crate::api::{AdminApi, AuthClient, LoginOutcome};
use crate::authz::Scope;
use crate::cache::QueryCache;
use crate::notify::Notice;
use crate::session::SessionState;
use crate::store::SessionStore;
use crate::transport::{HttpTransport, Transport};

/// Everything a command needs: config, session, cache and typed API.
pub struct ClientState {
    pub config: Config,
    pub session: Arc<SessionState>,
    pub cache: QueryCache,
    pub admin: AdminApi,
    pub auth: AuthClient,
}

impl ClientState {
    pub fn new(config: Config, store: SessionStore, transport: Arc<dyn Transport>) -> Self {
        let session = Arc::new(SessionState::new(Arc::new(store)));
        let cache = QueryCache::new(
            transport.clone(),
            session.clone(),
            config.cache.idle_window(),
        );
        let admin = AdminApi::new(cache.clone());
        let auth = AuthClient::new(transport, session.clone());
        Self {
            config,
            session,
            cache,
            admin,
            auth,
        }
    }

    /// Open the file-backed credential store and an HTTP transport.
    pub fn open(config: Config) -> Result<Self> {
        let store = SessionStore::open(&config.storage)?;
        let transport = Arc::new(HttpTransport::new(&config.api)?);
        Ok(Self::new(config, store, transport))
    }

    /// Log in and drop anything cached under the previous identity.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let outcome = self.auth.login(email, password).await?;
        self.cache.reset();
        Ok(outcome)
    }

    pub fn logout(&self) -> Notice {
        self.cache.reset();
        match self.session.logout() {
            Ok(()) => Notice::logged_out(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to clear stored credentials");
                Notice::from(&e)
            }
        }
    }

    /// Gate for dashboard commands: an authenticated session whose role may
    /// use `scope`.
    pub fn require(&self, scope: Scope) -> Result<()> {
        if !self.session.is_authenticated() {
            return Err(Error::Forbidden("not logged in".to_string()));
        }
        authz::authorize(self.session.current_role(), scope)
    }
}
