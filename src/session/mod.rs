//! Process-wide session state.
//!
//! The in-memory session is an [`ArcSwapOption`]: login swaps in a complete
//! new [`Session`], logout swaps in `None`. Authentication itself is always
//! answered from the credential store so a fresh process (empty memory)
//! still recognizes a persisted login.

use arc_swap::ArcSwapOption;
use std::sync::Arc;
use tracing::{debug, info};

use crate::authz::{self, Role};
use crate::error::{Error, Result};
use crate::models::User;
use crate::store::SessionStore;

/// Authenticated identity and tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

/// Anything able to supply the bearer token for outgoing requests.
pub trait TokenSource: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

pub struct SessionState {
    store: Arc<SessionStore>,
    current: ArcSwapOption<Session>,
}

impl SessionState {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self {
            store,
            current: ArcSwapOption::empty(),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Persist a new session, make it current, and return the dashboard
    /// route the user should land on.
    pub fn login(
        &self,
        user: User,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Result<&'static str> {
        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(Error::AuthenticationFailure {
                status: None,
                message: "login response carried no access token".to_string(),
            });
        }

        let session = Session {
            user,
            access_token,
            refresh_token: refresh_token.into(),
        };
        self.store.persist(&session)?;

        let redirect = authz::dashboard_path(session.user.role());
        info!(user_id = %session.user.id, redirect, "Logged in");
        self.current.store(Some(Arc::new(session)));
        Ok(redirect)
    }

    /// Clear both backings and the in-memory session. Safe to call when
    /// already logged out.
    pub fn logout(&self) -> Result<()> {
        let cleared = self.store.clear();
        if self.current.swap(None).is_some() {
            info!("Logged out");
        } else {
            debug!("Logout with no in-memory session");
        }
        cleared
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.read().is_some_and(|s| s.is_authenticated())
    }

    /// In-memory session, if this process logged in.
    pub fn session(&self) -> Option<Arc<Session>> {
        self.current.load_full()
    }

    pub fn current_role(&self) -> Option<Role> {
        if let Some(session) = &*self.current.load() {
            return session.user.role();
        }
        self.store
            .read_local()
            .and_then(|s| s.role)
            .and_then(|raw| Role::parse(&raw))
    }

    pub fn current_user(&self) -> Option<User> {
        if let Some(session) = &*self.current.load() {
            return Some(session.user.clone());
        }
        self.store
            .read_local()
            .and_then(|s| s.user)
            .map(|snapshot| snapshot.into_user())
    }

    /// Access token from memory, falling back to the credential store.
    pub fn token(&self) -> Option<String> {
        if let Some(session) = &*self.current.load() {
            if !session.access_token.trim().is_empty() {
                return Some(session.access_token.clone());
            }
        }
        self.store
            .read()
            .and_then(|s| s.usable_token().map(str::to_string))
    }

    pub fn dashboard_path(&self) -> &'static str {
        authz::dashboard_path(self.current_role())
    }

    pub fn profile_path(&self) -> &'static str {
        authz::profile_path(self.current_role())
    }

    /// Mount-time guard: where an already-authenticated visitor of
    /// `current_path` should be sent, if anywhere.
    pub fn redirect_target(&self, current_path: &str) -> Option<&'static str> {
        authz::redirect_target(self.is_authenticated(), self.current_role(), current_path)
    }
}

impl TokenSource for SessionState {
    fn bearer_token(&self) -> Option<String> {
        self.token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Backing, CookieJar, LocalStore, Source, TOKEN};
    use chrono::Duration;

    fn state() -> SessionState {
        SessionState::new(Arc::new(SessionStore::in_memory()))
    }

    fn agent() -> User {
        User::new("a1", "Ama", "ama@agent.com", "AGENT")
    }

    #[test]
    fn test_login_authenticates_and_persists_both_backings() {
        let state = state();
        state.login(agent(), "acc-1", "ref-1").unwrap();

        assert!(state.is_authenticated());
        let cookie = state.store().read().unwrap();
        assert_eq!(cookie.source, Source::Cookie);
        assert_eq!(cookie.token.as_deref(), Some("acc-1"));
        let local = state.store().read_local().unwrap();
        assert_eq!(local.token.as_deref(), Some("acc-1"));
    }

    #[test]
    fn test_agent_login_scenario() {
        let state = state();
        let redirect = state.login(agent(), "acc-1", "ref-1").unwrap();

        assert_eq!(redirect, "/dashboard/agent");
        assert_eq!(state.store().read().unwrap().role.as_deref(), Some("AGENT"));
        assert_eq!(state.store().read_local().unwrap().role.as_deref(), Some("AGENT"));
        assert_eq!(state.current_role(), Some(Role::Agent));
    }

    #[test]
    fn test_logout_clears_everything_and_is_idempotent() {
        let state = state();
        state.login(agent(), "acc-1", "ref-1").unwrap();

        state.logout().unwrap();
        assert!(state.store().read().is_none());
        assert!(state.session().is_none());
        assert!(!state.is_authenticated());

        state.logout().unwrap();
        assert!(state.store().read().is_none());
        assert!(state.session().is_none());
        assert_eq!(state.token(), None);
    }

    #[test]
    fn test_fresh_process_recognizes_persisted_session() {
        let store = Arc::new(SessionStore::in_memory());
        SessionState::new(store.clone())
            .login(User::new("u1", "Kofi", "k@x.com", "USER"), "acc", "ref")
            .unwrap();

        let reloaded = SessionState::new(store);
        assert!(reloaded.session().is_none());
        assert!(reloaded.is_authenticated());
        assert_eq!(reloaded.current_role(), Some(Role::User));
        assert_eq!(reloaded.current_user().unwrap().email, "k@x.com");
        assert_eq!(reloaded.token().as_deref(), Some("acc"));
        assert_eq!(reloaded.profile_path(), "/dashboard/user/profile");
    }

    #[test]
    fn test_marker_without_token_is_unauthenticated() {
        let local = LocalStore::in_memory();
        local.set("isAuthenticated", "true").unwrap();
        let store = SessionStore::new(CookieJar::in_memory(Duration::days(7)), local);
        let state = SessionState::new(Arc::new(store));

        assert!(!state.is_authenticated());
        assert_eq!(state.token(), None);
        assert_eq!(state.redirect_target("/auth/login"), None);
    }

    #[test]
    fn test_empty_access_token_is_rejected_without_persisting() {
        let state = state();
        let err = state.login(agent(), "", "ref").unwrap_err();
        assert!(matches!(err, Error::AuthenticationFailure { .. }));
        assert!(state.store().read().is_none());
        assert!(state.session().is_none());
    }

    #[test]
    fn test_unrecognized_role_routes_to_admin_dashboard() {
        let state = state();
        let redirect = state
            .login(User::new("x1", "X", "x@y.z", "AUDITOR"), "acc", "ref")
            .unwrap();
        assert_eq!(redirect, "/dashboard/admin");
        assert_eq!(state.current_role(), None);
        assert!(authz::authorize(state.current_role(), authz::Scope::Admin).is_err());
    }

    #[test]
    fn test_token_falls_back_to_local_token() {
        let local = LocalStore::in_memory();
        local.set(TOKEN, "local-only").unwrap();
        local.set("isAuthenticated", "true").unwrap();
        let store = SessionStore::new(CookieJar::in_memory(Duration::days(7)), local);
        let state = SessionState::new(Arc::new(store));
        assert_eq!(state.bearer_token().as_deref(), Some("local-only"));
    }

    #[test]
    fn test_redirect_guard_uses_session() {
        let state = state();
        assert_eq!(state.redirect_target("/auth/login"), None);
        state.login(agent(), "acc", "ref").unwrap();
        assert_eq!(state.redirect_target("/auth/login"), Some("/dashboard/agent"));
        assert_eq!(state.redirect_target("/dashboard/agent"), None);
        assert_eq!(state.redirect_target(state.profile_path()), None);
    }
}
