//! Credential store: one logical session record over two physical backings.
//!
//! Callers never touch the backings directly. The record is only ever fully
//! written ([`SessionStore::persist`]) or fully removed ([`SessionStore::clear`]);
//! there is no field-level update.

mod backing;

pub use backing::{Backing, CookieJar, LocalStore};

use chrono::Duration;
use tracing::{debug, info, warn};

use crate::config::StorageConfig;
use crate::error::Result;
use crate::models::UserSnapshot;
use crate::session::Session;

pub const TOKEN: &str = "token";
pub const REFRESH_TOKEN: &str = "refreshToken";
pub const IS_AUTHENTICATED: &str = "isAuthenticated";
pub const USER_ROLE: &str = "userRole";
pub const USER_DATA: &str = "userData";

/// Keys written to the cookie backing.
const COOKIE_KEYS: [&str; 4] = [TOKEN, REFRESH_TOKEN, IS_AUTHENTICATED, USER_ROLE];
/// Every key either backing may hold; `clear` removes all of them from both.
const ALL_KEYS: [&str; 5] = [TOKEN, REFRESH_TOKEN, IS_AUTHENTICATED, USER_ROLE, USER_DATA];

const MARKER: &str = "true";

/// Which backing a [`PartialSession`] was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cookie,
    Local,
}

/// Session fields as read back from exactly one backing.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialSession {
    pub source: Source,
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    pub marker: Option<String>,
    pub role: Option<String>,
    pub user: Option<UserSnapshot>,
}

impl PartialSession {
    /// A marker alone is not a session: a usable token must sit next to it.
    pub fn is_authenticated(&self) -> bool {
        let marked = self.marker.as_deref().is_some_and(|m| !m.trim().is_empty());
        marked && self.usable_token().is_some()
    }

    pub fn usable_token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.trim().is_empty())
    }
}

pub struct SessionStore {
    cookies: Box<dyn Backing>,
    local: Box<dyn Backing>,
}

impl SessionStore {
    pub fn new(cookies: impl Backing + 'static, local: impl Backing + 'static) -> Self {
        Self {
            cookies: Box::new(cookies),
            local: Box::new(local),
        }
    }

    /// Both backings in memory, with the default 7-day cookie lifetime.
    pub fn in_memory() -> Self {
        Self::new(CookieJar::in_memory(Duration::days(7)), LocalStore::in_memory())
    }

    /// File-backed store under `config.data_dir`.
    pub fn open(config: &StorageConfig) -> Result<Self> {
        let cookies = CookieJar::open(
            config.data_dir.join("cookies.json"),
            Duration::days(config.cookie_ttl_days),
        )?;
        let local = LocalStore::open(config.data_dir.join("local_storage.json"))?;
        debug!(dir = %config.data_dir.display(), "Opened credential store");
        Ok(Self::new(cookies, local))
    }

    /// Write the whole record to both backings.
    ///
    /// If any write fails the partially written record is cleared again so a
    /// half-persisted session can never be read back.
    pub fn persist(&self, session: &Session) -> Result<()> {
        if let Err(e) = self.write_all(session) {
            warn!(error = %e, "Failed to persist session, rolling back");
            let _ = self.clear();
            return Err(e);
        }
        info!(user_id = %session.user.id, role = %session.user.role, "Session persisted");
        Ok(())
    }

    fn write_all(&self, session: &Session) -> Result<()> {
        let snapshot = UserSnapshot::from_user(&session.user, &session.access_token);
        let user_data = serde_json::to_string(&snapshot)?;

        self.cookies.set(TOKEN, &session.access_token)?;
        self.cookies.set(REFRESH_TOKEN, &session.refresh_token)?;
        self.cookies.set(IS_AUTHENTICATED, MARKER)?;
        self.cookies.set(USER_ROLE, &session.user.role)?;

        self.local.set(TOKEN, &session.access_token)?;
        self.local.set(REFRESH_TOKEN, &session.refresh_token)?;
        self.local.set(USER_ROLE, &session.user.role)?;
        self.local.set(USER_DATA, &user_data)?;
        self.local.set(IS_AUTHENTICATED, MARKER)?;
        Ok(())
    }

    /// Cookie values if the cookie backing holds any, else local values,
    /// else `None`. Fields are never mixed across backings.
    pub fn read(&self) -> Option<PartialSession> {
        if COOKIE_KEYS.iter().any(|k| self.cookies.get(k).is_some()) {
            return Some(read_backing(self.cookies.as_ref(), Source::Cookie));
        }
        self.read_local()
    }

    /// The local backing on its own. The user snapshot only lives here.
    pub fn read_local(&self) -> Option<PartialSession> {
        if ALL_KEYS.iter().any(|k| self.local.get(k).is_some()) {
            Some(read_backing(self.local.as_ref(), Source::Local))
        } else {
            None
        }
    }

    /// Remove every session key from both backings.
    ///
    /// All removals are attempted even if one fails; the first error is returned.
    pub fn clear(&self) -> Result<()> {
        let mut first_err = None;
        for backing in [self.cookies.as_ref(), self.local.as_ref()] {
            for key in ALL_KEYS {
                if let Err(e) = backing.remove(key) {
                    warn!(backing = backing.name(), key, error = %e, "Failed to remove key");
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => {
                debug!("Credential store cleared");
                Ok(())
            }
        }
    }
}

fn read_backing(backing: &dyn Backing, source: Source) -> PartialSession {
    let user = backing.get(USER_DATA).and_then(|raw| {
        serde_json::from_str::<UserSnapshot>(&raw)
            .map_err(|e| debug!(backing = backing.name(), error = %e, "Ignoring unreadable userData"))
            .ok()
    });
    PartialSession {
        source,
        token: backing.get(TOKEN),
        refresh_token: backing.get(REFRESH_TOKEN),
        marker: backing.get(IS_AUTHENTICATED),
        role: backing.get(USER_ROLE),
        user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use chrono::Utc;

    fn agent_session() -> Session {
        Session {
            user: User::new("a1", "Ama", "ama@agent.com", "AGENT"),
            access_token: "acc-1".to_string(),
            refresh_token: "ref-1".to_string(),
        }
    }

    #[test]
    fn test_persist_writes_both_backings() {
        let cookies = CookieJar::in_memory(Duration::days(7));
        let local = LocalStore::in_memory();
        let store = SessionStore::new(cookies, local);
        store.persist(&agent_session()).unwrap();

        let read = store.read().unwrap();
        assert_eq!(read.source, Source::Cookie);
        assert_eq!(read.token.as_deref(), Some("acc-1"));
        assert!(read.is_authenticated());
        assert_eq!(read.role.as_deref(), Some("AGENT"));
        assert_eq!(read.user, None);

        let local = store.read_local().unwrap();
        assert_eq!(local.token.as_deref(), Some("acc-1"));
        assert_eq!(local.refresh_token.as_deref(), Some("ref-1"));
        assert_eq!(local.role.as_deref(), Some("AGENT"));
        assert_eq!(local.user.unwrap().token, "acc-1");
    }

    #[test]
    fn test_read_falls_back_to_local_when_cookies_gone() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            data_dir: dir.path().to_path_buf(),
            cookie_ttl_days: 7,
        };
        let store = SessionStore::open(&config).unwrap();
        store.persist(&agent_session()).unwrap();
        drop(store);

        // user wiped their cookies
        std::fs::remove_file(dir.path().join("cookies.json")).unwrap();

        let store = SessionStore::open(&config).unwrap();
        let read = store.read().unwrap();
        assert_eq!(read.source, Source::Local);
        assert!(read.is_authenticated());
        assert_eq!(read.role.as_deref(), Some("AGENT"));
    }

    #[test]
    fn test_read_never_merges_backings() {
        let cookies = CookieJar::in_memory(Duration::days(7));
        cookies.set(IS_AUTHENTICATED, "true").unwrap();
        let local = LocalStore::in_memory();
        local.set(TOKEN, "local-token").unwrap();
        local.set(IS_AUTHENTICATED, "true").unwrap();
        let store = SessionStore::new(cookies, local);

        let read = store.read().unwrap();
        assert_eq!(read.source, Source::Cookie);
        assert_eq!(read.token, None);
        assert!(!read.is_authenticated());
    }

    #[test]
    fn test_dangling_marker_is_not_a_session() {
        let local = LocalStore::in_memory();
        local.set(IS_AUTHENTICATED, "true").unwrap();
        local.set(TOKEN, "   ").unwrap();
        let store = SessionStore::new(CookieJar::in_memory(Duration::days(7)), local);
        assert!(!store.read().unwrap().is_authenticated());
    }

    #[test]
    fn test_expired_cookies_fall_back_to_local() {
        let cookies = CookieJar::in_memory(Duration::days(7));
        let past = Utc::now() - Duration::minutes(1);
        for key in COOKIE_KEYS {
            cookies.set_expiring(key, "old", past).unwrap();
        }
        let local = LocalStore::in_memory();
        local.set(TOKEN, "fresh").unwrap();
        local.set(IS_AUTHENTICATED, "true").unwrap();
        let store = SessionStore::new(cookies, local);

        let read = store.read().unwrap();
        assert_eq!(read.source, Source::Local);
        assert_eq!(read.usable_token(), Some("fresh"));
    }

    #[test]
    fn test_clear_removes_everything_from_both() {
        let store = SessionStore::in_memory();
        store.persist(&agent_session()).unwrap();
        store.clear().unwrap();
        assert_eq!(store.read(), None);
        assert_eq!(store.read_local(), None);
    }

    #[test]
    fn test_clear_handles_one_sided_state() {
        let local = LocalStore::in_memory();
        local.set(USER_ROLE, "ADMIN").unwrap();
        let store = SessionStore::new(CookieJar::in_memory(Duration::days(7)), local);
        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.read(), None);
    }
}
