//! Role-based routing and access checks.
//!
//! Everything here is pure: no storage, no network. Roles arrive from the
//! backend as strings and are parsed once into [`Role`]; routing works on the
//! closed [`Scope`] set.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Access level of a user as sent by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Agent,
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Agent => "AGENT",
            Role::Admin => "ADMIN",
            Role::SuperAdmin => "SUPER_ADMIN",
        }
    }

    /// Parse a wire role, ignoring case. Unknown values yield `None`.
    pub fn parse(raw: &str) -> Option<Role> {
        raw.parse().ok()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USER" => Ok(Role::User),
            "AGENT" => Ok(Role::Agent),
            "ADMIN" => Ok(Role::Admin),
            "SUPER_ADMIN" => Ok(Role::SuperAdmin),
            other => Err(format!("unrecognized role: {}", other)),
        }
    }
}

/// Dashboard area a role is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    User,
    Agent,
    Admin,
}

impl Scope {
    /// Routing scope for a role. Absent roles route to the admin area;
    /// whether they may *use* it is decided by [`authorize`].
    pub fn for_role(role: Option<Role>) -> Scope {
        match role {
            Some(Role::User) => Scope::User,
            Some(Role::Agent) => Scope::Agent,
            Some(Role::Admin) | Some(Role::SuperAdmin) | None => Scope::Admin,
        }
    }

    pub fn dashboard_path(&self) -> &'static str {
        ROUTES[self.index()].dashboard
    }

    pub fn profile_path(&self) -> &'static str {
        ROUTES[self.index()].profile
    }

    fn index(&self) -> usize {
        match self {
            Scope::User => 0,
            Scope::Agent => 1,
            Scope::Admin => 2,
        }
    }
}

struct ScopeRoutes {
    dashboard: &'static str,
    profile: &'static str,
}

const ROUTES: [ScopeRoutes; 3] = [
    ScopeRoutes {
        dashboard: "/dashboard/user",
        profile: "/dashboard/user/profile",
    },
    ScopeRoutes {
        dashboard: "/dashboard/agent",
        profile: "/dashboard/agent/profile",
    },
    ScopeRoutes {
        dashboard: "/dashboard/admin",
        profile: "/dashboard/admin/transactions",
    },
];

/// Dashboard route for a role.
pub fn dashboard_path(role: Option<Role>) -> &'static str {
    Scope::for_role(role).dashboard_path()
}

/// Profile (or, for administrators, transactions) route for a role.
pub fn profile_path(role: Option<Role>) -> &'static str {
    Scope::for_role(role).profile_path()
}

/// Dashboard route for a raw wire role string.
pub fn dashboard_path_for(raw_role: &str) -> &'static str {
    dashboard_path(Role::parse(raw_role))
}

/// Profile route for a raw wire role string.
pub fn profile_path_for(raw_role: &str) -> &'static str {
    profile_path(Role::parse(raw_role))
}

/// Mount-time redirect guard.
///
/// Returns the route to move to when an authenticated session is detected,
/// or `None` when no redirect should happen. A path at or below the target
/// (on a segment boundary) never redirects, so the guard cannot loop and
/// pages inside the role's dashboard stay put.
pub fn redirect_target(
    authenticated: bool,
    role: Option<Role>,
    current_path: &str,
) -> Option<&'static str> {
    if !authenticated {
        return None;
    }
    let target = dashboard_path(role);
    let within = current_path
        .strip_prefix(target)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'));
    if within {
        None
    } else {
        Some(target)
    }
}

/// Check that `role` may act within `required`. Fails closed: an absent or
/// unrecognized role is never granted access, even though it is routed to
/// the admin dashboard.
pub fn authorize(role: Option<Role>, required: Scope) -> Result<(), Error> {
    let Some(role) = role else {
        return Err(Error::Forbidden(
            "no recognized role in the current session".to_string(),
        ));
    };
    let granted = match required {
        Scope::Admin => matches!(role, Role::Admin | Role::SuperAdmin),
        Scope::Agent => matches!(role, Role::Agent),
        Scope::User => matches!(role, Role::User),
    };
    if granted {
        Ok(())
    } else {
        Err(Error::Forbidden(format!(
            "role {} cannot access {}",
            role,
            required.dashboard_path()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_paths() {
        assert_eq!(dashboard_path_for("USER"), "/dashboard/user");
        assert_eq!(dashboard_path_for("AGENT"), "/dashboard/agent");
        assert_eq!(dashboard_path_for("ADMIN"), "/dashboard/admin");
        assert_eq!(dashboard_path_for("SUPER_ADMIN"), "/dashboard/admin");
        assert_eq!(dashboard_path_for("unknown-role"), "/dashboard/admin");
        assert_eq!(dashboard_path(None), "/dashboard/admin");
    }

    #[test]
    fn test_profile_paths() {
        assert_eq!(profile_path_for("USER"), "/dashboard/user/profile");
        assert_eq!(profile_path_for("AGENT"), "/dashboard/agent/profile");
        assert_eq!(profile_path_for("ADMIN"), "/dashboard/admin/transactions");
        assert_eq!(profile_path_for(""), "/dashboard/admin/transactions");
    }

    #[test]
    fn test_role_parse_is_case_insensitive() {
        assert_eq!(Role::parse("agent"), Some(Role::Agent));
        assert_eq!(Role::parse(" Super_Admin "), Some(Role::SuperAdmin));
        assert_eq!(Role::parse("merchant"), None);
    }

    #[test]
    fn test_role_serde_uses_wire_names() {
        let json = serde_json::to_string(&Role::SuperAdmin).unwrap();
        assert_eq!(json, "\"SUPER_ADMIN\"");
        let role: Role = serde_json::from_str("\"AGENT\"").unwrap();
        assert_eq!(role, Role::Agent);
    }

    #[test]
    fn test_redirect_guard_does_not_loop() {
        assert_eq!(
            redirect_target(true, Some(Role::Agent), "/auth/login"),
            Some("/dashboard/agent")
        );
        assert_eq!(redirect_target(true, Some(Role::Agent), "/dashboard/agent"), None);
        assert_eq!(redirect_target(true, Some(Role::Agent), "/dashboard/agent/"), None);
        assert_eq!(redirect_target(false, Some(Role::Agent), "/auth/login"), None);
    }

    #[test]
    fn test_redirect_guard_keeps_pages_inside_the_dashboard() {
        let agent = Some(Role::Agent);
        assert_eq!(redirect_target(true, agent, profile_path(agent)), None);
        assert_eq!(redirect_target(true, agent, "/dashboard/agent/profile/"), None);
        assert_eq!(
            redirect_target(true, Some(Role::Admin), "/dashboard/admin/transactions"),
            None
        );
        assert_eq!(
            redirect_target(true, agent, "/dashboard/agents"),
            Some("/dashboard/agent")
        );
        assert_eq!(
            redirect_target(true, agent, "/dashboard/admin/agents"),
            Some("/dashboard/agent")
        );
    }

    #[test]
    fn test_authorize_fails_closed() {
        assert!(authorize(Some(Role::Admin), Scope::Admin).is_ok());
        assert!(authorize(Some(Role::SuperAdmin), Scope::Admin).is_ok());
        assert!(authorize(Some(Role::Agent), Scope::Admin).is_err());
        assert!(authorize(None, Scope::Admin).is_err());
        assert!(authorize(Some(Role::User), Scope::User).is_ok());
    }
}
