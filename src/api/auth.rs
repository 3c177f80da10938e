//! Credential login against `POST /auth/login`.

use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::models::{Envelope, LoginData, LoginRequest, User};
use crate::session::SessionState;
use crate::transport::{ApiRequest, Method, Transport};

const LOGIN_PATH: &str = "/auth/login";

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    /// Dashboard the user should land on.
    pub redirect: &'static str,
}

pub struct AuthClient {
    transport: Arc<dyn Transport>,
    session: Arc<SessionState>,
}

impl AuthClient {
    pub fn new(transport: Arc<dyn Transport>, session: Arc<SessionState>) -> Self {
        Self { transport, session }
    }

    /// Exchange credentials for a session.
    ///
    /// Empty fields are rejected before any request is made. A rejected or
    /// undecodable response leaves the credential store untouched.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let email = email.trim();
        if email.is_empty() {
            return Err(Error::MissingCredentials("email"));
        }
        if password.is_empty() {
            return Err(Error::MissingCredentials("password"));
        }

        let body = serde_json::to_value(LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })?;
        let request = ApiRequest::new(Method::Post, LOGIN_PATH).with_body(body);

        let response = self.transport.send(request).await.map_err(|e| {
            warn!(email, status = ?e.status(), "Login rejected");
            Error::AuthenticationFailure {
                status: e.status(),
                message: e.message().to_string(),
            }
        })?;

        let data = serde_json::from_value::<Envelope<LoginData>>(response)
            .map(|envelope| envelope.data)
            .map_err(|e| Error::AuthenticationFailure {
                status: None,
                message: format!("unexpected login response: {}", e),
            })?;

        let user = data.user.clone();
        let redirect = self
            .session
            .login(data.user, data.access_token, data.refresh_token)?;
        info!(user_id = %user.id, role = %user.role, "Login succeeded");
        Ok(LoginOutcome { user, redirect })
    }
}
