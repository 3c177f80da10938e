//! User-facing notices produced from action outcomes.

use std::fmt;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Success => "OK",
            Level::Info => "--",
            Level::Error => "!!",
        }
    }
}

/// A short message for the user, like a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }

    pub fn welcome(name: &str) -> Self {
        Self::success(format!("Welcome back, {}!", name))
    }

    pub fn logged_out() -> Self {
        Self::success("You have been logged out successfully")
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level.as_str(), self.message)
    }
}

impl From<&Error> for Notice {
    fn from(err: &Error) -> Self {
        match err {
            Error::MissingCredentials(field) => Notice::error(format!("Please enter your {}", field)),
            Error::AuthenticationFailure { message, .. } => Notice::error(message.clone()),
            Error::Forbidden(_) => Notice::error("You do not have access to this page"),
            other => Notice::error(other.to_string()),
        }
    }
}
