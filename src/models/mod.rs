//! Records exchanged with the wallet backend.

mod transaction;
mod user;
mod wallet;

pub use transaction::Transaction;
pub use user::{LoginData, LoginRequest, User, UserSnapshot};
pub use wallet::{Wallet, WalletOwner};

use serde::{Deserialize, Serialize};

/// Response envelope used by every backend endpoint: `{ success, message, data }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    pub data: T,
}
