use serde::{Deserialize, Serialize};

/// Owner summary embedded in a wallet listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletOwner {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<WalletOwner>,
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub is_blocked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Wallet {
    /// Explicit status if the backend sent one, otherwise derived from `isBlocked`.
    pub fn status(&self) -> &str {
        match self.status.as_deref() {
            Some(status) if !status.is_empty() => status,
            _ if self.is_blocked => "BLOCKED",
            _ => "ACTIVE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_derived_from_flag() {
        let wallet: Wallet =
            serde_json::from_str(r#"{"_id":"w1","userId":"u1","balance":50,"isBlocked":true}"#)
                .unwrap();
        assert_eq!(wallet.status(), "BLOCKED");
        assert_eq!(wallet.balance, 50.0);

        let wallet: Wallet =
            serde_json::from_str(r#"{"_id":"w2","balance":5,"status":"ACTIVE"}"#).unwrap();
        assert_eq!(wallet.status(), "ACTIVE");
        assert!(!wallet.is_blocked);
    }
}
