//! Typed admin endpoints backed by the query cache.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cache::{Endpoint, QueryCache};
use crate::error::{Error, Result, TransportError};
use crate::models::{Envelope, Transaction, User, Wallet};

/// Decode a response that is either `{ data: T }` or a bare `T`.
pub(crate) fn decode<T: DeserializeOwned>(endpoint: Endpoint, value: Value) -> Result<T> {
    let enveloped = value
        .get("data")
        .is_some()
        .then(|| serde_json::from_value::<Envelope<T>>(value.clone()));
    let decoded = match enveloped {
        Some(Ok(envelope)) => Ok(envelope.data),
        _ => serde_json::from_value::<T>(value),
    };
    decoded.map_err(|e| {
        Error::Transport(TransportError::Decode {
            path: endpoint.path(Some(":id")).unwrap_or_default(),
            message: e.to_string(),
        })
    })
}

/// Admin dashboard reads and writes.
///
/// Reads are cached per endpoint. Writes invalidate the tags declared for
/// their endpoint, so the next read of an affected list goes to the network.
#[derive(Clone)]
pub struct AdminApi {
    cache: QueryCache,
}

impl AdminApi {
    pub fn new(cache: QueryCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    async fn read<T: DeserializeOwned>(&self, endpoint: Endpoint) -> Result<T> {
        let value = self.cache.query(endpoint, None).await?;
        decode(endpoint, value)
    }

    async fn write(&self, endpoint: Endpoint, id: &str) -> Result<Value> {
        let value = self.cache.mutate(endpoint, Some(id)).await?;
        Ok(value.get("data").cloned().unwrap_or(value))
    }

    pub async fn get_profile(&self) -> Result<User> {
        self.read(Endpoint::GetProfile).await
    }

    pub async fn get_users(&self) -> Result<Vec<User>> {
        self.read(Endpoint::GetUsers).await
    }

    pub async fn get_agents(&self) -> Result<Vec<User>> {
        self.read(Endpoint::GetAgents).await
    }

    pub async fn get_wallets(&self) -> Result<Vec<Wallet>> {
        self.read(Endpoint::GetWallets).await
    }

    pub async fn get_transactions(&self) -> Result<Vec<Transaction>> {
        self.read(Endpoint::GetTransactions).await
    }

    /// Reactivate an agent.
    pub async fn approve_user(&self, id: &str) -> Result<Value> {
        self.write(Endpoint::ApproveUser, id).await
    }

    /// Suspend an agent.
    pub async fn suspend_user(&self, id: &str) -> Result<Value> {
        self.write(Endpoint::SuspendUser, id).await
    }

    pub async fn block_wallet(&self, id: &str) -> Result<Value> {
        self.write(Endpoint::BlockWallet, id).await
    }

    pub async fn unblock_wallet(&self, id: &str) -> Result<Value> {
        self.write(Endpoint::UnblockWallet, id).await
    }
}
