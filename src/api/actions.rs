//! Admin actions on agents and wallets.
//!
//! Each action performs one write and reports the outcome as a [`Notice`].
//! Failures are logged and turned into an error notice; they never
//! propagate.

use tracing::warn;

use super::AdminApi;
use crate::notify::Notice;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentAction {
    /// Suspend the agent.
    Block,
    /// Reactivate a suspended agent.
    Unblock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletAction {
    Block,
    Unblock,
}

fn verb(block: bool) -> &'static str {
    if block {
        "block"
    } else {
        "unblock"
    }
}

pub async fn agent_action(api: &AdminApi, id: &str, action: AgentAction) -> Notice {
    let block = action == AgentAction::Block;
    let result = match action {
        AgentAction::Block => api.suspend_user(id).await,
        AgentAction::Unblock => api.approve_user(id).await,
    };
    match result {
        Ok(_) => Notice::success(format!("Agent {}ed successfully", verb(block))),
        Err(e) => {
            warn!(agent_id = id, ?action, error = %e, "Agent action failed");
            Notice::error(format!("Failed to {} agent", verb(block)))
        }
    }
}

pub async fn wallet_action(api: &AdminApi, id: &str, action: WalletAction) -> Notice {
    let block = action == WalletAction::Block;
    let result = match action {
        WalletAction::Block => api.block_wallet(id).await,
        WalletAction::Unblock => api.unblock_wallet(id).await,
    };
    match result {
        Ok(_) => Notice::success(format!("Wallet {}ed successfully", verb(block))),
        Err(e) => {
            warn!(wallet_id = id, ?action, error = %e, "Wallet action failed");
            Notice::error(format!("Failed to {} wallet", verb(block)))
        }
    }
}
