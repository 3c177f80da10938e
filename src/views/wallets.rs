use super::{active_filter, contains_ci, paginate, Page, PAGE_SIZE};
use crate::models::Wallet;

/// Filters for the wallets table
#[derive(Debug, Clone, Default)]
pub struct WalletQuery {
    /// Case-insensitive match on the owner's name or email
    pub search: Option<String>,
    /// Owner role, e.g. `USER` or `AGENT`
    pub role: Option<String>,
    /// `ACTIVE` or `BLOCKED`
    pub status: Option<String>,
    pub min_balance: Option<f64>,
    pub max_balance: Option<f64>,
    pub page: usize,
}

#[derive(Debug, Clone)]
pub struct WalletView {
    pub page: Page<Wallet>,
    /// Sum of balances over every filtered wallet, not just this page
    pub total_balance: f64,
}

impl WalletQuery {
    fn matches(&self, wallet: &Wallet) -> bool {
        let owner = wallet.user.as_ref();
        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        if let Some(needle) = search {
            let hit = owner.is_some_and(|o| {
                contains_ci(&o.name, &needle) || contains_ci(&o.email, &needle)
            });
            if !hit {
                return false;
            }
        }
        if let Some(role) = active_filter(self.role.as_deref()) {
            if !owner.is_some_and(|o| o.role.eq_ignore_ascii_case(role)) {
                return false;
            }
        }
        if let Some(status) = active_filter(self.status.as_deref()) {
            if !wallet.status().eq_ignore_ascii_case(status) {
                return false;
            }
        }
        if self.min_balance.is_some_and(|min| wallet.balance < min) {
            return false;
        }
        if self.max_balance.is_some_and(|max| wallet.balance > max) {
            return false;
        }
        true
    }

    pub fn apply(&self, wallets: &[Wallet]) -> WalletView {
        let rows: Vec<Wallet> = wallets.iter().filter(|w| self.matches(w)).cloned().collect();
        let total_balance = rows.iter().map(|w| w.balance).sum();
        WalletView {
            page: paginate(rows, self.page.max(1), PAGE_SIZE),
            total_balance,
        }
    }
}
