use std::cmp::Ordering;

use super::{active_filter, paginate, Page, SortOrder, PAGE_SIZE};
use crate::models::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionSort {
    #[default]
    Date,
    Amount,
}

/// Filters for the transactions table. Defaults to newest first.
#[derive(Debug, Clone)]
pub struct TransactionQuery {
    /// `credit` or `debit`
    pub kind: Option<String>,
    pub status: Option<String>,
    pub sort: TransactionSort,
    pub order: SortOrder,
    pub page: usize,
}

impl Default for TransactionQuery {
    fn default() -> Self {
        Self {
            kind: None,
            status: None,
            sort: TransactionSort::Date,
            order: SortOrder::Desc,
            page: 1,
        }
    }
}

impl TransactionQuery {
    fn matches(&self, tx: &Transaction) -> bool {
        active_filter(self.kind.as_deref()).map_or(true, |k| tx.kind.eq_ignore_ascii_case(k))
            && active_filter(self.status.as_deref())
                .map_or(true, |s| tx.status.eq_ignore_ascii_case(s))
    }

    pub fn apply(&self, transactions: &[Transaction]) -> Page<Transaction> {
        let mut rows: Vec<Transaction> = transactions
            .iter()
            .filter(|t| self.matches(t))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            let ordering = match self.sort {
                TransactionSort::Date => a.created_at.cmp(&b.created_at),
                TransactionSort::Amount => a.amount.partial_cmp(&b.amount).unwrap_or(Ordering::Equal),
            };
            self.order.apply(ordering)
        });
        paginate(rows, self.page.max(1), PAGE_SIZE)
    }
}
