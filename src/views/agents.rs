use std::cmp::Ordering;

use super::{active_filter, contains_ci, paginate, Page, SortOrder, PAGE_SIZE};
use crate::models::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgentSort {
    /// Keep backend order
    #[default]
    None,
    Name,
    Email,
    Created,
}

/// Filters for the agents table
#[derive(Debug, Clone, Default)]
pub struct AgentQuery {
    /// Case-insensitive match on name, email or id
    pub search: Option<String>,
    pub status: Option<String>,
    /// `ACTIVE` or `SUSPENDED`
    pub is_active: Option<String>,
    pub sort: AgentSort,
    pub order: SortOrder,
    /// 1-indexed; 0 is treated as 1
    pub page: usize,
}

impl AgentQuery {
    fn matches(&self, agent: &User) -> bool {
        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        if let Some(needle) = search {
            if !(contains_ci(&agent.name, &needle)
                || contains_ci(&agent.email, &needle)
                || contains_ci(&agent.id, &needle))
            {
                return false;
            }
        }
        let same = |value: Option<&str>, wanted: &str| {
            value.is_some_and(|v| v.eq_ignore_ascii_case(wanted))
        };
        active_filter(self.status.as_deref()).map_or(true, |s| same(agent.status.as_deref(), s))
            && active_filter(self.is_active.as_deref())
                .map_or(true, |f| same(agent.is_active.as_deref(), f))
    }

    fn compare(&self, a: &User, b: &User) -> Ordering {
        let ordering = match self.sort {
            AgentSort::None => Ordering::Equal,
            AgentSort::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            AgentSort::Email => a.email.to_lowercase().cmp(&b.email.to_lowercase()),
            AgentSort::Created => a.created_at.cmp(&b.created_at),
        };
        self.order.apply(ordering)
    }

    pub fn apply(&self, agents: &[User]) -> Page<User> {
        let mut rows: Vec<User> = agents.iter().filter(|a| self.matches(a)).cloned().collect();
        if self.sort != AgentSort::None {
            rows.sort_by(|a, b| self.compare(a, b));
        }
        paginate(rows, self.page.max(1), PAGE_SIZE)
    }
}

/// Header counters of the agents page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AgentSummary {
    pub total: usize,
    pub active: usize,
    pub suspended: usize,
}

impl AgentSummary {
    pub fn of(agents: &[User]) -> Self {
        let count = |flag: &str| {
            agents
                .iter()
                .filter(|a| a.is_active.as_deref().is_some_and(|v| v.eq_ignore_ascii_case(flag)))
                .count()
        };
        Self {
            total: agents.len(),
            active: count("ACTIVE"),
            suspended: count("SUSPENDED"),
        }
    }
}
