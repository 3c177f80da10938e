//! Declared backend endpoints and the tags they provide or invalidate.

use std::fmt;

use crate::transport::Method;

/// Label grouping cached reads for bulk invalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tag {
    User,
    Agent,
    Wallet,
    Transaction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    /// Read; the result is cached and tagged.
    Query,
    /// Write; success invalidates the declared tags.
    Mutation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    GetProfile,
    GetUsers,
    GetAgents,
    ApproveUser,
    SuspendUser,
    GetWallets,
    BlockWallet,
    UnblockWallet,
    GetTransactions,
}

struct EndpointDef {
    name: &'static str,
    kind: EndpointKind,
    method: Method,
    /// Path template; `:id` is replaced by the argument.
    path: &'static str,
    tags: &'static [Tag],
}

const fn query(name: &'static str, path: &'static str, tags: &'static [Tag]) -> EndpointDef {
    EndpointDef {
        name,
        kind: EndpointKind::Query,
        method: Method::Get,
        path,
        tags,
    }
}

const fn mutation(name: &'static str, path: &'static str, tags: &'static [Tag]) -> EndpointDef {
    EndpointDef {
        name,
        kind: EndpointKind::Mutation,
        method: Method::Patch,
        path,
        tags,
    }
}

// Indexed by `Endpoint as usize`; keep in declaration order.
static TABLE: [EndpointDef; 9] = [
    query("getProfile", "/admin/profile", &[Tag::User]),
    query("getUsers", "/admin/users", &[Tag::User]),
    query("getAgents", "/admin/agents", &[Tag::Agent]),
    mutation("approveUser", "/admin/approve-agent/:id", &[Tag::User, Tag::Agent]),
    mutation("suspendUser", "/admin/suspend-agent/:id", &[Tag::User, Tag::Agent]),
    query("getWallets", "/admin/wallets", &[Tag::Wallet]),
    mutation("blockWallet", "/admin/block-wallet/:id", &[Tag::Wallet]),
    mutation("unblockWallet", "/admin/unblock-wallet/:id", &[Tag::Wallet]),
    query("getTransactions", "/admin/transactions", &[Tag::Transaction]),
];

impl Endpoint {
    pub const ALL: [Endpoint; 9] = [
        Endpoint::GetProfile,
        Endpoint::GetUsers,
        Endpoint::GetAgents,
        Endpoint::ApproveUser,
        Endpoint::SuspendUser,
        Endpoint::GetWallets,
        Endpoint::BlockWallet,
        Endpoint::UnblockWallet,
        Endpoint::GetTransactions,
    ];

    fn def(&self) -> &'static EndpointDef {
        &TABLE[*self as usize]
    }

    pub fn name(&self) -> &'static str {
        self.def().name
    }

    pub fn kind(&self) -> EndpointKind {
        self.def().kind
    }

    pub fn method(&self) -> Method {
        self.def().method
    }

    /// Tags a query provides, or a mutation invalidates.
    pub fn tags(&self) -> &'static [Tag] {
        self.def().tags
    }

    pub fn takes_id(&self) -> bool {
        self.def().path.contains(":id")
    }

    /// Concrete request path. `None` when an id is required but missing, or
    /// is not a single plain path segment.
    pub fn path(&self, arg: Option<&str>) -> Option<String> {
        let template = self.def().path;
        if !self.takes_id() {
            return Some(template.to_string());
        }
        let id = arg.map(str::trim).filter(|id| is_plain_id(id))?;
        Some(template.replace(":id", id))
    }
}

fn is_plain_id(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && !id.contains("..")
        && !id
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '?' | '#' | '%') || c.is_whitespace() || c.is_control())
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
