//! CLI module for the PayWallet dashboard client.
//!
//! Each subcommand plays the part of one dashboard page:
//! - `login` / `logout` / `status` - Session management
//! - `profile` - Admin profile
//! - `users list`, `agents list|approve|suspend` - Account management
//! - `wallets list|block|unblock`, `transactions list` - Money views
//! - `config check` - Validate configuration file

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::api::actions::{agent_action, wallet_action, AgentAction, WalletAction};
use crate::authz::Scope;
use crate::config::Config;
use crate::models::User;
use crate::notify::Notice;
use crate::views::{
    AgentQuery, AgentSort, AgentSummary, Page, SortOrder, TransactionQuery, TransactionSort,
    WalletQuery,
};
use crate::ClientState;

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "paywallet")]
#[command(author, version, about = "PayWallet dashboard client", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "paywallet.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// API base URL (overrides api.base_url)
    #[arg(long, env = "PAYWALLET_API_URL")]
    pub api_url: Option<String>,

    /// Directory holding the persisted session (overrides storage.data_dir)
    #[arg(long, env = "PAYWALLET_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(url) = &self.api_url {
            config.api.base_url = url.clone();
        }
        if let Some(dir) = &self.data_dir {
            config.storage.data_dir = dir.clone();
        }
    }
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in with email and password
    Login {
        #[arg(short, long, env = "PAYWALLET_EMAIL")]
        email: String,
        #[arg(short, long, env = "PAYWALLET_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Clear the stored session
    Logout,

    /// Show who is logged in and where they land
    Status {
        /// Page to check the redirect guard against
        #[arg(long, default_value = "/auth/login")]
        from: String,
    },

    /// Show the admin profile
    Profile,

    #[command(subcommand)]
    Users(UsersCommands),

    /// Agent management commands
    #[command(subcommand)]
    Agents(AgentsCommands),

    /// Wallet management commands
    #[command(subcommand)]
    Wallets(WalletsCommands),

    #[command(subcommand)]
    Transactions(TransactionsCommands),

    /// Configuration management commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
pub enum UsersCommands {
    /// List all users
    List {
        #[arg(short, long, default_value = "1")]
        page: usize,
    },
}

#[derive(Subcommand, Debug)]
pub enum AgentsCommands {
    /// List agents
    List {
        /// Search name, email or id
        #[arg(short, long)]
        search: Option<String>,
        /// Filter by approval status ("all" for none)
        #[arg(long)]
        status: Option<String>,
        /// Filter by ACTIVE / SUSPENDED ("all" for none)
        #[arg(long)]
        active: Option<String>,
        #[arg(long, value_enum)]
        sort: Option<AgentSortArg>,
        /// Sort descending
        #[arg(long)]
        desc: bool,
        #[arg(short, long, default_value = "1")]
        page: usize,
    },
    /// Reactivate an agent
    Approve { id: String },
    /// Suspend an agent
    Suspend { id: String },
}

#[derive(Subcommand, Debug)]
pub enum WalletsCommands {
    /// List wallets
    List {
        /// Search owner name or email
        #[arg(short, long)]
        search: Option<String>,
        /// Owner role ("all" for none)
        #[arg(long)]
        role: Option<String>,
        /// ACTIVE / BLOCKED ("all" for none)
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        min: Option<f64>,
        #[arg(long)]
        max: Option<f64>,
        #[arg(short, long, default_value = "1")]
        page: usize,
    },
    /// Block a wallet
    Block { id: String },
    /// Unblock a wallet
    Unblock { id: String },
}

#[derive(Subcommand, Debug)]
pub enum TransactionsCommands {
    /// List transactions, newest first
    List {
        /// credit / debit ("all" for none)
        #[arg(long = "type")]
        kind: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long, value_enum, default_value = "date")]
        sort: TransactionSortArg,
        /// Sort ascending
        #[arg(long)]
        asc: bool,
        #[arg(short, long, default_value = "1")]
        page: usize,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration file
    Check,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum AgentSortArg {
    Name,
    Email,
    Created,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum TransactionSortArg {
    Date,
    Amount,
}

/// Run a CLI command
pub async fn run_command(cli: &Cli, state: &ClientState) -> Result<()> {
    match &cli.command {
        Commands::Login { email, password } => cmd_login(state, email, password).await,
        Commands::Logout => cmd_logout(state),
        Commands::Status { from } => cmd_status(state, from),
        Commands::Profile => cmd_profile(state).await,
        Commands::Users(UsersCommands::List { page }) => cmd_users_list(state, *page).await,
        Commands::Agents(AgentsCommands::List {
            search,
            status,
            active,
            sort,
            desc,
            page,
        }) => {
            let query = AgentQuery {
                search: search.clone(),
                status: status.clone(),
                is_active: active.clone(),
                sort: match sort {
                    Some(AgentSortArg::Name) => AgentSort::Name,
                    Some(AgentSortArg::Email) => AgentSort::Email,
                    Some(AgentSortArg::Created) => AgentSort::Created,
                    None => AgentSort::None,
                },
                order: if *desc { SortOrder::Desc } else { SortOrder::Asc },
                page: *page,
            };
            cmd_agents_list(state, &query).await
        }
        Commands::Agents(AgentsCommands::Approve { id }) => {
            cmd_agent_action(state, id, AgentAction::Unblock).await
        }
        Commands::Agents(AgentsCommands::Suspend { id }) => {
            cmd_agent_action(state, id, AgentAction::Block).await
        }
        Commands::Wallets(WalletsCommands::List {
            search,
            role,
            status,
            min,
            max,
            page,
        }) => {
            let query = WalletQuery {
                search: search.clone(),
                role: role.clone(),
                status: status.clone(),
                min_balance: *min,
                max_balance: *max,
                page: *page,
            };
            cmd_wallets_list(state, &query).await
        }
        Commands::Wallets(WalletsCommands::Block { id }) => {
            cmd_wallet_action(state, id, WalletAction::Block).await
        }
        Commands::Wallets(WalletsCommands::Unblock { id }) => {
            cmd_wallet_action(state, id, WalletAction::Unblock).await
        }
        Commands::Transactions(TransactionsCommands::List {
            kind,
            status,
            sort,
            asc,
            page,
        }) => {
            let query = TransactionQuery {
                kind: kind.clone(),
                status: status.clone(),
                sort: match sort {
                    TransactionSortArg::Date => TransactionSort::Date,
                    TransactionSortArg::Amount => TransactionSort::Amount,
                },
                order: if *asc { SortOrder::Asc } else { SortOrder::Desc },
                page: *page,
            };
            cmd_transactions_list(state, &query).await
        }
        Commands::Config(ConfigCommands::Check) => cmd_config_check(cli),
    }
}

/// Turn a notice into the command's outcome.
fn report(notice: Notice) -> Result<()> {
    if notice.is_error() {
        anyhow::bail!("{}", notice.message);
    }
    println!("{}", notice);
    Ok(())
}

fn require(state: &ClientState, scope: Scope) -> Result<()> {
    state.require(scope).map_err(|e| {
        anyhow::anyhow!(
            "{}. Log in with an account that can open {}.",
            Notice::from(&e).message,
            scope.dashboard_path()
        )
    })
}

async fn cmd_login(state: &ClientState, email: &str, password: &str) -> Result<()> {
    match state.login(email, password).await {
        Ok(outcome) => {
            report(Notice::welcome(&outcome.user.name))?;
            println!("Dashboard:  {}", outcome.redirect);
            Ok(())
        }
        Err(e) => report(Notice::from(&e)),
    }
}

fn cmd_logout(state: &ClientState) -> Result<()> {
    report(state.logout())
}

fn cmd_status(state: &ClientState, from: &str) -> Result<()> {
    let session = &state.session;

    println!();
    println!("=== PayWallet Session ===");
    println!();
    println!("API:        {}", state.config.api.base_url);

    if !session.is_authenticated() {
        println!("Status:     [!!] Not logged in");
        println!();
        return Ok(());
    }

    println!("Status:     [OK] Logged in");
    if let Some(user) = session.current_user() {
        println!("User:       {} <{}>", user.name, user.email);
    }
    println!(
        "Role:       {}",
        session
            .current_role()
            .map(|r| r.as_str())
            .unwrap_or("unrecognized")
    );
    println!("Dashboard:  {}", session.dashboard_path());
    println!("Profile:    {}", session.profile_path());
    match session.redirect_target(from) {
        Some(target) => println!("Redirect:   {} -> {}", from, target),
        None => println!("Redirect:   none from {}", from),
    }
    if let Some(source) = session.store().read().map(|s| s.source) {
        println!("Stored in:  {:?}", source);
    }
    println!();
    Ok(())
}

async fn cmd_profile(state: &ClientState) -> Result<()> {
    require(state, Scope::Admin)?;
    let user = state
        .admin
        .get_profile()
        .await
        .context("Failed to load profile")?;

    println!();
    println!("=== Profile: {} ===", user.name);
    println!();
    println!("ID:         {}", user.id);
    println!("Email:      {}", user.email);
    println!("Role:       {}", user.role);
    println!("Phone:      {}", user.phone.as_deref().unwrap_or("-"));
    println!("Joined:     {}", user.created_at.as_deref().unwrap_or("-"));
    println!();
    Ok(())
}

async fn cmd_users_list(state: &ClientState, page: usize) -> Result<()> {
    require(state, Scope::Admin)?;
    let users = state
        .admin
        .get_users()
        .await
        .context("Failed to load users")?;
    let page = crate::views::paginate(users, page.max(1), crate::views::PAGE_SIZE);
    print_users(&page, "users");
    Ok(())
}

async fn cmd_agents_list(state: &ClientState, query: &AgentQuery) -> Result<()> {
    require(state, Scope::Admin)?;
    let agents = state
        .admin
        .get_agents()
        .await
        .context("Failed to load agents")?;

    let summary = AgentSummary::of(&agents);
    println!();
    println!(
        "Agents: {} total, {} active, {} suspended",
        summary.total, summary.active, summary.suspended
    );
    print_users(&query.apply(&agents), "agents");
    Ok(())
}

async fn cmd_agent_action(state: &ClientState, id: &str, action: AgentAction) -> Result<()> {
    require(state, Scope::Admin)?;
    report(agent_action(&state.admin, id, action).await)?;
    cmd_agents_list(state, &AgentQuery::default()).await
}

async fn cmd_wallets_list(state: &ClientState, query: &WalletQuery) -> Result<()> {
    require(state, Scope::Admin)?;
    let wallets = state
        .admin
        .get_wallets()
        .await
        .context("Failed to load wallets")?;
    let view = query.apply(&wallets);

    if view.page.total == 0 {
        println!("No wallets found.");
        return Ok(());
    }

    println!();
    println!(
        "{:<26}  {:<20}  {:<28}  {:<8}  {:>12}  {:<8}",
        "ID", "OWNER", "EMAIL", "ROLE", "BALANCE", "STATUS"
    );
    println!("{}", "-".repeat(110));
    for wallet in &view.page.items {
        let (name, email, role) = wallet
            .user
            .as_ref()
            .map(|o| (o.name.as_str(), o.email.as_str(), o.role.as_str()))
            .unwrap_or(("-", "-", "-"));
        println!(
            "{:<26}  {:<20}  {:<28}  {:<8}  {:>12}  {:<8}",
            truncate(&wallet.id, 26),
            truncate(name, 20),
            truncate(email, 28),
            role,
            format_amount(wallet.balance),
            wallet.status()
        );
    }
    println!();
    print_page_footer(&view.page, "wallets");
    println!("Total balance: {}", format_amount(view.total_balance));
    println!();
    Ok(())
}

async fn cmd_wallet_action(state: &ClientState, id: &str, action: WalletAction) -> Result<()> {
    require(state, Scope::Admin)?;
    report(wallet_action(&state.admin, id, action).await)?;
    cmd_wallets_list(state, &WalletQuery::default()).await
}

async fn cmd_transactions_list(state: &ClientState, query: &TransactionQuery) -> Result<()> {
    require(state, Scope::Admin)?;
    let transactions = state
        .admin
        .get_transactions()
        .await
        .context("Failed to load transactions")?;
    let page = query.apply(&transactions);

    if page.total == 0 {
        println!("No transactions found.");
        return Ok(());
    }

    println!();
    println!(
        "{:<26}  {:<26}  {:<7}  {:>12}  {:<10}  {:<20}",
        "ID", "USER", "TYPE", "AMOUNT", "STATUS", "DATE"
    );
    println!("{}", "-".repeat(110));
    for tx in &page.items {
        println!(
            "{:<26}  {:<26}  {:<7}  {:>12}  {:<10}  {:<20}",
            truncate(&tx.id, 26),
            truncate(&tx.user_id, 26),
            tx.kind,
            format_amount(tx.amount),
            tx.status,
            truncate(&tx.created_at, 20)
        );
    }
    println!();
    print_page_footer(&page, "transactions");
    println!();
    Ok(())
}

fn cmd_config_check(cli: &Cli) -> Result<()> {
    let config_path = &cli.config;

    println!("Checking configuration file: {}", config_path.display());
    println!();

    if !config_path.exists() {
        println!(
            "[!!] Configuration file not found: {}",
            config_path.display()
        );
        println!();
        println!("Defaults will be used.");
        return Ok(());
    }

    match Config::load(config_path) {
        Ok(mut config) => {
            cli.apply_overrides(&mut config);
            println!("[OK] Configuration file is valid!");
            println!();
            println!("=== Configuration Summary ===");
            println!();
            println!("API:");
            println!("  Base URL:     {}", config.api.base_url);
            println!("  Timeout:      {}s", config.api.timeout_secs);
            println!();
            println!("Storage:");
            println!("  Data Dir:     {}", config.storage.data_dir.display());
            println!("  Cookie TTL:   {} days", config.storage.cookie_ttl_days);
            println!();
            println!("Cache:");
            println!("  Idle Window:  {}s", config.cache.idle_window_secs);
            println!("  Eviction:     every {}s", config.cache.eviction_interval_secs);
            println!();
            println!("Logging:");
            println!("  Level:        {}", config.logging.level);
            println!();
            Ok(())
        }
        Err(e) => {
            println!("[!!] Configuration file is invalid!");
            println!();
            println!("Error: {:#}", e);
            anyhow::bail!("Invalid configuration")
        }
    }
}

fn print_users(page: &Page<User>, noun: &str) {
    if page.total == 0 {
        println!("No {} found.", noun);
        return;
    }

    println!();
    println!(
        "{:<26}  {:<20}  {:<28}  {:<12}  {:<10}",
        "ID", "NAME", "EMAIL", "ROLE", "STATE"
    );
    println!("{}", "-".repeat(104));
    for user in &page.items {
        println!(
            "{:<26}  {:<20}  {:<28}  {:<12}  {:<10}",
            truncate(&user.id, 26),
            truncate(&user.name, 20),
            truncate(&user.email, 28),
            user.role,
            user.is_active
                .as_deref()
                .or(user.status.as_deref())
                .unwrap_or("-")
        );
    }
    println!();
    print_page_footer(page, noun);
    println!();
}

fn print_page_footer<T>(page: &Page<T>, noun: &str) {
    match page.range() {
        Some((start, end)) => println!(
            "Showing {}-{} of {} {} (page {}/{})",
            start, end, page.total, noun, page.page, page.total_pages
        ),
        None => println!(
            "Page {} is out of range ({} pages, {} {})",
            page.page, page.total_pages, page.total, noun
        ),
    }
}

fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
