//! Declarative query cache with tag-based invalidation.
//!
//! Every backend read goes through [`QueryCache::query`] and every write
//! through [`QueryCache::mutate`]. Reads are cached per `(endpoint, arg)` and
//! tagged from the endpoint table; a successful write invalidates all entries
//! carrying one of its tags before it returns, and entries with live
//! subscribers are refetched in the background.
//!
//! Concurrent reads of the same key share one request. Each entry carries a
//! generation, drawn from a cache-wide counter, that invalidation replaces;
//! an in-flight request is only joined if it was started for the current
//! generation, and a response that lands after its key was invalidated is
//! stored as stale, so invalidated data is never served. [`QueryCache::reset`]
//! starts a new epoch: responses to requests issued before it are dropped.
//!
//! Bookkeeping sits behind a `parking_lot::Mutex` that is never held across
//! an `.await`.

mod endpoint;

pub use endpoint::{Endpoint, EndpointKind, Tag};

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{Error, Result, TransportError};
use crate::session::TokenSource;
use crate::transport::{ApiRequest, Transport};

/// Cache key: endpoint plus optional argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub endpoint: Endpoint,
    pub arg: Option<String>,
}

impl CacheKey {
    pub fn new(endpoint: Endpoint, arg: Option<&str>) -> Self {
        Self {
            endpoint,
            arg: arg.map(str::to_string),
        }
    }
}

/// What a subscriber currently sees for its key.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState {
    Loading,
    Ready(Value),
    Failed(TransportError),
}

type SharedFetch = Shared<BoxFuture<'static, Result<Value, TransportError>>>;

struct Entry {
    /// Identifies this incarnation of the key across eviction and reset.
    id: u64,
    data: Option<Value>,
    tags: &'static [Tag],
    subscribers: usize,
    invalidated: bool,
    generation: u64,
    last_used: Instant,
    state_tx: watch::Sender<QueryState>,
}

impl Entry {
    fn new(tags: &'static [Tag], generation: u64) -> Self {
        let (state_tx, _) = watch::channel(QueryState::Loading);
        Self {
            id: generation,
            data: None,
            tags,
            subscribers: 0,
            invalidated: false,
            generation,
            last_used: Instant::now(),
            state_tx,
        }
    }

    fn is_fresh(&self) -> bool {
        self.data.is_some() && !self.invalidated
    }
}

struct InFlight {
    epoch: u64,
    generation: u64,
    fetch: SharedFetch,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<CacheKey, Entry>,
    in_flight: HashMap<CacheKey, InFlight>,
    /// Tag -> keys of entries providing it.
    tag_index: HashMap<Tag, HashSet<CacheKey>>,
    /// Bumped by every reset; survives it.
    epoch: u64,
    /// Last generation handed out; never reused.
    last_generation: u64,
}

impl CacheState {
    fn next_generation(&mut self) -> u64 {
        self.last_generation += 1;
        self.last_generation
    }

    fn entry_mut(&mut self, key: &CacheKey) -> &mut Entry {
        let tags = key.endpoint.tags();
        let missing = !self.entries.contains_key(key);
        if missing {
            for tag in tags {
                self.tag_index.entry(*tag).or_default().insert(key.clone());
            }
        }
        let generation = if missing { self.next_generation() } else { 0 };
        self.entries
            .entry(key.clone())
            .or_insert_with(|| Entry::new(tags, generation))
    }

    fn remove_entry(&mut self, key: &CacheKey) {
        if let Some(entry) = self.entries.remove(key) {
            for tag in entry.tags {
                if let Some(keys) = self.tag_index.get_mut(tag) {
                    keys.remove(key);
                }
            }
        }
    }
}

struct CacheInner {
    state: Mutex<CacheState>,
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenSource>,
    idle_window: Duration,
}

impl CacheInner {
    fn request_for(&self, endpoint: Endpoint, arg: Option<&str>) -> Result<ApiRequest> {
        let path = endpoint.path(arg).ok_or_else(|| {
            Error::InvalidRequest(format!("{} requires a plain id", endpoint))
        })?;
        Ok(ApiRequest::new(endpoint.method(), path).with_bearer(self.tokens.bearer_token()))
    }

    /// Record the outcome of a fetch started at `epoch` and `generation`.
    fn complete(
        &self,
        key: &CacheKey,
        epoch: u64,
        generation: u64,
        result: &Result<Value, TransportError>,
    ) {
        let mut state = self.state.lock();
        if state.epoch != epoch {
            debug!(endpoint = %key.endpoint, "Dropping response issued before cache reset");
            return;
        }
        if state
            .in_flight
            .get(key)
            .is_some_and(|f| f.epoch == epoch && f.generation == generation)
        {
            state.in_flight.remove(key);
        }

        let entry = state.entry_mut(key);
        let current = entry.generation == generation;
        match result {
            Ok(data) => {
                entry.data = Some(data.clone());
                entry.invalidated = !current;
                entry.last_used = Instant::now();
                if current {
                    entry.state_tx.send_replace(QueryState::Ready(data.clone()));
                } else {
                    debug!(endpoint = %key.endpoint, "Response arrived after invalidation, kept as stale");
                }
            }
            Err(e) => {
                if current {
                    warn!(endpoint = %key.endpoint, error = %e, "Query failed");
                    entry.state_tx.send_replace(QueryState::Failed(e.clone()));
                }
            }
        }
    }
}

/// Shared handle to the cache; cloning is cheap.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<CacheInner>,
}

impl QueryCache {
    pub fn new(
        transport: Arc<dyn Transport>,
        tokens: Arc<dyn TokenSource>,
        idle_window: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                state: Mutex::new(CacheState::default()),
                transport,
                tokens,
                idle_window,
            }),
        }
    }

    /// Cached data for a live entry, or the result of a (possibly shared)
    /// network read.
    pub async fn query(&self, endpoint: Endpoint, arg: Option<&str>) -> Result<Value> {
        if endpoint.kind() != EndpointKind::Query {
            return Err(Error::InvalidRequest(format!("{} is not a query", endpoint)));
        }
        let key = CacheKey::new(endpoint, arg);
        let fetch = {
            let mut state = self.inner.state.lock();
            if let Some(entry) = state.entries.get_mut(&key) {
                if entry.is_fresh() {
                    entry.last_used = Instant::now();
                    debug!(%endpoint, "Cache hit");
                    if let Some(data) = &entry.data {
                        return Ok(data.clone());
                    }
                }
            }
            self.fetch_locked(&mut state, &key)?
        };
        Ok(fetch.await?)
    }

    /// Send a write. On success every entry tagged with one of the
    /// endpoint's tags is invalidated before this returns. On failure the
    /// cache is left untouched.
    pub async fn mutate(&self, endpoint: Endpoint, arg: Option<&str>) -> Result<Value> {
        if endpoint.kind() != EndpointKind::Mutation {
            return Err(Error::InvalidRequest(format!("{} is not a mutation", endpoint)));
        }
        let request = self.inner.request_for(endpoint, arg)?;
        match self.inner.transport.send(request).await {
            Ok(data) => {
                let invalidated = self.invalidate_tags(endpoint.tags());
                info!(%endpoint, arg = arg.unwrap_or_default(), invalidated, "Mutation succeeded");
                Ok(data)
            }
            Err(source) => {
                warn!(%endpoint, error = %source, "Mutation failed");
                Err(Error::MutationFailure { endpoint, source })
            }
        }
    }

    /// Register interest in a key. A fetch starts if nothing fresh is
    /// cached. Dropping the returned guard unsubscribes without cancelling
    /// any in-flight request.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn subscribe(&self, endpoint: Endpoint, arg: Option<&str>) -> Result<Subscription> {
        if endpoint.kind() != EndpointKind::Query {
            return Err(Error::InvalidRequest(format!("{} is not a query", endpoint)));
        }
        let key = CacheKey::new(endpoint, arg);
        let (rx, entry_id, fetch) = {
            let mut state = self.inner.state.lock();
            let fetch = if state.entry_mut(&key).is_fresh() {
                None
            } else {
                Some(self.fetch_locked(&mut state, &key)?)
            };
            let entry = state.entry_mut(&key);
            entry.subscribers += 1;
            entry.last_used = Instant::now();
            (entry.state_tx.subscribe(), entry.id, fetch)
        };
        if let Some(fetch) = fetch {
            tokio::spawn(async move {
                let _ = fetch.await;
            });
        }
        debug!(%endpoint, "Subscribed");
        Ok(Subscription {
            cache: self.clone(),
            key,
            entry_id,
            rx,
        })
    }

    /// Mark every entry carrying any of `tags` stale and refetch the ones
    /// with subscribers. Returns the number of entries invalidated.
    pub fn invalidate_tags(&self, tags: &[Tag]) -> usize {
        let mut refetches = Vec::new();
        let count = {
            let mut state = self.inner.state.lock();
            let keys: HashSet<CacheKey> = tags
                .iter()
                .filter_map(|tag| state.tag_index.get(tag))
                .flatten()
                .cloned()
                .collect();

            let mut subscribed = Vec::new();
            for key in &keys {
                let generation = state.next_generation();
                if let Some(entry) = state.entries.get_mut(key) {
                    entry.invalidated = true;
                    entry.generation = generation;
                    entry.state_tx.send_replace(QueryState::Loading);
                    if entry.subscribers > 0 {
                        subscribed.push(key.clone());
                    }
                }
            }
            // Registered as in-flight while still locked so a read issued
            // right after the mutation joins the refetch.
            for key in subscribed {
                match self.fetch_locked(&mut state, &key) {
                    Ok(fetch) => refetches.push(fetch),
                    Err(e) => warn!(endpoint = %key.endpoint, error = %e, "Cannot refetch"),
                }
            }
            keys.len()
        };
        for fetch in refetches {
            tokio::spawn(async move {
                let _ = fetch.await;
            });
        }
        debug!(?tags, count, "Invalidated tags");
        count
    }

    /// Drop entries nobody subscribes to and nobody used within the idle
    /// window. Returns the number of entries evicted.
    pub fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let mut state = self.inner.state.lock();
        let idle: Vec<CacheKey> = state
            .entries
            .iter()
            .filter(|(key, entry)| {
                entry.subscribers == 0
                    && now.duration_since(entry.last_used) >= self.inner.idle_window
                    && !state.in_flight.contains_key(*key)
            })
            .map(|(key, _)| key.clone())
            .collect();
        for key in &idle {
            state.remove_entry(key);
        }
        idle.len()
    }

    /// Forget everything (e.g. on login or logout). Requests already in
    /// flight still resolve for their callers, but their responses are not
    /// stored, and subscriptions taken before the reset no longer count.
    pub fn reset(&self) {
        let mut state = self.inner.state.lock();
        let dropped = state.entries.len();
        state.entries.clear();
        state.tag_index.clear();
        state.in_flight.clear();
        state.epoch += 1;
        debug!(dropped, epoch = state.epoch, "Cache reset");
    }

    /// Number of tracked entries (for monitoring)
    pub fn entry_count(&self) -> usize {
        self.inner.state.lock().entries.len()
    }

    /// Whether fresh data is cached for the key.
    pub fn is_cached(&self, endpoint: Endpoint, arg: Option<&str>) -> bool {
        self.inner
            .state
            .lock()
            .entries
            .get(&CacheKey::new(endpoint, arg))
            .is_some_and(Entry::is_fresh)
    }

    pub fn subscriber_count(&self, endpoint: Endpoint, arg: Option<&str>) -> usize {
        self.inner
            .state
            .lock()
            .entries
            .get(&CacheKey::new(endpoint, arg))
            .map_or(0, |e| e.subscribers)
    }

    /// Join the in-flight request for `key` if it belongs to the current
    /// generation, otherwise start a new one.
    fn fetch_locked(&self, state: &mut CacheState, key: &CacheKey) -> Result<SharedFetch> {
        let generation = state.entry_mut(key).generation;
        let epoch = state.epoch;
        if let Some(in_flight) = state.in_flight.get(key) {
            if in_flight.generation == generation {
                debug!(endpoint = %key.endpoint, "Joining in-flight request");
                return Ok(in_flight.fetch.clone());
            }
        }

        let request = self.inner.request_for(key.endpoint, key.arg.as_deref())?;
        let inner = Arc::clone(&self.inner);
        let fetch_key = key.clone();
        let fetch = async move {
            let result = inner.transport.send(request).await;
            inner.complete(&fetch_key, epoch, generation, &result);
            result
        }
        .boxed()
        .shared();

        debug!(endpoint = %key.endpoint, generation, "Starting request");
        state.in_flight.insert(
            key.clone(),
            InFlight {
                epoch,
                generation,
                fetch: fetch.clone(),
            },
        );
        Ok(fetch)
    }

    fn release(&self, key: &CacheKey, entry_id: u64) {
        let mut state = self.inner.state.lock();
        if let Some(entry) = state.entries.get_mut(key).filter(|e| e.id == entry_id) {
            entry.subscribers = entry.subscribers.saturating_sub(1);
            entry.last_used = Instant::now();
        }
    }
}

/// Live interest in one cache key.
pub struct Subscription {
    cache: QueryCache,
    key: CacheKey,
    entry_id: u64,
    rx: watch::Receiver<QueryState>,
}

impl Subscription {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn state(&self) -> QueryState {
        self.rx.borrow().clone()
    }

    /// Wait for the next state change. Returns `false` if the entry was
    /// dropped from the cache.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Current data, waiting while the entry is still loading or being
    /// refetched after invalidation.
    pub async fn ready(&mut self) -> Result<Value> {
        loop {
            let state = self.rx.borrow_and_update().clone();
            match state {
                QueryState::Ready(data) => return Ok(data),
                QueryState::Failed(e) => return Err(e.into()),
                QueryState::Loading => {
                    if !self.changed().await {
                        return Err(Error::InvalidRequest(format!(
                            "{} was evicted while loading",
                            self.key.endpoint
                        )));
                    }
                }
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cache.release(&self.key, self.entry_id);
    }
}

/// Spawn a background task that periodically evicts idle entries.
pub fn spawn_eviction_task(cache: QueryCache, interval_secs: u64) {
    tokio::spawn(async move {
        let interval = Duration::from_secs(interval_secs.max(1));
        loop {
            tokio::time::sleep(interval).await;
            let evicted = cache.evict_idle();
            debug!(
                "Cache eviction complete, {} evicted, {} entries remaining",
                evicted,
                cache.entry_count()
            );
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::{status_error, MockTransport};
    use crate::transport::Method;
    use serde_json::json;

    struct FixedToken(Option<&'static str>);

    impl TokenSource for FixedToken {
        fn bearer_token(&self) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    fn cache_with(transport: Arc<MockTransport>, token: Option<&'static str>) -> QueryCache {
        QueryCache::new(transport, Arc::new(FixedToken(token)), Duration::from_secs(60))
    }

    /// Backend with one agent whose `isActive` flips on approve/suspend.
    fn agents_backend() -> MockTransport {
        let status = Arc::new(Mutex::new("ACTIVE"));
        MockTransport::new(move |req| match (req.method, req.path.as_str()) {
            (Method::Get, "/admin/agents") => Ok(json!({
                "success": true,
                "data": [{"_id": "a1", "name": "Ama", "email": "ama@agent.com",
                          "role": "AGENT", "isActive": *status.lock()}]
            })),
            (Method::Get, "/admin/profile") => Ok(json!({
                "data": {"_id": "adm", "name": "Admin", "email": "admin@admin.com", "role": "ADMIN"}
            })),
            (Method::Patch, "/admin/suspend-agent/a1") => {
                *status.lock() = "SUSPENDED";
                Ok(json!({"success": true, "data": {"_id": "a1"}}))
            }
            (Method::Patch, "/admin/approve-agent/a1") => {
                *status.lock() = "ACTIVE";
                Ok(json!({"success": true, "data": {"_id": "a1"}}))
            }
            (Method::Get, "/admin/wallets") => Ok(json!({"data": []})),
            (_, path) => Err(status_error(path, 404, "Route not found")),
        })
    }

    fn first_agent_status(value: &Value) -> &str {
        value["data"][0]["isActive"].as_str().unwrap()
    }

    #[tokio::test]
    async fn test_query_is_cached() {
        let transport = Arc::new(agents_backend());
        let cache = cache_with(transport.clone(), Some("tok"));

        cache.query(Endpoint::GetAgents, None).await.unwrap();
        cache.query(Endpoint::GetAgents, None).await.unwrap();

        assert_eq!(transport.count(Method::Get, "/admin/agents"), 1);
        assert!(cache.is_cached(Endpoint::GetAgents, None));
    }

    #[tokio::test]
    async fn test_concurrent_queries_share_one_request() {
        let transport = Arc::new(agents_backend().with_delay(Duration::from_millis(20)));
        let cache = cache_with(transport.clone(), Some("tok"));

        let (a, b) = tokio::join!(
            cache.query(Endpoint::GetProfile, None),
            cache.query(Endpoint::GetProfile, None)
        );

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(transport.count(Method::Get, "/admin/profile"), 1);
    }

    #[tokio::test]
    async fn test_mutation_invalidates_dependent_reads() {
        let transport = Arc::new(agents_backend());
        let cache = cache_with(transport.clone(), Some("tok"));

        let before = cache.query(Endpoint::GetAgents, None).await.unwrap();
        assert_eq!(first_agent_status(&before), "ACTIVE");

        cache.mutate(Endpoint::SuspendUser, Some("a1")).await.unwrap();
        assert!(!cache.is_cached(Endpoint::GetAgents, None));

        let after = cache.query(Endpoint::GetAgents, None).await.unwrap();
        assert_eq!(first_agent_status(&after), "SUSPENDED");
        assert_eq!(transport.count(Method::Get, "/admin/agents"), 2);
    }

    #[tokio::test]
    async fn test_mutation_leaves_unrelated_tags_alone() {
        let transport = Arc::new(agents_backend());
        let cache = cache_with(transport.clone(), Some("tok"));

        cache.query(Endpoint::GetWallets, None).await.unwrap();
        cache.query(Endpoint::GetProfile, None).await.unwrap();
        cache.mutate(Endpoint::SuspendUser, Some("a1")).await.unwrap();

        assert!(cache.is_cached(Endpoint::GetWallets, None));
        // suspendUser invalidates User, which getProfile provides
        assert!(!cache.is_cached(Endpoint::GetProfile, None));
    }

    #[tokio::test]
    async fn test_failed_mutation_keeps_cache() {
        let transport = Arc::new(agents_backend());
        let cache = cache_with(transport.clone(), Some("tok"));

        cache.query(Endpoint::GetAgents, None).await.unwrap();
        let err = cache
            .mutate(Endpoint::SuspendUser, Some("missing"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::MutationFailure { endpoint: Endpoint::SuspendUser, .. }
        ));
        assert!(cache.is_cached(Endpoint::GetAgents, None));
        cache.query(Endpoint::GetAgents, None).await.unwrap();
        assert_eq!(transport.count(Method::Get, "/admin/agents"), 1);
    }

    #[tokio::test]
    async fn test_subscribed_entry_refetches_after_mutation() {
        let transport = Arc::new(agents_backend());
        let cache = cache_with(transport.clone(), Some("tok"));

        let mut sub = cache.subscribe(Endpoint::GetAgents, None).unwrap();
        let first = sub.ready().await.unwrap();
        assert_eq!(first_agent_status(&first), "ACTIVE");

        cache.mutate(Endpoint::SuspendUser, Some("a1")).await.unwrap();
        assert!(sub.changed().await);
        let refreshed = sub.ready().await.unwrap();
        assert_eq!(first_agent_status(&refreshed), "SUSPENDED");

        // the read after the mutation joins the background refetch
        cache.query(Endpoint::GetAgents, None).await.unwrap();
        assert_eq!(transport.count(Method::Get, "/admin/agents"), 2);
    }

    #[tokio::test]
    async fn test_response_landing_after_invalidation_is_not_served() {
        let transport = Arc::new(agents_backend().with_delay(Duration::from_millis(30)));
        let cache = cache_with(transport.clone(), Some("tok"));

        let pending = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.query(Endpoint::GetAgents, None).await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        cache.invalidate_tags(&[Tag::Agent]);
        pending.await.unwrap().unwrap();

        assert!(!cache.is_cached(Endpoint::GetAgents, None));
        cache.query(Endpoint::GetAgents, None).await.unwrap();
        assert_eq!(transport.count(Method::Get, "/admin/agents"), 2);
    }

    #[tokio::test]
    async fn test_unsubscribe_does_not_cancel_in_flight() {
        let transport = Arc::new(agents_backend().with_delay(Duration::from_millis(20)));
        let cache = cache_with(transport.clone(), Some("tok"));

        let sub = cache.subscribe(Endpoint::GetAgents, None).unwrap();
        assert_eq!(cache.subscriber_count(Endpoint::GetAgents, None), 1);
        drop(sub);
        assert_eq!(cache.subscriber_count(Endpoint::GetAgents, None), 0);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(cache.is_cached(Endpoint::GetAgents, None));
        assert_eq!(transport.count(Method::Get, "/admin/agents"), 1);
    }

    #[tokio::test]
    async fn test_idle_entries_are_evicted() {
        let transport = Arc::new(agents_backend());
        let cache = QueryCache::new(
            transport.clone(),
            Arc::new(FixedToken(Some("tok"))),
            Duration::ZERO,
        );

        cache.query(Endpoint::GetAgents, None).await.unwrap();
        let _sub = cache.subscribe(Endpoint::GetWallets, None).unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert_eq!(cache.evict_idle(), 1);
        assert!(!cache.is_cached(Endpoint::GetAgents, None));
        assert_eq!(cache.entry_count(), 1);

        cache.query(Endpoint::GetAgents, None).await.unwrap();
        assert_eq!(transport.count(Method::Get, "/admin/agents"), 2);
    }

    #[tokio::test]
    async fn test_failed_query_is_not_cached() {
        let transport = Arc::new(MockTransport::new(|req| {
            Err(status_error(&req.path, 401, "You are not authorized"))
        }));
        let cache = cache_with(transport.clone(), None);

        let err = cache.query(Endpoint::GetUsers, None).await.unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::Status { status: 401, .. })));
        assert!(!cache.is_cached(Endpoint::GetUsers, None));

        cache.query(Endpoint::GetUsers, None).await.unwrap_err();
        assert_eq!(transport.count(Method::Get, "/admin/users"), 2);
    }

    #[tokio::test]
    async fn test_bearer_is_injected_only_when_token_resolves() {
        let transport = Arc::new(agents_backend());
        cache_with(transport.clone(), Some("tok"))
            .query(Endpoint::GetProfile, None)
            .await
            .unwrap();
        cache_with(transport.clone(), None)
            .query(Endpoint::GetProfile, None)
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].authorization().as_deref(), Some("Bearer tok"));
        assert_eq!(requests[1].bearer, None);
        assert_eq!(requests[1].authorization(), None);
    }

    #[tokio::test]
    async fn test_kind_and_argument_checks() {
        let transport = Arc::new(agents_backend());
        let cache = cache_with(transport.clone(), Some("tok"));

        assert!(matches!(
            cache.query(Endpoint::BlockWallet, Some("w1")).await,
            Err(Error::InvalidRequest(_))
        ));
        assert!(matches!(
            cache.mutate(Endpoint::GetAgents, None).await,
            Err(Error::InvalidRequest(_))
        ));
        assert!(matches!(
            cache.mutate(Endpoint::BlockWallet, None).await,
            Err(Error::InvalidRequest(_))
        ));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_mutation_id_cannot_retarget_the_write() {
        let transport = Arc::new(agents_backend());
        let cache = cache_with(transport.clone(), Some("tok"));
        cache.query(Endpoint::GetWallets, None).await.unwrap();

        let result = cache
            .mutate(Endpoint::SuspendUser, Some("../block-wallet/w1"))
            .await;

        assert!(matches!(result, Err(Error::InvalidRequest(_))));
        assert_eq!(transport.requests().len(), 1);
        assert!(cache.is_cached(Endpoint::GetWallets, None));
    }

    struct SwitchableToken(Mutex<&'static str>);

    impl TokenSource for SwitchableToken {
        fn bearer_token(&self) -> Option<String> {
            Some(self.0.lock().to_string())
        }
    }

    #[tokio::test]
    async fn test_response_issued_before_reset_is_not_cached() {
        let transport = Arc::new(
            MockTransport::new(|req| Ok(json!({"who": req.bearer.clone()})))
                .with_delay(Duration::from_millis(30)),
        );
        let tokens = Arc::new(SwitchableToken(Mutex::new("old-admin")));
        let cache = QueryCache::new(transport.clone(), tokens.clone(), Duration::from_secs(60));

        let pending = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.query(Endpoint::GetUsers, None).await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        *tokens.0.lock() = "new-user";
        cache.reset();

        let old = pending.await.unwrap().unwrap();
        assert_eq!(old["who"], "old-admin");
        assert!(!cache.is_cached(Endpoint::GetUsers, None));

        let fresh = cache.query(Endpoint::GetUsers, None).await.unwrap();
        assert_eq!(fresh["who"], "new-user");
        assert_eq!(transport.count(Method::Get, "/admin/users"), 2);
    }

    #[tokio::test]
    async fn test_subscription_from_before_reset_releases_nothing() {
        let transport = Arc::new(agents_backend());
        let cache = cache_with(transport, Some("tok"));

        let old = cache.subscribe(Endpoint::GetAgents, None).unwrap();
        cache.reset();
        let current = cache.subscribe(Endpoint::GetAgents, None).unwrap();
        assert_eq!(cache.subscriber_count(Endpoint::GetAgents, None), 1);

        drop(old);
        assert_eq!(cache.subscriber_count(Endpoint::GetAgents, None), 1);
        drop(current);
        assert_eq!(cache.subscriber_count(Endpoint::GetAgents, None), 0);
    }

    #[tokio::test]
    async fn test_reset_forgets_entries() {
        let transport = Arc::new(agents_backend());
        let cache = cache_with(transport.clone(), Some("tok"));
        cache.query(Endpoint::GetAgents, None).await.unwrap();
        cache.reset();
        assert_eq!(cache.entry_count(), 0);
        cache.query(Endpoint::GetAgents, None).await.unwrap();
        assert_eq!(transport.count(Method::Get, "/admin/agents"), 2);
    }
}
