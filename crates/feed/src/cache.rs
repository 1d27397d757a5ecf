// ABOUTME: In-memory request cache that deduplicates concurrent identical fetches.
// ABOUTME: At most one in-flight producer per key; successes are cached with a TTL, failures are not.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::trace;

pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

type SharedResult<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

struct CachedValue<V> {
    value: V,
    stored_at: Instant,
    ttl: Duration,
}

struct InFlight<V, E> {
    id: u64,
    future: SharedResult<V, E>,
}

enum Lookup<V, E> {
    Hit(V),
    Joined(SharedResult<V, E>),
}

impl<V: Clone, E: Clone> Lookup<V, E> {
    async fn resolve(self) -> Result<V, E> {
        match self {
            Lookup::Hit(value) => Ok(value),
            Lookup::Joined(future) => future.await,
        }
    }
}

struct Inner<V, E> {
    entries: HashMap<String, CachedValue<V>>,
    in_flight: HashMap<String, InFlight<V, E>>,
    next_id: u64,
}

/// Deduplicating TTL cache keyed by request identity.
///
/// The lock only guards map bookkeeping and is never held across an await.
/// The cache itself never retries a failed producer.
pub struct RequestCache<V, E> {
    inner: Arc<Mutex<Inner<V, E>>>,
    default_ttl: Duration,
}

impl<V, E> Clone for RequestCache<V, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            default_ttl: self.default_ttl,
        }
    }
}

impl<V, E> Default for RequestCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl<V, E> RequestCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: HashMap::new(),
                in_flight: HashMap::new(),
                next_id: 0,
            })),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Returns the value for `key`, joining an in-flight request or invoking `producer`.
    ///
    /// `producer` is only called when no request for `key` is in flight and no
    /// cached value younger than `ttl` exists. It runs outside the lock. If another
    /// caller starts a flight for `key` meanwhile, the produced future is dropped
    /// unpolled and this call joins that flight instead.
    pub async fn get<F, Fut>(&self, key: &str, producer: F, ttl: Option<Duration>) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let ttl = ttl.unwrap_or(self.default_ttl);

        if let Some(lookup) = self.lookup(key, ttl) {
            return lookup.resolve().await;
        }

        let produced = producer();

        let flight = {
            let mut inner = self.inner.lock();
            match Self::lookup_locked(&inner, key, ttl) {
                Some(lookup) => Err(lookup),
                None => Ok(self.start_flight(&mut inner, key, produced, ttl)),
            }
        };

        match flight {
            Ok(future) => future.await,
            Err(lookup) => lookup.resolve().await,
        }
    }

    fn start_flight<Fut>(
        &self,
        inner: &mut Inner<V, E>,
        key: &str,
        produced: Fut,
        ttl: Duration,
    ) -> SharedResult<V, E>
    where
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let id = inner.next_id;
        inner.next_id += 1;

        let weak: Weak<Mutex<Inner<V, E>>> = Arc::downgrade(&self.inner);
        let owned_key = key.to_string();
        let future = async move {
            let result = produced.await;
            if let Some(inner) = weak.upgrade() {
                let mut inner = inner.lock();
                // An invalidate() during the flight removes our marker; then the result is not stored.
                let still_ours = inner.in_flight.get(&owned_key).map(|f| f.id) == Some(id);
                if still_ours {
                    inner.in_flight.remove(&owned_key);
                    if let Ok(value) = &result {
                        inner.entries.insert(
                            owned_key,
                            CachedValue {
                                value: value.clone(),
                                stored_at: Instant::now(),
                                ttl,
                            },
                        );
                    }
                }
            }
            result
        }
        .boxed()
        .shared();

        inner.in_flight.insert(
            key.to_string(),
            InFlight {
                id,
                future: future.clone(),
            },
        );
        future
    }

    fn lookup(&self, key: &str, ttl: Duration) -> Option<Lookup<V, E>> {
        Self::lookup_locked(&self.inner.lock(), key, ttl)
    }

    fn lookup_locked(inner: &Inner<V, E>, key: &str, ttl: Duration) -> Option<Lookup<V, E>> {
        if let Some(flight) = inner.in_flight.get(key) {
            trace!(key, "joining in-flight request");
            return Some(Lookup::Joined(flight.future.clone()));
        }
        match inner.entries.get(key) {
            Some(cached) if cached.stored_at.elapsed() < ttl => {
                trace!(key, "cache hit");
                Some(Lookup::Hit(cached.value.clone()))
            }
            _ => None,
        }
    }

    /// Drops cached and in-flight state for `key`.
    pub fn invalidate(&self, key: &str) {
        let mut inner = self.inner.lock();
        inner.entries.remove(key);
        inner.in_flight.remove(key);
    }

    /// Drops all cached and in-flight state.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.in_flight.clear();
    }

    /// Evicts entries older than their TTL. Returns the number removed.
    pub fn sweep(&self) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|_, c| c.stored_at.elapsed() < c.ttl);
        before - inner.entries.len()
    }

    /// Runs `sweep` every `interval` until the cache is dropped.
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let weak = Arc::downgrade(&self.inner);
        let default_ttl = self.default_ttl;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let removed = RequestCache { inner, default_ttl }.sweep();
                if removed > 0 {
                    trace!(removed, "swept expired cache entries");
                }
            }
        })
    }

    /// Number of cached values (fresh or not yet swept).
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of requests currently in flight.
    pub fn in_flight(&self) -> usize {
        self.inner.lock().in_flight.len()
    }
}
