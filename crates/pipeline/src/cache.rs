//! Single-flight response cache.
//!
//! ```text
//!  lookup(key) ─┬─ Ready, not expired ──▶ Hit
//!               ├─ Pending             ──▶ Joined (await the leader's result)
//!               └─ missing / expired   ──▶ Computed (spawn the computation,
//!                                          publish to every waiter)
//! ```
//!
//! The computation runs in its own task, so a caller that goes away does not
//! cancel work other callers are waiting on. Successful values are kept until
//! their TTL runs out; expired entries are dropped when next looked up.
//! Failures are shared with concurrent waiters but never stored.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use clinidraft_config::CacheConfig;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};

/// How a value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Served from a stored entry.
    Hit,
    /// Awaited a computation another caller started.
    Joined,
    /// This caller started the computation.
    Computed,
}

/// The shared computation ended without publishing a result (it panicked).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("shared computation for '{key}' ended without a result")]
pub struct Abandoned {
    pub key: String,
}

/// A value or failure, plus how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<V, E> {
    pub lookup: Lookup,
    pub result: Result<V, E>,
}

type Published<V, E> = Option<Result<V, E>>;

enum Slot<V, E> {
    Ready { value: V, expires_at: Instant },
    Pending(watch::Receiver<Published<V, E>>),
}

enum Decision<V, E> {
    Hit(V),
    Join(watch::Receiver<Published<V, E>>),
    Lead(watch::Receiver<Published<V, E>>),
}

type Slots<V, E> = Arc<Mutex<HashMap<String, Slot<V, E>>>>;

/// Fingerprint-keyed memo of pipeline outcomes.
pub struct ResponseCache<V, E> {
    slots: Slots<V, E>,
    ttl: Duration,
    enabled: bool,
}

fn lock<V, E>(slots: &Mutex<HashMap<String, Slot<V, E>>>) -> MutexGuard<'_, HashMap<String, Slot<V, E>>> {
    slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<V, E> ResponseCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            ttl,
            enabled: true,
        }
    }

    /// Single-flight only: concurrent callers still share one computation,
    /// but nothing is stored.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(Duration::ZERO)
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        if config.enabled {
            Self::new(config.ttl())
        } else {
            Self::disabled()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Stored entries that have not yet expired.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        lock(&self.slots)
            .values()
            .filter(|slot| matches!(slot, Slot::Ready { expires_at, .. } if *expires_at > now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Computations currently in flight.
    pub fn in_flight(&self) -> usize {
        lock(&self.slots)
            .values()
            .filter(|slot| matches!(slot, Slot::Pending(_)))
            .count()
    }

    /// Return the value for `key`, computing it at most once across
    /// concurrent callers.
    ///
    /// `compute` is only invoked when this caller leads; its future is
    /// spawned onto the runtime.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &str,
        compute: F,
    ) -> Result<Fetched<V, E>, Abandoned>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let decision = {
            let mut slots = lock(&self.slots);
            match slots.get(key) {
                Some(Slot::Ready { value, expires_at }) if *expires_at > Instant::now() => {
                    Decision::Hit(value.clone())
                }
                // A closed channel means the leader died before publishing.
                Some(Slot::Pending(rx)) if rx.has_changed().is_ok() => Decision::Join(rx.clone()),
                stale => {
                    if stale.is_some() {
                        debug!(fingerprint = %key, "Evicting stale cache slot");
                    }
                    let (tx, rx) = watch::channel(None);
                    slots.insert(key.to_string(), Slot::Pending(rx.clone()));
                    self.spawn_leader(key.to_string(), tx, compute());
                    Decision::Lead(rx)
                }
            }
        };

        match decision {
            Decision::Hit(value) => Ok(Fetched {
                lookup: Lookup::Hit,
                result: Ok(value),
            }),
            Decision::Join(rx) => Ok(Fetched {
                lookup: Lookup::Joined,
                result: wait(key, rx).await?,
            }),
            Decision::Lead(rx) => Ok(Fetched {
                lookup: Lookup::Computed,
                result: wait(key, rx).await?,
            }),
        }
    }

    fn spawn_leader<Fut>(&self, key: String, tx: watch::Sender<Published<V, E>>, computation: Fut)
    where
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let slots = Arc::clone(&self.slots);
        let ttl = self.ttl;
        let enabled = self.enabled;

        tokio::spawn(async move {
            let result = computation.await;
            {
                let mut slots = lock(&slots);
                match &result {
                    Ok(value) if enabled => {
                        slots.insert(
                            key,
                            Slot::Ready {
                                value: value.clone(),
                                expires_at: Instant::now() + ttl,
                            },
                        );
                    }
                    _ => {
                        slots.remove(&key);
                    }
                }
            }
            tx.send_replace(Some(result));
        });
    }
}

async fn wait<V: Clone, E: Clone>(
    key: &str,
    mut rx: watch::Receiver<Published<V, E>>,
) -> Result<Result<V, E>, Abandoned> {
    match rx.wait_for(Option::is_some).await {
        Ok(published) => published.clone().ok_or_else(|| Abandoned {
            key: key.to_string(),
        }),
        Err(_) => {
            warn!(fingerprint = %key, "Shared computation ended without a result");
            Err(Abandoned {
                key: key.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq)]
    struct Failed;

    type TestCache = ResponseCache<u32, Failed>;

    fn counting(
        counter: &Arc<AtomicUsize>,
        value: u32,
        delay: Duration,
    ) -> impl FnOnce() -> std::pin::Pin<Box<dyn Future<Output = Result<u32, Failed>> + Send>> + use<> {
        let counter = Arc::clone(counter);
        move || {
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(delay).await;
                Ok(value)
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn second_lookup_hits() {
        let cache = TestCache::new(Duration::from_secs(60));
        let counter = Arc::new(AtomicUsize::new(0));

        let first = cache
            .get_or_compute("k", counting(&counter, 7, Duration::ZERO))
            .await
            .unwrap();
        let second = cache
            .get_or_compute("k", counting(&counter, 8, Duration::ZERO))
            .await
            .unwrap();

        assert_eq!(first, Fetched { lookup: Lookup::Computed, result: Ok(7) });
        assert_eq!(second, Fetched { lookup: Lookup::Hit, result: Ok(7) });
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_is_recomputed() {
        let cache = TestCache::new(Duration::from_secs(60));
        let counter = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_compute("k", counting(&counter, 1, Duration::ZERO))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cache.is_empty());

        let again = cache
            .get_or_compute("k", counting(&counter, 2, Duration::ZERO))
            .await
            .unwrap();
        assert_eq!(again.lookup, Lookup::Computed);
        assert_eq!(again.result, Ok(2));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_computation() {
        let cache = Arc::new(TestCache::new(Duration::from_secs(60)));
        let counter = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let compute = counting(&counter, 42, Duration::from_millis(100));
            handles.push(tokio::spawn(async move {
                cache.get_or_compute("k", compute).await.unwrap()
            }));
        }

        let mut computed = 0;
        for handle in handles {
            let fetched = handle.await.unwrap();
            assert_eq!(fetched.result, Ok(42));
            if fetched.lookup == Lookup::Computed {
                computed += 1;
            }
        }
        assert_eq!(computed, 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(cache.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_shared_but_not_stored() {
        let cache = TestCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        for expected_calls in 1..=2 {
            let calls_in = Arc::clone(&calls);
            let fetched = cache
                .get_or_compute("k", move || async move {
                    calls_in.fetch_add(1, Ordering::SeqCst);
                    Err::<u32, _>(Failed)
                })
                .await
                .unwrap();
            assert_eq!(fetched.result, Err(Failed));
            assert_eq!(calls.load(Ordering::SeqCst), expected_calls);
        }
        assert!(cache.is_empty());
        assert_eq!(cache.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_leader_does_not_cancel_computation() {
        let cache = TestCache::new(Duration::from_secs(60));
        let counter = Arc::new(AtomicUsize::new(0));

        let leader = tokio::time::timeout(
            Duration::from_millis(10),
            cache.get_or_compute("k", counting(&counter, 5, Duration::from_millis(100))),
        )
        .await;
        assert!(leader.is_err(), "leader should have been cancelled");

        let follower = cache
            .get_or_compute("k", counting(&counter, 6, Duration::ZERO))
            .await
            .unwrap();
        assert_eq!(follower.lookup, Lookup::Joined);
        assert_eq!(follower.result, Ok(5));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_cache_stores_nothing() {
        let cache = TestCache::disabled();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let fetched = cache
                .get_or_compute("k", counting(&counter, 3, Duration::ZERO))
                .await
                .unwrap();
            assert_eq!(fetched.lookup, Lookup::Computed);
        }
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert!(!cache.is_enabled());
    }

    #[tokio::test]
    async fn panicking_computation_is_reported_and_retried() {
        let cache = TestCache::new(Duration::from_secs(60));

        let err = cache
            .get_or_compute("k", || async { panic!("boom") })
            .await
            .unwrap_err();
        assert_eq!(err.key, "k");
        assert_eq!(cache.in_flight(), 1);

        let retried = cache
            .get_or_compute("k", || async { Ok::<u32, Failed>(9) })
            .await
            .unwrap();
        assert_eq!(retried.lookup, Lookup::Computed);
        assert_eq!(retried.result, Ok(9));
    }
}
