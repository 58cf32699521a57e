//! Caching resolver implementation.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use tokio::sync::OnceCell;

use crate::dns::fallback::FallbackTable;
use crate::dns::lookup::{HostLookup, SystemLookup};
use crate::error::{FetchError, Result};

/// Process-wide resolver used by the shared HTTP client.
static SHARED_RESOLVER: OnceLock<CachingResolver> = OnceLock::new();

/// One cache slot per hostname. The cell is filled by the first successful
/// lookup; concurrent callers missing the cache wait on the same cell
/// instead of each racing their own lookup.
type CacheSlot = Arc<OnceCell<Vec<IpAddr>>>;

struct ResolverInner {
    lookup: Arc<dyn HostLookup>,
    fallback: FallbackTable,
    cache: Mutex<HashMap<String, CacheSlot>>,
}

/// Resolver with a process-lifetime cache and a static fallback table.
///
/// The resolver is cheaply cloneable; clones share the same cache. It
/// implements [`reqwest::dns::Resolve`] so it can be installed as the
/// resolver hook of an HTTP client.
///
/// # Example
///
/// ```ignore
/// use aelf_lectures_net::dns::{CachingResolver, SystemLookup};
///
/// let resolver = CachingResolver::new(SystemLookup::new());
///
/// // First call asks the system resolver, second call is a cache hit
/// let first = resolver.resolve("api.app.epitre.co").await?;
/// let second = resolver.resolve("api.app.epitre.co").await?;
/// assert_eq!(first, second);
/// ```
#[derive(Clone)]
pub struct CachingResolver {
    inner: Arc<ResolverInner>,
}

impl CachingResolver {
    /// Create a resolver over `lookup`, with the AELF fallback table.
    pub fn new(lookup: impl HostLookup) -> Self {
        Self {
            inner: Arc::new(ResolverInner {
                lookup: Arc::new(lookup),
                fallback: FallbackTable::aelf(),
                cache: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Create a resolver over the operating system resolver.
    pub fn system() -> Self {
        Self::new(SystemLookup::new())
    }

    /// The process-wide resolver. Created on first use, never torn down.
    pub fn shared() -> Self {
        SHARED_RESOLVER.get_or_init(Self::system).clone()
    }

    /// Replace the fallback table.
    ///
    /// Must be called before the resolver is shared.
    pub fn with_fallback(self, fallback: FallbackTable) -> Self {
        Self {
            inner: Arc::new(ResolverInner {
                lookup: Arc::clone(&self.inner.lookup),
                fallback,
                cache: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// The fallback table consulted when lookups fail.
    pub fn fallback(&self) -> &FallbackTable {
        &self.inner.fallback
    }

    /// Resolve a hostname to IP addresses.
    ///
    /// Cached addresses are returned as is. On a miss the lookup backend is
    /// asked and a successful answer is cached. If the lookup fails, the
    /// fallback table is consulted; its answer is returned but not cached.
    pub async fn resolve(&self, hostname: &str) -> Result<Vec<IpAddr>> {
        if hostname.is_empty() {
            return Err(FetchError::InvalidHostname);
        }

        let slot = {
            let mut cache = self.inner.cache.lock();
            Arc::clone(cache.entry(hostname.to_string()).or_default())
        };

        if let Some(addresses) = slot.get() {
            tracing::debug!(target: "aelf_lectures_net::dns", "Resolved {} from cache", hostname);
            return Ok(addresses.clone());
        }

        let lookup = Arc::clone(&self.inner.lookup);
        let resolved = slot
            .get_or_try_init(|| async move {
                let addresses = lookup.lookup(hostname).await?;
                if addresses.is_empty() {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "lookup returned no addresses",
                    ));
                }
                tracing::debug!(target: "aelf_lectures_net::dns", "Caching {}", hostname);
                Ok(addresses)
            })
            .await;

        match resolved {
            Ok(addresses) => Ok(addresses.clone()),
            Err(err) => {
                self.forget_empty_slot(hostname, &slot);
                tracing::error!(
                    target: "aelf_lectures_net::dns",
                    "Failed to resolve '{}' ({}), attempting fallback to static IP list",
                    hostname,
                    err
                );
                self.inner
                    .fallback
                    .lookup(hostname)
                    .map(<[IpAddr]>::to_vec)
                    .ok_or_else(|| FetchError::UnresolvedHost(hostname.to_string()))
            }
        }
    }

    /// Remove the slot of a host whose lookup failed, unless another caller
    /// filled or replaced it meanwhile.
    fn forget_empty_slot(&self, hostname: &str, slot: &CacheSlot) {
        let mut cache = self.inner.cache.lock();
        let stale = cache
            .get(hostname)
            .is_some_and(|current| Arc::ptr_eq(current, slot) && !current.initialized());
        if stale {
            cache.remove(hostname);
        }
    }

    /// Returns true if both handles share the same cache.
    pub fn ptr_eq(&self, other: &CachingResolver) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Cached addresses for `hostname`, without resolving.
    pub fn cached(&self, hostname: &str) -> Option<Vec<IpAddr>> {
        self.inner
            .cache
            .lock()
            .get(hostname)
            .and_then(|slot| slot.get().cloned())
    }

    /// Number of hostnames with cached addresses.
    pub fn cached_hosts(&self) -> usize {
        self.inner
            .cache
            .lock()
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }
}

impl Resolve for CachingResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let resolver = self.clone();
        Box::pin(async move {
            let addresses = resolver.resolve(name.as_str()).await?;
            // The connector fills in the port.
            let addrs: Addrs = Box::new(
                addresses
                    .into_iter()
                    .map(|ip| SocketAddr::new(ip, 0)),
            );
            Ok::<_, Box<dyn std::error::Error + Send + Sync>>(addrs)
        })
    }
}

impl std::fmt::Debug for CachingResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachingResolver")
            .field("cached_hosts", &self.cached_hosts())
            .field("fallback_hosts", &self.inner.fallback.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::lookup::LookupFuture;

    struct Unreachable;

    impl HostLookup for Unreachable {
        fn lookup(&self, _hostname: &str) -> LookupFuture {
            Box::pin(async {
                Err::<Vec<IpAddr>, _>(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no such host",
                ))
            })
        }
    }

    #[tokio::test]
    async fn test_failed_lookups_leave_no_slots() {
        let resolver = CachingResolver::new(Unreachable);

        for i in 0..16 {
            let host = format!("host{i}.invalid");
            assert!(resolver.resolve(&host).await.is_err());
        }
        // Answered from the fallback table, still not cached
        assert!(resolver.resolve("api.app.epitre.co").await.is_ok());

        assert_eq!(resolver.inner.cache.lock().len(), 0);
        assert_eq!(resolver.cached_hosts(), 0);
    }
}
