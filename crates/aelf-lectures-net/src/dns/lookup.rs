//! Lookup backends used by the caching resolver.

use std::io;
use std::net::{IpAddr, ToSocketAddrs};
use std::sync::Arc;

use futures_util::future::BoxFuture;
use hickory_resolver::config::{
    LookupIpStrategy, NameServerConfig, ResolveHosts, ResolverConfig, ResolverOpts,
};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::xfer::Protocol;
use hickory_resolver::{Resolver, TokioResolver};

use crate::dns::config::{DnsConfig, IpStrategy};
use crate::error::{FetchError, Result};

/// Future returned by a [`HostLookup`].
pub type LookupFuture = BoxFuture<'static, io::Result<Vec<IpAddr>>>;

/// A name resolution backend.
///
/// Returns the addresses for a hostname in preference order. An empty
/// answer is treated as a failure by the caching resolver.
pub trait HostLookup: Send + Sync + 'static {
    /// Resolve `hostname` to IP addresses.
    fn lookup(&self, hostname: &str) -> LookupFuture;
}

impl<L: HostLookup + ?Sized> HostLookup for Arc<L> {
    fn lookup(&self, hostname: &str) -> LookupFuture {
        (**self).lookup(hostname)
    }
}

/// Operating system resolver (`getaddrinfo`), run on the blocking pool.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemLookup;

impl SystemLookup {
    /// Create a new system lookup.
    pub fn new() -> Self {
        Self
    }
}

impl HostLookup for SystemLookup {
    fn lookup(&self, hostname: &str) -> LookupFuture {
        let host = hostname.to_string();
        Box::pin(async move {
            let addresses = tokio::task::spawn_blocking(move || {
                (host.as_str(), 0u16).to_socket_addrs().map(|addrs| {
                    let mut ips: Vec<IpAddr> = Vec::new();
                    for addr in addrs {
                        if !ips.contains(&addr.ip()) {
                            ips.push(addr.ip());
                        }
                    }
                    ips
                })
            })
            .await
            .map_err(io::Error::other)??;

            if addresses.is_empty() {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    "no addresses returned by getaddrinfo",
                ));
            }
            Ok(addresses)
        })
    }
}

/// Lookup backed by hickory-resolver, querying nameservers directly.
#[derive(Clone)]
pub struct HickoryLookup {
    resolver: TokioResolver,
}

impl HickoryLookup {
    /// Create a hickory lookup with the given configuration.
    pub fn new(config: DnsConfig) -> Result<Self> {
        let (resolver_config, resolver_opts) = build_resolver_config(&config)?;

        let resolver =
            Resolver::builder_with_config(resolver_config, TokioConnectionProvider::default())
                .with_options(resolver_opts)
                .build();

        Ok(Self { resolver })
    }
}

impl HostLookup for HickoryLookup {
    fn lookup(&self, hostname: &str) -> LookupFuture {
        let resolver = self.resolver.clone();
        let host = hostname.to_string();
        Box::pin(async move {
            let response = resolver
                .lookup_ip(host.as_str())
                .await
                .map_err(|e| io::Error::new(io::ErrorKind::NotFound, e.to_string()))?;
            let addresses: Vec<IpAddr> = response.iter().collect();
            Ok(addresses)
        })
    }
}

impl std::fmt::Debug for HickoryLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HickoryLookup").finish_non_exhaustive()
    }
}

/// Build hickory resolver configuration from our DnsConfig.
fn build_resolver_config(config: &DnsConfig) -> Result<(ResolverConfig, ResolverOpts)> {
    let resolver_config = if config.use_system_config {
        ResolverConfig::default()
    } else if config.nameservers.is_empty() {
        return Err(FetchError::Client("No nameservers configured".to_string()));
    } else {
        let mut resolver_config = ResolverConfig::new();
        for addr in &config.nameservers {
            resolver_config.add_name_server(NameServerConfig::new(*addr, Protocol::Udp));
            resolver_config.add_name_server(NameServerConfig::new(*addr, Protocol::Tcp));
        }
        resolver_config
    };

    let mut opts = ResolverOpts::default();

    // The caching resolver above this backend is the only cache.
    opts.cache_size = 0;

    opts.use_hosts_file = if config.use_hosts_file {
        ResolveHosts::Auto
    } else {
        ResolveHosts::Never
    };
    opts.attempts = config.attempts;
    opts.timeout = config.timeout;

    opts.ip_strategy = match config.ip_strategy {
        IpStrategy::Ipv4Only => LookupIpStrategy::Ipv4Only,
        IpStrategy::Ipv6Only => LookupIpStrategy::Ipv6Only,
        IpStrategy::Ipv4ThenIpv6 => LookupIpStrategy::Ipv4thenIpv6,
        IpStrategy::Ipv6ThenIpv4 => LookupIpStrategy::Ipv6thenIpv4,
        IpStrategy::Ipv4AndIpv6 => LookupIpStrategy::Ipv4AndIpv6,
    };

    Ok((resolver_config, opts))
}
