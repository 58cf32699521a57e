//! DNS resolution for AELF Lectures.
//!
//! Name resolution goes through a [`CachingResolver`], which is plugged into
//! the shared HTTP client as its resolver hook. It resolves in three tiers:
//!
//! 1. **Cache**: addresses confirmed by a previous successful lookup. Entries
//!    live for the whole process and are never invalidated.
//! 2. **System lookup**: a [`HostLookup`] backend, by default the operating
//!    system resolver ([`SystemLookup`]). Successful results are cached.
//! 3. **Fallback table**: a compiled-in [`FallbackTable`] for the AELF API
//!    hosts, consulted only when the lookup fails. Fallback answers are not
//!    cached, so the system resolver is tried again on the next call.
//!
//! # Example
//!
//! ```ignore
//! use aelf_lectures_net::dns::{CachingResolver, FallbackTable, SystemLookup};
//!
//! let resolver = CachingResolver::new(SystemLookup::new())
//!     .with_fallback(FallbackTable::aelf());
//!
//! let addresses = resolver.resolve("api.app.epitre.co").await?;
//! println!("Resolved addresses: {:?}", addresses);
//! ```
//!
//! # Configuration
//!
//! A hickory-based lookup can replace the system resolver:
//!
//! ```ignore
//! use aelf_lectures_net::dns::{CachingResolver, DnsConfig, HickoryLookup, IpStrategy};
//!
//! let config = DnsConfig::cloudflare().ip_strategy(IpStrategy::Ipv4ThenIpv6);
//! let resolver = CachingResolver::new(HickoryLookup::new(config)?);
//! ```

mod config;
mod fallback;
mod lookup;
mod resolver;

pub use config::{DnsConfig, IpStrategy};
pub use fallback::FallbackTable;
pub use lookup::{HickoryLookup, HostLookup, LookupFuture, SystemLookup};
pub use resolver::CachingResolver;
