//! Static fallback addresses.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};

/// Hosts of the AELF API.
const AELF_HOSTS: [&str; 2] = ["api.app.epitre.co", "beta.api.app.epitre.co"];

/// Servers able to answer for the AELF API hosts.
const AELF_ADDRESSES: [IpAddr; 3] = [
    IpAddr::V4(Ipv4Addr::new(149, 202, 174, 110)), // vps-aelf.epitre.co
    IpAddr::V4(Ipv4Addr::new(164, 132, 231, 241)), // sbg-01.prod.epitre.co
    IpAddr::V4(Ipv4Addr::new(51, 255, 39, 30)),    // gra-01.prod.epitre.co
];

/// Immutable hostname to address table, used when name resolution fails.
///
/// Lookups are exact, case-sensitive matches on the hostname.
#[derive(Debug, Clone, Default)]
pub struct FallbackTable {
    entries: HashMap<String, Vec<IpAddr>>,
}

impl FallbackTable {
    /// A table with no entries: every resolution failure propagates.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The compiled-in table for the AELF API hosts.
    pub fn aelf() -> Self {
        Self::from_entries(
            AELF_HOSTS
                .iter()
                .map(|host| (host.to_string(), AELF_ADDRESSES.to_vec())),
        )
    }

    /// Build a table from explicit entries.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, Vec<IpAddr>)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Fallback addresses for `hostname`, if it is a known host.
    pub fn lookup(&self, hostname: &str) -> Option<&[IpAddr]> {
        self.entries.get(hostname).map(Vec::as_slice)
    }

    /// Number of known hosts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
