//! Network availability.
//!
//! A fetch only retries a failed attempt while the network is available.
//! The check is abstracted behind [`NetworkStatus`] so callers can plug in
//! the platform monitor, a fixed answer, or a closure.
//!
//! # Example
//!
//! ```ignore
//! use aelf_lectures_net::network_info::{NetworkMonitor, NetworkStatus, StaticNetworkStatus};
//!
//! // Interface-based detection
//! let monitor = NetworkMonitor::new();
//! monitor.start()?;
//! println!("online: {}", monitor.is_network_available());
//!
//! // Fixed answer, e.g. for tests
//! let offline = StaticNetworkStatus::new(false);
//! assert!(!offline.is_network_available());
//! ```

mod monitor;

pub use monitor::{NetworkMonitor, NetworkStatus, StaticNetworkStatus, check_online_state};
