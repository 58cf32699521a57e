//! Network change monitoring.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::error::{FetchError, Result};

/// Answers whether the device currently has network connectivity.
///
/// Consulted by a fetch before it retries a failed attempt: retrying while
/// offline would only burn the retry budget.
pub trait NetworkStatus: Send + Sync {
    /// Returns true if the network appears to be available.
    fn is_network_available(&self) -> bool;
}

impl<F> NetworkStatus for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_network_available(&self) -> bool {
        self()
    }
}

/// Network status with a manually controlled state.
#[derive(Debug)]
pub struct StaticNetworkStatus {
    online: AtomicBool,
}

impl StaticNetworkStatus {
    /// Create a status reporting `online`.
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    /// Change the reported state.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl Default for StaticNetworkStatus {
    fn default() -> Self {
        Self::new(true)
    }
}

impl NetworkStatus for StaticNetworkStatus {
    fn is_network_available(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

type OnlineListener = Arc<dyn Fn(bool) + Send + Sync>;

/// Tracks whether the system is online by watching interface changes.
///
/// The online state is derived from the interface list: the system is
/// online when at least one non-loopback interface is up and has an
/// address. Until [`start`](Self::start) is called the state is sampled
/// once, at creation.
///
/// # Example
///
/// ```ignore
/// use aelf_lectures_net::network_info::NetworkMonitor;
///
/// let monitor = NetworkMonitor::new();
/// monitor.on_change(|online| {
///     println!("Network is now {}", if online { "online" } else { "offline" });
/// });
/// monitor.start()?;
/// ```
pub struct NetworkMonitor {
    inner: Arc<Mutex<MonitorInner>>,
}

struct MonitorInner {
    /// Whether monitoring is active.
    is_running: bool,
    /// Current online state.
    is_online: bool,
    listeners: Vec<OnlineListener>,
    /// Handle to stop the watcher (drop to stop).
    watcher_handle: Option<netwatcher::WatchHandle>,
}

impl NetworkMonitor {
    /// Create a new network monitor.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MonitorInner {
                is_running: false,
                is_online: check_online_state(),
                listeners: Vec::new(),
                watcher_handle: None,
            })),
        }
    }

    /// Check if the network is currently online.
    pub fn is_online(&self) -> bool {
        self.inner.lock().is_online
    }

    /// Register a callback invoked with the new state when it changes.
    pub fn on_change<F>(&self, callback: F)
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.inner.lock().listeners.push(Arc::new(callback));
    }

    /// Start watching for interface changes.
    pub fn start(&self) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }

        // netwatcher may invoke the callback before returning, so the lock
        // must not be held across the call.
        let state = Arc::clone(&self.inner);
        let handle = netwatcher::watch_interfaces(move |_update| {
            let online = check_online_state();

            let listeners = {
                let mut guard = state.lock();
                if guard.is_online == online {
                    return;
                }
                guard.is_online = online;
                guard.listeners.clone()
            };

            tracing::info!(
                target: "aelf_lectures_net::network_info",
                "Network is now {}",
                if online { "online" } else { "offline" }
            );
            // Listeners run without the lock held.
            for listener in listeners {
                listener(online);
            }
        })
        .map_err(|e| FetchError::Client(format!("Failed to watch interfaces: {e}")))?;

        let mut inner = self.inner.lock();
        if inner.is_running {
            // Lost a race with a concurrent start; keep the first watcher.
            drop(inner);
            drop(handle);
            return Ok(());
        }
        inner.watcher_handle = Some(handle);
        inner.is_running = true;

        Ok(())
    }

    /// Stop watching for interface changes.
    pub fn stop(&self) {
        let handle = {
            let mut inner = self.inner.lock();
            inner.is_running = false;
            inner.watcher_handle.take()
        };
        // Dropping the handle may wait for an in-flight callback, which
        // takes the lock.
        drop(handle);
    }

    /// Check if the monitor is currently running.
    pub fn is_running(&self) -> bool {
        self.inner.lock().is_running
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for NetworkMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

impl NetworkStatus for NetworkMonitor {
    fn is_network_available(&self) -> bool {
        if self.is_running() {
            self.is_online()
        } else {
            check_online_state()
        }
    }
}

impl std::fmt::Debug for NetworkMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("NetworkMonitor")
            .field("is_running", &inner.is_running)
            .field("is_online", &inner.is_online)
            .finish()
    }
}

/// Check if the system appears to be online.
///
/// Returns `true` if there's at least one non-loopback interface
/// that is up and has at least one IP address assigned.
pub fn check_online_state() -> bool {
    netdev::get_interfaces().iter().any(|iface| {
        iface.is_up() && !iface.is_loopback() && (!iface.ipv4.is_empty() || !iface.ipv6.is_empty())
    })
}
