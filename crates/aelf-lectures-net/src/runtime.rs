//! Async runtime integration.
//!
//! Fetch attempts run as tasks on a tokio runtime. When the caller is already
//! inside a runtime, its handle is used; otherwise a process-wide runtime is
//! created on first use.

use std::future::Future;
use std::sync::OnceLock;

use tokio::runtime::{Handle, Runtime};
use tokio::task::JoinHandle;

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

fn global() -> &'static Runtime {
    RUNTIME.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("aelf-lectures-net")
            .enable_all()
            .build()
            .expect("Failed to create tokio runtime")
    })
}

/// Handle of the runtime tasks should be spawned on.
///
/// The current runtime if there is one, the process-wide runtime otherwise.
pub fn handle() -> Handle {
    Handle::try_current().unwrap_or_else(|_| global().handle().clone())
}

/// Spawn a future on the current runtime, or the process-wide one.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    handle().spawn(future)
}
