//! The fetch controller and its caller-facing handle.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use aelf_lectures_core::{LectureItem, Office, OfficeDate};
use parking_lot::Mutex;
use tokio::task::AbortHandle;
use url::Url;

use super::context::FetchContext;
use super::gate::CompletionGate;
use super::request::FetchRequest;
use crate::error::{FetchError, Result};
use crate::runtime;

/// Retries allowed after the first failed attempt, unless told otherwise.
pub const DEFAULT_RETRY_BUDGET: u32 = 3;

/// Receives the lectures of a successful fetch.
///
/// Called once, on the worker that completed the fetch, after the outcome is
/// recorded and before waiters are released. A listener must not block on
/// the future it is attached to. A panic in the listener is logged and does
/// not change the outcome.
pub trait LectureListener: Send + Sync {
    /// Called with the parsed lectures of `office` on `date`.
    fn on_lectures_loaded(&self, office: Office, date: OfficeDate, lectures: &[LectureItem]);
}

impl<F> LectureListener for F
where
    F: Fn(Office, OfficeDate, &[LectureItem]) + Send + Sync,
{
    fn on_lectures_loaded(&self, office: Office, date: OfficeDate, lectures: &[LectureItem]) {
        self(office, date, lectures)
    }
}

/// The terminal result of a fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The feed was loaded and parsed.
    Loaded(Vec<LectureItem>),
    /// The last attempt failed and no retry was allowed.
    Failed(FetchError),
}

impl FetchOutcome {
    fn to_result(&self) -> Result<Vec<LectureItem>> {
        match self {
            Self::Loaded(items) => Ok(items.clone()),
            Self::Failed(err) => Err(err.clone()),
        }
    }
}

struct ControllerState {
    retry_budget: u32,
    attempts: u32,
    in_flight: Option<AbortHandle>,
    cancelled: bool,
    outcome: Option<FetchOutcome>,
    url: Url,
}

struct Controller {
    office: Office,
    date: OfficeDate,
    context: FetchContext,
    listener: Option<Arc<dyn LectureListener>>,
    state: Mutex<ControllerState>,
    gate: CompletionGate,
}

impl Controller {
    /// Start an attempt for `request`. At most one attempt is in flight:
    /// callers hold the state lock and have cleared the previous attempt.
    fn launch(self: &Arc<Self>, state: &mut ControllerState, request: FetchRequest) {
        tracing::debug!(
            target: "aelf_lectures_net::fetch",
            "Getting {} remaining attempts: {}",
            request.url(),
            state.retry_budget
        );

        state.attempts += 1;
        state.url = request.url().clone();

        let controller = Arc::clone(self);
        let task = runtime::spawn(async move {
            let result = controller.attempt(&request).await;
            controller.on_attempt_finished(result);
        });
        state.in_flight = Some(task.abort_handle());
    }

    async fn attempt(&self, request: &FetchRequest) -> Result<Vec<LectureItem>> {
        let response = self
            .context
            .client()
            .get(request.url().as_str())
            .headers(request.headers())
            .send()
            .await?;
        let body = response.error_for_status()?.bytes().await?;
        Ok(self.context.parser().parse(&body)?)
    }

    fn on_attempt_finished(self: &Arc<Self>, result: Result<Vec<LectureItem>>) {
        // Consulted outside the state lock: the predicate is foreign code.
        let online = result.is_ok() || self.context.network().is_network_available();

        let mut state = self.state.lock();
        state.in_flight = None;

        if state.cancelled || state.outcome.is_some() {
            tracing::debug!(
                target: "aelf_lectures_net::fetch",
                "Discarding late result for {} on {}",
                self.office,
                self.date
            );
            return;
        }

        let err = match result {
            Ok(items) => {
                if items.is_empty() {
                    tracing::warn!(
                        target: "aelf_lectures_net::fetch",
                        "Feed for {} on {} contains no lectures",
                        self.office,
                        self.date
                    );
                } else {
                    tracing::debug!(
                        target: "aelf_lectures_net::fetch",
                        "Loaded {} lectures for {} on {}",
                        items.len(),
                        self.office,
                        self.date
                    );
                }
                state.outcome = Some(FetchOutcome::Loaded(items.clone()));
                drop(state);

                self.notify_listener(&items);
                self.gate.release();
                return;
            }
            Err(err) => err,
        };

        if !err.is_retryable() || state.retry_budget == 0 || !online {
            tracing::warn!(
                target: "aelf_lectures_net::fetch",
                "Failed to load {} on {} after {} attempts (online: {}): {}",
                self.office,
                self.date,
                state.attempts,
                online,
                err
            );
            self.finish(state, err);
            return;
        }

        state.retry_budget -= 1;
        tracing::debug!(
            target: "aelf_lectures_net::fetch",
            "Attempt {} for {} failed, retrying: {}",
            state.attempts,
            state.url,
            err
        );

        // Preferences may have changed since the last attempt.
        match FetchRequest::build(self.context.preferences(), self.office, self.date) {
            Ok(request) => self.launch(&mut state, request),
            Err(build_err) => self.finish(state, build_err),
        }
    }

    /// A panicking listener must not keep waiters from being released.
    fn notify_listener(&self, items: &[LectureItem]) {
        let Some(listener) = &self.listener else {
            return;
        };
        let call = AssertUnwindSafe(|| listener.on_lectures_loaded(self.office, self.date, items));
        if panic::catch_unwind(call).is_err() {
            tracing::error!(
                target: "aelf_lectures_net::fetch",
                "Listener panicked while handling {} on {}",
                self.office,
                self.date
            );
        }
    }

    fn finish(&self, mut state: parking_lot::MutexGuard<'_, ControllerState>, err: FetchError) {
        state.outcome = Some(FetchOutcome::Failed(err));
        drop(state);
        self.gate.release();
    }

    /// The outcome visible to callers, if any.
    fn result(&self) -> Option<Result<Vec<LectureItem>>> {
        let state = self.state.lock();
        if state.cancelled {
            return Some(Err(FetchError::Cancelled));
        }
        state.outcome.as_ref().map(FetchOutcome::to_result)
    }
}

/// Handle to a cancellable, retrying lecture fetch.
///
/// The fetch starts as soon as the handle is created. Clones share the same
/// fetch. Dropping every handle does not cancel it.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use aelf_lectures_core::{Office, OfficeDate};
///
/// let future = context.fetch(Office::Lauds, OfficeDate::today(), 3)?;
///
/// match future.get_timeout(Duration::from_secs(10)) {
///     Ok(lectures) => println!("{} lectures", lectures.len()),
///     Err(FetchError::Timeout) => println!("still loading"),
///     Err(err) => println!("failed: {err}"),
/// }
/// ```
#[derive(Clone)]
pub struct LectureFuture {
    controller: Arc<Controller>,
}

impl LectureFuture {
    /// Build the first request and start it.
    ///
    /// An invalid endpoint fails here, before anything is sent.
    pub(crate) fn start(
        context: FetchContext,
        office: Office,
        date: OfficeDate,
        retry_budget: u32,
        listener: Option<Arc<dyn LectureListener>>,
    ) -> Result<Self> {
        let request = FetchRequest::build(context.preferences(), office, date)?;

        let controller = Arc::new(Controller {
            office,
            date,
            context,
            listener,
            state: Mutex::new(ControllerState {
                retry_budget,
                attempts: 0,
                in_flight: None,
                cancelled: false,
                outcome: None,
                url: request.url().clone(),
            }),
            gate: CompletionGate::new(),
        });

        {
            let mut state = controller.state.lock();
            controller.launch(&mut state, request);
        }

        Ok(Self { controller })
    }

    /// Cancel the fetch.
    ///
    /// Returns `true` if this call cancelled it, `false` if it was already
    /// cancelled or finished. A recorded outcome is never replaced.
    pub fn cancel(&self) -> bool {
        let in_flight = {
            let mut state = self.controller.state.lock();
            if state.cancelled || state.outcome.is_some() {
                return false;
            }
            state.cancelled = true;
            state.in_flight.take()
        };

        if let Some(task) = in_flight {
            task.abort();
        }
        tracing::debug!(
            target: "aelf_lectures_net::fetch",
            "Cancelled {} on {}",
            self.controller.office,
            self.controller.date
        );
        self.controller.gate.release();
        true
    }

    /// Returns true once the fetch has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.controller.state.lock().cancelled
    }

    /// Returns true once the fetch has an outcome or was cancelled.
    pub fn is_done(&self) -> bool {
        let state = self.controller.state.lock();
        state.cancelled || state.outcome.is_some()
    }

    /// The result, if the fetch is done. Never blocks.
    pub fn try_get(&self) -> Option<Result<Vec<LectureItem>>> {
        self.controller.result()
    }

    /// Block the current thread until the fetch is done.
    ///
    /// Must not be called from a tokio worker thread; use [`wait`](Self::wait)
    /// there.
    pub fn get(&self) -> Result<Vec<LectureItem>> {
        if self.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        self.controller.gate.wait();
        self.controller.result().unwrap_or(Err(FetchError::Cancelled))
    }

    /// Block the current thread until the fetch is done or `timeout` elapses.
    ///
    /// A timeout leaves the fetch running; a later call may still succeed.
    pub fn get_timeout(&self, timeout: Duration) -> Result<Vec<LectureItem>> {
        if self.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        if !self.controller.gate.wait_timeout(timeout) {
            return Err(FetchError::Timeout);
        }
        self.controller.result().unwrap_or(Err(FetchError::Timeout))
    }

    /// Wait asynchronously until the fetch is done.
    pub async fn wait(&self) -> Result<Vec<LectureItem>> {
        self.controller.gate.released().await;
        self.controller.result().unwrap_or(Err(FetchError::Cancelled))
    }

    /// Wait asynchronously until the fetch is done or `timeout` elapses.
    pub async fn wait_timeout(&self, timeout: Duration) -> Result<Vec<LectureItem>> {
        tokio::time::timeout(timeout, self.controller.gate.released())
            .await
            .map_err(|_| FetchError::Timeout)?;
        self.controller.result().unwrap_or(Err(FetchError::Timeout))
    }

    /// The requested office.
    pub fn office(&self) -> Office {
        self.controller.office
    }

    /// The requested date.
    pub fn date(&self) -> OfficeDate {
        self.controller.date
    }

    /// Number of attempts started so far.
    pub fn attempts(&self) -> u32 {
        self.controller.state.lock().attempts
    }

    /// Retries still allowed.
    pub fn remaining_retries(&self) -> u32 {
        self.controller.state.lock().retry_budget
    }

    /// URL of the latest attempt.
    pub fn url(&self) -> Url {
        self.controller.state.lock().url.clone()
    }
}

impl fmt::Debug for LectureFuture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.controller.state.lock();
        f.debug_struct("LectureFuture")
            .field("office", &self.controller.office)
            .field("date", &self.controller.date)
            .field("url", &state.url.as_str())
            .field("attempts", &state.attempts)
            .field("remaining_retries", &state.retry_budget)
            .field("cancelled", &state.cancelled)
            .field("outcome", &state.outcome)
            .finish()
    }
}
