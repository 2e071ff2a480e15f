//! Single-flight token refresh.
//!
//! At most one refresh call is outstanding at any time. Callers arriving
//! while it runs subscribe to its outcome instead of issuing their own call.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tally_domain::{AuthError, LoginResponse};
use tokio::sync::watch;

/// Result of one refresh call, shared by every waiter.
pub type RefreshOutcome = Result<LoginResponse, AuthError>;

type Publication = watch::Receiver<Option<RefreshOutcome>>;
type Slot = Arc<Mutex<Option<Publication>>>;

/// Coordinates concurrent refresh requests.
///
/// The slot is only locked for short, synchronous sections and never across
/// an await point.
#[derive(Clone, Default)]
pub struct RefreshCoordinator {
    in_flight: Slot,
}

impl RefreshCoordinator {
    /// Creates an idle coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while a refresh call is outstanding.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.lock().is_some()
    }

    /// Runs `refresh` unless a refresh is already in flight, then waits for
    /// the shared outcome.
    ///
    /// The refresh future runs on its own task: dropping the returned future
    /// stops the wait, not the network call.
    pub async fn run<F, Fut>(&self, refresh: F) -> RefreshOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RefreshOutcome> + Send + 'static,
    {
        let (mut publication, flight) = self.join();

        if let Some(flight) = flight {
            let refresh = refresh();
            tokio::spawn(async move {
                let outcome = refresh.await;
                flight.complete(outcome);
            });
        } else {
            tracing::debug!("Refresh already in flight, waiting for its outcome");
        }

        Self::wait(&mut publication).await
    }

    /// Subscribes to the in-flight refresh, or opens a new one.
    ///
    /// Returns a [`Flight`] only to the caller that opened it.
    fn join(&self) -> (Publication, Option<Flight>) {
        let mut slot = self.in_flight.lock();
        if let Some(publication) = slot.as_ref() {
            return (publication.clone(), None);
        }

        let (sender, publication) = watch::channel(None);
        *slot = Some(publication.clone());
        let flight = Flight {
            slot: Arc::clone(&self.in_flight),
            sender: Some(sender),
        };
        (publication, Some(flight))
    }

    async fn wait(publication: &mut Publication) -> RefreshOutcome {
        match publication.wait_for(Option::is_some).await {
            Ok(outcome) => (*outcome).clone().unwrap_or(Err(AuthError::RefreshAborted)),
            Err(_) => Err(AuthError::RefreshAborted),
        }
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("in_flight", &self.is_in_flight())
            .finish()
    }
}

/// Ownership of the in-flight slot, held by the task running the refresh.
///
/// Dropping it without completing (a panic, or runtime shutdown) clears the
/// slot and closes the channel, so waiters see [`AuthError::RefreshAborted`].
struct Flight {
    slot: Slot,
    sender: Option<watch::Sender<Option<RefreshOutcome>>>,
}

impl Flight {
    fn complete(mut self, outcome: RefreshOutcome) {
        self.slot.lock().take();
        if let Some(sender) = self.sender.take() {
            sender.send_replace(Some(outcome));
        }
    }
}

impl Drop for Flight {
    fn drop(&mut self) {
        if self.sender.is_some() {
            tracing::warn!("Refresh ended without an outcome");
            self.slot.lock().take();
        }
    }
}
