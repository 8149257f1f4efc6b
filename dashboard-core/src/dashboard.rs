//! Orchestrates one displayed location: fetch, publish, refresh.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::{sync::watch, task::AbortHandle};
use tracing::{debug, warn};

use crate::{
    error::WeatherError,
    model::{UserLocation, WeatherSnapshot},
    provider::WeatherProvider,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Idle,
    Loading {
        location: UserLocation,
    },
    Ready {
        location: UserLocation,
        snapshot: Arc<WeatherSnapshot>,
        fetched_at: DateTime<Utc>,
    },
    Failed {
        location: UserLocation,
        message: String,
        retryable: bool,
    },
}

impl ViewState {
    pub fn name(&self) -> &'static str {
        match self {
            ViewState::Idle => "idle",
            ViewState::Loading { .. } => "loading",
            ViewState::Ready { .. } => "ready",
            ViewState::Failed { .. } => "failed",
        }
    }

    pub fn location(&self) -> Option<&UserLocation> {
        match self {
            ViewState::Idle => None,
            ViewState::Loading { location }
            | ViewState::Ready { location, .. }
            | ViewState::Failed { location, .. } => Some(location),
        }
    }
}

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Weather(#[from] WeatherError),

    /// A newer load replaced this one before it finished.
    #[error("Request superseded by a newer location")]
    Superseded,

    #[error("Nothing to refresh while the dashboard is {0}")]
    NotRefreshable(&'static str),
}

/// Drives `Idle -> Loading -> Ready | Failed` for the active location.
///
/// Only the most recent [`load`](Self::load) may publish state; older in-flight
/// fetches are aborted and their callers get [`DashboardError::Superseded`].
/// The fetch task publishes its own result, so dropping a `load` future does
/// not leave the dashboard in `Loading`.
#[derive(Debug)]
pub struct Dashboard {
    provider: Arc<dyn WeatherProvider>,
    shared: Arc<Shared>,
    /// Generation and abort handle of the newest spawned fetch.
    in_flight: Mutex<Option<(u64, AbortHandle)>>,
}

#[derive(Debug)]
struct Shared {
    state: watch::Sender<ViewState>,
    generation: AtomicU64,
}

impl Shared {
    /// Replace the state only if `generation` is still the newest load.
    ///
    /// Checked under the channel's write lock so a newer load cannot interleave.
    fn publish(&self, generation: u64, next: impl FnOnce() -> ViewState) -> bool {
        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *state = next();
            true
        })
    }
}

impl Dashboard {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        let (state, _) = watch::channel(ViewState::Idle);
        Self {
            provider,
            shared: Arc::new(Shared { state, generation: AtomicU64::new(0) }),
            in_flight: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.shared.state.subscribe()
    }

    pub fn state(&self) -> ViewState {
        self.shared.state.borrow().clone()
    }

    pub async fn load(&self, location: UserLocation) -> Result<Arc<WeatherSnapshot>, DashboardError> {
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.publish(generation, || ViewState::Loading { location: location.clone() });
        debug!(generation, lat = location.lat, lon = location.lon, "loading dashboard");

        let provider = self.provider.clone();
        let shared = self.shared.clone();
        let task = tokio::spawn(async move {
            let outcome = provider.fetch_weather(location.lat, location.lon).await.map(Arc::new);

            let published = shared.publish(generation, || match &outcome {
                Ok(snapshot) => ViewState::Ready {
                    location: location.clone(),
                    snapshot: snapshot.clone(),
                    fetched_at: Utc::now(),
                },
                Err(err) => ViewState::Failed {
                    location: location.clone(),
                    message: err.to_string(),
                    retryable: err.is_retryable(),
                },
            });

            if !published {
                debug!(generation, "discarding result for superseded location");
            } else if let Err(err) = &outcome {
                warn!(error = %err, "weather fetch failed");
            }
            (outcome, published)
        });

        {
            let mut in_flight = self.in_flight.lock();
            match in_flight.as_ref() {
                // A newer load registered first; this one is already stale.
                Some((newer, _)) if *newer > generation => task.abort(),
                _ => {
                    if let Some((_, stale)) = in_flight.replace((generation, task.abort_handle())) {
                        stale.abort();
                    }
                }
            }
        }

        match task.await {
            Ok((outcome, true)) => outcome.map_err(DashboardError::from),
            Ok((_, false)) => Err(DashboardError::Superseded),
            Err(err) if err.is_cancelled() => Err(DashboardError::Superseded),
            Err(err) => std::panic::resume_unwind(err.into_panic()),
        }
    }

    /// Re-fetch the location shown in `Ready` or `Failed`.
    pub async fn refresh(&self) -> Result<Arc<WeatherSnapshot>, DashboardError> {
        let location = match &*self.shared.state.borrow() {
            ViewState::Ready { location, .. } | ViewState::Failed { location, .. } => {
                location.clone()
            }
            other => return Err(DashboardError::NotRefreshable(other.name())),
        };
        self.load(location).await
    }
}
