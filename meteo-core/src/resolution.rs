//! The city-to-weather resolution sequence.
//!
//! A [`Resolver`] chains a [`Geocoder`] and a [`WeatherSource`] and publishes
//! every state transition on a `watch` channel. Each attempt gets a
//! monotonically increasing number; only the most recent attempt may write a
//! terminal state, and starting a new attempt cancels the one in flight.

use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::{
    config::{Config, Messages},
    error::{Failure, FailureKind, LookupError},
    model::{DescriptionStyle, DisplayResult, Query},
    provider::{Geocoder, WeatherSource},
};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum ResolutionState {
    #[default]
    Idle,
    Loading,
    Success(DisplayResult),
    Failed(Failure),
}

impl ResolutionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, ResolutionState::Loading)
    }

    pub fn result(&self) -> Option<&DisplayResult> {
        match self {
            ResolutionState::Success(result) => Some(result),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            ResolutionState::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// What a single attempt produced, and whether it reached the visible state.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub attempt: u64,
    pub state: ResolutionState,
    /// False when a newer attempt started before this one finished.
    pub applied: bool,
}

#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub style: DescriptionStyle,
    pub messages: Messages,
    pub timeout: Duration,
}

impl ResolverSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            style: config.description_style,
            messages: config.messages.clone(),
            timeout: config.request_timeout(),
        }
    }
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[derive(Debug, Default)]
struct InFlight {
    latest: u64,
    token: Option<CancellationToken>,
}

/// One running attempt. Dropping it unfinished (the `resolve` future was
/// dropped mid-flight) puts a still-current attempt back to `Idle`.
struct Attempt<'a> {
    number: u64,
    token: CancellationToken,
    in_flight: &'a Mutex<InFlight>,
    state: &'a watch::Sender<ResolutionState>,
    finished: bool,
}

impl Attempt<'_> {
    /// Publish `state` if this is still the latest attempt.
    fn finish(mut self, state: &ResolutionState) -> bool {
        self.finished = true;
        self.settle(state.clone())
    }

    fn settle(&self, state: ResolutionState) -> bool {
        let mut in_flight = self.in_flight.lock();
        if in_flight.latest != self.number {
            debug!(
                attempt = self.number,
                latest = in_flight.latest,
                "Discarding stale resolution"
            );
            return false;
        }

        in_flight.token = None;
        self.state.send_replace(state);
        true
    }
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        if !self.finished {
            debug!(attempt = self.number, "Resolution dropped before completion");
            self.settle(ResolutionState::Idle);
        }
    }
}

#[derive(Debug)]
pub struct Resolver<G, W> {
    geocoder: G,
    weather: W,
    settings: ResolverSettings,
    state: watch::Sender<ResolutionState>,
    in_flight: Mutex<InFlight>,
}

impl<G: Geocoder, W: WeatherSource> Resolver<G, W> {
    pub fn new(geocoder: G, weather: W, settings: ResolverSettings) -> Self {
        let (state, _) = watch::channel(ResolutionState::Idle);
        Self {
            geocoder,
            weather,
            settings,
            state,
            in_flight: Mutex::new(InFlight::default()),
        }
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    pub fn geocoder(&self) -> &G {
        &self.geocoder
    }

    pub fn weather(&self) -> &W {
        &self.weather
    }

    /// Snapshot of the visible state.
    pub fn state(&self) -> ResolutionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ResolutionState> {
        self.state.subscribe()
    }

    /// Run one attempt for `raw`. Blank input is ignored and returns `None`
    /// without touching the state.
    #[instrument(skip(self), level = "debug")]
    pub async fn resolve(&self, raw: &str) -> Option<Outcome> {
        let query = Query::parse(raw)?;
        let attempt = self.begin();
        let token = attempt.token.clone();

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => Err(LookupError::Cancelled),
            res = tokio::time::timeout(self.settings.timeout, self.lookup(&query)) => {
                res.unwrap_or(Err(LookupError::Timeout))
            }
        };

        let state = match result {
            Ok(display) => ResolutionState::Success(display),
            Err(err) => {
                warn!(
                    attempt = attempt.number,
                    query = %query,
                    error = %err,
                    "Resolution failed"
                );
                ResolutionState::Failed(self.failure_for(&err))
            }
        };

        let number = attempt.number;
        let applied = attempt.finish(&state);
        Some(Outcome {
            attempt: number,
            state,
            applied,
        })
    }

    /// Abort the in-flight attempt, if any. The visible state goes back to
    /// `Idle` when an attempt was actually loading.
    pub fn cancel(&self) {
        let mut in_flight = self.in_flight.lock();
        if let Some(token) = in_flight.token.take() {
            token.cancel();
            // Anything still running is now stale.
            in_flight.latest += 1;
            self.state.send_replace(ResolutionState::Idle);
            debug!("In-flight resolution cancelled");
        }
    }

    async fn lookup(&self, query: &Query) -> Result<DisplayResult, LookupError> {
        let location = self
            .geocoder
            .search(query)
            .await?
            .ok_or(LookupError::NotFound)?;

        debug!(
            "Found location: {} ({:.4}, {:.4})",
            location.label(),
            location.latitude,
            location.longitude
        );

        let observation = self
            .weather
            .current(location.latitude, location.longitude)
            .await?;

        Ok(DisplayResult::new(&location, &observation, self.settings.style))
    }

    fn begin(&self) -> Attempt<'_> {
        let mut in_flight = self.in_flight.lock();
        in_flight.latest += 1;

        let token = CancellationToken::new();
        if let Some(previous) = in_flight.token.replace(token.clone()) {
            previous.cancel();
        }

        // Prior result and failure are dropped before any client call.
        self.state.send_replace(ResolutionState::Loading);
        Attempt {
            number: in_flight.latest,
            token,
            in_flight: &self.in_flight,
            state: &self.state,
            finished: false,
        }
    }

    fn failure_for(&self, err: &LookupError) -> Failure {
        let kind = err.kind();
        let message = match kind {
            FailureKind::NotFound => self.settings.messages.not_found.clone(),
            _ => self.settings.messages.generic.clone(),
        };
        Failure { kind, message }
    }
}
