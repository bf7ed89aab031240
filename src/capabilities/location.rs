//! Device geolocation capability.
//!
//! The shell owns the actual positioning API; the core only describes what
//! kind of fix it wants and receives either a fix or a typed failure.

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How hard the shell should try for a fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixOptions {
    pub high_accuracy: bool,
    pub timeout_ms: u64,
    pub maximum_age_ms: u64,
}

impl FixOptions {
    /// High-accuracy fix, short wait, no cached positions.
    #[must_use]
    pub const fn precise() -> Self {
        Self {
            high_accuracy: true,
            timeout_ms: 10_000,
            maximum_age_ms: 0,
        }
    }

    /// Battery-friendly fix, longer wait, accepting a recent cached position.
    #[must_use]
    pub const fn coarse() -> Self {
        Self {
            high_accuracy: false,
            timeout_ms: 20_000,
            maximum_age_ms: 60_000,
        }
    }
}

impl Default for FixOptions {
    fn default() -> Self {
        Self::precise()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationOperation {
    CurrentPosition(FixOptions),
}

impl Operation for LocationOperation {
    type Output = LocationResult;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceFix {
    pub lat: f64,
    pub lon: f64,
    pub accuracy_m: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum LocationError {
    #[error("geolocation is not supported on this device")]
    Unsupported,
    #[error("location permission denied")]
    PermissionDenied,
    #[error("timed out waiting for a position fix")]
    Timeout,
    #[error("could not determine position: {reason}")]
    Unavailable { reason: String },
}

pub type LocationResult = Result<DeviceFix, LocationError>;

pub struct Location<Ev> {
    context: CapabilityContext<LocationOperation, Ev>,
}

impl<Ev> Capability<Ev> for Location<Ev> {
    type Operation = LocationOperation;
    type MappedSelf<MappedEv> = Location<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Location::new(self.context.map_event(f))
    }
}

impl<Ev> Location<Ev>
where
    Ev: 'static,
{
    #[must_use]
    pub fn new(context: CapabilityContext<LocationOperation, Ev>) -> Self {
        Self { context }
    }

    /// Request a single position fix with a bounded wait.
    pub fn current_position<F>(&self, options: FixOptions, make_event: F)
    where
        Ev: Send,
        F: FnOnce(LocationResult) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = ctx
                .request_from_shell(LocationOperation::CurrentPosition(options))
                .await;
            ctx.update_app(make_event(result));
        });
    }
}
