#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod app;
pub mod assistant;
pub mod capabilities;
pub mod draft;
pub mod geocode;
pub mod registry;
pub mod submission;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use api::{Report, ReportId};
pub use app::{App, CoreConfig, Event, LocationPolicy, Model, ViewModel};
pub use capabilities::{Capabilities, Effect};
pub use draft::{LocationResolution, PhotoAttachment, ReportDraft};
pub use registry::{ReportsRegistry, StatusFilter};
pub use submission::{SubmissionController, SubmitPhase};

/// Minimum number of characters a reporter phone number must carry.
pub const MIN_PHONE_LEN: usize = 10;

/// Decimal places used when a coordinate pair stands in for a place name.
pub const COORD_LABEL_PRECISION: usize = 6;

/// Key under which the in-progress draft is persisted between sessions.
pub const DRAFT_STORE_KEY: &str = "report_draft_v1";

pub const DEFAULT_API_BASE: &str = "http://localhost:5000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Validation,
    Geolocation,
    Geocoding,
    Submission,
    Load,
    StatusUpdate,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::Geolocation => "LOCATION_ERROR",
            Self::Geocoding => "GEOCODING_ERROR",
            Self::Submission => "SUBMISSION_ERROR",
            Self::Load => "LOAD_ERROR",
            Self::StatusUpdate => "STATUS_UPDATE_ERROR",
        }
    }
}

/// User-visible failure. Every network-boundary error is converted into one
/// of these at the component boundary; none propagate as panics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    #[must_use]
    pub fn submission(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Submission, message)
    }

    #[must_use]
    pub fn load(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Load, message)
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)
    }
}

impl std::error::Error for AppError {}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CoordinateError {
    #[error("latitude {0} is out of valid range [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is out of valid range [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("coordinate value is not finite")]
    NonFinite,
}

impl From<CoordinateError> for AppError {
    fn from(e: CoordinateError) -> Self {
        AppError::new(ErrorKind::Validation, e.to_string())
    }
}

/// A raw latitude/longitude pair as produced by a device fix or typed input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn validate(self) -> Result<ValidatedCoordinate, CoordinateError> {
        ValidatedCoordinate::new(self.lat, self.lon)
    }

    #[must_use]
    pub fn same_point(self, other: Self) -> bool {
        self.lat.to_bits() == other.lat.to_bits() && self.lon.to_bits() == other.lon.to_bits()
    }
}

/// A coordinate pair proven finite and in range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidatedCoordinate {
    lat: f64,
    lon: f64,
}

impl ValidatedCoordinate {
    pub fn new(lat: f64, lon: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(CoordinateError::NonFinite);
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(CoordinateError::LongitudeOutOfRange(lon));
        }
        Ok(Self { lat, lon })
    }

    #[must_use]
    pub const fn lat(self) -> f64 {
        self.lat
    }

    #[must_use]
    pub const fn lon(self) -> f64 {
        self.lon
    }
}

impl TryFrom<LatLon> for ValidatedCoordinate {
    type Error = CoordinateError;

    fn try_from(value: LatLon) -> Result<Self, Self::Error> {
        Self::new(value.lat, value.lon)
    }
}

impl From<ValidatedCoordinate> for LatLon {
    fn from(coord: ValidatedCoordinate) -> Self {
        Self {
            lat: coord.lat,
            lon: coord.lon,
        }
    }
}

/// Rescue lifecycle of a report. The server is the authority; the client
/// only ever applies a transition after the server has acknowledged it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    #[default]
    Pending,
    OnTheWay,
    Resolved,
}

impl ReportStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::OnTheWay => "ON_THE_WAY",
            Self::Resolved => "RESOLVED",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::OnTheWay => "On the way",
            Self::Resolved => "Resolved",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved)
    }

    const fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::OnTheWay => 1,
            Self::Resolved => 2,
        }
    }

    /// Status only moves forward; skipping ahead (pending straight to
    /// resolved) is allowed, regression is not.
    #[must_use]
    pub const fn can_advance_to(self, to: Self) -> bool {
        self.rank() < to.rank()
    }

    #[must_use]
    pub fn valid_transitions(self) -> Vec<Self> {
        [Self::Pending, Self::OnTheWay, Self::Resolved]
            .into_iter()
            .filter(|next| self.can_advance_to(*next))
            .collect()
    }

    pub fn validate_transition(self, to: Self) -> Result<(), TransitionError> {
        if self == to {
            return Err(TransitionError::SameStatus);
        }
        if self.is_terminal() {
            return Err(TransitionError::FromTerminalStatus { status: self });
        }
        if !self.can_advance_to(to) {
            return Err(TransitionError::InvalidTransition { from: self, to });
        }
        Ok(())
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("report already has that status")]
    SameStatus,
    #[error("cannot change a report that is already {status}")]
    FromTerminalStatus { status: ReportStatus },
    #[error("cannot move a report from {from} back to {to}")]
    InvalidTransition {
        from: ReportStatus,
        to: ReportStatus,
    },
}

impl From<TransitionError> for AppError {
    fn from(e: TransitionError) -> Self {
        AppError::new(ErrorKind::StatusUpdate, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn status_wire_names_round_trip() {
        for status in [
            ReportStatus::Pending,
            ReportStatus::OnTheWay,
            ReportStatus::Resolved,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            let back: ReportStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(back, status);
        }
    }

    #[test]
    fn pending_can_skip_straight_to_resolved() {
        assert!(ReportStatus::Pending.can_advance_to(ReportStatus::Resolved));
        assert_eq!(
            ReportStatus::Pending.valid_transitions(),
            vec![ReportStatus::OnTheWay, ReportStatus::Resolved]
        );
        assert_eq!(
            ReportStatus::OnTheWay.valid_transitions(),
            vec![ReportStatus::Resolved]
        );
        assert!(ReportStatus::Resolved.valid_transitions().is_empty());
    }

    #[test]
    fn regressions_are_rejected() {
        assert_eq!(
            ReportStatus::Resolved.validate_transition(ReportStatus::Pending),
            Err(TransitionError::FromTerminalStatus {
                status: ReportStatus::Resolved
            })
        );
        assert_eq!(
            ReportStatus::OnTheWay.validate_transition(ReportStatus::Pending),
            Err(TransitionError::InvalidTransition {
                from: ReportStatus::OnTheWay,
                to: ReportStatus::Pending,
            })
        );
        assert_eq!(
            ReportStatus::OnTheWay.validate_transition(ReportStatus::OnTheWay),
            Err(TransitionError::SameStatus)
        );
    }

    #[test]
    fn coordinates_are_range_checked() {
        assert!(ValidatedCoordinate::new(28.6139, 77.209).is_ok());
        assert_eq!(
            ValidatedCoordinate::new(91.0, 0.0),
            Err(CoordinateError::LatitudeOutOfRange(91.0))
        );
        assert_eq!(
            ValidatedCoordinate::new(0.0, -180.5),
            Err(CoordinateError::LongitudeOutOfRange(-180.5))
        );
        assert_eq!(
            ValidatedCoordinate::new(f64::NAN, 0.0),
            Err(CoordinateError::NonFinite)
        );
    }

    proptest! {
        #[test]
        fn transitions_never_go_backwards(from in 0u8..3, to in 0u8..3) {
            let all = [
                ReportStatus::Pending,
                ReportStatus::OnTheWay,
                ReportStatus::Resolved,
            ];
            let (from, to) = (all[from as usize], all[to as usize]);
            if from.validate_transition(to).is_ok() {
                prop_assert!(from.rank() < to.rank());
            }
        }

        #[test]
        fn in_range_coordinates_validate(
            lat in -90.0f64..=90.0,
            lon in -180.0f64..=180.0,
        ) {
            let coord = ValidatedCoordinate::new(lat, lon).unwrap();
            prop_assert_eq!(coord.lat(), lat);
            prop_assert_eq!(coord.lon(), lon);
        }
    }
}
