//! The in-progress report form and its location resolution.
//!
//! A draft lives exactly as long as one compose-submit cycle: it is built
//! up from edit events, optionally persisted between sessions, and reset
//! once the server accepts the report.

use serde::{Deserialize, Serialize};

use crate::LatLon;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoAttachment {
    #[serde(with = "serde_bytes")]
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ReportDraft {
    pub description: String,
    pub reporter_name: String,
    pub reporter_phone: String,
    pub photo: Option<PhotoAttachment>,
}

impl ReportDraft {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.description.is_empty()
            && self.reporter_name.is_empty()
            && self.reporter_phone.is_empty()
            && self.photo.is_none()
    }
}

/// Where the draft's coordinates come from, if anywhere.
///
/// Device resolution suppresses manual entry until explicitly cleared, so
/// the two sources can never disagree silently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum LocationResolution {
    #[default]
    Unresolved,
    DeviceResolved {
        coords: LatLon,
        label: Option<String>,
    },
    ManualPending {
        lat_text: String,
        lon_text: String,
    },
    ManualResolved {
        coords: LatLon,
    },
}

/// The coordinates that would accompany a submission right now.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectiveLocation {
    Device { coords: LatLon, label: Option<String> },
    Manual { coords: LatLon },
    Absent,
    Invalid,
}

impl EffectiveLocation {
    #[must_use]
    pub fn coords(&self) -> Option<LatLon> {
        match self {
            Self::Device { coords, .. } | Self::Manual { coords } => Some(*coords),
            Self::Absent | Self::Invalid => None,
        }
    }
}

impl LocationResolution {
    /// Device-resolved if present, else manual, else absent. Typed manual
    /// text that fails to parse or is out of range is `Invalid`, which is
    /// distinct from having entered nothing at all.
    #[must_use]
    pub fn effective(&self) -> EffectiveLocation {
        match self {
            Self::Unresolved => EffectiveLocation::Absent,
            Self::DeviceResolved { coords, label } => EffectiveLocation::Device {
                coords: *coords,
                label: label.clone(),
            },
            Self::ManualResolved { coords } => EffectiveLocation::Manual { coords: *coords },
            Self::ManualPending { lat_text, lon_text } => {
                if lat_text.trim().is_empty() && lon_text.trim().is_empty() {
                    return EffectiveLocation::Absent;
                }
                match parse_manual(lat_text, lon_text) {
                    Some(coords) => EffectiveLocation::Manual { coords },
                    None => EffectiveLocation::Invalid,
                }
            }
        }
    }

    #[must_use]
    pub const fn is_device_resolved(&self) -> bool {
        matches!(self, Self::DeviceResolved { .. })
    }

    /// The manual-entry path is only offered while no device fix is held.
    #[must_use]
    pub const fn manual_entry_available(&self) -> bool {
        matches!(
            self,
            Self::Unresolved | Self::ManualPending { .. } | Self::ManualResolved { .. }
        )
    }

    /// Human-readable place name, when one was resolved.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::DeviceResolved {
                label: Some(label), ..
            } => Some(label.as_str()),
            _ => None,
        }
    }
}

fn parse_manual(lat_text: &str, lon_text: &str) -> Option<LatLon> {
    let lat: f64 = lat_text.trim().parse().ok()?;
    let lon: f64 = lon_text.trim().parse().ok()?;
    LatLon::new(lat, lon).validate().ok().map(Into::into)
}
