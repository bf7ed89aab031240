//! Reverse geocoding against the Nominatim place-lookup service.
//!
//! Strictly best-effort: a failed lookup degrades the displayed label to a
//! fixed-precision coordinate string and never blocks submission.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{LatLon, COORD_LABEL_PRECISION};

pub const REVERSE_ENDPOINT: &str = "https://nominatim.openstreetmap.org/reverse";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceAddress {
    #[serde(default)]
    pub road: Option<String>,
    #[serde(default)]
    pub suburb: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub town: Option<String>,
    #[serde(default)]
    pub village: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceResponse {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub address: PlaceAddress,
}

pub fn reverse_url(coords: LatLon) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(REVERSE_ENDPOINT)?;
    url.query_pairs_mut()
        .append_pair("format", "json")
        .append_pair("lat", &coords.lat.to_string())
        .append_pair("lon", &coords.lon.to_string())
        .append_pair("addressdetails", "1");
    Ok(url)
}

/// Compose a label from address parts: road, suburb, city (or town, or
/// village), state, country. Only non-empty segments, comma-joined.
#[must_use]
pub fn compose_label(address: &PlaceAddress) -> Option<String> {
    let settlement = address
        .city
        .as_deref()
        .or(address.town.as_deref())
        .or(address.village.as_deref());

    let parts: Vec<&str> = [
        address.road.as_deref(),
        address.suburb.as_deref(),
        settlement,
        address.state.as_deref(),
        address.country.as_deref(),
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .filter(|part| !part.is_empty())
    .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

/// The label shown when no place name could be resolved.
#[must_use]
pub fn fallback_label(coords: LatLon) -> String {
    format!(
        "{:.prec$}, {:.prec$}",
        coords.lat,
        coords.lon,
        prec = COORD_LABEL_PRECISION
    )
}

/// Best label for a successful geocoder response body: composed address,
/// else the service's own display string, else the coordinate string.
#[must_use]
pub fn resolve_label(body: &[u8], coords: LatLon) -> String {
    let Ok(response) = serde_json::from_slice::<PlaceResponse>(body) else {
        tracing::debug!("geocoder response did not parse; using coordinate label");
        return fallback_label(coords);
    };

    compose_label(&response.address)
        .or_else(|| {
            response
                .display_name
                .filter(|name| !name.trim().is_empty())
        })
        .unwrap_or_else(|| fallback_label(coords))
}
