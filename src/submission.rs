//! Report submission: draft ownership, validation, and the create-request
//! lifecycle. One controller instance owns one compose-submit cycle.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{CreateReportResponse, MultipartForm};
use crate::capabilities::LocationError;
use crate::draft::{EffectiveLocation, LocationResolution, PhotoAttachment, ReportDraft};
use crate::{AppError, ErrorKind, LatLon, MIN_PHONE_LEN};

/// Whether a submission may leave without coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LocationPolicy {
    /// Submission is blocked until coordinates are resolved.
    #[default]
    Required,
    /// Coordinates accompany the report only when available.
    Optional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SubmitPhase {
    #[default]
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

/// Everything needed to put the create request on the wire.
#[derive(Debug)]
pub struct PreparedSubmission {
    pub content_type: String,
    pub body: Vec<u8>,
    pub idempotency_key: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubmissionController {
    pub draft: ReportDraft,
    pub resolution: LocationResolution,
    phase: SubmitPhase,
    locating: bool,
    error: Option<AppError>,
    success_message: Option<String>,
    notice: Option<String>,
    // Stable across retries of the same logical create, reset on success.
    idempotency_key: Option<String>,
}

impl SubmissionController {
    #[must_use]
    pub const fn phase(&self) -> SubmitPhase {
        self.phase
    }

    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        matches!(self.phase, SubmitPhase::Submitting)
    }

    #[must_use]
    pub const fn is_locating(&self) -> bool {
        self.locating
    }

    #[must_use]
    pub fn error(&self) -> Option<&AppError> {
        self.error.as_ref()
    }

    #[must_use]
    pub fn success_message(&self) -> Option<&str> {
        self.success_message.as_deref()
    }

    #[must_use]
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn set_description(&mut self, value: String) {
        self.draft.description = value;
        self.on_edit();
    }

    pub fn set_reporter_name(&mut self, value: String) {
        self.draft.reporter_name = value;
        self.on_edit();
    }

    pub fn set_reporter_phone(&mut self, value: String) {
        self.draft.reporter_phone = value;
        self.on_edit();
    }

    pub fn attach_photo(&mut self, photo: PhotoAttachment) {
        self.draft.photo = Some(photo);
        self.on_edit();
    }

    pub fn clear_photo(&mut self) {
        self.draft.photo = None;
        self.on_edit();
    }

    /// Bring back a previously persisted draft, but never over typed input.
    pub fn restore_draft(&mut self, draft: ReportDraft) {
        if self.draft.is_empty() {
            self.draft = draft;
        }
    }

    fn on_edit(&mut self) {
        // Any edit starts a fresh attempt visually; stale outcome messages go.
        if matches!(self.phase, SubmitPhase::Succeeded | SubmitPhase::Failed) {
            self.phase = SubmitPhase::Idle;
        }
        self.error = None;
        self.success_message = None;
    }

    /// A device fix has been requested; nothing may race it.
    pub fn begin_locating(&mut self) -> bool {
        if self.locating {
            tracing::warn!("position fix already in flight; request ignored");
            return false;
        }
        self.locating = true;
        self.error = None;
        self.notice = Some("Getting your location...".into());
        true
    }

    pub fn apply_device_fix(&mut self, coords: LatLon) {
        self.locating = false;
        self.resolution = LocationResolution::DeviceResolved {
            coords,
            label: None,
        };
        self.notice = Some("Location found".into());
    }

    /// Device resolution failed; hand control to manual entry.
    pub fn apply_fix_error(&mut self, error: &LocationError) {
        self.locating = false;
        self.notice = None;
        self.error = Some(AppError::new(ErrorKind::Geolocation, error.to_string()));
        if matches!(self.resolution, LocationResolution::Unresolved) {
            self.resolution = LocationResolution::ManualPending {
                lat_text: String::new(),
                lon_text: String::new(),
            };
        }
    }

    /// Attach a resolved place label, unless the fix has changed since the
    /// lookup went out.
    pub fn apply_place_label(&mut self, for_coords: LatLon, label: String) {
        if let LocationResolution::DeviceResolved { coords, label: slot } = &mut self.resolution {
            if coords.same_point(for_coords) {
                self.notice = Some(format!("Location found: {label}"));
                *slot = Some(label);
            }
        }
    }

    pub fn set_manual_latitude(&mut self, text: String) {
        self.edit_manual(|lat_text, _| *lat_text = text);
    }

    pub fn set_manual_longitude(&mut self, text: String) {
        self.edit_manual(|_, lon_text| *lon_text = text);
    }

    fn edit_manual(&mut self, apply: impl FnOnce(&mut String, &mut String)) {
        // A held device fix suppresses manual entry until cleared.
        if self.resolution.is_device_resolved() {
            tracing::debug!("manual coordinate edit ignored while device fix is held");
            return;
        }
        if let LocationResolution::ManualPending { lat_text, lon_text } = &mut self.resolution {
            apply(lat_text, lon_text);
        } else {
            let mut lat_text = String::new();
            let mut lon_text = String::new();
            if let LocationResolution::ManualResolved { coords } = self.resolution {
                lat_text = coords.lat.to_string();
                lon_text = coords.lon.to_string();
            }
            apply(&mut lat_text, &mut lon_text);
            self.resolution = LocationResolution::ManualPending { lat_text, lon_text };
        }
        self.on_edit();
    }

    pub fn clear_location(&mut self) {
        self.resolution = LocationResolution::Unresolved;
        self.notice = None;
        self.on_edit();
    }

    /// Local preconditions for a submission. Checked in the order the form
    /// presents them: required text fields, location, then phone shape.
    pub fn validate(&self, policy: LocationPolicy) -> Result<(), AppError> {
        let draft = &self.draft;
        if draft.description.trim().is_empty()
            || draft.reporter_name.trim().is_empty()
            || draft.reporter_phone.trim().is_empty()
        {
            return Err(AppError::validation(
                "Please fill in the description, your name, and a phone number.",
            ));
        }

        match self.resolution.effective() {
            EffectiveLocation::Invalid => {
                return Err(AppError::validation(
                    "Manual coordinates must be a valid decimal latitude and longitude.",
                ));
            }
            EffectiveLocation::Absent if policy == LocationPolicy::Required => {
                return Err(AppError::validation(
                    "Location is required. Use your current location or enter coordinates manually.",
                ));
            }
            _ => {}
        }

        if draft.reporter_phone.trim().chars().count() < MIN_PHONE_LEN {
            return Err(AppError::validation(
                "Please enter a valid phone number (at least 10 characters).",
            ));
        }

        Ok(())
    }

    /// Validate and assemble the create request. Returns `None` when the
    /// attempt must not go out: a submission is already in flight, or
    /// validation failed (recorded on the controller, no network call).
    pub fn begin_submit(&mut self, policy: LocationPolicy) -> Option<PreparedSubmission> {
        if self.is_submitting() {
            tracing::warn!("submit ignored; a submission is already in flight");
            return None;
        }

        self.phase = SubmitPhase::Validating;
        if let Err(error) = self.validate(policy) {
            self.phase = SubmitPhase::Failed;
            self.error = Some(error);
            return None;
        }

        let idempotency_key = self
            .idempotency_key
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone();

        let form = self.build_form();
        let content_type = form.content_type();
        self.phase = SubmitPhase::Submitting;
        self.error = None;
        self.success_message = None;
        self.notice = None;

        Some(PreparedSubmission {
            content_type,
            body: form.finish(),
            idempotency_key,
        })
    }

    fn build_form(&self) -> MultipartForm {
        let mut form = MultipartForm::new();
        form.text("description", &self.draft.description);
        form.text("reporter_name", &self.draft.reporter_name);
        form.text("reporter_phone", &self.draft.reporter_phone);

        let effective = self.resolution.effective();
        if let Some(coords) = effective.coords() {
            form.text("latitude", &coords.lat.to_string());
            form.text("longitude", &coords.lon.to_string());
        }
        if let EffectiveLocation::Device {
            label: Some(label), ..
        } = &effective
        {
            if !label.trim().is_empty() {
                form.text("location_name", label);
            }
        }

        if let Some(photo) = &self.draft.photo {
            form.file("photo", &photo.file_name, &photo.mime_type, &photo.bytes);
        }
        form
    }

    /// Compose the user-facing success line; NGO assignment and distance
    /// are appended only when the server provided them.
    #[must_use]
    pub fn compose_success_message(response: &CreateReportResponse) -> String {
        let mut message = response.message.clone();
        if let Some(ngo) = &response.assigned_ngo {
            message.push_str(&format!(". Assigned to {ngo}"));
            if let Some(km) = response.distance_km {
                message.push_str(&format!(" ({km} km away)"));
            }
        }
        message
    }

    /// The server accepted the report: reset the cycle.
    pub fn succeed(&mut self, message: String) {
        self.phase = SubmitPhase::Succeeded;
        self.success_message = Some(message);
        self.error = None;
        self.notice = None;
        self.draft = ReportDraft::default();
        self.resolution = LocationResolution::Unresolved;
        self.idempotency_key = None;
    }

    /// Terminal for this attempt; the user must explicitly retry. The
    /// idempotency key survives so a retry is the same logical create.
    pub fn fail(&mut self, error: AppError) {
        self.phase = SubmitPhase::Failed;
        self.error = Some(error);
    }

    pub fn dismiss_messages(&mut self) {
        if matches!(self.phase, SubmitPhase::Succeeded | SubmitPhase::Failed) {
            self.phase = SubmitPhase::Idle;
        }
        self.error = None;
        self.success_message = None;
        self.notice = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ReportId;
    use proptest::prelude::*;

    fn filled_controller() -> SubmissionController {
        let mut c = SubmissionController::default();
        c.set_description("Injured dog with a broken leg".into());
        c.set_reporter_name("Asha".into());
        c.set_reporter_phone("9876543210".into());
        c.apply_device_fix(LatLon::new(28.6139, 77.209));
        c
    }

    #[test]
    fn whitespace_fields_fail_validation() {
        let mut c = filled_controller();
        c.set_description("   ".into());
        let err = c.validate(LocationPolicy::Required).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn short_phone_fails_validation() {
        let mut c = filled_controller();
        c.set_reporter_phone("12345".into());
        let err = c.validate(LocationPolicy::Required).unwrap_err();
        assert!(err.message.contains("phone"));
    }

    #[test]
    fn missing_location_blocks_only_under_required_policy() {
        let mut c = filled_controller();
        c.clear_location();
        assert!(c.validate(LocationPolicy::Required).is_err());
        assert!(c.validate(LocationPolicy::Optional).is_ok());
    }

    #[test]
    fn invalid_manual_coordinates_block_under_both_policies() {
        let mut c = filled_controller();
        c.clear_location();
        c.set_manual_latitude("not a number".into());
        c.set_manual_longitude("77.2".into());
        assert!(c.validate(LocationPolicy::Required).is_err());
        assert!(c.validate(LocationPolicy::Optional).is_err());
    }

    #[test]
    fn begin_submit_is_rejected_while_in_flight() {
        let mut c = filled_controller();
        assert!(c.begin_submit(LocationPolicy::Required).is_some());
        assert_eq!(c.phase(), SubmitPhase::Submitting);
        assert!(c.begin_submit(LocationPolicy::Required).is_none());
    }

    #[test]
    fn retry_reuses_the_idempotency_key() {
        let mut c = filled_controller();
        let first = c.begin_submit(LocationPolicy::Required).unwrap();
        c.fail(AppError::submission("HTTP 503"));
        let second = c.begin_submit(LocationPolicy::Required).unwrap();
        assert_eq!(first.idempotency_key, second.idempotency_key);
    }

    #[test]
    fn success_resets_draft_resolution_and_key() {
        let mut c = filled_controller();
        let first = c.begin_submit(LocationPolicy::Required).unwrap();
        c.succeed("Created".into());
        assert!(c.draft.is_empty());
        assert_eq!(c.resolution, LocationResolution::Unresolved);
        assert_eq!(c.phase(), SubmitPhase::Succeeded);
        assert_eq!(c.success_message(), Some("Created"));

        // A fresh cycle is a new logical create.
        let mut c2 = filled_controller();
        let next = c2.begin_submit(LocationPolicy::Required).unwrap();
        assert_ne!(first.idempotency_key, next.idempotency_key);
    }

    #[test]
    fn form_carries_device_label_and_photo() {
        let mut c = filled_controller();
        c.apply_place_label(LatLon::new(28.6139, 77.209), "Delhi, India".into());
        c.attach_photo(PhotoAttachment {
            bytes: vec![0xff, 0xd8],
            mime_type: "image/jpeg".into(),
            file_name: "dog.jpg".into(),
        });
        let prepared = c.begin_submit(LocationPolicy::Required).unwrap();
        let body = String::from_utf8_lossy(&prepared.body).into_owned();
        assert!(body.contains("name=\"latitude\""));
        assert!(body.contains("28.6139"));
        assert!(body.contains("name=\"location_name\""));
        assert!(body.contains("Delhi, India"));
        assert!(body.contains("filename=\"dog.jpg\""));
    }

    #[test]
    fn manual_coordinates_reach_the_form_without_a_label() {
        let mut c = filled_controller();
        c.clear_location();
        c.set_manual_latitude("12.9716".into());
        c.set_manual_longitude("77.5946".into());
        let prepared = c.begin_submit(LocationPolicy::Required).unwrap();
        let body = String::from_utf8_lossy(&prepared.body).into_owned();
        assert!(body.contains("12.9716"));
        assert!(!body.contains("location_name"));
    }

    #[test]
    fn stale_place_label_is_ignored() {
        let mut c = filled_controller();
        c.apply_device_fix(LatLon::new(19.076, 72.8777));
        c.apply_place_label(LatLon::new(28.6139, 77.209), "Delhi, India".into());
        assert_eq!(c.resolution.label(), None);
        c.apply_place_label(LatLon::new(19.076, 72.8777), "Mumbai, India".into());
        assert_eq!(c.resolution.label(), Some("Mumbai, India"));
    }

    #[test]
    fn fix_error_opens_manual_entry() {
        let mut c = SubmissionController::default();
        c.begin_locating();
        c.apply_fix_error(&LocationError::PermissionDenied);
        assert!(!c.is_locating());
        assert!(c.resolution.manual_entry_available());
        assert_eq!(c.error().unwrap().kind, ErrorKind::Geolocation);
    }

    #[test]
    fn success_message_parts_are_optional() {
        let base = CreateReportResponse {
            id: ReportId(42),
            message: "Created".into(),
            assigned_ngo: None,
            distance_km: None,
        };
        assert_eq!(
            SubmissionController::compose_success_message(&base),
            "Created"
        );

        let with_ngo = CreateReportResponse {
            assigned_ngo: Some("Paws Rescue".into()),
            ..base.clone()
        };
        assert_eq!(
            SubmissionController::compose_success_message(&with_ngo),
            "Created. Assigned to Paws Rescue"
        );

        let with_distance = CreateReportResponse {
            assigned_ngo: Some("Paws Rescue".into()),
            distance_km: Some(3.2),
            ..base
        };
        assert_eq!(
            SubmissionController::compose_success_message(&with_distance),
            "Created. Assigned to Paws Rescue (3.2 km away)"
        );
    }

    proptest! {
        #[test]
        fn any_phone_shorter_than_ten_chars_is_rejected(phone in "[0-9]{1,9}") {
            let mut c = filled_controller();
            c.set_reporter_phone(phone);
            prop_assert!(c.validate(LocationPolicy::Required).is_err());
        }

        #[test]
        fn ten_or_more_digits_pass_the_phone_check(phone in "[0-9]{10,15}") {
            let mut c = filled_controller();
            c.set_reporter_phone(phone);
            prop_assert!(c.validate(LocationPolicy::Required).is_ok());
        }
    }
}
