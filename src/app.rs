//! The application core: events in, model mutations and effects out.
//!
//! Two cooperating components live in the model. The submission controller
//! owns the draft, location resolution, and the create-request lifecycle;
//! the reports registry owns the cached list and status reconciliation.
//! A successful create signals the registry to refetch, and operator
//! actions on list entries flow back through the registry's update path.

use serde::{Deserialize, Serialize};

use crate::api::{self, CreateReportResponse, Report, ReportId, StatusUpdateRequest};
use crate::assistant::{AssistantLog, ChatMessage};
use crate::capabilities::{Capabilities, FixOptions, LocationResult, StorageOutput, StorageResult};
use crate::draft::{PhotoAttachment, ReportDraft};
use crate::geocode;
use crate::registry::{ReportsRegistry, StatusFilter};
use crate::submission::{SubmissionController, SubmitPhase};
pub use crate::submission::LocationPolicy;
use crate::{AppError, LatLon, ReportStatus, DEFAULT_API_BASE, DRAFT_STORE_KEY};

type ApiResult = crux_http::Result<crux_http::Response<Vec<u8>>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreConfig {
    pub api_base: String,
    pub location_policy: LocationPolicy,
    pub fix_options: FixOptions,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            location_policy: LocationPolicy::Required,
            fix_options: FixOptions::precise(),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub enum Event {
    Started,
    Configured(CoreConfig),

    // Draft edits
    DescriptionChanged(String),
    ReporterNameChanged(String),
    ReporterPhoneChanged(String),
    PhotoAttached(PhotoAttachment),
    PhotoCleared,

    // Location resolution
    UseMyLocation,
    ManualLatitudeChanged(String),
    ManualLongitudeChanged(String),
    ClearLocation,
    PositionFixed(LocationResult),
    #[serde(skip)]
    PlaceLookedUp {
        coords: LatLon,
        response: Box<ApiResult>,
    },

    // Submission
    SubmitReport,
    #[serde(skip)]
    ReportCreated(Box<ApiResult>),
    MessageDismissed,

    // Reports dashboard
    RefreshReports,
    FilterSelected(StatusFilter),
    #[serde(skip)]
    ReportsLoaded {
        epoch: u64,
        response: Box<ApiResult>,
    },
    AdvanceStatus {
        id: ReportId,
        status: ReportStatus,
    },
    #[serde(skip)]
    StatusSaved {
        id: ReportId,
        status: ReportStatus,
        response: Box<ApiResult>,
    },
    AlertDismissed,

    // First-aid assistant
    AssistantAsked(String),

    // Draft persistence
    DraftRestored(StorageResult),
    DraftPersisted(StorageResult),
}

#[derive(Debug, Default)]
pub struct Model {
    pub config: CoreConfig,
    pub submission: SubmissionController,
    pub reports: ReportsRegistry,
    pub assistant: AssistantLog,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionView {
    pub phase: SubmitPhase,
    pub submitting: bool,
    pub locating: bool,
    pub notice: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
    pub location_label: Option<String>,
    pub coordinates: Option<String>,
    pub manual_entry_available: bool,
    pub location_required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportCard {
    pub id: ReportId,
    pub created_at: String,
    pub description: String,
    pub reporter_name: String,
    pub reporter_phone: String,
    pub photo_url: Option<String>,
    pub map_url: Option<String>,
    pub status: ReportStatus,
    pub status_label: String,
    pub next_statuses: Vec<ReportStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportsView {
    pub loading: bool,
    pub error: Option<String>,
    pub filter: StatusFilter,
    pub alert: Option<String>,
    pub cards: Vec<ReportCard>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub submission: SubmissionView,
    pub reports: ReportsView,
    pub assistant: Vec<ChatMessage>,
}

#[derive(Default)]
pub struct App;

impl App {
    fn spawn_refresh(model: &mut Model, caps: &Capabilities) {
        let epoch = model.reports.begin_refresh();
        match api::reports_url(&model.config.api_base, model.reports.filter.only_open()) {
            Ok(url) => {
                caps.http.get(url.as_str()).send(move |result| Event::ReportsLoaded {
                    epoch,
                    response: Box::new(result),
                });
            }
            Err(e) => {
                tracing::error!(error = %e, "reports URL did not build");
                model
                    .reports
                    .apply_refresh(epoch, Err(AppError::load("Failed to load reports.")));
            }
        }
    }

    fn persist_draft(model: &Model, caps: &Capabilities) {
        match serde_json::to_vec(&model.submission.draft) {
            Ok(bytes) => caps
                .storage
                .write(DRAFT_STORE_KEY, bytes, Event::DraftPersisted),
            Err(e) => tracing::warn!(error = %e, "draft did not serialize; not persisted"),
        }
    }

    fn spawn_place_lookup(coords: LatLon, caps: &Capabilities) {
        match geocode::reverse_url(coords) {
            Ok(url) => {
                caps.http
                    .get(url.as_str())
                    .header("accept-language", "en")
                    .send(move |result| Event::PlaceLookedUp {
                        coords,
                        response: Box::new(result),
                    });
            }
            // Best-effort only; the coordinate label stands in.
            Err(e) => tracing::debug!(error = %e, "geocoder URL did not build"),
        }
    }

    fn submit(model: &mut Model, caps: &Capabilities) {
        let Some(prepared) = model.submission.begin_submit(model.config.location_policy) else {
            return;
        };

        match api::reports_url(&model.config.api_base, false) {
            Ok(url) => {
                caps.http
                    .post(url.as_str())
                    .header("content-type", prepared.content_type.as_str())
                    .header("idempotency-key", prepared.idempotency_key.as_str())
                    .body_bytes(prepared.body)
                    .send(|result| Event::ReportCreated(Box::new(result)));
            }
            Err(e) => {
                tracing::error!(error = %e, "create URL did not build");
                model
                    .submission
                    .fail(AppError::submission("Could not reach the reports service"));
            }
        }
    }

    /// Split an HTTP completion into status and body; transport failures
    /// come back as a display string for the caller to classify.
    fn into_parts(result: ApiResult) -> Result<(u16, Vec<u8>), String> {
        match result {
            Ok(mut response) => {
                let status = u16::from(response.status());
                let body = response.take_body().unwrap_or_default();
                Ok((status, body))
            }
            Err(e) => Err(e.to_string()),
        }
    }

    fn create_outcome(result: ApiResult) -> Result<CreateReportResponse, AppError> {
        match Self::into_parts(result) {
            Ok((status, body)) if (200..300).contains(&status) => {
                serde_json::from_slice(&body).map_err(|e| {
                    tracing::error!(error = %e, "create response did not parse");
                    AppError::submission("Unexpected response from the server")
                })
            }
            Ok((status, body)) => Err(AppError::submission(api::error_message(status, &body))),
            Err(message) => Err(AppError::submission(message)),
        }
    }

    fn reports_outcome(result: ApiResult) -> Result<Vec<Report>, AppError> {
        let parts = Self::into_parts(result);
        match parts {
            Ok((status, body)) if (200..300).contains(&status) => {
                serde_json::from_slice(&body).map_err(|e| {
                    tracing::warn!(error = %e, "reports list did not parse");
                    AppError::load("Failed to load reports.")
                })
            }
            Ok((status, _)) => {
                tracing::warn!(status, "reports fetch failed");
                Err(AppError::load("Failed to load reports."))
            }
            Err(message) => {
                tracing::warn!(error = %message, "reports fetch failed");
                Err(AppError::load("Failed to load reports."))
            }
        }
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Self::Event, model: &mut Self::Model, caps: &Self::Capabilities) {
        match event {
            Event::Started => {
                caps.storage.read(DRAFT_STORE_KEY, Event::DraftRestored);
                Self::spawn_refresh(model, caps);
            }
            Event::Configured(config) => {
                model.config = config;
                Self::spawn_refresh(model, caps);
            }

            Event::DescriptionChanged(value) => {
                model.submission.set_description(value);
                Self::persist_draft(model, caps);
            }
            Event::ReporterNameChanged(value) => {
                model.submission.set_reporter_name(value);
                Self::persist_draft(model, caps);
            }
            Event::ReporterPhoneChanged(value) => {
                model.submission.set_reporter_phone(value);
                Self::persist_draft(model, caps);
            }
            Event::PhotoAttached(photo) => {
                model.submission.attach_photo(photo);
                Self::persist_draft(model, caps);
            }
            Event::PhotoCleared => {
                model.submission.clear_photo();
                Self::persist_draft(model, caps);
            }

            Event::UseMyLocation => {
                if model.submission.begin_locating() {
                    caps.location
                        .current_position(model.config.fix_options, Event::PositionFixed);
                }
            }
            Event::PositionFixed(Ok(fix)) => {
                match LatLon::new(fix.lat, fix.lon).validate() {
                    Ok(coords) => {
                        let coords = LatLon::from(coords);
                        model.submission.apply_device_fix(coords);
                        Self::spawn_place_lookup(coords, caps);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "device fix out of range");
                        model.submission.apply_fix_error(
                            &crate::capabilities::LocationError::Unavailable {
                                reason: e.to_string(),
                            },
                        );
                    }
                }
            }
            Event::PositionFixed(Err(error)) => {
                model.submission.apply_fix_error(&error);
            }
            Event::PlaceLookedUp { coords, response } => {
                let label = match Self::into_parts(*response) {
                    Ok((status, body)) if (200..300).contains(&status) => {
                        geocode::resolve_label(&body, coords)
                    }
                    Ok((status, _)) => {
                        tracing::debug!(status, "geocoder returned non-success");
                        geocode::fallback_label(coords)
                    }
                    Err(message) => {
                        tracing::debug!(error = %message, "geocoder unreachable");
                        geocode::fallback_label(coords)
                    }
                };
                model.submission.apply_place_label(coords, label);
            }
            Event::ManualLatitudeChanged(text) => model.submission.set_manual_latitude(text),
            Event::ManualLongitudeChanged(text) => model.submission.set_manual_longitude(text),
            Event::ClearLocation => model.submission.clear_location(),

            Event::SubmitReport => Self::submit(model, caps),
            Event::ReportCreated(response) => match Self::create_outcome(*response) {
                Ok(created) => {
                    tracing::info!(id = %created.id, "report created");
                    let message = SubmissionController::compose_success_message(&created);
                    model.submission.succeed(message);
                    caps.storage.delete(DRAFT_STORE_KEY, Event::DraftPersisted);
                    Self::spawn_refresh(model, caps);
                }
                Err(error) => {
                    tracing::warn!(code = error.code(), "submission failed: {}", error.message);
                    model.submission.fail(error);
                }
            },
            Event::MessageDismissed => model.submission.dismiss_messages(),

            Event::RefreshReports => Self::spawn_refresh(model, caps),
            Event::FilterSelected(filter) => {
                if model.reports.set_filter(filter) {
                    Self::spawn_refresh(model, caps);
                }
            }
            Event::ReportsLoaded { epoch, response } => {
                model
                    .reports
                    .apply_refresh(epoch, Self::reports_outcome(*response));
            }
            Event::AdvanceStatus { id, status } => {
                if let Err(error) = model.reports.validate_transition(id, status) {
                    tracing::warn!(%id, "status change rejected locally: {}", error.message);
                    model.reports.raise_alert(error.message);
                } else {
                    let url = api::report_status_url(&model.config.api_base, id);
                    let body = serde_json::to_vec(&StatusUpdateRequest { status });
                    match (url, body) {
                        (Ok(url), Ok(body)) => {
                            caps.http
                                .patch(url.as_str())
                                .header("content-type", "application/json")
                                .body_bytes(body)
                                .send(move |result| Event::StatusSaved {
                                    id,
                                    status,
                                    response: Box::new(result),
                                });
                        }
                        (Err(e), _) => {
                            tracing::error!(error = %e, "status URL did not build");
                            model.reports.raise_alert("Failed to update status");
                        }
                        (_, Err(e)) => {
                            tracing::error!(error = %e, "status body did not serialize");
                            model.reports.raise_alert("Failed to update status");
                        }
                    }
                }
            }
            Event::StatusSaved {
                id,
                status,
                response,
            } => match Self::into_parts(*response) {
                Ok((code, _)) if (200..300).contains(&code) => {
                    model.reports.apply_status_update(id, status);
                }
                Ok((code, _)) => {
                    tracing::warn!(%id, code, "status update rejected by server");
                    model.reports.raise_alert("Failed to update status");
                }
                Err(message) => {
                    tracing::warn!(%id, error = %message, "status update failed");
                    model.reports.raise_alert("Failed to update status");
                }
            },
            Event::AlertDismissed => model.reports.dismiss_alert(),

            Event::AssistantAsked(text) => model.assistant.ask(&text),

            Event::DraftRestored(result) => match result {
                Ok(StorageOutput::Value(Some(bytes))) => {
                    match serde_json::from_slice::<ReportDraft>(bytes.as_ref()) {
                        Ok(draft) => model.submission.restore_draft(draft),
                        Err(e) => {
                            tracing::warn!(error = %e, "stored draft discarded; did not parse");
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "stored draft could not be read"),
            },
            Event::DraftPersisted(result) => {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "draft persistence failed");
                }
            }
        }

        caps.render.render();
    }

    fn view(&self, model: &Self::Model) -> Self::ViewModel {
        let submission = &model.submission;
        let coordinates = submission
            .resolution
            .effective()
            .coords()
            .map(geocode::fallback_label);
        let location_label = submission
            .resolution
            .label()
            .map(str::to_string)
            .or_else(|| coordinates.clone());

        let cards = model
            .reports
            .reports()
            .iter()
            .map(|report| Self::card_for(&model.config, report))
            .collect();

        ViewModel {
            submission: SubmissionView {
                phase: submission.phase(),
                submitting: submission.is_submitting(),
                locating: submission.is_locating(),
                notice: submission.notice().map(str::to_string),
                error: submission.error().map(|e| e.message.clone()),
                success: submission.success_message().map(str::to_string),
                location_label,
                coordinates,
                manual_entry_available: submission.resolution.manual_entry_available(),
                location_required: model.config.location_policy == LocationPolicy::Required,
            },
            reports: ReportsView {
                loading: model.reports.is_loading(),
                error: model.reports.load_error().map(|e| e.message.clone()),
                filter: model.reports.filter,
                alert: model.reports.alert().map(str::to_string),
                cards,
            },
            assistant: model.assistant.messages().to_vec(),
        }
    }
}

impl App {
    fn card_for(config: &CoreConfig, report: &Report) -> ReportCard {
        let photo_url = report
            .image_path
            .as_deref()
            .and_then(|path| api::image_url(&config.api_base, path));
        let map_url = match (report.latitude, report.longitude) {
            (Some(lat), Some(lon)) => Some(api::maps_url(lat, lon)),
            _ => None,
        };

        ReportCard {
            id: report.id,
            created_at: report.created_at.clone(),
            description: report.description.clone(),
            reporter_name: report.reporter_name.clone(),
            reporter_phone: report.reporter_phone.clone(),
            photo_url,
            map_url,
            status: report.status,
            status_label: report.status.display_name().to_string(),
            next_statuses: report.status.valid_transitions(),
        }
    }
}
