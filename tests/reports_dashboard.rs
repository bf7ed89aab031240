use crux_core::testing::AppTester;
use crux_http::protocol::HttpResponse;
use rescue_core::{App, Effect, Event, Model, ReportId, ReportStatus, StatusFilter};

fn http_response(status: u16, body: &[u8]) -> HttpResponse {
    HttpResponse::status(status).body(body.to_vec()).build()
}

fn http_effects(effects: Vec<Effect>) -> Vec<crux_core::Request<crux_http::protocol::HttpRequest>> {
    effects
        .into_iter()
        .filter_map(|effect| match effect {
            Effect::Http(request) => Some(request),
            _ => None,
        })
        .collect()
}

fn report_json(id: i64, status: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "created_at": "2025-11-02T10:00:00Z",
        "description": format!("report {id}"),
        "reporter_name": "Asha",
        "reporter_phone": "9876543210",
        "image_path": if id == 5 { Some("/uploads/dog5.jpg") } else { None },
        "latitude": 28.6139,
        "longitude": 77.209,
        "status": status
    })
}

fn dataset() -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!([
        report_json(5, "PENDING"),
        report_json(7, "PENDING"),
        report_json(9, "ON_THE_WAY"),
    ]))
    .unwrap()
}

/// Drive a refresh to completion with the given response body.
fn load(app: &AppTester<App, Effect>, model: &mut Model, status: u16, body: &[u8]) {
    let update = app.update(Event::RefreshReports, model);
    let mut requests = http_effects(update.effects);
    assert_eq!(requests.len(), 1);
    let update = app
        .resolve(&mut requests[0], http_response(status, body))
        .expect("refresh resolves");
    for event in update.events {
        app.update(event, model);
    }
}

#[test]
fn refresh_loads_reports_in_server_order() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    load(&app, &mut model, 200, &dataset());

    let view = app.view(&model);
    assert!(!view.reports.loading);
    assert!(view.reports.error.is_none());
    let ids: Vec<i64> = view.reports.cards.iter().map(|c| c.id.0).collect();
    assert_eq!(ids, vec![5, 7, 9]);

    // Card affordances come from the lifecycle, images resolve against the
    // API origin.
    assert_eq!(
        view.reports.cards[0].photo_url.as_deref(),
        Some("http://localhost:5000/uploads/dog5.jpg")
    );
    assert_eq!(
        view.reports.cards[0].next_statuses,
        vec![ReportStatus::OnTheWay, ReportStatus::Resolved]
    );
    assert_eq!(
        view.reports.cards[2].next_statuses,
        vec![ReportStatus::Resolved]
    );
}

#[test]
fn refresh_twice_with_unchanged_data_is_idempotent() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    load(&app, &mut model, 200, &dataset());
    let first = app.view(&model).reports.cards;
    load(&app, &mut model, 200, &dataset());
    assert_eq!(app.view(&model).reports.cards, first);
}

#[test]
fn load_failure_clears_the_cache_and_offers_retry() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    load(&app, &mut model, 200, &dataset());
    load(&app, &mut model, 500, b"");

    let view = app.view(&model);
    assert!(view.reports.cards.is_empty());
    assert_eq!(view.reports.error.as_deref(), Some("Failed to load reports."));

    // Explicit retry refetches and recovers.
    load(&app, &mut model, 200, &dataset());
    assert_eq!(app.view(&model).reports.cards.len(), 3);
    assert!(app.view(&model).reports.error.is_none());
}

#[test]
fn non_list_response_yields_an_empty_cache_and_a_load_error() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    load(&app, &mut model, 200, br#"{"error":"oops"}"#);

    let view = app.view(&model);
    assert!(view.reports.cards.is_empty());
    assert!(view.reports.error.is_some());
}

#[test]
fn exact_status_filter_narrows_client_side() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let update = app.update(
        Event::FilterSelected(StatusFilter::Only(ReportStatus::Pending)),
        &mut model,
    );
    let mut requests = http_effects(update.effects);
    assert_eq!(requests.len(), 1);
    assert!(requests[0].operation.url.contains("onlyOpen=true"));

    let update = app
        .resolve(
            &mut requests[0],
            http_response(200, &dataset()),
        )
        .expect("refresh resolves");
    for event in update.events {
        app.update(event, &mut model);
    }

    let ids: Vec<i64> = app
        .view(&model)
        .reports
        .cards
        .iter()
        .map(|c| c.id.0)
        .collect();
    assert_eq!(ids, vec![5, 7]);
}

#[test]
fn resolved_filter_fetches_the_full_list() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let update = app.update(
        Event::FilterSelected(StatusFilter::Only(ReportStatus::Resolved)),
        &mut model,
    );
    let requests = http_effects(update.effects);
    assert!(!requests[0].operation.url.contains("onlyOpen"));
}

#[test]
fn out_of_order_refreshes_keep_the_newest_dataset() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let update = app.update(Event::RefreshReports, &mut model);
    let mut stale = http_effects(update.effects);
    let update = app.update(Event::RefreshReports, &mut model);
    let mut current = http_effects(update.effects);

    let newest = serde_json::to_vec(&serde_json::json!([report_json(1, "PENDING")])).unwrap();
    let update = app
        .resolve(&mut current[0], http_response(200, &newest))
        .expect("resolves");
    for event in update.events {
        app.update(event, &mut model);
    }

    // The older request completes last; its dataset must be discarded.
    let update = app
        .resolve(&mut stale[0], http_response(200, &dataset()))
        .expect("resolves");
    for event in update.events {
        app.update(event, &mut model);
    }

    let ids: Vec<i64> = app
        .view(&model)
        .reports
        .cards
        .iter()
        .map(|c| c.id.0)
        .collect();
    assert_eq!(ids, vec![1]);
}

#[test]
fn confirmed_status_update_mutates_only_the_matching_entry() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    load(&app, &mut model, 200, &dataset());

    let update = app.update(
        Event::AdvanceStatus {
            id: ReportId(7),
            status: ReportStatus::Resolved,
        },
        &mut model,
    );
    let mut patches = http_effects(update.effects);
    assert_eq!(patches.len(), 1);
    let operation = &patches[0].operation;
    assert!(operation.method.eq_ignore_ascii_case("patch"));
    assert!(operation.url.ends_with("/api/reports/7/status"));
    assert_eq!(operation.body, br#"{"status":"RESOLVED"}"#.to_vec());

    let update = app
        .resolve(&mut patches[0], http_response(200, b"{}"))
        .expect("patch resolves");
    for event in update.events {
        app.update(event, &mut model);
    }

    let statuses: Vec<(i64, ReportStatus)> = app
        .view(&model)
        .reports
        .cards
        .iter()
        .map(|c| (c.id.0, c.status))
        .collect();
    assert_eq!(
        statuses,
        vec![
            (5, ReportStatus::Pending),
            (7, ReportStatus::Resolved),
            (9, ReportStatus::OnTheWay),
        ]
    );
}

#[test]
fn failed_status_update_leaves_the_cache_untouched_and_alerts() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    load(&app, &mut model, 200, &dataset());
    let before = app.view(&model).reports.cards;

    let update = app.update(
        Event::AdvanceStatus {
            id: ReportId(7),
            status: ReportStatus::Resolved,
        },
        &mut model,
    );
    let mut patches = http_effects(update.effects);
    let update = app
        .resolve(&mut patches[0], http_response(500, b""))
        .expect("patch resolves");
    for event in update.events {
        app.update(event, &mut model);
    }

    let view = app.view(&model);
    assert_eq!(view.reports.cards, before);
    assert_eq!(view.reports.alert.as_deref(), Some("Failed to update status"));

    app.update(Event::AlertDismissed, &mut model);
    assert!(app.view(&model).reports.alert.is_none());
}

#[test]
fn backward_transitions_are_rejected_without_a_network_call() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    load(&app, &mut model, 200, &dataset());

    let update = app.update(
        Event::AdvanceStatus {
            id: ReportId(9),
            status: ReportStatus::Pending,
        },
        &mut model,
    );
    assert!(http_effects(update.effects).is_empty());
    assert!(app.view(&model).reports.alert.is_some());
}
