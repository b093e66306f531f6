use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::json;
use slot_journal::api::middleware::SecurityConfig;
use slot_journal::api::{create_router, create_router_with_security};
use slot_journal::calendar::MonthView;
use slot_journal::db::Database;
use slot_journal::models::*;

fn setup() -> TestServer {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    let app = create_router(db);
    TestServer::new(app).expect("Failed to create test server")
}

async fn create_test_concept(server: &TestServer, name: &str) -> Concept {
    server
        .post("/api/v1/concepts")
        .json(&CreateConceptInput {
            name: name.to_string(),
            description: None,
        })
        .await
        .json::<Concept>()
}

async fn get_day(server: &TestServer) -> DayView {
    server.get("/api/v1/days/2026/10/19").await.json::<DayView>()
}

mod health {
    use super::*;

    #[tokio::test]
    async fn reports_ok() {
        let server = setup();

        let response = server.get("/api/v1/health").await;

        response.assert_status_ok();
        response.assert_json(&json!({ "status": "ok" }));
    }
}

mod concepts {
    use super::*;

    #[tokio::test]
    async fn create_returns_201() {
        let server = setup();

        let response = server
            .post("/api/v1/concepts")
            .json(&json!({ "name": "FVG", "description": "Fair value gap" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let concept: Concept = response.json();
        assert_eq!(concept.name, "FVG");
        assert_eq!(concept.description, "Fair value gap");
    }

    #[tokio::test]
    async fn duplicate_name_is_a_conflict() {
        let server = setup();
        create_test_concept(&server, "FVG").await;

        let response = server
            .post("/api/v1/concepts")
            .json(&json!({ "name": "FVG" }))
            .await;

        response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn blank_name_is_a_bad_request() {
        let server = setup();

        let response = server
            .post("/api/v1/concepts")
            .json(&json!({ "name": "  " }))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn malformed_body_is_a_bad_request() {
        let server = setup();

        for body in [json!({ "description": "no name" }), json!({ "name": 7 })] {
            let response = server.post("/api/v1/concepts").json(&body).await;
            response.assert_status_bad_request();
            response.assert_text("Invalid concept payload");
        }

        let response = server.post("/api/v1/concepts").text("name=FVG").await;
        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn lists_by_name() {
        let server = setup();
        create_test_concept(&server, "OTE").await;
        create_test_concept(&server, "BOS").await;

        let response = server.get("/api/v1/concepts").await;

        response.assert_status_ok();
        let concepts: Vec<Concept> = response.json();
        let names: Vec<&str> = concepts.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["BOS", "OTE"]);
    }
}

mod days {
    use super::*;

    #[tokio::test]
    async fn day_view_creates_the_journal() {
        let server = setup();
        create_test_concept(&server, "FVG").await;

        let view = get_day(&server).await;

        assert_eq!(view.journal.session, "NY");
        assert_eq!(view.concepts.len(), 1);
        assert_eq!(view.slots.len(), Timeframe::ALL.len());
    }

    #[tokio::test]
    async fn invalid_date_is_a_bad_request() {
        let server = setup();

        let response = server.get("/api/v1/days/2026/2/30").await;

        response.assert_status_bad_request();
        response.assert_text("Invalid date");
    }

    #[tokio::test]
    async fn update_changes_given_fields() {
        let server = setup();

        let response = server
            .put("/api/v1/days/2026/10/19")
            .json(&json!({ "symbol": "ES", "trade_taken": true }))
            .await;

        response.assert_status_ok();
        let journal: DayJournal = response.json();
        assert_eq!(journal.symbol, "ES");
        assert!(journal.trade_taken);
        assert_eq!(get_day(&server).await.journal.symbol, "ES");
    }

    #[tokio::test]
    async fn overlong_session_is_a_bad_request() {
        let server = setup();

        let response = server
            .put("/api/v1/days/2026/10/19")
            .json(&json!({ "session": "x".repeat(MAX_SESSION_CHARS + 1) }))
            .await;

        response.assert_status_bad_request();
    }
}

mod save_slots {
    use super::*;

    #[tokio::test]
    async fn stores_items_and_acknowledges() {
        let server = setup();
        let fvg = create_test_concept(&server, "FVG").await;
        let bos = create_test_concept(&server, "BOS").await;

        let response = server
            .post("/api/v1/days/2026/10/19/slots")
            .json(&json!({
                "slots": {
                    "D": [{ "concept_id": fvg.id, "note": "HTF bias" }],
                    "1H": [
                        { "concept_id": bos.id.to_string(), "note": "" },
                        { "concept_id": fvg.id, "note": "" }
                    ]
                }
            }))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({ "ok": true }));

        let view = get_day(&server).await;
        assert_eq!(view.slots[0].items[0].note, "HTF bias");
        let hourly: Vec<&str> = view.slots[2]
            .items
            .iter()
            .map(|i| i.concept_name.as_str())
            .collect();
        assert_eq!(hourly, vec!["BOS", "FVG"]);
    }

    #[tokio::test]
    async fn skips_unknown_timeframes_and_empty_ids() {
        let server = setup();
        let fvg = create_test_concept(&server, "FVG").await;

        let response = server
            .post("/api/v1/days/2026/10/19/slots")
            .json(&json!({
                "slots": {
                    "W": [{ "concept_id": fvg.id, "note": "" }],
                    "5M": [
                        { "concept_id": null, "note": "" },
                        { "concept_id": fvg.id, "note": "" }
                    ],
                    "15M": "not a list"
                }
            }))
            .await;

        response.assert_status_ok();
        let view = get_day(&server).await;
        let items: Vec<&SlotItem> = view.slots.iter().flat_map(|s| &s.items).collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].timeframe, Timeframe::M5);
        assert_eq!(items[0].position, 1);
    }

    #[tokio::test]
    async fn truncates_long_notes() {
        let server = setup();
        let fvg = create_test_concept(&server, "FVG").await;

        server
            .post("/api/v1/days/2026/10/19/slots")
            .json(&json!({
                "slots": { "D": [{ "concept_id": fvg.id, "note": "n".repeat(300) }] }
            }))
            .await
            .assert_status_ok();

        let view = get_day(&server).await;
        assert_eq!(view.slots[0].items[0].note.chars().count(), MAX_NOTE_CHARS);
    }

    #[tokio::test]
    async fn rejects_a_body_that_is_not_json() {
        let server = setup();

        let response = server
            .post("/api/v1/days/2026/10/19/slots")
            .text("slots=D")
            .await;

        response.assert_status_bad_request();
        response.assert_text("Invalid JSON");
    }

    #[tokio::test]
    async fn rejects_slots_that_are_not_an_object() {
        let server = setup();

        let response = server
            .post("/api/v1/days/2026/10/19/slots")
            .json(&json!({ "slots": ["D"] }))
            .await;

        response.assert_status_bad_request();
        response.assert_text("Invalid slots payload");
    }

    #[tokio::test]
    async fn unknown_concept_is_not_found_and_changes_nothing() {
        let server = setup();
        let fvg = create_test_concept(&server, "FVG").await;
        server
            .post("/api/v1/days/2026/10/19/slots")
            .json(&json!({ "slots": { "D": [{ "concept_id": fvg.id, "note": "" }] } }))
            .await
            .assert_status_ok();

        let response = server
            .post("/api/v1/days/2026/10/19/slots")
            .json(&json!({ "slots": { "D": [{ "concept_id": 9999, "note": "" }] } }))
            .await;

        response.assert_status_not_found();
        let view = get_day(&server).await;
        assert_eq!(view.slots[0].items[0].concept_id, fvg.id);
    }

    #[tokio::test]
    async fn missing_slots_key_clears_the_day() {
        let server = setup();
        let fvg = create_test_concept(&server, "FVG").await;
        server
            .post("/api/v1/days/2026/10/19/slots")
            .json(&json!({ "slots": { "D": [{ "concept_id": fvg.id, "note": "" }] } }))
            .await
            .assert_status_ok();

        server
            .post("/api/v1/days/2026/10/19/slots")
            .json(&json!({}))
            .await
            .assert_status_ok();

        let view = get_day(&server).await;
        assert!(view.slots.iter().all(|s| s.items.is_empty()));
    }
}

mod calendar {
    use super::*;

    #[tokio::test]
    async fn flags_days_with_a_journal() {
        let server = setup();
        get_day(&server).await;

        let response = server
            .get("/api/v1/calendar")
            .add_query_param("year", 2026)
            .add_query_param("month", 10)
            .await;

        response.assert_status_ok();
        let view: MonthView = response.json();
        assert_eq!(view.month_name, "October");
        let flagged: Vec<u32> = view
            .weeks
            .iter()
            .flatten()
            .filter(|d| d.has_journal)
            .map(|d| chrono::Datelike::day(&d.date))
            .collect();
        assert_eq!(flagged, vec![19]);
    }

    #[tokio::test]
    async fn invalid_month_is_a_bad_request() {
        let server = setup();

        let response = server
            .get("/api/v1/calendar")
            .add_query_param("year", 2026)
            .add_query_param("month", 13)
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn months_outside_the_date_range_are_bad_requests() {
        let server = setup();

        let min = chrono::Datelike::year(&chrono::NaiveDate::MIN);
        let max = chrono::Datelike::year(&chrono::NaiveDate::MAX);
        for (year, month) in [(min, 1), (max, 12), (i32::MAX, 12)] {
            let response = server
                .get("/api/v1/calendar")
                .add_query_param("year", year)
                .add_query_param("month", month)
                .await;

            response.assert_status_bad_request();
            response.assert_text("Invalid month");
        }
    }
}

mod auth {
    use super::*;

    fn secured() -> TestServer {
        let db = Database::open_memory().expect("Failed to create database");
        db.migrate().expect("Failed to migrate");
        let app = create_router_with_security(db, SecurityConfig::with_api_key("s3cret"));
        TestServer::new(app).expect("Failed to create test server")
    }

    #[tokio::test]
    async fn health_needs_no_key() {
        let server = secured();
        server.get("/api/v1/health").await.assert_status_ok();
    }

    #[tokio::test]
    async fn missing_key_is_unauthorized() {
        let server = secured();
        server
            .get("/api/v1/concepts")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_key_is_unauthorized() {
        let server = secured();
        server
            .post("/api/v1/days/2026/10/19/slots")
            .add_header("Authorization", "Bearer nope")
            .json(&json!({}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn correct_key_is_accepted() {
        let server = secured();
        server
            .get("/api/v1/concepts")
            .add_header("Authorization", "Bearer s3cret")
            .await
            .assert_status_ok();
    }
}
