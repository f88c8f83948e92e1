use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use plantpal::api::{create_router, create_router_with_security, AppState, SecurityConfig};
use plantpal::db::Database;
use plantpal::models::*;
use serde_json::{json, Value};

fn state() -> AppState {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    AppState::new(db, "plantpal-test")
}

fn setup() -> TestServer {
    TestServer::new(create_router(state())).expect("Failed to create test server")
}

async fn create_test_user(server: &TestServer) -> User {
    server
        .post("/api/v1/users")
        .json(&json!({"username": "willow", "email": "willow@example.com"}))
        .await
        .json::<User>()
}

async fn create_test_plant(server: &TestServer, user: &User) -> Plant {
    server
        .post(&format!("/api/v1/users/{}/plants", user.id))
        .json(&json!({"name": "Fern"}))
        .await
        .json::<Plant>()
}

mod health {
    use super::*;

    #[tokio::test]
    async fn reports_ok() {
        let server = setup();
        let response = server.get("/api/v1/health").await;
        response.assert_status_ok();
        response.assert_json(&json!({"status": "ok"}));
    }
}

mod users {
    use super::*;

    #[tokio::test]
    async fn creates_and_fetches_a_user() {
        let server = setup();
        let user = create_test_user(&server).await;

        let response = server.get(&format!("/api/v1/users/{}", user.id)).await;
        response.assert_status_ok();
        assert_eq!(response.json::<User>().username, "willow");
    }

    #[tokio::test]
    async fn duplicate_username_is_a_bad_request() {
        let server = setup();
        create_test_user(&server).await;

        let response = server
            .post("/api/v1/users")
            .json(&json!({"username": "willow", "email": "again@example.com"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let server = setup();
        let response = server
            .get(&format!("/api/v1/users/{}", uuid::Uuid::new_v4()))
            .await;
        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn delete_returns_no_content_then_not_found() {
        let server = setup();
        let user = create_test_user(&server).await;
        let url = format!("/api/v1/users/{}", user.id);

        server.delete(&url).await.assert_status(StatusCode::NO_CONTENT);
        server.delete(&url).await.assert_status_not_found();
    }

    #[tokio::test]
    async fn profile_summarizes_moods() {
        let server = setup();
        let user = create_test_user(&server).await;
        for mood in [9, 8] {
            server
                .post(&format!("/api/v1/users/{}/moods", user.id))
                .json(&json!({"mood": mood}))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let profile: ProfileStats = server
            .get(&format!("/api/v1/users/{}/profile", user.id))
            .await
            .json();
        assert_eq!(profile.total_moods, 2);
        assert_eq!(profile.average_mood, 8.5);
        assert_eq!(profile.level.label, "Excellent");
    }
}

mod moods {
    use super::*;

    #[tokio::test]
    async fn out_of_range_rating_is_a_bad_request() {
        let server = setup();
        let user = create_test_user(&server).await;

        let response = server
            .post(&format!("/api/v1/users/{}/moods", user.id))
            .json(&json!({"mood": 42}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn mood_for_unknown_user_is_not_found() {
        let server = setup();
        let response = server
            .post(&format!("/api/v1/users/{}/moods", uuid::Uuid::new_v4()))
            .json(&json!({"mood": 5}))
            .await;
        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn latest_includes_the_display_bucket() {
        let server = setup();
        let user = create_test_user(&server).await;
        server
            .post(&format!("/api/v1/users/{}/moods", user.id))
            .json(&json!({"mood": 3, "note": "long day"}))
            .await;

        let card: Value = server
            .get(&format!("/api/v1/users/{}/moods/latest", user.id))
            .await
            .json();
        assert_eq!(card["mood"], 3);
        assert_eq!(card["note"], "long day");
        assert_eq!(card["display"]["label"], "Low");
        assert_eq!(card["display"]["color"], "bg-orange-500");
    }

    #[tokio::test]
    async fn list_honours_limit_and_offset() {
        let server = setup();
        let user = create_test_user(&server).await;
        for mood in [1, 2, 3] {
            server
                .post(&format!("/api/v1/users/{}/moods", user.id))
                .json(&json!({"mood": mood}))
                .await;
        }

        let moods: Vec<MoodEntry> = server
            .get(&format!("/api/v1/users/{}/moods", user.id))
            .add_query_param("limit", 2)
            .add_query_param("offset", 1)
            .await
            .json();
        let ratings: Vec<i32> = moods.iter().map(|m| m.mood).collect();
        assert_eq!(ratings, vec![2, 1]);
    }

    #[tokio::test]
    async fn trend_needs_three_entries() {
        let server = setup();
        let user = create_test_user(&server).await;
        server
            .post(&format!("/api/v1/users/{}/journal", user.id))
            .json(&json!({"text": "a good day"}))
            .await;

        let trend: Value = server
            .get(&format!("/api/v1/users/{}/moods/trend", user.id))
            .await
            .json();
        assert_eq!(trend["trend"], "insufficient_data");
        assert_eq!(trend["days_analyzed"], 1);
    }

    #[tokio::test]
    async fn trend_window_beyond_the_calendar_is_a_bad_request() {
        let server = setup();
        let user = create_test_user(&server).await;

        server
            .get(&format!("/api/v1/users/{}/moods/trend", user.id))
            .add_query_param("days", 100_000_000_000i64)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}

mod journal {
    use super::*;

    #[tokio::test]
    async fn entry_creates_a_journal_mood_and_grows_plants() {
        let server = setup();
        let user = create_test_user(&server).await;
        let plant = create_test_plant(&server, &user).await;

        let response = server
            .post(&format!("/api/v1/users/{}/journal", user.id))
            .json(&json!({"text": "happy great amazing wonderful"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let entry: JournalEntry = response.json();
        assert!(entry.mood_id.is_some());

        let moods: Vec<MoodEntry> = server
            .get(&format!("/api/v1/users/{}/moods", user.id))
            .await
            .json();
        assert_eq!(moods.len(), 1);
        assert_eq!(moods[0].source, EntrySource::Journal);

        let grown: Plant = server
            .get(&format!("/api/v1/plants/{}", plant.id))
            .await
            .json();
        assert_eq!(grown.growth_level, 2);
    }

    #[tokio::test]
    async fn prompts_follow_the_latest_entry() {
        let server = setup();
        let user = create_test_user(&server).await;

        let before: JournalPrompts = server
            .get(&format!("/api/v1/users/{}/journal/prompts", user.id))
            .await
            .json();
        assert!(before.based_on.is_none());
        assert_eq!(before.prompts.len(), 3);

        server
            .post(&format!("/api/v1/users/{}/journal", user.id))
            .json(&json!({"text": "happy great amazing wonderful"}))
            .await;

        let after: Value = server
            .get(&format!("/api/v1/users/{}/journal/prompts", user.id))
            .await
            .json();
        assert_eq!(after["based_on"], "happy");
        assert_eq!(
            after["prompts"][0],
            "What made you feel so good today? Capture all the details!"
        );
    }

    #[tokio::test]
    async fn edit_and_delete() {
        let server = setup();
        let user = create_test_user(&server).await;
        let entry: JournalEntry = server
            .post(&format!("/api/v1/users/{}/journal", user.id))
            .json(&json!({"text": "a good day"}))
            .await
            .json();
        let url = format!("/api/v1/journal/{}", entry.id);

        let edited: JournalEntry = server
            .put(&url)
            .json(&json!({"is_favorite": true}))
            .await
            .json();
        assert!(edited.is_favorite);
        assert_eq!(edited.text, "a good day");

        server.delete(&url).await.assert_status(StatusCode::NO_CONTENT);
        server.get(&url).await.assert_status_not_found();
    }
}

mod plants {
    use super::*;

    #[tokio::test]
    async fn watering_returns_the_plant_and_log() {
        let server = setup();
        let user = create_test_user(&server).await;
        let plant = create_test_plant(&server, &user).await;

        let update: Value = server
            .post(&format!("/api/v1/plants/{}/water", plant.id))
            .await
            .json();
        assert_eq!(update["log"]["activity"], "watered");
        assert!(update["plant"]["last_watered"].is_string());

        let logs: Vec<PlantLog> = server
            .get(&format!("/api/v1/plants/{}/logs", plant.id))
            .await
            .json();
        assert_eq!(logs.len(), 1);
    }

    #[tokio::test]
    async fn music_session_can_level_up() {
        let server = setup();
        let user = create_test_user(&server).await;
        let plant = create_test_plant(&server, &user).await;

        let update: PlantUpdate = server
            .post(&format!("/api/v1/plants/{}/music", plant.id))
            .json(&json!({"mood_score": 1.0, "minutes": 10}))
            .await
            .json();
        assert_eq!(update.plant.growth_level, 2);
        assert_eq!(update.log.activity, PlantActivity::MusicBoost);
    }

    #[tokio::test]
    async fn music_score_out_of_range_is_a_bad_request() {
        let server = setup();
        let user = create_test_user(&server).await;
        let plant = create_test_plant(&server, &user).await;

        server
            .post(&format!("/api/v1/plants/{}/music", plant.id))
            .json(&json!({"mood_score": 2.0, "minutes": 5}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn care_for_unknown_plant_is_not_found() {
        let server = setup();
        server
            .post(&format!("/api/v1/plants/{}/fertilize", uuid::Uuid::new_v4()))
            .await
            .assert_status_not_found();
    }
}

mod reminders {
    use super::*;

    #[tokio::test]
    async fn dispatch_marks_due_reminders() {
        let server = setup();
        let user = create_test_user(&server).await;
        let past = chrono::Utc::now() - chrono::Duration::minutes(5);

        let reminder: Reminder = server
            .post(&format!("/api/v1/users/{}/reminders", user.id))
            .json(&json!({"title": "Journal time", "scheduled_for": past}))
            .await
            .json();
        assert_eq!(reminder.days_of_week, ALL_DAYS);

        let dry: DispatchReport = server
            .post("/api/v1/reminders/dispatch")
            .add_query_param("dry_run", true)
            .await
            .json();
        assert_eq!(dry.sent, 1);

        let report: DispatchReport = server.post("/api/v1/reminders/dispatch").await.json();
        assert_eq!(report.sent, 1);

        let after: Reminder = server
            .get(&format!("/api/v1/reminders/{}", reminder.id))
            .await
            .json();
        assert!(after.notified);
    }

    #[tokio::test]
    async fn bad_days_of_week_is_a_bad_request() {
        let server = setup();
        let user = create_test_user(&server).await;

        server
            .post(&format!("/api/v1/users/{}/reminders", user.id))
            .json(&json!({
                "title": "Water",
                "scheduled_for": chrono::Utc::now(),
                "days_of_week": "0"
            }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}

mod plant_docs {
    use super::*;

    #[tokio::test]
    async fn put_merges_by_default() {
        let server = setup();

        server
            .put("/api/v1/plant-docs/u1")
            .json(&json!({"name": "Fern", "health": 90}))
            .await
            .assert_status_ok();
        let merged: Value = server
            .put("/api/v1/plant-docs/u1")
            .json(&json!({"health": 70}))
            .await
            .json();

        assert_eq!(merged["name"], "Fern");
        assert_eq!(merged["health"], 70);
        assert_eq!(merged["userId"], "u1");
    }

    #[tokio::test]
    async fn put_with_merge_false_replaces() {
        let server = setup();
        server
            .put("/api/v1/plant-docs/u1")
            .json(&json!({"name": "Fern"}))
            .await;

        let replaced: Value = server
            .put("/api/v1/plant-docs/u1")
            .add_query_param("merge", false)
            .json(&json!({"health": 10}))
            .await
            .json();
        assert!(replaced.get("name").is_none());
    }

    #[tokio::test]
    async fn non_object_body_is_a_bad_request() {
        let server = setup();
        server
            .put("/api/v1/plant-docs/u1")
            .json(&json!([1, 2, 3]))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_document_is_not_found_and_garden_lists_users() {
        let server = setup();
        server.get("/api/v1/plant-docs/u1").await.assert_status_not_found();

        server
            .put("/api/v1/plant-docs/u1")
            .json(&json!({"name": "Fern"}))
            .await;
        let garden: Vec<Value> = server.get("/api/v1/plant-docs").await.json();
        assert_eq!(garden.len(), 1);
        assert_eq!(garden[0]["user_id"], "u1");

        server
            .delete("/api/v1/plant-docs/u1")
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }
}

mod plant_doc_events {
    use std::time::Duration;

    use axum::body::{Body, BodyDataStream};
    use axum::http::Request;
    use futures_util::StreamExt;
    use tower::ServiceExt;

    use super::*;

    async fn open_stream(state: AppState, user_id: &str) -> BodyDataStream {
        let response = create_router(state)
            .oneshot(
                Request::get(format!("/api/v1/plant-docs/{}/events", user_id))
                    .body(Body::empty())
                    .expect("Failed to build request"),
            )
            .await
            .expect("Request failed");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            HeaderValue::from_static("text/event-stream")
        );
        response.into_body().into_data_stream()
    }

    /// Read events until `text` shows up in the accumulated stream.
    async fn read_until(stream: &mut BodyDataStream, seen: &mut String, text: &str) {
        while !seen.contains(text) {
            let chunk = tokio::time::timeout(Duration::from_secs(2), stream.next())
                .await
                .expect("Timed out waiting for an event")
                .expect("Stream ended early")
                .expect("Stream failed");
            seen.push_str(&String::from_utf8_lossy(&chunk));
        }
    }

    #[tokio::test]
    async fn sends_the_current_snapshot_then_each_change() {
        let state = state();
        let mut stream = open_stream(state.clone(), "u1").await;
        let mut seen = String::new();

        read_until(&mut stream, &mut seen, "data: null").await;
        assert!(seen.starts_with("event: snapshot\n"));

        state
            .docs
            .update_plant_data("u1", json!({"health": 42}))
            .expect("Write failed");
        read_until(&mut stream, &mut seen, "\"health\":42").await;

        seen.clear();
        state.docs.delete_plant_data("u1").expect("Delete failed");
        read_until(&mut stream, &mut seen, "data: null").await;
        assert!(seen.contains("event: snapshot"));
    }

    #[tokio::test]
    async fn ends_on_shutdown() {
        let state = state();
        let mut stream = open_stream(state.clone(), "u1").await;
        let mut seen = String::new();
        read_until(&mut stream, &mut seen, "data: null").await;

        state.shutdown.send(()).expect("No stream listening");

        let end = tokio::time::timeout(Duration::from_secs(2), async {
            while let Some(chunk) = stream.next().await {
                chunk.expect("Stream failed");
            }
        })
        .await;
        assert!(end.is_ok(), "Stream stayed open after shutdown");
    }
}

mod analysis {
    use super::*;

    #[tokio::test]
    async fn sentiment_scores_text() {
        let server = setup();
        let result: Value = server
            .post("/api/v1/analysis/sentiment")
            .json(&json!({"text": "happy great amazing wonderful"}))
            .await
            .json();
        assert_eq!(result["mood_type"], "happy");
        assert_eq!(result["positive_words"], 4);
    }

    #[tokio::test]
    async fn unified_without_sources_is_neutral() {
        let server = setup();
        let result: Value = server
            .post("/api/v1/analysis/unified")
            .json(&json!({}))
            .await
            .json();
        assert_eq!(result["mood"]["mood_type"], "neutral");
        assert_eq!(result["mood"]["confidence"], 0.0);
        assert!(result["recommendations"].as_array().is_some());
    }

    #[tokio::test]
    async fn unified_combines_journal_and_music() {
        let server = setup();
        let result: Value = server
            .post("/api/v1/analysis/unified")
            .json(&json!({
                "journal": "happy great amazing wonderful",
                "music": {"valence": 0.9, "energy": 0.8},
                "growth_points": 10
            }))
            .await
            .json();
        assert_eq!(result["mood"]["sources"], json!(["journal", "music"]));
        assert!(result["growth"]["new_growth_points"].as_u64().unwrap() > 10);
    }

    #[tokio::test]
    async fn scale_maps_values_to_levels() {
        let server = setup();
        let level: Value = server.get("/api/v1/analysis/scale/8").await.json();
        assert_eq!(level["label"], "Excellent");

        let level: Value = server.get("/api/v1/analysis/scale/-3").await.json();
        assert_eq!(level["label"], "Very Low");
    }
}

mod security {
    use super::*;

    fn secured(config: SecurityConfig) -> TestServer {
        TestServer::new(create_router_with_security(state(), config))
            .expect("Failed to create test server")
    }

    #[tokio::test]
    async fn requires_the_api_key() {
        let server = secured(SecurityConfig::with_api_key("sekrit"));

        server.get("/api/v1/plant-docs").await.assert_status(StatusCode::UNAUTHORIZED);
        server
            .get("/api/v1/plant-docs")
            .authorization_bearer("wrong")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server
            .get("/api/v1/plant-docs")
            .authorization_bearer("sekrit")
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn health_is_open_without_a_key() {
        let server = secured(SecurityConfig::with_api_key("sekrit"));
        server.get("/api/v1/health").await.assert_status_ok();
    }

    #[tokio::test]
    async fn rate_limit_returns_too_many_requests() {
        let server = secured(SecurityConfig::with_rate_limit(2));
        let ip = (
            HeaderName::from_static("x-forwarded-for"),
            HeaderValue::from_static("203.0.113.9"),
        );

        for _ in 0..2 {
            server
                .get("/api/v1/health")
                .add_header(ip.0.clone(), ip.1.clone())
                .await
                .assert_status_ok();
        }
        server
            .get("/api/v1/health")
            .add_header(ip.0.clone(), ip.1.clone())
            .await
            .assert_status(StatusCode::TOO_MANY_REQUESTS);
    }
}
