use std::convert::Infallible;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use chrono::{Duration, Utc};
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::AppState;
use crate::db::Database;
use crate::docstore::{PlantDocService, PublicPlant};
use crate::error::ValidationError;
use crate::growth::CareAction;
use crate::models::*;
use crate::mood::{
    analyze_music, analyze_text, analyze_trend, care_suggestion, growth_impact,
    prompt_suggestions, recommendations, unify, AudioFeatures, GrowthImpact, MoodLevel,
    MoodLevelView, MoodReading, MoodTrend, SentimentAnalysis, UnifiedMood,
};
use crate::reminders::dispatch_due;

type ApiResult<T> = Result<T, (StatusCode, String)>;

// ============================================================
// Error Handling
// ============================================================

/// Map a store error to a response.
///
/// Domain rule violations carry a client-safe message; everything else is
/// logged and reported as a bare 500.
fn internal_error(e: anyhow::Error) -> (StatusCode, String) {
    if let Some(err) = e.downcast_ref::<ValidationError>() {
        tracing::warn!("Validation error: {}", err);
        let status = match err {
            ValidationError::NotFound(_) => StatusCode::NOT_FOUND,
            ValidationError::Invalid(_) => StatusCode::BAD_REQUEST,
        };
        return (status, err.to_string());
    }

    tracing::error!("Internal error: {:#}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

fn not_found(what: &str) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("{what} not found"))
}

fn deleted(found: bool, what: &str) -> ApiResult<StatusCode> {
    if found {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(what))
    }
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Users
// ============================================================

pub async fn create_user(
    State(db): State<Database>,
    Json(input): Json<CreateUserInput>,
) -> ApiResult<(StatusCode, Json<User>)> {
    db.create_user(input)
        .map(|u| (StatusCode::CREATED, Json(u)))
        .map_err(internal_error)
}

pub async fn get_user(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    db.get_user(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("User"))
}

pub async fn update_user(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateUserInput>,
) -> ApiResult<Json<User>> {
    db.update_user(id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("User"))
}

pub async fn delete_user(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    deleted(db.delete_user(id).map_err(internal_error)?, "User")
}

pub async fn get_profile(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProfileStats>> {
    db.get_profile_stats(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("User"))
}

// ============================================================
// Moods
// ============================================================

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

pub async fn list_moods(
    State(db): State<Database>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<MoodEntry>>> {
    db.require_user(user_id).map_err(internal_error)?;
    db.get_moods_by_user(user_id, query.limit, query.offset.unwrap_or(0))
        .map(Json)
        .map_err(internal_error)
}

pub async fn create_mood(
    State(db): State<Database>,
    Path(user_id): Path<Uuid>,
    Json(input): Json<CreateMoodInput>,
) -> ApiResult<(StatusCode, Json<MoodEntry>)> {
    db.create_mood(user_id, input)
        .map(|m| (StatusCode::CREATED, Json(m)))
        .map_err(internal_error)
}

pub async fn latest_mood(
    State(db): State<Database>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<MoodCard>> {
    db.require_user(user_id).map_err(internal_error)?;
    let entry = db
        .latest_mood(user_id)
        .map_err(internal_error)?
        .ok_or_else(|| not_found("Mood"))?;
    let display = MoodLevel::from_rating(entry.mood as i64).view();
    Ok(Json(MoodCard { entry, display }))
}

#[derive(Debug, Deserialize)]
pub struct TrendQuery {
    pub days: Option<i64>,
}

/// Sentiment trend over the user's recent journal entries.
pub async fn mood_trend(
    State(db): State<Database>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<TrendQuery>,
) -> ApiResult<Json<MoodTrend>> {
    db.require_user(user_id).map_err(internal_error)?;
    let days = query.days.unwrap_or(7).max(1);
    let since = Duration::try_days(days)
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                format!("days out of range: {}", days),
            )
        })?;

    let scores: Vec<f64> = db
        .get_journal_entries(user_id)
        .map_err(internal_error)?
        .into_iter()
        .filter(|e| e.created_at >= since)
        .map(|e| e.sentiment_score)
        .collect();

    Ok(Json(analyze_trend(&scores)))
}

pub async fn get_mood(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MoodEntry>> {
    db.get_mood(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Mood"))
}

pub async fn delete_mood(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    deleted(db.delete_mood(id).map_err(internal_error)?, "Mood")
}

// ============================================================
// Journal
// ============================================================

pub async fn list_journal(
    State(db): State<Database>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Vec<JournalEntry>>> {
    db.require_user(user_id).map_err(internal_error)?;
    db.get_journal_entries(user_id)
        .map(Json)
        .map_err(internal_error)
}

pub async fn create_journal_entry(
    State(db): State<Database>,
    Path(user_id): Path<Uuid>,
    Json(input): Json<CreateJournalInput>,
) -> ApiResult<(StatusCode, Json<JournalEntry>)> {
    db.create_journal_entry(user_id, input)
        .map(|e| (StatusCode::CREATED, Json(e)))
        .map_err(internal_error)
}

pub async fn journal_prompts(
    State(db): State<Database>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<JournalPrompts>> {
    db.require_user(user_id).map_err(internal_error)?;
    let based_on = db
        .get_journal_entries(user_id)
        .map_err(internal_error)?
        .first()
        .map(|e| e.mood_type);

    let prompts = prompt_suggestions(based_on.map(|m| m.as_str()).unwrap_or_default())
        .into_iter()
        .map(String::from)
        .collect();
    Ok(Json(JournalPrompts { based_on, prompts }))
}

pub async fn get_journal_entry(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<JournalEntry>> {
    db.get_journal_entry(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Journal entry"))
}

pub async fn update_journal_entry(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateJournalInput>,
) -> ApiResult<Json<JournalEntry>> {
    db.update_journal_entry(id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Journal entry"))
}

pub async fn delete_journal_entry(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    deleted(
        db.delete_journal_entry(id).map_err(internal_error)?,
        "Journal entry",
    )
}

// ============================================================
// Plants
// ============================================================

pub async fn list_plants(
    State(db): State<Database>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Plant>>> {
    db.require_user(user_id).map_err(internal_error)?;
    db.get_plants_by_user(user_id)
        .map(Json)
        .map_err(internal_error)
}

pub async fn create_plant(
    State(db): State<Database>,
    Path(user_id): Path<Uuid>,
    Json(input): Json<CreatePlantInput>,
) -> ApiResult<(StatusCode, Json<Plant>)> {
    db.create_plant(user_id, input)
        .map(|p| (StatusCode::CREATED, Json(p)))
        .map_err(internal_error)
}

pub async fn get_plant(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Plant>> {
    db.get_plant(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Plant"))
}

pub async fn update_plant(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdatePlantInput>,
) -> ApiResult<Json<Plant>> {
    db.update_plant(id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Plant"))
}

pub async fn delete_plant(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    deleted(db.delete_plant(id).map_err(internal_error)?, "Plant")
}

pub async fn water_plant(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PlantUpdate>> {
    db.care_for_plant(id, CareAction::Water)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Plant"))
}

pub async fn fertilize_plant(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PlantUpdate>> {
    db.care_for_plant(id, CareAction::Fertilize)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Plant"))
}

pub async fn play_music(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(session): Json<MusicSessionInput>,
) -> ApiResult<Json<PlantUpdate>> {
    if !(0.0..=1.0).contains(&session.mood_score) {
        return Err((
            StatusCode::BAD_REQUEST,
            "mood_score must be between 0 and 1".to_string(),
        ));
    }
    db.play_music_for_plant(id, session)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Plant"))
}

pub async fn plant_logs(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<PlantLog>>> {
    if db.get_plant(id).map_err(internal_error)?.is_none() {
        return Err(not_found("Plant"));
    }
    db.get_plant_logs(id).map(Json).map_err(internal_error)
}

// ============================================================
// Reminders
// ============================================================

pub async fn list_reminders(
    State(db): State<Database>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Reminder>>> {
    db.require_user(user_id).map_err(internal_error)?;
    db.get_reminders_by_user(user_id)
        .map(Json)
        .map_err(internal_error)
}

pub async fn create_reminder(
    State(db): State<Database>,
    Path(user_id): Path<Uuid>,
    Json(input): Json<CreateReminderInput>,
) -> ApiResult<(StatusCode, Json<Reminder>)> {
    db.create_reminder(user_id, input)
        .map(|r| (StatusCode::CREATED, Json(r)))
        .map_err(internal_error)
}

pub async fn get_reminder(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Reminder>> {
    db.get_reminder(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Reminder"))
}

pub async fn update_reminder(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateReminderInput>,
) -> ApiResult<Json<Reminder>> {
    db.update_reminder(id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Reminder"))
}

pub async fn delete_reminder(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    deleted(db.delete_reminder(id).map_err(internal_error)?, "Reminder")
}

#[derive(Debug, Default, Deserialize)]
pub struct DispatchQuery {
    #[serde(default)]
    pub dry_run: bool,
}

pub async fn dispatch_reminders(
    State(db): State<Database>,
    Query(query): Query<DispatchQuery>,
) -> ApiResult<Json<DispatchReport>> {
    dispatch_due(&db, Utc::now(), query.dry_run)
        .map(Json)
        .map_err(internal_error)
}

// ============================================================
// Plant Documents
// ============================================================

pub async fn list_public_plants(
    State(docs): State<PlantDocService>,
) -> ApiResult<Json<Vec<PublicPlant>>> {
    docs.public_plants().map(Json).map_err(internal_error)
}

pub async fn get_plant_doc(
    State(docs): State<PlantDocService>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Value>> {
    docs.get_plant_data(&user_id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Plant data"))
}

#[derive(Debug, Deserialize)]
pub struct WriteDocQuery {
    pub merge: Option<bool>,
}

pub async fn put_plant_doc(
    State(docs): State<PlantDocService>,
    Path(user_id): Path<String>,
    Query(query): Query<WriteDocQuery>,
    Json(data): Json<Value>,
) -> ApiResult<Json<Value>> {
    let written = if query.merge.unwrap_or(true) {
        docs.update_plant_data(&user_id, data)
    } else {
        docs.replace_plant_data(&user_id, data)
    };
    written.map(Json).map_err(internal_error)
}

pub async fn delete_plant_doc(
    State(docs): State<PlantDocService>,
    Path(user_id): Path<String>,
) -> ApiResult<StatusCode> {
    deleted(
        docs.delete_plant_data(&user_id).map_err(internal_error)?,
        "Plant data",
    )
}

/// Server-sent `snapshot` events for one user's plant document: the current
/// state first, then one per change. A deleted document is sent as `null`.
/// The stream ends when the server shuts down.
pub async fn plant_doc_events(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let subscription = state.docs.listen(&user_id).map_err(internal_error)?;
    let mut shutdown = state.shutdown.subscribe();

    let stream = futures_util::stream::unfold(subscription, |mut subscription| async move {
        let snapshot = subscription.next().await?;
        let payload = serde_json::to_string(&snapshot).unwrap_or_else(|_| "null".to_string());
        Some((
            Ok::<_, Infallible>(Event::default().event("snapshot").data(payload)),
            subscription,
        ))
    })
    .take_until(async move {
        let _ = shutdown.recv().await;
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

// ============================================================
// Analysis
// ============================================================

#[derive(Debug, Deserialize)]
pub struct SentimentRequest {
    pub text: String,
}

pub async fn analyze_sentiment(Json(req): Json<SentimentRequest>) -> Json<SentimentAnalysis> {
    Json(analyze_text(&req.text))
}

pub async fn analyze_music_features(Json(features): Json<AudioFeatures>) -> Json<MoodReading> {
    Json(analyze_music(&features))
}

#[derive(Debug, Deserialize)]
pub struct UnifiedRequest {
    /// Journal text to score.
    pub journal: Option<String>,
    pub music: Option<AudioFeatures>,
    #[serde(default)]
    pub growth_points: u32,
}

#[derive(Debug, Serialize)]
pub struct UnifiedAnalysis {
    pub mood: UnifiedMood,
    pub growth: GrowthImpact,
    pub recommendations: Vec<&'static str>,
    pub care_suggestion: &'static str,
}

pub async fn analyze_unified(Json(req): Json<UnifiedRequest>) -> Json<UnifiedAnalysis> {
    let journal = req.journal.as_deref().map(|text| {
        let analysis = analyze_text(text);
        MoodReading::from_score(analysis.score, analysis.confidence)
    });
    let music = req.music.as_ref().map(analyze_music);

    let mood = unify(journal.as_ref(), music.as_ref());
    let growth = growth_impact(&mood, req.growth_points);
    let care = care_suggestion(mood.mood_type.as_str());

    Json(UnifiedAnalysis {
        recommendations: recommendations(mood.score),
        care_suggestion: care,
        growth,
        mood,
    })
}

pub async fn scale_level(Path(value): Path<f64>) -> Json<MoodLevelView> {
    Json(MoodLevel::classify(value).view())
}
