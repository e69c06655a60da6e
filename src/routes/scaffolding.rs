use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::response::AppError;
use crate::scaffolding::{
    DecisionRule, Factors, LearningContext, ScaffoldLevel, ScaffoldingConfig, TopicDifficulty,
};
use crate::services::tutor_prompt::{build_envelope, TutorPromptEnvelope};
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct SuccessResponse<T> {
    success: bool,
    data: T,
}

impl<T> SuccessResponse<T> {
    fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Serialize)]
struct SuccessMessageResponse {
    success: bool,
    message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionRequest {
    config: Option<ScaffoldingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionResponse {
    session_id: String,
    current_level: ScaffoldLevel,
    config: ScaffoldingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetermineRequest {
    attempts: Option<u32>,
    #[serde(alias = "timeOnTaskSeconds")]
    time_on_task: Option<f64>,
    problem_start_time: Option<i64>,
    student_proficiency: Option<f64>,
    help_frequency: Option<f64>,
    topic_difficulty: Option<String>,
    requested_level: Option<i64>,
    module: Option<String>,
}

impl DetermineRequest {
    fn to_context(&self) -> Result<LearningContext, AppError> {
        let requested_level = self
            .requested_level
            .map(ScaffoldLevel::from_number)
            .transpose()?;

        Ok(LearningContext {
            attempts: self.attempts,
            time_on_task_seconds: self.time_on_task,
            problem_start_time: self.problem_start_time,
            student_proficiency: self.student_proficiency,
            help_frequency: self.help_frequency,
            topic_difficulty: self.topic_difficulty.as_deref().map(TopicDifficulty::parse),
            requested_level,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DetermineResponse {
    session_id: String,
    level: ScaffoldLevel,
    previous_level: ScaffoldLevel,
    changed: bool,
    rule: DecisionRule,
    #[serde(skip_serializing_if = "Option::is_none")]
    factors: Option<Factors>,
    prompt: TutorPromptEnvelope,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OutcomeRequest {
    successful: bool,
    #[serde(flatten)]
    metadata: Map<String, Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutcomeResponse {
    recorded_outcomes: usize,
    proficiency: f64,
    trend: f64,
    success_streak: u32,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/:session_id", axum::routing::delete(end_session))
        .route("/sessions/:session_id/determine", post(determine_level))
        .route("/sessions/:session_id/outcomes", post(track_outcome))
        .route("/sessions/:session_id/summary", get(get_summary))
        .route("/sessions/:session_id/export", get(export_session))
        .route("/sessions/:session_id/reset", post(reset_session))
}

async fn create_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        CreateSessionRequest::default()
    } else {
        serde_json::from_slice::<CreateSessionRequest>(&body)
            .map_err(|e| AppError::validation(format!("invalid session request: {e}")))?
    };

    let (session_id, engine) = state.sessions().create(request.config)?;
    let (current_level, config) = {
        let engine = engine.lock();
        (engine.current_level(), engine.config().clone())
    };

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new(CreateSessionResponse {
            session_id,
            current_level,
            config,
        })),
    ))
}

async fn determine_level(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(body): Json<DetermineRequest>,
) -> Result<impl IntoResponse, AppError> {
    let context = body.to_context()?;
    let engine = state.sessions().get(&session_id)?;

    let decision = engine.lock().decide(&context);

    let prompt = build_envelope(
        decision.level,
        body.module.as_deref(),
        decision.signals.proficiency,
    );

    Ok(Json(SuccessResponse::new(DetermineResponse {
        session_id,
        level: decision.level,
        previous_level: decision.previous_level,
        changed: decision.changed(),
        rule: decision.rule,
        factors: decision.factors,
        prompt,
    })))
}

async fn track_outcome(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(body): Json<OutcomeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let engine = state.sessions().get(&session_id)?;

    let response = {
        let mut engine = engine.lock();
        engine.track_outcome(body.successful, body.metadata);
        OutcomeResponse {
            recorded_outcomes: engine.performance_history().len(),
            proficiency: engine.calculate_proficiency(),
            trend: engine.calculate_recent_trend(),
            success_streak: engine.recent_success_streak(),
        }
    };

    Ok(Json(SuccessResponse::new(response)))
}

async fn get_summary(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let engine = state.sessions().get(&session_id)?;
    let summary = engine.lock().summary();
    Ok(Json(SuccessResponse::new(summary)))
}

async fn export_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let engine = state.sessions().get(&session_id)?;
    let export = engine.lock().export_for_research();
    Ok(Json(SuccessResponse::new(export)))
}

async fn reset_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let engine = state.sessions().get(&session_id)?;
    engine.lock().reset();

    Ok(Json(SuccessMessageResponse {
        success: true,
        message: "scaffolding session reset".to_string(),
    }))
}

async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let export = state.sessions().end(&session_id)?;
    Ok(Json(SuccessResponse::new(export)))
}
