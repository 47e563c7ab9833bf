//! # kj-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the content
//! store. Every handler reads the session from the store it is handed; there
//! is no other notion of "who is asking".

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use kj_core::models::{
    Category, CategoryFilter, CategoryStat, ChainItem, NewQuestion, Question, QuestionId,
    RecentEntry, TrendingQuestion, User, UserProfile,
};
use kj_core::ranking::format_time_ago;
use kj_core::traits::QuestionGenerator;
use kj_core::validation::{self, Registration};
use kj_core::error::AppError;
use kj_core::ContentStore;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::error::ApiError;

/// State shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ContentStore>,
    pub generator: Arc<dyn QuestionGenerator>,
}

type ApiResult<T> = Result<T, ApiError>;

async fn require_session(store: &ContentStore) -> Result<User, AppError> {
    store
        .current_user()
        .await
        .ok_or_else(|| AppError::Unauthorized("login required".into()))
}

pub async fn healthz() -> &'static str {
    "ok"
}

// ── Question generator ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AiQuestionRequest {
    category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AiQuestionResponse {
    question: String,
}

/// `POST /api/ai-question`
pub async fn ai_question(
    State(state): State<AppState>,
    payload: Result<Json<AiQuestionRequest>, JsonRejection>,
) -> ApiResult<Json<AiQuestionResponse>> {
    let Json(request) = payload?;
    let category: Category = request
        .category
        .as_deref()
        .and_then(|c| c.parse().ok())
        .ok_or_else(|| ApiError::bad_request("Invalid category"))?;

    match state.generator.generate(category).await {
        Ok(question) => Ok(Json(AiQuestionResponse { question })),
        Err(e) => {
            error!(%category, error = %e, "question generation failed");
            Err(ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate question",
            ))
        }
    }
}

// ── Questions ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct QuestionQuery {
    q: Option<String>,
    category: Option<String>,
}

/// `GET /api/questions?q=&category=`
///
/// The category filter applies first; a non-blank `q` then narrows by search.
pub async fn list_questions(
    State(state): State<AppState>,
    query: Result<Query<QuestionQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Question>>> {
    let Query(query) = query?;
    let filter: CategoryFilter = query.category.as_deref().unwrap_or("all").parse()?;

    let questions = match query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => state
            .store
            .search_questions(q)
            .await
            .into_iter()
            .filter(|question| filter.matches(question))
            .collect(),
        None => state.store.questions_by_category(filter).await,
    };
    Ok(Json(questions))
}

#[derive(Debug, Deserialize)]
pub struct CreateQuestion {
    title: String,
    category: String,
}

/// `POST /api/questions`
pub async fn create_question(
    State(state): State<AppState>,
    payload: Result<Json<CreateQuestion>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = payload?;
    let user = require_session(&state.store).await?;
    let title = validation::question_title(&body.title)?;
    let category: Category = body.category.parse()?;

    let now = state.store.now();
    let question = state
        .store
        .add_question(NewQuestion {
            title,
            category,
            author: user.display_name,
            time: format_time_ago(now, now),
        })
        .await?;

    info!(id = %question.id, %category, "question posted");
    Ok((StatusCode::CREATED, Json(question)))
}

#[derive(Debug, Serialize)]
pub struct QuestionDetail {
    question: Question,
    chain: Vec<ChainItem>,
}

/// `GET /api/questions/{id}`
pub async fn get_question(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<QuestionDetail>> {
    let id = QuestionId(id);
    let question = state
        .store
        .get_question(id)
        .await
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, format!("question {id} not found")))?;
    let chain = state.store.list_chain(id).await;
    Ok(Json(QuestionDetail { question, chain }))
}

#[derive(Debug, Deserialize)]
pub struct AppendChain {
    text: String,
}

/// `POST /api/questions/{id}/chain`
pub async fn append_chain(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<AppendChain>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = payload?;
    let user = require_session(&state.store).await?;
    let text = validation::chain_text(&body.text)?;

    let now = state.store.now();
    let item = state
        .store
        .append_next_chain_item(QuestionId(id), text, user.display_name, format_time_ago(now, now))
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// `GET /api/trending`
pub async fn trending(State(state): State<AppState>) -> Json<Vec<TrendingQuestion>> {
    Json(state.store.trending().await)
}

/// `GET /api/categories`
pub async fn category_stats(State(state): State<AppState>) -> Json<Vec<CategoryStat>> {
    Json(state.store.category_stats().await)
}

/// `GET /api/recent`
pub async fn recent(State(state): State<AppState>) -> Json<Vec<RecentEntry>> {
    Json(state.store.recent_content().await)
}

// ── Accounts ────────────────────────────────────────────────────────────────

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Registration>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(form) = payload?;
    let user = state.store.register_user(form.validate()?).await?;
    Ok((StatusCode::CREATED, Json(UserProfile::from(&user))))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<UserProfile>> {
    let Json(body) = payload?;
    let user = state
        .store
        .login(body.email.trim(), &body.password)
        .await
        .ok_or_else(|| AppError::Unauthorized("invalid email or password".into()))?;
    Ok(Json(UserProfile::from(&user)))
}

/// `POST /api/auth/logout`
pub async fn logout(State(state): State<AppState>) -> StatusCode {
    state.store.logout().await;
    StatusCode::NO_CONTENT
}

/// `GET /api/auth/me`
pub async fn me(State(state): State<AppState>) -> ApiResult<Json<UserProfile>> {
    let user = require_session(&state.store).await?;
    Ok(Json(UserProfile::from(&user)))
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    username: String,
}

/// `GET /api/users/availability?username=`
pub async fn username_availability(
    State(state): State<AppState>,
    query: Result<Query<AvailabilityQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query?;
    let username = query.username.trim();
    validation::username_shape(username)?;
    let available = state.store.is_username_available(username).await;
    Ok(Json(json!({ "username": username, "available": available })))
}

/// `GET /api/users/{username}`
pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<UserProfile>> {
    let user = state
        .store
        .find_user_by_username(&username)
        .await
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, format!("user {username} not found")))?;
    Ok(Json(UserProfile::from(&user)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    display_name: String,
    #[serde(default)]
    bio: Option<String>,
    #[serde(default)]
    avatar: Option<String>,
}

/// `PUT /api/profile`
pub async fn update_profile(
    State(state): State<AppState>,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> ApiResult<Json<UserProfile>> {
    let Json(body) = payload?;
    let session = require_session(&state.store).await?;

    // the session holds a copy; edit the stored record
    let mut user = state
        .store
        .list_users()
        .await
        .into_iter()
        .find(|u| u.id == session.id)
        .ok_or_else(|| AppError::Unauthorized("session user no longer exists".into()))?;

    user.display_name = validation::display_name(&body.display_name)?;
    user.bio = validation::non_blank(body.bio);
    user.avatar = validation::non_blank(body.avatar);

    state.store.update_user(user.clone()).await?;
    info!(username = %user.username, "profile updated");
    Ok(Json(UserProfile::from(&user)))
}
