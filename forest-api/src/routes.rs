//! HTTP route handlers for the forest API.
//!
//! Handlers only translate between HTTP and the engine: every operation runs
//! on the blocking pool through [`run_blocking`], and successful writes are
//! broadcast to SSE subscribers afterwards.

use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use growth::core::types::Question;
use growth::error::GrowthError;
use growth::habit::HabitRecord;
use growth::lifecycle::{self, Completion, Planting};
use growth::report::{self, ForestStats};
use growth::submit::{AnswerOutcome, submit_answer};
use growth::today::{self, DEFAULT_HISTORY_LIMIT, TodayHabits};
use growth::tree::Tree;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::owner::Owner;
use crate::state::{AppState, ForestEvent};

/// Build the API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/trees", get(list_trees).post(create_tree))
        .route("/trees/current", get(current_tree))
        .route("/trees/{tree_id}/complete", post(complete_tree))
        .route("/habits/answer", post(answer))
        .route("/habits/today/{tree_id}", get(today_habits))
        .route("/habits/history/{tree_id}", get(habit_history))
        .route("/habits/stats", get(stats))
}

/// Run an engine call on the blocking pool; SQLite access is synchronous.
async fn run_blocking<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&AppState) -> Result<T, GrowthError> + Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|err| {
            GrowthError::PersistenceUnavailable(format!("blocking task failed: {}", err))
        })?
        .map_err(ApiError::from)
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Serialize)]
struct TreeResponse {
    tree: Tree,
}

#[derive(Serialize)]
struct TreesResponse {
    trees: Vec<Tree>,
}

#[derive(Serialize)]
struct PlantedResponse {
    message: &'static str,
    tree: Tree,
}

#[derive(Serialize)]
struct CompletedResponse {
    message: &'static str,
    #[serde(flatten)]
    completion: Completion,
}

#[derive(Serialize)]
struct AnsweredResponse {
    message: &'static str,
    #[serde(flatten)]
    outcome: AnswerOutcome,
}

#[derive(Serialize)]
struct HistoryResponse {
    habits: Vec<HabitRecord>,
}

/// GET /api/trees/current - current tree, day rolled forward.
async fn current_tree(
    State(state): State<AppState>,
    Owner(owner): Owner,
) -> Result<Json<TreeResponse>, ApiError> {
    let tree = run_blocking(&state, move |s| {
        lifecycle::get_current_tree(s.store.as_ref(), s.clock.as_ref(), &owner)
    })
    .await?;
    Ok(Json(TreeResponse { tree }))
}

/// GET /api/trees - all trees, oldest first.
async fn list_trees(
    State(state): State<AppState>,
    Owner(owner): Owner,
) -> Result<Json<TreesResponse>, ApiError> {
    let trees =
        run_blocking(&state, move |s| lifecycle::list_trees(s.store.as_ref(), &owner)).await?;
    Ok(Json(TreesResponse { trees }))
}

/// POST /api/trees - plant the caller's tree (returns the existing one if growing).
async fn create_tree(
    State(state): State<AppState>,
    Owner(owner): Owner,
) -> Result<(StatusCode, Json<PlantedResponse>), ApiError> {
    let Planting { tree, planted } = run_blocking(&state, move |s| {
        lifecycle::plant_tree(s.store.as_ref(), s.clock.as_ref(), s.forest_radius, &owner)
    })
    .await?;
    if planted {
        state.publish(ForestEvent::TreePlanted { tree: tree.clone() });
    }
    Ok((
        StatusCode::CREATED,
        Json(PlantedResponse {
            message: "Tree created successfully",
            tree,
        }),
    ))
}

/// POST /api/trees/{tree_id}/complete - retire the tree on day 7 and plant the next.
async fn complete_tree(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(tree_id): Path<String>,
) -> Result<Json<CompletedResponse>, ApiError> {
    let completion = run_blocking(&state, move |s| {
        lifecycle::complete_if_ready(
            s.store.as_ref(),
            s.clock.as_ref(),
            s.forest_radius,
            &owner,
            &tree_id,
        )
    })
    .await?;
    state.publish(ForestEvent::TreeCompleted {
        completed_tree: completion.completed_tree.clone(),
        new_tree: completion.new_tree.clone(),
    });
    Ok(Json(CompletedResponse {
        message: "Tree completed and new tree planted",
        completion,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnswerRequest {
    tree_id: String,
    question_id: String,
    answer: bool,
}

/// POST /api/habits/answer - record one answer for today.
async fn answer(
    State(state): State<AppState>,
    Owner(owner): Owner,
    body: Result<Json<AnswerRequest>, JsonRejection>,
) -> Result<Json<AnsweredResponse>, ApiError> {
    let Json(request) = body.map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
    if request.tree_id.trim().is_empty() {
        return Err(ApiError::Validation("treeId is required".to_string()));
    }
    let question: Question = request.question_id.parse()?;

    let outcome = run_blocking(&state, move |s| {
        submit_answer(
            s.store.as_ref(),
            s.clock.as_ref(),
            &owner,
            &request.tree_id,
            question,
            request.answer,
        )
    })
    .await?;
    state.publish(ForestEvent::TreeUpdated {
        tree: outcome.tree.clone(),
    });
    Ok(Json(AnsweredResponse {
        message: "Habit answer recorded successfully",
        outcome,
    }))
}

/// GET /api/habits/today/{tree_id} - today's answers for a tree.
async fn today_habits(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(tree_id): Path<String>,
) -> Result<Json<TodayHabits>, ApiError> {
    let view = run_blocking(&state, move |s| {
        today::today(s.store.as_ref(), s.clock.as_ref(), &owner, &tree_id)
    })
    .await?;
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    limit: Option<u32>,
    offset: Option<u32>,
}

/// GET /api/habits/history/{tree_id}?limit&offset - past records, newest first.
async fn habit_history(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(tree_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let offset = query.offset.unwrap_or(0);
    let habits = run_blocking(&state, move |s| {
        today::history(s.store.as_ref(), &owner, &tree_id, limit, offset)
    })
    .await?;
    Ok(Json(HistoryResponse { habits }))
}

/// GET /api/habits/stats - aggregate stats for the caller.
async fn stats(
    State(state): State<AppState>,
    Owner(owner): Owner,
) -> Result<Json<ForestStats>, ApiError> {
    let stats = run_blocking(&state, move |s| report::stats(s.store.as_ref(), &owner)).await?;
    Ok(Json(stats))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, header};
    use growth::core::types::DEFAULT_FOREST_RADIUS;
    use growth::test_support::{FixedClock, memory_store};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::owner::OWNER_HEADER;

    const CALLER: &str = "caller";

    fn test_app() -> (Router, AppState, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::at_fixture_time());
        let state = AppState::new(memory_store(), clock.clone(), DEFAULT_FOREST_RADIUS);
        let app = api_router().with_state(state.clone());
        (app, state, clock)
    }

    fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(OWNER_HEADER, CALLER);
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        }
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn plant(app: &Router) -> String {
        let (status, body) = send(app, request("POST", "/trees", None)).await;
        assert_eq!(status, StatusCode::CREATED);
        body["tree"]["id"].as_str().expect("tree id").to_string()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (app, _, _) = test_app();
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_owner_header_is_unauthenticated() {
        let (app, _, _) = test_app();
        let request = Request::get("/trees/current").body(Body::empty()).expect("request");
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn no_current_tree_is_not_found() {
        let (app, _, _) = test_app();
        let (status, body) = send(&app, request("GET", "/trees/current", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NO_CURRENT_TREE");
    }

    #[tokio::test]
    async fn plant_answer_and_read_back() {
        let (app, state, _) = test_app();
        let mut events = state.event_tx.subscribe();
        let tree_id = plant(&app).await;
        assert!(matches!(events.try_recv(), Ok(ForestEvent::TreePlanted { .. })));

        let body = json!({ "treeId": tree_id, "questionId": "hydration", "answer": true });
        let (status, answered) = send(&app, request("POST", "/habits/answer", Some(body))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(answered["message"], "Habit answer recorded successfully");
        assert_eq!(answered["tree"]["health"], 55);
        assert_eq!(answered["tree"]["stage"], "sapling");
        assert_eq!(answered["healthChange"], 5);
        assert_eq!(answered["remainingQuestions"], 3);
        assert_eq!(answered["habitRecord"]["hydration"], "positive");
        assert!(matches!(events.try_recv(), Ok(ForestEvent::TreeUpdated { .. })));

        let (status, today) =
            send(&app, request("GET", &format!("/habits/today/{}", tree_id), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(today["answeredCount"], 1);
        assert_eq!(today["isComplete"], false);

        let (_, current) = send(&app, request("GET", "/trees/current", None)).await;
        assert_eq!(current["tree"]["health"], 55);
    }

    #[tokio::test]
    async fn replanting_returns_the_tree_without_an_event() {
        let (app, state, _) = test_app();
        let tree_id = plant(&app).await;
        let mut events = state.event_tx.subscribe();

        let (status, body) = send(&app, request("POST", "/trees", None)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["tree"]["id"], tree_id.as_str());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn repeated_answer_is_rejected() {
        let (app, _, _) = test_app();
        let tree_id = plant(&app).await;
        let body = json!({ "treeId": tree_id, "questionId": "sleep", "answer": false });

        send(&app, request("POST", "/habits/answer", Some(body.clone()))).await;
        let (status, err) = send(&app, request("POST", "/habits/answer", Some(body))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "QUESTION_ALREADY_ANSWERED");
    }

    #[tokio::test]
    async fn invalid_answer_bodies_are_validation_errors() {
        let (app, _, _) = test_app();
        let tree_id = plant(&app).await;

        let unknown = json!({ "treeId": tree_id, "questionId": "exercise", "answer": true });
        let (status, err) = send(&app, request("POST", "/habits/answer", Some(unknown))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "VALIDATION_ERROR");

        let not_bool = json!({ "treeId": tree_id, "questionId": "mood", "answer": "yes" });
        let (status, err) = send(&app, request("POST", "/habits/answer", Some(not_bool))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn completion_waits_for_day_seven() {
        let (app, state, clock) = test_app();
        let tree_id = plant(&app).await;
        let uri = format!("/trees/{}/complete", tree_id);

        let (status, err) = send(&app, request("POST", &uri, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "TREE_NOT_READY");

        clock.advance_days(6);
        let mut events = state.event_tx.subscribe();
        let (status, done) = send(&app, request("POST", &uri, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(done["completedTree"]["id"], tree_id.as_str());
        assert_eq!(done["completedTree"]["isCurrent"], false);
        assert_eq!(done["newTree"]["treeNumber"], 2);
        assert!(matches!(events.try_recv(), Ok(ForestEvent::TreeCompleted { .. })));

        let (_, trees) = send(&app, request("GET", "/trees", None)).await;
        assert_eq!(trees["trees"].as_array().expect("trees").len(), 2);
    }

    #[tokio::test]
    async fn other_callers_tree_is_not_found() {
        let (app, _, _) = test_app();
        let tree_id = plant(&app).await;

        let request = Request::get(format!("/habits/today/{}", tree_id))
            .header(OWNER_HEADER, "intruder")
            .body(Body::empty())
            .expect("request");
        let (status, err) = send(&app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err["code"], "TREE_NOT_FOUND");
    }

    #[tokio::test]
    async fn history_and_stats_after_a_few_days() {
        let (app, _, clock) = test_app();
        let tree_id = plant(&app).await;
        for _ in 0..3 {
            let body = json!({ "treeId": tree_id, "questionId": "food", "answer": true });
            send(&app, request("POST", "/habits/answer", Some(body))).await;
            clock.advance_days(1);
        }

        let uri = format!("/habits/history/{}?limit=2", tree_id);
        let (status, history) = send(&app, request("GET", &uri, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(history["habits"].as_array().expect("habits").len(), 2);

        let (status, stats) = send(&app, request("GET", "/habits/stats", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["userStats"]["totalPositiveAnswers"], 3);
        assert_eq!(stats["userStats"]["currentStreak"], 3);
        assert_eq!(stats["habitStats"]["daysRecorded"], 3);
    }
}
