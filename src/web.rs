use crate::config::{AppConfig, RosterRequirements};
use crate::db::Database;
use crate::error::DraftError;
use crate::feed::DataFeed;
use crate::models::{NewPick, Pick, PlayerView, Position, TeamSlot};
use crate::utils::blend::BlendWeights;
use crate::utils::data::save_picks_to_csv;
use crate::utils::opponents::{predict_position_demand, team_needs, RosterSlot};
use crate::utils::suggestions::{rank_players, top_suggestions, Suggestions};
use crate::{refresh_all, RefreshSummary};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

type ApiResult<T> = Result<T, DraftError>;

/// Shared handles for every request
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub feed: Arc<dyn DataFeed>,
    pub config: Arc<AppConfig>,
    refresh_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(db: Arc<Database>, feed: Arc<dyn DataFeed>, config: AppConfig) -> Self {
        Self {
            db,
            feed,
            config: Arc::new(config),
            refresh_lock: Arc::new(Mutex::new(())),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/refresh", post(refresh))
        .route("/players", get(list_players))
        .route("/suggestions", get(suggestions))
        .route("/picks", post(create_pick).get(list_picks))
        .route("/picks/:pick_id", delete(delete_pick))
        .route("/export/picks", post(export_picks))
        .route("/teams", get(list_teams))
        .route("/teams/:team_slot_id/needs", get(needs_for_team))
        .route("/opponents/predict", post(predict_opponents))
        .route("/status", get(status))
        .route("/settings", get(settings))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn refresh(State(state): State<AppState>) -> ApiResult<Json<RefreshSummary>> {
    let _guard = state
        .refresh_lock
        .try_lock()
        .map_err(|_| DraftError::RefreshInProgress)?;

    let summary = refresh_all(&state.db, state.feed.as_ref()).await?;
    Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
struct PlayersQuery {
    position: Option<String>,
}

async fn list_players(
    State(state): State<AppState>,
    Query(query): Query<PlayersQuery>,
) -> ApiResult<Json<Vec<PlayerView>>> {
    let position = query
        .position
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .map(str::parse::<Position>)
        .transpose()?;

    let board = state.db.load_board(position)?;
    Ok(Json(rank_players(&board, &state.config.weights)))
}

#[derive(Debug, Deserialize)]
struct SuggestionsQuery {
    #[serde(default)]
    available_only: bool,
}

async fn suggestions(
    State(state): State<AppState>,
    Query(query): Query<SuggestionsQuery>,
) -> ApiResult<Json<Suggestions>> {
    let mut board = state.db.load_board(None)?;
    if query.available_only {
        board.retain(|entry| !entry.picked);
    }

    let config = &state.config;
    Ok(Json(top_suggestions(
        &board,
        &config.weights,
        config.suggest_top,
        config.suggest_next,
    )))
}

async fn create_pick(
    State(state): State<AppState>,
    Json(pick): Json<NewPick>,
) -> ApiResult<(StatusCode, Json<Pick>)> {
    let pick = state.db.record_pick(&pick)?;
    info!(
        "Pick {} recorded: overall {} -> {}",
        pick.pick_id, pick.overall_no, pick.player_id
    );
    Ok((StatusCode::CREATED, Json(pick)))
}

async fn list_picks(State(state): State<AppState>) -> ApiResult<Json<Vec<Pick>>> {
    Ok(Json(state.db.list_picks()?))
}

#[derive(Debug, Serialize)]
struct Deleted {
    ok: bool,
    pick_id: i64,
}

async fn delete_pick(
    State(state): State<AppState>,
    Path(pick_id): Path<i64>,
) -> ApiResult<Json<Deleted>> {
    state.db.delete_pick(pick_id)?;
    Ok(Json(Deleted { ok: true, pick_id }))
}

#[derive(Debug, Serialize)]
struct Exported {
    ok: bool,
    path: String,
    picks: usize,
}

async fn export_picks(State(state): State<AppState>) -> ApiResult<Json<Exported>> {
    let picks = state.db.list_picks()?;
    let path = &state.config.export_path;
    save_picks_to_csv(&picks, path)?;
    info!("Exported {} picks to {}", picks.len(), path.display());

    Ok(Json(Exported {
        ok: true,
        path: path.display().to_string(),
        picks: picks.len(),
    }))
}

async fn list_teams(State(state): State<AppState>) -> ApiResult<Json<Vec<TeamSlot>>> {
    Ok(Json(state.db.team_slots()?))
}

#[derive(Debug, Serialize)]
struct TeamNeeds {
    team_slot_id: u32,
    needs: BTreeMap<RosterSlot, u32>,
}

fn needs_of(state: &AppState, team_slot_id: u32) -> ApiResult<BTreeMap<RosterSlot, u32>> {
    if !state.db.team_slot_exists(team_slot_id)? {
        return Err(DraftError::TeamSlotNotFound(team_slot_id));
    }
    let drafted = state.db.drafted_positions(team_slot_id)?;
    Ok(team_needs(&state.config.roster, &drafted))
}

async fn needs_for_team(
    State(state): State<AppState>,
    Path(team_slot_id): Path<u32>,
) -> ApiResult<Json<TeamNeeds>> {
    let needs = needs_of(&state, team_slot_id)?;
    Ok(Json(TeamNeeds {
        team_slot_id,
        needs,
    }))
}

#[derive(Debug, Deserialize)]
struct PredictRequest {
    team_slot_ids: Vec<u32>,
}

#[derive(Debug, Serialize)]
struct PositionDemand {
    teams: usize,
    demand: BTreeMap<RosterSlot, u32>,
}

/// How many of the listed teams still need each slot
async fn predict_opponents(
    State(state): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> ApiResult<Json<PositionDemand>> {
    let needs = request
        .team_slot_ids
        .iter()
        .map(|&id| needs_of(&state, id))
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(Json(PositionDemand {
        teams: needs.len(),
        demand: predict_position_demand(&needs),
    }))
}

#[derive(Debug, Serialize)]
struct Status {
    ok: bool,
    players: usize,
    picks: usize,
    last_refresh: Option<DateTime<Utc>>,
}

async fn status(State(state): State<AppState>) -> ApiResult<Json<Status>> {
    Ok(Json(Status {
        ok: true,
        players: state.db.player_count()?,
        picks: state.db.pick_count()?,
        last_refresh: state.db.last_refresh()?,
    }))
}

#[derive(Debug, Serialize)]
struct Settings {
    league_size: u32,
    suggest_top: usize,
    suggest_next: usize,
    use_cache: bool,
    roster: RosterRequirements,
    weights: BlendWeights,
}

async fn settings(State(state): State<AppState>) -> Json<Settings> {
    let config = &state.config;
    Json(Settings {
        league_size: config.league_size,
        suggest_top: config.suggest_top,
        suggest_next: config.suggest_next,
        use_cache: config.use_cache,
        roster: config.roster,
        weights: config.weights,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{three_player_feed, StaticFeed};
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_state(feed: StaticFeed) -> AppState {
        let db = Database::open(":memory:").unwrap();
        db.seed_team_slots(12).unwrap();
        let config = AppConfig {
            export_path: std::env::temp_dir()
                .join(format!("draft_assistant_web_{}", std::process::id()))
                .join("picks.csv"),
            ..AppConfig::default()
        };
        AppState::new(Arc::new(db), Arc::new(feed), config)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => request
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 1 << 20).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn refreshed_app() -> (AppState, Router) {
        let state = test_state(three_player_feed());
        let app = router(state.clone());
        let (status, _) = send(&app, Method::POST, "/refresh", None).await;
        assert_eq!(status, StatusCode::OK);
        (state, app)
    }

    fn pick(overall_no: u32, team_slot_id: u32, player_id: &str) -> Value {
        json!({
            "round_no": 1,
            "overall_no": overall_no,
            "team_slot_id": team_slot_id,
            "player_id": player_id,
        })
    }

    #[tokio::test]
    async fn test_refresh_reports_players() {
        let state = test_state(three_player_feed());
        let app = router(state);

        let (status, body) = send(&app, Method::POST, "/refresh", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["players"], 3);
        assert_eq!(body["consensus"]["unresolved"], 1);

        let (_, status_body) = send(&app, Method::GET, "/status", None).await;
        assert_eq!(status_body["players"], 3);
        assert_eq!(status_body["picks"], 0);
        assert!(status_body["last_refresh"].is_string());
    }

    #[tokio::test]
    async fn test_concurrent_refresh_is_rejected() {
        let state = test_state(three_player_feed());
        let app = router(state.clone());

        let _held = state.refresh_lock.lock().await;
        let (status, body) = send(&app, Method::POST, "/refresh", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "A refresh is already running");
    }

    #[tokio::test]
    async fn test_failed_required_source_is_bad_gateway() {
        let mut feed = three_player_feed();
        feed.fail_consensus = true;
        let app = router(test_state(feed));

        let (status, body) = send(&app, Method::POST, "/refresh", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().contains("consensus"));
    }

    #[tokio::test]
    async fn test_players_sorted_and_filtered() {
        let (_, app) = refreshed_app().await;

        let (status, body) = send(&app, Method::GET, "/players", None).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["player_id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["7564", "4984", "5189"]);

        let (_, body) = send(&app, Method::GET, "/players?position=qb", None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["clean_name"], "Josh Allen");

        let (status, _) = send(&app, Method::GET, "/players?position=LB", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, Method::GET, "/players?position=", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_pick_lifecycle() {
        let (_, app) = refreshed_app().await;

        let (status, body) = send(&app, Method::POST, "/picks", Some(pick(1, 1, "7564"))).await;
        assert_eq!(status, StatusCode::CREATED);
        let pick_id = body["pick_id"].as_i64().unwrap();

        let (status, _) = send(&app, Method::POST, "/picks", Some(pick(1, 2, "4984"))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        let (status, _) = send(&app, Method::POST, "/picks", Some(pick(2, 2, "7564"))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        let (status, _) = send(&app, Method::POST, "/picks", Some(pick(2, 2, "nobody"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::POST, "/picks", Some(pick(2, 99, "4984"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::POST, "/picks", Some(pick(0, 2, "4984"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send(&app, Method::GET, "/picks", None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        let uri = format!("/picks/{pick_id}");
        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_suggestions_available_only() {
        let (_, app) = refreshed_app().await;
        send(&app, Method::POST, "/picks", Some(pick(1, 1, "7564"))).await;

        let (_, body) = send(&app, Method::GET, "/suggestions", None).await;
        assert_eq!(body["top"][0]["player_id"], "7564");
        assert_eq!(body["top"][0]["picked"], true);
        assert_eq!(body["next"].as_array().unwrap().len(), 0);

        let (_, body) = send(&app, Method::GET, "/suggestions?available_only=true", None).await;
        let top: Vec<&str> = body["top"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["player_id"].as_str().unwrap())
            .collect();
        assert_eq!(top, vec!["4984", "5189"]);
    }

    #[tokio::test]
    async fn test_team_needs_and_prediction() {
        let (_, app) = refreshed_app().await;
        send(&app, Method::POST, "/picks", Some(pick(1, 1, "4984"))).await;

        let (status, body) = send(&app, Method::GET, "/teams/1/needs", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["needs"]["QB"], 0);
        assert_eq!(body["needs"]["RB"], 2);

        let (status, _) = send(&app, Method::GET, "/teams/40/needs", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            &app,
            Method::POST,
            "/opponents/predict",
            Some(json!({ "team_slot_ids": [1, 2] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["teams"], 2);
        assert_eq!(body["demand"]["QB"], 1);
        assert_eq!(body["demand"]["WR"], 2);

        let (_, teams) = send(&app, Method::GET, "/teams", None).await;
        assert_eq!(teams.as_array().unwrap().len(), 12);
    }

    #[tokio::test]
    async fn test_export_writes_csv() {
        let (state, app) = refreshed_app().await;
        send(&app, Method::POST, "/picks", Some(pick(1, 1, "4984"))).await;

        let (status, body) = send(&app, Method::POST, "/export/picks", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["picks"], 1);

        let contents = std::fs::read_to_string(&state.config.export_path).unwrap();
        assert_eq!(contents.lines().count(), 2);
        std::fs::remove_file(&state.config.export_path).ok();
    }

    #[tokio::test]
    async fn test_settings_exposes_weights() {
        let app = router(test_state(StaticFeed::default()));
        let (status, body) = send(&app, Method::GET, "/settings", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["weights"]["secondary_adp"], 0.2);
        assert_eq!(body["roster"]["wr"], 3);
    }
}
