//! Single binary web server: REST for draws and scoring, Server-Sent Events for live updates.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT (see `Settings`).

use actix_web::{
    get, post,
    web::{Bytes, Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use bracket_engine::{
    parse_participants_csv, CategoryId, InMemoryStore, LiveEvent, MatchConfig, MatchId,
    Participant, Settings, Side, TournamentError, TournamentId, TournamentService,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

type AppState = Data<TournamentService>;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct ParticipantsBody {
    participants: Vec<Participant>,
}

#[derive(Deserialize)]
struct FromGroupBody {
    group_category_id: CategoryId,
    qualifiers: usize,
}

#[derive(Deserialize)]
struct StartBody {
    #[serde(default)]
    config: Option<MatchConfig>,
}

#[derive(Deserialize)]
struct PointBody {
    side: Side,
}

/// Path segments: tournament and category (e.g. /api/tournaments/{id}/categories/{category_id})
#[derive(Deserialize)]
struct CategoryPath {
    id: TournamentId,
    category_id: CategoryId,
}

#[derive(Deserialize)]
struct RoundPath {
    id: TournamentId,
    category_id: CategoryId,
    round: u32,
}

#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

#[derive(Deserialize)]
struct MatchPath {
    match_id: MatchId,
}

fn error_response(e: &TournamentError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        TournamentError::Validation(_) => HttpResponse::BadRequest().json(body),
        TournamentError::NotFound { .. } => HttpResponse::NotFound().json(body),
        TournamentError::State(_) => HttpResponse::Conflict().json(body),
        TournamentError::Consistency { .. } | TournamentError::Store(_) => {
            log::error!("request failed: {}", e);
            HttpResponse::InternalServerError().json(body)
        }
    }
}

fn respond<T: Serialize>(result: Result<T, TournamentError>) -> HttpResponse {
    match result {
        Ok(value) => HttpResponse::Ok().json(value),
        Err(e) => error_response(&e),
    }
}

fn csv_participants(body: &str) -> Result<Vec<Participant>, TournamentError> {
    Ok(parse_participants_csv(body.as_bytes())?)
}

/// Stream live events as SSE until the client disconnects.
fn event_stream(rx: broadcast::Receiver<LiveEvent>) -> HttpResponse {
    let stream = futures::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(data) => {
                        let chunk = Bytes::from(format!("data: {}\n\n", data));
                        return Some((Ok::<_, actix_web::Error>(chunk), rx));
                    }
                    Err(e) => log::warn!("dropping live event for {}: {}", event.match_id, e),
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // snapshots replace state, so the next one catches the client up
                    log::debug!("live subscriber lagged by {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });
    HttpResponse::Ok()
        .insert_header(("Cache-Control", "no-cache"))
        .content_type("text/event-stream")
        .streaming(stream)
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "bracket-engine",
    })
}

/// Generate the group stage for a category.
#[post("/api/tournaments/{id}/categories/{category_id}/round-robin")]
async fn api_generate_round_robin(
    state: AppState,
    path: Path<CategoryPath>,
    body: Json<ParticipantsBody>,
) -> HttpResponse {
    respond(state.generate_round_robin(path.id, path.category_id, &body.participants))
}

/// Same as above, participants as CSV (`id,name,seed`).
#[post("/api/tournaments/{id}/categories/{category_id}/round-robin/csv")]
async fn api_generate_round_robin_csv(state: AppState, path: Path<CategoryPath>, body: String) -> HttpResponse {
    respond(
        csv_participants(&body)
            .and_then(|p| state.generate_round_robin(path.id, path.category_id, &p)),
    )
}

/// Generate the knockout bracket for a category.
#[post("/api/tournaments/{id}/categories/{category_id}/knockout")]
async fn api_generate_knockout(
    state: AppState,
    path: Path<CategoryPath>,
    body: Json<ParticipantsBody>,
) -> HttpResponse {
    respond(state.generate_knockout_bracket(path.id, path.category_id, &body.participants))
}

#[post("/api/tournaments/{id}/categories/{category_id}/knockout/csv")]
async fn api_generate_knockout_csv(state: AppState, path: Path<CategoryPath>, body: String) -> HttpResponse {
    respond(
        csv_participants(&body)
            .and_then(|p| state.generate_knockout_bracket(path.id, path.category_id, &p)),
    )
}

/// Knockout bracket seeded from a group's final standings.
#[post("/api/tournaments/{id}/categories/{category_id}/knockout/from-group")]
async fn api_generate_knockout_from_group(
    state: AppState,
    path: Path<CategoryPath>,
    body: Json<FromGroupBody>,
) -> HttpResponse {
    respond(state.generate_knockout_from_group(
        path.id,
        body.group_category_id,
        path.category_id,
        body.qualifiers,
    ))
}

#[get("/api/tournaments/{id}/categories/{category_id}/matches")]
async fn api_category_matches(state: AppState, path: Path<CategoryPath>) -> HttpResponse {
    respond(state.get_category_matches(path.id, path.category_id))
}

#[get("/api/tournaments/{id}/categories/{category_id}/rounds/{round}")]
async fn api_round_matches(state: AppState, path: Path<RoundPath>) -> HttpResponse {
    respond(state.get_matches_by_round(path.id, path.category_id, path.round))
}

#[get("/api/tournaments/{id}/categories/{category_id}/standings")]
async fn api_standings(state: AppState, path: Path<CategoryPath>) -> HttpResponse {
    respond(state.group_standings(path.id, path.category_id))
}

/// Match with score state and derived overlays (game/match point, serving court).
#[get("/api/matches/{match_id}")]
async fn api_get_match(state: AppState, path: Path<MatchPath>) -> HttpResponse {
    respond(state.get_match(path.match_id))
}

/// Start a pending match; body may override the default match format.
#[post("/api/matches/{match_id}/start")]
async fn api_start_match(state: AppState, path: Path<MatchPath>, body: Option<Json<StartBody>>) -> HttpResponse {
    let config = body.and_then(|b| b.into_inner().config);
    respond(state.start_match(path.match_id, config))
}

#[post("/api/matches/{match_id}/points")]
async fn api_add_point(state: AppState, path: Path<MatchPath>, body: Json<PointBody>) -> HttpResponse {
    respond(state.add_point(path.match_id, body.side))
}

#[post("/api/matches/{match_id}/undo")]
async fn api_undo_point(state: AppState, path: Path<MatchPath>) -> HttpResponse {
    respond(state.undo_last_point(path.match_id))
}

#[post("/api/matches/{match_id}/pause")]
async fn api_pause(state: AppState, path: Path<MatchPath>) -> HttpResponse {
    respond(state.pause_timer(path.match_id))
}

#[post("/api/matches/{match_id}/resume")]
async fn api_resume(state: AppState, path: Path<MatchPath>) -> HttpResponse {
    respond(state.resume_timer(path.match_id))
}

/// Retry advancement of a completed match into its next match.
#[post("/api/matches/{match_id}/advance")]
async fn api_advance(state: AppState, path: Path<MatchPath>) -> HttpResponse {
    respond(state.advance_winner(path.match_id))
}

#[post("/api/matches/{match_id}/announce")]
async fn api_announce(state: AppState, path: Path<MatchPath>) -> HttpResponse {
    match state.announce_match_starting(path.match_id) {
        Ok(()) => HttpResponse::Accepted().finish(),
        Err(e) => error_response(&e),
    }
}

#[get("/api/matches/{match_id}/live")]
async fn api_match_live(state: AppState, path: Path<MatchPath>) -> HttpResponse {
    event_stream(state.subscribe_match(path.match_id))
}

#[get("/api/tournaments/{id}/live")]
async fn api_tournament_live(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    event_stream(state.subscribe_tournament(path.id))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::from_env();
    let bind = (settings.host.clone(), settings.port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);
    log::info!(
        "default match format: {:?}, serve policy: {:?}",
        settings.match_config,
        settings.serve_policy
    );

    let store = Arc::new(InMemoryStore::new());
    let state = Data::new(TournamentService::from_settings(store, &settings));

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_generate_round_robin)
            .service(api_generate_round_robin_csv)
            .service(api_generate_knockout)
            .service(api_generate_knockout_csv)
            .service(api_generate_knockout_from_group)
            .service(api_category_matches)
            .service(api_round_matches)
            .service(api_standings)
            .service(api_get_match)
            .service(api_start_match)
            .service(api_add_point)
            .service(api_undo_point)
            .service(api_pause)
            .service(api_resume)
            .service(api_advance)
            .service(api_announce)
            .service(api_match_live)
            .service(api_tournament_live)
    })
    .bind(bind)?
    .run()
    .await
}
