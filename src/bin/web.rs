//! Single binary web server: REST API over the bracket/draw engine.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default so the app is reachable via DNS on a VPS.
//! Override with env: HOST (e.g. 0.0.0.0), PORT (e.g. 8080).

use actix_web::{
    get, post, put,
    web::{Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use club_bracket_web::models::{GroupId, GroupStanding, ParticipantId, UserId};
use club_bracket_web::{
    apply_draw, create_draw, generate_bracket, get_bracket, resolve_bracket, update_draw,
    DrawId, DrawOutcome, DrawPayload, GenerateBracketRequest, MatchId, Side, StageId, StageKind,
    Tournament, TournamentError, TournamentId,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Per-tournament entry: tournament data + last activity time (for auto-cleanup).
struct TournamentEntry {
    tournament: Tournament,
    last_activity: Instant,
}

/// In-memory state: many tournaments by ID. Entries are removed after 12h inactivity.
type AppState = Data<RwLock<HashMap<TournamentId, TournamentEntry>>>;

/// Inactivity threshold: tournaments not accessed for this long are removed.
const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(12 * 3600);

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct CreateTournamentBody {
    name: String,
}

#[derive(Deserialize)]
struct AddUserBody {
    name: String,
}

#[derive(Deserialize)]
struct AddParticipantBody {
    name: String,
    #[serde(default)]
    user_ids: Vec<UserId>,
}

#[derive(Deserialize)]
struct AddStageBody {
    name: String,
    kind: StageKind,
}

#[derive(Deserialize)]
struct AddGroupBody {
    stage_id: StageId,
    name: String,
}

#[derive(Deserialize)]
struct StandingRow {
    participant_id: ParticipantId,
    rank: Option<u32>,
    #[serde(default)]
    match_points: i32,
}

#[derive(Deserialize)]
struct StandingsBody {
    standings: Vec<StandingRow>,
}

#[derive(Deserialize)]
struct MatchWinnerBody {
    side: Side,
}

#[derive(Deserialize)]
struct UpdateDrawBody {
    #[serde(default)]
    payload: Option<DrawPayload>,
    #[serde(default)]
    result: Option<DrawOutcome>,
}

/// Path segment: tournament id (e.g. /api/tournaments/{id})
#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

#[derive(Deserialize)]
struct TournamentStagePath {
    id: TournamentId,
    stage_id: StageId,
}

#[derive(Deserialize)]
struct TournamentGroupPath {
    id: TournamentId,
    group_id: GroupId,
}

#[derive(Deserialize)]
struct TournamentMatchPath {
    id: TournamentId,
    match_id: MatchId,
}

#[derive(Deserialize)]
struct TournamentDrawPath {
    id: TournamentId,
    draw_id: DrawId,
}

/// Map engine errors to responses: missing entities are 404, everything
/// else is a validation failure (400).
fn error_response(e: &TournamentError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        TournamentError::StageNotFound(_)
        | TournamentError::MatchNotFound(_)
        | TournamentError::DrawNotFound(_)
        | TournamentError::ParticipantNotFound(_)
        | TournamentError::UserNotFound(_)
        | TournamentError::GroupNotFound(_) => HttpResponse::NotFound().json(body),
        _ => HttpResponse::BadRequest().json(body),
    }
}

fn no_tournament() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" }))
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "club-bracket-web",
    })
}

/// Create a new tournament (returns it with id; client stores id for subsequent requests).
#[post("/api/tournaments")]
async fn api_create_tournament(state: AppState, body: Json<CreateTournamentBody>) -> HttpResponse {
    let tournament = Tournament::new(body.name.trim());
    let id = tournament.id;
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    g.insert(
        id,
        TournamentEntry {
            tournament,
            last_activity: Instant::now(),
        },
    );
    match g.get(&id) {
        Some(entry) => HttpResponse::Ok().json(&entry.tournament),
        None => HttpResponse::InternalServerError().body("state error"),
    }
}

/// Get a tournament by id (404 if not found). Touching it refreshes last_activity.
#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.get_mut(&path.id) {
        Some(entry) => {
            entry.last_activity = Instant::now();
            HttpResponse::Ok().json(&entry.tournament)
        }
        None => no_tournament(),
    }
}

/// Register a club member.
#[post("/api/tournaments/{id}/users")]
async fn api_add_user(
    state: AppState,
    path: Path<TournamentPath>,
    body: Json<AddUserBody>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return no_tournament(),
    };
    entry.last_activity = Instant::now();
    let t = &mut entry.tournament;
    match t.add_user(body.name.trim()) {
        Ok(_) => HttpResponse::Ok().json(t),
        Err(e) => error_response(&e),
    }
}

/// Enter a participant (individual or pre-formed team).
#[post("/api/tournaments/{id}/participants")]
async fn api_add_participant(
    state: AppState,
    path: Path<TournamentPath>,
    body: Json<AddParticipantBody>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return no_tournament(),
    };
    entry.last_activity = Instant::now();
    let t = &mut entry.tournament;
    match t.add_participant(body.name.trim(), body.user_ids.clone()) {
        Ok(_) => HttpResponse::Ok().json(t),
        Err(e) => error_response(&e),
    }
}

/// Add a stage (group or knockout).
#[post("/api/tournaments/{id}/stages")]
async fn api_add_stage(
    state: AppState,
    path: Path<TournamentPath>,
    body: Json<AddStageBody>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return no_tournament(),
    };
    entry.last_activity = Instant::now();
    let t = &mut entry.tournament;
    t.add_stage(body.name.trim(), body.kind);
    HttpResponse::Ok().json(t)
}

/// Add a round-robin group to a group stage.
#[post("/api/tournaments/{id}/groups")]
async fn api_add_group(
    state: AppState,
    path: Path<TournamentPath>,
    body: Json<AddGroupBody>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return no_tournament(),
    };
    entry.last_activity = Instant::now();
    let t = &mut entry.tournament;
    match t.add_group(body.stage_id, body.name.trim()) {
        Ok(_) => HttpResponse::Ok().json(t),
        Err(e) => error_response(&e),
    }
}

/// Replace a group's standings (written by the round-robin collaborator).
#[put("/api/tournaments/{id}/groups/{group_id}/standings")]
async fn api_set_standings(
    state: AppState,
    path: Path<TournamentGroupPath>,
    body: Json<StandingsBody>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return no_tournament(),
    };
    entry.last_activity = Instant::now();
    let t = &mut entry.tournament;
    let rows: Vec<GroupStanding> = body
        .standings
        .iter()
        .map(|r| GroupStanding {
            group_id: path.group_id,
            participant_id: r.participant_id,
            rank: r.rank,
            match_points: r.match_points,
        })
        .collect();
    match t.set_group_standings(path.group_id, rows) {
        Ok(()) => HttpResponse::Ok().json(t),
        Err(e) => error_response(&e),
    }
}

/// Record a match winner (score entry collaborator). Callers re-run
/// resolution afterwards to forward the winner.
#[put("/api/tournaments/{id}/matches/{match_id}/winner")]
async fn api_set_match_winner(
    state: AppState,
    path: Path<TournamentMatchPath>,
    body: Json<MatchWinnerBody>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return no_tournament(),
    };
    entry.last_activity = Instant::now();
    let t = &mut entry.tournament;
    match t.record_match_result(path.match_id, body.side) {
        Ok(()) => HttpResponse::Ok().json(t),
        Err(e) => error_response(&e),
    }
}

/// Generate the knockout bracket for a stage (one pass per stage).
#[post("/api/tournaments/{id}/stages/{stage_id}/bracket")]
async fn api_generate_bracket(
    state: AppState,
    path: Path<TournamentStagePath>,
    body: Json<GenerateBracketRequest>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return no_tournament(),
    };
    entry.last_activity = Instant::now();
    let t = &mut entry.tournament;
    match generate_bracket(t, path.stage_id, &body, &mut rand::thread_rng()) {
        Ok(_) => match get_bracket(t, path.stage_id) {
            Ok(view) => HttpResponse::Ok().json(view),
            Err(e) => error_response(&e),
        },
        Err(e) => error_response(&e),
    }
}

/// Read-only projection of a stage's bracket.
#[get("/api/tournaments/{id}/stages/{stage_id}/bracket")]
async fn api_get_bracket(state: AppState, path: Path<TournamentStagePath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return no_tournament(),
    };
    entry.last_activity = Instant::now();
    match get_bracket(&entry.tournament, path.stage_id) {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => error_response(&e),
    }
}

/// Re-run resolution for a stage; returns the number of newly filled sides.
#[post("/api/tournaments/{id}/stages/{stage_id}/bracket/resolve")]
async fn api_resolve_bracket(state: AppState, path: Path<TournamentStagePath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return no_tournament(),
    };
    entry.last_activity = Instant::now();
    let t = &mut entry.tournament;
    match resolve_bracket(t, path.stage_id) {
        Ok(resolved) => HttpResponse::Ok().json(serde_json::json!({ "resolved": resolved })),
        Err(e) => error_response(&e),
    }
}

/// Create a draw session (Draft).
#[post("/api/tournaments/{id}/draws")]
async fn api_create_draw(
    state: AppState,
    path: Path<TournamentPath>,
    body: Json<DrawPayload>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return no_tournament(),
    };
    entry.last_activity = Instant::now();
    let t = &mut entry.tournament;
    match create_draw(t, body.into_inner()) {
        Ok(draw_id) => match t.draw(draw_id) {
            Some(draw) => HttpResponse::Ok().json(draw),
            None => HttpResponse::InternalServerError().body("state error"),
        },
        Err(e) => error_response(&e),
    }
}

/// List all draw sessions of a tournament.
#[get("/api/tournaments/{id}/draws")]
async fn api_get_draws(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return no_tournament(),
    };
    entry.last_activity = Instant::now();
    HttpResponse::Ok().json(&entry.tournament.draws)
}

/// Get one draw session by id.
#[get("/api/tournaments/{id}/draws/{draw_id}")]
async fn api_get_draw(state: AppState, path: Path<TournamentDrawPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return no_tournament(),
    };
    entry.last_activity = Instant::now();
    match entry.tournament.draw(path.draw_id) {
        Some(draw) => HttpResponse::Ok().json(draw),
        None => error_response(&TournamentError::DrawNotFound(path.draw_id)),
    }
}

/// Revise a Draft draw session (payload and/or staged result).
#[put("/api/tournaments/{id}/draws/{draw_id}")]
async fn api_update_draw(
    state: AppState,
    path: Path<TournamentDrawPath>,
    body: Json<UpdateDrawBody>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return no_tournament(),
    };
    entry.last_activity = Instant::now();
    let t = &mut entry.tournament;
    let body = body.into_inner();
    match update_draw(t, path.draw_id, body.payload, body.result) {
        Ok(()) => match t.draw(path.draw_id) {
            Some(draw) => HttpResponse::Ok().json(draw),
            None => HttpResponse::InternalServerError().body("state error"),
        },
        Err(e) => error_response(&e),
    }
}

/// Apply a draw session: commits the staged arrangement atomically and
/// freezes the session.
#[post("/api/tournaments/{id}/draws/{draw_id}/apply")]
async fn api_apply_draw(state: AppState, path: Path<TournamentDrawPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return no_tournament(),
    };
    entry.last_activity = Instant::now();
    let t = &mut entry.tournament;
    match apply_draw(t, path.draw_id, &mut rand::thread_rng()) {
        Ok(()) => HttpResponse::Ok().json(t),
        Err(e) => error_response(&e),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let state = Data::new(RwLock::new(HashMap::<TournamentId, TournamentEntry>::new()));

    // Background task: every 30 minutes, remove tournaments inactive for 12+ hours
    let state_cleanup = state.clone();
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(Duration::from_secs(30 * 60));
        loop {
            interval.tick().await;
            let mut g = match state_cleanup.write() {
                Ok(guard) => guard,
                Err(_) => continue,
            };
            let before = g.len();
            g.retain(|_, entry| entry.last_activity.elapsed() < INACTIVITY_TIMEOUT);
            let removed = before - g.len();
            if removed > 0 {
                log::info!(
                    "Cleaned up {} inactive tournament(s) (no activity for 12h)",
                    removed
                );
            }
        }
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_create_tournament)
            .service(api_get_tournament)
            .service(api_add_user)
            .service(api_add_participant)
            .service(api_add_stage)
            .service(api_add_group)
            .service(api_set_standings)
            .service(api_set_match_winner)
            .service(api_generate_bracket)
            .service(api_get_bracket)
            .service(api_resolve_bracket)
            .service(api_create_draw)
            .service(api_get_draws)
            .service(api_get_draw)
            .service(api_update_draw)
            .service(api_apply_draw)
    })
    .bind(bind)?
    .run()
    .await
}
