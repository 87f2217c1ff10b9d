//! Single binary web server: HTML page at /, REST API under /api.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. See `TrackerConfig::from_env` for the variables.

use actix_web::{
    get, post, put,
    web::{self, Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use round_robin_tracker::sync::{follow_league, push_writes, refresh_active, refresh_league, subscribe_active};
use round_robin_tracker::{
    CountChange, FileStore, MemoryRemote, RemoteStore, RemoteWrite, Tracker, TrackerConfig,
    TrackerError,
};
use serde::Deserialize;
use std::sync::{Arc, Mutex, RwLock};
use tokio::task::JoinHandle;

/// The tracker is the single owner of league state; handlers never hold it across an await.
type SharedTracker = Data<RwLock<Tracker>>;
type Remote = Data<dyn RemoteStore>;
/// Task applying the active league's change feed.
type Follower = Data<Mutex<Option<JoinHandle<()>>>>;

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

/// Path segment: league label (e.g. /api/leagues/{label})
#[derive(Deserialize)]
struct LeaguePath {
    label: String,
}

/// Path segment: match key (e.g. /api/matches/2-3/toggle)
#[derive(Deserialize)]
struct MatchPath {
    key: String,
}

fn lock_error() -> HttpResponse {
    HttpResponse::InternalServerError().body("lock error")
}

fn error_response(err: TrackerError) -> HttpResponse {
    let body = serde_json::json!({ "error": err.to_string() });
    match err {
        TrackerError::UnknownLeague(_) | TrackerError::UnknownMatch(_) => HttpResponse::NotFound().json(body),
        TrackerError::EditLocked => HttpResponse::Conflict().json(body),
        TrackerError::LockPoisoned => HttpResponse::InternalServerError().json(body),
    }
}

/// Push writes in the background; the response never waits on the remote store.
fn spawn_push(remote: &Remote, origin: uuid::Uuid, writes: Vec<RemoteWrite>) {
    if writes.is_empty() {
        return;
    }
    let remote = remote.clone();
    actix_web::rt::spawn(async move {
        push_writes(remote.get_ref(), origin, writes).await;
    });
}

/// Replace the change-feed task with one for the (possibly new) active league.
fn restart_follower(tracker: &SharedTracker, remote: &Remote, follower: &Follower) {
    let mut slot = match follower.lock() {
        Ok(guard) => guard,
        Err(_) => return,
    };
    if let Some(previous) = slot.take() {
        previous.abort();
    }
    if let Some(subscription) = subscribe_active(tracker.get_ref(), remote.get_ref()) {
        let tracker = tracker.clone().into_inner();
        *slot = Some(actix_web::rt::spawn(follow_league(tracker, subscription)));
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "round-robin-tracker",
    })
}

/// Avoid 404 in browser tab: favicon not required for app logic.
#[get("/favicon.ico")]
async fn favicon() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

/// Active league: fixtures with completion flags, progress, edit lock, league list.
#[get("/api/state")]
async fn api_state(tracker: SharedTracker) -> HttpResponse {
    let mut g = match tracker.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    HttpResponse::Ok().json(g.view())
}

/// Any configured league (404 if the label is unknown).
#[get("/api/leagues/{label}")]
async fn api_get_league(tracker: SharedTracker, path: Path<LeaguePath>) -> HttpResponse {
    let mut g = match tracker.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.league_view(&path.label) {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => error_response(e),
    }
}

/// Switch the active league, then reload it from the remote store and follow its changes.
#[post("/api/leagues/{label}/activate")]
async fn api_activate_league(
    tracker: SharedTracker,
    remote: Remote,
    follower: Follower,
    path: Path<LeaguePath>,
) -> HttpResponse {
    let ticket = {
        let mut g = match tracker.write() {
            Ok(guard) => guard,
            Err(_) => return lock_error(),
        };
        match g.switch_league(&path.label) {
            Ok(ticket) => ticket,
            Err(e) => return error_response(e),
        }
    };
    restart_follower(&tracker, &remote, &follower);
    refresh_league(tracker.get_ref(), remote.get_ref(), ticket).await;

    let mut g = match tracker.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    HttpResponse::Ok().json(g.view())
}

/// Toggle one match of the active league.
#[post("/api/matches/{key}/toggle")]
async fn api_toggle_match(tracker: SharedTracker, remote: Remote, path: Path<MatchPath>) -> HttpResponse {
    let mut g = match tracker.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.toggle(&path.key) {
        Ok(writes) => {
            spawn_push(&remote, g.client_id(), writes);
            HttpResponse::Ok().json(g.view())
        }
        Err(e) => error_response(e),
    }
}

/// Change participant count: `{ "delta": 1 }` or `{ "value": 8 }` (clamped; 409 when locked).
#[put("/api/participants")]
async fn api_set_participants(
    tracker: SharedTracker,
    remote: Remote,
    body: Json<CountChange>,
) -> HttpResponse {
    let mut g = match tracker.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.change_participants(body.into_inner()) {
        Ok(writes) => {
            spawn_push(&remote, g.client_id(), writes);
            HttpResponse::Ok().json(g.view())
        }
        Err(e) => error_response(e),
    }
}

/// Mark every match of the active league incomplete.
#[post("/api/reset")]
async fn api_reset(tracker: SharedTracker, remote: Remote) -> HttpResponse {
    let mut g = match tracker.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    let writes = g.reset();
    spawn_push(&remote, g.client_id(), writes);
    HttpResponse::Ok().json(g.view())
}

/// Fixture list of the active league as CSV.
#[get("/api/fixtures.csv")]
async fn api_fixtures_csv(tracker: SharedTracker) -> HttpResponse {
    let mut g = match tracker.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    let view = g.view();
    match view.league.to_csv() {
        Ok(bytes) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header((
                "Content-Disposition",
                format!("attachment; filename=\"league-{}.csv\"", view.active),
            ))
            .body(bytes),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({ "error": e.to_string() })),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = TrackerConfig::from_env();
    let bind = (config.host.clone(), config.port);
    log::info!(
        "Leagues {:?}, {:?} fixtures, participants {}..={}",
        config.leagues.iter().map(|l| l.as_str()).collect::<Vec<_>>(),
        config.algorithm,
        config.bounds.min,
        config.bounds.max
    );

    let local = FileStore::open(config.data_file.clone());
    log::info!("Local state in {}", local.path().display());
    let tracker = Data::new(RwLock::new(Tracker::new(config, Box::new(local))));
    let remote_store: Arc<dyn RemoteStore> = Arc::new(MemoryRemote::new());
    let remote: Remote = Data::from(remote_store);
    let follower: Follower = Data::new(Mutex::new(None));

    refresh_active(tracker.get_ref(), remote.get_ref()).await;
    restart_follower(&tracker, &remote, &follower);

    log::info!("Starting server at http://{}:{}", bind.0, bind.1);
    HttpServer::new(move || {
        App::new()
            .app_data(tracker.clone())
            .app_data(remote.clone())
            .app_data(follower.clone())
            .route("/", web::get().to(serve_index_async))
            .service(api_health)
            .service(favicon)
            .service(api_state)
            .service(api_get_league)
            .service(api_activate_league)
            .service(api_toggle_match)
            .service(api_set_participants)
            .service(api_reset)
            .service(api_fixtures_csv)
    })
    .bind(bind)?
    .run()
    .await
}

async fn serve_index_async() -> HttpResponse {
    let html = include_str!("../../templates/index.html");
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html)
}
