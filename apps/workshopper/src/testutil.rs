//! In-process stub of the Gitea endpoints the provisioner touches,
//! backing the reconciler tests.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{json, Value};

pub type SharedState = Arc<Mutex<StubState>>;

#[derive(Debug, Default)]
pub struct StubState {
    pub users: BTreeSet<String>,
    pub apps: Vec<StubApp>,
    pub repos: BTreeSet<(String, String)>,
    /// Repo lookups answered with a zero-value record instead of a 404.
    pub degenerate_repos: BTreeSet<(String, String)>,
    /// Repos whose lookup 404s but whose migration still conflicts.
    pub conflict_on_migrate: BTreeSet<(String, String)>,
    pub user_creates: usize,
    pub app_updates: usize,
    pub migrate_calls: usize,
    next_id: i64,
}

#[derive(Debug, Clone)]
pub struct StubApp {
    pub id: i64,
    pub name: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uris: Vec<String>,
    /// The `Sudo` identity the app was registered under, if any.
    pub owner: Option<String>,
}

impl StubState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

pub async fn spawn_stub(state: SharedState) -> String {
    let router = Router::new()
        .route("/api/v1/users/{username}", get(get_user))
        .route("/api/v1/admin/users", post(create_user))
        .route(
            "/api/v1/user/applications/oauth2",
            get(list_apps).post(create_app),
        )
        .route("/api/v1/user/applications/oauth2/{id}", patch(update_app))
        .route("/api/v1/repos/{owner}/{name}", get(get_repo))
        .route("/api/v1/repos/migrate", post(migrate_repo))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn sudo_of(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Sudo")
        .and_then(|value| value.to_str().ok())
        .map(String::from)
}

fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": format!("{} does not exist", what) })),
    )
        .into_response()
}

fn user_json(username: &str) -> Value {
    json!({
        "id": 1,
        "login": username,
        "email": format!("{}@example.com", username),
    })
}

fn app_json(app: &StubApp, include_secret: bool) -> Value {
    json!({
        "id": app.id,
        "name": app.name,
        "client_id": app.client_id,
        "client_secret": if include_secret { app.client_secret.as_str() } else { "" },
        "redirect_uris": app.redirect_uris,
    })
}

fn repo_json(owner: &str, name: &str) -> Value {
    json!({
        "id": 1,
        "name": name,
        "full_name": format!("{}/{}", owner, name),
        "clone_url": format!("http://stub/{}/{}.git", owner, name),
    })
}

async fn get_user(State(state): State<SharedState>, Path(username): Path<String>) -> Response {
    let state = state.lock().unwrap();
    if state.users.contains(&username) {
        Json(user_json(&username)).into_response()
    } else {
        not_found("user")
    }
}

async fn create_user(State(state): State<SharedState>, Json(body): Json<Value>) -> Response {
    let mut state = state.lock().unwrap();
    let username = body["username"].as_str().unwrap_or_default().to_string();
    state.user_creates += 1;
    state.users.insert(username.clone());
    (StatusCode::CREATED, Json(user_json(&username))).into_response()
}

async fn list_apps(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let state = state.lock().unwrap();
    let sudo = sudo_of(&headers);
    let apps: Vec<Value> = state
        .apps
        .iter()
        .filter(|app| app.owner == sudo)
        .map(|app| app_json(app, false))
        .collect();
    Json(Value::Array(apps)).into_response()
}

async fn create_app(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    let id = state.next_id();
    let app = StubApp {
        id,
        name: body["name"].as_str().unwrap_or_default().to_string(),
        client_id: format!("client-id-{:04}", id),
        client_secret: format!("client-secret-{:04}", id),
        redirect_uris: redirect_uris_of(&body),
        owner: sudo_of(&headers),
    };
    let response = app_json(&app, true);
    state.apps.push(app);
    (StatusCode::CREATED, Json(response)).into_response()
}

async fn update_app(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.app_updates += 1;
    let sudo = sudo_of(&headers);
    match state
        .apps
        .iter_mut()
        .find(|app| app.id == id && app.owner == sudo)
    {
        Some(app) => {
            if let Some(name) = body["name"].as_str() {
                app.name = name.to_string();
            }
            app.redirect_uris = redirect_uris_of(&body);
            let response = app_json(app, false);
            Json(response).into_response()
        }
        None => not_found("oauth2 application"),
    }
}

fn redirect_uris_of(body: &Value) -> Vec<String> {
    body["redirect_uris"]
        .as_array()
        .map(|uris| {
            uris.iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

async fn get_repo(
    State(state): State<SharedState>,
    Path((owner, name)): Path<(String, String)>,
) -> Response {
    let state = state.lock().unwrap();
    let key = (owner.clone(), name.clone());
    if state.degenerate_repos.contains(&key) {
        return Json(json!({ "id": 0, "name": "", "full_name": "", "clone_url": "" }))
            .into_response();
    }
    if state.repos.contains(&key) {
        Json(repo_json(&owner, &name)).into_response()
    } else {
        not_found("repository")
    }
}

async fn migrate_repo(State(state): State<SharedState>, Json(body): Json<Value>) -> Response {
    let mut state = state.lock().unwrap();
    state.migrate_calls += 1;
    let owner = body["repo_owner"].as_str().unwrap_or_default().to_string();
    let name = body["repo_name"].as_str().unwrap_or_default().to_string();
    let key = (owner.clone(), name.clone());
    if state.repos.contains(&key) || state.conflict_on_migrate.contains(&key) {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "message": "repository already exists" })),
        )
            .into_response();
    }
    state.repos.insert(key);
    (StatusCode::CREATED, Json(repo_json(&owner, &name))).into_response()
}
