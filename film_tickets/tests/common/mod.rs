//! In-process stand-in for the ticketing service.
//!
//! Serves the subset of the HTTP API the client tests exercise and records
//! what it receives so tests can assert on headers and bodies.

#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use film_tickets::{
    SessionStore,
    api::ApiClient,
    auth::{AuthManager, Principal, Role},
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

pub const PASSWORD: &str = "Secret123!";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const USER_EMAIL: &str = "user@example.com";
pub const ADMIN_TOKEN: &str = "admin-token";
pub const USER_TOKEN: &str = "user-token";
pub const NEW_USER_TOKEN: &str = "new-user-token";

/// A multipart film upload as the service saw it.
#[derive(Clone, Debug)]
pub struct FilmUpload {
    pub film_data: Value,
    pub film_data_type: Option<String>,
    pub image_name: Option<String>,
    pub image_type: Option<String>,
    pub image_len: usize,
    pub folder: Option<String>,
}

#[derive(Debug, Default)]
pub struct Recorded {
    /// `(path, Authorization header)` for every request.
    pub requests: Vec<(String, Option<String>)>,
    pub sign_ups: Vec<Value>,
    pub uploads: Vec<FilmUpload>,
    pub purchases: Vec<Value>,
}

#[derive(Clone, Default)]
pub struct MockState {
    recorded: Arc<Mutex<Recorded>>,
}

impl MockState {
    pub fn recorded<R>(&self, read: impl FnOnce(&Recorded) -> R) -> R {
        read(&self.recorded.lock().unwrap())
    }

    fn record(&self, path: &str, headers: &HeaderMap) {
        let auth = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.recorded
            .lock()
            .unwrap()
            .requests
            .push((path.to_string(), auth));
    }
}

pub struct MockService {
    pub base_url: String,
    pub state: MockState,
}

impl MockService {
    pub async fn spawn() -> Self {
        let state = MockState::default();
        let api = Router::new()
            .route("/auth/signIn", post(sign_in))
            .route("/auth/signUp", post(sign_up))
            .route("/film/enabled", get(enabled_films))
            .route("/film/title/{title}", get(search_films))
            .route("/film/admin", post(create_film))
            .route(
                "/film/admin/{id}",
                put(toggle_film).delete(delete_resource),
            )
            .route("/film/{id}", get(get_film))
            .route("/user", get(list_users).put(update_user))
            .route(
                "/user/admin/{id}",
                put(toggle_user).delete(delete_resource),
            )
            .route("/purchase", post(create_purchase).get(list_purchases))
            .route("/purchase/{id}", delete(delete_purchase))
            .route("/purchase/user/{id}", get(purchases_by_user));
        let app = Router::new().nest("/api", api).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}/api"),
            state,
        }
    }

    /// Client, auth manager and the store they share.
    pub fn client(&self) -> (ApiClient, AuthManager, SessionStore) {
        let store = SessionStore::in_memory();
        let client = ApiClient::new(self.base_url.clone(), store.clone());
        let auth = AuthManager::new(client.clone(), store.clone());
        (client, auth, store)
    }

    pub fn authorization_for(&self, path: &str) -> Vec<Option<String>> {
        self.state.recorded(|r| {
            r.requests
                .iter()
                .filter(|(p, _)| p == path)
                .map(|(_, auth)| auth.clone())
                .collect()
        })
    }
}

pub fn principal(id: i64, email: &str, role: Role) -> Principal {
    Principal {
        id,
        name: "Ana".to_string(),
        last_name: "Gomez".to_string(),
        phone: "3001234567".to_string(),
        email: email.to_string(),
        role,
        enabled: true,
    }
}

fn error(status: StatusCode, message: &str, details: Value) -> Response {
    let body = json!({
        "message": message,
        "code": "ERR-001",
        "status": status.as_u16(),
        "details": details,
        "timestamp": "2025-03-01T18:30:00",
    });
    (status, Json(body)).into_response()
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Role behind a bearer token the service issued, if any.
fn caller(headers: &HeaderMap) -> Option<Role> {
    match bearer(headers)? {
        ADMIN_TOKEN => Some(Role::Admin),
        USER_TOKEN | NEW_USER_TOKEN => Some(Role::User),
        _ => None,
    }
}

fn admin_only(headers: &HeaderMap) -> Option<Response> {
    match caller(headers) {
        Some(Role::Admin) => None,
        Some(_) => Some(error(StatusCode::FORBIDDEN, "Access denied", Value::Null)),
        None => Some(error(
            StatusCode::UNAUTHORIZED,
            "Full authentication is required",
            Value::Null,
        )),
    }
}

fn films() -> Vec<Value> {
    vec![
        json!({"id": 4, "title": "Dune", "description": "Desert planet", "genre": "SCI_FI",
               "classification": "TWELVE_YEARS", "duration": 155, "ticketPrice": 10000,
               "imageUrl": "https://img.example.com/dune.png", "enabled": true}),
        json!({"id": 5, "title": "Up", "description": "Balloons", "genre": "ANIMATION",
               "classification": "ALL_AUDIENCES", "duration": 96, "ticketPrice": 8000,
               "enabled": true}),
    ]
}

fn page(content: Vec<Value>) -> Value {
    let len = content.len();
    json!({
        "content": content,
        "totalPages": 1,
        "totalElements": len,
        "number": 0,
        "size": 10,
        "first": true,
        "last": true,
        "empty": len == 0,
        "numberOfElements": len,
    })
}

async fn sign_in(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record("/auth/signIn", &headers);
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let (token, user) = match (email, password) {
        (ADMIN_EMAIL, PASSWORD) => (ADMIN_TOKEN, principal(1, email, Role::Admin)),
        (USER_EMAIL, PASSWORD) => (USER_TOKEN, principal(9, email, Role::User)),
        _ => return error(StatusCode::UNAUTHORIZED, "Invalid credentials", json!({})),
    };

    Json(json!({
        "accessToken": token,
        "tokenType": "Bearer",
        "expiresIn": 3600,
        "user": user,
    }))
    .into_response()
}

async fn sign_up(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record("/auth/signUp", &headers);
    state.recorded.lock().unwrap().sign_ups.push(body.clone());

    let email = body["email"].as_str().unwrap_or_default();
    if email == "taken@example.com" {
        return error(
            StatusCode::CONFLICT,
            "Conflict",
            json!("Email already registered"),
        );
    }

    let mut user = principal(42, email, Role::User);
    user.name = body["name"].as_str().unwrap_or_default().to_string();
    (
        StatusCode::CREATED,
        Json(json!({"accessToken": NEW_USER_TOKEN, "tokenType": "Bearer", "user": user})),
    )
        .into_response()
}

async fn enabled_films(State(state): State<MockState>, headers: HeaderMap) -> Response {
    state.record("/film/enabled", &headers);
    Json(page(films())).into_response()
}

async fn search_films(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(title): Path<String>,
) -> Response {
    state.record("/film/title", &headers);
    let needle = title.to_lowercase();
    let matches = films()
        .into_iter()
        .filter(|f| {
            f["title"]
                .as_str()
                .is_some_and(|t| t.to_lowercase().contains(&needle))
        })
        .collect();
    Json(page(matches)).into_response()
}

async fn get_film(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    state.record("/film/{id}", &headers);
    match id {
        404 => error(StatusCode::NOT_FOUND, "Film not found", Value::Null),
        422 => error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Validation failed",
            json!({"title": "must not be blank", "duration": "must be positive"}),
        ),
        502 => (StatusCode::BAD_GATEWAY, "<html>Bad Gateway</html>").into_response(),
        _ => match films().into_iter().find(|f| f["id"] == id) {
            Some(film) => Json(film).into_response(),
            None => error(StatusCode::NOT_FOUND, "Film not found", Value::Null),
        },
    }
}

async fn create_film(
    State(state): State<MockState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    state.record("/film/admin", &headers);
    if bearer(&headers) != Some(ADMIN_TOKEN) {
        return error(StatusCode::FORBIDDEN, "Access denied", Value::Null);
    }

    let mut upload = FilmUpload {
        film_data: Value::Null,
        film_data_type: None,
        image_name: None,
        image_type: None,
        image_len: 0,
        folder: None,
    };
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.unwrap();
        match name.as_str() {
            "filmData" => {
                upload.film_data = serde_json::from_slice(&bytes).unwrap();
                upload.film_data_type = content_type;
            }
            "image" => {
                upload.image_name = file_name;
                upload.image_type = content_type;
                upload.image_len = bytes.len();
            }
            "folder" => upload.folder = Some(String::from_utf8_lossy(&bytes).into_owned()),
            _ => {}
        }
    }

    let mut film = upload.film_data.clone();
    film["id"] = json!(99);
    film["enabled"] = json!(true);
    film["imageUrl"] = json!("https://img.example.com/99.png");
    state.recorded.lock().unwrap().uploads.push(upload);
    (StatusCode::CREATED, Json(film)).into_response()
}

async fn create_purchase(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record("/purchase", &headers);
    if caller(&headers).is_none() {
        return error(StatusCode::UNAUTHORIZED, "Full authentication is required", Value::Null);
    }

    let mut recorded = state.recorded.lock().unwrap();
    let detail = &body["details"][0];
    let quantity = detail["quantity"].as_i64().unwrap_or_default();
    let unit_price = detail["unitPrice"].as_i64().unwrap_or_default();
    // The service charges tickets only, without the client's service fee.
    let purchase = json!({
        "id": recorded.purchases.len() + 1,
        "userId": body["userId"],
        "purchaseDate": "2025-03-01T18:30:00",
        "details": [{"id": 1, "filmId": detail["filmId"], "quantity": quantity, "unitPrice": unit_price}],
        "totalAmount": unit_price * quantity,
        "paymentStatus": "COMPLETED",
        "paymentMethod": body["paymentMethod"],
    });
    recorded.purchases.push(purchase.clone());
    (StatusCode::CREATED, Json(purchase)).into_response()
}

async fn purchases_by_user(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    state.record("/purchase/user/{id}", &headers);
    let mine = state.recorded(|r| {
        r.purchases
            .iter()
            .filter(|p| p["userId"] == id)
            .cloned()
            .collect()
    });
    Json(page(mine)).into_response()
}

async fn toggle_film(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    state.record("/film/admin/{id}", &headers);
    if let Some(denied) = admin_only(&headers) {
        return denied;
    }
    match films().into_iter().find(|f| f["id"] == id) {
        Some(mut film) => {
            film["enabled"] = json!(false);
            Json(film).into_response()
        }
        None => error(StatusCode::NOT_FOUND, "Film not found", Value::Null),
    }
}

async fn list_users(State(state): State<MockState>, headers: HeaderMap) -> Response {
    state.record("/user", &headers);
    if let Some(denied) = admin_only(&headers) {
        return denied;
    }
    let users = vec![
        json!(principal(1, ADMIN_EMAIL, Role::Admin)),
        json!(principal(9, USER_EMAIL, Role::User)),
    ];
    Json(page(users)).into_response()
}

async fn update_user(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record("/user", &headers);
    let Some(role) = caller(&headers) else {
        return error(StatusCode::UNAUTHORIZED, "Full authentication is required", Value::Null);
    };

    let email = body["email"].as_str().unwrap_or_default();
    if email == "taken@example.com" {
        return error(
            StatusCode::CONFLICT,
            "Conflict",
            json!("Email already registered"),
        );
    }

    let mut user = principal(body["id"].as_i64().unwrap_or_default(), email, role);
    user.name = body["name"].as_str().unwrap_or_default().to_string();
    user.last_name = body["lastName"].as_str().unwrap_or_default().to_string();
    user.phone = body["phone"].as_str().unwrap_or_default().to_string();
    Json(user).into_response()
}

async fn toggle_user(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    state.record("/user/admin/{id}", &headers);
    if let Some(denied) = admin_only(&headers) {
        return denied;
    }
    let mut user = principal(id, USER_EMAIL, Role::User);
    user.enabled = false;
    Json(user).into_response()
}

/// Deletes answer `204 No Content` with an empty body.
async fn delete_resource(
    State(state): State<MockState>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    state.record(uri.path().trim_start_matches("/api"), &headers);
    if let Some(denied) = admin_only(&headers) {
        return denied;
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn list_purchases(State(state): State<MockState>, headers: HeaderMap) -> Response {
    state.record("/purchase", &headers);
    if let Some(denied) = admin_only(&headers) {
        return denied;
    }
    let all = state.recorded(|r| r.purchases.clone());
    Json(page(all)).into_response()
}

/// Answers `200 OK` with a zero-length body.
async fn delete_purchase(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    state.record("/purchase/{id}", &headers);
    if let Some(denied) = admin_only(&headers) {
        return denied;
    }
    let mut recorded = state.recorded.lock().unwrap();
    let before = recorded.purchases.len();
    recorded.purchases.retain(|p| p["id"] != id);
    if recorded.purchases.len() == before {
        return error(StatusCode::NOT_FOUND, "Purchase not found", Value::Null);
    }
    StatusCode::OK.into_response()
}
