//! ApiClient and AuthManager against a local axum server.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use facegate::{ApiClient, AuthManager, Error, LoginOutcome, MemoryTokenStore, TokenStore, Transport};
use serde_json::{Value, json};
use tokio::net::TcpListener;

async fn spawn_server() -> String {
	let app = Router::new()
		.route("/api/login", post(login))
		.route("/api/legacy/login", post(legacy_login))
		.route("/api/echo-auth", get(echo_auth))
		.route("/api/expired", get(|| async { (StatusCode::UNAUTHORIZED, Json(json!({"message": "Token has expired"}))) }))
		.route("/api/broken", get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>") }))
		.route("/api/not-found", get(|| async { (StatusCode::NOT_FOUND, Json(json!({"error": "User not found"}))) }))
		.route("/api/soft-error", post(|| async { Json(json!({"status": "error", "message": "Camera not initialized"})) }))
		.route(
			"/api/system/status",
			get(|| async {
				Json(json!({
					"status": "success",
					"components": {"database": true, "camera": false, "face_recognizer": true},
					"face_recognition_method": "LBPH"
				}))
			}),
		)
		.route(
			"/api/users",
			get(|| async {
				Json(json!({
					"status": "success",
					"users": [{"id": 1, "person_id": "P001", "name": "Ada Lovelace", "is_active": true, "has_face_data": true}],
					"count": 1
				}))
			}),
		);

	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	tokio::spawn(async move {
		axum::serve(listener, app).await.unwrap();
	});
	format!("http://{addr}/api")
}

async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
	if body["username"] == "admin" && body["password"] == "secret" {
		(
			StatusCode::OK,
			Json(json!({
				"status": "success",
				"access_token": "token-123",
				"user": {"username": "admin", "role": "admin"}
			})),
		)
	} else {
		(StatusCode::UNAUTHORIZED, Json(json!({"status": "error", "message": "Invalid credentials"})))
	}
}

async fn legacy_login() -> Json<Value> {
	Json(json!({"access_token": "legacy", "admin": {"username": "root"}}))
}

async fn echo_auth(headers: HeaderMap) -> Json<Value> {
	let auth = headers.get("authorization").and_then(|v| v.to_str().ok()).map(str::to_string);
	let content_type = headers.get("content-type").and_then(|v| v.to_str().ok()).map(str::to_string);
	Json(json!({"authorization": auth, "content_type": content_type}))
}

fn client(base: &str, store: Arc<MemoryTokenStore>) -> ApiClient {
	ApiClient::new(base, store).unwrap()
}

#[tokio::test]
async fn bearer_token_is_sent_when_present() {
	let base = spawn_server().await;
	let store = Arc::new(MemoryTokenStore::new());
	let api = client(&base, store.clone());

	let anonymous = api.get("/echo-auth").await.unwrap();
	assert_eq!(anonymous["authorization"], Value::Null);
	assert_eq!(anonymous["content_type"], "application/json");

	store.set("abc").unwrap();
	let authed = api.get("/echo-auth").await.unwrap();
	assert_eq!(authed["authorization"], "Bearer abc");
}

#[tokio::test]
async fn unauthorized_discards_token() {
	let base = spawn_server().await;
	let store = Arc::new(MemoryTokenStore::with_token("stale"));
	let api = client(&base, store.clone());

	let err = api.get("/expired").await.unwrap_err();
	assert!(matches!(err, Error::SessionExpired));
	assert_eq!(store.get(), None);
}

#[tokio::test]
async fn non_success_statuses_carry_server_message() {
	let base = spawn_server().await;
	let api = client(&base, Arc::new(MemoryTokenStore::new()));

	let err = api.get("/not-found").await.unwrap_err();
	assert_eq!(err.status(), Some(404));
	assert_eq!(err.to_string(), "User not found");

	let err = api.get("/broken").await.unwrap_err();
	assert_eq!(err.status(), Some(500));
	assert_eq!(err.to_string(), "Request failed");
}

#[tokio::test]
async fn error_status_in_success_body_is_an_error() {
	let base = spawn_server().await;
	let api = client(&base, Arc::new(MemoryTokenStore::new()));
	let err = api.post("/soft-error", None).await.unwrap_err();
	assert_eq!(err.status(), Some(200));
	assert_eq!(err.to_string(), "Camera not initialized");
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error_without_status() {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	drop(listener);

	let api = client(&format!("http://{addr}/api"), Arc::new(MemoryTokenStore::new()));
	let err = api.get("/users").await.unwrap_err();
	assert!(matches!(err, Error::Transport { status: None, .. }));
}

#[tokio::test]
async fn typed_admin_endpoints() {
	let base = spawn_server().await;
	let api = client(&base, Arc::new(MemoryTokenStore::with_token("t")));

	let status = api.system_status().await.unwrap();
	assert_eq!(status.failing_components(), vec!["camera"]);
	assert_eq!(status.face_recognition_method.as_deref(), Some("LBPH"));

	let users = api.list_users().await.unwrap();
	assert_eq!(users.count, 1);
	assert_eq!(users.users[0].name, "Ada Lovelace");
	assert!(users.users[0].has_face_data);
}

#[tokio::test]
async fn login_stores_token_on_success() {
	let base = spawn_server().await;
	let store = Arc::new(MemoryTokenStore::new());
	let auth = AuthManager::new(Arc::new(client(&base, store.clone())));

	let outcome = auth.login("admin", "secret").await;
	let LoginOutcome::Success { user } = outcome else {
		panic!("expected success, got {outcome:?}");
	};
	assert_eq!(user.username, "admin");
	assert_eq!(store.get().as_deref(), Some("token-123"));
	assert!(auth.is_authenticated());
	assert_eq!(auth.current_user().map(|u| u.role), Some("admin".to_string()));

	auth.logout().unwrap();
	assert!(!auth.is_authenticated());
	assert_eq!(auth.current_user(), None);
}

#[tokio::test]
async fn login_failure_keeps_store_untouched() {
	let base = spawn_server().await;
	let store = Arc::new(MemoryTokenStore::with_token("previous"));
	let auth = AuthManager::new(Arc::new(client(&base, store.clone())));

	let outcome = auth.login("admin", "wrong").await;
	assert_eq!(
		outcome,
		LoginOutcome::Failure {
			error: "Invalid credentials".into()
		}
	);
	assert_eq!(store.get().as_deref(), Some("previous"));
}

#[tokio::test]
async fn login_accepts_legacy_admin_field() {
	let base = spawn_server().await;
	let api = ApiClient::new(format!("{base}/legacy"), Arc::new(MemoryTokenStore::new())).unwrap();
	let auth = AuthManager::new(Arc::new(api));

	match auth.login("root", "x").await {
		LoginOutcome::Success { user } => assert_eq!(user.username, "root"),
		other => panic!("unexpected {other:?}"),
	}
}

#[tokio::test]
async fn login_network_failure_reads_network_error() {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	drop(listener);

	let auth = AuthManager::new(Arc::new(client(&format!("http://{addr}/api"), Arc::new(MemoryTokenStore::new()))));
	assert_eq!(
		auth.login("admin", "secret").await,
		LoginOutcome::Failure {
			error: "Network error".into()
		}
	);
}
