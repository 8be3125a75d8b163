// Gateway integration tests against a loopback authority

use std::time::Duration;

use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use casal_client::{ClientConfig, ClientError, Envelope, HttpClient};
use shared::client::LoginData;
use shared::ids::RemoteId;

const TOKEN: &str = "tok1";

async fn auth_handler(Json(body): Json<Value>) -> impl IntoResponse {
    let nif = body.get("nif").and_then(Value::as_str).unwrap_or_default();
    let password = body
        .get("password")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if nif == "12345678Z" && password == "secret" {
        (
            StatusCode::OK,
            Json(Envelope::ok(LoginData {
                token: TOKEN.to_string(),
            })),
        )
    } else {
        (StatusCode::FORBIDDEN, Json(Envelope::failure()))
    }
}

fn authenticated(headers: &HeaderMap) -> bool {
    headers
        .get("API-Key")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == TOKEN)
        .unwrap_or(false)
}

async fn user_data_handler(
    headers: HeaderMap,
    Query(query): Query<std::collections::HashMap<String, String>>,
) -> impl IntoResponse {
    if !authenticated(&headers) {
        return (StatusCode::NOT_ACCEPTABLE, Json(json!({"success": false})));
    }
    let id: i64 = query
        .get("user_id")
        .and_then(|v| v.parse().ok())
        .unwrap_or(42);
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "data": {
                "id": id,
                "name": "josé",
                "familyName": "garcía",
                "nif": "12345678Z",
                "grade": "fester",
            },
        })),
    )
}

async fn events_handler(headers: HeaderMap) -> impl IntoResponse {
    if !authenticated(&headers) {
        return (StatusCode::NOT_ACCEPTABLE, Json(json!({"success": false})));
    }
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "data": [{
                "id": 0,
                "displayName": "Esmorzar",
                "date": "2023-04-22T08:00:00Z",
                "category": 0,
                "tables": [{"id": 1, "responsible": 42, "members": [7]}],
            }],
        })),
    )
}

async fn join_handler(Path(event_id): Path<i64>, Json(body): Json<Value>) -> impl IntoResponse {
    match (event_id, body.get("table_id").and_then(Value::as_i64)) {
        // Table 66 was removed remotely; person is already seated elsewhere for event 3
        (_, Some(66)) => (StatusCode::GONE, Json(Envelope::<()>::failure())),
        (3, Some(_)) => (StatusCode::CONFLICT, Json(Envelope::<()>::failure())),
        _ => (StatusCode::OK, Json(Envelope::<()>::ok_empty())),
    }
}

async fn broken_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"success": true})))
}

async fn no_success_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"data": []})))
}

async fn slow_handler() -> impl IntoResponse {
    tokio::time::sleep(Duration::from_secs(5)).await;
    (StatusCode::OK, Json(json!({"success": true, "data": []})))
}

/// Stand up the loopback authority and return its base URL
async fn spawn_authority() -> String {
    let app = Router::new()
        .route("/v1/user/auth", post(auth_handler))
        .route("/v1/user/data", get(user_data_handler))
        .route("/v1/events/list", get(events_handler))
        .route("/v1/events/{id}/join", post(join_handler))
        .route("/v1/broken/data", get(broken_handler))
        .route("/v1/broken/success", get(no_success_handler))
        .route("/v1/broken/slow", get(slow_handler));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(base_url: &str) -> HttpClient {
    ClientConfig::new(base_url).with_timeout(5).build_http_client()
}

#[tokio::test]
async fn login_returns_token() {
    let base = spawn_authority().await;
    let token = client(&base).login("12345678Z", "secret").await.unwrap();
    assert_eq!(token, TOKEN);
}

#[tokio::test]
async fn login_rejection_is_invalid_credentials() {
    let base = spawn_authority().await;
    let err = client(&base).login("12345678Z", "wrong").await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidCredentials));
}

#[tokio::test]
async fn person_data_carries_the_token_header() {
    let base = spawn_authority().await;
    let person = client(&base).person_data(TOKEN).await.unwrap();
    assert_eq!(person.id, RemoteId(42));
    assert_eq!(person.family_name, "garcía");

    let err = client(&base).person_data("stale").await.unwrap_err();
    assert!(matches!(err, ClientError::Authorisation));
}

#[tokio::test]
async fn account_data_fetches_by_authority_id() {
    let base = spawn_authority().await;
    let person = client(&base)
        .account_data(TOKEN, RemoteId(7))
        .await
        .unwrap();
    assert_eq!(person.id, RemoteId(7));
}

#[tokio::test]
async fn events_list_parses_embedded_tables() {
    let base = spawn_authority().await;
    let events = client(&base).events_list(TOKEN).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].tables[0].members, vec![RemoteId(7)]);
}

#[tokio::test]
async fn join_conflicts_surface_verbatim() {
    let base = spawn_authority().await;
    let c = client(&base);

    let err = c
        .join_event(
            TOKEN,
            RemoteId(3),
            &casal_client::JoinRequest {
                table_id: Some(1),
                assists: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::AlreadySeated));

    let err = c
        .join_event(
            TOKEN,
            RemoteId(4),
            &casal_client::JoinRequest {
                table_id: Some(66),
                assists: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::TableNotFound));

    c.join_event(TOKEN, RemoteId(4), &casal_client::JoinRequest::default())
        .await
        .unwrap();
}

#[tokio::test]
async fn envelope_violations_are_malformed() {
    let base = spawn_authority().await;
    let c = client(&base);

    // success=true but no data on a data call
    let err = probe_data(&c, "/broken/data").await.unwrap_err();
    assert!(matches!(err, ClientError::MalformedResponse(_)));

    // missing success field entirely
    let err = probe_data(&c, "/broken/success").await.unwrap_err();
    assert!(matches!(err, ClientError::MalformedResponse(_)));
}

#[tokio::test]
async fn deadline_releases_the_caller() {
    let base = spawn_authority().await;
    let c = HttpClient::new(&ClientConfig::new(&base)).with_timeout(Duration::from_millis(200));

    let start = std::time::Instant::now();
    let err = probe_data(&c, "/broken/slow").await.unwrap_err();
    assert!(matches!(err, ClientError::TimedOut));
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn cancellation_releases_the_caller() {
    let base = spawn_authority().await;
    let cancel = CancellationToken::new();
    let c = client(&base).with_cancellation(cancel.clone());

    let call = tokio::spawn(async move { probe_data(&c, "/broken/slow").await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let err = call.await.unwrap().unwrap_err();
    assert!(matches!(err, ClientError::Cancelled));
}

#[tokio::test]
async fn unreachable_authority_is_a_network_failure() {
    // Nothing listens on this port
    let c = client("http://127.0.0.1:9");
    let err = c.login("12345678Z", "secret").await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_)));
}

/// Issue a data-returning GET against an arbitrary path
async fn probe_data(
    client: &HttpClient,
    path: &str,
) -> Result<Vec<serde_json::Value>, ClientError> {
    client.get_data(path, Some(TOKEN)).await
}
