//! `/api/users` handlers.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Map, Value};
use uuid::{Uuid, Variant};

use crate::app::store::{UserPatch, UserStore};

/// Build the users API router over `store`.
///
/// `/api/users/` with a trailing slash is the collection too.
pub fn users_router(store: Arc<UserStore>) -> Router {
    let collection = get(list_users).post(create_user).fallback(route_not_found);
    Router::new()
        .route("/api/users", collection.clone())
        .route("/api/users/", collection)
        .route(
            "/api/users/{id}",
            get(get_user)
                .put(update_user)
                .delete(delete_user)
                .fallback(route_not_found),
        )
        .fallback(route_not_found)
        .with_state(store)
}

fn message(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

async fn route_not_found() -> Response {
    message(StatusCode::NOT_FOUND, "Route not found")
}

/// Hyphenated UUID of version 1-5 with the RFC 4122 variant.
fn parse_user_id(raw: &str) -> Option<Uuid> {
    if raw.len() != 36 {
        return None;
    }
    let id = Uuid::try_parse(raw).ok()?;
    let version_ok = (1..=5).contains(&id.get_version_num());
    (version_ok && id.get_variant() == Variant::RFC4122).then_some(id)
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn number(value: Option<&Value>) -> Option<serde_json::Number> {
    match value {
        Some(Value::Number(n)) => Some(n.clone()),
        _ => None,
    }
}

fn string_array(value: Option<&Value>) -> Option<Vec<String>> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => None,
    }
}

async fn list_users(State(store): State<Arc<UserStore>>) -> Response {
    Json(store.list().await).into_response()
}

async fn get_user(State(store): State<Arc<UserStore>>, Path(raw_id): Path<String>) -> Response {
    let Some(id) = parse_user_id(&raw_id) else {
        return message(StatusCode::BAD_REQUEST, "Invalid userId");
    };
    match store.get(id).await {
        Some(user) => Json(user).into_response(),
        None => message(StatusCode::NOT_FOUND, "User not found"),
    }
}

async fn create_user(State(store): State<Arc<UserStore>>, body: Bytes) -> Response {
    if body.is_empty() {
        return message(StatusCode::BAD_REQUEST, "Empty body");
    }
    let fields = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(fields)) => fields,
        // Valid JSON that is not an object carries none of the fields.
        Ok(Value::Null) | Err(_) => return message(StatusCode::BAD_REQUEST, "Invalid JSON"),
        Ok(_) => Map::new(),
    };

    let username = non_empty_string(fields.get("username"));
    let age = number(fields.get("age"));
    let hobbies = string_array(fields.get("hobbies"));
    let (Some(username), Some(age), Some(hobbies)) = (username, age, hobbies) else {
        return message(StatusCode::BAD_REQUEST, "Missing required fields");
    };

    let user = store.create(username, age, hobbies).await;
    tracing::debug!(id = %user.id, "User created");
    (StatusCode::CREATED, Json(user)).into_response()
}

/// Extract the fields present in an update body. `Err` on a present field
/// with the wrong type.
fn parse_patch(fields: &Map<String, Value>) -> Result<UserPatch, ()> {
    let mut patch = UserPatch::default();
    if let Some(value) = fields.get("username") {
        patch.username = Some(non_empty_string(Some(value)).ok_or(())?);
    }
    if let Some(value) = fields.get("age") {
        patch.age = Some(number(Some(value)).ok_or(())?);
    }
    if let Some(value) = fields.get("hobbies") {
        patch.hobbies = Some(string_array(Some(value)).ok_or(())?);
    }
    Ok(patch)
}

async fn update_user(
    State(store): State<Arc<UserStore>>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Response {
    let Some(id) = parse_user_id(&raw_id) else {
        return message(StatusCode::BAD_REQUEST, "Invalid userId");
    };
    if body.is_empty() {
        return message(StatusCode::BAD_REQUEST, "Request body is empty");
    }
    let fields = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(fields)) => fields,
        Ok(Value::Null) | Err(_) => return message(StatusCode::BAD_REQUEST, "Invalid JSON format"),
        // Arrays and scalars update nothing.
        Ok(_) => Map::new(),
    };
    let Ok(patch) = parse_patch(&fields) else {
        return message(StatusCode::BAD_REQUEST, "Invalid user fields");
    };

    match store.update(id, patch).await {
        Some(user) => Json(user).into_response(),
        None => message(StatusCode::NOT_FOUND, "User not found"),
    }
}

async fn delete_user(State(store): State<Arc<UserStore>>, Path(raw_id): Path<String>) -> Response {
    let Some(id) = parse_user_id(&raw_id) else {
        return message(StatusCode::BAD_REQUEST, "Invalid userId");
    };
    if store.delete(id).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        message(StatusCode::NOT_FOUND, "User not found")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn call(app: &Router, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn app() -> Router {
        users_router(Arc::new(UserStore::new()))
    }

    const JOHN: &str = r#"{"username":"john_doe","age":25,"hobbies":["reading","swimming"]}"#;

    #[tokio::test]
    async fn empty_list_initially() {
        let (status, body) = call(&app(), "GET", "/api/users", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn create_then_get() {
        let app = app();
        let (status, created) = call(&app, "POST", "/api/users", JOHN).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["username"], "john_doe");
        assert_eq!(created["age"], 25);
        assert_eq!(created["hobbies"], json!(["reading", "swimming"]));

        let id = created["id"].as_str().unwrap();
        let (status, fetched) = call(&app, "GET", &format!("/api/users/{id}"), "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn create_rejects_bad_bodies() {
        let app = app();
        let (status, body) = call(&app, "POST", "/api/users", "").await;
        assert_eq!((status, body["message"].as_str()), (StatusCode::BAD_REQUEST, Some("Empty body")));

        let (status, body) = call(&app, "POST", "/api/users", "{not json").await;
        assert_eq!((status, body["message"].as_str()), (StatusCode::BAD_REQUEST, Some("Invalid JSON")));

        let (status, body) = call(&app, "POST", "/api/users", r#"{"username":"x","age":"old","hobbies":[]}"#).await;
        assert_eq!(
            (status, body["message"].as_str()),
            (StatusCode::BAD_REQUEST, Some("Missing required fields"))
        );
    }

    #[tokio::test]
    async fn update_is_partial() {
        let app = app();
        let (_, created) = call(&app, "POST", "/api/users", JOHN).await;
        let uri = format!("/api/users/{}", created["id"].as_str().unwrap());

        let (status, updated) = call(&app, "PUT", &uri, r#"{"username":"jane_doe","age":28}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["username"], "jane_doe");
        assert_eq!(updated["age"], 28);
        assert_eq!(updated["hobbies"], json!(["reading", "swimming"]));

        let (status, body) = call(&app, "PUT", &uri, "").await;
        assert_eq!(
            (status, body["message"].as_str()),
            (StatusCode::BAD_REQUEST, Some("Request body is empty"))
        );
        let (status, body) = call(&app, "PUT", &uri, "nope").await;
        assert_eq!(
            (status, body["message"].as_str()),
            (StatusCode::BAD_REQUEST, Some("Invalid JSON format"))
        );
    }

    #[tokio::test]
    async fn delete_then_not_found() {
        let app = app();
        let (_, created) = call(&app, "POST", "/api/users", JOHN).await;
        let uri = format!("/api/users/{}", created["id"].as_str().unwrap());

        let (status, body) = call(&app, "DELETE", &uri, "").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (status, body) = call(&app, "GET", &uri, "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "User not found");
    }

    #[tokio::test]
    async fn invalid_ids_and_routes() {
        let app = app();
        for method in ["GET", "PUT", "DELETE"] {
            let (status, body) = call(&app, method, "/api/users/not-a-uuid", "{}").await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{method}");
            assert_eq!(body["message"], "Invalid userId");
        }

        let (status, body) = call(&app, "GET", "/api/other", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Route not found");

        let (status, body) = call(&app, "DELETE", "/api/users", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Route not found");
    }

    #[tokio::test]
    async fn non_object_json_bodies() {
        let app = app();
        for body in ["[]", "\"x\"", "42"] {
            let (status, reply) = call(&app, "POST", "/api/users", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(reply["message"], "Missing required fields");
        }
        let (status, reply) = call(&app, "POST", "/api/users", "null").await;
        assert_eq!((status, reply["message"].as_str()), (StatusCode::BAD_REQUEST, Some("Invalid JSON")));

        let (_, created) = call(&app, "POST", "/api/users", JOHN).await;
        let uri = format!("/api/users/{}", created["id"].as_str().unwrap());
        let (status, unchanged) = call(&app, "PUT", &uri, "[1, 2]").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(unchanged, created);

        let (status, reply) = call(&app, "PUT", &uri, "null").await;
        assert_eq!(
            (status, reply["message"].as_str()),
            (StatusCode::BAD_REQUEST, Some("Invalid JSON format"))
        );
    }

    #[tokio::test]
    async fn trailing_slash_is_the_collection() {
        let app = app();
        let (status, created) = call(&app, "POST", "/api/users/", JOHN).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, list) = call(&app, "GET", "/api/users/", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list, json!([created]));
    }

    #[test]
    fn user_id_must_be_hyphenated_rfc_uuid() {
        assert!(parse_user_id("3f1c1f0e-8c1b-4c7a-9f4e-2b6f1d2a9c11").is_some());
        assert!(parse_user_id("3f1c1f0e8c1b4c7a9f4e2b6f1d2a9c11").is_none());
        // Version 0 and non-RFC variant.
        assert!(parse_user_id("3f1c1f0e-8c1b-0c7a-9f4e-2b6f1d2a9c11").is_none());
        assert!(parse_user_id("3f1c1f0e-8c1b-4c7a-cf4e-2b6f1d2a9c11").is_none());
    }
}
