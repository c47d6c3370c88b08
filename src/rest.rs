//! REST API layer using Axum.
//!
//! HTTP/JSON endpoints over the collection store plus the two upstream
//! clients (generation, checkout). Identity arrives as a provider-issued
//! bearer token; the middleware validates it and hands the claims to the
//! handlers. Shared state is Arc-wrapped for concurrency.

use axum::{
    extract::{Path, State},
    http::{header, Request},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::auth::validate_token;
use crate::billing::{Billing, CheckoutSession};
use crate::error::{Error, Result};
use crate::generate::Generator;
use crate::models::{AuthPayload, Card, CollectionEntry};
use crate::storage::Store;

/// Shared app state for REST handlers.
pub struct AppState {
    pub store: Store,
    pub generator: Generator,
    pub billing: Billing,
    pub jwt_secret: Vec<u8>,
}

#[derive(Deserialize)]
pub struct SaveCollectionRequest {
    pub name: String,
    pub cards: Vec<Card>,
}

#[derive(Deserialize)]
pub struct RenameRequest {
    pub new_name: String,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
pub struct GenerateResponse {
    pub flashcards: Vec<Card>,
}

async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(Error::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(Error::Unauthorized)?;
    let claims = validate_token(&state.jwt_secret, token).map_err(|_| Error::Unauthorized)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Create the Axum router.
pub fn create_router(state: AppState) -> Router {
    let state = Arc::new(state);

    let protected = Router::new()
        .route(
            "/collections",
            get(list_collections_handler).post(save_collection_handler),
        )
        .route(
            "/collections/:name",
            axum::routing::put(rename_collection_handler).delete(delete_collection_handler),
        )
        .route("/collections/:name/cards", get(list_cards_handler))
        .route("/generate", post(generate_handler))
        .route("/checkout_sessions", post(checkout_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health_handler))
        .merge(protected)
        .with_state(state)
}

/// Handler: the user's collection index. First access provisions an empty
/// index document, so a brand-new user gets `[]`, not a 404.
async fn list_collections_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<AuthPayload>,
) -> Result<Json<Vec<CollectionEntry>>> {
    Ok(Json(state.store.collections(&claims.sub)?))
}

/// Handler: save a named collection and its cards, one atomic commit.
async fn save_collection_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<AuthPayload>,
    Json(payload): Json<SaveCollectionRequest>,
) -> Result<Json<StatusResponse>> {
    state
        .store
        .save_collection(&claims.sub, &payload.name, &payload.cards)?;
    info!(user = %claims.sub, collection = %payload.name, cards = payload.cards.len(), "collection saved");
    Ok(Json(StatusResponse {
        success: true,
        message: format!("collection {:?} saved", payload.name),
    }))
}

/// Handler: rename a collection, relocating its cards.
async fn rename_collection_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<AuthPayload>,
    Path(name): Path<String>,
    Json(payload): Json<RenameRequest>,
) -> Result<Json<StatusResponse>> {
    state
        .store
        .rename_collection(&claims.sub, &name, &payload.new_name)?;
    info!(user = %claims.sub, from = %name, to = %payload.new_name, "collection renamed");
    Ok(Json(StatusResponse {
        success: true,
        message: format!("collection {:?} renamed to {:?}", name, payload.new_name),
    }))
}

/// Handler: delete a collection and its cards. Idempotent.
async fn delete_collection_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<AuthPayload>,
    Path(name): Path<String>,
) -> Result<Json<StatusResponse>> {
    state.store.remove_collection(&claims.sub, &name)?;
    info!(user = %claims.sub, collection = %name, "collection deleted");
    Ok(Json(StatusResponse {
        success: true,
        message: format!("collection {:?} deleted", name),
    }))
}

async fn list_cards_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<AuthPayload>,
    Path(name): Path<String>,
) -> Result<Json<Vec<Card>>> {
    Ok(Json(state.store.list_cards(&claims.sub, &name)?))
}

/// Handler: raw study text in, card list out. The generation model is an
/// opaque upstream; failures surface as 502 with the upstream message.
async fn generate_handler(
    State(state): State<Arc<AppState>>,
    text: String,
) -> Result<Json<GenerateResponse>> {
    let flashcards = state.generator.generate(&text).await?;
    Ok(Json(GenerateResponse { flashcards }))
}

async fn checkout_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CheckoutSession>> {
    Ok(Json(state.billing.create_checkout_session().await?))
}

async fn health_handler() -> Json<StatusResponse> {
    Json(StatusResponse {
        success: true,
        message: "flashdeck API healthy".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::issue_token;
    use axum::{body::Body, http::StatusCode};
    use serde_json::json;
    use tempfile::TempDir;
    use tower::ServiceExt; // For .oneshot() testing

    const SECRET: &[u8] = b"test_secret";

    fn test_router() -> (TempDir, Router) {
        let dir = TempDir::new().expect("temp dir");
        let store = Store::open(dir.path().to_str().unwrap()).expect("open store");
        let state = AppState {
            store,
            // Never reached in these tests
            generator: Generator::new("http://localhost:0", "test"),
            billing: Billing::new("sk_test", "http://localhost/"),
            jwt_secret: SECRET.to_vec(),
        };
        (dir, create_router(state))
    }

    fn authed(method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
        let token = issue_token(SECRET, "user_1").unwrap();
        let builder = Request::builder()
            .uri(uri)
            .method(method)
            .header("authorization", format!("Bearer {token}"));
        match body {
            Some(value) => builder
                .header("content-type", "application/json")
                .body(Body::from(value.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_open() {
        let (_dir, app) = test_router();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn collections_require_token() {
        let (_dir, app) = test_router();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/collections")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn garbage_token_rejected() {
        let (_dir, app) = test_router();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/collections")
                    .header("authorization", "Bearer not-a-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        // 401s use the same error envelope as the rest of the API
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "unauthorized");
    }

    #[tokio::test]
    async fn save_list_rename_delete_flow() {
        let (_dir, app) = test_router();

        // New user sees an empty index
        let response = app
            .clone()
            .oneshot(authed("GET", "/collections", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!([]));

        // Save a generated collection
        let save = json!({
            "name": "Spanish",
            "cards": [
                { "front": "hola", "back": "hello" },
                { "front": "adios", "back": "goodbye" },
            ],
        });
        let response = app
            .clone()
            .oneshot(authed("POST", "/collections", Some(save)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Duplicate save conflicts
        let dup = json!({ "name": "Spanish", "cards": [] });
        let response = app
            .clone()
            .oneshot(authed("POST", "/collections", Some(dup)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        // Rename relocates the cards
        let rename = json!({ "new_name": "Español" });
        let response = app
            .clone()
            .oneshot(authed("PUT", "/collections/Spanish", Some(rename)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(authed("GET", "/collections/Espa%C3%B1ol/cards", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cards = body_json(response).await;
        assert_eq!(cards.as_array().unwrap().len(), 2);

        let response = app
            .clone()
            .oneshot(authed("GET", "/collections/Spanish/cards", None))
            .await
            .unwrap();
        assert_eq!(body_json(response).await, json!([]));

        // Renaming the now-missing old name is a 404
        let rename = json!({ "new_name": "German" });
        let response = app
            .clone()
            .oneshot(authed("PUT", "/collections/Spanish", Some(rename)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // Delete, then the index is empty again
        let response = app
            .clone()
            .oneshot(authed("DELETE", "/collections/Espa%C3%B1ol", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(authed("GET", "/collections", None))
            .await
            .unwrap();
        assert_eq!(body_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn invalid_name_is_bad_request() {
        let (_dir, app) = test_router();
        let save = json!({ "name": "", "cards": [] });
        let response = app
            .oneshot(authed("POST", "/collections", Some(save)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
