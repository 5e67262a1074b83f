//! REST API layer for TradeFlow using Axum (exposed on port 11111).
//!
//! Public surface: account registration, sign-in, password-reset token
//! issuance and the storefront. Authenticated surface: strategy submission
//! and the caller's own submissions. Admin surface: the moderation console,
//! the product catalog, uploads and the dashboard, gated by a bearer-token
//! middleware plus a per-request role resolution — hiding the buttons is
//! not enough, the handlers themselves refuse non-admin callers.

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::auth::{
    create_reset_token, create_session_token, hash_password, validate_session_token,
    verify_password,
};
use crate::catalog::{self, Catalog, ProductForm};
use crate::error::AppError;
use crate::files::FileStore;
use crate::models::{AdminConfig, Identity, Product, Role, Script};
use crate::moderation::{ModerationConsole, SortDirection, StatusFilter};
use crate::session::{RoleResolver, SessionContext};
use crate::storage::Storage;
use crate::submission::{self, SubmissionForm};

/// Shared app state for REST handlers (Arc-wrapped for concurrency).
#[derive(Clone)]
pub struct AppState {
    storage: Storage,
    files: FileStore,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Deserialize)]
pub struct ResetRequest {
    pub email: String,
}

/// DTO for a strategy submission (REST body).
#[derive(Deserialize)]
pub struct SubmitRequest {
    pub title: String,
    pub description: String,
    /// Comma-separated indicator names, as typed into the form.
    pub indicators: String,
    #[serde(default)]
    pub screenshot: Option<String>,
}

#[derive(Deserialize)]
pub struct DeliverableRequest {
    pub content: String,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub filter: Option<String>,
    pub sort: Option<String>,
}

#[derive(Deserialize)]
pub struct UploadQuery {
    pub filename: String,
}

/// Generic REST response (JSON).
#[derive(Serialize)]
pub struct RestResponse {
    pub success: bool,
    pub message: String,
    pub results: Vec<String>, // ids, tokens or upload references
}

impl RestResponse {
    fn ok(message: impl Into<String>, results: Vec<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            results,
        })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Unauthorized => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            warn!(error = %self, "request failed");
        }
        let body = Json(RestResponse {
            success: false,
            message: self.to_string(),
            results: vec![],
        });
        (status, body).into_response()
    }
}

async fn auth_middleware(
    State(_state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AppError::Unauthenticated)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthenticated)?;
    let claims = validate_session_token(token).map_err(|_| AppError::Unauthenticated)?;

    req.extensions_mut().insert(Identity {
        id: claims.sub,
        email: claims.email,
    });
    Ok(next.run(req).await)
}

/// Resolves the caller's role and refuses anything but an admin session,
/// before the handler runs. The resolved session rides along as an
/// extension so handlers can re-assert it at their own boundary.
async fn admin_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = req.extensions().get::<Identity>().cloned();
    let session = RoleResolver::new(state.storage.clone()).resolve(identity);
    if !session.is_admin() {
        return Err(AppError::Unauthorized);
    }
    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}

/// Create the Axum router over storage and the file store.
pub fn create_router(storage: Storage, files: FileStore) -> Router {
    let state = Arc::new(AppState { storage, files });

    let admin_routes = Router::new()
        .route("/admin/dashboard", get(dashboard_handler))
        .route("/admin/scripts", get(admin_list_scripts_handler))
        .route("/admin/scripts/:id/approve", post(approve_handler))
        .route("/admin/scripts/:id", delete(reject_handler))
        .route(
            "/admin/scripts/:id/deliverable",
            put(attach_deliverable_handler),
        )
        .route(
            "/admin/products",
            post(create_product_handler).get(admin_list_products_handler),
        )
        .route(
            "/admin/products/:id",
            put(update_product_handler).delete(delete_product_handler),
        )
        .route("/admin/uploads/:category/:kind", post(upload_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admin_middleware,
        ));

    let authed_routes = Router::new()
        .route("/scripts", post(submit_script_handler))
        .route("/my/scripts", get(my_scripts_handler))
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/reset-password", post(reset_password_handler))
        .route("/health", get(health_handler))
        .route("/store/products", get(storefront_handler))
        .route("/store/products/:id", get(product_detail_handler))
        .merge(authed_routes)
        .with_state(state)
}

// --- public handlers ---

async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<RestResponse>, AppError> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation(
            "email and password are required".to_string(),
        ));
    }
    let hash = hash_password(&payload.password)?;
    // Every sign-up starts as a plain user; roles are promoted out of band.
    let user = state.storage.create_user(&payload.email, &hash, Role::User)?;
    Ok(RestResponse::ok("account created", vec![user.id]))
}

async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = state
        .storage
        .find_user_by_email(&payload.email)?
        .ok_or(AppError::Unauthenticated)?;
    if !verify_password(&payload.password, &user.password_hash).unwrap_or(false) {
        return Err(AppError::Unauthenticated);
    }
    let token = create_session_token(&Identity {
        id: user.id,
        email: user.email,
    })?;
    Ok(Json(LoginResponse { token }))
}

/// Issues the reset token; delivering it by email is outside this service,
/// so the token is returned to the caller surface directly.
async fn reset_password_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResetRequest>,
) -> Result<Json<RestResponse>, AppError> {
    let user = state
        .storage
        .find_user_by_email(&payload.email)?
        .ok_or_else(|| AppError::NotFound(format!("no account for {}", payload.email)))?;
    let token = create_reset_token(&user.id)?;
    Ok(RestResponse::ok("reset token issued", vec![token]))
}

async fn health_handler() -> Json<RestResponse> {
    RestResponse::ok("tradeflow API healthy", vec![])
}

async fn storefront_handler(State(state): State<Arc<AppState>>) -> Json<Vec<Product>> {
    Json(catalog::storefront(&state.storage))
}

async fn product_detail_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, AppError> {
    state
        .storage
        .get_product(&id)?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

// --- authenticated handlers ---

async fn submit_script_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<SubmitRequest>,
) -> Result<Json<RestResponse>, AppError> {
    let script = submission::submit(
        &state.storage,
        Some(&identity),
        SubmissionForm {
            title: payload.title,
            description: payload.description,
            indicators_csv: payload.indicators,
            screenshot: payload.screenshot,
        },
    )?;
    Ok(RestResponse::ok("strategy submitted", vec![script.id]))
}

async fn my_scripts_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<Script>>, AppError> {
    Ok(Json(state.storage.list_scripts_for_user(&identity.id)?))
}

// --- admin handlers ---

fn parse_listing(params: &ListQuery) -> Result<(StatusFilter, SortDirection), AppError> {
    let filter = params.filter.as_deref().unwrap_or("all").parse()?;
    // The console defaults to newest first.
    let sort = params.sort.as_deref().unwrap_or("desc").parse()?;
    Ok((filter, sort))
}

async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<AdminConfig>, AppError> {
    let console = ModerationConsole::open(state.storage.clone(), &session)?;
    Ok(Json(AdminConfig {
        scripts_count: console.scripts_submitted()?,
    }))
}

async fn admin_list_scripts_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<Script>>, AppError> {
    let console = ModerationConsole::open(state.storage.clone(), &session)?;
    let (filter, sort) = parse_listing(&params)?;
    Ok(Json(console.list_scripts(filter, sort)))
}

async fn approve_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
) -> Result<Json<Script>, AppError> {
    let mut console = ModerationConsole::open(state.storage.clone(), &session)?;
    Ok(Json(console.approve(&id)?))
}

async fn reject_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
) -> Result<Json<RestResponse>, AppError> {
    let mut console = ModerationConsole::open(state.storage.clone(), &session)?;
    console.reject_and_delete(&id)?;
    Ok(RestResponse::ok(format!("script {id} rejected and deleted"), vec![]))
}

async fn attach_deliverable_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
    Json(payload): Json<DeliverableRequest>,
) -> Result<Json<Script>, AppError> {
    let mut console = ModerationConsole::open(state.storage.clone(), &session)?;
    Ok(Json(
        console.attach_deliverable_and_approve(&id, &payload.content)?,
    ))
}

async fn create_product_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    Json(payload): Json<ProductForm>,
) -> Result<Json<Product>, AppError> {
    let catalog = Catalog::admin(state.storage.clone(), &session)?;
    Ok(Json(catalog.create(payload)?))
}

async fn update_product_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
    Json(payload): Json<ProductForm>,
) -> Result<Json<Product>, AppError> {
    let catalog = Catalog::admin(state.storage.clone(), &session)?;
    Ok(Json(catalog.update(&id, payload)?))
}

async fn delete_product_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
) -> Result<Json<RestResponse>, AppError> {
    let catalog = Catalog::admin(state.storage.clone(), &session)?;
    if !catalog.delete(&id)? {
        return Err(AppError::NotFound(format!("product {id}")));
    }
    Ok(RestResponse::ok(format!("product {id} deleted"), vec![]))
}

async fn admin_list_products_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Vec<Product>>, AppError> {
    let catalog = Catalog::admin(state.storage.clone(), &session)?;
    Ok(Json(catalog.list()?))
}

/// Raw-body upload for product media and documents; returns the reference
/// and its public URL.
async fn upload_handler(
    State(state): State<Arc<AppState>>,
    Extension(_session): Extension<SessionContext>,
    Path((category, kind)): Path<(String, String)>,
    Query(params): Query<UploadQuery>,
    body: axum::body::Bytes,
) -> Result<Json<RestResponse>, AppError> {
    let reference = state
        .files
        .upload(&category, &kind, &params.filename, &body)?;
    let url = state.files.resolve_url(&reference);
    Ok(RestResponse::ok("uploaded", vec![reference, url]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::create_session_token;
    use crate::models::ScriptStatus;
    use crate::storage::NewScript;
    use axum::body::Body;
    use axum::http::Request;
    use std::fs;
    use tower::ServiceExt; // for .oneshot() testing

    struct TestApp {
        app: Router,
        storage: Storage,
        dirs: Vec<std::path::PathBuf>,
    }

    impl Drop for TestApp {
        fn drop(&mut self) {
            for dir in &self.dirs {
                let _ = fs::remove_dir_all(dir);
            }
        }
    }

    fn test_app(name: &str) -> TestApp {
        let data_dir = std::env::temp_dir().join(format!("{name}_data"));
        let files_dir = std::env::temp_dir().join(format!("{name}_files"));
        let _ = fs::remove_dir_all(&data_dir);
        let _ = fs::remove_dir_all(&files_dir);
        let storage = Storage::open(data_dir.to_str().unwrap()).expect("storage");
        let files = FileStore::open(&files_dir).expect("files");
        TestApp {
            app: create_router(storage.clone(), files),
            storage,
            dirs: vec![data_dir, files_dir],
        }
    }

    fn token_for(storage: &Storage, email: &str, role: Role) -> String {
        let user = storage
            .create_user(email, "hash", role)
            .expect("create user");
        create_session_token(&Identity {
            id: user.id,
            email: user.email,
        })
        .expect("token")
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn authed_json_request(
        method: &str,
        uri: &str,
        token: &str,
        body: serde_json::Value,
    ) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {token}"))
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn authed_request(method: &str, uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let t = test_app("tradeflow_test_rest_health");
        let response = t
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .method("GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("health request");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_register_creates_user_with_user_role() {
        let t = test_app("tradeflow_test_rest_register");
        let response = t
            .app
            .clone()
            .oneshot(json_request(
                "POST",
                "/register",
                serde_json::json!({"email": "trader@example.com", "password": "hunter2"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let user = t
            .storage
            .find_user_by_email("trader@example.com")
            .unwrap()
            .unwrap();
        assert_eq!(user.role, Role::User);

        // Wrong password never yields a token.
        let response = t
            .app
            .clone()
            .oneshot(json_request(
                "POST",
                "/login",
                serde_json::json!({"email": "trader@example.com", "password": "wrong"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_submission_requires_a_session() {
        let t = test_app("tradeflow_test_rest_anon");
        let response = t
            .app
            .clone()
            .oneshot(json_request(
                "POST",
                "/scripts",
                serde_json::json!({"title": "x", "description": "y", "indicators": "RSI"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(t.storage.list_scripts().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_admin_surface_refuses_plain_users() {
        let t = test_app("tradeflow_test_rest_forbidden");
        let token = token_for(&t.storage, "trader@example.com", Role::User);

        let response = t
            .app
            .clone()
            .oneshot(authed_request("GET", "/admin/scripts", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_submit_then_moderate_flow() {
        let t = test_app("tradeflow_test_rest_flow");
        let user_token = token_for(&t.storage, "trader@example.com", Role::User);
        let admin_token = token_for(&t.storage, "admin@example.com", Role::Admin);

        // User submits a strategy.
        let response = t
            .app
            .clone()
            .oneshot(authed_json_request(
                "POST",
                "/scripts",
                &user_token,
                serde_json::json!({
                    "title": "Breakout",
                    "description": "Detects key level breaks",
                    "indicators": "RSI, MACD",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let script = t.storage.list_scripts().unwrap().pop().unwrap();
        assert_eq!(script.status, ScriptStatus::Pending);

        // Admin sees the pending listing.
        let response = t
            .app
            .clone()
            .oneshot(authed_request(
                "GET",
                "/admin/scripts?filter=pending&sort=desc",
                &admin_token,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Attaching the deliverable completes the script.
        let response = t
            .app
            .clone()
            .oneshot(authed_json_request(
                "PUT",
                &format!("/admin/scripts/{}/deliverable", script.id),
                &admin_token,
                serde_json::json!({"content": "  study(\"Breakout\")  "}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let stored = t.storage.get_script(&script.id).unwrap().unwrap();
        assert_eq!(stored.status, ScriptStatus::Completed);
        assert_eq!(stored.pine_script.as_deref(), Some("study(\"Breakout\")"));

        // Rejecting a second submission deletes it outright.
        let doomed = t
            .storage
            .create_script(NewScript {
                title: "Doomed".to_string(),
                description: "d".to_string(),
                indicators: vec![],
                user_id: "uid-x".to_string(),
                user_email: None,
                screenshot: None,
            })
            .unwrap();
        let response = t
            .app
            .clone()
            .oneshot(authed_request(
                "DELETE",
                &format!("/admin/scripts/{}", doomed.id),
                &admin_token,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(t.storage.get_script(&doomed.id).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_storefront_is_public_and_detail_404s() {
        let t = test_app("tradeflow_test_rest_store");
        let admin_token = token_for(&t.storage, "admin@example.com", Role::Admin);

        let response = t
            .app
            .clone()
            .oneshot(authed_json_request(
                "POST",
                "/admin/products",
                &admin_token,
                serde_json::json!({
                    "title": "Breakout Pro",
                    "price": "49€",
                    "compatibility": "TradingView, MT4",
                    "detailedDescription": "Exclusive algorithm\nReal-time alerts",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = t
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/store/products")
                    .method("GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = t
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/store/products/no-such-id")
                    .method("GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_admin_upload_roundtrip() {
        let t = test_app("tradeflow_test_rest_upload");
        let admin_token = token_for(&t.storage, "admin@example.com", Role::Admin);

        let response = t
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/admin/uploads/products/media?filename=demo.gif")
                    .header("authorization", format!("Bearer {admin_token}"))
                    .body(Body::from(&b"GIF89a"[..]))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
