use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, SignupRequest, UserResponse},
        jwt::AuthUser,
        repo_types::PublicUser,
    },
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/verify", get(verify))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let Json(payload) = payload?;
    let user = state.auth.signup(payload).await?;
    Ok((StatusCode::CREATED, Json(UserResponse { user })))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(payload) = payload?;
    let auth_token = state.auth.login(payload).await?;
    Ok(Json(LoginResponse { auth_token }))
}

#[instrument(skip_all)]
pub async fn verify(AuthUser(claims): AuthUser) -> Json<PublicUser> {
    Json(PublicUser::from(claims))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::app::build_app;
    use crate::auth::repo::memory::MemoryAccountStore;
    use crate::state::AppState;

    async fn call(app: axum::Router, req: Request<Body>) -> (axum::http::StatusCode, Value) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn app() -> (Arc<MemoryAccountStore>, axum::Router) {
        let accounts = Arc::new(MemoryAccountStore::default());
        let state = AppState::in_memory(accounts.clone());
        (accounts, build_app(state))
    }

    #[tokio::test]
    async fn signup_login_verify_flow() {
        let (_, app) = app();

        let (status, body) = call(
            app.clone(),
            post_json(
                "/auth/signup",
                json!({"email": "user@x.com", "password": "Valid1!x", "name": "User"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["email"], "user@x.com");
        assert!(body["user"].get("password_hash").is_none());
        let id = body["user"]["id"].clone();

        let (status, body) = call(
            app.clone(),
            post_json("/auth/login", json!({"email": "user@x.com", "password": "Valid1!x"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["authToken"].as_str().unwrap().to_string();

        let (status, body) = call(
            app,
            Request::builder()
                .uri("/auth/verify")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], id);
        assert_eq!(body["email"], "user@x.com");
        assert_eq!(body["name"], "User");
        assert!(body.get("user").is_none());
    }

    #[tokio::test]
    async fn signup_conflict_is_bad_request() {
        let (accounts, app) = app();
        let signup = json!({"email": "user@x.com", "password": "Valid1!x", "name": "User"});
        call(app.clone(), post_json("/auth/signup", signup)).await;
        let (status, body) = call(
            app,
            post_json(
                "/auth/signup",
                json!({"email": "USER@X.COM", "password": "Valid1!x", "name": "Other"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "User already exists.");
        assert_eq!(accounts.len().await, 1);
    }

    #[tokio::test]
    async fn login_status_codes() {
        let (_, app) = app();
        call(
            app.clone(),
            post_json(
                "/auth/signup",
                json!({"email": "user@x.com", "password": "Valid1!x", "name": "User"}),
            ),
        )
        .await;

        let (status, _) = call(app.clone(), post_json("/auth/login", json!({"email": "user@x.com"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            app.clone(),
            post_json("/auth/login", json!({"email": "ghost@x.com", "password": "Valid1!x"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let wrong = json!({"email": "user@x.com", "password": "Wrong1!x"});
        for _ in 0..9 {
            let (status, _) = call(app.clone(), post_json("/auth/login", wrong.clone())).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }
        let (status, _) = call(app.clone(), post_json("/auth/login", wrong)).await;
        assert_eq!(status, StatusCode::LOCKED);

        let (status, _) = call(
            app,
            post_json("/auth/login", json!({"email": "user@x.com", "password": "Valid1!x"})),
        )
        .await;
        assert_eq!(status, StatusCode::LOCKED);
    }

    #[tokio::test]
    async fn mistyped_body_is_bad_request() {
        let (accounts, app) = app();

        let (status, _) = call(app.clone(), post_json("/auth/login", json!({"email": 5}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            app.clone(),
            post_json("/auth/signup", json!({"email": "user@x.com", "password": 5, "name": "User"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            app,
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(accounts.len().await, 0);
    }

    #[tokio::test]
    async fn verify_requires_token() {
        let (_, app) = app();
        let (status, _) = call(
            app.clone(),
            Request::builder().uri("/auth/verify").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(
            app,
            Request::builder()
                .uri("/auth/verify")
                .header(header::AUTHORIZATION, "Bearer not.a.token")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
