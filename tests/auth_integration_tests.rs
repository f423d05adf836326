use axum::{
    extract::FromRequestParts,
    http::{Method, Request, Uri, header, request::Parts},
};
use chrono::{DateTime, Duration};
use item_service::{
    AppState,
    auth::{self, AuthUser},
    config::AppConfig,
    credentials::{FileCredentialStore, MemoryCredentialStore, hash_password},
    error::LoginError,
    handlers::ApiError,
    models::{Role, User},
    repository::ItemRepository,
    storage::MockItemStorage,
    token::{Identity, ManualClock, TokenService},
};
use std::sync::{Arc, OnceLock};

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

/// Hashing is slow; every test shares one set of users.
fn users() -> &'static Vec<User> {
    static USERS: OnceLock<Vec<User>> = OnceLock::new();
    USERS.get_or_init(|| {
        vec![
            User {
                id: 1,
                username: "admin".into(),
                password_hash: hash_password("admin123").unwrap(),
                role: Role::Admin,
            },
            User {
                id: 2,
                username: "user".into(),
                password_hash: hash_password("user123").unwrap(),
                role: Role::User,
            },
        ]
    })
}

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        DateTime::from_timestamp(1_760_000_000, 0).unwrap(),
    ))
}

async fn create_app_state(tokens: TokenService) -> AppState {
    let repo = ItemRepository::open(Arc::new(MockItemStorage::new()))
        .await
        .unwrap();

    AppState {
        items: Arc::new(repo),
        credentials: Arc::new(MemoryCredentialStore::new(users().clone())),
        tokens: Arc::new(tokens),
        config: AppConfig::default(),
    }
}

/// Helper to get the mutable Parts struct from a generated Request
fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn with_bearer(token: &str) -> Parts {
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );
    parts
}

// --- Login ---

#[tokio::test]
async fn test_login_issues_token_for_matching_credentials() {
    let store = MemoryCredentialStore::new(users().clone());
    let tokens = TokenService::new(TEST_JWT_SECRET, clock());

    for (username, password, expected) in [
        ("admin", "admin123", Identity { user_id: 1, role: Role::Admin }),
        ("user", "user123", Identity { user_id: 2, role: Role::User }),
    ] {
        let issued = auth::login(&store, &tokens, username, password)
            .await
            .unwrap();
        assert_eq!(tokens.verify(&issued.token).unwrap(), expected);
    }
}

#[tokio::test]
async fn test_login_wrong_password_is_invalid_credentials() {
    let store = MemoryCredentialStore::new(users().clone());
    let tokens = TokenService::new(TEST_JWT_SECRET, clock());

    let result = auth::login(&store, &tokens, "admin", "user123").await;

    assert!(matches!(result, Err(LoginError::InvalidCredentials)));
}

#[tokio::test]
async fn test_login_unknown_user_is_indistinguishable() {
    let store = MemoryCredentialStore::new(users().clone());
    let tokens = TokenService::new(TEST_JWT_SECRET, clock());

    let unknown = auth::login(&store, &tokens, "mallory", "admin123").await;
    let wrong = auth::login(&store, &tokens, "admin", "nope").await;

    assert!(matches!(unknown, Err(LoginError::InvalidCredentials)));
    assert!(matches!(wrong, Err(LoginError::InvalidCredentials)));
    assert_eq!(
        ApiError::from(unknown.unwrap_err()),
        ApiError::from(wrong.unwrap_err())
    );
}

#[tokio::test]
async fn test_login_unreadable_store_is_storage_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileCredentialStore::new(dir.path().join("missing-users.json"));
    let tokens = TokenService::new(TEST_JWT_SECRET, clock());

    let result = auth::login(&store, &tokens, "admin", "admin123").await;

    assert!(matches!(result, Err(LoginError::StorageUnavailable(_))));
}

#[tokio::test]
async fn test_login_against_users_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users.json");
    std::fs::write(&path, serde_json::to_vec(users()).unwrap()).unwrap();
    let store = FileCredentialStore::new(&path);
    let tokens = TokenService::new(TEST_JWT_SECRET, clock());

    let issued = auth::login(&store, &tokens, "user", "user123").await.unwrap();

    assert_eq!(tokens.verify(&issued.token).unwrap().role, Role::User);
}

// --- AuthUser Extractor ---

#[tokio::test]
async fn test_auth_success_with_valid_jwt() {
    let tokens = TokenService::new(TEST_JWT_SECRET, clock());
    let token = tokens.issue(2, Role::User).unwrap().token;
    let app_state = create_app_state(tokens).await;

    let mut parts = with_bearer(&token);
    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(
        auth_user.unwrap(),
        AuthUser(Identity {
            user_id: 2,
            role: Role::User
        })
    );
}

#[tokio::test]
async fn test_auth_failure_with_missing_header() {
    let app_state = create_app_state(TokenService::new(TEST_JWT_SECRET, clock())).await;

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(auth_user.unwrap_err(), ApiError::Unauthenticated);
}

#[tokio::test]
async fn test_auth_failure_with_non_bearer_scheme() {
    let tokens = TokenService::new(TEST_JWT_SECRET, clock());
    let token = tokens.issue(1, Role::Admin).unwrap().token;
    let app_state = create_app_state(tokens).await;

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Basic {}", token)).unwrap(),
    );
    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(auth_user.unwrap_err(), ApiError::Unauthenticated);
}

#[tokio::test]
async fn test_auth_failure_with_expired_jwt() {
    let clock = clock();
    let tokens = TokenService::new(TEST_JWT_SECRET, clock.clone());
    let token = tokens.issue(1, Role::Admin).unwrap().token;
    let app_state = create_app_state(tokens).await;

    clock.advance(Duration::hours(1) + Duration::seconds(1));

    let mut parts = with_bearer(&token);
    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(auth_user.unwrap_err(), ApiError::Unauthenticated);
}

#[tokio::test]
async fn test_auth_failure_with_foreign_signature() {
    let foreign = TokenService::new("a-different-secret", clock());
    let token = foreign.issue(1, Role::Admin).unwrap().token;
    let app_state = create_app_state(TokenService::new(TEST_JWT_SECRET, clock())).await;

    let mut parts = with_bearer(&token);
    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(auth_user.unwrap_err(), ApiError::Unauthenticated);
}

#[tokio::test]
async fn test_auth_reuses_identity_verified_by_route_layer() {
    let app_state = create_app_state(TokenService::new(TEST_JWT_SECRET, clock())).await;
    let verified = AuthUser(Identity {
        user_id: 1,
        role: Role::Admin,
    });

    // The route layer stores the identity it verified; the header is not decoded again.
    let mut parts = with_bearer("not.a.token");
    parts.extensions.insert(verified);
    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(auth_user.unwrap(), verified);
}
