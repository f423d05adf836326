use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use item_service::{
    AppState,
    auth::AuthUser,
    config::AppConfig,
    credentials::MemoryCredentialStore,
    extract::{ApiJson, ApiPath},
    handlers::{self, ApiError},
    models::{CreateItemRequest, Item, MessageResponse, PatchItemRequest, Role},
    repository::ItemRepository,
    storage::{self, MockItemStorage},
    token::{Identity, TokenService},
};
use std::sync::Arc;
use tokio::test;

// --- TEST UTILITIES ---

// Creates an AppState around a fresh seeded repository and returns the storage handle
// so tests can inject failures.
async fn create_test_state() -> (AppState, Arc<MockItemStorage>) {
    let storage = Arc::new(MockItemStorage::with_items(storage::seed_items()));
    let repo = ItemRepository::open(storage.clone()).await.unwrap();

    let state = AppState {
        items: Arc::new(repo),
        credentials: Arc::new(MemoryCredentialStore::default()),
        tokens: Arc::new(TokenService::from_secret("handler-test-secret")),
        config: AppConfig::default(),
    };
    (state, storage)
}

fn admin_user() -> AuthUser {
    AuthUser(Identity {
        user_id: 1,
        role: Role::Admin,
    })
}

fn plain_user() -> AuthUser {
    AuthUser(Identity {
        user_id: 2,
        role: Role::User,
    })
}

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let (_parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// --- HANDLER TESTS ---

#[test]
async fn test_get_item_success() {
    let (state, _) = create_test_state().await;

    let result = handlers::get_item(State(state), ApiPath(1)).await;

    let item: Item = body_json(result.unwrap().into_response()).await;
    assert_eq!(item.name, "Item 1");
}

#[test]
async fn test_get_item_not_found() {
    let (state, _) = create_test_state().await;

    let result = handlers::get_item(State(state), ApiPath(404)).await;

    assert_eq!(result.unwrap_err(), ApiError::NotFound);
}

#[test]
async fn test_list_items_any_role() {
    let (state, _) = create_test_state().await;

    let Json(as_user) = handlers::list_items(plain_user(), State(state.clone()))
        .await
        .unwrap();
    let Json(as_admin) = handlers::list_items(admin_user(), State(state))
        .await
        .unwrap();

    assert_eq!(as_user.len(), 2);
    assert_eq!(as_user, as_admin);
}

#[test]
async fn test_create_item_forbidden_for_user() {
    let (state, storage) = create_test_state().await;

    let result = handlers::create_item(
        plain_user(),
        State(state.clone()),
        ApiJson(CreateItemRequest {
            name: "x".into(),
            description: "y".into(),
        }),
    )
    .await;

    assert_eq!(result.unwrap_err(), ApiError::Forbidden);
    assert_eq!(state.items.list().await.len(), 2);
    assert_eq!(storage.save_count(), 0);
}

#[test]
async fn test_create_item_success() {
    let (state, _) = create_test_state().await;

    let (status, Json(item)) = handlers::create_item(
        admin_user(),
        State(state),
        ApiJson(CreateItemRequest {
            name: "Item 3".into(),
            description: "Description 3".into(),
        }),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(item.id, 3);
}

#[test]
async fn test_create_item_storage_failure() {
    let (state, storage) = create_test_state().await;
    storage.set_failing(true);

    let result = handlers::create_item(
        admin_user(),
        State(state.clone()),
        ApiJson(CreateItemRequest::default()),
    )
    .await;

    let err = result.unwrap_err();
    assert_eq!(err, ApiError::StorageFailure);
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(state.items.list().await.len(), 2);
}

#[test]
async fn test_replace_item_not_found() {
    let (state, _) = create_test_state().await;

    let result = handlers::replace_item(
        admin_user(),
        State(state),
        ApiPath(77),
        ApiJson(CreateItemRequest::default()),
    )
    .await;

    assert_eq!(result.unwrap_err(), ApiError::NotFound);
}

#[test]
async fn test_replace_item_forbidden_before_lookup() {
    let (state, _) = create_test_state().await;

    // Missing id, but the role check comes first.
    let result = handlers::replace_item(
        plain_user(),
        State(state),
        ApiPath(77),
        ApiJson(CreateItemRequest::default()),
    )
    .await;

    assert_eq!(result.unwrap_err(), ApiError::Forbidden);
}

#[test]
async fn test_patch_item_partial() {
    let (state, _) = create_test_state().await;

    let Json(item) = handlers::patch_item(
        admin_user(),
        State(state),
        ApiPath(2),
        ApiJson(PatchItemRequest {
            name: Some("Renamed".into()),
            description: None,
        }),
    )
    .await
    .unwrap();

    assert_eq!(item.name, "Renamed");
    assert_eq!(item.description, "Description 2");
}

#[test]
async fn test_delete_item_returns_removed() {
    let (state, _) = create_test_state().await;

    let Json(response) = handlers::delete_item(admin_user(), State(state.clone()), ApiPath(1))
        .await
        .unwrap();

    assert_eq!(response.item.id, 1);
    assert!(matches!(
        handlers::get_item(State(state), ApiPath(1)).await,
        Err(ApiError::NotFound)
    ));
}

#[test]
async fn test_delete_item_forbidden_for_user() {
    let (state, _) = create_test_state().await;

    let result = handlers::delete_item(plain_user(), State(state.clone()), ApiPath(1)).await;

    assert_eq!(result.unwrap_err(), ApiError::Forbidden);
    assert!(state.items.get(1).await.is_ok());
}

#[test]
async fn test_welcome_endpoints_follow_roles() {
    assert_eq!(
        handlers::admin_welcome(plain_user()).await.unwrap_err(),
        ApiError::Forbidden
    );

    let Json(MessageResponse { message }) = handlers::admin_welcome(admin_user()).await.unwrap();
    assert_eq!(message, "Welcome, Admin!");

    assert!(handlers::user_welcome(plain_user()).await.is_ok());
    assert!(handlers::user_welcome(admin_user()).await.is_ok());
}

#[test]
async fn test_create_refused_when_id_space_exhausted() {
    let storage = Arc::new(MockItemStorage::with_items(vec![Item {
        id: u64::MAX,
        name: "last".into(),
        description: "last".into(),
    }]));
    let (mut state, _) = create_test_state().await;
    state.items = Arc::new(ItemRepository::open(storage.clone()).await.unwrap());

    let result = handlers::create_item(
        admin_user(),
        State(state),
        ApiJson(CreateItemRequest::default()),
    )
    .await;

    let err = result.unwrap_err();
    assert_eq!(err, ApiError::Internal);
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(storage.save_count(), 0);
}

#[test]
async fn test_error_response_body_is_message_json() {
    let response = ApiError::Forbidden.into_response();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body: MessageResponse = body_json(response).await;
    assert_eq!(body.message, "Access denied");
}
