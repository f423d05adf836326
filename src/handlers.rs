use crate::{
    AppState,
    access::{self, ADMIN_ONLY, ANY_ROLE},
    auth::{self, AuthUser},
    error::{LoginError, StoreError},
    extract::{ApiJson, ApiPath},
    models::{
        CreateItemRequest, DeleteItemResponse, Item, LoginRequest, LoginResponse,
        MessageResponse, PatchItemRequest,
    },
};
use axum::{
    Json,
    extract::{
        State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};

// --- Error Mapping ---

/// ApiError
///
/// Every failure a handler can surface. The core components return typed errors; this is
/// the one place they are turned into HTTP statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    BadRequest,
    InvalidCredentials,
    Unauthenticated,
    Forbidden,
    NotFound,
    StorageFailure,
    StorageUnavailable,
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials | ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::StorageFailure | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            ApiError::BadRequest => "Invalid request body",
            ApiError::InvalidCredentials => "Invalid credentials",
            ApiError::Unauthenticated => "Authentication required",
            ApiError::Forbidden => "Access denied",
            ApiError::NotFound => "Item not found",
            ApiError::StorageFailure => "Failed to save changes",
            ApiError::StorageUnavailable => "Storage unavailable",
            ApiError::Internal => "Internal error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(MessageResponse::new(self.message()))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::NotFound,
            StoreError::IdSpaceExhausted => {
                tracing::error!("item id space exhausted, create refused");
                ApiError::Internal
            }
            StoreError::StorageFailure(e) => {
                tracing::error!(error = %e, "item change rolled back, storage rejected the write");
                ApiError::StorageFailure
            }
        }
    }
}

impl From<LoginError> for ApiError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::InvalidCredentials => ApiError::InvalidCredentials,
            LoginError::StorageUnavailable(e) => {
                tracing::error!(error = %e, "credential store unavailable");
                ApiError::StorageUnavailable
            }
            other => {
                tracing::error!(error = %other, "login failed");
                ApiError::Internal
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "rejected request body");
        ApiError::BadRequest
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "unparseable item id");
        ApiError::NotFound
    }
}

impl From<access::Forbidden> for ApiError {
    fn from(denied: access::Forbidden) -> Self {
        tracing::info!(role = %denied.role, "access denied");
        ApiError::Forbidden
    }
}

// --- Handlers ---

/// login
///
/// [Public Route] Exchanges a username and password for a one-hour bearer token.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let issued = auth::login(
        state.credentials.as_ref(),
        &state.tokens,
        &payload.username,
        &payload.password,
    )
    .await
    .inspect_err(|e| {
        if matches!(e, LoginError::InvalidCredentials) {
            tracing::info!(username = %payload.username, "login rejected");
        }
    })?;

    Ok(Json(LoginResponse {
        token: issued.token,
        token_type: "Bearer".to_string(),
        expires_at: issued.expires_at,
    }))
}

/// list_items
///
/// [Authenticated Route] Lists every item, in insertion order. Any role.
pub async fn list_items(
    AuthUser(identity): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Item>>, ApiError> {
    access::require(&identity, ANY_ROLE)?;
    Ok(Json(state.items.list().await))
}

/// get_item
///
/// [Public Route] Retrieves a single item by id.
pub async fn get_item(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<u64>,
) -> Result<Json<Item>, ApiError> {
    Ok(Json(state.items.get(id).await?))
}

/// create_item
///
/// [Admin Route] Adds a new item; the id is assigned by the repository.
pub async fn create_item(
    AuthUser(identity): AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateItemRequest>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    access::require(&identity, ADMIN_ONLY)?;
    let item = state
        .items
        .create(payload.name, payload.description)
        .await?;
    tracing::info!(item_id = item.id, user_id = identity.user_id, "item created");
    Ok((StatusCode::CREATED, Json(item)))
}

/// replace_item
///
/// [Admin Route] Full overwrite of an item's name and description.
pub async fn replace_item(
    AuthUser(identity): AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<u64>,
    ApiJson(payload): ApiJson<CreateItemRequest>,
) -> Result<Json<Item>, ApiError> {
    access::require(&identity, ADMIN_ONLY)?;
    let item = state
        .items
        .replace(id, payload.name, payload.description)
        .await?;
    tracing::info!(item_id = id, user_id = identity.user_id, "item replaced");
    Ok(Json(item))
}

/// patch_item
///
/// [Admin Route] Partial update; absent or empty fields keep their stored value.
pub async fn patch_item(
    AuthUser(identity): AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<u64>,
    ApiJson(payload): ApiJson<PatchItemRequest>,
) -> Result<Json<Item>, ApiError> {
    access::require(&identity, ADMIN_ONLY)?;
    let item = state.items.patch(id, payload.into()).await?;
    tracing::info!(item_id = id, user_id = identity.user_id, "item patched");
    Ok(Json(item))
}

/// delete_item
///
/// [Admin Route] Removes an item and echoes it back.
pub async fn delete_item(
    AuthUser(identity): AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<u64>,
) -> Result<Json<DeleteItemResponse>, ApiError> {
    access::require(&identity, ADMIN_ONLY)?;
    let item = state.items.delete(id).await?;
    tracing::info!(item_id = id, user_id = identity.user_id, "item deleted");
    Ok(Json(DeleteItemResponse {
        message: "Item deleted".to_string(),
        item,
    }))
}

/// admin_welcome
///
/// [Admin Route] Greeting reachable only by administrators.
pub async fn admin_welcome(
    AuthUser(identity): AuthUser,
) -> Result<Json<MessageResponse>, ApiError> {
    access::require(&identity, ADMIN_ONLY)?;
    Ok(Json(MessageResponse::new("Welcome, Admin!")))
}

/// user_welcome
///
/// [Authenticated Route] Greeting for any signed-in user.
pub async fn user_welcome(
    AuthUser(identity): AuthUser,
) -> Result<Json<MessageResponse>, ApiError> {
    access::require(&identity, ANY_ROLE)?;
    Ok(Json(MessageResponse::new("Welcome, User!")))
}
