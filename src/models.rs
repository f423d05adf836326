use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// --- Core Records (Persisted) ---

/// Role
///
/// The RBAC permission class carried by every user and embedded in issued tokens.
/// Serialized exactly as stored in `users.json` (`"Admin"` / `"User"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Role {
    Admin,
    User,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => f.write_str("Admin"),
            Role::User => f.write_str("User"),
        }
    }
}

/// User
///
/// A credential record from the users collection. Owned by the credential store and
/// never mutated at request time. The password is only ever held as an Argon2 PHC string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

/// Item
///
/// The record managed by the item repository. Ids are unique and assigned as
/// `max(existing) + 1` on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[ts(export)]
pub struct Item {
    pub id: u64,
    pub name: String,
    pub description: String,
}

/// ItemPatch
///
/// Partial update of an item. A field overwrites the stored value only when it is
/// present and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl ItemPatch {
    /// Applies the present, non-empty fields to `item`.
    pub fn apply_to(&self, item: &mut Item) {
        if let Some(name) = self.name.as_deref().filter(|v| !v.is_empty()) {
            item.name = name.to_string();
        }
        if let Some(description) = self.description.as_deref().filter(|v| !v.is_empty()) {
            item.description = description.to_string();
        }
    }
}

// --- Request Payloads (Input Schemas) ---

/// LoginRequest
///
/// Input payload for POST /api/login.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// CreateItemRequest
///
/// Input payload for POST /api/items. Also used for the full overwrite in PUT /api/items/{id}.
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[ts(export)]
pub struct CreateItemRequest {
    pub name: String,
    pub description: String,
}

/// PatchItemRequest
///
/// Partial update payload (PATCH /api/items/{id}). Omitted fields are skipped on
/// serialization so the payload only carries what the client wants changed.
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[ts(export)]
pub struct PatchItemRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<PatchItemRequest> for ItemPatch {
    fn from(req: PatchItemRequest) -> Self {
        ItemPatch {
            name: req.name,
            description: req.description,
        }
    }
}

// --- Response Schemas (Output) ---

/// LoginResponse
///
/// Output of a successful login. The token is valid until `expires_at` (one hour).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    #[ts(type = "string")]
    pub expires_at: DateTime<Utc>,
}

/// DeleteItemResponse
///
/// Confirms a deletion and echoes the removed record.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DeleteItemResponse {
    pub message: String,
    pub item: Item,
}

/// MessageResponse
///
/// Plain `{"message": ...}` body used for greetings and every error response.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
