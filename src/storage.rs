use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::{
    credentials::hash_password,
    error::StorageError,
    models::{Item, Role, User},
};

// 1. ItemStorage Contract
/// ItemStorage
///
/// Defines the durable side of the item collection. The repository always hands over the
/// complete collection; backends rewrite it wholesale rather than appending.
///
/// Implementations: [`JsonFileStorage`] in production, [`MockItemStorage`] in tests.
#[async_trait]
pub trait ItemStorage: Send + Sync {
    /// Loads the full persisted collection, in stored order.
    async fn load_items(&self) -> Result<Vec<Item>, StorageError>;

    /// Replaces the persisted collection with `items`. Must either fully succeed or leave
    /// the previous persisted form intact.
    async fn save_items(&self, items: &[Item]) -> Result<(), StorageError>;
}

/// StorageState
///
/// The concrete type used to share a persistence backend.
pub type StorageState = Arc<dyn ItemStorage>;

// 2. The Real Implementation (JSON file)
/// JsonFileStorage
///
/// Keeps the collection as a pretty-printed JSON array in a single file.
#[derive(Clone, Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ItemStorage for JsonFileStorage {
    async fn load_items(&self) -> Result<Vec<Item>, StorageError> {
        read_json(&self.path).await
    }

    async fn save_items(&self, items: &[Item]) -> Result<(), StorageError> {
        write_json_atomic(&self.path, &items).await
    }
}

/// read_json
///
/// Reads and decodes a whole JSON document.
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| StorageError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_slice(&bytes).map_err(|source| StorageError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

/// write_json_atomic
///
/// Writes `value` next to `path` as `<name>.tmp`, syncs it, renames it over `path`, then
/// syncs the containing directory. A reader of `path` sees either the old document or the
/// new one, never a torn write.
pub async fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), StorageError> {
    let encoded = serde_json::to_vec_pretty(value).map_err(StorageError::Encode)?;
    let tmp_path = tmp_path_for(path);
    let write_err = |source| StorageError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut file = tokio::fs::File::create(&tmp_path).await.map_err(write_err)?;
    file.write_all(&encoded).await.map_err(write_err)?;
    file.sync_all().await.map_err(write_err)?;
    drop(file);

    if let Err(source) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(source));
    }

    // The rename is only durable once the directory entry is on disk.
    sync_dir(parent_dir(path)).await.map_err(write_err)
}

#[cfg(unix)]
async fn sync_dir(dir: &Path) -> std::io::Result<()> {
    tokio::fs::File::open(dir).await?.sync_all().await
}

#[cfg(not(unix))]
async fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

// 3. Data Directory Bootstrap
/// Items written to a fresh `items.json`.
pub fn seed_items() -> Vec<Item> {
    vec![
        Item {
            id: 1,
            name: "Item 1".to_string(),
            description: "Description 1".to_string(),
        },
        Item {
            id: 2,
            name: "Item 2".to_string(),
            description: "Description 2".to_string(),
        },
    ]
}

/// Users written to a fresh `users.json`, with their passwords hashed.
pub fn seed_users() -> Result<Vec<User>, StorageError> {
    let seeds = [
        (1, "admin", "admin123", Role::Admin),
        (2, "user", "user123", Role::User),
    ];

    seeds
        .into_iter()
        .map(|(id, username, password, role)| {
            Ok(User {
                id,
                username: username.to_string(),
                password_hash: hash_password(password).map_err(StorageError::Rejected)?,
                role,
            })
        })
        .collect()
}

/// ensure_file
///
/// Creates `path` holding `default_data` only if nothing exists there yet.
/// Returns `true` if the file was created.
pub async fn ensure_file<T, F>(path: &Path, default_data: F) -> Result<bool, StorageError>
where
    T: Serialize,
    F: FnOnce() -> Result<T, StorageError>,
{
    if tokio::fs::try_exists(path).await.map_err(|source| StorageError::Read {
        path: path.to_path_buf(),
        source,
    })? {
        return Ok(false);
    }

    write_json_atomic(path, &default_data()?).await?;
    tracing::info!(path = %path.display(), "created data file with seed records");
    Ok(true)
}

/// init_data_dir
///
/// Makes sure the data directory, `items.json` and `users.json` exist. Existing files are
/// never overwritten.
pub async fn init_data_dir(
    data_dir: &Path,
    items_path: &Path,
    users_path: &Path,
) -> Result<(), StorageError> {
    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|source| StorageError::Write {
            path: data_dir.to_path_buf(),
            source,
        })?;

    ensure_file(items_path, || Ok(seed_items())).await?;
    ensure_file(users_path, seed_users).await?;
    Ok(())
}

// 4. The Mock Implementation (For Tests)
/// MockItemStorage
///
/// In-memory backend used to exercise the repository without touching the filesystem.
/// Failure injection can be switched on and off between operations.
#[derive(Default)]
pub struct MockItemStorage {
    items: Mutex<Vec<Item>>,
    should_fail: AtomicBool,
    saves: AtomicUsize,
}

impl MockItemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<Item>) -> Self {
        Self {
            items: Mutex::new(items),
            ..Self::default()
        }
    }

    pub fn new_failing() -> Self {
        let storage = Self::default();
        storage.set_failing(true);
        storage
    }

    /// When true, every subsequent save is rejected.
    pub fn set_failing(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    /// Number of saves that were accepted.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// What a restart would load.
    pub async fn persisted(&self) -> Vec<Item> {
        self.items.lock().await.clone()
    }
}

#[async_trait]
impl ItemStorage for MockItemStorage {
    async fn load_items(&self) -> Result<Vec<Item>, StorageError> {
        Ok(self.items.lock().await.clone())
    }

    async fn save_items(&self, items: &[Item]) -> Result<(), StorageError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(StorageError::Rejected(
                "Mock Storage Error: Simulation requested".to_string(),
            ));
        }

        *self.items.lock().await = items.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
