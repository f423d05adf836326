use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::error;

use crate::{
    error::{StorageError, StoreError},
    models::{Item, ItemPatch},
    storage::StorageState,
};

/// ItemRepository
///
/// The single owner of the item collection. Readers share the lock; every mutation holds
/// the exclusive lock across the whole read-modify-persist cycle, so mutations are totally
/// ordered and a reader never sees a state that has not been persisted.
///
/// Mutations work on a copy of the collection. Memory is replaced only after the storage
/// backend accepted the new collection; if persisting fails, memory keeps its
/// pre-operation value and the caller gets `StoreError::StorageFailure`.
///
/// Once a change has been handed to storage, the persist-and-commit step runs on its own
/// task. Dropping the caller's future does not abandon it halfway.
pub struct ItemRepository {
    items: Arc<RwLock<Vec<Item>>>,
    storage: StorageState,
}

/// RepositoryState
///
/// The concrete type used to share the item repository across the application state.
pub type RepositoryState = Arc<ItemRepository>;

impl ItemRepository {
    /// open
    ///
    /// Loads the persisted collection once and takes ownership of it.
    pub async fn open(storage: StorageState) -> Result<Self, StorageError> {
        let items = storage.load_items().await?;
        Ok(Self {
            items: Arc::new(RwLock::new(items)),
            storage,
        })
    }

    /// Snapshot of all items in insertion order.
    pub async fn list(&self) -> Vec<Item> {
        self.items.read().await.clone()
    }

    pub async fn get(&self, id: u64) -> Result<Item, StoreError> {
        self.items
            .read()
            .await
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    /// create
    ///
    /// Appends a new item with id `max(existing) + 1` (or 1 when empty). Fails with
    /// `StoreError::IdSpaceExhausted` instead of wrapping when the max is `u64::MAX`.
    pub async fn create(&self, name: String, description: String) -> Result<Item, StoreError> {
        self.mutate(|items| {
            let item = Item {
                id: next_id(items)?,
                name,
                description,
            };
            items.push(item.clone());
            Ok(item)
        })
        .await
    }

    /// replace
    ///
    /// Overwrites both mutable fields of an existing item.
    pub async fn replace(
        &self,
        id: u64,
        name: String,
        description: String,
    ) -> Result<Item, StoreError> {
        self.mutate(|items| {
            let item = find_mut(items, id)?;
            item.name = name;
            item.description = description;
            Ok(item.clone())
        })
        .await
    }

    /// patch
    ///
    /// Overwrites only the fields present and non-empty in `patch`. An empty patch still
    /// returns the current item, without touching storage.
    pub async fn patch(&self, id: u64, patch: ItemPatch) -> Result<Item, StoreError> {
        self.mutate(|items| {
            let item = find_mut(items, id)?;
            patch.apply_to(item);
            Ok(item.clone())
        })
        .await
    }

    /// delete
    ///
    /// Removes the item and returns it.
    pub async fn delete(&self, id: u64) -> Result<Item, StoreError> {
        self.mutate(|items| {
            let index = items
                .iter()
                .position(|item| item.id == id)
                .ok_or(StoreError::NotFound(id))?;
            Ok(items.remove(index))
        })
        .await
    }

    /// The exclusive section shared by every mutation.
    async fn mutate<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Vec<Item>) -> Result<T, StoreError>,
    {
        let mut guard = self.items.clone().write_owned().await;

        let mut working = guard.clone();
        let out = op(&mut working)?;

        if working == *guard {
            return Ok(out);
        }

        let storage = self.storage.clone();
        tokio::spawn(async move {
            storage.save_items(&working).await?;
            *guard = working;
            Ok::<_, StorageError>(())
        })
        .await
        .map_err(|e| {
            error!(error = %e, "persistence task did not complete");
            StorageError::Rejected(format!("persistence task failed: {e}"))
        })??;

        Ok(out)
    }
}

fn next_id(items: &[Item]) -> Result<u64, StoreError> {
    match items.iter().map(|item| item.id).max() {
        None => Ok(1),
        Some(max) => max.checked_add(1).ok_or(StoreError::IdSpaceExhausted),
    }
}

fn find_mut(items: &mut [Item], id: u64) -> Result<&mut Item, StoreError> {
    items
        .iter_mut()
        .find(|item| item.id == id)
        .ok_or(StoreError::NotFound(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: u64) -> Item {
        Item {
            id,
            name: format!("Item {id}"),
            description: format!("Description {id}"),
        }
    }

    #[test]
    fn next_id_follows_current_max() {
        assert_eq!(next_id(&[]).unwrap(), 1);
        assert_eq!(next_id(&[item(1), item(2)]).unwrap(), 3);
        assert_eq!(next_id(&[item(5), item(2)]).unwrap(), 6);
    }

    #[test]
    fn next_id_refuses_to_wrap() {
        assert!(matches!(
            next_id(&[item(u64::MAX)]),
            Err(StoreError::IdSpaceExhausted)
        ));
        assert_eq!(next_id(&[item(u64::MAX - 1)]).unwrap(), u64::MAX);
    }

    #[test]
    fn find_mut_reports_missing_id() {
        let mut items = vec![item(1)];
        assert!(matches!(find_mut(&mut items, 9), Err(StoreError::NotFound(9))));
    }
}
