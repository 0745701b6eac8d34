//! Account operations that span the account store and the hub.
//!
//! A user record and its room are meant to exist together. The two systems
//! share no transaction, so the second step failing triggers a best-effort
//! undo of the first. A failed undo is logged and can leave an orphan.

use crate::error::ApiError;
use crate::pili::{HubError, RoomHub};
use crate::storage::{Account, AccountStore, StorageError};

/// Creates the room on the hub, then the account record.
pub async fn create_account(
    store: &dyn AccountStore,
    hub: &dyn RoomHub,
    account: &Account,
    max_users: u32,
) -> Result<(), ApiError> {
    if store.find_by_name(&account.name).await?.is_some() {
        return Err(ApiError::Conflict(format!(
            "user {} already exists",
            account.name
        )));
    }

    hub.create_room(&account.room, &account.name, max_users)
        .await
        .map_err(|e| match e {
            HubError::AlreadyExists(_) => {
                ApiError::Conflict(format!("room {} already exists", account.room))
            }
            other => ApiError::Upstream(other),
        })?;

    if let Err(e) = store.insert(account).await {
        tracing::error!(name = %account.name, error = %e, "create user failed, removing its room");
        if let Err(undo) = hub.delete_room(&account.room).await {
            tracing::error!(room = %account.room, error = %undo, "orphaned room left on hub");
        }
        return Err(match e {
            StorageError::AlreadyExists(name) => {
                ApiError::Conflict(format!("user {name} already exists"))
            }
            other => ApiError::Storage(other),
        });
    }

    tracing::info!(name = %account.name, room = %account.room, "user created");
    Ok(())
}

/// Deletes the account's room, then its record.
///
/// Returns `Ok(false)` when there was no such account, which is how a race
/// with the expiry sweeper shows up.
pub async fn delete_account(
    store: &dyn AccountStore,
    hub: &dyn RoomHub,
    name: &str,
    max_users: u32,
) -> Result<bool, ApiError> {
    let Some(account) = store.find_by_name(name).await? else {
        return Ok(false);
    };

    match hub.delete_room(&account.room).await {
        Ok(()) | Err(HubError::NotFound(_)) => {}
        Err(e) => return Err(ApiError::Upstream(e)),
    }

    match store.delete_by_name(name).await {
        Ok(removed) => {
            tracing::info!(name, room = %account.room, "user deleted");
            Ok(removed)
        }
        Err(e) => {
            tracing::error!(name, error = %e, "delete user failed, restoring its room");
            if let Err(undo) = hub.create_room(&account.room, name, max_users).await {
                tracing::error!(room = %account.room, error = %undo, "room lost for remaining user");
            }
            Err(ApiError::Storage(e))
        }
    }
}
