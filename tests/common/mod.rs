#![allow(dead_code, unused_macros)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use futures::FutureExt;

use tiny_live_rooms::{
    api::AppState,
    auth::encode_credential,
    pili::{HubCredentials, HubError, PiliConfig, RoomHub, RoomInfo, RoomStatus},
    storage::{create_sqlite_account_store, Account, AccountStore, SqliteAccountStore, StorageError},
};

/// Builds the test service for an [`AppState`].
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($state))
                .configure(tiny_live_rooms::api::configure),
        )
        .await
    };
}

pub fn pili_config() -> PiliConfig {
    PiliConfig {
        credentials: HubCredentials::new("ak", "sk"),
        hub: "demo".into(),
        api_host: "https://pili.example.com".into(),
        publish_domain: "publish.example.com".into(),
        rtmp_play_domain: "rtmp.example.com".into(),
        hls_play_domain: "hls.example.com".into(),
        hdl_play_domain: "hdl.example.com".into(),
        publish_url_ttl: 3600,
        room_token_expiry: 3600,
        default_max_users: 99,
    }
}

pub async fn memory_store() -> SqliteAccountStore {
    create_sqlite_account_store("sqlite::memory:")
        .await
        .expect("Failed to create in-memory store")
}

pub fn token(name: &str, secret: &str) -> String {
    encode_credential(name, secret)
}

pub fn app_state(store: Arc<dyn AccountStore>, hub: Arc<FakeHub>) -> AppState {
    AppState::new(store, hub, pili_config())
}

/// In-process hub keeping rooms in a map.
#[derive(Default)]
pub struct FakeHub {
    rooms: Mutex<HashMap<String, RoomStatus>>,
    streams: Mutex<HashSet<String>>,
    deleted: Mutex<Vec<String>>,
    pub fail_deletes: AtomicBool,
    pub fail_creates: AtomicBool,
}

impl FakeHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_room(&self, name: &str, owner: &str) {
        self.rooms.lock().unwrap().insert(
            name.to_string(),
            RoomStatus {
                room: name.to_string(),
                owner: owner.to_string(),
                max_users: 99,
                status: 0,
            },
        );
    }

    pub fn room(&self, name: &str) -> Option<RoomStatus> {
        self.rooms.lock().unwrap().get(name).cloned()
    }

    pub fn has_stream(&self, key: &str) -> bool {
        self.streams.lock().unwrap().contains(key)
    }

    pub fn deleted_rooms(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }
}

fn unavailable() -> HubError {
    HubError::Rejected {
        status: 503,
        message: "hub unavailable".into(),
    }
}

impl RoomHub for FakeHub {
    fn create_room<'a>(
        &'a self,
        name: &'a str,
        owner: &'a str,
        max_users: u32,
    ) -> BoxFuture<'a, Result<RoomInfo, HubError>> {
        async move {
            if self.fail_creates.load(Ordering::SeqCst) {
                return Err(unavailable());
            }
            let mut rooms = self.rooms.lock().unwrap();
            if rooms.contains_key(name) {
                return Err(HubError::AlreadyExists(format!("room {name}")));
            }
            rooms.insert(
                name.to_string(),
                RoomStatus {
                    room: name.to_string(),
                    owner: owner.to_string(),
                    max_users,
                    status: 0,
                },
            );
            Ok(RoomInfo {
                room: name.to_string(),
            })
        }
        .boxed()
    }

    fn delete_room<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<(), HubError>> {
        async move {
            if self.fail_deletes.load(Ordering::SeqCst) {
                return Err(unavailable());
            }
            match self.rooms.lock().unwrap().remove(name) {
                Some(_) => {
                    self.deleted.lock().unwrap().push(name.to_string());
                    Ok(())
                }
                None => Err(HubError::NotFound(format!("room {name}"))),
            }
        }
        .boxed()
    }

    fn room_status<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<RoomStatus, HubError>> {
        async move {
            self.room(name)
                .ok_or_else(|| HubError::NotFound(format!("room {name}")))
        }
        .boxed()
    }

    fn create_stream<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), HubError>> {
        async move {
            if !self.streams.lock().unwrap().insert(key.to_string()) {
                return Err(HubError::AlreadyExists(format!("stream {key}")));
            }
            Ok(())
        }
        .boxed()
    }
}

/// Store whose writes (insert, delete by name, bulk delete) always fail.
/// Reads and password updates go to the real store.
pub struct BrokenWritesStore(pub SqliteAccountStore);

fn broken() -> StorageError {
    StorageError::Database(sqlx::Error::PoolClosed)
}

impl AccountStore for BrokenWritesStore {
    fn find_by_name<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<Account>, StorageError>> {
        self.0.find_by_name(name)
    }

    fn insert<'a>(&'a self, _account: &'a Account) -> BoxFuture<'a, Result<(), StorageError>> {
        async { Err(broken()) }.boxed()
    }

    fn update_secret<'a>(
        &'a self,
        name: &'a str,
        secret: &'a str,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        self.0.update_secret(name, secret)
    }

    fn delete_by_name<'a>(&'a self, _name: &'a str) -> BoxFuture<'a, Result<bool, StorageError>> {
        async { Err(broken()) }.boxed()
    }

    fn list_created_before<'a>(
        &'a self,
        cutoff: i64,
    ) -> BoxFuture<'a, Result<Vec<Account>, StorageError>> {
        self.0.list_created_before(cutoff)
    }

    fn delete_created_before<'a>(
        &'a self,
        _cutoff: i64,
    ) -> BoxFuture<'a, Result<Vec<String>, StorageError>> {
        async { Err(broken()) }.boxed()
    }
}

/// Store whose accounts disappear just before a password update lands.
pub struct VanishingStore(pub SqliteAccountStore);

impl AccountStore for VanishingStore {
    fn find_by_name<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<Account>, StorageError>> {
        self.0.find_by_name(name)
    }

    fn insert<'a>(&'a self, account: &'a Account) -> BoxFuture<'a, Result<(), StorageError>> {
        self.0.insert(account)
    }

    fn update_secret<'a>(
        &'a self,
        name: &'a str,
        secret: &'a str,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            self.0.delete_by_name(name).await?;
            self.0.update_secret(name, secret).await
        }
        .boxed()
    }

    fn delete_by_name<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<bool, StorageError>> {
        self.0.delete_by_name(name)
    }

    fn list_created_before<'a>(
        &'a self,
        cutoff: i64,
    ) -> BoxFuture<'a, Result<Vec<Account>, StorageError>> {
        self.0.list_created_before(cutoff)
    }

    fn delete_created_before<'a>(
        &'a self,
        cutoff: i64,
    ) -> BoxFuture<'a, Result<Vec<String>, StorageError>> {
        self.0.delete_created_before(cutoff)
    }
}
