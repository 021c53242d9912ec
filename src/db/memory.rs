use std::collections::BTreeMap;

use chrono::Utc;
use tokio::sync::RwLock;

use super::{ClientStore, StoreResult};
use crate::error::StoreError;
use crate::models::{cmp_by_name, Client, NewClient};

#[derive(Default)]
struct Inner {
    next_id: i32,
    clients: BTreeMap<i32, Client>,
}

/// Process-local store. Ids start at 1 and are never reused.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClientStore for MemoryStore {
    async fn list_clients(&self) -> StoreResult<Vec<Client>> {
        let inner = self.inner.read().await;
        let mut clients: Vec<Client> = inner.clients.values().cloned().collect();
        clients.sort_by(cmp_by_name);
        Ok(clients)
    }

    async fn get_client(&self, id: i32) -> StoreResult<Client> {
        let inner = self.inner.read().await;
        inner
            .clients
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn create_client(&self, client: &NewClient) -> StoreResult<Client> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let id = inner.next_id;

        let created = Client::stamp(id, client.clone(), Utc::now());
        inner.clients.insert(id, created.clone());
        Ok(created)
    }

    async fn update_client(&self, id: i32, client: &NewClient) -> StoreResult<Client> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .clients
            .get_mut(&id)
            .ok_or(StoreError::NotFound(id))?;

        stored.apply(client.clone());
        Ok(stored.clone())
    }

    async fn delete_client(&self, id: i32) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner
            .clients
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }
}
