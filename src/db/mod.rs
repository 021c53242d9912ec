mod memory;

use chrono::Utc;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::StoreError;
use crate::models::{Client, NewClient};

pub use memory::MemoryStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Where clients are kept.
///
/// `create_client` is the only place a `Client` comes into existence, and
/// it is where `created_at` gets stamped.
pub(crate) trait ClientStore {
    /// All clients ordered by last name, first name, then id. Names compare with
    /// ASCII case folded and otherwise by code point, whatever the backend.
    async fn list_clients(&self) -> StoreResult<Vec<Client>>;

    async fn get_client(&self, id: i32) -> StoreResult<Client>;

    async fn create_client(&self, client: &NewClient) -> StoreResult<Client>;

    /// Overwrite the editable fields. `created_at` is never touched.
    async fn update_client(&self, id: i32, client: &NewClient) -> StoreResult<Client>;

    async fn delete_client(&self, id: i32) -> StoreResult<()>;
}

const CLIENT_COLUMNS: &str = "id, firstname, lastname, phone, created_at";

/// Postgres-backed store
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new Database instance with a connection pool and bring the schema up to date
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        info!(max_connections, "connected to postgres");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn get_pool(&self) -> &PgPool {
        &self.pool
    }
}

impl ClientStore for Database {
    async fn list_clients(&self) -> StoreResult<Vec<Client>> {
        // Matches `cmp_by_name`: lower() under "C" only folds ASCII and compares bytes.
        let sql = format!(
            r#"
            SELECT {CLIENT_COLUMNS} FROM clients
            ORDER BY lower(lastname COLLATE "C"), lower(firstname COLLATE "C"), id
            "#
        );
        let clients = sqlx::query_as::<_, Client>(&sql)
            .fetch_all(self.get_pool())
            .await?;

        Ok(clients)
    }

    async fn get_client(&self, id: i32) -> StoreResult<Client> {
        let sql = format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1");
        sqlx::query_as::<_, Client>(&sql)
            .bind(id)
            .fetch_optional(self.get_pool())
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    async fn create_client(&self, client: &NewClient) -> StoreResult<Client> {
        let sql = format!(
            r#"
            INSERT INTO clients (firstname, lastname, phone, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING {CLIENT_COLUMNS}
            "#
        );
        let created = sqlx::query_as::<_, Client>(&sql)
            .bind(client.firstname())
            .bind(client.lastname())
            .bind(client.phone())
            .bind(Utc::now())
            .fetch_one(self.get_pool())
            .await?;

        debug!(id = created.id(), "created client");
        Ok(created)
    }

    async fn update_client(&self, id: i32, client: &NewClient) -> StoreResult<Client> {
        let sql = format!(
            r#"
            UPDATE clients
            SET firstname = $1, lastname = $2, phone = $3
            WHERE id = $4
            RETURNING {CLIENT_COLUMNS}
            "#
        );
        let updated = sqlx::query_as::<_, Client>(&sql)
            .bind(client.firstname())
            .bind(client.lastname())
            .bind(client.phone())
            .bind(id)
            .fetch_optional(self.get_pool())
            .await?
            .ok_or(StoreError::NotFound(id))?;

        debug!(id, "updated client");
        Ok(updated)
    }

    async fn delete_client(&self, id: i32) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(self.get_pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }

        debug!(id, "deleted client");
        Ok(())
    }
}

/// The backend picked at startup
pub enum Storage {
    Postgres(Database),
    Memory(MemoryStore),
}

impl Storage {
    /// Whether clients written now survive the process
    pub fn is_persistent(&self) -> bool {
        matches!(self, Storage::Postgres(_))
    }
}

impl ClientStore for Storage {
    async fn list_clients(&self) -> StoreResult<Vec<Client>> {
        match self {
            Storage::Postgres(db) => db.list_clients().await,
            Storage::Memory(store) => store.list_clients().await,
        }
    }

    async fn get_client(&self, id: i32) -> StoreResult<Client> {
        match self {
            Storage::Postgres(db) => db.get_client(id).await,
            Storage::Memory(store) => store.get_client(id).await,
        }
    }

    async fn create_client(&self, client: &NewClient) -> StoreResult<Client> {
        match self {
            Storage::Postgres(db) => db.create_client(client).await,
            Storage::Memory(store) => store.create_client(client).await,
        }
    }

    async fn update_client(&self, id: i32, client: &NewClient) -> StoreResult<Client> {
        match self {
            Storage::Postgres(db) => db.update_client(id, client).await,
            Storage::Memory(store) => store.update_client(id, client).await,
        }
    }

    async fn delete_client(&self, id: i32) -> StoreResult<()> {
        match self {
            Storage::Postgres(db) => db.delete_client(id).await,
            Storage::Memory(store) => store.delete_client(id).await,
        }
    }
}

/// Open the configured backend
pub async fn init(config: &Config) -> StoreResult<Storage> {
    match config.database_url() {
        Some(url) => {
            let db = Database::connect(url, config.max_connections).await?;
            Ok(Storage::Postgres(db))
        }
        None => {
            warn!("DATABASE_URL is not set, clients are kept in memory until the process exits");
            Ok(Storage::Memory(MemoryStore::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn init_without_database_url_uses_memory() {
        let config = Config::from_pairs(std::iter::empty::<(String, String)>()).unwrap();
        let storage = init(&config).await.unwrap();
        assert!(matches!(storage, Storage::Memory(_)));
        assert!(!storage.is_persistent());

        let created = storage
            .create_client(&NewClient::new("Jane", "Doe", None).unwrap())
            .await
            .unwrap();
        assert_eq!(storage.get_client(created.id()).await.unwrap(), created);
    }
}
