//! MongoDB record store.

use async_trait::async_trait;
use mongodb::bson::{Document, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, IndexModel};

use crate::config::MongoDb;
use crate::error::StoreError;
use crate::user::{Filter, StoreResult, User, UserRepository};

const DUPLICATE_KEY: i32 = 11000;

/// Handle on the users collection.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    users: Collection<User>,
}

impl MongoStore {
    /// Connect and ping the database.
    pub async fn connect(config: &MongoDb) -> StoreResult<Self> {
        let client = Client::with_uri_str(&config.uri).await?;
        let database = client.database(&config.database);
        database.run_command(doc! { "ping": 1 }).await?;

        tracing::info!(database = %config.database, "mongodb connected");

        let store = Self {
            users: database.collection::<User>(&config.collection),
            client,
        };

        // existing duplicates make index creation fail; keep serving.
        if config.unique_names {
            if let Err(err) = store.create_index(doc! { "name": 1 }, true).await {
                tracing::warn!(error = %err, "unique index on `name` not created");
            }
        }
        if config.email_index {
            if let Err(err) = store.create_index(doc! { "email": 1 }, false).await {
                tracing::warn!(error = %err, "index on `email` not created");
            }
        }

        Ok(store)
    }

    async fn create_index(&self, keys: Document, unique: bool) -> StoreResult<()> {
        let index = IndexModel::builder()
            .keys(keys)
            .options(IndexOptions::builder().unique(unique).build())
            .build();
        let result = self.users.create_index(index).await?;

        tracing::debug!(index = %result.index_name, "index ready");
        Ok(())
    }

    /// Close the connection pool.
    pub async fn shutdown(self) {
        self.client.shutdown().await;
        tracing::info!("mongodb connection closed");
    }
}

fn classify(err: mongodb::error::Error) -> StoreError {
    if let ErrorKind::Write(WriteFailure::WriteError(failure)) = err.kind.as_ref() {
        if failure.code == DUPLICATE_KEY {
            return StoreError::Duplicate(failure.message.clone());
        }
    }
    StoreError::Mongo(err)
}

#[async_trait]
impl UserRepository for MongoStore {
    async fn find_one(&self, filter: &Filter) -> StoreResult<Option<User>> {
        Ok(self.users.find_one(Document::from(filter)).await?)
    }

    async fn insert_one(&self, user: &User) -> StoreResult<()> {
        self.users.insert_one(user).await.map_err(classify)?;
        Ok(())
    }

    async fn delete_one(&self, filter: &Filter) -> StoreResult<u64> {
        let result = self.users.delete_one(Document::from(filter)).await?;
        Ok(result.deleted_count)
    }
}
