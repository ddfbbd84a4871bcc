//! MongoDB client and collection wrapper
//!
//! Typed collections stamp `Metadata` on write and create their indexes on
//! first use. Connection failures surface as `ReputeError::Store`.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::{
    error::{ErrorKind, WriteFailure},
    options::{IndexOptions, UpdateModifications},
    results::{DeleteResult, UpdateResult},
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::info;

use crate::db::schemas::Metadata;
use crate::types::ReputeError;

/// Server error code for unique index violations
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Trait for schemas with mutable metadata
pub trait MutMetadata {
    fn mut_metadata(&mut self) -> &mut Metadata;
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Create a new MongoDB client
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, ReputeError> {
        info!("Connecting to MongoDB at {}", uri);

        // Use serverSelectionTimeoutMS to avoid hanging on unreachable MongoDB
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| ReputeError::Store(format!("Failed to connect to MongoDB: {}", e)))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| ReputeError::Store(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get a typed collection
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>, ReputeError>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }
}

/// Typed MongoDB collection with automatic indexing
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
{
    /// Create a new collection and apply indexes
    pub async fn new(
        client: &Client,
        db_name: &str,
        collection_name: &str,
    ) -> Result<Self, ReputeError> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    /// Apply schema-defined indexes
    async fn apply_indexes(&self) -> Result<(), ReputeError> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| ReputeError::Store(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }

    /// Insert a document, stamping metadata
    ///
    /// `created_at` is kept when the caller already set it (activity records
    /// carry the on-chain time); `updated_at` is always the insert time.
    pub async fn insert_one(&self, item: T) -> Result<ObjectId, ReputeError> {
        let result = self
            .inner
            .insert_one(stamp(item))
            .await
            .map_err(|e| ReputeError::Store(format!("Insert failed: {}", e)))?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| ReputeError::Store("Failed to get inserted ID".into()))
    }

    /// Insert unless a unique index already holds the key
    ///
    /// Returns `Ok(None)` on a duplicate-key violation.
    pub async fn insert_unique(&self, item: T) -> Result<Option<ObjectId>, ReputeError> {
        match self.inner.insert_one(stamp(item)).await {
            Ok(result) => Ok(result.inserted_id.as_object_id()),
            Err(e) if is_duplicate_key(&e) => Ok(None),
            Err(e) => Err(ReputeError::Store(format!("Insert failed: {}", e))),
        }
    }

    /// Update one document, inserting it when nothing matches
    pub async fn upsert_one(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<UpdateResult, ReputeError> {
        self.inner
            .update_one(filter, update.into())
            .upsert(true)
            .await
            .map_err(|e| ReputeError::Store(format!("Upsert failed: {}", e)))
    }

    /// Hard delete one document
    pub async fn delete_one(&self, filter: Document) -> Result<DeleteResult, ReputeError> {
        self.inner
            .delete_one(filter)
            .await
            .map_err(|e| ReputeError::Store(format!("Delete failed: {}", e)))
    }
}

fn stamp<T: MutMetadata>(mut item: T) -> T {
    let now = DateTime::now();
    let metadata = item.mut_metadata();
    metadata.is_deleted = false;
    metadata.created_at.get_or_insert(now);
    metadata.updated_at = Some(now);
    item
}

/// Whether a driver error is a unique index violation
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}
