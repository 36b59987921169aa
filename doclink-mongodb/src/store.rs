use async_trait::async_trait;
use futures::TryStreamExt;
use bson::{Bson, Document};
use mongodb::{
    Client, Collection as MongoCollection, IndexModel,
    error::{Error as MongoError, ErrorKind},
    options::{
        ClientOptions, FindOneAndDeleteOptions, FindOneAndUpdateOptions,
        FindOptions as MongoFindOptions, IndexOptions, ReturnDocument,
    },
};
use tracing::debug;
use doclink_core::{
    backend::{
        FindAndModifyOptions, FindOptions, Modification, StoreBackend, StoreBackendBuilder,
        UpdateOptions,
    },
    error::{DocumentStoreError, DocumentStoreResult},
};


#[derive(Debug)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection_name)
    }
}

/// Driver failures reaching the server are reported as [`DocumentStoreError::StoreUnavailable`].
fn store_error(err: MongoError) -> DocumentStoreError {
    match err.kind.as_ref() {
        ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) => {
            DocumentStoreError::StoreUnavailable(err.to_string())
        }
        _ => DocumentStoreError::Backend(err.to_string()),
    }
}

fn find_options(options: FindOptions) -> MongoFindOptions {
    let mut find_options = MongoFindOptions::default();

    find_options.projection = options.projection;
    find_options.sort = options.sort;
    find_options.skip = options.skip.map(|skip| skip.min(i64::MAX as u64));
    find_options.limit = options.limit.filter(|limit| *limit > 0);

    find_options
}

fn update_options(options: FindAndModifyOptions, upsert: bool) -> FindOneAndUpdateOptions {
    let mut update_options = FindOneAndUpdateOptions::default();

    update_options.projection = options.projection;
    update_options.sort = options.sort;
    update_options.upsert = Some(upsert);
    update_options.return_document = Some(if options.return_new {
        ReturnDocument::After
    } else {
        ReturnDocument::Before
    });

    update_options
}

fn delete_options(options: FindAndModifyOptions) -> FindOneAndDeleteOptions {
    let mut delete_options = FindOneAndDeleteOptions::default();

    delete_options.projection = options.projection;
    delete_options.sort = options.sort;

    delete_options
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: FindOptions,
    ) -> DocumentStoreResult<Vec<Document>> {
        self.get_collection(collection)
            .find(filter)
            .with_options(find_options(options))
            .await
            .map_err(store_error)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(store_error)
    }

    async fn count(&self, collection: &str, filter: Document) -> DocumentStoreResult<u64> {
        self.get_collection(collection)
            .count_documents(filter)
            .await
            .map_err(store_error)
    }

    async fn insert(&self, collection: &str, document: Document) -> DocumentStoreResult<Bson> {
        Ok(
            self.get_collection(collection)
                .insert_one(document)
                .await
                .map_err(store_error)?
                .inserted_id
        )
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> DocumentStoreResult<Vec<Bson>> {
        if documents.is_empty() {
            return Ok(vec![]);
        }

        let mut inserted = self
            .get_collection(collection)
            .insert_many(documents)
            .await
            .map_err(store_error)?
            .inserted_ids
            .into_iter()
            .collect::<Vec<(usize, Bson)>>();
        inserted.sort_by_key(|(position, _)| *position);

        Ok(inserted.into_iter().map(|(_, id)| id).collect())
    }

    async fn update(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> DocumentStoreResult<u64> {
        let collection = self.get_collection(collection);

        let result = if options.multi {
            collection
                .update_many(filter, update)
                .upsert(options.upsert)
                .await
        } else {
            collection
                .update_one(filter, update)
                .upsert(options.upsert)
                .await
        }
        .map_err(store_error)?;

        if result.upserted_id.is_some() {
            debug!(collection = collection.name(), "upserted document");
        }

        Ok(result.matched_count + u64::from(result.upserted_id.is_some()))
    }

    async fn remove(&self, collection: &str, filter: Document) -> DocumentStoreResult<u64> {
        Ok(
            self.get_collection(collection)
                .delete_many(filter)
                .await
                .map_err(store_error)?
                .deleted_count
        )
    }

    async fn find_and_modify(
        &self,
        collection: &str,
        filter: Document,
        modification: Modification,
        options: FindAndModifyOptions,
    ) -> DocumentStoreResult<Option<Document>> {
        let collection = self.get_collection(collection);

        match modification {
            Modification::Update { update, upsert } => collection
                .find_one_and_update(filter, update)
                .with_options(update_options(options, upsert))
                .await
                .map_err(store_error),
            Modification::Remove => collection
                .find_one_and_delete(filter)
                .with_options(delete_options(options))
                .await
                .map_err(store_error),
        }
    }

    async fn ensure_index(
        &self,
        collection: &str,
        keys: Document,
        unique: bool,
    ) -> DocumentStoreResult<()> {
        self.get_collection(collection)
            .create_index(
                IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                    .unique(unique)
                    .build()
                )
                .build()
            )
            .await
            .map_err(store_error)?;

        Ok(())
    }

    async fn distinct(
        &self,
        collection: &str,
        field: &str,
        filter: Document,
    ) -> DocumentStoreResult<Vec<Bson>> {
        self.get_collection(collection)
            .distinct(field, filter)
            .await
            .map_err(store_error)
    }

    async fn run_command(&self, command: Document) -> DocumentStoreResult<Document> {
        self.client
            .database(&self.database)
            .run_command(command)
            .await
            .map_err(store_error)
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
        }
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        Ok(MongoDbStore::new(
            Client::with_options(
                ClientOptions::parse(&self.dsn)
                    .await
                    .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?,
            )
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?,
            self.database,
        ))
    }
}
