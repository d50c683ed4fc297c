//! Document store binding.
//!
//! The community data lives in one table per collection. [`Store`] wraps the
//! `SeaORM` connection together with a broadcast channel: every successful
//! mutation announces the collection it touched, and every live subscription
//! re-reads its query and pushes the full snapshot to its callback.

use crate::errors::Result;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection,
    EntityTrait, IntoActiveModel, Iterable, PrimaryKeyToColumn, PrimaryKeyTrait, QueryFilter,
    Select, TransactionTrait,
};
use std::fmt;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, trace, warn};

/// Capacity of the change channel; slow subscribers that fall behind re-query.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Named collections of the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Residents,
    Complaints,
    Visitors,
    Emergencies,
    Payments,
    Funds,
    Announcements,
    ChatMessages,
}

impl Collection {
    /// Stable collection name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Residents => "residents",
            Self::Complaints => "complaints",
            Self::Visitors => "visitors",
            Self::Emergencies => "emergencies",
            Self::Payments => "payments",
            Self::Funds => "funds",
            Self::Announcements => "announcements",
            Self::ChatMessages => "chat_messages",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tears down one live subscription.
pub type Unsubscribe = Box<dyn FnOnce() + Send>;

/// Receives each full snapshot delivered by a subscription.
pub type OnChange<S> = Box<dyn Fn(S) + Send + Sync>;

/// A subscription that has not been started yet. Starting it with a callback
/// returns the matching [`Unsubscribe`].
pub type Source<S> = Box<dyn FnOnce(OnChange<S>) -> Unsubscribe + Send>;

/// Connection to the community document store.
#[derive(Clone)]
pub struct Store {
    db: DatabaseConnection,
    changes: broadcast::Sender<Collection>,
}

impl Store {
    /// Wraps an open connection.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { db, changes }
    }

    /// Connects to `url` and makes sure every collection table exists.
    pub async fn connect(url: &str) -> Result<Self> {
        let db = sea_orm::Database::connect(url).await?;
        crate::config::database::create_tables(&db).await?;
        Ok(Self::new(db))
    }

    /// Underlying connection, for ad-hoc queries.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Announces that `collection` changed. Having no live subscribers is fine.
    pub fn notify(&self, collection: Collection) {
        let receivers = self.changes.send(collection).unwrap_or(0);
        debug!(%collection, receivers, "Collection changed");
    }

    /// Inserts a new document and notifies subscribers.
    pub async fn create<A>(
        &self,
        collection: Collection,
        document: A,
    ) -> Result<<A::Entity as EntityTrait>::Model>
    where
        A: ActiveModelTrait + ActiveModelBehavior + Send + 'static,
        <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    {
        let model = document.insert(&self.db).await?;
        self.notify(collection);
        Ok(model)
    }

    /// Applies `patch` to the document stored under `key`, but only while that
    /// document still matches `guard`.
    ///
    /// The guard is evaluated by the database as part of the write, so a rule
    /// checked against an earlier read cannot be bypassed by a concurrent
    /// writer. Returns the updated document, or `None` when no row matched
    /// (the guard no longer holds or the document is gone). Subscribers are
    /// only notified when a row changed.
    pub async fn update_if<E, A>(
        &self,
        collection: Collection,
        key: String,
        guard: Condition,
        patch: A,
    ) -> Result<Option<E::Model>>
    where
        E: EntityTrait,
        E::PrimaryKey: PrimaryKeyTrait<ValueType = String>,
        A: ActiveModelTrait<Entity = E> + Send,
    {
        let Some(primary_key) = E::PrimaryKey::iter().next() else {
            return Ok(None);
        };

        let txn = self.db.begin().await?;
        let result = E::update_many()
            .set(patch)
            .filter(primary_key.into_column().eq(key.clone()))
            .filter(guard)
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            txn.rollback().await?;
            debug!(%collection, key = %key, "Guarded update matched no document");
            return Ok(None);
        }

        let model = E::find_by_id(key).one(&txn).await?;
        txn.commit().await?;
        self.notify(collection);
        Ok(model)
    }

    /// Writes a document under a deterministic key: updates it when the key is
    /// already present, inserts it otherwise. Both paths run inside one database
    /// transaction.
    pub async fn upsert<E, A>(
        &self,
        collection: Collection,
        key: String,
        document: A,
    ) -> Result<E::Model>
    where
        E: EntityTrait,
        E::PrimaryKey: PrimaryKeyTrait<ValueType = String>,
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send + 'static,
        E::Model: IntoActiveModel<A>,
    {
        let txn = self.db.begin().await?;
        let existing = E::find_by_id(key).one(&txn).await?;
        let model = if existing.is_some() {
            document.update(&txn).await?
        } else {
            document.insert(&txn).await?
        };
        txn.commit().await?;
        self.notify(collection);
        Ok(model)
    }

    /// Deletes every document of entity `E` and notifies subscribers.
    pub async fn clear<E: EntityTrait>(&self, collection: Collection) -> Result<u64> {
        let result = E::delete_many().exec(&self.db).await?;
        self.notify(collection);
        Ok(result.rows_affected)
    }

    /// One-shot read of the current snapshot.
    pub async fn fetch<E: EntityTrait>(&self, query: Select<E>) -> Result<Vec<E::Model>> {
        query.all(&self.db).await.map_err(Into::into)
    }

    /// Builds a live subscription over `query`.
    ///
    /// Once started, the subscription delivers the current snapshot right away
    /// and again after every change to `collection`, each time wrapped by
    /// `wrap`. A failed read is logged and the subscription keeps waiting for the
    /// next change; there is no timeout.
    #[must_use]
    pub fn subscribe<E, S, F>(
        &self,
        collection: Collection,
        query: Select<E>,
        wrap: F,
    ) -> Source<S>
    where
        E: EntityTrait,
        E::Model: Send + Sync,
        S: Send + 'static,
        F: Fn(Vec<E::Model>) -> S + Send + Sync + 'static,
    {
        let db = self.db.clone();
        let changes = self.changes.clone();

        Box::new(move |on_change: OnChange<S>| {
            // Subscribe before the first read so no change slips in between.
            let mut receiver = changes.subscribe();
            let task = tokio::spawn(async move {
                loop {
                    match query.clone().all(&db).await {
                        Ok(models) => {
                            trace!(%collection, documents = models.len(), "Delivering snapshot");
                            on_change(wrap(models));
                        }
                        Err(e) => warn!(%collection, "Snapshot query failed: {e}"),
                    }

                    loop {
                        match receiver.recv().await {
                            Ok(changed) if changed == collection => break,
                            Ok(_) => {}
                            Err(RecvError::Lagged(skipped)) => {
                                debug!(%collection, skipped, "Subscription lagged, re-reading");
                                break;
                            }
                            Err(RecvError::Closed) => return,
                        }
                    }
                }
            });

            Box::new(move || task.abort())
        })
    }
}
