use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::app::document_store::DocumentStore;
use crate::app::model::{ListFilter, Record};
use crate::app::repository::Collection;
use crate::catalog::{CategoryError, Family, Partition};
use crate::error::{ApiError, ValidationErrors};

/// One content family: its stored fields, payloads and update contract.
pub trait ContentKind: Send + Sync + 'static {
    const FAMILY: Family;

    type Fields: Serialize + DeserializeOwned + Clone + Send + Sync + 'static;
    type Input: DeserializeOwned + Send + 'static;
    type Update: DeserializeOwned + Send + 'static;

    fn build(input: Self::Input) -> Result<Self::Fields, ValidationErrors>;

    /// Produces the next state of a record. Whether this is a full replace or
    /// a partial patch is up to the family.
    fn apply(current: Self::Fields, update: Self::Update) -> Result<Self::Fields, ValidationErrors>;

    fn matches(_fields: &Self::Fields, _filter: &ListFilter) -> bool {
        true
    }

    /// Value that must be unique within a partition, if any.
    fn unique_key(_fields: &Self::Fields) -> Option<UniqueKey> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueKey {
    pub field: &'static str,
    pub value: String,
    pub conflict_message: &'static str,
}

/// CRUD over the partitions of one family.
pub struct ContentService<K> {
    store: Arc<dyn DocumentStore>,
    _kind: PhantomData<fn() -> K>,
}

impl<K> Clone for ContentService<K> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _kind: PhantomData,
        }
    }
}

impl<K: ContentKind> ContentService<K> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _kind: PhantomData,
        }
    }

    fn collection(
        &self,
        partition: &'static Partition,
    ) -> Result<Collection<Record<K::Fields>>, ApiError> {
        if partition.family != K::FAMILY {
            return Err(CategoryError::Unknown {
                family: K::FAMILY,
                key: partition.model.to_string(),
            }
            .into());
        }
        Ok(Collection::new(Arc::clone(&self.store), partition.collection))
    }

    pub async fn list(
        &self,
        partition: &'static Partition,
        filter: &ListFilter,
    ) -> Result<Vec<Record<K::Fields>>, ApiError> {
        let mut records = self.collection(partition)?.all().await?;
        records.retain(|r| K::matches(&r.fields, filter));
        sort_newest_first(&mut records);
        Ok(records)
    }

    /// Merged listing across several partitions, newest first.
    pub async fn list_all(
        &self,
        partitions: &[&'static Partition],
        filter: &ListFilter,
    ) -> Result<Vec<Record<K::Fields>>, ApiError> {
        let mut records = Vec::new();
        for partition in partitions {
            let collection = self.collection(partition)?;
            records.extend(
                collection
                    .all()
                    .await?
                    .into_iter()
                    .filter(|r| K::matches(&r.fields, filter)),
            );
        }
        sort_newest_first(&mut records);
        Ok(records)
    }

    pub async fn get(
        &self,
        partition: &'static Partition,
        id: &str,
    ) -> Result<Record<K::Fields>, ApiError> {
        let id = parse_id(id)?;
        self.collection(partition)?
            .find(&id)
            .await?
            .ok_or(ApiError::NotFound(K::FAMILY.entity_name()))
    }

    pub async fn create(
        &self,
        partition: &'static Partition,
        input: K::Input,
    ) -> Result<Record<K::Fields>, ApiError> {
        let collection = self.collection(partition)?;
        let fields = K::build(input)?;
        ensure_unique::<K>(&collection, None, &fields).await?;

        let now = Utc::now();
        let record = Record {
            id: uuid::Uuid::new_v4().to_string(),
            model: partition.model.to_string(),
            level: partition.level,
            grade: partition.grade.to_string(),
            fields,
            created_at: now,
            updated_at: now,
        };
        collection.insert(&record.id, &record).await?;

        tracing::info!(partition = partition.model, id = %record.id, "created record");
        Ok(record)
    }

    pub async fn update(
        &self,
        partition: &'static Partition,
        id: &str,
        update: K::Update,
    ) -> Result<Record<K::Fields>, ApiError> {
        let id = parse_id(id)?;
        let collection = self.collection(partition)?;
        let not_found = || ApiError::NotFound(K::FAMILY.entity_name());

        let mut record = collection.find(&id).await?.ok_or_else(not_found)?;
        let fields = K::apply(record.fields, update)?;
        ensure_unique::<K>(&collection, Some(&id), &fields).await?;

        record.fields = fields;
        record.updated_at = Utc::now();
        if !collection.replace(&id, &record).await? {
            return Err(not_found());
        }

        tracing::info!(partition = partition.model, id = %id, "updated record");
        Ok(record)
    }

    pub async fn delete(&self, partition: &'static Partition, id: &str) -> Result<(), ApiError> {
        let id = parse_id(id)?;
        if !self.collection(partition)?.remove(&id).await? {
            return Err(ApiError::NotFound(K::FAMILY.entity_name()));
        }
        tracing::info!(partition = partition.model, id = %id, "deleted record");
        Ok(())
    }
}

pub fn sort_newest_first<T>(records: &mut [Record<T>]) {
    records.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

/// Normalizes a client-supplied id to the hyphenated UUID form.
pub fn parse_id(raw: &str) -> Result<String, ApiError> {
    uuid::Uuid::parse_str(raw.trim())
        .map(|id| id.to_string())
        .map_err(|_| ApiError::invalid("id", format!("Invalid id: {raw}")))
}

async fn ensure_unique<K: ContentKind>(
    collection: &Collection<Record<K::Fields>>,
    own_id: Option<&str>,
    fields: &K::Fields,
) -> Result<(), ApiError> {
    let Some(key) = K::unique_key(fields) else {
        return Ok(());
    };
    let clash = collection.all().await?.into_iter().any(|other| {
        own_id != Some(other.id.as_str())
            && K::unique_key(&other.fields).is_some_and(|k| k.value == key.value)
    });
    if clash {
        return Err(ApiError::invalid(key.field, key.conflict_message));
    }
    Ok(())
}
