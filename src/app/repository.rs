use std::marker::PhantomData;
use std::sync::Arc;

use anyhow::Context as _;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::app::document_store::DocumentStore;

/// Typed view over one collection of a [`DocumentStore`].
pub struct Collection<T> {
    store: Arc<dyn DocumentStore>,
    name: &'static str,
    _doc: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            name: self.name,
            _doc: PhantomData,
        }
    }
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(store: Arc<dyn DocumentStore>, name: &'static str) -> Self {
        Self {
            store,
            name,
            _doc: PhantomData,
        }
    }

    pub async fn all(&self) -> anyhow::Result<Vec<T>> {
        self.store
            .list(self.name)
            .await
            .with_context(|| format!("list {}", self.name))?
            .into_iter()
            .map(|doc| serde_json::from_value(doc).with_context(|| format!("decode {}", self.name)))
            .collect()
    }

    pub async fn find(&self, id: &str) -> anyhow::Result<Option<T>> {
        let Some(doc) = self
            .store
            .get(self.name, id)
            .await
            .with_context(|| format!("get {}/{id}", self.name))?
        else {
            return Ok(None);
        };
        let value = serde_json::from_value(doc).with_context(|| format!("decode {}/{id}", self.name))?;
        Ok(Some(value))
    }

    pub async fn insert(&self, id: &str, doc: &T) -> anyhow::Result<()> {
        let value = serde_json::to_value(doc).context("encode document")?;
        self.store.insert(self.name, id, &value).await
    }

    pub async fn replace(&self, id: &str, doc: &T) -> anyhow::Result<bool> {
        let value = serde_json::to_value(doc).context("encode document")?;
        self.store.replace(self.name, id, &value).await
    }

    pub async fn remove(&self, id: &str) -> anyhow::Result<bool> {
        self.store.delete(self.name, id).await
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::app::document_store::InMemoryDocumentStore;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Note {
        text: String,
    }

    #[tokio::test]
    async fn typed_round_trip_through_store() -> anyhow::Result<()> {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
        let notes = Collection::<Note>::new(Arc::clone(&store), "notes");

        notes.insert("n1", &Note { text: "hi".into() }).await?;
        assert_eq!(notes.find("n1").await?, Some(Note { text: "hi".into() }));
        assert_eq!(notes.all().await?.len(), 1);
        assert!(notes.remove("n1").await?);
        assert!(notes.find("n1").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn undecodable_document_is_an_error() -> anyhow::Result<()> {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
        store
            .insert("notes", "bad", &serde_json::json!({"other": 1}))
            .await?;
        let notes = Collection::<Note>::new(store, "notes");
        assert!(notes.find("bad").await.is_err());
        Ok(())
    }
}
