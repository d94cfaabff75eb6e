use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tokio::sync::RwLock;

/// Schemaless storage of JSON documents, grouped in named collections.
///
/// Ids and collection names become path segments in the filesystem backend,
/// so both are checked with [`ensure_safe_segment`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list(&self, collection: &str) -> anyhow::Result<Vec<Value>>;
    async fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Value>>;
    /// Fails if a document with `id` already exists.
    async fn insert(&self, collection: &str, id: &str, doc: &Value) -> anyhow::Result<()>;
    /// Returns `false` when there was nothing to replace.
    async fn replace(&self, collection: &str, id: &str, doc: &Value) -> anyhow::Result<bool>;
    /// Returns `false` when there was nothing to delete.
    async fn delete(&self, collection: &str, id: &str) -> anyhow::Result<bool>;
}

pub fn ensure_safe_segment(kind: &str, segment: &str) -> anyhow::Result<()> {
    let ok = !segment.is_empty()
        && segment
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if !ok {
        anyhow::bail!("{kind} must be a plain name: {segment:?}");
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct LocalFsDocumentStore {
    base_dir: PathBuf,
}

impl LocalFsDocumentStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn collections_dir(&self) -> PathBuf {
        self.base_dir.join("collections")
    }

    fn collection_dir(&self, collection: &str) -> anyhow::Result<PathBuf> {
        ensure_safe_segment("collection", collection)?;
        Ok(self.collections_dir().join(collection))
    }

    fn document_path(&self, collection: &str, id: &str) -> anyhow::Result<PathBuf> {
        ensure_safe_segment("document id", id)?;
        Ok(self.collection_dir(collection)?.join(format!("{id}.json")))
    }
}

#[async_trait]
impl DocumentStore for LocalFsDocumentStore {
    async fn list(&self, collection: &str) -> anyhow::Result<Vec<Value>> {
        let dir = self.collection_dir(collection)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(err).with_context(|| format!("read dir: {}", dir.display()));
            }
        };

        let mut docs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            // Removed between read_dir and read: skip.
            if let Some(doc) = read_json(&path)
                .await
                .with_context(|| format!("read: {}", path.display()))?
            {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    async fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Value>> {
        let path = self.document_path(collection, id)?;
        read_json(&path)
            .await
            .with_context(|| format!("read: {}", path.display()))
    }

    async fn insert(&self, collection: &str, id: &str, doc: &Value) -> anyhow::Result<()> {
        let path = self.document_path(collection, id)?;
        if fs::try_exists(&path)
            .await
            .with_context(|| format!("stat: {}", path.display()))?
        {
            anyhow::bail!("document already exists: {collection}/{id}");
        }
        write_json_atomic(&path, doc)
            .await
            .with_context(|| format!("write document {collection}/{id}"))
    }

    async fn replace(&self, collection: &str, id: &str, doc: &Value) -> anyhow::Result<bool> {
        let path = self.document_path(collection, id)?;
        if !fs::try_exists(&path)
            .await
            .with_context(|| format!("stat: {}", path.display()))?
        {
            return Ok(false);
        }
        write_json_atomic(&path, doc)
            .await
            .with_context(|| format!("write document {collection}/{id}"))?;
        Ok(true)
    }

    async fn delete(&self, collection: &str, id: &str) -> anyhow::Result<bool> {
        let path = self.document_path(collection, id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err).with_context(|| format!("remove: {}", path.display())),
        }
    }
}

/// Process-local store; contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Value>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn list(&self, collection: &str) -> anyhow::Result<Vec<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn insert(&self, collection: &str, id: &str, doc: &Value) -> anyhow::Result<()> {
        ensure_safe_segment("collection", collection)?;
        ensure_safe_segment("document id", id)?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.contains_key(id) {
            anyhow::bail!("document already exists: {collection}/{id}");
        }
        docs.insert(id.to_string(), doc.clone());
        Ok(())
    }

    async fn replace(&self, collection: &str, id: &str, doc: &Value) -> anyhow::Result<bool> {
        let mut collections = self.collections.write().await;
        let Some(slot) = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
        else {
            return Ok(false);
        };
        *slot = doc.clone();
        Ok(true)
    }

    async fn delete(&self, collection: &str, id: &str) -> anyhow::Result<bool> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(collection)
            .is_some_and(|docs| docs.remove(id).is_some()))
    }
}

async fn read_json(path: &Path) -> anyhow::Result<Option<Value>> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let value = serde_json::from_slice(&bytes).context("parse json")?;
    Ok(Some(value))
}

async fn write_json_atomic(path: &Path, value: &Value) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("path has no parent: {}", path.display()))?;
    fs::create_dir_all(parent)
        .await
        .with_context(|| format!("create parent dir: {}", parent.display()))?;

    let tmp_path = path.with_extension(format!("tmp.{}", uuid::Uuid::new_v4().simple()));
    let data = serde_json::to_vec_pretty(value).context("serialize json")?;
    fs::write(&tmp_path, &data)
        .await
        .with_context(|| format!("write tmp: {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("rename tmp to final: {}", path.display()))?;
    Ok(())
}
