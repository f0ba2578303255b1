use std::{collections::HashMap, hash::Hash, path::PathBuf, sync::Arc};
use tokio::{fs, sync::RwLock};
use tracing::debug;

use crate::errors::ProviderError;

/// Generic JSON file-backed key-value map store.
///
/// Persists a `HashMap<K, V>` to a JSON file after every mutation. Writes go to a
/// sibling temp file first and are renamed into place.
#[derive(Clone)]
pub struct JsonMapStore<K, V> {
    inner: Arc<RwLock<HashMap<K, V>>>,
    file_path: PathBuf,
}

impl<K, V> JsonMapStore<K, V>
where
    K: Eq + Hash + serde::Serialize + serde::de::DeserializeOwned + Clone,
    V: serde::Serialize + serde::de::DeserializeOwned + Clone,
{
    /// Open the store at `path`. Creates the file with an empty map if missing;
    /// an unreadable or corrupt file is an error.
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Self, ProviderError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let map: HashMap<K, V> = match fs::read(&file_path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => HashMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let empty: HashMap<K, V> = HashMap::new();
                fs::write(&file_path, serde_json::to_vec(&empty)?).await?;
                empty
            }
            Err(e) => return Err(e.into()),
        };
        debug!(path = %file_path.display(), entries = map.len(), "json_map_store_opened");

        Ok(Self { inner: Arc::new(RwLock::new(map)), file_path })
    }

    async fn save(&self, map: &HashMap<K, V>) -> Result<(), ProviderError> {
        let data = serde_json::to_vec_pretty(map)?;
        let tmp = self.file_path.with_extension("json.tmp");
        fs::write(&tmp, data).await?;
        fs::rename(&tmp, &self.file_path).await?;
        Ok(())
    }

    /// List all entries as `(key, value)` pairs.
    pub async fn list(&self) -> Vec<(K, V)> {
        let map = self.inner.read().await;
        map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Get value by key.
    pub async fn get(&self, key: &K) -> Option<V> {
        let map = self.inner.read().await;
        map.get(key).cloned()
    }

    /// Remove a key and persist; returns the removed value if it existed.
    /// The in-memory map only changes once the file write succeeded.
    pub async fn remove(&self, key: &K) -> Result<Option<V>, ProviderError> {
        let mut map = self.inner.write().await;
        if !map.contains_key(key) {
            return Ok(None);
        }
        let mut staged = map.clone();
        let removed = staged.remove(key);
        self.save(&staged).await?;
        *map = staged;
        Ok(removed)
    }

    /// Apply a mutation to a copy of the map under the write lock, persist the
    /// copy, then swap it in. If `f` or the write fails the map is unchanged.
    pub async fn update_map<F, R>(&self, f: F) -> Result<R, ProviderError>
    where
        F: FnOnce(&mut HashMap<K, V>) -> Result<R, ProviderError>,
    {
        let mut map = self.inner.write().await;
        let mut staged = map.clone();
        let out = f(&mut staged)?;
        self.save(&staged).await?;
        *map = staged;
        Ok(out)
    }
}
