//! Process-local prior storage, mainly for tests and embedding.

use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::{Result, engine::BeliefParameter, error::Error, ports::PriorRepository};

/// Keeps MessagePack-encoded parameters in a map keyed by the path's text.
///
/// Cloning yields a handle onto the same map.
///
/// # Examples
///
/// ```
/// use aip::adapters::InMemoryPriorRepository;
/// use aip::engine::BeliefParameter;
/// use aip::ports::PriorRepository;
/// use std::path::Path;
///
/// let repo = InMemoryPriorRepository::new();
/// repo.save(&BeliefParameter::uniform(3, 0.5), Path::new("battery"))?;
/// assert!(repo.contains(Path::new("battery")));
/// # Ok::<(), aip::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryPriorRepository {
    storage: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryPriorRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many paths currently hold a parameter.
    pub fn count(&self) -> usize {
        self.storage().len()
    }

    pub fn clear(&self) {
        self.storage().clear();
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.storage().contains_key(&key(path))
    }

    fn storage(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.storage
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn key(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

impl PriorRepository for InMemoryPriorRepository {
    fn save(&self, parameter: &BeliefParameter, path: &Path) -> Result<()> {
        let bytes = rmp_serde::to_vec(parameter).map_err(|e| Error::SerializationContext {
            operation: "serialize prior for in-memory storage".to_string(),
            message: e.to_string(),
        })?;

        self.storage().insert(key(path), bytes);
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<BeliefParameter> {
        let storage = self.storage();
        let bytes = storage.get(&key(path)).ok_or_else(|| Error::Io {
            operation: format!("load prior from in-memory storage at {path:?}"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "key not found in memory"),
        })?;

        rmp_serde::from_slice(bytes).map_err(|e| Error::SerializationContext {
            operation: "deserialize prior from in-memory storage".to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_save_and_load() {
        let repo = InMemoryPriorRepository::new();
        let parameter = BeliefParameter::uniform(3, 0.5);
        let path = Path::new("battery");

        assert_eq!(repo.count(), 0);
        assert!(!repo.contains(path));

        repo.save(&parameter, path).unwrap();
        assert_eq!(repo.count(), 1);
        assert!(repo.contains(path));

        assert_eq!(repo.load(path).unwrap(), parameter);
    }

    #[test]
    fn test_load_nonexistent_returns_error() {
        let repo = InMemoryPriorRepository::new();
        assert!(repo.load(Path::new("nonexistent")).is_err());
    }

    #[test]
    fn test_clone_shares_storage() {
        let repo1 = InMemoryPriorRepository::new();
        let repo2 = repo1.clone();
        let parameter = BeliefParameter::uniform(2, 0.1);

        repo1.save(&parameter, Path::new("shared")).unwrap();
        assert_eq!(repo2.load(Path::new("shared")).unwrap(), parameter);

        repo2.clear();
        assert_eq!(repo1.count(), 0);
    }
}
