//! Binary prior files.
//!
//! One rmp_serde value per file, no framing.

use std::{fs::File, path::Path};

use crate::{Result, engine::BeliefParameter, error::Error, ports::PriorRepository};

/// Reads and writes a `BeliefParameter` as a single MessagePack value.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackPriorRepository;

impl MsgPackPriorRepository {
    pub fn new() -> Self {
        Self
    }
}

impl PriorRepository for MsgPackPriorRepository {
    fn save(&self, parameter: &BeliefParameter, path: &Path) -> Result<()> {
        let mut file = File::create(path).map_err(|source| Error::Io {
            operation: format!("create file {path:?}"),
            source,
        })?;

        rmp_serde::encode::write(&mut file, parameter).map_err(|e| {
            Error::SerializationContext {
                operation: "serialize prior to MessagePack".to_string(),
                message: e.to_string(),
            }
        })?;

        Ok(())
    }

    fn load(&self, path: &Path) -> Result<BeliefParameter> {
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open file {path:?}"),
            source,
        })?;

        rmp_serde::decode::from_read(&file).map_err(|e| Error::SerializationContext {
            operation: "deserialize prior from MessagePack".to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_msgpack_roundtrip() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file_path = temp_dir.path().join("prior.msgpack");

        let repo = MsgPackPriorRepository::new();
        let parameter = BeliefParameter {
            concentration: array![0.1, 0.9],
            learning_rate: 1.0,
        };

        repo.save(&parameter, &file_path).expect("Failed to save");
        let loaded = repo.load(&file_path).expect("Failed to load");
        assert_eq!(parameter, loaded);
    }

    #[test]
    fn test_save_to_invalid_path_returns_error() {
        let repo = MsgPackPriorRepository::new();
        let result = repo.save(
            &BeliefParameter::uniform(2, 0.5),
            Path::new("/invalid_dir_aip_12345/prior.msgpack"),
        );
        assert!(result.is_err());
    }
}
