//! Prior files as indented JSON, the CLI's default format.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use crate::{Result, engine::BeliefParameter, error::Error, ports::PriorRepository};

/// Writes `d` and its learning rate as a JSON object, buffered both ways.
///
/// # Examples
///
/// ```no_run
/// use aip::adapters::JsonPriorRepository;
/// use aip::engine::BeliefParameter;
/// use aip::ports::PriorRepository;
/// use std::path::Path;
///
/// let repo = JsonPriorRepository::new();
/// repo.save(&BeliefParameter::uniform(3, 0.5), Path::new("prior.json"))?;
/// let loaded = repo.load(Path::new("prior.json"))?;
/// # Ok::<(), aip::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPriorRepository;

impl JsonPriorRepository {
    pub fn new() -> Self {
        Self
    }
}

impl PriorRepository for JsonPriorRepository {
    fn save(&self, parameter: &BeliefParameter, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|source| Error::Io {
            operation: format!("create file {path:?}"),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, parameter)?;
        writer.flush().map_err(|source| Error::Io {
            operation: format!("write file {path:?}"),
            source,
        })?;
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<BeliefParameter> {
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open file {path:?}"),
            source,
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_json_roundtrip() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file_path = temp_dir.path().join("prior.json");

        let repo = JsonPriorRepository::new();
        let parameter = BeliefParameter {
            concentration: array![0.25, 0.5, 0.25],
            learning_rate: 0.3,
        };

        repo.save(&parameter, &file_path).expect("Failed to save");
        let loaded = repo.load(&file_path).expect("Failed to load");
        assert_eq!(parameter, loaded);
    }

    #[test]
    fn test_load_nonexistent_returns_error() {
        let repo = JsonPriorRepository::new();
        let result = repo.load(Path::new("/tmp/nonexistent_aip_prior_12345.json"));
        assert!(matches!(result, Err(Error::Io { .. })));
    }

    #[test]
    fn test_load_garbage_returns_serialization_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file_path = temp_dir.path().join("garbage.json");
        std::fs::write(&file_path, "{ not json").expect("write");

        let result = JsonPriorRepository::new().load(&file_path);
        assert!(matches!(result, Err(Error::Serialization(_))));
    }
}
