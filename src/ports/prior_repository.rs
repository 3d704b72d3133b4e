//! Repository port for the learned initial-state parameter.

use std::path::Path;

use crate::{Result, engine::BeliefParameter};

/// Port for persisting and loading the learned parameter `d`.
///
/// # Examples
///
/// ```no_run
/// use aip::ports::PriorRepository;
/// use aip::engine::BeliefParameter;
/// use std::path::Path;
///
/// fn checkpoint<R: PriorRepository>(
///     repo: &R,
///     parameter: &BeliefParameter,
///     path: &Path,
/// ) -> aip::Result<()> {
///     repo.save(parameter, path)
/// }
/// ```
pub trait PriorRepository {
    /// Save a parameter to persistent storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be written or serialization fails.
    fn save(&self, parameter: &BeliefParameter, path: &Path) -> Result<()>;

    /// Load a parameter from persistent storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist, cannot be read, or does
    /// not hold a parameter.
    fn load(&self, path: &Path) -> Result<BeliefParameter>;
}
