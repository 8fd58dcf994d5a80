//! Repository port for value table persistence.

use std::path::Path;

use crate::{Result, agent::ValueTable};

/// Port for persisting and loading learned value tables.
///
/// # Examples
///
/// ```no_run
/// use pinball_bot::adapters::MsgPackRepository;
/// use pinball_bot::agent::ValueTable;
/// use pinball_bot::ports::PolicyRepository;
/// use std::path::Path;
///
/// let repo = MsgPackRepository::new();
/// repo.save(&ValueTable::new(), Path::new("policy.msgpack"))?;
/// let table = repo.load(Path::new("policy.msgpack"))?;
/// # Ok::<(), pinball_bot::Error>(())
/// ```
pub trait PolicyRepository {
    /// Save a table to persistent storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be written or serialization fails.
    fn save(&self, table: &ValueTable, path: &Path) -> Result<()>;

    /// Load a table from persistent storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is corrupted.
    fn load(&self, path: &Path) -> Result<ValueTable>;
}
