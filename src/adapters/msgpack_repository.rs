//! MessagePack implementation of the policy repository.
//!
//! Stores the value table with its raw integer buckets, so the file is
//! independent of the quantizer settings used to read it back.

use std::{fs::File, path::Path};

use crate::{Result, agent::ValueTable, error::Error, ports::PolicyRepository};

/// MessagePack-based policy repository.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackRepository;

impl MsgPackRepository {
    /// Create a new MessagePack repository.
    pub fn new() -> Self {
        Self
    }
}

impl PolicyRepository for MsgPackRepository {
    fn save(&self, table: &ValueTable, path: &Path) -> Result<()> {
        let mut file = File::create(path).map_err(|source| Error::Io {
            operation: format!("create file {path:?}"),
            source,
        })?;

        rmp_serde::encode::write(&mut file, table).map_err(|e| Error::SerializationContext {
            operation: "serialize value table to MessagePack".to_string(),
            message: e.to_string(),
        })?;

        Ok(())
    }

    fn load(&self, path: &Path) -> Result<ValueTable> {
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open file {path:?}"),
            source,
        })?;

        let table =
            rmp_serde::decode::from_read(&file).map_err(|e| Error::SerializationContext {
                operation: "deserialize value table from MessagePack".to_string(),
                message: e.to_string(),
            })?;

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::agent::{Action, StateKey};

    #[test]
    fn test_msgpack_roundtrip() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file_path = temp_dir.path().join("policy.msgpack");

        let mut table = ValueTable::new();
        for x in 0..4 {
            let (index, _) = table.find_or_insert(StateKey::from_buckets(x, -x, 3, 0));
            table.ensure_actions(index, &Action::ALL);
            table.set_value(index, Action::EnableLeftFlipper, 0.1 * f64::from(x));
        }

        let repo = MsgPackRepository::new();
        repo.save(&table, &file_path).expect("Failed to save");
        let loaded = repo.load(&file_path).expect("Failed to load");

        assert_eq!(loaded, table);
    }

    #[test]
    fn test_load_nonexistent_returns_error() {
        let repo = MsgPackRepository::new();
        let result = repo.load(Path::new("/tmp/nonexistent_pinball_12345.msgpack"));
        assert!(result.is_err());
    }

    #[test]
    fn test_save_to_invalid_path_returns_error() {
        let repo = MsgPackRepository::new();
        let result = repo.save(
            &ValueTable::new(),
            Path::new("/invalid_dir_12345/policy.msgpack"),
        );
        assert!(result.is_err());
    }
}
