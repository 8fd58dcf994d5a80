//! Adapters implementing domain ports.
//!
//! Following hexagonal architecture, adapters depend on domain ports, not
//! the other way around.

pub mod csv_repository;
pub mod in_memory_repository;
pub mod msgpack_repository;

use std::path::Path;

use tracing::{info, warn};

pub use csv_repository::CsvPolicyRepository;
pub use in_memory_repository::InMemoryRepository;
pub use msgpack_repository::MsgPackRepository;

use crate::{
    agent::{Quantizer, ValueTable},
    ports::PolicyRepository,
};

/// Pick a repository from the file extension: `.msgpack` is binary,
/// anything else is delimited text.
pub fn repository_for_path(path: &Path, quantizer: Quantizer) -> Box<dyn PolicyRepository> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("msgpack") => Box::new(MsgPackRepository::new()),
        _ => Box::new(CsvPolicyRepository::new(quantizer)),
    }
}

/// Load a table, starting from an empty one if the file is absent or unusable.
pub fn load_or_empty(repository: &dyn PolicyRepository, path: &Path) -> ValueTable {
    if !path.exists() {
        info!(path = %path.display(), "no saved policy, starting from an empty table");
        return ValueTable::new();
    }
    match repository.load(path) {
        Ok(table) => {
            info!(path = %path.display(), states = table.len(), "loaded policy");
            table
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "discarding unreadable policy");
            ValueTable::new()
        }
    }
}
