//! Migration file records and the directory read/write boundary.

pub mod reader;
pub mod writer;

pub use self::reader::Reader;
pub use self::writer::Writer;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A numbered up/down migration pair discovered on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Migration {
    pub number: u32,
    pub name: String,
    pub up_path: PathBuf,
    pub down_path: Option<PathBuf>,
}

/// A generated migration pair, ready to be written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedMigration {
    pub number: u32,
    pub name: String,
    pub up_sql: String,
    pub down_sql: String,
}
