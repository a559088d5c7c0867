//! Migration file discovery.

use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::migrate::Migration;
use crate::parser::pattern;

/// Reads numbered migration pairs from a directory.
///
/// Files match `<number><sep><name>.up.sql` / `.down.sql` where the
/// separator is `_` or `-`; everything else is ignored. The first matched
/// file fixes the separator for the whole run.
pub struct Reader {
    directory: PathBuf,
    separator: Option<char>,
}

#[derive(Default)]
struct Pending {
    name: String,
    up: Option<PathBuf>,
    down: Option<PathBuf>,
}

impl Reader {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            separator: None,
        }
    }

    /// All migrations that have an up file, ordered by number.
    pub fn read_migrations(&mut self) -> Result<Vec<Migration>, Error> {
        let file_pattern: Regex = pattern(r"^(\d+)([_-])([^.]+)\.(up|down)\.sql$");

        let mut names: Vec<String> = Vec::new();
        for entry in fs::read_dir(&self.directory).map_err(|e| Error::io(&self.directory, e))? {
            let entry = entry.map_err(|e| Error::io(&self.directory, e))?;
            if entry.path().is_dir() {
                continue;
            }
            if let Some(file_name) = entry.file_name().to_str() {
                names.push(file_name.to_string());
            }
        }
        // directory iteration order is platform-defined; sort for stability
        names.sort();

        let mut by_number: BTreeMap<u32, Pending> = BTreeMap::new();
        for file_name in &names {
            let Some(caps) = file_pattern.captures(file_name) else {
                continue;
            };
            let Ok(number) = caps[1].parse::<u32>() else {
                continue;
            };
            if self.separator.is_none() {
                self.separator = caps[2].chars().next();
            }

            let pending = by_number.entry(number).or_insert_with(|| Pending {
                name: caps[3].to_string(),
                ..Pending::default()
            });
            let path = self.directory.join(file_name);
            if &caps[4] == "up" {
                pending.up = Some(path);
            } else {
                pending.down = Some(path);
            }
        }

        Ok(by_number
            .into_iter()
            .filter_map(|(number, pending)| {
                // a pair without an up file contributes nothing to the fold
                let up_path = pending.up?;
                Some(Migration {
                    number,
                    name: pending.name,
                    up_path,
                    down_path: pending.down,
                })
            })
            .collect())
    }

    /// Separator detected from the first matched file; `_` when nothing
    /// matched.
    pub fn separator(&self) -> char {
        self.separator.unwrap_or('_')
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), "SELECT 1;").unwrap();
    }

    #[test]
    fn reads_pairs_in_numeric_order() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "0010_later.up.sql");
        touch(dir.path(), "0010_later.down.sql");
        touch(dir.path(), "0002_earlier.up.sql");
        touch(dir.path(), "0002_earlier.down.sql");

        let migrations = Reader::new(dir.path()).read_migrations().unwrap();
        assert_eq!(migrations.len(), 2);
        assert_eq!(migrations[0].number, 2);
        assert_eq!(migrations[0].name, "earlier");
        assert_eq!(migrations[1].number, 10);
        assert!(migrations[1].down_path.is_some());
    }

    #[test]
    fn ignores_files_that_do_not_match() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "0001_init.up.sql");
        touch(dir.path(), "README.md");
        touch(dir.path(), "0002_bad.sql");
        touch(dir.path(), "notes.up.sql");

        let migrations = Reader::new(dir.path()).read_migrations().unwrap();
        assert_eq!(migrations.len(), 1);
    }

    #[test]
    fn discards_migrations_without_an_up_file() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "0001_init.up.sql");
        touch(dir.path(), "0002_orphan.down.sql");

        let migrations = Reader::new(dir.path()).read_migrations().unwrap();
        assert_eq!(migrations.len(), 1);
        assert_eq!(migrations[0].number, 1);
    }

    #[test]
    fn separator_comes_from_first_matched_file() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "0001-init.up.sql");
        touch(dir.path(), "0002-more.up.sql");

        let mut reader = Reader::new(dir.path());
        reader.read_migrations().unwrap();
        assert_eq!(reader.separator(), '-');
    }

    #[test]
    fn separator_defaults_to_underscore() {
        let dir = tempfile::tempdir().unwrap();
        let mut reader = Reader::new(dir.path());
        reader.read_migrations().unwrap();
        assert_eq!(reader.separator(), '_');
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let err = Reader::new("/definitely/not/here")
            .read_migrations()
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
