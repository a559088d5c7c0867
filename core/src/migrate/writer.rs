//! Writing consolidated migrations to disk.

use std::fs;
use std::path::PathBuf;

use crate::error::Error;
use crate::migrate::ConsolidatedMigration;

/// Writes migration pairs as `%04d<sep><name>.up.sql` / `.down.sql`.
pub struct Writer {
    output_dir: PathBuf,
    separator: char,
}

impl Writer {
    pub fn new(output_dir: impl Into<PathBuf>, separator: char) -> Self {
        Self {
            output_dir: output_dir.into(),
            separator,
        }
    }

    pub fn write(&self, migrations: &[ConsolidatedMigration]) -> Result<(), Error> {
        fs::create_dir_all(&self.output_dir).map_err(|e| Error::io(&self.output_dir, e))?;

        for migration in migrations {
            let up_path = self.path_for(migration, "up");
            fs::write(&up_path, &migration.up_sql).map_err(|e| Error::io(&up_path, e))?;

            let down_path = self.path_for(migration, "down");
            fs::write(&down_path, &migration.down_sql).map_err(|e| Error::io(&down_path, e))?;
        }

        Ok(())
    }

    /// Render the same content to stdout instead of writing files.
    pub fn preview(&self, migrations: &[ConsolidatedMigration]) {
        for migration in migrations {
            println!("\n========================================");
            println!("Migration {:04}: {}", migration.number, migration.name);
            println!("========================================\n");
            println!("--- UP ---\n{}", migration.up_sql);
            println!("--- DOWN ---\n{}", migration.down_sql);
        }
    }

    fn path_for(&self, migration: &ConsolidatedMigration, direction: &str) -> PathBuf {
        self.output_dir.join(format!(
            "{:04}{}{}.{}.sql",
            migration.number, self.separator, migration.name, direction
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_zero_padded_pairs_with_the_given_separator() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let migrations = vec![ConsolidatedMigration {
            number: 7,
            name: "create-users".into(),
            up_sql: "CREATE TABLE users ();\n".into(),
            down_sql: "DROP TABLE users;\n".into(),
        }];

        Writer::new(&out, '-').write(&migrations).unwrap();

        let up = std::fs::read_to_string(out.join("0007-create-users.up.sql")).unwrap();
        let down = std::fs::read_to_string(out.join("0007-create-users.down.sql")).unwrap();
        assert_eq!(up, "CREATE TABLE users ();\n");
        assert_eq!(down, "DROP TABLE users;\n");
    }
}
