//! The consolidation pipeline: fold, order, emit.

pub mod applier;
pub mod emit;
pub mod graph;

pub use self::applier::Applier;
pub use self::emit::Emitter;
pub use self::graph::{analyze_enum_usage, DependencyGraph, ObjectKind};

use log::{debug, info};
use std::path::PathBuf;

use crate::catalog::Catalog;
use crate::error::Error;
use crate::migrate::{Reader, Writer};
use crate::parser::Parser;

/// What a run produced, for reporting.
#[derive(Debug, Clone, Copy)]
pub struct Summary {
    pub input_count: usize,
    pub output_count: usize,
}

/// Orchestrates a full consolidation run over an input directory.
///
/// The pipeline is strictly sequential: read the ordered migration list,
/// fold every up file into the catalog, analyze enum usage, order the
/// dependency graph, emit up/down pairs, then write (or preview) them.
/// Nothing is written unless the fold and the sort both succeed.
pub struct Consolidator {
    input_dir: PathBuf,
    output_dir: PathBuf,
}

impl Consolidator {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Run the pipeline. With `dry_run` the consolidated migrations are
    /// printed to stdout instead of written.
    pub fn run(&self, dry_run: bool) -> Result<Summary, Error> {
        let (migrations, separator) = {
            let mut reader = Reader::new(&self.input_dir);
            let migrations = reader.read_migrations()?;
            (migrations, reader.separator())
        };
        if migrations.is_empty() {
            return Err(Error::NoMigrations {
                dir: self.input_dir.clone(),
            });
        }
        info!("found {} migrations in {}", migrations.len(), self.input_dir.display());

        let parser = Parser::new();
        let mut catalog = Catalog::new();
        let mut applier = Applier::new(&mut catalog);
        for migration in &migrations {
            debug!("processing migration {:04} {}", migration.number, migration.name);
            applier.set_current_migration(migration.number);
            for stmt in parser.parse_file(&migration.up_path)? {
                applier.apply(&stmt);
            }
        }
        info!(
            "final state: {} domains, {} enums, {} tables, {} views",
            catalog.domains.len(),
            catalog.enums.len(),
            catalog.tables.len(),
            catalog.views.len()
        );

        analyze_enum_usage(&mut catalog);
        let graph = DependencyGraph::build(&mut catalog);
        let ordered = graph.topological_sort()?;
        debug!("ordered {} objects", ordered.len());

        let consolidated = Emitter::new(&catalog, &graph).generate(&ordered);
        info!("generated {} consolidated migrations", consolidated.len());

        let writer = Writer::new(&self.output_dir, separator);
        if dry_run {
            writer.preview(&consolidated);
        } else {
            writer.write(&consolidated)?;
        }

        Ok(Summary {
            input_count: migrations.len(),
            output_count: consolidated.len(),
        })
    }
}
