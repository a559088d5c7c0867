//! Consolidates a linear history of SQL schema migrations into a minimal,
//! equivalent set of from-scratch migrations.
//!
//! A directory of numbered `.up.sql`/`.down.sql` pairs is folded, statement
//! by statement, into an in-memory catalog of the final schema. Surviving
//! objects are ordered so that every dependency precedes its dependents and
//! re-serialized as one standalone up/down pair each.
//!
//! ```no_run
//! use sqlfold_core::Consolidator;
//!
//! let summary = Consolidator::new("./migrations", "./consolidated").run(false)?;
//! println!("{} in, {} out", summary.input_count, summary.output_count);
//! # Ok::<(), sqlfold_core::Error>(())
//! ```

pub mod ast;
pub mod catalog;
pub mod consolidate;
pub mod error;
pub mod migrate;
pub mod parser;

pub use consolidate::{Consolidator, Summary};
pub use error::Error;
